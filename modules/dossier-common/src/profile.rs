use serde_json::{json, Value};

use crate::types::ProfileInput;

/// Top-level groups every finished profile must carry.
pub const REQUIRED_GROUPS: [&str; 4] = [
    "basics",
    "professional_dna",
    "personal_dna",
    "identity_mapping_vitals",
];

/// The empty aggregate person record. Every leaf is an empty string,
/// empty list, or false.
pub fn empty_profile() -> Value {
    json!({
        "basics": {
            "name": "",
            "current_occupation": "",
            "location": {"city": "", "remote_preference": false},
            "profiles": [],
            "identity_tags": []
        },
        "professional_dna": {
            "experience": [],
            "skills": {"hard_skills": [], "soft_skills": [], "tools": []}
        },
        "personal_dna": {
            "education": [],
            "projects": [],
            "hobbies_and_interests": {"active_pursuits": [], "intellectual_interests": []},
            "volunteering": []
        },
        "identity_mapping_vitals": {
            "communication_style": "",
            "value_alignment": [],
            "career_trajectory": ""
        },
        "extra": ""
    })
}

/// Deterministic starting record built from the submitted input alone,
/// before any scraping or synthesis runs.
pub fn seed_profile(input: &ProfileInput) -> Value {
    let experience: Vec<Value> = input
        .job_history
        .iter()
        .map(|job| {
            json!({
                "company": job.company_name,
                "title": job.job_title,
                "duration": span(&job.start_date, &job.end_date),
                "impact_metrics": [],
                "cultural_context": "",
                "description": job.description,
            })
        })
        .collect();

    let education: Vec<Value> = input
        .education
        .iter()
        .map(|edu| {
            json!({
                "institution": edu.institution,
                "degree": edu.degree,
                "focus": edu.field_of_study,
                "description": edu.description,
                "duration": span(&edu.start_date, &edu.end_date),
            })
        })
        .collect();

    let mut profiles = Vec::new();
    for (platform, url) in [
        ("LinkedIn", &input.linkedin),
        ("GitHub", &input.github),
        ("Twitter", &input.twitter),
        ("Portfolio", &input.portfolio),
    ] {
        if !url.is_empty() {
            profiles.push(json!({"platform": platform, "url": url, "bio_summary": ""}));
        }
    }

    // Most recent role comes first in the submitted history.
    let current_occupation = input
        .job_history
        .first()
        .map(|job| job.job_title.clone())
        .unwrap_or_default();

    json!({
        "basics": {
            "name": input.display_name(),
            "current_occupation": current_occupation,
            "location": {"city": "", "remote_preference": false},
            "profiles": profiles,
            "identity_tags": [],
            "phone": input.phone,
            "extra_links": input.extra_links,
        },
        "professional_dna": {
            "experience": experience,
            "skills": {"hard_skills": [], "soft_skills": [], "tools": []},
            "skills_raw": raw_or_empty(&input.skills),
            "experience_raw": raw_or_empty(&input.experience),
        },
        "personal_dna": {
            "education": education,
            "projects": [],
            "hobbies_and_interests": {"active_pursuits": [], "intellectual_interests": []},
            "volunteering": []
        },
        "identity_mapping_vitals": {
            "communication_style": "",
            "value_alignment": [],
            "career_trajectory": ""
        },
        "extra": ""
    })
}

/// Repair a synthesized record in place: any missing required group is
/// replaced with its empty default, and a non-object record is replaced
/// wholly.
pub fn ensure_required_groups(profile: &mut Value) {
    if !profile.is_object() {
        *profile = empty_profile();
        return;
    }
    let defaults = empty_profile();
    if let Some(obj) = profile.as_object_mut() {
        for group in REQUIRED_GROUPS {
            if !obj.contains_key(group) {
                obj.insert(group.to_string(), defaults[group].clone());
            }
        }
    }
}

fn span(start: &str, end: &str) -> String {
    let end = if end.is_empty() { "Present" } else { end };
    format!("{start} - {end}")
}

fn raw_or_empty(value: &Value) -> Value {
    if value.is_null() {
        json!("")
    } else {
        value.clone()
    }
}
