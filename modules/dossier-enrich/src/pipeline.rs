//! The profile enrichment pipeline.
//!
//! One run takes a profile submission through seed building, resume
//! and link crawling, person and github searches, AI merging and the
//! closing narrative. Collaborator failures degrade to empty inputs
//! rather than aborting the run; the result is always a profile
//! document built from whatever could be gathered.

use anyhow::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

use dossier_common::profile::seed_profile;
use dossier_common::types::ProfileInput;
use dossier_common::urls::{
    extract_twitter_username, is_github_url, is_linkedin_url, last_path_segment,
};

use crate::accumulate::{self, SEARCH_RESULT_LIMIT};
use crate::deps::EnrichDeps;
use crate::github::github_presence;
use crate::providers::SocialProfile;
use crate::search::UrlPredicate;
use crate::synth::ResumeInfo;

/// Networks excluded from person search; both have dedicated passes.
const PERSON_SEARCH_EXCLUSIONS: &[UrlPredicate] = &[is_github_url, is_linkedin_url];

pub async fn run_enrichment(deps: &EnrichDeps, input: &ProfileInput) -> Result<Value> {
    info!(candidate = %input.display_name(), "Starting profile enrichment");

    let seed = seed_profile(input);

    // The resume goes through the same fetch chain as any other url;
    // the scraping providers return document text as markdown.
    let resume_text = if input.resume.is_empty() {
        String::new()
    } else {
        deps.fetcher.fetch(&input.resume).await
    };

    let resume_info = if resume_text.is_empty() {
        ResumeInfo::default()
    } else {
        match deps.synthesizer.resume_details(&resume_text).await {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Resume detail extraction failed");
                ResumeInfo::default()
            }
        }
    };

    let social = if input.linkedin.is_empty() {
        SocialProfile::default()
    } else {
        match deps.social.profile(&input.linkedin).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Social profile scrape failed");
                SocialProfile::default()
            }
        }
    };

    let links = collect_crawl_links(input, &resume_info);
    let crawled = accumulate::crawl_links(&deps.fetcher, &links).await;
    info!(pages = crawled.len(), "Crawled profile links");

    let reference = ReferenceInfo::build(input, &seed, &resume_info);

    let queries = match deps
        .synthesizer
        .search_queries(
            &reference.name,
            &reference.occupation,
            &reference.location,
            &reference.usernames,
        )
        .await
    {
        Ok(queries) if !queries.is_empty() => queries,
        Ok(_) => {
            info!("Query generation came back empty, using fallback queries");
            fallback_queries(&reference)
        }
        Err(e) => {
            warn!(error = %e, "Query generation failed, using fallback queries");
            fallback_queries(&reference)
        }
    };

    let search_items = accumulate::gather_search_items(
        &deps.aggregator,
        &queries,
        SEARCH_RESULT_LIMIT,
        PERSON_SEARCH_EXCLUSIONS,
    )
    .await;
    let search_items = accumulate::dedup_against_crawled(&crawled, search_items);
    info!(results = search_items.len(), "Person search finished");

    let github = github_presence(
        &deps.aggregator,
        deps.synthesizer.as_ref(),
        &reference.name,
        &reference.usernames,
        &reference.occupation,
    )
    .await;

    let mut enriched = accumulate::enrich_profile(
        deps.synthesizer.as_ref(),
        &seed,
        &crawled,
        &search_items,
        &github,
    )
    .await;

    let all_text = accumulate::assemble_profile_text(
        &resume_text,
        &social.full_text,
        &crawled,
        &search_items,
        &github.summary,
    );
    let narrative = match deps.synthesizer.narrative(&enriched, &all_text).await {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Narrative generation failed");
            String::new()
        }
    };

    if let Some(obj) = enriched.as_object_mut() {
        obj.insert("extra".to_string(), Value::String(narrative));
        if !github.is_empty() && !obj.contains_key("github") {
            obj.insert(
                "github".to_string(),
                json!({
                    "summary": github.summary,
                    "profiles": github.profiles,
                    "repositories": github.repositories,
                }),
            );
        }
    }

    info!(candidate = %input.display_name(), "Profile enrichment complete");
    Ok(enriched)
}

/// Links worth crawling directly: submitted extras, links found in the
/// resume, the portfolio and the twitter profile. LinkedIn and github
/// never go through the generic crawl.
fn collect_crawl_links(input: &ProfileInput, resume_info: &ResumeInfo) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    links.extend(input.extra_links.iter().cloned());
    links.extend(resume_info.links.iter().cloned());
    if !input.portfolio.is_empty() {
        links.push(input.portfolio.clone());
    }
    if !input.twitter.is_empty() {
        links.push(input.twitter.clone());
    }
    links
        .into_iter()
        .filter(|link| !link.is_empty() && !is_linkedin_url(link) && !is_github_url(link))
        .collect()
}

/// What the search steps know about the person being looked up.
struct ReferenceInfo {
    name: String,
    occupation: String,
    location: String,
    usernames: Vec<String>,
}

impl ReferenceInfo {
    fn build(input: &ProfileInput, seed: &Value, resume_info: &ResumeInfo) -> Self {
        let basics = &seed["basics"];
        let mut name = basics["name"].as_str().unwrap_or_default().to_string();
        if name.is_empty() {
            name = resume_info.legal_name.clone();
        }
        let occupation = basics["current_occupation"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        let location = basics["location"]["city"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        let mut usernames = resume_info.usernames.clone();
        if !input.github.is_empty() {
            if let Some(username) = last_path_segment(&input.github) {
                if !usernames.contains(&username) {
                    usernames.push(username);
                }
            }
        }
        if !input.twitter.is_empty() {
            if let Some(username) = extract_twitter_username(&input.twitter) {
                if !usernames.contains(&username) {
                    usernames.push(username);
                }
            }
        }

        Self {
            name,
            occupation,
            location,
            usernames,
        }
    }
}

/// Deterministic queries used when generation fails: a couple of known
/// usernames plus the name itself.
fn fallback_queries(reference: &ReferenceInfo) -> Vec<String> {
    let mut queries: Vec<String> = reference.usernames.iter().take(2).cloned().collect();
    if !reference.name.is_empty() {
        if reference.occupation.is_empty() {
            queries.push(reference.name.clone());
        } else {
            queries.push(format!("{} {}", reference.name, reference.occupation));
        }
    }
    queries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProfileInput {
        let mut input = ProfileInput::default();
        input.first_name = "Jane".into();
        input.last_name = "Doe".into();
        input
    }

    #[test]
    fn test_collect_crawl_links_filters_blocked_networks() {
        let mut input = input();
        input.extra_links = vec![
            "https://jane.dev".into(),
            "https://www.linkedin.com/in/jane".into(),
            "https://github.com/jane".into(),
            "".into(),
        ];
        input.portfolio = "https://portfolio.jane.dev".into();
        input.twitter = "https://x.com/janedoe".into();

        let mut resume_info = ResumeInfo::default();
        resume_info.links = vec!["https://blog.jane.dev".into()];

        let links = collect_crawl_links(&input, &resume_info);
        assert_eq!(
            links,
            vec![
                "https://jane.dev",
                "https://blog.jane.dev",
                "https://portfolio.jane.dev",
                "https://x.com/janedoe",
            ]
        );
    }

    #[test]
    fn test_reference_name_falls_back_to_legal_name() {
        let mut anonymous = ProfileInput::default();
        anonymous.resume = "https://cdn.example.com/resume.pdf".into();
        let seed = seed_profile(&anonymous);

        let mut resume_info = ResumeInfo::default();
        resume_info.legal_name = "Jane Margaret Doe".into();

        let reference = ReferenceInfo::build(&anonymous, &seed, &resume_info);
        assert_eq!(reference.name, "Jane Margaret Doe");
    }

    #[test]
    fn test_reference_usernames_from_profile_urls() {
        let mut input = input();
        input.github = "https://github.com/janedoe/".into();
        input.twitter = "https://x.com/jane_dev".into();
        let seed = seed_profile(&input);

        let mut resume_info = ResumeInfo::default();
        resume_info.usernames = vec!["janedoe".into()];

        let reference = ReferenceInfo::build(&input, &seed, &resume_info);
        // github username already known, twitter one is new
        assert_eq!(reference.usernames, vec!["janedoe", "jane_dev"]);
    }

    #[test]
    fn test_fallback_queries_cap_usernames_at_two() {
        let reference = ReferenceInfo {
            name: "Jane Doe".into(),
            occupation: "engineer".into(),
            location: String::new(),
            usernames: vec!["a".into(), "b".into(), "c".into()],
        };
        assert_eq!(
            fallback_queries(&reference),
            vec!["a", "b", "Jane Doe engineer"]
        );

        let nameless = ReferenceInfo {
            name: String::new(),
            occupation: String::new(),
            location: String::new(),
            usernames: vec!["a".into()],
        };
        assert_eq!(fallback_queries(&nameless), vec!["a"]);
    }
}
