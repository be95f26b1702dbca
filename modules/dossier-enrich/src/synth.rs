//! AI synthesis steps behind one trait.
//!
//! The model is an untrusted collaborator: every method returns a
//! `Result`, callers decide what a failure degrades to, and nothing
//! here assumes the output is well formed beyond what the signature
//! promises.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ai_client::util::truncate_to_char_boundary;
use ai_client::Gemini;

use crate::accumulate::ContentItem;
use crate::github::GithubPresence;
use crate::search::SearchItem;

/// Per-source content budget inside the merge prompt.
const MERGE_ITEM_LIMIT: usize = 3_000;
/// Total web content budget inside the merge prompt.
const MERGE_COMBINED_LIMIT: usize = 3_000_000;
/// Search result budget inside the code summary prompt.
const SUMMARY_RESULTS_LIMIT: usize = 8_000;
/// Gathered content budget inside the narrative prompt.
const NARRATIVE_CONTENT_LIMIT: usize = 15_000;

/// Facts pulled out of resume text.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ResumeInfo {
    /// Nicknames, aliases or alternate names, excluding the legal name.
    pub nicknames: Vec<String>,
    /// Every URL found in the text.
    pub links: Vec<String>,
    /// Usernames and handles, mentioned directly or embedded in links.
    pub usernames: Vec<String>,
    /// Full legal name when present, otherwise empty.
    pub legal_name: String,
}

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Extract nicknames, links, usernames and the legal name from resume text.
    async fn resume_details(&self, resume_text: &str) -> Result<ResumeInfo>;

    /// Generate personal-focus search queries for finding this person online.
    async fn search_queries(
        &self,
        name: &str,
        occupation: &str,
        location: &str,
        usernames: &[String],
    ) -> Result<Vec<String>>;

    /// Merge gathered web content into the seed profile, returning the
    /// enriched profile document.
    async fn merge_profile(
        &self,
        seed: &Value,
        crawled: &[ContentItem],
        search_items: &[SearchItem],
        github: &GithubPresence,
    ) -> Result<Value>;

    /// Summarize a person's code-hosting presence from search results.
    async fn code_summary(
        &self,
        name: &str,
        usernames: &[String],
        results: &[SearchItem],
    ) -> Result<String>;

    /// Long-form narrative about the person from everything gathered.
    async fn narrative(&self, profile: &Value, all_content: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini-backed implementation
// ---------------------------------------------------------------------------

pub struct GeminiSynthesizer {
    gemini: Gemini,
}

impl GeminiSynthesizer {
    pub fn new(gemini: Gemini) -> Self {
        Self { gemini }
    }
}

#[async_trait]
impl Synthesizer for GeminiSynthesizer {
    async fn resume_details(&self, resume_text: &str) -> Result<ResumeInfo> {
        self.gemini.extract(&resume_prompt(resume_text)).await
    }

    async fn search_queries(
        &self,
        name: &str,
        occupation: &str,
        location: &str,
        usernames: &[String],
    ) -> Result<Vec<String>> {
        let prompt = queries_prompt(name, occupation, location, usernames);
        let value = self.gemini.generate_json(&prompt).await?;
        parse_query_list(value)
    }

    async fn merge_profile(
        &self,
        seed: &Value,
        crawled: &[ContentItem],
        search_items: &[SearchItem],
        github: &GithubPresence,
    ) -> Result<Value> {
        let prompt = merge_prompt(seed, crawled, search_items, github);
        self.gemini.generate_json(&prompt).await
    }

    async fn code_summary(
        &self,
        name: &str,
        usernames: &[String],
        results: &[SearchItem],
    ) -> Result<String> {
        self.gemini
            .complete(&summary_prompt(name, usernames, results))
            .await
    }

    async fn narrative(&self, profile: &Value, all_content: &str) -> Result<String> {
        self.gemini
            .complete(&narrative_prompt(profile, all_content))
            .await
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn resume_prompt(resume_text: &str) -> String {
    format!(
        r#"Analyze this resume text and extract:
1. Any nicknames, aliases, or alternate names the person uses (not their legal name)
2. All URLs and links found (GitHub, personal websites, portfolio links, social media)
3. Any usernames or handles mentioned, for example @username or github.com/username

Resume text:
{resume_text}

Only include items actually found. Use empty arrays when nothing matches a category, and an empty string when no legal name is present."#
    )
}

fn queries_prompt(name: &str, occupation: &str, location: &str, usernames: &[String]) -> String {
    format!(
        r#"Generate search queries to find personal and non-technical information about this person.

Person's details:
- Name: {name}
- Current occupation/title: {occupation}
- Location: {location}
- Known usernames/handles: {usernames:?}

Generate STRICTLY 6 (SIX) UNIQUE keyword search queries that would help find this person's:
1. Personal blogs, creative writing, or personal websites
2. Social media profiles and personal accounts
3. Hobbies, interests, and personal achievements or awards outside of work
4. Community involvement, volunteering, or causes they support
5. Creative work such as art, music, or photography
6. Sports teams, clubs, or group memberships

IMPORTANT: Do NOT generate queries for:
- GitHub or code repositories (handled separately)
- LinkedIn profiles (handled separately)
- Technical/coding content

Focus on discovering WHO the person is beyond their technical skills.

Return as a JSON array of search query strings. Make the queries short and specific enough to identify this person.
Example: ["John Doe hobbies interests", "John Doe volunteer", "John Doe personal blog"]"#
    )
}

fn merge_prompt(
    seed: &Value,
    crawled: &[ContentItem],
    search_items: &[SearchItem],
    github: &GithubPresence,
) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for item in crawled {
        blocks.push(format!(
            "URL: {}\nContent:\n{}",
            item.url,
            truncate_to_char_boundary(&item.content, MERGE_ITEM_LIMIT)
        ));
    }
    for item in search_items {
        blocks.push(format!(
            "URL: {}\nContent:\n{}",
            item.url,
            truncate_to_char_boundary(&item.content, MERGE_ITEM_LIMIT)
        ));
    }
    let combined = blocks.join("\n\n---\n\n");
    let combined = truncate_to_char_boundary(&combined, MERGE_COMBINED_LIMIT);

    let github_section = if github.summary.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nGITHUB PRESENCE:\nSummary: {}\nProfiles: {}\nRepositories: {}\n",
            github.summary,
            serde_json::to_string_pretty(&github.profiles.iter().take(5).collect::<Vec<_>>())
                .unwrap_or_default(),
            serde_json::to_string_pretty(&github.repositories.iter().take(10).collect::<Vec<_>>())
                .unwrap_or_default(),
        )
    };

    format!(
        r#"You have an initial profile schema and additional web content about the same person.
Enrich and complete the schema with any new information found in the web content.

INITIAL SCHEMA:
{seed}

ADDITIONAL WEB CONTENT (from personal searches, excluding GitHub/LinkedIn):
{combined}
{github_section}
CRITICAL INSTRUCTIONS - Focus on the WHOLE PERSON, not just technical skills:

1. Keep all existing information from the initial schema
2. Add new profiles found (Twitter, Instagram, personal websites, blogs, etc.)
3. PRIORITIZE discovering personal aspects: hobbies and passions outside work, creative pursuits, sports and outdoor activities, travel and languages, volunteer work and causes they support, personal achievements, family life and pets, humor style and communication tone, personal values and beliefs
4. Enhance identity_tags to capture BOTH professional AND personal identity (aim for 6-8 tags)
5. Update communication_style based on their overall online presence tone
6. Add to value_alignment based on causes and topics they genuinely care about
7. Fill hobbies_and_interests comprehensively: active_pursuits are things they DO, intellectual_interests are things they study or read about
8. Add any volunteering or social impact work discovered
9. Fill the "extra" field with a DETAILED NARRATIVE (3-5 paragraphs) about who they are as a person beyond their job title

Return the complete enriched JSON schema with the same structure."#,
        seed = serde_json::to_string_pretty(seed).unwrap_or_default(),
    )
}

fn summary_prompt(name: &str, usernames: &[String], results: &[SearchItem]) -> String {
    let top: Vec<&SearchItem> = results.iter().take(10).collect();
    let results_json = serde_json::to_string_pretty(&top).unwrap_or_default();
    let results_json = truncate_to_char_boundary(&results_json, SUMMARY_RESULTS_LIMIT);

    format!(
        r#"Summarize this person's GitHub presence based on the search results.
Focus on:
1. Their main projects and contributions
2. Technologies and languages they work with
3. Open source involvement
4. Any notable repositories or achievements
5. Their coding interests and focus areas

Person: {name}
Known usernames: {usernames:?}

GitHub search results:
{results_json}

Write a concise summary (2-3 paragraphs) of their GitHub presence and technical contributions."#
    )
}

fn narrative_prompt(profile: &Value, all_content: &str) -> String {
    format!(
        r#"Based on all the information gathered about this person, write a detailed description capturing their COMPLETE HUMAN IDENTITY, going far beyond their professional skills.

PERSON'S PROFILE:
{profile}

ALL GATHERED CONTENT:
{content}

Write a comprehensive, engaging narrative (4-6 paragraphs) that paints a vivid picture of WHO this person is. Focus heavily on NON-TECHNICAL and PERSONAL aspects:

1. PERSONALITY & CHARACTER: What kind of person are they? How do they come across?
2. PASSIONS & INTERESTS: What do they love doing outside of work? What gets them excited?
3. VALUES & BELIEFS: What do they stand for? What causes and communities do they belong to?
4. COMMUNICATION STYLE: How do they express themselves? What's their online presence tone?
5. UNIQUE IDENTITY: What makes them different and interesting? Any unusual backgrounds or perspectives?
6. LIFE OUTSIDE WORK: Family, pets, travel, lifestyle, personal achievements or adventures?
7. OVERALL IMPRESSION: If you met this person at a party, what would you remember about them?

WRITING STYLE:
- Write as if introducing someone to a friend, not as a formal HR document
- Be specific and vivid, using details and examples
- Balance professional context with personal depth
- Make it feel like a real person, not a resume summary

Return only the description text, no JSON."#,
        profile = serde_json::to_string_pretty(profile).unwrap_or_default(),
        content = truncate_to_char_boundary(all_content, NARRATIVE_CONTENT_LIMIT),
    )
}

/// Queries come back as a JSON array of strings; anything else counts
/// as a failed generation so callers fall back to deterministic queries.
fn parse_query_list(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| item.as_str().map(|s| s.to_string()))
            .collect()),
        _ => Err(anyhow!("Expected a JSON array of search queries")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(url: &str, content: &str) -> SearchItem {
        SearchItem {
            url: url.to_string(),
            title: String::new(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_resume_info_default_is_empty() {
        let info = ResumeInfo::default();
        assert!(info.nicknames.is_empty());
        assert!(info.links.is_empty());
        assert!(info.usernames.is_empty());
        assert!(info.legal_name.is_empty());
    }

    #[test]
    fn test_merge_prompt_joins_content_blocks() {
        let crawled = vec![ContentItem {
            url: "https://jane.dev".into(),
            content: "My personal site".into(),
        }];
        let items = vec![item("https://blog.example.com/jane", "Interview with Jane")];
        let prompt = merge_prompt(&json!({"basics": {}}), &crawled, &items, &GithubPresence::default());

        assert!(prompt.contains("URL: https://jane.dev\nContent:\nMy personal site"));
        assert!(prompt.contains("\n\n---\n\n"));
        assert!(prompt.contains("Interview with Jane"));
        assert!(!prompt.contains("GITHUB PRESENCE"));
    }

    #[test]
    fn test_merge_prompt_includes_github_section_when_summarized() {
        let github = GithubPresence {
            summary: "Active maintainer".into(),
            profiles: vec![item("https://github.com/jane", "jane")],
            repositories: vec![],
        };
        let prompt = merge_prompt(&json!({}), &[], &[], &github);
        assert!(prompt.contains("GITHUB PRESENCE"));
        assert!(prompt.contains("Active maintainer"));
    }

    #[test]
    fn test_merge_prompt_truncates_long_content() {
        let crawled = vec![ContentItem {
            url: "https://jane.dev".into(),
            content: "x".repeat(10_000),
        }];
        let prompt = merge_prompt(&json!({}), &crawled, &[], &GithubPresence::default());
        assert!(prompt.contains(&"x".repeat(MERGE_ITEM_LIMIT)));
        assert!(!prompt.contains(&"x".repeat(MERGE_ITEM_LIMIT + 1)));
    }

    #[test]
    fn test_parse_query_list_accepts_string_arrays() {
        let queries = parse_query_list(json!(["jane doe hobbies", "jane doe blog", 7])).unwrap();
        assert_eq!(queries, vec!["jane doe hobbies", "jane doe blog"]);
    }

    #[test]
    fn test_parse_query_list_rejects_non_arrays() {
        assert!(parse_query_list(json!({"queries": []})).is_err());
        assert!(parse_query_list(json!("jane doe")).is_err());
    }

    #[test]
    fn test_narrative_prompt_truncates_gathered_content() {
        let long_content = "y".repeat(20_000);
        let prompt = narrative_prompt(&json!({}), &long_content);
        assert!(prompt.contains(&"y".repeat(NARRATIVE_CONTENT_LIMIT)));
        assert!(!prompt.contains(&"y".repeat(NARRATIVE_CONTENT_LIMIT + 1)));
    }
}
