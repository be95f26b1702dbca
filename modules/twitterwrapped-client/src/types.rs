use serde_json::Value;

/// One normalized tweet, pulled out of whichever envelope the API used.
#[derive(Debug, Clone, Default)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub url: String,
    pub likes: u64,
    pub retweets: u64,
}

/// Everything fetched for one user, plus a flat text rendering for
/// downstream synthesis.
#[derive(Debug, Clone, Default)]
pub struct TweetArchive {
    pub username: String,
    pub tweets: Vec<Tweet>,
    pub top_tweets: Vec<Value>,
}

impl TweetArchive {
    pub(crate) fn from_response(username: &str, data: Value) -> Self {
        Self {
            username: username.to_string(),
            tweets: extract_tweets(&data),
            top_tweets: extract_top_tweets(&data),
        }
    }

    /// Render the archive as a flat text block: header, up to 5 top tweets,
    /// up to 20 recent tweets with engagement counts where present.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = vec![
            format!("Twitter Profile: @{}", self.username),
            String::new(),
            format!("Total tweets fetched: {}", self.tweets.len()),
            String::new(),
        ];

        if !self.top_tweets.is_empty() {
            parts.push("Top Tweets:".to_string());
            for tweet in self.top_tweets.iter().take(5) {
                let text = top_tweet_text(tweet);
                if !text.is_empty() {
                    parts.push(format!("- {text}"));
                    parts.push(String::new());
                }
            }
            parts.push(String::new());
        }

        parts.push("Recent Tweets:".to_string());
        for tweet in self.tweets.iter().take(20) {
            if tweet.text.is_empty() {
                continue;
            }
            parts.push(format!("- {}", tweet.text));
            if tweet.likes > 0 || tweet.retweets > 0 {
                parts.push(format!(
                    "  [{} likes, {} retweets]",
                    tweet.likes, tweet.retweets
                ));
            }
            parts.push(String::new());
        }

        parts.join("\n")
    }
}

/// The API answers in several shapes: tweets at the top level, under
/// `searchResults`, or nested one level down inside `data`.
fn raw_tweets(data: &Value) -> &[Value] {
    let nested = data.get("data");
    let candidates = [
        data.get("tweets"),
        data.get("searchResults"),
        nested.and_then(|d| d.get("tweets")),
        nested.and_then(|d| d.get("searchResults")),
    ];
    for candidate in candidates {
        if let Some(list) = candidate.and_then(Value::as_array) {
            if !list.is_empty() {
                return list;
            }
        }
    }
    &[]
}

fn extract_tweets(data: &Value) -> Vec<Tweet> {
    let mut tweets = Vec::new();

    for item in raw_tweets(data) {
        match item {
            Value::Object(_) => {
                let text = string_field(item, &["text", "snippet", "content"]);
                if text.is_empty() {
                    continue;
                }
                tweets.push(Tweet {
                    id: string_field(item, &["id"]),
                    text,
                    url: string_field(item, &["url"]),
                    likes: metric(item, &["like_count", "likes"]),
                    retweets: metric(item, &["retweet_count", "retweets"]),
                });
            }
            // Some envelopes carry tweets as bare strings.
            Value::String(text) => tweets.push(Tweet {
                text: text.clone(),
                ..Tweet::default()
            }),
            _ => {}
        }
    }

    tweets
}

fn extract_top_tweets(data: &Value) -> Vec<Value> {
    let candidates = [
        data.get("top_tweets"),
        data.get("data").and_then(|d| d.get("top_tweets")),
    ];
    for candidate in candidates {
        if let Some(list) = candidate.and_then(Value::as_array) {
            if !list.is_empty() {
                return list.clone();
            }
        }
    }
    Vec::new()
}

fn top_tweet_text(tweet: &Value) -> String {
    string_field(tweet, &["text", "snippet"])
}

fn string_field(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Engagement counts live under `twitterMetrics`, `metrics`, or flat on the
/// tweet itself, with two naming styles for each count.
fn metric(item: &Value, keys: &[&str]) -> u64 {
    let source = ["twitterMetrics", "metrics"]
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|v| v.as_object().map(|o| !o.is_empty()).unwrap_or(false));

    let holder = source.unwrap_or(item);
    keys.iter()
        .filter_map(|key| holder.get(*key))
        .filter_map(as_count)
        .find(|n| *n > 0)
        .unwrap_or(0)
}

fn as_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| value.as_f64().map(|f| f as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_from_flat_envelope() {
        let data = json!({
            "tweets": [
                {"id": "1", "text": "hello", "url": "https://x.com/a/1", "likes": 3},
                {"id": "2", "text": ""},
            ]
        });
        let tweets = extract_tweets(&data);
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].text, "hello");
        assert_eq!(tweets[0].likes, 3);
    }

    #[test]
    fn test_extract_from_nested_envelope() {
        let data = json!({
            "data": {"searchResults": [{"snippet": "from the archive"}]}
        });
        let tweets = extract_tweets(&data);
        assert_eq!(tweets.len(), 1);
        assert_eq!(tweets[0].text, "from the archive");
    }

    #[test]
    fn test_extract_keeps_bare_strings() {
        let data = json!({"tweets": ["just text", {"text": "object text"}]});
        let tweets = extract_tweets(&data);
        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].text, "just text");
        assert_eq!(tweets[0].url, "");
    }

    #[test]
    fn test_metrics_prefer_nested_blocks() {
        let item = json!({
            "text": "t",
            "twitterMetrics": {"like_count": 7, "retweet_count": 2},
            "likes": 99,
        });
        assert_eq!(metric(&item, &["like_count", "likes"]), 7);
        assert_eq!(metric(&item, &["retweet_count", "retweets"]), 2);
    }

    #[test]
    fn test_metrics_fall_back_to_flat_keys() {
        let item = json!({"text": "t", "likes": 4});
        assert_eq!(metric(&item, &["like_count", "likes"]), 4);
        assert_eq!(metric(&item, &["retweet_count", "retweets"]), 0);
    }

    #[test]
    fn test_render_layout() {
        let archive = TweetArchive {
            username: "ada".to_string(),
            tweets: vec![
                Tweet {
                    text: "First post".to_string(),
                    likes: 2,
                    ..Tweet::default()
                },
                Tweet {
                    text: "Second".to_string(),
                    ..Tweet::default()
                },
            ],
            top_tweets: vec![json!({"text": "Pinned"})],
        };

        let text = archive.render();
        assert!(text.starts_with("Twitter Profile: @ada\n"));
        assert!(text.contains("Total tweets fetched: 2"));
        assert!(text.contains("Top Tweets:\n- Pinned"));
        assert!(text.contains("- First post\n  [2 likes, 0 retweets]"));
        assert!(text.contains("- Second\n"));
        assert!(!text.contains("- Second\n  ["));
    }

    #[test]
    fn test_render_caps_recent_tweets() {
        let archive = TweetArchive {
            username: "ada".to_string(),
            tweets: (0..30)
                .map(|i| Tweet {
                    text: format!("tweet {i}"),
                    ..Tweet::default()
                })
                .collect(),
            top_tweets: Vec::new(),
        };

        let text = archive.render();
        assert!(text.contains("Total tweets fetched: 30"));
        assert!(text.contains("- tweet 19"));
        assert!(!text.contains("- tweet 20"));
        assert!(!text.contains("Top Tweets:"));
    }
}
