use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::text::normalize_url;

/// A keyword-tagged interest area a user can subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub is_global: bool,
}

/// Links a user to a topic. Priority is clamped to [1, 10] and decides how
/// many articles the topic contributes to the brief.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub user_id: String,
    pub topic: Topic,
    pub priority: u8,
}

pub const DEFAULT_PRIORITY: u8 = 5;

pub fn clamp_priority(priority: u8) -> u8 {
    priority.clamp(1, 10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: Option<String>,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

impl NewsArticle {
    /// Identity for deduplication: URL with query string and trailing slash
    /// stripped.
    pub fn normalized_url(&self) -> String {
        normalize_url(&self.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: NewsArticle,
    pub score: f64,
}

/// Articles selected for one topic after scoring, limiting and dedup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicNews {
    pub topic_id: String,
    pub topic_name: String,
    pub articles: Vec<ScoredArticle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BriefLength {
    Short,
    Medium,
    Long,
}

impl Default for BriefLength {
    fn default() -> Self {
        Self::Medium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub title: String,
    pub summary: String,
    pub source_url: String,
    pub source_name: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
}

/// Output of the synthesizer for one topic. `synthesized_summary` is empty
/// when no qualifying articles existed; `sources` lists only the articles
/// the narrative actually drew on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub articles: Vec<ArticleSummary>,
    pub synthesized_summary: String,
    pub sources: Vec<SourceRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalEvent {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub brief_length: BriefLength,
    pub include_global: bool,
    /// Fixed UTC offset in hours; IANA timezone handling is out of scope.
    pub utc_offset_hours: i8,
    pub delivery_hour: u8,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            brief_length: BriefLength::Medium,
            include_global: false,
            utc_offset_hours: 0,
            delivery_hour: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSection {
    pub name: String,
    pub category: String,
    pub articles: Vec<ArticleSummary>,
    pub synthesized_summary: String,
    pub sources: Vec<SourceRef>,
}

/// Complete brief, ready for rendering by the (out of scope) email layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefPayload {
    pub user_name: String,
    pub date: DateTime<Utc>,
    pub topics: Vec<TopicSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_events: Option<Vec<GlobalEvent>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefData {
    pub subject: String,
    pub payload: BriefPayload,
}

/// Record of a delivered (or generated) brief, for the once-per-day check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefRecord {
    pub id: String,
    pub user_id: String,
    pub subject: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    pub user_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<BatchError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendReceipt {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_normalized_url_strips_query_and_slash() {
        let article = NewsArticle {
            title: "Test".to_string(),
            description: String::new(),
            content: String::new(),
            url: "https://example.com/story/?utm_source=rss".to_string(),
            image_url: None,
            source: "test".to_string(),
            published_at: Utc::now(),
        };
        assert_eq!(article.normalized_url(), "https://example.com/story");
    }

    #[test]
    fn test_clamp_priority() {
        assert_eq!(clamp_priority(0), 1);
        assert_eq!(clamp_priority(5), 5);
        assert_eq!(clamp_priority(42), 10);
        assert_eq!(clamp_priority(DEFAULT_PRIORITY), DEFAULT_PRIORITY);
    }

    #[test]
    fn test_brief_length_serde() {
        let length: BriefLength = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(length, BriefLength::Medium);
    }
}
