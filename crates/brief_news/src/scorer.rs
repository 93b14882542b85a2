//! Relevance scoring. Weights and the decay constant are hand-tuned
//! defaults, kept configurable rather than treated as load-bearing.

use chrono::Utc;
use regex::RegexBuilder;

use brief_core::{NewsArticle, ScoredArticle};

/// Sources that get the full reliability score. Matching is a
/// case-insensitive substring check on the article's source name.
const TRUSTED_SOURCES: &[&str] = &[
    "BBC News",
    "The New York Times",
    "Reuters",
    "Associated Press",
    "The Guardian",
    "NPR",
    "The Wall Street Journal",
    "Bloomberg",
    "Financial Times",
    "The Economist",
    "CNN",
    "CNBC",
    "TechCrunch",
    "Ars Technica",
    "The Verge",
    "Wired",
];

#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub title_match: f64,
    pub description_match: f64,
    pub recency: f64,
    pub source_reliability: f64,
    /// Exponential decay rate per hour of article age.
    pub decay_rate: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            title_match: 5.0,
            description_match: 2.0,
            recency: 1.5,
            source_reliability: 1.0,
            decay_rate: 0.02,
        }
    }
}

/// Score and sort descending. The sort is stable so ties keep fetch order,
/// which keeps results reproducible.
pub fn score_articles(
    articles: &[NewsArticle],
    keywords: &[String],
    weights: &ScoringWeights,
) -> Vec<ScoredArticle> {
    let mut scored: Vec<ScoredArticle> = articles
        .iter()
        .map(|article| ScoredArticle {
            article: article.clone(),
            score: relevance_score(article, keywords, weights),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

fn relevance_score(article: &NewsArticle, keywords: &[String], weights: &ScoringWeights) -> f64 {
    let mut score = 0.0;
    score += keyword_score(&article.title, keywords) * weights.title_match;
    score += keyword_score(&article.description, keywords) * weights.description_match;
    score += recency_score(article, weights.decay_rate) * weights.recency;
    score += source_score(&article.source) * weights.source_reliability;
    score
}

/// Whole-word keyword match density in a field, clamped to [0, 1].
fn keyword_score(text: &str, keywords: &[String]) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let mut matches = 0usize;
    for keyword in keywords {
        let pattern = format!(r"\b{}\b", regex::escape(keyword));
        let re = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(re) => re,
            Err(_) => continue,
        };
        matches += re.find_iter(text).count();
    }

    let word_count = text.split_whitespace().count().max(1);
    (matches as f64 / word_count as f64).min(1.0)
}

/// `exp(-decay_rate * age_hours)`: near 1.0 within the last day, decaying
/// toward 0 past ~72 hours, never exactly 0. Age is floored at zero so
/// future-dated feed items cannot outrank fresh ones.
fn recency_score(article: &NewsArticle, decay_rate: f64) -> f64 {
    let age_hours = (Utc::now() - article.published_at).num_seconds() as f64 / 3600.0;
    (-decay_rate * age_hours.max(0.0)).exp()
}

fn source_score(source: &str) -> f64 {
    let source_lower = source.to_lowercase();
    let trusted = TRUSTED_SOURCES
        .iter()
        .any(|trusted| source_lower.contains(&trusted.to_lowercase()));
    if trusted {
        1.0
    } else {
        0.5
    }
}
