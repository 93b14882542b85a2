//! Per-topic AI synthesis: candidate selection → prompting → parsing →
//! success or extractive fallback. The synthesizer never errors for a
//! non-empty input; every failure path degrades to readable output.

use std::sync::Arc;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use brief_core::text::{clean_text, truncate_chars};
use brief_core::{
    ArticleSummary, BriefLength, LanguageModel, ScoredArticle, SourceRef, SynthesisResult,
};

const SYNTHESIS_MAX_TOKENS: u32 = 2000;
const SYNTHESIS_TEMPERATURE: f32 = 0.7;
const SUMMARY_CHARS: usize = 300;
/// Anything shorter than this is not a real synthesis; treat as a parse
/// failure even when the model call itself succeeded.
const MIN_NARRATIVE_CHARS: usize = 80;
const FALLBACK_SOURCES: usize = 3;

fn used_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^\s*used:\s*([0-9,\s]+)\s*$").unwrap())
}

fn citation_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\d+\]").unwrap())
}

fn label_prefix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(summary|synthesis|narrative|paragraph)\s*:\s*").unwrap())
}

/// How many candidates the model sees: more than will ultimately be shown,
/// so the model can judge importance and drop low-value duplicates.
fn candidate_count(length: BriefLength) -> usize {
    match length {
        BriefLength::Short => 5,
        BriefLength::Medium => 7,
        BriefLength::Long => 10,
    }
}

fn sentence_range(length: BriefLength) -> &'static str {
    match length {
        BriefLength::Short => "2-4 sentences",
        BriefLength::Medium => "4-6 sentences",
        BriefLength::Long => "6-10 sentences",
    }
}

pub struct Synthesizer {
    model: Arc<dyn LanguageModel>,
    call_timeout: Duration,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            call_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Synthesize one topic's articles into a narrative paragraph plus the
    /// cited source list. Empty input short-circuits without a model call.
    pub async fn synthesize(
        &self,
        articles: &[ScoredArticle],
        topic_name: &str,
        length: BriefLength,
    ) -> SynthesisResult {
        if articles.is_empty() {
            return SynthesisResult::default();
        }

        let candidates = &articles[..articles.len().min(candidate_count(length))];
        // Per-article summaries are produced regardless of how synthesis
        // goes; the renderer and the brief store both want them.
        let summaries: Vec<ArticleSummary> = candidates.iter().map(article_summary).collect();

        let prompt = build_prompt(candidates, topic_name, length);

        let completion =
            match tokio::time::timeout(self.call_timeout, self.model.complete(&prompt, SYNTHESIS_MAX_TOKENS, SYNTHESIS_TEMPERATURE)).await {
                Ok(Ok(text)) => text,
                Ok(Err(err)) => {
                    warn!(topic = topic_name, error = %err, "synthesis model call failed");
                    return fallback(candidates, topic_name, summaries);
                }
                Err(_) => {
                    warn!(topic = topic_name, "synthesis model call timed out");
                    return fallback(candidates, topic_name, summaries);
                }
            };

        let (narrative, cited) = parse_completion(&completion, candidates.len());

        if narrative.chars().count() < MIN_NARRATIVE_CHARS {
            warn!(
                topic = topic_name,
                chars = narrative.chars().count(),
                "synthesis too short, using fallback"
            );
            return fallback(candidates, topic_name, summaries);
        }

        let cited = if cited.is_empty() {
            // Model gave no usable citation list; cite the leading
            // candidates rather than nothing.
            (0..candidates.len().min(FALLBACK_SOURCES)).collect()
        } else {
            cited
        };

        let sources = cited
            .into_iter()
            .map(|i| SourceRef {
                name: candidates[i].article.source.clone(),
                url: candidates[i].article.url.clone(),
            })
            .collect();

        debug!(topic = topic_name, "synthesis succeeded");
        SynthesisResult {
            articles: summaries,
            synthesized_summary: narrative,
            sources,
        }
    }
}

fn article_summary(scored: &ScoredArticle) -> ArticleSummary {
    let article = &scored.article;
    ArticleSummary {
        title: article.title.clone(),
        summary: truncate_chars(&clean_text(&article.description), SUMMARY_CHARS),
        source_url: article.url.clone(),
        source_name: article.source.clone(),
        published_at: article.published_at,
        image_url: article.image_url.clone(),
    }
}

fn build_prompt(candidates: &[ScoredArticle], topic_name: &str, length: BriefLength) -> String {
    let article_texts = candidates
        .iter()
        .enumerate()
        .map(|(i, scored)| {
            let article = &scored.article;
            let body = if article.content.is_empty() {
                &article.description
            } else {
                &article.content
            };
            format!(
                "Article {}:\nTitle: {}\nSource: {}\nContent: {}",
                i + 1,
                clean_text(&article.title),
                article.source,
                clean_text(body)
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n");

    format!(
        "You are a professional news editor writing one section of a daily email briefing. \
The section covers \"{topic}\". Below are {count} candidate articles.\n\n\
{articles}\n\n\
Write ONE flowing paragraph of {sentences} that synthesizes the genuinely important news. \
Rules:\n\
- Skip trivial, promotional or pure-opinion pieces; you do not have to use every article.\n\
- Do not put citation markers or bracketed numbers in the prose.\n\
- Write for a general audience: factual, neutral, engaging.\n\
- After the paragraph, on its own final line, write exactly:\n\
USED: <comma-separated numbers of the articles you drew on, e.g. USED: 1, 3>",
        topic = topic_name,
        count = candidates.len(),
        articles = article_texts,
        sentences = sentence_range(length),
    )
}

/// Extract the narrative and the 0-based cited indices from the model's
/// completion. The last USED line wins when the model emits several, but
/// every USED line is protocol, not prose, so all of them are stripped from
/// the narrative. Out-of-range indices are dropped; a missing USED line
/// yields an empty index list for the caller to handle.
fn parse_completion(completion: &str, candidate_count: usize) -> (String, Vec<usize>) {
    let indices: Vec<usize> = used_line_regex()
        .captures_iter(completion)
        .last()
        .and_then(|cap| cap.get(1))
        .map(|list| {
            list.as_str()
                .split(',')
                .filter_map(|part| part.trim().parse::<usize>().ok())
                .filter(|n| *n >= 1 && *n <= candidate_count)
                .map(|n| n - 1)
                .collect()
        })
        .unwrap_or_default();

    let without_used = used_line_regex().replace_all(completion, "");
    let without_markers = citation_marker_regex().replace_all(&without_used, "");
    let trimmed = without_markers.trim();
    let narrative = label_prefix_regex().replace(trimmed, "").trim().to_string();

    (narrative, indices)
}

/// Deterministic extractive fallback: always readable, never errors.
fn fallback(
    candidates: &[ScoredArticle],
    topic_name: &str,
    summaries: Vec<ArticleSummary>,
) -> SynthesisResult {
    let narrative = if candidates.len() == 1 {
        let article = &candidates[0].article;
        format!(
            "Today in {}, {} reports: {}.",
            topic_name, article.source, article.title
        )
    } else {
        let headlines = candidates
            .iter()
            .take(FALLBACK_SOURCES)
            .map(|scored| format!("{} ({})", scored.article.title, scored.article.source))
            .collect::<Vec<_>>()
            .join("; ");
        format!("Today in {}: {}.", topic_name, headlines)
    };

    let sources = candidates
        .iter()
        .take(FALLBACK_SOURCES)
        .map(|scored| SourceRef {
            name: scored.article.source.clone(),
            url: scored.article.url.clone(),
        })
        .collect();

    SynthesisResult {
        articles: summaries,
        synthesized_summary: narrative,
        sources,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use brief_core::{Error, NewsArticle, Result};
    use chrono::Utc;

    struct CannedModel {
        response: String,
    }

    #[async_trait]
    impl LanguageModel for CannedModel {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            Err(Error::Model("connection reset".to_string()))
        }
    }

    struct HangingModel;

    #[async_trait]
    impl LanguageModel for HangingModel {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(&self, _prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(300)).await;
            Ok(String::new())
        }
    }

    fn scored(title: &str, source: &str, url: &str) -> ScoredArticle {
        ScoredArticle {
            article: NewsArticle {
                title: title.to_string(),
                description: format!("{} in more detail.", title),
                content: String::new(),
                url: url.to_string(),
                image_url: None,
                source: source.to_string(),
                published_at: Utc::now(),
            },
            score: 1.0,
        }
    }

    fn articles(n: usize) -> Vec<ScoredArticle> {
        (0..n)
            .map(|i| {
                scored(
                    &format!("Headline number {}", i + 1),
                    "Reuters",
                    &format!("https://example.com/{}", i + 1),
                )
            })
            .collect()
    }

    const GOOD_PARAGRAPH: &str = "Markets spent the day digesting a wave of regulatory news, \
with exchanges adjusting listings while institutional buyers kept accumulating through the dip.";

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let synthesizer = Synthesizer::new(Arc::new(FailingModel));
        let result = synthesizer.synthesize(&[], "Topic", BriefLength::Medium).await;
        assert!(result.articles.is_empty());
        assert!(result.synthesized_summary.is_empty());
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn test_success_path_parses_used_line() {
        let response = format!("{}\nUSED: 1, 3", GOOD_PARAGRAPH);
        let synthesizer = Synthesizer::new(Arc::new(CannedModel { response }));
        let result = synthesizer
            .synthesize(&articles(4), "Crypto", BriefLength::Medium)
            .await;

        assert_eq!(result.synthesized_summary, GOOD_PARAGRAPH);
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].url, "https://example.com/1");
        assert_eq!(result.sources[1].url, "https://example.com/3");
        assert_eq!(result.articles.len(), 4);
    }

    #[tokio::test]
    async fn test_out_of_range_indices_are_dropped() {
        let response = format!("{}\nUSED: 2, 9, 0", GOOD_PARAGRAPH);
        let synthesizer = Synthesizer::new(Arc::new(CannedModel { response }));
        let result = synthesizer
            .synthesize(&articles(3), "Crypto", BriefLength::Medium)
            .await;

        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].url, "https://example.com/2");
    }

    #[tokio::test]
    async fn test_missing_used_line_cites_first_three() {
        let synthesizer = Synthesizer::new(Arc::new(CannedModel {
            response: GOOD_PARAGRAPH.to_string(),
        }));
        let result = synthesizer
            .synthesize(&articles(5), "Crypto", BriefLength::Medium)
            .await;

        assert_eq!(result.synthesized_summary, GOOD_PARAGRAPH);
        assert_eq!(result.sources.len(), 3);
        assert_eq!(result.sources[0].url, "https://example.com/1");
    }

    #[tokio::test]
    async fn test_markers_and_labels_stripped() {
        let response = format!("Summary: {} [1] trailing [2]\nUSED: 1", GOOD_PARAGRAPH);
        let synthesizer = Synthesizer::new(Arc::new(CannedModel { response }));
        let result = synthesizer
            .synthesize(&articles(2), "Crypto", BriefLength::Medium)
            .await;

        assert!(result.synthesized_summary.starts_with("Markets spent"));
        assert!(!result.synthesized_summary.contains('['));
    }

    #[tokio::test]
    async fn test_too_short_narrative_triggers_fallback() {
        let synthesizer = Synthesizer::new(Arc::new(CannedModel {
            response: "Fine.\nUSED: 1".to_string(),
        }));
        let result = synthesizer
            .synthesize(&articles(2), "Crypto", BriefLength::Medium)
            .await;

        assert!(result.synthesized_summary.starts_with("Today in Crypto"));
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_multiple_articles() {
        let synthesizer = Synthesizer::new(Arc::new(FailingModel));
        let result = synthesizer
            .synthesize(&articles(5), "Crypto", BriefLength::Medium)
            .await;

        assert!(result.synthesized_summary.starts_with("Today in Crypto"));
        assert!(!result.synthesized_summary.is_empty());
        assert!(!result.sources.is_empty());
        assert!(result.sources.len() <= 3);
        assert_eq!(result.articles.len(), 5);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_single_article() {
        let synthesizer = Synthesizer::new(Arc::new(FailingModel));
        let input = vec![scored("Bitcoin rallies", "Reuters", "https://example.com/1")];
        let result = synthesizer.synthesize(&input, "Crypto", BriefLength::Short).await;

        assert_eq!(
            result.synthesized_summary,
            "Today in Crypto, Reuters reports: Bitcoin rallies."
        );
        assert_eq!(result.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_treated_as_failure() {
        let synthesizer = Synthesizer::new(Arc::new(HangingModel))
            .with_call_timeout(Duration::from_millis(20));
        let result = synthesizer
            .synthesize(&articles(2), "Crypto", BriefLength::Medium)
            .await;

        assert!(result.synthesized_summary.starts_with("Today in Crypto"));
    }

    #[tokio::test]
    async fn test_candidate_counts_by_length() {
        // Long briefs feed the model (and the summary list) up to 10.
        let response = format!("{}\nUSED: 1", GOOD_PARAGRAPH);
        let synthesizer = Synthesizer::new(Arc::new(CannedModel { response }));
        let many = articles(12);

        let short = synthesizer.synthesize(&many, "T", BriefLength::Short).await;
        let medium = synthesizer.synthesize(&many, "T", BriefLength::Medium).await;
        let long = synthesizer.synthesize(&many, "T", BriefLength::Long).await;

        assert_eq!(short.articles.len(), 5);
        assert_eq!(medium.articles.len(), 7);
        assert_eq!(long.articles.len(), 10);
    }

    #[test]
    fn test_parse_completion_uses_last_used_line() {
        let text = "USED: 3\nA real paragraph here.\nUSED: 1, 2";
        let (narrative, cited) = parse_completion(text, 3);
        assert_eq!(cited, vec![0, 1]);
        assert!(narrative.contains("real paragraph"));
    }

    #[test]
    fn test_parse_completion_strips_every_used_line() {
        let text = "USED: 3\nA real paragraph here.\nUSED: 1, 2";
        let (narrative, _) = parse_completion(text, 3);
        assert_eq!(narrative, "A real paragraph here.");

        let (narrative, cited) = parse_completion("USED: 2\nOnly protocol above.", 3);
        assert_eq!(cited, vec![1]);
        assert!(!narrative.to_lowercase().contains("used"));
    }
}
