//! Deterministic model for tests and offline runs. Produces output shaped
//! like the prompts expect: a paragraph plus a USED line for synthesis
//! prompts, one bare line for subject prompts.

use std::fmt;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use brief_core::{LanguageModel, Result};

fn article_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^Article (\d+):\s*\nTitle: (.+)$").unwrap())
}

pub struct OfflineModel;

impl fmt::Debug for OfflineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OfflineModel").finish()
    }
}

#[async_trait]
impl LanguageModel for OfflineModel {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn complete(&self, prompt: &str, _max_tokens: u32, _temperature: f32) -> Result<String> {
        let titles: Vec<String> = article_header_regex()
            .captures_iter(prompt)
            .filter_map(|cap| cap.get(2).map(|m| m.as_str().to_string()))
            .collect();

        if titles.is_empty() {
            // Subject prompt (or anything without numbered articles).
            return Ok("Your headlines, distilled".to_string());
        }

        let used: Vec<String> = (1..=titles.len().min(3)).map(|i| i.to_string()).collect();
        let narrative = format!(
            "The day's coverage centered on {}. Together these stories sketch where the \
topic is heading, with follow-up reporting expected over the coming days.",
            titles
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", then ")
        );

        Ok(format!("{}\nUSED: {}", narrative, used.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthesis_prompt_yields_used_line() {
        let model = OfflineModel;
        let prompt = "Some instructions\nArticle 1:\nTitle: First headline\nSource: X\nContent: c\n---\nArticle 2:\nTitle: Second headline\nSource: Y\nContent: c";
        let out = model.complete(prompt, 100, 0.0).await.unwrap();

        assert!(out.contains("First headline"));
        assert!(out.ends_with("USED: 1, 2"));
        assert!(out.len() > 80);
    }

    #[tokio::test]
    async fn test_other_prompts_yield_subject() {
        let model = OfflineModel;
        let out = model.complete("Generate a subject line", 100, 0.0).await.unwrap();
        assert_eq!(out, "Your headlines, distilled");
    }
}
