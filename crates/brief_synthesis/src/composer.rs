//! Assembles synthesized topic sections and global events into a complete
//! brief payload, then asks the model for a subject line.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, warn};

use brief_core::text::truncate_chars;
use brief_core::{
    BriefData, BriefPayload, GlobalEvent, LanguageModel, Preferences, Result, TopicNews,
    TopicSection, User,
};

use crate::synthesizer::Synthesizer;

const SUBJECT_MAX_TOKENS: u32 = 100;
const SUBJECT_TEMPERATURE: f32 = 0.8;
/// The prompt asks for 60 chars; anything the model returns up to this is
/// still acceptable after trimming.
const SUBJECT_ACCEPT_CHARS: usize = 80;
const SUBJECT_PREVIEW_CHARS: usize = 100;
const SUBJECT_TOPIC_COUNT: usize = 3;

pub struct Composer {
    model: Arc<dyn LanguageModel>,
    synthesizer: Synthesizer,
    call_timeout: Duration,
}

impl Composer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            synthesizer: Synthesizer::new(model.clone()),
            model,
            call_timeout: Duration::from_secs(20),
        }
    }

    pub fn with_synthesizer(mut self, synthesizer: Synthesizer) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    /// Build the complete brief: per-topic synthesis runs concurrently,
    /// sections keep the order the topics arrived in (subscription
    /// priority), global events appear only when the user asked for them.
    pub async fn compose(
        &self,
        user: &User,
        topic_news: Vec<TopicNews>,
        global_events: &[GlobalEvent],
        preferences: &Preferences,
    ) -> Result<BriefData> {
        let with_articles: Vec<TopicNews> = topic_news
            .into_iter()
            .filter(|topic| !topic.articles.is_empty())
            .collect();

        let synthesis_futures: Vec<_> = with_articles
            .iter()
            .map(|topic| {
                self.synthesizer.synthesize(
                    &topic.articles,
                    &topic.topic_name,
                    preferences.brief_length,
                )
            })
            .collect();
        let results = join_all(synthesis_futures).await;

        let mut sections = Vec::new();
        for (topic, result) in with_articles.iter().zip(results) {
            if result.articles.is_empty() {
                continue;
            }
            sections.push(TopicSection {
                name: topic.topic_name.clone(),
                category: "general".to_string(),
                articles: result.articles,
                synthesized_summary: result.synthesized_summary,
                sources: result.sources,
            });
        }

        let events = if preferences.include_global && !global_events.is_empty() {
            Some(global_events.to_vec())
        } else {
            None
        };

        let subject = self.generate_subject(&sections).await;

        Ok(BriefData {
            subject,
            payload: BriefPayload {
                user_name: user.name.clone().unwrap_or_else(|| "there".to_string()),
                date: Utc::now(),
                topics: sections,
                global_events: events,
            },
        })
    }

    /// Subject line from the model, with a deterministic templated fallback
    /// for any failure, empty or oversize response.
    async fn generate_subject(&self, sections: &[TopicSection]) -> String {
        if sections.is_empty() {
            return fallback_subject();
        }

        let topic_info = sections
            .iter()
            .take(SUBJECT_TOPIC_COUNT)
            .map(|section| {
                let preview = if section.synthesized_summary.is_empty() {
                    section
                        .articles
                        .first()
                        .map(|a| a.title.clone())
                        .unwrap_or_default()
                } else {
                    truncate_chars(&section.synthesized_summary, SUBJECT_PREVIEW_CHARS)
                };
                format!("{}: {}", section.name, preview)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Generate a short, catchy email subject line (max 60 characters) for a daily \
news briefing email.\n\nThe brief covers these topics and headlines:\n{}\n\n\
The subject should be:\n\
- Brief and punchy (under 60 characters)\n\
- Engaging and clickable\n\
- Reflect the most interesting story of the day\n\
- Not use emojis\n\n\
Just respond with the subject line, nothing else.",
            topic_info
        );

        let completion = match tokio::time::timeout(
            self.call_timeout,
            self.model
                .complete(&prompt, SUBJECT_MAX_TOKENS, SUBJECT_TEMPERATURE),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                warn!(error = %err, "subject generation failed");
                return fallback_subject();
            }
            Err(_) => {
                warn!("subject generation timed out");
                return fallback_subject();
            }
        };

        let subject = completion.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if !subject.is_empty() && subject.chars().count() <= SUBJECT_ACCEPT_CHARS {
            debug!(subject, "using model subject line");
            subject.to_string()
        } else {
            fallback_subject()
        }
    }
}

fn fallback_subject() -> String {
    format!("Your Daily Brief — {}", Utc::now().format("%A, %b %-d"))
}
