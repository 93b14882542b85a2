//! Minimal rendering at the sender boundary. The real email template layer
//! is out of scope; the send contract still needs html and text bodies.

use brief_core::BriefPayload;

pub fn render_text(payload: &BriefPayload) -> String {
    let mut out = String::new();
    out.push_str(&format!("Hi {},\n", payload.user_name));
    out.push_str(&format!(
        "Your brief for {}\n\n",
        payload.date.format("%A, %B %-d")
    ));

    for section in &payload.topics {
        out.push_str(&format!("== {} ==\n", section.name));
        if !section.synthesized_summary.is_empty() {
            out.push_str(&section.synthesized_summary);
            out.push('\n');
        }
        for article in &section.articles {
            out.push_str(&format!("- {} ({})\n", article.title, article.source_name));
        }
        if !section.sources.is_empty() {
            let sources = section
                .sources
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("Sources: {}\n", sources));
        }
        out.push('\n');
    }

    if let Some(events) = &payload.global_events {
        out.push_str("== Today's events ==\n");
        for event in events {
            out.push_str(&format!("- {}: {}\n", event.title, event.description));
        }
    }

    out
}

pub fn render_html(payload: &BriefPayload) -> String {
    format!("<pre>{}</pre>", render_text(payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::{SourceRef, TopicSection};
    use chrono::Utc;

    #[test]
    fn test_render_text_includes_sections_and_sources() {
        let payload = BriefPayload {
            user_name: "Ada".to_string(),
            date: Utc::now(),
            topics: vec![TopicSection {
                name: "Crypto".to_string(),
                category: "business".to_string(),
                articles: vec![],
                synthesized_summary: "A busy day in crypto.".to_string(),
                sources: vec![SourceRef {
                    name: "Reuters".to_string(),
                    url: "https://example.com".to_string(),
                }],
            }],
            global_events: None,
        };

        let text = render_text(&payload);
        assert!(text.contains("Hi Ada"));
        assert!(text.contains("== Crypto =="));
        assert!(text.contains("A busy day in crypto."));
        assert!(text.contains("Sources: Reuters"));
    }
}
