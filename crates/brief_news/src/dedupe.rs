//! Cross-topic deduplication: an article matching several subscribed topics
//! is assigned exclusively to the topic where it scored highest.

use std::collections::HashMap;

use brief_core::TopicNews;

/// Two passes: record the best (topic, score) per normalized URL, then
/// filter each topic to the URLs it won. A topic losing all of its articles
/// ends up with an empty list, which is valid.
pub fn dedupe_across_topics(topic_news: Vec<TopicNews>) -> Vec<TopicNews> {
    let mut best: HashMap<String, (String, f64)> = HashMap::new();

    for topic in &topic_news {
        for scored in &topic.articles {
            let url = scored.article.normalized_url();
            match best.get(&url) {
                Some((_, existing)) if *existing >= scored.score => {}
                _ => {
                    best.insert(url, (topic.topic_id.clone(), scored.score));
                }
            }
        }
    }

    topic_news
        .into_iter()
        .map(|topic| {
            let articles = topic
                .articles
                .into_iter()
                .filter(|scored| {
                    best.get(&scored.article.normalized_url())
                        .map(|(winner, _)| *winner == topic.topic_id)
                        .unwrap_or(false)
                })
                .collect();
            TopicNews {
                topic_id: topic.topic_id,
                topic_name: topic.topic_name,
                articles,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::{NewsArticle, ScoredArticle};
    use chrono::Utc;
    use std::collections::HashSet;

    fn scored(url: &str, score: f64) -> ScoredArticle {
        ScoredArticle {
            article: NewsArticle {
                title: "Story".to_string(),
                description: String::new(),
                content: String::new(),
                url: url.to_string(),
                image_url: None,
                source: "test".to_string(),
                published_at: Utc::now(),
            },
            score,
        }
    }

    fn topic(id: &str, articles: Vec<ScoredArticle>) -> TopicNews {
        TopicNews {
            topic_id: id.to_string(),
            topic_name: id.to_uppercase(),
            articles,
        }
    }

    #[test]
    fn test_highest_scoring_topic_wins() {
        let shared = "https://example.com/shared";
        let input = vec![
            topic("crypto", vec![scored(shared, 8.2)]),
            topic("finance", vec![scored(shared, 5.1)]),
        ];

        let output = dedupe_across_topics(input);
        assert_eq!(output[0].articles.len(), 1);
        assert!(output[1].articles.is_empty());
    }

    #[test]
    fn test_each_url_appears_at_most_once() {
        let input = vec![
            topic(
                "a",
                vec![scored("https://x.com/1", 3.0), scored("https://x.com/2", 1.0)],
            ),
            topic(
                "b",
                vec![scored("https://x.com/2", 2.0), scored("https://x.com/3", 4.0)],
            ),
            topic("c", vec![scored("https://x.com/1", 2.9)]),
        ];

        let output = dedupe_across_topics(input);
        let mut seen = HashSet::new();
        for topic in &output {
            for scored in &topic.articles {
                assert!(seen.insert(scored.article.normalized_url()));
            }
        }
        // url 2 belongs to topic b (score 2.0 > 1.0), url 1 to topic a.
        assert_eq!(output[0].articles.len(), 1);
        assert_eq!(output[1].articles.len(), 2);
        assert!(output[2].articles.is_empty());
    }

    #[test]
    fn test_url_normalization_unifies_variants() {
        let input = vec![
            topic("a", vec![scored("https://x.com/story?ref=rss", 1.0)]),
            topic("b", vec![scored("https://x.com/story/", 2.0)]),
        ];

        let output = dedupe_across_topics(input);
        assert!(output[0].articles.is_empty());
        assert_eq!(output[1].articles.len(), 1);
    }

    #[test]
    fn test_first_topic_wins_exact_tie() {
        let input = vec![
            topic("a", vec![scored("https://x.com/t", 2.0)]),
            topic("b", vec![scored("https://x.com/t", 2.0)]),
        ];

        let output = dedupe_across_topics(input);
        assert_eq!(output[0].articles.len(), 1);
        assert!(output[1].articles.is_empty());
    }
}
