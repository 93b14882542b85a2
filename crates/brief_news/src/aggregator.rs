//! Drives fetch → cache → score → limit → dedupe across all of a user's
//! subscribed topics.

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::warn;

use brief_core::{Error, Result, ScoredArticle, SubscriptionStore, Topic, TopicNews, TopicStore};

use crate::cache::NewsCache;
use crate::dedupe::dedupe_across_topics;
use crate::fetcher::{ArticleSource, FetchOptions};
use crate::scorer::{score_articles, ScoringWeights};

const FETCH_WINDOW_DAYS: i64 = 3;
const FETCH_MAX_RESULTS: usize = 20;

/// Articles a topic contributes to the brief, by subscription priority.
pub fn max_articles_for_priority(priority: u8) -> usize {
    match priority {
        p if p >= 10 => 7,
        p if p >= 7 => 5,
        p if p >= 4 => 3,
        _ => 2,
    }
}

pub struct NewsAggregator {
    source: Arc<dyn ArticleSource>,
    cache: Arc<NewsCache>,
    subscriptions: Arc<dyn SubscriptionStore>,
    topics: Arc<dyn TopicStore>,
    weights: ScoringWeights,
}

impl NewsAggregator {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        cache: Arc<NewsCache>,
        subscriptions: Arc<dyn SubscriptionStore>,
        topics: Arc<dyn TopicStore>,
    ) -> Self {
        Self {
            source,
            cache,
            subscriptions,
            topics,
            weights: ScoringWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Fetch, score, limit and dedupe news for every topic the user is
    /// subscribed to. Output preserves priority order; after dedup each
    /// article URL appears under at most one topic.
    pub async fn aggregate_for_user(&self, user_id: &str) -> Result<Vec<TopicNews>> {
        let subscriptions = self.subscriptions.list_subscriptions(user_id).await?;
        if subscriptions.is_empty() {
            return Ok(Vec::new());
        }

        let topic_futures: Vec<_> = subscriptions
            .iter()
            .map(|sub| async move {
                let mut articles = self.fetch_topic_news(&sub.topic).await?;
                articles.truncate(max_articles_for_priority(sub.priority));
                Ok::<_, Error>(TopicNews {
                    topic_id: sub.topic.id.clone(),
                    topic_name: sub.topic.name.clone(),
                    articles,
                })
            })
            .collect();

        let all_topics = join_all(topic_futures)
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()?;

        Ok(dedupe_across_topics(all_topics))
    }

    /// Scored articles for one topic, via the cache when fresh. The cache
    /// holds raw fetch results; scoring always runs against the topic's own
    /// keywords.
    pub async fn fetch_topic_news(&self, topic: &Topic) -> Result<Vec<ScoredArticle>> {
        if topic.keywords.is_empty() {
            warn!(topic = %topic.name, "topic has no keywords");
            return Ok(Vec::new());
        }

        let key = NewsCache::cache_key(&topic.keywords, Some(Utc::now().date_naive()));
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(score_articles(&cached, &topic.keywords, &self.weights));
        }

        let now = Utc::now();
        let options = FetchOptions::new(topic.keywords.clone())
            .with_window(now - Duration::days(FETCH_WINDOW_DAYS), now)
            .with_max_results(FETCH_MAX_RESULTS);

        let articles = self.source.fetch_articles(&options).await;
        self.cache.set(&key, articles.clone()).await;

        Ok(score_articles(&articles, &topic.keywords, &self.weights))
    }

    /// Single-topic variant for previews.
    pub async fn fetch_by_topic_id(&self, topic_id: &str) -> Result<Vec<ScoredArticle>> {
        let topic = self
            .topics
            .get_topic(topic_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("topic {}", topic_id)))?;
        self.fetch_topic_news(&topic).await
    }

    /// Multi-topic preview, grouped by topic. Unknown ids are skipped.
    pub async fn fetch_for_topics(&self, topic_ids: &[String]) -> Result<Vec<TopicNews>> {
        let mut topics = Vec::new();
        for topic_id in topic_ids {
            if let Some(topic) = self.topics.get_topic(topic_id).await? {
                topics.push(topic);
            }
        }

        let futures: Vec<_> = topics
            .iter()
            .map(|topic| async move {
                let articles = self.fetch_topic_news(topic).await?;
                Ok::<_, Error>(TopicNews {
                    topic_id: topic.id.clone(),
                    topic_name: topic.name.clone(),
                    articles,
                })
            })
            .collect();

        join_all(futures).await.into_iter().collect()
    }
}
