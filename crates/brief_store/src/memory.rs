//! In-memory backend for every store contract. Not a durable store; this is
//! the reference backend for tests, previews and the CLI.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use brief_core::types::{clamp_priority, BriefRecord};
use brief_core::{
    BriefStore, EmailMessage, EmailSender, Error, GlobalEvent, GlobalEventStore, Preferences,
    Result, SendReceipt, Subscription, SubscriptionStore, Topic, TopicStore, User, UserStore,
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    preferences: HashMap<String, Preferences>,
    topics: Vec<Topic>,
    /// (user_id, topic_id, priority)
    subscriptions: Vec<(String, String, u8)>,
    events: Vec<GlobalEvent>,
    briefs: Vec<BriefRecord>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with the stock topic catalog.
    pub async fn with_default_topics() -> Self {
        let store = Self::new();
        for topic in default_topics() {
            store.add_topic(topic).await;
        }
        store
    }

    pub async fn add_user(&self, user: User, preferences: Preferences) {
        let mut inner = self.inner.write().await;
        inner.preferences.insert(user.id.clone(), preferences);
        inner.users.push(user);
    }

    pub async fn add_topic(&self, topic: Topic) {
        self.inner.write().await.topics.push(topic);
    }

    pub async fn add_event(&self, event: GlobalEvent) {
        self.inner.write().await.events.push(event);
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>> {
        let inner = self.inner.read().await;
        let mut subscriptions: Vec<Subscription> = inner
            .subscriptions
            .iter()
            .filter(|(uid, _, _)| uid == user_id)
            .filter_map(|(uid, topic_id, priority)| {
                inner
                    .topics
                    .iter()
                    .find(|topic| &topic.id == topic_id)
                    .map(|topic| Subscription {
                        user_id: uid.clone(),
                        topic: topic.clone(),
                        priority: *priority,
                    })
            })
            .collect();
        subscriptions.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(subscriptions)
    }

    async fn subscribe(&self, user_id: &str, topic_id: &str, priority: u8) -> Result<Subscription> {
        let priority = clamp_priority(priority);
        let mut inner = self.inner.write().await;

        let topic = inner
            .topics
            .iter()
            .find(|topic| topic.id == topic_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("topic {}", topic_id)))?;

        if let Some(existing) = inner
            .subscriptions
            .iter_mut()
            .find(|(uid, tid, _)| uid == user_id && tid == topic_id)
        {
            existing.2 = priority;
            debug!(user_id, topic_id, priority, "updated subscription priority");
        } else {
            inner
                .subscriptions
                .push((user_id.to_string(), topic_id.to_string(), priority));
        }

        Ok(Subscription {
            user_id: user_id.to_string(),
            topic,
            priority,
        })
    }

    async fn unsubscribe(&self, user_id: &str, topic_id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .subscriptions
            .retain(|(uid, tid, _)| !(uid == user_id && tid == topic_id));
        Ok(())
    }
}

#[async_trait]
impl TopicStore for MemoryStore {
    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>> {
        let inner = self.inner.read().await;
        Ok(inner.topics.iter().find(|topic| topic.id == topic_id).cloned())
    }

    async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.inner.read().await.topics.clone())
    }
}

#[async_trait]
impl GlobalEventStore for MemoryStore {
    async fn active_events_for_date(&self, date: NaiveDate) -> Result<Vec<GlobalEvent>> {
        let inner = self.inner.read().await;
        let mut events: Vec<GlobalEvent> = inner
            .events
            .iter()
            .filter(|event| event.date.date_naive() == date)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.date);
        Ok(events)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|user| user.id == user_id).cloned())
    }

    async fn preferences(&self, user_id: &str) -> Result<Preferences> {
        let inner = self.inner.read().await;
        Ok(inner.preferences.get(user_id).cloned().unwrap_or_default())
    }

    async fn users_due_at(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        let inner = self.inner.read().await;
        let due = inner
            .users
            .iter()
            .filter(|user| {
                let has_subscription = inner
                    .subscriptions
                    .iter()
                    .any(|(uid, _, _)| uid == &user.id);
                if !has_subscription {
                    return false;
                }
                let prefs = inner.preferences.get(&user.id).cloned().unwrap_or_default();
                let local_hour =
                    (now.hour() as i32 + prefs.utc_offset_hours as i32).rem_euclid(24) as u8;
                local_hour == prefs.delivery_hour
            })
            .cloned()
            .collect();
        Ok(due)
    }
}

#[async_trait]
impl BriefStore for MemoryStore {
    async fn record(&self, brief: BriefRecord) -> Result<()> {
        self.inner.write().await.briefs.push(brief);
        Ok(())
    }

    async fn has_brief_for_day(&self, user_id: &str, date: NaiveDate) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .briefs
            .iter()
            .any(|brief| brief.user_id == user_id && brief.date == date))
    }

    async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<BriefRecord>> {
        let inner = self.inner.read().await;
        let mut briefs: Vec<BriefRecord> = inner
            .briefs
            .iter()
            .filter(|brief| brief.user_id == user_id)
            .cloned()
            .collect();
        briefs.sort_by(|a, b| b.date.cmp(&a.date));
        briefs.truncate(limit);
        Ok(briefs)
    }
}

/// Sender that records nothing and always succeeds. Transport is out of
/// scope; this satisfies the one-shot contract for local runs.
#[derive(Debug, Default, Clone)]
pub struct NoopSender;

#[async_trait]
impl EmailSender for NoopSender {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt> {
        debug!(to = %message.to, subject = %message.subject, "noop email send");
        Ok(SendReceipt {
            id: Uuid::new_v4().to_string(),
        })
    }
}

/// Stock topic catalog for seeding fresh deployments.
pub fn default_topics() -> Vec<Topic> {
    fn topic(name: &str, category: &str, keywords: &[&str]) -> Topic {
        Topic {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            is_global: false,
        }
    }

    vec![
        topic(
            "AI & Machine Learning",
            "technology",
            &["artificial intelligence", "machine learning", "deep learning", "AI", "LLM"],
        ),
        topic(
            "Cybersecurity",
            "technology",
            &["cybersecurity", "data breach", "ransomware", "security vulnerability", "privacy"],
        ),
        topic(
            "Startups",
            "technology",
            &["startup", "venture capital", "funding", "seed round", "acquisition"],
        ),
        topic(
            "Stock Market",
            "business",
            &["stock market", "S&P 500", "NASDAQ", "stocks", "Wall Street"],
        ),
        topic(
            "Crypto & Blockchain",
            "business",
            &["cryptocurrency", "Bitcoin", "Ethereum", "blockchain", "crypto"],
        ),
    ]
}
