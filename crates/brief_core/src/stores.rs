//! Collaborator contracts the pipeline consumes. Backends live in
//! `brief_store`; the pipeline only ever sees these traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{
    BriefRecord, EmailMessage, GlobalEvent, Preferences, SendReceipt, Subscription, Topic, User,
};
use crate::Result;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// All subscriptions for a user, ordered by priority descending.
    async fn list_subscriptions(&self, user_id: &str) -> Result<Vec<Subscription>>;

    /// Upsert: re-subscribing updates the priority instead of erroring.
    /// Priority is clamped to [1, 10].
    async fn subscribe(&self, user_id: &str, topic_id: &str, priority: u8) -> Result<Subscription>;

    /// Removes the link only, never the topic.
    async fn unsubscribe(&self, user_id: &str, topic_id: &str) -> Result<()>;
}

#[async_trait]
pub trait TopicStore: Send + Sync {
    async fn get_topic(&self, topic_id: &str) -> Result<Option<Topic>>;

    async fn list_topics(&self) -> Result<Vec<Topic>>;
}

#[async_trait]
pub trait GlobalEventStore: Send + Sync {
    /// Active events whose date falls on the given day, ascending by date.
    async fn active_events_for_date(&self, date: NaiveDate) -> Result<Vec<GlobalEvent>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>>;

    /// Defaults apply for users who never touched their settings.
    async fn preferences(&self, user_id: &str) -> Result<Preferences>;

    /// Users with at least one subscription whose local delivery hour
    /// matches the given UTC instant.
    async fn users_due_at(&self, now: DateTime<Utc>) -> Result<Vec<User>>;
}

#[async_trait]
pub trait BriefStore: Send + Sync {
    async fn record(&self, brief: BriefRecord) -> Result<()>;

    /// Whether the user already received a brief on the given (local) day.
    async fn has_brief_for_day(&self, user_id: &str, date: NaiveDate) -> Result<bool>;

    async fn recent_for_user(&self, user_id: &str, limit: usize) -> Result<Vec<BriefRecord>>;
}

/// One-shot outbound email contract; transport is out of scope.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<SendReceipt>;
}
