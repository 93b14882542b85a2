//! Per-user pipeline: subscriptions → aggregation → events → composition.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use brief_core::{BriefData, Error, GlobalEventStore, Result, SubscriptionStore, UserStore};
use brief_news::NewsAggregator;
use brief_synthesis::Composer;

pub struct BriefGenerator {
    aggregator: Arc<NewsAggregator>,
    composer: Arc<Composer>,
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
    events: Arc<dyn GlobalEventStore>,
}

impl BriefGenerator {
    pub fn new(
        aggregator: Arc<NewsAggregator>,
        composer: Arc<Composer>,
        users: Arc<dyn UserStore>,
        subscriptions: Arc<dyn SubscriptionStore>,
        events: Arc<dyn GlobalEventStore>,
    ) -> Self {
        Self {
            aggregator,
            composer,
            users,
            subscriptions,
            events,
        }
    }

    /// Generate a complete brief for one user. Every internal stage degrades
    /// rather than raises; the one hard abort is a user with zero topic
    /// subscriptions.
    pub async fn generate(&self, user_id: &str) -> Result<BriefData> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user_id)))?;

        let subscriptions = self.subscriptions.list_subscriptions(user_id).await?;
        if subscriptions.is_empty() {
            return Err(Error::NoSubscriptions(user_id.to_string()));
        }

        let preferences = self.users.preferences(user_id).await?;

        let topic_news = self.aggregator.aggregate_for_user(user_id).await?;

        let events = if preferences.include_global {
            let today = local_today(preferences.utc_offset_hours);
            self.events.active_events_for_date(today).await?
        } else {
            Vec::new()
        };

        let brief = self
            .composer
            .compose(&user, topic_news, &events, &preferences)
            .await?;

        info!(
            user_id,
            topics = brief.payload.topics.len(),
            "generated brief"
        );
        Ok(brief)
    }
}

/// The user's current calendar day under their fixed UTC offset.
pub(crate) fn local_today(utc_offset_hours: i8) -> chrono::NaiveDate {
    (Utc::now() + Duration::hours(utc_offset_hours as i64)).date_naive()
}
