//! Batch delivery: fixed-size concurrent batches with per-user isolation.
//! One user's failure never aborts the rest of the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, warn};

use brief_core::types::BriefRecord;
use brief_core::{
    BatchError, BatchOutcome, BriefStore, EmailMessage, EmailSender, Result, User, UserStore,
};

use crate::generator::{local_today, BriefGenerator};
use crate::render::{render_html, render_text};

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

enum UserOutcome {
    Succeeded,
    Skipped,
    Failed(String),
}

pub struct BriefPipeline {
    generator: Arc<BriefGenerator>,
    sender: Arc<dyn EmailSender>,
    briefs: Arc<dyn BriefStore>,
    users: Arc<dyn UserStore>,
    batch_size: usize,
    batch_delay: Duration,
}

impl BriefPipeline {
    pub fn new(
        generator: Arc<BriefGenerator>,
        sender: Arc<dyn EmailSender>,
        briefs: Arc<dyn BriefStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            generator,
            sender,
            briefs,
            users,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    /// Generate, send and record one user's brief.
    pub async fn deliver(&self, user_id: &str) -> Result<BriefRecord> {
        let user = self
            .users
            .get_user(user_id)
            .await?
            .ok_or_else(|| brief_core::Error::NotFound(format!("user {}", user_id)))?;
        let preferences = self.users.preferences(user_id).await?;

        let brief = self.generator.generate(user_id).await?;

        let message = EmailMessage {
            to: user.email.clone(),
            subject: brief.subject.clone(),
            html: render_html(&brief.payload),
            text: render_text(&brief.payload),
        };
        let receipt = self.sender.send(&message).await?;

        let record = BriefRecord {
            id: receipt.id,
            user_id: user_id.to_string(),
            subject: brief.subject,
            date: local_today(preferences.utc_offset_hours),
        };
        self.briefs.record(record.clone()).await?;

        info!(user_id, brief_id = %record.id, "brief delivered");
        Ok(record)
    }

    /// Users whose local delivery hour matches the current UTC instant.
    pub async fn users_due_now(&self) -> Result<Vec<User>> {
        self.users.users_due_at(Utc::now()).await
    }

    /// Process users in fixed-size concurrent batches with a short pause
    /// between batches. Skipped (missing user, already delivered today) is
    /// a distinct non-error outcome.
    pub async fn process_batch(&self, user_ids: &[String]) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            total: user_ids.len(),
            ..BatchOutcome::default()
        };

        for (i, chunk) in user_ids.chunks(self.batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.batch_delay).await;
            }

            let results = join_all(chunk.iter().map(|user_id| self.process_user(user_id))).await;

            for (user_id, result) in chunk.iter().zip(results) {
                match result {
                    UserOutcome::Succeeded => outcome.succeeded += 1,
                    UserOutcome::Skipped => outcome.skipped += 1,
                    UserOutcome::Failed(message) => {
                        outcome.failed += 1;
                        outcome.errors.push(BatchError {
                            user_id: user_id.clone(),
                            error: message,
                        });
                    }
                }
            }
        }

        info!(
            total = outcome.total,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            skipped = outcome.skipped,
            "batch complete"
        );
        outcome
    }

    async fn process_user(&self, user_id: &str) -> UserOutcome {
        let user = match self.users.get_user(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(user_id, "unknown user, skipping");
                return UserOutcome::Skipped;
            }
            Err(err) => return UserOutcome::Failed(err.to_string()),
        };

        let preferences = match self.users.preferences(&user.id).await {
            Ok(preferences) => preferences,
            Err(err) => return UserOutcome::Failed(err.to_string()),
        };

        let today = local_today(preferences.utc_offset_hours);
        match self.briefs.has_brief_for_day(user_id, today).await {
            Ok(true) => {
                info!(user_id, "already received a brief today, skipping");
                return UserOutcome::Skipped;
            }
            Ok(false) => {}
            Err(err) => return UserOutcome::Failed(err.to_string()),
        }

        match self.deliver(user_id).await {
            Ok(_) => UserOutcome::Succeeded,
            // No subscriptions is a skip, not a failure: there is nothing
            // to build a brief from.
            Err(brief_core::Error::NoSubscriptions(_)) => {
                info!(user_id, "no subscriptions, skipping");
                UserOutcome::Skipped
            }
            Err(err) => {
                error!(user_id, error = %err, "failed to process brief");
                UserOutcome::Failed(err.to_string())
            }
        }
    }
}
