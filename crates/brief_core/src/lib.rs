pub mod error;
pub mod model;
pub mod stores;
pub mod text;
pub mod types;

pub use error::Error;
pub use model::LanguageModel;
pub use stores::{
    BriefStore, EmailSender, GlobalEventStore, SubscriptionStore, TopicStore, UserStore,
};
pub use types::{
    ArticleSummary, BatchError, BatchOutcome, BriefData, BriefLength, BriefPayload, BriefRecord,
    EmailMessage, GlobalEvent, NewsArticle, Preferences, ScoredArticle, SendReceipt, SourceRef,
    Subscription, SynthesisResult, Topic, TopicNews, TopicSection, User,
};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use super::error::Error;
    pub use super::model::LanguageModel;
    pub use super::types::*;
    pub use super::Result;
}
