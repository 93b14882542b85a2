pub mod aggregator;
pub mod cache;
pub mod dedupe;
pub mod fetcher;
pub mod retry;
pub mod scorer;

pub use aggregator::{max_articles_for_priority, NewsAggregator};
pub use cache::{NewsCache, SweeperHandle};
pub use dedupe::dedupe_across_topics;
pub use fetcher::{ArticleSource, FeedFormat, FetchOptions, NewsFetcher};
pub use retry::RetryPolicy;
pub use scorer::{score_articles, ScoringWeights};

pub mod prelude {
    pub use super::aggregator::NewsAggregator;
    pub use super::fetcher::{FetchOptions, NewsFetcher};
    pub use brief_core::{Error, NewsArticle, Result, ScoredArticle, TopicNews};
}
