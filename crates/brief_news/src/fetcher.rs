//! Fetches raw articles for a keyword set from the configured news source.
//! The source is either a Google-News-style RSS search endpoint or a
//! NewsAPI-shaped JSON endpoint; both normalize to `NewsArticle`.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use brief_core::text::{clean_text, normalize_url};
use brief_core::{Error, NewsArticle, Result};

use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Rss,
    Json,
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub keywords: Vec<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub max_results: usize,
    pub language: String,
}

impl FetchOptions {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            from: None,
            to: None,
            max_results: 10,
            language: "en".to_string(),
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_window(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }
}

pub struct NewsFetcher {
    client: Client,
    base_url: String,
    format: FeedFormat,
    retry: RetryPolicy,
}

impl NewsFetcher {
    pub fn new(base_url: impl Into<String>, format: FeedFormat) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("daily-brief/1.0")
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            format,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Boolean-OR query; multi-word keywords become exact phrases.
    fn build_query(keywords: &[String]) -> String {
        keywords
            .iter()
            .map(|kw| {
                if kw.contains(' ') {
                    format!("\"{}\"", kw)
                } else {
                    kw.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ")
    }

    fn request_url(&self, options: &FetchOptions) -> String {
        let query = Self::build_query(&options.keywords);
        match self.format {
            FeedFormat::Rss => format!(
                "{}?q={}&hl={}-US&gl=US&ceid=US:{}",
                self.base_url,
                urlencoding::encode(&query),
                options.language,
                options.language
            ),
            FeedFormat::Json => {
                let mut url = format!(
                    "{}?q={}&language={}&pageSize={}",
                    self.base_url,
                    urlencoding::encode(&query),
                    options.language,
                    options.max_results
                );
                if let Some(from) = options.from {
                    url.push_str(&format!("&from={}", from.to_rfc3339()));
                }
                if let Some(to) = options.to {
                    url.push_str(&format!("&to={}", to.to_rfc3339()));
                }
                url
            }
        }
    }

    /// One outbound request, parsed and normalized. Non-success status is a
    /// failure; malformed individual items are skipped, not fatal.
    pub async fn fetch(&self, options: &FetchOptions) -> Result<Vec<NewsArticle>> {
        if options.keywords.is_empty() {
            return Err(Error::Fetch("cannot fetch without keywords".to_string()));
        }

        let url = self.request_url(options);
        debug!(url = %url, "fetching news");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "news source returned status {}",
                status
            )));
        }

        let body = response.bytes().await?;
        let articles = match self.format {
            FeedFormat::Rss => parse_rss(&body)?,
            FeedFormat::Json => parse_json(&body)?,
        };

        let mut deduped = dedupe_by_url(articles);
        deduped.truncate(options.max_results);

        info!(count = deduped.len(), "fetched articles");
        Ok(deduped)
    }

    /// Retries with exponential backoff; after exhaustion degrades to an
    /// empty list. "No articles" is a valid outcome, never a pipeline error.
    pub async fn fetch_with_retry(&self, options: &FetchOptions) -> Vec<NewsArticle> {
        match self.retry.run(|| self.fetch(options)).await {
            Ok(articles) => articles,
            Err(err) => {
                error!(error = %err, "failed to fetch news after retries");
                Vec::new()
            }
        }
    }
}

/// Seam between the aggregator and the outbound news source, so the
/// pipeline can be exercised without the network.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Best-effort fetch: degrades to an empty list on failure.
    async fn fetch_articles(&self, options: &FetchOptions) -> Vec<NewsArticle>;
}

#[async_trait]
impl ArticleSource for NewsFetcher {
    async fn fetch_articles(&self, options: &FetchOptions) -> Vec<NewsArticle> {
        self.fetch_with_retry(options).await
    }
}

fn parse_rss(body: &[u8]) -> Result<Vec<NewsArticle>> {
    let channel = rss::Channel::read_from(body)
        .map_err(|e| Error::Parse(format!("invalid RSS feed: {}", e)))?;

    let mut articles = Vec::new();
    for item in channel.items() {
        let (title, link) = match (item.title(), item.link()) {
            (Some(title), Some(link)) => (title, link),
            _ => {
                debug!("skipping RSS item without title or link");
                continue;
            }
        };

        let description = item
            .description()
            .map(clean_text)
            .unwrap_or_default();

        let published_at = item
            .pub_date()
            .and_then(|date| DateTime::parse_from_rfc2822(date).ok())
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let source = item
            .source()
            .and_then(|source| source.title())
            .unwrap_or("Unknown")
            .to_string();

        articles.push(NewsArticle {
            title: clean_text(title),
            description: description.clone(),
            content: description,
            url: link.trim().to_string(),
            image_url: None,
            source,
            published_at,
        });
    }

    Ok(articles)
}

/// NewsAPI-shaped body. Tagged at the adapter boundary: a recognized error
/// payload and an unrecognized shape fail differently.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonFeed {
    Articles {
        articles: Vec<JsonArticle>,
    },
    Error {
        status: String,
        #[serde(default)]
        message: Option<String>,
    },
}

#[derive(Deserialize)]
struct JsonArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    #[serde(rename = "urlToImage")]
    url_to_image: Option<String>,
    source: Option<JsonSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct JsonSource {
    name: Option<String>,
}

fn parse_json(body: &[u8]) -> Result<Vec<NewsArticle>> {
    let feed: JsonFeed = serde_json::from_slice(body)
        .map_err(|e| Error::Parse(format!("unrecognized news source response: {}", e)))?;

    let items = match feed {
        JsonFeed::Articles { articles } => articles,
        JsonFeed::Error { status, message } => {
            return Err(Error::Fetch(format!(
                "news source error ({}): {}",
                status,
                message.unwrap_or_else(|| "no message".to_string())
            )))
        }
    };

    let mut articles = Vec::new();
    for item in items {
        let (title, url) = match (item.title, item.url) {
            (Some(title), Some(url)) => (title, url),
            _ => continue,
        };

        let description = item.description.as_deref().map(clean_text).unwrap_or_default();
        let content = item
            .content
            .as_deref()
            .map(clean_text)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| description.clone());

        articles.push(NewsArticle {
            title: clean_text(&title),
            description,
            content,
            url,
            image_url: item.url_to_image,
            source: item
                .source
                .and_then(|source| source.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            published_at: item.published_at.unwrap_or_else(Utc::now),
        });
    }

    Ok(articles)
}

fn dedupe_by_url(articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(normalize_url(&article.url)))
        .collect()
}
