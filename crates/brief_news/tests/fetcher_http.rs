use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brief_news::{FeedFormat, FetchOptions, NewsFetcher, RetryPolicy};

const RSS_BODY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>search</title><link>https://news.example.com</link><description>results</description>
<item>
  <title>Bitcoin surges past milestone</title>
  <link>https://example.com/surge</link>
  <pubDate>Tue, 25 Aug 2026 09:30:00 GMT</pubDate>
  <source url="https://reuters.com">Reuters</source>
  <description>Crypto markets rally.</description>
</item>
<item>
  <title>Altcoins follow the rally</title>
  <link>https://example.com/altcoins</link>
</item>
</channel></rss>"#;

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        multiplier: 2,
    }
}

#[tokio::test]
async fn fetch_parses_rss_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rss/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(RSS_BODY, "application/rss+xml"))
        .mount(&server)
        .await;

    let fetcher = NewsFetcher::new(format!("{}/rss/search", server.uri()), FeedFormat::Rss);
    let articles = fetcher
        .fetch(&FetchOptions::new(vec!["Bitcoin".to_string()]))
        .await
        .unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Bitcoin surges past milestone");
    assert_eq!(articles[0].source, "Reuters");
    assert_eq!(articles[1].source, "Unknown");
}

#[tokio::test]
async fn fetch_respects_max_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(RSS_BODY, "application/rss+xml"))
        .mount(&server)
        .await;

    let fetcher = NewsFetcher::new(server.uri(), FeedFormat::Rss);
    let articles = fetcher
        .fetch(&FetchOptions::new(vec!["Bitcoin".to_string()]).with_max_results(1))
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
}

#[tokio::test]
async fn fetch_fails_on_http_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = NewsFetcher::new(server.uri(), FeedFormat::Rss);
    let result = fetcher
        .fetch(&FetchOptions::new(vec!["Bitcoin".to_string()]))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn fetch_with_retry_returns_empty_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher =
        NewsFetcher::new(server.uri(), FeedFormat::Rss).with_retry_policy(fast_retry());
    let articles = fetcher
        .fetch_with_retry(&FetchOptions::new(vec!["Bitcoin".to_string()]))
        .await;

    assert!(articles.is_empty());
}

#[tokio::test]
async fn fetch_with_retry_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(RSS_BODY, "application/rss+xml"))
        .mount(&server)
        .await;

    let fetcher =
        NewsFetcher::new(server.uri(), FeedFormat::Rss).with_retry_policy(fast_retry());
    let articles = fetcher
        .fetch_with_retry(&FetchOptions::new(vec!["Bitcoin".to_string()]))
        .await;

    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn fetch_parses_json_endpoint() {
    let server = MockServer::start().await;
    let body = r#"{
        "status": "ok",
        "articles": [
            {
                "title": "AI chips in short supply",
                "description": "Demand outpaces supply",
                "url": "https://example.com/ai-chips",
                "source": { "name": "TechCrunch" },
                "publishedAt": "2026-08-25T10:00:00Z"
            }
        ]
    }"#;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let fetcher = NewsFetcher::new(server.uri(), FeedFormat::Json);
    let articles = fetcher
        .fetch(&FetchOptions::new(vec!["AI".to_string()]))
        .await
        .unwrap();

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].source, "TechCrunch");
}
