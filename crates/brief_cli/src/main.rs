use std::sync::Arc;
use std::time::Duration;

use chrono::{Timelike, Utc};
use clap::Parser;
use tracing::info;

use brief_core::{
    GlobalEvent, LanguageModel, Preferences, Result, SubscriptionStore, TopicStore, User,
};
use brief_news::{FeedFormat, NewsAggregator, NewsCache, NewsFetcher};
use brief_pipeline::{render, BriefGenerator, BriefPipeline};
use brief_store::{MemoryStore, NoopSender};
use brief_synthesis::{ClaudeModel, Composer, OfflineModel};

const DEFAULT_RSS_FEED: &str = "https://news.google.com/rss/search";
const CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(author, version, about = "Personalized daily news briefs", long_about = None)]
struct Cli {
    /// Base URL of the news feed endpoint.
    #[arg(long, default_value = DEFAULT_RSS_FEED)]
    feed_url: String,
    /// Format served by the feed endpoint: rss or json.
    #[arg(long, default_value = "rss")]
    feed_format: String,
    #[arg(
        long,
        default_value = "offline",
        help = "Model to use for synthesis. Available models: offline (default), claude (requires ANTHROPIC_API_KEY)"
    )]
    model: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List the seeded topic catalog.
    Topics,
    /// Fetch and score articles for one topic.
    Preview {
        /// Topic name or id from the catalog (e.g. "Technology").
        topic: String,
    },
    /// Generate and print a brief for one seeded user.
    Generate {
        #[arg(default_value = "demo")]
        user_id: String,
        /// Emit the structured payload as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Send briefs to every user due at the current hour.
    Batch {
        /// Process all seeded users regardless of their delivery hour.
        #[arg(long)]
        all: bool,
    },
}

fn create_model(name: &str) -> Result<Arc<dyn LanguageModel>> {
    match name {
        "offline" => Ok(Arc::new(OfflineModel)),
        "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").ok();
            Ok(Arc::new(ClaudeModel::new(api_key)?))
        }
        other => Err(brief_core::Error::Model(format!(
            "unknown model: {}",
            other
        ))),
    }
}

fn parse_feed_format(name: &str) -> Result<FeedFormat> {
    match name {
        "rss" => Ok(FeedFormat::Rss),
        "json" => Ok(FeedFormat::Json),
        other => Err(brief_core::Error::Fetch(format!(
            "unknown feed format: {}",
            other
        ))),
    }
}

/// Demo users against the stock topic catalog. The `demo` user is due at the
/// current hour so `batch` has something to deliver.
async fn seed_users(store: &MemoryStore) -> Result<()> {
    let topics = store.list_topics().await?;

    let current_hour = Utc::now().hour() as u8;
    store
        .add_user(
            User {
                id: "demo".to_string(),
                name: Some("Demo".to_string()),
                email: "demo@example.com".to_string(),
            },
            Preferences {
                delivery_hour: current_hour,
                include_global: true,
                ..Preferences::default()
            },
        )
        .await;
    store
        .add_user(
            User {
                id: "night-owl".to_string(),
                name: None,
                email: "owl@example.com".to_string(),
            },
            Preferences {
                delivery_hour: (current_hour + 12) % 24,
                ..Preferences::default()
            },
        )
        .await;

    for (i, topic) in topics.iter().take(3).enumerate() {
        store.subscribe("demo", &topic.id, 8 - 3 * i as u8).await?;
    }
    if let Some(topic) = topics.first() {
        store
            .subscribe("night-owl", &topic.id, brief_core::types::DEFAULT_PRIORITY)
            .await?;
    }

    store
        .add_event(GlobalEvent {
            title: "Global markets digest".to_string(),
            description: "Daily cross-market roundup.".to_string(),
            category: "business".to_string(),
            date: Utc::now(),
        })
        .await;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let store = MemoryStore::with_default_topics().await;
    seed_users(&store).await?;
    info!("🗂️ Stores seeded with the stock topic catalog and demo users");

    let fetcher = NewsFetcher::new(cli.feed_url.clone(), parse_feed_format(&cli.feed_format)?);
    let cache = Arc::new(NewsCache::new(CACHE_TTL));
    let aggregator = Arc::new(NewsAggregator::new(
        Arc::new(fetcher),
        cache,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));

    let model = create_model(&cli.model)?;
    info!("🧠 Synthesis model initialized (using {})", model.name());
    let composer = Arc::new(Composer::new(model));

    let generator = Arc::new(BriefGenerator::new(
        aggregator.clone(),
        composer,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    ));
    let pipeline = BriefPipeline::new(
        generator.clone(),
        Arc::new(NoopSender),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
    );

    match cli.command {
        Commands::Topics => {
            for topic in store.list_topics().await? {
                println!(
                    "{}  {} [{}]  keywords: {}",
                    topic.id,
                    topic.name,
                    topic.category,
                    topic.keywords.join(", ")
                );
            }
        }
        Commands::Preview { topic } => {
            let catalog = store.list_topics().await?;
            let found = catalog
                .iter()
                .find(|t| t.id == topic || t.name.eq_ignore_ascii_case(&topic))
                .ok_or_else(|| brief_core::Error::NotFound(format!("topic {}", topic)))?;

            info!("📰 Fetching news for {}", found.name);
            let articles = aggregator.fetch_by_topic_id(&found.id).await?;
            if articles.is_empty() {
                println!("No articles found for {}", found.name);
            }
            for scored in articles {
                println!(
                    "{:>6.2}  {}  ({})",
                    scored.score, scored.article.title, scored.article.url
                );
            }
        }
        Commands::Generate { user_id, json } => {
            info!("✉️ Generating brief for {}", user_id);
            let brief = generator.generate(&user_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&brief)?);
            } else {
                println!("Subject: {}\n", brief.subject);
                println!("{}", render::render_text(&brief.payload));
            }
        }
        Commands::Batch { all } => {
            let users = if all {
                vec!["demo".to_string(), "night-owl".to_string()]
            } else {
                pipeline
                    .users_due_now()
                    .await?
                    .into_iter()
                    .map(|user| user.id)
                    .collect()
            };
            info!("📬 Processing batch of {} user(s)", users.len());
            let outcome = pipeline.process_batch(&users).await;
            println!(
                "total: {}  succeeded: {}  skipped: {}  failed: {}",
                outcome.total, outcome.succeeded, outcome.skipped, outcome.failed
            );
            for error in outcome.errors {
                eprintln!("{}: {}", error.user_id, error.error);
            }
        }
    }

    Ok(())
}
