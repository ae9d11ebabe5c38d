use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use publisher_adapters::AdapterRegistry;
use publisher_core::{Platform, PostId};
use publisher_engine::Publisher;
use publisher_scheduler::{PublisherConfig, SchedulerLoop};
use publisher_store::{InMemoryStore, NewPost, NewTarget, Store};
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "publisher")]
#[command(about = "Schedules and publishes posts across social platforms", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "publisher.toml")]
    config: std::path::PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler loop until interrupted.
    Run,

    /// Schedule a new post.
    Schedule {
        /// Shared body text.
        #[arg(short, long)]
        content: String,

        /// When the post becomes due, as an RFC 3339 timestamp.
        #[arg(short = 'a', long)]
        at: String,

        /// Comma-separated platform names (e.g. `twitter,bluesky`).
        #[arg(short, long, value_delimiter = ',')]
        platform: Vec<String>,
    },

    /// List every scheduled post.
    List,

    /// Show one post's targets.
    Show {
        /// The post id.
        id: String,
    },

    /// Manage stored platform credentials.
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },

    /// Inspect platform adapters.
    Platforms {
        #[command(subcommand)]
        action: PlatformsAction,
    },
}

#[derive(Subcommand)]
enum CredentialsAction {
    /// Store credentials for a platform as `key=value` pairs.
    Set {
        platform: String,
        /// Repeatable `key=value` pairs.
        #[arg(value_parser = parse_key_value)]
        values: Vec<(String, String)>,
    },
    /// List platforms with stored credentials.
    List,
    /// Remove a platform's stored credentials.
    Delete { platform: String },
}

#[derive(Subcommand)]
enum PlatformsAction {
    /// List every platform the engine knows how to publish to.
    All,
    /// List platforms with usable credentials right now.
    Configured,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match PublisherConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(_) => {
            tracing::warn!(path = %cli.config.display(), "no config file found, using defaults");
            PublisherConfig::default()
        }
    };
    for warning in config.validate() {
        tracing::warn!("{warning}");
    }

    let store: Arc<dyn Store> = build_store().await?;
    let http = Arc::new(reqwest::Client::new());
    let registry = Arc::new(AdapterRegistry::new(Arc::clone(&store), http));

    match cli.command {
        Commands::Run => run_scheduler(store, registry, config).await?,
        Commands::Schedule { content, at, platform } => {
            schedule_post(store.as_ref(), &registry, content, at, platform).await?
        }
        Commands::List => list_posts(store.as_ref()).await?,
        Commands::Show { id } => show_post(store.as_ref(), &id).await?,
        Commands::Credentials { action } => {
            credentials_command(store.as_ref(), &registry, action).await?
        }
        Commands::Platforms { action } => platforms_command(&registry, action).await?,
    }

    Ok(())
}

/// Build the store backend: Postgres when `DATABASE_URL` is set, an
/// in-process store otherwise (useful for local trials and the CLI's own
/// tests, never for a real deployment).
async fn build_store() -> Result<Arc<dyn Store>, Box<dyn std::error::Error>> {
    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = publisher_store::build_pool(&database_url)?;
            let mut conn = pool.get()?;
            publisher_store::run_pending(&mut conn)?;
            Ok(Arc::new(publisher_store::PgStore::new(pool)))
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, using an in-memory store (not persisted)");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}

async fn run_scheduler(
    store: Arc<dyn Store>,
    registry: Arc<AdapterRegistry>,
    config: PublisherConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let publisher = Arc::new(Publisher::new(
        Arc::clone(&store),
        registry,
        config.scheduler_max_retries,
    ));
    let scheduler = SchedulerLoop::new(
        store,
        publisher,
        Duration::from_millis(config.scheduler_poll_interval_ms),
        Duration::from_secs(config.stuck_publishing_threshold_secs),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received interrupt, shutting down");
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(
        poll_interval_ms = config.scheduler_poll_interval_ms,
        "scheduler starting"
    );
    scheduler.run(shutdown_rx).await;
    Ok(())
}

async fn schedule_post(
    store: &dyn Store,
    registry: &AdapterRegistry,
    content: String,
    at: String,
    platforms: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scheduled_at_utc: DateTime<Utc> = DateTime::parse_from_rfc3339(&at)?.with_timezone(&Utc);
    let platforms = platforms
        .iter()
        .map(|p| Platform::from_str(p))
        .collect::<Result<Vec<_>, strum::ParseError>>()?;

    // A post can never target a platform with no usable credentials.
    registry.ensure_targets_configured(&platforms).await?;

    let targets = platforms
        .into_iter()
        .map(|platform| NewTarget {
            platform,
            override_content: None,
            override_media_refs: None,
            override_options: None,
        })
        .collect();

    let post_id = store
        .create_post(NewPost {
            base_content: content,
            scheduled_at_utc,
            media_ids: Vec::new(),
            targets,
        })
        .await?;

    println!("scheduled post {post_id} for {scheduled_at_utc}");
    Ok(())
}

async fn list_posts(store: &dyn Store) -> Result<(), Box<dyn std::error::Error>> {
    let posts = store.list_posts().await?;
    if posts.is_empty() {
        println!("no posts scheduled");
        return Ok(());
    }
    for post in posts {
        println!(
            "{}  {}  {}  targets={}",
            post.id,
            post.status,
            post.scheduled_at_utc.to_rfc3339(),
            post.targets.len()
        );
    }
    Ok(())
}

async fn show_post(store: &dyn Store, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let post_id = PostId::from(uuid::Uuid::parse_str(id)?);
    let post = store.get_post(post_id).await?;
    println!("post {}  status={}", post.id, post.status);
    println!("scheduled_at: {}", post.scheduled_at_utc.to_rfc3339());
    println!("content: {}", post.base_content);
    for target in &post.targets {
        println!(
            "  [{}] {}  remote_post_id={:?}  failure={:?}",
            target.platform, target.publish_status, target.remote_post_id, target.failure_reason
        );
    }
    Ok(())
}

async fn credentials_command(
    store: &dyn Store,
    registry: &AdapterRegistry,
    action: CredentialsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CredentialsAction::Set { platform, values } => {
            let platform = Platform::from_str(&platform)?;
            let map: HashMap<String, String> = values.into_iter().collect();
            registry.verify_candidate_credentials(platform, &map).await?;
            store.put_credentials(platform, map).await?;
            println!("stored credentials for {platform}");
        }
        CredentialsAction::List => {
            for platform in store.list_configured_platforms().await? {
                println!("{platform}");
            }
        }
        CredentialsAction::Delete { platform } => {
            let platform = Platform::from_str(&platform)?;
            store.delete_credentials(platform).await?;
            println!("removed credentials for {platform}");
        }
    }
    Ok(())
}

async fn platforms_command(
    registry: &AdapterRegistry,
    action: PlatformsAction,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        PlatformsAction::All => {
            for platform in registry.list_all() {
                println!("{platform}");
            }
        }
        PlatformsAction::Configured => {
            for platform in registry.list_configured().await? {
                println!("{platform}");
            }
        }
    }
    Ok(())
}
