//! blog-autodraft binary entrypoint.
//! `trends` prints the aggregated trend batch; `generate` drafts and stores a post.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blog_autodraft::config::{self, AppConfig};
use blog_autodraft::{Outcome, Pipeline};

#[derive(Parser)]
#[command(name = "blog-autodraft", version, about)]
struct Cli {
    /// Config file (TOML). Defaults to $AUTODRAFT_CONFIG_PATH or config/autodraft.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch trend signals from all sources and print them.
    Trends {
        /// Print the batch as JSON instead of a listing.
        #[arg(long)]
        json: bool,
    },
    /// Draft a post from current trends and write it to the content directory.
    Generate {
        /// Topic for the post (overrides $BLOG_TOPIC and the configured list).
        #[arg(long)]
        topic: Option<String>,
        /// Print the post instead of writing it.
        #[arg(long)]
        dry_run: bool,
        /// Content directory (overrides config and $AUTODRAFT_CONTENT_DIR).
        #[arg(long)]
        content_dir: Option<PathBuf>,
    },
}

/// Logs go to stderr so stdout stays clean for output.
/// `RUST_LOG` controls the filter; `AUTODRAFT_LOG_JSON=1` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blog_autodraft=info,warn"));
    let json = std::env::var("AUTODRAFT_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => AppConfig::load_from(p)?,
        None => AppConfig::load_default()?,
    })
}

async fn run(cli: Cli) -> Result<()> {
    let mut cfg = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Trends { json } => {
            let client = blog_autodraft::trends::http_client(&cfg.sources.user_agent)?;
            let sources = blog_autodraft::trends::default_sources(&cfg.sources, client);
            let batch = blog_autodraft::fetch_all_trends(
                &sources,
                cfg.sources.timeout(),
                cfg.sources.max_per_source,
            )
            .await;
            if json {
                println!("{}", serde_json::to_string_pretty(&batch)?);
            } else {
                for g in &batch.groups {
                    match &g.error {
                        Some(e) => println!("## {} ({}) failed: {}", g.name, g.kind, e),
                        None => println!("## {} ({}): {} items", g.name, g.kind, g.records.len()),
                    }
                    for r in &g.records {
                        println!("  [{}] {}\n      {}", r.score, r.title, r.url);
                    }
                }
            }
        }
        Command::Generate {
            topic,
            dry_run,
            content_dir,
        } => {
            if let Some(dir) = content_dir {
                cfg.content_dir = dir;
            }
            let topic = config::resolve_topic(topic.as_deref(), &cfg.topics)?;
            let pipeline = Pipeline::from_config(&cfg)?;
            match pipeline.run(topic, dry_run).await? {
                Outcome::DryRun(post) => {
                    println!("# {}\n", post.filename);
                    print!("{}", post.post.to_markdown());
                }
                Outcome::Written { path, post } => {
                    println!("wrote {} ({})", path.display(), post.post.title);
                }
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present; no-op otherwise.
    let _ = dotenvy::dotenv();
    init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = ?e, "run failed");
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
