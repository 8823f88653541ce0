//! Settings shell - line-oriented front end for the settings service

mod handler;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use memocache::MemoConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use usercfg::{ConfigRepository, MemoryRepository, Settings, Theme};

use crate::handler::{CommandHandler, Reply};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Cache capacity (number of memoized users)
    #[arg(short, long, default_value_t = memocache::DEFAULT_MAX_LEN)]
    capacity: usize,

    /// Leave keyword arguments out of cache keys
    #[arg(long)]
    ignore_kwargs: bool,

    /// Preload a theme, as USER_ID:THEME (repeatable)
    #[arg(long, value_name = "USER_ID:THEME")]
    seed: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    info!("Starting usercfg v{}", env!("CARGO_PKG_VERSION"));
    info!("Cache capacity: {}", args.capacity);

    let repo = Arc::new(MemoryRepository::new());
    for entry in &args.seed {
        let (user_id, theme) = parse_seed(entry)?;
        repo.upsert_theme(user_id, Some(theme.id())).await?;
    }
    if !repo.is_empty() {
        info!("Seeded {} users", repo.len());
    }

    let config = MemoConfig::with_max_len(args.capacity).ignore_kwargs(args.ignore_kwargs);
    let settings = Arc::new(Settings::new(repo, config)?);
    let handler = CommandHandler::new(settings);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = handler.handle(&line).await;
        if let Reply::Error(e) = &reply {
            warn!("Command failed: {}", e);
        }

        stdout.write_all(format!("{}\n", reply).as_bytes()).await?;
        stdout.flush().await?;

        if reply == Reply::Quit {
            break;
        }
    }

    info!("Shutting down");
    Ok(())
}

fn parse_seed(entry: &str) -> Result<(u64, Theme)> {
    let (user_id, theme) = entry
        .split_once(':')
        .with_context(|| format!("seed '{}' is not USER_ID:THEME", entry))?;
    let user_id = user_id
        .parse()
        .with_context(|| format!("invalid user id in seed '{}'", entry))?;
    let theme = theme.parse()?;
    Ok((user_id, theme))
}
