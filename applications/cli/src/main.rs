/// Reprise - study-loop media player console
use anyhow::Context;
use clap::{Parser, Subcommand};
use reprise_cli::config::AppConfig;
use reprise_cli::console::{self, Flow};
use reprise_core::{format_timestamp, SegmentRepository};
use reprise_engine::{ClockBackend, PlaybackEngine};
use reprise_playback::{Collaborators, PlaybackCoordinator};
use reprise_storage::{SqliteLibrary, SqliteSessionTracker};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reprise")]
#[command(about = "Loop, segment and replay study recordings", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "REPRISE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register files and play them, reading commands from stdin
    Play {
        /// Media files; files in the same directory form one queue
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the saved segments of a file
    Segments {
        /// Media file path
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "reprise=info,reprise_playback=info,reprise_engine=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let pool = reprise_storage::open_database(&config.storage.database_url)
        .await
        .with_context(|| format!("opening {}", config.storage.database_url))?;
    let library = SqliteLibrary::new(pool);

    match cli.command {
        Commands::Play { files } => play(config, library, files).await,
        Commands::Segments { file } => list_segments(&library, file).await,
    }
}

async fn play(
    config: AppConfig,
    library: SqliteLibrary,
    files: Vec<PathBuf>,
) -> anyhow::Result<()> {
    let mut registered = Vec::with_capacity(files.len());
    for path in &files {
        let path = std::fs::canonicalize(path)
            .with_context(|| format!("cannot resolve {}", path.display()))?;
        registered.push(library.register_path(&path).await?);
    }
    let Some(first) = registered.first() else {
        return Ok(());
    };
    tracing::info!(files = registered.len(), "Registered media files");

    let sessions = Arc::new(SqliteSessionTracker::new(library.pool().clone()));
    let library = Arc::new(library);
    let collaborators = Collaborators {
        library: library.clone(),
        folders: library.clone(),
        segments: library,
        sessions,
    };

    let (engine, events) = PlaybackEngine::spawn(Box::new(ClockBackend::probing()), config.engine);
    let mut coordinator = PlaybackCoordinator::new(engine, events, collaborators, config.playback);
    coordinator.open(&first.id).await?;

    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read input: {}", e);
                        break;
                    }
                };
                if console::run_line(&mut coordinator, &line).await == Flow::Quit {
                    break;
                }
            }
            inbound = coordinator.next_inbound() => {
                coordinator.handle(inbound).await;
            }
        }

        for event in coordinator.drain_events() {
            if let Some(text) = console::describe(&event) {
                println!("{text}");
            }
        }
    }

    coordinator.shutdown().await;
    Ok(())
}

async fn list_segments(library: &SqliteLibrary, file: PathBuf) -> anyhow::Result<()> {
    let path = std::fs::canonicalize(&file)
        .with_context(|| format!("cannot resolve {}", file.display()))?;
    let Some(media) = library.file_by_path(&path).await? else {
        println!("{} is not in the library", path.display());
        return Ok(());
    };

    let segments = library.segments_for_file(&media.id).await?;
    if segments.is_empty() {
        println!("{}: no segments", media.title);
        return Ok(());
    }

    println!("{}:", media.title);
    for segment in segments {
        println!(
            "{:>3}. {} [{} - {}]",
            segment.index + 1,
            segment.label,
            format_timestamp(segment.start_time),
            format_timestamp(segment.end_time)
        );
    }
    Ok(())
}
