use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bookmark_timeline::pagination::LoadOutcome;
use bookmark_timeline::report::TimelineReport;
use bookmark_timeline::store::{JsonBookmarkStore, JsonSettingsStore, StdoutLauncher};
use bookmark_timeline::theme::ThemeController;
use bookmark_timeline::{BookmarkTimeline, SystemClock, TimelineConfig};

mod progress;

#[derive(Parser)]
#[command(name = "bookmark-timeline")]
#[command(about = "Browse bookmarks as a date-grouped timeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Bookmark tree file (JSON array of root nodes)
    #[arg(long, global = true, default_value = "bookmarks.json")]
    bookmarks: PathBuf,

    /// Preferences file
    #[arg(long, global = true, default_value = "settings.json")]
    settings: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the timeline
    Show {
        /// Only bookmarks whose title or URL contains this text
        #[arg(short, long)]
        query: Option<String>,

        /// Number of pages to load
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Records per page (defaults to the stored preference)
        #[arg(long)]
        page_size: Option<usize>,

        /// Pacing delay between pages in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Show IDs and full URLs
        #[arg(short, long)]
        detailed: bool,
    },

    /// Search bookmarks and show every match
    Search {
        query: String,

        /// Show IDs and full URLs
        #[arg(short, long)]
        detailed: bool,
    },

    /// Delete a bookmark and show the rebuilt timeline
    Delete { id: String },

    /// Print the folder a bookmark lives in
    Folder { id: String },

    /// Open a bookmark, or its folder in the bookmark manager
    Open {
        id: String,

        /// Open the containing folder instead of the bookmark
        #[arg(long)]
        folder: bool,
    },

    /// Open the bookmark manager
    Manager,

    /// Show or change theme preferences
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Switch between light and dark
    Toggle,

    /// Set the accent colour (red, orange, yellow, green, cyan, blue, purple)
    Color { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = JsonSettingsStore::new(&cli.settings);

    match cli.command {
        Commands::Show { query, pages, page_size, delay_ms, detailed } => {
            let mut session = open_session(&cli.bookmarks, &settings, page_size, delay_ms).await?;
            if let Some(ref query) = query {
                session.search(query);
            }
            load_pages(&mut session, pages).await;
            print_timeline(&session, detailed);
        }
        Commands::Search { query, detailed } => {
            let mut session = open_session(&cli.bookmarks, &settings, None, 0).await?;
            let matched = session.search(&query);
            info!("🔍 {} bookmarks match {:?}", matched, query);
            load_pages(&mut session, usize::MAX).await;
            print_timeline(&session, detailed);
        }
        Commands::Delete { id } => {
            let mut session = open_session(&cli.bookmarks, &settings, None, 0).await?;
            let result = session.delete(&id).await;
            print_timeline(&session, false);
            result.with_context(|| format!("Could not delete bookmark {}", id))?;
            info!("✅ Bookmark {} deleted", id);
        }
        Commands::Folder { id } => {
            let session = open_session(&cli.bookmarks, &settings, None, 0).await?;
            let record = session
                .find(&id)
                .with_context(|| format!("No bookmark with id {}", id))?;
            println!("📁 {}", session.folder_path(record.parent_id.as_deref()).await);
        }
        Commands::Open { id, folder } => {
            let session = open_session(&cli.bookmarks, &settings, None, 0).await?;
            let record = session
                .find(&id)
                .with_context(|| format!("No bookmark with id {}", id))?;
            if folder {
                session.show_in_folder(&StdoutLauncher, record).await?;
            } else {
                session.open_bookmark(&StdoutLauncher, record).await?;
            }
        }
        Commands::Manager => {
            let session = BookmarkTimeline::new(
                JsonBookmarkStore::new(&cli.bookmarks),
                &TimelineConfig::default(),
                Arc::new(SystemClock),
            )?;
            session.open_manager(&StdoutLauncher).await?;
        }
        Commands::Theme { action } => {
            let mut theme = ThemeController::initialize(&settings).await;
            match action {
                Some(ThemeAction::Toggle) => {
                    theme.toggle_theme(&settings).await;
                }
                Some(ThemeAction::Color { name }) => {
                    theme.set_theme_color(&settings, &name).await;
                }
                None => {}
            }
            let prefs = theme.preferences();
            println!("🎨 Theme: {}", prefs.theme.name());
            println!("🎨 Accent: {} ({})", prefs.theme_color.name(), prefs.theme_color.hex());
            for (name, value) in theme.css_variables() {
                println!("  {}: {}", name, value);
            }
        }
    }

    Ok(())
}

async fn open_session(
    bookmarks: &Path,
    settings: &JsonSettingsStore,
    page_size: Option<usize>,
    delay_ms: u64,
) -> Result<BookmarkTimeline<JsonBookmarkStore>> {
    let prefs = ThemeController::initialize(settings).await.preferences().clone();
    let config = TimelineConfig::default()
        .with_page_size(page_size.unwrap_or(prefs.page_size))
        .with_load_delay(Duration::from_millis(delay_ms));

    let mut session = BookmarkTimeline::new(
        JsonBookmarkStore::new(bookmarks),
        &config,
        Arc::new(SystemClock),
    )
    .context("Invalid timeline configuration")?;
    session.load().await;
    Ok(session)
}

/// Load until `pages` pages are shown or the list is exhausted.
async fn load_pages(
    session: &mut BookmarkTimeline<JsonBookmarkStore>,
    pages: usize,
) {
    let pacer = session.pacer();
    while session.state().page < pages && session.state().has_more {
        let pb = progress::create_page_spinner("Loading more bookmarks...");
        match session.load_next_page(&pacer).await {
            LoadOutcome::Merged { page, records } => {
                progress::finish_with_success(&pb, &format!("Page {} ({} bookmarks)", page, records));
            }
            LoadOutcome::Failed => {
                progress::finish_with_error(&pb, "Page load failed");
                break;
            }
            _ => {
                pb.finish_and_clear();
                break;
            }
        }
    }
}

fn print_timeline(session: &BookmarkTimeline<JsonBookmarkStore>, detailed: bool) {
    let report = TimelineReport::new(session.timeline(), session.state(), session.now_millis())
        .with_query(session.search_query())
        .with_total(session.filtered().len());
    print!("{}", report.format(detailed));
}
