//! chat-pdf-export
//!
//! Opens a chat conversation in Chrome (or reads a saved DOM snapshot) and
//! writes it out as a paginated PDF.

use anyhow::{Context, bail};
use chat_pdf_export::browser::{BrowserSession, ConnectionOptions, LaunchOptions, normalize_target};
use chat_pdf_export::export::{ExportControl, Exporter};
use chat_pdf_export::render::{RenderOptions, Theme};
use chat_pdf_export::{Conversation, DomTree, extractor};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThemeArg {
    /// White pages, dark code panels
    Light,
    /// Dark pages throughout
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(Parser)]
#[command(name = "chat-pdf-export")]
#[command(version)]
#[command(about = "Export a chat conversation to PDF", long_about = None)]
struct Cli {
    /// Conversation URL or saved HTML page
    #[arg(value_name = "TARGET", conflicts_with_all = ["snapshot", "from_json"])]
    target: Option<String>,

    /// Write the PDF to this exact path
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Directory for the PDF, named after the conversation title
    #[arg(long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Launch browser in headed mode (default: headless)
    #[arg(long)]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Persistent browser profile directory (use a logged-in profile for private chats)
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<PathBuf>,

    /// WebSocket endpoint of an already running browser
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Disable Chrome's sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Time to let the page finish client-side rendering before reading it
    #[arg(long, value_name = "MS", default_value = "1000")]
    settle_ms: u64,

    /// Read the page from a DOM snapshot JSON file instead of a browser
    #[arg(long, value_name = "FILE", conflicts_with_all = ["from_json", "ws_endpoint"])]
    snapshot: Option<PathBuf>,

    /// Save the captured DOM snapshot as JSON
    #[arg(long, value_name = "FILE")]
    save_snapshot: Option<PathBuf>,

    /// Render a conversation JSON file written by --dump-json
    #[arg(long, value_name = "FILE", conflicts_with = "ws_endpoint")]
    from_json: Option<PathBuf>,

    /// Save the extracted conversation as JSON
    #[arg(long, value_name = "FILE")]
    dump_json: Option<PathBuf>,

    /// Colour theme
    #[arg(long, value_enum, default_value = "light")]
    theme: ThemeArg,

    /// Body text size in points
    #[arg(long, value_name = "PT", default_value = "11")]
    font_size: f32,

    /// Leave out the export time and source URL
    #[arg(long)]
    no_metadata: bool,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let conversation = match &cli.from_json {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
            Conversation::from_json(&json).with_context(|| format!("Invalid conversation file {}", path.display()))?
        }
        None => {
            let tree = capture(&cli).await?;
            if let Some(path) = &cli.save_snapshot {
                tree.save(path).with_context(|| format!("Failed to save snapshot to {}", path.display()))?;
                log::info!("Saved DOM snapshot to {}", path.display());
            }
            extractor::extract_conversation(&tree)
        }
    };

    if let Some(path) = &cli.dump_json {
        std::fs::write(path, conversation.to_json()?).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Saved conversation JSON to {}", path.display());
    }

    let options = RenderOptions::new()
        .theme(cli.theme.into())
        .include_metadata(!cli.no_metadata)
        .font_size(cli.font_size);

    let mut exporter = Exporter::new().options(options).output_dir(&cli.output_dir);
    if let Some(path) = &cli.output {
        exporter = exporter.output_path(path);
    }

    let mut control = ExportControl::new();
    let report = exporter.export_conversation(&mut control, conversation).await?;

    println!("{}", report.path.display());
    Ok(())
}

/// Get a DOM snapshot from a file, an attached browser or a freshly launched one
async fn capture(cli: &Cli) -> anyhow::Result<DomTree> {
    if let Some(path) = &cli.snapshot {
        return DomTree::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()));
    }

    let session = match &cli.ws_endpoint {
        Some(endpoint) => {
            log::info!("Connecting to browser at {}", endpoint);
            BrowserSession::connect(ConnectionOptions::new(endpoint.as_str()))?
        }
        None => {
            if cli.target.is_none() {
                bail!("Nothing to export: pass a TARGET, --ws-endpoint, --snapshot or --from-json");
            }

            let mut options = LaunchOptions::new().headless(!cli.headed).sandbox(!cli.no_sandbox);
            if let Some(path) = &cli.chrome_path {
                options = options.chrome_path(path.clone());
            }
            if let Some(dir) = &cli.user_data_dir {
                options = options.user_data_dir(dir.clone());
            }
            BrowserSession::launch(options)?
        }
    };

    if let Some(target) = &cli.target {
        let url = normalize_target(target);
        log::info!("Opening {}", url);
        session.navigate(&url)?;
        session.wait_for_navigation()?;
    }

    tokio::time::sleep(Duration::from_millis(cli.settle_ms)).await;

    let tree = session.snapshot_dom()?;

    // Leave an attached browser as we found it
    if cli.ws_endpoint.is_none() {
        session.close()?;
    }
    Ok(tree)
}
