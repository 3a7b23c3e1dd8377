//! Lootscan command line host.
//!
//! Scans screenshots and maintains the fingerprint catalog.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use catalog::{FingerprintStore, JsonStore, build, curate};
use clap::{Parser, Subcommand};
use ie::{Ie, OwnedImage};
use lootscan::{
    Engine, Scanner,
    archive::DirArchive,
    assets,
    config::Config,
    metadata::{ItemMetadata, MarketableSet, NoMetadata},
    progress::LogProgress,
};

#[derive(Debug, Parser)]
#[command(name = "lootscan", version, about = "Itemize and value loot screenshots")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a screenshot and print the loot report.
    Scan {
        image: PathBuf,
        /// Submitter id, for the one-scan-per-user limit.
        #[arg(long, default_value_t = 0)]
        user: u64,
        /// Write the annotated screenshot here.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Write the report as JSON here.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Add a new item from a 32x32 frame.
    New {
        name: String,
        group: String,
        value: u32,
        png: PathBuf,
    },
    /// Add another frame to an existing item.
    Add { name: String, png: PathBuf },
    /// Remove an item and all its frames.
    Remove { name: String },
    /// Print an item's records, optionally saving its frames side by side.
    Show {
        name: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a default config file if there is none, and print its path.
    Config,
    /// Create catalog entries from an import manifest.
    Import {
        manifest: PathBuf,
        /// Titles to leave out.
        #[arg(long)]
        skip: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Structured logging. Use `RUST_LOG=info` etc.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };
    let store = Arc::new(JsonStore::open(&config.catalog_path)?);

    match cli.command {
        Command::Scan { image, user, out, json } => scan(&config, store, &image, user, out, json),
        Command::New { name, group, value, png } => {
            let frame = OwnedImage::open(&png)?;
            match curate::new_item(store.as_ref(), &name, &group, value, &frame)? {
                Some(shown) => print_shown(&shown, None),
                None => {
                    println!("{name} already exists; use `add` to give it another frame.");
                    Ok(())
                }
            }
        }
        Command::Add { name, png } => {
            let frame = OwnedImage::open(&png)?;
            let shown = curate::add_frame(store.as_ref(), &name, &frame)?;
            found_or_suggest(store.as_ref(), &name, shown, None)
        }
        Command::Remove { name } => {
            match curate::remove(store.as_ref(), &name)? {
                Some(removed) => println!("Removed {removed}."),
                None => suggest(store.as_ref(), &name)?,
            }
            Ok(())
        }
        Command::Show { name, out } => {
            let shown = curate::show(store.as_ref(), &name)?;
            found_or_suggest(store.as_ref(), &name, shown, out.as_deref())
        }
        Command::Config => init_config(cli.config.as_deref()),
        Command::Import { manifest, skip } => {
            let items = build::load_manifest(&manifest)?;
            let skip: Vec<&str> = skip.iter().map(String::as_str).collect();
            let added = build::update_catalog(store.as_ref(), &items, &skip)?;
            println!("Imported {added} new items ({} in manifest).", items.len());
            Ok(())
        }
    }
}

fn scan(config: &Config, store: Arc<JsonStore>, image: &Path, user: u64, out: Option<PathBuf>, json: Option<PathBuf>) -> Result<()> {
    let templates = assets::resolve_templates(config.assets_dir.as_deref())?;
    let metadata: Arc<dyn ItemMetadata> = match &config.marketable_path {
        Some(path) => match MarketableSet::load(path) {
            Ok(set) => Arc::new(set),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load marketable items");
                Arc::new(NoMetadata)
            }
        },
        None => Arc::new(NoMetadata),
    };
    let engine = Engine::new(
        Arc::new(Ie::new(templates)),
        store,
        metadata,
        Arc::new(DirArchive::new(&config.debug_dir)),
        config.scan_options(),
    );
    let scanner = Scanner::new(Arc::new(engine), config.trusted_users.iter().copied(), config.max_image_bytes);

    let bytes = std::fs::read(image).with_context(|| format!("read {}", image.display()))?;
    let report = scanner.submit(user, bytes, session_id(), Arc::new(LogProgress))?.wait()?;

    if report.is_empty() {
        println!("The container is empty.");
    } else {
        for line in report.summary_lines() {
            println!("{line}");
        }
    }
    if let Some(path) = out
        && let Some(png) = report.overlay_png()?
    {
        std::fs::write(&path, png).with_context(|| format!("write {}", path.display()))?;
    }
    if let Some(path) = json {
        let text = serde_json::to_string_pretty(&report).context("serialize report")?;
        std::fs::write(&path, text).with_context(|| format!("write {}", path.display()))?;
    }
    Ok(())
}

fn init_config(path: Option<&Path>) -> Result<()> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => Config::path()?,
    };
    if path.exists() {
        println!("{} already exists.", path.display());
        return Ok(());
    }
    Config::default().save_to(&path)?;
    println!("Wrote {}.", path.display());
    Ok(())
}

/// Milliseconds since the epoch; names the debug archive folder.
fn session_id() -> String {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    millis.to_string()
}

fn found_or_suggest(store: &dyn FingerprintStore, name: &str, shown: Option<curate::Shown>, out: Option<&Path>) -> Result<()> {
    match shown {
        Some(shown) => print_shown(&shown, out),
        None => suggest(store, name),
    }
}

fn suggest(store: &dyn FingerprintStore, name: &str) -> Result<()> {
    match curate::closest_name(store, name)? {
        Some(close) => println!("No item named {name}. Did you mean {close}?"),
        None => println!("No item named {name}."),
    }
    Ok(())
}

fn print_shown(shown: &curate::Shown, out: Option<&Path>) -> Result<()> {
    for item in &shown.items {
        println!(
            "#{} {} ({}) value {} priority {} box {}x{} size {}",
            item.id, item.name, item.group, item.value, item.priority, item.size_x, item.size_y, item.size
        );
    }
    if let Some(path) = out {
        shown.sheet.as_image().save_png(path)?;
    }
    Ok(())
}
