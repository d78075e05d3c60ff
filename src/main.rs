mod catalog;
mod config;
mod worker;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use catalog::{Catalog, CatalogStore, RemoteCatalog, Source};
use config::Config;
use worker::{network_fetcher, Interceptor, ResponseCache, ServedSource, WorkerMessage};

#[derive(Parser, Debug)]
#[command(name = "restorevs")]
#[command(about = "Offline-first cache core for a restaurant discovery client")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/restorevs/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List restaurants from the local catalog
  List {
    /// Refresh from the remote catalog first
    #[arg(long)]
    refresh: bool,
    /// Only restaurants of this cuisine
    #[arg(long)]
    cuisine: Option<String>,
    /// Only restaurants in this neighborhood
    #[arg(long)]
    neighborhood: Option<String>,
  },
  /// Show a single restaurant by id
  Show { id: String },
  /// List the distinct neighborhoods in the catalog
  Neighborhoods,
  /// List the distinct cuisines in the catalog
  Cuisines,
  /// Refresh the local catalog from the remote service
  Refresh,
  /// Pre-populate the response cache and supersede older versions
  Install,
  /// Purge response caches of superseded versions
  Activate,
  /// Resolve a request through the interception cache
  Fetch { url: String },
  /// Pre-warm detail pages for the given restaurant ids
  Warm { ids: Vec<i64> },
  /// Deliver a JSON control message to the worker
  Message { json: String },
}

/// Initialize the tracing subscriber. Controlled via RUST_LOG.
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(filter)
    .init();
}

fn open_catalog(config: &Config) -> Result<Catalog> {
  let store = match config.catalog_db_path() {
    Some(path) => CatalogStore::open(&path)?,
    None => CatalogStore::open_default()?,
  };
  let remote = RemoteCatalog::new(&config.api.url)?;
  Ok(Catalog::new(store, remote.into_fetcher()))
}

fn open_interceptor(config: &Config) -> Result<Interceptor> {
  let cache = match config.cache_db_path() {
    Some(path) => ResponseCache::open(&path)?,
    None => ResponseCache::open_default()?,
  };
  let base = Url::parse(&config.site.url)?;
  let client = reqwest::Client::new();
  Ok(Interceptor::new(Arc::new(cache), base, network_fetcher(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  init_tracing();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  match args.command {
    Command::List {
      refresh,
      cuisine,
      neighborhood,
    } => {
      let catalog = open_catalog(&config)?;
      if refresh {
        let snapshot = catalog.get_all_now(true).await?;
        if let Some(error) = snapshot.refresh_error {
          eprintln!("refresh failed, listing local data: {}", error);
        }
      }
      let records = catalog
        .get_by_filter(cuisine.as_deref(), neighborhood.as_deref())
        .await?;
      println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Command::Show { id } => {
      let catalog = open_catalog(&config)?;
      let record = catalog.get_by_raw_id(&id)?;
      println!("{}", serde_json::to_string_pretty(&record)?);
      println!("photo: {}", record.image_url(None));
    }

    Command::Neighborhoods => {
      let catalog = open_catalog(&config)?;
      for neighborhood in catalog.distinct_neighborhoods().await? {
        println!("{}", neighborhood);
      }
    }

    Command::Cuisines => {
      let catalog = open_catalog(&config)?;
      for cuisine in catalog.distinct_cuisines().await? {
        println!("{}", cuisine);
      }
    }

    Command::Refresh => {
      let catalog = open_catalog(&config)?;
      let mut rx = catalog.get_all(true);
      while let Some(result) = rx.recv().await {
        let snapshot = result?;
        match snapshot.source {
          Source::Local => eprintln!("local snapshot: {} records", snapshot.records.len()),
          Source::Remote => println!("refreshed: {} records", snapshot.records.len()),
        }
        if let Some(error) = snapshot.refresh_error {
          eprintln!("refresh failed, local snapshot stands: {}", error);
        }
      }
    }

    Command::Install => {
      let sw = open_interceptor(&config)?;
      sw.install().await?;
      // New version takes over immediately, no waiting on the old one
      sw.activate()?;
      println!("installed and activated {}", worker::cache_name());
    }

    Command::Activate => {
      let sw = open_interceptor(&config)?;
      sw.activate()?;
    }

    Command::Fetch { url } => {
      let sw = open_interceptor(&config)?;
      let base = Url::parse(&config.site.url)?;
      let absolute = match Url::parse(&url) {
        Ok(u) => u,
        Err(_) => base.join(&url)?,
      };

      let served = sw.handle(absolute.as_str()).await?;
      let source = match served.source {
        ServedSource::Cache => "cache",
        ServedSource::Network => "network",
        ServedSource::Fallback => "fallback",
      };
      eprintln!("{} ({} bytes, from {})", served.response.status, served.response.body.len(), source);
      print!("{}", String::from_utf8_lossy(&served.response.body));
    }

    Command::Warm { ids } => {
      let sw = open_interceptor(&config)?;
      sw.warm(&ids).await?;
    }

    Command::Message { json } => {
      let sw = open_interceptor(&config)?;
      let message: WorkerMessage = serde_json::from_str(&json)?;
      sw.on_message(message).await?;
    }
  }

  Ok(())
}
