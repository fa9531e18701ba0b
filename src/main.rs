use std::path::PathBuf;

use anyhow::Context;
use bookstore::{AcceptMode, BookQuery, CustomerQuery, Lookup, LookupConfig};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Approximate lookup over the bookstore catalogue.
#[derive(Debug, Parser)]
#[command(name = "bookstore-lookup", version, about)]
struct Cli {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON seed file; overrides `store.seed_path`.
    #[arg(long, global = true)]
    seed: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Look up books.
    Books(BookArgs),
    /// Look up customers.
    Customers(CustomerArgs),
}

#[derive(Debug, Args)]
struct Common {
    /// Similarity percentage; out-of-range values are clamped.
    #[arg(long, allow_hyphen_values = true)]
    threshold: Option<i64>,

    /// Accept records matching any supplied field.
    #[arg(long)]
    any: bool,

    /// Free text tried against every field; per-field flags are ignored.
    #[arg(long)]
    input: Option<String>,
}

#[derive(Debug, Args)]
struct BookArgs {
    #[command(flatten)]
    common: Common,

    #[arg(long)]
    book_no: Option<String>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    publisher: Option<String>,
    /// Comma-separated; every keyword must match.
    #[arg(long)]
    keywords: Option<String>,
    /// Comma-separated; every author must match.
    #[arg(long)]
    authors: Option<String>,
}

#[derive(Debug, Args)]
struct CustomerArgs {
    #[command(flatten)]
    common: Common,

    #[arg(long)]
    online_id: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    order_id: Option<i32>,
}

impl Common {
    fn accept_mode(&self) -> Option<AcceptMode> {
        self.any.then_some(AcceptMode::Any)
    }
}

impl BookArgs {
    fn into_query(self) -> BookQuery {
        let mut query = match self.common.input.clone() {
            Some(input) => BookQuery::free_text(input),
            None => BookQuery {
                book_no: self.book_no,
                title: self.title,
                publisher_name: self.publisher,
                keywords: self.keywords,
                authors: self.authors,
                ..Default::default()
            },
        };
        query.match_threshold = self.common.threshold;
        if let Some(mode) = self.common.accept_mode() {
            query.accept_mode = Some(mode);
        }
        query
    }
}

impl CustomerArgs {
    fn into_query(self) -> CustomerQuery {
        let mut query = match self.common.input.clone() {
            Some(input) => CustomerQuery::free_text(input),
            None => CustomerQuery {
                online_id: self.online_id,
                name: self.name,
                address: self.address,
                order_id: self.order_id,
                ..Default::default()
            },
        };
        query.match_threshold = self.common.threshold;
        if let Some(mode) = self.common.accept_mode() {
            query.accept_mode = Some(mode);
        }
        query
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LookupConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => LookupConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.store.seed_path = Some(seed);
    }
    let lookup = Lookup::from_config(&config)?;

    let output = match cli.command {
        Command::Books(args) => {
            serde_json::to_string_pretty(&lookup.query_books(&args.into_query()).await?)?
        }
        Command::Customers(args) => {
            serde_json::to_string_pretty(&lookup.query_customers(&args.into_query()).await?)?
        }
    };
    println!("{output}");
    Ok(())
}
