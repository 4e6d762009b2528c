//! fastrun CLI: check whether a Wikibase write is required.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use wikibase_fastrun::config::FastrunConfig;
use wikibase_fastrun::fastrun::registry::FastrunRegistry;
use wikibase_fastrun::model::Claim;
use wikibase_fastrun::property::PropertyId;
use wikibase_fastrun::query::local::LocalStore;
use wikibase_fastrun::query::QueryInterface;

#[derive(Parser)]
#[command(name = "fastrun", version, about = "Wikibase fastrun write check")]
struct Cli {
    /// TOML configuration file. Defaults target Wikidata.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer queries from a local Turtle file instead of the SPARQL endpoint.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file with default settings.
    Init {
        /// Where to write the file.
        path: PathBuf,
    },

    /// Report whether writing the given claims would change anything.
    Check {
        /// JSON file holding a list of claims for one entity.
        #[arg(long)]
        claims: PathBuf,

        /// Only check these properties (comma-separated, e.g. "P21,P27").
        #[arg(long)]
        properties: Option<String>,

        /// Reload every property even if it is cached.
        #[arg(long)]
        no_cache: bool,
    },

    /// List remote entities holding values of the claims' properties.
    Entities {
        /// JSON file holding a list of claims.
        #[arg(long)]
        claims: PathBuf,
    },

    /// Look up the datatype of a property.
    PropertyType {
        /// Property id, e.g. "P31" or "31".
        property: String,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { path } = &cli.command {
        FastrunConfig::default().save(path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => FastrunConfig::load(path)?,
        None => FastrunConfig::default(),
    };
    let query: Arc<dyn QueryInterface> = match &cli.data {
        Some(path) => Arc::new(local_store(path)?),
        None => Arc::new(config.http_query()),
    };
    let registry = FastrunRegistry::new(config.clone(), query);
    let engine = registry.acquire_for(&config)?;
    let mut engine = engine.lock().map_err(|_| miette::miette!("engine lock poisoned"))?;

    match cli.command {
        Commands::Init { .. } => {}

        Commands::Check {
            claims,
            properties,
            no_cache,
        } => {
            let claims = read_claims(&claims)?;
            let filter = properties
                .map(|list| {
                    list.split(',')
                        .map(|p| PropertyId::parse(p.trim()))
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .transpose()?;
            let use_cache = no_cache.then_some(false);
            let required =
                engine.write_required(&claims, filter.as_deref(), None, None, use_cache)?;
            if required {
                println!("write required");
            } else {
                println!("no write required");
            }
        }

        Commands::Entities { claims } => {
            let claims = read_claims(&claims)?;
            let entities = engine.entities_matching(&claims, None)?;
            if entities.is_empty() {
                println!("No matching entities.");
            }
            for id in entities {
                println!("{id}");
            }
        }

        Commands::PropertyType { property } => {
            let property = PropertyId::parse(&property)?;
            let property_type = engine.fetch_property_type(property)?;
            println!("{property}\t{property_type}");
        }
    }

    Ok(())
}

fn local_store(path: &Path) -> Result<LocalStore> {
    let data = std::fs::read_to_string(path).into_diagnostic()?;
    let store = LocalStore::in_memory()?;
    store.load_turtle(&data)?;
    Ok(store)
}

fn read_claims(path: &Path) -> Result<Vec<Claim>> {
    let content = std::fs::read_to_string(path).into_diagnostic()?;
    let claims: Vec<Claim> = serde_json::from_str(&content).into_diagnostic()?;
    for claim in &claims {
        claim.validate()?;
    }
    Ok(claims)
}
