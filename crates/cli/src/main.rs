use celeris_dns_domain::config::{ConfigError, ResolverConfig};
use celeris_dns_infrastructure::Resolver;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{error, info};

mod bootstrap;

const EXIT_FATAL: i32 = 1;
const EXIT_CONFIG: i32 = -1;

#[derive(Parser)]
#[command(name = "celeris-dns")]
#[command(version = "0.1.0")]
#[command(about = "Celeris DNS - embedded recursive name resolution demo")]
struct Cli {
    /// Configuration file path (YAML); defaults are used when omitted
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a single hostname
    Resolve {
        hostname: String,

        /// Drop any cached record first
        #[arg(long)]
        refresh: bool,
    },

    /// Resolve several hostnames as one batch
    Batch { hostnames: Vec<String> },

    /// Validate the configuration and exit
    Validate,

    /// Resolve hostnames, then dump the metrics snapshot as JSON
    Stats { hostnames: Vec<String> },
}

enum AppError {
    Config(ConfigError),
    Fatal(anyhow::Error),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    bootstrap::init_logging(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => {}
        Err(AppError::Config(e)) => {
            error!(error = %e, "Configuration error");
            std::process::exit(EXIT_CONFIG);
        }
        Err(AppError::Fatal(e)) => {
            error!(error = %e, "Fatal error");
            std::process::exit(EXIT_FATAL);
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let resolver = Arc::new(Resolver::new());

    resolver.events().add_callback("log-changes", |event| {
        info!(
            hostname = %event.hostname,
            old = ?event.old_addresses,
            new = ?event.new_addresses,
            source = %event.source,
            "Address set changed"
        );
    });

    match cli.config.as_deref() {
        Some(path) => resolver.load_config_file(path).await?,
        None => resolver.load_config(ResolverConfig::default()).await?,
    }

    match cli.command {
        Command::Resolve { hostname, refresh } => {
            let result = if refresh {
                resolver.refresh(&hostname).await
            } else {
                resolver.resolve(&hostname).await
            };
            print_result(&result);
            if !result.is_success() {
                return Err(AppError::Fatal(anyhow::anyhow!(
                    "resolution failed: {}",
                    result.status
                )));
            }
        }

        Command::Batch { hostnames } => {
            if hostnames.is_empty() {
                return Err(AppError::Fatal(anyhow::anyhow!("no hostnames given")));
            }
            let results = resolver.resolve_batch(&hostnames).await;
            for result in &results {
                print_result(result);
            }
            if results.iter().all(|r| !r.is_success()) {
                return Err(AppError::Fatal(anyhow::anyhow!("every resolution failed")));
            }
        }

        Command::Validate => {
            println!("configuration valid");
        }

        Command::Stats { hostnames } => {
            if !hostnames.is_empty() {
                resolver.resolve_batch(&hostnames).await;
            }
            let stats = resolver.stats();
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Fatal(anyhow::anyhow!(e)))?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn print_result(result: &celeris_dns_domain::ResolveResult) {
    if result.is_success() {
        println!(
            "{} -> {} ({}ms)",
            result.hostname,
            result
                .addresses
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            result.elapsed.as_millis()
        );
    } else {
        println!("{} -> FAILED ({})", result.hostname, result.status);
    }
}
