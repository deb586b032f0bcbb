//! signal-relay CLI - relay chat signal reports to webhook and chat sinks
//!
//! `serve` runs the ingestion endpoint, `parse` shows what the extractor makes
//! of saved messages, `rules` prints the active rule table.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use signal_relay::{
    decide, ConfigOverrides, Decision, NdjsonWriter, Payload, RelayConfig, RelayMode,
};

#[derive(Parser)]
#[command(name = "signal-relay")]
#[command(version, about = "Relay chat signal reports to webhook and chat sinks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP ingestion endpoint
    Serve {
        /// Address to listen on (overrides HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Payload mode: raw or structured (overrides RELAY_MODE)
        #[arg(short, long)]
        mode: Option<RelayMode>,

        /// YAML rule table (overrides SIGNAL_RULES)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Extract saved messages (one message per file, `-` for stdin) and print NDJSON
    Parse {
        /// Message files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// YAML rule table (overrides SIGNAL_RULES)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Payload mode used to show what would be relayed (overrides RELAY_MODE)
        #[arg(short, long)]
        mode: Option<RelayMode>,
    },

    /// Print the active rule table as YAML
    Rules {
        /// YAML rule table to validate and print (overrides SIGNAL_RULES)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ParseReport {
    source: String,
    valid: bool,
    missing: Vec<String>,
    payload: serde_json::Value,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { host, port, mode, rules } => {
            run_serve(ConfigOverrides {
                host,
                port,
                mode,
                rules_path: rules,
            })
            .await
        }
        Commands::Parse { files, rules, mode } => run_parse(
            &files,
            ConfigOverrides {
                mode,
                rules_path: rules,
                ..ConfigOverrides::default()
            },
        ),
        Commands::Rules { rules } => run_rules(ConfigOverrides {
            rules_path: rules,
            ..ConfigOverrides::default()
        }),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run_serve(overrides: ConfigOverrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_env_with(overrides)?;

    let relay = Arc::new(config.build_relay()?);
    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    signal_relay::server::serve(listener, relay).await?;
    Ok(())
}

fn read_message(path: &PathBuf) -> Result<String, std::io::Error> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

fn run_parse(files: &[PathBuf], overrides: ConfigOverrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_env_with(overrides)?;
    let extractor = config.build_extractor()?;
    let mode = config.mode;
    let stdout = std::io::stdout();
    let mut writer = NdjsonWriter::new(stdout.lock());

    for path in files {
        let raw = read_message(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let extraction = extractor.extract(&raw);

        let missing = extraction
            .record()
            .map(|record| record.missing_fields())
            .unwrap_or_default();

        let payload = match decide(&raw, &extraction, mode) {
            Decision::Drop => serde_json::Value::Null,
            Decision::Forward(Payload::Raw(text)) => serde_json::Value::String(text),
            Decision::Forward(Payload::Record(record)) => serde_json::to_value(&record)?,
        };

        writer.write(&ParseReport {
            source: path.display().to_string(),
            valid: extraction.is_valid(),
            missing,
            payload,
        })?;
    }

    writer.flush()?;
    Ok(())
}

fn run_rules(overrides: ConfigOverrides) -> Result<(), Box<dyn std::error::Error>> {
    let table = RelayConfig::from_env_with(overrides)?.load_rules()?;
    print!("{}", table.to_yaml()?);
    Ok(())
}
