//! Samarth server entry point.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use samarth::{create_rest_router, dispatch, parse_question, AnalyticsEngine, Config, DataManager, DispatchError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Samarth: agricultural and climate statistics Q&A service
#[derive(Parser, Debug)]
#[command(name = "samarth")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default behavior)
    Serve {
        /// HTTP port. If not specified, uses the config file value.
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable JSON logging format
        #[arg(long)]
        json_logs: bool,
    },
    /// Answer a single question against the local dataset
    Ask {
        /// Question text
        question: String,
    },
    /// Download and snapshot the configured datasets to CSV
    Ingest {
        /// Output directory for processed snapshots
        #[arg(short, long, default_value = "data/processed")]
        output: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let is_serve = matches!(args.command, Some(Command::Serve { .. }) | None);
    if !is_serve {
        // Minimal logging for CLI commands
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match args.command {
        Some(Command::Serve { port, json_logs }) => run_server(config, port, json_logs).await,
        None => run_server(config, None, false).await,
        Some(Command::Ask { question }) => run_ask(config, question, args.json).await,
        Some(Command::Ingest { output }) => run_ingest(config, output).await,
    }
}

async fn run_server(mut config: Config, port: Option<u16>, json_logs: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    if let Some(port) = port {
        config.server.http_port = port;
    }

    let data = Arc::new(DataManager::load(&config).await?);
    let engine = Arc::new(AnalyticsEngine::new(data, config.analytics.clone()));
    let router = create_rest_router(engine, &config.server);

    let addr = format!("0.0.0.0:{}", config.server.http_port);
    tracing::info!("Samarth listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn run_ask(config: Config, question: String, as_json: bool) -> anyhow::Result<()> {
    let data = Arc::new(DataManager::load(&config).await?);
    let engine = AnalyticsEngine::new(data, config.analytics.clone());

    let parsed = parse_question(&question);
    match dispatch(&engine, &parsed) {
        Ok(answer) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                println!("{}", answer.answer);
                for table in &answer.tables {
                    println!("\n{}", table.title);
                    println!("{}", table.headers.join(" | "));
                    for row in &table.rows {
                        let cells: Vec<String> = row.iter().map(value_to_string).collect();
                        println!("{}", cells.join(" | "));
                    }
                }
            }
            Ok(())
        }
        Err(DispatchError::MissingParams(message)) => anyhow::bail!("{message}"),
        Err(DispatchError::Domain(err)) => anyhow::bail!("{err}"),
        Err(DispatchError::Internal(err)) => Err(err.into()),
    }
}

async fn run_ingest(config: Config, output: String) -> anyhow::Result<()> {
    let data = DataManager::load(&config).await?;
    let snapshot = data.snapshot();

    let output = std::path::PathBuf::from(output);
    std::fs::create_dir_all(&output)?;

    let agri_path = output.join("agriculture.csv");
    let mut writer = csv::Writer::from_path(&agri_path)?;
    for record in snapshot.production() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    println!("Snapshot written to {}", agri_path.display());

    let rain_path = output.join("rainfall.csv");
    let mut writer = csv::Writer::from_path(&rain_path)?;
    for record in snapshot.rainfall() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    println!("Snapshot written to {}", rain_path.display());

    Ok(())
}

fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "—".to_string(),
        other => other.to_string(),
    }
}
