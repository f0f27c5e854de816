mod config;
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use broker::{Broker, DiscoveryReport, Parameters, ProbeStatus};
use chrono::Local;
use clap::{Parser, Subcommand};
use host::SystemHost;
use registry::Endpoint;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

#[derive(Parser)]
#[command(name = "capbroker")]
#[command(about = "Discover local capabilities and invoke them by id", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./capbroker.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-RPC requests on stdin/stdout
    Serve,
    /// List discovered endpoints
    List {
        /// Only endpoints in this category
        #[arg(long)]
        category: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show broker health
    Health,
    /// Execute an endpoint
    Exec {
        /// Endpoint id
        id: String,
        /// Parameter as key=value (string value; use --params for structured data)
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        param: Vec<(String, Value)>,
        /// Parameter bag as a JSON object
        #[arg(long)]
        params: Option<String>,
    },
    /// Run discovery and print the per-probe report
    Discover {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::resolve(cli.config.as_deref())?;
    init_tracing(&config.log.filter);

    let broker = Broker::new(SystemHost::new(), config.timeouts);
    let report = broker.start().await;

    match cli.command {
        Commands::Serve => cmd_serve(broker).await,
        Commands::List { category, json } => cmd_list(&broker, category.as_deref(), json),
        Commands::Health => print_json(&broker.health()),
        Commands::Exec { id, param, params } => {
            cmd_exec(&broker, &id, build_parameters(params.as_deref(), param)?).await
        }
        Commands::Discover { json } => cmd_discover(&report, json),
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn cmd_serve(broker: Broker<SystemHost>) -> Result<()> {
    info!(
        endpoints = broker.registry().count(),
        "serving JSON-RPC on stdio"
    );
    rpc::serve(Arc::new(broker), tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}

fn cmd_list(broker: &Broker<SystemHost>, category: Option<&str>, json: bool) -> Result<()> {
    let endpoints = broker.list_capabilities(category);
    let endpoints: Vec<&Endpoint> = endpoints.iter().map(|e| e.as_ref()).collect();

    if json {
        return print_json(&endpoints);
    }

    if endpoints.is_empty() {
        println!("No endpoints found.");
        return Ok(());
    }

    println!("{:<28}  {:<18}  DESCRIPTION", "ID", "CATEGORY");
    println!("{}", "-".repeat(80));
    for endpoint in endpoints {
        println!(
            "{:<28}  {:<18}  {}",
            endpoint.id, endpoint.category, endpoint.description
        );
    }
    Ok(())
}

async fn cmd_exec(broker: &Broker<SystemHost>, id: &str, parameters: Parameters) -> Result<()> {
    let result = broker.execute(id, Some(parameters)).await?;
    print_json(&result)?;

    if !result.success {
        return Err(Error::ExecutionFailed {
            id: id.to_string(),
            message: result.message,
        });
    }
    Ok(())
}

fn cmd_discover(report: &DiscoveryReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }

    let started = report.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
    println!("Discovery started {started}\n");
    println!("{:<20}  {:<10}  DETAIL", "PROBE", "STATUS");
    println!("{}", "-".repeat(80));
    for outcome in &report.outcomes {
        let (status, detail) = match &outcome.status {
            ProbeStatus::Registered { endpoints } => ("ok", format!("{endpoints} endpoint(s)")),
            ProbeStatus::Skipped { reason } => ("skipped", reason.clone()),
            ProbeStatus::Failed { reason } => ("failed", reason.clone()),
        };
        println!("{:<20}  {:<10}  {detail}", outcome.probe.name(), status);
    }
    println!("\n{} endpoint(s) registered", report.endpoints_registered);
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse `key=value` into a string parameter.
fn parse_key_value(raw: &str) -> std::result::Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), Value::String(value.to_string())))
}

/// Merge `--params` with `-p` pairs; pairs win on conflicting keys.
fn build_parameters(json: Option<&str>, pairs: Vec<(String, Value)>) -> Result<Parameters> {
    let mut parameters = match json {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(Error::InvalidParameters(format!(
                    "--params must be a JSON object, got {other}"
                )));
            }
            Err(e) => return Err(Error::InvalidParameters(e.to_string())),
        },
        None => Parameters::new(),
    };
    parameters.extend(pairs);
    Ok(parameters)
}
