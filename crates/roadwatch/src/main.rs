mod import;
mod output;
mod telemetry;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use roadwatch_api::ApiState;
use roadwatch_core::config::Config;
use roadwatch_store::Store;

use crate::output::{print_road_import_summary, print_sensor_import_summary, print_status_human};
use crate::telemetry::{init_cli_tracing, init_run_tracing};

#[derive(Parser, Debug)]
#[command(name = "roadwatch")]
#[command(about = "Road traffic monitoring backend and import tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Serve the HTTP resource API")]
    Run {
        #[arg(long)]
        http_addr: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        admin_token: Option<String>,
    },
    #[command(about = "Bulk import road segments and speed readings from CSV")]
    ImportCsv {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        chunk_size: Option<usize>,
    },
    #[command(about = "Register sensors from a name,uuid CSV")]
    LoadSensors {
        #[arg(long)]
        file: PathBuf,
    },
    #[command(about = "Show store counters")]
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = Config::load().context("load config")?;
    if let Some(path) = cli.db_path {
        cfg.db_path = path;
    }

    match cli.command {
        Commands::Run {
            http_addr,
            api_key,
            admin_token,
        } => {
            init_run_tracing();
            if let Some(v) = http_addr {
                cfg.http_addr = v;
            }
            if let Some(v) = api_key {
                cfg.api_key = Some(v);
            }
            if let Some(v) = admin_token {
                cfg.admin_token = Some(v);
            }
            run_server(cfg).await
        }
        Commands::ImportCsv { file, chunk_size } => {
            init_cli_tracing();
            let store = Store::open(&cfg.db_path)?;
            let chunk = chunk_size.unwrap_or(cfg.import_chunk_size);
            anyhow::ensure!(chunk > 0, "chunk size must be positive");
            let summary = import::import_road_csv(&store, &file, chunk)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "readings": summary.readings,
                        "segments": summary.segments,
                        "skipped": summary.skipped,
                    })
                );
            } else {
                print_road_import_summary(&summary);
            }
            Ok(())
        }
        Commands::LoadSensors { file } => {
            init_cli_tracing();
            let store = Store::open(&cfg.db_path)?;
            let summary = import::load_sensors_csv(&store, &file)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "loaded": summary.loaded,
                        "skipped": summary.skipped,
                    })
                );
            } else {
                print_sensor_import_summary(&summary);
            }
            Ok(())
        }
        Commands::Status => {
            init_cli_tracing();
            let store = Store::open(&cfg.db_path)?;
            let status = store.status()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status_human(&status);
            }
            Ok(())
        }
    }
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    let store = Store::open(&cfg.db_path)?;

    eprintln!("roadwatch run");
    eprintln!("  db: {}", cfg.db_path.display());
    eprintln!("  http: {}", cfg.http_addr);
    if cfg.api_key.is_none() {
        eprintln!("  warning: no api key configured, record ingestion is disabled");
    }
    if cfg.admin_token.is_none() {
        eprintln!("  warning: no admin token configured, mutations are disabled");
    }

    let addr: SocketAddr = cfg
        .http_addr
        .parse()
        .with_context(|| format!("invalid http addr: {}", cfg.http_addr))?;
    let state = ApiState {
        store,
        api_key: cfg.api_key,
        admin_token: cfg.admin_token,
    };

    let server = tokio::spawn(roadwatch_api::serve(addr, state));

    tokio::select! {
        res = server => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c, shutting down");
        }
    }

    Ok(())
}
