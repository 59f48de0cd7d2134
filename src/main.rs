use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use processflow::{
    AppConfig, CoordinatorConfig, Entity, EntityKind, ListQuery, MockStore, ProcessInstances,
    ProcessStatus, RemoteStore, RollbackPolicy, Session,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "processflow", about = "ProcessFlow optimistic workflow store")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Finalize process 1 optimistically and show every stage of the collection
    Demo {
        /// Make the store reject the update
        #[arg(long)]
        fail: bool,

        /// Simulated store latency (overrides PROCESSFLOW_LATENCY_MS)
        #[arg(long)]
        latency_ms: Option<u64>,

        /// snapshot | entity (overrides PROCESSFLOW_ROLLBACK)
        #[arg(long)]
        rollback: Option<RollbackPolicy>,
    },
    /// Print the seeded records of one kind as JSON
    List {
        #[arg(long, default_value = "process_instances")]
        kind: EntityKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Demo {
            fail,
            latency_ms,
            rollback,
        } => {
            if let Some(latency_ms) = latency_ms {
                config.store.latency = Duration::from_millis(latency_ms);
            }
            if let Some(rollback) = rollback {
                config.rollback_policy = rollback;
            }
            run_demo(config, fail).await
        }
        Command::List { kind } => run_list(config, kind).await,
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("processflow=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn seeded_store(config: &AppConfig) -> Result<Arc<MockStore>> {
    let store = MockStore::new(config.store.clone()).context("invalid store configuration")?;
    store
        .seed(
            EntityKind::ProcessInstances,
            vec![
                Entity::new(1)
                    .with_field("title", "Licenciamento ambiental - Fazenda Boa Vista")
                    .with_field("status", ProcessStatus::Pendente)
                    .with_field("created_at", "2024-01-02T09:00:00.000000Z"),
                Entity::new(2)
                    .with_field("title", "Outorga de uso de água")
                    .with_field("status", ProcessStatus::EmAndamento)
                    .with_field("created_at", "2024-01-01T09:00:00.000000Z"),
            ],
        )
        .await;
    Ok(Arc::new(store))
}

async fn run_demo(config: AppConfig, fail: bool) -> Result<()> {
    let store = seeded_store(&config).await?;
    let instances = ProcessInstances::new(Arc::clone(&store), Session::new("u-1", "Consultor"))
        .with_config(
            CoordinatorConfig::new("process_instances").rollback_policy(config.rollback_policy),
        )?;

    instances.refresh().await.context("initial load failed")?;
    print_stage("loaded", &instances.instances())?;

    if fail {
        store.fail_next(1);
    }

    let pending = instances.begin_status_update(1, ProcessStatus::Finalizado)?;
    print_stage("optimistic", &instances.instances())?;

    match pending.settle().await {
        Ok(confirmed) => info!(id = %confirmed.id(), "status update confirmed"),
        Err(err) => info!(error = %err, "status update rolled back"),
    }
    print_stage("settled", &instances.instances())?;

    println!("{}", instances.stats());
    Ok(())
}

async fn run_list(config: AppConfig, kind: EntityKind) -> Result<()> {
    let store = seeded_store(&config).await?;
    let entities = store.list(kind, ListQuery::new()).await?;
    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

fn print_stage(stage: &str, entities: &[Entity]) -> Result<()> {
    println!("== {stage}");
    println!("{}", serde_json::to_string_pretty(entities)?);
    Ok(())
}
