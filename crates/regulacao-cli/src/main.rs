// crates/regulacao-cli/src/main.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use regulacao_core::db;
use regulacao_core::fila::{self, Anonymizer};
use regulacao_core::unidades::{self, loader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ETL pipelines for the Rio regulation dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the destination tables if they do not exist yet.
    InitSchema,
    /// Clean the raw health-unit export and reload `unidades_saude`.
    TransformUnidades(TransformUnidadesArgs),
    /// Clean the raw queue extract and append it to `fila_regulacao`.
    EtlFila(EtlFilaArgs),
    /// Regenerate `fila_regulacao` with synthetic demo entries.
    SeedFila(SeedFilaArgs),
}

#[derive(Args, Debug)]
struct TransformUnidadesArgs {
    /// Raw units CSV (delimiter is sniffed; BOM tolerated).
    input: PathBuf,
    /// Also write the cleaned dataset to this CSV path.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct EtlFilaArgs {
    /// Raw queue CSV.
    input: PathBuf,
    /// Replace names with a truncated hash instead of initials.
    #[arg(long)]
    hash_names: bool,
}

#[derive(Args, Debug)]
struct SeedFilaArgs {
    /// How many synthetic queue entries to generate.
    #[arg(long, default_value_t = 350)]
    count: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let pool = connect_pool().await?;

    match cli.command {
        Command::InitSchema => {
            loader::ensure_schema(&pool).await?;
            fila::etl::ensure_schema(&pool).await?;
            info!("Destination tables ready");
        }
        Command::TransformUnidades(args) => {
            let table = unidades::read_unidades_csv(&args.input)
                .with_context(|| format!("failed to read {}", args.input.display()))?;
            if table.skipped_lines > 0 {
                info!(skipped = table.skipped_lines, "malformed lines skipped");
            }

            let outcome = unidades::transform_unidades(&table);
            if let Some(out_path) = &args.out {
                loader::export_csv(out_path, &outcome.unidades, &table.columns_present)?;
                info!(path = %out_path.display(), "cleaned dataset exported");
            }

            loader::ensure_schema(&pool).await?;
            loader::replace_all(&pool, &outcome.unidades)
                .await
                .context("unit reload failed; previous rows left untouched")?;
            println!(
                "✅ {} unidades carregadas ({} linhas sem nome descartadas).",
                outcome.unidades.len(),
                outcome.dropped_missing_name
            );
        }
        Command::EtlFila(args) => {
            let anonymizer = if args.hash_names {
                Anonymizer::Hash
            } else {
                Anonymizer::Initials
            };
            let summary = fila::etl::run(&pool, &args.input, anonymizer).await?;
            println!(
                "✅ {} registros inseridos na fila ({} duplicatas removidas).",
                summary.rows_inserted, summary.duplicates_removed
            );
        }
        Command::SeedFila(args) => {
            fila::seed::run(&pool, args.count).await?;
            println!("✅ {} pacientes fictícios inseridos na regulação.", args.count);
        }
    }

    Ok(())
}

async fn connect_pool() -> Result<db::DbPool> {
    dotenvy::dotenv().ok();
    let database_url =
        db::database_url_from_env().context("connection string missing; nothing was loaded")?;
    db::connect(&database_url)
        .await
        .context("failed to connect to Postgres")
}
