use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crosslink::{
    duplicates_query, find_all_similar_with, find_duplicates, find_similar, group_duplicates, import_csv_path,
    normalize_rows, related_rows_query, run_checks, CheckStatus, Dialect, ExplainedRow, ImportOptions, MemoryStore, MemoryTable,
    NormalizedRows, QueryExecutor, Registry, Row, ScanOptions, Session, SessionConfig, SimilarityStats, TableSchema,
};

/// Cross-check records between tables with different schemas
#[derive(Parser, Debug)]
#[command(name = "crosslink")]
#[command(about = "Schema mapping and weighted similarity matching between tables", long_about = None)]
struct Args {
    /// Session configuration (JSON)
    #[arg(short, long, default_value = "session.json")]
    config: PathBuf,

    /// CSV column holding row ids
    #[arg(long, global = true)]
    id_column: Option<String>,

    /// CSV field delimiter
    #[arg(long, global = true, default_value_t = ',')]
    delimiter: char,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rows similar to one probe row
    Similar {
        #[arg(long)]
        table: String,
        #[arg(long)]
        data: PathBuf,
        /// Position of the probe row in the data file
        #[arg(long)]
        probe_row: usize,
        #[arg(long, default_value_t = 0.8)]
        threshold: f64,
    },
    /// Every row paired with the rows similar to it
    AllSimilar {
        #[arg(long)]
        table: String,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value_t = 0.8)]
        threshold: f64,
        /// Parallel slices, 0 for one per CPU
        #[arg(long, default_value_t = 0)]
        jobs: usize,
        /// Stop scanning after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Exact duplicates of a probe row, or all duplicate groups
    Duplicates {
        #[arg(long)]
        table: String,
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        probe_row: Option<usize>,
    },
    /// Query for rows of one table related to a row of another
    Related {
        #[arg(long)]
        from: String,
        #[arg(long)]
        from_data: PathBuf,
        #[arg(long)]
        to: String,
        /// Target rows, required with --execute
        #[arg(long)]
        to_data: Option<PathBuf>,
        #[arg(long)]
        probe_row: usize,
        #[arg(long, value_enum, default_value_t = DialectArg::Sqlite)]
        dialect: DialectArg,
        /// Exact AND-joined equality instead of OR-joined field conditions
        #[arg(long)]
        exact: bool,
        /// Run the query against the target data
        #[arg(long)]
        execute: bool,
    },
    /// Run the configured checks against a table
    Check {
        #[arg(long)]
        table: String,
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DialectArg {
    Sqlite,
    Postgres,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Postgres => Dialect::Postgres,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Crosslink v{}", env!("CARGO_PKG_VERSION"));
    let session = SessionConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?
        .build(&Registry::new())
        .context("building session")?;

    let mut options = ImportOptions::default();
    options.id_column = args.id_column.clone();
    options.delimiter = u8::try_from(args.delimiter).context("delimiter must be a single byte")?;

    match args.command {
        Command::Similar {
            table,
            data,
            probe_row,
            threshold,
        } => {
            let schema = table_schema(&session, &table)?;
            let normalized = load_normalized(schema, &data, &options)?;
            let probe = normalized_probe(&normalized, probe_row)?;
            let results = find_similar(&normalized.rows, probe, session.common(), threshold);
            let explained = ExplainedRow::from_similar_list(session.common(), probe, &results);
            let stats = SimilarityStats::compute(&explained, normalized.rows.len());
            print_json(&SimilarOutput {
                results: explained,
                stats,
            })?;
        }
        Command::AllSimilar {
            table,
            data,
            threshold,
            jobs,
            timeout_secs,
        } => {
            let schema = table_schema(&session, &table)?;
            let normalized = load_normalized(schema, &data, &options)?;
            let mut scan = ScanOptions::default().with_parallelism(jobs);
            if let Some(secs) = timeout_secs {
                scan = scan.with_deadline(Instant::now() + Duration::from_secs(secs));
            }
            let outcome = find_all_similar_with(&normalized.rows, session.common(), threshold, &scan);
            print_json(&outcome)?;
        }
        Command::Duplicates {
            table,
            data,
            probe_row,
        } => {
            let schema = table_schema(&session, &table)?;
            let normalized = load_normalized(schema, &data, &options)?;
            match probe_row {
                Some(n) => {
                    let probe = normalized_probe(&normalized, n)?;
                    print_json(&find_duplicates(&normalized.rows, probe, session.common()))?;
                }
                None => print_json(&group_duplicates(&normalized.rows, session.common()))?,
            }
        }
        Command::Related {
            from,
            from_data,
            to,
            to_data,
            probe_row,
            dialect,
            exact,
            execute,
        } => {
            let source = table_schema(&session, &from)?;
            let target = table_schema(&session, &to)?;
            let rows = import_csv_path(&from_data, source, &options)
                .with_context(|| format!("importing {}", from_data.display()))?;
            let row = rows
                .get(probe_row)
                .with_context(|| format!("probe row {} out of range ({} rows)", probe_row, rows.len()))?;

            let query = if exact {
                duplicates_query(source, target, row)?
            } else {
                related_rows_query(source, target, row)?
            };
            let rendered = query.render(dialect.into())?;

            let matched = if execute {
                let Some(to_data) = to_data else {
                    bail!("--execute needs --to-data");
                };
                let store = MemoryStore::new();
                let table = store.create_table(target.clone())?;
                table.extend(
                    import_csv_path(&to_data, target, &options)
                        .with_context(|| format!("importing {}", to_data.display()))?,
                );
                Some(store.execute(&query)?)
            } else {
                None
            };

            print_json(&RelatedOutput {
                sql: rendered.sql(),
                params: rendered.params(),
                rows: matched,
            })?;
        }
        Command::Check { table, data } => {
            let schema = table_schema(&session, &table)?;
            let memory = MemoryTable::new(schema.clone());
            memory.extend(
                import_csv_path(&data, schema, &options).with_context(|| format!("importing {}", data.display()))?,
            );
            let checks: Vec<_> = session.checks_for(&table).cloned().collect();
            let report = run_checks(&memory, &checks)?;
            print_json(&report)?;

            let failed = report.with_status(CheckStatus::Failed).count();
            if failed > 0 {
                bail!("{} check(s) failed", failed);
            }
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct SimilarOutput {
    results: Vec<ExplainedRow>,
    stats: SimilarityStats,
}

#[derive(Serialize)]
struct RelatedOutput<'a> {
    sql: &'a str,
    params: &'a [crosslink::Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    rows: Option<Vec<Row>>,
}

fn table_schema<'a>(session: &'a Session, name: &str) -> anyhow::Result<&'a TableSchema> {
    session
        .table(name)
        .with_context(|| format!("table '{}' is not configured", name))
}

fn load_normalized(schema: &TableSchema, data: &Path, options: &ImportOptions) -> anyhow::Result<NormalizedRows> {
    let rows = import_csv_path(data, schema, options).with_context(|| format!("importing {}", data.display()))?;
    let normalized = normalize_rows(schema, &rows);
    for error in &normalized.errors {
        warn!("{}", error);
    }
    info!(rows = normalized.rows.len(), skipped = normalized.errors.len(), "Loaded {}", data.display());
    Ok(normalized)
}

/// Normalized row for input position `n`
fn normalized_probe(normalized: &NormalizedRows, n: usize) -> anyhow::Result<&Row> {
    match normalized.indices.iter().position(|&i| i == n) {
        Some(pos) => Ok(&normalized.rows[pos]),
        None => bail!("probe row {} is missing or failed to normalize", n),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
