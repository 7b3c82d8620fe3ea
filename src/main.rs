// ==========================================
// 药品批记录对账引擎 - 命令行入口
// ==========================================
// 子命令: reconcile / init-db / config
// 退出码: 失败非 0,失败时不写出部分报告
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use pharma_batch_recon::config::{ConfigManager, ReconciliationConfig};
use pharma_batch_recon::db::{get_default_db_path, init_schema, open_sqlite_connection};
use pharma_batch_recon::export::{export_csv_tables, export_report_json, write_report_json};
use pharma_batch_recon::logging::{self, LogFormat};
use pharma_batch_recon::repository::{
    InMemoryDataSource, ReconciliationDataSource, SqliteDataSource,
};
use pharma_batch_recon::{ReconciliationApi, APP_NAME, VERSION};

#[derive(Parser)]
#[command(
    name = "pharma-batch-recon",
    version,
    about = "Reconcile manufactured batch records against formula master data"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate a reconciliation report.
    Reconcile(ReconcileArgs),

    /// Create the database schema.
    InitDb {
        /// SQLite database path (default: $PHARMA_BATCH_RECON_DB_PATH or the user data dir).
        #[arg(long, value_name = "PATH")]
        db: Option<String>,
    },

    /// Show or override reconciliation thresholds stored in the database.
    Config {
        #[arg(long, value_name = "PATH")]
        db: Option<String>,

        /// Override a value, e.g. `--set orphan_high_risk_threshold=8` (repeatable).
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
}

#[derive(Args)]
struct ReconcileArgs {
    /// SQLite database path.
    #[arg(long, value_name = "PATH", conflicts_with_all = ["formulas", "batches"])]
    db: Option<String>,

    /// JSON snapshot of formula records.
    #[arg(long, value_name = "JSON", requires = "batches")]
    formulas: Option<PathBuf>,

    /// JSON snapshot of batch container documents.
    #[arg(long, value_name = "JSON", requires = "formulas")]
    batches: Option<PathBuf>,

    /// Write the JSON report to this file (default: stdout).
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Also write CSV audit tables into this directory.
    #[arg(long = "csv-dir", value_name = "DIR")]
    csv_dir: Option<PathBuf>,

    /// Report text locale (en, zh-CN).
    #[arg(long)]
    locale: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.log_format.into());

    info!("{} v{}", APP_NAME, VERSION);

    let result = match cli.command {
        Command::Reconcile(args) => run_reconcile(args).await,
        Command::InitDb { db } => run_init_db(db),
        Command::Config { db, set } => run_config(db, set),
    };

    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run_reconcile(args: ReconcileArgs) -> Result<()> {
    let (data_source, mut config): (Arc<dyn ReconciliationDataSource>, ReconciliationConfig) =
        match (&args.formulas, &args.batches) {
            (Some(formulas), Some(batches)) => {
                let source = InMemoryDataSource::from_json_files(formulas, batches)
                    .context("读取 JSON 快照失败")?;
                (
                    Arc::new(source) as Arc<dyn ReconciliationDataSource>,
                    ReconciliationConfig::default(),
                )
            }
            _ => {
                let db_path = args.db.clone().unwrap_or_else(get_default_db_path);
                info!(db_path = %db_path, "使用数据库");
                let config = ConfigManager::new(&db_path)?
                    .load_reconciliation_config()
                    .context("加载对账参数失败")?;
                let source = SqliteDataSource::open(&db_path).context("打开数据库失败")?;
                (Arc::new(source) as Arc<dyn ReconciliationDataSource>, config)
            }
        };

    if let Some(locale) = args.locale {
        config.report_locale = locale;
    }

    let api = ReconciliationApi::new(data_source, config)?;
    let report = api.generate_report().await?;

    match &args.output {
        Some(path) => export_report_json(&report, path)?,
        None => write_report_json(&report, std::io::stdout().lock())?,
    }

    if let Some(dir) = &args.csv_dir {
        export_csv_tables(&report, dir)?;
    }

    Ok(())
}

fn run_init_db(db: Option<String>) -> Result<()> {
    let db_path = db.unwrap_or_else(get_default_db_path);
    let conn = open_sqlite_connection(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn)?;
    eprintln!("schema initialized: {}", db_path);
    Ok(())
}

fn run_config(db: Option<String>, set: Vec<String>) -> Result<()> {
    let db_path = db.unwrap_or_else(get_default_db_path);
    let manager = ConfigManager::new(&db_path)?;

    let mut assignments: Vec<(&str, &str)> = Vec::with_capacity(set.len());
    for assignment in &set {
        let Some((key, value)) = assignment.split_once('=') else {
            bail!("无效的配置项 (期望 KEY=VALUE): {}", assignment);
        };
        assignments.push((key, value));
    }

    // 全部覆写校验通过后才写入
    if !assignments.is_empty() {
        manager
            .set_global_config_values(&assignments)
            .context("配置覆写被拒绝,数据库未修改")?;
    }

    println!("{}", manager.get_config_snapshot()?);
    Ok(())
}
