//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use renewtrack_core::ingest::{IngestOutcome, IngestReport};
use renewtrack_core::notify::{NotifyOutcome, NotifyReport};
use renewtrack_core::pipeline::ProgressReporter;
use renewtrack_mailer::{Dispatcher, Reminder, SmtpDispatcher};
use renewtrack_shared::{
    AppConfig, IngestOptions, NotifyOptions, RenewTrackError, init_config, load_config,
    load_config_from, smtp_password,
};
use renewtrack_storage::{ContractRepository, Storage};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// renewtrack: track contract renewal dates and send reminders.
#[derive(Parser)]
#[command(
    name = "renewtrack",
    version,
    about = "Extract renewal dates from contract documents and email reminders before they come due.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.renewtrack/renewtrack.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Contract database path (overrides `paths.database`).
    #[arg(long, env = "RENEWTRACK_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Flags for the parse step.
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct ParseArgs {
    /// Directory of contract documents (overrides `paths.source_dir`).
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Stop at the first document that cannot be read.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Flags for the notify step.
#[derive(clap::Args, Clone, Debug)]
pub(crate) struct NotifyArgs {
    /// Lookahead window in days (overrides `notify.lookahead_days`).
    #[arg(long)]
    pub days: Option<u32>,

    /// Evaluate the window as of this date (YYYY-MM-DD) instead of today.
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Show which reminders would go out without sending or marking anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Stop at the first reminder that fails to send.
    #[arg(long)]
    pub stop_on_send_error: bool,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan contract documents and record newly found renewal dates.
    Parse {
        #[command(flatten)]
        args: ParseArgs,
    },

    /// Send reminders for contracts renewing within the lookahead window.
    Notify {
        #[command(flatten)]
        args: NotifyArgs,
    },

    /// Parse, then notify.
    Run {
        #[command(flatten)]
        parse: ParseArgs,

        #[command(flatten)]
        notify: NotifyArgs,
    },

    /// List tracked contracts.
    List {
        /// Only show contracts that have not been notified yet.
        #[arg(long)]
        unnotified: bool,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "renewtrack=info",
        1 => "renewtrack=debug",
        _ => "renewtrack=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    // `config init` must work without a readable config file.
    let settings = || -> Result<(AppConfig, PathBuf)> {
        let app = resolve_config(cli.config.as_deref())?;
        let db_path = cli
            .db
            .clone()
            .unwrap_or_else(|| PathBuf::from(&app.paths.database));
        Ok((app, db_path))
    };

    match cli.command {
        Command::Parse { args } => {
            let (app, db_path) = settings()?;
            cmd_parse(&app, &db_path, &args).await
        }
        Command::Notify { args } => {
            let (app, db_path) = settings()?;
            cmd_notify(&app, &db_path, &args).await
        }
        Command::Run { parse, notify } => {
            let (app, db_path) = settings()?;
            cmd_parse(&app, &db_path, &parse).await?;
            cmd_notify(&app, &db_path, &notify).await
        }
        Command::List { unnotified, json } => {
            let (_, db_path) = settings()?;
            cmd_list(&db_path, unnotified, json).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

async fn cmd_parse(app: &AppConfig, db_path: &Path, args: &ParseArgs) -> Result<()> {
    let mut options = IngestOptions::from(app);
    if let Some(dir) = &args.dir {
        options.source_dir = dir.clone();
    }
    options.fail_fast = args.fail_fast;

    if !options.source_dir.is_dir() {
        return Err(eyre!(
            "source directory '{}' does not exist",
            options.source_dir.display()
        ));
    }

    info!(
        source_dir = %options.source_dir.display(),
        db = %db_path.display(),
        "parsing contract documents"
    );

    let storage = Storage::open(db_path).await?;
    let reporter = CliProgress::new();
    let report = renewtrack_core::ingest::ingest_all(&options, &storage, &reporter).await?;

    print_ingest_report(&report);
    Ok(())
}

fn print_ingest_report(report: &IngestReport) {
    println!();
    for doc in &report.documents {
        let line = match &doc.outcome {
            IngestOutcome::Inserted { renewal_date, .. } => format!("added      {renewal_date}"),
            IngestOutcome::AlreadyTracked { .. } => "tracked".to_string(),
            IngestOutcome::NoDate => "no date".to_string(),
            IngestOutcome::ReadFailed { error } => format!("FAILED     {error}"),
        };
        println!("  {:<40} {line}", doc.filename);
    }
    println!();
    println!("  Documents parsed.");
    println!("  Added:     {}", report.inserted());
    println!("  Tracked:   {}", report.already_tracked());
    println!("  No date:   {}", report.no_date());
    println!("  Failed:    {}", report.failed());
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// notify
// ---------------------------------------------------------------------------

async fn cmd_notify(app: &AppConfig, db_path: &Path, args: &NotifyArgs) -> Result<()> {
    let mut options = NotifyOptions::from(app);
    if let Some(days) = args.days {
        options.lookahead_days = days;
    }
    options.dry_run = args.dry_run;
    options.fail_fast = args.stop_on_send_error;

    let today = args
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let dispatcher: Box<dyn Dispatcher> = if options.dry_run {
        Box::new(NoDispatch)
    } else {
        let password = smtp_password(app)?;
        Box::new(SmtpDispatcher::new(&app.smtp, password)?)
    };

    info!(
        %today,
        lookahead_days = options.lookahead_days,
        smtp_host = %app.smtp.host,
        "running notification check"
    );

    let storage = Storage::open(db_path).await?;
    let reporter = CliProgress::new();
    let report = renewtrack_core::notify::run_notification_pass(
        &options,
        today,
        &storage,
        dispatcher.as_ref(),
        &reporter,
    )
    .await?;

    print_notify_report(&report, options.dry_run);
    Ok(())
}

fn print_notify_report(report: &NotifyReport, dry_run: bool) {
    println!();
    println!("  Window: {}", report.window);
    for contract in &report.contracts {
        let line = match &contract.outcome {
            NotifyOutcome::Sent => "sent".to_string(),
            NotifyOutcome::WouldNotify => "would send".to_string(),
            NotifyOutcome::OutsideWindow => continue,
            NotifyOutcome::DispatchFailed { error } => format!("FAILED  {error}"),
        };
        println!(
            "  {:<40} {}  {line}",
            contract.filename, contract.renewal_date
        );
    }
    println!();
    println!("  Notifications checked.");
    if dry_run {
        println!("  Would send: {}", report.would_notify());
    } else {
        println!("  Sent:       {}", report.sent());
        println!("  Failed:     {}", report.failed());
    }
    println!("  Not due:    {}", report.outside_window());
    println!("  Time:       {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

/// Stand-in dispatcher for `--dry-run`; the pass never dispatches in that mode.
struct NoDispatch;

#[async_trait]
impl Dispatcher for NoDispatch {
    async fn dispatch(&self, _reminder: &Reminder) -> renewtrack_shared::Result<()> {
        Err(RenewTrackError::Dispatch("dry run: sending is disabled".into()))
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

async fn cmd_list(db_path: &Path, unnotified: bool, json: bool) -> Result<()> {
    if !db_path.exists() {
        println!("No contracts found. Run `renewtrack parse` first.");
        return Ok(());
    }

    let storage = Storage::open_readonly(db_path).await?;
    let records = if unnotified {
        storage.list_unnotified().await?
    } else {
        storage.list_all().await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No contracts found.");
        return Ok(());
    }

    println!("Tracked Contracts");
    println!();
    println!("  {:<40} {:<12} Notified", "Filename", "Renewal");
    for record in &records {
        println!(
            "  {:<40} {:<12} {}",
            record.filename,
            record.renewal_date.to_string(),
            if record.notified { "Yes" } else { "No" }
        );
    }
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_scanned(&self, filename: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Reading [{current}/{total}] {filename}"));
    }

    fn contract_checked(&self, filename: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Checking [{current}/{total}] {filename}"));
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_notify_flags() {
        let cli = Cli::try_parse_from([
            "renewtrack",
            "notify",
            "--days",
            "14",
            "--today",
            "2025-05-10",
            "--dry-run",
        ])
        .expect("parse");
        match cli.command {
            Command::Notify { args } => {
                assert_eq!(args.days, Some(14));
                assert_eq!(args.today, NaiveDate::from_ymd_opt(2025, 5, 10));
                assert!(args.dry_run);
                assert!(!args.stop_on_send_error);
            }
            _ => panic!("expected notify"),
        }
    }

    #[test]
    fn run_accepts_both_flag_sets() {
        let cli = Cli::try_parse_from([
            "renewtrack",
            "--db",
            "/tmp/c.db",
            "run",
            "--dir",
            "./docs",
            "--fail-fast",
            "--days",
            "7",
        ])
        .expect("parse");
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/c.db")));
        match cli.command {
            Command::Run { parse, notify } => {
                assert_eq!(parse.dir, Some(PathBuf::from("./docs")));
                assert!(parse.fail_fast);
                assert_eq!(notify.days, Some(7));
            }
            _ => panic!("expected run"),
        }
    }
}
