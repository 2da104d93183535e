//! Command-line interface for the anonymous incident reporting core.
//!
//! Submission-side commands (`submit`, `show`, `verify`, `zones`) run the
//! sanitization and integrity pipeline; triage commands (`list`, `watch`,
//! `resolve`, `delete`, `logs`, `whoami`) drive the operator view.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use chrono::{NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{error, warn, Level};

use blackbox::config::{self, ClientConfig, TriageConfig};
use blackbox::sanitize::{admit_files, scrub_all, CandidateFile, ScrubWarning};
use blackbox::triage::{MutationGuard, PollScheduler, StatusFilter, TriageView};
use blackbox::{
    submit_draft, verify_report, ApiClient, AdmissionLimits, ReportDraft, ReportId,
    ReportsBackend, Result, ScrubLimits, Severity, TriageReconciler,
};

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Info, warning, and error messages (default)
    Info,
    /// Debug and all messages
    Debug,
    /// Trace and all messages (most verbose)
    Trace,
}

#[derive(Debug, Parser)]
#[command(name = "blackbox", version, about = "Anonymous incident reporting client")]
struct Cli {
    /// Backend base URL (falls back to $BLACKBOX_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value = "info")]
    verbose: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the enumerated incident zones
    Zones,
    /// Sanitize attachments and submit a report
    Submit {
        /// Zone value, e.g. TERMINAL_1, or AUTRE with --custom-zone
        #[arg(long)]
        zone: String,
        /// Free-text location when the zone is AUTRE
        #[arg(long)]
        custom_zone: Option<String>,
        /// Incident time of day, HH:MM
        #[arg(long, value_parser = parse_time)]
        time: NaiveTime,
        /// What happened
        #[arg(long)]
        description: String,
        /// Evidence files (at most 3, 5 MiB each)
        files: Vec<PathBuf>,
    },
    /// Fetch one report
    Show { id: ReportId },
    /// Compare a report's current content hash against its anchored hash
    Verify { id: ReportId },
    /// Fetch the triage list once, with optional filters
    List {
        #[arg(long)]
        resolved: bool,
        #[arg(long, conflicts_with = "resolved")]
        unresolved: bool,
        #[arg(long)]
        severity: Option<Severity>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Poll the triage list continuously until interrupted
    Watch,
    /// Mark a report resolved
    Resolve { id: ReportId },
    /// Delete a report (two-phase: requires --confirm)
    Delete {
        id: ReportId,
        #[arg(long)]
        confirm: bool,
    },
    /// Identify the calling operator
    Whoami,
    /// Check backend liveness
    Health,
    /// Fetch one page of the operator audit trail
    Logs {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 50)]
        per_page: u32,
    },
}

fn parse_time(value: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| format!("'{value}' is not a valid HH:MM time of day"))
}

fn init_logging(level: &LogLevel) {
    let level = match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn media_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.verbose);

    let base_url = cli
        .api_url
        .clone()
        .or_else(|| std::env::var("BLACKBOX_API_URL").ok())
        .unwrap_or_else(|| config::DEFAULT_API_URL.to_string());

    if let Err(err) = run(cli.command, base_url).await {
        error!("{err}");
        process::exit(1);
    }
}

async fn run(command: Commands, base_url: String) -> Result<()> {
    let client = ApiClient::new(&ClientConfig::with_base_url(base_url))?;

    match command {
        Commands::Zones => {
            for zone in client.zones().await? {
                println!("{:<24} {}", zone.value, zone.label);
            }
        }
        Commands::Submit {
            zone,
            custom_zone,
            time,
            description,
            files,
        } => {
            submit(&client, zone, custom_zone, time, description, files).await?;
        }
        Commands::Show { id } => {
            let detail = client.report(id).await?;
            let report = &detail.report;
            println!("report #{}", report.id);
            println!("  zone:      {}", report.zone);
            if let Some(custom) = &report.custom_zone {
                println!("  location:  {custom}");
            }
            println!("  time:      {}", report.incident_time);
            println!("  category:  {}", report.category);
            println!("  severity:  {}", report.severity);
            println!("  created:   {}", report.created_at);
            println!(
                "  status:    {}",
                if report.is_resolved() { "resolved" } else { "unresolved" }
            );
            println!("  content:   {}", report.anonymized_content);
            for url in &report.attachments {
                println!("  attachment: {url}");
            }
            if let Some(anchor) = &detail.blockchain {
                println!("  anchor:    {}", anchor.tx_hash);
            }
        }
        Commands::Verify { id } => {
            let outcome = verify_report(&client, id).await?;
            if outcome.valid {
                println!("report #{id}: integrity VALID");
            } else {
                println!("report #{id}: integrity INVALID");
            }
            println!("  anchored hash:   {}", outcome.stored_hash);
            println!("  current hash:    {}", outcome.calculated_hash);
            match &outcome.anchor {
                Some(anchor) => println!("  anchor:          {anchor}"),
                None => println!("  anchor:          (none)"),
            }
            if let Some(url) = &outcome.explorer_url {
                println!("  explorer:        {url}");
            }
        }
        Commands::List {
            resolved,
            unresolved,
            severity,
            category,
            query,
            page,
        } => {
            let reports = client.list_reports().await?;
            let mut view = TriageView::new(config::PAGE_SIZE);
            if let Some(ticket) = view.begin_poll() {
                view.complete_poll(ticket, Ok(reports));
            }

            if resolved {
                view.set_status_filter(StatusFilter::Resolved);
            } else if unresolved {
                view.set_status_filter(StatusFilter::Unresolved);
            }
            view.set_severity_filter(severity);
            view.set_category_filter(category);
            if let Some(query) = query {
                view.set_query(query);
            }
            view.set_page(page);

            print_page(&view);
        }
        Commands::Watch => watch(client).await?,
        Commands::Resolve { id } => {
            let receipt = triage_guard(client).resolve(id).await?;
            println!("report #{} resolved at {}", receipt.id, receipt.resolved_at);
        }
        Commands::Delete { id, confirm } => {
            let guard = triage_guard(client);
            guard.request_delete(id);
            if !confirm {
                guard.cancel_delete();
                println!("deletion of report #{id} not confirmed; rerun with --confirm");
                return Ok(());
            }
            let receipt = guard.confirm_delete().await?;
            println!("report #{} deleted at {}", receipt.id, receipt.deleted_at);
        }
        Commands::Whoami => {
            let operator = client.me().await?;
            println!(
                "{} {} <{}> - {}",
                operator.first_name, operator.last_name, operator.email, operator.position
            );
        }
        Commands::Health => {
            let payload = client.health().await?;
            println!("{payload}");
        }
        Commands::Logs { page, per_page } => {
            let logs = client.audit_logs(page, per_page).await?;
            for entry in &logs.entries {
                println!(
                    "{} {:>6} {} {} by {} {}",
                    entry.created_at,
                    entry.method,
                    entry.endpoint,
                    entry.action,
                    entry.admin.first_name,
                    entry.admin.last_name
                );
            }
            println!(
                "page {}/{} ({} entries total)",
                logs.pagination.page, logs.pagination.total_pages, logs.pagination.total
            );
        }
    }
    Ok(())
}

async fn submit(
    client: &ApiClient,
    zone: String,
    custom_zone: Option<String>,
    time: NaiveTime,
    description: String,
    files: Vec<PathBuf>,
) -> Result<()> {
    let mut candidates = Vec::new();
    for path in &files {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        candidates.push(CandidateFile::new(name, media_type_for(path), bytes));
    }

    let admission = admit_files(&AdmissionLimits::default(), candidates);
    for rejected in &admission.rejected {
        warn!("{}", rejected.reason);
    }

    let outcomes = scrub_all(&ScrubLimits::default(), admission.accepted).await;
    let mut attachments = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        if let Some(ScrubWarning::ReencodeFailed { name, reason }) = &outcome.warning {
            warn!("'{name}' transmitted unscrubbed: {reason}");
        }
        attachments.push(outcome.file);
    }

    let draft = ReportDraft {
        zone,
        custom_zone,
        incident_time: time,
        description,
        attachments,
    };
    let detail = submit_draft(client, &draft).await?;
    println!("report submitted with id {}", detail.report.id);
    if let Some(anchor) = &detail.blockchain {
        println!("anchored as {}", anchor.tx_hash);
    }
    Ok(())
}

fn triage_guard(client: ApiClient) -> MutationGuard<ApiClient> {
    let view = Arc::new(Mutex::new(TriageView::new(config::PAGE_SIZE)));
    MutationGuard::new(Arc::new(client), view, Arc::new(Notify::new()))
}

fn print_page(view: &TriageView) {
    let now = Utc::now();
    let stats = view.stats();
    println!(
        "total {} | unresolved {} | resolved {} | high {} | critical {}",
        stats.total, stats.unresolved, stats.resolved, stats.high, stats.critical
    );
    for report in view.current_page() {
        println!(
            "{}#{:<6} [{:>8}] {:<22} {:<28} {}",
            if report.is_recent(now) { "*" } else { " " },
            report.id,
            report.severity.to_string(),
            report.zone,
            report.category,
            if report.is_resolved() { "resolved" } else { "unresolved" }
        );
    }
    println!("page {}/{}", view.page(), view.total_pages());
}

async fn watch(client: ApiClient) -> Result<()> {
    let reconciler = TriageReconciler::new(Arc::new(client), &TriageConfig::default());
    let view = reconciler.view();
    let mut scheduler = PollScheduler::start(reconciler, config::POLL_INTERVAL);

    println!("watching triage list, Ctrl-C to stop");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(config::POLL_INTERVAL) => {
                let view = view.lock();
                if let Some(reason) = view.last_error() {
                    warn!("last poll failed: {reason}");
                }
                print_page(&view);
            }
        }
    }
    scheduler.stop();
    Ok(())
}
