//! CLI binary for convert-client.
//!
//! A thin shim over the library crate: one submission per file argument,
//! all jobs tracked concurrently, one spinner per slot, and the final board
//! printed when every job has resolved.

use anyhow::{Context, Result};
use clap::Parser;
use convert_client::{
    spawn_wake, ClientConfig, DocumentId, HttpConversionService, JobProgressCallback, JobStatus,
    JobTicket, Outcome, PreviewRequest, ProgressCallback, SelectedFile, Severity, Slot, SlotId,
    StatusRoute, SubmissionController, UploadForm,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// One spinner per slot, all stacked in a single `MultiProgress`. Jobs
/// resolve in any order, so bars are looked up by slot id.
struct CliProgressCallback {
    multi: MultiProgress,
    bars: Mutex<HashMap<SlotId, ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        })
    }

    fn bar(&self, slot: SlotId) -> Option<ProgressBar> {
        self.bars.lock().unwrap_or_else(PoisonError::into_inner).get(&slot).cloned()
    }
}

impl JobProgressCallback for CliProgressCallback {
    fn on_job_submitted(&self, slot: SlotId, label: &str) {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(style);
        bar.set_prefix(label.to_string());
        bar.set_message("uploading…");
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bars.lock().unwrap_or_else(PoisonError::into_inner).insert(slot, bar);
    }

    fn on_job_accepted(&self, slot: SlotId, document_id: &DocumentId) {
        if let Some(bar) = self.bar(slot) {
            bar.set_message(format!("document {document_id}, converting…"));
        }
    }

    fn on_status_checked(&self, slot: SlotId, attempt: u32, status: JobStatus) {
        if let Some(bar) = self.bar(slot) {
            bar.set_message(dim(&format!("check {attempt}: {status:?}")));
        }
    }

    fn on_job_resolved(&self, slot: SlotId, outcome: &Outcome) {
        let Some(bar) = self.bars.lock().unwrap_or_else(PoisonError::into_inner).remove(&slot) else {
            return;
        };
        let mark = match outcome {
            Outcome::Converted { .. } => green("✔"),
            Outcome::TimedOut => yellow("⚠"),
            _ => red("✘"),
        };
        bar.finish_with_message(format!("{mark} {}", outcome.summary()));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert one document to PDF
  convert-client --pdf report.docx

  # Several files at once, with 200px-high previews and tags
  convert-client --pdf --preview --preview-height 200 --tags "q3,finance" a.docx b.xlsx

  # A deployment that serves status at /{id}/status and allows 20s per job
  convert-client --status-route suffixed --timeout-secs 20 slides.pptx

  # Save converted results next to the inputs
  convert-client --pdf --download-dir ./out report.docx

  # Machine-readable board
  convert-client --json report.docx > board.json

ENVIRONMENT VARIABLES:
  CONVERTER_URL           Base URL of the conversion endpoint
  CONVERTER_STATUS_ROUTE  prefixed (/status/{id}) or suffixed (/{id}/status)
  CONVERTER_TIMEOUT_SECS  Per-job polling budget
  CONVERTER_INTERVAL_MS   Delay between status checks
  RUST_LOG                Override log filter (e.g. convert_client=debug)
"#;

/// Upload files to a conversion service and track each job to completion.
#[derive(Parser, Debug)]
#[command(
    name = "convert-client",
    version,
    about = "Upload files to a conversion service and track each job to completion",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to submit. Each one becomes its own job.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Base URL of the conversion endpoint.
    #[arg(long, env = "CONVERTER_URL", default_value = "http://localhost:8080/converter")]
    base_url: String,

    /// Status URL shape used by the deployment.
    #[arg(long, env = "CONVERTER_STATUS_ROUTE", value_enum, default_value = "prefixed")]
    status_route: StatusRouteArg,

    /// Delay between status checks, in milliseconds.
    #[arg(long, env = "CONVERTER_INTERVAL_MS", default_value_t = 2000,
          value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: u64,

    /// Give up on a job after this many seconds without completion.
    #[arg(long, env = "CONVERTER_TIMEOUT_SECS", default_value_t = 15,
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "CONVERTER_REQUEST_TIMEOUT", default_value_t = 30)]
    request_timeout: u64,

    /// Ask the service to produce the target format.
    #[arg(long)]
    pdf: bool,

    /// Target format token sent with --pdf.
    #[arg(long, default_value = "pdf")]
    target_format: String,

    /// Request a preview image.
    #[arg(long)]
    preview: bool,

    /// Preview height; blank uses the service default of 100.
    #[arg(long, default_value = "")]
    preview_height: String,

    /// Preview width; blank lets the service keep the aspect ratio.
    #[arg(long, default_value = "")]
    preview_width: String,

    /// Comma-separated tags attached to every submission.
    #[arg(long, default_value = "")]
    tags: String,

    /// Ask for thumbnails (true) or explicitly decline them (false).
    #[arg(long, value_name = "BOOL")]
    thumbnails: Option<bool>,

    /// Download each converted result into this directory.
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// Print the final board as JSON.
    #[arg(long)]
    json: bool,

    /// Skip the startup wake-up ping.
    #[arg(long)]
    no_wake: bool,

    /// Disable progress spinners.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except the final board and errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum StatusRouteArg {
    Prefixed,
    Suffixed,
}

impl From<StatusRouteArg> for StatusRoute {
    fn from(v: StatusRouteArg) -> Self {
        match v {
            StatusRouteArg::Prefixed => StatusRoute::Prefixed,
            StatusRouteArg::Suffixed => StatusRoute::Suffixed,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Spinners already say what each job is doing; keep library logs quiet
    // while they are on screen.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config and service ─────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let service = Arc::new(
        HttpConversionService::new(config.clone()).context("Failed to set up HTTP client")?,
    );

    if !cli.no_wake {
        // Detached: submissions do not wait for it.
        spawn_wake(service.clone());
    }

    // ── Submit ───────────────────────────────────────────────────────────
    let controller = SubmissionController::new(service.clone(), config);
    let mut tickets: Vec<JobTicket> = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = match SelectedFile::read(path).await {
            Ok(file) => Some(file),
            Err(e) => {
                eprintln!("{} {}", red("✘"), e);
                None
            }
        };
        if let Some(ticket) = controller.submit(&build_form(&cli, file)) {
            tickets.push(ticket);
        }
    }

    let outcomes = futures::future::join_all(tickets.into_iter().map(JobTicket::outcome)).await;
    let slots = controller.board().snapshot();

    // ── Follow enabled action controls ───────────────────────────────────
    if let Some(ref dir) = cli.download_dir {
        for slot in &slots {
            if slot.action.activate().is_none() {
                continue;
            }
            let Some(ref id) = slot.document_id else {
                continue;
            };
            match service.download(id, dir).await {
                Ok(path) if !cli.quiet => {
                    eprintln!("{} {} → {}", green("↓"), slot.label, bold(&path.display().to_string()))
                }
                Ok(_) => {}
                Err(e) => eprintln!("{} {}", red("✘"), e),
            }
        }
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let json = serde_json::to_string_pretty(&slots).context("Failed to serialise board")?;
        println!("{json}");
    } else {
        for slot in &slots {
            print_slot(slot);
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    let unread = cli.files.len() - outcomes.len();
    if failed + unread == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.base_url.clone())
        .status_route(cli.status_route.clone().into())
        .poll_interval(Duration::from_millis(cli.interval_ms))
        .timeout_budget(Duration::from_secs(cli.timeout_secs))
        .request_timeout_secs(cli.request_timeout)
        .target_format(cli.target_format.clone());

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The form as it stands for one file.
fn build_form(cli: &Cli, file: Option<SelectedFile>) -> UploadForm {
    UploadForm {
        file,
        produce_target: cli.pdf,
        preview: cli.preview.then(|| PreviewRequest {
            height: cli.preview_height.clone(),
            width: cli.preview_width.clone(),
        }),
        tags: cli.tags.clone(),
        thumbnails: cli.thumbnails,
    }
}

fn print_slot(slot: &Slot) {
    println!("{}", bold(&slot.label));
    if let Some(ref report) = slot.report {
        for line in report.lines() {
            println!("  {line}");
        }
    }
    if let Some(ref notice) = slot.notice {
        let text = match notice.severity {
            Severity::Error => red(&notice.text),
            Severity::Warning => yellow(&notice.text),
        };
        println!("  {text}");
    }
    if let Some(url) = slot.action.activate() {
        println!("  {}", dim(&format!("Download: {url}")));
    }
}
