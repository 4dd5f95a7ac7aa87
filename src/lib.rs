//! Platelabel: a single-operator license plate labeling workflow.
//!
//! An operator is shown one image at a time, types the plate text (or flags
//! the image as unusable), and the tool advances to the next image that is
//! neither annotated nor flagged. Per-image state lives in one XML record per
//! image; per-user productivity lives in a CSV ledger.
//!
//! # Modules
//!
//! - [`index`]: Ordered image set and image-to-record mapping
//! - [`record`]: Per-image records and the record store
//! - [`ledger`]: Per-user annotation counts
//! - [`session`]: Operator identity
//! - [`traversal`]: The traversal engine (current image, skip-scan, undo)
//! - [`progress`]: Progress report shown alongside each image
//! - [`config`]: Workspace paths and traversal options
//! - [`error`]: Error types for platelabel operations

pub mod config;
pub mod error;
pub mod index;
pub mod ledger;
pub mod progress;
pub mod record;
pub mod session;
pub mod traversal;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::warn;

pub use config::Config;
pub use error::LabelError;
pub use traversal::{Action, Session, View};

/// The platelabel CLI application.
#[derive(Parser)]
#[command(name = "platelabel")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    workspace: WorkspaceArgs,

    /// Log store writes and traversal moves.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the workspace lives on disk.
#[derive(clap::Args)]
struct WorkspaceArgs {
    /// Directory of images to label.
    #[arg(long, global = true, env = "PLATELABEL_IMAGES", default_value = config::DEFAULT_IMAGES_DIR)]
    images: PathBuf,

    /// Directory of per-image XML records.
    #[arg(long, global = true, env = "PLATELABEL_RECORDS", default_value = config::DEFAULT_RECORDS_DIR)]
    records: PathBuf,

    /// Per-user annotation count CSV.
    #[arg(long, global = true, env = "PLATELABEL_LEDGER", default_value = config::DEFAULT_LEDGER_PATH)]
    ledger: PathBuf,

    /// Image file extension, without the dot.
    #[arg(long, global = true, env = "PLATELABEL_EXTENSION", default_value = config::DEFAULT_IMAGE_EXTENSION)]
    extension: String,

    /// Create a record for any image that has none before reading it.
    #[arg(long, global = true)]
    create_missing: bool,
}

impl WorkspaceArgs {
    fn to_config(&self) -> Config {
        Config {
            images_dir: self.images.clone(),
            records_dir: self.records.clone(),
            ledger_path: self.ledger.clone(),
            image_extension: self.extension.clone(),
            create_missing_records: self.create_missing,
            resume: false,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create a record for every image that lacks one.
    Init,
    /// Label images interactively, one action per line on stdin.
    Annotate(AnnotateArgs),
    /// Show how many records are annotated and who annotated them.
    Status(StatusArgs),
}

/// Arguments for the annotate subcommand.
#[derive(clap::Args)]
struct AnnotateArgs {
    /// Operator name credited in the ledger.
    #[arg(long, env = "PLATELABEL_USER")]
    user: String,

    /// Start at the first unresolved image instead of the first image.
    #[arg(long)]
    resume: bool,
}

/// Arguments for the status subcommand.
#[derive(clap::Args)]
struct StatusArgs {
    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the platelabel CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.workspace.to_config();
    match cli.command {
        Some(Commands::Init) => run_init(&config),
        Some(Commands::Annotate(args)) => run_annotate(config.with_resume(args.resume), &args),
        Some(Commands::Status(args)) => run_status(&config, &args),
        None => {
            println!("platelabel {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Single-operator license plate labeling.");
            println!();
            println!("Run 'platelabel --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

/// Execute the init subcommand.
fn run_init(config: &Config) -> Result<(), LabelError> {
    let index = index::ImageIndex::new(&config.images_dir, &config.image_extension);
    let records = record::RecordStore::new(&config.records_dir);
    let created = records.create_missing(&index)?;
    println!(
        "Created {} record(s) in {}",
        created,
        config.records_dir.display()
    );
    Ok(())
}

/// Execute the annotate subcommand.
fn run_annotate(config: Config, args: &AnnotateArgs) -> Result<(), LabelError> {
    let mut session = Session::open(&config)?;
    session.login(&args.user)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    annotate_loop(&mut session, stdin.lock(), &mut stdout.lock())
}

/// Drive a session from line-oriented input until `quit` or end of input.
///
/// Each line is one [`Action`]. A failing action is reported on stderr and
/// leaves the session where it was; the loop keeps going.
pub fn annotate_loop<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
) -> Result<(), LabelError> {
    match session.display() {
        Ok(view) => write!(out, "{view}")?,
        Err(err) => report_action_error(&err),
    }
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        if matches!(line.trim().to_ascii_lowercase().as_str(), "quit" | "exit") {
            break;
        }

        match line.parse::<Action>().and_then(|action| session.apply(action)) {
            Ok(view) => write!(out, "{view}")?,
            Err(err) => report_action_error(&err),
        }
        out.flush()?;
    }
    Ok(())
}

fn report_action_error(err: &LabelError) {
    warn!("action failed: {err}");
    eprintln!("Error: {err}");
}

/// Execute the status subcommand.
fn run_status(config: &Config, args: &StatusArgs) -> Result<(), LabelError> {
    let records = record::RecordStore::new(&config.records_dir);
    let ledger = ledger::Ledger::new(&config.ledger_path);
    let report = progress::progress_report(&records, &ledger)?;

    match args.output.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print!("{report}"),
        other => {
            return Err(LabelError::UnsupportedFormat(format!(
                "'{other}' (supported: text, json)"
            )));
        }
    }
    Ok(())
}
