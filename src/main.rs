use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use snapm::config::{self, SnapmConfig, TOKEN_ENV};
use snapm::department::Department;
use snapm::output::{json as json_out, table};
use snapm::pipeline::{self, RunContext};
use snapm::processors::{self, ProcessorInfo};
use snapm::sheets::google::GoogleSheets;
use snapm::sheets::{DateMatch, SheetService, SnapshotWriter};

#[derive(Parser)]
#[command(
    name = "snapm",
    version,
    about = "Snapshot metrics: aggregate LLM prompt outputs per department and fill the tracking sheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to config file (default: ~/.snapm/config.toml)
    #[arg(long, global = true, env = "SNAPM_CONFIG")]
    config: Option<PathBuf>,

    /// More logging: -v info, -vv debug (RUST_LOG also works)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run processors for one day and update the snapshot sheets
    Run {
        /// Prompt types to run (default: all)
        processors: Vec<String>,

        /// Day to process, YYYY-MM-DD (default: yesterday)
        #[arg(long)]
        date: Option<String>,

        /// Compute and save summaries without writing to sheets
        #[arg(long)]
        dry_run: bool,

        /// Skip spreadsheet access entirely
        #[arg(long)]
        no_sheets: bool,

        /// Sheets access token (overrides env and config)
        #[arg(long)]
        token: Option<String>,
    },

    /// List processors and the columns they write
    List,

    /// Find a metric column (and optionally a date row) in a department's sheet
    Locate {
        /// Department key or name, e.g. cc_sales
        #[arg(long)]
        department: String,

        /// Column header to look for
        #[arg(long)]
        column: String,

        /// Date to look for in column A
        #[arg(long)]
        date: Option<String>,

        /// Require the date cell to equal the date instead of containing it
        #[arg(long)]
        exact: bool,

        /// Sheets access token (overrides env and config)
        #[arg(long)]
        token: Option<String>,
    },

    /// Upload each department's raw output CSV into a tab named after the date
    Upload {
        /// Prompt type whose files to upload
        prompt_type: String,

        /// Day to upload, YYYY-MM-DD (default: yesterday)
        #[arg(long)]
        date: Option<String>,

        /// Read the files without uploading
        #[arg(long)]
        dry_run: bool,

        /// Sheets access token (overrides env and config)
        #[arg(long)]
        token: Option<String>,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a commented template if no config exists
    Init,
    /// Print the config with secrets redacted
    Show,
    /// Print the config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let config_file = match cli.config {
        Some(p) => p,
        None => config::config_path()?,
    };

    if let Commands::Config { action } = &cli.command {
        return run_config(action, &config_file, json_output);
    }

    let config = SnapmConfig::load(Some(config_file.as_path()))?;
    let departments = config.department_sheets();

    match cli.command {
        Commands::Run {
            processors: names,
            date,
            dry_run,
            no_sheets,
            token,
        } => {
            let date = parse_date(date.as_deref())?;
            let selected = if names.is_empty() {
                processors::all()
            } else {
                names
                    .iter()
                    .map(|n| {
                        processors::by_name(n).with_context(|| {
                            format!("Unknown processor: {n}. Run `snapm list` for names")
                        })
                    })
                    .collect::<Result<Vec<_>>>()?
            };

            let google = if no_sheets {
                None
            } else {
                if departments.is_empty() {
                    warn!("No department spreadsheets configured; sheet writes will be skipped");
                }
                connect(&config, token.as_deref())
            };
            debug!("{} department spreadsheet(s) configured", departments.len());
            let ctx = RunContext {
                llm_outputs: config.paths.llm_outputs.clone(),
                outputs: config.paths.outputs.clone(),
                date,
                tab: config.tab().to_string(),
                sheets: google.as_ref().map(|g| g as &dyn SheetService),
                departments: &departments,
                dry_run,
            };

            let reports = pipeline::run_all(&selected, &ctx);

            if json_output {
                json_out::print_json(&reports)?;
            } else {
                eprintln!();
                for report in &reports {
                    table::print_run_report(report);
                }
            }
        }

        Commands::List => {
            let infos: Vec<ProcessorInfo> = processors::all()
                .iter()
                .map(|p| ProcessorInfo::of(p.as_ref()))
                .collect();
            if json_output {
                json_out::print_json(&infos)?;
            } else {
                table::print_processor_list(&infos);
            }
        }

        Commands::Locate {
            department,
            column,
            date,
            exact,
            token,
        } => {
            let dept = Department::from_key(&department)
                .with_context(|| format!("Unknown department: {department}"))?;
            let sheet_id = departments
                .sheet_id(dept)
                .with_context(|| format!("No spreadsheet configured for {}", dept.key()))?;
            let Some(google) = connect(&config, token.as_deref()) else {
                bail!("No Sheets token. Provide via --token, {TOKEN_ENV} env var, or the config file");
            };

            let writer = SnapshotWriter::new(&google, config.tab());
            let letter = writer.locate_column(sheet_id, &column)?;
            let row = match date.as_deref() {
                Some(d) => {
                    let d = parse_date(Some(d))?.format("%Y-%m-%d").to_string();
                    let mode = if exact { DateMatch::Exact } else { DateMatch::Substring };
                    writer.locate_row(sheet_id, &d, mode)?
                }
                None => None,
            };
            let cell = match (&letter, row) {
                (Some(l), Some(r)) => Some(format!("{l}{r}")),
                _ => None,
            };

            if json_output {
                json_out::print_json(&serde_json::json!({
                    "department": dept,
                    "sheet_id": sheet_id,
                    "tab": writer.tab(),
                    "column": letter,
                    "row": row,
                    "cell": cell,
                }))?;
            } else {
                println!("{} ({}) tab {}", dept, sheet_id, writer.tab());
                match &letter {
                    Some(l) => println!("  column \"{column}\": {l}"),
                    None => println!("  column \"{column}\": not found, please add it to row 1"),
                }
                if date.is_some() {
                    match row {
                        Some(r) => println!("  date row: {r}"),
                        None => println!("  date row: not found"),
                    }
                }
                if let Some(c) = cell {
                    println!("  cell: {c}");
                }
            }
        }

        Commands::Upload {
            prompt_type,
            date,
            dry_run,
            token,
        } => {
            let date = parse_date(date.as_deref())?;
            let google = if dry_run {
                None
            } else {
                connect(&config, token.as_deref())
            };
            let ctx = RunContext {
                llm_outputs: config.paths.llm_outputs.clone(),
                outputs: config.paths.outputs.clone(),
                date,
                tab: config.tab().to_string(),
                sheets: google.as_ref().map(|g| g as &dyn SheetService),
                departments: &departments,
                dry_run,
            };

            let report = pipeline::run_upload(&prompt_type, &ctx)?;
            if json_output {
                json_out::print_json(&report)?;
            } else {
                table::print_upload_report(&report);
            }
        }

        // Handled before the config is loaded.
        Commands::Config { .. } => {}
    }

    Ok(())
}

fn run_config(action: &ConfigAction, path: &Path, json_output: bool) -> Result<()> {
    match action {
        ConfigAction::Init => {
            if config::init_config(path)? {
                println!("Created {}", path.display());
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let config = SnapmConfig::load(Some(path))?;
            if json_output {
                json_out::print_json(&config.redacted())?;
            } else {
                println!("# {}", path.display());
                println!("{}", config.display_redacted());
            }
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

/// Resolve a token and build the client. None (with a warning) runs summary-only.
fn connect(config: &SnapmConfig, token_flag: Option<&str>) -> Option<GoogleSheets> {
    match config::resolve_token(token_flag, TOKEN_ENV, &config.sheets) {
        Ok(Some(token)) => Some(GoogleSheets::new(token, config.sheets.base_url.clone())),
        Ok(None) => {
            warn!("No Sheets token found ({TOKEN_ENV}, --token or config); writing summaries only");
            None
        }
        Err(e) => {
            warn!("{:#}; writing summaries only", e);
            None
        }
    }
}

/// `YYYY-MM-DD`, or yesterday in local time.
fn parse_date(s: Option<&str>) -> Result<NaiveDate> {
    match s {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid date: {s} (expected YYYY-MM-DD)")),
        None => Local::now()
            .date_naive()
            .pred_opt()
            .context("Could not compute yesterday's date"),
    }
}
