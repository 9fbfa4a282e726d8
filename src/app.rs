//! Command dispatch.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use yansi::Paint;

use crate::catalog::list_supported_files;
use crate::cli::{Cli, ColumnsArgs, Commands, FilesArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateScanner, ScanOptions};
use crate::error::ExitCode;
use crate::logging::init_logging;
use crate::output::text::row_count_label;
use crate::output::{default_reports_dir, DirectorySink, ReportSink, ScanReport, WriterSink};
use crate::progress::Progress;
use crate::prompt;
use crate::source::{open_source, resolve_column, TabularSource};

/// Settings for one `scan` run after merging config and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    /// Output format
    pub output: OutputFormat,
    /// Ignore blank cells
    pub skip_empty: bool,
    /// Save the text report
    pub write_report: bool,
    /// Show the progress bar
    pub show_progress: bool,
    /// Where reports go
    pub reports_dir: PathBuf,
}

impl ScanSettings {
    /// Merge flags over the configuration. Switch flags like `--no-report`
    /// only ever turn a configured feature off.
    #[must_use]
    pub fn resolve(args: &ScanArgs, config: &Config, quiet: bool) -> Self {
        let output = args.output.unwrap_or(config.output);
        Self {
            output,
            skip_empty: args.skip_empty || config.skip_empty,
            write_report: config.write_report && !args.no_report,
            show_progress: config.show_progress
                && !args.no_progress
                && !quiet
                && !output.is_machine_readable(),
            reports_dir: args
                .reports_dir
                .clone()
                .or_else(|| config.reports_dir.clone())
                .unwrap_or_else(default_reports_dir),
        }
    }
}

/// Whether the process should wait for Enter before exiting.
#[must_use]
pub fn wants_pause(cli: &Cli) -> bool {
    let flag = matches!(&cli.command, Commands::Scan(args) if args.pause);
    flag || Config::load(cli.config.as_deref()).pause_on_exit
}

/// Run the application.
///
/// # Errors
///
/// Returns an error for any failure that ends the run; the caller maps it
/// to an exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(cli.config.as_deref());
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => {
            let settings = ScanSettings::resolve(&args, &config, cli.quiet);
            run_scan(&args, &settings)
        }
        Commands::Files(args) => run_files(&args),
        Commands::Columns(args) => run_columns(&args),
        Commands::Config(args) => run_config(&config, cli.config.as_deref(), args.save),
    }
}

fn run_config(config: &Config, custom: Option<&Path>, save: bool) -> Result<ExitCode> {
    print!("{}", config.to_toml()?);
    if save {
        let path = custom
            .map(Path::to_path_buf)
            .or_else(Config::config_path)
            .context("No configuration directory available; pass --config FILE")?;
        config.save_to_path(&path)?;
        log::info!("Configuration saved to {}", path.display());
    }
    Ok(ExitCode::Success)
}

fn run_scan(args: &ScanArgs, settings: &ScanSettings) -> Result<ExitCode> {
    let mut source = resolve_source(args)?;

    let column = match &args.column {
        Some(selector) => resolve_column(source.columns(), selector)?,
        None => prompt::choose_column(source.columns())?,
    };

    let mut options = ScanOptions::default().with_skip_empty(settings.skip_empty);
    if settings.show_progress {
        options = options.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let (groups, summary) = DuplicateScanner::new(options)
        .scan(source.as_mut(), column)
        .with_context(|| format!("Failed to scan {}", source.path().display()))?;

    let report = ScanReport::from_scan(source.as_ref(), column, groups, summary)
        .with_context(|| format!("Failed to read size of {}", source.path().display()))?;
    drop(source);

    let saved = if settings.write_report {
        DirectorySink::new(&settings.reports_dir).deliver(&report)?
    } else {
        None
    };

    match settings.output {
        OutputFormat::Text => print_summary(&report, saved.as_deref()),
        format => {
            WriterSink::new(io::stdout().lock(), format).deliver(&report)?;
        }
    }

    Ok(report.exit_code())
}

/// Open the table named by PATH / `--file`, or ask for what is missing.
fn resolve_source(args: &ScanArgs) -> Result<Box<dyn TabularSource>> {
    let path = match &args.path {
        Some(path) => path.clone(),
        None => prompt::ask_directory()?,
    };

    if path.is_file() {
        return open_table(&path);
    }
    if let Some(name) = &args.file {
        return open_table(&path.join(name));
    }

    let files = list_supported_files(&path)?;
    loop {
        let index = prompt::choose_file(&files)?;
        match open_source(&files[index].path) {
            Ok(source) => return Ok(source),
            Err(e) => {
                log::debug!("Cannot open {}: {:?}", files[index].path.display(), e);
                eprintln!("{} {}", "Cannot read this file:".red().bold(), e);
            }
        }
    }
}

fn open_table(path: &Path) -> Result<Box<dyn TabularSource>> {
    open_source(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn print_summary(report: &ScanReport, saved: Option<&Path>) {
    println!();
    println!(
        "{} {} ({}, {}, encoding {})",
        "File:".bold(),
        report.file_name,
        report.size_display(),
        report.format,
        report.encoding
    );
    println!("{}: {}", row_count_label(report.format), report.row_count);
    println!(
        "{} {}. {}",
        "Column:".bold(),
        report.column_index + 1,
        report.column_name
    );
    println!(
        "{} {:.2} s",
        "Search duration:".bold(),
        report.scan_duration().as_secs_f64()
    );
    println!();

    if report.groups.is_empty() {
        println!("{}", "No duplicates found.".green().bold());
    } else {
        println!(
            "{}",
            format!("Duplicated values found: {}", report.groups.len())
                .yellow()
                .bold()
        );
        for (i, group) in report.groups.iter().enumerate() {
            println!(
                "  {}. {} {} {}",
                i + 1,
                group.value.literal().cyan(),
                "rows".dim(),
                group.rows_display()
            );
        }
    }

    if report.summary.rows_skipped > 0 {
        println!();
        println!(
            "{}",
            format!(
                "{} rows skipped because the cell could not be read (see log)",
                report.summary.rows_skipped
            )
            .red()
        );
    }

    if let Some(path) = saved {
        println!();
        println!("{} {}", "Report saved to:".bold(), path.display());
    }
}

fn run_files(args: &FilesArgs) -> Result<ExitCode> {
    let files = list_supported_files(&args.dir)?;
    for (i, file) in files.iter().enumerate() {
        println!(
            "{:>3}. {}  {}  {}",
            i + 1,
            file.name,
            file.size_display().dim(),
            file.format
        );
    }
    Ok(ExitCode::Success)
}

fn run_columns(args: &ColumnsArgs) -> Result<ExitCode> {
    let source = open_table(&args.file)?;
    println!(
        "{} ({}, encoding {})",
        source.path().display().bold(),
        source.format(),
        source.encoding()
    );
    println!("{}: {}", row_count_label(source.format()), source.row_count());
    for (i, name) in source.columns().iter().enumerate() {
        println!("  {}", prompt::column_label(i, name));
    }
    Ok(ExitCode::Success)
}
