/*!
 * Command-line interface for dirtext
 */

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use dirtext::config::{Args, Command, Config};
use dirtext::operations::StructureEngine;
use dirtext::report::{MaterializeReport, ReportFormat, Reporter};
use dirtext::utils::count_files;

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    setup_tracing(&args)?;
    debug!("Parsed CLI arguments: {args:?}");

    if let Command::Completions { shell } = &args.command {
        clap_complete::generate(*shell, &mut Args::command(), "dirtext", &mut io::stdout());
        return Ok(());
    }

    // Create and validate configuration
    let config = Config::from_args(&args)?;
    config.validate()?;

    let engine = StructureEngine::new(config);

    match &args.command {
        Command::Create {
            structure_file,
            root,
            ..
        } => {
            let project_root = project_root(root.as_deref())?;
            let start_time = Instant::now();
            let stats =
                engine.create_structure_from_file(Path::new(structure_file), &project_root)?;

            print_report(MaterializeReport {
                operation: "create".to_string(),
                project_root,
                duration: start_time.elapsed(),
                stats,
            });
        }
        Command::Recreate {
            structure_file,
            contents_file,
            root,
            ..
        } => {
            let project_root = project_root(root.as_deref())?;
            let start_time = Instant::now();
            let stats = engine.recreate_structure_from_file(
                Path::new(structure_file),
                Path::new(contents_file),
                &project_root,
            )?;

            print_report(MaterializeReport {
                operation: "recreate".to_string(),
                project_root,
                duration: start_time.elapsed(),
                stats,
            });
        }
        Command::Output {
            root_directory,
            out_file,
            include_contents,
        } => {
            let root_directory = PathBuf::from(root_directory);

            // Create progress bar with the same styling as other long-running commands
            let progress = ProgressBar::new(count_files(&root_directory, &engine.config().rules));
            progress.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {prefix:.bold.cyan} {wide_msg:.dim.white} {pos}/{len} ({percent}%) ⏱️  Elapsed: {elapsed_precise}")
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            );
            progress.enable_steady_tick(std::time::Duration::from_millis(100));
            progress.set_prefix("📊 Rendering");

            let result = engine.output_directory_structure(
                &root_directory,
                out_file.as_deref().map(Path::new),
                *include_contents,
                Arc::new(progress.clone()),
            );
            progress.finish_and_clear();

            let (output_file, stats) = result?;
            println!(
                "📝 Directory structure written to {} ({} directories, {} files)",
                output_file.display(),
                stats.directories,
                stats.files
            );
            if stats.unreadable > 0 {
                println!("⚠️  {} file(s) could not be read", stats.unreadable);
            }
        }
        Command::Completions { .. } => {}
    }

    Ok(())
}

fn setup_tracing(args: &Args) -> io::Result<()> {
    let Some(level) = args.log_level.to_tracing_level() else {
        return Ok(());
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .compact();

    match &args.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(io::stderr.and(Mutex::new(file)))
                .init();
        }
        None => builder.with_writer(io::stderr).init(),
    }

    Ok(())
}

fn project_root(root: Option<&str>) -> io::Result<PathBuf> {
    match root {
        Some(root) => Ok(PathBuf::from(root)),
        None => std::env::current_dir(),
    }
}

fn print_report(report: MaterializeReport) {
    let reporter = Reporter::new(ReportFormat::ConsoleTable);
    reporter.print_report(&report);
}
