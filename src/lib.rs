pub mod analyze;
pub mod clean;
pub mod cli;
pub mod config;
pub mod data;
pub mod discover;
pub mod error;
pub mod formats;
pub mod identify;
pub mod io_utils;
pub mod join;
pub mod merge;
pub mod metadata;
pub mod patterns;
pub mod preview;
pub mod table;
pub mod transform;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    analyze::FileReport,
    cli::{Cli, Commands},
    config::PipelineConfig,
    io_utils::DEFAULT_CSV_DELIMITER,
    merge::{DatasetMerger, MergeSource},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_fusion", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Merge(args) => handle_merge(&args),
        Commands::Analyze(args) => handle_analyze(&args),
        Commands::Clean(args) => handle_clean(&args),
        Commands::Discover(args) => handle_discover(&args),
        Commands::Preview(args) => preview::execute(&args),
    }
}

fn handle_merge(args: &cli::MergeArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Loading configuration from {path:?}"))?,
        None => PipelineConfig::default(),
    };

    let mut options = config.merge_options();
    if let Some(key) = &args.key {
        if key.trim().is_empty() {
            bail!("--key cannot be empty");
        }
        options.join_key = key.clone();
    }
    if args.no_clean {
        options.clean = false;
    }
    if args.no_materialize {
        options.load.materialize = false;
    }
    if let Some(delimiter) = args.source.delimiter {
        options.load.delimiter = delimiter;
    }
    options.load.encoding = io_utils::resolve_encoding(args.source.input_encoding.as_deref())?;
    options.excluded.extend(args.exclude.iter().cloned());
    if args.output.is_some() {
        options.output_path = args.output.clone();
    }

    let source = if let Some(dir) = &args.dir {
        MergeSource::Directory(dir.clone())
    } else if !args.inputs.is_empty() {
        MergeSource::Files(args.inputs.clone())
    } else if let Some(dir) = &config.raw_dir {
        MergeSource::Directory(dir.clone())
    } else {
        bail!("Provide --dir, --input, or a configuration with raw_dir");
    };
    debug!("Merge source: {:?}", source);

    let to_stdout = options.output_path.is_none();
    let key = options.join_key.clone();
    let outcome = DatasetMerger::new(options)
        .merge_with_diagnostics(source)
        .context("Merging datasets")?;
    if to_stdout {
        io_utils::write_table(None, DEFAULT_CSV_DELIMITER, &outcome.table)
            .context("Writing merged output")?;
    }

    if args.report {
        for path in &outcome.contributed {
            info!("Merged {:?}", path);
        }
        for skipped in &outcome.skipped {
            info!("Skipped {:?}: {}", skipped.path, skipped.reason);
        }
    }
    info!(
        "Merged {} row(s) and {} column(s) on '{}' from {} file(s); {} skipped",
        outcome.table.row_count(),
        outcome.table.column_count(),
        key,
        outcome.contributed.len(),
        outcome.skipped.len()
    );
    Ok(())
}

fn handle_analyze(args: &cli::AnalyzeArgs) -> Result<()> {
    let options = args.source.load_options(false)?;
    let cleaner = clean::ColumnCleaner::default();

    if let Some(dir) = &args.dir {
        let report = analyze::analyze_directory_with(dir, &options, &cleaner)
            .with_context(|| format!("Analyzing directory {dir:?}"))?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_reports(&report.files);
        }
        info!(
            "{} of {} file(s) need cleaning",
            report.files_needing_cleaning, report.total_files
        );
        return Ok(());
    }

    let Some(input) = &args.input else {
        bail!("Provide --input or --dir");
    };
    let report = analyze::analyze_file_with(input, &options, &cleaner)
        .with_context(|| format!("Analyzing {input:?}"))?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_reports(std::slice::from_ref(&report));
    }
    info!(
        "{} of {} column(s) need cleaning in {:?}",
        report.columns.len(),
        report.total_columns,
        input
    );
    Ok(())
}

fn print_reports(reports: &[FileReport]) {
    let headers = ["file", "column", "dtype", "nulls", "unique", "operations"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let rows = reports
        .iter()
        .flat_map(|report| {
            report.columns.iter().map(move |column| {
                vec![
                    report.file.display().to_string(),
                    column.column_name.clone(),
                    column.dtype.to_string(),
                    column.null_count.to_string(),
                    column.unique_count.to_string(),
                    column.operation_kinds().join(", "),
                ]
            })
        })
        .collect::<Vec<_>>();
    table::print_table(&headers, &rows);
}

fn handle_clean(args: &cli::CleanArgs) -> Result<()> {
    let options = args.source.load_options(false)?;
    let loaded = formats::load_table(&args.input, &options)
        .with_context(|| format!("Loading {:?}", args.input))?;
    let cleaned = clean::clean_table(&loaded);
    io_utils::write_table(args.output.as_deref(), DEFAULT_CSV_DELIMITER, &cleaned)
        .context("Writing cleaned output")?;
    info!(
        "Cleaned {} row(s) across {} column(s) from {:?}",
        cleaned.row_count(),
        cleaned.column_count(),
        args.input
    );
    Ok(())
}

fn handle_discover(args: &cli::DiscoverArgs) -> Result<()> {
    let files = discover::discover_files(&args.dir, &args.exclude)
        .with_context(|| format!("Scanning {:?}", args.dir))?;
    for path in &files {
        println!("{}", path.display());
    }
    info!("Discovered {} file(s) in {:?}", files.len(), args.dir);
    Ok(())
}
