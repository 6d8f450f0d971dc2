//! Command-line entry point for speech-rhythm analysis.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging (`info`, or `debug` with `--verbose`).
//! 3. Load [`AppConfig`] from `--config` or the platform settings file
//!    (defaults on first run) and validate it.
//! 4. Size the rayon pool when `--jobs` is given.
//! 5. Run the selected subcommand.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use vowel_rhythm::{
    config::{AppConfig, AppPaths},
    pipeline::{Analyzer, Pipeline},
    rhythm::{evaluate, Agreement},
    store::{read_results, write_results, write_results_to, SegmentTable},
};

/// Derive VtV and pV speech-rhythm indices from phoneme recognition
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for batch stages (defaults to one per core)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize phonemes for audio files and write the combined segment table
    Phonemize {
        /// Audio files to process
        files: Vec<PathBuf>,

        /// Also process every file listed in the `file` column of this table
        #[arg(long)]
        truth: Option<PathBuf>,

        /// Combined segment table
        #[arg(short, long, default_value = "phonemes_all.csv")]
        output: PathBuf,

        /// Override the segment cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Compute VtV / pV per file from a segment table
    Metrics {
        /// Segment table (`phoneme` or `cv` labelled)
        table: PathBuf,

        /// Write the `file,vtv,pv` table here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare predicted metrics against reference metrics
    Evaluate {
        /// Reference `file,vtv,pv` table
        truth: PathBuf,

        /// Predicted `file,vtv,pv` table
        pred: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Phonemize one audio file and print its VtV and pV
    Analyze {
        audio: PathBuf,

        /// Override the segment cache directory
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },

    /// Write the default settings file
    InitConfig {
        /// Destination (defaults to the platform settings file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Logging
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // 2. Configuration
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let config = AppConfig::load_from(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.validate()?;
    log::debug!("configuration: {config:?}");

    // 3. Thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("failed to size the worker pool")?;
    }

    match args.command {
        Command::Phonemize {
            files,
            truth,
            output,
            cache_dir,
        } => phonemize(with_cache_dir(config, cache_dir), files, truth, &output),
        Command::Metrics {
            table,
            output,
            json,
        } => metrics(&config, &table, output.as_deref(), json),
        Command::Evaluate { truth, pred, json } => evaluate_tables(&truth, &pred, json),
        Command::Analyze { audio, cache_dir } => {
            let pipeline = Pipeline::from_config(&with_cache_dir(config, cache_dir));
            let m = pipeline.process(&audio)?;
            println!("{}: VtV {:.4} s, pV {:.2} %", audio.display(), m.vtv, m.pv);
            Ok(())
        }
        Command::InitConfig { path, force } => {
            let path = path.unwrap_or(config_path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            AppConfig::default().save_to(&path)?;
            log::info!("wrote default settings to {}", path.display());
            Ok(())
        }
    }
}

fn with_cache_dir(mut config: AppConfig, cache_dir: Option<PathBuf>) -> AppConfig {
    if cache_dir.is_some() {
        config.storage.cache_dir = cache_dir;
    }
    config
}

fn phonemize(
    config: AppConfig,
    mut files: Vec<PathBuf>,
    truth: Option<PathBuf>,
    output: &Path,
) -> Result<()> {
    if let Some(truth) = truth {
        let table = SegmentTable::read_from(&truth)
            .with_context(|| format!("failed to read {}", truth.display()))?;
        files.extend(table.files().into_iter().map(PathBuf::from));
    }
    if files.is_empty() {
        bail!("no audio files given (pass paths or --truth TABLE)");
    }

    log::info!("cache directory: {}", config.cache_dir().display());
    let pipeline = Pipeline::from_config(&config);
    let report = pipeline.phonemizer().phonemize_corpus(&files);

    report.table.write_to(output)?;
    log::info!("segments saved to {}", output.display());

    if !report.failures.is_empty() {
        log::warn!("{} file(s) could not be processed", report.failures.len());
    }
    Ok(())
}

fn metrics(config: &AppConfig, table: &Path, output: Option<&Path>, json: bool) -> Result<()> {
    let segments = SegmentTable::read_from(table)
        .with_context(|| format!("failed to read {}", table.display()))?;
    let rows = Analyzer::from_config(config).table_metrics(&segments);
    log::info!("computed metrics for {} files", rows.len());

    match output {
        Some(path) => {
            write_results(path, &rows)?;
            log::info!("results saved to {}", path.display());
        }
        None if json => println!("{}", serde_json::to_string_pretty(&rows)?),
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_results_to(&mut lock, &rows)?;
            lock.flush()?;
        }
    }
    Ok(())
}

fn evaluate_tables(truth: &Path, pred: &Path, json: bool) -> Result<()> {
    let truth_rows =
        read_results(truth).with_context(|| format!("failed to read {}", truth.display()))?;
    let pred_rows =
        read_results(pred).with_context(|| format!("failed to read {}", pred.display()))?;
    let ev = evaluate(&truth_rows, &pred_rows)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ev)?);
        return Ok(());
    }

    fn pcc(a: &Agreement) -> String {
        a.pearson
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "n/a".into())
    }

    println!("Files compared: {}", ev.files);
    println!(
        "Mean Absolute Error for VtV: {:.3}, PV: {:.3}",
        ev.vtv.mae, ev.pv.mae
    );
    println!(
        "Pearson correlation for VtV: {}, PV: {}",
        pcc(&ev.vtv),
        pcc(&ev.pv)
    );
    Ok(())
}
