use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use log::{error, info};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use fgfr1_itd::config::{CallerFailurePolicy, PipelineConfig};
use fgfr1_itd::output::{FilterStats, OutputCollector};
use fgfr1_itd::output::schema::schema_json_pretty;
use fgfr1_itd::pipeline::{filter_existing_vcf, PipelineRunner};
use fgfr1_itd::utils::bed::load_breakpoint_windows;
use fgfr1_itd::ItdError;

#[derive(Parser)]
#[command(name = "fgfr1-itd", version)]
#[command(
    about = "FGFR1 internal tandem duplication caller",
    long_about = "Runs VarDict over the FGFR1 gene and keeps only calls consistent with an internal tandem duplication anchored in the 3' breakpoint exon."
)]
struct Cli {
    /// Log verbosity level
    #[arg(long, global = true, default_value = "info")]
    log_level: LogLevel,
    /// Write log output to a file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<String>,
    /// Append to log file instead of truncating
    #[arg(long, global = true)]
    append_log: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run VarDict on a BAM file and filter its output for FGFR1 ITDs
    Call {
        /// Reference genome the BAM was aligned to. Must be indexed for the aligner used (e.g. BWA-MEM).
        #[arg(long = "ref", required = true)]
        reference: PathBuf,
        /// Sorted, deduplicated, indexed and realigned BAM file. The .bai index must sit next to it.
        #[arg(long, required = true)]
        bam: PathBuf,
        /// Output VCF for FGFR1 ITD calls.
        #[arg(long, required = true)]
        out_vcf: PathBuf,
        /// Sample name for VCF header annotations.
        #[arg(long, required = true)]
        sample_name: String,
        /// Minimum variant allele frequency to report (0 - 1). Overrides the config file.
        #[arg(long)]
        min_vaf: Option<f64>,
        /// Number of VarDict threads. Overrides the config file.
        #[arg(long)]
        threads: Option<usize>,
        /// Genome version used to locate bedfiles/<version>/ (e.g. hg19, hg38).
        #[arg(long, default_value = "hg38")]
        genome_version: String,
        /// Path to pipeline configuration JSON file.
        #[arg(long)]
        config: Option<String>,
        /// What to do when VarDict exits with an error. Overrides the config file.
        #[arg(long, value_enum)]
        caller_failure_policy: Option<CallerFailurePolicy>,
        /// Where to write the raw VarDict VCF (defaults to the system temp directory).
        #[arg(long)]
        intermediate_vcf: Option<PathBuf>,
        /// Keep the raw VarDict VCF instead of deleting it.
        #[arg(long)]
        keep_intermediate: bool,
        /// Write a JSON run summary to this path.
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Force overwrite of existing output files.
        #[arg(short, long)]
        force: bool,
    },
    /// Filter an existing VCF for FGFR1 ITDs
    Filter {
        /// Input VCF (e.g. raw VarDict output).
        #[arg(long, required = true)]
        vcf: PathBuf,
        /// Breakpoint exon BED file.
        #[arg(long, required = true)]
        breakpoints: PathBuf,
        /// Output VCF for FGFR1 ITD calls.
        #[arg(long, required = true)]
        out_vcf: PathBuf,
        /// Minimum ALT allele length. Overrides the config file.
        #[arg(long)]
        min_alt_length: Option<usize>,
        /// Path to pipeline configuration JSON file.
        #[arg(long)]
        config: Option<String>,
        /// Write a JSON run summary to this path.
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Force overwrite of existing output files.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the breakpoint windows loaded from a BED file
    Windows {
        /// Breakpoint exon BED file.
        #[arg(long, required = true)]
        breakpoints: PathBuf,
        /// Path to pipeline configuration JSON file.
        #[arg(long)]
        config: Option<String>,
    },
    /// Print JSON Schema for the run summary
    Schema {
        /// Write schema to file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

// Create parent directories and refuse to clobber existing outputs
fn check_output_paths(paths: &[&Path], force: bool) -> Result<(), ItdError> {
    for path in paths {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating output directory: {:?}", parent);
                std::fs::create_dir_all(parent).map_err(|e| ItdError::io(e, parent))?;
            }

        if !force && path.exists() {
            return Err(ItdError::io(
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "output file already exists. Use --force to overwrite.",
                ),
                *path,
            ));
        }
    }
    Ok(())
}

fn report_counts(stats: &FilterStats) {
    println!("Total variants processed: {}", stats.total_variants);
    println!("FGFR1 ITD variants found: {}", stats.itd_variants);
}

fn run(cli: &Cli) -> Result<(), ItdError> {
    match &cli.command {
        Commands::Call {
            reference,
            bam,
            out_vcf,
            sample_name,
            min_vaf,
            threads,
            genome_version,
            config,
            caller_failure_policy,
            intermediate_vcf,
            keep_intermediate,
            summary,
            force,
        } => {
            let mut outputs = vec![out_vcf.as_path()];
            if let Some(s) = summary {
                outputs.push(s.as_path());
            }
            check_output_paths(&outputs, *force)?;

            let mut pipeline_config = PipelineConfig::load_or_default(config.as_deref())?;
            if let Some(v) = min_vaf {
                pipeline_config.caller.min_vaf = *v;
            }
            if let Some(t) = threads {
                pipeline_config.caller.threads = *t;
            }
            if let Some(p) = caller_failure_policy {
                pipeline_config.caller.failure_policy = *p;
            }

            let result = PipelineRunner::new(reference, bam, out_vcf, sample_name, &pipeline_config)
                .with_genome_version(genome_version)
                .with_intermediate_vcf(intermediate_vcf.as_deref())
                .keep_intermediate(*keep_intermediate)
                .run()?;

            report_counts(&result.stats);
            if let Some(path) = summary {
                result.summary.write_json(path)?;
            }
        }
        Commands::Filter {
            vcf,
            breakpoints,
            out_vcf,
            min_alt_length,
            config,
            summary,
            force,
        } => {
            let mut outputs = vec![out_vcf.as_path()];
            if let Some(s) = summary {
                outputs.push(s.as_path());
            }
            check_output_paths(&outputs, *force)?;

            let mut pipeline_config = PipelineConfig::load_or_default(config.as_deref())?;
            if let Some(m) = min_alt_length {
                pipeline_config.filter.min_alt_length = *m;
            }
            pipeline_config.validate()?;

            let (windows, stats) = filter_existing_vcf(vcf, breakpoints, out_vcf, &pipeline_config)?;
            report_counts(&stats);
            if let Some(path) = summary {
                OutputCollector::new()
                    .with_windows(windows)
                    .with_filter(stats)
                    .write_json(path)?;
            }
        }
        Commands::Windows { breakpoints, config } => {
            let pipeline_config = PipelineConfig::load_or_default(config.as_deref())?;
            let windows = load_breakpoint_windows(breakpoints, &pipeline_config.filter)?;
            println!(
                "{}\t{}\t{}",
                pipeline_config.filter.five_prime_label, windows.five_prime.start, windows.five_prime.end
            );
            println!(
                "{}\t{}\t{}",
                pipeline_config.filter.three_prime_label, windows.three_prime.start, windows.three_prime.end
            );
        }
        Commands::Schema { output } => {
            let schema = schema_json_pretty();
            match output {
                Some(path) => {
                    std::fs::write(path, schema).map_err(|e| ItdError::io(e, path))?;
                    info!("Schema written to {}", path.display());
                }
                None => println!("{}", schema),
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    log_builder
        .filter_level(cli.log_level.to_level_filter())
        .format_module_path(false);
    if let Some(ref path) = cli.log_file {
        let file = if cli.append_log {
            std::fs::File::options().create(true).append(true).open(path)
        } else {
            std::fs::File::create(path)
        };
        match file {
            Ok(f) => {
                log_builder.target(env_logger::Target::Pipe(Box::new(f)));
            }
            Err(e) => {
                eprintln!("Could not open log file '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        }
    }
    log_builder.init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
