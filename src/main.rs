use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use somavar::engine::{call_regions, RegionInput, RegionJob};
use somavar::genomics::{fetch_reference, fetch_region_reads};
use somavar::{render_tsv, Diagnostics, EngineConfig, EngineError, GenomeRegion, SharedResources};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "somavar", about = "Bounded-memory somatic variant candidate detection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate reads into variant candidates and print them as TSV.
    Candidates {
        /// Indexed BAM/CRAM file; repeat for several samples (sample = file stem).
        #[arg(long = "bam", required = true)]
        bams: Vec<PathBuf>,
        /// Indexed FASTA reference.
        #[arg(long)]
        reference: PathBuf,
        /// Region as chrom:start-end; repeatable.
        #[arg(long = "region", required = true)]
        regions: Vec<GenomeRegion>,
        /// Positions per parallel work unit.
        #[arg(long, default_value_t = 100_000)]
        chunk_size: u32,
        /// Worker threads (0 = all cores).
        #[arg(long, default_value_t = 0)]
        threads: usize,
        /// Longest read in the input.
        #[arg(long, default_value_t = 151)]
        max_read_length: u32,
        /// Log observations and finalizations at this position; repeatable.
        #[arg(long = "debug-position")]
        debug_positions: Vec<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Candidates {
            bams,
            reference,
            regions,
            chunk_size,
            threads,
            max_read_length,
            debug_positions,
        } => run_candidates(
            bams,
            reference,
            regions,
            chunk_size,
            threads,
            max_read_length,
            debug_positions,
        )?,
    }

    Ok(())
}

fn run_candidates(
    bams: Vec<PathBuf>,
    reference: PathBuf,
    regions: Vec<GenomeRegion>,
    chunk_size: u32,
    threads: usize,
    max_read_length: u32,
    debug_positions: Vec<u32>,
) -> Result<()> {
    let config = EngineConfig::default().with_max_read_length(max_read_length);
    config.validate().context("invalid engine configuration")?;

    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure worker threads")?;
    }

    let mut samples = Vec::with_capacity(bams.len());
    for path in &bams {
        let sample = sample_name(path)?;
        if samples.iter().any(|(name, _): &(Arc<str>, PathBuf)| *name == sample) {
            bail!("duplicate sample name '{}' from {}", sample, path.display());
        }
        samples.push((sample, path.clone()));
    }

    let jobs: Vec<RegionJob> = regions
        .iter()
        .flat_map(|region| region.chunks(chunk_size))
        .flat_map(|chunk| {
            samples
                .iter()
                .map(move |(sample, _)| RegionJob::new(Arc::clone(sample), chunk.clone()))
        })
        .collect();
    info!(jobs = jobs.len(), samples = samples.len(), "starting");

    let padding = config.read_length_buffer();
    let loader = |job: &RegionJob| -> Result<RegionInput, EngineError> {
        let path = samples
            .iter()
            .find(|(name, _)| *name == job.sample)
            .map(|(_, path)| path)
            .ok_or_else(|| EngineError::RegionLoad {
                region: job.region.to_string(),
                message: format!("unknown sample {}", job.sample),
            })?;
        let reference = fetch_reference(&reference, &job.region, padding)?;
        let (reads, skipped) = fetch_region_reads(path, &job.region)?;
        if skipped > 0 {
            warn!(region = %job.region, sample = %job.sample, skipped, "skipped unconvertible records");
        }
        Ok(RegionInput { reference, reads })
    };

    let cancel = AtomicBool::new(false);
    let diagnostics = Diagnostics::with_debug_positions(debug_positions);
    let result = call_regions(
        &jobs,
        &config,
        &SharedResources::default(),
        &diagnostics,
        &cancel,
        loader,
    )
    .context("candidate calling failed")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    render_tsv(&result.candidates, &mut out).context("failed to write candidates")?;
    out.flush().context("failed to flush output")?;

    info!(
        candidates = result.candidates.len(),
        reads = result.stats.consumer.reads_seen,
        filtered = result.stats.consumer.reads_filtered,
        depth_capped = result.stats.consumer.depth_capped,
        "done"
    );
    Ok(())
}

fn sample_name(path: &Path) -> Result<Arc<str>> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(Arc::from)
        .with_context(|| format!("cannot derive a sample name from {}", path.display()))
}
