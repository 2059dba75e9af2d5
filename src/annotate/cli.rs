//! Command line interface of `varstruct annotate`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use super::icn3d::{self, ViewerConfig};
use super::select::TranscriptSelection;
use super::AnnotatedVariant;
use crate::common::io::std::open_write_maybe_gz;
use crate::common::{Species, DEFAULT_SPECIES};
use crate::pipeline::{ConfigBuilder, Pipeline};
use crate::remote::{self, Endpoints};

/// Command line arguments for `annotate` sub command.
#[derive(Parser, Debug)]
#[command(about = "Annotate variants with protein structures and viewer commands", long_about = None)]
pub struct Args {
    /// Path to the bgzip-compressed, position-sorted input VCF file.
    #[arg(long)]
    pub path_input_vcf: PathBuf,
    /// Path to the tabix index; defaults to `{path_input_vcf}.tbi`.
    #[arg(long)]
    pub path_index: Option<PathBuf>,
    /// Path to the JSON Lines output file, gzip-compressed if ending in `.gz`.
    #[arg(long)]
    pub path_output: PathBuf,

    /// Maximal number of variants to read.
    #[arg(long)]
    pub limit: Option<usize>,
    /// Only consider VCF lines that contain this text.
    #[arg(long)]
    pub filter: Option<String>,
    /// Species to predict consequences for.
    #[arg(long, default_value = DEFAULT_SPECIES)]
    pub species: Species,

    /// Number of variants per consequence query (200 if not given).
    #[arg(long)]
    pub batch_size: Option<usize>,
    /// Number of batches to process at the same time.
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,
    /// How to pick one transcript consequence per variant.
    #[arg(long, value_enum, default_value_t = TranscriptSelection::FirstEligibleHighImpact)]
    pub transcript_selection: TranscriptSelection,
    /// Look up Swiss-Prot accessions for consequences that only carry a gene identifier.
    #[arg(long)]
    pub map_missing_accessions: bool,
    /// Give up on batches still running after this many seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Base URL of the Ensembl REST API.
    #[arg(long, default_value = remote::vep::DEFAULT_BASE_URL)]
    pub vep_url: String,
    /// Base URL of the PDBe REST API.
    #[arg(long, default_value = remote::pdbe::DEFAULT_BASE_URL)]
    pub pdbe_url: String,
    /// Base URL of the UniProt REST API.
    #[arg(long, default_value = remote::uniprot::DEFAULT_BASE_URL)]
    pub uniprot_url: String,
    /// iCn3D entry point used in viewer commands.
    #[arg(long, default_value = icn3d::DEFAULT_BASE_URL)]
    pub icn3d_url: String,
}

/// Write one JSON object per line.
fn write_records(path: &Path, records: &[AnnotatedVariant]) -> Result<(), anyhow::Error> {
    let mut writer = open_write_maybe_gz(path)?;
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Main entry point for `annotate` sub command.
pub async fn run(_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    tracing::info!("config = {:#?}", &args);

    let config = ConfigBuilder::default()
        .species(args.species.clone())
        .limit(args.limit)
        .text_filter(args.filter.clone())
        .batch_size(args.batch_size)
        .concurrency(args.concurrency)
        .transcript_selection(args.transcript_selection)
        .map_missing_accessions(args.map_missing_accessions)
        .deadline(args.timeout_secs.map(Duration::from_secs))
        .viewer(ViewerConfig {
            base_url: args.icn3d_url.clone(),
            ..Default::default()
        })
        .build()?;
    let endpoints = Endpoints {
        vep: args.vep_url.clone(),
        pdbe: args.pdbe_url.clone(),
        uniprot: args.uniprot_url.clone(),
    };
    let pipeline = Pipeline::with_endpoints(config, &endpoints)?;

    let output = pipeline
        .run_path(&args.path_input_vcf, args.path_index.as_deref())
        .await?;
    for record_error in &output.record_errors {
        tracing::warn!("skipped {}: {}", &record_error.input, &record_error.error);
    }
    for batch_error in &output.batch_errors {
        tracing::error!("batch {} failed: {}", batch_error.index + 1, &batch_error.error);
    }

    tracing::info!(
        "writing {} records to {}",
        output.records.len(),
        args.path_output.display()
    );
    write_records(&args.path_output, &output.records)?;

    Ok(())
}
