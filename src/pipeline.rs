//! Driver wiring reading, batching, consequence resolution and assembly together.

use std::path::Path;
use std::time::Duration;

use futures::StreamExt as _;
use itertools::Itertools;
use tokio::time::Instant;

use crate::annotate::icn3d::ViewerConfig;
use crate::annotate::select::TranscriptSelection;
use crate::annotate::{AnnotatedVariant, Assembled, Assembler, RecordError};
use crate::common::noodles::TabixSource;
use crate::common::Species;
use crate::error::{Error, Result};
use crate::reader::{self, IndexedSource, VariantRecord};
use crate::remote::pdbe::{PdbeClient, StructureService};
use crate::remote::uniprot::{self, MappingJob, ProteinIdService, UniprotClient};
use crate::remote::vep::{self, ConsequencePrediction, ConsequenceService, QueryVariant, VepClient};
use crate::remote::{self, Endpoints};

/// Default bound on waiting for one protein id mapping job.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration of a pipeline run, constructed through [`ConfigBuilder`] which holds the
/// defaults.
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(pattern = "immutable")]
pub struct Config {
    /// Species passed to the consequence service.
    #[builder(default)]
    pub species: Species,
    /// Maximal number of variants to read; all if `None`.
    #[builder(default)]
    pub limit: Option<usize>,
    /// Only read lines containing this text.
    #[builder(default)]
    pub text_filter: Option<String>,
    /// Number of variants per consequence query; 200 if `None`.
    #[builder(default)]
    pub batch_size: Option<usize>,
    /// Number of batches processed at the same time.
    #[builder(default = "1")]
    pub concurrency: usize,
    /// Policy for picking one transcript consequence per variant.
    #[builder(default)]
    pub transcript_selection: TranscriptSelection,
    /// Look up protein accessions for consequences that only carry a gene identifier.
    #[builder(default)]
    pub map_missing_accessions: bool,
    #[builder(default = "uniprot::DEFAULT_POLL_INTERVAL")]
    pub poll_interval: Duration,
    #[builder(default = "DEFAULT_POLL_TIMEOUT")]
    pub poll_timeout: Duration,
    /// Bound on the whole run, measured from its start.
    #[builder(default)]
    pub deadline: Option<Duration>,
    #[builder(default)]
    pub viewer: ViewerConfig,
}

impl Config {
    fn validate(&self) -> Result<()> {
        if self.limit == Some(0) {
            return Err(Error::config("limit must be at least 1"));
        }
        if self.batch_size == Some(0) {
            return Err(Error::config("batch size must be at least 1"));
        }
        if self.concurrency == 0 {
            return Err(Error::config("concurrency must be at least 1"));
        }
        Ok(())
    }
}

/// A batch that contributed no records because processing it failed.
#[derive(Debug)]
pub struct BatchError {
    /// 0-based index of the batch.
    pub index: usize,
    pub error: Error,
}

/// Everything a run produces.
#[derive(Debug, Default)]
pub struct PipelineOutput {
    /// Annotated variants in input order.
    pub records: Vec<AnnotatedVariant>,
    pub record_errors: Vec<RecordError>,
    pub batch_errors: Vec<BatchError>,
}

/// Annotation pipeline over the three remote collaborators.
pub struct Pipeline<C, S, P> {
    config: Config,
    consequences: C,
    structures: S,
    protein_ids: P,
}

impl Pipeline<VepClient, PdbeClient, UniprotClient> {
    /// Construct with HTTP clients for the given endpoints.
    pub fn with_endpoints(config: Config, endpoints: &Endpoints) -> Result<Self> {
        let client = remote::build_client()?;
        Self::new(
            config,
            VepClient::new(client.clone(), endpoints.vep.clone()),
            PdbeClient::new(client.clone(), endpoints.pdbe.clone()),
            UniprotClient::new(client, endpoints.uniprot.clone()),
        )
    }
}

impl<C, S, P> Pipeline<C, S, P>
where
    C: ConsequenceService,
    S: StructureService,
    P: ProteinIdService,
{
    pub fn new(config: Config, consequences: C, structures: S, protein_ids: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            consequences,
            structures,
            protein_ids,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Open the bgzip-compressed VCF at `path` with its tabix index and run on it.
    pub async fn run_path<Q: AsRef<Path>>(
        &self,
        path: Q,
        index_path: Option<&Path>,
    ) -> Result<PipelineOutput> {
        let mut source = TabixSource::from_path(path, index_path)?;
        self.run(&mut source).await
    }

    /// Annotate all variants of `source`.
    ///
    /// Reading errors abort the run.  Failed batches are recorded in
    /// `PipelineOutput::batch_errors` and the run continues with the next batch.  Records are
    /// returned in input order regardless of `Config::concurrency`.
    pub async fn run<R>(&self, source: &mut R) -> Result<PipelineOutput>
    where
        R: IndexedSource + ?Sized,
    {
        let start = Instant::now();
        let deadline = self.config.deadline.map(|deadline| start + deadline);

        let variants = reader::read(
            source,
            self.config.limit,
            self.config.text_filter.as_deref(),
        )?;
        tracing::info!("read {} variants", variants.len());

        let batches = crate::batch::batch(&variants, self.config.batch_size)?;
        let n_batches = batches.len();
        let results = futures::stream::iter(batches.enumerate().map(
            move |(index, batch)| async move {
                tracing::info!("processing batch {} of {}", index + 1, n_batches);
                (index, self.process_batch(batch, deadline).await)
            },
        ))
        .buffered(self.config.concurrency)
        .collect::<Vec<_>>()
        .await;

        let mut output = PipelineOutput::default();
        for (index, result) in results {
            match result {
                Ok(Assembled { records, errors }) => {
                    output.records.extend(records);
                    output.record_errors.extend(errors);
                }
                Err(error) => {
                    tracing::warn!("batch {} failed: {}", index + 1, &error);
                    output.batch_errors.push(BatchError { index, error });
                }
            }
        }
        tracing::info!(
            "assembled {} records ({} record errors, {} failed batches) in {:?}",
            output.records.len(),
            output.record_errors.len(),
            output.batch_errors.len(),
            start.elapsed()
        );

        Ok(output)
    }

    async fn process_batch(
        &self,
        batch: &[VariantRecord],
        deadline: Option<Instant>,
    ) -> Result<Assembled> {
        let work = async {
            let queries = batch.iter().map(QueryVariant::from).collect::<Vec<_>>();
            let mut predictions =
                vep::resolve(&self.consequences, &queries, &self.config.species).await?;
            if self.config.map_missing_accessions {
                self.backfill_accessions(&mut predictions, deadline).await?;
            }
            Assembler::new(
                &self.structures,
                self.config.transcript_selection,
                &self.config.viewer,
            )
            .assemble(&predictions)
            .await
        };

        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, work)
                .await
                .map_err(|_| Error::Timeout {
                    what: format!("batch of {} variants", batch.len()),
                    elapsed: self.config.deadline.unwrap_or_default(),
                })?,
            None => work.await,
        }
    }

    /// Fill in Swiss-Prot accessions for consequences that only carry a gene identifier.
    async fn backfill_accessions(
        &self,
        predictions: &mut [ConsequencePrediction],
        deadline: Option<Instant>,
    ) -> Result<()> {
        let gene_ids = predictions
            .iter()
            .flat_map(|prediction| &prediction.transcript_consequences)
            .filter(|tc| !tc.has_protein_accession())
            .filter_map(|tc| tc.gene_id.clone())
            .unique()
            .collect::<Vec<_>>();
        if gene_ids.is_empty() {
            return Ok(());
        }
        tracing::debug!("mapping {} gene ids to protein accessions", gene_ids.len());

        let mapping = uniprot::get_protein_ids(
            &self.protein_ids,
            &MappingJob::ensembl_to_swissprot(gene_ids),
            self.config.poll_interval,
            self.config.poll_timeout,
            deadline,
        )
        .await?;

        for tc in predictions
            .iter_mut()
            .flat_map(|prediction| prediction.transcript_consequences.iter_mut())
            .filter(|tc| !tc.has_protein_accession())
        {
            if let Some(accessions) = tc.gene_id.as_ref().and_then(|id| mapping.get(id)) {
                tc.swissprot = accessions.clone();
            }
        }
        Ok(())
    }
}
