//! Consequence prediction through the Ensembl Variant Effect Predictor (VEP) REST API.

use std::fmt::Display;

use crate::common::{contig, Species};
use crate::error::{Error, Result};
use crate::reader::VariantRecord;

/// Default base URL of the Ensembl REST API.
pub const DEFAULT_BASE_URL: &str = "https://rest.ensembl.org";

/// SIFT label of a deleterious prediction.
pub const SIFT_DELETERIOUS: &str = "deleterious";
/// PolyPhen label of a probably damaging prediction.
pub const POLYPHEN_PROBABLY_DAMAGING: &str = "probably_damaging";

/// A variant encoded the way the VEP region endpoint expects it.
///
/// Displays as `"{chrom} {pos} {id} {ref} {alt_csv} ."` with the contig prefix stripped and
/// missing values written as `.`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QueryVariant {
    pub chrom: String,
    pub pos: usize,
    pub id: Option<String>,
    pub reference: String,
    pub alternates: Vec<String>,
}

impl From<&VariantRecord> for QueryVariant {
    fn from(record: &VariantRecord) -> Self {
        Self {
            chrom: contig::ensembl_name(&record.chrom).to_string(),
            pos: record.pos,
            id: record.id.clone(),
            reference: record.reference.clone(),
            alternates: record.alternates.clone(),
        }
    }
}

impl Display for QueryVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let alternates = if self.alternates.is_empty() {
            String::from(".")
        } else {
            self.alternates.join(",")
        };
        write!(
            f,
            "{} {} {} {} {} .",
            self.chrom,
            self.pos,
            self.id.as_deref().unwrap_or("."),
            self.reference,
            alternates
        )
    }
}

/// One transcript-level consequence as returned by VEP.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptConsequence {
    pub gene_id: Option<String>,
    pub gene_symbol: Option<String>,
    pub transcript_id: Option<String>,
    /// UniProtKB/Swiss-Prot accessions of the protein product, possibly versioned.
    #[serde(default)]
    pub swissprot: Vec<String>,
    /// Amino acid change in `X/Y` notation.
    pub amino_acids: Option<String>,
    /// 1-based position in the protein.
    pub protein_start: Option<u32>,
    pub sift_prediction: Option<String>,
    pub sift_score: Option<f64>,
    pub polyphen_prediction: Option<String>,
    pub polyphen_score: Option<f64>,
}

impl TranscriptConsequence {
    /// Whether at least one protein accession is known.
    pub fn has_protein_accession(&self) -> bool {
        !self.swissprot.is_empty()
    }

    /// Whether SIFT or PolyPhen made a prediction.
    pub fn has_prediction(&self) -> bool {
        self.sift_prediction.is_some() || self.polyphen_prediction.is_some()
    }

    /// Deleterious according to SIFT or probably damaging according to PolyPhen.
    pub fn is_high_impact(&self) -> bool {
        self.sift_prediction.as_deref() == Some(SIFT_DELETERIOUS)
            || self.polyphen_prediction.as_deref() == Some(POLYPHEN_PROBABLY_DAMAGING)
    }
}

/// One element of the VEP response array.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VepResult {
    pub input: Option<String>,
    #[serde(default)]
    pub transcript_consequences: Vec<TranscriptConsequence>,
}

/// Predictions for one query variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsequencePrediction {
    /// The variant as sent to the service.
    pub input: QueryVariant,
    /// Transcript consequences in service order.
    pub transcript_consequences: Vec<TranscriptConsequence>,
}

/// Remote consequence prediction service.
#[allow(async_fn_in_trait)]
pub trait ConsequenceService {
    /// Predict consequences for the given query lines.
    ///
    /// The result is positionally aligned with `variants`.
    async fn predict(&self, species: &Species, variants: &[String]) -> Result<Vec<VepResult>>;
}

/// Request body of the VEP region endpoint.
#[derive(Debug, serde::Serialize)]
struct RegionRequest<'a> {
    variants: &'a [String],
}

/// Client for the Ensembl VEP REST endpoint `POST /vep/{species}/region`.
#[derive(Debug, Clone)]
pub struct VepClient {
    client: reqwest::Client,
    base_url: String,
}

impl VepClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, species: &Species) -> String {
        format!(
            "{}/vep/{}/region",
            self.base_url.trim_end_matches('/'),
            species
        )
    }

    /// Build the request with the JSON body `{"variants": [...]}`.
    fn request(&self, species: &Species, variants: &[String]) -> Result<reqwest::Request> {
        Ok(self
            .client
            .post(self.url(species))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&RegionRequest { variants })
            .build()?)
    }
}

impl ConsequenceService for VepClient {
    async fn predict(&self, species: &Species, variants: &[String]) -> Result<Vec<VepResult>> {
        let request = self.request(species, variants)?;
        tracing::debug!("POST {} with {} variants", request.url(), variants.len());
        let response = self.client.execute(request).await?;
        let response = super::error_for_status("VEP", response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Resolve consequence predictions for one batch of query variants.
///
/// The remote service answers positionally, so the response must have exactly one element
/// per query variant; anything else is reported as `Error::Remote`.  No retries are made.
pub async fn resolve<C>(
    service: &C,
    batch: &[QueryVariant],
    species: &Species,
) -> Result<Vec<ConsequencePrediction>>
where
    C: ConsequenceService + ?Sized,
{
    let lines = batch.iter().map(ToString::to_string).collect::<Vec<_>>();
    let results = service.predict(species, &lines).await?;
    if results.len() != batch.len() {
        return Err(Error::remote(format!(
            "VEP returned {} results for {} variants",
            results.len(),
            batch.len()
        )));
    }

    Ok(batch
        .iter()
        .zip(results)
        .map(|(input, result)| ConsequencePrediction {
            input: input.clone(),
            transcript_consequences: result.transcript_consequences,
        })
        .collect())
}
