//! Protein structure lookup through the PDBe "best structures" mapping.

use std::collections::HashMap;

use crate::error::Result;

const SERVICE: &str = "PDBe";

/// Default base URL of the PDBe REST API.
pub const DEFAULT_BASE_URL: &str = "https://www.ebi.ac.uk/pdbe/api";

/// One experimentally resolved structure covering (part of) a protein.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StructureCandidate {
    /// PDB identifier, e.g. `1abc`.
    pub pdb_id: String,
    pub chain_id: String,
    /// Fraction of the protein sequence covered by the chain.
    #[serde(default)]
    pub coverage: f64,
    /// Resolution in Angstrom; absent for e.g. NMR structures.
    pub resolution: Option<f64>,
    pub experimental_method: Option<String>,
    /// First and last residue of the protein covered by the chain.
    pub unp_start: Option<u32>,
    pub unp_end: Option<u32>,
}

/// Mapping from protein accession to candidates, best first.
pub type StructureMapping = HashMap<String, Vec<StructureCandidate>>;

/// Remote structure mapping service.
#[allow(async_fn_in_trait)]
pub trait StructureService {
    /// Look up the candidate structures for each accession.
    ///
    /// Accessions without known structures are absent from the result.  The candidate order
    /// (coverage descending, then resolution ascending) is the service's and is kept as is.
    async fn best_structures(&self, accessions: &[String]) -> Result<StructureMapping>;
}

/// Client for `POST /mappings/best_structures`.
#[derive(Debug, Clone)]
pub struct PdbeClient {
    client: reqwest::Client,
    base_url: String,
}

impl PdbeClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/mappings/best_structures",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Build the request; the body is the comma-joined accessions.
    fn request(&self, accessions: &[String]) -> Result<reqwest::Request> {
        Ok(self
            .client
            .post(self.url())
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(accessions.join(","))
            .build()?)
    }
}

/// Interpret the answer of the mapping endpoint.
///
/// PDBe signals "nothing found for any accession" with 404.
fn parse_mapping(status: reqwest::StatusCode, body: &[u8]) -> Result<StructureMapping> {
    if status == reqwest::StatusCode::NOT_FOUND {
        return Ok(StructureMapping::default());
    }
    if !status.is_success() {
        return Err(super::status_error(SERVICE, status, body));
    }
    Ok(serde_json::from_slice(body)?)
}

impl StructureService for PdbeClient {
    async fn best_structures(&self, accessions: &[String]) -> Result<StructureMapping> {
        if accessions.is_empty() {
            return Ok(StructureMapping::default());
        }

        let request = self.request(accessions)?;
        tracing::debug!("POST {} with {} accessions", request.url(), accessions.len());
        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.bytes().await?;
        let mapping = parse_mapping(status, &body)?;
        tracing::debug!(
            "{} answered {} with structures for {} accessions",
            SERVICE,
            status,
            mapping.len()
        );
        Ok(mapping)
    }
}
