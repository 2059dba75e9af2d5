//! Protein identifier mapping through the asynchronous UniProt ID mapping jobs.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Error, Result};

/// Default base URL of the UniProt REST API.
pub const DEFAULT_BASE_URL: &str = "https://rest.uniprot.org";

/// Source database for Ensembl gene identifiers.
pub const FROM_ENSEMBL: &str = "Ensembl";
/// Target database for reviewed protein accessions.
pub const TO_SWISSPROT: &str = "UniProtKB-Swiss-Prot";

/// Default interval between two status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// An identifier mapping job to submit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MappingJob {
    pub from: String,
    pub to: String,
    pub ids: Vec<String>,
}

impl MappingJob {
    /// Map Ensembl gene identifiers to Swiss-Prot accessions.
    pub fn ensembl_to_swissprot(ids: Vec<String>) -> Self {
        Self {
            from: FROM_ENSEMBL.to_string(),
            to: TO_SWISSPROT.to_string(),
            ids,
        }
    }
}

/// Target of a single mapping; UniProtKB targets come as full entries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum MappedId {
    Id(String),
    #[serde(rename_all = "camelCase")]
    Entry { primary_accession: String },
}

impl MappedId {
    pub fn as_str(&self) -> &str {
        match self {
            MappedId::Id(id) => id,
            MappedId::Entry { primary_accession } => primary_accession,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdMapping {
    pub from: String,
    pub to: MappedId,
}

/// Response of the status endpoint.
///
/// While the job runs only `job_status` is set; once finished `results` is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_status: Option<String>,
    pub results: Option<Vec<IdMapping>>,
}

impl JobStatus {
    fn is_failed(&self) -> bool {
        matches!(self.job_status.as_deref(), Some("FAILED") | Some("ERROR"))
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    job_id: String,
}

/// Remote protein identifier mapping service with a submit/poll protocol.
#[allow(async_fn_in_trait)]
pub trait ProteinIdService {
    /// Submit a job and return its identifier.
    async fn submit(&self, job: &MappingJob) -> Result<String>;

    /// Query the current status of a job.
    async fn status(&self, job_id: &str) -> Result<JobStatus>;
}

/// Client for the UniProt `/idmapping` endpoints.
#[derive(Debug, Clone)]
pub struct UniprotClient {
    client: reqwest::Client,
    base_url: String,
}

impl UniprotClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/idmapping/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Build the submit request with the form fields `from`, `to` and comma-joined `ids`.
    fn submit_request(&self, job: &MappingJob) -> Result<reqwest::Request> {
        let ids = job.ids.join(",");
        Ok(self
            .client
            .post(self.url("run"))
            .form(&[
                ("from", job.from.as_str()),
                ("to", job.to.as_str()),
                ("ids", ids.as_str()),
            ])
            .build()?)
    }

    fn status_request(&self, job_id: &str) -> Result<reqwest::Request> {
        Ok(self
            .client
            .get(self.url(&format!("status/{}", job_id)))
            .build()?)
    }
}

impl ProteinIdService for UniprotClient {
    async fn submit(&self, job: &MappingJob) -> Result<String> {
        let request = self.submit_request(job)?;
        tracing::debug!("POST {} with {} ids", request.url(), job.ids.len());
        let response = self.client.execute(request).await?;
        let response = super::error_for_status("UniProt", response).await?;
        let body = response.bytes().await?;
        let SubmitResponse { job_id } = serde_json::from_slice(&body)?;
        Ok(job_id)
    }

    async fn status(&self, job_id: &str) -> Result<JobStatus> {
        let request = self.status_request(job_id)?;
        tracing::trace!("GET {}", request.url());
        let response = self.client.execute(request).await?;
        let response = super::error_for_status("UniProt", response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Submit `job` and poll its status every `interval` until results are available.
async fn poll_job<P>(service: &P, job: &MappingJob, interval: Duration) -> Result<Vec<IdMapping>>
where
    P: ProteinIdService + ?Sized,
{
    let job_id = service.submit(job).await?;
    tracing::debug!("submitted id mapping job {}", &job_id);
    loop {
        let status = service.status(&job_id).await?;
        if status.is_failed() {
            return Err(Error::remote(format!(
                "id mapping job {} failed with status {}",
                &job_id,
                status.job_status.as_deref().unwrap_or_default()
            )));
        }
        if let Some(results) = status.results {
            return Ok(results);
        }
        tracing::trace!("job {} still running", &job_id);
        tokio::time::sleep(interval).await;
    }
}

/// Submit `job` and poll until its results are available.
///
/// Polls every `interval`.  Gives up with `Error::Timeout` after `timeout` or at `deadline`,
/// whichever comes first.  A job reported as failed is an `Error::Remote`.
///
/// Returns the mapped identifiers per source identifier, in service order.
pub async fn get_protein_ids<P>(
    service: &P,
    job: &MappingJob,
    interval: Duration,
    timeout: Duration,
    deadline: Option<Instant>,
) -> Result<HashMap<String, Vec<String>>>
where
    P: ProteinIdService + ?Sized,
{
    let start = Instant::now();
    let stop = match deadline {
        Some(deadline) => deadline.min(start + timeout),
        None => start + timeout,
    };

    let results = tokio::time::timeout_at(stop, poll_job(service, job, interval))
        .await
        .map_err(|_| Error::Timeout {
            what: format!("id mapping of {} ids", job.ids.len()),
            elapsed: start.elapsed(),
        })??;

    let mut mapping: HashMap<String, Vec<String>> = HashMap::new();
    for IdMapping { from, to } in results {
        mapping.entry(from).or_default().push(to.as_str().to_string());
    }
    Ok(mapping)
}

#[cfg(test)]
pub(crate) mod test {
    use std::cell::Cell;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::{IdMapping, JobStatus, MappedId, MappingJob, ProteinIdService};
    use crate::error::{Error, Result};

    /// Reports "RUNNING" for `pending` polls, then the configured outcome.
    pub(crate) struct FakeMapper {
        pub pending: usize,
        pub failed: bool,
        pub results: Vec<(String, String)>,
        pub polls: Cell<usize>,
    }

    impl FakeMapper {
        pub fn new(pending: usize, results: &[(&str, &str)]) -> Self {
            Self {
                pending,
                failed: false,
                results: results
                    .iter()
                    .map(|(from, to)| (from.to_string(), to.to_string()))
                    .collect(),
                polls: Cell::new(0),
            }
        }
    }

    impl ProteinIdService for FakeMapper {
        async fn submit(&self, job: &MappingJob) -> Result<String> {
            assert_eq!(job.to, super::TO_SWISSPROT);
            Ok(String::from("job-1"))
        }

        async fn status(&self, job_id: &str) -> Result<JobStatus> {
            assert_eq!(job_id, "job-1");
            let polls = self.polls.get() + 1;
            self.polls.set(polls);
            if polls <= self.pending {
                return Ok(JobStatus {
                    job_status: Some(String::from("RUNNING")),
                    results: None,
                });
            }
            if self.failed {
                return Ok(JobStatus {
                    job_status: Some(String::from("FAILED")),
                    results: None,
                });
            }
            Ok(JobStatus {
                job_status: None,
                results: Some(
                    self.results
                        .iter()
                        .map(|(from, to)| IdMapping {
                            from: from.clone(),
                            to: MappedId::Id(to.clone()),
                        })
                        .collect(),
                ),
            })
        }
    }

    fn job() -> MappingJob {
        MappingJob::ensembl_to_swissprot(vec!["ENSG1".into(), "ENSG2".into()])
    }

    #[test]
    fn deserialize_status() -> Result<(), anyhow::Error> {
        let running: JobStatus = serde_json::from_str(r#"{"jobStatus": "RUNNING"}"#)?;
        assert_eq!(running.results, None);

        let finished: JobStatus = serde_json::from_str(
            r#"{"results": [
                {"from": "ENSG1", "to": "P12345"},
                {"from": "ENSG2", "to": {"primaryAccession": "Q99999", "entryType": "reviewed"}}
            ]}"#,
        )?;
        let results = finished.results.unwrap_or_default();
        assert_eq!(results[0].to.as_str(), "P12345");
        assert_eq!(results[1].to.as_str(), "Q99999");

        Ok(())
    }

    #[tokio::test]
    async fn polls_until_results() -> Result<(), Error> {
        let mapper = FakeMapper::new(
            2,
            &[("ENSG1", "P12345"), ("ENSG1", "P12346"), ("ENSG2", "Q99999")],
        );
        let mapping = super::get_protein_ids(
            &mapper,
            &job(),
            Duration::from_millis(1),
            Duration::from_secs(10),
            None,
        )
        .await?;

        assert_eq!(mapper.polls.get(), 3);
        assert_eq!(mapping["ENSG1"], vec!["P12345", "P12346"]);
        assert_eq!(mapping["ENSG2"], vec!["Q99999"]);

        Ok(())
    }

    #[tokio::test]
    async fn poll_timeout() {
        let mapper = FakeMapper::new(usize::MAX, &[]);
        let result = super::get_protein_ids(
            &mapper,
            &job(),
            Duration::from_millis(5),
            Duration::from_millis(30),
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
    }

    #[tokio::test]
    async fn deadline_before_timeout() {
        let mapper = FakeMapper::new(usize::MAX, &[]);
        let deadline = tokio::time::Instant::now() + Duration::from_millis(20);
        let result = super::get_protein_ids(
            &mapper,
            &job(),
            Duration::from_millis(5),
            Duration::from_secs(60),
            Some(deadline),
        )
        .await;

        match result {
            Err(Error::Timeout { elapsed, .. }) => assert!(elapsed < Duration::from_secs(60)),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_job() {
        let mut mapper = FakeMapper::new(1, &[]);
        mapper.failed = true;
        let result = super::get_protein_ids(
            &mapper,
            &job(),
            Duration::from_millis(1),
            Duration::from_secs(10),
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::Remote(_))));
    }

    #[test]
    fn client_requests() -> Result<(), anyhow::Error> {
        let client = super::UniprotClient::new(
            crate::remote::build_client()?,
            super::DEFAULT_BASE_URL,
        );

        let request = client.submit_request(&job())?;
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://rest.uniprot.org/idmapping/run"
        );
        assert_eq!(
            request.headers()[reqwest::header::CONTENT_TYPE].to_str()?,
            "application/x-www-form-urlencoded"
        );
        assert_eq!(
            request.body().and_then(|body| body.as_bytes()),
            Some(&b"from=Ensembl&to=UniProtKB-Swiss-Prot&ids=ENSG1%2CENSG2"[..])
        );

        let request = client.status_request("job-1")?;
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "https://rest.uniprot.org/idmapping/status/job-1"
        );
        assert!(request.body().is_none());

        Ok(())
    }
}
