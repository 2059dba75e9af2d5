//! Construction of iCn3D viewer URLs that highlight a mutation site.

use chrono::Datelike;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Default iCn3D entry point.
pub const DEFAULT_BASE_URL: &str = "https://www.ncbi.nlm.nih.gov/Structure/icn3d/full.html";

/// iCn3D version passed along with each command.
pub const DEFAULT_VERSION: &str = "3.40.1";

/// Characters escaped in keys and values, same as JavaScript `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Viewer parameters shared by all generated commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig {
    pub base_url: String,
    pub version: String,
    /// Date embedded into the commands.
    pub date: chrono::NaiveDate,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_VERSION.to_string(),
            date: chrono::Local::now().date_naive(),
        }
    }
}

impl ViewerConfig {
    /// Date as `YYYYMD` without zero padding.
    fn date_param(&self) -> String {
        format!(
            "{}{}{}",
            self.date.year(),
            self.date.month(),
            self.date.day()
        )
    }

    /// Command for an experimentally resolved structure chain.
    pub fn pdb_command(&self, pdb_id: &str, chain_id: &str, position: u32, after: &str) -> String {
        let key = format!("{}_{}", pdb_id.to_uppercase(), chain_id);
        let date = self.date_param();
        let command = script(&key, position, after);
        self.url(&[
            ("pdbid", &[pdb_id][..]),
            ("date", &[date.as_str()][..]),
            ("v", &[self.version.as_str()][..]),
            ("command", &[command.as_str()][..]),
        ])
    }

    /// Command for the AlphaFold model of a protein accession.
    pub fn alphafold_command(&self, accession: &str, position: u32, after: &str) -> String {
        let key = format!("{}_A", accession);
        let date = self.date_param();
        let command = script(&key, position, after);
        self.url(&[
            ("afid", &[accession][..]),
            ("date", &[date.as_str()][..]),
            ("v", &[self.version.as_str()][..]),
            ("command", &[command.as_str()][..]),
        ])
    }

    fn url(&self, params: &[(&str, &[&str])]) -> String {
        let query = params
            .iter()
            .map(|(key, values)| {
                let values = values
                    .iter()
                    .map(|value| utf8_percent_encode(value, COMPONENT).to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}={}", utf8_percent_encode(key, COMPONENT), values)
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.base_url, query)
    }
}

/// Viewer script: annotation panel, one track per predictor and the side chain interactions.
fn script(key: &str, position: u32, after: &str) -> String {
    [
        String::from("view annotations"),
        String::from("set annotation cdd"),
        String::from("set view detailed view"),
        format!(
            "add track | chainid {} | title SIFT_predict | text {} {}",
            key, position, after
        ),
        format!(
            "add track | chainid {} | title PolyPhen_predict | text {} {}",
            key, position, after
        ),
        format!("scap interaction {}_{}_{}", key, position, after),
    ]
    .join("; ")
}
