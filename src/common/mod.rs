//! Commonly used code.

use clap::Parser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::error::{Error, Result};

pub mod contig;
pub mod io;
pub mod noodles;

/// Commonly used command line arguments.
#[derive(Parser, Debug, Default)]
pub struct Args {
    /// Verbosity of the program
    #[clap(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

/// The species that is used when none is configured.
pub const DEFAULT_SPECIES: &str = "homo_sapiens";

/// Validated species name as understood by the Ensembl REST API (e.g., `homo_sapiens`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Species(String);

impl Species {
    /// Construct a new species, checking that it only consists of lower case letters and
    /// underscores.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty()
            || name.starts_with('_')
            || !name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
        {
            return Err(Error::config(format!("invalid species name: {:?}", name)));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Species {
    fn default() -> Self {
        Self(DEFAULT_SPECIES.to_string())
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Species {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Species {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Species> for String {
    fn from(value: Species) -> Self {
        value.0
    }
}

/// The version of `varstruct` package.
#[cfg(not(test))]
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// This allows us to override the version to `0.0.0` in tests.
pub fn version() -> &'static str {
    #[cfg(test)]
    return "0.0.0";
    #[cfg(not(test))]
    return VERSION;
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::Species;

    #[rstest::rstest]
    #[case("homo_sapiens", true)]
    #[case("mus_musculus", true)]
    #[case("human", true)]
    #[case("", false)]
    #[case("Homo_sapiens", false)]
    #[case("homo sapiens", false)]
    #[case("homo/sapiens", false)]
    #[case("_x", false)]
    fn species_new(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(Species::new(name).is_ok(), valid, "{:?}", name);
    }

    #[test]
    fn species_default() {
        assert_eq!(Species::default().as_str(), "homo_sapiens");
        assert_eq!(format!("{}", Species::default()), "homo_sapiens");
    }

    #[test]
    fn version() {
        assert_eq!(super::version(), "0.0.0");
    }
}
