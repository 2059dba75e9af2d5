//! Random-access reading of variant records from an indexed VCF file.
//!
//! The reader needs three capabilities from the underlying file pair, captured by the
//! [`IndexedSource`] trait: reading the header, listing the reference sequences known to the
//! index, and querying the records of one reference sequence through the index.
//! [`crate::common::noodles::TabixSource`] implements it for bgzip-compressed, tabix-indexed
//! files.

use noodles::vcf;
use noodles::vcf::variant::record::AlternateBases as _;

use crate::error::{Error, Result};

/// The fields of one VCF data line needed for consequence queries.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VariantRecord {
    /// Reference sequence name as written in the file.
    pub chrom: String,
    /// 1-based position of the first reference base.
    pub pos: usize,
    /// Variant identifier, `None` if the file has `.`.
    pub id: Option<String>,
    /// Reference allele.
    pub reference: String,
    /// Alternate alleles, empty if the file has `.`.
    pub alternates: Vec<String>,
}

impl TryFrom<&vcf::Record> for VariantRecord {
    type Error = Error;

    fn try_from(record: &vcf::Record) -> Result<Self> {
        let chrom = record.reference_sequence_name().to_string();
        let pos = record
            .variant_start()
            .transpose()
            .map_err(Error::from_read)?
            .ok_or_else(|| {
                Error::format(format!("telomeric record on {} is not supported", chrom))
            })?
            .get();
        let ids = record.ids();
        let id = Some(ids.as_ref())
            .filter(|ids| !ids.is_empty())
            .map(str::to_string);
        let alternates = record
            .alternate_bases()
            .iter()
            .map(|allele| allele.map(str::to_string))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(Error::from_read)?;

        Ok(Self {
            chrom,
            pos,
            id,
            reference: record.reference_bases().to_string(),
            alternates,
        })
    }
}

/// Rebuild the tab-separated text of `record` from its raw fields.
///
/// Missing values are written as `.`; the quality is written as parsed.
pub fn raw_line(record: &vcf::Record) -> Result<String> {
    fn or_missing(field: &str) -> &str {
        if field.is_empty() {
            "."
        } else {
            field
        }
    }

    let pos = match record.variant_start().transpose().map_err(Error::from_read)? {
        Some(pos) => pos.get(),
        None => 0,
    };
    let quality = match record.quality_score().transpose().map_err(Error::from_read)? {
        Some(quality) => quality.to_string(),
        None => String::from("."),
    };
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        record.reference_sequence_name(),
        pos,
        or_missing(record.ids().as_ref()),
        record.reference_bases(),
        or_missing(record.alternate_bases().as_ref()),
        quality,
        or_missing(record.filters().as_ref()),
        or_missing(record.info().as_ref()),
    );
    let samples = record.samples();
    if !samples.as_ref().is_empty() {
        line.push('\t');
        line.push_str(samples.as_ref());
    }
    Ok(line)
}

/// Boxed iterator over the records returned by an [`IndexedSource`] query.
pub type RawRecords<'a> = Box<dyn Iterator<Item = Result<vcf::Record>> + 'a>;

/// A position-sorted variant file together with its block index.
pub trait IndexedSource {
    /// Read and parse the VCF header.
    fn read_header(&mut self) -> Result<vcf::Header>;

    /// Names of the reference sequences known to the index, in index order.
    fn reference_names(&self) -> Vec<String>;

    /// Stream the records on `reference` in file order.
    fn query<'a>(&'a mut self, header: &'a vcf::Header, reference: &str)
        -> Result<RawRecords<'a>>;
}

/// Read the records of `source` across all reference sequences, in index order.
///
/// A record is kept if `text_filter` is unset or is a literal substring of its line (see
/// [`raw_line`]).  Records are streamed from the source; no further records are read and no
/// further reference sequences are queried once `limit` records have been kept.
///
/// # Errors
///
/// `Config` if `limit` is zero, `Format` if the header or a record cannot be parsed or the index
/// knows no reference sequences, `Io` if the source cannot be read.
pub fn read<S: IndexedSource + ?Sized>(
    source: &mut S,
    limit: Option<usize>,
    text_filter: Option<&str>,
) -> Result<Vec<VariantRecord>> {
    if limit == Some(0) {
        return Err(Error::config("limit must be at least 1"));
    }
    let header = source.read_header()?;
    let names = source.reference_names();
    if names.is_empty() {
        return Err(Error::format("index declares no reference sequences"));
    }
    tracing::debug!("index knows {} reference sequences", names.len());

    let mut records = Vec::new();
    for name in &names {
        tracing::trace!("reading records of reference sequence {}", name);
        for record in source.query(&header, name)? {
            let record = record?;
            if let Some(filter) = text_filter {
                if !raw_line(&record)?.contains(filter) {
                    continue;
                }
            }
            records.push(VariantRecord::try_from(&record)?);
            if limit.is_some_and(|limit| records.len() >= limit) {
                return Ok(records);
            }
        }
    }
    Ok(records)
}
