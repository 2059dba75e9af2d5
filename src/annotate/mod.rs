//! Assembly of annotated variants from consequence predictions and structure mappings.

use itertools::Itertools;

use crate::error::{Error, Result};
use crate::remote::pdbe::{StructureCandidate, StructureService};
use crate::remote::vep::{ConsequencePrediction, TranscriptConsequence};

pub mod cli;
pub mod icn3d;
pub mod select;

use icn3d::ViewerConfig;
use select::SelectTranscript;

/// Structure chain chosen for a record.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedStructure {
    /// `{pdb_id}_{chain_id}`
    pub id: String,
    pub pdb_id: String,
    pub chain_id: String,
    pub coverage: f64,
    pub resolution: Option<f64>,
}

impl From<&StructureCandidate> for SelectedStructure {
    fn from(candidate: &StructureCandidate) -> Self {
        Self {
            id: format!("{}_{}", candidate.pdb_id, candidate.chain_id),
            pdb_id: candidate.pdb_id.clone(),
            chain_id: candidate.chain_id.clone(),
            coverage: candidate.coverage,
            resolution: candidate.resolution,
        }
    }
}

/// Final output record for one variant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedVariant {
    /// The variant as sent to the consequence service.
    pub input: String,
    pub chrom: String,
    pub pos: usize,
    pub id: Option<String>,
    pub reference: String,
    pub alternates: Vec<String>,

    pub gene_id: Option<String>,
    pub gene_symbol: Option<String>,
    pub transcript_id: Option<String>,
    /// First protein accession without version suffix.
    pub protein_accession: String,
    /// Amino acid change as reported, e.g. `A/V`.
    pub amino_acids: String,
    pub protein_position: u32,
    /// Amino acid change in `A42V` notation.
    pub amino_acid_mutation: String,
    pub sift_prediction: Option<String>,
    pub sift_score: Option<f64>,
    pub polyphen_prediction: Option<String>,
    pub polyphen_score: Option<f64>,
    pub high_impact: bool,

    pub structure: Option<SelectedStructure>,
    /// Viewer command for the selected structure, empty if none.
    pub icn3d_pdb: String,
    /// Viewer command for the predicted structure of the protein, empty if not high-impact.
    pub icn3d_alphafold: String,
}

/// A record that was dropped because its data was malformed.
#[derive(Debug)]
pub struct RecordError {
    /// The variant as sent to the consequence service.
    pub input: String,
    pub error: Error,
}

/// Result of assembling one batch.
#[derive(Debug, Default)]
pub struct Assembled {
    pub records: Vec<AnnotatedVariant>,
    pub errors: Vec<RecordError>,
}

/// Strip a trailing version suffix (`.N`) from a protein accession.
pub fn normalize_accession(accession: &str) -> &str {
    match accession.rsplit_once('.') {
        Some((base, version))
            if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) =>
        {
            base
        }
        _ => accession,
    }
}

/// Split an `X/Y` amino acid change into its before and after parts.
pub fn split_amino_acids(amino_acids: &str) -> Result<(&str, &str)> {
    match amino_acids.split('/').collect::<Vec<_>>().as_slice() {
        [before, after] if !before.is_empty() && !after.is_empty() => Ok((*before, *after)),
        _ => Err(Error::format(format!(
            "amino acid change {:?} is not of the form X/Y",
            amino_acids
        ))),
    }
}

/// Build the record fields that depend only on the selected consequence.
fn build_record(
    prediction: &ConsequencePrediction,
    consequence: &TranscriptConsequence,
) -> Result<AnnotatedVariant> {
    let accession = consequence
        .swissprot
        .first()
        .ok_or_else(|| Error::format("consequence without protein accession"))?;
    let amino_acids = consequence
        .amino_acids
        .as_deref()
        .ok_or_else(|| Error::format("consequence without amino acid change"))?;
    let position = consequence
        .protein_start
        .ok_or_else(|| Error::format("consequence without protein position"))?;
    let (before, after) = split_amino_acids(amino_acids)?;

    let input = &prediction.input;
    Ok(AnnotatedVariant {
        input: input.to_string(),
        chrom: input.chrom.clone(),
        pos: input.pos,
        id: input.id.clone(),
        reference: input.reference.clone(),
        alternates: input.alternates.clone(),
        gene_id: consequence.gene_id.clone(),
        gene_symbol: consequence.gene_symbol.clone(),
        transcript_id: consequence.transcript_id.clone(),
        protein_accession: normalize_accession(accession).to_string(),
        amino_acids: amino_acids.to_string(),
        protein_position: position,
        amino_acid_mutation: format!("{}{}{}", before, position, after),
        sift_prediction: consequence.sift_prediction.clone(),
        sift_score: consequence.sift_score,
        polyphen_prediction: consequence.polyphen_prediction.clone(),
        polyphen_score: consequence.polyphen_score,
        high_impact: consequence.is_high_impact(),
        structure: None,
        icn3d_pdb: String::new(),
        icn3d_alphafold: String::new(),
    })
}

/// Joins consequence predictions with structure mappings.
pub struct Assembler<'a, S, P> {
    structures: &'a S,
    selection: P,
    viewer: &'a ViewerConfig,
}

impl<'a, S, P> Assembler<'a, S, P>
where
    S: StructureService,
    P: SelectTranscript,
{
    pub fn new(structures: &'a S, selection: P, viewer: &'a ViewerConfig) -> Self {
        Self {
            structures,
            selection,
            viewer,
        }
    }

    /// Assemble the records of one batch of predictions, in prediction order.
    ///
    /// Predictions without a selectable consequence are skipped.  Malformed consequences are
    /// skipped and reported in `Assembled::errors`.  The structure service is queried once for
    /// all distinct accessions; its failure fails the whole batch.
    pub async fn assemble(&self, predictions: &[ConsequencePrediction]) -> Result<Assembled> {
        let mut assembled = Assembled::default();
        for prediction in predictions {
            let Some(consequence) = self.selection.select(&prediction.transcript_consequences)
            else {
                tracing::trace!("no selectable consequence for {}", &prediction.input);
                continue;
            };
            match build_record(prediction, consequence) {
                Ok(record) => assembled.records.push(record),
                Err(error) => {
                    tracing::warn!("skipping {}: {}", &prediction.input, &error);
                    assembled.errors.push(RecordError {
                        input: prediction.input.to_string(),
                        error,
                    });
                }
            }
        }

        let accessions = assembled
            .records
            .iter()
            .map(|record| record.protein_accession.clone())
            .unique()
            .collect::<Vec<_>>();
        if accessions.is_empty() {
            return Ok(assembled);
        }
        let mapping = self.structures.best_structures(&accessions).await?;
        tracing::debug!(
            "structures known for {} of {} accessions",
            mapping.len(),
            accessions.len()
        );

        for record in assembled.records.iter_mut() {
            record.structure = mapping
                .get(&record.protein_accession)
                .and_then(|candidates| candidates.first())
                .map(SelectedStructure::from);

            if !record.high_impact {
                continue;
            }
            let after = record
                .amino_acids
                .split_once('/')
                .map(|(_, after)| after)
                .unwrap_or_default();
            if let Some(structure) = &record.structure {
                record.icn3d_pdb = self.viewer.pdb_command(
                    &structure.pdb_id,
                    &structure.chain_id,
                    record.protein_position,
                    after,
                );
            }
            record.icn3d_alphafold = self.viewer.alphafold_command(
                &record.protein_accession,
                record.protein_position,
                after,
            );
        }

        Ok(assembled)
    }
}
