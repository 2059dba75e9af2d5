//! Selection of one transcript consequence per variant.

use strum::{Display, EnumString, VariantArray};

use crate::remote::vep::TranscriptConsequence;

/// Pick the transcript consequence a record is built from.
pub trait SelectTranscript {
    /// Return the selected consequence from the service-ordered list, if any qualifies.
    fn select<'a>(
        &self,
        consequences: &'a [TranscriptConsequence],
    ) -> Option<&'a TranscriptConsequence>;
}

/// Named transcript selection policies.
///
/// All policies take the first eligible consequence in service order; there is no secondary
/// ranking.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Display,
    EnumString,
    VariantArray,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TranscriptSelection {
    /// First eligible consequence, dropped if its prediction is not high-impact.
    #[default]
    FirstEligibleHighImpact,
    /// First eligible consequence, whatever its prediction.
    FirstEligible,
}

/// Whether the consequence can be used for a record at all: it has a protein accession and a
/// prediction.
pub fn is_eligible(consequence: &TranscriptConsequence) -> bool {
    consequence.has_protein_accession() && consequence.has_prediction()
}

impl SelectTranscript for TranscriptSelection {
    fn select<'a>(
        &self,
        consequences: &'a [TranscriptConsequence],
    ) -> Option<&'a TranscriptConsequence> {
        let first = consequences.iter().find(|tc| is_eligible(tc));
        match self {
            TranscriptSelection::FirstEligibleHighImpact => first.filter(|tc| tc.is_high_impact()),
            TranscriptSelection::FirstEligible => first,
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use strum::VariantArray;

    use super::{SelectTranscript, TranscriptSelection};
    use crate::remote::vep::TranscriptConsequence;

    fn tc(
        id: &str,
        swissprot: bool,
        sift: Option<&str>,
        polyphen: Option<&str>,
    ) -> TranscriptConsequence {
        TranscriptConsequence {
            transcript_id: Some(id.into()),
            swissprot: if swissprot {
                vec![String::from("P12345")]
            } else {
                Vec::new()
            },
            sift_prediction: sift.map(Into::into),
            polyphen_prediction: polyphen.map(Into::into),
            ..Default::default()
        }
    }

    fn consequences() -> Vec<TranscriptConsequence> {
        vec![
            tc("no-accession", false, Some("deleterious"), None),
            tc("no-prediction", true, None, None),
            tc("tolerated", true, Some("tolerated"), Some("benign")),
            tc("damaging", true, Some("tolerated"), Some("probably_damaging")),
            tc("deleterious", true, Some("deleterious"), None),
        ]
    }

    #[rstest::rstest]
    #[case(TranscriptSelection::FirstEligibleHighImpact, 2, None)]
    #[case(TranscriptSelection::FirstEligible, 2, Some("tolerated"))]
    #[case(TranscriptSelection::FirstEligibleHighImpact, 3, Some("damaging"))]
    #[case(TranscriptSelection::FirstEligible, 3, Some("damaging"))]
    fn select(
        #[case] policy: TranscriptSelection,
        #[case] skip: usize,
        #[case] expected: Option<&str>,
    ) {
        let mut consequences = consequences();
        // Keep the two ineligible consequences in front.
        consequences.drain(2..skip);
        assert_eq!(
            policy
                .select(&consequences)
                .and_then(|tc| tc.transcript_id.as_deref()),
            expected
        );
    }

    #[test]
    fn no_secondary_ranking() {
        let consequences = vec![
            tc("first", true, Some("tolerated"), None),
            tc("second", true, Some("deleterious"), None),
        ];
        for policy in TranscriptSelection::VARIANTS {
            let selected = policy.select(&consequences);
            assert!(selected.is_none() || selected == consequences.first());
        }
        assert_eq!(
            TranscriptSelection::default().select(&consequences),
            None
        );
    }

    #[rstest::rstest]
    #[case(TranscriptSelection::FirstEligibleHighImpact)]
    #[case(TranscriptSelection::FirstEligible)]
    fn select_none(#[case] policy: TranscriptSelection) {
        assert_eq!(policy.select(&[]), None);
        assert_eq!(policy.select(&consequences()[..2]), None);
    }

    #[test]
    fn names() -> Result<(), anyhow::Error> {
        assert_eq!(
            TranscriptSelection::default(),
            TranscriptSelection::FirstEligibleHighImpact
        );
        for policy in TranscriptSelection::VARIANTS {
            assert_eq!(policy.to_string().parse::<TranscriptSelection>()?, *policy);
        }
        assert_eq!(
            TranscriptSelection::FirstEligibleHighImpact.to_string(),
            "first-eligible-high-impact"
        );

        Ok(())
    }
}
