//! Contig name harmonization.

/// Name of the mitochondrial contig as used by Ensembl.
const MITOCHONDRIAL: &str = "MT";

/// Return the contig name as expected by Ensembl services.
///
/// Any leading "chr" prefix is removed (case-insensitive), e.g., "chr1" becomes "1" and "chrX"
/// becomes "X".  The UCSC-style mitochondrial name "M" is mapped to "MT".
pub fn ensembl_name(name: &str) -> &str {
    let stripped = match name.get(..3) {
        Some(prefix) if prefix.eq_ignore_ascii_case("chr") && name.len() > 3 => &name[3..],
        _ => name,
    };
    if stripped == "M" {
        MITOCHONDRIAL
    } else {
        stripped
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("chr1", "1")]
    #[case("1", "1")]
    #[case("chrX", "X")]
    #[case("CHR22", "22")]
    #[case("chrM", "MT")]
    #[case("chrMT", "MT")]
    #[case("MT", "MT")]
    #[case("chr", "chr")]
    #[case("GL000192.1", "GL000192.1")]
    fn ensembl_name(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(super::ensembl_name(name), expected);
    }
}
