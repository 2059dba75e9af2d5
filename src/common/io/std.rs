//! Output files, optionally gzip-compressed.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::{write::GzEncoder, Compression};

/// Whether `path` names a gzip (or bgzip) file.
pub fn is_gz<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    matches!(
        path.as_ref().extension().and_then(|ext| ext.to_str()),
        Some("gz") | Some("bgz")
    )
}

/// Create the file at `path` for writing, gzip-compressing if [`is_gz`] says so.
///
/// The gzip trailer is written when the returned writer is dropped.
pub fn open_write_maybe_gz<P>(path: P) -> Result<Box<dyn Write>, anyhow::Error>
where
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    if is_gz(path.as_ref()) {
        tracing::debug!("writing gzip output to {}", path.as_ref().display());
        Ok(Box::new(GzEncoder::new(file, Compression::default())))
    } else {
        tracing::debug!("writing plain output to {}", path.as_ref().display());
        Ok(Box::new(file))
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    #[rstest::rstest]
    #[case("out.jsonl", false)]
    #[case("out.jsonl.gz", true)]
    #[case("out.jsonl.bgz", true)]
    #[case("gz", false)]
    fn is_gz(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(super::is_gz(path), expected);
    }

    #[rstest::rstest]
    #[case("records.jsonl")]
    #[case("records.jsonl.gz")]
    fn gzip_magic(#[case] filename: &str) -> Result<(), anyhow::Error> {
        let tmp_dir = temp_testdir::TempDir::default();
        let path = tmp_dir.join(filename);

        {
            let mut writer = super::open_write_maybe_gz(&path)?;
            writer.write_all(b"{}\n")?;
        }

        let raw = std::fs::read(&path)?;
        assert_eq!(super::is_gz(filename), raw.starts_with(&[0x1f, 0x8b]));

        Ok(())
    }
}
