//! Helper code for using noodles.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use noodles::core::Region;
use noodles::csi::BinningIndex as _;
use noodles::{bgzf, tabix, vcf};

use crate::error::{Error, Result};
use crate::reader::{IndexedSource, RawRecords};

/// Bgzip-compressed VCF file with its tabix index.
pub struct TabixSource<R> {
    reader: vcf::io::IndexedReader<bgzf::io::Reader<R>>,
    /// Reference sequence names from the index header, in index order.
    names: Vec<String>,
}

impl TabixSource<File> {
    /// Open the VCF file at `path` and its index.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the bgzip-compressed VCF file.
    /// * `index_path` - Path to the tabix index, defaults to `{path}.tbi`.
    pub fn from_path<P>(path: P, index_path: Option<&Path>) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let index_path = index_path.map(Path::to_path_buf).unwrap_or_else(|| {
            let mut p = path.as_ref().as_os_str().to_owned();
            p.push(".tbi");
            PathBuf::from(p)
        });
        tracing::debug!(
            "Opening {} with index {}",
            path.as_ref().display(),
            index_path.display()
        );
        let index = tabix::fs::read(&index_path).map_err(Error::from_read)?;
        Ok(Self::new(File::open(path.as_ref())?, index))
    }
}

impl<R: Read> TabixSource<R> {
    /// Construct from a bgzip-compressed VCF stream and its tabix index.
    pub fn new(inner: R, index: tabix::Index) -> Self {
        let names = index
            .header()
            .map(|header| {
                header
                    .reference_sequence_names()
                    .iter()
                    .map(|name| name.to_string())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            reader: vcf::io::IndexedReader::new(inner, index),
            names,
        }
    }
}

impl<R: Read + Seek> IndexedSource for TabixSource<R> {
    fn read_header(&mut self) -> Result<vcf::Header> {
        self.reader.read_header().map_err(Error::from_read)
    }

    fn reference_names(&self) -> Vec<String> {
        self.names.clone()
    }

    fn query<'a>(
        &'a mut self,
        header: &'a vcf::Header,
        reference: &str,
    ) -> Result<RawRecords<'a>> {
        if !self.names.iter().any(|name| name == reference) {
            return Ok(Box::new(std::iter::empty()));
        }
        let region = Region::new(reference, ..);
        let query = self
            .reader
            .query(header, &region)
            .map_err(Error::from_read)?;
        Ok(Box::new(query.map(|record| record.map_err(Error::from_read))))
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::TabixSource;
    use crate::error::Error;
    use crate::reader::IndexedSource;

    const PATH: &str = "tests/data/example.vcf.gz";

    #[test]
    fn reference_names() -> Result<(), Error> {
        let source = TabixSource::from_path(PATH, None)?;
        assert_eq!(
            source.reference_names(),
            vec!["chr1".to_string(), "chr2".to_string()]
        );

        Ok(())
    }

    #[test]
    fn read_header() -> Result<(), Error> {
        let mut source = TabixSource::from_path(PATH, None)?;
        let header = source.read_header()?;
        assert_eq!(
            header.contigs().keys().map(|name| name.as_str()).collect::<Vec<_>>(),
            vec!["chr1", "chr2"]
        );
        assert!(header.infos().contains_key("GENE"));

        Ok(())
    }

    #[test]
    fn query_reference() -> Result<(), Error> {
        let mut source = TabixSource::from_path(PATH, None)?;
        let header = source.read_header()?;

        let positions = source
            .query(&header, "chr1")?
            .map(|record| -> Result<_, Error> {
                Ok(record?.variant_start().transpose()?.map(|pos| pos.get()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(positions, vec![Some(100), Some(200), Some(300), Some(1000)]);

        let names = source
            .query(&header, "chr2")?
            .map(|record| -> Result<_, Error> {
                Ok(record?.reference_sequence_name().to_string())
            })
            .collect::<Result<Vec<_>, _>>()?;
        assert_eq!(names, vec!["chr2", "chr2"]);

        Ok(())
    }

    #[test]
    fn query_unknown_reference() -> Result<(), Error> {
        let mut source = TabixSource::from_path(PATH, None)?;
        let header = source.read_header()?;
        assert_eq!(source.query(&header, "chr3")?.count(), 0);

        Ok(())
    }

    #[test]
    fn read_through_source() -> Result<(), Error> {
        let mut source = TabixSource::from_path(PATH, None)?;
        let records = crate::reader::read(&mut source, Some(5), None)?;
        assert_eq!(records.len(), 5);
        assert_eq!(records[4].chrom, "chr2");
        assert_eq!(records[4].pos, 50);
        assert_eq!(records[4].id.as_deref(), Some("rs2"));

        let records = crate::reader::read(
            &mut TabixSource::from_path(PATH, None)?,
            None,
            Some("GENE=BRCA2"),
        )?;
        assert_eq!(
            records.iter().map(|r| r.pos).collect::<Vec<_>>(),
            vec![200, 50]
        );

        Ok(())
    }

    #[test]
    fn missing_index() {
        let result = TabixSource::from_path(PATH, Some(std::path::Path::new("does/not/exist")));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
