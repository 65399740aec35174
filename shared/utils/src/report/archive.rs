//! Zip packaging of generated workbooks for download.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{CrosstabError, CrosstabResult};

pub const ARCHIVE_NAME: &str = "descarga_EB_y_EA.zip";

/// Zips the files in memory; entries are named by file name only.
pub fn zip_reports<P: AsRef<Path>>(paths: &[P]) -> CrosstabResult<Vec<u8>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in paths {
        let path = path.as_ref();
        let display = path.display().to_string();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CrosstabError::write(&display, "report path has no file name"))?;

        let data = fs::read(path).map_err(|e| CrosstabError::write(&display, e.to_string()))?;
        archive.start_file(name, options)?;
        archive
            .write_all(&data)
            .map_err(|e| CrosstabError::write(ARCHIVE_NAME, e.to_string()))?;
    }

    Ok(archive.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_entries_use_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let ea = dir.path().join("crosstabs_EA").join("a.xlsx");
        let eb = dir.path().join("crosstabs_EB").join("b.xlsx");
        for (path, body) in [(&ea, "first"), (&eb, "second")] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        let bytes = zip_reports(&[&eb, &ea]).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive.by_name("b.xlsx").unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "second");
        assert_eq!(archive.by_name("a.xlsx").unwrap().compression(), CompressionMethod::Deflated);
    }

    #[test]
    fn test_missing_file_is_write_error() {
        let err = zip_reports(&[Path::new("/nonexistent/report.xlsx")]).unwrap_err();
        assert_eq!(err.error_code(), "WRITE_ERROR");
    }

    #[test]
    fn test_empty_archive() {
        let paths: [&Path; 0] = [];
        let bytes = zip_reports(&paths).unwrap();
        assert_eq!(ZipArchive::new(Cursor::new(bytes)).unwrap().len(), 0);
    }
}
