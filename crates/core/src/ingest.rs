use crate::models::{DocumentFingerprint, PdfSource};
use crate::IngestError;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Reads every path into a [`PdfSource`]. Directories are searched recursively
/// for `.pdf` files; plain files are taken as given, whatever their extension.
pub fn load_pdf_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PdfSource>, IngestError> {
    let mut sources = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let files = if path.is_dir() {
            let found = discover_pdf_files(path);
            if found.is_empty() {
                return Err(IngestError::InvalidArgument(format!(
                    "no pdf files found in {}",
                    path.display()
                )));
            }
            found
        } else {
            vec![path.to_path_buf()]
        };

        for file in files {
            let bytes = fs::read(&file)?;
            sources.push(PdfSource::new(file.to_string_lossy(), bytes));
        }
    }

    Ok(sources)
}

pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn fingerprint(source: &PdfSource, page_count: usize, char_count: usize) -> DocumentFingerprint {
    let checksum = digest_bytes(&source.bytes);

    let mut hasher = Sha256::new();
    hasher.update(source.name.as_bytes());
    hasher.update(checksum.as_bytes());

    DocumentFingerprint {
        document_id: format!("{:x}", hasher.finalize()),
        name: source.name.clone(),
        checksum,
        page_count,
        char_count,
        ingested_at: Utc::now(),
    }
}
