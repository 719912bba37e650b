//! Loading the document corpus from disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use bankqa_rag::Document;
use tracing::{debug, info};

const EXTENSIONS: &[&str] = &["txt", "md", "pdf"];

/// Read every `.txt`, `.md` and `.pdf` file under `paths` as a [`Document`].
///
/// Directories are walked recursively. Documents are keyed by file stem and
/// returned sorted by id so the corpus version does not depend on directory
/// iteration order. PDF files contribute their extracted text.
pub fn load_corpus(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut files = Vec::new();
    for path in paths {
        collect_files(path, &mut files)?;
    }

    let mut documents: BTreeMap<String, Document> = BTreeMap::new();
    for file in files {
        let id = file
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("invalid file name: {}", file.display()))?
            .to_string();
        let text = read_text(&file)?;
        if let Some(existing) = documents.get(&id) {
            bail!("duplicate document id '{id}': {} and {}", existing.source, file.display());
        }
        debug!(document.id = %id, bytes = text.len(), "loaded document");
        documents.insert(id.clone(), Document::new(id, text, file.display().to_string()));
    }

    if documents.is_empty() {
        bail!("no .txt, .md or .pdf documents found in the corpus paths");
    }
    info!(document_count = documents.len(), "corpus loaded");
    Ok(documents.into_values().collect())
}

fn read_text(file: &Path) -> Result<String> {
    if has_extension(file, "pdf") {
        pdf_extract::extract_text(file)
            .map_err(|e| anyhow!("failed to extract text from {}: {e}", file.display()))
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
    }
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    if path.is_dir() {
        let mut entries = std::fs::read_dir(path)
            .with_context(|| format!("failed to list {}", path.display()))?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        for entry in entries {
            collect_files(&entry, files)?;
        }
    } else if !path.is_file() {
        bail!("corpus path does not exist: {}", path.display());
    } else if EXTENSIONS.iter().any(|ext| has_extension(path, ext)) {
        files.push(path.to_path_buf());
    }
    Ok(())
}
