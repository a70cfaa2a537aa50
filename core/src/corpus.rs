//! Loading documents from JSON and JSONL files.
//!
//! A `.json` file holds one document object or an array of them; a `.jsonl`
//! file holds one object per line. Directories are walked recursively.

use crate::document::DocumentStatus;
use crate::server::SearchServer;
use crate::DocId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDoc {
    pub id: DocId,
    #[serde(alias = "body")]
    pub text: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub ratings: Vec<i32>,
}

/// Reads every document under `path`, files in path order.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<InputDoc>> {
    let mut docs = Vec::new();
    for file in corpus_files(path.as_ref()) {
        let is_jsonl = file.extension().and_then(|s| s.to_str()) == Some("jsonl");
        if is_jsonl {
            read_jsonl(&file, &mut docs)?;
        } else {
            read_json(&file, &mut docs)?;
        }
    }
    Ok(docs)
}

/// Adds `docs` in order, stopping at the first rejected document.
pub fn index_documents(server: &mut SearchServer, docs: &[InputDoc]) -> Result<usize> {
    for doc in docs {
        server
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("failed to index document {}", doc.id))?;
    }
    tracing::info!(documents = docs.len(), total = server.document_count(), "corpus indexed");
    Ok(docs.len())
}

fn corpus_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")))
        .collect();
    files.sort();
    files
}

fn read_jsonl(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let reader = BufReader::new(f);
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: malformed document", file.display(), line_no + 1))?;
        docs.push(doc);
    }
    Ok(())
}

fn read_json(file: &Path, docs: &mut Vec<InputDoc>) -> Result<()> {
    let f = File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("{}: invalid JSON", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                docs.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => docs.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping file without document objects"),
    }
    Ok(())
}
