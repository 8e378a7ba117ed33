use std::path::{Path, PathBuf};

use common::error::EngineError;
use common::types::Chunk;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Serialize, Deserialize)]
struct JournalRecord {
    id: String,
    doc_id: String,
    text: String,
    language: String,
}

impl From<&Chunk> for JournalRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            doc_id: chunk.doc_id.clone(),
            text: chunk.text.clone(),
            language: chunk.language.as_str().to_string(),
        }
    }
}

/// Local durable record of every ingested chunk's `{id, doc_id, text, language}`, so the Sparse
/// Index can be rebuilt after a restart without re-hitting the Graph Store. Append-only; admin
/// reset truncates it.
pub struct ChunkJournal {
    path: PathBuf,
    enabled: bool,
}

impl ChunkJournal {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self { path: path.into(), enabled }
    }

    #[tracing::instrument(skip(self, chunks))]
    pub async fn append(&self, chunks: &[Chunk]) -> Result<(), EngineError> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        let mut buffer = String::new();
        for chunk in chunks {
            buffer.push_str(&serde_json::to_string(&JournalRecord::from(chunk))?);
            buffer.push('\n');
        }
        file.write_all(buffer.as_bytes()).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<Vec<Chunk>, EngineError> {
        if !self.enabled || !Path::new(&self.path).exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        let mut chunks = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: JournalRecord = serde_json::from_str(line)?;
            let language = common::language::Language::new(&record.language)
                .map_err(EngineError::InvalidRequest)?;
            // Ordinal is not retained in the journal; rebuild keys the Sparse Index purely by
            // `id`, so the ordinal field here is cosmetic and not load-bearing for correctness.
            let ordinal = record
                .id
                .rsplit("_chunk_")
                .next()
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(0);
            chunks.push(Chunk::new(&record.doc_id, ordinal, record.text, language));
        }
        Ok(chunks)
    }

    #[tracing::instrument(skip(self))]
    pub async fn truncate(&self) -> Result<(), EngineError> {
        if !self.enabled {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, b"").await?;
        Ok(())
    }
}
