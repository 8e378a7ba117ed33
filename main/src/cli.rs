use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::language::Language;
use retrieval::{Method, QueryRequest};

#[derive(Debug, Parser)]
#[command(name = "engine-cli", about = "Hybrid lexical/dense/graph retrieval engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a single file: parse, chunk, extract entities, and write all three indexes.
    Ingest {
        path: PathBuf,
    },
    /// Run a hybrid query and print the fused, ranked results.
    Query {
        text: String,
        #[arg(long, default_value_t = 10)]
        top_k: usize,
        #[arg(long)]
        language: Option<String>,
        /// Restrict to a subset of {sparse, dense, graph}; defaults to all three.
        #[arg(long, value_delimiter = ',')]
        methods: Vec<String>,
        #[arg(long, default_value_t = 60)]
        rrf_k: u32,
    },
    /// Drop all indexed data from every backend.
    Reset,
    /// Report per-component availability.
    Health,
}

impl Command {
    pub fn into_query_request(self) -> anyhow::Result<QueryRequest> {
        let Command::Query { text, top_k, language, methods, rrf_k } = self else {
            anyhow::bail!("into_query_request called on a non-Query command");
        };
        let mut request = QueryRequest::new(text);
        request.top_k = top_k;
        request.rrf_k = rrf_k;
        if let Some(tag) = language {
            request.language = Some(Language::new(tag).map_err(|e| anyhow::anyhow!(e))?);
        }
        for raw in methods {
            request.methods.push(Method::parse(raw.trim()).map_err(|e| anyhow::anyhow!(e.to_string()))?);
        }
        Ok(request)
    }
}
