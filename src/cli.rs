use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "docsearch")]
#[command(about = "Full-text search over a documentation corpus", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one query against a corpus file and print ranked results
    Search(SearchArgs),
    /// Serve the worker protocol as newline-delimited JSON over stdin/stdout
    Serve,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    /// Corpus JSON with `documents` and `parameters`
    #[arg(short, long)]
    pub corpus: PathBuf,
    /// Site language tag; `ru` enables Russian stemming
    #[arg(short, long, default_value = "en")]
    pub lang: String,
    /// Synonym table, TOML or JSON by extension
    #[arg(short, long)]
    pub synonyms: Option<PathBuf>,
    #[arg(short = 'n', long, default_value = "25")]
    pub limit: usize,
    /// Print the raw SEARCH_RESULT-shaped outcome as JSON
    #[arg(long)]
    pub json: bool,
}
