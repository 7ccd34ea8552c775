pub mod cli;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod search;
pub mod tracing;
pub mod worker;

pub use config::SearchConfig;
pub use corpus::{EntryRef, Ref, SearchData};
pub use engine::{RankedOutcome, SearchEngine, SearchOutcome};
pub use error::{InitError, QueryParseError, SearchError};
pub use search::{Language, SearchHit, SynonymTable};
pub use worker::{Request, RequestId, Response, SearchSession, WorkerHandle, spawn_search_worker};
