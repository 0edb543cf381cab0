pub mod accounting;
pub mod filter;
pub mod location;
pub mod main_helper;
pub mod record;
pub mod tokenizer;
pub mod types;

pub use types::*;

pub use filter::{FilterConfig, RecordFilter, TokenCountFilter};
pub use location::{Location, LocationSpec};
pub use main_helper::{Args, PipelineSummary};
pub use record::Record;
pub use tokenizer::Tokenizer;
