//! Field extraction: pattern tables, model prompting, and merging.

pub mod merge;
pub mod model;
pub mod patterns;
pub mod prompt;
pub mod rules;

pub use merge::{MergePolicy, merge};
pub use model::{ModelExtraction, ModelExtractor, ModelOutcome, parse_model_response};
pub use prompt::user_prompt;
pub use rules::PatternExtractor;
