//! Advisory text handling.
//!
//! - `parser`: segments generator output into an [`InsightRecord`]
//! - `prompt`: renders a [`UserProfile`] into the generator prompt
//!
//! [`InsightRecord`]: perkfinder_model::InsightRecord
//! [`UserProfile`]: perkfinder_model::UserProfile

pub mod parser;
pub mod prompt;

pub use parser::{parse, parse_with, ParseMode};
pub use prompt::{build_prompt, PromptConfig, SYSTEM_INSTRUCTION};
