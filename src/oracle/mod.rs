//! Query orchestration: retrieve verses for a question, gate on relevance, and compose
//! either a verse-grounded or a fallback prompt for generation.

mod engine;
pub mod gate;
pub mod lang;
mod passage;
mod prompt;

pub use engine::{DEFAULT_TOP_K, Oracle, OracleError};
pub use gate::{GatePolicy, RelevanceGate};
pub use lang::Lang;
