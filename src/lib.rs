//! Narratological - structural diagnostics for scripts and stories
//!
//! Scores how tightly a story is built (causal binding, reorderability,
//! necessity, information economy) and checks it against the diagnostic
//! questions of narratological studies.

pub mod cli;
pub mod compendium;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod llm;
pub mod models;
pub mod parsers;
pub mod reporters;
