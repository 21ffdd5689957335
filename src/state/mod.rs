//! State module for tracking per-document progress
//!
//! Nothing here is persisted: the text file on disk is the only record of
//! completion, and `DocumentOutcome` describes what one worker did with one
//! document during the current run.

mod document_outcome;

pub use document_outcome::DocumentOutcome;
