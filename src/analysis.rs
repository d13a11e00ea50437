//! Text analysis collaborators.
//!
//! The accumulators consume token sequences; this module supplies the small
//! pieces that turn raw text into tokens and that classify tokens for
//! vocabulary filtering.

pub mod classifier;
pub mod tokenizer;
