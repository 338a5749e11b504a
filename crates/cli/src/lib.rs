//! CLI utilities for droidcfg
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Key/value report formatting

#![warn(missing_docs)]

pub mod output;
