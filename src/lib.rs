//! DrForna converters
//!
//! Resample the output of cotranscriptional folding simulators onto a
//! shared time grid and combine many runs into DrForna trajectory tables.
//!
//! Two simulators are supported:
//! - Kinefold, which writes annotated snapshot logs (`*.rnm`)
//! - Kinfold, which streams `structure energy time` events
//!
//! This crate provides the core implementation for the `drconvert` CLI
//! tool.
//!
//! ## Getting Started
//!
//! ```bash
//! drconvert kinfold --processes 8 --num 10 < hairpin.fa
//! drconvert combine --pattern 'drkinfold/hairpin.*.drf' --manifest hairpin.manifest.json
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod resample;
pub mod simulator;
pub mod utils;
