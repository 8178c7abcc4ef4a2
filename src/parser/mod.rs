//! Input parsing.
//!
//! This module handles:
//! - Reading the single-record sequence input
//! - Decoding Kinefold helix annotations and `*.rnm` logs
//! - Canonicalizing secondary-structure notation

pub mod fasta;
pub mod kinefold;
pub mod structure;

// Re-export main types
pub use fasta::{read_sequence_record, SequenceRecord};
pub use kinefold::{
    decode_snapshot, parse_annotation, read_kinefold_log, AnnotatedSnapshot, KinefoldEvent,
    KinefoldLog, SlotPool,
};
pub use structure::{pad_structure, pair_table, PairTableCanonicalizer, StructureCanonicalizer};
