//! Single-record sequence input.
//!
//! Accepts an optional `>name` header followed by one or more sequence
//! lines. Only one record is allowed per job.

use crate::utils::config::ALLOWED_RESIDUES;
use crate::utils::error::{ConvertError, ValidationError};
use std::collections::BTreeSet;
use std::io::BufRead;

/// Name and residues of the molecule being simulated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    pub name: Option<String>,
    pub sequence: String,
}

/// Read exactly one sequence record
///
/// **Public** - input of every conversion job
///
/// # Errors
/// * `ValidationError::MultipleRecords` - a second header, or a header after
///   sequence lines
/// * `ValidationError::UnsupportedCharacters` - residues outside `ACGUNT`
/// * `ValidationError::EmptySequence` - no residues at all
pub fn read_sequence_record(reader: impl BufRead) -> Result<SequenceRecord, ConvertError> {
    let mut name: Option<String> = None;
    let mut sequence = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            if name.is_some() || !sequence.is_empty() {
                return Err(ValidationError::MultipleRecords(header.to_string()).into());
            }
            name = header.split_whitespace().next().map(str::to_string);
            continue;
        }

        let unsupported: BTreeSet<char> = line
            .chars()
            .filter(|c| !ALLOWED_RESIDUES.contains(*c))
            .collect();
        if !unsupported.is_empty() {
            let listed: String = unsupported.into_iter().collect();
            return Err(ValidationError::UnsupportedCharacters(listed).into());
        }
        sequence.push_str(line);
    }

    if sequence.is_empty() {
        return Err(ValidationError::EmptySequence.into());
    }

    Ok(SequenceRecord { name, sequence })
}
