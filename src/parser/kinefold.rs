//! Kinefold snapshot parser.
//!
//! Kinefold prints each intermediate structure as two aligned lines. The
//! first interleaves nucleotides with helix markers, the second carries the
//! helix identifiers under the markers:
//!
//! ```text
//!  A U[C G G G G G]C U C U[G U U G]G U U[C U C C C G^C A A C]G C U A C C
//!  - - -5- - - - - - - - - -6- - - - - - -5' - - - - -6' - - - - - - - -
//! ```
//!
//! `[` and `^` start a paired stretch whose helix id follows in the second
//! line, `]` starts an unpaired stretch. The first time an id is read its
//! helix opens, the second time it closes.
//!
//! This module also reads whole `*.rnm` logs into timed events.

use super::structure::StructureCanonicalizer;
use crate::utils::config::{HELIX_ID_SEPARATORS, HELIX_SLOTS};
use crate::utils::error::{ConsistencyError, ConvertError, ValidationError};
use log::debug;
use std::collections::HashMap;
use std::io::BufRead;

/// Fixed pool of helix slots, one bit per slot (set = free)
///
/// Slot 0 is rendered with `(`/`)`, slot k > 0 with the k-th letter
/// (uppercase opens, lowercase closes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPool {
    free: u32,
}

impl SlotPool {
    pub fn new() -> Self {
        Self {
            free: (1u32 << HELIX_SLOTS) - 1,
        }
    }

    /// Take the lowest-numbered free slot
    pub fn acquire(&mut self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        let slot = self.free.trailing_zeros() as usize;
        self.free &= !(1 << slot);
        Some(slot)
    }

    pub fn release(&mut self, slot: usize) {
        self.free |= 1 << slot;
    }

    pub fn is_free(&self, slot: usize) -> bool {
        slot < HELIX_SLOTS && self.free & (1 << slot) != 0
    }
}

impl Default for SlotPool {
    fn default() -> Self {
        Self::new()
    }
}

fn open_symbol(slot: usize) -> char {
    if slot == 0 {
        '('
    } else {
        (b'A' + (slot - 1) as u8) as char
    }
}

fn close_symbol(slot: usize) -> char {
    if slot == 0 {
        ')'
    } else {
        (b'a' + (slot - 1) as u8) as char
    }
}

fn is_separator(c: char) -> bool {
    HELIX_ID_SEPARATORS.contains(&c)
}

/// One helix of a snapshot and the columns where it opened and closed
#[derive(Debug, Clone, PartialEq)]
pub struct HelixSpan {
    pub id: String,
    pub slot: usize,
    pub opened_at: usize,
    pub closed_at: Option<usize>,
}

/// Decoded snapshot before canonicalization
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSnapshot {
    /// Bare nucleotide sequence
    pub sequence: String,

    /// Structure in slot notation (same length as `sequence`)
    pub structure: String,

    pub helices: Vec<HelixSpan>,
}

/// Structural role carried by the nucleotides being scanned
#[derive(Debug, Clone, Copy)]
enum Role {
    Unpaired,
    /// A helix marker was seen, its id has not been read yet
    Pending,
    Paired(char),
}

/// Decode one pair of annotation lines
///
/// **Public** - main entry point for snapshot decoding
///
/// # Arguments
/// * `markers` - nucleotide line with `[`, `^`, `]` helix markers
/// * `ids` - aligned helix-identifier line
///
/// # Returns
/// Sequence and structure in slot notation (not canonical yet)
///
/// # Errors
/// * `ValidationError::MalformedAnnotation` - both lines hold the same
///   non-blank character
/// * `ConsistencyError::SlotPoolExhausted` - more than 27 open helices
/// * `ConsistencyError::HelixReused` - a helix id read a third time
/// * `ConsistencyError::UnbalancedStructure` - a helix never closes or a
///   marker is never resolved
pub fn parse_annotation(markers: &str, ids: &str) -> Result<AnnotatedSnapshot, ConvertError> {
    let ids: Vec<char> = ids.chars().collect();

    let mut pool = SlotPool::new();
    let mut helices: Vec<HelixSpan> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    let mut sequence = String::new();
    let mut structure = String::new();
    let mut last: Option<(char, Role)> = None;
    let mut role = Role::Unpaired;

    for (column, (x, y)) in markers.chars().zip(ids.iter().copied()).enumerate() {
        if x == y {
            if x != ' ' {
                return Err(ValidationError::MalformedAnnotation { column, found: x }.into());
            }
            continue;
        }

        match x {
            'A' | 'C' | 'G' | 'U' => {
                if let Some((nucleotide, previous)) = last.take() {
                    push_nucleotide(&mut sequence, &mut structure, nucleotide, previous)?;
                }
                last = Some((x, role));
            }
            '[' | '^' => role = Role::Pending,
            ']' => role = Role::Unpaired,
            _ => {}
        }

        if matches!(role, Role::Pending) && !is_separator(y) {
            let id = read_helix_id(&ids, column);
            let symbol = match by_id.get(&id) {
                None => {
                    let slot = pool
                        .acquire()
                        .ok_or(ConsistencyError::SlotPoolExhausted(HELIX_SLOTS))?;
                    by_id.insert(id.clone(), helices.len());
                    helices.push(HelixSpan {
                        id,
                        slot,
                        opened_at: column,
                        closed_at: None,
                    });
                    open_symbol(slot)
                }
                Some(&index) => {
                    let helix = &mut helices[index];
                    if helix.closed_at.is_some() {
                        return Err(ConsistencyError::HelixReused(id).into());
                    }
                    helix.closed_at = Some(column);
                    pool.release(helix.slot);
                    close_symbol(helix.slot)
                }
            };
            role = Role::Paired(symbol);
            if let Some((_, current)) = last.as_mut() {
                *current = role;
            }
        }
    }

    if let Some((nucleotide, previous)) = last {
        push_nucleotide(&mut sequence, &mut structure, nucleotide, previous)?;
    }

    if let Some(open) = helices.iter().find(|h| h.closed_at.is_none()) {
        return Err(ConsistencyError::UnbalancedStructure {
            structure,
            reason: format!("helix '{}' is never closed", open.id),
        }
        .into());
    }

    Ok(AnnotatedSnapshot {
        sequence,
        structure,
        helices,
    })
}

fn push_nucleotide(
    sequence: &mut String,
    structure: &mut String,
    nucleotide: char,
    role: Role,
) -> Result<(), ConsistencyError> {
    let symbol = match role {
        Role::Unpaired => '.',
        Role::Paired(symbol) => symbol,
        Role::Pending => {
            return Err(ConsistencyError::UnbalancedStructure {
                structure: structure.clone(),
                reason: format!("helix marker before position {} has no id", sequence.len()),
            })
        }
    };
    sequence.push(nucleotide);
    structure.push(symbol);
    Ok(())
}

/// Read a multi-character helix id starting at `column`
fn read_helix_id(ids: &[char], column: usize) -> String {
    ids[column..]
        .iter()
        .take_while(|c| !is_separator(**c))
        .collect()
}

/// Decode and canonicalize one snapshot
///
/// **Public** - returns `(sequence, canonical structure)`
pub fn decode_snapshot(
    markers: &str,
    ids: &str,
    canonicalizer: &impl StructureCanonicalizer,
) -> Result<(String, String), ConvertError> {
    let snapshot = parse_annotation(markers, ids)?;
    let structure = canonicalizer.canonicalize(&snapshot.structure)?;
    Ok((snapshot.sequence, structure))
}

/// Header of a Kinefold `*.rnm` log
#[derive(Debug, Clone, PartialEq)]
pub struct KinefoldHeader {
    pub name: String,
    pub sequence: String,
}

/// One timed snapshot from a Kinefold log
#[derive(Debug, Clone, PartialEq)]
pub struct KinefoldEvent {
    pub sequence: String,
    /// Canonical structure of the current transcript
    pub structure: String,
    /// Free energy [kcal/mol]
    pub energy: f64,
    /// Time since the start of this intermediate [ms]
    pub elapsed_ms: f64,
}

/// Parsed `*.rnm` log
#[derive(Debug, Clone, PartialEq)]
pub struct KinefoldLog {
    pub header: KinefoldHeader,
    pub events: Vec<KinefoldEvent>,
}

/// Read a complete Kinefold `*.rnm` log
///
/// **Public** - input of the Kinefold resampling adapter
///
/// # Layout
/// ```text
/// < name
/// SEQUENCE
/// <markers line> | <energy> kcal/mol <w> <w> <ms> ms, ...
/// <helix id line> H ...
/// ...
/// ```
///
/// # Errors
/// * `ValidationError::MalformedLog` - missing header, unexpected units,
///   unparseable numbers or a truncated block
/// * any error of [`decode_snapshot`]
pub fn read_kinefold_log(
    reader: impl BufRead,
    canonicalizer: &impl StructureCanonicalizer,
) -> Result<KinefoldLog, ConvertError> {
    let mut name = None;
    let mut sequence = None;
    let mut pending: Option<(usize, String)> = None;
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim_end();

        match line_no {
            1 => name = Some(parse_header_line(line, line_no)?),
            2 => sequence = Some(line.to_string()),
            _ => match pending.take() {
                None => pending = Some((line_no, line.to_string())),
                Some((_, markers_line)) => {
                    let event = parse_block(&markers_line, line, line_no, canonicalizer)?;
                    events.push(event);
                }
            },
        }
    }

    if let Some((line_no, dangling)) = pending {
        if !dangling.is_empty() {
            return Err(malformed(line_no, "block without helix annotation line").into());
        }
    }

    let (Some(name), Some(sequence)) = (name, sequence) else {
        return Err(malformed(1, "log is missing its header").into());
    };

    if let Some(event) = events.iter().find(|e| e.sequence.len() > sequence.len()) {
        return Err(malformed(
            0,
            &format!(
                "snapshot of {} nucleotides exceeds the {} nucleotide sequence",
                event.sequence.len(),
                sequence.len()
            ),
        )
        .into());
    }

    debug!("Read {} Kinefold snapshots for {}", events.len(), name);

    Ok(KinefoldLog {
        header: KinefoldHeader { name, sequence },
        events,
    })
}

fn parse_header_line(line: &str, line_no: usize) -> Result<String, ValidationError> {
    let mut fields = line.split_whitespace();
    match (fields.next(), fields.next(), fields.next()) {
        (Some("<"), Some(name), None) => Ok(name.to_string()),
        _ => Err(malformed(line_no, "expected '< name' header")),
    }
}

fn parse_block(
    markers_line: &str,
    ids_line: &str,
    line_no: usize,
    canonicalizer: &impl StructureCanonicalizer,
) -> Result<KinefoldEvent, ConvertError> {
    let Some((markers, info)) = markers_line.split_once('|') else {
        return Err(malformed(line_no - 1, "missing '|' before energy and time").into());
    };
    let ids = ids_line.split('H').next().unwrap_or_default();

    let fields: Vec<&str> = info.split_whitespace().take(6).collect();
    let [energy, energy_unit, _, _, elapsed, time_unit] = fields[..] else {
        return Err(malformed(line_no - 1, "expected '<energy> kcal/mol .. .. <time> ms,'").into());
    };
    if energy_unit != "kcal/mol" {
        return Err(malformed(line_no - 1, &format!("unexpected energy unit '{}'", energy_unit)).into());
    }
    if time_unit != "ms," {
        return Err(malformed(line_no - 1, &format!("unexpected time unit '{}'", time_unit)).into());
    }
    let energy: f64 = energy
        .parse()
        .map_err(|_| malformed(line_no - 1, &format!("invalid energy '{}'", energy)))?;
    let elapsed_ms: f64 = elapsed
        .parse()
        .map_err(|_| malformed(line_no - 1, &format!("invalid time '{}'", elapsed)))?;

    let (sequence, structure) = decode_snapshot(markers.trim_end(), ids.trim_end(), canonicalizer)?;

    Ok(KinefoldEvent {
        sequence,
        structure,
        energy,
        elapsed_ms,
    })
}

fn malformed(line: usize, reason: &str) -> ValidationError {
    ValidationError::MalformedLog {
        line,
        reason: reason.to_string(),
    }
}
