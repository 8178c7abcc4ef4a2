//! Secondary-structure notation helpers.
//!
//! Raw structures decoded from simulator annotations use several bracket
//! families so that crossing helices (pseudoknots) can be written down.
//! A canonicalizer resolves the pairs and renders the structure in the
//! nested `(`/`)` notation used by the trajectory tables.

use crate::utils::error::ConsistencyError;

/// Turns any matched bracket string into canonical dot-bracket notation
///
/// **Public** - seam for the annotation parser
pub trait StructureCanonicalizer {
    fn canonicalize(&self, raw: &str) -> Result<String, ConsistencyError>;
}

/// Pair-table canonicalizer
///
/// Accepts `()`, `[]`, `{}`, `<>` and uppercase/lowercase letter pairs
/// (`A` opens, `a` closes). Every pair is written as `(` at its 5' end and
/// `)` at its 3' end; crossing pairs are flattened into the same family.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairTableCanonicalizer;

impl StructureCanonicalizer for PairTableCanonicalizer {
    fn canonicalize(&self, raw: &str) -> Result<String, ConsistencyError> {
        let table = pair_table(raw)?;
        Ok(table
            .iter()
            .enumerate()
            .map(|(i, partner)| match partner {
                Some(j) if *j > i => '(',
                Some(_) => ')',
                None => '.',
            })
            .collect())
    }
}

/// Bracket family a symbol belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Open(usize),
    Close(usize),
    Unpaired,
}

// Families 0..4 are the punctuation brackets, 4.. the letters A..Z
const PUNCTUATION: [(char, char); 4] = [('(', ')'), ('[', ']'), ('{', '}'), ('<', '>')];

fn classify(symbol: char) -> Option<Bracket> {
    if symbol == '.' {
        return Some(Bracket::Unpaired);
    }
    if let Some(family) = PUNCTUATION.iter().position(|(open, _)| *open == symbol) {
        return Some(Bracket::Open(family));
    }
    if let Some(family) = PUNCTUATION.iter().position(|(_, close)| *close == symbol) {
        return Some(Bracket::Close(family));
    }
    if symbol.is_ascii_uppercase() {
        return Some(Bracket::Open(PUNCTUATION.len() + (symbol as u8 - b'A') as usize));
    }
    if symbol.is_ascii_lowercase() {
        return Some(Bracket::Close(PUNCTUATION.len() + (symbol as u8 - b'a') as usize));
    }
    None
}

/// Build the pair table of a structure
///
/// **Public** - `table[i] = Some(j)` if positions `i` and `j` pair
///
/// # Errors
/// * `ConsistencyError::UnbalancedStructure` - unknown symbol, a closing
///   symbol without an open partner, or an unclosed opening symbol
pub fn pair_table(structure: &str) -> Result<Vec<Option<usize>>, ConsistencyError> {
    let symbols: Vec<char> = structure.chars().collect();
    let mut table = vec![None; symbols.len()];
    let mut stacks: Vec<Vec<usize>> = vec![Vec::new(); PUNCTUATION.len() + 26];

    for (i, symbol) in symbols.iter().enumerate() {
        match classify(*symbol) {
            Some(Bracket::Unpaired) => {}
            Some(Bracket::Open(family)) => stacks[family].push(i),
            Some(Bracket::Close(family)) => {
                let j = stacks[family].pop().ok_or_else(|| unbalanced(
                    structure,
                    format!("'{}' at position {} closes nothing", symbol, i),
                ))?;
                table[i] = Some(j);
                table[j] = Some(i);
            }
            None => {
                return Err(unbalanced(
                    structure,
                    format!("unknown symbol '{}' at position {}", symbol, i),
                ))
            }
        }
    }

    if let Some(open) = stacks.iter().flatten().min() {
        return Err(unbalanced(
            structure,
            format!("'{}' at position {} is never closed", symbols[*open], open),
        ));
    }

    Ok(table)
}

fn unbalanced(structure: &str, reason: String) -> ConsistencyError {
    ConsistencyError::UnbalancedStructure {
        structure: structure.to_string(),
        reason,
    }
}

/// Right-pad a (partial) structure with unpaired symbols to `length`
pub fn pad_structure(structure: &str, length: usize) -> String {
    let mut padded = structure.to_string();
    let current = padded.chars().count();
    if current < length {
        padded.extend(std::iter::repeat('.').take(length - current));
    }
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_letter_family_is_flattened() {
        let canonical = PairTableCanonicalizer
            .canonicalize("..((((((....AAAA...))))))aaaa......")
            .unwrap();
        assert_eq!(canonical, "..((((((....((((...))))))))))......");
    }

    #[test]
    fn test_mixed_punctuation_families() {
        let canonical = PairTableCanonicalizer.canonicalize("([)]<.>").unwrap();
        assert_eq!(canonical, "(())(.)");
    }

    #[test]
    fn test_pair_table_partners() {
        let table = pair_table("(.[)]").unwrap();
        assert_eq!(table, vec![Some(3), None, Some(4), Some(0), Some(2)]);
    }

    #[test]
    fn test_unmatched_close_is_rejected() {
        assert!(matches!(
            PairTableCanonicalizer.canonicalize("(.))"),
            Err(ConsistencyError::UnbalancedStructure { .. })
        ));
    }

    #[test]
    fn test_unclosed_open_is_rejected() {
        assert!(PairTableCanonicalizer.canonicalize("((.)").is_err());
        assert!(PairTableCanonicalizer.canonicalize("A..").is_err());
    }

    #[test]
    fn test_unknown_symbol_is_rejected() {
        assert!(PairTableCanonicalizer.canonicalize("(|)").is_err());
    }

    #[test]
    fn test_pad_structure() {
        assert_eq!(pad_structure("((.))", 8), "((.))...");
        assert_eq!(pad_structure("((.))", 3), "((.))");
    }
}
