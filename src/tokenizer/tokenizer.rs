use std::collections::HashMap;

use super::fold::fold_ascii_lowercase;

/// Lookup table: `true` for bytes that belong to a term after case folding
const TOKEN_TABLE: [bool; 256] = build_token_table();

const fn build_token_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut c = 0;
    while c < 256 {
        let b = c as u8;
        table[c] = b.is_ascii_lowercase() || b.is_ascii_digit();
        c += 1;
    }
    table
}

#[inline]
fn is_token_byte(b: u8) -> bool {
    TOKEN_TABLE[b as usize]
}

/// Term counts for a single document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermFrequencies {
    /// Occurrences of each distinct term
    pub counts: HashMap<String, u32>,
    /// Total number of tokens, duplicates included
    pub token_count: u32,
}

impl TermFrequencies {
    pub fn get(&self, term: &str) -> Option<u32> {
        self.counts.get(term).copied()
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Text tokenizer producing lowercase ASCII alphanumeric terms
///
/// ASCII letters are folded to lowercase; maximal runs of `[a-z0-9]` become
/// terms and every other byte (punctuation, whitespace, each byte of a
/// multi-byte UTF-8 sequence) separates them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize text into an ordered vector of terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        self.tokenize_bytes(text.as_bytes())
    }

    /// Tokenize raw bytes into an ordered vector of terms
    pub fn tokenize_bytes(&self, bytes: &[u8]) -> Vec<String> {
        let mut terms = Vec::new();
        for_each_term(bytes, |term| terms.push(term.to_string()));
        terms
    }

    /// Compute term frequencies and the token count for a document
    pub fn compute_term_frequencies(&self, text: &str) -> TermFrequencies {
        self.compute_term_frequencies_bytes(text.as_bytes())
    }

    /// Same as `compute_term_frequencies` on raw bytes; invalid UTF-8 is fine
    pub fn compute_term_frequencies_bytes(&self, bytes: &[u8]) -> TermFrequencies {
        let mut freq = TermFrequencies::default();
        for_each_term(bytes, |term| {
            freq.token_count += 1;
            match freq.counts.get_mut(term) {
                Some(count) => *count += 1,
                None => {
                    freq.counts.insert(term.to_string(), 1);
                }
            }
        });
        freq
    }

    /// Get the distinct terms of a query, sorted
    pub fn unique_terms(&self, text: &str) -> Vec<String> {
        let mut terms = self.tokenize(text);
        terms.sort_unstable();
        terms.dedup();
        terms
    }
}

/// Fold a private copy of `bytes` and hand every term to `f` in order
fn for_each_term<F: FnMut(&str)>(bytes: &[u8], mut f: F) {
    let mut folded = bytes.to_vec();
    fold_ascii_lowercase(&mut folded);

    let n = folded.len();
    let mut i = 0;
    while i < n {
        while i < n && !is_token_byte(folded[i]) {
            i += 1;
        }
        let start = i;
        while i < n && is_token_byte(folded[i]) {
            i += 1;
        }
        if i > start {
            // Token bytes are ASCII, so a run is always valid UTF-8.
            if let Ok(term) = std::str::from_utf8(&folded[start..i]) {
                f(term);
            }
        }
    }
}
