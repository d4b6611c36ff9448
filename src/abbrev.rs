//! Dictionary reference resolution and key allocation.
//!
//! Descriptive text wider than its record field is split across entries on
//! consecutive keys; only the first key is referenced by other records.
//! Reading back, an entry is followed by a continuation when the previous
//! chunk fills the field exactly and the next key's entry is not itself
//! referenced anywhere in the volume. Splitting and reassembly are exact
//! inverses under that convention.

use std::collections::HashMap;

use log::warn;

use crate::blockette::{ABBREVIATION_TEXT_WIDTH, COMMENT_TEXT_WIDTH};
use crate::volume::Volume;

/// Field width of the reassembly-relevant text per dictionary type.
pub fn text_width(blockette_type: u16) -> usize {
    match blockette_type {
        31 => COMMENT_TEXT_WIDTH,
        33 => ABBREVIATION_TEXT_WIDTH,
        _ => usize::MAX, // no splitting for the other dictionary kinds
    }
}

/// Resolves a lookup key to its full text, reassembling split entries.
/// A missing key is recoverable: logged and surfaced as `None`.
pub fn resolve(volume: &Volume, blockette_type: u16, key: u16) -> Option<String> {
    if key == 0 {
        // conventional "no entry" key, not a dangling reference
        return None;
    }
    let mut text = match volume.dictionary_text(blockette_type, key) {
        Some(text) => text.to_string(),
        None => {
            warn!(
                "unresolved dictionary reference: blockette {:03} key {}",
                blockette_type, key
            );
            return None;
        }
    };
    let width = text_width(blockette_type);
    let mut chunk_len = text.chars().count();
    let mut next = key + 1;
    while chunk_len == width && !volume.is_referenced(blockette_type, next) {
        match volume.dictionary_text(blockette_type, next) {
            Some(chunk) => {
                chunk_len = chunk.chars().count();
                text.push_str(chunk);
                next += 1;
            }
            None => break,
        }
    }
    Some(text)
}

/// Splits text into chunks no wider than `width`; every chunk but the last
/// is exactly `width` so the reader can recognize continuations.
pub fn split_text(text: &str, width: usize) -> Vec<String> {
    if text.chars().count() <= width {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for c in text.chars() {
        current.push(c);
        count += 1;
        if count == width {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Write-path key allocator, scoped to one volume build. Identical text of
/// the same type reuses its key; a key, once handed out, never moves.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    next_key: HashMap<u16, u16>,
    assigned: HashMap<(u16, String), u16>,
}

impl KeyAllocator {
    pub fn new() -> Self {
        KeyAllocator::default()
    }

    /// Returns the first key for `text` plus the chunks to materialize as
    /// new dictionary entries at consecutive keys starting there. An empty
    /// chunk list means the text was already assigned.
    pub fn assign(&mut self, blockette_type: u16, text: &str) -> (u16, Vec<String>) {
        if let Some(&key) = self.assigned.get(&(blockette_type, text.to_string())) {
            return (key, Vec::new());
        }
        let chunks = split_text(text, text_width(blockette_type));
        let next = self.next_key.entry(blockette_type).or_insert(1);
        let key = *next;
        *next += chunks.len() as u16;
        self.assigned
            .insert((blockette_type, text.to_string()), key);
        (key, chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_is_join_inverse() {
        let text = "x".repeat(185);
        let chunks = split_text(&text, 70);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 70);
        assert_eq!(chunks[1].len(), 70);
        assert_eq!(chunks[2].len(), 45);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = split_text("short", 70);
        assert_eq!(chunks, vec!["short".to_string()]);
    }

    #[test]
    fn exact_width_text_is_one_chunk() {
        let text = "y".repeat(70);
        assert_eq!(split_text(&text, 70), vec![text]);
    }

    #[test]
    fn allocator_deduplicates() {
        let mut alloc = KeyAllocator::new();
        let (key_a, chunks_a) = alloc.assign(31, "station is being serviced");
        assert_eq!(key_a, 1);
        assert_eq!(chunks_a.len(), 1);
        let (key_b, chunks_b) = alloc.assign(31, "station is being serviced");
        assert_eq!(key_b, key_a);
        assert!(chunks_b.is_empty());
    }

    #[test]
    fn allocator_reserves_continuation_keys() {
        let mut alloc = KeyAllocator::new();
        let long = "z".repeat(150);
        let (key, chunks) = alloc.assign(31, &long);
        assert_eq!(key, 1);
        assert_eq!(chunks.len(), 3);
        let (next, _) = alloc.assign(31, "another");
        assert_eq!(next, 4);
    }

    #[test]
    fn key_spaces_are_per_type() {
        let mut alloc = KeyAllocator::new();
        assert_eq!(alloc.assign(31, "comment").0, 1);
        assert_eq!(alloc.assign(33, "network").0, 1);
        assert_eq!(alloc.assign(34, "M/S").0, 1);
    }
}
