//! Approximate set of tags already handed out.
//!
//! The registry is a fixed table of flags indexed by a polynomial string
//! hash. There is no collision chaining: two unrelated tags that hash to the
//! same slot are both treated as taken. That trades exactness for a tiny,
//! constant footprint, and the trade is observable: the suffix an entry
//! receives depends on which slots earlier tags occupied. Replacing this with
//! an exact set would change assigned suffixes on some inputs.

/// Number of slots in the table.
pub const TABLE_SIZE: usize = 19661;

const MULTIPLIER: usize = 1231;

#[derive(Debug, Clone)]
pub struct UniquenessRegistry {
    slots: Vec<bool>,
}

impl Default for UniquenessRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessRegistry {
    pub fn new() -> Self {
        Self {
            slots: vec![false; TABLE_SIZE],
        }
    }

    pub fn is_free(&self, tag: &str) -> bool {
        !self.slots[slot(tag)]
    }

    pub fn reserve(&mut self, tag: &str) {
        self.slots[slot(tag)] = true;
    }

    pub fn reset(&mut self) {
        self.slots.fill(false);
    }

    /// Reserve `tag`, or the first `tag` + suffix that is still free.
    ///
    /// Suffixes come from [`SuffixCounter`]: `a`, `b`, …, `z`, `aa`, `ba`, ….
    pub fn claim(&mut self, tag: &str) -> String {
        let mut candidate = tag.to_string();
        let mut counter = SuffixCounter::default();
        while !self.is_free(&candidate) {
            candidate.truncate(tag.len());
            candidate.push_str(counter.advance());
        }
        self.reserve(&candidate);
        candidate
    }
}

fn slot(tag: &str) -> usize {
    tag.bytes()
        .fold(0, |h, b| (h * MULTIPLIER + usize::from(b)) % TABLE_SIZE)
}

/// Base-26 lowercase counter, least significant letter first.
#[derive(Debug, Default)]
pub struct SuffixCounter {
    digits: Vec<u8>,
    text: String,
}

impl SuffixCounter {
    /// Step to the next suffix and return it.
    pub fn advance(&mut self) -> &str {
        let mut i = 0;
        while i < self.digits.len() && self.digits[i] == b'z' {
            self.digits[i] = b'a';
            i += 1;
        }
        if i == self.digits.len() {
            self.digits.push(b'a');
        } else {
            self.digits[i] += 1;
        }
        self.text.clear();
        self.text.extend(self.digits.iter().map(|&d| char::from(d)));
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_then_taken() {
        let mut registry = UniquenessRegistry::new();
        assert!(registry.is_free("Rivest92"));
        registry.reserve("Rivest92");
        assert!(!registry.is_free("Rivest92"));
        registry.reset();
        assert!(registry.is_free("Rivest92"));
    }

    #[test]
    fn claim_appends_suffixes_in_order() {
        let mut registry = UniquenessRegistry::new();
        assert_eq!(registry.claim("Knuth84"), "Knuth84");
        assert_eq!(registry.claim("Knuth84"), "Knuth84a");
        assert_eq!(registry.claim("Knuth84"), "Knuth84b");
    }

    #[test]
    fn counter_rolls_over_little_endian() {
        let mut counter = SuffixCounter::default();
        let mut seen = Vec::new();
        for _ in 0..28 {
            seen.push(counter.advance().to_string());
        }
        assert_eq!(seen[0], "a");
        assert_eq!(seen[25], "z");
        assert_eq!(seen[26], "aa");
        assert_eq!(seen[27], "ba");
    }

    #[test]
    fn hash_collisions_count_as_taken() {
        assert_eq!(slot("Knuth84"), slot("KnuthjF6"));
        let mut registry = UniquenessRegistry::new();
        registry.reserve("KnuthjF6");
        assert!(!registry.is_free("Knuth84"));
        assert_eq!(registry.claim("Knuth84"), "Knuth84a");
    }
}
