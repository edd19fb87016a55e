//! Table alias allocation.

/// Generates table aliases unique for the lifetime of one translation.
///
/// Uniqueness holds across all scopes of the translation unit, not just the
/// allocating scope, so the rendered SQL never needs further alias analysis.
#[derive(Debug, Default)]
pub struct AliasAllocator {
    counter: usize,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fresh alias from a readability stem (usually the table or
    /// path segment name) plus a monotonically increasing disambiguator.
    pub fn allocate(&mut self, stem: &str) -> String {
        let stem: String = stem
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(10)
            .collect::<String>()
            .to_ascii_lowercase();
        let stem = if stem.is_empty() { "t".to_string() } else { stem };
        self.counter += 1;
        format!("{}_{}", stem, self.counter)
    }
}
