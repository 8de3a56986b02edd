//! The closed set of ranking weight functions.
//!
//! Raw hits turn into scores through exactly these functions. Per word and
//! document the applicable weights compose multiplicatively; across query
//! words the products add up; neighbour-pair bonuses add on top.

/// Flat weight of a title hit.
pub const TITLE_WEIGHT: f64 = 25.0;

/// Flat weight of a keyword hit.
pub const KEYWORD_WEIGHT: f64 = 10.0;

/// Document-frequency down-weighting of common query terms.
///
/// `toc_size` is the corpus size N, `doc_freq` the number of documents the
/// word occurs in. Tiny corpora (N < 5) are not reduced at all; otherwise
/// the reduction is a Gaussian in the frequency ratio:
/// `exp(-((n/N)/0.38)²)`. Monotonically non-increasing in `doc_freq` for
/// fixed N.
pub fn freq_reduction(toc_size: u64, doc_freq: usize) -> f64 {
    if toc_size < 5 {
        return 1.0;
    }
    let ratio = doc_freq as f64 / toc_size as f64;
    (-(ratio / 0.38).powi(2)).exp()
}

/// Bonus for repeated occurrences of a word in one document's content:
/// `min(0.5·(n−1)+1, 4)`.
pub fn repeat_multiply(occurrences: usize) -> f64 {
    if occurrences == 0 {
        return 1.0;
    }
    (0.5 * (occurrences as f64 - 1.0) + 1.0).min(4.0)
}

/// Weight favouring documents of moderate size.
///
/// Documents under 10 words get no adjustment; above that the weight is
/// `1 + 1/(1 + exp((√W − 18)²/60))`, peaking at 1.5 around W ≈ 324 and
/// approaching 1 for very large documents.
pub fn entry_size_weight(word_count: i64) -> f64 {
    if word_count < 10 {
        return 1.0;
    }
    let spread = ((word_count as f64).sqrt() - 18.0).powi(2) / 60.0;
    1.0 + 1.0 / (1.0 + spread.exp())
}

/// Bonus for a pair of query words appearing at query-like distance in a
/// document: `30/(1 + (d/7)²)` where `d` is the difference between the
/// document distance and the query distance.
pub fn neighbour_weight(distance: f64) -> f64 {
    30.0 / (1.0 + (distance / 7.0).powi(2))
}

/// Labels for the weights entering a word's weight map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightKind {
    /// Document-frequency reduction.
    AbundanceReduction,
    /// Repeated-occurrence bonus.
    RepeatMultiply,
    /// Document-size weight.
    EntrySize,
    /// Host-supplied relevance ratio.
    ExternalRatio,
    /// Flat keyword-field weight.
    Keyword,
    /// Flat title-field weight.
    Title,
}

/// The weight map contributed by one word for one document: the product of
/// the entries is the word's score contribution.
#[derive(Debug, Clone, Default)]
pub struct WeightMap {
    entries: Vec<(WeightKind, f64)>,
}

impl WeightMap {
    /// Create an empty map.
    pub fn new() -> Self {
        WeightMap::default()
    }

    /// Add a weight.
    pub fn push(&mut self, kind: WeightKind, weight: f64) {
        self.entries.push((kind, weight));
    }

    /// Multiplicative composition of all weights.
    pub fn product(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).product()
    }

    /// The labelled entries, in insertion order.
    pub fn entries(&self) -> &[(WeightKind, f64)] {
        &self.entries
    }

    /// True when no weight was added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
