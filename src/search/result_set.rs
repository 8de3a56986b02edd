//! Score aggregation, sorting and paging.
//!
//! A [`ResultSet`] collects per-word weight maps and neighbour bonuses while
//! the fulltext result builder runs, then freezes into the sorted, paged
//! view the snippet builder and the host consume. Mutating scores after
//! [`ResultSet::freeze`] fails with
//! [`Immutable`](crate::error::SedgeError::Immutable).

use std::time::Instant;

use ahash::AHashMap;

use crate::error::{Result, SedgeError};
use crate::id::ExternalId;
use crate::search::weights::WeightMap;
use crate::storage::TocRecord;

/// Paging and instrumentation configuration for one result set.
#[derive(Debug, Clone)]
pub struct ResultSetConfig {
    /// Maximum number of displayed results.
    pub limit: usize,

    /// Number of leading results to skip.
    pub offset: usize,

    /// Capture per-contribution debug entries.
    pub debug: bool,
}

impl Default for ResultSetConfig {
    fn default() -> Self {
        ResultSetConfig {
            limit: 10,
            offset: 0,
            debug: false,
        }
    }
}

/// One recorded contribution, captured when debug is enabled.
#[derive(Debug, Clone)]
pub enum DebugEntry {
    /// A word's weight-map contribution to a document.
    Word {
        /// Query word.
        word: String,
        /// Document scored.
        external_id: ExternalId,
        /// The composed weights.
        weights: WeightMap,
    },
    /// A neighbour-pair bonus.
    Neighbour {
        /// First query word.
        word1: String,
        /// Second query word.
        word2: String,
        /// Document scored.
        external_id: ExternalId,
        /// The added bonus.
        weight: f64,
        /// The contributing distance.
        distance: f64,
    },
}

/// Aggregated scores with paging, found positions and attached display data.
#[derive(Debug, Default)]
pub struct ResultSet {
    config: ResultSetConfig,
    frozen: bool,
    scores: AHashMap<ExternalId, f64>,
    found_positions: AHashMap<ExternalId, AHashMap<String, Vec<i32>>>,
    toc: AHashMap<ExternalId, TocRecord>,
    snippets: AHashMap<ExternalId, String>,
    sorted: Vec<ExternalId>,
    debug_entries: Vec<DebugEntry>,
    profile: Vec<(String, Instant)>,
}

impl ResultSet {
    /// Create a result set with the given configuration.
    pub fn new(config: ResultSetConfig) -> Self {
        ResultSet {
            config,
            ..ResultSet::default()
        }
    }

    fn check_mutable(&self, operation: &str) -> Result<()> {
        if self.frozen {
            Err(SedgeError::immutable(operation.to_string()))
        } else {
            Ok(())
        }
    }

    /// Add one word's weight-map contribution for a document. The product
    /// of the map's weights is added to the document's aggregate score;
    /// `content_positions`, when given, are kept for snippet assembly.
    pub fn add_word_weight(
        &mut self,
        word: &str,
        external_id: &ExternalId,
        weights: WeightMap,
        content_positions: Option<Vec<i32>>,
    ) -> Result<()> {
        self.check_mutable("add_word_weight")?;

        *self.scores.entry(external_id.clone()).or_insert(0.0) += weights.product();
        if let Some(positions) = content_positions {
            self.found_positions
                .entry(external_id.clone())
                .or_default()
                .insert(word.to_string(), positions);
        }
        if self.config.debug {
            self.debug_entries.push(DebugEntry::Word {
                word: word.to_string(),
                external_id: external_id.clone(),
                weights,
            });
        }
        Ok(())
    }

    /// Add a neighbour-pair bonus for a document.
    pub fn add_neighbour_weight(
        &mut self,
        word1: &str,
        word2: &str,
        external_id: &ExternalId,
        weight: f64,
        distance: f64,
    ) -> Result<()> {
        self.check_mutable("add_neighbour_weight")?;

        *self.scores.entry(external_id.clone()).or_insert(0.0) += weight;
        if self.config.debug {
            self.debug_entries.push(DebugEntry::Neighbour {
                word1: word1.to_string(),
                word2: word2.to_string(),
                external_id: external_id.clone(),
                weight,
                distance,
            });
        }
        Ok(())
    }

    /// Freeze the set: compute the sorted order and reject further score
    /// mutation. Ordering is descending by aggregate score with the
    /// serialized external id as a deterministic tie-break.
    pub fn freeze(&mut self) -> Result<()> {
        self.check_mutable("freeze")?;

        let mut ranked: Vec<(ExternalId, f64)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        self.sorted = ranked.into_iter().map(|(id, _)| id).collect();
        self.frozen = true;
        Ok(())
    }

    fn check_frozen(&self, operation: &str) -> Result<()> {
        if self.frozen {
            Ok(())
        } else {
            Err(SedgeError::logic(format!("{operation} before freeze")))
        }
    }

    /// The displayed page of external ids: descending score, limited to
    /// `[offset, offset + limit)`.
    pub fn sorted_external_ids(&self) -> Result<&[ExternalId]> {
        self.check_frozen("sorted_external_ids")?;
        let start = self.config.offset.min(self.sorted.len());
        let end = (self.config.offset + self.config.limit).min(self.sorted.len());
        Ok(&self.sorted[start..end])
    }

    /// Number of matched documents before paging.
    pub fn total_matched(&self) -> usize {
        self.scores.len()
    }

    /// A document's aggregate score.
    pub fn score(&self, external_id: &ExternalId) -> Result<f64> {
        self.scores
            .get(external_id)
            .copied()
            .ok_or_else(|| SedgeError::unknown_id(external_id.to_string()))
    }

    /// The matched content positions per query word for a document.
    /// Documents matched only in title or keyword fields yield an empty
    /// map.
    pub fn found_word_positions_by_external_id(
        &self,
        external_id: &ExternalId,
    ) -> Result<AHashMap<String, Vec<i32>>> {
        self.check_frozen("found_word_positions_by_external_id")?;
        if !self.scores.contains_key(external_id) {
            return Err(SedgeError::unknown_id(external_id.to_string()));
        }
        Ok(self
            .found_positions
            .get(external_id)
            .cloned()
            .unwrap_or_default())
    }

    /// Memoize TOC data for a displayed result.
    pub fn attach_toc(&mut self, record: TocRecord) -> Result<()> {
        if !self.scores.contains_key(&record.external_id) {
            return Err(SedgeError::unknown_id(record.external_id.to_string()));
        }
        self.toc.insert(record.external_id.clone(), record);
        Ok(())
    }

    /// Attach the assembled snippet text for a displayed result.
    pub fn attach_snippet(&mut self, external_id: &ExternalId, snippet: String) -> Result<()> {
        if !self.scores.contains_key(external_id) {
            return Err(SedgeError::unknown_id(external_id.to_string()));
        }
        self.snippets.insert(external_id.clone(), snippet);
        Ok(())
    }

    /// Memoized TOC data, when attached.
    pub fn toc(&self, external_id: &ExternalId) -> Option<&TocRecord> {
        self.toc.get(external_id)
    }

    /// Assembled snippet text, when attached.
    pub fn snippet(&self, external_id: &ExternalId) -> Option<&str> {
        self.snippets.get(external_id).map(String::as_str)
    }

    /// Record a named instrumentation point with a monotonic timestamp.
    /// Allowed after freeze; profile points are not result data.
    pub fn add_profile_point<S: Into<String>>(&mut self, label: S) {
        self.profile.push((label.into(), Instant::now()));
    }

    /// The ordered profile points. Side-effect free.
    pub fn profile_points(&self) -> &[(String, Instant)] {
        &self.profile
    }

    /// Captured contributions; empty unless the debug flag is set.
    pub fn debug_entries(&self) -> &[DebugEntry] {
        &self.debug_entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::weights::{WeightKind, WeightMap};

    fn weight_map(weight: f64) -> WeightMap {
        let mut map = WeightMap::new();
        map.push(WeightKind::AbundanceReduction, weight);
        map
    }

    #[test]
    fn test_scores_add_across_words() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        let id = ExternalId::new("a");

        set.add_word_weight("one", &id, weight_map(2.0), None).unwrap();
        set.add_word_weight("two", &id, weight_map(3.0), None).unwrap();
        set.add_neighbour_weight("one", "two", &id, 5.0, 0.0).unwrap();

        assert_eq!(set.score(&id).unwrap(), 10.0);
    }

    #[test]
    fn test_sorted_descending_with_tie_break() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        // Two documents tie; the serialized external id breaks the tie.
        set.add_word_weight("w", &ExternalId::new("b"), weight_map(1.0), None)
            .unwrap();
        set.add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        set.add_word_weight("w", &ExternalId::new("c"), weight_map(9.0), None)
            .unwrap();
        set.freeze().unwrap();

        let sorted = set.sorted_external_ids().unwrap();
        assert_eq!(
            sorted,
            &[
                ExternalId::new("c"),
                ExternalId::new("a"),
                ExternalId::new("b"),
            ]
        );
    }

    #[test]
    fn test_paging_window() {
        let mut set = ResultSet::new(ResultSetConfig {
            limit: 2,
            offset: 1,
            debug: false,
        });
        for (id, score) in [("a", 4.0), ("b", 3.0), ("c", 2.0), ("d", 1.0)] {
            set.add_word_weight("w", &ExternalId::new(id), weight_map(score), None)
                .unwrap();
        }
        set.freeze().unwrap();

        let sorted = set.sorted_external_ids().unwrap();
        assert_eq!(sorted, &[ExternalId::new("b"), ExternalId::new("c")]);
        assert_eq!(set.total_matched(), 4);
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let mut set = ResultSet::new(ResultSetConfig {
            limit: 10,
            offset: 5,
            debug: false,
        });
        set.add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        set.freeze().unwrap();
        assert!(set.sorted_external_ids().unwrap().is_empty());
    }

    #[test]
    fn test_frozen_set_rejects_mutation() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        set.add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        set.freeze().unwrap();

        let err = set
            .add_word_weight("w", &ExternalId::new("b"), weight_map(1.0), None)
            .unwrap_err();
        assert!(matches!(err, SedgeError::Immutable(_)));

        let err = set
            .add_neighbour_weight("w", "v", &ExternalId::new("a"), 1.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, SedgeError::Immutable(_)));

        assert!(set.freeze().is_err());
    }

    #[test]
    fn test_unknown_id_errors() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        set.add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        set.freeze().unwrap();

        let ghost = ExternalId::new("ghost");
        assert!(matches!(
            set.score(&ghost).unwrap_err(),
            SedgeError::UnknownId(_)
        ));
        assert!(matches!(
            set.found_word_positions_by_external_id(&ghost).unwrap_err(),
            SedgeError::UnknownId(_)
        ));
        assert!(matches!(
            set.attach_snippet(&ghost, "x".to_string()).unwrap_err(),
            SedgeError::UnknownId(_)
        ));
    }

    #[test]
    fn test_found_positions_kept_per_word() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        let id = ExternalId::new("a");
        set.add_word_weight("hello", &id, weight_map(1.0), Some(vec![0, 2]))
            .unwrap();
        set.add_word_weight("world", &id, weight_map(1.0), Some(vec![1]))
            .unwrap();
        set.freeze().unwrap();

        let positions = set.found_word_positions_by_external_id(&id).unwrap();
        assert_eq!(positions["hello"], vec![0, 2]);
        assert_eq!(positions["world"], vec![1]);
    }

    #[test]
    fn test_profile_points_are_ordered() {
        let mut set = ResultSet::new(ResultSetConfig::default());
        set.add_profile_point("fulltext");
        set.freeze().unwrap();
        set.add_profile_point("sorted");

        let points = set.profile_points();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].0, "fulltext");
        assert!(points[1].1 >= points[0].1);
    }

    #[test]
    fn test_debug_entries_only_when_enabled() {
        let mut quiet = ResultSet::new(ResultSetConfig::default());
        quiet
            .add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        assert!(quiet.debug_entries().is_empty());

        let mut verbose = ResultSet::new(ResultSetConfig {
            debug: true,
            ..ResultSetConfig::default()
        });
        verbose
            .add_word_weight("w", &ExternalId::new("a"), weight_map(1.0), None)
            .unwrap();
        verbose
            .add_neighbour_weight("w", "v", &ExternalId::new("a"), 1.0, 2.0)
            .unwrap();
        assert_eq!(verbose.debug_entries().len(), 2);
    }
}
