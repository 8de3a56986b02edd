//! The fulltext result builder: raw position bags → weighted contributions.
//!
//! For every `(query word, document)` pair the builder composes a weight
//! map from the closed function set in [`crate::search::weights`], then
//! adds neighbour-pair bonuses for query words appearing at query-like
//! distances in the document content.

use ahash::AHashMap;

use crate::error::Result;
use crate::id::ExternalId;
use crate::search::result_set::ResultSet;
use crate::search::weights::{
    entry_size_weight, freq_reduction, neighbour_weight, repeat_multiply, WeightKind, WeightMap,
    KEYWORD_WEIGHT, TITLE_WEIGHT,
};
use crate::storage::FulltextIndexContent;

/// Builds a result set from the storage's fulltext answer.
#[derive(Debug)]
pub struct FulltextResult {
    content: FulltextIndexContent,
    /// Query words with their positions in the query, deduplicated.
    query_words: Vec<(i32, String)>,
    toc_size: u64,
}

/// One word's presence in one document, kept for the neighbour pass.
struct NeighbourCandidate {
    query_position: i32,
    word_index: usize,
    reduction: f64,
}

impl FulltextResult {
    /// Create a builder over a storage answer.
    ///
    /// `query_words` carries each distinct query word with its reference
    /// position in the query; `toc_size` is the corpus size the abundance
    /// reduction is computed against.
    pub fn new(
        content: FulltextIndexContent,
        query_words: Vec<(i32, String)>,
        toc_size: u64,
    ) -> Self {
        FulltextResult {
            content,
            query_words,
            toc_size,
        }
    }

    fn query_position(&self, word: &str) -> Option<i32> {
        self.query_words
            .iter()
            .find(|(_, w)| w == word)
            .map(|(p, _)| *p)
    }

    /// Fill the result set with weight-map contributions and neighbour
    /// bonuses.
    pub fn fill_result_set(&self, result_set: &mut ResultSet) -> Result<()> {
        // Documents seen per word, for the neighbour pass.
        let mut candidates: AHashMap<ExternalId, Vec<NeighbourCandidate>> = AHashMap::new();

        for (word_index, hits) in self.content.words.iter().enumerate() {
            let reduction = freq_reduction(self.toc_size, hits.bags.len());
            let query_position = self.query_position(&hits.word);

            for bag in &hits.bags {
                let content_positions = &bag.positions.content;
                if !content_positions.is_empty() {
                    let mut weights = WeightMap::new();
                    weights.push(WeightKind::AbundanceReduction, reduction);
                    weights.push(
                        WeightKind::RepeatMultiply,
                        repeat_multiply(content_positions.len()),
                    );
                    weights.push(WeightKind::EntrySize, entry_size_weight(bag.word_count));
                    if bag.relevance_ratio != 1.0 {
                        weights.push(WeightKind::ExternalRatio, bag.relevance_ratio);
                    }
                    result_set.add_word_weight(
                        &hits.word,
                        &bag.external_id,
                        weights,
                        Some(content_positions.clone()),
                    )?;

                    if let Some(query_position) = query_position {
                        candidates
                            .entry(bag.external_id.clone())
                            .or_default()
                            .push(NeighbourCandidate {
                                query_position,
                                word_index,
                                reduction,
                            });
                    }
                }

                if !bag.positions.keyword.is_empty() {
                    let mut weights = WeightMap::new();
                    weights.push(WeightKind::Keyword, KEYWORD_WEIGHT);
                    weights.push(WeightKind::AbundanceReduction, reduction);
                    if bag.relevance_ratio != 1.0 {
                        weights.push(WeightKind::ExternalRatio, bag.relevance_ratio);
                    }
                    result_set.add_word_weight(&hits.word, &bag.external_id, weights, None)?;
                }

                if !bag.positions.title.is_empty() {
                    let mut weights = WeightMap::new();
                    weights.push(WeightKind::Title, TITLE_WEIGHT);
                    weights.push(WeightKind::AbundanceReduction, reduction);
                    if bag.relevance_ratio != 1.0 {
                        weights.push(WeightKind::ExternalRatio, bag.relevance_ratio);
                    }
                    result_set.add_word_weight(&hits.word, &bag.external_id, weights, None)?;
                }
            }
        }

        self.fill_neighbour_weights(result_set, &candidates)
    }

    /// Add the neighbour-pair bonuses: for each ordered pair of distinct
    /// query words present in a document's content, the minimum deviation
    /// between document distance and query distance contributes
    /// `neighbour_weight(d) · r₁ · r₂`.
    fn fill_neighbour_weights(
        &self,
        result_set: &mut ResultSet,
        candidates: &AHashMap<ExternalId, Vec<NeighbourCandidate>>,
    ) -> Result<()> {
        // Deterministic document order.
        let mut external_ids: Vec<&ExternalId> = candidates.keys().collect();
        external_ids.sort();

        for external_id in external_ids {
            let present = &candidates[external_id];
            for first in present {
                for second in present {
                    let word1 = &self.content.words[first.word_index];
                    let word2 = &self.content.words[second.word_index];
                    if word1.word == word2.word {
                        continue;
                    }

                    let query_distance =
                        (first.query_position - second.query_position).abs();
                    let positions1 = self.bag_content_positions(first.word_index, external_id);
                    let positions2 = self.bag_content_positions(second.word_index, external_id);
                    let Some(distance) = minimum_deviation(positions1, positions2, query_distance)
                    else {
                        continue;
                    };

                    result_set.add_neighbour_weight(
                        &word1.word,
                        &word2.word,
                        external_id,
                        neighbour_weight(distance) * first.reduction * second.reduction,
                        distance,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn bag_content_positions(&self, word_index: usize, external_id: &ExternalId) -> &[i32] {
        self.content.words[word_index]
            .bags
            .iter()
            .find(|bag| bag.external_id == *external_id)
            .map(|bag| bag.positions.content.as_slice())
            .unwrap_or(&[])
    }
}

/// The smallest `| |p1 − p2| − d_query |` over all position pairs.
fn minimum_deviation(positions1: &[i32], positions2: &[i32], query_distance: i32) -> Option<f64> {
    let mut minimum: Option<i64> = None;
    for p1 in positions1 {
        for p2 in positions2 {
            let deviation = ((*p1 as i64 - *p2 as i64).abs() - query_distance as i64).abs();
            minimum = Some(match minimum {
                Some(current) => current.min(deviation),
                None => deviation,
            });
        }
    }
    minimum.map(|d| d as f64)
}
