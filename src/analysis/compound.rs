//! Compound-word decomposition.
//!
//! A hit on "known" should reward a document containing "well-known". To
//! that end, each indexed word whose stem carries `-`, `.` or `,` also
//! contributes its components as synthetic entries at fractional positions
//! next to the parent, so components rank as colocated neighbours without
//! letting the compound dominate pair scoring.

use crate::analysis::stemmer::Stemmer;
use crate::position::PositionKey;

/// Characters that mark a compound word.
const COMPOUND_CHARS: [char; 3] = ['-', '.', ','];

/// Stem every positioned word and add synthetic component stems.
///
/// For each input `(position, word)` the whole-word stem is emitted at
/// `PositionKey::Whole(position)`. When the stem contains a compound
/// character, the surface word is split on runs of those characters and the
/// k-th non-empty component distinct from the whole word is emitted at
/// `PositionKey::Component { parent: position, component: k }` (1-indexed).
///
/// # Examples
///
/// ```
/// use sedge::analysis::stemmer::IdentityStemmer;
/// use sedge::analysis::stems_with_components;
/// use sedge::position::PositionKey;
///
/// let stems = stems_with_components(
///     &[(10, "well-known".to_string()), (11, "facts".to_string())],
///     &IdentityStemmer::new(),
/// );
/// assert_eq!(stems.len(), 4);
/// assert!(stems.contains(&(PositionKey::Whole(10), "well-known".to_string())));
/// assert!(stems.contains(&(
///     PositionKey::Component { parent: 10, component: 2 },
///     "known".to_string()
/// )));
/// ```
pub fn stems_with_components(
    words: &[(i32, String)],
    stemmer: &dyn Stemmer,
) -> Vec<(PositionKey, String)> {
    let mut stems = Vec::with_capacity(words.len());
    for (position, word) in words {
        let stem = stemmer.stem_word(word, false);
        let is_compound = stem.contains(COMPOUND_CHARS);
        stems.push((PositionKey::Whole(*position), stem));

        if is_compound {
            let mut component = 0u8;
            for part in word.split(COMPOUND_CHARS) {
                if part.is_empty() {
                    continue;
                }
                if component == u8::MAX {
                    break;
                }
                component += 1;
                if part == word {
                    continue;
                }
                stems.push((
                    PositionKey::Component {
                        parent: *position,
                        component,
                    },
                    stemmer.stem_word(part, false),
                ));
            }
        }
    }
    stems
}
