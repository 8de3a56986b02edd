//! Word positions and the packed wire format.
//!
//! In memory a position is a tagged [`PositionKey`]: either a whole-word
//! position or a synthetic component position derived from compound-word
//! decomposition. At persistence time keys flatten to decimal tokens so the
//! packed string stored per `(word, document)` row stays compatible with
//! existing databases:
//!
//! - `t<int>`: title position
//! - `k<int>`: keyword position
//! - `<int>`: content position
//! - `<int>.001`, `<int>.002`, ...: synthetic component positions
//!
//! All tokens for one row are comma-separated in a single packed list.
//! Reads truncate synthetic keys to their parent integer, so ranking sees
//! compound components as colocated neighbours while snippet lookup keys off
//! integer positions only.

use crate::error::{Result, SedgeError};

/// A word position, whole or synthetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PositionKey {
    /// Canonical integer position of a word.
    Whole(i32),

    /// Synthetic position of the k-th component of a compound word
    /// (1-indexed). Persisted as `parent + 0.001·component`.
    Component {
        /// Position of the compound the component came from.
        parent: i32,
        /// 1-indexed component ordinal.
        component: u8,
    },
}

impl PositionKey {
    /// The parent integer position; components truncate to their parent.
    pub fn truncated(&self) -> i32 {
        match *self {
            PositionKey::Whole(p) => p,
            PositionKey::Component { parent, .. } => parent,
        }
    }

    /// Flatten to the decimal wire token (without a field prefix).
    pub fn wire(&self) -> String {
        match *self {
            PositionKey::Whole(p) => p.to_string(),
            PositionKey::Component { parent, component } => {
                format!("{}.{:03}", parent, component)
            }
        }
    }

    /// Parse a decimal wire token back into a key.
    pub fn parse(token: &str) -> Result<PositionKey> {
        match token.split_once('.') {
            None => {
                let p = token.parse::<i32>().map_err(|_| {
                    SedgeError::invalid_argument(format!("bad position token: {token:?}"))
                })?;
                Ok(PositionKey::Whole(p))
            }
            Some((parent, frac)) => {
                let parent = parent.parse::<i32>().map_err(|_| {
                    SedgeError::invalid_argument(format!("bad position token: {token:?}"))
                })?;
                let component = frac.trim_start_matches('0').parse::<u8>().map_err(|_| {
                    SedgeError::invalid_argument(format!("bad position token: {token:?}"))
                })?;
                Ok(PositionKey::Component { parent, component })
            }
        }
    }

    /// Ordering key for deterministic packing.
    fn sort_key(&self) -> (i32, u8) {
        match *self {
            PositionKey::Whole(p) => (p, 0),
            PositionKey::Component { parent, component } => (parent, component),
        }
    }
}

/// The field a position belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Document title.
    Title,
    /// Host-supplied keywords.
    Keyword,
    /// Body content.
    Content,
}

impl FieldKind {
    fn prefix(&self) -> &'static str {
        match self {
            FieldKind::Title => "t",
            FieldKind::Keyword => "k",
            FieldKind::Content => "",
        }
    }
}

/// Integer positions of one word in one document, split by field.
///
/// This is the in-memory form of an unpacked position list: synthetic keys
/// have already been truncated to their parent integer, deduplicated and
/// sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPositions {
    /// Title positions.
    pub title: Vec<i32>,
    /// Keyword positions.
    pub keyword: Vec<i32>,
    /// Content positions.
    pub content: Vec<i32>,
}

impl FieldPositions {
    /// True when no field holds a position.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.keyword.is_empty() && self.content.is_empty()
    }
}

/// Pack three per-field key lists into the comma-separated wire string.
///
/// Tokens are emitted title first, then keyword, then content, each field in
/// ascending position order, so packing is deterministic.
pub fn pack_positions(
    title: &[PositionKey],
    keyword: &[PositionKey],
    content: &[PositionKey],
) -> String {
    let mut tokens = Vec::with_capacity(title.len() + keyword.len() + content.len());
    for (field, keys) in [
        (FieldKind::Title, title),
        (FieldKind::Keyword, keyword),
        (FieldKind::Content, content),
    ] {
        let mut keys: Vec<PositionKey> = keys.to_vec();
        keys.sort_by_key(|k| k.sort_key());
        for key in keys {
            tokens.push(format!("{}{}", field.prefix(), key.wire()));
        }
    }
    tokens.join(",")
}

/// Unpack a packed wire string into integer positions per field.
///
/// Synthetic tokens are truncated to their parent integer; the truncation
/// collision with the parent position is deliberate, so each field list is
/// deduplicated and sorted.
pub fn unpack_positions(packed: &str) -> Result<FieldPositions> {
    let mut positions = FieldPositions::default();
    for token in packed.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let (field, rest) = match token.as_bytes()[0] {
            b't' => (FieldKind::Title, &token[1..]),
            b'k' => (FieldKind::Keyword, &token[1..]),
            _ => (FieldKind::Content, token),
        };
        let value = PositionKey::parse(rest)?.truncated();
        match field {
            FieldKind::Title => positions.title.push(value),
            FieldKind::Keyword => positions.keyword.push(value),
            FieldKind::Content => positions.content.push(value),
        }
    }
    for list in [
        &mut positions.title,
        &mut positions.keyword,
        &mut positions.content,
    ] {
        list.sort_unstable();
        list.dedup();
    }
    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tokens() {
        assert_eq!(PositionKey::Whole(10).wire(), "10");
        assert_eq!(
            PositionKey::Component {
                parent: 10,
                component: 1
            }
            .wire(),
            "10.001"
        );
        assert_eq!(
            PositionKey::Component {
                parent: 10,
                component: 12
            }
            .wire(),
            "10.012"
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for key in [
            PositionKey::Whole(0),
            PositionKey::Whole(2_000_000_000),
            PositionKey::Component {
                parent: 7,
                component: 3,
            },
        ] {
            assert_eq!(PositionKey::parse(&key.wire()).unwrap(), key);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PositionKey::parse("x").is_err());
        assert!(PositionKey::parse("1.x").is_err());
        assert!(PositionKey::parse("").is_err());
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let title = [PositionKey::Whole(0), PositionKey::Whole(1)];
        let keyword = [PositionKey::Whole(5)];
        let content = [
            PositionKey::Whole(10),
            PositionKey::Whole(3),
            PositionKey::Whole(2_147_483_646),
        ];

        let packed = pack_positions(&title, &keyword, &content);
        assert_eq!(packed, "t0,t1,k5,3,10,2147483646");

        let unpacked = unpack_positions(&packed).unwrap();
        assert_eq!(unpacked.title, vec![0, 1]);
        assert_eq!(unpacked.keyword, vec![5]);
        assert_eq!(unpacked.content, vec![3, 10, 2_147_483_646]);
    }

    #[test]
    fn test_synthetic_truncates_to_parent() {
        let content = [
            PositionKey::Whole(10),
            PositionKey::Component {
                parent: 10,
                component: 1,
            },
            PositionKey::Component {
                parent: 10,
                component: 2,
            },
        ];
        let packed = pack_positions(&[], &[], &content);
        assert_eq!(packed, "10,10.001,10.002");

        let unpacked = unpack_positions(&packed).unwrap();
        assert_eq!(unpacked.content, vec![10]);
    }

    #[test]
    fn test_unpack_empty_string() {
        let unpacked = unpack_positions("").unwrap();
        assert!(unpacked.is_empty());
    }
}
