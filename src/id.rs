//! External document identifiers.
//!
//! An [`ExternalId`] is the only identifier exposed across component
//! boundaries: the pair of a host-supplied string id and an optional
//! positive instance id. Internally the storage maps it to a surrogate
//! integer key, but that key never leaves the storage layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable document identity: `(instance_id?, id)`.
///
/// Equality is structural. The serialized form is
/// `"<instance_or_empty>:<id>"`, e.g. `"3:doc-17"` or `":doc-17"`.
///
/// # Examples
///
/// ```
/// use sedge::id::ExternalId;
///
/// let plain = ExternalId::new("doc-17");
/// assert_eq!(plain.to_string(), ":doc-17");
///
/// let scoped = ExternalId::with_instance("doc-17", 3);
/// assert_eq!(scoped.to_string(), "3:doc-17");
/// assert_ne!(plain, scoped);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExternalId {
    /// Optional instance scope. `None` means the id is global.
    pub instance_id: Option<u32>,

    /// Host-supplied document id.
    pub id: String,
}

impl ExternalId {
    /// Create an id without an instance scope.
    pub fn new<S: Into<String>>(id: S) -> Self {
        ExternalId {
            instance_id: None,
            id: id.into(),
        }
    }

    /// Create an id scoped to an instance.
    pub fn with_instance<S: Into<String>>(id: S, instance_id: u32) -> Self {
        ExternalId {
            instance_id: Some(instance_id),
            id: id.into(),
        }
    }

    /// The instance id in its persisted encoding, where 0 means absent.
    pub fn instance_or_zero(&self) -> u32 {
        self.instance_id.unwrap_or(0)
    }

    /// Rebuild an id from its persisted columns.
    pub fn from_columns(id: String, instance_id: u32) -> Self {
        ExternalId {
            instance_id: if instance_id == 0 {
                None
            } else {
                Some(instance_id)
            },
            id,
        }
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance_id {
            Some(instance) => write!(f, "{}:{}", instance, self.id),
            None => write!(f, ":{}", self.id),
        }
    }
}
