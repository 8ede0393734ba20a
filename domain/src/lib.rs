//! Domain library for the catalog service.
//!
//! This crate is dependency-free (inherits workspace metadata only) and holds
//! the domain types, ports (traits), and error definitions. Keep adapters and
//! IO concerns out of this crate.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// Identifier of a catalog item, in canonical hyphenated UUID text form.
///
/// Ids are minted server-side when an item is created and never change
/// afterwards. They are kept as text end to end: wire, store, and logs all
/// see the same representation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(String);

impl ItemId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::InvalidItemId("empty".into()));
        }
        if !is_hyphenated_uuid(&val) {
            return Err(CoreError::InvalidItemId(
                "expected hyphenated uuid".into(),
            ));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// 8-4-4-4-12 hex groups; both cases accepted so that well-formed ids coming
// off the wire never turn into a hard failure.
fn is_hyphenated_uuid(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        8 | 13 | 18 | 23 => *b == b'-',
        _ => b.is_ascii_hexdigit(),
    })
}

/// Input data for creating an item, and equally the replacement payload for
/// an update. Server-assigned fields (id, creation time) are excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
}

/// A catalog item as stored and listed.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    /// Creation instant (UTC). Set once, never changes.
    pub created_date: SystemTime,
}

impl Item {
    /// Assemble a fully-populated item from its input, a freshly minted id,
    /// and the creation instant.
    pub fn new(id: ItemId, input: NewItem, created_date: SystemTime) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            price: input.price,
            created_date,
        }
    }

    /// Replacement value for an update: id and created_date carry over from
    /// the existing item, everything else comes from the input.
    pub fn replaced_with(&self, input: NewItem) -> Self {
        Self {
            id: self.id.clone(),
            name: input.name,
            description: input.description,
            price: input.price,
            created_date: self.created_date,
        }
    }
}

/// Time source abstraction to make code testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Repository port for persisting and loading items.
///
/// Two interchangeable implementations exist: the in-memory adapter in this
/// crate (tests, local dev) and the DynamoDB adapter crate. The HTTP layer
/// depends only on this trait and picks an implementation at startup.
pub trait ItemRepository: Send + Sync {
    /// All items, in no contractual order.
    fn list(&self) -> Result<Vec<Item>, CoreError>;
    /// The item matching `id`, or `Ok(None)` when the id is unknown.
    fn get(&self, id: &ItemId) -> Result<Option<Item>, CoreError>;
    /// Insert a fully-populated item. An id already present is rejected with
    /// `AlreadyExists`.
    fn create(&self, item: Item) -> Result<(), CoreError>;
    /// Replace the stored item sharing this item's id, in full.
    fn update(&self, item: &Item) -> Result<(), CoreError>;
    /// Remove the item matching `id`.
    fn delete(&self, id: &ItemId) -> Result<(), CoreError>;
}

/// Core domain errors (no external error crates to keep deps at zero).
#[derive(Debug)]
pub enum CoreError {
    InvalidItemId(String),
    InvalidName(String),
    InvalidPrice(String),
    AlreadyExists,
    NotFound,
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidItemId(msg) => write!(f, "invalid item id: {}", msg),
            CoreError::InvalidName(msg) => write!(f, "invalid name: {}", msg),
            CoreError::InvalidPrice(msg) => write!(f, "invalid price: {}", msg),
            CoreError::AlreadyExists => write!(f, "resource already exists"),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_accepts_canonical_uuid_text() {
        let id = ItemId::new("b8f9a6e2-1c3d-4e5f-8a9b-0c1d2e3f4a5b").expect("valid id");
        assert_eq!(id.as_str(), "b8f9a6e2-1c3d-4e5f-8a9b-0c1d2e3f4a5b");
    }

    #[test]
    fn item_id_accepts_uppercase_hex() {
        assert!(ItemId::new("B8F9A6E2-1C3D-4E5F-8A9B-0C1D2E3F4A5B").is_ok());
    }

    #[test]
    fn item_id_rejects_empty() {
        let err = ItemId::new("").unwrap_err();
        match err {
            CoreError::InvalidItemId(_) => {}
            _ => panic!("expected InvalidItemId"),
        }
    }

    #[test]
    fn item_id_rejects_malformed_text() {
        assert!(ItemId::new("not-a-uuid").is_err());
        assert!(ItemId::new("b8f9a6e2-1c3d-4e5f-8a9b-0c1d2e3f4a5").is_err()); // 35 chars
        assert!(ItemId::new("b8f9a6e2x1c3d-4e5f-8a9b-0c1d2e3f4a5b").is_err()); // bad separator
    }

    #[test]
    fn replaced_with_keeps_id_and_created_date() {
        let id = ItemId::new("b8f9a6e2-1c3d-4e5f-8a9b-0c1d2e3f4a5b").expect("valid id");
        let original = Item::new(
            id.clone(),
            NewItem {
                name: "Potion".into(),
                description: None,
                price: 9.0,
            },
            SystemTime::UNIX_EPOCH,
        );
        let replaced = original.replaced_with(NewItem {
            name: "Elixir".into(),
            description: Some("stronger".into()),
            price: 15.0,
        });
        assert_eq!(replaced.id, id);
        assert_eq!(replaced.created_date, SystemTime::UNIX_EPOCH);
        assert_eq!(replaced.name, "Elixir");
        assert_eq!(replaced.description.as_deref(), Some("stronger"));
        assert_eq!(replaced.price, 15.0);
    }
}
