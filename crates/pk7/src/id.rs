//! UUIDv7 identifiers.
//!
//! Version 7 UUIDs start with a millisecond Unix timestamp, so keys generated
//! later sort later and B-tree inserts stay mostly append-only.

use uuid::Uuid;

/// A fresh version 7 UUID.
pub fn new_identifier() -> Uuid {
    Uuid::now_v7()
}

/// Fill `slot` with a new identifier unless it already holds one.
///
/// Returns the identifier the slot ends up with. This is the hook to call
/// right before inserting a row whose primary key the application assigns.
pub fn assign_identifier(slot: &mut Option<Uuid>) -> Uuid {
    *slot.get_or_insert_with(new_identifier)
}

/// An entity whose primary key is assigned by the application.
pub trait HasIdentifier {
    fn identifier_slot(&mut self) -> &mut Option<Uuid>;

    /// Assign a UUIDv7 primary key if none is set yet.
    fn ensure_identifier(&mut self) -> Uuid {
        assign_identifier(self.identifier_slot())
    }
}
