//! Identifiers for platform records and refresh-token ids.

use ulid::Ulid;
use uuid::Uuid;

/// Generates primary keys for courses, lessons and the rest, plus token ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort by creation time, so ordering by ID doubles as
    /// "oldest first" for list endpoints.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque random token identifier.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike ULIDs
        Uuid::new_v4().simple().to_string()
    }
}
