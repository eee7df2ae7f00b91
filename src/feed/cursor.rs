use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in the recent changes log.
///
/// `id` is the source's `rcid`, which increases with insertion order and is
/// what ordering decisions are made on. `timestamp` is carried along because
/// the source can only be bounded by time (`rcend`), not by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub timestamp: String,
    pub id: u64,
}

impl Cursor {
    pub fn new(timestamp: impl Into<String>, id: u64) -> Self {
        Self {
            timestamp: timestamp.into(),
            id,
        }
    }

    /// Returns true if a change with this id has not been seen yet.
    pub fn is_before(&self, id: u64) -> bool {
        id > self.id
    }

    /// Move to `next` unless that would go backward.
    ///
    /// Returns false (and leaves the cursor untouched) if `next` is older.
    pub fn advance_to(&mut self, next: Cursor) -> bool {
        if next.id < self.id {
            return false;
        }
        *self = next;
        true
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_before_is_strict() {
        let cursor = Cursor::new("2024-05-01T10:00:00Z", 5);
        assert!(!cursor.is_before(4));
        assert!(!cursor.is_before(5));
        assert!(cursor.is_before(6));
    }

    #[test]
    fn test_advance_never_moves_backward() {
        let mut cursor = Cursor::new("2024-05-01T10:00:00Z", 10);

        assert!(!cursor.advance_to(Cursor::new("2024-05-01T09:00:00Z", 9)));
        assert_eq!(cursor.id, 10);

        assert!(cursor.advance_to(Cursor::new("2024-05-01T10:00:00Z", 10)));
        assert!(cursor.advance_to(Cursor::new("2024-05-01T11:00:00Z", 12)));
        assert_eq!(cursor, Cursor::new("2024-05-01T11:00:00Z", 12));
    }

    #[test]
    fn test_display() {
        let cursor = Cursor::new("2024-05-01T10:00:00Z", 42);
        assert_eq!(cursor.to_string(), "42@2024-05-01T10:00:00Z");
    }
}
