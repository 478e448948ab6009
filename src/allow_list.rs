use crate::RoomCode;
use std::collections::HashSet;

/// The built-in room codes used when no configuration is provided or
/// the provided configuration contains no usable entries.
pub const DEFAULT_ROOM_CODES: [&str; 3] = ["PINE123", "LAKE777", "CAMP999"];

/**
The set of room codes clients are allowed to join.

Built once at startup, most commonly from the `ROOM_CODES` environment
variable via [`RoomAllowList::from_delimited`], and read-only for the
lifetime of the process. An empty or malformed configuration value
degrades to [`DEFAULT_ROOM_CODES`] rather than failing.
*/
#[derive(Debug, Clone)]
pub struct RoomAllowList {
    codes: HashSet<RoomCode>,
}

impl Default for RoomAllowList {
    fn default() -> Self {
        Self {
            codes: DEFAULT_ROOM_CODES.iter().map(|c| RoomCode::new(c)).collect(),
        }
    }
}

impl RoomAllowList {
    /**
    Builds an allow-list from a comma-delimited configuration value.

    Entries are normalized like any other room code and empty entries
    are dropped. If no entries survive, the default set is used.
    */
    pub fn from_delimited(value: &str) -> Self {
        let codes = value
            .split(',')
            .map(RoomCode::new)
            .filter(|code| !code.is_empty())
            .collect::<HashSet<_>>();

        if codes.is_empty() {
            Self::default()
        } else {
            Self { codes }
        }
    }

    /// Returns true if the provided (already normalized) code is a
    /// member of this allow-list.
    pub fn is_valid(&self, code: &RoomCode) -> bool {
        self.codes.contains(code)
    }

    /// The number of configured room codes.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true if the allow-list has no codes. Unreachable through
    /// the constructors, which degrade to the default set instead.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_delimited_normalizes_entries() {
        let list = RoomAllowList::from_delimited(" pine123 ,lake777,  CAMP999");
        assert_eq!(list.len(), 3);
        assert!(list.is_valid(&RoomCode::new("PINE123")));
        assert!(list.is_valid(&RoomCode::new("lake777 ")));
        assert!(!list.is_valid(&RoomCode::new("RIVER000")));
    }

    #[test]
    fn empty_entries_are_dropped() {
        let list = RoomAllowList::from_delimited("PINE123,, , LAKE777,");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn blank_configuration_degrades_to_defaults() {
        for value in ["", "   ", ",,,"] {
            let list = RoomAllowList::from_delimited(value);
            assert_eq!(list.len(), DEFAULT_ROOM_CODES.len());
            assert!(list.is_valid(&RoomCode::new("PINE123")));
        }
    }

    #[test]
    fn validity_matches_normalized_membership() {
        let list = RoomAllowList::from_delimited("PINE123");
        assert!(list.is_valid(&RoomCode::new("pine123 ")));
        assert!(!list.is_valid(&RoomCode::new("pine1234")));
        assert!(!list.is_valid(&RoomCode::new("")));
    }
}
