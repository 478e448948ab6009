use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/**
A normalized room code.

Construction trims surrounding whitespace and upper-cases the input, so
`"pine123 "` and `"PINE123"` compare equal. Room codes are compared and
hashed in this normalized form everywhere; raw client input never
reaches a comparison.
*/
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes the provided raw code into a [`RoomCode`].
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    /// Returns true if the normalized code is empty. An empty code can
    /// never be a member of an allow-list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for RoomCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for RoomCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
