use crate::RoomCode;
use dashmap::DashMap;
use std::fmt::{self, Display, Formatter};

/// Display names are truncated to this many characters.
pub const MAX_NAME_LEN: usize = 30;

/// Chat text is truncated to this many characters.
pub const MAX_TEXT_LEN: usize = 500;

/// Substituted when a display name is empty after trimming.
pub const ANONYMOUS: &str = "Anonymous";

/// An opaque identifier for one live connection, minted by the
/// transport adapter when the websocket session is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnId(u64);

impl ConnId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

impl Display for ConnId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection registry record: the assigned room, if any, and the
/// display name, if one has been set by a join.
#[derive(Debug, Default, Clone)]
pub struct Member {
    pub(crate) room: Option<RoomCode>,
    pub(crate) name: Option<String>,
}

/**
The connection registry: one record per live connection, keyed by
[`ConnId`].

Mutated only by the relay engine. The registry is also the single
source of truth for room membership — [`Registry::members_of`] is a
view derived from the records, so membership can never diverge from the
room assignments. Every mutation is a single entry operation, so a
connection is never observable in two rooms at once.

No operation fails: operations on an absent id are no-ops and malformed
input is coerced (trimmed, truncated, defaulted) rather than rejected.
*/
#[derive(Debug, Default)]
pub struct Registry {
    connections: DashMap<ConnId, Member>,
}

impl Registry {
    /// Creates a blank record for a newly established connection.
    pub fn insert(&self, id: ConnId) {
        self.connections.insert(id, Member::default());
    }

    /// Deletes the record entirely. Returns the removed record, or
    /// `None` if the id was absent or already removed.
    pub fn remove(&self, id: ConnId) -> Option<Member> {
        self.connections.remove(&id).map(|(_, member)| member)
    }

    /// Assigns the connection to a room, replacing any prior
    /// assignment in the same step.
    pub fn set_room(&self, id: ConnId, room: RoomCode) {
        if let Some(mut member) = self.connections.get_mut(&id) {
            member.room = Some(room);
        }
    }

    /// Clears the room assignment, returning the vacated room. No-op
    /// if the connection was not in a room.
    pub fn clear_room(&self, id: ConnId) -> Option<RoomCode> {
        self.connections
            .get_mut(&id)
            .and_then(|mut member| member.room.take())
    }

    /// Stores the trimmed display name, truncated to [`MAX_NAME_LEN`]
    /// characters, substituting [`ANONYMOUS`] when empty.
    pub fn set_name(&self, id: ConnId, raw: &str) {
        if let Some(mut member) = self.connections.get_mut(&id) {
            let name = truncate(raw.trim(), MAX_NAME_LEN);
            member.name = Some(if name.is_empty() {
                String::from(ANONYMOUS)
            } else {
                String::from(name)
            });
        }
    }

    /// The connection's current room, if any.
    pub fn room_of(&self, id: ConnId) -> Option<RoomCode> {
        self.connections.get(&id).and_then(|member| member.room.clone())
    }

    /// The connection's stored display name, if a join has set one.
    pub fn name_of(&self, id: ConnId) -> Option<String> {
        self.connections.get(&id).and_then(|member| member.name.clone())
    }

    /// The name used when emitting on behalf of this connection,
    /// falling back to [`ANONYMOUS`].
    pub fn display_name(&self, id: ConnId) -> String {
        self.name_of(id).unwrap_or_else(|| String::from(ANONYMOUS))
    }

    /// The membership index: exactly the live connections whose record
    /// assigns them to `room`.
    pub fn members_of(&self, room: &RoomCode) -> Vec<ConnId> {
        self.connections
            .iter()
            .filter(|entry| entry.value().room.as_ref() == Some(room))
            .map(|entry| *entry.key())
            .collect()
    }

    /// The number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if no connections are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

/// Truncates to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((index, _)) => &s[..index],
        None => s,
    }
}
