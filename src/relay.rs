use crate::{
    registry::{truncate, ConnId, Registry, MAX_TEXT_LEN},
    RoomAllowList, RoomCode, ServerEvent,
};
use std::sync::Arc;

/**
An outbound emission decided by the [`RelayEngine`].

The engine never talks to the transport directly; each inbound event
yields a list of these, and the transport adapter delivers them. This
keeps the whole state machine deterministic and unit-testable without a
live websocket.
*/
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Deliver to the connection that triggered the event, and no one
    /// else.
    ToSender(ServerEvent),

    /// Fan out to every current member of `room`, optionally excluding
    /// one connection (the actor, for join/leave notices).
    ToRoom {
        /// the target room
        room: RoomCode,
        /// a connection to skip during delivery
        exclude: Option<ConnId>,
        /// the event to deliver
        event: ServerEvent,
    },
}

/**
The relay engine: the sole owner and writer of the connection registry.

Each method corresponds to one inbound event and applies the state
transition plus the emissions of the relay's per-connection state
machine: `Unjoined` → `Joined(room)` on a successful join (switching
rooms is a direct `Joined(A)` → `Joined(B)` reassignment with no
intermediate unjoined state), back to `Unjoined` on leave, and terminal
removal on disconnect.

Out-of-sequence actions — chat or leave before any join — are silent
no-ops rather than errors; the engine tolerates stale or racy input.
*/
#[derive(Debug)]
pub struct RelayEngine {
    allow_list: RoomAllowList,
    registry: Arc<Registry>,
}

impl RelayEngine {
    /// Constructs an engine over a fresh registry, admitting only the
    /// provided room codes.
    pub fn new(allow_list: RoomAllowList) -> Self {
        Self {
            allow_list,
            registry: Arc::new(Registry::default()),
        }
    }

    /// Shared handle to the registry, for membership checks at
    /// delivery time.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// A new connection was established: create its blank registry
    /// record. Emits nothing.
    pub fn connect(&self, id: ConnId) {
        self.registry.insert(id);
        log::debug!("{id} connected ({} live)", self.registry.len());
    }

    /**
    A `joinRoom` request.

    If the normalized code is not in the allow-list, the sender alone
    receives `invalidRoom` and no state changes. Otherwise the
    connection's name and room are stored (replacing any prior room in
    the same step), the sender receives `joined` with the normalized
    code, and the other members of the room receive a system notice.
    */
    pub fn join(&self, id: ConnId, name: &str, code: &str) -> Vec<Outbound> {
        let room = RoomCode::new(code);
        if !self.allow_list.is_valid(&room) {
            log::debug!("{id} attempted to join unknown room {room:?}");
            return vec![Outbound::ToSender(ServerEvent::InvalidRoom)];
        }

        self.registry.set_name(id, name);
        self.registry.set_room(id, room.clone());
        let display_name = self.registry.display_name(id);
        log::info!("{id} joined {room} as {display_name}");

        vec![
            Outbound::ToSender(ServerEvent::Joined(room.clone())),
            Outbound::ToRoom {
                room,
                exclude: Some(id),
                event: ServerEvent::System(format!("{display_name} joined the room")),
            },
        ]
    }

    /**
    A `leaveRoom` request.

    Clears the room assignment and notifies the remaining members. If
    the connection was not in a room, this is a no-op with no
    emissions.
    */
    pub fn leave(&self, id: ConnId) -> Vec<Outbound> {
        let Some(room) = self.registry.clear_room(id) else {
            return Vec::new();
        };

        let name = self
            .registry
            .name_of(id)
            .unwrap_or_else(|| String::from("Someone"));
        log::info!("{id} left {room}");

        vec![Outbound::ToRoom {
            room,
            exclude: Some(id),
            event: ServerEvent::System(format!("{name} left the room")),
        }]
    }

    /**
    A `chat` message.

    Stateless relay: the text is truncated to 500 characters and fanned
    out to every member of the sender's room, the sender included, so
    the sender's client renders its own message through the same
    channel as everyone else's. Chat from a connection that is not in a
    room is silently dropped.
    */
    pub fn chat(&self, id: ConnId, text: &str) -> Vec<Outbound> {
        let Some(room) = self.registry.room_of(id) else {
            log::debug!("{id} sent chat without a room; dropped");
            return Vec::new();
        };

        vec![Outbound::ToRoom {
            room,
            exclude: None,
            event: ServerEvent::Chat {
                name: self.registry.display_name(id),
                text: String::from(truncate(text, MAX_TEXT_LEN)),
            },
        }]
    }

    /**
    The transport reported a disconnect.

    Removes the registry record unconditionally. The remaining room
    members receive a leave notice only if the connection had both a
    room and a name. Disconnecting an already-absent connection is a
    no-op.
    */
    pub fn disconnect(&self, id: ConnId) -> Vec<Outbound> {
        let Some(member) = self.registry.remove(id) else {
            return Vec::new();
        };
        log::debug!("{id} disconnected ({} live)", self.registry.len());

        match (member.room, member.name) {
            (Some(room), Some(name)) => vec![Outbound::ToRoom {
                room,
                exclude: Some(id),
                event: ServerEvent::System(format!("{name} left the room")),
            }],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ANONYMOUS, MAX_NAME_LEN};

    fn engine() -> RelayEngine {
        RelayEngine::new(RoomAllowList::from_delimited("PINE123,LAKE777"))
    }

    fn conn(engine: &RelayEngine, id: u64) -> ConnId {
        let id = ConnId::new(id);
        engine.connect(id);
        id
    }

    fn system(room: &str, exclude: ConnId, message: &str) -> Outbound {
        Outbound::ToRoom {
            room: RoomCode::new(room),
            exclude: Some(exclude),
            event: ServerEvent::System(String::from(message)),
        }
    }

    #[test]
    fn join_with_valid_code_normalizes_and_notifies() {
        let engine = engine();
        let a = conn(&engine, 1);

        let out = engine.join(a, "Ann", "pine123 ");
        assert_eq!(
            out,
            vec![
                Outbound::ToSender(ServerEvent::Joined(RoomCode::new("PINE123"))),
                system("PINE123", a, "Ann joined the room"),
            ]
        );
        assert_eq!(engine.registry().room_of(a), Some(RoomCode::new("PINE123")));
        assert_eq!(engine.registry().members_of(&RoomCode::new("PINE123")), vec![a]);
    }

    #[test]
    fn join_with_invalid_code_changes_nothing() {
        let engine = engine();
        let c = conn(&engine, 1);

        let out = engine.join(c, "C", "NOPE");
        assert_eq!(out, vec![Outbound::ToSender(ServerEvent::InvalidRoom)]);
        assert_eq!(engine.registry().room_of(c), None);
        assert_eq!(engine.registry().name_of(c), None);
    }

    #[test]
    fn switching_rooms_is_a_single_reassignment() {
        let engine = engine();
        let a = conn(&engine, 1);
        engine.join(a, "Ann", "PINE123");

        let out = engine.join(a, "Ann", "LAKE777");
        assert_eq!(
            out,
            vec![
                Outbound::ToSender(ServerEvent::Joined(RoomCode::new("LAKE777"))),
                system("LAKE777", a, "Ann joined the room"),
            ]
        );
        assert!(engine.registry().members_of(&RoomCode::new("PINE123")).is_empty());
        assert_eq!(engine.registry().members_of(&RoomCode::new("LAKE777")), vec![a]);
    }

    #[test]
    fn empty_name_becomes_anonymous() {
        let engine = engine();
        let a = conn(&engine, 1);

        let out = engine.join(a, "   ", "PINE123");
        assert_eq!(
            out[1],
            system("PINE123", a, "Anonymous joined the room")
        );
        assert_eq!(engine.registry().display_name(a), ANONYMOUS);
    }

    #[test]
    fn long_names_are_truncated_before_notices() {
        let engine = engine();
        let a = conn(&engine, 1);

        engine.join(a, &"x".repeat(50), "PINE123");
        let name = engine.registry().name_of(a).unwrap();
        assert_eq!(name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn chat_fans_out_to_the_whole_room_including_sender() {
        let engine = engine();
        let a = conn(&engine, 1);
        engine.join(a, "Ann", "PINE123");

        let out = engine.chat(a, "hi");
        assert_eq!(
            out,
            vec![Outbound::ToRoom {
                room: RoomCode::new("PINE123"),
                exclude: None,
                event: ServerEvent::Chat {
                    name: String::from("Ann"),
                    text: String::from("hi"),
                },
            }]
        );
    }

    #[test]
    fn chat_text_is_truncated_to_500_characters() {
        let engine = engine();
        let a = conn(&engine, 1);
        engine.join(a, "Ann", "PINE123");

        let out = engine.chat(a, &"y".repeat(600));
        let Outbound::ToRoom { event: ServerEvent::Chat { text, .. }, .. } = &out[0] else {
            panic!("expected a chat fan-out, got {out:?}");
        };
        assert_eq!(text.chars().count(), 500);
    }

    #[test]
    fn chat_without_a_room_is_silently_dropped() {
        let engine = engine();
        let a = conn(&engine, 1);
        assert!(engine.chat(a, "hello?").is_empty());
    }

    #[test]
    fn leave_notifies_remaining_members() {
        let engine = engine();
        let a = conn(&engine, 1);
        engine.join(a, "Ann", "PINE123");

        let out = engine.leave(a);
        assert_eq!(out, vec![system("PINE123", a, "Ann left the room")]);
        assert_eq!(engine.registry().room_of(a), None);
    }

    #[test]
    fn leave_without_a_room_is_a_noop() {
        let engine = engine();
        let a = conn(&engine, 1);
        assert!(engine.leave(a).is_empty());
        assert!(engine.leave(a).is_empty());
    }

    #[test]
    fn disconnect_after_join_emits_a_leave_notice() {
        let engine = engine();
        let b = conn(&engine, 2);
        engine.join(b, "Ben", "PINE123");

        let out = engine.disconnect(b);
        assert_eq!(out, vec![system("PINE123", b, "Ben left the room")]);
        assert!(engine.registry().members_of(&RoomCode::new("PINE123")).is_empty());
    }

    #[test]
    fn disconnect_before_join_is_silent() {
        let engine = engine();
        let a = conn(&engine, 1);
        assert!(engine.disconnect(a).is_empty());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let engine = engine();
        let a = conn(&engine, 1);
        engine.join(a, "Ann", "PINE123");

        assert_eq!(engine.disconnect(a).len(), 1);
        assert!(engine.disconnect(a).is_empty());
    }

    #[test]
    fn two_member_session_scenario() {
        let engine = engine();
        let a = conn(&engine, 1);
        let b = conn(&engine, 2);
        let pine = RoomCode::new("PINE123");

        let out = engine.join(a, "Ann", "pine123 ");
        assert_eq!(out[0], Outbound::ToSender(ServerEvent::Joined(pine.clone())));
        assert_eq!(engine.registry().members_of(&pine), vec![a]);

        // B joins: B gets `joined`, the notice excludes B itself
        let out = engine.join(b, "Ben", "PINE123");
        assert_eq!(out[0], Outbound::ToSender(ServerEvent::Joined(pine.clone())));
        assert_eq!(out[1], system("PINE123", b, "Ben joined the room"));
        let members = engine.registry().members_of(&pine);
        assert_eq!(members.len(), 2);
        assert!(members.contains(&a) && members.contains(&b));

        // chat reaches the whole room, sender included
        let out = engine.chat(a, "hi");
        assert_eq!(
            out,
            vec![Outbound::ToRoom {
                room: pine.clone(),
                exclude: None,
                event: ServerEvent::Chat {
                    name: String::from("Ann"),
                    text: String::from("hi"),
                },
            }]
        );

        // B disconnects: A is notified, membership shrinks to {A}
        let out = engine.disconnect(b);
        assert_eq!(out, vec![system("PINE123", b, "Ben left the room")]);
        assert_eq!(engine.registry().members_of(&pine), vec![a]);
    }
}
