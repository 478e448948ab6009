use crate::RoomCode;
use serde::{Deserialize, Serialize};

/**
Events sent by clients, as `{"event": ..., "payload": ...}` JSON
envelopes.

Missing string fields deserialize to their defaults so that a sparse
`joinRoom` payload is coerced rather than rejected; the registry applies
the trimming, truncation, and `"Anonymous"` substitution rules.
*/
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Request to join the room identified by `code` under the
    /// provided display name.
    JoinRoom {
        /// requested display name; empty or absent becomes "Anonymous"
        #[serde(default)]
        name: String,
        /// room code, normalized before the allow-list check
        #[serde(default)]
        code: String,
    },

    /// Request to leave the current room. No payload.
    LeaveRoom,

    /// A chat message for the current room; the payload is the raw
    /// text.
    Chat(String),
}

/**
Events emitted by the relay, in the same envelope shape as
[`ClientEvent`].

`System` and `Chat` are room fan-outs; `InvalidRoom` and `Joined` are
only ever sent to the connection that triggered them.
*/
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The requested room code is not in the allow-list.
    InvalidRoom,

    /// The join succeeded; the payload is the normalized room code.
    Joined(RoomCode),

    /// A server-generated join/leave notice.
    System(String),

    /// A relayed chat message.
    Chat {
        /// the sender's display name at the time of sending
        name: String,
        /// the message text, truncated to 500 characters
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_use_the_wire_envelope() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"joinRoom","payload":{"name":"Ann","code":"pine123"}}"#)
                .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                name: String::from("Ann"),
                code: String::from("pine123"),
            }
        );

        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"chat","payload":"hi"}"#).unwrap();
        assert_eq!(event, ClientEvent::Chat(String::from("hi")));

        let event: ClientEvent = serde_json::from_str(r#"{"event":"leaveRoom"}"#).unwrap();
        assert_eq!(event, ClientEvent::LeaveRoom);
    }

    #[test]
    fn sparse_join_payloads_are_coerced_not_rejected() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"joinRoom","payload":{}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                name: String::new(),
                code: String::new(),
            }
        );
    }

    #[test]
    fn server_events_serialize_with_camel_case_names() {
        let json = serde_json::to_string(&ServerEvent::InvalidRoom).unwrap();
        assert_eq!(json, r#"{"event":"invalidRoom"}"#);

        let json = serde_json::to_string(&ServerEvent::Joined(RoomCode::new("pine123"))).unwrap();
        assert_eq!(json, r#"{"event":"joined","payload":"PINE123"}"#);

        let json = serde_json::to_string(&ServerEvent::Chat {
            name: String::from("Ann"),
            text: String::from("hi"),
        })
        .unwrap();
        assert_eq!(json, r#"{"event":"chat","payload":{"name":"Ann","text":"hi"}}"#);
    }
}
