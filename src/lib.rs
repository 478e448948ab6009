//! # A room-code gated chat relay over websockets
//!
//! Clients connect over a websocket, join one of a fixed set of
//! allow-listed rooms by code, and exchange short text messages that
//! are fanned out to every member of the room, with server-generated
//! join/leave notices. Rooms are pre-provisioned (for example a fixed
//! set of camp room codes); there is no room creation, persistence, or
//! authentication beyond knowing a valid code.
//!
//! The crate splits into a deterministic core and a thin transport
//! adapter:
//!
//! - [`RoomAllowList`] — the valid room codes, built once at startup.
//! - [`Registry`] — per-connection room/name state and the derived
//!   room membership view.
//! - [`RelayEngine`] — the state machine: each inbound event becomes a
//!   registry transition plus a list of [`Outbound`] emissions, with no
//!   transport involvement, so the whole behavior is unit-testable.
//! - [`RelayCentral`] — the [`trillium_websockets`] adapter that feeds
//!   the engine and delivers its emissions over per-client queues and
//!   a room broadcast bus.
//!
//! ## Wire protocol
//!
//! Events are JSON envelopes of the form `{"event": ..., "payload":
//! ...}`. Clients send `joinRoom` (`{name, code}`), `leaveRoom`, and
//! `chat` (raw text); the server emits `joined`, `invalidRoom`,
//! `system` notices, and `chat` (`{name, text}`). See [`ClientEvent`]
//! and [`ServerEvent`].
//!
//! ## Example
//!
//! ```
//! use camp_chat::{chat_relay, RoomAllowList};
//! use trillium_router::router;
//!
//! let handler = router()
//!     .get("/ws", chat_relay(RoomAllowList::from_delimited("PINE123,LAKE777")));
//! // trillium_smol::run(handler);
//! ```

#![forbid(unsafe_code)]
#![deny(
    missing_copy_implementations,
    missing_debug_implementations,
    nonstandard_style,
    rustdoc::missing_crate_level_docs,
    unused_qualifications
)]
#![warn(missing_docs)]

mod room_code;
pub use room_code::RoomCode;

mod allow_list;
pub use allow_list::{RoomAllowList, DEFAULT_ROOM_CODES};

mod registry;
pub use registry::{ConnId, Member, Registry, ANONYMOUS, MAX_NAME_LEN, MAX_TEXT_LEN};

mod events;
pub use events::{ClientEvent, ServerEvent};

mod relay;
pub use relay::{Outbound, RelayEngine};

mod relay_central;
pub use relay_central::RelayCentral;

pub(crate) mod client_receiver;

use trillium_websockets::{JsonHandler, WebSocket};

/**
Constructs the chat relay as a trillium handler admitting the provided
room codes.

Mount it wherever websocket upgrades should be accepted, typically
under a router:

```
use camp_chat::{chat_relay, RoomAllowList};
use trillium_router::router;

let handler = router().get("/ws", chat_relay(RoomAllowList::default()));
```
*/
pub fn chat_relay(allow_list: RoomAllowList) -> WebSocket<JsonHandler<RelayCentral>> {
    WebSocket::new_json(RelayCentral::new(RelayEngine::new(allow_list)))
}
