use crate::{
    client_receiver::ClientReceiver,
    registry::ConnId,
    relay::{Outbound, RelayEngine},
    ClientEvent, RoomCode, ServerEvent,
};
use async_broadcast::{InactiveReceiver, Sender as BroadcastSender};
use async_channel::Sender;
use std::sync::atomic::{AtomicU64, Ordering};
use trillium::log_error;
use trillium_websockets::{tungstenite::protocol::CloseFrame, JsonWebSocketHandler, Result, WebSocketConn};

const BROADCAST_CAP: usize = 10;

/// A room-scoped fan-out: delivered to every connection whose registry
/// record currently assigns it to `room`, minus the excluded sender.
#[derive(Debug, Clone)]
pub(crate) struct RoomMessage {
    pub(crate) room: RoomCode,
    pub(crate) exclude: Option<ConnId>,
    pub(crate) event: ServerEvent,
}

/// Per-connection handle stored in the websocket conn's state: the
/// minted connection id plus the direct event queue back to this
/// client.
#[derive(Debug, Clone)]
pub(crate) struct RelayClient {
    id: ConnId,
    sender: Sender<ServerEvent>,
}

impl RelayClient {
    pub(crate) fn id(&self) -> ConnId {
        self.id
    }

    async fn send(&self, event: ServerEvent) {
        log_error!(self.sender.send(event).await);
    }
}

/**
The websocket adapter around the [`RelayEngine`].

Implements [`JsonWebSocketHandler`]: each connection gets a
[`RelayClient`] handle in its conn state and a [`ClientReceiver`]
outbound stream. Inbound events are dispatched to the engine, and the
engine's emissions are delivered — direct replies down the client's own
queue, room fan-outs onto a process-wide broadcast bus that every
[`ClientReceiver`] filters against the live registry.
*/
#[derive(Debug)]
pub struct RelayCentral {
    engine: RelayEngine,
    next_id: AtomicU64,
    broadcast_sender: BroadcastSender<RoomMessage>,
    broadcast_receiver: InactiveReceiver<RoomMessage>,
}

impl RelayCentral {
    pub(crate) fn new(engine: RelayEngine) -> Self {
        let (mut broadcast_sender, broadcast_receiver) = async_broadcast::broadcast(BROADCAST_CAP);
        broadcast_sender.set_overflow(true);
        let broadcast_receiver = broadcast_receiver.deactivate();
        Self {
            engine,
            next_id: AtomicU64::new(0),
            broadcast_sender,
            broadcast_receiver,
        }
    }

    fn build_client(&self) -> (RelayClient, ClientReceiver) {
        let id = ConnId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, direct) = async_channel::unbounded();
        let receiver = ClientReceiver::new(
            id,
            direct,
            self.broadcast_receiver.activate_cloned(),
            self.engine.registry().clone(),
        );
        (RelayClient { id, sender }, receiver)
    }

    async fn deliver(&self, client: &RelayClient, outbound: Vec<Outbound>) {
        for message in outbound {
            match message {
                Outbound::ToSender(event) => client.send(event).await,
                Outbound::ToRoom { room, exclude, event } => {
                    log_error!(self.broadcast_sender.try_broadcast(RoomMessage {
                        room,
                        exclude,
                        event,
                    }));
                }
            }
        }
    }
}

impl JsonWebSocketHandler for RelayCentral {
    type InboundMessage = ClientEvent;
    type OutboundMessage = ServerEvent;
    type StreamType = ClientReceiver;

    async fn connect(&self, conn: &mut WebSocketConn) -> Self::StreamType {
        let (client, receiver) = self.build_client();
        self.engine.connect(client.id());
        conn.insert_state(client);
        receiver
    }

    async fn receive_message(&self, event: Result<Self::InboundMessage>, conn: &mut WebSocketConn) {
        let event = match event {
            Ok(event) => event,
            Err(error) => {
                log::debug!("dropping undeserializable frame: {error}");
                return;
            }
        };

        let Some(client) = conn.state::<RelayClient>() else {
            log::error!("websocket conn without a relay client");
            return;
        };

        let outbound = match event {
            ClientEvent::JoinRoom { name, code } => self.engine.join(client.id(), &name, &code),
            ClientEvent::LeaveRoom => self.engine.leave(client.id()),
            ClientEvent::Chat(text) => self.engine.chat(client.id(), &text),
        };

        self.deliver(client, outbound).await;
    }

    async fn disconnect(&self, conn: &mut WebSocketConn, _close_frame: Option<CloseFrame>) {
        let Some(client) = conn.state::<RelayClient>() else {
            return;
        };
        let outbound = self.engine.disconnect(client.id());
        self.deliver(client, outbound).await;
    }
}
