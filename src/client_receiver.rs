use crate::{
    registry::{ConnId, Registry},
    relay_central::RoomMessage,
    ServerEvent,
};
use async_broadcast::Receiver as BroadcastReceiver;
use async_channel::Receiver;
use futures_lite::Stream;
use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

/**
The outbound event stream for one connection.

Merges the client's direct queue (replies addressed to it alone) with
the process-wide room broadcast bus. Broadcast items are filtered at
delivery time: a [`RoomMessage`] is yielded only if the registry
currently assigns this connection to the message's room and the message
does not exclude it. Filtering against the live registry means fan-out
reflects membership at the moment of delivery, and a connection that
switched rooms stops receiving its old room's traffic immediately.

The stream ends when the direct queue's sender is dropped, which
happens when the connection's state is torn down.
*/
#[derive(Debug)]
pub struct ClientReceiver {
    id: ConnId,
    direct: Receiver<ServerEvent>,
    broadcast: BroadcastReceiver<RoomMessage>,
    registry: Arc<Registry>,
}

impl ClientReceiver {
    pub(crate) fn new(
        id: ConnId,
        direct: Receiver<ServerEvent>,
        broadcast: BroadcastReceiver<RoomMessage>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            id,
            direct,
            broadcast,
            registry,
        }
    }

    fn wants(&self, message: &RoomMessage) -> bool {
        message.exclude != Some(self.id) && self.registry.room_of(self.id) == Some(message.room.clone())
    }
}

impl Stream for ClientReceiver {
    type Item = ServerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.direct).poll_next(cx) {
            Poll::Ready(Some(event)) => return Poll::Ready(Some(event)),
            Poll::Ready(None) => return Poll::Ready(None),
            Poll::Pending => {}
        }

        loop {
            return match Pin::new(&mut self.broadcast).poll_next(cx) {
                Poll::Ready(Some(message)) if !self.wants(&message) => continue,
                Poll::Ready(Some(message)) => Poll::Ready(Some(message.event)),
                // the central's sender outlives every receiver, so a
                // closed bus only happens at shutdown; the direct queue
                // governs this stream's termination
                Poll::Ready(None) | Poll::Pending => Poll::Pending,
            };
        }
    }
}
