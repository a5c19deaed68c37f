//! # Subsystem Driver
//!
//! Feeds bridge events, local shares and control signals from a channel
//! into the service, one message at a time.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use crate::events::{DistributionMessage, NeighborPacket, NetworkBridgeEvent, Signal};
use crate::ports::inbound::StatementDistributionApi;

/// Event loop around a [`StatementDistributionApi`].
pub struct StatementDistributionSubsystem<A: StatementDistributionApi> {
    api: Arc<A>,
}

impl<A: StatementDistributionApi + 'static> StatementDistributionSubsystem<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    /// Run until `Conclude` arrives or the channel closes.
    pub async fn run(self, mut rx: mpsc::Receiver<DistributionMessage>) {
        info!("Statement distribution subsystem started");

        while let Some(message) = rx.recv().await {
            if !self.handle(message) {
                break;
            }
        }

        self.api.conclude();
        info!("Statement distribution subsystem stopped");
    }

    /// Spawn [`Self::run`] on the current runtime.
    pub fn spawn(self, rx: mpsc::Receiver<DistributionMessage>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    /// Handle one message. Returns `false` when the loop should end.
    fn handle(&self, message: DistributionMessage) -> bool {
        match message {
            DistributionMessage::NetworkBridgeUpdate(event) => self.handle_bridge_event(event),
            DistributionMessage::Share(relay_parent, statement) => {
                // Per-message failures are already logged and reported by the service.
                let _ = self.api.share_statement(relay_parent, statement);
            }
            DistributionMessage::Signal(Signal::StopWork(relay_parent)) => {
                self.api.stop_work(relay_parent)
            }
            DistributionMessage::Signal(Signal::Conclude) => {
                debug!("Conclude signal received");
                return false;
            }
        }
        true
    }

    fn handle_bridge_event(&self, event: NetworkBridgeEvent) {
        match event {
            NetworkBridgeEvent::PeerConnected(peer) => self.api.peer_connected(peer),
            NetworkBridgeEvent::PeerDisconnected(peer) => self.api.peer_disconnected(peer),
            NetworkBridgeEvent::PeerViewChange(peer, view) => self.api.handle_neighbor_packet(
                peer,
                NeighborPacket {
                    relay_parents: view.iter().copied().collect(),
                },
            ),
            NetworkBridgeEvent::OurViewChange(view) => self.api.set_own_view(view),
            NetworkBridgeEvent::PeerMessage(peer, payload) => {
                if let Err(error) = self.api.handle_peer_message(peer, &payload) {
                    trace!(peer = %peer, error = %error, "Peer message not accepted");
                }
            }
        }
    }
}
