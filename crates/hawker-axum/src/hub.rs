//! WebSocket broadcast hub.
//!
//! A single cooperative loop owns the client set and serializes all
//! membership changes and fan-outs, so no lock is ever shared with the
//! connection tasks. Each client gets a bounded outbound queue
//! (capacity 256); a broadcast that finds a client's queue full drops
//! that client on the spot — slow consumers never exert back-pressure
//! on the scheduler.
//!
//! Envelopes are serialized once per broadcast and fanned out as
//! ready-to-send text payloads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

use hawker_core::events::OutboundEvent;
use hawker_core::ports::EventBroadcaster;

/// Outbound queue capacity per client; overflow drops the client.
pub const CLIENT_QUEUE_CAPACITY: usize = 256;

enum HubCommand {
    Register {
        id: u64,
        sender: mpsc::Sender<String>,
    },
    Unregister {
        id: u64,
    },
    Broadcast {
        payload: String,
    },
}

/// A registered client: its hub id plus the queue the write pump
/// drains. Dropping the receiver (socket gone) surfaces as a closed
/// queue on the next broadcast and the hub forgets the client.
pub struct ClientHandle {
    pub id: u64,
    pub outbound: mpsc::Receiver<String>,
}

/// Registry of connected clients with broadcast fan-out.
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
    next_id: AtomicU64,
}

impl Hub {
    /// Create the hub and spawn its command loop.
    pub fn new() -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run(receiver));
        Self {
            commands,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a new client and hand back its outbound queue.
    pub fn register(&self) -> ClientHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, outbound) = mpsc::channel(CLIENT_QUEUE_CAPACITY);
        let _ = self.commands.send(HubCommand::Register { id, sender });
        ClientHandle { id, outbound }
    }

    /// Drop a client. Idempotent; also safe after a slow-consumer drop.
    pub fn unregister(&self, id: u64) {
        let _ = self.commands.send(HubCommand::Unregister { id });
    }

    /// Serialize an event once and fan it out to every client.
    pub fn broadcast_event(&self, event: &OutboundEvent) {
        match serde_json::to_string(event) {
            Ok(payload) => {
                let _ = self.commands.send(HubCommand::Broadcast { payload });
            }
            Err(e) => warn!(error = %e, "failed to serialize outbound event"),
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBroadcaster for Hub {
    fn broadcast(&self, event: OutboundEvent) {
        self.broadcast_event(&event);
    }
}

async fn run(mut commands: mpsc::UnboundedReceiver<HubCommand>) {
    let mut clients: HashMap<u64, mpsc::Sender<String>> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            HubCommand::Register { id, sender } => {
                clients.insert(id, sender);
                info!(client = id, total = clients.len(), "client connected");
            }
            HubCommand::Unregister { id } => {
                if clients.remove(&id).is_some() {
                    info!(client = id, total = clients.len(), "client disconnected");
                }
            }
            HubCommand::Broadcast { payload } => {
                clients.retain(|id, sender| match sender.try_send(payload.clone()) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        // Closing the queue ends the client's write pump,
                        // which closes the socket.
                        warn!(client = *id, "outbound queue full, dropping slow client");
                        false
                    }
                    Err(TrySendError::Closed(_)) => {
                        debug!(client = *id, "queue closed, dropping client");
                        false
                    }
                });
            }
        }
    }
    // Hub handle dropped; every queue closes and the pumps drain out.
}
