//! Per-side connection registry and message fan-out.
//!
//! Each connection is a bounded outbound queue drained by its WebSocket task. Sends
//! never block the session: a full queue drops the frame, a closed queue detaches
//! the side.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::protocol::{ServerMsg, StateMsg, StateWire};
use crate::side::Side;

/// Identifies one transport connection; a reconnect gets a new id.
pub type ConnId = u64;

#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnId,
    tx: mpsc::Sender<ServerMsg>,
}

impl Connection {
    pub fn new(id: ConnId, tx: mpsc::Sender<ServerMsg>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnId {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    /// Queue full, frame dropped
    Dropped,
    Closed,
}

fn deliver(connection: &Connection, msg: ServerMsg) -> Delivery {
    match connection.tx.try_send(msg) {
        Ok(()) => Delivery::Sent,
        Err(TrySendError::Full(_)) => Delivery::Dropped,
        Err(TrySendError::Closed(_)) => Delivery::Closed,
    }
}

#[derive(Debug, Default)]
pub struct Broadcaster {
    connections: BTreeMap<Side, Connection>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a side's connection, returning the one it replaced.
    pub fn attach(&mut self, side: Side, connection: Connection) -> Option<Connection> {
        self.connections.insert(side, connection)
    }

    #[cfg(test)]
    pub fn detach(&mut self, side: Side) -> Option<Connection> {
        self.connections.remove(&side)
    }

    /// Detach only if the side is still served by `conn_id`.
    pub fn detach_if(&mut self, side: Side, conn_id: ConnId) -> bool {
        if self.connections.get(&side).map(Connection::id) == Some(conn_id) {
            self.connections.remove(&side);
            return true;
        }
        false
    }

    pub fn is_connected(&self, side: Side) -> bool {
        self.connections.contains_key(&side)
    }

    pub fn connected_sides(&self) -> impl Iterator<Item = Side> + '_ {
        self.connections.keys().copied()
    }

    #[cfg(test)]
    pub fn connected_count(&self) -> usize {
        self.connections.len()
    }

    /// Send to one side. Returns false if the side is not (or no longer) connected.
    pub fn send_to(&mut self, side: Side, msg: ServerMsg) -> bool {
        let Some(connection) = self.connections.get(&side) else {
            return false;
        };
        match deliver(connection, msg) {
            Delivery::Sent => true,
            Delivery::Dropped => {
                tracing::warn!("Side {} outbound queue full, frame dropped", side.id());
                true
            }
            Delivery::Closed => {
                tracing::debug!("Side {} connection closed, detaching", side.id());
                self.connections.remove(&side);
                false
            }
        }
    }

    /// Send the same message to every connected side.
    pub fn broadcast(&mut self, msg: &ServerMsg) {
        let sides: Vec<Side> = self.connected_sides().collect();
        for side in sides {
            self.send_to(side, msg.clone());
        }
    }

    /// Send the snapshot to every connected side, stamped with the recipient's side.
    pub fn broadcast_state(&mut self, state: &StateWire) {
        let sides: Vec<Side> = self.connected_sides().collect();
        for side in sides {
            let msg = ServerMsg::State(StateMsg {
                state: state.clone(),
                pid: side.id(),
            });
            self.send_to(side, msg);
        }
    }

    /// Release every connection. Their transport tasks see the queue close.
    pub fn close_all(&mut self) -> usize {
        let count = self.connections.len();
        self.connections.clear();
        count
    }
}
