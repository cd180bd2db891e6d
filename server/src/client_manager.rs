//! Connection session management for the arena server
//!
//! This module tracks which network addresses currently hold a session,
//! including:
//! - Session lifecycle (connect, disconnect, liveness timeout)
//! - Capacity enforcement and stable id assignment
//! - Address lookup for routing incoming datagrams to sessions
//!
//! Gameplay state lives in [`crate::game::GameState`]; the manager only
//! owns the transport-side view of a connection. Liveness reaping exists
//! because UDP has no transport-level disconnect event; a client that
//! keeps sending anything (moves or heartbeats) persists indefinitely,
//! however idle its player is.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// How long an address may stay silent before its session is reaped.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected session: the stable id bound to a network address.
#[derive(Debug)]
pub struct Client {
    /// Unique session identifier assigned by the server; doubles as the
    /// player id in the world state.
    pub id: u32,
    /// Network address for sending responses.
    pub addr: SocketAddr,
    /// Last time any datagram arrived from this address.
    pub last_seen: Instant,
}

impl Client {
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Marks the session as alive now.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// True if no datagram has arrived within `timeout`.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Manages all connected sessions.
///
/// Centralizes capacity limits, id assignment, and address bookkeeping so
/// the network layer can map datagrams to sessions and fan broadcasts out
/// to every registered address.
pub struct ClientManager {
    /// Connected sessions indexed by their unique id.
    clients: HashMap<u32, Client>,
    /// Next id for a new session.
    next_client_id: u32,
    /// Maximum number of concurrent sessions allowed.
    max_clients: usize,
}

impl ClientManager {
    /// Creates an empty manager with the given capacity. Ids start from 1.
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    /// Attempts to register a new session for `addr`.
    ///
    /// Returns Some(client_id) on success, None if the server is at
    /// capacity.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<u32> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let client = Client::new(client_id, addr);
        info!("Client {} connected from {}", client_id, addr);
        self.clients.insert(client_id, client);

        Some(client_id)
    }

    /// Removes a session. Returns true if it existed, false if it was
    /// already gone (disconnect raced a timeout).
    pub fn remove_client(&mut self, client_id: &u32) -> bool {
        if let Some(client) = self.clients.remove(client_id) {
            info!("Client {} disconnected", client.id);
            true
        } else {
            false
        }
    }

    /// Finds the session id bound to a network address, if any.
    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes a session's liveness. Returns false for unknown ids.
    pub fn touch(&mut self, client_id: u32) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.touch();
            true
        } else {
            false
        }
    }

    /// Removes sessions whose address has gone silent and returns their
    /// ids so callers can clean up the matching players.
    pub fn check_timeouts(&mut self) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(CLIENT_TIMEOUT))
            .map(|(id, _)| *id)
            .collect();

        for client_id in &timed_out {
            self.remove_client(client_id);
        }

        timed_out
    }

    /// All session ids and their addresses, for broadcasting.
    pub fn get_client_addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    /// Number of currently connected sessions.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// True if no sessions are connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
