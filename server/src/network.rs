//! Server network layer: UDP transport, packet dispatch, and the match
//! clock
//!
//! All world-state mutation happens inside [`Server::run`]'s single task:
//! packets and clock ticks are two arms of one `select!` loop, so every
//! mutation runs to completion before the next begins. Outgoing traffic is
//! queued to a dedicated sender task and is fire-and-forget: a dead
//! address never blocks a broadcast to the rest.

use crate::client_manager::ClientManager;
use crate::game::{GameState, MoveOutcome, TickOutcome};
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, Position, TICK_INTERVAL_MS};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::interval;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ClientTimeout {
        client_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the network sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket { packet: Packet, addr: SocketAddr },
    BroadcastPacket { packet: Packet },
}

/// Main server coordinating the transport and the authoritative world state
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game_state: GameState,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        max_clients: usize,
        game_state: GameState,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            game_state,
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming datagrams
    async fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outgoing packet queue
    async fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        // Fire-and-forget per address; one failure never
                        // stops the fan-out.
                        for (client_id, addr) in client_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that reaps sessions whose address has gone silent
    async fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    async fn send_packet(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket {
            packet: packet.clone(),
            addr,
        }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    async fn broadcast_packet(&self, packet: &Packet) {
        if let Err(e) = self.game_tx.send(GameMessage::BroadcastPacket {
            packet: packet.clone(),
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Broadcasts the full world snapshot to every registered session
    async fn broadcast_snapshot(&self) {
        let packet = Packet::Snapshot {
            state: self.game_state.snapshot(),
        };
        self.broadcast_packet(&packet).await;
    }

    /// Processes one inbound packet against the session registry and the
    /// world state
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                // A reconnect from the same address replaces the old
                // session.
                let existing_client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(existing_id) = existing_client_id {
                    info!("Removing existing client {} from {}", existing_id, addr);
                    let mut clients = self.clients.write().await;
                    clients.remove_client(&existing_id);
                    self.game_state.remove_player(existing_id);
                }

                let client_id = {
                    let mut clients = self.clients.write().await;
                    clients.add_client(addr)
                };

                if let Some(client_id) = client_id {
                    self.game_state.add_player(client_id);

                    let response = Packet::Connected { client_id };
                    self.send_packet(&response, addr).await;

                    // The new connection alone gets the current state;
                    // everyone else hears about it on the next mutation.
                    let snapshot = Packet::Snapshot {
                        state: self.game_state.snapshot(),
                    };
                    self.send_packet(&snapshot, addr).await;
                } else {
                    let response = Packet::Disconnected {
                        reason: "Server full".to_string(),
                    };
                    self.send_packet(&response, addr).await;
                }
            }

            Packet::Move { x, y } => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    {
                        let mut clients = self.clients.write().await;
                        clients.touch(client_id);
                    }

                    match self.game_state.apply_move(client_id, Position::new(x, y)) {
                        MoveOutcome::Accepted {
                            flames_collected,
                            flames_banked,
                        } => {
                            if flames_collected > 0 || flames_banked > 0 {
                                debug!(
                                    "Player {} collected {} flames, banked {}",
                                    client_id, flames_collected, flames_banked
                                );
                            }
                            self.broadcast_snapshot().await;
                        }
                        MoveOutcome::Rejected => {}
                        MoveOutcome::UnknownPlayer => {
                            debug!("Move for client {} with no player entity", client_id);
                        }
                    }
                } else {
                    debug!("Move from unregistered address {}", addr);
                }
            }

            Packet::Heartbeat { .. } => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    let mut clients = self.clients.write().await;
                    clients.touch(client_id);
                }
            }

            Packet::Disconnect => {
                let client_id = {
                    let clients = self.clients.read().await;
                    clients.find_client_by_addr(addr)
                };

                if let Some(client_id) = client_id {
                    {
                        let mut clients = self.clients.write().await;
                        clients.remove_client(&client_id);
                    }
                    self.game_state.remove_player(client_id);
                    self.broadcast_snapshot().await;
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver().await;
        self.spawn_network_sender().await;
        self.spawn_timeout_checker().await;

        let mut tick_interval = interval(Duration::from_millis(TICK_INTERVAL_MS));
        // The first tick completes immediately; consume it so the clock
        // starts a full second out.
        tick_interval.tick().await;

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            // The registry entry is already reaped; drop the
                            // player and tell everyone left.
                            self.game_state.remove_player(client_id);
                            self.broadcast_snapshot().await;
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Advance the match clock once per second
                _ = tick_interval.tick() => {
                    match self.game_state.tick() {
                        TickOutcome::Running(seconds_left) => {
                            self.broadcast_packet(&Packet::TimerUpdate { seconds_left }).await;
                        }
                        TickOutcome::Over(scores) => {
                            // Terminal state: re-announced every second for
                            // as long as the process runs.
                            self.broadcast_packet(&Packet::GameOver { scores }).await;
                        }
                    }
                },
            }
        }

        Ok(())
    }
}
