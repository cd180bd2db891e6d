//! # Capture-the-Flame Arena Server
//!
//! This library provides the authoritative server for a two-team
//! capture-the-flame arena game. It owns the single shared world state,
//! applies every client's movement intents against it, and broadcasts
//! snapshots so all connected clients see a consistent view.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative World State
//! The server holds the only real copy of the match: players, flames,
//! obstacles, team scores, and the countdown clock. Clients submit intents
//! and render snapshots; every decision that changes the world is made
//! here.
//!
//! ### Session Management
//! Handles the complete lifecycle of client connections:
//! - Connection establishment, team assignment, and base spawning
//! - Movement intent processing with anti-jitter throttling
//! - Disconnection handling (explicit or via transport liveness timeout)
//!
//! ### State Broadcasting
//! The protocol is "full snapshot on every meaningful mutation": any
//! accepted move, join, or leave pushes the entire world state to every
//! connection. There are no deltas, acknowledgments, or resends; a
//! dropped notification is repaired by the next mutation's broadcast.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! Inbound packets and the once-per-second match clock are two arms of one
//! `select!` loop, so all world-state mutations are serialized and no
//! partial update to a player or the flame set can ever interleave.
//! Outgoing traffic goes through a dedicated sender task and is
//! fire-and-forget: a slow or dead connection never blocks a broadcast.
//!
//! ### UDP-Based Communication
//! Clients exchange bincode-encoded packets over UDP. Because UDP has no
//! connection teardown, sessions are reaped when their address goes
//! silent; clients keep an idle session alive with heartbeats.
//!
//! ## Module Organization
//!
//! ### Arena Module (`arena`)
//! Match setup: obstacle placement away from the team bases and flame
//! scattering clear of obstacles, via bounded rejection sampling.
//!
//! ### Game Module (`game`)
//! The world state and its mutation rules: team assignment, the movement
//! throttle, flame collection, base-return scoring, and the match clock's
//! Running → Over transition.
//!
//! ### Client Manager Module (`client_manager`)
//! Transport-side session registry: id assignment, capacity limits,
//! address lookup, and liveness timeouts.
//!
//! ### Network Module (`network`)
//! The UDP socket, packet dispatch, the broadcast fan-out, and the main
//! server loop tying everything together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::arena;
//! use server::game::GameState;
//! use server::network::Server;
//! use shared::{FLAME_COUNT, MATCH_DURATION_SECS};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut rng = rand::thread_rng();
//!     let obstacles = arena::generate_obstacles(&mut rng)?;
//!     let flames = arena::generate_flames(FLAME_COUNT, &obstacles, &mut rng)?;
//!
//!     let game_state = GameState::new(obstacles, flames, MATCH_DURATION_SECS, false);
//!     let mut server = Server::new("127.0.0.1:8080", 32, game_state).await?;
//!
//!     // Runs the main loop: registers connections, applies movement
//!     // intents, broadcasts snapshots, and drives the match clock.
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod arena;
pub mod client_manager;
pub mod game;
pub mod network;
