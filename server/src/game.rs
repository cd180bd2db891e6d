//! Authoritative world state and the movement/collection processor
//!
//! `GameState` is the single source of truth for a match. It is owned by the
//! server's main loop and mutated from exactly one task, so no locking
//! happens here; every entry point runs to completion before the next.

use log::{debug, info};
use shared::{
    Flame, Obstacle, Player, Position, Team, TeamScores, WorldState, BASE_PROXIMITY_THRESHOLD,
    FLAME_PICKUP_RADIUS, THROTTLE_DISTANCE,
};
use std::collections::HashMap;

/// Match clock state. Running transitions to Over exactly once and never
/// back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    Running,
    Over,
}

/// Result of processing a movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Position updated; callers should broadcast a fresh snapshot.
    Accepted {
        flames_collected: u32,
        flames_banked: u32,
    },
    /// Intent below the throttle distance, or the match is over. No state
    /// changed, nothing to broadcast.
    Rejected,
    /// No player registered under that id (intent raced a disconnect).
    UnknownPlayer,
}

/// Result of one match-clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Clock decremented; carries the new value for the timer broadcast.
    Running(u32),
    /// Match over; carries the final scores. Returned again on every
    /// subsequent tick; the clock has no cancellation.
    Over(TeamScores),
}

#[derive(Debug, Clone)]
pub struct GameState {
    world: WorldState,
    allow_moves_after_match: bool,
}

impl GameState {
    pub fn new(
        obstacles: Vec<Obstacle>,
        flames: Vec<Flame>,
        match_duration: u32,
        allow_moves_after_match: bool,
    ) -> Self {
        Self {
            world: WorldState {
                players: HashMap::new(),
                flames,
                obstacles,
                team_scores: TeamScores::default(),
                time_left: match_duration,
            },
            allow_moves_after_match,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        if self.world.time_left > 0 {
            MatchPhase::Running
        } else {
            MatchPhase::Over
        }
    }

    /// Full-state snapshot for the wire.
    pub fn snapshot(&self) -> WorldState {
        self.world.clone()
    }

    pub fn player(&self, client_id: u32) -> Option<&Player> {
        self.world.players.get(&client_id)
    }

    pub fn player_count(&self) -> usize {
        self.world.players.len()
    }

    pub fn flame_count(&self) -> usize {
        self.world.flames.len()
    }

    pub fn scores(&self) -> TeamScores {
        self.world.team_scores
    }

    pub fn time_left(&self) -> u32 {
        self.world.time_left
    }

    /// Registers a player for the connection and spawns them at their base.
    ///
    /// Team assignment alternates on the player-count parity at the moment
    /// of connection: an even count joins Green, odd joins Purple. With
    /// churn this is not a balance guarantee, just an alternation.
    pub fn add_player(&mut self, client_id: u32) -> Team {
        let team = if self.world.players.len() % 2 == 0 {
            Team::Green
        } else {
            Team::Purple
        };

        let player = Player::new(client_id, team);
        info!(
            "Player {} joined team {:?}, spawned at ({}, {})",
            client_id, team, player.position.x, player.position.y
        );
        self.world.players.insert(client_id, player);
        team
    }

    /// Removes the player unconditionally. Flames they were carrying are
    /// discarded, not returned to the map.
    pub fn remove_player(&mut self, client_id: u32) {
        if let Some(player) = self.world.players.remove(&client_id) {
            if player.flames_carried > 0 {
                debug!(
                    "Player {} left carrying {} flames; discarded",
                    client_id, player.flames_carried
                );
            }
            info!("Player {} removed", client_id);
        }
    }

    /// Validates and applies a movement intent.
    ///
    /// The intent is an absolute position; the only server-side gate is the
    /// anti-jitter throttle (accept only when the distance from the current
    /// position is strictly greater than `THROTTLE_DISTANCE`). Obstacle and
    /// boundary validation is the intent producer's job.
    ///
    /// On acceptance: every flame strictly within `FLAME_PICKUP_RADIUS` of
    /// the new position is collected (ties all collected in the same move),
    /// then any carried flames are banked if the player is strictly within
    /// `BASE_PROXIMITY_THRESHOLD` of their own base.
    pub fn apply_move(&mut self, client_id: u32, requested: Position) -> MoveOutcome {
        let (current, team) = match self.world.players.get(&client_id) {
            Some(player) => (player.position, player.team),
            None => return MoveOutcome::UnknownPlayer,
        };

        if self.phase() == MatchPhase::Over && !self.allow_moves_after_match {
            return MoveOutcome::Rejected;
        }

        if current.distance_to(requested) <= THROTTLE_DISTANCE {
            return MoveOutcome::Rejected;
        }

        let before = self.world.flames.len();
        self.world
            .flames
            .retain(|flame| flame.position().distance_to(requested) >= FLAME_PICKUP_RADIUS);
        let flames_collected = (before - self.world.flames.len()) as u32;

        let mut flames_banked = 0;
        if let Some(player) = self.world.players.get_mut(&client_id) {
            player.position = requested;
            player.last_position = Some(requested);
            player.flames_carried += flames_collected;

            if player.flames_carried > 0
                && requested.distance_to(team.base()) < BASE_PROXIMITY_THRESHOLD
            {
                flames_banked = player.flames_carried;
                player.flames_carried = 0;
            }
        }

        if flames_banked > 0 {
            self.world.team_scores.add(team, flames_banked);
            info!(
                "Player {} banked {} flames for {:?} (score now {})",
                client_id,
                flames_banked,
                team,
                self.world.team_scores.get(team)
            );
        }

        MoveOutcome::Accepted {
            flames_collected,
            flames_banked,
        }
    }

    /// Advances the match clock by one second.
    ///
    /// The tick that reaches zero reports `Over`, as does every tick after
    /// it. `time_left` never goes negative and scores freeze at their
    /// final values.
    pub fn tick(&mut self) -> TickOutcome {
        if self.world.time_left > 0 {
            self.world.time_left -= 1;
            if self.world.time_left == 0 {
                info!(
                    "Match over: green {} purple {}",
                    self.world.team_scores.green, self.world.team_scores.purple
                );
                return TickOutcome::Over(self.world.team_scores);
            }
            TickOutcome::Running(self.world.time_left)
        } else {
            TickOutcome::Over(self.world.team_scores)
        }
    }
}
