use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const THROTTLE_DISTANCE: f32 = 2.0;
pub const FLAME_PICKUP_RADIUS: f32 = 20.0;
pub const BASE_PROXIMITY_THRESHOLD: f32 = 50.0;
pub const FLAME_OBSTACLE_MARGIN: f32 = 15.0;
pub const OBSTACLE_BASE_CLEARANCE: f32 = 200.0;
pub const OBSTACLE_COUNT: usize = 3;
pub const FLAME_COUNT: usize = 20;
pub const MATCH_DURATION_SECS: u32 = 300;
pub const TICK_INTERVAL_MS: u64 = 1000;

pub const GREEN_BASE: Position = Position { x: 50.0, y: 50.0 };
pub const PURPLE_BASE: Position = Position { x: 750.0, y: 550.0 };

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Position) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    Green,
    Purple,
}

impl Team {
    /// Fixed spawn/return point for the team.
    pub fn base(&self) -> Position {
        match self {
            Team::Green => GREEN_BASE,
            Team::Purple => PURPLE_BASE,
        }
    }
}

/// Axis-aligned rectangle, immutable for the match duration.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Obstacle {
    /// Tests whether a point falls inside the rectangle grown by `margin`
    /// on every side. Flame placement uses this to treat the flame as a
    /// disc of that radius.
    pub fn contains_with_margin(&self, position: Position, margin: f32) -> bool {
        position.x + margin > self.x
            && position.x - margin < self.x + self.width
            && position.y + margin > self.y
            && position.y - margin < self.y + self.height
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Flame {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

impl Flame {
    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub team: Team,
    pub flames_carried: u32,
    pub position: Position,
    /// Last accepted position; None until the first accepted move.
    pub last_position: Option<Position>,
}

impl Player {
    /// Creates a player spawned at their team base, carrying nothing.
    pub fn new(id: u32, team: Team) -> Self {
        Self {
            id,
            team,
            flames_carried: 0,
            position: team.base(),
            last_position: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TeamScores {
    pub green: u32,
    pub purple: u32,
}

impl TeamScores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Green => self.green,
            Team::Purple => self.purple,
        }
    }

    pub fn add(&mut self, team: Team, points: u32) {
        match team {
            Team::Green => self.green += points,
            Team::Purple => self.purple += points,
        }
    }
}

/// The full world snapshot sent to clients on connect and after every
/// accepted mutation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorldState {
    pub players: HashMap<u32, Player>,
    pub flames: Vec<Flame>,
    pub obstacles: Vec<Obstacle>,
    pub team_scores: TeamScores,
    pub time_left: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // client -> server
    Connect {
        client_version: u32,
    },
    Move {
        x: f32,
        y: f32,
    },
    Heartbeat {
        timestamp: u64,
    },
    Disconnect,

    // server -> client
    Connected {
        client_id: u32,
    },
    Snapshot {
        state: WorldState,
    },
    TimerUpdate {
        seconds_left: u32,
    },
    GameOver {
        scores: TeamScores,
    },
    Disconnected {
        reason: String,
    },
}
