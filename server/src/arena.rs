//! Arena generation: obstacle placement and flame scattering
//!
//! Both generators use rejection sampling against the arena's spatial
//! invariants: obstacles must keep clear of the two team bases, flames must
//! not land inside (or within a margin of) any obstacle. Sampling is bounded
//! so an unsatisfiable configuration surfaces as an error instead of a hang.

use log::debug;
use rand::Rng;
use shared::{
    Flame, Obstacle, Position, ARENA_HEIGHT, ARENA_WIDTH, FLAME_OBSTACLE_MARGIN, GREEN_BASE,
    OBSTACLE_BASE_CLEARANCE, OBSTACLE_COUNT, PURPLE_BASE,
};
use std::fmt;

/// Upper bound on rejection-sampling attempts per generator call. Generous
/// for the default arena; only an unsatisfiable configuration exhausts it.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// Rejection sampling ran out of attempts; the arena parameters cannot
    /// be satisfied.
    PlacementExhausted {
        what: &'static str,
        attempts: u32,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArenaError::PlacementExhausted { what, attempts } => {
                write!(
                    f,
                    "failed to place {} after {} attempts; arena constraints unsatisfiable",
                    what, attempts
                )
            }
        }
    }
}

impl std::error::Error for ArenaError {}

/// Generates the match's obstacles: axis-aligned rectangles kept near the
/// arena center, each with origin further than `OBSTACLE_BASE_CLEARANCE`
/// from both team bases. Obstacles may overlap each other.
pub fn generate_obstacles<R: Rng>(rng: &mut R) -> Result<Vec<Obstacle>, ArenaError> {
    let mut obstacles = Vec::with_capacity(OBSTACLE_COUNT);
    let mut attempts = 0;

    while obstacles.len() < OBSTACLE_COUNT {
        if attempts >= MAX_PLACEMENT_ATTEMPTS {
            return Err(ArenaError::PlacementExhausted {
                what: "obstacle",
                attempts,
            });
        }
        attempts += 1;

        let candidate = Obstacle {
            x: rng.gen_range(200.0..600.0),
            y: rng.gen_range(200.0..400.0),
            width: rng.gen_range(40.0..100.0),
            height: rng.gen_range(40.0..100.0),
        };

        let origin = Position::new(candidate.x, candidate.y);
        if origin.distance_to(GREEN_BASE) > OBSTACLE_BASE_CLEARANCE
            && origin.distance_to(PURPLE_BASE) > OBSTACLE_BASE_CLEARANCE
        {
            obstacles.push(candidate);
        }
    }

    debug!("generated {} obstacles in {} attempts", obstacles.len(), attempts);
    Ok(obstacles)
}

/// Scatters `count` flames uniformly over the arena, resampling any
/// candidate whose margin-grown footprint intersects an obstacle. Ids are
/// sequential insertion indices. Flames may overlap each other.
pub fn generate_flames<R: Rng>(
    count: usize,
    obstacles: &[Obstacle],
    rng: &mut R,
) -> Result<Vec<Flame>, ArenaError> {
    let mut flames = Vec::with_capacity(count);
    let mut attempts = 0;

    while flames.len() < count {
        if attempts >= MAX_PLACEMENT_ATTEMPTS {
            return Err(ArenaError::PlacementExhausted {
                what: "flame",
                attempts,
            });
        }
        attempts += 1;

        let candidate = Position::new(
            rng.gen_range(0.0..ARENA_WIDTH),
            rng.gen_range(0.0..ARENA_HEIGHT),
        );

        let blocked = obstacles
            .iter()
            .any(|o| o.contains_with_margin(candidate, FLAME_OBSTACLE_MARGIN));

        if !blocked {
            flames.push(Flame {
                id: flames.len() as u32,
                x: candidate.x,
                y: candidate.y,
            });
        }
    }

    debug!("generated {} flames in {} attempts", flames.len(), attempts);
    Ok(flames)
}
