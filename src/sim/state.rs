//! Game state and core simulation types
//!
//! Every transition replaces the whole snapshot; nothing here is mutated in
//! place by callers. Consumers may treat any `GameState` they receive as a
//! complete, independent value.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// A gapped obstacle scrolling leftward through world space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    /// Horizontal position of the left edge (decreases every tick)
    pub x: f64,
    /// Vertical center of the gap (fixed at creation)
    pub gap_y: f64,
    /// Vertical size of the gap (fixed at creation)
    pub gap_height: f64,
    /// Write-once: once passed, the pipe is exempt from collision and scoring
    pub passed: bool,
}

impl Pipe {
    /// Top of the gap (smaller y is higher on screen)
    pub fn gap_top(&self) -> f64 {
        self.gap_y - self.gap_height / 2.0
    }

    /// Bottom of the gap
    pub fn gap_bottom(&self) -> f64 {
        self.gap_y + self.gap_height / 2.0
    }

    /// Right edge in world space
    pub fn right(&self) -> f64 {
        self.x + PIPE_WIDTH
    }
}

/// A replayed prior run, rendered alongside the live bird
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ghost {
    /// Run identifier (monotonically assigned per completed run, from 1)
    pub id: u32,
    /// Current replayed vertical position; None before playback delivers one
    pub y: Option<f64>,
    /// Whether the ghost should currently render
    pub active: bool,
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Vertical center of the bird
    pub bird_y: f64,
    /// Vertical velocity (positive is downward)
    pub bird_vy: f64,
    /// Obstacles in spawn order (left to right), never reordered
    pub pipes: Vec<Pipe>,
    /// Remaining life budget; reaching 0 forces `game_end`
    pub lives: i32,
    /// Monotonically non-decreasing, +1 per pipe passed
    pub score: u32,
    /// Terminal flag; physics and collisions are absorbing once set
    pub game_end: bool,
    /// Suspends physics and collisions but not input handling
    pub paused: bool,
    /// Current PRNG state; updated only by consuming a draw
    pub rng_seed: f64,
    /// One per processed physics tick
    pub tick_count: u64,
    /// Boundary life loss is suppressed while `tick_count < invuln_until`
    pub invuln_until: u64,
    /// Replaying prior runs, keyed by run id
    pub ghosts: Vec<Ghost>,
}

impl GameState {
    /// Canonical initial state with the given obstacle layout
    pub fn new(pipes: Vec<Pipe>) -> Self {
        Self {
            bird_y: VIEW_HEIGHT / 2.0,
            bird_vy: 0.0,
            pipes,
            lives: INITIAL_LIVES,
            score: 0,
            game_end: false,
            paused: false,
            rng_seed: INITIAL_SEED,
            tick_count: 0,
            invuln_until: 0,
            ghosts: Vec::new(),
        }
    }

    /// Left edge of the bird's fixed horizontal band
    pub fn bird_left(&self) -> f64 {
        BIRD_X - BIRD_WIDTH / 2.0
    }

    /// Right edge of the bird's fixed horizontal band
    pub fn bird_right(&self) -> f64 {
        BIRD_X + BIRD_WIDTH / 2.0
    }

    /// Top edge of the bird sprite
    pub fn bird_top(&self) -> f64 {
        self.bird_y - BIRD_HEIGHT / 2.0
    }

    /// Bottom edge of the bird sprite
    pub fn bird_bottom(&self) -> f64 {
        self.bird_y + BIRD_HEIGHT / 2.0
    }

    /// Run ended with all obstacles cleared and lives to spare
    pub fn won(&self) -> bool {
        self.game_end && self.pipes.is_empty() && self.lives > 0
    }

    /// Run ended any other way
    pub fn lost(&self) -> bool {
        self.game_end && !self.won()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
