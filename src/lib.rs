//! Gapwing - deterministic core for a side-scrolling gap-dodging game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `schedule`: Obstacle schedule parsing
//! - `ghost`: Run recording and ghost replay transitions
//! - `engine`: Event ordering, timebase, and state broadcast

pub mod engine;
pub mod ghost;
pub mod schedule;
pub mod sim;

pub use engine::Engine;
pub use sim::state::{GameState, Ghost, Pipe};

/// Game configuration constants
pub mod consts {
    /// Viewport dimensions (world units)
    pub const VIEW_WIDTH: f64 = 600.0;
    pub const VIEW_HEIGHT: f64 = 400.0;

    /// Bird sprite dimensions
    pub const BIRD_WIDTH: f64 = 42.0;
    pub const BIRD_HEIGHT: f64 = 30.0;
    /// Horizontal center of the bird as a fraction of viewport width
    pub const BIRD_X_FRAC: f64 = 1.0 / 3.0;
    /// Horizontal center of the bird (fixed; only vertical position varies)
    pub const BIRD_X: f64 = VIEW_WIDTH * BIRD_X_FRAC;

    /// Obstacle width
    pub const PIPE_WIDTH: f64 = 50.0;
    /// Leftward scroll per tick
    pub const PIPE_SPEED: f64 = 5.0;

    /// Fixed simulation timebase (50 logical steps per second)
    pub const TICK_MS: u64 = 20;
    pub const TICKS_PER_SECOND: f64 = 1000.0 / TICK_MS as f64;

    /// Downward acceleration per tick
    pub const GRAVITY: f64 = 0.5;
    /// Upward impulse applied by a flap
    pub const FLAP_FORCE: f64 = -5.5;
    /// Terminal fall speed
    pub const MAX_VELOCITY: f64 = 10.0;

    /// Ticks of boundary-contact invulnerability after a boundary life loss
    pub const INVULN_TICKS: u64 = 15;
    /// Starting life budget
    pub const INITIAL_LIVES: i32 = 3;
    /// Starting PRNG seed
    pub const INITIAL_SEED: f64 = 123456789.0;
}
