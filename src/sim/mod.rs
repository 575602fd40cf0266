//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only, consumed explicitly seed-in/seed-out
//! - Stable iteration order (pipes in spawn order)
//! - No timing, channel, or platform dependencies

pub mod rng;
pub mod state;
pub mod tick;

pub use state::{GameState, Ghost, Pipe};
pub use tick::{check_pipes, flap, move_bird, restart, scroll_pipes, tick, toggle_pause};
