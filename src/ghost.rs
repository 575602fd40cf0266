//! Run recording and ghost replay
//!
//! Each completed run's bird trajectory is archived as a sealed, immutable
//! recording. On restart the engine replays every archived run as a "ghost"
//! alongside the live bird, paced to the same unpaused tick clock. The pure
//! ghost transitions live here; the pacing itself is the engine's job.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sim::state::{GameState, Ghost};

/// A sealed trajectory of one completed run. Immutable once archived, so it
/// can be shared for unlimited concurrent replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Run identifier, assigned monotonically from 1
    pub id: u32,
    /// Bird vertical position, one entry per unpaused tick
    pub frames: Vec<f64>,
}

/// Append-only archive of completed runs.
#[derive(Debug, Clone, Default)]
pub struct GhostArchive {
    runs: Vec<Arc<Recording>>,
}

impl GhostArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seal a finished trajectory and archive it under the next run id.
    pub fn seal(&mut self, frames: Vec<f64>) -> Arc<Recording> {
        let id = self.runs.len() as u32 + 1;
        let recording = Arc::new(Recording { id, frames });
        self.runs.push(Arc::clone(&recording));
        recording
    }

    /// All archived runs, oldest first.
    pub fn runs(&self) -> &[Arc<Recording>] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Mark a ghost active, creating its entry if this is its first appearance.
pub fn activate_ghost(state: &GameState, id: u32) -> GameState {
    let mut next = state.clone();
    match next.ghosts.iter_mut().find(|g| g.id == id) {
        Some(ghost) => ghost.active = true,
        None => next.ghosts.push(Ghost {
            id,
            y: None,
            active: true,
        }),
    }
    next
}

/// Feed a ghost its next replayed position. Unknown ids are ignored; a stale
/// replay task racing a restart must not re-create a cleared ghost.
pub fn set_ghost_y(state: &GameState, id: u32, y: f64) -> GameState {
    let mut next = state.clone();
    if let Some(ghost) = next.ghosts.iter_mut().find(|g| g.id == id) {
        ghost.y = Some(y);
    }
    next
}

/// Stop rendering a ghost at the end of its playback.
pub fn deactivate_ghost(state: &GameState, id: u32) -> GameState {
    let mut next = state.clone();
    if let Some(ghost) = next.ghosts.iter_mut().find(|g| g.id == id) {
        ghost.active = false;
    }
    next
}

/// Remove every ghost; part of the restart choreography.
pub fn clear_ghosts(state: &GameState) -> GameState {
    let mut next = state.clone();
    next.ghosts.clear();
    next
}
