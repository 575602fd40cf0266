//! Event ordering, timebase, and state broadcast
//!
//! Many sources produce events concurrently in real time - the periodic
//! timebase, player input, and the replay choreography spawned on restart -
//! but there is exactly one writer: every event lands in one ordered queue
//! and is folded synchronously over the current state. The resulting
//! snapshots are published on a `watch` channel, a hot broadcast that caches
//! exactly the latest value, so late subscribers see the current state
//! immediately and no consumer triggers recomputation.
//!
//! Ghost replay tasks pace themselves on a tick-pulse broadcast and feed
//! their transitions back into the same queue; nothing bypasses the fold.

use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::consts::TICK_MS;
use crate::ghost::{self, GhostArchive, Recording};
use crate::sim;
use crate::sim::state::{GameState, Pipe};

/// Pulse buffer depth; replay tasks that lag this far drop frames
const PULSE_BUFFER: usize = 64;

/// The engine's event queue has shut down.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine event queue is closed")]
    Closed,
}

/// One entry in the ordered event queue. Each variant maps to exactly one
/// pure reducer application. Ghost events carry the restart lineage that
/// produced them so the fold can drop events from a superseded replay.
#[derive(Debug, Clone)]
enum Event {
    Tick,
    Flap,
    TogglePause,
    Restart,
    GhostActivate(u32, u64),
    GhostY(u32, f64, u64),
    GhostDeactivate(u32, u64),
}

/// Handle to a running simulation.
///
/// Dropping the engine aborts the timebase and fold tasks; replay tasks then
/// exit on their next send.
pub struct Engine {
    events: mpsc::UnboundedSender<Event>,
    states: watch::Receiver<GameState>,
    timer: JoinHandle<()>,
    fold: JoinHandle<()>,
}

impl Engine {
    /// Start a simulation over the given obstacle layout. The layout is kept
    /// for deterministic restarts against the same course.
    pub fn spawn(layout: Vec<Pipe>) -> Self {
        let (events, queue) = mpsc::unbounded_channel();
        let (state_tx, states) = watch::channel(GameState::new(layout.clone()));
        let (pulses, _) = broadcast::channel(PULSE_BUFFER);

        let timer = tokio::spawn(timebase(events.clone()));
        let fold = tokio::spawn(
            FoldLoop {
                queue,
                states: state_tx,
                pulses,
                events: events.clone(),
                layout,
                archive: GhostArchive::new(),
                open_frames: Vec::new(),
                generation: Arc::new(AtomicU64::new(0)),
            }
            .run(),
        );

        Self {
            events,
            states,
            timer,
            fold,
        }
    }

    /// Subscribe to the canonical state sequence. The receiver immediately
    /// holds the most recent snapshot.
    pub fn states(&self) -> watch::Receiver<GameState> {
        self.states.clone()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> GameState {
        self.states.borrow().clone()
    }

    /// Queue a flap impulse.
    pub fn flap(&self) -> Result<(), EngineError> {
        self.send(Event::Flap)
    }

    /// Queue a pause toggle.
    pub fn toggle_pause(&self) -> Result<(), EngineError> {
        self.send(Event::TogglePause)
    }

    /// Queue a restart. Ignored by the fold unless the current run has ended.
    pub fn restart(&self) -> Result<(), EngineError> {
        self.send(Event::Restart)
    }

    fn send(&self, event: Event) -> Result<(), EngineError> {
        self.events.send(event).map_err(|_| EngineError::Closed)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.timer.abort();
        self.fold.abort();
    }
}

/// Periodic timebase: one `Event::Tick` per nominal period. This is the sole
/// driver of physics advancement.
async fn timebase(events: mpsc::UnboundedSender<Event>) {
    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        if events.send(Event::Tick).is_err() {
            break;
        }
    }
}

/// The single logical writer: applies one reducer per event, in arrival
/// order, and publishes each resulting snapshot before the next event is
/// touched.
struct FoldLoop {
    queue: mpsc::UnboundedReceiver<Event>,
    states: watch::Sender<GameState>,
    pulses: broadcast::Sender<()>,
    events: mpsc::UnboundedSender<Event>,
    /// Parsed obstacle layout, reused on every restart
    layout: Vec<Pipe>,
    archive: GhostArchive,
    /// Trajectory of the run in progress, sealed on run end
    open_frames: Vec<f64>,
    /// Bumped per restart; stale replay tasks exit when it moves past them
    generation: Arc<AtomicU64>,
}

impl FoldLoop {
    async fn run(mut self) {
        while let Some(event) = self.queue.recv().await {
            self.apply(event);
        }
    }

    fn apply(&mut self, event: Event) {
        let prev = self.states.borrow().clone();
        match event {
            Event::Tick => {
                let next = sim::tick(&prev);
                let advanced = next.tick_count != prev.tick_count;
                let ended = !prev.game_end && next.game_end;
                if advanced {
                    self.open_frames.push(next.bird_y);
                }
                self.publish(next);
                if ended {
                    let recording = self.archive.seal(mem::take(&mut self.open_frames));
                    info!(
                        "run {} sealed: {} frames recorded",
                        recording.id,
                        recording.frames.len()
                    );
                }
                // Pulse after publishing so replay tasks pace against the
                // already-visible snapshot
                if advanced {
                    let _ = self.pulses.send(());
                }
            }
            Event::Flap => self.publish(sim::flap(&prev)),
            Event::TogglePause => self.publish(sim::toggle_pause(&prev)),
            Event::Restart => self.restart(prev),
            Event::GhostActivate(id, lineage) => {
                if self.lineage_live(lineage) {
                    self.publish(ghost::activate_ghost(&prev, id));
                }
            }
            Event::GhostY(id, y, lineage) => {
                if self.lineage_live(lineage) {
                    self.publish(ghost::set_ghost_y(&prev, id, y));
                }
            }
            Event::GhostDeactivate(id, lineage) => {
                if self.lineage_live(lineage) {
                    self.publish(ghost::deactivate_ghost(&prev, id));
                }
            }
        }
    }

    /// The latest restart's lineage wins: ghost events from any earlier
    /// choreography must not touch the live run's ghosts. A stale task's
    /// deactivate would otherwise hide a freshly activated ghost with the
    /// same recording id for the rest of the run.
    fn lineage_live(&self, lineage: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == lineage
    }

    /// Restart choreography: restart with the parsed layout, an immediate
    /// flap, ghosts cleared, then one paced replay task per archived run.
    fn restart(&mut self, prev: GameState) {
        if !prev.game_end {
            debug!("restart ignored: run still active");
            return;
        }
        let lineage = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let state = sim::restart(&prev, self.layout.clone());
        self.publish(state.clone());
        let state = sim::flap(&state);
        self.publish(state.clone());
        self.publish(ghost::clear_ghosts(&state));
        self.open_frames.clear();

        for recording in self.archive.runs() {
            tokio::spawn(replay_ghost(ReplayGhost {
                recording: Arc::clone(recording),
                events: self.events.clone(),
                pulses: self.pulses.subscribe(),
                states: self.states.subscribe(),
                generation: Arc::clone(&self.generation),
                lineage,
            }));
        }
        debug!("restart: replaying {} archived runs", self.archive.len());
    }

    fn publish(&self, next: GameState) {
        // Fails only when every receiver is gone, which also tears the
        // engine down
        let _ = self.states.send(next);
    }
}

/// One ghost's playback: activate, feed one recorded position per unpaused
/// tick, deactivate on exhaustion, on run end, or when a newer restart
/// supersedes this lineage.
struct ReplayGhost {
    recording: Arc<Recording>,
    events: mpsc::UnboundedSender<Event>,
    pulses: broadcast::Receiver<()>,
    states: watch::Receiver<GameState>,
    generation: Arc<AtomicU64>,
    lineage: u64,
}

async fn replay_ghost(mut task: ReplayGhost) {
    let id = task.recording.id;
    if task.events.send(Event::GhostActivate(id, task.lineage)).is_err() {
        return;
    }
    for &y in task.recording.frames.iter() {
        match task.pulses.recv().await {
            Ok(()) => {}
            // Fell behind the live clock: drop this frame and catch up
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
        // Superseded by a newer restart: vanish without a deactivate, which
        // would otherwise land after the new lineage's activate for this id
        if task.generation.load(Ordering::SeqCst) != task.lineage {
            return;
        }
        if task.states.borrow().game_end {
            break;
        }
        if task.events.send(Event::GhostY(id, y, task.lineage)).is_err() {
            break;
        }
    }
    let _ = task.events.send(Event::GhostDeactivate(id, task.lineage));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    /// A pipe far enough right that it never reaches the bird in test time
    fn far_pipe() -> Pipe {
        Pipe {
            x: 1.0e9,
            gap_y: 200.0,
            gap_height: 100.0,
            passed: false,
        }
    }

    /// A pipe whose gap spans the viewport and whose exit ends the run as a
    /// win after exactly 30 ticks (x + width <= 0 at tick 30)
    fn exiting_pipe() -> Pipe {
        Pipe {
            x: 100.0,
            gap_y: 200.0,
            gap_height: 400.0,
            passed: false,
        }
    }

    async fn wait_for<F>(states: &mut watch::Receiver<GameState>, f: F) -> GameState
    where
        F: Fn(&GameState) -> bool,
    {
        loop {
            {
                let s = states.borrow();
                if f(&s) {
                    return s.clone();
                }
            }
            states.changed().await.expect("engine shut down");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timebase_drives_ticks() {
        let engine = Engine::spawn(vec![far_pipe()]);
        let mut states = engine.states();
        let s = wait_for(&mut states, |s| s.tick_count >= 5).await;
        assert!(s.tick_count >= 5);
        assert!(!s.game_end);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_physics_and_latches_flap() {
        let engine = Engine::spawn(vec![far_pipe()]);
        let mut states = engine.states();
        wait_for(&mut states, |s| s.tick_count >= 2).await;

        engine.toggle_pause().unwrap();
        let paused = wait_for(&mut states, |s| s.paused).await;
        let frozen = paused.tick_count;

        // Logical time passes; ticks arrive but the reducer is identity
        tokio::time::sleep(Duration::from_millis(10 * TICK_MS)).await;
        assert_eq!(engine.latest().tick_count, frozen);

        // A flap while paused is accepted and latched
        engine.flap().unwrap();
        let latched = wait_for(&mut states, |s| s.bird_vy == FLAP_FORCE).await;
        assert!(latched.paused);
        assert_eq!(latched.tick_count, frozen);

        engine.toggle_pause().unwrap();
        let resumed = wait_for(&mut states, |s| s.tick_count > frozen).await;
        assert!(!resumed.paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_layout_ends_immediately_as_win() {
        let engine = Engine::spawn(Vec::new());
        let mut states = engine.states();
        let s = wait_for(&mut states, |s| s.game_end).await;
        assert!(s.won());
        assert_eq!(s.tick_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replays_archived_ghosts() {
        let engine = Engine::spawn(vec![exiting_pipe()]);
        let mut states = engine.states();

        // First run: pipe scrolls off, run ends as a win, trajectory sealed
        let first = wait_for(&mut states, |s| s.game_end).await;
        assert!(first.won());
        assert!(first.tick_count >= 30);

        // Restart: run 1's ghost activates and is fed positions paced to the
        // live tick clock; it must be active while its feed is live
        engine.restart().unwrap();
        let replaying = wait_for(&mut states, |s| {
            s.ghosts.iter().any(|g| g.id == 1 && g.active && g.y.is_some())
        })
        .await;
        assert_eq!(replaying.ghosts.len(), 1);

        // Second run ends the same way; a further restart replays both runs
        wait_for(&mut states, |s| s.game_end).await;
        engine.restart().unwrap();
        let both = wait_for(&mut states, |s| {
            s.ghosts.iter().any(|g| g.id == 1 && g.active && g.y.is_some())
                && s.ghosts.iter().any(|g| g.id == 2 && g.active && g.y.is_some())
        })
        .await;
        assert_eq!(both.ghosts.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_deactivate_cannot_hide_live_ghost() {
        // A slower course than exiting_pipe: the pipe needs 90 ticks to
        // scroll off, so the run outlives the assertions below
        let engine = Engine::spawn(vec![Pipe {
            x: 400.0,
            gap_y: 200.0,
            gap_height: 400.0,
            passed: false,
        }]);
        let mut states = engine.states();
        wait_for(&mut states, |s| s.game_end).await;

        engine.restart().unwrap();
        let replaying = wait_for(&mut states, |s| {
            s.ghosts.iter().any(|g| g.id == 1 && g.active && g.y.is_some())
        })
        .await;

        // A deactivate carrying a superseded lineage - what a stale replay
        // task would emit after a newer restart claimed its recording id -
        // must be dropped by the fold instead of hiding the live ghost
        engine.events.send(Event::GhostDeactivate(1, 0)).unwrap();

        let later = wait_for(&mut states, |s| {
            s.tick_count >= replaying.tick_count + 5
        })
        .await;
        let ghost = later.ghosts.iter().find(|g| g.id == 1).unwrap();
        assert!(ghost.active);
        assert!(ghost.y.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_reruns_the_same_layout_deterministically() {
        let engine = Engine::spawn(vec![exiting_pipe()]);
        let mut states = engine.states();
        let first = wait_for(&mut states, |s| s.game_end).await;

        // Restart reuses the parsed layout, so the second run ends the same
        // way at the same tick. Its terminal state carries run 1's ghost.
        engine.restart().unwrap();
        let second = wait_for(&mut states, |s| s.game_end && !s.ghosts.is_empty()).await;
        assert!(second.won());
        assert_eq!(second.tick_count, first.tick_count);
        assert_eq!(second.score, first.score);
        assert!(second.lives > 0);
    }
}
