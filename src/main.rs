//! Gapwing headless runner
//!
//! Loads an obstacle schedule CSV, spawns the engine, and lets a trivial
//! autopilot fly the course, logging the outcome. Mostly useful as a smoke
//! run and as an example of consuming the state sequence.

use std::cmp::Ordering;
use std::error::Error;
use std::path::Path;

use log::{debug, info};

use gapwing::Engine;
use gapwing::consts::*;
use gapwing::schedule;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "schedule.csv".to_string());
    let pipes = schedule::load_schedule(Path::new(&path))?;
    info!("loaded {} pipes from {}", pipes.len(), path);

    let engine = Engine::spawn(pipes);
    let mut states = engine.states();

    loop {
        states.changed().await?;
        let state = states.borrow().clone();

        if state.game_end {
            info!(
                "run ended after {} ticks: score {}, lives {}, {}",
                state.tick_count,
                state.score,
                state.lives,
                if state.won() { "won" } else { "lost" }
            );
            debug!("final state: {}", serde_json::to_string(&state)?);
            break;
        }

        // Autopilot: flap whenever the bird is sinking below the next gap
        let target = state
            .pipes
            .iter()
            .filter(|p| !p.passed && p.right() > state.bird_left())
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
            .map(|p| p.gap_y)
            .unwrap_or(VIEW_HEIGHT / 2.0);
        if state.bird_y > target && state.bird_vy >= 0.0 {
            engine.flap()?;
        }
    }

    Ok(())
}
