//! Per-tick state transitions
//!
//! Every function here is a pure reducer: old snapshot in, new snapshot out,
//! total over the whole state domain. `tick` composes the physics steps in a
//! fixed order; the rest are the input-driven transitions folded between
//! ticks by the engine.

use crate::consts::*;
use crate::sim::rng;
use crate::sim::state::GameState;
use crate::sim::state::Pipe;

/// Advance one physics tick: gravity, scroll, collision/scoring, counter.
///
/// Ended and paused states are absorbing; the input is returned unchanged
/// (including `tick_count`).
pub fn tick(state: &GameState) -> GameState {
    if state.game_end || state.paused {
        return state.clone();
    }
    let mut next = check_pipes(&scroll_pipes(&move_bird(state)));
    next.tick_count += 1;
    next
}

/// Gravity integration with a clamped integrator.
///
/// Velocity is capped at terminal fall speed; position is clamped to
/// `[0, VIEW_HEIGHT - BIRD_HEIGHT/2]` with an inelastic stop (velocity
/// zeroed) at either bound. Boundary life loss is handled later, in
/// `check_pipes`.
pub fn move_bird(state: &GameState) -> GameState {
    let mut next = state.clone();
    let vy = (state.bird_vy + GRAVITY).min(MAX_VELOCITY);
    let y = state.bird_y + vy;
    let max_y = VIEW_HEIGHT - BIRD_HEIGHT / 2.0;
    if y < 0.0 {
        next.bird_y = 0.0;
        next.bird_vy = 0.0;
    } else if y > max_y {
        next.bird_y = max_y;
        next.bird_vy = 0.0;
    } else {
        next.bird_y = y;
        next.bird_vy = vy;
    }
    next
}

/// Scroll every pipe leftward and drop pipes fully past the left edge.
/// Relative order is preserved.
pub fn scroll_pipes(state: &GameState) -> GameState {
    let mut next = state.clone();
    for pipe in &mut next.pipes {
        pipe.x -= PIPE_SPEED;
    }
    next.pipes.retain(|p| p.right() > 0.0);
    next
}

/// Collision, scoring, life management, and end-of-run detection.
pub fn check_pipes(state: &GameState) -> GameState {
    let mut next = state.clone();

    // Win condition: all obstacles cleared
    if next.pipes.is_empty() {
        next.game_end = true;
        return next;
    }

    let bird_left = state.bird_left();
    let bird_right = state.bird_right();
    let bird_top = state.bird_top();
    let bird_bottom = state.bird_bottom();

    // At most one life is lost per tick; the first colliding pipe in spawn
    // order claims it. Later collisions the same tick still bounce, but with
    // a fixed magnitude so the PRNG consumption count stays the same.
    let mut life_lost = false;
    let mut ended_by_pipe = false;

    let mut pipes = std::mem::take(&mut next.pipes);
    for pipe in &mut pipes {
        if pipe.passed {
            continue;
        }
        let overlap = bird_right >= pipe.x && bird_left < pipe.right();
        let outside = bird_top < pipe.gap_top() || bird_bottom > pipe.gap_bottom();
        if overlap && outside {
            let hit_top = bird_top < pipe.gap_top();
            if !life_lost {
                life_lost = true;
                next.lives -= 1;
                if next.lives <= 0 {
                    next.game_end = true;
                    ended_by_pipe = true;
                }
                let draw = if hit_top {
                    rng::rand_between(next.rng_seed, 4.0, 8.0)
                } else {
                    rng::rand_between(next.rng_seed, -8.0, -4.0)
                };
                next.bird_vy = draw.value;
                next.rng_seed = draw.seed;
            } else {
                next.bird_vy = if hit_top { 6.0 } else { -6.0 };
            }
        } else if bird_left > pipe.right() && !outside {
            // Cleared the pipe while inside the gap
            pipe.passed = true;
            next.score += 1;
        }
    }
    next.pipes = pipes;

    // World-boundary contact, unless a pipe collision already ended the run
    // this tick. The bounce always applies and always consumes a draw; the
    // life deduction is gated by the invulnerability window and by whether a
    // pipe already claimed this tick's loss.
    if !ended_by_pipe {
        let top_contact = bird_top <= 0.0;
        let bottom_contact = bird_bottom >= VIEW_HEIGHT;
        if top_contact || bottom_contact {
            if next.tick_count >= next.invuln_until && !life_lost {
                next.lives -= 1;
                if next.lives <= 0 {
                    next.game_end = true;
                }
                next.invuln_until = next.tick_count + INVULN_TICKS;
            }
            let draw = if top_contact {
                rng::rand_between(next.rng_seed, 4.0, 8.0)
            } else {
                rng::rand_between(next.rng_seed, -8.0, -4.0)
            };
            next.bird_vy = draw.value;
            next.rng_seed = draw.seed;
        }
    }

    next
}

/// Apply the flap impulse. No-op once the run has ended; a flap while paused
/// is accepted and latched until physics resumes.
pub fn flap(state: &GameState) -> GameState {
    if state.game_end {
        return state.clone();
    }
    let mut next = state.clone();
    next.bird_vy = FLAP_FORCE;
    next
}

/// Toggle suspension of physics and collisions.
pub fn toggle_pause(state: &GameState) -> GameState {
    let mut next = state.clone();
    next.paused = !state.paused;
    next
}

/// Fresh canonical state with a caller-supplied obstacle layout, enabling
/// deterministic re-runs without re-parsing the schedule.
pub fn restart(_state: &GameState, pipes: Vec<Pipe>) -> GameState {
    GameState::new(pipes)
}
