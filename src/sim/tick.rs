//! Per-frame scheduler
//!
//! Driven by the display's frame callback with a millisecond timestamp. One
//! call slides the active layer, lets the autopilot act, prunes runaway
//! layers, steps physics and pulls falling fragments back from their bodies.

use super::autopilot::{AutopilotAction, Pilot, consult};
use super::level::{RunEnd, end_run, slide_speed};
use super::physics::PhysicsWorld;
use super::state::{GameEvent, SessionState};
use crate::tuning::Tuning;

/// What happened during one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Milliseconds since the previous frame (0 on the first)
    pub elapsed_ms: f64,
    /// Slide speed used this frame (units per millisecond)
    pub speed: f32,
    pub autopilot: Option<AutopilotAction>,
    /// Active layer rose past the removal height and was dropped
    pub pruned: bool,
}

/// Advance the session to timestamp `time` (ms)
pub fn frame<W: PhysicsWorld, P: Pilot>(
    state: &mut SessionState,
    world: &mut W,
    pilot: &mut P,
    tuning: &Tuning,
    time: f64,
) -> FrameReport {
    let elapsed_ms = state.last_time.map_or(0.0, |last| (time - last).max(0.0));
    state.last_time = Some(time);

    if state.stack.is_empty() {
        return FrameReport::default();
    }

    let speed = slide_speed(tuning, state.level);
    let mut report = FrameReport {
        elapsed_ms,
        speed,
        ..Default::default()
    };

    if state.is_playing() {
        slide_active_layer(state, world, tuning, speed * elapsed_ms as f32);
    }

    report.autopilot = consult(state, world, pilot, tuning);
    report.pruned = prune_top(state, world, tuning);

    world.step((elapsed_ms / 1000.0) as f32);
    sync_overhangs(state, world);

    report
}

fn slide_active_layer<W: PhysicsWorld>(
    state: &mut SessionState,
    world: &mut W,
    tuning: &Tuning,
    distance: f32,
) {
    let Some(top) = state.stack.last_mut() else {
        return;
    };
    let axis = top.direction.index();
    top.piece.position[axis] += distance;
    if let Err(e) = world.set_position(top.piece.body, top.piece.position) {
        log::warn!("Active layer body out of sync: {}", e);
    }

    let travelled = top.piece.position[axis];
    let camera_y = top.piece.position.y + tuning.camera_offset;
    state.camera.track(camera_y);

    if travelled > tuning.far_travel_limit && !state.autopilot {
        end_run(state, RunEnd::SlidOff);
    }
}

/// Drop the active layer once it is above the removal height
fn prune_top<W: PhysicsWorld>(state: &mut SessionState, world: &mut W, tuning: &Tuning) -> bool {
    let Some(top) = state.stack.last() else {
        return false;
    };
    if top.piece.position.y <= tuning.removal_height {
        return false;
    }

    let body = top.piece.body;
    if let Err(e) = world.remove_body(body) {
        log::warn!("Pruned layer had no body: {}", e);
    }
    state.stack.pop();
    let index = state.stack.len();
    log::debug!("Pruned layer {} above removal height", index);

    if let Some(new_top) = state.stack.last() {
        let camera_y = new_top.piece.position.y + tuning.camera_offset;
        state.camera.track(camera_y);
    }
    state.push_event(GameEvent::LayerPruned { index });
    true
}

/// Copy simulated positions of falling fragments back to their visuals
fn sync_overhangs<W: PhysicsWorld>(state: &mut SessionState, world: &W) {
    for overhang in &mut state.overhangs {
        if let Some(position) = world.position(overhang.body) {
            overhang.position = position;
        }
        if let Some(rotation) = world.rotation(overhang.body) {
            overhang.rotation = rotation;
        }
    }
}
