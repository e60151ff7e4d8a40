//! Cutting the active layer against the layer beneath it
//!
//! A split measures how far the active layer has drifted from the layer below
//! along its slide axis. The overlapping part stays on the tower, the rest
//! falls away as an overhang, and a new layer is spawned on top.

use super::boxes::{add_layer, add_overhang};
use super::level::{RunEnd, complete_level, end_run, threshold};
use super::physics::{PhysicsError, PhysicsWorld};
use super::state::{Axis, GameEvent, Layer, SessionState};
use crate::tuning::Tuning;

/// Geometry of a successful cut
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutReport {
    /// Slide-axis extent left on the tower
    pub overlap: f32,
    /// Signed offset of the active layer from the one beneath
    pub delta: f32,
    /// Whether a falling fragment was spawned
    pub overhang: bool,
}

/// Result of a split attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplitOutcome {
    /// Cut landed, a new layer is sliding
    Placed(CutReport),
    /// Cut landed and reached the level's layer count
    Completed(CutReport),
    /// No overlap; the run is over
    Missed { overlap: f32 },
    /// Not playing, or no layer beneath the active one
    Ignored,
}

impl SplitOutcome {
    /// Did the split count towards the score?
    pub fn is_success(&self) -> bool {
        matches!(self, SplitOutcome::Placed(_) | SplitOutcome::Completed(_))
    }
}

/// Resize a layer to `overlap` along its slide axis and recenter it
///
/// The layer moves back by `delta / 2` so it sits over the retained region.
/// The physics body is moved in the same call and its collision shape is
/// replaced with a box of the new size.
pub fn cut_layer<W: PhysicsWorld>(
    layer: &mut Layer,
    overlap: f32,
    delta: f32,
    box_height: f32,
    world: &mut W,
) -> Result<(), PhysicsError> {
    let axis = layer.direction;
    layer.piece.set_extent(axis, overlap);
    layer.piece.position[axis.index()] -= delta / 2.0;

    world.set_position(layer.piece.body, layer.piece.position)?;
    world.replace_shape(layer.piece.body, layer.piece.half_extents(box_height))
}

/// Cut the active layer against the one beneath it
///
/// Handles the miss, overhang spawning, next-layer spawning, level completion
/// and scoring.
pub fn split<W: PhysicsWorld>(
    state: &mut SessionState,
    world: &mut W,
    tuning: &Tuning,
) -> SplitOutcome {
    if !state.is_playing() {
        return SplitOutcome::Ignored;
    }
    let (Some(top), Some(below)) = (state.top(), state.below_top()) else {
        return SplitOutcome::Ignored;
    };

    let axis = top.direction;
    let size = top.slide_extent();
    let delta = top.slide_position() - below.piece.position[axis.index()];
    let overlap = size - delta.abs();

    if overlap <= 0.0 {
        end_run(state, RunEnd::Missed { overlap });
        return SplitOutcome::Missed { overlap };
    }

    let index = state.stack.len() - 1;
    let Some(top) = state.stack.last_mut() else {
        return SplitOutcome::Ignored;
    };
    if let Err(e) = cut_layer(top, overlap, delta, tuning.box_height, world) {
        log::warn!("Cut of layer {} left physics out of sync: {}", index, e);
    }
    let cut = top.piece.clone();
    log::debug!(
        "Cut layer {} along {:?}: overlap {:.3}, delta {:.3}",
        index,
        axis,
        overlap,
        delta
    );
    state.push_event(GameEvent::LayerCut { index, overlap });

    // A delta below the float step of `size` leaves the layer whole
    let has_overhang = overlap < size;
    if has_overhang {
        let overhang = size - overlap;
        let shift = (overlap / 2.0 + overhang / 2.0) * delta.signum();
        let mut center = cut.position;
        center[axis.index()] += shift;
        let mut width = cut.width;
        let mut depth = cut.depth;
        match axis {
            Axis::X => width = overhang,
            Axis::Z => depth = overhang,
        }
        add_overhang(state, world, tuning, center.x, center.z, width, depth);
    }

    let report = CutReport {
        overlap,
        delta,
        overhang: has_overhang,
    };

    let outcome = if state.stack.len() < threshold(tuning, state.level) {
        let next = axis.other();
        let mut start = cut.position;
        start[next.index()] = tuning.spawn_offset;
        add_layer(state, world, tuning, start.x, start.z, cut.width, cut.depth, next);
        SplitOutcome::Placed(report)
    } else {
        complete_level(state);
        SplitOutcome::Completed(report)
    };

    state.score += 1;
    state.push_event(GameEvent::ScoreChanged(state.score));
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::camera::OrthoCamera;
    use crate::sim::physics::BoxWorld;
    use crate::sim::state::GamePhase;
    use approx::assert_relative_eq;
    use glam::Vec3;
    use proptest::prelude::*;

    /// Foundation + one active layer offset by `delta` along X
    fn setup(level: u32, delta: f32) -> (SessionState, BoxWorld, Tuning) {
        let tuning = Tuning::default();
        let mut world = BoxWorld::from_tuning(&tuning);
        let mut state = SessionState::new(level, false, 0.0, OrthoCamera::new(1.0));
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::Z);
        add_layer(&mut state, &mut world, &tuning, delta, 0.0, 3.0, 3.0, Axis::X);
        state.drain_events();
        (state, world, tuning)
    }

    #[test]
    fn test_aligned_split_keeps_footprint() {
        let (mut state, mut world, tuning) = setup(1, 0.0);
        let outcome = split(&mut state, &mut world, &tuning);

        assert!(matches!(
            outcome,
            SplitOutcome::Placed(CutReport { overhang: false, .. })
        ));
        assert_eq!(state.stack[1].piece.width, 3.0);
        assert_eq!(state.stack[1].piece.depth, 3.0);
        assert!(state.overhangs.is_empty());
        assert_eq!(state.score, 1);
        assert_eq!(state.stack.len(), 3);
    }

    #[test]
    fn test_tiny_offset_leaves_layer_whole() {
        let (mut state, mut world, tuning) = setup(1, 1e-7);
        let outcome = split(&mut state, &mut world, &tuning);

        assert!(matches!(
            outcome,
            SplitOutcome::Placed(CutReport { overhang: false, overlap, .. }) if overlap == 3.0
        ));
        assert_eq!(state.stack[1].piece.width, 3.0);
        assert!(state.overhangs.is_empty());
        assert_eq!(world.body_count(), 3);
    }

    #[test]
    fn test_offset_split_shrinks_and_spawns_overhang() {
        let (mut state, mut world, tuning) = setup(1, 1.0);
        let outcome = split(&mut state, &mut world, &tuning);
        assert!(outcome.is_success());

        let cut = &state.stack[1].piece;
        assert_relative_eq!(cut.width, 2.0);
        assert_relative_eq!(cut.depth, 3.0);
        assert_relative_eq!(cut.position.x, 0.5);
        assert_eq!(world.position(cut.body), Some(cut.position));
        assert_eq!(world.half_extents(cut.body), Some(Vec3::new(1.0, 0.5, 1.5)));

        let overhang = &state.overhangs[0];
        assert_relative_eq!(overhang.width, 1.0);
        assert_relative_eq!(overhang.depth, 3.0);
        // Cut spans [-0.5, 1.5]; fragment spans [1.5, 2.5]
        assert_relative_eq!(overhang.position.x, 2.0);
        assert_relative_eq!(overhang.position.y, 1.0);
    }

    #[test]
    fn test_negative_offset_overhang_on_near_side() {
        let (mut state, mut world, tuning) = setup(1, -0.5);
        split(&mut state, &mut world, &tuning);
        let overhang = &state.overhangs[0];
        assert_relative_eq!(overhang.width, 0.5);
        assert_relative_eq!(overhang.position.x, -1.75);
        assert_relative_eq!(state.stack[1].piece.position.x, -0.25);
    }

    #[test]
    fn test_next_layer_slides_on_other_axis() {
        let (mut state, mut world, tuning) = setup(1, 1.0);
        split(&mut state, &mut world, &tuning);
        let next = &state.stack[2];
        assert_eq!(next.direction, Axis::Z);
        assert_relative_eq!(next.piece.position.x, 0.5);
        assert_relative_eq!(next.piece.position.y, 2.0);
        assert_relative_eq!(next.piece.position.z, -10.0);
        assert_relative_eq!(next.piece.width, 2.0);
        assert_relative_eq!(next.piece.depth, 3.0);
    }

    #[test]
    fn test_full_overshoot_is_a_miss() {
        let (mut state, mut world, tuning) = setup(1, 3.0);
        let bodies = world.body_count();
        let outcome = split(&mut state, &mut world, &tuning);

        assert!(matches!(outcome, SplitOutcome::Missed { overlap } if overlap <= 0.0));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 0);
        assert_eq!(state.stack.len(), 2);
        assert_eq!(state.stack[1].piece.width, 3.0);
        assert!(state.overhangs.is_empty());
        assert_eq!(world.body_count(), bodies);
    }

    #[test]
    fn test_split_after_game_over_is_ignored() {
        let (mut state, mut world, tuning) = setup(1, 5.0);
        split(&mut state, &mut world, &tuning);
        assert_eq!(split(&mut state, &mut world, &tuning), SplitOutcome::Ignored);
    }

    #[test]
    fn test_reaching_threshold_completes_level() {
        let (mut state, mut world, tuning) = setup(1, 0.0);
        for _ in 0..8 {
            assert!(matches!(
                split(&mut state, &mut world, &tuning),
                SplitOutcome::Placed(_)
            ));
        }
        assert_eq!(state.stack.len(), 10);

        // Layer 10 pushes the stack to 11 = level 1 threshold
        assert!(matches!(
            split(&mut state, &mut world, &tuning),
            SplitOutcome::Placed(_)
        ));
        assert_eq!(state.stack.len(), 11);
        let outcome = split(&mut state, &mut world, &tuning);
        assert!(matches!(outcome, SplitOutcome::Completed(_)));
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert_eq!(state.stack.len(), 11);
        assert_eq!(state.score, 10);
    }

    proptest! {
        #[test]
        fn prop_cuts_never_grow(offsets in proptest::collection::vec(-2.9f32..2.9, 1..9)) {
            let (mut state, mut world, tuning) = setup(5, 0.0);
            for offset in offsets {
                let n = state.stack.len();
                let below = state.stack[n - 2].piece.clone();
                let axis = state.stack[n - 1].direction;
                state.stack[n - 1].piece.position[axis.index()] =
                    below.position[axis.index()] + offset;
                let fragments = state.overhangs.len();
                let outcome = split(&mut state, &mut world, &tuning);
                if !outcome.is_success() {
                    prop_assert_eq!(state.stack.len(), n);
                    break;
                }
                let cut = &state.stack[n - 1].piece;
                prop_assert!(cut.width <= below.width + 1e-5);
                prop_assert!(cut.depth <= below.depth + 1e-5);
                let shrank = cut.extent(axis) < below.extent(axis);
                prop_assert_eq!(state.overhangs.len() > fragments, shrank);
            }
        }
    }
}
