//! Autopilot: a scripted stand-in player
//!
//! The autopilot does not look at the real overlap. It waits until the active
//! layer reaches the layer beneath (shifted by a per-session precision
//! offset) and then asks a [`Pilot`] what to do. Randomness lives behind the
//! trait so tests can script every decision.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::cut::{SplitOutcome, cut_layer, split};
use super::level::{complete_level, threshold};
use super::physics::PhysicsWorld;
use super::state::{GameEvent, SessionState};
use crate::tuning::Tuning;

/// What the autopilot does once the active layer reaches its aim point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PilotMove {
    /// Cut like a player would
    Split,
    /// Keep the whole footprint, nudging the layer back by the precision offset
    Perfect,
}

/// Source of autopilot decisions
pub trait Pilot {
    /// Aim offset for a new session, in `[-range, range)`
    fn draw_precision(&mut self, range: f32) -> f32;

    /// Decision for one frame at or past the aim point
    fn choose_move(&mut self) -> PilotMove;
}

/// Coin-flip pilot over a seeded PCG stream
#[derive(Debug, Clone)]
pub struct RandomPilot {
    rng: Pcg32,
}

impl RandomPilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl Pilot for RandomPilot {
    fn draw_precision(&mut self, range: f32) -> f32 {
        if range <= 0.0 {
            return 0.0;
        }
        self.rng.random_range(-range..range)
    }

    fn choose_move(&mut self) -> PilotMove {
        if self.rng.random_bool(0.5) {
            PilotMove::Split
        } else {
            PilotMove::Perfect
        }
    }
}

/// Pilot that replays a fixed precision and move list
///
/// Once the list runs out it repeats `fallback`.
#[derive(Debug, Clone)]
pub struct ScriptedPilot {
    pub precision: f32,
    pub moves: VecDeque<PilotMove>,
    pub fallback: PilotMove,
}

impl ScriptedPilot {
    pub fn new(precision: f32, moves: impl IntoIterator<Item = PilotMove>) -> Self {
        Self {
            precision,
            moves: moves.into_iter().collect(),
            fallback: PilotMove::Split,
        }
    }
}

impl Pilot for ScriptedPilot {
    fn draw_precision(&mut self, _range: f32) -> f32 {
        self.precision
    }

    fn choose_move(&mut self) -> PilotMove {
        self.moves.pop_front().unwrap_or(self.fallback)
    }
}

/// What the autopilot did this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AutopilotAction {
    Split(SplitOutcome),
    /// Stack was already at the level's layer count
    FinishedLevel,
    Perfect,
}

/// Has the active layer reached the autopilot's aim point?
pub fn aim_reached(state: &SessionState) -> bool {
    let (Some(top), Some(below)) = (state.top(), state.below_top()) else {
        return false;
    };
    let aim = below.piece.position[top.direction.index()] + state.precision;
    top.slide_position() >= aim
}

/// Let the autopilot act for one frame
///
/// Does nothing unless autopilot is on, the session is playing, and there is a
/// layer beneath the active one.
pub fn consult<W: PhysicsWorld, P: Pilot>(
    state: &mut SessionState,
    world: &mut W,
    pilot: &mut P,
    tuning: &Tuning,
) -> Option<AutopilotAction> {
    if !state.autopilot || !state.is_playing() || state.stack.len() < 2 {
        return None;
    }
    if !aim_reached(state) {
        return None;
    }

    match pilot.choose_move() {
        PilotMove::Split => {
            if state.stack.len() < threshold(tuning, state.level) {
                Some(AutopilotAction::Split(split(state, world, tuning)))
            } else {
                complete_level(state);
                Some(AutopilotAction::FinishedLevel)
            }
        }
        PilotMove::Perfect => {
            let index = state.stack.len() - 1;
            let precision = state.precision;
            let top = state.stack.last_mut()?;
            let size = top.slide_extent();
            if let Err(e) = cut_layer(top, size, precision, tuning.box_height, world) {
                log::warn!("Perfect cut of layer {} failed: {}", index, e);
            }
            state.push_event(GameEvent::PerfectCut { index });
            Some(AutopilotAction::Perfect)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::boxes::add_layer;
    use crate::sim::camera::OrthoCamera;
    use crate::sim::physics::BoxWorld;
    use crate::sim::state::{Axis, GamePhase};
    use approx::assert_relative_eq;

    fn setup(autopilot: bool, precision: f32, x: f32) -> (SessionState, BoxWorld, Tuning) {
        let tuning = Tuning::default();
        let mut world = BoxWorld::from_tuning(&tuning);
        let mut state = SessionState::new(1, autopilot, precision, OrthoCamera::new(1.0));
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::Z);
        add_layer(&mut state, &mut world, &tuning, x, 0.0, 3.0, 3.0, Axis::X);
        (state, world, tuning)
    }

    #[test]
    fn test_random_pilot_precision_in_range() {
        let mut pilot = RandomPilot::new(7);
        for _ in 0..200 {
            let p = pilot.draw_precision(0.5);
            assert!((-0.5..0.5).contains(&p));
        }
        assert_eq!(pilot.draw_precision(0.0), 0.0);
    }

    #[test]
    fn test_random_pilot_makes_both_moves() {
        let mut pilot = RandomPilot::new(99);
        let moves: Vec<_> = (0..100).map(|_| pilot.choose_move()).collect();
        assert!(moves.contains(&PilotMove::Split));
        assert!(moves.contains(&PilotMove::Perfect));
    }

    #[test]
    fn test_scripted_pilot_falls_back() {
        let mut pilot = ScriptedPilot::new(0.25, [PilotMove::Perfect]);
        assert_eq!(pilot.draw_precision(0.5), 0.25);
        assert_eq!(pilot.choose_move(), PilotMove::Perfect);
        assert_eq!(pilot.choose_move(), PilotMove::Split);
    }

    #[test]
    fn test_waits_for_aim_point() {
        let (mut state, mut world, tuning) = setup(true, 0.2, -1.0);
        let mut pilot = ScriptedPilot::new(0.2, []);
        assert!(!aim_reached(&state));
        assert_eq!(consult(&mut state, &mut world, &mut pilot, &tuning), None);
        assert_eq!(state.stack.len(), 2);
    }

    #[test]
    fn test_inactive_without_autopilot() {
        let (mut state, mut world, tuning) = setup(false, 0.0, 0.5);
        let mut pilot = ScriptedPilot::new(0.0, []);
        assert!(aim_reached(&state));
        assert_eq!(consult(&mut state, &mut world, &mut pilot, &tuning), None);
    }

    #[test]
    fn test_split_move_cuts_like_a_player() {
        let (mut state, mut world, tuning) = setup(true, 0.0, 0.5);
        let mut pilot = ScriptedPilot::new(0.0, [PilotMove::Split]);
        let action = consult(&mut state, &mut world, &mut pilot, &tuning);
        assert!(matches!(action, Some(AutopilotAction::Split(o)) if o.is_success()));
        assert_eq!(state.score, 1);
        assert_eq!(state.stack.len(), 3);
        assert_eq!(state.overhangs.len(), 1);
    }

    #[test]
    fn test_perfect_move_keeps_footprint() {
        let (mut state, mut world, tuning) = setup(true, 0.3, 0.5);
        let mut pilot = ScriptedPilot::new(0.3, [PilotMove::Perfect]);
        let action = consult(&mut state, &mut world, &mut pilot, &tuning);

        assert_eq!(action, Some(AutopilotAction::Perfect));
        let top = &state.stack[1].piece;
        assert_eq!(top.width, 3.0);
        assert_eq!(top.depth, 3.0);
        assert_relative_eq!(top.position.x, 0.35);
        assert_eq!(world.position(top.body), Some(top.position));
        assert!(state.overhangs.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.stack.len(), 2);
    }

    #[test]
    fn test_split_at_threshold_finishes_level() {
        let (mut state, mut world, tuning) = setup(true, 0.0, 0.0);
        for _ in 0..9 {
            add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::X);
        }
        assert_eq!(state.stack.len(), 11);
        let mut pilot = ScriptedPilot::new(0.0, [PilotMove::Split]);
        let action = consult(&mut state, &mut world, &mut pilot, &tuning);
        assert_eq!(action, Some(AutopilotAction::FinishedLevel));
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert_eq!(state.stack.len(), 11);
        assert_eq!(state.score, 0);
    }
}
