//! Level progression, slide speed and terminal outcomes

use serde::{Deserialize, Serialize};

use super::state::{GameEvent, GamePhase, SessionState};
use crate::tuning::Tuning;

/// Slide speed for a level (units per millisecond)
#[inline]
pub fn slide_speed(tuning: &Tuning, level: u32) -> f32 {
    tuning.base_speed + level as f32 * tuning.speed_per_level
}

/// Clamp any requested level into the playable range
pub fn clamp_level(tuning: &Tuning, level: i64) -> u32 {
    level.clamp(1, tuning.level_count().max(1) as i64) as u32
}

/// Stack height at which `level` is complete
pub fn threshold(tuning: &Tuning, level: u32) -> usize {
    let index = (clamp_level(tuning, level as i64) - 1) as usize;
    tuning.level_thresholds.get(index).copied().unwrap_or(usize::MAX)
}

/// Explicit level navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelSelect {
    /// Same level, fresh session
    Restart,
    Previous,
    Next,
    Goto(u32),
}

impl LevelSelect {
    /// Level a session should start at, clamped to the valid range
    pub fn target(self, current: u32, tuning: &Tuning) -> u32 {
        let requested = match self {
            LevelSelect::Restart => current as i64,
            LevelSelect::Previous => current as i64 - 1,
            LevelSelect::Next => current as i64 + 1,
            LevelSelect::Goto(level) => level as i64,
        };
        clamp_level(tuning, requested)
    }
}

/// Actions offered on the game-over panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOverMenu {
    pub level: u32,
    pub show_previous: bool,
    pub show_next: bool,
}

pub fn game_over_menu(tuning: &Tuning, level: u32) -> GameOverMenu {
    GameOverMenu {
        level,
        show_previous: level > 1,
        show_next: level < tuning.level_count(),
    }
}

/// Why a run ended in failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunEnd {
    /// Split with no overlap
    Missed { overlap: f32 },
    /// Layer travelled past the far bound without a split
    SlidOff,
}

/// Move a playing session to `GameOver`
pub fn end_run(state: &mut SessionState, cause: RunEnd) {
    if state.has_ended() {
        return;
    }
    state.phase = GamePhase::GameOver;
    let event = match cause {
        RunEnd::Missed { overlap } => GameEvent::Missed { overlap },
        RunEnd::SlidOff => GameEvent::SlidOff,
    };
    state.push_event(event);
    log::info!(
        "Game over at level {} with score {} ({:?})",
        state.level,
        state.score,
        cause
    );
}

/// Move a playing session to `LevelComplete`
pub fn complete_level(state: &mut SessionState) {
    if state.has_ended() {
        return;
    }
    state.phase = GamePhase::LevelComplete;
    state.push_event(GameEvent::LevelComplete { level: state.level });
    log::info!("Level {} complete with score {}", state.level, state.score);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::camera::OrthoCamera;
    use approx::assert_relative_eq;

    #[test]
    fn test_speed_increases_with_level() {
        let tuning = Tuning::default();
        assert_relative_eq!(slide_speed(&tuning, 3), 0.014, epsilon = 1e-7);
        assert!(slide_speed(&tuning, 2) < slide_speed(&tuning, 3));
    }

    #[test]
    fn test_threshold_table() {
        let tuning = Tuning::default();
        assert_eq!(threshold(&tuning, 1), 11);
        assert_eq!(threshold(&tuning, 5), 19);
        // Out-of-range levels clamp onto the table
        assert_eq!(threshold(&tuning, 0), 11);
        assert_eq!(threshold(&tuning, 9), 19);
    }

    #[test]
    fn test_level_select_is_bounded() {
        let tuning = Tuning::default();
        assert_eq!(LevelSelect::Previous.target(1, &tuning), 1);
        assert_eq!(LevelSelect::Next.target(5, &tuning), 5);
        assert_eq!(LevelSelect::Next.target(2, &tuning), 3);
        assert_eq!(LevelSelect::Restart.target(4, &tuning), 4);
        assert_eq!(LevelSelect::Goto(42).target(1, &tuning), 5);
        assert_eq!(LevelSelect::Goto(0).target(3, &tuning), 1);
    }

    #[test]
    fn test_game_over_menu_hides_edges() {
        let tuning = Tuning::default();
        let first = game_over_menu(&tuning, 1);
        assert!(!first.show_previous && first.show_next);
        let middle = game_over_menu(&tuning, 3);
        assert!(middle.show_previous && middle.show_next);
        let last = game_over_menu(&tuning, 5);
        assert!(last.show_previous && !last.show_next);
    }

    #[test]
    fn test_terminal_phases_are_sticky() {
        let mut state = SessionState::new(1, false, 0.0, OrthoCamera::new(1.0));
        complete_level(&mut state);
        assert_eq!(state.phase, GamePhase::LevelComplete);
        end_run(&mut state, RunEnd::SlidOff);
        assert_eq!(state.phase, GamePhase::LevelComplete);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::LevelComplete { level: 1 }]
        );
    }
}
