//! Session manager
//!
//! Owns one play session: its state, the physics world and the autopilot's
//! decision source. Level changes and restarts tear everything down and
//! build a fresh session in place.

use super::autopilot::Pilot;
use super::boxes::add_layer;
use super::camera::OrthoCamera;
use super::cut::{SplitOutcome, split};
use super::level::{GameOverMenu, LevelSelect, clamp_level, game_over_menu};
use super::physics::PhysicsWorld;
use super::state::{Axis, GameEvent, GamePhase, SessionState};
use super::tick::{FrameReport, frame};
use crate::tuning::Tuning;

/// Draws a session
pub trait SceneRenderer {
    fn render(&mut self, state: &SessionState);
}

/// Renderer that draws nothing (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl SceneRenderer for NullRenderer {
    fn render(&mut self, _state: &SessionState) {}
}

/// How a pointer press or split key was handled
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputResponse {
    Split(SplitOutcome),
    /// Level is complete; the host should show the level-select menu
    ReturnToMenu,
    Ignored,
}

pub struct GameSession<W: PhysicsWorld, P: Pilot> {
    state: SessionState,
    world: W,
    pilot: P,
    tuning: Tuning,
}

impl<W: PhysicsWorld, P: Pilot> GameSession<W, P> {
    /// Build a session and start it at `level` (clamped)
    pub fn new(world: W, pilot: P, tuning: Tuning, level: u32, autopilot: bool, aspect: f32) -> Self {
        let state = SessionState::new(1, autopilot, 0.0, OrthoCamera::new(aspect));
        let mut session = Self {
            state,
            world,
            pilot,
            tuning,
        };
        session.start(level);
        session
    }

    /// Tear down the current session and seed a new one
    ///
    /// Afterwards the world holds exactly the foundation and the first sliding
    /// layer, the score is 0 and the session is playing.
    pub fn start(&mut self, level: u32) {
        let level = clamp_level(&self.tuning, level as i64);
        self.world.clear();

        let mut camera = self.state.camera.clone();
        camera.reset();
        let precision = self
            .pilot
            .draw_precision(self.tuning.autopilot_precision_range);
        self.state = SessionState::new(level, self.state.autopilot, precision, camera);

        let size = self.tuning.original_box_size;
        let tuning = &self.tuning;
        add_layer(&mut self.state, &mut self.world, tuning, 0.0, 0.0, size, size, Axis::Z);
        add_layer(
            &mut self.state,
            &mut self.world,
            tuning,
            tuning.spawn_offset,
            0.0,
            size,
            size,
            Axis::X,
        );

        log::info!(
            "Started level {} (autopilot {}, precision {:.3})",
            level,
            self.state.autopilot,
            precision
        );
    }

    /// Restart or change level
    pub fn select_level(&mut self, select: LevelSelect) -> u32 {
        let target = select.target(self.state.level, &self.tuning);
        self.start(target);
        target
    }

    /// Cut the active layer now
    pub fn split(&mut self) -> SplitOutcome {
        split(&mut self.state, &mut self.world, &self.tuning)
    }

    /// Pointer press or split key
    pub fn press(&mut self) -> InputResponse {
        match self.state.phase {
            GamePhase::Playing => InputResponse::Split(self.split()),
            GamePhase::LevelComplete => InputResponse::ReturnToMenu,
            GamePhase::GameOver => InputResponse::Ignored,
        }
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        if self.state.autopilot != enabled {
            log::info!("Autopilot {}", if enabled { "on" } else { "off" });
        }
        self.state.autopilot = enabled;
    }

    pub fn toggle_autopilot(&mut self) -> bool {
        let enabled = !self.state.autopilot;
        self.set_autopilot(enabled);
        enabled
    }

    /// Run one frame at `time` (ms) and draw the result
    pub fn advance<R: SceneRenderer>(&mut self, time: f64, renderer: &mut R) -> FrameReport {
        let report = frame(
            &mut self.state,
            &mut self.world,
            &mut self.pilot,
            &self.tuning,
            time,
        );
        renderer.render(&self.state);
        report
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.state.camera.resize(width, height);
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    /// Options for the game-over panel
    pub fn game_over_menu(&self) -> GameOverMenu {
        game_over_menu(&self.tuning, self.state.level)
    }
}
