//! Gameplay simulation
//!
//! Everything that decides what happens in a session lives here. This module
//! has no rendering or platform dependencies:
//! - Time only enters through frame timestamps
//! - Randomness only enters through a [`Pilot`]
//! - Physics only through the [`PhysicsWorld`] trait

pub mod autopilot;
pub mod boxes;
pub mod camera;
pub mod cut;
pub mod level;
pub mod physics;
pub mod session;
pub mod state;
pub mod tick;

pub use autopilot::{AutopilotAction, Pilot, PilotMove, RandomPilot, ScriptedPilot};
pub use camera::OrthoCamera;
pub use cut::{CutReport, SplitOutcome};
pub use level::{GameOverMenu, LevelSelect};
pub use physics::{BodyDesc, BodyHandle, BodyKind, BoxWorld, PhysicsError, PhysicsWorld};
pub use session::{GameSession, InputResponse, NullRenderer, SceneRenderer};
pub use state::{Axis, BoxPiece, GameEvent, GamePhase, Layer, SessionState};
pub use tick::{FrameReport, frame};
