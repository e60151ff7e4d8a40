//! Session state and core simulation types
//!
//! Everything a single play session mutates lives in [`SessionState`]. The
//! physics world is kept alongside it by the session and referenced here only
//! through [`BodyHandle`]s.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::OrthoCamera;
use super::physics::BodyHandle;

/// Horizontal axis a layer slides along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// Component index into a `Vec3`
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Z => 2,
        }
    }

    /// Axis the next layer slides along
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

/// Current phase of a session
///
/// `LevelComplete` and `GameOver` are terminal; leaving them means building
/// a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active layer is sliding, input is accepted
    Playing,
    /// The level's layer count was reached
    LevelComplete,
    /// A cut missed or the layer slid off
    GameOver,
}

/// Gameplay notifications for the host (HUD updates, logging)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new active layer was pushed onto the stack
    LayerSpawned { index: usize, direction: Axis },
    /// A cut left this much of the active layer standing
    LayerCut { index: usize, overlap: f32 },
    /// A severed fragment started falling
    OverhangSpawned { width: f32, depth: f32 },
    /// Autopilot aligned the active layer without shrinking it
    PerfectCut { index: usize },
    ScoreChanged(u32),
    /// Cut attempted with no overlap
    Missed { overlap: f32 },
    /// Active layer travelled past the far bound uncut
    SlidOff,
    LevelComplete { level: u32 },
    /// Active layer rose past the removal height and was dropped
    LayerPruned { index: usize },
}

/// A box with its visual data and the handle of its physics body
///
/// `position` is the visual copy; the body holds the physical copy. Both are
/// written in the same call wherever the box moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxPiece {
    pub position: Vec3,
    /// Identity for layers; falling fragments tumble
    pub rotation: Quat,
    pub width: f32,
    pub depth: f32,
    /// Linear RGB
    pub color: [f32; 3],
    pub mass: f32,
    pub body: BodyHandle,
}

impl BoxPiece {
    /// Footprint extent along a slide axis
    #[inline]
    pub fn extent(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.width,
            Axis::Z => self.depth,
        }
    }

    #[inline]
    pub fn set_extent(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.width = value,
            Axis::Z => self.depth = value,
        }
    }

    /// Half extents for the collision box
    #[inline]
    pub fn half_extents(&self, box_height: f32) -> Vec3 {
        Vec3::new(self.width / 2.0, box_height / 2.0, self.depth / 2.0)
    }
}

/// A solid layer of the tower
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub piece: BoxPiece,
    /// Axis this layer slides along while it is the active layer
    pub direction: Axis,
}

impl Layer {
    /// Position along this layer's slide axis
    #[inline]
    pub fn slide_position(&self) -> f32 {
        self.piece.position[self.direction.index()]
    }

    /// Footprint along this layer's slide axis
    #[inline]
    pub fn slide_extent(&self) -> f32 {
        self.piece.extent(self.direction)
    }
}

/// Complete state of one play session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Current level (1-based)
    pub level: u32,
    /// Successful splits this session
    pub score: u32,
    /// Autopilot plays instead of the player
    pub autopilot: bool,
    pub phase: GamePhase,
    /// Timestamp of the previous frame (ms), `None` before the first frame
    pub last_time: Option<f64>,
    /// Autopilot aim offset, drawn once per session
    pub precision: f32,
    /// Solid layers, index 0 = foundation, last = active layer
    pub stack: Vec<Layer>,
    /// Falling fragments
    pub overhangs: Vec<BoxPiece>,
    pub camera: OrthoCamera,
    /// Events since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
}

impl SessionState {
    /// Empty session; the session manager seeds the stack
    pub fn new(level: u32, autopilot: bool, precision: f32, camera: OrthoCamera) -> Self {
        Self {
            level,
            score: 0,
            autopilot,
            phase: GamePhase::Playing,
            last_time: None,
            precision,
            stack: Vec::new(),
            overhangs: Vec::new(),
            camera,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// True once the session reached a terminal phase
    #[inline]
    pub fn has_ended(&self) -> bool {
        !self.is_playing()
    }

    /// Active (moving) layer
    pub fn top(&self) -> Option<&Layer> {
        self.stack.last()
    }

    /// Layer directly beneath the active layer
    pub fn below_top(&self) -> Option<&Layer> {
        self.stack.len().checked_sub(2).map(|i| &self.stack[i])
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
