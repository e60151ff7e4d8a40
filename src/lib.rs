//! Stack Tower - A stack-the-blocks arcade game
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (stack, cuts, autopilot, levels, physics)
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Browser query/navigation helpers
//! - `tuning`: Data-driven game balance
//! - `settings`: Player input preferences

pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Height of every layer (world units)
    pub const BOX_HEIGHT: f32 = 1.0;
    /// Width and depth of the foundation and first layer
    pub const ORIGINAL_BOX_SIZE: f32 = 3.0;

    /// Slide speed at level 0 (units per millisecond)
    pub const BASE_SPEED: f32 = 0.008;
    /// Slide speed added per level (units per millisecond)
    pub const SPEED_PER_LEVEL: f32 = 0.002;

    /// Active layer past this slide-axis coordinate ends a manual run
    pub const FAR_TRAVEL_LIMIT: f32 = 50.0;
    /// Active layers above this height are dropped from the scene
    pub const REMOVAL_HEIGHT: f32 = 20.0;
    /// Camera stays this far above the top layer
    pub const CAMERA_OFFSET: f32 = 4.0;
    /// New layers enter from this slide-axis coordinate
    pub const SPAWN_OFFSET: f32 = -10.0;

    /// Mass of a falling box at stack height 0
    pub const BASE_FALL_MASS: f32 = 5.0;
    /// Falling mass is multiplied by this once per stack layer
    pub const FALL_MASS_FALLOFF: f32 = 0.95;

    /// Gravity along Y (m/s²)
    pub const GRAVITY: f32 = -10.0;
    /// Constraint solver iterations per physics substep
    pub const SOLVER_ITERATIONS: u32 = 40;
    /// Fixed physics substep (seconds)
    pub const PHYSICS_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per world step
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Falling bodies below this height are frozen
    pub const SLEEP_PLANE: f32 = -60.0;

    /// Autopilot precision is drawn from [-range, range)
    pub const AUTOPILOT_PRECISION_RANGE: f32 = 0.5;

    /// Layers required to finish each level (index = level - 1)
    pub const BLOCKS_TO_LEVEL_UP: [usize; 5] = [11, 13, 15, 17, 19];

    /// Visible width of the orthographic camera (world units)
    pub const VIEW_WIDTH: f32 = 10.0;
    pub const CAMERA_NEAR: f32 = 0.0;
    pub const CAMERA_FAR: f32 = 100.0;
}
