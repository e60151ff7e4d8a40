//! Box factory and stack/overhang registration
//!
//! Every box in the game is created here: a [`BoxPiece`] with its visual data
//! plus a body added to the physics world.

use glam::{Quat, Vec3};

use super::physics::{BodyDesc, BodyKind, PhysicsWorld};
use super::state::{Axis, BoxPiece, GameEvent, Layer, SessionState};
use crate::tuning::Tuning;

/// Layer colors, cycled by stack height (sRGB hex)
pub const PALETTE: [u32; 7] = [
    0x1abc9c, 0x2ecc71, 0x3498db, 0x9b59b6, 0xf1c40f, 0xe67e22, 0xe74c3c,
];

#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Linear RGB for a packed sRGB hex color
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

/// Color for a box created when the stack is `stack_height` layers tall
pub fn palette_color(stack_height: usize) -> [f32; 3] {
    hex_to_linear(PALETTE[stack_height % PALETTE.len()])
}

/// Mass of a box created at `stack_height`; 0 for seated boxes
///
/// Falling boxes get lighter higher up the tower.
pub fn box_mass(tuning: &Tuning, stack_height: usize, falls: bool) -> f32 {
    if !falls {
        return 0.0;
    }
    tuning.base_fall_mass * tuning.fall_mass_falloff.powi(stack_height as i32)
}

/// Create a box and add its body to the world
///
/// `width` and `depth` must be positive. Falling boxes get a dynamic body;
/// the rest start kinematic so they can slide into place.
pub fn generate_box<W: PhysicsWorld>(
    world: &mut W,
    tuning: &Tuning,
    stack_height: usize,
    position: Vec3,
    width: f32,
    depth: f32,
    falls: bool,
) -> BoxPiece {
    log::debug!(
        "Generating box at ({:.3}, {:.3}, {:.3}) with width {:.3} and depth {:.3}",
        position.x,
        position.y,
        position.z,
        width,
        depth
    );

    let mass = box_mass(tuning, stack_height, falls);
    let kind = if falls {
        BodyKind::Dynamic { mass }
    } else {
        BodyKind::Kinematic
    };
    let body = world.add_body(BodyDesc {
        position,
        half_extents: Vec3::new(width / 2.0, tuning.box_height / 2.0, depth / 2.0),
        kind,
    });

    BoxPiece {
        position,
        rotation: Quat::IDENTITY,
        width,
        depth,
        color: palette_color(stack_height),
        mass,
        body,
    }
}

/// Push a new layer on top of the stack
///
/// The previous top stops sliding for good, so its body is fixed in place.
#[allow(clippy::too_many_arguments)]
pub fn add_layer<W: PhysicsWorld>(
    state: &mut SessionState,
    world: &mut W,
    tuning: &Tuning,
    x: f32,
    z: f32,
    width: f32,
    depth: f32,
    direction: Axis,
) {
    if let Some(seated) = state.stack.last() {
        if let Err(e) = world.fix_body(seated.piece.body) {
            log::warn!("Could not fix seated layer: {}", e);
        }
    }

    let height = state.stack.len();
    let y = tuning.box_height * height as f32;
    let piece = generate_box(world, tuning, height, Vec3::new(x, y, z), width, depth, false);
    state.stack.push(Layer { piece, direction });
    state.push_event(GameEvent::LayerSpawned {
        index: height,
        direction,
    });
}

/// Spawn a falling fragment level with the current top layer
pub fn add_overhang<W: PhysicsWorld>(
    state: &mut SessionState,
    world: &mut W,
    tuning: &Tuning,
    x: f32,
    z: f32,
    width: f32,
    depth: f32,
) {
    let height = state.stack.len();
    let y = tuning.box_height * height.saturating_sub(1) as f32;
    let piece = generate_box(world, tuning, height, Vec3::new(x, y, z), width, depth, true);
    state.overhangs.push(piece);
    state.push_event(GameEvent::OverhangSpawned { width, depth });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::camera::OrthoCamera;
    use crate::sim::physics::BoxWorld;
    use approx::assert_relative_eq;

    #[test]
    fn test_palette_cycles_every_seven() {
        assert_eq!(palette_color(0), palette_color(7));
        assert_eq!(palette_color(3), palette_color(10));
        assert_ne!(palette_color(0), palette_color(1));
    }

    #[test]
    fn test_hex_to_linear_endpoints() {
        assert_eq!(hex_to_linear(0x000000), [0.0, 0.0, 0.0]);
        let white = hex_to_linear(0xffffff);
        for c in white {
            assert_relative_eq!(c, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_mass_attenuates_with_height() {
        let tuning = Tuning::default();
        assert_eq!(box_mass(&tuning, 4, false), 0.0);
        assert_relative_eq!(box_mass(&tuning, 0, true), 5.0);
        assert_relative_eq!(box_mass(&tuning, 2, true), 5.0 * 0.95 * 0.95);
        assert!(box_mass(&tuning, 10, true) < box_mass(&tuning, 9, true));
    }

    #[test]
    fn test_layers_stack_upward() {
        let tuning = Tuning::default();
        let mut world = BoxWorld::from_tuning(&tuning);
        let mut state = SessionState::new(1, false, 0.0, OrthoCamera::new(1.0));

        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::Z);
        add_layer(&mut state, &mut world, &tuning, -10.0, 0.0, 3.0, 3.0, Axis::X);

        assert_eq!(state.stack.len(), 2);
        assert_eq!(state.stack[1].piece.position, Vec3::new(-10.0, 1.0, 0.0));
        assert_eq!(state.stack[1].piece.mass, 0.0);
        assert_eq!(world.body_count(), 2);
        assert_eq!(
            world.position(state.stack[1].piece.body),
            Some(state.stack[1].piece.position)
        );
    }

    #[test]
    fn test_only_the_top_layer_can_move() {
        let tuning = Tuning::default();
        let mut world = BoxWorld::from_tuning(&tuning);
        let mut state = SessionState::new(1, false, 0.0, OrthoCamera::new(1.0));
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::Z);
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::X);
        add_overhang(&mut state, &mut world, &tuning, 2.0, 0.0, 1.0, 3.0);

        assert_eq!(world.is_dynamic(state.stack[0].piece.body), Some(false));
        assert_eq!(world.is_dynamic(state.stack[1].piece.body), Some(false));
        assert_eq!(world.is_dynamic(state.overhangs[0].body), Some(true));

        world.step(0.5);
        assert_eq!(world.position(state.stack[0].piece.body), Some(Vec3::ZERO));
        assert_eq!(
            world.position(state.stack[1].piece.body),
            Some(Vec3::new(0.0, 1.0, 0.0))
        );
    }

    #[test]
    fn test_overhang_sits_level_with_top() {
        let tuning = Tuning::default();
        let mut world = BoxWorld::from_tuning(&tuning);
        let mut state = SessionState::new(1, false, 0.0, OrthoCamera::new(1.0));
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::Z);
        add_layer(&mut state, &mut world, &tuning, 0.0, 0.0, 3.0, 3.0, Axis::X);

        add_overhang(&mut state, &mut world, &tuning, 2.0, 0.0, 1.0, 3.0);

        let overhang = &state.overhangs[0];
        assert_relative_eq!(overhang.position.y, 1.0);
        assert!(overhang.mass > 0.0);
        assert_eq!(overhang.color, palette_color(2));
    }
}
