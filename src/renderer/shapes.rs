//! Box mesh generation
//!
//! Boxes are flat-shaded and projected through the session camera on the CPU.
//! Faces are emitted back to front so later triangles cover earlier ones
//! without a depth buffer.

use glam::{Mat4, Quat, Vec3};

use super::vertex::Vertex;
use crate::sim::{BoxPiece, SessionState};

/// Ambient light intensity
pub const AMBIENT: f32 = 0.6;
/// Directional light intensity
pub const DIRECTIONAL: f32 = 0.6;
/// Directional light position; it shines towards the origin
pub const LIGHT_POSITION: Vec3 = Vec3::new(10.0, 20.0, 0.0);

const FACE_NORMALS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

/// Lambert shade of a base color for a face normal
pub fn shade(color: [f32; 3], normal: Vec3) -> [f32; 4] {
    let diffuse = normal.dot(LIGHT_POSITION.normalize()).max(0.0);
    let intensity = AMBIENT + DIRECTIONAL * diffuse;
    [
        (color[0] * intensity).min(1.0),
        (color[1] * intensity).min(1.0),
        (color[2] * intensity).min(1.0),
        1.0,
    ]
}

/// The two in-plane axes of a face with the given normal
fn face_axes(normal: Vec3) -> (Vec3, Vec3) {
    if normal.x != 0.0 {
        (Vec3::Y, Vec3::Z)
    } else if normal.y != 0.0 {
        (Vec3::X, Vec3::Z)
    } else {
        (Vec3::X, Vec3::Y)
    }
}

/// Camera-facing faces of one box as two triangles each
///
/// Faces and normals follow the piece's rotation.
pub fn box_faces(
    piece: &BoxPiece,
    box_height: f32,
    look_dir: Vec3,
    view_proj: Mat4,
) -> Vec<Vertex> {
    let half = piece.half_extents(box_height);
    let mut vertices = Vec::with_capacity(18);

    let rotation = piece.rotation;

    for local in FACE_NORMALS {
        let normal = rotation * local;
        if normal.dot(look_dir) >= 0.0 {
            continue;
        }
        let color = shade(piece.color, normal);
        let center = piece.position + rotation * (local * half);
        let (u, v) = face_axes(local);
        let (u, v) = (rotation * (u * half), rotation * (v * half));

        let corners = [center - u - v, center + u - v, center + u + v, center - u + v]
            .map(|corner| view_proj.project_point3(corner));
        for i in [0, 1, 2, 0, 2, 3] {
            vertices.push(Vertex::new(corners[i].x, corners[i].y, color));
        }
    }

    vertices
}

/// Every box in the session, back to front
pub fn scene_vertices(state: &SessionState, box_height: f32) -> Vec<Vertex> {
    let look_dir = state.camera.look_dir;
    let view_proj = state.camera.view_proj();

    let mut pieces: Vec<&BoxPiece> = state
        .stack
        .iter()
        .map(|layer| &layer.piece)
        .chain(state.overhangs.iter())
        .collect();
    // Larger distance along the view direction is further away
    pieces.sort_by(|a, b| {
        b.position
            .dot(look_dir)
            .total_cmp(&a.position.dot(look_dir))
    });

    pieces
        .into_iter()
        .flat_map(|piece| box_faces(piece, box_height, look_dir, view_proj))
        .collect()
}
