//! WebGPU rendering module
//!
//! Boxes are flat-shaded and projected on the CPU, then drawn as plain
//! triangles.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use vertex::Vertex;
