//! Software rasterizer
//!
//! Features:
//! - Programmable vertex and fragment shaders
//! - Perspective-correct uv and normal interpolation
//! - Max-wins depth buffer
//! - Backface culling, flat or smooth shading, wireframe overlay
//! - Tangent-space normal mapping

mod color;
mod math;
mod render;
mod shader;
mod types;

pub use color::*;
pub use math::*;
pub use render::*;
pub use shader::*;
pub use types::*;

/// Default render resolution
pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 256;
