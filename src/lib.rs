//! Software Renderer: CPU triangle rasterizer with programmable shaders
//!
//! Draws textured, normal-mapped meshes into an in-memory RGBA frame:
//! - Row-major 2/3/4-dimensional vector and matrix math
//! - Perspective projection with a configurable viewport
//! - Barycentric rasterization with a max-wins depth buffer
//! - Perspective-correct uv and normal interpolation
//! - Backface culling and an optional wireframe overlay
//! - Blinn lighting with tangent-space normal, specular and emission maps

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod rasterizer;
pub mod scene;
