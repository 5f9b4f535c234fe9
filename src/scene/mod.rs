//! Scene module - models, meshes and their textures
//!
//! Pure data plus loading:
//! - Meshes own their geometry and texture set
//! - Capability flags (normal/specular/emission maps) are `Option`s
//! - Catalogs are RON files listing models and their assets

mod loader;
mod model;

pub use loader::*;
pub use model::*;
