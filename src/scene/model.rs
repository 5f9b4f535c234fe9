//! In-memory model data consumed by the renderer
//!
//! Populated once by the loader (or built procedurally) and treated as
//! immutable while rendering.

use serde::{Deserialize, Serialize};
use crate::rasterizer::{rgb_to_hsl, Color, Hsla, Image, Vec2, Vec3};

/// A triangle: three index triples into the owning mesh's arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    pub vertices: [usize; 3],
    pub uvs: [usize; 3],
    pub normals: [usize; 3],
}

/// A face index pointing past the end of its array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidFace {
    pub face: usize,
    pub reason: String,
}

/// Raw geometry as stored in a mesh file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    #[serde(default)]
    pub normals: Vec<Vec3>,
    #[serde(default)]
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Face>,
}

impl MeshData {
    /// Check that every face index is in range for its array
    pub fn validate(&self) -> Result<(), InvalidFace> {
        for (face_idx, face) in self.faces.iter().enumerate() {
            let checks = [
                ("vertex", &face.vertices, self.vertices.len()),
                ("uv", &face.uvs, self.uvs.len()),
                ("normal", &face.normals, self.normals.len()),
            ];
            for (kind, indices, len) in checks {
                if let Some(bad) = indices.iter().find(|&&i| i >= len) {
                    return Err(InvalidFace {
                        face: face_idx,
                        reason: format!("{} index {} out of range ({} {}s)", kind, bad, len, kind),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Renderable geometry plus its texture set
#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub faces: Vec<Face>,

    pub diffuse: Image,
    pub normal_map: Option<Image>,
    pub specular_map: Option<Image>,
    pub emission_map: Option<Image>,

    pub allow_lighting: bool,
}

impl Mesh {
    /// Lit mesh with only a diffuse texture
    pub fn from_data(data: MeshData, diffuse: Image) -> Self {
        Self {
            vertices: data.vertices,
            normals: data.normals,
            uvs: data.uvs,
            faces: data.faces,
            diffuse,
            normal_map: None,
            specular_map: None,
            emission_map: None,
            allow_lighting: true,
        }
    }

    pub fn with_lighting(mut self, allow: bool) -> Self {
        self.allow_lighting = allow;
        self
    }

    pub fn with_normal_map(mut self, map: Image) -> Self {
        self.normal_map = Some(map);
        self
    }

    pub fn with_specular_map(mut self, map: Image) -> Self {
        self.specular_map = Some(map);
        self
    }

    pub fn with_emission_map(mut self, map: Image) -> Self {
        self.emission_map = Some(map);
        self
    }

    pub fn has_normal_map(&self) -> bool {
        self.normal_map.is_some()
    }

    pub fn has_specular_map(&self) -> bool {
        self.specular_map.is_some()
    }

    pub fn has_emissive_map(&self) -> bool {
        self.emission_map.is_some()
    }

    /// Axis-aligned cube centered on the origin, outward-facing CCW winding
    pub fn cube(half_extent: f32, diffuse: Image) -> Self {
        let e = half_extent;
        let positions = [
            // Front
            Vec3::new(-e, -e, e),
            Vec3::new(e, -e, e),
            Vec3::new(e, e, e),
            Vec3::new(-e, e, e),
            // Back
            Vec3::new(-e, -e, -e),
            Vec3::new(-e, e, -e),
            Vec3::new(e, e, -e),
            Vec3::new(e, -e, -e),
            // Top
            Vec3::new(-e, e, -e),
            Vec3::new(-e, e, e),
            Vec3::new(e, e, e),
            Vec3::new(e, e, -e),
            // Bottom
            Vec3::new(-e, -e, -e),
            Vec3::new(e, -e, -e),
            Vec3::new(e, -e, e),
            Vec3::new(-e, -e, e),
            // Right
            Vec3::new(e, -e, -e),
            Vec3::new(e, e, -e),
            Vec3::new(e, e, e),
            Vec3::new(e, -e, e),
            // Left
            Vec3::new(-e, -e, -e),
            Vec3::new(-e, -e, e),
            Vec3::new(-e, e, e),
            Vec3::new(-e, e, -e),
        ];

        let normals = vec![
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        ];

        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        let mut faces = Vec::with_capacity(12);
        for side in 0..6 {
            let base = side * 4;
            faces.push(Face {
                vertices: [base, base + 1, base + 2],
                uvs: [0, 1, 2],
                normals: [side; 3],
            });
            faces.push(Face {
                vertices: [base, base + 2, base + 3],
                uvs: [0, 2, 3],
                normals: [side; 3],
            });
        }

        let data = MeshData { vertices: positions.to_vec(), normals, uvs, faces };
        Self::from_data(data, diffuse)
    }
}

/// An ordered set of meshes plus display metadata
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub author: String,
    pub url: String,
    /// Clear color behind this model
    pub background: Hsla,
    /// HUD text color that reads well on `background`
    pub text_color: Color,
    /// Starting (x, y) rotation in degrees
    pub initial_rotation: Vec3,
    pub meshes: Vec<Mesh>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            author: String::new(),
            url: String::new(),
            background: rgb_to_hsl(Color::EGGSHELL),
            text_color: Color::BLACK,
            initial_rotation: Vec3::ZERO,
            meshes: Vec::new(),
        }
    }

    pub fn face_count(&self) -> usize {
        self.meshes.iter().map(|m| m.faces.len()).sum()
    }

    /// Checkerboard cube shown when no catalog is available
    pub fn builtin_cube() -> Self {
        let texture = Image::checkerboard(64, 64, 8, Color::new(230, 120, 40), Color::new(40, 40, 50));
        let mut model = Self::new("Checker Cube");
        model.author = "built-in".to_string();
        model.initial_rotation = Vec3::new(20.0, 30.0, 0.0);
        model.meshes.push(Mesh::cube(0.6, texture));
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_face() -> MeshData {
        MeshData {
            vertices: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            normals: vec![Vec3::new(0.0, 0.0, 1.0)],
            uvs: vec![Vec2::ZERO],
            faces: vec![Face { vertices: [0, 1, 2], uvs: [0; 3], normals: [0; 3] }],
        }
    }

    #[test]
    fn test_validate_ok() {
        assert_eq!(one_face().validate(), Ok(()));
    }

    #[test]
    fn test_validate_reports_bad_index() {
        let mut data = one_face();
        data.faces.push(Face { vertices: [0, 1, 2], uvs: [0, 0, 3], normals: [0; 3] });
        let err = data.validate().unwrap_err();
        assert_eq!(err.face, 1);
        assert!(err.reason.contains("uv index 3"), "{}", err.reason);
    }

    #[test]
    fn test_capability_flags() {
        let mesh = Mesh::from_data(one_face(), Image::new(1, 1));
        assert!(!mesh.has_normal_map() && !mesh.has_specular_map() && !mesh.has_emissive_map());
        let mesh = mesh.with_specular_map(Image::new(1, 1));
        assert!(mesh.has_specular_map());
        assert!(!mesh.has_normal_map());
    }

    #[test]
    fn test_cube_is_valid_and_outward() {
        let cube = Mesh::cube(1.0, Image::new(1, 1));
        assert_eq!(cube.faces.len(), 12);
        let data = MeshData {
            vertices: cube.vertices.clone(),
            normals: cube.normals.clone(),
            uvs: cube.uvs.clone(),
            faces: cube.faces.clone(),
        };
        assert!(data.validate().is_ok());

        for face in &cube.faces {
            let [a, b, c] = face.vertices.map(|i| cube.vertices[i]);
            let n = (b - a).cross(c - a).normalize();
            let stored = cube.normals[face.normals[0]];
            assert!((n.dot(stored) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_face_count() {
        let mut model = Model::builtin_cube();
        model.meshes.push(Mesh::from_data(one_face(), Image::new(1, 1)));
        assert_eq!(model.face_count(), 13);
    }
}
