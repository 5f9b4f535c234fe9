//! Model catalog loading
//!
//! The catalog and mesh geometry are RON files; textures are decoded with
//! the `image` crate. Relative paths resolve against the catalog's directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::model::{Mesh, MeshData, Model};
use crate::rasterizer::{rgb_to_hsl, Color, Hsla, Image, Vec3};

/// Error type for catalog loading
#[derive(Debug)]
pub enum SceneError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    ImageError { path: PathBuf, source: image::ImageError },
    InvalidFace { mesh: String, face: usize, reason: String },
    MissingDiffuse { mesh: String },
}

impl From<std::io::Error> for SceneError {
    fn from(e: std::io::Error) -> Self {
        SceneError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for SceneError {
    fn from(e: ron::error::SpannedError) -> Self {
        SceneError::ParseError(e)
    }
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::IoError(e) => write!(f, "IO error: {}", e),
            SceneError::ParseError(e) => write!(f, "Parse error: {}", e),
            SceneError::ImageError { path, source } => {
                write!(f, "Failed to load {}: {}", path.display(), source)
            }
            SceneError::InvalidFace { mesh, face, reason } => {
                write!(f, "Invalid face {} in {}: {}", face, mesh, reason)
            }
            SceneError::MissingDiffuse { mesh } => write!(f, "Mesh {} has no diffuse texture", mesh),
        }
    }
}

impl std::error::Error for SceneError {}

/// Top level of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub models: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_background")]
    pub background: Hsla,
    #[serde(default = "default_text_color")]
    pub text_color: Color,
    #[serde(default)]
    pub initial_rotation: Vec3,
    pub meshes: Vec<MeshEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshEntry {
    #[serde(default = "default_true")]
    pub allow_lighting: bool,
    /// RON `MeshData` file
    pub geometry: String,
    pub diffuse: String,
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default)]
    pub specular: Option<String>,
    #[serde(default)]
    pub emission: Option<String>,
}

fn default_background() -> Hsla {
    rgb_to_hsl(Color::EGGSHELL)
}

fn default_text_color() -> Color {
    Color::BLACK
}

fn default_true() -> bool {
    true
}

/// A map slot counts as present only if its own path is set and non-empty
fn map_path(path: &Option<String>) -> Option<&str> {
    path.as_deref().filter(|p| !p.is_empty())
}

pub fn parse_catalog(s: &str) -> Result<Catalog, SceneError> {
    Ok(ron::from_str(s)?)
}

/// Load mesh geometry from a RON file
pub fn load_mesh_data<P: AsRef<Path>>(path: P) -> Result<MeshData, SceneError> {
    let contents = fs::read_to_string(path)?;
    Ok(ron::from_str(&contents)?)
}

fn load_texture(base_dir: &Path, rel: &str) -> Result<Image, SceneError> {
    let path = base_dir.join(rel);
    Image::from_file(&path).map_err(|source| SceneError::ImageError { path, source })
}

fn load_mesh(entry: &MeshEntry, base_dir: &Path) -> Result<Mesh, SceneError> {
    if entry.diffuse.is_empty() {
        return Err(SceneError::MissingDiffuse { mesh: entry.geometry.clone() });
    }

    let data = load_mesh_data(base_dir.join(&entry.geometry))?;
    data.validate().map_err(|e| SceneError::InvalidFace {
        mesh: entry.geometry.clone(),
        face: e.face,
        reason: e.reason,
    })?;

    let diffuse = load_texture(base_dir, &entry.diffuse)?;
    let mut mesh = Mesh::from_data(data, diffuse).with_lighting(entry.allow_lighting);

    if let Some(p) = map_path(&entry.normal) {
        mesh = mesh.with_normal_map(load_texture(base_dir, p)?);
    }
    if let Some(p) = map_path(&entry.specular) {
        mesh = mesh.with_specular_map(load_texture(base_dir, p)?);
    }
    if let Some(p) = map_path(&entry.emission) {
        mesh = mesh.with_emission_map(load_texture(base_dir, p)?);
    }

    Ok(mesh)
}

/// Load every model of a parsed catalog, resolving paths against `base_dir`
pub fn load_models(catalog: &Catalog, base_dir: &Path) -> Result<Vec<Model>, SceneError> {
    #[cfg(not(target_arch = "wasm32"))]
    let progress = {
        let total: usize = catalog.models.iter().map(|m| m.meshes.len()).sum();
        let bar = indicatif::ProgressBar::new(total as u64);
        if let Ok(style) = indicatif::ProgressStyle::with_template("{bar:30} {pos}/{len} meshes {msg}") {
            bar.set_style(style);
        }
        bar
    };

    let mut models = Vec::with_capacity(catalog.models.len());

    for entry in &catalog.models {
        let mut model = Model::new(&entry.name);
        model.author = entry.author.clone();
        model.url = entry.url.clone();
        model.background = entry.background;
        model.text_color = entry.text_color;
        model.initial_rotation = entry.initial_rotation;

        for mesh_entry in &entry.meshes {
            #[cfg(not(target_arch = "wasm32"))]
            progress.set_message(mesh_entry.geometry.clone());

            let mesh = load_mesh(mesh_entry, base_dir)?;
            let line = format!(
                "Loaded mesh: V:{} F:{} UV:{} N:{}",
                mesh.vertices.len(),
                mesh.faces.len(),
                mesh.uvs.len(),
                mesh.normals.len()
            );
            model.meshes.push(mesh);

            #[cfg(not(target_arch = "wasm32"))]
            {
                progress.println(line);
                progress.inc(1);
            }
            #[cfg(target_arch = "wasm32")]
            println!("{}", line);
        }

        models.push(model);
    }

    #[cfg(not(target_arch = "wasm32"))]
    progress.finish_and_clear();

    for model in &models {
        let verts: usize = model.meshes.iter().map(|m| m.vertices.len()).sum();
        println!(
            "Loaded model: {} ({} meshes, V:{} F:{})",
            model.name,
            model.meshes.len(),
            verts,
            model.face_count()
        );
    }

    Ok(models)
}

/// Load a catalog file and every model it lists
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<Model>, SceneError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let catalog = parse_catalog(&contents)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    load_models(&catalog, base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::Vec2;
    use crate::scene::Face;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("software-renderer-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_triangle(dir: &Path, faces: Vec<Face>) {
        let data = MeshData {
            vertices: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            normals: vec![Vec3::new(0.0, 0.0, 1.0)],
            uvs: vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            faces,
        };
        fs::write(dir.join("tri.ron"), ron::ser::to_string(&data).unwrap()).unwrap();
    }

    fn write_png(dir: &Path, name: &str, rgba: [u8; 4]) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba))
            .save(dir.join(name))
            .unwrap();
    }

    const CATALOG: &str = r#"
        Catalog(
            models: [
                ModelEntry(
                    name: "Tri",
                    author: "someone",
                    url: "https://example.com/tri",
                    background: Hsla(h: 0.5, s: 0.2, l: 0.7),
                    initial_rotation: (x: 10.0, y: 20.0, z: 0.0),
                    meshes: [
                        MeshEntry(
                            geometry: "tri.ron",
                            diffuse: "diffuse.png",
                            normal: Some("normal.png"),
                            emission: Some(""),
                        ),
                    ],
                ),
            ],
        )
    "#;

    #[test]
    fn test_parse_catalog_defaults() {
        let catalog = parse_catalog(CATALOG).unwrap();
        let model = &catalog.models[0];
        assert_eq!(model.name, "Tri");
        assert_eq!(model.text_color, Color::BLACK);
        assert_eq!(model.background.a, 1.0);
        assert!(model.meshes[0].allow_lighting);
        assert!(model.meshes[0].specular.is_none());
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(parse_catalog("Catalog(models: ["), Err(SceneError::ParseError(_))));
    }

    #[test]
    fn test_load_catalog_from_files() {
        let dir = temp_dir("catalog");
        write_triangle(&dir, vec![Face { vertices: [0, 1, 2], uvs: [0, 1, 2], normals: [0; 3] }]);
        write_png(&dir, "diffuse.png", [200, 100, 50, 255]);
        write_png(&dir, "normal.png", [128, 128, 255, 255]);
        fs::write(dir.join("models.ron"), CATALOG).unwrap();

        let models = load_catalog(dir.join("models.ron")).unwrap();
        assert_eq!(models.len(), 1);
        let model = &models[0];
        assert_eq!(model.author, "someone");
        assert_eq!(model.initial_rotation, Vec3::new(10.0, 20.0, 0.0));
        assert_eq!(model.face_count(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.diffuse.get_pixel(1, 1), Color::new(200, 100, 50));
        assert!(mesh.has_normal_map());
        // Each flag follows its own path: no specular, empty emission
        assert!(!mesh.has_specular_map());
        assert!(!mesh.has_emissive_map());
    }

    #[test]
    fn test_invalid_face_rejected() {
        let dir = temp_dir("invalid-face");
        write_triangle(&dir, vec![Face { vertices: [0, 1, 7], uvs: [0, 1, 2], normals: [0; 3] }]);
        write_png(&dir, "diffuse.png", [0, 0, 0, 255]);
        write_png(&dir, "normal.png", [0, 0, 0, 255]);
        fs::write(dir.join("models.ron"), CATALOG).unwrap();

        match load_catalog(dir.join("models.ron")) {
            Err(SceneError::InvalidFace { face, reason, .. }) => {
                assert_eq!(face, 0);
                assert!(reason.contains("vertex index 7"));
            }
            other => panic!("expected InvalidFace, got {:?}", other.map(|m| m.len())),
        }
    }

    #[test]
    fn test_missing_texture() {
        let dir = temp_dir("missing-texture");
        write_triangle(&dir, vec![Face { vertices: [0, 1, 2], uvs: [0, 1, 2], normals: [0; 3] }]);
        let _ = fs::remove_file(dir.join("diffuse.png"));
        fs::write(dir.join("models.ron"), CATALOG).unwrap();

        let err = load_catalog(dir.join("models.ron")).unwrap_err();
        assert!(matches!(err, SceneError::ImageError { .. }));
        assert!(err.to_string().contains("diffuse.png"));
    }

    #[test]
    fn test_bundled_catalog_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/models.ron");
        let models = load_catalog(path).unwrap();
        assert_eq!(models.len(), 2);
        assert!(models[0].meshes[0].has_specular_map());
        assert!(!models[1].meshes[0].allow_lighting);
        assert!(models[1].meshes[0].has_emissive_map());
        assert_eq!(models[1].initial_rotation, Vec3::ZERO);
    }

    #[test]
    fn test_missing_catalog() {
        let err = load_catalog("definitely/not/here/models.ron").unwrap_err();
        assert!(matches!(err, SceneError::IoError(_)));
    }
}
