//! Programmable vertex/fragment stages
//!
//! A shader keeps only per-pass scratch state. The mesh, model and render
//! state it works on arrive with every call through `ShaderContext`.

use super::color::Color;
use super::math::{IVec2, Mat3, Mat4, Vec2, Vec3, Vec4};
use super::render::RenderState;
use super::types::Image;
use crate::scene::{Mesh, Model};

/// What a shader may read while drawing one mesh
#[derive(Clone, Copy)]
pub struct ShaderContext<'a> {
    pub state: &'a RenderState,
    pub model: &'a Model,
    pub mesh: &'a Mesh,
}

/// Interpolated inputs for one pixel
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    /// Perspective-correct barycentric weights
    pub bar: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub screen: IVec2,
}

pub trait Shader {
    fn name(&self) -> &'static str;

    /// Called once per mesh before any of its faces
    fn begin_pass(&mut self, ctx: &ShaderContext);

    /// Transform vertex `slot` (0..3) of face `face` into clip space.
    ///
    /// Anything the fragment stage needs about the raw triangle has to be
    /// cached here, keyed by `slot`.
    fn vertex(&mut self, ctx: &ShaderContext, position: Vec3, face: usize, slot: usize) -> Vec4;

    /// Color for one covered pixel, or `None` to discard it
    fn fragment(&mut self, ctx: &ShaderContext, frag: &Fragment) -> Option<Color>;
}

/// The fixed set of shaders the viewer can switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    BlinnNormalMap = 0,
    Unlit = 1,
}

impl ShaderKind {
    pub const ALL: [ShaderKind; 2] = [ShaderKind::BlinnNormalMap, ShaderKind::Unlit];

    pub fn label(&self) -> &'static str {
        match self {
            ShaderKind::BlinnNormalMap => BlinnNormalMap::NAME,
            ShaderKind::Unlit => Unlit::NAME,
        }
    }

    pub fn create(&self) -> Box<dyn Shader> {
        match self {
            ShaderKind::BlinnNormalMap => Box::new(BlinnNormalMap::default()),
            ShaderKind::Unlit => Box::new(Unlit::default()),
        }
    }

    /// Next shader in `ALL`, wrapping around
    pub fn next(&self) -> ShaderKind {
        Self::ALL[(*self as usize + 1) % Self::ALL.len()]
    }
}

// ============================================================================
// Blinn with tangent-space normal mapping
// ============================================================================

#[derive(Debug, Default)]
pub struct BlinnNormalMap {
    model_view_proj: Mat4,
    normal_mat: Mat3,

    // Per-triangle data for the normal-map basis
    ndc_vertex: [Vec3; 3],
    vertex_uv: [Vec2; 3],
}

impl BlinnNormalMap {
    pub const NAME: &'static str = "Blinn Normal Map";

    const DIFFUSE_WEIGHT: f32 = 1.2;
    const SPECULAR_WEIGHT: f32 = 0.6;
    const AMBIENT: f32 = 0.15;
    const SPECULAR_BASE_POWER: f32 = 5.0;

    /// View-space normal from the normal map, using a tangent basis solved
    /// from the triangle's NDC and uv deltas. `None` when the basis is
    /// degenerate.
    fn mapped_normal(&self, map: &Image, frag: &Fragment) -> Option<Vec3> {
        let n = self.normal_mat * frag.normal;
        let [p0, p1, p2] = self.ndc_vertex;
        let [uv0, uv1, uv2] = self.vertex_uv;

        let ai = Mat3::new([p1 - p0, p2 - p0, n]).try_invert()?;
        let i = (ai * Vec3::new(uv1.x - uv0.x, uv2.x - uv0.x, 0.0)).try_normalize()?;
        let j = (ai * Vec3::new(uv1.y - uv0.y, uv2.y - uv0.y, 0.0)).try_normalize()?;

        let basis = Mat3::new([i, j, n]).transpose();
        (basis * map.sample_normal(frag.uv)).try_normalize()
    }
}

impl Shader for BlinnNormalMap {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn begin_pass(&mut self, ctx: &ShaderContext) {
        self.model_view_proj = ctx.state.projection * ctx.state.model_view;
        self.normal_mat = self.model_view_proj.to_mat3().invert().transpose();
    }

    fn vertex(&mut self, ctx: &ShaderContext, position: Vec3, face: usize, slot: usize) -> Vec4 {
        let clip = self.model_view_proj * position.extend(1.0);

        let mesh = ctx.mesh;
        if mesh.allow_lighting && mesh.has_normal_map() {
            self.ndc_vertex[slot] = clip.project();
            self.vertex_uv[slot] = mesh.uvs[mesh.faces[face].uvs[slot]];
        }

        clip
    }

    fn fragment(&mut self, ctx: &ShaderContext, frag: &Fragment) -> Option<Color> {
        let mesh = ctx.mesh;
        let diffuse = mesh.diffuse.sample(frag.uv);

        if !mesh.allow_lighting {
            return Some(diffuse);
        }

        let normal = mesh
            .normal_map
            .as_ref()
            .and_then(|map| self.mapped_normal(map, frag))
            .unwrap_or_else(|| self.normal_mat * frag.normal);

        let l = ctx.state.light_dir;
        let intensity = normal.dot(l).max(0.0);

        let spec = match &mesh.specular_map {
            Some(map) => {
                let exponent = Self::SPECULAR_BASE_POWER + map.sample(frag.uv).b as f32;
                (normal * (normal.dot(l) * 2.0) - l)
                    .try_normalize()
                    .map_or(0.0, |r| r.z.max(0.0).powf(exponent))
            }
            None => 0.0,
        };

        let lit = diffuse * (Self::DIFFUSE_WEIGHT * intensity + Self::SPECULAR_WEIGHT * spec);
        // Lighting scales color only; coverage stays the texture's
        Some(Color { a: diffuse.a, ..(lit + diffuse * Self::AMBIENT) })
    }
}

// ============================================================================
// Unlit
// ============================================================================

/// Raw diffuse texture, plus the emission map when the mesh has one
#[derive(Debug, Default)]
pub struct Unlit {
    model_view_proj: Mat4,
}

impl Unlit {
    pub const NAME: &'static str = "Unlit";
}

impl Shader for Unlit {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn begin_pass(&mut self, ctx: &ShaderContext) {
        self.model_view_proj = ctx.state.projection * ctx.state.model_view;
    }

    fn vertex(&mut self, _ctx: &ShaderContext, position: Vec3, _face: usize, _slot: usize) -> Vec4 {
        self.model_view_proj * position.extend(1.0)
    }

    fn fragment(&mut self, ctx: &ShaderContext, frag: &Fragment) -> Option<Color> {
        let mesh = ctx.mesh;
        let diffuse = mesh.diffuse.sample(frag.uv);
        Some(match &mesh.emission_map {
            Some(map) => diffuse + map.sample(frag.uv),
            None => diffuse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Face, MeshData};

    const GREY: Color = Color { r: 100, g: 100, b: 100, a: 255 };

    fn flat_state() -> RenderState {
        let mut state = RenderState::new(
            Vec3::new(0.0, 0.0, 3.0),
            Vec3::ZERO,
            Vec3::UP,
            Vec3::new(0.0, 0.0, 1.0),
            16,
            16,
        );
        state.model_view = Mat4::identity();
        state.projection = Mat4::identity();
        state
    }

    fn quad_mesh_data() -> MeshData {
        MeshData {
            vertices: vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            normals: vec![Vec3::new(0.0, 0.0, 1.0)],
            uvs: vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            faces: vec![Face { vertices: [0, 1, 2], uvs: [0, 1, 2], normals: [0; 3] }],
        }
    }

    fn quad_mesh() -> Mesh {
        Mesh::from_data(quad_mesh_data(), Image::solid(4, 4, GREY))
    }

    fn fragment() -> Fragment {
        Fragment {
            bar: Vec3::new(0.3, 0.3, 0.4),
            normal: Vec3::new(0.0, 0.0, 1.0),
            uv: Vec2::new(0.3, 0.3),
            screen: IVec2::new(0, 0),
        }
    }

    fn shade(shader: &mut dyn Shader, state: &RenderState, mesh: Mesh) -> Option<Color> {
        let mut model = Model::new("test");
        model.meshes.push(mesh);
        let ctx = ShaderContext { state, model: &model, mesh: &model.meshes[0] };
        shader.begin_pass(&ctx);
        for slot in 0..3 {
            let v = ctx.mesh.vertices[ctx.mesh.faces[0].vertices[slot]];
            shader.vertex(&ctx, v, 0, slot);
        }
        shader.fragment(&ctx, &fragment())
    }

    #[test]
    fn test_unlit_lighting_disabled_returns_diffuse() {
        let mesh = quad_mesh().with_lighting(false);
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), mesh);
        assert_eq!(col, Some(GREY));
    }

    #[test]
    fn test_blinn_facing_light() {
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), quad_mesh()).unwrap();
        // 100 * 1.2 + 100 * 0.15
        assert_eq!((col.r, col.g, col.b, col.a), (135, 135, 135, 255));
    }

    #[test]
    fn test_blinn_ambient_only_when_lit_from_behind() {
        let mut state = flat_state();
        state.light_dir = Vec3::new(0.0, 0.0, -1.0);
        let col = shade(&mut BlinnNormalMap::default(), &state, quad_mesh()).unwrap();
        assert_eq!(col, Color::with_alpha(15, 15, 15, 255));
    }

    #[test]
    fn test_lit_pixels_keep_texture_alpha() {
        let mut state = flat_state();
        state.light_dir = Vec3::new(0.0, 0.0, -1.0);
        let mesh = Mesh::from_data(quad_mesh_data(), Image::solid(4, 4, Color::WHITE));
        let col = shade(&mut BlinnNormalMap::default(), &state, mesh).unwrap();
        assert_eq!(col, Color::with_alpha(38, 38, 38, 255));

        let half = Color::with_alpha(200, 200, 200, 128);
        let mesh = Mesh::from_data(quad_mesh_data(), Image::solid(4, 4, half));
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), mesh).unwrap();
        assert_eq!(col.a, 128);
    }

    #[test]
    fn test_blinn_specular_map() {
        let mesh = quad_mesh().with_specular_map(Image::solid(2, 2, Color::with_alpha(0, 0, 0, 255)));
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), mesh).unwrap();
        // 100 * (1.2 + 0.6) + 15
        assert_eq!(col.r, 195);
    }

    #[test]
    fn test_blinn_flat_normal_map_matches_vertex_normal() {
        let flat = Image::solid(2, 2, Color::new(128, 128, 255));
        let mesh = quad_mesh().with_normal_map(flat);
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), mesh).unwrap();
        assert!((col.r as i32 - 135).abs() <= 1, "{:?}", col);
    }

    #[test]
    fn test_tilted_normal_map_darkens() {
        // Normal tilted 45 degrees towards +x
        let tilted = Image::solid(2, 2, Color::new(218, 128, 218));
        let mesh = quad_mesh().with_normal_map(tilted);
        let col = shade(&mut BlinnNormalMap::default(), &flat_state(), mesh).unwrap();
        assert!(col.r < 130 && col.r > 90, "{:?}", col);
    }

    #[test]
    fn test_unlit_adds_emission() {
        let mesh = quad_mesh().with_emission_map(Image::solid(2, 2, Color::with_alpha(10, 20, 30, 0)));
        let col = shade(&mut Unlit::default(), &flat_state(), mesh).unwrap();
        assert_eq!(col, Color::with_alpha(110, 120, 130, 255));
    }

    #[test]
    fn test_shader_kind_cycle() {
        assert_eq!(ShaderKind::BlinnNormalMap.next(), ShaderKind::Unlit);
        assert_eq!(ShaderKind::Unlit.next(), ShaderKind::BlinnNormalMap);
        for kind in ShaderKind::ALL {
            assert_eq!(kind.create().name(), kind.label());
        }
    }
}
