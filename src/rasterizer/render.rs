//! Core rendering functions
//!
//! Depth-buffered triangle rasterization driven by a programmable shader.
//! The depth test is max-wins: a larger clip-space z is closer to the camera.

use super::color::Color;
use super::math::{look_at, projection, rotation_x, rotation_y, translation, viewport, IVec2, Mat4, Vec2, Vec3, Vec4};
use super::shader::{Fragment, Shader, ShaderContext};
use super::types::{Image, CHANNELS};
use crate::scene::Model;

/// Depth value of an empty depth-buffer cell (farther than anything drawn)
pub const DEPTH_FAR: f32 = -1000.0;

/// Safety bound on Bresenham steps for malformed endpoints
pub const MAX_LINE_STEPS: usize = 10_000;

/// Render targets, allocated once and reset in place every frame
pub struct OutputBuffers {
    /// Finished frame, handed to the presentation sink
    pub frame: Image,
    /// Scratch target for screen-space effects; the pipeline never writes it
    pub temp: Image,
    /// One depth value per pixel, same bottom-left addressing as `frame`
    pub depth: Vec<f32>,
}

impl OutputBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            frame: Image::new(width, height),
            temp: Image::new(width, height),
            depth: vec![DEPTH_FAR; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.frame.width
    }

    pub fn height(&self) -> usize {
        self.frame.height
    }

    /// Reset depth to `DEPTH_FAR` and fill the frame with `clear_color`
    pub fn clear(&mut self, clear_color: Color) {
        self.depth.fill(DEPTH_FAR);
        self.frame.fill(clear_color);
    }

    fn depth_index(&self, x: i32, y: i32) -> usize {
        debug_assert!(self.frame.contains(x, y));
        (self.height() - 1 - y as usize) * self.width() + x as usize
    }

    pub fn depth_at(&self, x: i32, y: i32) -> f32 {
        self.depth[self.depth_index(x, y)]
    }

    /// Raw RGBA bytes of the finished frame, top row first
    pub fn frame_bytes(&self) -> &[u8] {
        &self.frame.data
    }

    /// Frame bytes with every alpha forced to 255, for sinks that blend
    pub fn copy_opaque_frame(&self, out: &mut Vec<u8>) {
        out.clear();
        out.extend_from_slice(&self.frame.data);
        for px in out.chunks_exact_mut(CHANNELS) {
            px[3] = 255;
        }
    }
}

/// Camera, transforms and pipeline toggles
#[derive(Debug, Clone)]
pub struct RenderState {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub light_dir: Vec3,

    pub model_view: Mat4,
    pub projection: Mat4,
    pub viewport: Mat4,

    pub backface_culling: bool,
    pub wireframe: bool,
    pub smooth_shading: bool,
}

impl RenderState {
    /// Camera at `eye` looking at `center`, drawing into the central 80% of a
    /// `width` x `height` target
    pub fn new(eye: Vec3, center: Vec3, up: Vec3, light_dir: Vec3, width: usize, height: usize) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            eye,
            center,
            up,
            light_dir,
            model_view: look_at(eye, center, up),
            projection: projection(eye, center),
            viewport: viewport(w / 10.0, h / 10.0, w * 4.0 / 5.0, h * 4.0 / 5.0),
            backface_culling: true,
            wireframe: false,
            smooth_shading: true,
        }
    }

    /// Rotate the model (degrees around x, then y) and translate it
    pub fn set_model_transform(&mut self, rotation: Vec3, offset: Vec3) {
        self.model_view = look_at(self.eye, self.center, self.up)
            * rotation_x(rotation.x)
            * rotation_y(rotation.y)
            * translation(offset);
    }

    /// Camera position in object space, used for backface culling.
    ///
    /// Assumes the vertex stage applies `projection * model_view` and nothing
    /// else.
    pub fn view_position_object_space(&self) -> Vec3 {
        (self.projection * self.model_view).to_mat3().invert() * self.eye
    }
}

/// Draw a line from v0 to v1 using Bresenham's algorithm.
///
/// Only pixels with `0 <= x < width - 1` and `0 <= y < height - 1` are
/// written; the last row and column are never touched. Steps run in i64 so
/// endpoints anywhere in the i32 range cannot overflow.
pub fn draw_line(v0: IVec2, v1: IVec2, out: &mut Image, color: Color) {
    let (mut x, mut y) = (v0.x as i64, v0.y as i64);
    let (x1, y1) = (v1.x as i64, v1.y as i64);

    let dx = (x1 - x).abs();
    let dy = -(y1 - y).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let max_x = out.width as i64 - 1;
    let max_y = out.height as i64 - 1;

    for _ in 0..MAX_LINE_STEPS {
        if x >= 0 && x < max_x && y >= 0 && y < max_y {
            out.set_pixel(x as i32, y as i32, color);
        }

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Outline a screen triangle in the wireframe color
pub fn draw_wireframe(points: [IVec2; 3], out: &mut Image) {
    let [t0, t1, t2] = points;
    draw_line(t0, t1, out, Color::WIREFRAME);
    draw_line(t1, t2, out, Color::WIREFRAME);
    draw_line(t2, t0, out, Color::WIREFRAME);
}

/// Weights sentinel for points that cannot be inside a triangle
pub const OUTSIDE: Vec3 = Vec3 { x: -1.0, y: 1.0, z: 1.0 };

/// Barycentric coordinates of `p` in screen triangle (p0, p1, p2).
///
/// Returns `OUTSIDE` for near-degenerate triangles. Deltas are taken in
/// f32, so saturated screen coordinates do not overflow.
pub fn barycentric(p0: IVec2, p1: IVec2, p2: IVec2, p: IVec2) -> Vec3 {
    let d = |a: i32, b: i32| a as f32 - b as f32;
    let u = Vec3::new(d(p2.x, p0.x), d(p1.x, p0.x), d(p0.x, p.x))
        .cross(Vec3::new(d(p2.y, p0.y), d(p1.y, p0.y), d(p0.y, p.y)));

    if u.z.abs() < 1.0 {
        return OUTSIDE;
    }

    Vec3::new(1.0 - (u.x + u.y) / u.z, u.y / u.z, u.x / u.z)
}

/// Inside test, inclusive on edges
pub fn is_inside(bc: Vec3) -> bool {
    bc.x >= 0.0 && bc.y >= 0.0 && bc.z >= 0.0
}

/// A vertex-shaded triangle ready for rasterization
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// Clip-space positions from the vertex stage
    pub clip: [Vec4; 3],
    pub uvs: [Vec2; 3],
    pub normals: [Vec3; 3],
    /// Flat face normal, used when smooth shading is off
    pub face_normal: Vec3,
}

impl Triangle {
    /// Screen positions after viewport mapping and perspective divide
    pub fn screen_points(&self, viewport: &Mat4) -> [IVec2; 3] {
        self.clip.map(|v| (*viewport * v).project().round_xy())
    }
}

/// Rasterize a single triangle into `buffers`
pub fn rasterize_triangle(
    tri: &Triangle,
    ctx: &ShaderContext,
    buffers: &mut OutputBuffers,
    shader: &mut dyn Shader,
) {
    let state = ctx.state;
    let [t0, t1, t2] = tri.screen_points(&state.viewport);
    let [c0, c1, c2] = tri.clip;

    // Bounding box clamped to the frame; an empty range draws nothing
    let max_x = buffers.width() as i32 - 1;
    let max_y = buffers.height() as i32 - 1;
    let min_x = t0.x.min(t1.x).min(t2.x).clamp(0, max_x);
    let min_y = t0.y.min(t1.y).min(t2.y).clamp(0, max_y);
    let box_max_x = t0.x.max(t1.x).max(t2.x).clamp(0, max_x);
    let box_max_y = t0.y.max(t1.y).max(t2.y).clamp(0, max_y);

    for y in min_y..=box_max_y {
        for x in min_x..=box_max_x {
            let screen = IVec2::new(x, y);
            let bc = barycentric(t0, t1, t2, screen);
            if !is_inside(bc) {
                continue;
            }

            let z = c0.z * bc.x + c1.z * bc.y + c2.z * bc.z;
            let di = buffers.depth_index(x, y);
            if buffers.depth[di] >= z {
                continue;
            }

            // Perspective-correct weights; w near zero can leave nothing usable
            let pc = Vec3::new(bc.x / c0.w, bc.y / c1.w, bc.z / c2.w);
            let sum = pc.x + pc.y + pc.z;
            if sum == 0.0 || !sum.is_finite() {
                continue;
            }
            let pc = pc / sum;

            buffers.depth[di] = z;

            let uv = tri.uvs[0] * pc.x + tri.uvs[1] * pc.y + tri.uvs[2] * pc.z;
            let normal = if state.smooth_shading {
                (tri.normals[0] * pc.x + tri.normals[1] * pc.y + tri.normals[2] * pc.z)
                    .try_normalize()
                    .unwrap_or(tri.face_normal)
            } else {
                tri.face_normal
            };

            let frag = Fragment { bar: pc, normal, uv, screen };
            if let Some(color) = shader.fragment(ctx, &frag) {
                buffers.frame.set_pixel(x, y, color);
            }
        }
    }

    if state.wireframe {
        draw_wireframe([t0, t1, t2], &mut buffers.frame);
    }
}

/// True when a face with `normal` (through `vertex`) faces away from `view_pos`
pub fn is_back_facing(normal: Vec3, vertex: Vec3, view_pos: Vec3) -> bool {
    normal.dot(vertex - view_pos) >= 0.0
}

/// Render every mesh of `model` into `buffers`
pub fn draw_model(model: &Model, state: &RenderState, buffers: &mut OutputBuffers, shader: &mut dyn Shader) {
    let view_pos = state.view_position_object_space();

    for mesh in &model.meshes {
        let ctx = ShaderContext { state, model, mesh };
        shader.begin_pass(&ctx);

        for (face_idx, face) in mesh.faces.iter().enumerate() {
            let [a, b, c] = face.vertices.map(|i| mesh.vertices[i]);

            // Zero-area faces have no normal: never culled, never filled
            let face_normal = (b - a).cross(c - a).try_normalize();
            if let Some(n) = face_normal {
                if state.backface_culling && is_back_facing(n, a, view_pos) {
                    continue;
                }
            } else if !state.wireframe {
                continue;
            }

            let mut clip = [Vec4::ZERO; 3];
            for (slot, v) in clip.iter_mut().enumerate() {
                *v = shader.vertex(&ctx, mesh.vertices[face.vertices[slot]], face_idx, slot);
            }

            let tri = Triangle {
                clip,
                uvs: face.uvs.map(|i| mesh.uvs[i]),
                normals: face.normals.map(|i| mesh.normals[i]),
                face_normal: face_normal.unwrap_or(Vec3::ZERO),
            };

            if face_normal.is_some() {
                rasterize_triangle(&tri, &ctx, buffers, shader);
            } else {
                draw_wireframe(tri.screen_points(&state.viewport), &mut buffers.frame);
            }
        }
    }
}
