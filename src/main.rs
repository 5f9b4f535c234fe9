//! Software Renderer viewer
//!
//! Renders the loaded model catalog with the CPU rasterizer and presents the
//! finished frame through macroquad, scaled up with nearest filtering.

mod hud;

use macroquad::prelude::*;
use software_renderer::config::{RenderConfig, CONFIG_PATH};
use software_renderer::rasterizer::{self as sr, OutputBuffers, RenderState, Shader, ShaderKind};
use software_renderer::scene::{load_catalog, Model};
use software_renderer::VERSION;
use std::path::Path;

use hud::{on_off, StatusLine, TextColumn};

/// Seconds to blend the background after switching models
const BACKGROUND_BLEND_SECS: f64 = 1.0;

/// Degrees of rotation per pixel of mouse drag
const DRAG_SPEED: f32 = 0.5;

fn window_conf() -> Conf {
    // Quiet load; main reports how the settings were found
    let config = RenderConfig::load(CONFIG_PATH).unwrap_or_default();
    Conf {
        window_title: format!("Software Renderer v{}", VERSION),
        window_width: config.width as i32 * config.window_scale as i32,
        window_height: config.height as i32 * config.window_scale as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

/// Load a catalog, falling back to the built-in cube when it fails or is empty
fn load_models_or_builtin(path: &Path) -> Vec<Model> {
    match load_catalog(path) {
        Ok(models) if !models.is_empty() => models,
        Ok(_) => {
            eprintln!("Catalog {} lists no models, using built-in cube", path.display());
            vec![Model::builtin_cube()]
        }
        Err(e) => {
            eprintln!("Failed to load catalog {}: {}, using built-in cube", path.display(), e);
            vec![Model::builtin_cube()]
        }
    }
}

/// Everything the frame loop mutates
struct Viewer {
    config: RenderConfig,
    state: RenderState,
    buffers: OutputBuffers,

    models: Vec<Model>,
    current: usize,

    shader_kind: ShaderKind,
    shader: Box<dyn Shader>,

    /// Time the current model was selected
    model_start: f64,
    /// Seconds of auto rotation since the current model was selected
    spin_time: f64,
    /// Rotation accumulated from mouse drags, in degrees
    drag_rotation: sr::Vec3,
    last_mouse: Option<(f32, f32)>,

    /// Background being blended away from after a model switch
    background_from: sr::Hsla,

    status: StatusLine,
    /// Opaque copy of the frame handed to the GPU
    present_bytes: Vec<u8>,
}

impl Viewer {
    fn new(config: RenderConfig, models: Vec<Model>) -> Self {
        let state = config.render_state();
        let buffers = OutputBuffers::new(config.width, config.height);
        let current = config.start_model.min(models.len().saturating_sub(1));
        let background_from = models[current].background;
        let shader_kind = ShaderKind::BlinnNormalMap;

        Self {
            config,
            state,
            buffers,
            models,
            current,
            shader_kind,
            shader: shader_kind.create(),
            model_start: get_time(),
            spin_time: 0.0,
            drag_rotation: sr::Vec3::ZERO,
            last_mouse: None,
            background_from,
            status: StatusLine::default(),
            present_bytes: Vec::new(),
        }
    }

    fn model(&self) -> &Model {
        &self.models[self.current]
    }

    fn select_model(&mut self, index: usize) {
        self.background_from = self.current_background();
        self.current = index;
        self.reset_view();
    }

    fn replace_models(&mut self, models: Vec<Model>) {
        self.background_from = self.current_background();
        self.models = models;
        self.current = 0;
        self.reset_view();
    }

    /// Back to the model's initial rotation, restarting the background blend
    fn reset_view(&mut self) {
        self.model_start = get_time();
        self.spin_time = 0.0;
        self.drag_rotation = sr::Vec3::ZERO;
        println!("Showing model: {}", self.model().name);
    }

    /// Background color, mid-blend if a model was selected recently
    fn current_background(&self) -> sr::Hsla {
        let t = ((get_time() - self.model_start) / BACKGROUND_BLEND_SECS) as f32;
        self.background_from.lerp(self.model().background, t)
    }

    /// Model rotation in degrees (x, then y)
    fn rotation(&self) -> sr::Vec3 {
        let mut rotation = self.model().initial_rotation + self.drag_rotation;
        if self.config.auto_rotate {
            let t = self.spin_time * 1000.0;
            rotation.y += ((t / 20_000.0).fract() * 360.0) as f32;
            rotation.x += ((t / 10_000.0).cos().abs() * 25.0 + 10.0) as f32;
        }
        rotation
    }

    fn handle_mouse(&mut self) {
        if is_mouse_button_down(MouseButton::Left) {
            let (mx, my) = mouse_position();
            if let Some((lx, ly)) = self.last_mouse {
                self.drag_rotation.y += (mx - lx) * DRAG_SPEED;
                self.drag_rotation.x += (my - ly) * DRAG_SPEED;
            }
            self.last_mouse = Some((mx, my));
        } else {
            self.last_mouse = None;
            if self.config.auto_rotate {
                self.spin_time += get_frame_time() as f64;
            }
        }
    }

    /// Returns false when the viewer should quit
    fn handle_keys(&mut self) -> bool {
        if is_key_pressed(KeyCode::Escape) {
            return false;
        }

        let count = self.models.len();
        if is_key_pressed(KeyCode::Right) {
            self.select_model((self.current + 1) % count);
        }
        if is_key_pressed(KeyCode::Left) {
            self.select_model((self.current + count - 1) % count);
        }

        if is_key_pressed(KeyCode::Tab) {
            self.shader_kind = self.shader_kind.next();
            self.shader = self.shader_kind.create();
            self.status.set(&format!("Shader: {}", self.shader.name()), 2.0);
        }
        if is_key_pressed(KeyCode::W) {
            self.state.wireframe = !self.state.wireframe;
        }
        if is_key_pressed(KeyCode::C) {
            self.state.backface_culling = !self.state.backface_culling;
        }
        if is_key_pressed(KeyCode::S) {
            self.state.smooth_shading = !self.state.smooth_shading;
        }

        if is_key_pressed(KeyCode::U) {
            hud::open_url(&self.model().url);
        }
        if is_key_pressed(KeyCode::P) {
            self.save_settings();
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            if is_key_pressed(KeyCode::O) {
                self.prompt_catalog();
            }
        }

        true
    }

    fn save_settings(&mut self) {
        self.config.capture_toggles(&self.state);
        match self.config.save(CONFIG_PATH) {
            Ok(()) => self.status.set(&format!("Saved settings to {}", CONFIG_PATH), 3.0),
            Err(e) => {
                eprintln!("Failed to save {}: {}", CONFIG_PATH, e);
                self.status.set(&format!("Save failed: {}", e), 5.0);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn prompt_catalog(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("RON Catalog", &["ron"]);
        if let Some(dir) = self.config.catalog.parent() {
            dialog = dialog.set_directory(dir);
        }

        let Some(path) = dialog.pick_file() else {
            return;
        };

        match load_catalog(&path) {
            Ok(models) if !models.is_empty() => {
                self.status.set(&format!("Loaded {} models from {}", models.len(), path.display()), 3.0);
                self.config.catalog = path;
                self.replace_models(models);
            }
            Ok(_) => self.status.set("Catalog lists no models", 3.0),
            Err(e) => {
                eprintln!("Failed to load catalog {}: {}", path.display(), e);
                self.status.set(&format!("Load failed: {}", e), 5.0);
            }
        }
    }

    /// Rasterize the current model into the output buffers
    fn render(&mut self) {
        let rotation = self.rotation();
        let background = sr::hsl_to_rgb(self.current_background());

        self.state.set_model_transform(rotation, sr::Vec3::ZERO);
        self.buffers.clear(background);

        let model = &self.models[self.current];
        sr::draw_model(model, &self.state, &mut self.buffers, self.shader.as_mut());
    }

    /// Upload the frame and draw it centered, scaled to fit the window
    fn present(&mut self) {
        let (w, h) = (self.buffers.width(), self.buffers.height());
        // The frame's alpha is lighting math, not coverage
        self.buffers.copy_opaque_frame(&mut self.present_bytes);
        let texture = Texture2D::from_rgba8(w as u16, h as u16, &self.present_bytes);
        texture.set_filter(FilterMode::Nearest);

        let scale = (screen_width() / w as f32).min(screen_height() / h as f32);
        let (draw_w, draw_h) = (w as f32 * scale, h as f32 * scale);

        draw_texture_ex(
            &texture,
            (screen_width() - draw_w) * 0.5,
            (screen_height() - draw_h) * 0.5,
            WHITE,
            DrawTextureParams {
                dest_size: Some(Vec2::new(draw_w, draw_h)),
                ..Default::default()
            },
        );
    }

    fn draw_hud(&mut self) {
        let model = self.model();
        let mut text = TextColumn::new(hud::to_mq(model.text_color));
        let mut opened_link = false;

        text.line(&format!("{} ({}/{})", model.name, self.current + 1, self.models.len()));
        if !model.author.is_empty() {
            let credit = format!("by {}", model.author);
            if model.url.is_empty() {
                text.line(&credit);
            } else {
                opened_link = text.link(&credit, &model.url);
            }
        }
        text.line(&format!("Faces: {}", model.face_count()));
        text.line(&format!("Shader: {}", self.shader.name()));
        text.line(&format!(
            "Wireframe: {} | Culling: {} | Smooth: {}",
            on_off(self.state.wireframe),
            on_off(self.state.backface_culling),
            on_off(self.state.smooth_shading),
        ));
        if let Some(msg) = self.status.get() {
            text.line(msg);
        }

        let help = "Left/Right model | Tab shader | W C S toggles | U link | O open | P save | Esc quit";
        draw_text(
            help,
            hud::MARGIN,
            screen_height() - hud::MARGIN,
            hud::FONT_SIZE,
            hud::to_mq(model.text_color),
        );

        if opened_link {
            let msg = format!("Opened {}", self.model().url);
            self.status.set(&msg, 3.0);
        }
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let config = RenderConfig::load_or_default(CONFIG_PATH);
    let models = load_models_or_builtin(&config.catalog);

    println!("=== Software Renderer v{} ===", VERSION);
    println!("Rendering with Width:{} and Height:{}", config.width, config.height);

    let mut viewer = Viewer::new(config, models);
    println!("Showing model: {}", viewer.model().name);

    loop {
        viewer.handle_mouse();
        if !viewer.handle_keys() {
            break;
        }

        clear_background(BLACK);
        viewer.render();
        viewer.present();
        viewer.draw_hud();

        next_frame().await;
    }
}
