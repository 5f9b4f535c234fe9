//! Viewer overlay: model credits, toggles and status line

use macroquad::prelude::*;
use software_renderer::rasterizer as sr;

pub const FONT_SIZE: f32 = 18.0;
pub const LINE_HEIGHT: f32 = 20.0;
pub const MARGIN: f32 = 10.0;

/// Convert a renderer color for macroquad drawing
pub fn to_mq(color: sr::Color) -> Color {
    Color::from_rgba(color.r, color.g, color.b, color.a)
}

/// Draw a clickable text link that opens `url` when clicked.
/// Returns whether it was clicked.
pub fn draw_link(x: f32, y: f32, text: &str, url: &str, color: Color, hover_color: Color) -> bool {
    let dims = measure_text(text, None, FONT_SIZE as u16, 1.0);
    let (mx, my) = mouse_position();
    let hovered = mx >= x && mx <= x + dims.width && my >= y - dims.height && my <= y + 4.0;
    let clicked = hovered && is_mouse_button_pressed(MouseButton::Left);

    let draw_color = if hovered { hover_color } else { color };
    draw_text(text, x, y, FONT_SIZE, draw_color);

    if hovered {
        draw_line(x, y + 2.0, x + dims.width, y + 2.0, 1.0, draw_color);
    }

    if clicked {
        open_url(url);
    }

    clicked
}

/// Open a URL in the system browser (no-op in the browser build)
pub fn open_url(url: &str) {
    if url.is_empty() {
        return;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = webbrowser::open(url) {
            eprintln!("Failed to open {}: {}", url, e);
        }
    }
}

/// One-line message that disappears after a timeout
#[derive(Default)]
pub struct StatusLine {
    message: Option<(String, f64)>,
}

impl StatusLine {
    pub fn set(&mut self, message: &str, duration_secs: f64) {
        let expiry = get_time() + duration_secs;
        self.message = Some((message.to_string(), expiry));
    }

    /// Current message if not expired
    pub fn get(&self) -> Option<&str> {
        match &self.message {
            Some((msg, expiry)) if get_time() < *expiry => Some(msg),
            _ => None,
        }
    }
}

/// Lines of text stacked down from the top-left corner
pub struct TextColumn {
    x: f32,
    y: f32,
    color: Color,
}

impl TextColumn {
    pub fn new(color: Color) -> Self {
        Self { x: MARGIN, y: MARGIN + FONT_SIZE, color }
    }

    pub fn line(&mut self, text: &str) {
        draw_text(text, self.x, self.y, FONT_SIZE, self.color);
        self.y += LINE_HEIGHT;
    }

    /// Returns whether the link was clicked
    pub fn link(&mut self, text: &str, url: &str) -> bool {
        let hover = Color::new(self.color.r, self.color.g, self.color.b, 0.6);
        let clicked = draw_link(self.x, self.y, text, url, self.color, hover);
        self.y += LINE_HEIGHT;
        clicked
    }
}

/// Short "on"/"off" label for a toggle
pub fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
