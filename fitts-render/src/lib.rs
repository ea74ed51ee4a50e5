pub mod font;
pub mod icon;
pub mod render;

pub use ab_glyph::FontArc;
pub use font::{FONT_CANDIDATES, font_from_file, load_font};
pub use icon::icon_rgba;
pub use render::{FrameStats, SkiaRenderer, render_text_pixmap};
