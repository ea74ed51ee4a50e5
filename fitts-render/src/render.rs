use ab_glyph::{Font, FontArc, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, bail};
use bytemuck::{try_cast_slice, try_cast_slice_mut};
use fitts_core::view::{BUTTON, BUTTON_SELECTED, WHITE};
use fitts_core::{FrameView, Point, Rgba, Shape, TextAnchor};
use fitts_timing::Timer;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use string_cache::DefaultAtom as Atom;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, PremultipliedColorU8, Rect,
    Transform,
};

const BUTTON_LABEL_PX: f32 = 18.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    color: Rgba,
}

/// Rasterized labels keyed by content, size and color. Most frames redraw
/// the same handful of strings, so each is rasterized once.
struct TextCache {
    font: FontArc,
    map: HashMap<TextKey, Option<Arc<Pixmap>>>,
}

impl TextCache {
    fn new(font: FontArc) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str, size_px: f32, color: Rgba) -> Option<Arc<Pixmap>> {
        let key = TextKey {
            text: Atom::from(text),
            size_bits: size_px.to_bits(),
            color,
        };
        if let Some(p) = self.map.get(&key) {
            return p.clone();
        }
        let pm = render_text_pixmap(text, size_px, &self.font, color).map(Arc::new);
        self.map.insert(key, pm.clone());
        pm
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Rasterizes a single line of text into a tight, premultiplied pixmap.
/// Returns `None` when nothing in `text` has an outline (empty or blank).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Rgba,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let outlined: Vec<_> = glyphs
        .iter()
        .filter_map(|g| font.outline_glyph(g.clone()))
        .collect();
    for out in &outlined {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlined.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = pm.width() as usize;
    let dst = pm.pixels_mut();

    for out in &outlined {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // premultiply by coverage * alpha
            let a_lin = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a_lin * 255.0) as u8;
            let sr = (color[0] as f32 * a_lin) as u8;
            let sg = (color[1] as f32 * a_lin) as u8;
            let sb = (color[2] as f32 * a_lin) as u8;

            // overlapping glyphs: src over existing
            let bg = dst[i];
            let inv = 1.0 - (sa as f32 / 255.0);
            let blended = PremultipliedColorU8::from_rgba(
                sr.saturating_add((bg.red() as f32 * inv) as u8),
                sg.saturating_add((bg.green() as f32 * inv) as u8),
                sb.saturating_add((bg.blue() as f32 * inv) as u8),
                sa.saturating_add((bg.alpha() as f32 * inv) as u8),
            );
            if let Some(px) = blended {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    pub shapes: usize,
}

/// Draws [`FrameView`]s onto an opaque offscreen canvas and presents them
/// into an RGBA8 frame buffer of the same size.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    text_cache: Option<TextCache>,
}

impl SkiaRenderer {
    /// Without a font, text shapes are skipped and everything else is drawn.
    pub fn new(width: u32, height: u32, font: Option<FontArc>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
        Ok(Self {
            width,
            height,
            canvas,
            text_cache: font.map(TextCache::new),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width, new_height)
            .with_context(|| format!("cannot resize canvas to {new_width}x{new_height}"))?;
        self.width = new_width;
        self.height = new_height;
        Ok(())
    }

    pub fn cached_labels(&self) -> usize {
        self.text_cache.as_ref().map_or(0, TextCache::len)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn render_frame<T: Timer>(
        &mut self,
        view: &FrameView,
        frame_buffer: &mut [u8],
        timer: &T,
    ) -> Result<FrameStats> {
        let expected = self.width as usize * self.height as usize * 4;
        if frame_buffer.len() != expected {
            bail!(
                "frame buffer holds {} bytes, canvas needs {expected}",
                frame_buffer.len()
            );
        }

        let t_draw = {
            let t = timer.now();
            self.draw_view(view);
            timer.elapsed(t)
        };

        let t_copy = {
            let t = timer.now();
            frame_buffer.copy_from_slice(self.canvas.data());
            timer.elapsed(t)
        };

        Ok(FrameStats {
            draw: t_draw,
            copy: t_copy,
            total: t_draw + t_copy,
            shapes: view.shapes.len(),
        })
    }

    /// Draws `view` onto the canvas without presenting it
    pub fn draw_view(&mut self, view: &FrameView) {
        self.canvas.fill(to_color(view.background));
        for shape in &view.shapes {
            self.draw_shape(shape);
        }
    }

    fn draw_shape(&mut self, shape: &Shape) {
        match shape {
            Shape::Rectangle { bounds, color } => {
                self.fill_rect(bounds.x, bounds.y, bounds.width, bounds.height, *color);
            }
            Shape::Circle {
                center,
                radius,
                color,
            } => {
                let Some(path) =
                    PathBuilder::from_circle(center.x as f32, center.y as f32, *radius as f32)
                else {
                    return;
                };
                self.canvas.fill_path(
                    &path,
                    &paint(*color),
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
            }
            Shape::Text {
                content,
                position,
                anchor,
                size,
                color,
            } => self.draw_text(content, *position, *anchor, *size, *color),
            Shape::Button {
                bounds,
                label,
                selected,
            } => {
                let fill = if *selected { BUTTON_SELECTED } else { BUTTON };
                self.fill_rect(bounds.x, bounds.y, bounds.width, bounds.height, fill);
                self.draw_text(
                    label,
                    bounds.center(),
                    TextAnchor::Center,
                    BUTTON_LABEL_PX,
                    WHITE,
                );
            }
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgba) {
        if let Some(rect) = Rect::from_xywh(x as f32, y as f32, w as f32, h as f32) {
            self.canvas
                .fill_rect(rect, &paint(color), Transform::identity(), None);
        }
    }

    fn draw_text(&mut self, text: &str, at: Point, anchor: TextAnchor, size: f32, color: Rgba) {
        let Some(cache) = self.text_cache.as_mut() else {
            return;
        };
        let Some(pm) = cache.get_or_render(text, size, color) else {
            return;
        };
        let (x, y) = match anchor {
            TextAnchor::TopLeft => (at.x as i32, at.y as i32),
            TextAnchor::Center => (
                (at.x - pm.width() as f64 * 0.5) as i32,
                (at.y - pm.height() as f64 * 0.5) as i32,
            ),
        };
        self.blit_pixmap(&pm, x, y);
    }

    /// Composites a premultiplied pixmap with its top-left corner at `(x, y)`.
    pub fn blit_pixmap(&mut self, pm: &Pixmap, x: i32, y: i32) {
        let (w, h) = (pm.width() as i32, pm.height() as i32);
        let (cw, ch) = (self.width as i32, self.height as i32);

        // cull fully off-screen
        if x + w <= 0 || y + h <= 0 || x >= cw || y >= ch {
            return;
        }

        let dst_x = x.max(0) as usize;
        let dst_y = y.max(0) as usize;
        let src_x_offset = (-x).max(0) as usize;
        let src_y_offset = (-y).max(0) as usize;
        let copy_w = (w as usize - src_x_offset).min(cw as usize - dst_x);
        let copy_h = (h as usize - src_y_offset).min(ch as usize - dst_y);
        let src_stride = pm.width() as usize;
        let dst_stride = self.width as usize;

        let aligned = pm.data().as_ptr().align_offset(4) == 0
            && self.canvas.data().as_ptr().align_offset(4) == 0;
        if !aligned {
            return self.blit_slow(pm, x, y);
        }
        let (Ok(src_u32), Ok(dst_u32)) = (
            try_cast_slice::<u8, u32>(pm.data()),
            try_cast_slice_mut::<u8, u32>(self.canvas.data_mut()),
        ) else {
            return;
        };

        for row in 0..copy_h {
            let src_row_start = (src_y_offset + row) * src_stride + src_x_offset;
            let dst_row_start = (dst_y + row) * dst_stride + dst_x;

            for i in 0..copy_w {
                let s = u32::from_le(src_u32[src_row_start + i]);
                let sa = (s >> 24) & 0xFF;
                if sa == 0 {
                    continue;
                }
                if sa == 255 {
                    dst_u32[dst_row_start + i] = s.to_le();
                    continue;
                }
                let d = u32::from_le(dst_u32[dst_row_start + i]);
                let inv = 255 - sa;

                let r = (s & 0xFF) + ((d & 0xFF) * inv + 127) / 255;
                let g = ((s >> 8) & 0xFF) + (((d >> 8) & 0xFF) * inv + 127) / 255;
                let b = ((s >> 16) & 0xFF) + (((d >> 16) & 0xFF) * inv + 127) / 255;
                let a = sa + (((d >> 24) & 0xFF) * inv + 127) / 255;

                dst_u32[dst_row_start + i] = ((a << 24) | (b << 16) | (g << 8) | r).to_le();
            }
        }
    }

    // Unaligned buffers; let tiny-skia composite instead.
    fn blit_slow(&mut self, pm: &Pixmap, x: i32, y: i32) {
        self.canvas.draw_pixmap(
            x,
            y,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

fn to_color(c: Rgba) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn paint(c: Rgba) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color(to_color(c));
    p.anti_alias = true;
    p
}
