use anyhow::{Context, Result};
use fitts_core::view::{GREEN, RED, WHITE};
use fitts_core::{Bounds, FrameView, Point, Shape};

use crate::render::SkiaRenderer;

/// Window icon: a red target beside the green start square, as straight RGBA8.
pub fn icon_rgba(size: u32) -> Result<Vec<u8>> {
    let s = size as f64;
    let mut view = FrameView::with_background(WHITE);
    view.push(Shape::Circle {
        center: Point::new(s * 0.62, s * 0.5),
        radius: s * 0.34,
        color: RED,
    });
    view.push(Shape::Rectangle {
        bounds: Bounds::centered(Point::new(s * 0.2, s * 0.5), s * 0.22, s * 0.22),
        color: GREEN,
    });

    let mut renderer = SkiaRenderer::new(size, size, None).context("icon canvas")?;
    renderer.draw_view(&view);
    Ok(renderer
        .canvas()
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect())
}
