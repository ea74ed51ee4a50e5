use crate::geometry::{Bounds, Point};

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];
pub const RED: Rgba = [255, 0, 0, 255];
pub const GREEN: Rgba = [0, 200, 0, 255];
pub const BLUE: Rgba = [0, 0, 255, 255];
pub const BUTTON: Rgba = [131, 151, 214, 255];
pub const BUTTON_SELECTED: Rgba = [93, 103, 135, 255];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    TopLeft,
    Center,
}

/// Drawable primitives handed to the display surface
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle {
        bounds: Bounds,
        color: Rgba,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba,
    },
    Text {
        content: String,
        position: Point,
        anchor: TextAnchor,
        size: f32,
        color: Rgba,
    },
    Button {
        bounds: Bounds,
        label: String,
        selected: bool,
    },
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub background: Rgba,
    pub shapes: Vec<Shape>,
}

impl Default for FrameView {
    fn default() -> Self {
        Self {
            background: WHITE,
            shapes: Vec::new(),
        }
    }
}

impl FrameView {
    pub fn with_background(background: Rgba) -> Self {
        Self {
            background,
            shapes: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: Shape) -> &mut Self {
        self.shapes.push(shape);
        self
    }

    pub fn text(
        &mut self,
        content: impl Into<String>,
        position: Point,
        size: f32,
        color: Rgba,
    ) -> &mut Self {
        self.push(Shape::Text {
            content: content.into(),
            position,
            anchor: TextAnchor::TopLeft,
            size,
            color,
        })
    }

    pub fn centered_text(
        &mut self,
        content: impl Into<String>,
        position: Point,
        size: f32,
        color: Rgba,
    ) -> &mut Self {
        self.push(Shape::Text {
            content: content.into(),
            position,
            anchor: TextAnchor::Center,
            size,
            color,
        })
    }

    pub fn circles(&self) -> impl Iterator<Item = (Point, f64)> + '_ {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Circle { center, radius, .. } => Some((*center, *radius)),
            _ => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text { content, .. } => Some(content.as_str()),
            Shape::Button { label, .. } => Some(label.as_str()),
            _ => None,
        })
    }
}
