//! Drawing surfaces
//!
//! [`Surface`] is the boundary between the renderer and whatever actually
//! puts pixels on screen. Points are integer device pixels after the
//! current translation; ellipse and rectangle bounds are fractional.
//! [`DrawList`] records every call instead of rasterizing, which is what
//! headless runs and tests draw into.

use std::fmt;

use serde::Serialize;

use crate::color::Color;

/// A point in device pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned bounding box given by its top-left corner and size.
///
/// Kept in floating point so small, distant nodes scale smoothly instead of
/// snapping to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn offset(self, by: ScreenPoint) -> Self {
        Self::new(self.x + by.x as f64, self.y + by.y as f64, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub family: String,
    pub size: f64,
}

impl Font {
    pub fn new(family: impl Into<String>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

/// Something the renderer can draw on
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Called once at the start of every frame
    fn clear(&mut self, color: Color);

    fn draw_line(&mut self, color: Color, from: ScreenPoint, to: ScreenPoint);
    fn draw_polygon(&mut self, color: Color, points: &[ScreenPoint]);
    fn fill_polygon(&mut self, color: Color, points: &[ScreenPoint]);
    fn draw_ellipse(&mut self, color: Color, bounds: Rect);
    fn fill_ellipse(&mut self, color: Color, bounds: Rect);
    fn draw_rectangle(&mut self, color: Color, bounds: Rect);
    fn fill_rectangle(&mut self, color: Color, bounds: Rect);
    fn draw_text(&mut self, text: &str, font: &Font, color: Color, at: ScreenPoint);

    /// Shift everything drawn afterwards by `(dx, dy)`; accumulates
    fn translate(&mut self, dx: i32, dy: i32);
    fn reset_transform(&mut self);
}

/// One recorded draw call, in absolute device pixels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    Clear(Color),
    Line {
        color: Color,
        from: ScreenPoint,
        to: ScreenPoint,
    },
    Polygon {
        color: Color,
        points: Vec<ScreenPoint>,
        filled: bool,
    },
    Ellipse {
        color: Color,
        bounds: Rect,
        filled: bool,
    },
    Rectangle {
        color: Color,
        bounds: Rect,
        filled: bool,
    },
    Text {
        text: String,
        font: Font,
        color: Color,
        at: ScreenPoint,
    },
}

/// A surface that records draw calls
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    width: u32,
    height: u32,
    offset: ScreenPoint,
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Commands recorded since the last [`Surface::clear`]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Every text string drawn, in order
    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn shift(&self, point: ScreenPoint) -> ScreenPoint {
        point.offset(self.offset.x, self.offset.y)
    }
}

impl Surface for DrawList {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn clear(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear(color));
    }

    fn draw_line(&mut self, color: Color, from: ScreenPoint, to: ScreenPoint) {
        let (from, to) = (self.shift(from), self.shift(to));
        self.commands.push(DrawCommand::Line { color, from, to });
    }

    fn draw_polygon(&mut self, color: Color, points: &[ScreenPoint]) {
        let points = points.iter().map(|p| self.shift(*p)).collect();
        self.commands.push(DrawCommand::Polygon {
            color,
            points,
            filled: false,
        });
    }

    fn fill_polygon(&mut self, color: Color, points: &[ScreenPoint]) {
        let points = points.iter().map(|p| self.shift(*p)).collect();
        self.commands.push(DrawCommand::Polygon {
            color,
            points,
            filled: true,
        });
    }

    fn draw_ellipse(&mut self, color: Color, bounds: Rect) {
        let bounds = bounds.offset(self.offset);
        self.commands.push(DrawCommand::Ellipse {
            color,
            bounds,
            filled: false,
        });
    }

    fn fill_ellipse(&mut self, color: Color, bounds: Rect) {
        let bounds = bounds.offset(self.offset);
        self.commands.push(DrawCommand::Ellipse {
            color,
            bounds,
            filled: true,
        });
    }

    fn draw_rectangle(&mut self, color: Color, bounds: Rect) {
        let bounds = bounds.offset(self.offset);
        self.commands.push(DrawCommand::Rectangle {
            color,
            bounds,
            filled: false,
        });
    }

    fn fill_rectangle(&mut self, color: Color, bounds: Rect) {
        let bounds = bounds.offset(self.offset);
        self.commands.push(DrawCommand::Rectangle {
            color,
            bounds,
            filled: true,
        });
    }

    fn draw_text(&mut self, text: &str, font: &Font, color: Color, at: ScreenPoint) {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            font: font.clone(),
            color,
            at: self.shift(at),
        });
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        self.offset = self.offset.offset(dx, dy);
    }

    fn reset_transform(&mut self) {
        self.offset = ScreenPoint::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_applies_to_later_commands() {
        let mut list = DrawList::new(200, 100);
        list.draw_line(Color::WHITE, ScreenPoint::new(0, 0), ScreenPoint::new(1, 1));
        list.translate(100, 50);
        list.fill_ellipse(Color::WHITE, Rect::new(-3.0, -3.0, 6.0, 6.0));
        list.reset_transform();
        list.draw_text("hi", &Font::new("mono", 8.0), Color::WHITE, ScreenPoint::new(4, 4));

        assert_eq!(
            list.commands()[1],
            DrawCommand::Ellipse {
                color: Color::WHITE,
                bounds: Rect::new(97.0, 47.0, 6.0, 6.0),
                filled: true,
            }
        );
        assert!(matches!(
            list.commands()[2],
            DrawCommand::Text { at: ScreenPoint { x: 4, y: 4 }, .. }
        ));
    }

    #[test]
    fn clear_starts_a_new_frame() {
        let mut list = DrawList::new(10, 10);
        list.fill_rectangle(Color::WHITE, Rect::new(0.0, 0.0, 1.0, 1.0));
        list.clear(Color::BLACK);

        assert_eq!(list.commands(), &[DrawCommand::Clear(Color::BLACK)]);
    }

    #[test]
    fn translations_accumulate() {
        let mut list = DrawList::new(10, 10);
        list.translate(5, 5);
        list.translate(-2, 1);
        list.draw_polygon(Color::WHITE, &[ScreenPoint::new(0, 0)]);

        match &list.commands()[0] {
            DrawCommand::Polygon { points, filled, .. } => {
                assert_eq!(points, &[ScreenPoint::new(3, 6)]);
                assert!(!filled);
            }
            other => panic!("Expected polygon, got {other:?}"),
        }
    }
}
