//! 2D drawing surface
//!
//! Everything is drawn in playfield coordinates; the host surface maps
//! them onto its backing canvas.

/// Linear RGBA, 0.0 - 1.0
pub type Rgba = [f32; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Minimal immediate-mode drawing API
pub trait Surface {
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba);
    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgba);
    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgba);
    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba);
    fn text(&mut self, x: f32, y: f32, text: &str, size: f32, align: Align, color: Rgba);
}

/// CSS color string for a canvas context
pub fn css(color: Rgba) -> String {
    let [r, g, b, a] = color;
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "rgba({}, {}, {}, {:.3})",
        channel(r),
        channel(g),
        channel(b),
        a.clamp(0.0, 1.0)
    )
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Clear(Rgba),
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Rgba },
    StrokeRect { x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgba },
    FillCircle { x: f32, y: f32, r: f32, color: Rgba },
    Line { x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba },
    Text { x: f32, y: f32, text: String, size: f32, align: Align, color: Rgba },
}

/// Surface that records draw calls (headless runs and tests)
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCmd::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t.contains(needle))
    }

    pub fn count(&self, pred: impl Fn(&DrawCmd) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for DrawList {
    fn clear(&mut self, color: Rgba) {
        // A clear discards whatever was recorded before it
        self.commands.clear();
        self.commands.push(DrawCmd::Clear(color));
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.commands.push(DrawCmd::FillRect { x, y, w, h, color });
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCmd::StrokeRect {
            x,
            y,
            w,
            h,
            width,
            color,
        });
    }

    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgba) {
        self.commands.push(DrawCmd::FillCircle { x, y, r, color });
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba) {
        self.commands.push(DrawCmd::Line {
            x1,
            y1,
            x2,
            y2,
            width,
            color,
        });
    }

    fn text(&mut self, x: f32, y: f32, text: &str, size: f32, align: Align, color: Rgba) {
        self.commands.push(DrawCmd::Text {
            x,
            y,
            text: text.to_string(),
            size,
            align,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_conversion() {
        assert_eq!(css([1.0, 0.0, 0.5, 1.0]), "rgba(255, 0, 128, 1.000)");
        assert_eq!(css([2.0, -1.0, 0.0, 0.25]), "rgba(255, 0, 0, 0.250)");
    }

    #[test]
    fn test_clear_resets_recording() {
        let mut list = DrawList::new();
        list.fill_circle(1.0, 1.0, 1.0, [1.0; 4]);
        list.clear([0.0; 4]);
        list.text(0.0, 0.0, "hi", 12.0, Align::Left, [1.0; 4]);
        assert_eq!(list.commands.len(), 2);
        assert!(list.has_text("hi"));
    }
}
