//! Character-grid canvas for drawing the network tree as text.
//!
//! Connector lines are recorded as per-cell link directions and turned into
//! box-drawing characters when the canvas is rendered, so crossings and corners
//! come out right regardless of drawing order. Boxes are drawn over lines.

use super::geometry::{Line, Rect};

const UP: u8 = 1;
const DOWN: u8 = 2;
const LEFT: u8 = 4;
const RIGHT: u8 = 8;

/// Border style of a node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxStyle {
    /// Single-line border
    Plain,
    /// Double-line border, used for highlighted nodes
    Highlighted,
}

impl BoxStyle {
    // top-left, top-right, bottom-left, bottom-right, horizontal, vertical, tee-up, tee-down
    const fn glyphs(self) -> [char; 8] {
        match self {
            Self::Plain => ['┌', '┐', '└', '┘', '─', '│', '┴', '┬'],
            Self::Highlighted => ['╔', '╗', '╚', '╝', '═', '║', '╧', '╤'],
        }
    }
}

/// Fixed-size grid of characters.
#[derive(Debug, Clone)]
pub struct TextCanvas {
    width: usize,
    height: usize,
    glyphs: Vec<Option<char>>,
    links: Vec<u8>,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cell(value: f32) -> Option<usize> {
    let rounded = value.round();
    (rounded >= 0.0).then_some(rounded as usize)
}

const fn link_glyph(links: u8) -> char {
    match links {
        0 => ' ',
        l if l == UP | DOWN | LEFT | RIGHT => '┼',
        l if l == LEFT | RIGHT | DOWN => '┬',
        l if l == LEFT | RIGHT | UP => '┴',
        l if l == UP | DOWN | RIGHT => '├',
        l if l == UP | DOWN | LEFT => '┤',
        l if l == DOWN | RIGHT => '┌',
        l if l == DOWN | LEFT => '┐',
        l if l == UP | RIGHT => '└',
        l if l == UP | LEFT => '┘',
        l if l & (LEFT | RIGHT) != 0 && l & (UP | DOWN) == 0 => '─',
        _ => '│',
    }
}

impl TextCanvas {
    /// Creates a blank canvas.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            glyphs: vec![None; width * height],
            links: vec![0; width * height],
        }
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    fn link(&mut self, x: usize, y: usize, bits: u8) {
        if let Some(i) = self.index(x, y) {
            self.links[i] |= bits;
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: char) {
        if let Some(i) = self.index(x, y) {
            self.glyphs[i] = Some(glyph);
        }
    }

    fn links_at(&self, x: usize, y: usize) -> u8 {
        self.index(x, y).map_or(0, |i| self.links[i])
    }

    /// Draws an axis-aligned line. Zero-length and diagonal lines draw nothing.
    pub fn draw_line(&mut self, line: Line) {
        let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
            cell(line.from.x),
            cell(line.from.y),
            cell(line.to.x),
            cell(line.to.y),
        ) else {
            return;
        };

        if x0 == x1 && y0 != y1 {
            let (top, bottom) = (y0.min(y1), y0.max(y1));
            for y in top..=bottom {
                let mut bits = 0;
                if y > top {
                    bits |= UP;
                }
                if y < bottom {
                    bits |= DOWN;
                }
                self.link(x0, y, bits);
            }
        } else if y0 == y1 && x0 != x1 {
            let (left, right) = (x0.min(x1), x0.max(x1));
            for x in left..=right {
                let mut bits = 0;
                if x > left {
                    bits |= LEFT;
                }
                if x < right {
                    bits |= RIGHT;
                }
                self.link(x, y0, bits);
            }
        }
    }

    /// Draws a bordered box with a one-line label, joining any connector that
    /// touches the middle of its top or bottom edge.
    pub fn draw_box(&mut self, rect: Rect, label: &str, style: BoxStyle) {
        let (Some(left), Some(top), Some(width), Some(height)) = (
            cell(rect.x),
            cell(rect.y),
            cell(rect.width),
            cell(rect.height),
        ) else {
            return;
        };
        if width < 2 || height < 2 {
            return;
        }

        let [tl, tr, bl, br, horizontal, vertical, tee_up, tee_down] = style.glyphs();
        let right = left + width - 1;
        let bottom = top + height - 1;

        for x in left..=right {
            self.put(x, top, horizontal);
            self.put(x, bottom, horizontal);
        }
        for y in top..=bottom {
            self.put(left, y, vertical);
            self.put(right, y, vertical);
            for x in left + 1..right {
                if y != top && y != bottom {
                    self.put(x, y, ' ');
                }
            }
        }
        self.put(left, top, tl);
        self.put(right, top, tr);
        self.put(left, bottom, bl);
        self.put(right, bottom, br);

        if let Some(center) = cell(rect.center_x()) {
            if top > 0 && self.links_at(center, top - 1) & DOWN != 0 {
                self.put(center, top, tee_up);
            }
            if self.links_at(center, bottom + 1) & (UP | DOWN) != 0 {
                self.put(center, bottom, tee_down);
            }
        }

        let inner = width.saturating_sub(4);
        let text: String = label.chars().take(inner).collect();
        let label_row = top + height / 2;
        for (offset, glyph) in text.chars().enumerate() {
            self.put(left + 2 + offset, label_row, glyph);
        }
    }

    /// Renders the canvas, trimming trailing spaces.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            let row: String = (0..self.width)
                .map(|x| {
                    let i = y * self.width + x;
                    self.glyphs[i].unwrap_or_else(|| link_glyph(self.links[i]))
                })
                .collect();
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out
    }
}
