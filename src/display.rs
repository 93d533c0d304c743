use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is used by the driver to put the framebuffer on a screen. The
/// interpreter never sees it; it only fills the bit-packed buffer.
pub trait Display {
    /// draw a bit-packed frame, row-major, MSB first
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error>;
}

/// is pixel `index` of a bit-packed frame lit? bytes past the end of a short
/// (detached) frame read as off
fn pixel(data: &[u8], index: usize) -> bool {
    let byte = data.get(index / 8).copied().unwrap_or(0);
    byte & (0x80 >> (index % 8)) != 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    width: usize,
    height: usize,
}

impl Geometry {
    /// canvas bounds; row 0 is at the top so y runs negative
    fn bounds(&self) -> ([f64; 2], [f64; 2]) {
        (
            [0.0, (self.width - 1) as f64],
            [-((self.height - 1) as f64), 0.0],
        )
    }

    /// canvas coordinates of every pixel, split into (lit, unlit)
    fn split_pixels(&self, data: &[u8]) -> (Vec<(f64, f64)>, Vec<(f64, f64)>) {
        (0..self.width * self.height)
            .map(|index| {
                let point = ((index % self.width) as f64, -((index / self.width) as f64));
                (point, pixel(data, index))
            })
            .fold((Vec::new(), Vec::new()), |(mut lit, mut unlit), (point, on)| {
                if on {
                    lit.push(point);
                } else {
                    unlit.push(point);
                }
                (lit, unlit)
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    geometry: Geometry,
}

impl MonoTermDisplay {
    pub fn new(width: usize, height: usize) -> Result<Self, io::Error> {
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.clear()?;
        Ok(MonoTermDisplay {
            terminal,
            geometry: Geometry { width, height },
        })
    }
}

impl Display for MonoTermDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        let geometry = self.geometry;
        let (x_bounds, y_bounds) = geometry.bounds();
        let (lit, unlit) = geometry.split_pixels(data);
        // one terminal cell per CHIP-8 pixel, plus the border
        let area = Rect::new(0, 0, geometry.width as u16 + 2, geometry.height as u16 + 2);
        self.terminal.draw(|f| {
            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("chip8vm")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(x_bounds)
                .y_bounds(y_bounds)
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &unlit,
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &lit,
                        color: Color::Green,
                    });
                });
            f.render_widget(canvas, area);
        })?;
        Ok(())
    }
}

/// keeps every frame it was asked to draw; useful for testing the driver
#[derive(Default)]
pub struct RecordingDisplay {
    pub frames: Vec<Vec<u8>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> Option<&[u8]> {
        self.frames.last().map(Vec::as_slice)
    }
}

impl Display for RecordingDisplay {
    fn draw(&mut self, data: &[u8]) -> Result<(), io::Error> {
        self.frames.push(data.to_vec());
        Ok(())
    }
}

/// render a frame as text, one line per row; handy in logs and test failures
pub fn frame_to_string(data: &[u8], width: usize, height: usize) -> String {
    let mut res = String::with_capacity((width + 1) * height);
    for y in 0..height {
        for x in 0..width {
            res.push(if pixel(data, y * width + x) { '#' } else { '.' });
        }
        res.push('\n');
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHIP8: Geometry = Geometry {
        width: 64,
        height: 32,
    };

    #[test]
    fn test_bounds() {
        assert_eq!(CHIP8.bounds(), ([0.0, 63.0], [-31.0, 0.0]));
    }

    #[test]
    fn test_pixel_past_end_is_off() {
        assert!(pixel(&[0x01], 7));
        assert!(!pixel(&[0x01], 6));
        assert!(!pixel(&[0xff], 8));
    }

    #[test]
    fn test_split_pixels() {
        let mut data = [0u8; 256];
        data[0] = 0x80; // (0, 0)
        data[255] = 0x01; // (63, 31)
        let (lit, unlit) = CHIP8.split_pixels(&data);
        assert_eq!(lit, vec![(0.0, 0.0), (63.0, -31.0)]);
        assert_eq!(unlit.len(), 2046);
    }

    #[test]
    fn test_short_frame_pads_with_off() {
        let (lit, unlit) = CHIP8.split_pixels(&[0xffu8; 255]);
        assert_eq!(lit.len(), 2040);
        assert_eq!(unlit.len(), 8);
    }

    #[test]
    fn test_recording_display() -> Result<(), io::Error> {
        let mut d = RecordingDisplay::new();
        assert_eq!(d.last_frame(), None);
        d.draw(&[1, 2, 3])?;
        assert_eq!(d.last_frame(), Some(&[1u8, 2, 3][..]));
        Ok(())
    }

    #[test]
    fn test_frame_to_string() {
        let s = frame_to_string(&[0xA0, 0x01], 8, 2);
        assert_eq!(s, "#.#.....\n.......#\n");
    }
}
