use std::io;
use tui::backend::CrosstermBackend;
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use tui::Terminal;

use crate::overlay::Overlay;
use crate::raster::{activity_alpha, unpack_rgb, Planes};

/// everything the presenter shows in one frame
pub struct FrameView<'a> {
    pub planes: &'a Planes,
    pub overlay: &'a Overlay,
    pub show_activity: bool,
    pub show_info: bool,
}

/// Display is used by the controller to put frames on a screen. It
/// abstracts the implementation details, so a variety of kinds of screen
/// would work.
pub trait Display {
    fn draw(&mut self, view: &FrameView) -> Result<(), io::Error>;
}

/// two vertically stacked pixels per terminal cell
const UPPER_HALF_BLOCK: &str = "\u{2580}";

/// Paints the colour plane, with the activity overlay composited on top
/// when enabled. Each terminal cell carries two pixels: the glyph's
/// foreground is the upper pixel, the background the lower.
struct RasterWidget<'a> {
    planes: &'a Planes,
    show_activity: bool,
}

impl RasterWidget<'_> {
    fn pixel_colour(&self, x: usize, y: usize) -> Color {
        let index = y * self.planes.scene().width + x;
        let (r, g, b) = unpack_rgb(self.planes.colour_at(index));
        if self.show_activity {
            // alpha-blend the green layer over the colour pixel
            let alpha = activity_alpha(self.planes.activity_at(index)) as u32;
            let inv = 255 - alpha;
            return Color::Rgb(
                ((r as u32 * inv) / 255) as u8,
                ((g as u32 * inv + 255 * alpha) / 255) as u8,
                ((b as u32 * inv) / 255) as u8,
            );
        }
        Color::Rgb(r, g, b)
    }
}

impl Widget for RasterWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let scene = self.planes.scene();
        let cols = (area.width as usize).min(scene.width);
        let cell_rows = (area.height as usize).min((scene.height + 1) / 2);
        for cell_y in 0..cell_rows {
            for cell_x in 0..cols {
                let top = self.pixel_colour(cell_x, cell_y * 2);
                let bottom = if cell_y * 2 + 1 < scene.height {
                    self.pixel_colour(cell_x, cell_y * 2 + 1)
                } else {
                    Color::Black
                };
                buf.get_mut(area.x + cell_x as u16, area.y + cell_y as u16)
                    .set_symbol(UPPER_HALF_BLOCK)
                    .set_fg(top)
                    .set_bg(bottom);
            }
        }
    }
}

fn info_lines(overlay: &Overlay) -> Vec<Spans<'static>> {
    let mut lines = vec![
        Spans::from(Span::raw(overlay.header.version_line.clone())),
        Spans::from(Span::raw(overlay.header.copyright.clone())),
        Spans::from(Span::raw(overlay.header.timestamp.clone())),
        Spans::from(Span::raw(format!("phase: {:?}", overlay.phase))),
        Spans::from(Span::raw(format!("last: {}", overlay.last_instruction))),
    ];
    for slot in overlay.errors.slots() {
        if !slot.is_empty() {
            lines.push(Spans::from(Span::styled(
                slot.clone(),
                Style::default().fg(Color::Red),
            )));
        }
    }
    for line in overlay.summary.lines() {
        lines.push(Spans::from(Span::raw(line.to_string())));
    }
    lines
}

/// colour raster in a terminal, rendered through tui and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TermDisplay {
    pub fn new() -> Result<TermDisplay, io::Error> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        Ok(TermDisplay { terminal })
    }
}

impl Display for TermDisplay {
    fn draw(&mut self, view: &FrameView) -> Result<(), io::Error> {
        self.terminal.draw(|f| {
            let scene = view.planes.scene();
            // a bordered box around the raster, clipped to the terminal
            let wanted = Rect::new(
                0,
                0,
                scene.width as u16 + 2,
                (scene.height as u16 + 1) / 2 + 2,
            );
            let area = wanted.intersection(f.size());
            let block = Block::default().title("DAMSON").borders(Borders::ALL);
            let inner = block.inner(area);
            f.render_widget(block, area);
            f.render_widget(
                RasterWidget {
                    planes: view.planes,
                    show_activity: view.show_activity,
                },
                inner,
            );

            if view.show_info {
                let lines = info_lines(view.overlay);
                let wanted = Rect::new(0, 0, 44, lines.len() as u16 + 2);
                let area = wanted.intersection(f.size());
                let info =
                    Paragraph::new(lines).block(Block::default().title("info").borders(Borders::ALL));
                f.render_widget(Clear, area);
                f.render_widget(info, area);
            }
        })?;
        Ok(())
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay {
    pub frames: usize,
}

impl DummyDisplay {
    pub fn new() -> DummyDisplay {
        DummyDisplay { frames: 0 }
    }
}

impl Display for DummyDisplay {
    fn draw(&mut self, _view: &FrameView) -> Result<(), io::Error> {
        self.frames += 1;
        Ok(())
    }
}
