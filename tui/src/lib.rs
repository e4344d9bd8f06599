//! TUI rendering and input for Blockfall.

mod input;
mod theme;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthStr;

use blockfall_engine::{App, BoardLayout, Point};

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{Palette, styles};

/// Terminal cells per column at full size.
const COLUMN_CELLS: f32 = 8.0;
/// Terminal lines per row at full size.
const ROW_CELLS: f32 = 3.0;

/// Mapping from layout units to terminal cells for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardView {
    area: Rect,
    scale_x: f32,
    scale_y: f32,
    layout: BoardLayout,
}

impl BoardView {
    /// Fit `layout` into `area`, shrinking when the terminal is small.
    #[must_use]
    pub fn fit(area: Rect, layout: BoardLayout) -> Self {
        let scale_x = (COLUMN_CELLS / layout.column_size())
            .min(f32::from(area.width) / layout.width());
        let scale_y = (ROW_CELLS / layout.row_size())
            .min(f32::from(area.height) / layout.height());
        let width = (layout.width() * scale_x).round() as u16;
        let height = (layout.height() * scale_y).round() as u16;
        let area = Rect {
            x: area.x + area.width.saturating_sub(width) / 2,
            y: area.y,
            width: width.min(area.width),
            height: height.min(area.height),
        };
        Self {
            area,
            scale_x,
            scale_y,
            layout,
        }
    }

    #[must_use]
    pub fn area(&self) -> Rect {
        self.area
    }

    /// Terminal rect of a cell-sized block whose top-left corner is `point`.
    #[must_use]
    pub fn rect_at(&self, point: Point) -> Rect {
        let x = (point.x * self.scale_x).round().max(0.0) as u16;
        let y = (point.y * self.scale_y).round().max(0.0) as u16;
        let width = (self.layout.cell_size() * self.scale_x).round().max(1.0) as u16;
        let height = (self.layout.cell_size() * self.scale_y).round().max(1.0) as u16;
        Rect {
            x: self.area.x.saturating_add(x),
            y: self.area.y.saturating_add(y),
            width,
            height,
        }
        .intersection(self.area)
    }

    #[must_use]
    pub fn column_rect(&self, column: usize) -> Rect {
        let x = (column as f32 * self.layout.column_size() * self.scale_x).round() as u16;
        let width = (self.layout.column_size() * self.scale_x).round().max(1.0) as u16;
        Rect {
            x: self.area.x.saturating_add(x),
            y: self.area.y,
            width,
            height: self.area.height,
        }
        .intersection(self.area)
    }

    /// Column under terminal column `x`.
    #[must_use]
    pub fn column_at(&self, x: u16) -> Option<usize> {
        let offset = x.checked_sub(self.area.x)?;
        if offset >= self.area.width {
            return None;
        }
        self.layout
            .column_at((f32::from(offset) + 0.5) / self.scale_x)
    }
}

struct Areas {
    top: Rect,
    board: Rect,
    cursor: Rect,
    status: Rect,
}

fn split(area: Rect) -> Areas {
    let [top, board, cursor, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);
    Areas {
        top,
        board,
        cursor,
        status,
    }
}

/// Board geometry for a frame of size `area`. Input uses this to map clicks.
#[must_use]
pub fn board_view(area: Rect, app: &App) -> BoardView {
    BoardView::fit(split(area).board, *app.layout())
}

fn value_label(value: u32) -> String {
    match 1u64.checked_shl(value) {
        Some(number) => number.to_string(),
        None => format!("2^{value}"),
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::standard();
    let areas = split(frame.area());
    frame.render_widget(
        Block::default().style(Style::default().bg(palette.bg_dark)),
        frame.area(),
    );

    draw_top_bar(frame, app, &palette, areas.top);
    let view = BoardView::fit(areas.board, *app.layout());
    draw_board(frame, app, &palette, &view);
    draw_cursor(frame, app, &palette, &view, areas.cursor);
    draw_status(frame, app, &palette, areas.status);
}

fn draw_top_bar(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let score = app.score();
    let mut spans = Vec::new();
    for (label, value) in [
        ("Score ", score.score.to_string()),
        ("Best ", score.best.to_string()),
        ("Level ", app.level().to_string()),
        ("Next ", value_label(app.upcoming())),
    ] {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(label, styles::label(palette)));
        spans.push(Span::styled(value, styles::value(palette)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_board(frame: &mut Frame, app: &App, palette: &Palette, view: &BoardView) {
    for column in 0..app.columns() {
        frame.render_widget(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT)
                .border_style(Style::default().fg(palette.bg_border))
                .style(styles::column(palette)),
            view.column_rect(column),
        );
    }

    for entity in app.scene().entities() {
        let rect = view.rect_at(entity.position());
        if rect.is_empty() {
            continue;
        }
        let (value, style) = match entity.ghost() {
            Some(ghost) if ghost.opacity > 0.5 => {
                (ghost.value, styles::ghost(palette, ghost.value))
            }
            _ => {
                let value = entity.display_value();
                (value, styles::block(palette, value))
            }
        };
        let label = value_label(value);
        let top_padding = rect.height.saturating_sub(1) / 2;
        let mut lines = vec![Line::default(); top_padding as usize];
        lines.push(Line::from(label).alignment(Alignment::Center));
        frame.render_widget(Paragraph::new(lines).style(style), rect);
    }
}

fn draw_cursor(frame: &mut Frame, app: &App, palette: &Palette, view: &BoardView, area: Rect) {
    let column = view.column_rect(app.cursor());
    let marker = "▲";
    let offset = column.width.saturating_sub(marker.width() as u16) / 2;
    let rect = Rect {
        x: column.x.saturating_add(offset),
        y: area.y,
        width: (marker.width() as u16).min(area.width),
        height: 1,
    }
    .intersection(area);
    if !rect.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(marker, styles::cursor(palette))),
            rect,
        );
    }
}

fn draw_status(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let mut spans = vec![Span::styled(
        format!("{:<11}", app.phase_label()),
        styles::label(palette),
    )];
    match app.status_message() {
        Some(message) => {
            let style = if app.is_game_over() {
                Style::default().fg(palette.error)
            } else {
                styles::status(palette)
            };
            spans.push(Span::styled(message.to_string(), style));
        }
        None => spans.push(Span::styled(
            "←/→ move  Enter drop  1-9 column  q quit",
            styles::label(palette),
        )),
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
