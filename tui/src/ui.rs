use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

const PADDING: u16 = 2;
const MAX_GAUGE_WIDTH: u16 = 80;

const HELP: Style = Style::new().fg(Color::Indexed(241));
const BORDER: Style = Style::new().fg(Color::Indexed(62));
const GAUGE: Style = Style::new()
    .fg(Color::Rgb(0xFF, 0x7C, 0xCB))
    .bg(Color::Rgb(0x3A, 0x3A, 0x3A));
const WARNING: Style = Style::new()
    .fg(Color::Black)
    .bg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub fn draw(frame: &mut Frame, app: &App) {
    if app.showing_document() {
        draw_document(frame, app);
    } else {
        draw_loading(frame, app);
    }
}

fn draw_loading(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let width = frame
        .area()
        .width
        .saturating_sub(PADDING * 2 + 4)
        .min(MAX_GAUGE_WIDTH);
    let gauge_area = Rect {
        x: rows[1].x + PADDING,
        width: width.min(rows[1].width.saturating_sub(PADDING)),
        ..rows[1]
    };

    let ratio = app.progress().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(GAUGE)
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0));
    frame.render_widget(gauge, gauge_area);

    let help = Paragraph::new(Line::styled("Press q to quit", HELP));
    let help_area = Rect {
        x: rows[3].x + PADDING,
        width: rows[3].width.saturating_sub(PADDING),
        ..rows[3]
    };
    frame.render_widget(help, help_area);
}

/// Banner rows, the bordered document and the help line.
fn document_layout(area: Rect, banners: usize) -> [Rect; 3] {
    let banner_height = u16::try_from(banners).unwrap_or(u16::MAX);
    Layout::vertical([
        Constraint::Length(banner_height),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area)
}

fn document_block() -> Block<'static> {
    Block::bordered()
        .border_type(BorderType::Rounded)
        .border_style(BORDER)
        .title(" linernotes ")
}

/// The area the document text is wrapped and scrolled in.
pub fn document_viewport(area: Rect, banners: usize) -> Rect {
    let [_, document, _] = document_layout(area, banners);
    document_block().inner(document)
}

/// Rows the lines take once wrapped to `width`, the same way the document
/// view wraps them.
pub fn wrapped_height(lines: &[Line<'static>], width: u16) -> usize {
    Paragraph::new(lines.to_vec())
        .wrap(Wrap { trim: false })
        .line_count(width)
}

fn draw_document(frame: &mut Frame, app: &App) {
    let [banner_area, document_area, help_area] =
        document_layout(frame.area(), app.banners().len());

    if !app.banners().is_empty() {
        let banners: Vec<Line> = app
            .banners()
            .iter()
            .map(|b| Line::styled(format!(" ! {b}"), WARNING))
            .collect();
        frame.render_widget(Paragraph::new(banners), banner_area);
    }

    let document = Paragraph::new(app.rendered().to_vec())
        .block(document_block())
        .wrap(Wrap { trim: false })
        .scroll((app.scroll(), 0));
    frame.render_widget(document, document_area);

    let help = if app.refreshing() {
        "  refreshing… • ↑/↓: Navigate • q: Quit"
    } else {
        "  ↑/↓: Navigate • r: Refresh • q: Quit"
    };
    frame.render_widget(Paragraph::new(Line::styled(help, HELP)), help_area);
}
