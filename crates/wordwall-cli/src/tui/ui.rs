//! UI rendering

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use wordwall_core::{FeedStatus, OverlayPhase, OverlayView, StyledChar, WallFrame, NORMAL_WEIGHT};

/// Marker drawn in front of every entry
const GLYPH: &str = "✦";

/// Weights at or above this render bright as well as bold: roughly the first
/// 30% of the decay window, so only the newest characters stand out
const HEAVY_THRESHOLD: u16 = 750;

/// What one redraw needs
pub struct Screen<'a> {
    pub wall: &'a WallFrame,
    pub feed: FeedStatus,
    pub entries: usize,
    /// Hide everything but the wall and the overlay
    pub presentation: bool,
}

/// Main UI rendering function
pub fn draw(frame: &mut Frame, screen: &Screen) {
    let area = frame.area();

    if screen.presentation {
        draw_wall(frame, screen.wall, area);
    } else {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        draw_wall(frame, screen.wall, chunks[0]);
        draw_footer(frame, screen, chunks[1]);
    }

    // The announcement covers everything, footer included
    if let Some(overlay) = &screen.wall.overlay {
        draw_overlay(frame, overlay, area);
    }
}

/// Draw every entry as one wrapped paragraph
fn draw_wall(frame: &mut Frame, wall: &WallFrame, area: Rect) {
    let mut spans = Vec::new();
    for entry in &wall.entries {
        if entry.glyph {
            spans.push(Span::styled(GLYPH, Style::default().fg(Color::Yellow)));
        }
        // glyph and first word are adjacent so wrapping keeps them together
        spans.extend(styled_spans(&entry.lead));
        spans.extend(styled_spans(&entry.rest));
    }

    let paragraph = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Group consecutive characters of the same style into spans
fn styled_spans(chars: &[StyledChar]) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_style: Option<Style> = None;

    for c in chars {
        let style = weight_style(c.weight);
        if current_style.is_some_and(|s| s != style) {
            spans.push(Span::styled(std::mem::take(&mut current), current_style.unwrap_or_default()));
        }
        current_style = Some(style);
        current.push(c.ch);
    }
    if let Some(style) = current_style {
        spans.push(Span::styled(current, style));
    }
    spans
}

/// Terminal style for a font weight
fn weight_style(weight: u16) -> Style {
    if weight >= HEAVY_THRESHOLD {
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else if weight > NORMAL_WEIGHT {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn draw_footer(frame: &mut Frame, screen: &Screen, area: Rect) {
    let content = format!(
        "{}  |  {} entries  |  font {:.0}px → {:.0}px  |  q:quit",
        status_label(screen.feed),
        screen.entries,
        screen.wall.font_size,
        screen.wall.target_font_size
    );

    let paragraph = Paragraph::new(content).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

fn status_label(status: FeedStatus) -> &'static str {
    match status {
        FeedStatus::Idle => "○ offline",
        FeedStatus::Connecting => "◌ connecting",
        FeedStatus::Subscribed => "● live",
        FeedStatus::Closed => "○ closed",
        FeedStatus::Failed => "✗ feed error",
    }
}

/// Draw the active announcement over the whole screen
fn draw_overlay(frame: &mut Frame, overlay: &OverlayView, area: Rect) {
    frame.render_widget(Clear, area);

    let width = area.width.saturating_sub(4).max(1);
    let lines = overlay_lines(&overlay.full_text, width);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(lines.min(area.height)),
            Constraint::Fill(1),
        ])
        .split(area);
    let text_area = Rect {
        x: area.x + 2,
        width,
        ..chunks[1]
    };

    let mut style = Style::default().add_modifier(Modifier::BOLD);
    if overlay.phase == OverlayPhase::Exiting {
        style = style.add_modifier(Modifier::DIM);
    }

    let paragraph = Paragraph::new(Span::styled(overlay.text.clone(), style))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, text_area);
}

/// Rows to reserve for the whole announcement at `width` columns
fn overlay_lines(text: &str, width: u16) -> u16 {
    let columns = u16::try_from(text.width()).unwrap_or(u16::MAX);
    columns.div_ceil(width.max(1)).max(1)
}
