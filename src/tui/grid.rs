use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::shared::{ChannelRow, NUM_STEPS};

use super::mode::{Focus, TuiState};

const NAME_WIDTH: usize = 14;

pub fn draw_rack(frame: &mut Frame, area: Rect, rows: &[ChannelRow], ts: &TuiState) {
    let focused = ts.focus == Focus::Rack;
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" Channel Rack ({} channels) ", rows.len()));

    let mut lines = vec![step_ruler(ts.highlight)];
    if rows.is_empty() {
        lines.push(Line::from(Span::styled(
            "  Add a synth with 'a' or pick a sound from the browser",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, row) in rows.iter().enumerate() {
        let cursor = (focused && i == ts.rack_row).then_some(ts.step_col);
        lines.push(channel_line(row, ts.highlight, cursor));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

// step numbers across the top, beats picked out
fn step_ruler(highlight: Option<u8>) -> Line<'static> {
    let mut spans = vec![Span::raw(" ".repeat(NAME_WIDTH + 3))];
    for step in 0..NUM_STEPS {
        let style = if highlight == Some(step as u8) {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else if step % 4 == 0 {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{:<3}", step + 1), style));
    }
    Line::from(spans)
}

fn channel_line(row: &ChannelRow, highlight: Option<u8>, cursor: Option<usize>) -> Line<'static> {
    let marker = if row.selected { "▌" } else { " " };
    let name_style = if row.muted {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else if cursor.is_some() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };

    let mut name: String = row.name.chars().take(NAME_WIDTH).collect();
    name = format!("{name:<NAME_WIDTH$}");
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(Color::Magenta)),
        Span::styled(name, name_style),
        Span::raw("  "),
    ];

    for (step, &active) in row.steps.iter().enumerate() {
        spans.push(step_cell(step, active, highlight == Some(step as u8), cursor == Some(step)));
    }

    let mute = if row.muted { " M" } else { "  " };
    spans.push(Span::styled(mute, Style::default().fg(Color::Red)));
    spans.push(Span::styled(
        format!(" {:>3}%", (row.volume * 100.0).round() as u32),
        Style::default().fg(Color::Gray),
    ));
    spans.push(Span::styled(format!("  {}", row.detail), Style::default().fg(Color::DarkGray)));
    Line::from(spans)
}

fn step_cell(step: usize, active: bool, playing: bool, cursor: bool) -> Span<'static> {
    let text = if cursor {
        if active { "[■]" } else { "[ ]" }
    } else if active {
        " ■ "
    } else {
        " · "
    };
    // alternate beat groups so the bar reads in fours
    let group_bg = if (step / 4) % 2 == 0 { Color::Reset } else { Color::Rgb(30, 30, 40) };
    let mut style = Style::default().bg(group_bg);
    style = if active { style.fg(Color::LightGreen) } else { style.fg(Color::DarkGray) };
    if playing {
        style = style.bg(Color::Yellow).fg(Color::Black);
    }
    Span::styled(text, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ChannelId;

    fn row(steps: [bool; NUM_STEPS]) -> ChannelRow {
        ChannelRow {
            id: ChannelId(0),
            name: "a very long channel name".to_string(),
            detail: "KICK/kick.wav".to_string(),
            steps,
            muted: false,
            volume: 0.8,
            selected: false,
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn active_steps_and_cursor_are_drawn() {
        let mut steps = [false; NUM_STEPS];
        steps[0] = true;
        let line = text(&channel_line(&row(steps), None, Some(1)));
        assert!(line.contains(" ■ [ ] · "));
        assert!(line.contains(" 80%"));
    }

    #[test]
    fn names_are_cut_to_width() {
        let line = text(&channel_line(&row([false; NUM_STEPS]), None, None));
        assert!(line.contains("a very long ch "));
        assert!(!line.contains("channel name"));
    }
}
