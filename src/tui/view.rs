use std::time::Instant;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::shared::{DisplayState, NoticeLevel, NUM_STEPS};

use super::grid::draw_rack;
use super::mode::{Focus, TuiState};

const HELP: &str = "space play  ←→↑↓ move  enter/x step  X copy  m mute  +/- vol  s/S select  d del  \
                    [ ] bpm  k metro  a synth  p pattern  / search  tab browser  ^S save  ^O load  q quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport bar
            Constraint::Min(8), // rack + browser
            Constraint::Length(3), // notices / help
        ])
        .split(area);

    draw_transport(frame, sections[0], state, ts);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(sections[1]);
    draw_rack(frame, body[0], &state.channels, ts);
    draw_browser(frame, body[1], state, ts);

    draw_footer(frame, sections[2], ts);
}

fn draw_transport(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let (play_label, play_style) = if state.playing {
        ("▶ PLAYING", Style::default().fg(Color::Black).bg(Color::LightGreen))
    } else {
        ("■ STOPPED", Style::default().fg(Color::White).bg(Color::DarkGray))
    };

    let mut spans = vec![
        Span::styled(format!(" {play_label} "), play_style.add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(format!("BPM {}", state.bpm), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::raw(format!("step {:>2}/{NUM_STEPS}", state.current_step as usize + 1)),
        Span::raw("  "),
    ];

    let metro_style = if state.metronome_enabled {
        Style::default().fg(Color::LightMagenta)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    spans.push(Span::styled(
        format!(
            "metronome {} {:>3}%",
            if state.metronome_enabled { "ON " } else { "OFF" },
            (state.metronome_volume * 100.0).round() as u32
        ),
        metro_style,
    ));
    if state.modifier_held {
        spans.push(Span::styled("  SHIFT", Style::default().fg(Color::LightRed)));
    }
    if let Some(label) = ts.saved_label(Instant::now()) {
        spans.push(Span::styled(format!("  {label}"), Style::default().fg(Color::DarkGray)));
    }
    spans.push(Span::raw("   "));

    for (i, name) in state.patterns.iter().enumerate() {
        let style = if i == state.current_pattern {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {name} "), style));
        spans.push(Span::raw(" "));
    }

    let block = Block::default().borders(Borders::ALL).title(" lapseq ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_browser(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let focused = ts.focus == Focus::Browser;
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" Sounds ({} loaded) ", state.sound_count));

    let search_style = if ts.searching {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if ts.searching { "_" } else { "" };
    let mut lines = vec![Line::from(Span::styled(format!("/ {}{cursor}", state.search), search_style))];

    if state.sounds.is_empty() {
        let hint = if state.sound_count == 0 { "no sounds found (r to rescan)" } else { "no matches" };
        lines.push(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))));
    }

    // keep the cursor row on screen
    let visible = area.height.saturating_sub(3) as usize;
    let offset = (ts.browser_row + 1).saturating_sub(visible.max(1));
    for (i, sound) in state.sounds.iter().enumerate().skip(offset).take(visible) {
        let style = if focused && i == ts.browser_row {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}/", sound.folder), style.fg(Color::DarkGray)),
            Span::styled(sound.name.clone(), style),
            Span::styled(format!("  {}", sound.size_label), Style::default().fg(Color::DarkGray)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_footer(frame: &mut Frame, area: Rect, ts: &TuiState) {
    let line = if let Some(confirm) = ts.confirm {
        Line::from(Span::styled(confirm.prompt(), Style::default().fg(Color::Black).bg(Color::Yellow)))
    } else if let Some(toast) = ts.toasts.back() {
        let color = match toast.notice.level {
            NoticeLevel::Info => Color::LightBlue,
            NoticeLevel::Success => Color::LightGreen,
            NoticeLevel::Warning => Color::Yellow,
            NoticeLevel::Error => Color::LightRed,
        };
        Line::from(Span::styled(toast.notice.message.clone(), Style::default().fg(color)))
    } else {
        Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray)))
    };
    frame.render_widget(Paragraph::new(line).block(Block::default().borders(Borders::ALL)), area);
}
