use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, ModifierKeyCode};

use crate::shared::{InputEvent, NUM_STEPS};

use super::mode::{Confirm, Focus, TuiState};

const VOLUME_STEP: f32 = 0.05;
const BPM_FINE: i32 = 1;
const BPM_COARSE: i32 = 10;

// poll for input from the terminal, track cursor/focus/search state in
// TuiState, and resolve keys into semantic input events for the controller
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        // shift press/release only arrives on terminals with keyboard enhancement
        if let KeyCode::Modifier(ModifierKeyCode::LeftShift | ModifierKeyCode::RightShift) = key.code {
            return Ok(match key.kind {
                KeyEventKind::Press => {
                    ts.modifier_held = true;
                    vec![InputEvent::ModifierDown]
                }
                KeyEventKind::Release => {
                    ts.modifier_held = false;
                    vec![InputEvent::ModifierUp]
                }
                KeyEventKind::Repeat => vec![],
            });
        }
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key, ts));
    }
    Ok(vec![])
}

pub fn handle_key(mut key: KeyEvent, ts: &mut TuiState) -> Vec<InputEvent> {
    // with full key reporting, shift+x arrives as 'x' plus SHIFT
    if let KeyCode::Char(c) = key.code {
        if key.modifiers.contains(KeyModifiers::SHIFT) && c.is_ascii_lowercase() {
            key.code = KeyCode::Char(c.to_ascii_uppercase());
        }
    }
    if let Some(confirm) = ts.confirm.take() {
        return resolve_confirm(key.code, confirm);
    }
    if ts.searching {
        return handle_search_key(key.code, ts);
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('s') => vec![InputEvent::Save],
            KeyCode::Char('o') => vec![InputEvent::Load],
            KeyCode::Char('c') => vec![InputEvent::Quit],
            _ => vec![],
        };
    }

    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::TogglePlay],

        // cursor
        KeyCode::Tab => { ts.toggle_focus(); vec![] }
        KeyCode::Up => { ts.move_row(-1); vec![] }
        KeyCode::Down => { ts.move_row(1); vec![] }
        KeyCode::Left => { ts.move_col(-1); vec![] }
        KeyCode::Right => { ts.move_col(1); vec![] }
        KeyCode::Home => { ts.step_col = 0; vec![] }
        KeyCode::End => { ts.step_col = NUM_STEPS - 1; vec![] }

        KeyCode::Enter => match ts.focus {
            Focus::Rack => toggle_step(ts),
            Focus::Browser => ts
                .current_sound()
                .map(|key| vec![InputEvent::AddSample(key.to_string())])
                .unwrap_or_default(),
        },
        KeyCode::Char('x') => toggle_step(ts),
        // shifted toggle copies the 4-step window on, for terminals that
        // don't report the shift key by itself
        KeyCode::Char('X') => {
            let toggle = toggle_step(ts);
            if toggle.is_empty() || ts.modifier_held {
                return toggle;
            }
            let mut events = vec![InputEvent::ModifierDown];
            events.extend(toggle);
            events.push(InputEvent::ModifierUp);
            events
        }

        // channel strip
        KeyCode::Char('m') => on_channel(ts, InputEvent::ToggleMute),
        KeyCode::Char('+') | KeyCode::Char('=') => nudge_volume(ts, VOLUME_STEP),
        KeyCode::Char('-') => nudge_volume(ts, -VOLUME_STEP),
        KeyCode::Char('0') => on_channel(ts, |id| InputEvent::SetTrackLevel(id, 0.0)),
        KeyCode::Char('s') => on_channel(ts, |channel| InputEvent::SelectChannel { channel, additive: false }),
        KeyCode::Char('S') => on_channel(ts, |channel| InputEvent::SelectChannel { channel, additive: true }),
        KeyCode::Char('d') => {
            ts.confirm = ts.current_channel().map(Confirm::DeleteChannel);
            vec![]
        }
        KeyCode::Delete => { ts.confirm = Some(Confirm::DeleteSelection); vec![] }
        KeyCode::Char('C') => { ts.confirm = Some(Confirm::ClearRack); vec![] }

        // transport
        KeyCode::Char('[') => nudge_bpm(ts, -BPM_FINE),
        KeyCode::Char(']') => nudge_bpm(ts, BPM_FINE),
        KeyCode::Char('{') => nudge_bpm(ts, -BPM_COARSE),
        KeyCode::Char('}') => nudge_bpm(ts, BPM_COARSE),
        KeyCode::Char('k') => vec![InputEvent::ToggleMetronome],
        KeyCode::Char('<') | KeyCode::Char(',') => {
            vec![InputEvent::SetMetronomeVolume((ts.metronome_volume - VOLUME_STEP).max(0.0))]
        }
        KeyCode::Char('>') | KeyCode::Char('.') => {
            vec![InputEvent::SetMetronomeVolume((ts.metronome_volume + VOLUME_STEP).min(1.0))]
        }

        // instruments and patterns
        KeyCode::Char('a') => vec![InputEvent::AddSynth],
        KeyCode::Char('p') => vec![InputEvent::AddPattern],
        KeyCode::Char(c @ '1'..='9') => vec![InputEvent::SwitchPattern(c as usize - '1' as usize)],

        // sound browser
        KeyCode::Char('/') => {
            ts.searching = true;
            ts.focus = Focus::Browser;
            vec![]
        }
        KeyCode::Char('r') => vec![InputEvent::RefreshCatalog],

        _ => vec![],
    }
}

fn resolve_confirm(code: KeyCode, confirm: Confirm) -> Vec<InputEvent> {
    if !matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        return vec![];
    }
    match confirm {
        Confirm::DeleteChannel(id) => vec![InputEvent::DeleteChannel(id)],
        Confirm::DeleteSelection => vec![InputEvent::DeleteSelection],
        Confirm::ClearRack => vec![InputEvent::ClearRack],
    }
}

// typing goes into the search box until Enter or Esc
fn handle_search_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Enter | KeyCode::Esc => {
            ts.searching = false;
            vec![]
        }
        KeyCode::Backspace => {
            ts.search.pop();
            vec![InputEvent::SetSearch(ts.search.clone())]
        }
        KeyCode::Char(c) => {
            ts.search.push(c);
            ts.browser_row = 0;
            vec![InputEvent::SetSearch(ts.search.clone())]
        }
        _ => vec![],
    }
}

// controls send absolute values, worked out from the last display state
fn nudge_bpm(ts: &TuiState, delta: i32) -> Vec<InputEvent> {
    vec![InputEvent::SetBpm(ts.bpm.saturating_add_signed(delta))]
}

fn nudge_volume(ts: &TuiState, delta: f32) -> Vec<InputEvent> {
    match (ts.current_channel(), ts.current_volume()) {
        (Some(id), Some(volume)) => vec![InputEvent::SetVolume(id, (volume + delta).clamp(0.0, 1.0))],
        _ => vec![],
    }
}

fn toggle_step(ts: &TuiState) -> Vec<InputEvent> {
    on_channel(ts, |channel| InputEvent::ToggleStep { channel, step: ts.step_col as u8 })
}

fn on_channel(ts: &TuiState, make: impl FnOnce(crate::shared::ChannelId) -> InputEvent) -> Vec<InputEvent> {
    ts.current_channel().map(|id| vec![make(id)]).unwrap_or_default()
}
