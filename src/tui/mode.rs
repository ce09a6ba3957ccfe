use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::shared::{ChannelId, DisplayState, Notice, UiEvent, DEFAULT_BPM, NUM_STEPS};

const TOAST_LIFETIME: Duration = Duration::from_secs(3);
const MAX_TOASTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Rack,
    Browser,
}

/// Destructive actions wait for a 'y' before they go out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    DeleteChannel(ChannelId),
    DeleteSelection,
    ClearRack,
}

impl Confirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirm::DeleteChannel(_) => "Delete this channel? (y/n)",
            Confirm::DeleteSelection => "Delete selected channels? (y/n)",
            Confirm::ClearRack => "Clear ALL channels? (y/n)",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub notice: Notice,
    shown_at: Instant,
}

// state local to the tui: cursors, focus, the search box, toasts.
// channel ids, volumes, sound keys and tempo are synced from DisplayState per loop
#[derive(Clone, Debug)]
pub struct TuiState {
    pub focus: Focus,
    pub rack_row: usize,
    pub step_col: usize,
    pub browser_row: usize,
    pub searching: bool,
    pub search: String,
    pub confirm: Option<Confirm>,
    pub highlight: Option<u8>, // step the transport last reported
    pub toasts: VecDeque<Toast>,
    pub modifier_held: bool, // shift reported down by the terminal
    pub last_saved: Option<Instant>,
    // synced from DisplayState each frame
    pub channel_ids: Vec<ChannelId>,
    pub volumes: Vec<f32>,
    pub sound_keys: Vec<String>,
    pub bpm: u32,
    pub metronome_volume: f32,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            focus: Focus::Rack,
            rack_row: 0,
            step_col: 0,
            browser_row: 0,
            searching: false,
            search: String::new(),
            confirm: None,
            highlight: None,
            toasts: VecDeque::new(),
            modifier_held: false,
            last_saved: None,
            channel_ids: Vec::new(),
            volumes: Vec::new(),
            sound_keys: Vec::new(),
            bpm: DEFAULT_BPM,
            metronome_volume: 0.5,
        }
    }
}

impl TuiState {
    pub fn sync(&mut self, ds: &DisplayState) {
        self.bpm = ds.bpm;
        self.metronome_volume = ds.metronome_volume;
        self.modifier_held = ds.modifier_held;
        self.channel_ids = ds.channels.iter().map(|c| c.id).collect();
        self.volumes = ds.channels.iter().map(|c| c.volume).collect();
        self.sound_keys = ds.sounds.iter().map(|s| s.key.clone()).collect();
        self.rack_row = self.rack_row.min(self.channel_ids.len().saturating_sub(1));
        self.browser_row = self.browser_row.min(self.sound_keys.len().saturating_sub(1));
        self.step_col = self.step_col.min(NUM_STEPS - 1);
    }

    pub fn apply(&mut self, event: &UiEvent, now: Instant) {
        match event {
            UiEvent::StepChanged(step) => self.highlight = Some(*step),
            UiEvent::StepCleared => self.highlight = None,
            UiEvent::Notice(notice) => {
                self.toasts.push_back(Toast { notice: notice.clone(), shown_at: now });
                while self.toasts.len() > MAX_TOASTS {
                    self.toasts.pop_front();
                }
            }
            UiEvent::Saved => self.last_saved = Some(now),
            UiEvent::ChannelsChanged | UiEvent::CatalogChanged => {}
        }
    }

    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts.retain(|t| now.duration_since(t.shown_at) < TOAST_LIFETIME);
    }

    /// "saved 12s ago" style label for the transport bar.
    pub fn saved_label(&self, now: Instant) -> Option<String> {
        let secs = now.duration_since(self.last_saved?).as_secs();
        Some(match secs {
            0..5 => "saved just now".to_string(),
            5..60 => format!("saved {secs}s ago"),
            _ => format!("saved {}m ago", secs / 60),
        })
    }

    pub fn current_channel(&self) -> Option<ChannelId> {
        self.channel_ids.get(self.rack_row).copied()
    }

    pub fn current_volume(&self) -> Option<f32> {
        self.volumes.get(self.rack_row).copied()
    }

    pub fn current_sound(&self) -> Option<&str> {
        self.sound_keys.get(self.browser_row).map(String::as_str)
    }

    pub fn move_row(&mut self, delta: isize) {
        let (row, len) = match self.focus {
            Focus::Rack => (&mut self.rack_row, self.channel_ids.len()),
            Focus::Browser => (&mut self.browser_row, self.sound_keys.len()),
        };
        *row = row.saturating_add_signed(delta).min(len.saturating_sub(1));
    }

    pub fn move_col(&mut self, delta: isize) {
        self.step_col = self.step_col.saturating_add_signed(delta).min(NUM_STEPS - 1);
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Rack => Focus::Browser,
            Focus::Browser => Focus::Rack,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::NoticeLevel;

    #[test]
    fn highlight_follows_the_transport() {
        let mut ts = TuiState::default();
        let now = Instant::now();
        ts.apply(&UiEvent::StepChanged(3), now);
        assert_eq!(ts.highlight, Some(3));
        ts.apply(&UiEvent::StepCleared, now);
        assert_eq!(ts.highlight, None);
    }

    #[test]
    fn remembers_the_last_save() {
        let mut ts = TuiState::default();
        let now = Instant::now();
        assert_eq!(ts.saved_label(now), None);
        ts.apply(&UiEvent::Saved, now);
        assert_eq!(ts.last_saved, Some(now));
        assert_eq!(ts.saved_label(now).as_deref(), Some("saved just now"));
        assert_eq!(ts.saved_label(now + Duration::from_secs(42)).as_deref(), Some("saved 42s ago"));
        assert_eq!(ts.saved_label(now + Duration::from_secs(185)).as_deref(), Some("saved 3m ago"));
    }

    #[test]
    fn held_shift_follows_the_controller() {
        let mut ts = TuiState { modifier_held: true, ..TuiState::default() };
        ts.sync(&DisplayState::default());
        assert!(!ts.modifier_held);
    }

    #[test]
    fn toasts_expire() {
        let mut ts = TuiState::default();
        let start = Instant::now();
        ts.apply(&UiEvent::Notice(Notice::new(NoticeLevel::Info, "hi")), start);
        ts.expire_toasts(start + Duration::from_secs(1));
        assert_eq!(ts.toasts.len(), 1);
        ts.expire_toasts(start + Duration::from_secs(4));
        assert!(ts.toasts.is_empty());
    }

    #[test]
    fn cursors_stay_in_bounds() {
        let mut ts = TuiState {
            channel_ids: vec![ChannelId(0), ChannelId(5)],
            ..TuiState::default()
        };
        ts.move_row(5);
        assert_eq!(ts.current_channel(), Some(ChannelId(5)));
        ts.move_row(-9);
        assert_eq!(ts.rack_row, 0);
        ts.move_col(40);
        assert_eq!(ts.step_col, NUM_STEPS - 1);
    }
}
