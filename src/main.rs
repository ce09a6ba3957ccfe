mod audio;
mod audio_api;
mod catalog;
mod config;
mod error;
mod loader;
mod middle;
mod pipeline;
mod shared;
mod tui;

#[cfg(test)]
mod test_support;

use std::time::Instant;

use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use catalog::{DirSource, HttpSource, ListingSource};
use config::{CatalogLocation, Config};
use loader::Worker;
use middle::Middle;
use pipeline::persistence::{Persister, SnapshotStore};
use pipeline::transport::SystemClock;
use shared::InputEvent;

// The terminal belongs to ratatui, so logs go to a file. RUST_LOG still
// picks the level.
fn init_logging() {
    let log_path = config::log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match std::fs::File::create(&log_path) {
        Ok(file) => builder.target(env_logger::Target::Pipe(Box::new(file))),
        // nowhere to write; stderr would draw over the UI
        Err(_) => builder.target(env_logger::Target::Pipe(Box::new(std::io::sink()))),
    };
    builder.init();
    log::info!("lapseq starting, logging to {}", log_path.display());
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = Config::load();
    let source: Box<dyn ListingSource> = match config.catalog_location(std::env::args().nth(1)) {
        CatalogLocation::Local(root) => Box::new(DirSource::new(root)),
        CatalogLocation::Remote(url) => Box::new(HttpSource::new(url)),
    };

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement so a held shift key is reported on its own.
    // Falls back to the 'X' binding if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                | crossterm::event::KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let audio = audio::start_audio()?;
    let persister = Persister::new(SnapshotStore::new(config.snapshot_path()), config.autosave_interval());
    let mut middle = Middle::new(config.bpm(), audio.sample_rate(), persister);
    let worker = Worker::spawn(source, audio.sample_rate());

    for cmd in middle.startup() {
        audio.send(cmd);
    }

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let frame_period = config.frame_period();
    let mut clock = SystemClock::default();
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let now = Instant::now();
        for event in middle.drain_events() {
            tui_state.apply(&event, now);
        }
        tui_state.expire_toasts(now);

        let ds = middle.display_state();
        tui_state.sync(&ds);
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state);
        })?;

        let events = tui::input::poll_input(frame_period, &mut tui_state)?;
        for event in events {
            let quit = event == InputEvent::Quit;
            for cmd in middle.handle_input(event) {
                audio.send(cmd);
            }
            if quit {
                // middle has written its final snapshot
                drop(term);
                drop(worker);
                drop(audio);
                return Ok(());
            }
        }

        // hand queued fetch/decode work to the loader, take back what finished
        for job in middle.take_jobs() {
            worker.submit(job);
        }
        for result in worker.poll() {
            for cmd in middle.on_job_done(result) {
                audio.send(cmd);
            }
        }

        for err in audio.poll_errors() {
            middle.on_playback_error(err);
        }

        for cmd in middle.tick(&mut clock) {
            audio.send(cmd);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
