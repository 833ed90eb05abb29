//! Wall display
//!
//! Full-screen kiosk view of the word wall. Loads the current entries, then
//! types out new ones as they arrive from the live feed.
//!
//! ## Layout
//!
//! - Wall: every entry as one wrapped paragraph, fresh characters in bold
//! - Overlay: the newest entry, full screen, while it is announced
//! - Footer: feed status and font size (hidden with `--presentation`)
//!
//! ## Keys
//!
//! - q / Esc / Ctrl-C: Quit

mod ui;

use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wordwall_core::{
    Config, Entry, FeedSettings, FeedStatus, FeedSubscriber, ItemsClient, SystemClock, Wall,
};

use ui::Screen;

/// Longest the loop sleeps without checking the terminal
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pixel size assumed for one terminal cell when the terminal won't say
const CELL_WIDTH_PX: f64 = 8.0;
const CELL_HEIGHT_PX: f64 = 16.0;

/// Run the wall display
pub async fn run(config_path: Option<&PathBuf>, presentation: bool) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // Initialize display logging (file-based, only if WORDWALL_LOG is set)
    init_tui_logging(&config);

    let settings = config.feed_settings();
    let snapshot = load_snapshot(&settings, &config.collection).await;

    let mut wall = Wall::new(Arc::new(SystemClock::new()), config.animation.timings());
    wall.mount(snapshot);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(cursor::Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Start the live feed; entries cross over to this loop one at a time
    let (entry_tx, entry_rx) = mpsc::unbounded_channel();
    let mut feed = FeedSubscriber::new();
    feed.start(&settings, &config.collection, move |entry| {
        let _ = entry_tx.send(entry);
    });

    let result = run_wall(&mut terminal, &mut wall, &feed, entry_rx, presentation).await;

    // Unmount: cancel timers and release the subscription
    wall.teardown();
    feed.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(cursor::Show)?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

/// Entries already in the store. Failures leave the wall empty.
async fn load_snapshot(settings: &FeedSettings, collection: &str) -> Vec<Entry> {
    if matches!(settings, FeedSettings::Unconfigured { .. }) {
        return Vec::new();
    }

    let result = match ItemsClient::from_settings(settings) {
        Ok(client) => client.list_entries(collection).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(entries) => {
            info!("Loaded {} entries from '{}'", entries.len(), collection);
            entries
        }
        Err(e) => {
            warn!("Could not load entries, starting empty: {}", e);
            Vec::new()
        }
    }
}

async fn run_wall<B: Backend>(
    terminal: &mut Terminal<B>,
    wall: &mut Wall,
    feed: &FeedSubscriber,
    mut entry_rx: mpsc::UnboundedReceiver<Entry>,
    presentation: bool,
) -> Result<()> {
    let size = terminal.size()?;
    let (width, height) = pixel_viewport(size.width, wall_rows(size.height, presentation));
    wall.resize(width, height);

    let mut feed_open = true;
    let mut last_status: Option<FeedStatus> = None;

    loop {
        wall.advance();

        let status = feed.status();
        let status_changed = last_status != Some(status);
        if wall.take_dirty() || status_changed {
            last_status = Some(status);
            let frame_state = wall.frame(wall.now());
            let screen = Screen {
                wall: &frame_state,
                feed: status,
                entries: wall.entries().len(),
                presentation,
            };
            terminal.draw(|frame| ui::draw(frame, &screen))?;
        }

        let sleep_for = wall
            .next_deadline()
            .map(|deadline| deadline.saturating_sub(wall.now()))
            .unwrap_or(POLL_INTERVAL)
            .min(POLL_INTERVAL);

        tokio::select! {
            biased;

            // New entries from the live feed
            entry = entry_rx.recv(), if feed_open => {
                match entry {
                    Some(entry) => {
                        wall.on_create(entry);
                    }
                    None => feed_open = false,
                }
            }

            // Timers and terminal events
            _ = tokio::time::sleep(sleep_for) => {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            if is_quit(&key) {
                                info!("Quit requested");
                                return Ok(());
                            }
                        }
                        Event::Resize(cols, rows) => {
                            let (width, height) = pixel_viewport(cols, wall_rows(rows, presentation));
                            wall.resize(width, height);
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Rows available to the wall itself
fn wall_rows(rows: u16, presentation: bool) -> u16 {
    if presentation {
        rows
    } else {
        rows.saturating_sub(1)
    }
}

/// Wall area in pixels, from the terminal if it reports its size
fn pixel_viewport(cols: u16, rows: u16) -> (f64, f64) {
    let (cell_w, cell_h) = match terminal::window_size() {
        Ok(size) if size.width > 0 && size.height > 0 && size.columns > 0 && size.rows > 0 => (
            f64::from(size.width) / f64::from(size.columns),
            f64::from(size.height) / f64::from(size.rows),
        ),
        _ => (CELL_WIDTH_PX, CELL_HEIGHT_PX),
    };
    cell_dimensions(cols, rows, cell_w, cell_h)
}

fn cell_dimensions(cols: u16, rows: u16, cell_w: f64, cell_h: f64) -> (f64, f64) {
    (f64::from(cols) * cell_w, f64::from(rows) * cell_h)
}

/// Initialize logging for the display
///
/// Only initializes if WORDWALL_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    // Only log if WORDWALL_LOG is set
    let Ok(log_level) = std::env::var("WORDWALL_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // Create log file
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "wordwall_core={},wordwall={}",
        log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Display logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_keys() {
        let key = |code, modifiers| KeyEvent::new(code, modifiers);
        assert!(is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&key(KeyCode::Enter, KeyModifiers::NONE)));
    }

    #[test]
    fn test_footer_row_is_reserved() {
        assert_eq!(wall_rows(40, false), 39);
        assert_eq!(wall_rows(40, true), 40);
        assert_eq!(wall_rows(0, false), 0);
    }

    #[test]
    fn test_cell_dimensions() {
        assert_eq!(cell_dimensions(240, 67, 8.0, 16.0), (1920.0, 1072.0));
    }
}
