//! Font-weight decay and entry layout
//!
//! A freshly revealed character starts heavy and thins linearly back to the
//! normal weight over a fixed window. Weights are never stored: they are a
//! pure function of the character's reveal time and the `now` passed in.

use std::time::Duration;

use crate::models::{Entry, EntryId};
use crate::reveal::RevealState;

/// Weight of a character at the instant it appears
pub const HEAVY_WEIGHT: u16 = 900;

/// Resting weight
pub const NORMAL_WEIGHT: u16 = 400;

/// Weight of a character revealed at `revealed_at`, observed at `now`
pub fn weight(revealed_at: Duration, now: Duration, window: Duration) -> u16 {
    let age = now.saturating_sub(revealed_at);
    if window.is_zero() || age >= window {
        return NORMAL_WEIGHT;
    }

    let progress = age.as_secs_f64() / window.as_secs_f64();
    let span = f64::from(HEAVY_WEIGHT - NORMAL_WEIGHT);
    (f64::from(HEAVY_WEIGHT) - span * progress).round() as u16
}

/// Keeps the decay tick alive only while something is still thinning
///
/// The host schedules a tick whenever `start` returns true and asks
/// `on_tick` after each one whether to schedule another.
#[derive(Debug, Default)]
pub struct DecayTicker {
    running: bool,
}

impl DecayTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reveal began. Returns true if a tick needs scheduling.
    pub fn start(&mut self) -> bool {
        !std::mem::replace(&mut self.running, true)
    }

    /// A tick fired. Returns true if another tick should follow.
    pub fn on_tick(&mut self, still_animating: bool) -> bool {
        self.running = still_animating;
        still_animating
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// A visible character and the weight it renders at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledChar {
    pub ch: char,
    pub weight: u16,
}

/// Renderable form of one entry
///
/// The glyph is kept together with the first word (`lead`) so that line
/// wrapping never leaves it orphaned at the end of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLayout {
    pub id: EntryId,
    /// Glyph marker visible
    pub glyph: bool,
    /// First word, rendered as one unit with the glyph
    pub lead: Vec<StyledChar>,
    /// Everything after the first word, starting at the first space
    pub rest: Vec<StyledChar>,
}

impl EntryLayout {
    /// Visible text without the glyph
    pub fn text(&self) -> String {
        self.lead.iter().chain(&self.rest).map(|c| c.ch).collect()
    }
}

/// Lay out the visible part of `entry` with per-character weights at `now`
pub fn layout_entry(
    entry: &Entry,
    state: &RevealState,
    now: Duration,
    window: Duration,
) -> EntryLayout {
    let visible: Vec<char> = entry
        .display_text()
        .chars()
        .take(state.visible_chars())
        .collect();
    let first_word_end = visible
        .iter()
        .position(|&c| c == ' ')
        .unwrap_or(visible.len());

    let styled = |(index, &ch): (usize, &char)| {
        let weight = if state.was_animated() {
            state
                .revealed_at(index)
                .map(|at| weight(at, now, window))
                .unwrap_or(NORMAL_WEIGHT)
        } else {
            NORMAL_WEIGHT
        };
        StyledChar { ch, weight }
    };

    let mut chars = visible.iter().enumerate().map(styled);
    let lead = chars.by_ref().take(first_word_end).collect();
    let rest = chars.collect();

    EntryLayout {
        id: entry.id.clone(),
        glyph: state.displayed_length() > 0,
        lead,
        rest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(400);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_weight_endpoints() {
        assert_eq!(weight(ms(1000), ms(1000), WINDOW), 900);
        assert_eq!(weight(ms(1000), ms(1400), WINDOW), 400);
        assert_eq!(weight(ms(1000), ms(5000), WINDOW), 400);
        assert_eq!(weight(ms(1000), ms(1200), WINDOW), 650);
    }

    #[test]
    fn test_weight_never_increases_with_age() {
        let mut previous = HEAVY_WEIGHT;
        for elapsed in 0..=400 {
            let w = weight(ms(0), ms(elapsed), WINDOW);
            assert!(w <= previous, "weight rose at {}ms", elapsed);
            assert!((NORMAL_WEIGHT..=HEAVY_WEIGHT).contains(&w));
            previous = w;
        }
    }

    #[test]
    fn test_ticker_runs_until_told_to_stop() {
        let mut ticker = DecayTicker::new();
        assert!(ticker.start());
        assert!(!ticker.start());
        assert!(ticker.on_tick(true));
        assert!(ticker.is_running());

        assert!(!ticker.on_tick(false));
        assert!(!ticker.is_running());
        assert!(ticker.start());
    }

    #[test]
    fn test_settled_entry_renders_normal_weight() {
        let entry = Entry::new("1", "hello world");
        let state = RevealState::settled(&entry);
        let layout = layout_entry(&entry, &state, ms(0), WINDOW);

        assert!(layout.glyph);
        assert_eq!(layout.lead.iter().map(|c| c.ch).collect::<String>(), "hello");
        assert_eq!(layout.rest.iter().map(|c| c.ch).collect::<String>(), " world ");
        assert!(layout
            .lead
            .iter()
            .chain(&layout.rest)
            .all(|c| c.weight == NORMAL_WEIGHT));
    }

    #[test]
    fn test_partial_reveal_weights() {
        let entry = Entry::new("2", "hi there");
        let mut state = RevealState::revealing(&entry);
        for n in 1..=4 {
            state.tick(ms(60 * n));
        }

        // glyph + "hi " visible, chars revealed at 120, 180, 240
        let layout = layout_entry(&entry, &state, ms(240), WINDOW);
        assert_eq!(layout.text(), "hi ");
        assert_eq!(layout.lead.len(), 2);
        assert_eq!(layout.lead[0].weight, weight(ms(120), ms(240), WINDOW));
        assert_eq!(layout.lead[1].weight, weight(ms(180), ms(240), WINDOW));
        assert_eq!(layout.rest[0].weight, HEAVY_WEIGHT);
    }

    #[test]
    fn test_glyph_only_before_first_char() {
        let entry = Entry::new("3", "word");
        let mut state = RevealState::revealing(&entry);

        let layout = layout_entry(&entry, &state, ms(0), WINDOW);
        assert!(!layout.glyph);
        assert!(layout.lead.is_empty());

        state.tick(ms(60));
        let layout = layout_entry(&entry, &state, ms(60), WINDOW);
        assert!(layout.glyph);
        assert!(layout.lead.is_empty());
        assert!(layout.rest.is_empty());
    }

    #[test]
    fn test_leading_space_gives_empty_first_word() {
        let entry = Entry::new("4", " spaced");
        let state = RevealState::settled(&entry);
        let layout = layout_entry(&entry, &state, ms(0), WINDOW);

        assert!(layout.lead.is_empty());
        assert_eq!(layout.text(), " spaced ");
    }
}
