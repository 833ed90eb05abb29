//! Typewriter reveal state
//!
//! Each entry on the wall owns a `RevealState`. Entries that were already on
//! the wall when the display mounted start settled at full length; entries
//! arriving from the live feed start at zero and grow one position per tick.
//!
//! Position 0 is the glyph marker. Once the displayed length reaches `L >= 2`
//! the character at index `L - 2` is visible and its reveal time is recorded.
//! The separator is the final character, so a full reveal records a time for
//! every character of `Entry::display_text`.

use std::collections::HashMap;
use std::time::Duration;

use crate::models::{Entry, EntryId, GLYPH_WIDTH};

/// Reveal state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    /// Full length, no timer
    Settled,
    /// Growing by one position per tick
    Revealing,
}

/// Reveal progress for one entry
#[derive(Debug, Clone)]
pub struct RevealState {
    full_length: usize,
    displayed_length: usize,
    revealed_at: Vec<Duration>,
    animated: bool,
    phase: RevealPhase,
}

impl RevealState {
    /// State for an entry present at mount time: fully shown, never animated
    pub fn settled(entry: &Entry) -> Self {
        let full_length = entry.full_length();
        Self {
            full_length,
            displayed_length: full_length,
            revealed_at: Vec::new(),
            animated: false,
            phase: RevealPhase::Settled,
        }
    }

    /// State for an entry that arrived live: nothing shown yet
    pub fn revealing(entry: &Entry) -> Self {
        Self {
            full_length: entry.full_length(),
            displayed_length: 0,
            revealed_at: Vec::with_capacity(entry.char_len() + 1),
            animated: true,
            phase: RevealPhase::Revealing,
        }
    }

    /// Advance one position
    ///
    /// Returns the new displayed length, or `None` if the reveal had already
    /// settled. Settling happens on the tick that reaches full length.
    pub fn tick(&mut self, now: Duration) -> Option<usize> {
        if self.phase == RevealPhase::Settled {
            return None;
        }

        self.displayed_length += 1;
        if self.displayed_length > GLYPH_WIDTH {
            self.revealed_at.push(now);
        }

        if self.displayed_length >= self.full_length {
            self.phase = RevealPhase::Settled;
        }

        Some(self.displayed_length)
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn is_settled(&self) -> bool {
        self.phase == RevealPhase::Settled
    }

    pub fn displayed_length(&self) -> usize {
        self.displayed_length
    }

    pub fn full_length(&self) -> usize {
        self.full_length
    }

    /// Whether this entry ever animated (false for snapshot entries)
    pub fn was_animated(&self) -> bool {
        self.animated
    }

    /// Number of text characters (excluding the glyph) currently visible
    pub fn visible_chars(&self) -> usize {
        self.displayed_length.saturating_sub(GLYPH_WIDTH)
    }

    /// When the character at `index` became visible
    pub fn revealed_at(&self, index: usize) -> Option<Duration> {
        self.revealed_at.get(index).copied()
    }

    /// Whether any character revealed here is younger than `window` at `now`
    ///
    /// Reveal times are recorded in increasing order, so only the latest needs checking.
    pub fn is_decaying(&self, now: Duration, window: Duration) -> bool {
        self.revealed_at
            .last()
            .is_some_and(|&at| now.saturating_sub(at) < window)
    }
}

/// Reveal states for every entry on the wall
#[derive(Debug, Default)]
pub struct RevealAnimator {
    states: HashMap<EntryId, RevealState>,
}

impl RevealAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_settled(&mut self, entry: &Entry) {
        self.states
            .insert(entry.id.clone(), RevealState::settled(entry));
    }

    /// Begin revealing a live entry. Returns false if the entry already had a state.
    pub fn start(&mut self, entry: &Entry) -> bool {
        if self.states.contains_key(&entry.id) {
            return false;
        }
        self.states
            .insert(entry.id.clone(), RevealState::revealing(entry));
        true
    }

    /// Advance the reveal for `id`; see `RevealState::tick`
    pub fn tick(&mut self, id: &EntryId, now: Duration) -> Option<usize> {
        self.states.get_mut(id)?.tick(now)
    }

    pub fn get(&self, id: &EntryId) -> Option<&RevealState> {
        self.states.get(id)
    }

    pub fn displayed_length(&self, id: &EntryId) -> usize {
        self.states
            .get(id)
            .map(RevealState::displayed_length)
            .unwrap_or(0)
    }

    pub fn is_revealing(&self, id: &EntryId) -> bool {
        self.states
            .get(id)
            .is_some_and(|s| s.phase() == RevealPhase::Revealing)
    }

    /// Sum of displayed lengths, read from current state
    pub fn total_displayed(&self) -> usize {
        self.states.values().map(RevealState::displayed_length).sum()
    }

    /// Whether any entry still needs weight re-evaluation at `now`
    pub fn any_animating(&self, now: Duration, window: Duration) -> bool {
        self.states
            .values()
            .any(|s| s.phase() == RevealPhase::Revealing || s.is_decaying(now, window))
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_settled_entry_is_full_length() {
        let state = RevealState::settled(&Entry::new("1", "hello"));
        assert_eq!(state.displayed_length(), 7);
        assert!(state.is_settled());
        assert!(!state.was_animated());
        assert_eq!(state.visible_chars(), 6);
    }

    #[test]
    fn test_settled_entry_ignores_ticks() {
        let mut state = RevealState::settled(&Entry::new("1", "hello"));
        assert_eq!(state.tick(ms(60)), None);
        assert_eq!(state.displayed_length(), 7);
    }

    #[test]
    fn test_reveal_reaches_full_length_after_n_ticks() {
        let entry = Entry::new("2", "hi");
        let mut state = RevealState::revealing(&entry);
        assert_eq!(state.displayed_length(), 0);
        assert_eq!(state.phase(), RevealPhase::Revealing);

        let mut last = 0;
        for n in 1..=entry.full_length() {
            let len = state.tick(ms(60 * n as u64)).unwrap();
            assert!(len > last);
            last = len;
        }

        assert_eq!(state.displayed_length(), 4);
        assert!(state.is_settled());
        assert_eq!(state.tick(ms(1000)), None);
        assert_eq!(state.displayed_length(), 4);
    }

    #[test]
    fn test_reveal_times_skip_the_glyph() {
        let mut state = RevealState::revealing(&Entry::new("2", "hi"));

        state.tick(ms(60));
        assert_eq!(state.visible_chars(), 0);
        assert_eq!(state.revealed_at(0), None);

        state.tick(ms(120));
        state.tick(ms(180));
        state.tick(ms(240));

        assert_eq!(state.revealed_at(0), Some(ms(120)));
        assert_eq!(state.revealed_at(1), Some(ms(180)));
        // separator
        assert_eq!(state.revealed_at(2), Some(ms(240)));
        assert_eq!(state.revealed_at(3), None);
    }

    #[test]
    fn test_is_decaying_uses_latest_reveal() {
        let mut state = RevealState::revealing(&Entry::new("2", "a"));
        assert!(!state.is_decaying(ms(0), ms(400)));

        state.tick(ms(60));
        state.tick(ms(120));
        state.tick(ms(180));

        assert!(state.is_decaying(ms(579), ms(400)));
        assert!(!state.is_decaying(ms(580), ms(400)));
    }

    #[test]
    fn test_animator_totals_and_restart_guard() {
        let mut animator = RevealAnimator::new();
        let old = Entry::new("1", "hello");
        let new = Entry::new("2", "hi");

        animator.insert_settled(&old);
        assert!(animator.start(&new));
        assert!(!animator.start(&new));
        assert_eq!(animator.total_displayed(), 7);
        assert!(animator.is_revealing(&new.id));

        animator.tick(&new.id, ms(60));
        animator.tick(&new.id, ms(120));
        assert_eq!(animator.displayed_length(&new.id), 2);
        assert_eq!(animator.total_displayed(), 9);
        assert!(animator.any_animating(ms(120), ms(400)));
        assert_eq!(animator.tick(&EntryId::new("missing"), ms(0)), None);
    }
}
