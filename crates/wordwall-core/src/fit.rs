//! Viewport fitting
//!
//! Picks the largest font size at which all currently displayed characters,
//! wrapped as one paragraph, fit the viewport. Text metrics are estimated from
//! fixed width and line-height factors rather than measured.

use std::time::Duration;

/// Fitting parameters (sizes in pixels)
#[derive(Debug, Clone, PartialEq)]
pub struct FitParams {
    /// Subtracted from both viewport dimensions
    pub padding: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// Decrement between search candidates
    pub step: f64,
    /// Average character width as a fraction of the font size
    pub width_factor: f64,
    /// Character width factor used when no candidate fits
    pub fallback_width_factor: f64,
    pub line_height: f64,
    /// Size used when nothing is displayed
    pub default_size: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            padding: 64.0,
            min_size: 12.0,
            max_size: 200.0,
            step: 5.0,
            width_factor: 0.5,
            fallback_width_factor: 0.6,
            line_height: 1.2,
            default_size: 120.0,
        }
    }
}

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920.0, 1080.0)
    }
}

/// Font size search over the configured range
#[derive(Debug, Clone, Default)]
pub struct ViewportFitter {
    params: FitParams,
}

impl ViewportFitter {
    pub fn new(params: FitParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FitParams {
        &self.params
    }

    /// Font size for `total` displayed characters in a `viewport`
    pub fn fit(&self, total: usize, viewport: Viewport) -> f64 {
        let p = &self.params;
        if total == 0 {
            return p.default_size;
        }

        let available_width = viewport.width - p.padding;
        let available_height = viewport.height - p.padding;
        let total = total as f64;

        let mut smallest_tried = None;
        let mut candidate = p.max_size;
        while candidate >= p.min_size {
            let lines = estimate_lines(total, available_width, candidate * p.width_factor);
            if lines * candidate * p.line_height <= available_height {
                return candidate;
            }
            smallest_tried = Some(candidate);
            if p.step <= 0.0 {
                break;
            }
            candidate -= p.step;
        }

        // Nothing in range fits: size the text to fill the height exactly at
        // the minimum size's line count. Never exceed a candidate that failed.
        let lines = estimate_lines(
            total,
            available_width,
            p.min_size * p.fallback_width_factor,
        );
        let mut size = (available_height / (lines * p.line_height)).min(p.max_size);
        if let Some(cap) = smallest_tried {
            size = size.min(cap);
        }

        size.max(p.min_size).min(p.max_size)
    }
}

/// Wrapped line count for `total` characters of width `char_width`
fn estimate_lines(total: f64, available_width: f64, char_width: f64) -> f64 {
    let per_line = (available_width / char_width).floor().max(1.0);
    (total / per_line).ceil()
}

/// Eases the applied font size towards the latest fitted size
#[derive(Debug, Clone)]
pub struct SizeTransition {
    from: f64,
    to: f64,
    started_at: Duration,
    duration: Duration,
}

impl SizeTransition {
    pub fn new(size: f64, duration: Duration) -> Self {
        Self {
            from: size,
            to: size,
            started_at: Duration::ZERO,
            duration,
        }
    }

    /// Start easing from the current value towards `to`
    pub fn retarget(&mut self, to: f64, now: Duration) {
        self.from = self.value(now);
        self.to = to;
        self.started_at = now;
    }

    /// Jump straight to `size`
    pub fn snap(&mut self, size: f64) {
        self.from = size;
        self.to = size;
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Size at `now` (ease-out cubic)
    pub fn value(&self, now: Duration) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.started_at).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        self.from + (self.to - self.from) * eased
    }

    pub fn is_settled(&self, now: Duration) -> bool {
        now.saturating_sub(self.started_at) >= self.duration
    }
}
