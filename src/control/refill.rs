//! Fuel-reload detection.
//!
//! Keeps the last ten accepted temperatures and compares the mean of the
//! five newest against the mean of the five before them.  A rising trend
//! means fresh wood went in, and the PID integral should start over.
//!
//! ```text
//!  newest ──▶ [0][1][2][3][4] │ [5][6][7][8][9] ◀── oldest
//!             └── recentAvg ──┘ └── olderAvg ──┘
//! ```

use heapless::HistoryBuffer;

/// Number of samples retained.
pub const HISTORY_LEN: usize = 10;
/// Samples per averaging window.
const WINDOW: usize = HISTORY_LEN / 2;

/// Fixed-capacity ring of recent temperatures, addressed newest-first.
#[derive(Debug, Default)]
pub struct TemperatureHistory {
    buf: HistoryBuffer<i32, HISTORY_LEN>,
}

impl TemperatureHistory {
    pub fn new() -> Self {
        Self {
            buf: HistoryBuffer::new(),
        }
    }

    /// Insert the newest sample, evicting the oldest once full.
    pub fn push(&mut self, temperature_c: i32) {
        self.buf.write(temperature_c);
    }

    /// Integer mean of `count` samples starting `start` slots back from
    /// the newest.  `None` if the window reaches past the recorded history.
    pub fn window_average(&self, start: usize, count: usize) -> Option<i32> {
        if count == 0 || start + count > self.buf.len() {
            return None;
        }
        // oldest_ordered() yields oldest → newest; slot 0 is the last item.
        let newest_index = self.buf.len() - 1;
        let sum: i32 = self
            .buf
            .oldest_ordered()
            .enumerate()
            .filter(|(i, _)| {
                let slot = newest_index - i;
                slot >= start && slot < start + count
            })
            .map(|(_, t)| *t)
            .sum();
        Some(sum / count as i32)
    }

    /// Newest sample, if any.
    pub fn newest(&self) -> Option<i32> {
        self.buf.recent().copied()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == HISTORY_LEN
    }
}

/// Rising-trend heuristic over [`TemperatureHistory`].
#[derive(Debug, Default)]
pub struct RefillDetector {
    history: TemperatureHistory,
}

impl RefillDetector {
    pub fn new() -> Self {
        Self {
            history: TemperatureHistory::new(),
        }
    }

    /// Record an accepted sample and report whether a reload is detected.
    ///
    /// Needs a full history; returns `false` until ten samples are in.
    pub fn observe(&mut self, temperature_c: i32) -> bool {
        self.history.push(temperature_c);
        self.is_rising()
    }

    /// `recentAvg > olderAvg` over the current history.
    pub fn is_rising(&self) -> bool {
        match (
            self.history.window_average(0, WINDOW),
            self.history.window_average(WINDOW, WINDOW),
        ) {
            (Some(recent), Some(older)) => recent > older,
            _ => false,
        }
    }

    pub fn history(&self) -> &TemperatureHistory {
        &self.history
    }
}
