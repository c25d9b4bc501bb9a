use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Byte counter shared by the tasks of one transfer.
///
/// Each update reads the current value, adds to it and writes it back under
/// one lock, so racing completions never lose bytes.
#[derive(Debug)]
pub struct ProgressCounter {
    total: u64,
    transferred: Mutex<u64>,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            transferred: Mutex::new(0),
        }
    }

    /// Adds `bytes`, returning the new running total.
    pub fn add(&self, bytes: u64) -> u64 {
        let mut t = self.transferred.lock().unwrap();
        *t = (*t + bytes).min(self.total);
        *t
    }

    pub fn transferred(&self) -> u64 {
        *self.transferred.lock().unwrap()
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// `floor(transferred / total * 100)`.
    pub fn percent(&self) -> u8 {
        percent_floor(self.transferred(), self.total)
    }
}

/// `floor(done / total * 100)`; an empty total counts as complete.
pub fn percent_floor(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100) / total as u128) as u8
}

/// `ceil(done / total * 100)`, capped at 100.
pub fn percent_ceil(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) as u128 * 100).div_ceil(total as u128)) as u8
}

/// Formats a byte count with binary units, e.g. `5.00 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

// ---------------------------------------------------------------------------
// SpeedCalculator
// ---------------------------------------------------------------------------

const SPEED_WINDOW: Duration = Duration::from_secs(5);
const SPEED_CAPACITY: usize = 100;

/// Transfer rate over a sliding time window of `(instant, bytes)` samples.
pub struct SpeedCalculator {
    window: Duration,
    capacity: usize,
    samples: Mutex<VecDeque<(Instant, u64)>>,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::with_window(SPEED_WINDOW, SPEED_CAPACITY)
    }
}

impl SpeedCalculator {
    /// Keeps samples younger than `window`, at most `capacity` of them.
    pub fn with_window(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(2),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Records `bytes` received now.
    pub fn add_sample(&self, bytes: u64) {
        let now = Instant::now();
        let mut samples = self.samples.lock().unwrap();
        samples.push_back((now, bytes));
        while let Some(&(at, _)) = samples.front() {
            let stale = now.duration_since(at) > self.window;
            if stale || samples.len() > self.capacity {
                samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Bytes per second across the retained samples; zero until two samples
    /// span a measurable interval.
    pub fn bytes_per_second(&self) -> f64 {
        let samples = self.samples.lock().unwrap();
        let (Some(&(first, _)), Some(&(last, _))) = (samples.front(), samples.back()) else {
            return 0.0;
        };
        let span = last.duration_since(first).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        samples.iter().map(|&(_, bytes)| bytes).sum::<u64>() as f64 / span
    }

    /// Time left for `remaining_bytes`; `None` while the speed is zero.
    pub fn eta(&self, remaining_bytes: u64) -> Option<Duration> {
        match self.bytes_per_second() {
            speed if speed > 0.0 => Some(Duration::from_secs_f64(remaining_bytes as f64 / speed)),
            _ => None,
        }
    }

    pub fn reset(&self) {
        self.samples.lock().unwrap().clear();
    }

    #[cfg(test)]
    fn sample_count(&self) -> usize {
        self.samples.lock().unwrap().len()
    }
}
