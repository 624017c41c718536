use smallvec::SmallVec;

/// Milliseconds on the host's monotonic clock.
pub type Millis = u64;

/// A single timer registration
#[derive(Debug, Clone)]
struct Timer<K> {
    key: K,
    due: Millis,
    /// `Some` for repeating timers
    period: Option<Millis>,
}

/// Cooperative timer scheduler for a single-threaded event loop.
///
/// Timers are keyed; scheduling a key that is already registered replaces it, which gives
/// one-shot timers debounce semantics. Nothing fires on its own: the owner calls
/// [`Scheduler::fire_due`] from its loop and handles the returned keys synchronously.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    timers: Vec<Timer<K>>,
}

impl<K: Copy + PartialEq> Scheduler<K> {
    pub fn new() -> Self {
        Self { timers: Vec::new() }
    }

    /// Fire `key` every `period` ms, first at `now + period`
    pub fn every(&mut self, key: K, period: Millis, now: Millis) {
        let period = period.max(1);
        self.insert(Timer {
            key,
            due: now + period,
            period: Some(period),
        });
    }

    /// Fire `key` once at `now + delay`, replacing any pending registration
    pub fn once(&mut self, key: K, delay: Millis, now: Millis) {
        self.insert(Timer {
            key,
            due: now + delay,
            period: None,
        });
    }

    pub fn cancel(&mut self, key: K) {
        self.timers.retain(|t| t.key != key);
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.timers.iter().any(|t| t.key == key)
    }

    /// Removes every timer
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Returns the keys due at `now`, earliest first.
    ///
    /// A repeating timer fires at most once per call; if the loop fell behind it is
    /// rescheduled a full period from `now` instead of firing in a burst.
    pub fn fire_due(&mut self, now: Millis) -> SmallVec<[K; 4]> {
        let mut fired: SmallVec<[(Millis, K); 4]> = SmallVec::new();

        self.timers.retain_mut(|timer| {
            if timer.due > now {
                return true;
            }
            fired.push((timer.due, timer.key));
            match timer.period {
                Some(period) => {
                    timer.due += period;
                    if timer.due <= now {
                        timer.due = now + period;
                    }
                    true
                }
                None => false,
            }
        });

        fired.sort_by_key(|(due, _)| *due);
        fired.into_iter().map(|(_, key)| key).collect()
    }

    fn insert(&mut self, timer: Timer<K>) {
        self.cancel(timer.key);
        self.timers.push(timer);
    }
}

impl<K: Copy + PartialEq> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Tolerance so a refresh rate equal to the target rate is not halved by clock jitter.
const FRAME_SLACK_MS: f64 = 1.0;

/// Caps the render loop to a target frame rate by skipping early frames.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval_ms: f64,
    last_frame: Option<Millis>,
}

impl FramePacer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            interval_ms: Self::interval_for(target_fps),
            last_frame: None,
        }
    }

    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.interval_ms = Self::interval_for(target_fps);
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// True if a frame should run at `now`; records it as the latest frame if so
    pub fn ready(&mut self, now: Millis) -> bool {
        if let Some(last) = self.last_frame {
            let elapsed = now.saturating_sub(last) as f64;
            if elapsed + FRAME_SLACK_MS < self.interval_ms {
                return false;
            }
        }
        self.last_frame = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_frame = None;
    }

    fn interval_for(target_fps: u32) -> f64 {
        1000.0 / target_fps.max(1) as f64
    }
}
