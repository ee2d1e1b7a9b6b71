use std::time::{Duration, Instant};

/// Decides when the next frame is due.
///
/// With a period the schedule is a fixed-rate timer: deadlines advance by whole
/// periods and a late frame does not trigger a burst of catch-up frames. Without
/// a period every tick is due.
#[derive(Debug, Clone)]
pub struct FrameSchedule {
    period: Option<Duration>,
    next_due: Option<Instant>,
}

impl FrameSchedule {
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            period: period.filter(|p| !p.is_zero()),
            next_due: None,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Arms the schedule; the first frame is due immediately.
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now);
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match (self.period, self.next_due) {
            (None, Some(_)) => true,
            (Some(_), Some(due)) => now >= due,
            (_, None) => false,
        }
    }

    /// Moves the deadline past `now` after a frame ran.
    ///
    /// Missed periods are skipped while keeping the original phase. A deadline
    /// `Instant` cannot represent disarms the schedule.
    pub fn advance(&mut self, now: Instant) {
        let Some(period) = self.period else { return };
        let Some(due) = self.next_due else { return };

        self.next_due = due
            .checked_add(period)
            .filter(|&next| next > now)
            .or_else(|| {
                let into_period = now.saturating_duration_since(due).as_nanos() % period.as_nanos();
                now.checked_add(period - nanos(into_period))
            });
    }

    /// Deadline the host should sleep until, when a period is set.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.period.and(self.next_due)
    }
}

/// `n` must fit in a `Duration`.
fn nanos(n: u128) -> Duration {
    const PER_SEC: u128 = 1_000_000_000;
    Duration::new((n / PER_SEC) as u64, (n % PER_SEC) as u32)
}
