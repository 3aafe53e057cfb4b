use chrono::{DateTime, Duration, Utc};

/// Single outstanding scheduled write. Scheduling again replaces the pending
/// deadline, so a burst of triggers collapses into one trailing write.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Start (or restart) the quiet period from `now`. Returns whether a
    /// pending write was superseded.
    pub fn schedule(&mut self, now: DateTime<Utc>) -> bool {
        self.deadline.replace(now + self.quiet).is_some()
    }

    /// Drop the pending write. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    /// Consume the pending write if its quiet period has elapsed.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
