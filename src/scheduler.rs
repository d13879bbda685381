use std::time::{Duration, Instant};
use tracing::debug;

/// One display frame at 60Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Coalesces bursts of render requests onto frame boundaries.
///
/// At most one job is pending. Scheduling replaces the pending job and pushes
/// its deadline to one frame from now, so only the latest request in a burst
/// is ever rendered.
#[derive(Debug)]
pub struct FrameScheduler<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
    coalesced: u64,
}

impl<T> FrameScheduler<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            coalesced: 0,
        }
    }

    /// Queues `job`, returning the not-yet-run job it replaced.
    pub fn schedule(&mut self, job: T, now: Instant) -> Option<T> {
        let replaced = self.pending.replace((job, now + self.interval));
        if replaced.is_some() {
            self.coalesced += 1;
            debug!("scheduler: coalesced pending render ({} total)", self.coalesced);
        }
        replaced.map(|(job, _)| job)
    }

    /// Takes the pending job once its frame has arrived.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if due {
            self.pending.take().map(|(job, _)| job)
        } else {
            None
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(job, _)| job)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of jobs dropped because a newer one replaced them.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_runs_after_one_frame() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::default();
        assert!(scheduler.schedule("a", start).is_none());
        assert_eq!(scheduler.poll(start), None);
        assert_eq!(scheduler.poll(start + Duration::from_millis(15)), None);
        assert_eq!(scheduler.poll(start + FRAME_INTERVAL), Some("a"));
        assert!(!scheduler.is_pending());
        assert_eq!(scheduler.poll(start + FRAME_INTERVAL * 2), None);
    }

    #[test]
    fn newer_job_replaces_pending_one() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::default();
        scheduler.schedule(1, start);
        let later = start + Duration::from_millis(10);
        assert_eq!(scheduler.schedule(2, later), Some(1));
        assert_eq!(scheduler.deadline(), Some(later + FRAME_INTERVAL));
        // The first deadline no longer applies.
        assert_eq!(scheduler.poll(start + FRAME_INTERVAL), None);
        assert_eq!(scheduler.poll(later + FRAME_INTERVAL), Some(2));
        assert_eq!(scheduler.coalesced(), 1);
    }

    #[test]
    fn cancel_drops_pending_job() {
        let start = Instant::now();
        let mut scheduler = FrameScheduler::new(Duration::ZERO);
        scheduler.schedule("x", start);
        assert_eq!(scheduler.cancel(), Some("x"));
        assert_eq!(scheduler.poll(start), None);
        assert_eq!(scheduler.deadline(), None);
    }
}
