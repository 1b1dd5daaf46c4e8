//! Control-side staging of received events.

use eventlink_core::Event;

/// Ordering key. NaN sorts first and counts as already due, which keeps the
/// release predicate monotone over the sorted queue.
#[inline]
fn release_time(event: &Event) -> f64 {
    if event.time.is_nan() {
        f64::NEG_INFINITY
    } else {
        event.time
    }
}

/// Holds events between arrival and release.
///
/// - `pending`: received, not yet due; sorted by time before each release
/// - `newly_acquired`: everything received during the current tick
/// - `newly_ready`: events that became due during the current tick
#[derive(Debug, Default)]
pub struct StagingArea {
    pending: Vec<Event>,
    newly_ready: Vec<Event>,
    newly_acquired: Vec<Event>,
    pending_sorted: bool,
}

impl StagingArea {
    /// Empty staging area.
    pub fn new() -> Self {
        Self {
            pending_sorted: true,
            ..Default::default()
        }
    }

    /// Drops the previous tick's results.
    pub fn begin_tick(&mut self) {
        self.newly_ready.clear();
        self.newly_acquired.clear();
    }

    /// Copies a packet's events into `pending` and `newly_acquired`.
    pub fn acquire(&mut self, events: &[Event]) {
        let Some(first) = events.first() else {
            return;
        };
        if self.pending_sorted {
            let tail_ok = self
                .pending
                .last()
                .map_or(true, |last| release_time(last) <= release_time(first));
            let run_ok = events
                .windows(2)
                .all(|w| release_time(&w[0]) <= release_time(&w[1]));
            self.pending_sorted = tail_ok && run_ok;
        }
        self.pending.extend_from_slice(events);
        self.newly_acquired.extend_from_slice(events);
    }

    /// Moves every pending event due at or before `current_time` into
    /// `newly_ready`. `None` releases everything.
    pub fn release_due(&mut self, current_time: Option<f64>) {
        if !self.pending_sorted {
            self.pending.sort_by(|a, b| release_time(a).total_cmp(&release_time(b)));
            self.pending_sorted = true;
        }
        let due = match current_time {
            Some(now) => self.pending.partition_point(|e| release_time(e) <= now),
            None => self.pending.len(),
        };
        self.newly_ready.extend(self.pending.drain(..due));
    }

    /// Received events still waiting for their time.
    #[inline]
    pub fn pending(&self) -> &[Event] {
        &self.pending
    }

    /// Events released by the current tick, in time order.
    #[inline]
    pub fn newly_ready(&self) -> &[Event] {
        &self.newly_ready
    }

    /// Events received during the current tick, in arrival order.
    #[inline]
    pub fn newly_acquired(&self) -> &[Event] {
        &self.newly_acquired
    }

    /// Drops every staged event.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.newly_ready.clear();
        self.newly_acquired.clear();
        self.pending_sorted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(time: f64, id: u32) -> Event {
        let mut event = Event::parameter(0, id, 0.0);
        event.time = time;
        event
    }

    fn ids(events: &[Event]) -> Vec<u32> {
        events
            .iter()
            .map(|e| match e.payload {
                eventlink_core::EventPayload::Parameter { id, .. } => id,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_release_only_due_events() {
        let mut staging = StagingArea::new();
        staging.begin_tick();
        staging.acquire(&[at(1.0, 1), at(2.0, 2), at(3.0, 3)]);
        staging.release_due(Some(2.0));
        assert_eq!(ids(staging.newly_ready()), vec![1, 2]);
        assert_eq!(ids(staging.pending()), vec![3]);
        assert_eq!(staging.newly_acquired().len(), 3);
    }

    #[test]
    fn test_out_of_order_arrivals_are_sorted() {
        let mut staging = StagingArea::new();
        staging.acquire(&[at(5.0, 5), at(6.0, 6)]);
        staging.acquire(&[at(1.0, 1), at(2.0, 2)]);
        staging.release_due(Some(5.5));
        assert_eq!(ids(staging.newly_ready()), vec![1, 2, 5]);
        assert_eq!(ids(staging.pending()), vec![6]);
    }

    #[test]
    fn test_nan_times_release_first() {
        let mut staging = StagingArea::new();
        staging.acquire(&[at(1.0, 1), at(-f64::NAN, 2), at(3.0, 3), at(f64::NAN, 4)]);
        staging.release_due(Some(1.5));
        let mut ready = ids(staging.newly_ready());
        ready.sort_unstable();
        assert_eq!(ready, vec![1, 2, 4]);
        assert_eq!(ids(staging.pending()), vec![3]);
    }

    #[test]
    fn test_begin_tick_keeps_pending() {
        let mut staging = StagingArea::new();
        staging.acquire(&[at(1.0, 1), at(9.0, 9)]);
        staging.release_due(Some(1.0));
        staging.begin_tick();
        assert!(staging.newly_ready().is_empty());
        assert!(staging.newly_acquired().is_empty());
        assert_eq!(staging.pending().len(), 1);

        staging.release_due(None);
        assert_eq!(ids(staging.newly_ready()), vec![9]);
        assert!(staging.pending().is_empty());
    }
}
