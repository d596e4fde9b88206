use std::time::Duration;

/// Handle to an armed one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<C> {
    id: TimerId,
    at: Duration,
    cue: C,
}

/// Single-threaded queue of one-shot timers.
///
/// Timers never fire on their own: the owner calls [`Timers::poll`] from its
/// frame loop and receives every cue whose deadline has passed. A cancelled
/// timer is removed from the queue and can never be returned by a later poll.
#[derive(Debug)]
pub struct Timers<C> {
    pending: Vec<Pending<C>>,
    next_id: u64,
}

impl<C> Timers<C> {
    pub fn new() -> Self {
        Self { pending: Vec::new(), next_id: 0 }
    }

    pub fn arm(&mut self, at: Duration, cue: C) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending { id, at, cue });
        id
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    #[cfg(test)]
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn deadline(&self, id: TimerId) -> Option<Duration> {
        self.pending.iter().find(|p| p.id == id).map(|p| p.at)
    }

    /// Removes and returns every cue due at `now`, earliest deadline first.
    /// Ties keep arming order.
    pub fn poll(&mut self, now: Duration) -> Vec<C> {
        let (mut due, rest): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|p| p.at <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.at, p.id.0));
        due.into_iter().map(|p| p.cue).collect()
    }
}

impl<C> Default for Timers<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// The repeating per-frame callback, the frame-loop counterpart of
/// `requestAnimationFrame`. While armed, its owner recomputes animation state
/// every frame; cancelling it stops those updates.
#[derive(Debug, Default)]
pub struct FrameRequest {
    armed: bool,
}

impl FrameRequest {
    pub fn request(&mut self) {
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    /// Returns false when nothing is armed.
    pub fn deliver(&self) -> bool {
        self.armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn poll_returns_only_due_cues_in_deadline_order() {
        let mut timers = Timers::new();
        timers.arm(ms(300), "c");
        timers.arm(ms(100), "a");
        timers.arm(ms(200), "b");
        timers.arm(ms(900), "late");

        assert_eq!(timers.poll(ms(50)), Vec::<&str>::new());
        assert_eq!(timers.poll(ms(300)), vec!["a", "b", "c"]);
        assert_eq!(timers.len(), 1);
        assert!(timers.poll(ms(300)).is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Timers::new();
        let id = timers.arm(ms(100), 1);
        assert!(timers.is_armed(id));
        assert!(timers.cancel(id));
        assert!(!timers.cancel(id));
        assert!(timers.poll(ms(1_000)).is_empty());
    }

    #[test]
    fn fired_timer_is_no_longer_armed() {
        let mut timers = Timers::new();
        let id = timers.arm(ms(10), ());
        assert_eq!(timers.deadline(id), Some(ms(10)));
        timers.poll(ms(10));
        assert!(!timers.is_armed(id));
        assert_eq!(timers.deadline(id), None);
    }

    #[test]
    fn frame_request_only_delivers_while_armed() {
        let mut frame = FrameRequest::default();
        assert!(!frame.deliver());
        frame.request();
        assert!(frame.deliver());
        assert!(frame.deliver());
        frame.cancel();
        assert!(!frame.deliver());
    }
}
