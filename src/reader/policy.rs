//! Stop/continue decisions for a read session.
//!
//! Pure state: no I/O, no clocks. The reader feeds it one event per loop
//! iteration and acts on the verdict.
//!
//! Two independent watchdogs end a session:
//!
//! - **poll budget**: consecutive empty polls. Reaching zero always stops,
//!   even before any payload has been seen (dead line).
//! - **trailing-zero budget**: consecutive zero bytes. Reaching zero stops
//!   only once a non-zero byte has been seen; the leading zero run the
//!   device emits before real data (the preamble) never ends a session.

/// Default number of consecutive empty polls tolerated
pub const DEFAULT_POLL_BUDGET: u32 = 50;

/// Default number of consecutive zero bytes that mark end of tape
pub const DEFAULT_TRAILING_ZERO_BUDGET: u32 = 50;

/// Starting values for both watchdogs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub poll_budget: u32,
    pub trailing_zero_budget: u32,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
            trailing_zero_budget: DEFAULT_TRAILING_ZERO_BUDGET,
        }
    }
}

impl SessionLimits {
    /// Budgets below one would stop before the first event; clamp them.
    pub fn new(poll_budget: u32, trailing_zero_budget: u32) -> Self {
        Self {
            poll_budget: poll_budget.max(1),
            trailing_zero_budget: trailing_zero_budget.max(1),
        }
    }
}

/// One observation from the polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    ByteReceived(u8),
    PollTimedOut,
}

/// Why a session ended. Both are normal completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The device stopped answering pulses
    PollWatchdog,
    /// A run of zero bytes followed the payload
    TrailingZeros,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

/// Watchdog state carried across loop iterations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadSession {
    limits: SessionLimits,
    trailing_zero_budget: u32,
    in_preamble: bool,
    poll_budget: u32,
}

impl Default for ReadSession {
    fn default() -> Self {
        Self::new(SessionLimits::default())
    }
}

impl ReadSession {
    pub fn new(limits: SessionLimits) -> Self {
        Self {
            limits,
            trailing_zero_budget: limits.trailing_zero_budget,
            in_preamble: true,
            poll_budget: limits.poll_budget,
        }
    }

    pub fn trailing_zero_budget(&self) -> u32 {
        self.trailing_zero_budget
    }

    pub fn in_preamble(&self) -> bool {
        self.in_preamble
    }

    pub fn poll_budget(&self) -> u32 {
        self.poll_budget
    }

    /// Apply one event, returning the next state and what to do about it.
    ///
    /// Every received byte is kept by the caller, including the one that
    /// triggers a stop; the verdict only decides when to stop.
    pub fn advance(self, event: SessionEvent) -> (Self, Verdict) {
        let mut next = self;
        match event {
            SessionEvent::PollTimedOut => {
                next.poll_budget = next.poll_budget.saturating_sub(1);
                if next.poll_budget == 0 {
                    return (next, Verdict::Stop(StopReason::PollWatchdog));
                }
                (next, Verdict::Continue)
            }
            SessionEvent::ByteReceived(value) => {
                next.poll_budget = next.limits.poll_budget;
                if value == 0 {
                    // Saturates while still in the preamble
                    next.trailing_zero_budget = next.trailing_zero_budget.saturating_sub(1);
                } else {
                    next.in_preamble = false;
                    next.trailing_zero_budget = next.limits.trailing_zero_budget;
                }

                if next.trailing_zero_budget == 0 && !next.in_preamble {
                    return (next, Verdict::Stop(StopReason::TrailingZeros));
                }
                (next, Verdict::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(mut session: ReadSession, events: impl IntoIterator<Item = SessionEvent>) -> (ReadSession, Vec<Verdict>) {
        let mut verdicts = Vec::new();
        for event in events {
            let (next, verdict) = session.advance(event);
            session = next;
            verdicts.push(verdict);
        }
        (session, verdicts)
    }

    fn bytes(values: &[u8]) -> Vec<SessionEvent> {
        values.iter().map(|&b| SessionEvent::ByteReceived(b)).collect()
    }

    #[test]
    fn test_initial_state() {
        let session = ReadSession::default();
        assert!(session.in_preamble());
        assert_eq!(session.poll_budget(), 50);
        assert_eq!(session.trailing_zero_budget(), 50);
    }

    #[test]
    fn test_long_preamble_never_stops() {
        // Well past the zero budget, still in preamble
        let (session, verdicts) = feed(ReadSession::default(), bytes(&[0; 120]));
        assert!(verdicts.iter().all(|v| *v == Verdict::Continue));
        assert!(session.in_preamble());
        assert_eq!(session.trailing_zero_budget(), 0);

        // First payload byte ends the preamble and restores the budget
        let (session, verdict) = session.advance(SessionEvent::ByteReceived(0x41));
        assert_eq!(verdict, Verdict::Continue);
        assert!(!session.in_preamble());
        assert_eq!(session.trailing_zero_budget(), 50);
    }

    #[test]
    fn test_fifty_trailing_zeros_stop_on_the_fiftieth() {
        let (session, _) = feed(ReadSession::default(), bytes(&[0x41]));
        let (_, verdicts) = feed(session, bytes(&[0; 50]));

        assert!(verdicts[..49].iter().all(|v| *v == Verdict::Continue));
        assert_eq!(verdicts[49], Verdict::Stop(StopReason::TrailingZeros));
    }

    #[test]
    fn test_forty_nine_zeros_then_data_resets() {
        let (session, _) = feed(ReadSession::default(), bytes(&[0x41]));
        let (session, verdicts) = feed(session, bytes(&[0; 49]));
        assert!(verdicts.iter().all(|v| *v == Verdict::Continue));
        assert_eq!(session.trailing_zero_budget(), 1);

        let (session, verdict) = session.advance(SessionEvent::ByteReceived(0x42));
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(session.trailing_zero_budget(), 50);

        // A full fresh run is needed again
        let (_, verdicts) = feed(session, bytes(&[0; 49]));
        assert!(verdicts.iter().all(|v| *v == Verdict::Continue));
    }

    #[test]
    fn test_poll_watchdog_stops_in_preamble() {
        let (session, verdicts) = feed(ReadSession::default(), vec![SessionEvent::PollTimedOut; 50]);
        assert!(session.in_preamble());
        assert!(verdicts[..49].iter().all(|v| *v == Verdict::Continue));
        assert_eq!(verdicts[49], Verdict::Stop(StopReason::PollWatchdog));
    }

    #[test]
    fn test_byte_resets_poll_watchdog() {
        let (session, _) = feed(ReadSession::default(), vec![SessionEvent::PollTimedOut; 49]);
        assert_eq!(session.poll_budget(), 1);

        let (session, verdict) = session.advance(SessionEvent::ByteReceived(0));
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(session.poll_budget(), 50);

        let (_, verdicts) = feed(session, vec![SessionEvent::PollTimedOut; 50]);
        assert!(verdicts[..49].iter().all(|v| *v == Verdict::Continue));
        assert_eq!(verdicts[49], Verdict::Stop(StopReason::PollWatchdog));
    }

    #[test]
    fn test_timeouts_do_not_touch_zero_run() {
        let (session, _) = feed(ReadSession::default(), bytes(&[0x41, 0, 0]));
        let (session, _) = feed(session, vec![SessionEvent::PollTimedOut; 10]);
        assert_eq!(session.trailing_zero_budget(), 48);
        assert!(!session.in_preamble());
    }

    #[test]
    fn test_custom_limits_clamped() {
        let limits = SessionLimits::new(0, 0);
        assert_eq!(limits, SessionLimits::new(1, 1));

        let session = ReadSession::new(SessionLimits::new(3, 2));
        let (_, verdicts) = feed(session, bytes(&[7, 0, 0]));
        assert_eq!(verdicts, vec![Verdict::Continue, Verdict::Continue, Verdict::Stop(StopReason::TrailingZeros)]);
    }
}
