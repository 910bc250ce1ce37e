// Transmission gate: in-flight exclusivity, deduplication, rate limiting
//
// Idle --(new line, not rate limited)--> InFlight --(completion)--> Idle
//
// Offers made while InFlight are dropped, never queued. The last sent line
// and the attempt time are recorded when a send is accepted, so a failed
// write still suppresses an identical follow-up.

use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::messages::WriteOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    InFlight,
}

/// Verdict for one offered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Accepted: write this line, the gate is now InFlight
    Send(String),
    /// A previous write has not completed yet
    Busy,
    /// Same bytes as the last attempted send
    Duplicate,
    /// Changed, but too soon after the last accepted send
    RateLimited { wait: Duration },
}

impl GateDecision {
    pub fn is_send(&self) -> bool {
        matches!(self, GateDecision::Send(_))
    }
}

#[derive(Debug, Clone)]
pub struct TransmissionGate {
    min_interval: Duration,
    state: GateState,
    last_sent: Option<String>,
    last_attempt: Option<Instant>,
}

impl TransmissionGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: GateState::Idle,
            last_sent: None,
            last_attempt: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_in_flight(&self) -> bool {
        self.state == GateState::InFlight
    }

    /// Last line handed to the channel, `None` before the first send
    pub fn last_sent(&self) -> Option<&str> {
        self.last_sent.as_deref()
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Decide whether `line` goes out now; `now` is decision time
    pub fn offer(&mut self, line: &str, now: Instant) -> GateDecision {
        if self.state == GateState::InFlight {
            trace!("Gate busy, dropping {:?}", line);
            return GateDecision::Busy;
        }

        if self.last_sent.as_deref() == Some(line) {
            trace!("Duplicate command {:?} suppressed", line);
            return GateDecision::Duplicate;
        }

        if let Some(last) = self.last_attempt {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!("Rate limited {:?}, {:?} left", line, wait);
                return GateDecision::RateLimited { wait };
            }
        }

        self.state = GateState::InFlight;
        self.last_sent = Some(line.to_string());
        self.last_attempt = Some(now);
        debug!("Gate accepted {:?}", line);
        GateDecision::Send(line.to_string())
    }

    /// Write finished, whatever the outcome
    pub fn complete(&mut self, outcome: &WriteOutcome) {
        if self.state == GateState::Idle {
            warn!("Write completion with no send in flight: {:?}", outcome);
        }
        self.state = GateState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn gate() -> TransmissionGate {
        TransmissionGate::new(ms(500))
    }

    #[test]
    fn test_first_offer_is_sent() {
        let mut g = gate();
        let t0 = Instant::now();
        assert_eq!(g.offer("90,0,0\n", t0), GateDecision::Send("90,0,0\n".into()));
        assert!(g.is_in_flight());
        assert_eq!(g.last_sent(), Some("90,0,0\n"));
    }

    #[test]
    fn test_in_flight_drops_everything() {
        let mut g = gate();
        let t0 = Instant::now();
        g.offer("90,1,0\n", t0);
        // Even a changed line long after the interval is dropped while busy
        assert_eq!(g.offer("45,1,0\n", t0 + ms(5000)), GateDecision::Busy);
        assert_eq!(g.last_sent(), Some("90,1,0\n"));

        g.complete(&WriteOutcome::Sent);
        assert_eq!(g.state(), GateState::Idle);
        assert!(g.offer("45,1,0\n", t0 + ms(5001)).is_send());
    }

    #[test]
    fn test_duplicate_is_suppressed() {
        let mut g = gate();
        let t0 = Instant::now();
        g.offer("90,0,0\n", t0);
        g.complete(&WriteOutcome::Sent);
        assert_eq!(g.offer("90,0,0\n", t0 + ms(10_000)), GateDecision::Duplicate);
    }

    #[test]
    fn test_rate_limit_scenario() {
        let mut g = gate();
        let t0 = Instant::now();
        assert!(g.offer("100,1,0\n", t0).is_send());
        g.complete(&WriteOutcome::Sent);

        assert_eq!(
            g.offer("110,1,0\n", t0 + ms(100)),
            GateDecision::RateLimited { wait: ms(400) }
        );
        assert!(g.offer("120,1,0\n", t0 + ms(600)).is_send());
        assert_eq!(g.last_sent(), Some("120,1,0\n"));
    }

    #[test]
    fn test_failed_write_still_counts_as_sent() {
        let mut g = gate();
        let t0 = Instant::now();
        g.offer("90,-1,0\n", t0);
        g.complete(&WriteOutcome::Failed("broken pipe".into()));

        assert_eq!(g.state(), GateState::Idle);
        assert_eq!(g.last_sent(), Some("90,-1,0\n"));
        assert_eq!(g.offer("90,-1,0\n", t0 + ms(800)), GateDecision::Duplicate);
        assert!(g.offer("90,0,0\n", t0 + ms(800)).is_send());
    }

    #[test]
    fn test_attempt_gaps_respect_interval() {
        let mut g = gate();
        let t0 = Instant::now();
        let mut attempts = Vec::new();

        // A drag producing a new line every 30ms, writes completing instantly
        for i in 0..100u64 {
            let now = t0 + ms(i * 30);
            let line = format!("{},1,0\n", 45 + i);
            if g.offer(&line, now).is_send() {
                attempts.push(now);
                g.complete(&WriteOutcome::Sent);
            }
        }

        assert!(attempts.len() > 1);
        for pair in attempts.windows(2) {
            assert!(pair[1] - pair[0] >= ms(500));
        }
    }

    #[test]
    fn test_repeated_state_sends_once() {
        let mut g = gate();
        let t0 = Instant::now();
        let mut sent = 0;
        for i in 0..50u64 {
            if g.offer("60,1,1\n", t0 + ms(i * 100)).is_send() {
                sent += 1;
                g.complete(&WriteOutcome::Sent);
            }
        }
        assert_eq!(sent, 1);
    }
}
