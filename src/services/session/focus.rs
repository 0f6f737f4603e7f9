use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Visibility transition reported by the exam page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum VisibilityEvent {
    Hidden,
    Visible,
}

/// What the caller should surface after feeding the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FocusSignal {
    None,
    /// Tab just went hidden: show the warning overlay.
    Overlay,
    /// The grace delay elapsed while hidden: redirect to the violation page.
    Violation,
}

/// A scheduled one-shot side effect with an explicit arm/disarm lifecycle.
/// Replaces the ad hoc timeout handle of the original design so the
/// transitions are testable with injected timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DeferredAction {
    fire_at: i64,
}

impl DeferredAction {
    fn armed_at(now: OffsetDateTime, delay_seconds: u64) -> Self {
        let fire_at = (now + Duration::seconds(delay_seconds as i64)).unix_timestamp();
        Self { fire_at }
    }

    fn due(&self, now: OffsetDateTime) -> bool {
        now.unix_timestamp() >= self.fire_at
    }
}

/// Persisted focus-monitor state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct FocusRecord {
    pub(crate) blurred: bool,
    pub(crate) pending: Option<DeferredAction>,
    pub(crate) violations: u32,
}

/// Two-state machine detecting tab backgrounding.
///
/// FOCUSED -> BLURRED on `Hidden`: flag for the overlay and arm the
/// delayed violation. BLURRED -> FOCUSED on `Visible` before the deadline:
/// disarm. If the deadline passes while hidden the violation fires exactly
/// once per armed action and is not undone by a later return. Best-effort
/// deterrent, not a security control.
#[derive(Debug)]
pub(crate) struct FocusMonitor {
    grace_seconds: u64,
    record: FocusRecord,
}

impl FocusMonitor {
    pub(crate) fn new(grace_seconds: u64, record: FocusRecord) -> Self {
        Self { grace_seconds, record }
    }

    pub(crate) fn record(&self) -> &FocusRecord {
        &self.record
    }

    pub(crate) fn into_record(self) -> FocusRecord {
        self.record
    }

    pub(crate) fn on_event(&mut self, event: VisibilityEvent, now: OffsetDateTime) -> FocusSignal {
        // A deadline that already passed wins over the incoming event.
        let fired = self.poll(now);

        match event {
            VisibilityEvent::Hidden => {
                let was_focused = !self.record.blurred;
                self.record.blurred = true;
                if self.record.pending.is_none() {
                    self.record.pending = Some(DeferredAction::armed_at(now, self.grace_seconds));
                }
                if fired == FocusSignal::Violation {
                    FocusSignal::Violation
                } else if was_focused {
                    FocusSignal::Overlay
                } else {
                    FocusSignal::None
                }
            }
            VisibilityEvent::Visible => {
                self.record.blurred = false;
                self.record.pending = None;
                fired
            }
        }
    }

    /// Checks the armed deadline; called from the periodic tick as well as
    /// before handling each event.
    pub(crate) fn poll(&mut self, now: OffsetDateTime) -> FocusSignal {
        if let Some(pending) = self.record.pending {
            if pending.due(now) {
                self.record.pending = None;
                self.record.violations += 1;
                return FocusSignal::Violation;
            }
        }
        FocusSignal::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(1_700_000_000 + seconds).unwrap()
    }

    #[test]
    fn short_blur_does_not_violate() {
        let mut monitor = FocusMonitor::new(1, FocusRecord::default());

        assert_eq!(monitor.on_event(VisibilityEvent::Hidden, at(0)), FocusSignal::Overlay);
        // Back before the one-second grace deadline.
        assert_eq!(monitor.on_event(VisibilityEvent::Visible, at(0)), FocusSignal::None);

        assert_eq!(monitor.poll(at(5)), FocusSignal::None);
        assert_eq!(monitor.record().violations, 0);
        assert!(!monitor.record().blurred);
    }

    #[test]
    fn long_blur_violates_exactly_once() {
        let mut monitor = FocusMonitor::new(1, FocusRecord::default());

        assert_eq!(monitor.on_event(VisibilityEvent::Hidden, at(0)), FocusSignal::Overlay);
        assert_eq!(monitor.poll(at(2)), FocusSignal::Violation);
        assert_eq!(monitor.poll(at(3)), FocusSignal::None);
        assert_eq!(monitor.record().violations, 1);
    }

    #[test]
    fn violation_fires_on_late_return() {
        let mut monitor = FocusMonitor::new(1, FocusRecord::default());

        monitor.on_event(VisibilityEvent::Hidden, at(0));
        // Came back, but only after the deadline had passed.
        assert_eq!(monitor.on_event(VisibilityEvent::Visible, at(10)), FocusSignal::Violation);
        assert_eq!(monitor.record().violations, 1);
        assert!(!monitor.record().blurred);
    }

    #[test]
    fn second_blur_cycle_arms_a_fresh_action() {
        let mut monitor = FocusMonitor::new(1, FocusRecord::default());

        monitor.on_event(VisibilityEvent::Hidden, at(0));
        assert_eq!(monitor.poll(at(2)), FocusSignal::Violation);
        monitor.on_event(VisibilityEvent::Visible, at(3));

        assert_eq!(monitor.on_event(VisibilityEvent::Hidden, at(10)), FocusSignal::Overlay);
        assert_eq!(monitor.poll(at(12)), FocusSignal::Violation);
        assert_eq!(monitor.record().violations, 2);
    }

    #[test]
    fn repeated_hidden_keeps_original_deadline() {
        let mut monitor = FocusMonitor::new(5, FocusRecord::default());

        assert_eq!(monitor.on_event(VisibilityEvent::Hidden, at(0)), FocusSignal::Overlay);
        assert_eq!(monitor.on_event(VisibilityEvent::Hidden, at(2)), FocusSignal::None);
        // Deadline is still t0+5, not t2+5.
        assert_eq!(monitor.poll(at(5)), FocusSignal::Violation);
    }

    #[test]
    fn record_roundtrips_through_json() {
        let mut monitor = FocusMonitor::new(1, FocusRecord::default());
        monitor.on_event(VisibilityEvent::Hidden, at(0));

        let serialized = serde_json::to_string(monitor.record()).expect("serialize");
        let restored: FocusRecord = serde_json::from_str(&serialized).expect("deserialize");

        let mut resumed = FocusMonitor::new(1, restored);
        assert_eq!(resumed.poll(at(2)), FocusSignal::Violation);
    }
}
