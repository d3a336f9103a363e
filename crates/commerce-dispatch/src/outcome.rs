//! Dispatch outcomes and their counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// What happened to one inbound event. Every variant except `Handled`
/// means the event was dropped; none of them is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Handled,
    MalformedEventType,
    UnknownResource,
    UnhandledAction,
    MissingPayload,
    DecodeFailed,
    ServiceFailed,
}

impl DispatchOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::MalformedEventType => "malformed_event_type",
            Self::UnknownResource => "unknown_resource",
            Self::UnhandledAction => "unhandled_action",
            Self::MissingPayload => "missing_payload",
            Self::DecodeFailed => "decode_failed",
            Self::ServiceFailed => "service_failed",
        }
    }

    pub fn is_dropped(&self) -> bool {
        !matches!(self, Self::Handled)
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free per-outcome counters shared by all workers.
#[derive(Debug, Default)]
pub struct DispatchStats {
    handled: AtomicU64,
    malformed_event_type: AtomicU64,
    unknown_resource: AtomicU64,
    unhandled_action: AtomicU64,
    missing_payload: AtomicU64,
    decode_failed: AtomicU64,
    service_failed: AtomicU64,
}

impl DispatchStats {
    pub fn record(&self, outcome: DispatchOutcome) {
        let counter = match outcome {
            DispatchOutcome::Handled => &self.handled,
            DispatchOutcome::MalformedEventType => &self.malformed_event_type,
            DispatchOutcome::UnknownResource => &self.unknown_resource,
            DispatchOutcome::UnhandledAction => &self.unhandled_action,
            DispatchOutcome::MissingPayload => &self.missing_payload,
            DispatchOutcome::DecodeFailed => &self.decode_failed,
            DispatchOutcome::ServiceFailed => &self.service_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        DispatchStatsSnapshot {
            handled: load(&self.handled),
            malformed_event_type: load(&self.malformed_event_type),
            unknown_resource: load(&self.unknown_resource),
            unhandled_action: load(&self.unhandled_action),
            missing_payload: load(&self.missing_payload),
            decode_failed: load(&self.decode_failed),
            service_failed: load(&self.service_failed),
        }
    }
}

/// Point-in-time copy of [`DispatchStats`], as served over HTTP.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStatsSnapshot {
    pub handled: u64,
    pub malformed_event_type: u64,
    pub unknown_resource: u64,
    pub unhandled_action: u64,
    pub missing_payload: u64,
    pub decode_failed: u64,
    pub service_failed: u64,
}

impl DispatchStatsSnapshot {
    pub fn dropped(&self) -> u64 {
        self.malformed_event_type
            + self.unknown_resource
            + self.unhandled_action
            + self.missing_payload
            + self.decode_failed
            + self.service_failed
    }

    pub fn total(&self) -> u64 {
        self.handled + self.dropped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_names_match_serde() {
        for outcome in [
            DispatchOutcome::Handled,
            DispatchOutcome::MalformedEventType,
            DispatchOutcome::UnknownResource,
            DispatchOutcome::UnhandledAction,
            DispatchOutcome::MissingPayload,
            DispatchOutcome::DecodeFailed,
            DispatchOutcome::ServiceFailed,
        ] {
            let json = serde_json::to_value(outcome).unwrap();
            assert_eq!(json, outcome.as_str());
            assert_eq!(outcome.is_dropped(), outcome != DispatchOutcome::Handled);
        }
    }

    #[test]
    fn counters_accumulate() {
        let stats = DispatchStats::default();
        stats.record(DispatchOutcome::Handled);
        stats.record(DispatchOutcome::Handled);
        stats.record(DispatchOutcome::DecodeFailed);
        stats.record(DispatchOutcome::UnhandledAction);

        let snap = stats.snapshot();
        assert_eq!(snap.handled, 2);
        assert_eq!(snap.decode_failed, 1);
        assert_eq!(snap.unhandled_action, 1);
        assert_eq!(snap.dropped(), 2);
        assert_eq!(snap.total(), 4);
    }
}
