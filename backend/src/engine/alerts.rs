//! Alert state machine
//!
//! Watches per-cell risk scores and manages the
//! NORMAL → WARNING → ESCALATED lifecycle with debounce on both edges,
//! plus the ACKNOWLEDGED side-branch reachable only by explicit external
//! acknowledgment. Each transition into WARNING or ESCALATED yields
//! exactly one emission; repeated cycles in the same state are silent.

use chrono::{DateTime, Duration, Utc};
use shared::{AlertState, AlertStatus};

use crate::config::EngineConfig;

/// Evaluate one cell for one scoring cycle
///
/// Returns the newly entered alerting status when an alert should be
/// emitted, `None` otherwise.
pub fn evaluate(
    state: &mut AlertState,
    risk: f64,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<AlertStatus> {
    let breach = risk > config.warning_threshold;

    match state.status {
        AlertStatus::Normal => {
            if breach {
                state.consecutive_breaches += 1;
                state.consecutive_clears = 0;
                if state.consecutive_breaches >= config.debounce_cycles {
                    transition(state, AlertStatus::Warning, now);
                    return Some(AlertStatus::Warning);
                }
            } else {
                state.consecutive_breaches = 0;
            }
            None
        }
        AlertStatus::Warning => {
            if risk > config.escalation_threshold {
                transition(state, AlertStatus::Escalated, now);
                return Some(AlertStatus::Escalated);
            }
            if breach {
                state.consecutive_clears = 0;
                let stuck_for = now - state.last_transition_at;
                if stuck_for >= Duration::hours(config.warning_timeout_hours) {
                    transition(state, AlertStatus::Escalated, now);
                    return Some(AlertStatus::Escalated);
                }
            } else {
                state.consecutive_clears += 1;
                if state.consecutive_clears >= config.debounce_cycles {
                    transition(state, AlertStatus::Normal, now);
                }
            }
            None
        }
        AlertStatus::Escalated => {
            if breach {
                state.consecutive_clears = 0;
            } else {
                state.consecutive_clears += 1;
                if state.consecutive_clears >= config.debounce_cycles {
                    transition(state, AlertStatus::Normal, now);
                }
            }
            None
        }
        AlertStatus::Acknowledged => {
            // Returns to NORMAL on the first cycle below the threshold;
            // never re-alerts while acknowledged
            if !breach {
                transition(state, AlertStatus::Normal, now);
            }
            None
        }
    }
}

/// Apply an explicit external acknowledgment
///
/// Only WARNING and ESCALATED cells can be acknowledged.
pub fn acknowledge(state: &mut AlertState, now: DateTime<Utc>) -> Result<(), &'static str> {
    match state.status {
        AlertStatus::Warning | AlertStatus::Escalated => {
            transition(state, AlertStatus::Acknowledged, now);
            Ok(())
        }
        AlertStatus::Normal => Err("Cannot acknowledge a cell in NORMAL state"),
        AlertStatus::Acknowledged => Err("Cell is already acknowledged"),
    }
}

fn transition(state: &mut AlertState, to: AlertStatus, now: DateTime<Utc>) {
    state.status = to;
    state.last_transition_at = now;
    state.consecutive_breaches = 0;
    state.consecutive_clears = 0;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn fresh() -> AlertState {
        AlertState::new(Utc::now())
    }

    #[test]
    fn test_debounce_before_warning() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        // First breach cycle: no alert yet
        assert_eq!(evaluate(&mut state, 0.7, now, &config), None);
        assert_eq!(state.status, AlertStatus::Normal);
        // Second consecutive breach: warning
        assert_eq!(
            evaluate(&mut state, 0.7, now + Duration::minutes(10), &config),
            Some(AlertStatus::Warning)
        );
        assert_eq!(state.status, AlertStatus::Warning);
    }

    #[test]
    fn test_transient_spike_does_not_alert() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        assert_eq!(evaluate(&mut state, 0.7, now, &config), None);
        // Dips back below before the debounce count is met
        assert_eq!(evaluate(&mut state, 0.3, now, &config), None);
        assert_eq!(evaluate(&mut state, 0.7, now, &config), None);
        assert_eq!(state.status, AlertStatus::Normal);
    }

    #[test]
    fn test_no_repeat_warning_emission() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.7, now, &config);
        assert_eq!(evaluate(&mut state, 0.7, now, &config), Some(AlertStatus::Warning));
        // Staying in WARNING never re-emits
        for i in 0..5 {
            assert_eq!(
                evaluate(&mut state, 0.7, now + Duration::minutes(i), &config),
                None
            );
        }
    }

    #[test]
    fn test_escalation_on_high_risk() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.7, now, &config);
        evaluate(&mut state, 0.7, now, &config);
        assert_eq!(state.status, AlertStatus::Warning);
        assert_eq!(evaluate(&mut state, 0.9, now, &config), Some(AlertStatus::Escalated));
        assert_eq!(state.status, AlertStatus::Escalated);
    }

    #[test]
    fn test_escalation_on_warning_timeout() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.7, now, &config);
        evaluate(&mut state, 0.7, now, &config);
        assert_eq!(state.status, AlertStatus::Warning);

        let later = now + Duration::hours(config.warning_timeout_hours + 1);
        assert_eq!(evaluate(&mut state, 0.6, later, &config), Some(AlertStatus::Escalated));
    }

    #[test]
    fn test_symmetric_recovery_debounce() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.7, now, &config);
        evaluate(&mut state, 0.7, now, &config);
        assert_eq!(state.status, AlertStatus::Warning);

        // One clear cycle is not enough
        evaluate(&mut state, 0.3, now, &config);
        assert_eq!(state.status, AlertStatus::Warning);
        // Second consecutive clear recovers, silently
        assert_eq!(evaluate(&mut state, 0.3, now, &config), None);
        assert_eq!(state.status, AlertStatus::Normal);
    }

    #[test]
    fn test_acknowledge_lifecycle() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.9, now, &config);
        evaluate(&mut state, 0.9, now, &config);
        evaluate(&mut state, 0.9, now, &config);
        assert_eq!(state.status, AlertStatus::Escalated);

        acknowledge(&mut state, now).unwrap();
        assert_eq!(state.status, AlertStatus::Acknowledged);

        // Risk still high: stays acknowledged, no re-alert
        assert_eq!(evaluate(&mut state, 0.9, now, &config), None);
        assert_eq!(state.status, AlertStatus::Acknowledged);

        // Risk drops: back to normal on the next cycle
        assert_eq!(evaluate(&mut state, 0.2, now, &config), None);
        assert_eq!(state.status, AlertStatus::Normal);
    }

    #[test]
    fn test_acknowledge_requires_active_alert() {
        let mut state = fresh();
        assert!(acknowledge(&mut state, Utc::now()).is_err());

        state.status = AlertStatus::Acknowledged;
        assert!(acknowledge(&mut state, Utc::now()).is_err());
    }

    #[test]
    fn test_fresh_alert_after_acknowledged_recovery() {
        let config = config();
        let mut state = fresh();
        let now = Utc::now();

        evaluate(&mut state, 0.7, now, &config);
        evaluate(&mut state, 0.7, now, &config);
        acknowledge(&mut state, now).unwrap();
        evaluate(&mut state, 0.2, now, &config);
        assert_eq!(state.status, AlertStatus::Normal);

        // A new breach run emits again
        evaluate(&mut state, 0.7, now, &config);
        assert_eq!(evaluate(&mut state, 0.7, now, &config), Some(AlertStatus::Warning));
    }
}
