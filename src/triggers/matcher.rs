//! Filter matcher.
//!
//! Decides whether an [`EventContext`] is admitted by a compiled
//! [`TriggerConfig`]. The result is the conjunction of the type-specific
//! predicate and the common department/location/role scoping predicate.
//! There is no scoring and no partial match.

use std::fmt;

use tracing::debug;

use super::catalog::TriggerType;
use super::config::{RequestKind, ScopeDimension, TriggerConfig, TriggerParams};
use super::event::EventContext;

/// Why an event was not admitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// The config belongs to a different trigger type than the event.
    TriggerMismatch {
        expected: TriggerType,
        actual: TriggerType,
    },
    /// An identity filter (`video_id`, `team_id`, ...) did not match.
    Identity { field: &'static str },
    /// A numeric threshold was not met or the event lacked the value.
    Threshold { field: &'static str },
    /// The request kind did not match.
    RequestType { expected: RequestKind },
    /// A scoping filter excluded the event.
    Scope { dimension: ScopeDimension },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TriggerMismatch { expected, actual } => {
                write!(f, "config is for {} but event is {}", expected, actual)
            }
            Rejection::Identity { field } => write!(f, "{} does not match", field),
            Rejection::Threshold { field } => write!(f, "{} threshold not reached", field),
            Rejection::RequestType { expected } => {
                write!(f, "request_type is not '{}'", expected.as_str())
            }
            Rejection::Scope { dimension } => {
                write!(f, "{} is outside the configured scope", dimension)
            }
        }
    }
}

/// Does `event` satisfy `config` for `trigger_type`?
pub fn matches(trigger_type: TriggerType, config: &TriggerConfig, event: &EventContext) -> bool {
    match evaluate(trigger_type, config, event) {
        Ok(()) => true,
        Err(rejection) => {
            debug!("{} event rejected: {}", trigger_type, rejection);
            false
        }
    }
}

/// Like [`matches`], but reports which clause rejected the event.
pub fn evaluate(
    trigger_type: TriggerType,
    config: &TriggerConfig,
    event: &EventContext,
) -> Result<(), Rejection> {
    if config.trigger_type() != trigger_type {
        return Err(Rejection::TriggerMismatch {
            expected: config.trigger_type(),
            actual: trigger_type,
        });
    }

    check_params(config.params(), event)?;

    if let Some(dimension) = config.scope().excluding_dimension(
        event.department_id.as_deref(),
        event.location_id.as_deref(),
        event.role_id.as_deref(),
    ) {
        return Err(Rejection::Scope { dimension });
    }

    Ok(())
}

fn check_params(params: &TriggerParams, event: &EventContext) -> Result<(), Rejection> {
    match params {
        TriggerParams::None => Ok(()),
        TriggerParams::Team { team_id } => identity("team_id", team_id, &event.team_id),
        TriggerParams::Video { video_id } => identity("video_id", video_id, &event.video_id),
        TriggerParams::Test { test_id, min_score } => {
            identity("test_id", test_id, &event.test_id)?;
            match min_score {
                Some(min) if !event.score.is_some_and(|s| s >= *min as f64) => {
                    Err(Rejection::Threshold { field: "min_score" })
                }
                _ => Ok(()),
            }
        }
        TriggerParams::Quiz { quiz_id } => identity("quiz_id", quiz_id, &event.quiz_id),
        TriggerParams::XpThreshold { xp_threshold } => {
            at_least("xp_threshold", *xp_threshold, event.xp)
        }
        TriggerParams::Level { level } => match level {
            Some(level) => at_least("level", *level, event.level),
            None => Ok(()),
        },
        TriggerParams::CoinThreshold { coin_threshold } => {
            at_least("coin_threshold", *coin_threshold, event.coins)
        }
        TriggerParams::Achievement { achievement_id } => {
            identity("achievement_id", achievement_id, &event.achievement_id)
        }
        TriggerParams::Benefit { benefit_id } => {
            identity("benefit_id", benefit_id, &event.benefit_id)
        }
        TriggerParams::Task { task_id } => identity("task_id", task_id, &event.task_id),
        TriggerParams::Request { request_type } => match request_type {
            RequestKind::All => Ok(()),
            expected => {
                let actual = event.request_type.as_deref().map(str::trim);
                if actual.is_some_and(|a| a.eq_ignore_ascii_case(expected.as_str())) {
                    Ok(())
                } else {
                    Err(Rejection::RequestType {
                        expected: *expected,
                    })
                }
            }
        },
        // Wall-clock matching belongs to the external scheduler; the stored
        // config was already validated at compile time.
        TriggerParams::ScheduledDate { .. }
        | TriggerParams::ScheduledCron { .. }
        | TriggerParams::ReminderCheck { .. } => Ok(()),
    }
}

fn identity(
    field: &'static str,
    wanted: &Option<String>,
    actual: &Option<String>,
) -> Result<(), Rejection> {
    match wanted {
        Some(wanted) if actual.as_deref() != Some(wanted.as_str()) => {
            Err(Rejection::Identity { field })
        }
        _ => Ok(()),
    }
}

// Inclusive: an event exactly at the threshold matches.
fn at_least(field: &'static str, threshold: i64, actual: Option<i64>) -> Result<(), Rejection> {
    if actual.is_some_and(|v| v >= threshold) {
        Ok(())
    } else {
        Err(Rejection::Threshold { field })
    }
}
