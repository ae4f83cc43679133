//! Trigger configuration.
//!
//! A trigger's configuration is persisted as a flat JSON object whose
//! meaningful keys depend on the trigger type. [`RawTriggerConfig`] is that
//! persisted shape. [`TriggerConfig::compile`] validates it against the
//! trigger type and produces the typed form the matcher works on, so
//! malformed configs are rejected when a workflow is saved, not when an
//! event arrives.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::catalog::TriggerType;
use crate::error::{Error, Result};

/// Persisted trigger configuration, as authored in the builder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievement_id: Option<String>,

    /// Whole percent, as the builder stores it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_threshold: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_expression: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_hours: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_ids: Option<Vec<String>>,

    /// Keys this crate does not interpret (e.g. legacy `days_offset`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Repetition of a `SCHEDULED_DATE` trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for Repeat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(Repeat::Once),
            "daily" => Ok(Repeat::Daily),
            "weekly" => Ok(Repeat::Weekly),
            "monthly" => Ok(Repeat::Monthly),
            "yearly" => Ok(Repeat::Yearly),
            other => Err(Error::Validation(format!(
                "Invalid repeat '{}', expected once|daily|weekly|monthly|yearly",
                other
            ))),
        }
    }
}

/// Request kind filter for request approval/rejection triggers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    #[default]
    All,
    Leave,
    Document,
    Expense,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::All => "all",
            RequestKind::Leave => "leave",
            RequestKind::Document => "document",
            RequestKind::Expense => "expense",
        }
    }
}

impl FromStr for RequestKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(RequestKind::All),
            "leave" => Ok(RequestKind::Leave),
            "document" => Ok(RequestKind::Document),
            "expense" => Ok(RequestKind::Expense),
            other => Err(Error::Validation(format!(
                "Invalid request_type '{}', expected all|leave|document|expense",
                other
            ))),
        }
    }
}

/// What a `REMINDER_CHECK` trigger looks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    #[default]
    IncompleteVideo,
    IncompleteTest,
    IncompleteQuiz,
    PendingTask,
}

impl FromStr for CheckType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "incomplete_video" => Ok(CheckType::IncompleteVideo),
            "incomplete_test" => Ok(CheckType::IncompleteTest),
            "incomplete_quiz" => Ok(CheckType::IncompleteQuiz),
            "pending_task" => Ok(CheckType::PendingTask),
            other => Err(Error::Validation(format!(
                "Invalid check_type '{}', expected incomplete_video|incomplete_test|incomplete_quiz|pending_task",
                other
            ))),
        }
    }
}

/// Type-specific trigger parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerParams {
    /// No type-specific fields (employee lifecycle, manual, legacy types).
    None,
    Team { team_id: Option<String> },
    Video { video_id: Option<String> },
    Test { test_id: Option<String>, min_score: Option<i64> },
    Quiz { quiz_id: Option<String> },
    XpThreshold { xp_threshold: i64 },
    Level { level: Option<i64> },
    CoinThreshold { coin_threshold: i64 },
    Achievement { achievement_id: Option<String> },
    Benefit { benefit_id: Option<String> },
    Task { task_id: Option<String> },
    Request { request_type: RequestKind },
    ScheduledDate { date: NaiveDate, repeat: Repeat },
    ScheduledCron { cron_expression: String },
    ReminderCheck { check_type: CheckType, interval_hours: Option<u32> },
}

/// Organisational scoping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDimension {
    Department,
    Location,
    Role,
}

impl fmt::Display for ScopeDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeDimension::Department => f.write_str("department"),
            ScopeDimension::Location => f.write_str("location"),
            ScopeDimension::Role => f.write_str("role"),
        }
    }
}

/// Department / location / role restrictions shared by every trigger type.
///
/// An empty set places no restriction on its dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub department_ids: BTreeSet<String>,
    pub location_ids: BTreeSet<String>,
    pub role_ids: BTreeSet<String>,
}

impl ScopeFilter {
    /// Build a filter from persisted id lists, trimming ids and dropping blanks.
    pub fn from_lists(
        department_ids: Option<&[String]>,
        location_ids: Option<&[String]>,
        role_ids: Option<&[String]>,
    ) -> Self {
        Self {
            department_ids: normalize_ids(department_ids),
            location_ids: normalize_ids(location_ids),
            role_ids: normalize_ids(role_ids),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.department_ids.is_empty() && self.location_ids.is_empty() && self.role_ids.is_empty()
    }

    fn ids(&self, dimension: ScopeDimension) -> &BTreeSet<String> {
        match dimension {
            ScopeDimension::Department => &self.department_ids,
            ScopeDimension::Location => &self.location_ids,
            ScopeDimension::Role => &self.role_ids,
        }
    }

    /// First dimension that excludes an event with the given attributes.
    pub(crate) fn excluding_dimension(
        &self,
        department_id: Option<&str>,
        location_id: Option<&str>,
        role_id: Option<&str>,
    ) -> Option<ScopeDimension> {
        [
            (ScopeDimension::Department, department_id),
            (ScopeDimension::Location, location_id),
            (ScopeDimension::Role, role_id),
        ]
        .into_iter()
        .find(|(dimension, value)| {
            let allowed = self.ids(*dimension);
            !allowed.is_empty() && !value.is_some_and(|v| allowed.contains(v))
        })
        .map(|(dimension, _)| dimension)
    }
}

fn normalize_ids(ids: Option<&[String]>) -> BTreeSet<String> {
    ids.unwrap_or_default()
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// A validated trigger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    trigger_type: TriggerType,
    params: TriggerParams,
    scope: ScopeFilter,
}

impl TriggerConfig {
    /// Validate a persisted configuration for the given trigger type.
    ///
    /// Fields that are irrelevant to the trigger type are ignored.
    pub fn compile(trigger_type: TriggerType, raw: &RawTriggerConfig) -> Result<Self> {
        let params = compile_params(trigger_type, raw).map_err(|e| {
            debug!("Rejected {} trigger config: {}", trigger_type, e);
            e
        })?;

        let scope = ScopeFilter::from_lists(
            raw.department_ids.as_deref(),
            raw.location_ids.as_deref(),
            raw.role_ids.as_deref(),
        );

        Ok(Self {
            trigger_type,
            params,
            scope,
        })
    }

    /// Validate a configuration given as a JSON object.
    pub fn from_value(trigger_type: TriggerType, value: &Value) -> Result<Self> {
        let raw: RawTriggerConfig = if value.is_null() {
            RawTriggerConfig::default()
        } else {
            serde_json::from_value(value.clone()).map_err(|e| {
                Error::Validation(format!("Invalid {} trigger config: {}", trigger_type, e))
            })?
        };
        Self::compile(trigger_type, &raw)
    }

    /// A configuration with no type-specific filters and no scoping.
    ///
    /// Fails for trigger types that have required fields.
    pub fn unrestricted(trigger_type: TriggerType) -> Result<Self> {
        Self::compile(trigger_type, &RawTriggerConfig::default())
    }

    /// Replace the scoping filter.
    pub fn with_scope(mut self, scope: ScopeFilter) -> Self {
        self.scope = scope;
        self
    }

    pub fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }

    pub fn params(&self) -> &TriggerParams {
        &self.params
    }

    pub fn scope(&self) -> &ScopeFilter {
        &self.scope
    }
}

fn compile_params(trigger_type: TriggerType, raw: &RawTriggerConfig) -> Result<TriggerParams> {
    use TriggerType as T;

    let params = match trigger_type {
        T::EmployeeCreated
        | T::EmployeeUpdated
        | T::EmployeeDeleted
        | T::Manual
        | T::OnboardingStart
        | T::OffboardingStart
        | T::Promotion
        | T::TimeBased
        | T::EventBased => TriggerParams::None,

        T::EmployeeAddedToTeam | T::EmployeeRemovedFromTeam => TriggerParams::Team {
            team_id: non_blank(&raw.team_id),
        },

        T::LearningVideoStarted | T::LearningVideoCompleted => TriggerParams::Video {
            video_id: non_blank(&raw.video_id),
        },

        T::LearningTestCompleted => {
            if let Some(score) = raw.min_score {
                if !(0..=100).contains(&score) {
                    return Err(Error::Validation(format!(
                        "min_score must be between 0 and 100, got {}",
                        score
                    )));
                }
            }
            TriggerParams::Test {
                test_id: non_blank(&raw.test_id),
                min_score: raw.min_score,
            }
        }

        T::LearningQuizCompleted => TriggerParams::Quiz {
            quiz_id: non_blank(&raw.quiz_id),
        },

        T::XpThresholdReached => TriggerParams::XpThreshold {
            xp_threshold: required_positive("xp_threshold", raw.xp_threshold)?,
        },

        T::LevelUp => {
            if let Some(level) = raw.level {
                if level < 1 {
                    return Err(Error::Validation(format!(
                        "level must be at least 1, got {}",
                        level
                    )));
                }
            }
            TriggerParams::Level { level: raw.level }
        }

        T::CoinsThresholdReached => TriggerParams::CoinThreshold {
            coin_threshold: required_positive("coin_threshold", raw.coin_threshold)?,
        },

        T::AchievementUnlocked => TriggerParams::Achievement {
            achievement_id: non_blank(&raw.achievement_id),
        },

        T::BenefitPurchased | T::BenefitRedeemed => TriggerParams::Benefit {
            benefit_id: non_blank(&raw.benefit_id),
        },

        T::TaskCompleted | T::TaskOverdue => TriggerParams::Task {
            task_id: non_blank(&raw.task_id),
        },

        T::RequestApproved | T::RequestRejected => TriggerParams::Request {
            request_type: match non_blank(&raw.request_type) {
                Some(kind) => kind.parse()?,
                None => RequestKind::All,
            },
        },

        T::ScheduledDate => {
            let date = non_blank(&raw.date).ok_or_else(|| {
                Error::Validation("SCHEDULED_DATE requires a date".to_string())
            })?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                Error::Validation(format!(
                    "Invalid date '{}', expected YYYY-MM-DD: {}",
                    date, e
                ))
            })?;
            let repeat = match non_blank(&raw.repeat) {
                Some(repeat) => repeat.parse()?,
                None => Repeat::Once,
            };
            TriggerParams::ScheduledDate { date, repeat }
        }

        T::ScheduledCron => {
            let expression = non_blank(&raw.cron_expression).ok_or_else(|| {
                Error::Validation("SCHEDULED_CRON requires a cron_expression".to_string())
            })?;
            validate_cron_expression(&expression)?;
            TriggerParams::ScheduledCron {
                cron_expression: expression,
            }
        }

        T::ReminderCheck => {
            let check_type = match non_blank(&raw.check_type) {
                Some(kind) => kind.parse()?,
                None => CheckType::IncompleteVideo,
            };
            let interval_hours = match raw.interval_hours {
                Some(hours) if hours > 0 => Some(u32::try_from(hours).map_err(|_| {
                    Error::Validation(format!("interval_hours {} is too large", hours))
                })?),
                Some(hours) => {
                    return Err(Error::Validation(format!(
                        "interval_hours must be positive, got {}",
                        hours
                    )))
                }
                None => None,
            };
            TriggerParams::ReminderCheck {
                check_type,
                interval_hours,
            }
        }
    };

    Ok(params)
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_positive(field: &str, value: Option<i64>) -> Result<i64> {
    match value {
        Some(v) if v >= 1 => Ok(v),
        Some(v) => Err(Error::Validation(format!(
            "{} must be at least 1, got {}",
            field, v
        ))),
        None => Err(Error::Validation(format!("{} is required", field))),
    }
}

/// The `cron` crate wants a leading seconds field (`sec min hour day month
/// weekday [year]`); classic 5-field expressions get `0` prepended.
fn normalize_cron_expression(expr: &str) -> String {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.len() {
        5 => format!("0 {}", fields.join(" ")),
        _ => fields.join(" "),
    }
}

/// Check that a cron expression parses.
pub fn validate_cron_expression(expr: &str) -> Result<()> {
    let normalized = normalize_cron_expression(expr);
    cron::Schedule::from_str(&normalized)
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("Invalid cron expression '{}': {}", expr, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawTriggerConfig {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_identity_filter_is_optional() {
        let config =
            TriggerConfig::compile(TriggerType::LearningVideoCompleted, &raw(json!({}))).unwrap();
        assert_eq!(config.params(), &TriggerParams::Video { video_id: None });

        let config = TriggerConfig::compile(
            TriggerType::LearningVideoCompleted,
            &raw(json!({"video_id": "  "})),
        )
        .unwrap();
        assert_eq!(config.params(), &TriggerParams::Video { video_id: None });
    }

    #[test]
    fn test_xp_threshold_required() {
        let err = TriggerConfig::compile(TriggerType::XpThresholdReached, &raw(json!({})))
            .unwrap_err();
        assert!(err.to_string().contains("xp_threshold is required"));

        let err = TriggerConfig::compile(
            TriggerType::XpThresholdReached,
            &raw(json!({"xp_threshold": 0})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn test_coin_threshold_required() {
        assert!(TriggerConfig::unrestricted(TriggerType::CoinsThresholdReached).is_err());
        let config = TriggerConfig::compile(
            TriggerType::CoinsThresholdReached,
            &raw(json!({"coin_threshold": 500})),
        )
        .unwrap();
        assert_eq!(
            config.params(),
            &TriggerParams::CoinThreshold {
                coin_threshold: 500
            }
        );
    }

    #[test]
    fn test_min_score_range() {
        assert!(TriggerConfig::compile(
            TriggerType::LearningTestCompleted,
            &raw(json!({"min_score": 101}))
        )
        .is_err());
        assert!(TriggerConfig::compile(
            TriggerType::LearningTestCompleted,
            &raw(json!({"min_score": 80}))
        )
        .is_ok());
    }

    #[test]
    fn test_min_score_reads_back_unchanged() {
        let persisted = json!({"test_id": "t1", "min_score": 80, "days_offset": 3});
        let config = raw(persisted.clone());
        assert_eq!(serde_json::to_value(&config).unwrap(), persisted);
    }

    #[test]
    fn test_scheduled_date() {
        let config = TriggerConfig::compile(
            TriggerType::ScheduledDate,
            &raw(json!({"date": "2026-01-15", "repeat": "yearly"})),
        )
        .unwrap();
        assert_eq!(
            config.params(),
            &TriggerParams::ScheduledDate {
                date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
                repeat: Repeat::Yearly,
            }
        );

        assert!(
            TriggerConfig::compile(TriggerType::ScheduledDate, &raw(json!({"date": "15.01.2026"})))
                .is_err()
        );
        assert!(TriggerConfig::unrestricted(TriggerType::ScheduledDate).is_err());
        assert!(TriggerConfig::compile(
            TriggerType::ScheduledDate,
            &raw(json!({"date": "2026-01-15", "repeat": "hourly"}))
        )
        .is_err());
    }

    #[test]
    fn test_cron_expression() {
        assert!(validate_cron_expression("0 9 * * 1").is_ok());
        assert!(validate_cron_expression("0 0 1 * *").is_ok());
        assert!(validate_cron_expression("*/15 * * * *").is_ok());
        assert!(validate_cron_expression("not a cron").is_err());
        assert!(validate_cron_expression("99 9 * * *").is_err());

        let err = TriggerConfig::compile(
            TriggerType::ScheduledCron,
            &raw(json!({"cron_expression": ""})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("cron_expression"));
    }

    #[test]
    fn test_reminder_interval_must_be_positive() {
        let err = TriggerConfig::compile(
            TriggerType::ReminderCheck,
            &raw(json!({"interval_hours": 0})),
        )
        .unwrap_err();
        assert!(err.to_string().contains("interval_hours"));

        let config = TriggerConfig::compile(
            TriggerType::ReminderCheck,
            &raw(json!({"check_type": "pending_task", "interval_hours": 24})),
        )
        .unwrap();
        assert_eq!(
            config.params(),
            &TriggerParams::ReminderCheck {
                check_type: CheckType::PendingTask,
                interval_hours: Some(24),
            }
        );
    }

    #[test]
    fn test_request_type_defaults_to_all() {
        let config = TriggerConfig::unrestricted(TriggerType::RequestApproved).unwrap();
        assert_eq!(
            config.params(),
            &TriggerParams::Request {
                request_type: RequestKind::All
            }
        );
        assert!(TriggerConfig::compile(
            TriggerType::RequestRejected,
            &raw(json!({"request_type": "vacation"}))
        )
        .is_err());
    }

    #[test]
    fn test_scope_lists_are_trimmed() {
        let config = TriggerConfig::compile(
            TriggerType::EmployeeCreated,
            &raw(json!({"department_ids": [" dept_1", "dept_2 ", ""], "role_ids": []})),
        )
        .unwrap();
        let scope = config.scope();
        assert_eq!(scope.department_ids.len(), 2);
        assert!(scope.department_ids.contains("dept_1"));
        assert!(scope.role_ids.is_empty());
        assert!(!scope.is_unrestricted());
    }

    #[test]
    fn test_legacy_fields_preserved() {
        let config = raw(json!({"days_offset": 7, "department_ids": ["d1"]}));
        assert_eq!(config.extra.get("days_offset"), Some(&json!(7)));
        let back = serde_json::to_value(&config).unwrap();
        assert_eq!(back, json!({"days_offset": 7, "department_ids": ["d1"]}));

        let compiled = TriggerConfig::compile(TriggerType::TimeBased, &config).unwrap();
        assert_eq!(compiled.params(), &TriggerParams::None);
    }

    #[test]
    fn test_from_value_rejects_wrong_types() {
        let err = TriggerConfig::from_value(
            TriggerType::XpThresholdReached,
            &json!({"xp_threshold": "lots"}),
        )
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(TriggerConfig::from_value(TriggerType::Manual, &Value::Null).is_ok());
    }
}
