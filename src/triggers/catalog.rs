//! Trigger catalog.
//!
//! The set of trigger types is fixed at compile time. Metadata lives in a
//! static table indexed by the enum discriminant, so lookups never fail.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An event category that can start a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    EmployeeCreated,
    EmployeeUpdated,
    EmployeeDeleted,
    EmployeeAddedToTeam,
    EmployeeRemovedFromTeam,
    LearningVideoStarted,
    LearningVideoCompleted,
    LearningTestCompleted,
    LearningQuizCompleted,
    XpThresholdReached,
    LevelUp,
    CoinsThresholdReached,
    AchievementUnlocked,
    BenefitPurchased,
    BenefitRedeemed,
    TaskCompleted,
    TaskOverdue,
    RequestApproved,
    RequestRejected,
    ScheduledDate,
    ScheduledCron,
    ReminderCheck,
    Manual,
    OnboardingStart,
    OffboardingStart,
    Promotion,
    TimeBased,
    EventBased,
}

/// Display grouping for trigger types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerCategory {
    Hr,
    Learning,
    Gamification,
    Shop,
    Tasks,
    Requests,
    Scheduled,
    Manual,
    Legacy,
}

impl TriggerCategory {
    pub const ALL: [TriggerCategory; 9] = [
        TriggerCategory::Hr,
        TriggerCategory::Learning,
        TriggerCategory::Gamification,
        TriggerCategory::Shop,
        TriggerCategory::Tasks,
        TriggerCategory::Requests,
        TriggerCategory::Scheduled,
        TriggerCategory::Manual,
        TriggerCategory::Legacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerCategory::Hr => "hr",
            TriggerCategory::Learning => "learning",
            TriggerCategory::Gamification => "gamification",
            TriggerCategory::Shop => "shop",
            TriggerCategory::Tasks => "tasks",
            TriggerCategory::Requests => "requests",
            TriggerCategory::Scheduled => "scheduled",
            TriggerCategory::Manual => "manual",
            TriggerCategory::Legacy => "legacy",
        }
    }
}

impl fmt::Display for TriggerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TriggerCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Parse(format!("Unknown trigger category '{}'", s)))
    }
}

/// Static metadata for one trigger type.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TriggerInfo {
    pub trigger: TriggerType,
    pub label: &'static str,
    pub category: TriggerCategory,
    pub description: &'static str,
    /// Icon identifier used by the builder UI.
    pub icon: &'static str,
    /// Color token used by the builder UI.
    pub color: &'static str,
    pub deprecated: bool,
    /// Recommended trigger for deprecated types.
    pub replacement: Option<TriggerType>,
}

const fn entry(
    trigger: TriggerType,
    label: &'static str,
    category: TriggerCategory,
    description: &'static str,
    icon: &'static str,
    color: &'static str,
) -> TriggerInfo {
    TriggerInfo {
        trigger,
        label,
        category,
        description,
        icon,
        color,
        deprecated: false,
        replacement: None,
    }
}

const fn legacy(
    trigger: TriggerType,
    label: &'static str,
    description: &'static str,
    icon: &'static str,
    replacement: Option<TriggerType>,
) -> TriggerInfo {
    TriggerInfo {
        trigger,
        label,
        category: TriggerCategory::Legacy,
        description,
        icon,
        color: "gray",
        deprecated: true,
        replacement,
    }
}

use TriggerCategory as C;
use TriggerType as T;

// Order must match the declaration order of `TriggerType`.
#[rustfmt::skip]
static CATALOG: [TriggerInfo; 28] = [
    entry(T::EmployeeCreated, "Employee created", C::Hr,
        "Fires when a new employee record is created", "user", "blue"),
    entry(T::EmployeeUpdated, "Employee updated", C::Hr,
        "Fires when employee data is changed", "user", "blue"),
    entry(T::EmployeeDeleted, "Employee deleted", C::Hr,
        "Fires when an employee record is deleted", "user", "red"),
    entry(T::EmployeeAddedToTeam, "Added to team", C::Hr,
        "Fires when an employee joins a team", "users", "purple"),
    entry(T::EmployeeRemovedFromTeam, "Removed from team", C::Hr,
        "Fires when an employee leaves a team", "users", "purple"),
    entry(T::LearningVideoStarted, "Video started", C::Learning,
        "Fires when an employee starts a learning video", "video", "green"),
    entry(T::LearningVideoCompleted, "Video completed", C::Learning,
        "Fires when an employee finishes a learning video", "video", "green"),
    entry(T::LearningTestCompleted, "Test completed", C::Learning,
        "Fires when an employee completes a test", "graduation-cap", "green"),
    entry(T::LearningQuizCompleted, "Learning unit completed", C::Learning,
        "Fires when an employee completes a learning unit", "graduation-cap", "green"),
    entry(T::XpThresholdReached, "XP threshold reached", C::Gamification,
        "Fires when an employee reaches a given XP total", "award", "amber"),
    entry(T::LevelUp, "Level up", C::Gamification,
        "Fires when an employee reaches a new level", "trophy", "amber"),
    entry(T::CoinsThresholdReached, "Coin balance reached", C::Gamification,
        "Fires when an employee reaches a given coin balance", "coins", "yellow"),
    entry(T::AchievementUnlocked, "Achievement unlocked", C::Gamification,
        "Fires when an employee unlocks an achievement", "trophy", "amber"),
    entry(T::BenefitPurchased, "Benefit purchased", C::Shop,
        "Fires when an employee buys a benefit", "shopping-cart", "pink"),
    entry(T::BenefitRedeemed, "Benefit redeemed", C::Shop,
        "Fires when an employee redeems a benefit", "gift", "pink"),
    entry(T::TaskCompleted, "Task completed", C::Tasks,
        "Fires when a task is completed", "check-square", "teal"),
    entry(T::TaskOverdue, "Task overdue", C::Tasks,
        "Fires when a task passes its due date", "check-square", "red"),
    entry(T::RequestApproved, "Request approved", C::Requests,
        "Fires when a request is approved", "file-text", "green"),
    entry(T::RequestRejected, "Request rejected", C::Requests,
        "Fires when a request is rejected", "file-text", "red"),
    entry(T::ScheduledDate, "Specific date", C::Scheduled,
        "Fires on a given date, optionally repeating", "calendar", "indigo"),
    entry(T::ScheduledCron, "Cron schedule", C::Scheduled,
        "Fires on a cron schedule", "clock", "indigo"),
    entry(T::ReminderCheck, "Periodic check", C::Scheduled,
        "Periodic check for outstanding reminders", "clock", "orange"),
    entry(T::Manual, "Manual start", C::Manual,
        "Started by hand", "user", "gray"),
    legacy(T::OnboardingStart, "[Legacy] Onboarding",
        "Deprecated: use EMPLOYEE_CREATED", "user", Some(T::EmployeeCreated)),
    legacy(T::OffboardingStart, "[Legacy] Offboarding",
        "Deprecated: use EMPLOYEE_DELETED", "user", Some(T::EmployeeDeleted)),
    legacy(T::Promotion, "[Legacy] Promotion",
        "Deprecated: use EMPLOYEE_UPDATED", "user", Some(T::EmployeeUpdated)),
    legacy(T::TimeBased, "[Legacy] Time based",
        "Deprecated: use SCHEDULED_DATE", "clock", Some(T::ScheduledDate)),
    legacy(T::EventBased, "[Legacy] Event based",
        "Deprecated: use a specific event trigger", "award", None),
];

impl TriggerType {
    /// Every trigger type, in catalog order.
    pub const ALL: [TriggerType; 28] = [
        T::EmployeeCreated,
        T::EmployeeUpdated,
        T::EmployeeDeleted,
        T::EmployeeAddedToTeam,
        T::EmployeeRemovedFromTeam,
        T::LearningVideoStarted,
        T::LearningVideoCompleted,
        T::LearningTestCompleted,
        T::LearningQuizCompleted,
        T::XpThresholdReached,
        T::LevelUp,
        T::CoinsThresholdReached,
        T::AchievementUnlocked,
        T::BenefitPurchased,
        T::BenefitRedeemed,
        T::TaskCompleted,
        T::TaskOverdue,
        T::RequestApproved,
        T::RequestRejected,
        T::ScheduledDate,
        T::ScheduledCron,
        T::ReminderCheck,
        T::Manual,
        T::OnboardingStart,
        T::OffboardingStart,
        T::Promotion,
        T::TimeBased,
        T::EventBased,
    ];

    /// Static metadata for this trigger type.
    pub fn info(self) -> &'static TriggerInfo {
        &CATALOG[self as usize]
    }

    pub fn category(self) -> TriggerCategory {
        self.info().category
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn is_deprecated(self) -> bool {
        self.info().deprecated
    }

    /// Time-driven triggers, matched against the clock by the external scheduler.
    pub fn is_scheduled(self) -> bool {
        matches!(self, T::ScheduledDate | T::ScheduledCron | T::ReminderCheck)
    }

    /// Wire identifier, e.g. `LEARNING_VIDEO_COMPLETED`.
    pub fn as_str(self) -> &'static str {
        match self {
            T::EmployeeCreated => "EMPLOYEE_CREATED",
            T::EmployeeUpdated => "EMPLOYEE_UPDATED",
            T::EmployeeDeleted => "EMPLOYEE_DELETED",
            T::EmployeeAddedToTeam => "EMPLOYEE_ADDED_TO_TEAM",
            T::EmployeeRemovedFromTeam => "EMPLOYEE_REMOVED_FROM_TEAM",
            T::LearningVideoStarted => "LEARNING_VIDEO_STARTED",
            T::LearningVideoCompleted => "LEARNING_VIDEO_COMPLETED",
            T::LearningTestCompleted => "LEARNING_TEST_COMPLETED",
            T::LearningQuizCompleted => "LEARNING_QUIZ_COMPLETED",
            T::XpThresholdReached => "XP_THRESHOLD_REACHED",
            T::LevelUp => "LEVEL_UP",
            T::CoinsThresholdReached => "COINS_THRESHOLD_REACHED",
            T::AchievementUnlocked => "ACHIEVEMENT_UNLOCKED",
            T::BenefitPurchased => "BENEFIT_PURCHASED",
            T::BenefitRedeemed => "BENEFIT_REDEEMED",
            T::TaskCompleted => "TASK_COMPLETED",
            T::TaskOverdue => "TASK_OVERDUE",
            T::RequestApproved => "REQUEST_APPROVED",
            T::RequestRejected => "REQUEST_REJECTED",
            T::ScheduledDate => "SCHEDULED_DATE",
            T::ScheduledCron => "SCHEDULED_CRON",
            T::ReminderCheck => "REMINDER_CHECK",
            T::Manual => "MANUAL",
            T::OnboardingStart => "ONBOARDING_START",
            T::OffboardingStart => "OFFBOARDING_START",
            T::Promotion => "PROMOTION",
            T::TimeBased => "TIME_BASED",
            T::EventBased => "EVENT_BASED",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        TriggerType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::Parse(format!("Unknown trigger type '{}'", s)))
    }
}

/// All catalog entries, in catalog order.
pub fn all_triggers() -> &'static [TriggerInfo] {
    &CATALOG
}

/// Catalog entries belonging to one category.
pub fn triggers_in_category(category: TriggerCategory) -> Vec<&'static TriggerInfo> {
    CATALOG.iter().filter(|i| i.category == category).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_enum() {
        for (idx, trigger) in TriggerType::ALL.iter().enumerate() {
            assert_eq!(CATALOG[idx].trigger, *trigger, "catalog slot {}", idx);
            assert_eq!(*trigger as usize, idx);
        }
    }

    #[test]
    fn test_parse_round_trip() {
        for trigger in TriggerType::ALL {
            let parsed: TriggerType = trigger.as_str().parse().unwrap();
            assert_eq!(parsed, trigger);
        }
        assert!("NOT_A_TRIGGER".parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_serde_identifier_matches_as_str() {
        let json = serde_json::to_string(&TriggerType::XpThresholdReached).unwrap();
        assert_eq!(json, "\"XP_THRESHOLD_REACHED\"");
        let back: TriggerType = serde_json::from_str("\"LEARNING_TEST_COMPLETED\"").unwrap();
        assert_eq!(back, TriggerType::LearningTestCompleted);
    }

    #[test]
    fn test_legacy_types_are_deprecated() {
        let legacy = triggers_in_category(TriggerCategory::Legacy);
        assert_eq!(legacy.len(), 5);
        assert!(legacy.iter().all(|i| i.deprecated));
        assert_eq!(
            TriggerType::OnboardingStart.info().replacement,
            Some(TriggerType::EmployeeCreated)
        );
        assert!(!TriggerType::Manual.is_deprecated());
    }

    #[test]
    fn test_scheduled_types() {
        let scheduled: Vec<_> = TriggerType::ALL
            .iter()
            .filter(|t| t.is_scheduled())
            .collect();
        assert_eq!(scheduled.len(), 3);
        assert_eq!(TriggerType::ScheduledCron.category(), TriggerCategory::Scheduled);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(
            "Gamification".parse::<TriggerCategory>().unwrap(),
            TriggerCategory::Gamification
        );
        assert!("bogus".parse::<TriggerCategory>().is_err());
    }
}
