//! Event context passed to the matcher and the dispatch client.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The fact payload describing a single occurrence of a trigger-worthy event.
///
/// Fields the matcher understands are typed; anything else the caller sends
/// along (titles, names, timestamps) is kept in `extra` and forwarded to the
/// execution engine untouched.
///
/// ```
/// use hrflow::triggers::EventContext;
///
/// let event = EventContext::for_user("user-1")
///     .with_department("dept-sales")
///     .with_score(85.0);
/// assert_eq!(event.department_id.as_deref(), Some("dept-sales"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    // Scoping attributes of the affected user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,

    // Entity identities
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
    /// `leave`, `document` or `expense` for request events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,

    // Numeric facts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a context for the user the event is about.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_department(mut self, id: impl Into<String>) -> Self {
        self.department_id = Some(id.into());
        self
    }

    pub fn with_location(mut self, id: impl Into<String>) -> Self {
        self.location_id = Some(id.into());
        self
    }

    pub fn with_role(mut self, id: impl Into<String>) -> Self {
        self.role_id = Some(id.into());
        self
    }

    pub fn with_team(mut self, id: impl Into<String>) -> Self {
        self.team_id = Some(id.into());
        self
    }

    pub fn with_video(mut self, id: impl Into<String>) -> Self {
        self.video_id = Some(id.into());
        self
    }

    pub fn with_test(mut self, id: impl Into<String>) -> Self {
        self.test_id = Some(id.into());
        self
    }

    pub fn with_quiz(mut self, id: impl Into<String>) -> Self {
        self.quiz_id = Some(id.into());
        self
    }

    pub fn with_benefit(mut self, id: impl Into<String>) -> Self {
        self.benefit_id = Some(id.into());
        self
    }

    pub fn with_task(mut self, id: impl Into<String>) -> Self {
        self.task_id = Some(id.into());
        self
    }

    pub fn with_achievement(mut self, id: impl Into<String>) -> Self {
        self.achievement_id = Some(id.into());
        self
    }

    pub fn with_request_type(mut self, kind: impl Into<String>) -> Self {
        self.request_type = Some(kind.into());
        self
    }

    pub fn with_xp(mut self, xp: i64) -> Self {
        self.xp = Some(xp);
        self
    }

    pub fn with_coins(mut self, coins: i64) -> Self {
        self.coins = Some(coins);
        self
    }

    pub fn with_level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Attach an extra field that is forwarded but not matched on.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
