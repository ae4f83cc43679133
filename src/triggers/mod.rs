//! Trigger catalog, configuration and matching.
//!
//! - Catalog: the fixed set of trigger types and their display metadata
//! - Config: the persisted per-trigger configuration and its validated form
//! - Event: the context describing one occurrence of an event
//! - Matcher: decides whether an event is admitted by a configuration

mod catalog;
mod config;
mod event;
mod matcher;

pub use catalog::{all_triggers, triggers_in_category, TriggerCategory, TriggerInfo, TriggerType};
pub use config::{
    validate_cron_expression, CheckType, RawTriggerConfig, Repeat, RequestKind, ScopeDimension,
    ScopeFilter, TriggerConfig, TriggerParams,
};
pub use event::EventContext;
pub use matcher::{evaluate, matches, Rejection};
