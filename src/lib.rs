//! hrflow - trigger catalog, filter matching and dispatch for HR workflow
//! automation.
//!
//! Workflows are authored in a visual builder as a graph of one trigger
//! node and several action nodes. This crate covers the trigger side:
//!
//! - **Catalog**: the fixed set of trigger types with display metadata
//! - **Matching**: whether an event context admits a trigger configuration
//! - **Dispatch**: forwarding events to the external execution engine,
//!   never failing the caller that raised the event
//! - **Workflows**: parsing, structural validation and graph previews
//!
//! ## Example
//!
//! ```
//! use hrflow::triggers::{matches, EventContext, RawTriggerConfig, TriggerConfig, TriggerType};
//!
//! let raw = RawTriggerConfig {
//!     min_score: Some(80),
//!     ..Default::default()
//! };
//! let config = TriggerConfig::compile(TriggerType::LearningTestCompleted, &raw).unwrap();
//!
//! let event = EventContext::for_user("u1").with_score(80.0);
//! assert!(matches(TriggerType::LearningTestCompleted, &config, &event));
//! ```

pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod triggers;
pub mod workflow;

pub use error::{Error, Result};
