//! Form submissions as structured data.
//!
//! A browser submits a flat list of `name=value` pairs. This crate turns that
//! list into a nested value using the field names as paths, decodes the
//! optional intent a submission carries (validate one field, add or move a
//! list item), applies it while keeping per-item identity and validation
//! state attached to the right item, and reduces the outcome to the result
//! sent back to the form. On the client side, [`Form`] holds immutable
//! snapshots and notifies subscribers only about the names they watch.
//!
//! # Example
//!
//! ```
//! use conform::{intent, parse_with, FormConfig, FormData, FormValue, Resolution, SubmissionStatus};
//! use conform_util::SequentialKeys;
//! use serde_json::json;
//!
//! let mut data = FormData::from_urlencoded("items%5B0%5D=first");
//! data.append("__intent__", intent::insert("items", Some("".into()), Some(0)).serialize());
//!
//! let outcome = parse_with(
//!     &data,
//!     &FormConfig::default(),
//!     |payload: &FormValue| Resolution::valid(payload.clone()),
//!     &mut SequentialKeys::new("k"),
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.payload().to_json(), json!({"items": ["", "first"]}));
//! let result = outcome.reply();
//! assert_eq!(result.status, SubmissionStatus::Updated);
//! assert_eq!(result.state.unwrap().key["items[0]"], "k0");
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod form_data;
pub mod intent;
pub mod parse;
pub mod reducer;
pub mod simplify;
pub mod state;
pub mod submission;
pub mod subscription;

pub use config::{ConfigError, FormConfig, DEFAULT_INTENT_NAME, DEFAULT_STATE_NAME};
pub use context::{ContextData, FormContext};
pub use error::ConformError;
pub use form::Form;
pub use form_data::{FormData, FormDataEntry};
pub use intent::{get_intent_handler, Dispatch, Intent, IntentKind, ListIntent, ListOperation};
pub use parse::{parse, parse_async, parse_with, Resolution, Resolver, SubmissionOutcome};
pub use reducer::{
    accept_submission, reject_submission, AcceptOptions, ErrorMap, FormError, RejectOptions, SubmissionContext,
    SubmissionResult, SubmissionStatus,
};
pub use simplify::{collapse_leaf_arrays, simplify, simplify_errors};
pub use state::SubmissionState;
pub use submission::{parse_submission, ParseOptions, Submission};
pub use subscription::{Concern, Subscribers, Subscription, SubscriptionScope, SubscriptionSubject, Transition};

pub use conform_path::{format_path, parse_path, Path, PathError, Segment};
pub use conform_value::{FileEntry, FormValue};
