//! Core logic of the `conform-parse` binary.

use serde_json::{json, Value};

use crate::config::FormConfig;
use crate::error::ConformError;
use crate::form_data::FormData;
use crate::intent::get_intent_handler;
use crate::submission::{parse_submission, ParseOptions};

/// Parse an `application/x-www-form-urlencoded` body and describe the
/// submission as JSON.
///
/// The intent, if any, is decoded too, so a body carrying an intent no
/// registered kind accepts fails here rather than downstream.
///
/// ```
/// use conform::{cli::parse_urlencoded, FormConfig};
/// use serde_json::json;
///
/// let out = parse_urlencoded("task%5B0%5D=x&task%5B1%5D.stage%5B0%5D=y", &FormConfig::default()).unwrap();
/// assert_eq!(out["payload"], json!({"task": ["x", {"stage": ["y"]}]}));
/// assert_eq!(out["fields"], json!(["task[0]", "task[1].stage[0]"]));
/// assert_eq!(out["intent"], json!(null));
/// ```
pub fn parse_urlencoded(body: &str, config: &FormConfig) -> Result<Value, ConformError> {
    config.validate()?;
    let data = FormData::from_urlencoded(body.trim());
    let submission = parse_submission(&data, &ParseOptions::from_config(config))?;
    get_intent_handler(submission.intent.as_deref())?;
    Ok(json!({
        "payload": submission.payload.to_json(),
        "fields": submission.fields,
        "intent": submission.intent,
        "state": submission.state,
    }))
}
