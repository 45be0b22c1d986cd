//! Parse, dispatch and validate a submission in one step.

use std::future::Future;

use conform_util::{KeyGenerator, RandomKeys};
use conform_value::FormValue;
use tracing::debug;

use crate::config::FormConfig;
use crate::error::ConformError;
use crate::form_data::FormData;
use crate::intent::{get_intent_handler, Dispatch, Intent, ListChange};
use crate::reducer::{
    accept_submission, reject_submission, AcceptOptions, FormError, RejectOptions, SubmissionContext,
    SubmissionResult,
};
use crate::state::SubmissionState;
use crate::submission::{parse_submission, ParseOptions, Submission};

/// What a validator made of a payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub error: Option<FormError>,
    /// The validated, possibly coerced, value.
    pub value: Option<FormValue>,
}

impl Resolution {
    pub fn valid(value: FormValue) -> Self {
        Self {
            error: None,
            value: Some(value),
        }
    }

    pub fn invalid(error: FormError) -> Self {
        Self {
            error: Some(error),
            value: None,
        }
    }
}

/// A schema adapter.
pub trait Resolver {
    fn resolve(&self, payload: &FormValue) -> Resolution;
}

impl<F> Resolver for F
where
    F: Fn(&FormValue) -> Resolution,
{
    fn resolve(&self, payload: &FormValue) -> Resolution {
        self(payload)
    }
}

/// A submission whose intent has been applied and that waits for its
/// resolution.
#[derive(Debug)]
struct Prepared {
    submission: Submission,
    dispatch: Dispatch,
    payload: FormValue,
    state: SubmissionState,
    collapse_leaf_arrays: bool,
}

fn prepare(
    form_data: &FormData,
    config: &FormConfig,
    keys: &mut dyn KeyGenerator,
) -> Result<Prepared, ConformError> {
    config.validate()?;
    let submission = parse_submission(form_data, &ParseOptions::from_config(config))?;
    let dispatch = get_intent_handler(submission.intent.as_deref())?;

    let mut payload = submission.payload.clone();
    let mut state = submission.state.clone();
    let change: Option<ListChange> = dispatch.apply_structure(&mut payload, &mut state, keys)?;
    debug!(
        fields = submission.fields.len(),
        intent = submission.intent.as_deref().unwrap_or(""),
        list_change = ?change,
        "submission prepared"
    );

    Ok(Prepared {
        submission,
        dispatch,
        payload,
        state,
        collapse_leaf_arrays: config.collapse_leaf_arrays,
    })
}

impl Prepared {
    fn finish(mut self, resolution: Resolution) -> SubmissionOutcome {
        let error_names: Vec<&str> = resolution
            .error
            .as_ref()
            .map(|error| error.names().collect())
            .unwrap_or_default();
        self.dispatch
            .update_validated(&mut self.state, &self.submission.fields, error_names);

        SubmissionOutcome {
            submission: self.submission,
            intent: self.dispatch.intent().cloned(),
            payload: self.payload,
            state: self.state,
            resolution,
            collapse_leaf_arrays: self.collapse_leaf_arrays,
        }
    }
}

/// A fully processed submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    submission: Submission,
    intent: Option<Intent>,
    payload: FormValue,
    state: SubmissionState,
    resolution: Resolution,
    collapse_leaf_arrays: bool,
}

impl SubmissionOutcome {
    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    /// Payload after the intent's structural change, if any.
    pub fn payload(&self) -> &FormValue {
        &self.payload
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn error(&self) -> Option<&FormError> {
        self.resolution.error.as_ref().filter(|error| !error.is_empty())
    }

    /// The validated value of an ordinary submission that passed. Intents
    /// never produce one, the form is still being edited.
    pub fn value(&self) -> Option<&FormValue> {
        if self.intent.is_some() || self.error().is_some() {
            return None;
        }
        self.resolution.value.as_ref()
    }

    /// Whether the submission is ready to be acted on.
    pub fn is_ready(&self) -> bool {
        self.value().is_some()
    }

    pub fn context(&self) -> SubmissionContext {
        SubmissionContext {
            intent: self.intent.clone(),
            initial_value: self.payload.clone(),
            error: self.error().map(FormError::to_error_map).unwrap_or_default(),
            state: self.state.clone(),
            collapse_leaf_arrays: self.collapse_leaf_arrays,
        }
    }

    pub fn accept(&self, options: AcceptOptions) -> SubmissionResult {
        accept_submission(&self.context(), options)
    }

    pub fn reject(&self, options: RejectOptions) -> SubmissionResult {
        reject_submission(&self.context(), options)
    }

    /// Reject when the submission carried an intent or failed validation,
    /// accept otherwise.
    pub fn reply(&self) -> SubmissionResult {
        if self.intent.is_some() || self.error().is_some() {
            self.reject(RejectOptions::default())
        } else {
            self.accept(AcceptOptions::default())
        }
    }
}

/// [`parse_with`] using the default configuration and random identity keys.
///
/// ```
/// use conform::{parse, FormData, FormError, FormValue, Resolution, SubmissionStatus};
///
/// let data = FormData::from_urlencoded("email=");
/// let outcome = parse(&data, |payload: &FormValue| {
///     match payload.as_object().and_then(|o| o.get("email")).and_then(|v| v.as_str()) {
///         Some(email) if !email.is_empty() => Resolution::valid(payload.clone()),
///         _ => {
///             let mut error = FormError::default();
///             error.field_errors.insert("email".into(), vec!["required".into()]);
///             Resolution::invalid(error)
///         }
///     }
/// })
/// .unwrap();
///
/// let result = outcome.reply();
/// assert_eq!(result.status, SubmissionStatus::Error);
/// assert!(outcome.state().is_validated("email"));
/// ```
pub fn parse<R: Resolver>(form_data: &FormData, resolver: R) -> Result<SubmissionOutcome, ConformError> {
    parse_with(form_data, &FormConfig::default(), resolver, &mut RandomKeys)
}

/// Parse `form_data`, apply its intent, validate the resulting payload and
/// update the submission state.
///
/// # Errors
///
/// Any fatal error of [`parse_submission`], [`get_intent_handler`] or the
/// list engine, and [`ConformError::Config`] for an invalid `config`.
pub fn parse_with<R: Resolver>(
    form_data: &FormData,
    config: &FormConfig,
    resolver: R,
    keys: &mut dyn KeyGenerator,
) -> Result<SubmissionOutcome, ConformError> {
    let prepared = prepare(form_data, config, keys)?;
    let resolution = resolver.resolve(&prepared.payload);
    Ok(prepared.finish(resolution))
}

/// Like [`parse_with`], for a validator that resolves asynchronously.
///
/// Parsing and the intent's structural change happen before this returns;
/// only the resolution is awaited. Overlapping calls are independent, the
/// caller decides which outcome to keep.
pub fn parse_async<F, Fut>(
    form_data: &FormData,
    config: &FormConfig,
    resolve: F,
    keys: &mut dyn KeyGenerator,
) -> Result<impl Future<Output = SubmissionOutcome>, ConformError>
where
    F: FnOnce(FormValue) -> Fut,
    Fut: Future<Output = Resolution>,
{
    let prepared = prepare(form_data, config, keys)?;
    let pending = resolve(prepared.payload.clone());
    Ok(async move {
        let resolution = pending.await;
        prepared.finish(resolution)
    })
}
