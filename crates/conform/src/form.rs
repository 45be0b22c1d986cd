//! The client-side form controller.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use conform_path::{child_name, is_name_within, parse_path, Segment};
use conform_util::{KeyGenerator, RandomKeys};
use conform_value::{flatten, set_value, walk, FormValue, SetOptions};
use tracing::debug;

use crate::config::FormConfig;
use crate::context::{ContextData, FormContext};
use crate::error::ConformError;
use crate::intent::{apply_list_intent, rekey_entries, Intent};
use crate::reducer::{ErrorMap, SubmissionResult};
use crate::state::SubmissionState;
use crate::subscription::{Subscribers, Subscription, SubscriptionSubject};

/// Holds the current snapshot of a form and tells subscribers what changed.
///
/// Every operation builds a new [`FormContext`] and runs the diff engine
/// against the previous one.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use conform::{intent, Concern, Form, FormConfig, FormValue, SubscriptionScope, SubscriptionSubject};
/// use serde_json::json;
///
/// let mut form = Form::new(FormValue::from(json!({"tasks": ["a", "b"]})), FormConfig::default()).unwrap();
/// let calls = Rc::new(Cell::new(0));
/// let counter = calls.clone();
/// form.subscribe(
///     Some(SubscriptionSubject::new().watch(Concern::Key, SubscriptionScope::parents(["tasks"]))),
///     move |_| counter.set(counter.get() + 1),
/// );
///
/// let first = form.context().key("tasks[0]").map(str::to_string);
/// form.dispatch(&intent::reorder("tasks", 0, 1)).unwrap();
/// assert_eq!(calls.get(), 1);
/// assert_eq!(form.context().key("tasks[1]").map(str::to_string), first);
/// ```
pub struct Form {
    config: FormConfig,
    context: Rc<FormContext>,
    subscribers: Subscribers,
    keys: Box<dyn KeyGenerator>,
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Form")
            .field("config", &self.config)
            .field("context", &self.context)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}

/// Identity keys for every list item found in `value`.
fn initial_keys(value: &FormValue, keys: &mut dyn KeyGenerator) -> SubmissionState {
    let mut state = SubmissionState::default();
    let mut visit = |name: &str, node: &FormValue| {
        if let FormValue::Array(items) = node {
            for idx in 0..items.len() {
                state.key.insert(child_name(name, &Segment::Index(idx)), keys.next_key());
            }
        }
    };
    if let FormValue::Array(_) = value {
        visit("", value);
    }
    walk(value, "", &mut visit);
    state
}

impl Form {
    /// Create a form with random identity keys.
    ///
    /// # Errors
    ///
    /// [`ConformError::Config`] if `config` is invalid or a top-level field
    /// of `default_value` shadows a reserved name.
    pub fn new(default_value: FormValue, config: FormConfig) -> Result<Self, ConformError> {
        Self::with_key_generator(default_value, config, RandomKeys)
    }

    pub fn with_key_generator<G>(default_value: FormValue, config: FormConfig, keys: G) -> Result<Self, ConformError>
    where
        G: KeyGenerator + 'static,
    {
        config.validate()?;
        if let Some(fields) = default_value.as_object() {
            for name in fields.keys() {
                config.check_field(name)?;
            }
        }
        let mut keys: Box<dyn KeyGenerator> = Box::new(keys);
        let state = initial_keys(&default_value, keys.as_mut());
        let context = FormContext::new(ContextData {
            initial_value: default_value.clone(),
            value: default_value.clone(),
            default_value,
            error: Arc::default(),
            state: Arc::new(state),
            status: None,
        });
        Ok(Self {
            config,
            context: Rc::new(context),
            subscribers: Subscribers::new(),
            keys,
        })
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// The current snapshot. Holding it does not keep the form from moving
    /// on.
    pub fn context(&self) -> Rc<FormContext> {
        Rc::clone(&self.context)
    }

    pub fn state(&self) -> &SubmissionState {
        self.context.state()
    }

    pub fn subscribe<F>(&self, subject: Option<SubscriptionSubject>, callback: F) -> Subscription
    where
        F: FnMut(&FormContext) + 'static,
    {
        self.subscribers.subscribe(subject, callback)
    }

    fn transition(&mut self, data: ContextData) -> usize {
        let next = Rc::new(FormContext::new(data));
        let prev = std::mem::replace(&mut self.context, Rc::clone(&next));
        self.subscribers.notify(&prev, &next)
    }

    /// Apply a result produced by the server.
    ///
    /// A reset result goes back to the defaults. Otherwise the reported
    /// value becomes both the current and the initial value, and the
    /// reported errors and state replace the current ones.
    pub fn report(&mut self, result: &SubmissionResult) {
        if result.is_reset() {
            self.reset();
            return;
        }
        let value = result.initial_value.clone().unwrap_or_else(FormValue::empty_object);
        let error: ErrorMap = result.error.as_ref().map(|e| e.to_error_map()).unwrap_or_default();
        let prev = self.context.data();
        let state = match &result.state {
            Some(state) if state != prev.state.as_ref() => Arc::new(state.clone()),
            _ => Arc::clone(&prev.state),
        };
        let data = ContextData {
            default_value: prev.default_value.clone(),
            initial_value: value.clone(),
            value,
            error: Arc::new(error),
            state,
            status: Some(result.status),
        };
        let notified = self.transition(data);
        debug!(status = ?result.status, notified, "result reported");
    }

    /// Apply an intent locally, without a round trip.
    ///
    /// `validate` marks the field and everything below it validated. List
    /// intents go through the same engine as on the server, and errors
    /// follow their items.
    pub fn dispatch(&mut self, intent: &Intent) -> Result<(), ConformError> {
        let prev = self.context.data();
        let mut data = prev.clone();
        match intent {
            Intent::Validate(name) => {
                let state = Arc::make_mut(&mut data.state);
                state.mark_validated(name.as_str());
                let below = flatten(&prev.value);
                for field in below.keys().filter(|f| is_name_within(f, name)) {
                    state.mark_validated(field.as_str());
                }
            }
            Intent::List(list) => {
                let state = Arc::make_mut(&mut data.state);
                let change = apply_list_intent(&mut data.value, state, list, self.keys.as_mut())?;
                rekey_entries(Arc::make_mut(&mut data.error), list, change.len)?;
            }
        }
        let notified = self.transition(data);
        debug!(intent = %intent, notified, "intent dispatched");
        Ok(())
    }

    /// Record user input for one field.
    ///
    /// Only the nodes along `name` are copied, the rest of the value stays
    /// shared with the previous snapshot.
    pub fn update(&mut self, name: &str, value: FormValue) -> Result<(), ConformError> {
        let path = parse_path(name)?;
        let mut data = self.context.data().clone();
        set_value(&mut data.value, &path, value, SetOptions::default())?;
        self.transition(data);
        Ok(())
    }

    /// Go back to the default value with fresh identity keys and no errors.
    pub fn reset(&mut self) {
        let prev = self.context.data();
        let default_value = prev.default_value.clone();
        let state = initial_keys(&default_value, self.keys.as_mut());
        let data = ContextData {
            initial_value: default_value.clone(),
            value: default_value.clone(),
            default_value,
            error: Arc::default(),
            state: Arc::new(state),
            status: None,
        };
        self.transition(data);
    }
}
