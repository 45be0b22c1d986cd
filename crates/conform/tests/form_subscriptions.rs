use std::cell::RefCell;
use std::rc::Rc;

use conform::{
    intent, Concern, Form, FormConfig, FormContext, FormError, FormValue, SubmissionResult, SubmissionStatus,
    SubscriptionScope, SubscriptionSubject,
};
use conform_util::{SeededKeys, SequentialKeys};
use pretty_assertions::assert_eq;
use serde_json::json;

type Log = Rc<RefCell<Vec<&'static str>>>;

fn form(default: serde_json::Value) -> Form {
    Form::with_key_generator(FormValue::from(default), FormConfig::default(), SequentialKeys::new("k")).unwrap()
}

fn record(form: &Form, log: &Log, label: &'static str, subject: Option<SubscriptionSubject>) {
    let log = log.clone();
    form.subscribe(subject, move |_: &FormContext| log.borrow_mut().push(label));
}

fn watch(concern: Concern, scope: SubscriptionScope) -> Option<SubscriptionSubject> {
    Some(SubscriptionSubject::new().watch(concern, scope))
}

#[test]
fn watching_one_name_ignores_changes_elsewhere() {
    let mut form = form(json!({"name": "", "b": ""}));
    let log = Log::default();
    record(&form, &log, "name", watch(Concern::Value, SubscriptionScope::names(["name"])));
    record(&form, &log, "all", None);

    form.update("b", "x".into()).unwrap();
    assert_eq!(*log.borrow(), ["all"]);

    form.update("name", "y".into()).unwrap();
    assert_eq!(*log.borrow(), ["all", "name", "all"]);
}

#[test]
fn empty_scope_watches_everything() {
    let mut form = form(json!({"a": ""}));
    let log = Log::default();
    record(&form, &log, "errors", watch(Concern::Error, SubscriptionScope::everything()));
    form.update("a", "1".into()).unwrap();
    assert_eq!(*log.borrow(), ["errors"]);
}

#[test]
fn subscribers_run_in_subscription_order() {
    let mut form = form(json!({"a": ""}));
    let log = Log::default();
    for label in ["first", "second", "third"] {
        record(&form, &log, label, watch(Concern::Dirty, SubscriptionScope::names(["a"])));
    }
    form.update("a", "1".into()).unwrap();
    form.update("a", "2".into()).unwrap();
    assert_eq!(*log.borrow(), ["first", "second", "third"]);
}

#[test]
fn error_and_valid_subscriptions_follow_reports() {
    let mut form = form(json!({"items": [{"title": ""}], "email": ""}));
    let log = Log::default();
    record(&form, &log, "items-valid", watch(Concern::Valid, SubscriptionScope::names(["items"])));
    record(&form, &log, "email-error", watch(Concern::Error, SubscriptionScope::names(["email"])));

    let value = form.context().value().clone();
    let mut error = FormError::default();
    error.field_errors.insert("items[0].title".into(), vec!["required".into()]);
    form.report(&SubmissionResult {
        status: SubmissionStatus::Error,
        initial_value: Some(value),
        error: Some(error),
        state: None,
    });

    assert_eq!(*log.borrow(), ["items-valid"]);
    assert!(!form.context().valid("items"));
    assert!(form.context().valid("email"));
}

#[test]
fn unsubscribed_callbacks_stop() {
    let mut form = form(json!({"a": ""}));
    let log = Log::default();
    let log_clone = log.clone();
    let subscription = form.subscribe(None, move |_| log_clone.borrow_mut().push("hit"));

    form.update("a", "1".into()).unwrap();
    assert!(subscription.unsubscribe());
    form.update("a", "2".into()).unwrap();

    assert_eq!(*log.borrow(), ["hit"]);
    assert!(!subscription.unsubscribe());
}

#[test]
fn list_dispatch_notifies_key_watchers_of_that_list_only() {
    let mut form = form(json!({"items": ["a", "b"], "tags": ["x"]}));
    let log = Log::default();
    record(&form, &log, "items", watch(Concern::Key, SubscriptionScope::parents(["items"])));
    record(&form, &log, "tags", watch(Concern::Key, SubscriptionScope::parents(["tags"])));

    form.dispatch(&intent::remove("items", 0)).unwrap();

    assert_eq!(*log.borrow(), ["items"]);
    let ctx = form.context();
    assert_eq!(ctx.key("items[0]"), Some("k1"));
    assert_eq!(ctx.key("items[1]"), None);
    assert_eq!(ctx.key("tags[0]"), Some("k2"));
}

#[test]
fn snapshots_are_immutable() {
    let mut form = form(json!({"a": "1"}));
    let before = form.context();
    form.dispatch(&intent::validate("a")).unwrap();
    assert!(!before.is_validated("a"));
    assert!(form.context().is_validated("a"));
}

#[test]
fn seeded_keys_make_forms_reproducible() {
    let default = FormValue::from(json!({"items": ["a", "b"]}));
    let mut one = Form::with_key_generator(default.clone(), FormConfig::default(), SeededKeys::new(7)).unwrap();
    let mut two = Form::with_key_generator(default, FormConfig::default(), SeededKeys::new(7)).unwrap();
    one.dispatch(&intent::append("items", None)).unwrap();
    two.dispatch(&intent::append("items", None)).unwrap();
    assert_eq!(one.state(), two.state());
    assert_eq!(one.state().key.len(), 3);
}

#[test]
fn root_name_subscribers_see_form_level_changes() {
    let mut form = form(json!({"a": ""}));
    let log = Log::default();
    record(&form, &log, "valid", watch(Concern::Valid, SubscriptionScope::names([""])));
    record(&form, &log, "dirty", watch(Concern::Dirty, SubscriptionScope::names([""])));
    record(&form, &log, "value", watch(Concern::Value, SubscriptionScope::names([""])));

    form.report(&SubmissionResult {
        status: SubmissionStatus::Error,
        initial_value: Some(FormValue::from(json!({"a": ""}))),
        error: Some(FormError {
            form_errors: vec![],
            field_errors: [("a".to_string(), vec!["required".to_string()])].into_iter().collect(),
        }),
        state: None,
    });
    assert!(!form.context().valid(""));
    assert_eq!(*log.borrow(), ["valid"]);

    form.update("a", "x".into()).unwrap();
    assert!(form.context().dirty(""));
    assert_eq!(*log.borrow(), ["valid", "dirty", "value"]);
}
