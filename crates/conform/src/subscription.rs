//! Fine-grained change notification.
//!
//! Every context transition is compared per concern and per field name, and
//! a subscriber runs only if something it declared interest in changed.
//! Comparisons are computed on demand and cached for the transition, so
//! many subscribers watching the same names cost one comparison each.

use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use conform_path::{format_path, is_name_within, parse_path};
use conform_util::Memo;
use conform_value::{deep_equal, FormValue};
use indexmap::IndexSet;
use tracing::{trace, warn};

use crate::context::FormContext;

/// Something a subscriber can watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    Error,
    DefaultValue,
    Value,
    Key,
    Validated,
    Valid,
    Dirty,
}

impl Concern {
    pub const ALL: [Concern; 7] = [
        Concern::Error,
        Concern::DefaultValue,
        Concern::Value,
        Concern::Key,
        Concern::Validated,
        Concern::Valid,
        Concern::Dirty,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// Which names of one concern a subscriber watches.
///
/// A `parent` matches itself and everything below it, a `name` matches
/// exactly. A scope with neither watches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionScope {
    pub parent: Vec<String>,
    pub name: Vec<String>,
}

impl SubscriptionScope {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent: Vec::new(),
            name: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parents<I, S>(parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parent: parents.into_iter().map(Into::into).collect(),
            name: Vec::new(),
        }
    }

    pub fn is_everything(&self) -> bool {
        self.parent.is_empty() && self.name.is_empty()
    }

    pub fn matches(&self, name: &str) -> bool {
        self.is_everything()
            || self.name.iter().any(|n| n == name)
            || self.parent.iter().any(|p| is_name_within(name, p))
    }
}

/// The concerns a subscriber declares, each with its own scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSubject {
    scopes: [Option<SubscriptionScope>; 7],
}

impl SubscriptionSubject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `concern` within `scope`.
    ///
    /// ```
    /// use conform::{Concern, SubscriptionScope, SubscriptionSubject};
    ///
    /// let subject = SubscriptionSubject::new()
    ///     .watch(Concern::Value, SubscriptionScope::names(["email"]))
    ///     .watch(Concern::Error, SubscriptionScope::parents(["items"]));
    /// assert!(subject.scope(Concern::Value).is_some());
    /// assert!(subject.scope(Concern::Dirty).is_none());
    /// ```
    pub fn watch(mut self, concern: Concern, scope: SubscriptionScope) -> Self {
        self.scopes[concern.slot()] = Some(scope);
        self
    }

    pub fn scope(&self, concern: Concern) -> Option<&SubscriptionScope> {
        self.scopes[concern.slot()].as_ref()
    }

    pub fn concerns(&self) -> impl Iterator<Item = (Concern, &SubscriptionScope)> {
        Concern::ALL
            .into_iter()
            .filter_map(|concern| self.scope(concern).map(|scope| (concern, scope)))
    }
}

/// A pair of snapshots being compared.
pub struct Transition<'a> {
    prev: &'a FormContext,
    next: &'a FormContext,
    candidates: [OnceCell<Vec<String>>; 7],
    changed: [Memo<String, bool>; 7],
}

fn union<'b>(a: impl Iterator<Item = &'b String>, b: impl Iterator<Item = &'b String>) -> Vec<String> {
    let set: IndexSet<&String> = a.chain(b).collect();
    set.into_iter().cloned().collect()
}

/// Put the root name `""` first unless `names` already holds it.
fn with_root(mut names: Vec<String>) -> Vec<String> {
    if !names.iter().any(String::is_empty) {
        names.insert(0, String::new());
    }
    names
}

/// `name` and every name above it, the root excluded.
fn with_ancestors(name: &str, out: &mut IndexSet<String>) {
    let Ok(path) = parse_path(name) else {
        out.insert(name.to_string());
        return;
    };
    for depth in 1..=path.len() {
        out.insert(format_path(&path[..depth]));
    }
    out.insert(name.to_string());
}

impl<'a> Transition<'a> {
    pub fn new(prev: &'a FormContext, next: &'a FormContext) -> Self {
        Self {
            prev,
            next,
            candidates: Default::default(),
            changed: Default::default(),
        }
    }

    /// Names whose `concern` may differ between the two snapshots.
    pub fn candidates(&self, concern: Concern) -> &[String] {
        self.candidates[concern.slot()].get_or_init(|| self.collect_candidates(concern))
    }

    fn collect_candidates(&self, concern: Concern) -> Vec<String> {
        let (prev, next) = (self.prev.data(), self.next.data());
        match concern {
            Concern::Error | Concern::Valid if Arc::ptr_eq(&prev.error, &next.error) => Vec::new(),
            Concern::Key | Concern::Validated if Arc::ptr_eq(&prev.state, &next.state) => Vec::new(),
            Concern::Value if prev.value.ptr_eq(&next.value) => Vec::new(),
            Concern::DefaultValue if prev.default_value.ptr_eq(&next.default_value) => Vec::new(),
            Concern::Error => union(prev.error.keys(), next.error.keys()),
            Concern::Valid => {
                let mut names = IndexSet::new();
                for name in prev.error.keys().chain(next.error.keys()) {
                    names.insert(String::new());
                    with_ancestors(name, &mut names);
                }
                names.into_iter().collect()
            }
            Concern::Key => union(prev.state.key.keys(), next.state.key.keys()),
            Concern::Validated => union(prev.state.validated.keys(), next.state.validated.keys()),
            Concern::Value => with_root(union(self.prev.flat_value().keys(), self.next.flat_value().keys())),
            Concern::DefaultValue => with_root(union(
                self.prev.flat_default().keys(),
                self.next.flat_default().keys(),
            )),
            Concern::Dirty => {
                if prev.value.ptr_eq(&next.value) && prev.default_value.ptr_eq(&next.default_value) {
                    return Vec::new();
                }
                with_root(union(
                    self.prev.flat_value().keys().chain(self.prev.flat_default().keys()),
                    self.next.flat_value().keys().chain(self.next.flat_default().keys()),
                ))
            }
        }
    }

    /// Whether `concern` at `name` differs, computed once per name.
    pub fn changed(&self, concern: Concern, name: &str) -> bool {
        self.changed[concern.slot()].get_or_insert_with(name.to_string(), || {
            let (prev, next) = (self.prev, self.next);
            match concern {
                Concern::Error => prev.error(name) != next.error(name),
                Concern::DefaultValue => !same(prev.default_value_at(name), next.default_value_at(name)),
                Concern::Value => !same(prev.value_at(name), next.value_at(name)),
                Concern::Key => prev.key(name) != next.key(name),
                Concern::Validated => prev.is_validated(name) != next.is_validated(name),
                Concern::Valid => prev.valid(name) != next.valid(name),
                Concern::Dirty => prev.dirty(name) != next.dirty(name),
            }
        })
    }

    /// Whether a subscriber with this subject should run. No subject means
    /// every transition.
    pub fn affects(&self, subject: Option<&SubscriptionSubject>) -> bool {
        let Some(subject) = subject else {
            return true;
        };
        subject.concerns().any(|(concern, scope)| {
            scope.is_everything()
                || self
                    .candidates(concern)
                    .iter()
                    .any(|name| scope.matches(name) && self.changed(concern, name))
        })
    }
}

fn same(a: Option<&FormValue>, b: Option<&FormValue>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => deep_equal(a, b),
        (None, None) => true,
        _ => false,
    }
}

type Callback = Box<dyn FnMut(&FormContext)>;

struct Subscriber {
    id: u64,
    subject: Option<SubscriptionSubject>,
    active: Cell<bool>,
    callback: RefCell<Callback>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Rc<Subscriber>>,
}

/// The subscriber list of one form.
#[derive(Clone, Default)]
pub struct Subscribers {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers").field("len", &self.len()).finish()
    }
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`. `None` as subject means every transition.
    pub fn subscribe<F>(&self, subject: Option<SubscriptionSubject>, callback: F) -> Subscription
    where
        F: FnMut(&FormContext) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id = registry.next_id.saturating_add(1);
        registry.entries.push(Rc::new(Subscriber {
            id,
            subject,
            active: Cell::new(true),
            callback: RefCell::new(Box::new(callback)),
        }));
        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every affected subscriber, in subscription order, with `next`.
    ///
    /// The list is fixed when notification starts: subscribers added by a
    /// callback wait for the next transition, subscribers removed by a
    /// callback are skipped. Returns how many callbacks ran.
    pub fn notify(&self, prev: &FormContext, next: &FormContext) -> usize {
        let snapshot: Vec<Rc<Subscriber>> = self.registry.borrow().entries.clone();
        let transition = Transition::new(prev, next);
        let mut notified = 0;
        for subscriber in snapshot {
            if !subscriber.active.get() || !transition.affects(subscriber.subject.as_ref()) {
                continue;
            }
            match subscriber.callback.try_borrow_mut() {
                Ok(mut callback) => {
                    (*callback)(next);
                    notified += 1;
                }
                Err(_) => warn!(id = subscriber.id, "subscriber is already running, skipped"),
            }
        }
        trace!(notified, "transition delivered");
        notified
    }
}

/// Handle returned by [`Subscribers::subscribe`].
///
/// Dropping the handle keeps the subscription; call
/// [`Subscription::unsubscribe`] to end it.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.borrow().entries.iter().any(|s| s.id == self.id))
    }

    /// Remove the subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.borrow_mut();
        match registry.entries.iter().position(|s| s.id == self.id) {
            Some(at) => {
                let subscriber = registry.entries.remove(at);
                subscriber.active.set(false);
                true
            }
            None => false,
        }
    }
}
