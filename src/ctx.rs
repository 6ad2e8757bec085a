//! Ambient, path-scoped context handed from each field to its children.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::field::ChangeKind;
use crate::options::{Auto, FieldOptions, I18n};
use crate::path::{Path, PathSegment};
use crate::required::{RequiredPolicy, RequiredQuery};
use crate::resolver::Registry;
use crate::template::Templates;
use crate::transformer::Transformers;
use crate::types::Type;
use crate::uid::UidGenerator;

/// Where a field currently sits. The field holds the only strong handle;
/// queued notifications hold weak ones, so they follow the field through
/// moves and go dead once it is dropped.
pub type Anchor = Rc<RefCell<Path>>;

/// A notification a field wants delivered on a later turn.
#[derive(Debug, Clone)]
pub struct Pending {
    pub target: Weak<RefCell<Path>>,
    pub kind: ChangeKind,
}

impl Pending {
    /// The target's address now, or `None` if it no longer exists.
    pub fn target_path(&self) -> Option<Path> { self.target.upgrade().map(|p| p.borrow().clone()) }
}

/// Outbound messages waiting for the host's next turn.
#[derive(Debug, Default)]
pub struct Scheduler {
    queue: RefCell<VecDeque<Pending>>,
}

impl Scheduler {
    pub fn schedule(&self, pending: Pending) { self.queue.borrow_mut().push_back(pending); }

    /// Everything queued so far; later arrivals wait for the next drain.
    pub fn drain(&self) -> Vec<Pending> { self.queue.borrow_mut().drain(..).collect() }

    pub fn len(&self) -> usize { self.queue.borrow().len() }

    pub fn is_empty(&self) -> bool { self.queue.borrow().is_empty() }
}

#[derive(Clone)]
pub struct Ctx {
    pub auto: Auto,
    /// Default label offered by the parent (humanised prop name, item number).
    pub label: Option<String>,
    pub i18n: Rc<I18n>,
    pub templates: Rc<Templates>,
    pub registry: Rc<Registry>,
    pub transformers: Rc<Transformers>,
    pub uid_generator: Rc<UidGenerator>,
    pub stylesheet: Rc<Value>,
    pub config: Rc<Value>,
    pub path: Path,
    /// Host value handed to type message hooks.
    pub context: Option<Rc<Value>>,
    /// Names of required props, consulted by [`RequiredRule::ContextList`](crate::required::RequiredRule).
    pub required: Option<Rc<[String]>>,
    pub original_schema: Option<Rc<Value>>,
    pub required_policy: Rc<RequiredPolicy>,
    pub(crate) scheduler: Weak<Scheduler>,
}

impl Ctx {
    /// Context for a child at `segment`. The parent's own options may
    /// override what descendants inherit.
    pub fn child(&self, segment: impl Into<PathSegment>, label: Option<String>, parent_options: &FieldOptions) -> Ctx {
        Ctx {
            auto: parent_options.auto.unwrap_or(self.auto),
            label,
            i18n: parent_options.i18n.clone().map(Rc::new).unwrap_or_else(|| self.i18n.clone()),
            templates: self.templates.clone(),
            registry: self.registry.clone(),
            transformers: self.transformers.clone(),
            uid_generator: self.uid_generator.clone(),
            stylesheet: parent_options.stylesheet.clone().map(Rc::new).unwrap_or_else(|| self.stylesheet.clone()),
            config: parent_options.config.clone().map(Rc::new).unwrap_or_else(|| self.config.clone()),
            path: self.path.join(segment),
            context: self.context.clone(),
            required: self.required.clone(),
            original_schema: self.original_schema.clone(),
            required_policy: self.required_policy.clone(),
            scheduler: self.scheduler.clone(),
        }
    }

    pub fn is_required(&self, ty: &Type) -> bool {
        self.required_policy.is_required(RequiredQuery {
            ty,
            path: &self.path,
            required: self.required.as_deref(),
            schema: self.original_schema.as_deref(),
        })
    }

    /// List items are addressed by position; they never get a required or
    /// optional suffix on their label.
    pub fn is_list_item(&self) -> bool { self.path.last().is_some_and(PathSegment::is_index) }

    /// Queue a notification for the node behind `anchor`; a no-op once the
    /// form is gone.
    pub fn schedule(&self, anchor: &Anchor, kind: ChangeKind) {
        match self.scheduler.upgrade() {
            Some(s) => s.schedule(Pending { target: Rc::downgrade(anchor), kind }),
            None => tracing::debug!(path = %self.path, "form dropped; deferred notification discarded"),
        }
    }
}

/// `firstName` / `first_name` → `First name`.
pub fn humanize(name: &str) -> String {
    let mut words = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for c in name.chars() {
        if c == '_' || c == '-' {
            words.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower {
            words.push(' ');
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        words.extend(c.to_lowercase());
    }
    let words = words.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn humanizes_prop_names() {
        assert_eq!(humanize("firstName"), "First name");
        assert_eq!(humanize("first_name"), "First name");
        assert_eq!(humanize("zipCode2"), "Zip code2");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn drain_takes_only_what_is_queued() {
        let s = Scheduler::default();
        let anchor: Anchor = Rc::new(RefCell::new(Path::root()));
        s.schedule(Pending { target: Rc::downgrade(&anchor), kind: ChangeKind::ValidationStateChange });
        assert_eq!(s.len(), 1);
        let drained = s.drain();
        assert_eq!(drained.len(), 1);
        assert!(s.is_empty());
    }

    #[test]
    fn pending_targets_follow_their_anchor() {
        let anchor: Anchor = Rc::new(RefCell::new(Path::root().join(1usize)));
        let pending = Pending { target: Rc::downgrade(&anchor), kind: ChangeKind::ValidationStateChange };
        *anchor.borrow_mut() = Path::root().join(0usize);
        assert_eq!(pending.target_path(), Some(Path::root().join(0usize)));
        drop(anchor);
        assert_eq!(pending.target_path(), None);
    }
}
