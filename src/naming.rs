//! Field-naming formulas for generated association fields.
//!
//! Every generated field name comes from a formula over the association
//! name, the singular item name, and the opposing type's display name.
//! Callers may override any formula per side; unset slots fall back to the
//! defaults below.

use std::fmt;
use std::sync::Arc;

use crate::config::ActorKind;

/// Naming formula: `(name, item_name, opposing_type_name) -> field name`.
pub type NamingFn = Arc<dyn Fn(&str, &str, &str) -> String + Send + Sync>;

/// The four kinds of generated association fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Element,
    SingleCheck,
    MultiCheck,
    MultiCheckAll,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::Element => "element",
            FieldKind::SingleCheck => "singleCheck",
            FieldKind::MultiCheck => "multiCheck",
            FieldKind::MultiCheckAll => "multiCheckAll",
        })
    }
}

/// Caller-supplied formula overrides for one side of an association.
#[derive(Default, Clone)]
pub struct NamingOverrides {
    pub(crate) element: Option<NamingFn>,
    pub(crate) single_check: Option<NamingFn>,
    pub(crate) multi_check: Option<NamingFn>,
    pub(crate) multi_check_all: Option<NamingFn>,
}

impl NamingOverrides {
    pub(crate) fn set(&mut self, kind: FieldKind, formula: NamingFn) {
        match kind {
            FieldKind::Element => self.element = Some(formula),
            FieldKind::SingleCheck => self.single_check = Some(formula),
            FieldKind::MultiCheck => self.multi_check = Some(formula),
            FieldKind::MultiCheckAll => self.multi_check_all = Some(formula),
        }
    }
}

/// Fully populated naming table for one side, overrides merged over the
/// side's defaults.
#[derive(Clone)]
pub(crate) struct NamingTable {
    element: NamingFn,
    single_check: NamingFn,
    multi_check: NamingFn,
    multi_check_all: NamingFn,
}

impl NamingTable {
    pub(crate) fn for_side(side: ActorKind, overrides: NamingOverrides) -> Self {
        let defaults = match side {
            ActorKind::Parent => Self::parent_defaults(),
            ActorKind::Child => Self::child_defaults(),
        };

        Self {
            element: overrides.element.unwrap_or(defaults.element),
            single_check: overrides.single_check.unwrap_or(defaults.single_check),
            multi_check: overrides.multi_check.unwrap_or(defaults.multi_check),
            multi_check_all: overrides.multi_check_all.unwrap_or(defaults.multi_check_all),
        }
    }

    fn parent_defaults() -> Self {
        Self {
            element: Arc::new(|name, _, _| name.to_string()),
            single_check: Arc::new(|_, item_name, _| format!("has{}", capitalize(item_name))),
            multi_check: Arc::new(|name, _, _| format!("has{}", capitalize(name))),
            multi_check_all: Arc::new(|name, _, _| format!("hasAll{}", capitalize(name))),
        }
    }

    fn child_defaults() -> Self {
        Self {
            element: Arc::new(|_, item_name, parent_name| {
                format!("{item_name}Of{}", capitalize(parent_name))
            }),
            single_check: Arc::new(|_, item_name, parent_name| {
                format!("is{}Of{}", capitalize(item_name), capitalize(parent_name))
            }),
            multi_check: Arc::new(|_, item_name, parent_name| {
                format!("is{}Of{}s", capitalize(item_name), capitalize(parent_name))
            }),
            multi_check_all: Arc::new(|_, item_name, parent_name| {
                format!("is{}OfAll{}s", capitalize(item_name), capitalize(parent_name))
            }),
        }
    }

    /// Resolve one field name from the table.
    pub(crate) fn resolve(
        &self,
        kind: FieldKind,
        name: &str,
        item_name: &str,
        opposing_name: &str,
    ) -> String {
        let formula = match kind {
            FieldKind::Element => &self.element,
            FieldKind::SingleCheck => &self.single_check,
            FieldKind::MultiCheck => &self.multi_check,
            FieldKind::MultiCheckAll => &self.multi_check_all,
        };

        formula(name, item_name, opposing_name)
    }
}

/// Uppercase the first character, leaving the rest untouched.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
