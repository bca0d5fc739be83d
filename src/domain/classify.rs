//! Method-name classification and loggable-parameter selection.
//!
//! Classification is an ordered list of (predicate, class) rules evaluated
//! top to bottom, first match wins. The substring rule is listed before the
//! prefix rules on purpose: `find_most_expensive_product` must classify as
//! SPECIAL even though it also starts with `find`.

use syn::{FnArg, Pat, Signature, Type};

use crate::domain::conventions::{is_id_like, LOGGABLE_TYPES};

/// Action classes a method name can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionClass {
    Read,
    Write,
    Special,
}

impl ActionClass {
    /// Action name carried in the synthesized statement.
    pub fn action(&self) -> &'static str {
        match self {
            ActionClass::Read => "READ",
            ActionClass::Write => "WRITE",
            ActionClass::Special => "SPECIAL",
        }
    }

    /// Event tag carried in the synthesized statement.
    pub fn event(&self) -> &'static str {
        match self {
            ActionClass::Read => "db-read",
            ActionClass::Write => "db-write",
            ActionClass::Special => "expensive-search",
        }
    }
}

/// One classification rule over the normalized method name.
enum Rule {
    Contains(&'static str, ActionClass),
    Prefix(&'static str, ActionClass),
}

impl Rule {
    fn matches(&self, normalized: &str) -> Option<ActionClass> {
        match self {
            Rule::Contains(needle, class) if normalized.contains(needle) => Some(*class),
            Rule::Prefix(prefix, class) if normalized.starts_with(prefix) => Some(*class),
            _ => None,
        }
    }
}

/// Ordered rule table. Order is load-bearing.
const RULES: &[Rule] = &[
    Rule::Contains("mostexpensive", ActionClass::Special),
    Rule::Prefix("get", ActionClass::Read),
    Rule::Prefix("find", ActionClass::Read),
    Rule::Prefix("list", ActionClass::Read),
    Rule::Prefix("create", ActionClass::Write),
    Rule::Prefix("add", ActionClass::Write),
    Rule::Prefix("save", ActionClass::Write),
    Rule::Prefix("update", ActionClass::Write),
    Rule::Prefix("delete", ActionClass::Write),
    Rule::Prefix("remove", ActionClass::Write),
];

/// Lower-case and strip underscores so `getOrderById` and `get_order_by_id`
/// normalize to the same key.
fn normalize(method_name: &str) -> String {
    method_name
        .chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Classify a method by its simple name. Unmatched names fall back to READ;
/// this is the documented default, not an UNKNOWN bucket.
pub fn classify(method_name: &str) -> ActionClass {
    let n = normalize(method_name);
    RULES
        .iter()
        .find_map(|rule| rule.matches(&n))
        .unwrap_or(ActionClass::Read)
}

/// Select the loggable parameters of a signature, in declaration order:
/// id-like name plus a simple type from the fixed loggable set. Returns the
/// parameter names.
pub fn loggable_params(sig: &Signature) -> Vec<String> {
    sig.inputs
        .iter()
        .filter_map(|arg| match arg {
            FnArg::Typed(pt) => {
                let name = match &*pt.pat {
                    Pat::Ident(pi) => pi.ident.to_string(),
                    _ => return None,
                };
                if is_id_like(&name) && is_loggable_type(&pt.ty) {
                    Some(name)
                } else {
                    None
                }
            }
            FnArg::Receiver(_) => None,
        })
        .collect()
}

/// Strip references, then compare the last path segment against the fixed
/// loggable type set. Simple names only; no resolution context exists.
fn is_loggable_type(ty: &Type) -> bool {
    match ty {
        Type::Reference(r) => is_loggable_type(&r.elem),
        Type::Path(tp) => tp
            .path
            .segments
            .last()
            .map(|seg| LOGGABLE_TYPES.contains(&seg.ident.to_string().as_str()))
            .unwrap_or(false),
        _ => false,
    }
}
