//! Modified-since check over the book tree.

use crate::model::Node;
use chrono::{DateTime, Utc};

/// Whether `node` has to be exported for a run that covers changes since `since`.
///
/// With no `since` everything is exported. Otherwise the node qualifies when it, or any
/// descendant, was updated at or after `since`. Parent and child timestamps are checked
/// independently; a parent is not assumed to be newer than its children. Every node that
/// is itself modified is reported, so the whole subtree is visited.
pub fn needs_export(node: Node<'_>, since: Option<DateTime<Utc>>) -> bool {
    match since {
        None => true,
        Some(since) => modified_since(node, since),
    }
}

fn modified_since(node: Node<'_>, since: DateTime<Utc>) -> bool {
    if node.updated_at() >= since {
        tracing::info!(
            "{} {} modified {}",
            capitalize(node.kind()),
            node.name(),
            node.updated_at().to_rfc3339()
        );
        return true;
    }
    node.children()
        .into_iter()
        .fold(false, |any, child| modified_since(child, since) || any)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
