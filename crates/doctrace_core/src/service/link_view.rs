//! Nested link view construction.
//!
//! # Responsibility
//! - Reconstruct a presentation forest from the flat direct-link relation.
//!
//! # Invariants
//! - Pure and read-only: never mutates the stored relation.
//! - Each root carries its own visited set seeded with the root id, so no
//!   document appears twice along any path even over cyclic relations.
//! - Link-id insertion order is preserved at every level.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::model::document::{Document, DocumentId, DocumentIdentity};

/// Flat input record: one document plus its stored direct-link target ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentWithLinks {
    pub document: Document,
    pub link_ids: Vec<DocumentId>,
}

/// Presentation copy of a document with links expanded into a subtree.
///
/// Carries no raw link-id list; `linked_docs` is the only link field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedDocument {
    pub id: DocumentId,
    #[serde(flatten)]
    pub identity: DocumentIdentity,
    pub agile_pn: String,
    pub agile_rev: String,
    pub doc_title: String,
    pub doc_url: String,
    pub sort_order: Option<i64>,
    pub created_at: i64,
    pub linked_docs: Vec<NestedDocument>,
}

/// Builds the nested view for every top-level document, in input order.
///
/// A linked id that is already on the current root's expansion, or that has
/// no flat record in the input, is skipped.
pub fn build_nested_view(documents: &[DocumentWithLinks]) -> Vec<NestedDocument> {
    let by_id: HashMap<DocumentId, &DocumentWithLinks> = documents
        .iter()
        .map(|record| (record.document.id, record))
        .collect();

    documents
        .iter()
        .map(|record| {
            let mut visited = HashSet::from([record.document.id]);
            let children = expand_links(&record.link_ids, &by_id, &mut visited);
            to_nested(&record.document, children)
        })
        .collect()
}

fn expand_links(
    link_ids: &[DocumentId],
    by_id: &HashMap<DocumentId, &DocumentWithLinks>,
    visited: &mut HashSet<DocumentId>,
) -> Vec<NestedDocument> {
    let mut nested = Vec::new();
    for link_id in link_ids {
        if !visited.insert(*link_id) {
            continue;
        }
        let Some(record) = by_id.get(link_id) else {
            continue;
        };
        let children = expand_links(&record.link_ids, by_id, visited);
        nested.push(to_nested(&record.document, children));
    }
    nested
}

fn to_nested(document: &Document, linked_docs: Vec<NestedDocument>) -> NestedDocument {
    NestedDocument {
        id: document.id,
        identity: document.identity.clone(),
        agile_pn: document.agile_pn.clone(),
        agile_rev: document.agile_rev.clone(),
        doc_title: document.doc_title.clone(),
        doc_url: document.doc_url.clone(),
        sort_order: document.sort_order,
        created_at: document.created_at,
        linked_docs,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_nested_view, DocumentWithLinks};
    use crate::model::document::{Document, DocumentId, DocumentIdentity};

    fn record(id: DocumentId, link_ids: Vec<DocumentId>) -> DocumentWithLinks {
        DocumentWithLinks {
            document: Document {
                id,
                owner_id: 1,
                identity: DocumentIdentity::new("P1", "SPEC", id.to_string()),
                agile_pn: String::new(),
                agile_rev: String::new(),
                doc_title: format!("Doc {id}"),
                doc_url: String::new(),
                sort_order: None,
                created_at: 0,
            },
            link_ids,
        }
    }

    #[test]
    fn diamond_nests_shared_node_once_per_root() {
        // A -> B, B -> C, A -> C: C nests under B and is pruned as A's
        // direct child.
        let records = vec![
            record(1, vec![2, 3]),
            record(2, vec![3]),
            record(3, vec![]),
        ];

        let view = build_nested_view(&records);
        let root = &view[0];

        assert_eq!(root.linked_docs.len(), 1);
        assert_eq!(root.linked_docs[0].id, 2);
        assert_eq!(root.linked_docs[0].linked_docs.len(), 1);
        assert_eq!(root.linked_docs[0].linked_docs[0].id, 3);
    }

    #[test]
    fn mutual_links_terminate_and_prune_back_edge() {
        let records = vec![record(1, vec![2]), record(2, vec![1])];

        let view = build_nested_view(&records);

        assert_eq!(view[0].linked_docs.len(), 1);
        assert_eq!(view[0].linked_docs[0].id, 2);
        assert!(view[0].linked_docs[0].linked_docs.is_empty());

        // Each root expands independently with its own visited set.
        assert_eq!(view[1].linked_docs.len(), 1);
        assert_eq!(view[1].linked_docs[0].id, 1);
        assert!(view[1].linked_docs[0].linked_docs.is_empty());
    }

    #[test]
    fn self_link_is_pruned() {
        let records = vec![record(1, vec![1])];

        let view = build_nested_view(&records);
        assert!(view[0].linked_docs.is_empty());
    }

    #[test]
    fn link_order_is_preserved() {
        let records = vec![
            record(1, vec![4, 2, 3]),
            record(2, vec![]),
            record(3, vec![]),
            record(4, vec![]),
        ];

        let view = build_nested_view(&records);
        let child_ids: Vec<_> = view[0].linked_docs.iter().map(|child| child.id).collect();
        assert_eq!(child_ids, vec![4, 2, 3]);
    }

    #[test]
    fn unknown_link_ids_are_skipped() {
        let records = vec![record(1, vec![99, 2]), record(2, vec![])];

        let view = build_nested_view(&records);
        assert_eq!(view[0].linked_docs.len(), 1);
        assert_eq!(view[0].linked_docs[0].id, 2);
    }
}
