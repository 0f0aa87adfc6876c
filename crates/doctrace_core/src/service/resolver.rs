//! Catalog resolution engine.
//!
//! # Responsibility
//! - Fill enrichment fields from the external catalog after first persist.
//! - Materialize linked documents recursively and record direct links.
//!
//! # Invariants
//! - One `resolve` call sees exactly one catalog snapshot.
//! - The visited set is call-local and keyed by identity triples, so
//!   catalog cycles terminate.
//! - Catalog load failures degrade to a logged no-op; store failures
//!   propagate.
//! - A node's direct-link set is replaced, never merged, and mirrors the
//!   catalog's link order.

use log::{info, warn};
use std::collections::{HashMap, HashSet};

use crate::catalog::{CatalogEntry, CatalogLink, CatalogSource};
use crate::model::document::{Document, DocumentId, DocumentPatch, NewDocument};
use crate::repo::document_repo::{DocumentRepository, RepoResult};

/// Resolves one document against the external catalog.
///
/// Runs as two passes over one catalog snapshot: a discover pass that
/// creates (or reuses) linked documents and plans per-node link lists, and
/// a commit pass that writes the planned direct-link sets.
pub struct CatalogResolver<'a, C: CatalogSource, R: DocumentRepository> {
    catalog: &'a C,
    repo: &'a R,
}

#[derive(Default)]
struct ResolutionPlan {
    visited: HashSet<String>,
    links: Vec<(DocumentId, Vec<DocumentId>)>,
}

impl<'a, C: CatalogSource, R: DocumentRepository> CatalogResolver<'a, C, R> {
    pub fn new(catalog: &'a C, repo: &'a R) -> Self {
        Self { catalog, repo }
    }

    /// Enriches `document` and materializes its catalog-declared link
    /// closure for the same owner.
    ///
    /// # Errors
    /// Only store-layer failures are returned; a catalog that cannot be
    /// loaded leaves the document untouched and resolves successfully.
    pub fn resolve(&self, document: &Document) -> RepoResult<()> {
        let entries = match self.catalog.load_entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    "event=catalog_resolve module=resolver status=error document_id={} error={}",
                    document.id, err
                );
                return Ok(());
            }
        };

        let index = index_entries(&entries);
        let document = self.fill_enrichment(document, &index)?;

        let mut plan = ResolutionPlan::default();
        self.discover(&document, &index, &mut plan)?;
        for (source_id, target_ids) in &plan.links {
            self.repo.set_direct_links(*source_id, target_ids)?;
        }

        info!(
            "event=catalog_resolve module=resolver status=ok document_id={} visited={} linked_nodes={}",
            document.id,
            plan.visited.len(),
            plan.links.len()
        );
        Ok(())
    }

    /// Copies catalog enrichment into fields the document left unset.
    ///
    /// Persists only when at least one field actually changed; a document
    /// created with a non-empty value keeps it.
    fn fill_enrichment(
        &self,
        document: &Document,
        index: &HashMap<String, &CatalogEntry>,
    ) -> RepoResult<Document> {
        let Some(entry) = index.get(&document.identity.key()) else {
            return Ok(document.clone());
        };

        let mut patch = DocumentPatch::default();
        if document.agile_pn.is_empty() && !entry.agile_pn.is_empty() {
            patch.agile_pn = Some(entry.agile_pn.clone());
        }
        if document.agile_rev.is_empty() && !entry.agile_rev.is_empty() {
            patch.agile_rev = Some(entry.agile_rev.clone());
        }
        if document.doc_title.is_empty() && !entry.doc_title.is_empty() {
            patch.doc_title = Some(entry.doc_title.clone());
        }

        if patch.is_empty() {
            return Ok(document.clone());
        }
        self.repo
            .update_document(document.owner_id, document.id, &patch)
    }

    /// Depth-first discovery over the catalog link graph.
    ///
    /// Children are created in catalog order first, then each is recursed
    /// into with the same visited set, and only then is this node's target
    /// list planned. Nodes without a catalog entry or without links plan
    /// nothing.
    fn discover(
        &self,
        document: &Document,
        index: &HashMap<String, &CatalogEntry>,
        plan: &mut ResolutionPlan,
    ) -> RepoResult<()> {
        if !plan.visited.insert(document.identity.key()) {
            return Ok(());
        }
        let Some(entry) = index.get(&document.identity.key()) else {
            return Ok(());
        };

        let mut touched = Vec::with_capacity(entry.linked_docs.len());
        for link in &entry.linked_docs {
            let payload = linked_payload(link, index);
            if payload.validate().is_err() {
                warn!(
                    "event=catalog_resolve module=resolver status=skip reason=invalid_identity key={}",
                    link.identity().key()
                );
                continue;
            }
            let linked = self
                .repo
                .get_or_create_document(document.owner_id, &payload)?;
            touched.push(linked);
        }

        let target_ids: Vec<DocumentId> = touched.iter().map(|linked| linked.id).collect();
        for linked in &touched {
            self.discover(linked, index, plan)?;
        }

        if !target_ids.is_empty() {
            plan.links.push((document.id, target_ids));
        }
        Ok(())
    }
}

/// Indexes entries by identity key. The first entry wins on duplicates.
fn index_entries(entries: &[CatalogEntry]) -> HashMap<String, &CatalogEntry> {
    let mut index = HashMap::with_capacity(entries.len());
    for entry in entries {
        index.entry(entry.identity().key()).or_insert(entry);
    }
    index
}

/// Builds the get-or-create payload for one linked reference.
///
/// Enrichment comes from the linked identity's own full entry; when the
/// catalog has none, every enrichment field and the URL default to unset.
fn linked_payload(link: &CatalogLink, index: &HashMap<String, &CatalogEntry>) -> NewDocument {
    let identity = link.identity();
    match index.get(&identity.key()) {
        Some(full) => NewDocument {
            agile_pn: full.agile_pn.clone(),
            agile_rev: full.agile_rev.clone(),
            doc_title: full.doc_title.clone(),
            ..NewDocument::from_identity(&identity)
        },
        None => NewDocument::from_identity(&identity),
    }
}

#[cfg(test)]
mod tests {
    use super::index_entries;
    use crate::catalog::CatalogEntry;

    fn entry(doc_id: &str, title: &str) -> CatalogEntry {
        CatalogEntry {
            project_id: "P1".to_string(),
            doc_type: "SPEC".to_string(),
            doc_id: doc_id.to_string(),
            agile_pn: String::new(),
            agile_rev: String::new(),
            doc_title: title.to_string(),
            linked_docs: Vec::new(),
        }
    }

    #[test]
    fn index_keeps_first_entry_on_duplicate_identity() {
        let entries = vec![entry("1", "first"), entry("1", "second")];
        let index = index_entries(&entries);

        assert_eq!(index.len(), 1);
        assert_eq!(index["P1/SPEC/1"].doc_title, "first");
    }
}
