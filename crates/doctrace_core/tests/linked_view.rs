use doctrace_core::db::open_db_in_memory;
use doctrace_core::{
    CatalogEntry, CatalogLink, DocumentPatch, DocumentRepository, DocumentService,
    DocumentServiceError, InMemoryCatalog, NewDocument, OwnerId, SqliteDocumentRepository,
    SqliteUserRepository, UserRepository,
};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn register_owner(conn: &Connection, username: &str) -> OwnerId {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    users.create_user(username).unwrap().id
}

fn service(
    conn: &Connection,
    entries: Vec<CatalogEntry>,
) -> DocumentService<SqliteDocumentRepository<'_>, InMemoryCatalog> {
    let repo = SqliteDocumentRepository::try_new(conn).unwrap();
    DocumentService::new(repo, InMemoryCatalog::new(entries))
}

fn link(doc_id: &str) -> CatalogLink {
    CatalogLink {
        project_id: "P1".to_string(),
        doc_type: "SPEC".to_string(),
        doc_id: doc_id.to_string(),
        agile_pn: String::new(),
        agile_rev: String::new(),
        doc_title: String::new(),
    }
}

fn entry(doc_id: &str, title: &str, links: Vec<CatalogLink>) -> CatalogEntry {
    CatalogEntry {
        project_id: "P1".to_string(),
        doc_type: "SPEC".to_string(),
        doc_id: doc_id.to_string(),
        agile_pn: String::new(),
        agile_rev: String::new(),
        doc_title: title.to_string(),
        linked_docs: links,
    }
}

fn payload(doc_id: &str) -> NewDocument {
    NewDocument {
        project_id: "P1".to_string(),
        doc_type: "SPEC".to_string(),
        doc_id: doc_id.to_string(),
        ..NewDocument::default()
    }
}

#[test]
fn create_then_list_with_links_end_to_end() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let service = service(
        &conn,
        vec![
            entry("1", "Root", vec![link("2")]),
            entry("2", "Leaf", vec![]),
        ],
    );

    let created = service.create_document(owner, &payload("1")).unwrap();
    assert_eq!(created.doc_title, "Root");

    let view = service.list_documents_with_links(owner).unwrap();
    assert_eq!(view.len(), 2);

    let root = view.iter().find(|nested| nested.id == created.id).unwrap();
    assert_eq!(root.linked_docs.len(), 1);
    assert_eq!(root.linked_docs[0].identity.doc_id, "2");
    assert_eq!(root.linked_docs[0].doc_title, "Leaf");
    assert!(root.linked_docs[0].linked_docs.is_empty());
}

#[test]
fn nested_document_serializes_without_raw_link_ids() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let service = service(
        &conn,
        vec![
            entry("1", "Root", vec![link("2")]),
            entry("2", "Leaf", vec![]),
        ],
    );

    let created = service.create_document(owner, &payload("1")).unwrap();
    let view = service.list_documents_with_links(owner).unwrap();
    let root = view.iter().find(|nested| nested.id == created.id).unwrap();

    let json = serde_json::to_value(root).unwrap();
    assert_eq!(json["project_id"], "P1");
    assert_eq!(json["doc_type"], "SPEC");
    assert_eq!(json["doc_id"], "1");
    assert_eq!(json["doc_title"], "Root");
    assert_eq!(json["linked_docs"][0]["doc_title"], "Leaf");
    assert_eq!(
        json["linked_docs"][0]["linked_docs"],
        serde_json::json!([])
    );
    assert!(json.get("link_ids").is_none());
}

#[test]
fn diamond_relation_nests_shared_target_once() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let service = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        InMemoryCatalog::new(vec![]),
    );

    let a = repo.create_document(owner, &payload("a")).unwrap();
    let b = repo.create_document(owner, &payload("b")).unwrap();
    let c = repo.create_document(owner, &payload("c")).unwrap();
    repo.set_direct_links(a.id, &[b.id, c.id]).unwrap();
    repo.set_direct_links(b.id, &[c.id]).unwrap();

    let view = service.list_documents_with_links(owner).unwrap();
    let root = view.iter().find(|nested| nested.id == a.id).unwrap();

    // C nests under B; the direct A -> C edge is pruned on the second path.
    assert_eq!(root.linked_docs.len(), 1);
    assert_eq!(root.linked_docs[0].id, b.id);
    assert_eq!(root.linked_docs[0].linked_docs.len(), 1);
    assert_eq!(root.linked_docs[0].linked_docs[0].id, c.id);
}

#[test]
fn stored_cycles_render_as_finite_trees() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let service = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        InMemoryCatalog::new(vec![]),
    );

    let a = repo.create_document(owner, &payload("a")).unwrap();
    let b = repo.create_document(owner, &payload("b")).unwrap();
    repo.set_direct_links(a.id, &[b.id]).unwrap();
    repo.set_direct_links(b.id, &[a.id]).unwrap();

    let view = service.list_documents_with_links(owner).unwrap();

    let root_a = view.iter().find(|nested| nested.id == a.id).unwrap();
    assert_eq!(root_a.linked_docs.len(), 1);
    assert!(root_a.linked_docs[0].linked_docs.is_empty());

    let root_b = view.iter().find(|nested| nested.id == b.id).unwrap();
    assert_eq!(root_b.linked_docs.len(), 1);
    assert!(root_b.linked_docs[0].linked_docs.is_empty());
}

#[test]
fn view_respects_display_order_of_roots() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let repo = SqliteDocumentRepository::try_new(&conn).unwrap();
    let service = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        InMemoryCatalog::new(vec![]),
    );

    let mut second = payload("second");
    second.sort_order = Some(2);
    let mut first = payload("first");
    first.sort_order = Some(1);

    let second = repo.create_document(owner, &second).unwrap();
    let first = repo.create_document(owner, &first).unwrap();

    let view = service.list_documents_with_links(owner).unwrap();
    let ids: Vec<_> = view.iter().map(|nested| nested.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
}

#[test]
fn service_update_and_delete_are_owner_scoped() {
    let conn = setup();
    let alice = register_owner(&conn, "alice");
    let bob = register_owner(&conn, "bob");
    let service = service(&conn, vec![]);

    let doc = service.create_document(alice, &payload("1")).unwrap();

    let patch = DocumentPatch {
        doc_title: Some("Renamed".to_string()),
        ..DocumentPatch::default()
    };
    let err = service.update_document(bob, doc.id, &patch).unwrap_err();
    assert!(matches!(err, DocumentServiceError::DocumentNotFound(id) if id == doc.id));

    let updated = service.update_document(alice, doc.id, &patch).unwrap();
    assert_eq!(updated.doc_title, "Renamed");

    let err = service.delete_document(bob, doc.id).unwrap_err();
    assert!(matches!(err, DocumentServiceError::DocumentNotFound(id) if id == doc.id));
    service.delete_document(alice, doc.id).unwrap();
    assert!(service.list_documents(alice).unwrap().is_empty());
}

#[test]
fn service_surfaces_validation_before_resolution() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let service = service(&conn, vec![entry("1", "Root", vec![])]);

    let err = service.create_document(owner, &payload("")).unwrap_err();
    assert!(matches!(err, DocumentServiceError::Validation(_)));
    assert!(service.list_documents(owner).unwrap().is_empty());
}

#[test]
fn service_delete_all_reports_removed_count() {
    let conn = setup();
    let owner = register_owner(&conn, "alice");
    let service = service(
        &conn,
        vec![
            entry("1", "Root", vec![link("2")]),
            entry("2", "Leaf", vec![]),
        ],
    );

    service.create_document(owner, &payload("1")).unwrap();
    assert_eq!(service.delete_all_documents(owner).unwrap(), 2);
    assert!(service.list_documents_with_links(owner).unwrap().is_empty());
}
