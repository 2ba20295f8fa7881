mod common;

use std::sync::Arc;

use common::{account_record, doc_meta, project_meta, MemoryDocumentStore, MemoryFileStore, MemoryProjectIndex};
use folio_backup::{
    ConflictPolicy, EntitySerializer, ImportOutcome, ImportResolver,
};
use folio_types::{Bundle, BundleMode, BundleSource, Manifest, ProjectData, ProjectMetadata};
use pretty_assertions::assert_eq;

struct Fixture {
    documents: Arc<MemoryDocumentStore>,
    files: Arc<MemoryFileStore>,
    index: Arc<MemoryProjectIndex>,
    resolver: ImportResolver,
    account: folio_types::AccountRecord,
}

fn fixture() -> Fixture {
    common::init_tracing();
    let documents = Arc::new(MemoryDocumentStore::new());
    let files = Arc::new(MemoryFileStore::new());
    let account = account_record();
    let index = Arc::new(MemoryProjectIndex::new(account.clone()));
    let serializer = EntitySerializer::new(
        Arc::clone(&documents) as _,
        Arc::clone(&files) as _,
    );
    let resolver = ImportResolver::new(Arc::clone(&index) as _, serializer, account.id);
    Fixture {
        documents,
        files,
        index,
        resolver,
        account,
    }
}

fn bundle_of(projects: Vec<ProjectData>) -> Bundle {
    let mut bundle = Bundle::new(Manifest::new(BundleMode::Import));
    for data in projects {
        bundle.insert_project(data);
    }
    bundle
}

fn project_with_doc(meta: ProjectMetadata) -> ProjectData {
    let doc = doc_meta("notes");
    let mut data = ProjectData::new(meta);
    data.document_contents.insert(
        doc.id,
        folio_types::DocumentContent {
            snapshot: Some(vec![1]),
            readable_text: None,
        },
    );
    data.documents = vec![doc];
    data
}

// ── Discovery ────────────────────────────────────────────────────

#[tokio::test]
async fn discover_excludes_projects_already_present() {
    let fx = fixture();
    let local = project_meta("Here", "aaa", fx.account.id);
    fx.index.seed_project(local.clone());

    let foreign = project_with_doc(project_meta("There", "bbb", fx.account.id));
    let bundle = bundle_of(vec![ProjectData::new(local), foreign.clone()]);

    let found = fx.resolver.discover(&bundle, BundleSource::Archive).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].metadata.id, foreign.metadata.id);
    assert_eq!(found[0].source, BundleSource::Archive);
    assert_eq!(found[0].document_count, 1);
    assert_eq!(found[0].file_count, 0);
}

#[tokio::test]
async fn discover_mutates_nothing() {
    let fx = fixture();
    let foreign = project_with_doc(project_meta("There", "bbb", fx.account.id));
    let bundle = bundle_of(vec![foreign]);

    fx.resolver.discover(&bundle, BundleSource::Backup).await.unwrap();
    assert!(fx.index.all_projects().is_empty());
}

// ── Conflict policies ────────────────────────────────────────────

#[tokio::test]
async fn skip_leaves_local_project_untouched() {
    let fx = fixture();
    let local = project_meta("Paper", "aaa", fx.account.id);
    fx.index.seed_project(local.clone());

    let mut incoming = local.clone();
    incoming.description = "newer description".into();
    let bundle = bundle_of(vec![project_with_doc(incoming)]);

    let summary = fx
        .resolver
        .import_projects(&bundle, &[local.id], ConflictPolicy::Skip)
        .await
        .unwrap();

    assert_eq!(summary.skipped_count(), 1);
    assert_eq!(summary.reports[0].outcome, ImportOutcome::Skipped);
    let kept = fx.index.project(&local.id).unwrap();
    assert_eq!(kept.description, local.description);
}

#[tokio::test]
async fn overwrite_replaces_under_original_identifiers() {
    let fx = fixture();
    let local = project_meta("Paper", "aaa", fx.account.id);
    fx.index.seed_project(local.clone());

    let mut incoming = local.clone();
    incoming.description = "from bundle".into();
    let bundle = bundle_of(vec![project_with_doc(incoming)]);

    let summary = fx
        .resolver
        .import_projects(&bundle, &[local.id], ConflictPolicy::Overwrite)
        .await
        .unwrap();

    assert_eq!(summary.imported_count(), 1);
    assert!(!fx.files.raw_write_used());
    assert_eq!(fx.index.deleted_projects(), vec![local.id]);
    let replaced = fx.index.project(&local.id).unwrap();
    assert_eq!(replaced.description, "from bundle");
    assert_eq!(replaced.document_url, local.document_url);
}

#[tokio::test]
async fn create_new_allocates_fresh_identity_and_name() {
    let fx = fixture();
    let local_a = project_meta("Paper", "aaa", fx.account.id);
    let local_b = project_meta("Draft", "ccc", fx.account.id);
    fx.index.seed_project(local_a.clone());
    fx.index.seed_project(local_b.clone());

    let mut incoming_a = local_a.clone();
    incoming_a.name = "Paper".into();
    let mut incoming_b = local_b.clone();
    incoming_b.name = "Paper".into();
    let bundle = bundle_of(vec![
        project_with_doc(incoming_a),
        project_with_doc(incoming_b),
    ]);

    let summary = fx
        .resolver
        .import_projects(&bundle, &[local_a.id, local_b.id], ConflictPolicy::CreateNew)
        .await
        .unwrap();

    assert_eq!(summary.imported_count(), 2);
    let mut names: Vec<String> = Vec::new();
    for report in &summary.reports {
        let ImportOutcome::Imported {
            project_id,
            document_url,
        } = &report.outcome
        else {
            panic!("expected imported outcome");
        };
        assert_ne!(*project_id, local_a.id);
        assert_ne!(*project_id, local_b.id);
        assert_ne!(document_url.opaque_id(), "aaa");
        assert_ne!(document_url.opaque_id(), "ccc");
        names.push(fx.index.project(project_id).unwrap().name);
    }
    names.sort();
    assert_eq!(names, vec!["Paper (imported 2)", "Paper (imported)"]);

    // The originals survive unchanged.
    assert!(fx.index.project(&local_a.id).is_some());
    assert!(fx.index.project(&local_b.id).is_some());
}

#[tokio::test]
async fn create_new_remaps_even_without_id_conflict() {
    let fx = fixture();
    let local = project_meta("Paper", "aaa", fx.account.id);
    fx.index.seed_project(local.clone());

    // Two bundle projects named "Paper" whose ids do not exist locally.
    let foreign_a = project_meta("Paper", "bbb", fx.account.id);
    let foreign_b = project_meta("Paper", "ddd", fx.account.id);
    let bundle = bundle_of(vec![
        project_with_doc(foreign_a.clone()),
        project_with_doc(foreign_b.clone()),
    ]);

    let summary = fx
        .resolver
        .import_projects(
            &bundle,
            &[foreign_a.id, foreign_b.id],
            ConflictPolicy::CreateNew,
        )
        .await
        .unwrap();

    assert_eq!(summary.imported_count(), 2);
    let mut names: Vec<String> = Vec::new();
    for report in &summary.reports {
        let ImportOutcome::Imported {
            project_id,
            document_url,
        } = &report.outcome
        else {
            panic!("expected imported outcome");
        };
        // Bundle ids and URLs are never reused under create-new.
        assert_ne!(*project_id, foreign_a.id);
        assert_ne!(*project_id, foreign_b.id);
        assert_ne!(document_url.opaque_id(), "bbb");
        assert_ne!(document_url.opaque_id(), "ddd");
        names.push(fx.index.project(project_id).unwrap().name);
    }
    names.sort();
    assert_eq!(names, vec!["Paper (imported 2)", "Paper (imported)"]);
    assert_eq!(fx.index.project(&local.id).unwrap().name, "Paper");
}

#[tokio::test]
async fn non_conflicting_import_keeps_original_identity() {
    let fx = fixture();
    let foreign = project_meta("New Paper", "bbb", fx.account.id);
    let bundle = bundle_of(vec![project_with_doc(foreign.clone())]);

    let summary = fx
        .resolver
        .import_projects(&bundle, &[foreign.id], ConflictPolicy::Skip)
        .await
        .unwrap();

    assert_eq!(summary.imported_count(), 1);
    let imported = fx.index.project(&foreign.id).unwrap();
    assert_eq!(imported.name, "New Paper");
    assert_eq!(imported.document_url, foreign.document_url);
    // Its documents landed in the store under the original opaque id.
    assert_eq!(fx.documents.index_of("bbb").len(), 1);
}

#[tokio::test]
async fn imported_project_is_owned_by_local_account() {
    let fx = fixture();
    let other_owner = folio_types::AccountId::new();
    let foreign = project_meta("Borrowed", "bbb", other_owner);
    let bundle = bundle_of(vec![project_with_doc(foreign.clone())]);

    fx.resolver
        .import_projects(&bundle, &[foreign.id], ConflictPolicy::Skip)
        .await
        .unwrap();

    assert_eq!(fx.index.project(&foreign.id).unwrap().owner_id, fx.account.id);
}

// ── Batch isolation ──────────────────────────────────────────────

#[tokio::test]
async fn one_failed_project_does_not_abort_the_batch() {
    let fx = fixture();
    let good = project_meta("Good", "bbb", fx.account.id);
    let missing = folio_types::ProjectId::new();
    let bundle = bundle_of(vec![project_with_doc(good.clone())]);

    let summary = fx
        .resolver
        .import_projects(&bundle, &[missing, good.id], ConflictPolicy::Skip)
        .await
        .unwrap();

    assert_eq!(summary.failed_count(), 1);
    assert_eq!(summary.imported_count(), 1);
    assert!(matches!(
        summary.reports[0].outcome,
        ImportOutcome::Failed { .. }
    ));
    assert!(fx.index.project(&good.id).is_some());
}

// ── Reconcile ────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_pulls_bundle_projects_without_deleting_local_ones() {
    let fx = fixture();
    let local_only = project_meta("Local", "aaa", fx.account.id);
    fx.index.seed_project(local_only.clone());

    let shared = project_meta("Shared", "bbb", fx.account.id);
    fx.index.seed_project(shared.clone());
    let mut updated = shared.clone();
    updated.description = "reconciled".into();
    let bundle = bundle_of(vec![project_with_doc(updated)]);

    let count = fx.resolver.reconcile_projects(&bundle, None).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(fx.index.project(&shared.id).unwrap().description, "reconciled");
    assert!(fx.index.project(&local_only.id).is_some());
    assert!(fx.index.deleted_projects().is_empty());
}

#[tokio::test]
async fn reconcile_with_missing_target_fails() {
    let fx = fixture();
    let bundle = bundle_of(Vec::new());
    let missing = folio_types::ProjectId::new();

    let err = fx
        .resolver
        .reconcile_projects(&bundle, Some(missing))
        .await
        .unwrap_err();
    assert!(matches!(err, folio_backup::BackupError::ProjectNotFound(_)));
}
