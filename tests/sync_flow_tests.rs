//! Sync runs through `ComparisonService` against an in-process shop

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{FakeShop, collection_detail, entity, file_detail, page_detail, product_detail};
use store_sync_lib::application::comparison_service::{ComparisonService, EngineSettings};
use store_sync_lib::domain::comparison::{ComparisonRecord, IN_SYNC, MISSING_IN_STAGING};
use store_sync_lib::domain::entities::{EntityKey, EntityKind};
use store_sync_lib::domain::environment::Environment;
use store_sync_lib::domain::errors::{FailureCategory, SyncEngineError};
use store_sync_lib::domain::events::SilentReporter;
use store_sync_lib::domain::mutations::{EntityInput, Mutation};
use store_sync_lib::domain::reports::{ProgressUpdate, SyncReport};
use store_sync_lib::domain::repositories::ComparisonStore;
use store_sync_lib::infrastructure::memory_store::InMemoryComparisonStore;

fn record(key: &str, production_id: Option<&str>, staging_id: Option<&str>, differences: &str) -> ComparisonRecord {
    ComparisonRecord {
        key: key.to_string(),
        production_id: production_id.map(str::to_string),
        staging_id: staging_id.map(str::to_string),
        title: key.to_uppercase(),
        differences: differences.to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
        compared_at: String::new(),
        url: None,
    }
}

struct Harness {
    service: ComparisonService,
    shop: Arc<FakeShop>,
    store: Arc<InMemoryComparisonStore>,
}

async fn harness(shop: FakeShop, seeded: Vec<(EntityKind, ComparisonRecord)>) -> Harness {
    let shop = Arc::new(shop);
    let store = Arc::new(InMemoryComparisonStore::new());
    for (kind, record) in seeded {
        store.upsert(kind, record).await.unwrap();
    }
    let settings = EngineSettings {
        page_delay: Duration::ZERO,
        chunk_size: 2,
        ..EngineSettings::default()
    };
    Harness {
        service: ComparisonService::new(shop.clone(), store.clone(), settings),
        shop,
        store,
    }
}

fn keys(values: &[&str]) -> Vec<EntityKey> {
    values.iter().map(|v| (*v).to_string()).collect()
}

fn incomplete(result: Result<SyncReport, SyncEngineError>) -> SyncReport {
    match result {
        Err(SyncEngineError::SyncIncomplete(report)) => report,
        other => panic!("expected an incomplete sync, got {other:?}"),
    }
}

#[tokio::test]
async fn update_marks_record_in_sync() {
    let shop = FakeShop::new().with_detail(Environment::Production, page_detail("p1", "about", "<p>New</p>"));
    let h = harness(shop, vec![(EntityKind::Page, record("about", Some("p1"), Some("s1"), "Body"))]).await;

    let report = h
        .service
        .sync(EntityKind::Page, &keys(&["about"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(report.synced, keys(&["about"]));
    let mutations = h.shop.mutations();
    assert_eq!(mutations.len(), 1);
    let (environment, Mutation::Update { id, input: EntityInput::Page(input) }) = &mutations[0] else {
        panic!("expected a page update, got {:?}", mutations[0]);
    };
    assert_eq!(*environment, Environment::Staging);
    assert_eq!(id, "s1");
    assert_eq!(input.body, "<p>New</p>");

    let stored = h.store.get_by_key(EntityKind::Page, "about").await.unwrap().unwrap();
    assert_eq!(stored.differences, IN_SYNC);
    assert_eq!(stored.staging_id.as_deref(), Some("s1"));
}

#[tokio::test]
async fn create_records_the_new_target_id() {
    let shop = FakeShop::new().with_detail(Environment::Staging, page_detail("s7", "lookbook", "<p>Look</p>"));
    let seeded = vec![(EntityKind::Page, record("lookbook", None, Some("s7"), "Missing in production"))];
    let h = harness(shop, seeded).await;

    let synced = Mutex::new(Vec::new());
    let reporter = |update: ProgressUpdate| {
        if let ProgressUpdate::KeySynced { record, .. } = update {
            synced.lock().unwrap().push(record);
        }
    };
    h.service
        .sync(EntityKind::Page, &keys(&["lookbook"]), Environment::Production, &reporter)
        .await
        .unwrap();

    assert_eq!(h.shop.operations(), vec!["pageCreate"]);
    let stored = h.store.get_by_key(EntityKind::Page, "lookbook").await.unwrap().unwrap();
    assert_eq!(stored.production_id.as_deref(), Some("gid://fake/production/1"));
    assert_eq!(stored.differences, IN_SYNC);
    assert_eq!(*synced.lock().unwrap(), vec![stored]);
}

#[tokio::test]
async fn progress_is_reported_per_chunk() {
    let mut shop = FakeShop::new();
    let mut seeded = Vec::new();
    for n in 1..=5 {
        let id = format!("p{n}");
        let key = format!("page-{n}");
        shop = shop.with_detail(Environment::Production, page_detail(&id, &key, "<p>Body</p>"));
        seeded.push((EntityKind::Page, record(&key, Some(&id), Some(&format!("s{n}")), "Body")));
    }
    let h = harness(shop, seeded).await;

    let progress = Mutex::new(Vec::new());
    let reporter = |update: ProgressUpdate| {
        if let ProgressUpdate::Sync { current, total, .. } = update {
            progress.lock().unwrap().push((current, total));
        }
    };
    let report = h
        .service
        .sync(
            EntityKind::Page,
            &keys(&["page-1", "page-2", "page-3", "page-4", "page-5"]),
            Environment::Staging,
            &reporter,
        )
        .await
        .unwrap();

    assert_eq!(report.synced.len(), 5);
    assert_eq!(*progress.lock().unwrap(), vec![(2, 5), (4, 5), (5, 5)]);
}

#[tokio::test]
async fn user_errors_surface_verbatim_and_leave_the_record() {
    let shop = FakeShop::new()
        .with_detail(Environment::Production, page_detail("p1", "about", "<p>New</p>"))
        .rejecting("pageUpdate", &["Handle has already been taken"]);
    let original = record("about", Some("p1"), Some("s1"), "Body");
    let h = harness(shop, vec![(EntityKind::Page, original.clone())]).await;

    let report = incomplete(
        h.service
            .sync(EntityKind::Page, &keys(&["about"]), Environment::Staging, &SilentReporter)
            .await,
    );

    assert!(report.synced.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].category, FailureCategory::Validation);
    assert!(report.failed[0].message.contains("Handle has already been taken"));

    let stored = h.store.get_by_key(EntityKind::Page, "about").await.unwrap().unwrap();
    assert_eq!(stored.differences, original.differences);
}

#[tokio::test]
async fn one_failing_key_does_not_stop_the_others() {
    let shop = FakeShop::new()
        .with_detail(Environment::Production, page_detail("p1", "about", "<p>A</p>"))
        .with_detail(Environment::Production, page_detail("p3", "terms", "<p>T</p>"))
        .failing_detail("p2");
    let seeded = vec![
        (EntityKind::Page, record("about", Some("p1"), Some("s1"), "Body")),
        (EntityKind::Page, record("faq", Some("p2"), Some("s2"), "Body")),
        (EntityKind::Page, record("terms", Some("p3"), None, MISSING_IN_STAGING)),
    ];
    let h = harness(shop, seeded).await;

    let report = incomplete(
        h.service
            .sync(
                EntityKind::Page,
                &keys(&["about", "faq", "terms", "ghost"]),
                Environment::Staging,
                &SilentReporter,
            )
            .await,
    );

    assert_eq!(report.total, 4);
    assert_eq!(report.synced, keys(&["about", "terms"]));
    let categories: Vec<_> = report.failed.iter().map(|f| (f.key.as_str(), f.category)).collect();
    assert_eq!(
        categories,
        vec![("faq", FailureCategory::DetailFetch), ("ghost", FailureCategory::NotFound)]
    );
    assert!(report.summary().starts_with("2 of 4 pages synced to staging, 2 failed"));
}

#[tokio::test]
async fn duplicate_keys_are_synced_once() {
    let shop = FakeShop::new().with_detail(Environment::Production, page_detail("p1", "about", "<p>A</p>"));
    let h = harness(shop, vec![(EntityKind::Page, record("about", Some("p1"), Some("s1"), "Body"))]).await;

    let report = h
        .service
        .sync(EntityKind::Page, &keys(&["about", "about", "about"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(h.shop.operations(), vec!["pageUpdate"]);
}

#[tokio::test]
async fn collection_with_unsynced_members_is_not_pushed() {
    let shop = FakeShop::new().with_detail(
        Environment::Production,
        collection_detail("pc1", "summer", &[("pp1", "tee"), ("pp2", "hat"), ("pp3", "scarf")]),
    );
    let original = record("summer", Some("pc1"), Some("sc1"), "Title");
    let seeded = vec![
        (EntityKind::Collection, original.clone()),
        (EntityKind::Product, record("tee", Some("pp1"), Some("sp1"), IN_SYNC)),
        (EntityKind::Product, record("hat", Some("pp2"), None, MISSING_IN_STAGING)),
    ];
    let h = harness(shop, seeded).await;

    let report = incomplete(
        h.service
            .sync(EntityKind::Collection, &keys(&["summer"]), Environment::Staging, &SilentReporter)
            .await,
    );

    assert_eq!(report.failed[0].category, FailureCategory::DependencyUnresolved);
    assert!(report.failed[0].message.contains("hat, scarf"));
    assert!(h.shop.mutations().is_empty());
    let stored = h.store.get_by_key(EntityKind::Collection, "summer").await.unwrap().unwrap();
    assert_eq!(stored.differences, original.differences);
    assert_eq!(stored.staging_id, original.staging_id);
}

#[tokio::test]
async fn collection_update_adds_only_missing_members() {
    let shop = FakeShop::new()
        .with_detail(
            Environment::Production,
            collection_detail("pc1", "summer", &[("pp1", "tee"), ("pp2", "hat")]),
        )
        .with_detail(Environment::Staging, collection_detail("sc1", "summer", &[("sp1", "tee")]));
    let seeded = vec![
        (EntityKind::Collection, record("summer", Some("pc1"), Some("sc1"), "Title")),
        (EntityKind::Product, record("tee", Some("pp1"), Some("sp1"), IN_SYNC)),
        (EntityKind::Product, record("hat", Some("pp2"), Some("sp2"), IN_SYNC)),
    ];
    let h = harness(shop, seeded).await;

    h.service
        .sync(EntityKind::Collection, &keys(&["summer"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    let mutations = h.shop.mutations();
    assert_eq!(h.shop.operations(), vec!["collectionUpdate", "collectionAddProducts"]);
    let (_, Mutation::AddCollectionProducts { collection_id, product_ids }) = &mutations[1] else {
        panic!("expected collectionAddProducts");
    };
    assert_eq!(collection_id, "sc1");
    assert_eq!(product_ids, &vec!["sp2".to_string()]);
}

#[tokio::test]
async fn product_update_tolerates_existing_options() {
    let shop = FakeShop::new()
        .with_detail(Environment::Production, product_detail("pp1", "tee", "Tee v2"))
        .rejecting("productOptionsCreate", &["Option 'Size' already exists"]);
    let h = harness(shop, vec![(EntityKind::Product, record("tee", Some("pp1"), Some("sp1"), "Title"))]).await;

    h.service
        .sync(EntityKind::Product, &keys(&["tee"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    assert_eq!(h.shop.operations(), vec!["productUpdate", "productOptionsCreate"]);
    let stored = h.store.get_by_key(EntityKind::Product, "tee").await.unwrap().unwrap();
    assert_eq!(stored.differences, IN_SYNC);
}

#[tokio::test]
async fn product_create_embeds_options_in_one_mutation() {
    let shop = FakeShop::new().with_detail(Environment::Production, product_detail("pp1", "tee", "Tee"));
    let seeded = vec![(EntityKind::Product, record("tee", Some("pp1"), None, MISSING_IN_STAGING))];
    let h = harness(shop, seeded).await;

    h.service
        .sync(EntityKind::Product, &keys(&["tee"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    let mutations = h.shop.mutations();
    assert_eq!(mutations.len(), 1);
    let (_, Mutation::Create(EntityInput::Product(input))) = &mutations[0] else {
        panic!("expected productCreate");
    };
    assert_eq!(input.product_options.as_ref().map(Vec::len), Some(1));
}

#[tokio::test]
async fn file_sync_creates_from_source_url() {
    let url = "https://cdn.example.com/files/hero.jpg?v=17";
    let shop = FakeShop::new().with_detail(Environment::Production, file_detail("pf1", url, Some("Hero")));
    let mut seeded = record("hero.jpg", Some("pf1"), Some("sf1"), "Alt text");
    seeded.url = Some(url.to_string());
    let h = harness(shop, vec![(EntityKind::File, seeded)]).await;

    h.service
        .sync(EntityKind::File, &keys(&["hero.jpg"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    let mutations = h.shop.mutations();
    let (_, Mutation::Create(EntityInput::File(input))) = &mutations[0] else {
        panic!("expected fileCreate");
    };
    assert_eq!(input.original_source, url);
    assert_eq!(input.filename, "hero.jpg");
    assert_eq!(input.alt.as_deref(), Some("Hero"));

    let stored = h.store.get_by_key(EntityKind::File, "hero.jpg").await.unwrap().unwrap();
    assert_eq!(stored.staging_id.as_deref(), Some("gid://fake/staging/1"));
    assert_eq!(stored.differences, IN_SYNC);
}

#[tokio::test]
async fn file_create_without_returned_id_is_a_failure() {
    let url = "https://cdn.example.com/files/hero.jpg";
    let shop = FakeShop::new()
        .with_detail(Environment::Production, file_detail("pf1", url, Some("Hero")))
        .omitting_created_ids();
    let mut seeded = record("hero.jpg", Some("pf1"), None, MISSING_IN_STAGING);
    seeded.url = Some(url.to_string());
    let h = harness(shop, vec![(EntityKind::File, seeded)]).await;

    let report = incomplete(
        h.service
            .sync(EntityKind::File, &keys(&["hero.jpg"]), Environment::Staging, &SilentReporter)
            .await,
    );

    assert_eq!(report.failed[0].category, FailureCategory::Mutation);
    assert!(report.synced.is_empty());
    let stored = h.store.get_by_key(EntityKind::File, "hero.jpg").await.unwrap().unwrap();
    assert_eq!(stored.staging_id, None);
    assert_eq!(stored.differences, MISSING_IN_STAGING);
}

#[tokio::test]
async fn created_collection_id_survives_a_failed_member_step() {
    let shop = FakeShop::new().with_detail(
        Environment::Production,
        collection_detail("pc1", "summer", &[("pp1", "tee")]),
    );
    let seeded = vec![
        (EntityKind::Collection, record("summer", Some("pc1"), None, MISSING_IN_STAGING)),
        (EntityKind::Product, record("tee", Some("pp1"), Some("sp1"), IN_SYNC)),
    ];
    let h = harness(shop, seeded).await;

    // The fake has no staging detail for the new collection, so the member lookup fails
    let report = incomplete(
        h.service
            .sync(EntityKind::Collection, &keys(&["summer"]), Environment::Staging, &SilentReporter)
            .await,
    );
    assert_eq!(report.failed[0].category, FailureCategory::DetailFetch);

    let stored = h.store.get_by_key(EntityKind::Collection, "summer").await.unwrap().unwrap();
    assert_eq!(stored.staging_id.as_deref(), Some("gid://fake/staging/1"));
    assert_ne!(stored.differences, IN_SYNC);

    let _ = h
        .service
        .sync(EntityKind::Collection, &keys(&["summer"]), Environment::Staging, &SilentReporter)
        .await;
    assert_eq!(h.shop.operations(), vec!["collectionCreate", "collectionUpdate"]);
    let mutations = h.shop.mutations();
    let (_, Mutation::Update { id, .. }) = &mutations[1] else {
        panic!("expected collectionUpdate, got {:?}", mutations[1]);
    };
    assert_eq!(id, "gid://fake/staging/1");
}

#[tokio::test]
async fn synced_pages_compare_in_sync_afterwards() {
    let shop = FakeShop::new()
        .with_list(
            Environment::Production,
            EntityKind::Page,
            vec![
                entity("p1", "about", "2024-01-01T00:00:00Z"),
                entity("p2", "faq", "2024-01-01T00:00:00Z"),
            ],
        )
        .with_list(
            Environment::Staging,
            EntityKind::Page,
            vec![entity("s2", "faq", "2023-12-01T00:00:00Z")],
        )
        .with_detail(Environment::Production, page_detail("p1", "about", "<p>About us</p>"))
        .with_detail(Environment::Production, page_detail("p2", "faq", "<p>Answers</p>"))
        .with_detail(Environment::Staging, page_detail("s2", "faq", "<p>Old answers</p>"));
    let h = harness(shop, Vec::new()).await;

    let before = h.service.compare(EntityKind::Page, &SilentReporter).await.unwrap();
    assert_eq!(before.missing_in_staging, 1);
    assert_eq!(before.with_differences, 1);

    h.service
        .sync(EntityKind::Page, &keys(&["about", "faq"]), Environment::Staging, &SilentReporter)
        .await
        .unwrap();

    let after = h.service.compare(EntityKind::Page, &SilentReporter).await.unwrap();
    assert_eq!(after.in_sync, 2);
    for key in ["about", "faq"] {
        let stored = h.store.get_by_key(EntityKind::Page, key).await.unwrap().unwrap();
        assert_eq!(stored.differences, IN_SYNC, "{key} should be in sync");
    }
    let about = h.store.get_by_key(EntityKind::Page, "about").await.unwrap().unwrap();
    assert_eq!(about.staging_id.as_deref(), Some("gid://fake/staging/1"));
}
