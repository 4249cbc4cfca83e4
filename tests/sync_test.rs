// tests/sync_test.rs

mod common;

use std::sync::Arc;

use advisor_agent::providers::registry::ProviderRegistry;
use advisor_agent::providers::traits::EmailDetail;
use advisor_agent::sync::state::SyncSource;

use common::{
    MockChatModel, MockCrmProvider, MockEmailProvider, MockEmbedder, build_state, crm_contact,
    email_detail,
};

const USER: i64 = 1;

#[tokio::test]
async fn test_full_email_sync_walks_all_pages() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let provider = Arc::new(MockEmailProvider::with_pages(vec![
        vec![
            email_detail("m1", "alice@example.com", "Hello", "First message"),
            email_detail("m2", "bob@example.com", "Update", "Second message"),
        ],
        vec![email_detail("m3", "carol@example.com", "Question", "Third message")],
    ]));
    registry.register_email(USER, provider.clone());
    let state = build_state(llm.clone(), embedder.clone(), registry).await;

    let report = state.sync.run_full_sync(USER, SyncSource::Email).await.unwrap();

    assert_eq!(report.imported, 3);
    assert_eq!(provider.list_call_count(), 2);
    assert_eq!(state.records.email_count(USER).await.unwrap(), 3);
    assert_eq!(embedder.call_count(), 3);
    // No standing instructions, so ingestion never reaches the model
    assert_eq!(llm.chat_call_count(), 0);

    let status = state.tracker.snapshot(USER, SyncSource::Email);
    assert!(!status.syncing);
    assert_eq!(status.imported_count, 3);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_resync_skips_known_records_without_refetching() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let provider = Arc::new(MockEmailProvider::with_pages(vec![vec![
        email_detail("m1", "alice@example.com", "Hello", "First message"),
    ]]));
    registry.register_email(USER, provider.clone());
    let state = build_state(llm, embedder, registry).await;

    let first = state.sync.run_full_sync(USER, SyncSource::Email).await.unwrap();
    assert_eq!(first.imported, 1);
    assert_eq!(provider.fetch_call_count(), 1);

    let second = state.sync.run_full_sync(USER, SyncSource::Email).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(provider.fetch_call_count(), 1);
    assert_eq!(state.records.email_count(USER).await.unwrap(), 1);
}

#[tokio::test]
async fn test_poll_skips_while_sync_in_flight() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let provider = Arc::new(MockEmailProvider::with_pages(vec![vec![
        email_detail("m1", "alice@example.com", "Hello", "Body"),
    ]]));
    registry.register_email(USER, provider.clone());
    let state = build_state(llm, embedder, registry).await;

    assert!(state.tracker.try_begin(USER, SyncSource::Email));

    let report = state.sync.run_incremental_poll(USER).await.unwrap();
    assert_eq!(report.imported, 0);
    assert_eq!(provider.list_call_count(), 0);

    // Full sync while the slot is held is an error, not a silent skip
    assert!(state.sync.run_full_sync(USER, SyncSource::Email).await.is_err());
}

#[tokio::test]
async fn test_fetch_failure_keeps_partial_import() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let provider = Arc::new(
        MockEmailProvider::with_pages(vec![vec![
            email_detail("m1", "alice@example.com", "Hello", "Body"),
            email_detail("m2", "bob@example.com", "Broken", "Body"),
        ]])
        .failing_fetch("m2"),
    );
    registry.register_email(USER, provider);
    let state = build_state(llm, embedder, registry).await;

    let result = state.sync.run_full_sync(USER, SyncSource::Email).await;
    assert!(result.is_err());

    assert_eq!(state.records.email_count(USER).await.unwrap(), 1);
    let status = state.tracker.snapshot(USER, SyncSource::Email);
    assert!(!status.syncing);
    assert_eq!(status.imported_count, 1);
    assert!(status.error.is_some());

    // The slot is released, so a retry can start
    assert!(state.tracker.try_begin(USER, SyncSource::Email));
}

#[tokio::test]
async fn test_blank_email_is_stored_without_embedding() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let blank = EmailDetail {
        id: "m1".to_string(),
        from_address: Some("alice@example.com".to_string()),
        ..EmailDetail::default()
    };
    registry.register_email(USER, Arc::new(MockEmailProvider::with_pages(vec![vec![blank]])));
    let state = build_state(llm, embedder.clone(), registry).await;

    let report = state.sync.run_full_sync(USER, SyncSource::Email).await.unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(embedder.call_count(), 0);
    assert_eq!(state.records.email_count(USER).await.unwrap(), 1);
}

#[tokio::test]
async fn test_sync_without_provider_fails() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let state = build_state(llm, embedder, Arc::new(ProviderRegistry::new())).await;

    let result = state.sync.run_full_sync(USER, SyncSource::Email).await;
    assert!(result.is_err());

    let status = state.tracker.snapshot(USER, SyncSource::Email);
    assert!(!status.syncing);
    assert!(status.error.is_some());
}

#[tokio::test]
async fn test_crm_sync_imports_contacts_with_notes() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    let provider = Arc::new(
        MockCrmProvider::with_pages(vec![
            vec![crm_contact("c1", "alice@example.com", "Alice", "Smith")],
            vec![crm_contact("c2", "bob@example.com", "Bob", "Jones")],
        ])
        .with_notes("c1", vec!["Met at conference", "Interested in bonds"]),
    );
    registry.register_crm(USER, provider.clone());
    let state = build_state(llm, embedder.clone(), registry).await;

    let report = state.sync.run_full_sync(USER, SyncSource::Crm).await.unwrap();

    assert_eq!(report.imported, 2);
    assert_eq!(provider.list_call_count(), 2);
    assert_eq!(state.records.contact_count(USER).await.unwrap(), 2);
    assert_eq!(embedder.call_count(), 2);

    // Notes are folded into the stored record
    let contacts = state.records.contacts_with_embeddings(USER).await.unwrap();
    let alice = contacts.iter().find(|c| c.external_id == "c1").unwrap();
    assert!(alice.notes.as_deref().unwrap().contains("Met at conference"));
    assert!(alice.notes.as_deref().unwrap().contains("Interested in bonds"));
}

#[tokio::test]
async fn test_email_and_crm_sync_are_independent_slots() {
    let llm = MockChatModel::new();
    let embedder = MockEmbedder::new();
    let registry = Arc::new(ProviderRegistry::new());
    registry.register_crm(
        USER,
        Arc::new(MockCrmProvider::with_pages(vec![vec![crm_contact(
            "c1",
            "alice@example.com",
            "Alice",
            "Smith",
        )]])),
    );
    let state = build_state(llm, embedder, registry).await;

    assert!(state.tracker.try_begin(USER, SyncSource::Email));
    let report = state.sync.run_full_sync(USER, SyncSource::Crm).await.unwrap();
    assert_eq!(report.imported, 1);
}
