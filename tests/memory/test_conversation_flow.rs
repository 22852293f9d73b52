// The core memory bookkeeping the chat handler relies on: store turns,
// fetch the recent window, concatenate with the next message.

use medical_rag_node::memory::{MemoryStore, MemoryStoreConfig, Role, SessionConfig};
use medical_rag_node::utils::context::build_input_with_context;

#[tokio::test]
async fn test_turns_accumulate_and_window_concatenates() {
    let store = MemoryStore::new(MemoryStoreConfig::default());
    let session_id = store.create_session().await.unwrap();

    store
        .put(&session_id, Role::User, "What causes acne?".to_string())
        .await
        .unwrap();
    store
        .put(&session_id, Role::Assistant, "Clogged pores.".to_string())
        .await
        .unwrap();

    let context = store.recent(&session_id, 5).await;
    let input = build_input_with_context(&context, "How is it treated?");

    assert_eq!(
        input,
        "What causes acne? Clogged pores. How is it treated?"
    );
}

#[tokio::test]
async fn test_window_holds_only_the_most_recent_turns() {
    let store = MemoryStore::new(MemoryStoreConfig::default());
    let session_id = store.create_session().await.unwrap();

    for i in 0..8 {
        store
            .put(&session_id, Role::User, format!("turn {}", i))
            .await
            .unwrap();
    }

    let context = store.recent(&session_id, 5).await;
    assert_eq!(context.len(), 5);
    assert_eq!(context[0].content, "turn 3");
    assert_eq!(context[4].content, "turn 7");
}

#[tokio::test]
async fn test_first_turn_has_no_context() {
    let store = MemoryStore::new(MemoryStoreConfig::default());
    let session_id = store.create_session().await.unwrap();

    let context = store.recent(&session_id, 5).await;
    let input = build_input_with_context(&context, "What causes acne?");

    assert_eq!(input, "What causes acne?");
}

#[tokio::test]
async fn test_destroyed_session_loses_its_turns() {
    let store = MemoryStore::new(MemoryStoreConfig::default());
    let session_id = store.create_session().await.unwrap();

    store
        .put(&session_id, Role::User, "remember this".to_string())
        .await
        .unwrap();
    store.destroy_session(&session_id).await;

    assert!(store.recent(&session_id, 5).await.is_empty());
    assert!(store.put(&session_id, Role::User, "gone".to_string()).await.is_err());
}

#[tokio::test]
async fn test_expired_session_is_not_reused() {
    let config = MemoryStoreConfig {
        session: SessionConfig {
            timeout_seconds: 0,
            ..Default::default()
        },
        ..Default::default()
    };
    let store = MemoryStore::new(config);
    let session_id = store.create_session().await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    // The handler's liveness check sees the session as gone
    assert!(!store.session_exists(&session_id).await);
}
