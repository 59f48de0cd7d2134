/// Process instance workflow tests
///
/// Status transitions through the optimistic coordinator against the mock
/// store, including injected remote failures.
/// Run with: cargo test --test process_instances_tests

use std::sync::Arc;

use processflow::{
    CoordinatorConfig, Entity, EntityId, EntityKind, FlowError, MockStore, MutationError, Patch,
    ProcessInstances, ProcessStatus, RemoteStore, RollbackPolicy, Session, Value,
};

async fn setup() -> (Arc<MockStore>, ProcessInstances<MockStore>) {
    let store = Arc::new(MockStore::default());
    store
        .seed(
            EntityKind::ProcessInstances,
            vec![
                Entity::new(2)
                    .with_field("status", "em_andamento")
                    .with_field("created_at", "2024-01-01T00:00:00.000000Z"),
                Entity::new(1)
                    .with_field("status", "pendente")
                    .with_field("created_at", "2024-01-02T00:00:00.000000Z"),
            ],
        )
        .await;

    let instances = ProcessInstances::new(Arc::clone(&store), Session::new("u-7", "Marina"));
    instances.refresh().await.unwrap();
    (store, instances)
}

fn status_of(entity: &Entity) -> Option<&str> {
    entity.field("status").and_then(Value::as_str)
}

#[tokio::test]
async fn test_refresh_orders_newest_first() {
    let (_store, instances) = setup().await;

    let ids: Vec<String> = instances
        .instances()
        .iter()
        .map(|entity| entity.id().to_string())
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn test_update_status_confirms_with_store_entity() {
    let (store, instances) = setup().await;

    let updated = instances
        .update_status(1, ProcessStatus::Finalizado)
        .await
        .unwrap();

    assert_eq!(status_of(&updated), Some("finalizado"));
    assert!(updated.field("updated_at").is_some());

    let local = instances.collection().find(&EntityId::from(1)).unwrap();
    assert_eq!(local, updated);

    let remote = store
        .get(EntityKind::ProcessInstances, &EntityId::from(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remote, updated);
}

#[tokio::test]
async fn test_update_status_failure_rolls_back() {
    let (store, instances) = setup().await;
    let before = instances.instances();
    store.fail_next_with("network error");

    let err = instances
        .update_status(1, ProcessStatus::Finalizado)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MutationError::RemoteOperationFailed(FlowError::Remote("network error".into()))
    );
    assert_eq!(instances.instances(), before);
    assert_eq!(instances.stats().rolled_back, 1);
}

#[tokio::test]
async fn test_optimistic_status_visible_before_store_answers() {
    let (store, instances) = setup().await;
    let calls_before = store.call_count();

    let pending = instances
        .begin_status_update(2, ProcessStatus::Finalizado)
        .unwrap();

    let local = instances.collection().find(&EntityId::from(2)).unwrap();
    assert_eq!(status_of(&local), Some("finalizado"));
    assert_eq!(store.call_count(), calls_before);

    let confirmed = pending.settle().await.unwrap();
    assert_eq!(store.call_count(), calls_before + 1);
    assert_eq!(
        instances.collection().find(&EntityId::from(2)),
        Some(confirmed)
    );
}

#[tokio::test]
async fn test_unknown_instance_never_reaches_store() {
    let (store, instances) = setup().await;
    let calls_before = store.call_count();

    let err = instances
        .update_status("missing", ProcessStatus::EmAndamento)
        .await
        .unwrap_err();

    assert_eq!(err, MutationError::EntityNotFound(EntityId::from("missing")));
    assert_eq!(store.call_count(), calls_before);
}

#[tokio::test]
async fn test_remotely_deleted_instance_rolls_back() {
    let (store, instances) = setup().await;
    let before = instances.instances();
    store
        .delete(EntityKind::ProcessInstances, &EntityId::from(1))
        .await
        .unwrap();

    let err = instances
        .update_status(1, ProcessStatus::EmAndamento)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        MutationError::RemoteOperationFailed(FlowError::EntityNotFound(EntityId::from(1)))
    );
    assert_eq!(instances.instances(), before);
}

#[tokio::test]
async fn test_create_prepends_and_stamps_session_user() {
    let (_store, instances) = setup().await;

    let created = instances
        .create(Patch::new().set("title", "Cadastro Ambiental Rural"))
        .await
        .unwrap();

    assert_eq!(status_of(&created), Some("pendente"));
    assert_eq!(created.field("assigned_to"), Some(&Value::from("u-7")));
    assert_eq!(instances.instances().first(), Some(&created));
    assert_eq!(instances.instances().len(), 3);
}

#[tokio::test]
async fn test_create_failure_leaves_collection_alone() {
    let (store, instances) = setup().await;
    let before = instances.instances();
    store.fail_next(1);

    let result = instances.create(Patch::new().set("title", "Licença")).await;

    assert!(matches!(result, Err(FlowError::Remote(_))));
    assert_eq!(instances.instances(), before);
}

#[tokio::test]
async fn test_remove_deletes_remote_and_local() {
    let (store, instances) = setup().await;

    assert!(instances.remove(2).await.unwrap());
    assert!(instances.collection().find(&EntityId::from(2)).is_none());
    assert!(
        store
            .get(EntityKind::ProcessInstances, &EntityId::from(2))
            .await
            .unwrap()
            .is_none()
    );
    assert!(!instances.remove(2).await.unwrap());
}

#[tokio::test]
async fn test_status_counts() {
    let (_store, instances) = setup().await;
    instances
        .update_status(2, ProcessStatus::Finalizado)
        .await
        .unwrap();

    let counts = instances.status_counts();
    assert_eq!(counts[&ProcessStatus::Pendente], 1);
    assert_eq!(counts[&ProcessStatus::EmAndamento], 0);
    assert_eq!(counts[&ProcessStatus::Finalizado], 1);
}

#[tokio::test]
async fn test_entity_only_policy_through_service() {
    let (store, instances) = setup().await;
    let instances = instances
        .with_config(
            CoordinatorConfig::new("process_instances")
                .rollback_policy(RollbackPolicy::EntityOnly),
        )
        .unwrap();

    let pending_one = instances
        .begin_status_update(1, ProcessStatus::Finalizado)
        .unwrap();
    let confirmed_two = instances
        .update_status(2, ProcessStatus::Finalizado)
        .await
        .unwrap();

    store.fail_next(1);
    assert!(pending_one.settle().await.is_err());

    let local_one = instances.collection().find(&EntityId::from(1)).unwrap();
    assert_eq!(status_of(&local_one), Some("pendente"));
    assert_eq!(
        instances.collection().find(&EntityId::from(2)),
        Some(confirmed_two)
    );
}

#[tokio::test]
async fn test_begin_status_update_unknown_instance() {
    let (store, instances) = setup().await;
    let calls_before = store.call_count();

    let err = instances
        .begin_status_update("missing", ProcessStatus::Finalizado)
        .err()
        .unwrap();

    assert_eq!(err, FlowError::EntityNotFound(EntityId::from("missing")));
    assert_eq!(instances.stats().rejected, 1);
    assert_eq!(store.call_count(), calls_before);
}
