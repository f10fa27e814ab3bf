mod common;

use common::RecordingExecutor;
use serde_json::json;
use sqlweave::prelude::*;
use sqlweave::{ConnectionRegistry, RegistryConfig};
use std::time::Duration;

fn registry(config: RegistryConfig) -> ConnectionRegistry<RecordingExecutor> {
    let mut registry = ConnectionRegistry::with_config(config);
    registry.add(
        "primary",
        RecordingExecutor::new()
            .with_rows(vec![json!({"name": "from-primary"})])
            .with_affected(1),
    );
    registry.add(
        "replica",
        RecordingExecutor::new().with_rows(vec![json!({"name": "from-replica"})]),
    );
    registry
}

#[tokio::test]
async fn routes_to_current_connection() {
    let mut registry = registry(RegistryConfig::new());

    let value = select("products").select(&["name"]).single(&registry).await.unwrap();
    assert_eq!(value, Some(json!("from-primary")));

    registry.use_connection("replica").unwrap();
    let value = select("products").select(&["name"]).single(&registry).await.unwrap();
    assert_eq!(value, Some(json!("from-replica")));

    registry.use_default();
    delete("products")
        .filter("id", "eq", "1")
        .execute(&registry)
        .await
        .unwrap();

    let primary = registry.get("primary").unwrap();
    assert_eq!(primary.calls().len(), 2);
    assert_eq!(
        primary.last().sql,
        "DELETE FROM products WHERE products.id = ?"
    );
    assert_eq!(registry.get("replica").unwrap().calls().len(), 1);
}

#[tokio::test]
async fn counts_queries_per_connection() {
    let registry = registry(RegistryConfig::new());

    select("products").get(&registry).await.unwrap();
    select("products").get(&registry).await.unwrap();

    let stats = registry.stats("primary").unwrap();
    assert_eq!(stats.queries, 2);
    assert_eq!(stats.failed, 0);
    assert!(stats.max_duration <= stats.total_duration);
    assert_eq!(registry.stats("replica").unwrap().queries, 0);

    registry.reset_stats();
    assert_eq!(registry.stats("primary").unwrap().queries, 0);
}

#[tokio::test]
async fn failed_calls_are_counted() {
    let mut registry = ConnectionRegistry::new();
    registry.add("broken", RecordingExecutor::new().failing("connection reset"));

    let err = select("products").get(&registry).await.unwrap_err();
    assert!(matches!(err, WeaveError::Execution(_)));

    let stats = registry.stats("broken").unwrap();
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.failed, 1);
}

#[tokio::test]
async fn validation_errors_skip_the_registry() {
    let registry = registry(RegistryConfig::new());
    let err = select("products")
        .filter("price", "approx", "1")
        .get(&registry)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(registry.stats("primary").unwrap().queries, 0);
}

#[tokio::test]
async fn slow_calls_time_out() {
    let mut registry =
        ConnectionRegistry::with_config(RegistryConfig::new().with_query_timeout(Duration::from_millis(20)));
    registry.add(
        "slow",
        RecordingExecutor::new().with_delay(Duration::from_millis(500)),
    );

    let err = select("products").get(&registry).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(err, WeaveError::Timeout(d) if d == Duration::from_millis(20)));
    assert_eq!(registry.stats("slow").unwrap().failed, 1);
}

#[tokio::test]
async fn slow_threshold_does_not_fail_the_call() {
    let mut registry = ConnectionRegistry::with_config(
        RegistryConfig::new().with_slow_query_threshold(Duration::from_millis(1)),
    );
    registry.add(
        "slow",
        RecordingExecutor::new()
            .with_delay(Duration::from_millis(10))
            .with_rows(vec![json!({"n": 1})]),
    );

    let rows = select("products").get(&registry).await.unwrap();
    assert_eq!(rows.len(), 1);
    let stats = registry.stats("slow").unwrap();
    assert_eq!(stats.failed, 0);
    assert!(stats.max_duration >= Duration::from_millis(10));
}

#[tokio::test]
async fn empty_registry_reports_unknown_connection() {
    let registry: ConnectionRegistry<RecordingExecutor> = ConnectionRegistry::new();
    let err = select("products").get(&registry).await.unwrap_err();
    assert!(matches!(err, WeaveError::UnknownConnection(_)));
}
