//! Service behaviour over the durable file store.

use std::sync::Arc;
use std::time::Duration;

use logvault::{FileLogStore, FilterSet, LogLevel, LogService, LogStore};
use serde_json::{Value, json};
use tempfile::TempDir;

fn event(level: &str, message: &str, ts: &str) -> Value {
    json!({
        "level": level,
        "message": message,
        "resourceId": "server-1234",
        "timestamp": ts,
        "traceId": "t1",
        "spanId": "s1",
        "commit": "c1"
    })
}

#[tokio::test]
async fn entries_survive_restart_and_stay_queryable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs.json");

    {
        let service = LogService::new(FileLogStore::at(&path).await.unwrap());
        service
            .ingest(&event("info", "Request processed", "2024-01-15T12:00:00.000Z"))
            .await
            .unwrap();
        service
            .ingest(&event("error", "Database connection failed", "2024-01-15T14:00:00.000Z"))
            .await
            .unwrap();
    }

    let service = LogService::new(FileLogStore::at(&path).await.unwrap());
    let found = service
        .query(&FilterSet::new().with_resource_id("1234"))
        .await
        .unwrap();
    let messages: Vec<_> = found.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, ["Database connection failed", "Request processed"]);

    let errors = service.query(&FilterSet::new().with_level("Error")).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].level, LogLevel::Error);
}

#[tokio::test]
async fn rejected_event_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("logs.json");
    let service = LogService::new(FileLogStore::at(&path).await.unwrap());
    let before = std::fs::read(&path).unwrap();

    let mut body = event("info", "m", "2024-01-15T12:00:00Z");
    body["metadata"] = json!(["not", "an", "object"]);
    assert!(service.ingest(&body).await.is_err_and(|e| e.is_validation()));

    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ingest_reaches_disk_and_observers_in_one_order() {
    let dir = TempDir::new().unwrap();
    let service = Arc::new(LogService::new(
        FileLogStore::at(dir.path().join("logs.json")).await.unwrap(),
    ));
    let mut observer = service.subscribe();

    let tasks: Vec<_> = (0..25)
        .map(|i| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .ingest(&event("debug", &format!("m{i}"), "2024-01-15T12:00:00Z"))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let on_disk = service.store().read_all().await.unwrap();
    assert_eq!(on_disk.len(), 25);
    for entry in &on_disk {
        assert_eq!(observer.try_recv().as_ref(), Some(entry));
    }
}

fn leftover_temp_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .count()
}

#[tokio::test]
async fn aborted_ingest_never_stores_without_publishing() {
    let dir = TempDir::new().unwrap();
    let service = LogService::new(FileLogStore::at(dir.path().join("logs.json")).await.unwrap());
    let mut observer = service.subscribe();

    for i in 0..50 {
        let pending = tokio::spawn({
            let service = service.clone();
            async move {
                service
                    .ingest(&event("info", &format!("m{i}"), "2024-01-15T12:00:00Z"))
                    .await
            }
        });
        for _ in 0..i % 5 {
            tokio::task::yield_now().await;
        }
        pending.abort();
        let _ = pending.await;
    }
    service
        .ingest(&event("info", "last", "2024-01-15T12:00:01Z"))
        .await
        .unwrap();

    let mut published = Vec::new();
    let mut on_disk = Vec::new();
    for _ in 0..200 {
        while let Some(entry) = observer.try_recv() {
            published.push(entry);
        }
        on_disk = service.store().read_all().await.unwrap();
        if published.len() == on_disk.len() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(published, on_disk);
    assert_eq!(on_disk.last().map(|e| e.message.as_str()), Some("last"));
    assert_eq!(leftover_temp_files(dir.path()), 0);
}
