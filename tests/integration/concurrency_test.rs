//! Registry behaviour under concurrent churn.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Notify;

use switchyard::{AppResult, ChannelMessage, ChannelTransport, Disposable, ErrorKind};

use crate::helpers::{RecordingTransport, SharedTransport, counting_listener, install, registry};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registration_then_creation_counts_exactly() {
    let registry = registry();
    let count = Arc::new(AtomicUsize::new(0));

    let tasks = (0..8).map(|_| {
        let registry = registry.clone();
        let count = count.clone();
        tokio::spawn(async move {
            let mut kept = Vec::new();
            for i in 0..20 {
                let reg = counting_listener(&registry, &count);
                if i % 4 == 0 {
                    reg.dispose();
                } else {
                    kept.push(reg);
                }
            }
            kept
        })
    });
    let kept: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .flat_map(|r| r.unwrap())
        .collect();
    assert_eq!(kept.len(), 8 * 15);
    assert_eq!(registry.listener_count(), kept.len());

    let creations = (0..50).map(|n| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.create_channel(format!("c{n}")).await })
    });
    for result in join_all(creations).await {
        result.unwrap().unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), kept.len() * 50);
    assert_eq!(registry.channel_count(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dispose_during_creation_never_double_fires() {
    let registry = registry();
    let count = Arc::new(AtomicUsize::new(0));
    let registrations: Vec<_> = (0..10).map(|_| counting_listener(&registry, &count)).collect();

    let creations: Vec<_> = (0..40)
        .map(|n| {
            let registry = registry.clone();
            tokio::spawn(async move { registry.create_channel(format!("c{n}")).await })
        })
        .collect();
    for reg in &registrations {
        reg.dispose();
    }
    for result in join_all(creations).await {
        result.unwrap().unwrap();
    }

    // Each listener fires at most once per channel.
    assert!(count.load(Ordering::SeqCst) <= 10 * 40);
    assert_eq!(registry.listener_count(), 0);

    let before = count.load(Ordering::SeqCst);
    registry.create_channel("after").await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_replacement_disposes_each_loser_once() {
    let registry = registry();
    let recorders: Vec<_> = (0..16).map(|_| RecordingTransport::new("hot")).collect();

    let installs = recorders.iter().map(|recorder| {
        let registry = registry.clone();
        let recorder = recorder.clone();
        tokio::spawn(async move { install(&registry, "hot", &recorder).await })
    });
    for result in join_all(installs).await {
        result.unwrap();
    }

    let live: Vec<_> = recorders.iter().filter(|r| r.disposals() == 0).collect();
    assert_eq!(live.len(), 1);
    assert!(recorders.iter().all(|r| r.disposals() <= 1));
    assert_eq!(registry.transport_count(), 1);

    let snapshot = registry.metrics().snapshot();
    assert_eq!(snapshot.transports_created, 16);
    assert_eq!(snapshot.transports_disposed, 15);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_creation_of_same_id_publishes_one() {
    let registry = registry();

    let creations = (0..20).map(|_| {
        let registry = registry.clone();
        tokio::spawn(async move { registry.create_channel("dup").await })
    });
    let results: Vec<_> = join_all(creations)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let created = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| r.as_ref().is_err_and(|e| e.kind == ErrorKind::ChannelExists))
        .count();
    assert_eq!(created, 1);
    assert_eq!(rejected, 19);
    assert_eq!(registry.channel_count(), 1);
}

/// Transport whose disposal parks until released.
#[derive(Debug)]
struct ParkedTransport {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl ChannelTransport for ParkedTransport {
    fn id(&self) -> &str {
        "slow"
    }

    fn deliver(&self, _message: ChannelMessage) -> AppResult<()> {
        Ok(())
    }

    async fn dispose(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_slow_replacement_does_not_block_other_ids_or_lookups() {
    let registry = registry();
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    {
        let entered = entered.clone();
        let release = release.clone();
        registry
            .create_channel_transport("slow", move || Ok(ParkedTransport { entered, release }))
            .await
            .unwrap();
    }

    let replacement = RecordingTransport::new("slow");
    let replacing = {
        let registry = registry.clone();
        let replacement = replacement.clone();
        tokio::spawn(async move {
            registry
                .create_channel_transport("slow", move || Ok(SharedTransport(replacement)))
                .await
        })
    };
    entered.notified().await;

    let fast = RecordingTransport::new("fast");
    tokio::time::timeout(Duration::from_secs(5), install(&registry, "fast", &fast))
        .await
        .expect("another id waited on a parked disposal");

    let current = registry.get_channel_transport("slow").unwrap();
    let delivered = current.deliver(ChannelMessage::new("slow", serde_json::json!("probe"), None));
    assert!(delivered.is_ok());
    assert_eq!(replacement.payloads(), vec![serde_json::json!("probe")]);
    assert!(!replacing.is_finished());

    release.notify_one();
    replacing.await.unwrap().unwrap();
}
