//! Registry behaviour through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;

use switchyard::{ChannelConfig, ReplacePolicy};
use switchyard::{AppError, ChannelState, ChannelSubscription, Disposable, Disposer, ErrorKind};

use crate::helpers::{RecordingTransport, counting_listener, install, registry, registry_with};

#[tokio::test]
async fn test_ids_are_independent() {
    let registry = registry();
    let a = RecordingTransport::new("a");
    let b = RecordingTransport::new("b");
    install(&registry, "a", &a).await;
    install(&registry, "b", &b).await;
    registry.create_channel("a").await.unwrap();
    registry.create_channel("b").await.unwrap();

    registry.queue("a", json!("to-a"), None).unwrap();
    registry.queue("b", json!("to-b"), None).unwrap();

    let a2 = RecordingTransport::new("a");
    install(&registry, "a", &a2).await;

    assert_eq!(a.payloads(), vec![json!("to-a")]);
    assert_eq!(b.payloads(), vec![json!("to-b")]);
    assert_eq!(a.disposals(), 1);
    assert_eq!(b.disposals(), 0);
    assert_eq!(registry.get_channel_transport("b").unwrap().id(), "b");
}

#[tokio::test]
async fn test_listener_lifecycle() {
    let registry = registry();
    let active = Arc::new(AtomicUsize::new(0));
    let disposed = Arc::new(AtomicUsize::new(0));

    let _active = counting_listener(&registry, &active);
    let gone = counting_listener(&registry, &disposed);
    gone.dispose();

    for id in ["c1", "c2", "c3"] {
        registry.create_channel(id).await.unwrap();
    }

    assert_eq!(active.load(Ordering::SeqCst), 3);
    assert_eq!(disposed.load(Ordering::SeqCst), 0);
    assert_eq!(registry.listener_count(), 1);
}

#[tokio::test]
async fn test_double_dispose_is_harmless() {
    let registry = registry();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let reg = counting_listener(&registry, &first);
    let _other = counting_listener(&registry, &second);
    reg.dispose();
    reg.dispose();

    registry.create_channel("c1").await.unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_transport_replacement_redirects_live_channel() {
    let registry = registry();
    let first = RecordingTransport::new("c1");
    let second = RecordingTransport::new("c1");

    install(&registry, "c1", &first).await;
    let channel = registry.create_channel("c1").await.unwrap();
    channel.queue(json!(1), None).unwrap();

    install(&registry, "c1", &second).await;
    channel.queue(json!(2), None).unwrap();

    assert_eq!(first.disposals(), 1);
    assert_eq!(second.disposals(), 0);
    assert_eq!(first.payloads(), vec![json!(1)]);
    assert_eq!(second.payloads(), vec![json!(2)]);
}

#[tokio::test]
async fn test_queue_preserves_order() {
    let registry = registry();
    let transport = RecordingTransport::new("c1");
    install(&registry, "c1", &transport).await;
    registry.create_channel("c1").await.unwrap();

    for n in 0..20 {
        registry.queue("c1", json!(n), Some("feed")).unwrap();
    }

    let expected: Vec<_> = (0..20).map(|n| json!(n)).collect();
    assert_eq!(transport.payloads(), expected);
    assert_eq!(registry.metrics().snapshot().messages_queued, 20);
}

#[tokio::test]
async fn test_queue_missing_channel_has_no_side_effect() {
    let registry = registry();
    let transport = RecordingTransport::new("missing-id");
    install(&registry, "missing-id", &transport).await;

    let err = registry.queue("missing-id", json!(1), None).unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnknownChannel);
    assert!(transport.payloads().is_empty());
    assert_eq!(registry.channel_count(), 0);
}

#[tokio::test]
async fn test_sync_listeners_fire_before_async() {
    let registry = registry();
    let order = Arc::new(Mutex::new(Vec::new()));

    let _a1 = {
        let order = order.clone();
        registry.on_new_channel_async(move |_| {
            let order = order.clone();
            async move {
                order.lock().unwrap().push("a1");
                Ok(Disposer::noop().boxed())
            }
        })
    };
    let _s1 = {
        let order = order.clone();
        registry.on_new_channel(move |_| {
            order.lock().unwrap().push("s1");
            Ok(Disposer::noop().boxed())
        })
    };
    let _a2 = {
        let order = order.clone();
        registry.on_new_channel_async(move |_| {
            let order = order.clone();
            async move {
                order.lock().unwrap().push("a2");
                Ok(Disposer::noop().boxed())
            }
        })
    };
    let _s2 = {
        let order = order.clone();
        registry.on_new_channel(move |_| {
            order.lock().unwrap().push("s2");
            Ok(Disposer::noop().boxed())
        })
    };

    registry.create_channel("c1").await.unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["s1", "s2", "a1", "a2"]);
}

#[tokio::test]
async fn test_listener_can_queue_during_start() {
    let registry = registry();
    let transport = RecordingTransport::new("c1");
    install(&registry, "c1", &transport).await;

    let _welcome = registry.on_new_channel(|channel| {
        channel.queue(json!({"welcome": channel.id()}), Some("system"))?;
        Ok(Disposer::noop().boxed())
    });

    registry.create_channel("c1").await.unwrap();
    assert_eq!(transport.payloads(), vec![json!({"welcome": "c1"})]);
}

#[tokio::test]
async fn test_subscriptions_release_on_close() {
    let registry = registry();
    let released = Arc::new(Mutex::new(Vec::new()));

    let _listener = {
        let released = released.clone();
        registry.on_new_channel(move |_| {
            let released = released.clone();
            Ok(Disposer::new(move || released.lock().unwrap().push("listener".to_string())).boxed())
        })
    };
    let todos = {
        let released = released.clone();
        ChannelSubscription::new_async("todos", move |_params, _channel| {
            let released = released.clone();
            async move {
                Ok(Disposer::new(move || released.lock().unwrap().push("todos".to_string()))
                    .boxed())
            }
        })
    };

    let channel = registry.create_channel("c1").await.unwrap();
    channel.subscribe(&todos, Default::default()).await.unwrap();
    assert_eq!(channel.subscription_count(), 2);

    assert!(registry.close_channel("c1"));
    assert!(!registry.close_channel("c1"));

    assert_eq!(channel.state(), ChannelState::Closed);
    assert_eq!(*released.lock().unwrap(), vec!["todos", "listener"]);
}

#[tokio::test]
async fn test_async_listener_failure_closes_channel() {
    let registry = registry();
    let fail = registry.on_new_channel_async(|_| async {
        Err(AppError::listener_failed("subscription backend unavailable"))
    });

    let err = registry.create_channel("c1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ListenerFailed);
    assert!(registry.get_channel("c1").is_none());

    fail.dispose();
    let channel = registry.create_channel("c1").await.unwrap();
    assert!(channel.is_running());
}

#[tokio::test]
async fn test_close_existing_policy() {
    let registry = registry_with(ChannelConfig {
        replace_policy: ReplacePolicy::CloseExisting,
        ..ChannelConfig::default()
    });
    let old = registry.create_channel("c1").await.unwrap();
    let new = registry.create_channel("c1").await.unwrap();

    assert_eq!(old.state(), ChannelState::Closed);
    assert!(new.is_running());
    assert_eq!(registry.metrics().snapshot().channels_created, 2);
}

#[tokio::test]
async fn test_shutdown_disposes_transports() {
    let registry = registry();
    let a = RecordingTransport::new("a");
    let b = RecordingTransport::new("b");
    install(&registry, "a", &a).await;
    install(&registry, "b", &b).await;
    registry.create_channel("a").await.unwrap();

    registry.shutdown().await;

    assert_eq!(a.disposals(), 1);
    assert_eq!(b.disposals(), 1);
    assert_eq!(registry.channel_count(), 0);
    assert_eq!(registry.transport_count(), 0);
}
