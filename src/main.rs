//! Switchyard demo — drives one channel end to end over an in-memory
//! transport.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use switchyard::logging::init_logging;
use switchyard::{
    AppConfig, AppError, Channel, ChannelMessage, ChannelRegistry, ChannelSubscription, Disposer,
    MemoryTransport, SubscriptionParams,
};

const CHANNEL_ID: &str = "demo-client";

#[tokio::main]
async fn main() {
    let env = std::env::var("SWITCHYARD_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!("Demo failed: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Switchyard demo v{}", env!("CARGO_PKG_VERSION"));

    let buffer_size = config.channels.transport_buffer_size;
    let registry = Arc::new(ChannelRegistry::new(config.channels));

    let _greeter = registry.on_new_channel(|channel: &Arc<Channel>| {
        tracing::info!(channel_id = %channel.id(), "Client connected");
        let id = channel.id().to_string();
        Ok(Disposer::new(move || tracing::info!(channel_id = %id, "Client released")).boxed())
    });

    let (transport, rx) = MemoryTransport::new(CHANNEL_ID, buffer_size);
    registry
        .create_channel_transport(CHANNEL_ID, move || Ok(transport))
        .await?;
    let channel = registry.create_channel(CHANNEL_ID).await?;

    let ticker = ChannelSubscription::new("ticker", |params: &SubscriptionParams, channel: &Arc<Channel>| {
        let symbol = params
            .get("symbol")
            .and_then(|v| v.as_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        channel.queue(json!({ "symbol": symbol, "subscribed": true }), Some("ticker"))?;
        Ok(Disposer::noop().boxed())
    });
    let mut params = SubscriptionParams::new();
    params.insert("symbol".to_string(), json!("SWY"));
    channel.subscribe(&ticker, params).await?;

    for n in 1..=3 {
        registry.queue(CHANNEL_ID, json!({ "tick": n }), Some("ticker"))?;
    }

    // Shutdown disposes the transport, which ends the drain loop.
    let drain = tokio::spawn(drain(rx));
    registry.shutdown().await;

    match drain.await {
        Ok(count) => tracing::info!(messages = count, "Demo finished"),
        Err(e) => return Err(AppError::internal(format!("Drain task failed: {e}"))),
    }

    let snapshot = registry.metrics().snapshot();
    tracing::info!(
        metrics = %serde_json::to_string(&snapshot)?,
        "Registry metrics"
    );

    Ok(())
}

/// Prints every delivered message until the transport ends or Ctrl-C.
async fn drain(mut rx: mpsc::Receiver<ChannelMessage>) -> usize {
    let mut count = 0;
    loop {
        tokio::select! {
            message = rx.recv() => match message {
                Some(message) => {
                    count += 1;
                    match message.to_json() {
                        Ok(json) => tracing::info!(message = %json, "Delivered"),
                        Err(e) => tracing::warn!(error = %e, "Unserializable message"),
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
        }
    }
    count
}
