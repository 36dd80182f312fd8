use std::sync::Arc;
use std::time::Duration;

use routeros_hotspot::{ClientError, Config, MikroTikClient, Result};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    setup_tracing();

    let config = Config::from_env();
    let Some(router) = config.router.clone() else {
        return Err(ClientError::Config(
            "no router configured (set ROUTER_CONFIG or ROUTEROS_HOST)".to_string(),
        ));
    };
    router.validate().map_err(ClientError::Config)?;

    tracing::info!(
        "Polling hotspot on {} as '{}' every {}s",
        router.address(),
        router.username,
        config.poll_interval_secs
    );

    let client = Arc::new(MikroTikClient::new(router));

    // Canal de apagado ordenado
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    let poller = start_poll_loop(shutdown_rx, client.clone(), config.poll_interval_secs);
    if let Err(e) = poller.await {
        tracing::error!("Poll loop aborted: {}", e);
    }

    client.disconnect().await;
    match client.metrics().encode_metrics().await {
        Ok(text) => tracing::debug!("Final metrics:\n{}", text),
        Err(e) => tracing::warn!("Could not encode metrics: {}", e),
    }
    Ok(())
}

fn start_poll_loop(
    mut shutdown_rx: watch::Receiver<bool>,
    client: Arc<MikroTikClient>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Stopping poll loop");
                        break;
                    }
                }
            }

            let start = std::time::Instant::now();
            match client.get_active_users().await {
                Ok(users) => {
                    tracing::info!(
                        "{} active hotspot user(s) in {:.3}s",
                        users.len(),
                        start.elapsed().as_secs_f64()
                    );
                    for user in &users {
                        tracing::debug!(
                            "  - {} {} ({}) up {}s",
                            user.mac_address,
                            user.ip_address,
                            user.name,
                            user.uptime
                        );
                    }
                }
                // no automatic retry; the next tick reconnects
                Err(e) => tracing::warn!("Polling active users failed: {}", e),
            }
        }
    })
}

fn setup_tracing() {
    // RUST_LOG si está definida, "info" por defecto
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
