use fulfillment_server::{
    Config, FulfillmentEngine, InMemoryTableDirectory, StaticCatalog, setup_environment,
};
use shared::message::TopicFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    setup_environment(&config)?;

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Fulfillment server starting"
    );

    // The catalog and table directory are fed by the surrounding platform;
    // until that wiring lands the server runs with empty in-memory ones.
    let catalog = StaticCatalog::new();
    let tables = InMemoryTableDirectory::new();
    let engine = FulfillmentEngine::new(&config, catalog, tables)?;

    // Log every event as a liveness trace for connected boards
    let mut subscription = engine.bus().subscribe_topic(TopicFilter::All);
    let shutdown = engine.bus().shutdown_token().clone();
    let monitor = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                event = subscription.recv() => match event {
                    Some(event) => {
                        tracing::debug!(topic = %event.topic, event_id = %event.event_id, "Event");
                    }
                    None => break,
                },
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    engine.shutdown();
    let _ = monitor.await;

    Ok(())
}
