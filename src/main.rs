//! Titanic Survival Prediction Service - Main Entry Point
//!
//! Consumes passenger records from NATS, predicts survival with the loaded
//! classifier, and publishes one response per request.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use titanic_survival::{
    config::{AppConfig, LoggingConfig},
    consumer::RequestConsumer,
    metrics::{MetricsReporter, PredictionMetrics},
    producer::ResponseProducer,
    service::PredictionService,
    types::prediction::{PredictionRequest, PredictionResponse},
};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("titanic_survival={}", logging.level)))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Titanic Survival Prediction Service");

    // The model is loaded exactly once; without it the service does not start
    let service = Arc::new(
        PredictionService::from_config(&config.model).context("Failed to load survival model")?,
    );
    info!(
        model = %service.model_name(),
        features = service.encoder().feature_count(),
        "Prediction service initialized"
    );

    let metrics = Arc::new(PredictionMetrics::new());

    // Connect to NATS
    let client = async_nats::connect(&config.nats.url).await?;
    info!("Connected to NATS at {}", config.nats.url);

    let consumer = RequestConsumer::new(client.clone(), &config.nats.request_subject);
    let producer = Arc::new(ResponseProducer::new(
        client.clone(),
        &config.nats.response_subject,
    ));

    let num_workers = config.pipeline.workers.max(1);
    info!(
        workers = num_workers,
        requests = %consumer.subject(),
        responses = %producer.subject(),
        "Starting request processing loop"
    );

    let semaphore = Arc::new(Semaphore::new(num_workers));

    let reporter = MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs);
    tokio::spawn(reporter.start());

    let mut subscription = consumer.subscribe().await?;

    // Registered once so a signal arriving while waiting for a permit is kept
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let message = tokio::select! {
            message = subscription.next() => match message {
                Some(message) => message,
                None => break,
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit?,
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        };

        let service = service.clone();
        let producer = producer.clone();
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let start_time = Instant::now();

            let request = match serde_json::from_slice::<PredictionRequest>(&message.payload) {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize prediction request");
                    metrics.record_failure();
                    return;
                }
            };

            // Every parsed request is answered, including classifier failures
            let outcome = service.outcome(&request.passenger);
            let processing_time = start_time.elapsed();
            metrics.record_outcome(&outcome, processing_time);

            debug!(
                request_id = %request.request_id,
                status = outcome.status(),
                processing_time_us = processing_time.as_micros(),
                "Request processed"
            );

            let response = PredictionResponse::new(
                request.request_id,
                outcome,
                service.model_name().to_string(),
                processing_time.as_micros() as u64,
            );

            if let Err(e) = producer.publish(&response, message.reply.clone()).await {
                error!(
                    request_id = %response.request_id,
                    error = %e,
                    "Failed to publish prediction response"
                );
            }

            drop(permit);
        });
    }

    // Let in-flight requests finish
    let _ = semaphore.acquire_many(num_workers as u32).await;
    client.flush().await.ok();

    info!("Service shutting down...");
    metrics.print_summary();

    Ok(())
}
