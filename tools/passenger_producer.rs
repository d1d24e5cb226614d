//! Test Passenger Producer
//!
//! Generates random passenger records and publishes them as prediction
//! requests to NATS for service testing.

use rand::Rng;
use std::time::Duration;
use titanic_survival::types::{passenger::RawPassengerRecord, prediction::PredictionRequest};
use tracing::{info, warn};

/// Passenger generator for testing
struct PassengerGenerator {
    rng: rand::rngs::ThreadRng,
    request_counter: u64,
}

impl PassengerGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            request_counter: 0,
        }
    }

    fn next_request(&mut self, passenger: RawPassengerRecord) -> PredictionRequest {
        self.request_counter += 1;
        PredictionRequest {
            request_id: format!("req_{:012}", self.request_counter),
            passenger,
        }
    }

    /// Generate a passenger whose attributes are all within their domains
    fn generate_valid(&mut self) -> PredictionRequest {
        let pclass = self.rng.gen_range(1..=3);
        let fare = match pclass {
            1 => self.rng.gen_range(25.0..520.0),
            2 => self.rng.gen_range(10.0..75.0),
            _ => self.rng.gen_range(0.0..40.0),
        };
        let passenger = RawPassengerRecord::new(
            pclass,
            self.random_choice(&["male", "female"]),
            f64::from(self.rng.gen_range(0..=80)),
            self.rng.gen_range(0..=4),
            self.rng.gen_range(0..=3),
            (fare * 100.0_f64).round() / 100.0,
            self.random_choice(&["C", "Q", "S"]),
        );
        self.next_request(passenger)
    }

    /// Generate a passenger with one attribute outside its domain
    fn generate_invalid(&mut self) -> PredictionRequest {
        let mut request = self.generate_valid();
        let passenger = &mut request.passenger;
        match self.rng.gen_range(0..4) {
            0 => passenger.pclass = 4.0,
            1 => passenger.sex = "unknown".into(),
            2 => passenger.age = 130.0,
            _ => passenger.embarked = "X".into(),
        }
        request
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Share of invalid passengers; unparseable or non-finite input falls back to 5%
fn parse_rate(arg: Option<&str>) -> f64 {
    arg.and_then(|s| s.parse::<f64>().ok())
        .filter(|rate| rate.is_finite())
        .unwrap_or(0.05)
        .clamp(0.0, 1.0)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("passenger_producer=info".parse()?),
        )
        .init();

    info!("Starting Test Passenger Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("titanic.passengers");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let invalid_rate = parse_rate(args.get(4).map(|s| s.as_str()));
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        invalid_rate = invalid_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, invalid_rate, delay_ms).await;
        }
    };

    let mut generator = PassengerGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} passengers...", count);

    let mut valid_count = 0;
    let mut invalid_count = 0;

    for i in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            invalid_count += 1;
            generator.generate_invalid()
        } else {
            valid_count += 1;
            generator.generate_valid()
        };

        let payload = serde_json::to_vec(&request)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} passengers ({} valid, {} invalid)",
                i + 1,
                count,
                valid_count,
                invalid_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    client.flush().await?;

    info!(
        "Completed! Published {} passengers ({} valid, {} invalid)",
        count, valid_count, invalid_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, invalid_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = PassengerGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let request = if rng.gen_bool(invalid_rate) {
            generator.generate_invalid()
        } else {
            generator.generate_valid()
        };

        let json = serde_json::to_string_pretty(&request)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample request {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
