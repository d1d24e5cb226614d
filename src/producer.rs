//! NATS publisher for prediction responses

use crate::types::prediction::PredictionResponse;
use anyhow::Result;
use async_nats::{Client, Subject};
use tracing::debug;

/// Publishes responses to the requester's reply subject, or to the shared
/// response subject when the request carried none
#[derive(Clone)]
pub struct ResponseProducer {
    client: Client,
    subject: String,
}

impl ResponseProducer {
    /// Create a new response producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a prediction response
    pub async fn publish(&self, response: &PredictionResponse, reply: Option<Subject>) -> Result<()> {
        let payload = serde_json::to_vec(response)?;
        let target = reply.unwrap_or_else(|| Subject::from(self.subject.as_str()));

        self.client.publish(target.clone(), payload.into()).await?;

        debug!(
            response_id = %response.response_id,
            request_id = %response.request_id,
            subject = %target,
            status = response.outcome.status(),
            "Published prediction response"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
