use std::time::Duration;

use async_trait::async_trait;
use shared::{error::OperationError, protocol::OperationPayload};
use tracing::debug;
use uuid::Uuid;

/// The asynchronous half of a submission. Production code would call an API
/// client here; the demo build waits out a fixed latency instead.
#[async_trait]
pub trait OperationExecutor<D: Sync>: Send + Sync {
    async fn execute(&self, draft: &D) -> Result<OperationPayload, OperationError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedResponse {
    Empty,
    /// Fresh receipt id per call, as an upload acknowledgement.
    Receipt,
    Fail(OperationError),
}

#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    latency: Duration,
    response: SimulatedResponse,
}

impl SimulatedExecutor {
    pub fn succeeding(latency: Duration) -> Self {
        Self {
            latency,
            response: SimulatedResponse::Empty,
        }
    }

    pub fn with_receipt(latency: Duration) -> Self {
        Self {
            latency,
            response: SimulatedResponse::Receipt,
        }
    }

    pub fn failing(latency: Duration, error: OperationError) -> Self {
        Self {
            latency,
            response: SimulatedResponse::Fail(error),
        }
    }
}

#[async_trait]
impl<D: Sync> OperationExecutor<D> for SimulatedExecutor {
    async fn execute(&self, _draft: &D) -> Result<OperationPayload, OperationError> {
        debug!(
            latency_ms = crate::timeout_millis(self.latency),
            "simulating operation latency"
        );
        tokio::time::sleep(self.latency).await;
        match &self.response {
            SimulatedResponse::Empty => Ok(OperationPayload::None),
            SimulatedResponse::Receipt => Ok(OperationPayload::UploadReceipt {
                receipt_id: Uuid::new_v4(),
            }),
            SimulatedResponse::Fail(err) => Err(err.clone()),
        }
    }
}
