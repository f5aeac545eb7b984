use tracing::{error, info};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::types::{AuthToken, ContestResult};

/// Maximum number of contests per upload request.
pub const BATCH_SIZE: usize = 100;

/// Uploads `records` in order, one batch of at most [`BATCH_SIZE`] at a time.
///
/// The first rejected or failed batch stops the upload. Batches accepted before it stay
/// stored; the next run reconciles past them.
pub async fn submit(
    client: &ApiClient,
    token: &AuthToken,
    records: &[ContestResult],
) -> Result<usize, ApiError> {
    if records.is_empty() {
        info!("No data to send to API");
        return Ok(0);
    }

    let total = records.len().div_ceil(BATCH_SIZE);
    info!(records = records.len(), batches = total, "Starting upload");

    let mut submitted = 0;
    for (index, batch) in records.chunks(BATCH_SIZE).enumerate() {
        let number = index + 1;
        info!(
            batch_start = index * BATCH_SIZE,
            batch_size = batch.len(),
            "Sending batch {}/{}",
            number,
            total
        );

        client
            .save_results(token, batch)
            .await
            .map_err(|e| match e {
                ApiError::Status { status, body, .. } => {
                    error!(status, batch = number, submitted, "Batch rejected");
                    ApiError::BatchRejected {
                        batch: number,
                        total,
                        status,
                        body,
                    }
                }
                ApiError::Transport { source, .. } => {
                    error!(error = %source, batch = number, submitted, "Batch failed");
                    ApiError::BatchFailed {
                        batch: number,
                        total,
                        source,
                    }
                }
                other => other,
            })?;

        submitted += batch.len();
        info!(batch = number, "Batch sent successfully");
    }

    info!(total_batches = total, submitted, "All batches sent successfully");
    Ok(submitted)
}
