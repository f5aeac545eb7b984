use tracing::info;

use crate::api::ApiClient;
use crate::error::Result;
use crate::extract::Extractor;
use crate::mapper;
use crate::types::{Credentials, Summary};
use crate::uploader;

/// Runs one ingestion pass: extract, log in, reconcile, map, upload.
///
/// The first failing step ends the run; nothing is retried.
pub async fn run(
    extractor: &dyn Extractor,
    client: &ApiClient,
    credentials: &Credentials,
) -> Result<Summary> {
    let rows = extractor.fetch_raw_table().await?;
    info!(rows_count = rows.len(), "Raw table extracted");

    let token = client.login(credentials).await?;
    let low_water_mark = client.last_contest(&token).await?;
    info!(low_water_mark, "Filtering contests newer than low-water-mark");

    let results = mapper::map_rows(&rows, low_water_mark)?;
    if results.is_empty() {
        info!("No new contests to process");
    } else {
        info!(count = results.len(), "Found new contests to process");
    }

    let records_processed = uploader::submit(client, &token, &results).await?;
    Ok(Summary { records_processed })
}
