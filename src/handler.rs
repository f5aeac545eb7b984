use serde::Serialize;
use serde_json::{Value, json};
use std::path::Path;
use tracing::{Instrument, error, info, info_span};

use crate::api::ApiClient;
use crate::config::{self, Config};
use crate::error::Result;
use crate::extract::{DownloadDirExtractor, Extractor, FileExtractor, HttpExtractor, TableFormat};
use crate::pipeline;
use crate::types::Summary;

pub const SUCCESS_MESSAGE: &str = "Successfully processed Lotofácil results";

/// HTTP-style outcome of one triggered run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON document, serialized.
    pub body: String,
}

/// Entry point for a trigger event. The event's content does not influence the
/// run; only its request id is used to correlate log lines.
///
/// `table` replaces the configured source with a local file.
pub async fn handle(event: &Value, table: Option<&Path>) -> HandlerResponse {
    let span = info_span!("ingest_run", correlation_id = %correlation_id(event));

    async {
        info!("Handler started");
        let outcome = match config::load() {
            Ok(config) => run_with_config(&config, table).await,
            Err(e) => Err(e),
        };
        respond(outcome)
    }
    .instrument(span)
    .await
}

pub async fn run_with_config(config: &Config, table: Option<&Path>) -> Result<Summary> {
    let extractor = extractor_for(config, table)?;
    let client = ApiClient::new(&config.api_url, config.api_timeout)?;
    pipeline::run(extractor.as_ref(), &client, &config.credentials).await
}

fn extractor_for(config: &Config, table: Option<&Path>) -> Result<Box<dyn Extractor>> {
    let extractor: Box<dyn Extractor> = match (table, &config.download_dir) {
        (Some(path), _) => Box::new(FileExtractor::new(
            path,
            TableFormat::for_path(path, config.csv_delimiter),
        )),
        (None, Some(dir)) => Box::new(DownloadDirExtractor::new(
            dir.clone(),
            &config.artifact_extension,
            config.download_timeout,
            config.table_format(),
        )),
        (None, None) => Box::new(HttpExtractor::new(
            &config.source_url,
            config.download_timeout,
            config.table_format(),
        )?),
    };
    Ok(extractor)
}

pub fn respond(outcome: Result<Summary>) -> HandlerResponse {
    match outcome {
        Ok(summary) => {
            info!(
                records_processed = summary.records_processed,
                "Handler completed successfully"
            );
            HandlerResponse {
                status_code: 200,
                body: json!({
                    "message": SUCCESS_MESSAGE,
                    "recordsProcessed": summary.records_processed,
                })
                .to_string(),
            }
        }
        Err(e) => {
            error!(kind = ?e.kind(), error = %e, "Handler failed");
            HandlerResponse {
                status_code: 500,
                body: json!({ "error": e.to_string() }).to_string(),
            }
        }
    }
}

fn correlation_id(event: &Value) -> String {
    event
        .pointer("/requestContext/requestId")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
