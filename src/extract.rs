//! Sources of the raw results table.
//!
//! Everything upstream of [`RawRow`] lives here: downloading or waiting for
//! the published file and reading its columns by name. The rest of the crate
//! only ever sees typed rows.

use async_trait::async_trait;
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::error::ExtractError;
use crate::types::{RawPrize, RawPrizes, RawRow};

/// Interval between checks of the download directory.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn fetch_raw_table(&self) -> Result<Vec<RawRow>, ExtractError>;
}

/// File format of the published results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    /// Excel workbook; the first worksheet holds the table.
    Xlsx,
    /// Delimited text with the given separator.
    Delimited(u8),
}

impl TableFormat {
    /// Picks the format from a file extension. Anything but `xlsx` is read
    /// as delimited text.
    pub fn from_extension(extension: &str, delimiter: u8) -> Self {
        if extension.trim_start_matches('.').eq_ignore_ascii_case("xlsx") {
            TableFormat::Xlsx
        } else {
            TableFormat::Delimited(delimiter)
        }
    }

    pub fn for_path(path: &Path, delimiter: u8) -> Self {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(extension, delimiter)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Vec<RawRow>, ExtractError> {
        match self {
            TableFormat::Xlsx => parse_workbook(bytes),
            TableFormat::Delimited(delimiter) => parse_table(bytes, *delimiter),
        }
    }
}

/// Downloads the table straight from the source URL.
pub struct HttpExtractor {
    client: Client,
    url: String,
    timeout: Duration,
    format: TableFormat,
}

impl HttpExtractor {
    pub fn new(url: &str, timeout: Duration, format: TableFormat) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ExtractError::Download)?;

        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
            format,
        })
    }
}

#[async_trait]
impl Extractor for HttpExtractor {
    async fn fetch_raw_table(&self) -> Result<Vec<RawRow>, ExtractError> {
        info!(url = %self.url, format = ?self.format, "Downloading results table");

        let timed_out = |e: reqwest::Error| {
            if e.is_timeout() {
                ExtractError::Timeout {
                    waited: self.timeout,
                    artifact: self.url.clone(),
                }
            } else {
                ExtractError::Download(e)
            }
        };

        let response = self.client.get(&self.url).send().await.map_err(timed_out)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(timed_out)?;
        let rows = self.format.parse(bytes.as_ref())?;
        info!(rows = rows.len(), "Results table loaded");
        Ok(rows)
    }
}

/// Reads a table file that is already on disk.
pub struct FileExtractor {
    path: PathBuf,
    format: TableFormat,
}

impl FileExtractor {
    pub fn new(path: impl Into<PathBuf>, format: TableFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }
}

#[async_trait]
impl Extractor for FileExtractor {
    async fn fetch_raw_table(&self) -> Result<Vec<RawRow>, ExtractError> {
        let bytes = tokio::fs::read(&self.path).await?;
        let rows = self.format.parse(&bytes)?;
        info!(path = %self.path.display(), rows = rows.len(), "Results table loaded");
        Ok(rows)
    }
}

/// Waits for an external downloader to drop the table into a directory.
///
/// The artifact is removed once parsed.
pub struct DownloadDirExtractor {
    dir: PathBuf,
    extension: String,
    timeout: Duration,
    poll_interval: Duration,
    format: TableFormat,
}

impl DownloadDirExtractor {
    pub fn new(
        dir: impl Into<PathBuf>,
        extension: &str,
        timeout: Duration,
        format: TableFormat,
    ) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
            timeout,
            poll_interval: POLL_INTERVAL,
            format,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl Extractor for DownloadDirExtractor {
    async fn fetch_raw_table(&self) -> Result<Vec<RawRow>, ExtractError> {
        let path = wait_for_artifact(&self.dir, &self.extension, self.timeout, self.poll_interval)
            .await?;
        info!(path = %path.display(), "Results file downloaded");

        let bytes = tokio::fs::read(&path).await?;
        let rows = self.format.parse(&bytes)?;

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "Failed to remove downloaded file");
        }

        info!(rows = rows.len(), "Results table loaded");
        Ok(rows)
    }
}

/// Polls `dir` at a fixed interval until a file ending in `.extension`
/// appears, or fails with [`ExtractError::Timeout`].
pub async fn wait_for_artifact(
    dir: &Path,
    extension: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<PathBuf, ExtractError> {
    let deadline = Instant::now() + timeout;

    loop {
        if let Some(path) = find_artifact(dir, extension).await? {
            return Ok(path);
        }
        if Instant::now() >= deadline {
            return Err(ExtractError::Timeout {
                waited: timeout,
                artifact: format!("*.{} in {}", extension, dir.display()),
            });
        }
        sleep(poll_interval).await;
    }
}

async fn find_artifact(dir: &Path, extension: &str) -> Result<Option<PathBuf>, ExtractError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut found = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches && entry.file_type().await?.is_file() {
            found.push(path);
        }
    }

    found.sort();
    Ok(found.into_iter().next())
}

/// One line of the published table, addressed by column header.
#[derive(Debug, Deserialize)]
struct TableRecord {
    #[serde(rename = "Concurso")]
    contest_number: u32,
    #[serde(rename = "Data Sorteio", deserialize_with = "br_date")]
    draw_date: NaiveDate,
    #[serde(rename = "Bola1")]
    ball1: u32,
    #[serde(rename = "Bola2")]
    ball2: u32,
    #[serde(rename = "Bola3")]
    ball3: u32,
    #[serde(rename = "Bola4")]
    ball4: u32,
    #[serde(rename = "Bola5")]
    ball5: u32,
    #[serde(rename = "Bola6")]
    ball6: u32,
    #[serde(rename = "Bola7")]
    ball7: u32,
    #[serde(rename = "Bola8")]
    ball8: u32,
    #[serde(rename = "Bola9")]
    ball9: u32,
    #[serde(rename = "Bola10")]
    ball10: u32,
    #[serde(rename = "Bola11")]
    ball11: u32,
    #[serde(rename = "Bola12")]
    ball12: u32,
    #[serde(rename = "Bola13")]
    ball13: u32,
    #[serde(rename = "Bola14")]
    ball14: u32,
    #[serde(rename = "Bola15")]
    ball15: u32,
    #[serde(rename = "Ganhadores 15 acertos")]
    winners15: u64,
    #[serde(rename = "Rateio 15 acertos")]
    payout15: String,
    #[serde(rename = "Ganhadores 14 acertos")]
    winners14: u64,
    #[serde(rename = "Rateio 14 acertos")]
    payout14: String,
    #[serde(rename = "Ganhadores 13 acertos")]
    winners13: u64,
    #[serde(rename = "Rateio 13 acertos")]
    payout13: String,
    #[serde(rename = "Ganhadores 12 acertos")]
    winners12: u64,
    #[serde(rename = "Rateio 12 acertos")]
    payout12: String,
    #[serde(rename = "Ganhadores 11 acertos")]
    winners11: u64,
    #[serde(rename = "Rateio 11 acertos")]
    payout11: String,
    #[serde(rename = "Acumulado 15 acertos", default)]
    accumulated15: String,
}

impl From<TableRecord> for RawRow {
    fn from(r: TableRecord) -> Self {
        RawRow {
            contest_number: r.contest_number,
            draw_date: r.draw_date,
            balls: [
                r.ball1, r.ball2, r.ball3, r.ball4, r.ball5, r.ball6, r.ball7, r.ball8, r.ball9,
                r.ball10, r.ball11, r.ball12, r.ball13, r.ball14, r.ball15,
            ],
            prizes: RawPrizes {
                fifteen: RawPrize {
                    winners: r.winners15,
                    payout: r.payout15,
                },
                fourteen: RawPrize {
                    winners: r.winners14,
                    payout: r.payout14,
                },
                thirteen: RawPrize {
                    winners: r.winners13,
                    payout: r.payout13,
                },
                twelve: RawPrize {
                    winners: r.winners12,
                    payout: r.payout12,
                },
                eleven: RawPrize {
                    winners: r.winners11,
                    payout: r.payout11,
                },
            },
            accumulated_next: r.accumulated15,
        }
    }
}

fn br_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDate::parse_from_str(&raw, "%d/%m/%Y")
        .or_else(|_| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .map_err(|_| serde::de::Error::custom(format!("invalid draw date {:?}", raw)))
}


/// Reads every row of a delimited results table. Columns are matched by
/// header name; columns the pipeline does not use are ignored.
pub fn parse_table<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRow>, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.deserialize::<TableRecord>() {
        rows.push(RawRow::from(record?));
    }
    Ok(rows)
}

/// Reads the first worksheet of an `.xlsx` workbook. The first row holds the
/// headers; every cell is rendered as text and matched by header name the
/// same way as [`parse_table`].
pub fn parse_workbook(bytes: &[u8]) -> Result<Vec<RawRow>, ExtractError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExtractError::NoWorksheet)??;

    let mut lines = range.rows();
    let Some(header_cells) = lines.next() else {
        return Ok(Vec::new());
    };
    let headers: csv::StringRecord = header_cells.iter().map(cell_text).collect();

    let mut rows = Vec::new();
    for cells in lines {
        if cells.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let record: csv::StringRecord = cells.iter().map(cell_text).collect();
        let parsed: TableRecord = record.deserialize(Some(&headers))?;
        rows.push(RawRow::from(parsed));
    }
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        // Whole numbers are stored as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) => s.get(..10).unwrap_or(s.as_str()).to_string(),
        other => other.to_string(),
    }
}
