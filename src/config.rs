use crate::error::{IngestError, Result};
use crate::extract::TableFormat;
use crate::types::Credentials;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;

/// How long to wait for the results artifact to show up.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_CSV_DELIMITER: u8 = b';';

/// Extension of the published results file.
pub const DEFAULT_ARTIFACT_EXTENSION: &str = "xlsx";

const ARTIFACT_EXTENSIONS: [&str; 2] = ["xlsx", "csv"];

const REQUIRED_KEYS: [&str; 4] = ["LOTOFACIL_URL", "API_URL", "API_EMAIL", "API_PASSWORD"];

#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub api_url: String,
    pub credentials: Credentials,
    pub api_timeout: Duration,
    pub download_timeout: Duration,
    /// Directory an external downloader drops the results file into. When
    /// unset the table is fetched straight from `source_url`.
    pub download_dir: Option<PathBuf>,
    /// `xlsx` or `csv`; picks both the file to wait for and how to read it.
    pub artifact_extension: String,
    pub csv_delimiter: u8,
}

pub fn load() -> Result<Config> {
    dotenvy::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}

impl Config {
    /// Builds and validates the configuration from any key lookup.
    ///
    /// Every missing required key is reported in one error so a misconfigured
    /// deployment can be fixed in a single pass.
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| value(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(IngestError::Configuration(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        let required = |key: &str| value(key).unwrap_or_default();

        let config = Config {
            source_url: required("LOTOFACIL_URL"),
            api_url: required("API_URL").trim_end_matches('/').to_string(),
            credentials: Credentials {
                email: required("API_EMAIL"),
                password: required("API_PASSWORD"),
            },
            api_timeout: Duration::from_secs(parse_secs(
                "API_TIMEOUT_SECS",
                value("API_TIMEOUT_SECS"),
                DEFAULT_API_TIMEOUT_SECS,
            )?),
            download_timeout: Duration::from_secs(parse_secs(
                "LOTOFACIL_DOWNLOAD_TIMEOUT_SECS",
                value("LOTOFACIL_DOWNLOAD_TIMEOUT_SECS"),
                DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            )?),
            download_dir: value("LOTOFACIL_DOWNLOAD_DIR").map(PathBuf::from),
            artifact_extension: parse_extension(value("LOTOFACIL_ARTIFACT_EXTENSION"))?,
            csv_delimiter: parse_delimiter(value("LOTOFACIL_CSV_DELIMITER"))?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_http_url("LOTOFACIL_URL", &self.source_url)?;
        check_http_url("API_URL", &self.api_url)?;

        if self.api_timeout.is_zero() {
            return Err(IngestError::Configuration(
                "API_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        if self.download_timeout.is_zero() {
            return Err(IngestError::Configuration(
                "LOTOFACIL_DOWNLOAD_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// How the configured source table is read.
    pub fn table_format(&self) -> TableFormat {
        TableFormat::from_extension(&self.artifact_extension, self.csv_delimiter)
    }
}

fn parse_secs(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| {
            IngestError::Configuration(format!(
                "{} must be a whole number of seconds, got {:?}",
                key, raw
            ))
        }),
    }
}

fn parse_extension(raw: Option<String>) -> Result<String> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_ARTIFACT_EXTENSION.to_string());
    };
    let extension = raw.trim_start_matches('.').to_ascii_lowercase();
    if ARTIFACT_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(IngestError::Configuration(format!(
            "LOTOFACIL_ARTIFACT_EXTENSION must be one of {}, got {:?}",
            ARTIFACT_EXTENSIONS.join(", "),
            raw
        )))
    }
}

fn parse_delimiter(raw: Option<String>) -> Result<u8> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_CSV_DELIMITER);
    };
    match raw.as_bytes() {
        [byte] => Ok(*byte),
        _ if raw == "\\t" => Ok(b'\t'),
        _ => Err(IngestError::Configuration(format!(
            "LOTOFACIL_CSV_DELIMITER must be a single ASCII character, got {:?}",
            raw
        ))),
    }
}

fn check_http_url(key: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| IngestError::Configuration(format!("{} is not a valid URL: {}", key, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(IngestError::Configuration(format!(
            "{} must use http or https, got {}",
            key,
            url.scheme()
        )));
    }
    Ok(())
}
