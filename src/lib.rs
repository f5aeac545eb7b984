pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod mapper;
pub mod pipeline;
pub mod types;
pub mod uploader;

pub use api::ApiClient;
pub use config::Config;
pub use error::{ErrorKind, IngestError, Result};
pub use extract::{Extractor, TableFormat};
pub use handler::{HandlerResponse, handle};
pub use types::*;
