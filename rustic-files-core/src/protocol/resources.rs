use std::sync::Arc;

use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::files::{FileManager, ListRequest, StatsRequest};
use crate::runtime::WorkerPool;

pub const STATS_PREFIX: &str = "file://stats/";
pub const LIST_PREFIX: &str = "file://list/";
const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Stats(String),
    List(String),
}

impl ResourceUri {
    /// `file://stats//tmp/a.txt` addresses `/tmp/a.txt`; the path part is
    /// percent-decoded.
    pub fn parse(uri: &str) -> Result<Self> {
        let decode = |raw: &str| -> Result<String> {
            let path = percent_decode_str(raw).decode_utf8().map_err(|err| {
                Error::Validation(format!("invalid resource path in '{uri}': {err}"))
            })?;
            if path.trim().is_empty() {
                return Err(Error::Validation(format!("resource uri '{uri}' has no path")));
            }
            Ok(path.into_owned())
        };

        if let Some(rest) = uri.strip_prefix(STATS_PREFIX) {
            Ok(Self::Stats(decode(rest)?))
        } else if let Some(rest) = uri.strip_prefix(LIST_PREFIX) {
            Ok(Self::List(decode(rest)?))
        } else {
            Err(Error::NotFound(format!("unknown resource uri '{uri}'")))
        }
    }
}

pub fn templates() -> Vec<Value> {
    vec![
        json!({
            "uriTemplate": format!("{STATS_PREFIX}{{path}}"),
            "name": "file_stats",
            "description": "Metadata for a file or directory",
            "mimeType": JSON_MIME,
        }),
        json!({
            "uriTemplate": format!("{LIST_PREFIX}{{path}}"),
            "name": "directory_listing",
            "description": "Non-recursive listing of a directory",
            "mimeType": JSON_MIME,
        }),
    ]
}

#[derive(Clone)]
pub struct ResourceProvider {
    files: Arc<FileManager>,
    pool: WorkerPool,
}

impl ResourceProvider {
    pub fn new(files: Arc<FileManager>, pool: WorkerPool) -> Self {
        Self { files, pool }
    }

    /// Reads a resource into `resources/read` shape. Only an unusable URI is
    /// an `Err`; handler failures are returned as `{"error": ...}` text.
    pub async fn read(&self, uri: &str) -> Result<Value> {
        let resource = ResourceUri::parse(uri)?;
        let files = self.files.clone();
        let outcome = self
            .pool
            .run(move || match resource {
                ResourceUri::Stats(path) => {
                    Ok(serde_json::to_value(files.stats(&StatsRequest::new(path))?)?)
                }
                ResourceUri::List(path) => {
                    Ok(serde_json::to_value(files.list(&ListRequest::new(path))?)?)
                }
            })
            .await;

        let payload = outcome.unwrap_or_else(|err| {
            warn!(uri, "resource read failed: {err}");
            json!({ "error": err.to_string() })
        });
        let text = serde_json::to_string_pretty(&payload)?;
        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": JSON_MIME, "text": text }]
        }))
    }
}
