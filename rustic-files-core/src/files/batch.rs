use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Error, Result};
use crate::files::ops::{CreateFolderRequest, DeleteRequest, TransferRequest};
use crate::files::paths::{file_name_of, resolve_path};
use crate::files::FileManager;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BatchKind {
    Copy,
    Move,
    Delete,
    CreateFolder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    #[serde(rename = "type")]
    pub kind: BatchKind,
    #[serde(default)]
    pub params: Value,
}

/// Either an explicit `operations` list or the `file_paths` + `target_dir`
/// shorthand that copies or moves every file into one directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub operations: Option<Vec<BatchItem>>,
    #[serde(default)]
    pub file_paths: Option<Vec<String>>,
    #[serde(default)]
    pub target_dir: Option<String>,
    #[serde(default)]
    pub operation: Option<BatchKind>,
    #[serde(default)]
    pub stop_on_error: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchItemResult {
    pub index: usize,
    #[serde(rename = "type")]
    pub kind: BatchKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// Set when `stop_on_error` ended the batch at a failed item, including
    /// the last one.
    pub stopped: bool,
    pub results: Vec<BatchItemResult>,
}

/// An item ready to run. Shorthand entries whose path could not be resolved
/// carry the error and fail on their own.
struct PlannedItem {
    kind: BatchKind,
    params: Result<Value>,
}

impl BatchRequest {
    fn into_items(self) -> Result<Vec<PlannedItem>> {
        if let Some(operations) = self.operations {
            return Ok(operations
                .into_iter()
                .map(|item| PlannedItem {
                    kind: item.kind,
                    params: Ok(item.params),
                })
                .collect());
        }

        let (Some(file_paths), Some(target_dir)) = (self.file_paths, self.target_dir) else {
            return Err(Error::Validation(
                "batch requires 'operations' or both 'file_paths' and 'target_dir'".to_owned(),
            ));
        };
        let kind = self.operation.unwrap_or(BatchKind::Copy);
        if !matches!(kind, BatchKind::Copy | BatchKind::Move) {
            return Err(Error::Validation(
                "shorthand batch 'operation' must be 'copy' or 'move'".to_owned(),
            ));
        }

        let target_root = resolve_path(&target_dir)?;
        Ok(file_paths
            .into_iter()
            .map(|source| PlannedItem {
                kind,
                params: resolve_path(&source).map(|resolved| {
                    json!({
                        "source_path": source,
                        "target_path": target_root.join(file_name_of(&resolved)).to_string_lossy(),
                    })
                }),
            })
            .collect())
    }
}

fn params_as<T: serde::de::DeserializeOwned>(params: &Value) -> Result<T> {
    serde_json::from_value(params.clone())
        .map_err(|err| Error::Validation(format!("invalid operation params: {err}")))
}

impl FileManager {
    /// Runs each item in order. Items succeed or fail on their own; nothing is
    /// rolled back.
    pub fn batch(&self, request: BatchRequest) -> Result<BatchReport> {
        let stop_on_error = request.stop_on_error;
        let items = request.into_items()?;
        let limit = self.limits().max_batch_operations;
        if items.len() > limit {
            return Err(Error::Validation(format!(
                "batch has {} operations, limit is {limit}",
                items.len()
            )));
        }

        let total = items.len();
        let mut results = Vec::with_capacity(total);
        let mut stopped = false;
        for (index, item) in items.into_iter().enumerate() {
            let outcome = item
                .params
                .and_then(|params| self.run_batch_item(item.kind, &params));
            let success = outcome.is_ok();
            let (result, error) = match outcome {
                Ok(value) => (Some(value), None),
                Err(err) => {
                    warn!(index, kind = ?item.kind, "batch operation failed: {err}");
                    (None, Some(err.to_string()))
                }
            };
            results.push(BatchItemResult {
                index,
                kind: item.kind,
                success,
                result,
                error,
            });

            if !success && stop_on_error {
                stopped = true;
                break;
            }
        }

        let successful = results.iter().filter(|item| item.success).count();
        Ok(BatchReport {
            total,
            successful,
            failed: results.len() - successful,
            stopped,
            results,
        })
    }

    fn run_batch_item(&self, kind: BatchKind, params: &Value) -> Result<Value> {
        let value = match kind {
            BatchKind::Copy => {
                serde_json::to_value(self.copy(&params_as::<TransferRequest>(params)?)?)?
            }
            BatchKind::Move => serde_json::to_value(
                self.move_entry(&params_as::<TransferRequest>(params)?)?,
            )?,
            BatchKind::Delete => {
                serde_json::to_value(self.delete(&params_as::<DeleteRequest>(params)?)?)?
            }
            BatchKind::CreateFolder => serde_json::to_value(
                self.create_folder(&params_as::<CreateFolderRequest>(params)?)?,
            )?,
        };
        Ok(value)
    }
}
