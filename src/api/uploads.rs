use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{segment, ApiClient, OnUnauthorized};
use crate::error::{AppError, AppResult};

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const XLS_MIME: &str = "application/vnd.ms-excel";

/// One imported spreadsheet as recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBatch {
    pub id: String,
    /// `YYYYMM` month the sheet covered; kept as sent since older batches may carry other forms.
    pub data_month: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub original_file_name: String,
    #[serde(default)]
    pub uploaded_by: String,
    #[serde(default)]
    pub total_rows: u64,
    #[serde(default)]
    pub processed_rows: u64,
    #[serde(default)]
    pub skipped_rows: u64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub new_creators_count: u64,
    #[serde(default)]
    pub new_managers_count: u64,
    #[serde(default)]
    pub transactions_created: u64,
    #[serde(default)]
    pub bonuses_created: u64,
    #[serde(default)]
    pub created_at: String,
}

/// Import summary returned right after an upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    pub processed_rows: u64,
    pub new_creators_count: u64,
    pub new_managers_count: u64,
    pub transactions_created: u64,
    pub warnings: Vec<String>,
}

/// A spreadsheet read into memory and checked for type and size.
#[derive(Clone)]
pub struct UploadFile {
    name: String,
    mime: &'static str,
    data: Vec<u8>,
}

impl std::fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadFile").field("name", &self.name).field("mime", &self.mime).field("len", &self.data.len()).finish()
    }
}

impl UploadFile {
    pub async fn open(path: &Path) -> AppResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::validation("invalid_file", "Please select a valid Excel file (.xlsx or .xls)"))?
            .to_string();
        let mime = mime_for(&name)?;
        let meta = tokio::fs::metadata(path).await?;
        check_size(meta.len())?;
        let data = tokio::fs::read(path).await?;
        Ok(Self { name, mime, data })
    }

    pub fn from_bytes(name: &str, data: Vec<u8>) -> AppResult<Self> {
        let mime = mime_for(name)?;
        check_size(data.len() as u64)?;
        Ok(Self { name: name.to_string(), mime, data })
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn len(&self) -> usize { self.data.len() }
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    fn into_form(self) -> AppResult<Form> {
        let part = Part::bytes(self.data).file_name(self.name).mime_str(self.mime)?;
        Ok(Form::new().part("file", part))
    }
}

fn mime_for(name: &str) -> AppResult<&'static str> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".xlsx") {
        Ok(XLSX_MIME)
    } else if lower.ends_with(".xls") {
        Ok(XLS_MIME)
    } else {
        Err(AppError::validation("invalid_file", "Please select a valid Excel file (.xlsx or .xls)"))
    }
}

fn check_size(len: u64) -> AppResult<()> {
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::validation("file_too_large", "File size must be less than 10MB"));
    }
    Ok(())
}

pub struct UploadsApi<'a> {
    api: &'a ApiClient,
}

impl<'a> UploadsApi<'a> {
    pub(crate) fn new(api: &'a ApiClient) -> Self { Self { api } }

    pub async fn upload_excel(&self, file: UploadFile) -> AppResult<UploadResult> {
        let name = file.name.clone();
        let size = file.data.len();
        let path = "/uploads/excel";
        let form = file.into_form()?;
        let out = self.api.request(Method::POST, path)?.map(|rb| rb.multipart(form));
        let resp = self.api.execute(out, path, OnUnauthorized::ExpireSession, "Upload failed. Please try again.").await?;
        let result: UploadResult = super::decode(resp, path).await?;
        info!(target: "commission_desk::uploads", "uploaded file={} bytes={} processed_rows={}", name, size, result.processed_rows);
        Ok(result)
    }

    pub async fn batches(&self) -> AppResult<Vec<UploadBatch>> {
        self.api.get_json("/uploads/batches", &[], "Failed to load upload history").await
    }

    pub async fn batch(&self, id: &str) -> AppResult<UploadBatch> {
        let path = format!("/uploads/batches/{}", segment(id));
        self.api.get_json(&path, &[], "Failed to load upload batch").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_excel_extensions_only() {
        assert_eq!(mime_for("Sept.XLSX").unwrap(), XLSX_MIME);
        assert_eq!(mime_for("old.xls").unwrap(), XLS_MIME);
        assert_eq!(mime_for("data.csv").unwrap_err().message(), "Please select a valid Excel file (.xlsx or .xls)");
    }

    #[test]
    fn size_limit_is_ten_megabytes() {
        assert!(check_size(MAX_UPLOAD_BYTES).is_ok());
        assert_eq!(check_size(MAX_UPLOAD_BYTES + 1).unwrap_err().code_str(), "file_too_large");
    }

    #[tokio::test]
    async fn open_reads_and_checks_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("september.xlsx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();
        let f = UploadFile::open(&path).await.unwrap();
        assert_eq!(f.name(), "september.xlsx");
        assert_eq!(f.len(), 4);

        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, b"x").unwrap();
        assert!(UploadFile::open(&bad).await.is_err());
    }

    #[test]
    fn batch_decodes_with_missing_counters() {
        let b: UploadBatch = serde_json::from_value(serde_json::json!({
            "id": "b1", "dataMonth": "202609", "originalFileName": "sept.xlsx", "totalRows": 10,
            "processedRows": 9, "skippedRows": 1, "warnings": ["row 4: unknown creator"], "createdAt": "2026-10-02T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(b.skipped_rows, 1);
        assert_eq!(b.bonuses_created, 0);
        assert_eq!(b.warnings.len(), 1);
    }

    #[test]
    fn upload_result_defaults() {
        let r: UploadResult = serde_json::from_value(serde_json::json!({"success": true, "processedRows": 9})).unwrap();
        assert!(r.success);
        assert!(r.warnings.is_empty());
    }
}
