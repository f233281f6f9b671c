//! WeCom group-bot media upload.
//!
//! Uploaded media stays valid for three days and is bound to the uploading bot,
//! so the upload must use the same account as the send that references it.

use crate::provider::{execute, normalize_base};
use crate::response;
use courier_core::message::wecom::MediaKind;
use courier_core::notify::entity::{Account, SendContext};
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::HttpClient;
use courier_core::notify::request::{
    HttpRequestSpec, MultipartField, PartValue, RequestBody, ResponseHandlerConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Smallest accepted upload, in bytes.
pub const MIN_MEDIA_BYTES: usize = 5;
pub const MAX_FILE_BYTES: usize = 20 * 1024 * 1024;
pub const MAX_VOICE_BYTES: usize = 2 * 1024 * 1024;

/// Where the uploaded bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSource {
    Path(PathBuf),
    Bytes { file_name: String, data: Vec<u8> },
}

impl MediaSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        MediaSource::Path(path.into())
    }

    pub fn bytes(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        MediaSource::Bytes {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    /// Reads the content; a missing or unreadable file is an upload error.
    async fn load(self) -> Result<(String, Vec<u8>), NotifyError> {
        match self {
            MediaSource::Bytes { file_name, data } => Ok((file_name, data)),
            MediaSource::Path(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        NotifyError::Upload(format!("{} has no file name", path.display()))
                    })?;
                let data = tokio::fs::read(&path).await.map_err(|e| {
                    NotifyError::Upload(format!("failed to read {}: {}", path.display(), e))
                })?;
                Ok((file_name, data))
            }
        }
    }
}

/// # Summary
/// Checks the platform's size and format limits for one media kind.
///
/// # Invariants
/// - Every upload is at least `MIN_MEDIA_BYTES`.
/// - Files are at most 20 MiB; voices at most 2 MiB and in AMR format.
pub fn check_media(kind: MediaKind, file_name: &str, len: usize) -> Result<(), NotifyError> {
    if len < MIN_MEDIA_BYTES {
        return Err(NotifyError::Upload(format!(
            "{} is too small ({} bytes, minimum {})",
            file_name, len, MIN_MEDIA_BYTES
        )));
    }
    match kind {
        MediaKind::File if len > MAX_FILE_BYTES => Err(NotifyError::Upload(format!(
            "file {} exceeds {} bytes",
            file_name, MAX_FILE_BYTES
        ))),
        MediaKind::Voice if len > MAX_VOICE_BYTES => Err(NotifyError::Upload(format!(
            "voice {} exceeds {} bytes",
            file_name, MAX_VOICE_BYTES
        ))),
        MediaKind::Voice
            if !Path::new(file_name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("amr")) =>
        {
            Err(NotifyError::Upload(format!(
                "voice {} must be an .amr file",
                file_name
            )))
        }
        _ => Ok(()),
    }
}

/// # Summary
/// Uploads media to the WeCom webhook media endpoint.
pub struct MediaUploader {
    base_url: String,
}

impl MediaUploader {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base(base_url),
        }
    }

    /// # Summary
    /// Builds the multipart upload request for `account`.
    pub fn request(
        &self,
        kind: MediaKind,
        account: &Account,
        file_name: String,
        data: Vec<u8>,
    ) -> Result<HttpRequestSpec, NotifyError> {
        if account.credentials.key.is_empty() {
            return Err(NotifyError::Param(format!(
                "account {} has no webhook key",
                account.name
            )));
        }
        Ok(
            HttpRequestSpec::post(format!("{}/cgi-bin/webhook/upload_media", self.base_url))
                .with_query("key", account.credentials.key.as_str())
                .with_query("type", kind.as_str())
                .with_body(RequestBody::Multipart(vec![MultipartField {
                    name: "media".to_string(),
                    value: PartValue::File {
                        file_name,
                        content_type: Some("application/octet-stream".to_string()),
                        data,
                    },
                }])),
        )
    }

    /// # Summary
    /// Uploads one media file and returns its `media_id`.
    ///
    /// # Logic
    /// 1. Loads the source and checks the size and format limits.
    /// 2. Posts it as multipart field `media` with the account's key and the media type.
    /// 3. Requires `errcode == 0` and a non-empty `media_id` in the reply.
    ///
    /// # Returns
    /// * The `media_id` on success.
    /// * `NotifyError::Cancelled` if the context was cancelled, `NotifyError::Upload` for anything else.
    pub async fn upload(
        &self,
        ctx: &SendContext,
        client: &dyn HttpClient,
        account: &Account,
        kind: MediaKind,
        source: MediaSource,
    ) -> Result<String, NotifyError> {
        let (file_name, data) = source.load().await?;
        check_media(kind, &file_name, data.len())?;
        debug!(account = %account.name, kind = kind.as_str(), file = %file_name, size = data.len(), "uploading media");

        let request = self.request(kind, account, file_name, data).map_err(as_upload)?;
        let handler = ResponseHandlerConfig::json_field("errcode", 0)
            .with_error_paths("errcode", "errmsg")
            .with_metadata("media_id", "media_id");
        let response = execute(ctx, client, request).await.map_err(as_upload)?;
        let result = response::classify(&handler, response).map_err(as_upload)?;

        let media_id = result
            .metadata
            .get("media_id")
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| NotifyError::Upload("response carries no media_id".to_string()))?;
        info!(account = %account.name, kind = kind.as_str(), media_id = %media_id, "media uploaded");
        Ok(media_id)
    }
}

fn as_upload(err: NotifyError) -> NotifyError {
    match err {
        NotifyError::Cancelled | NotifyError::Upload(_) => err,
        other => NotifyError::Upload(other.to_string()),
    }
}
