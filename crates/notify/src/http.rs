use async_trait::async_trait;
use courier_core::notify::error::NotifyError;
use courier_core::notify::port::HttpClient;
use courier_core::notify::request::{
    HttpMethod, HttpRequestSpec, HttpResponse, MultipartField, PartValue, RequestBody,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use tracing::debug;

/// # Summary
/// `HttpClient` backed by a shared `reqwest::Client`.
///
/// # Invariants
/// - The underlying client is built once and reused by every send.
/// - Status codes are never interpreted here; classification happens in the response handler.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// # Summary
    /// Builds a client with a default per-request timeout.
    ///
    /// # Logic
    /// 1. Installs the ring crypto provider for rustls if none is installed yet.
    /// 2. Builds a `reqwest::Client` with `timeout` as its default.
    ///
    /// # Returns
    /// * `NotifyError::Config` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, NotifyError> {
        install_crypto_provider();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wraps an existing client, e.g. one configured with a proxy.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn install_crypto_provider() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }
}

fn multipart_form(fields: Vec<MultipartField>) -> Result<Form, NotifyError> {
    fields.into_iter().try_fold(Form::new(), |form, field| match field.value {
        PartValue::Text(text) => Ok(form.text(field.name, text)),
        PartValue::File {
            file_name,
            content_type,
            data,
        } => {
            let part = Part::bytes(data).file_name(file_name);
            let part = match content_type {
                Some(ct) => part
                    .mime_str(&ct)
                    .map_err(|e| NotifyError::Param(format!("invalid content type {}: {}", ct, e)))?,
                None => part,
            };
            Ok(form.part(field.name, part))
        }
    })
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequestSpec) -> Result<HttpResponse, NotifyError> {
        let url = request.full_url()?;
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(bytes) => builder.header(CONTENT_TYPE, "application/json").body(bytes),
            RequestBody::Form(pairs) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs.iter())
                    .finish();
                builder
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(encoded)
            }
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)?),
            RequestBody::Raw { content_type, data } => {
                let builder = match content_type {
                    Some(ct) => builder.header(CONTENT_TYPE, ct),
                    None => builder,
                };
                builder.body(data)
            }
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Network(format!("request timed out: {}", e))
            } else {
                NotifyError::Network(e.to_string())
            }
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| NotifyError::Network(format!("failed to read response body: {}", e)))?;

        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
