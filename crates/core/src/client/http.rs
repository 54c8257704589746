use crate::client::error::{AnalysisError, BACKEND_FALLBACK_DETAIL};
use crate::client::{AnalysisClient, CsvUpload};
use crate::config::Settings;
use crate::domain::analysis::AnalysisResult;
use crate::domain::contract::parse_analysis_result;
use anyhow::Context;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::time::{Duration, Instant};

const ANALYZE_PATH: &str = "/analyze";
const CSV_MIME: &str = "text/csv";

#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Self::new(
            &settings.analysis_api_url,
            Duration::from_secs(settings.analysis_timeout_secs),
        )
    }

    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build analysis http client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn form(file: &CsvUpload, threshold_days: u32) -> Result<Form, AnalysisError> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(CSV_MIME)
            .map_err(transport)?;

        Ok(Form::new()
            .part("file", part)
            .text("threshold", threshold_days.to_string()))
    }
}

#[async_trait::async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn submit(
        &self,
        file: &CsvUpload,
        threshold_days: u32,
    ) -> Result<AnalysisResult, AnalysisError> {
        let url = format!("{}{}", self.base_url, ANALYZE_PATH);
        let form = Self::form(file, threshold_days)?;
        let started = Instant::now();

        let res = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                tracing::error!(error = %error_chain(&err), "analysis request failed");
                transport(err)
            })?;

        let status = res.status();
        let text = res.text().await.map_err(transport)?;
        tracing::info!(
            file_name = %file.file_name,
            bytes = file.len(),
            threshold_days,
            %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis response received"
        );

        if !status.is_success() {
            return Err(AnalysisError::Backend {
                status: status.as_u16(),
                detail: backend_detail(&text),
            });
        }

        parse_analysis_result(&text).map_err(|err| AnalysisError::Schema {
            detail: format!("{err:#}"),
        })
    }
}

/// Pulls `detail` out of an error body.
///
/// FastAPI sends a plain string for handled errors and a list of
/// `{loc, msg, type}` objects for request validation failures.
fn backend_detail(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());

    let text = match detail {
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item.get("msg").and_then(Value::as_str) {
                Some(msg) => msg.to_string(),
                None => item.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    if text.trim().is_empty() {
        BACKEND_FALLBACK_DETAIL.to_string()
    } else {
        text
    }
}

fn transport(err: reqwest::Error) -> AnalysisError {
    AnalysisError::Transport {
        detail: error_chain(&err),
    }
}

// reqwest keeps the useful part (refused, timed out, dns) in the source chain.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !out.contains(&cause_text) {
            out.push_str(": ");
            out.push_str(&cause_text);
        }
        source = cause.source();
    }
    out
}
