//! Apps Script API v1 client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use scriptsync_core::{Config, RemoteFile};

use crate::error::RemoteApiError;
use crate::http::HttpClient;
use crate::reconciler::ProjectApi;

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

/// Project metadata as reported by `GET /v1/projects/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    #[serde(default)]
    pub script_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub update_time: Option<DateTime<Utc>>,
    /// Container document (e.g. a spreadsheet) for bound scripts.
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScriptApiClient {
    http: HttpClient,
    base_url: String,
}

impl ScriptApiClient {
    pub fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config, http: HttpClient) -> Self {
        Self::new(&config.endpoints.script_api, http)
    }

    fn project_url(&self, script_id: &str) -> String {
        format!("{}/v1/projects/{script_id}", self.base_url)
    }

    pub fn get_project(
        &self,
        access_token: &str,
        script_id: &str,
    ) -> Result<ProjectMetadata, RemoteApiError> {
        Ok(self
            .http
            .get_json(&self.project_url(script_id), access_token)?)
    }
}

impl ProjectApi for ScriptApiClient {
    fn get_content(
        &self,
        access_token: &str,
        script_id: &str,
    ) -> Result<Vec<RemoteFile>, RemoteApiError> {
        let url = format!("{}/content", self.project_url(script_id));
        let response: ContentResponse = self.http.get_json(&url, access_token)?;
        Ok(response.files)
    }

    fn update_content(
        &self,
        access_token: &str,
        script_id: &str,
        files: &[RemoteFile],
    ) -> Result<(), RemoteApiError> {
        let url = format!("{}/content", self.project_url(script_id));
        let body = json!({ "files": files });
        let _: serde_json::Value = self.http.put_json(&url, access_token, &body)?;
        tracing::info!(script_id, files = files.len(), "project content updated");
        Ok(())
    }
}
