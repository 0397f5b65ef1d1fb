//! Read-only spreadsheet metadata for the reporting tools.

use serde::{Deserialize, Serialize};

use scriptsync_core::Config;

use crate::error::RemoteApiError;
use crate::http::HttpClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetInfo {
    pub id: i64,
    pub title: String,
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpreadsheetInfo {
    pub title: String,
    pub sheets: Vec<SheetInfo>,
}

impl SpreadsheetInfo {
    /// Names from `expected` absent from the spreadsheet, in input order.
    pub fn missing<'a>(&self, expected: &'a [String]) -> Vec<&'a str> {
        expected
            .iter()
            .filter(|name| !self.sheets.iter().any(|s| &s.title == *name))
            .map(String::as_str)
            .collect()
    }

    /// Sheets not in `expected`.
    pub fn extra(&self, expected: &[String]) -> Vec<&str> {
        self.sheets
            .iter()
            .filter(|s| !expected.contains(&s.title))
            .map(|s| s.title.as_str())
            .collect()
    }
}

// Wire shape of `spreadsheets.get` restricted by `fields`.
#[derive(Deserialize)]
struct SpreadsheetResponse {
    #[serde(default)]
    properties: SpreadsheetProperties,
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Default, Deserialize)]
struct SpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    #[serde(default)]
    sheet_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    index: i64,
}

#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: HttpClient,
    base_url: String,
}

impl SheetsClient {
    pub fn new(base_url: impl Into<String>, http: HttpClient) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config, http: HttpClient) -> Self {
        Self::new(&config.endpoints.sheets_api, http)
    }

    pub fn get_spreadsheet(
        &self,
        access_token: &str,
        spreadsheet_id: &str,
    ) -> Result<SpreadsheetInfo, RemoteApiError> {
        let url = format!(
            "{}/v4/spreadsheets/{spreadsheet_id}?fields=properties.title,sheets.properties",
            self.base_url
        );
        let response: SpreadsheetResponse = self.http.get_json(&url, access_token)?;
        Ok(SpreadsheetInfo {
            title: response.properties.title,
            sheets: response
                .sheets
                .into_iter()
                .map(|s| SheetInfo {
                    id: s.properties.sheet_id,
                    title: s.properties.title,
                    index: s.properties.index,
                })
                .collect(),
        })
    }
}
