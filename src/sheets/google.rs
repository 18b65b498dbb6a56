use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde_json::Value;

use super::{Result, SheetService, SheetsError};

pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheets v4 REST client authenticated with a bearer token.
pub struct GoogleSheets {
    token: String,
    base_url: String,
    client: Client,
}

impl GoogleSheets {
    pub fn new(token: String, base_url: Option<String>) -> Self {
        Self {
            token,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            client: Client::new(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| SheetsError::Url(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::Url(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, req: RequestBuilder) -> Result<Value> {
        let resp = req.bearer_auth(&self.token).send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SheetsError::Api {
                status: status.as_u16(),
                message: api_message(&text),
            });
        }

        Ok(resp.json()?)
    }
}

impl SheetService for GoogleSheets {
    fn read_range(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let url = self.url(&[sheet_id, "values", range])?;
        let json = self.send(self.client.get(url))?;

        let Some(rows) = json.get("values") else {
            return Ok(Vec::new());
        };
        let rows = rows
            .as_array()
            .ok_or_else(|| SheetsError::Decode(format!("values is not an array for {range}")))?;

        Ok(rows
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().map(cell_to_string).collect())
                    .unwrap_or_default()
            })
            .collect())
    }

    fn update_range(&self, sheet_id: &str, range: &str, values: &[Vec<String>]) -> Result<usize> {
        let mut url = self.url(&[sheet_id, "values", range])?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        let body = serde_json::json!({
            "range": range,
            "majorDimension": "ROWS",
            "values": values,
        });
        let json = self.send(self.client.put(url).json(&body))?;

        Ok(json
            .get("updatedRows")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize)
    }

    fn clear_range(&self, sheet_id: &str, range: &str) -> Result<()> {
        let url = self.url(&[sheet_id, "values", &format!("{range}:clear")])?;
        self.send(self.client.post(url).json(&serde_json::json!({})))?;
        Ok(())
    }

    fn add_tab(&self, sheet_id: &str, title: &str) -> Result<bool> {
        let url = self.url(&[&format!("{sheet_id}:batchUpdate")])?;
        let body = serde_json::json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });

        match self.send(self.client.post(url).json(&body)) {
            Ok(_) => Ok(true),
            Err(SheetsError::Api { message, .. })
                if message.to_lowercase().contains("already exists") =>
            {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn cell_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Pull `error.message` out of a Google API error body, falling back to the raw text.
fn api_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
