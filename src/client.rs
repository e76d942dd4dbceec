// Spreadsheet API client
// Typed operations over the authenticated HTTP client

use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::auth::Credentials;
use crate::config::Config;
use crate::error::{Result, SheetsError};
use crate::http_client::{ApiRequest, ApiSurface, SheetsHttpClient};
use crate::models::sheets::{
    BatchGetData, BatchRangesBody, BatchValues, CellMatrix, Payload, RangeRead, ReadOptions,
    SheetData, SheetDescriptor, SheetListData, SheetMutationResult, SheetProperties,
    SheetRequest, SheetsBatchUpdateRequest, SingleRangeBody, SpreadsheetData,
    SpreadsheetDescriptor, ValueRangeInput, ValueRangeRef, WriteResult,
};
use crate::models::ApiEnvelope;

/// Result of `test_connection`
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub success: bool,
    pub message: String,
    pub app_id: String,
    pub token_valid: bool,
}

/// Feishu spreadsheet client
pub struct SheetsClient {
    http: SheetsHttpClient,
}

impl SheetsClient {
    pub fn new(
        credentials: Credentials,
        base_url: &str,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        Ok(Self {
            http: SheetsHttpClient::new(credentials, base_url, connect_timeout, request_timeout)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.credentials.clone(),
            &config.base_url,
            config.http_connect_timeout,
            config.http_request_timeout,
        )
    }

    /// Get the underlying HTTP client
    pub fn http(&self) -> &SheetsHttpClient {
        &self.http
    }

    // ============ Connection ============

    /// Force a token exchange to check the credentials
    ///
    /// A rejected exchange or an unreachable service yields a report with
    /// `success: false`; only local failures are returned as errors.
    pub async fn test_connection(&self) -> Result<ConnectionReport> {
        let auth = self.http.auth();
        let app_id = auth.app_id().to_string();

        match auth.refresh("test connection").await {
            Ok(token) => Ok(ConnectionReport {
                success: true,
                message: "connection test succeeded".to_string(),
                app_id,
                token_valid: !token.is_empty(),
            }),
            Err(e @ (SheetsError::Remote { .. } | SheetsError::Network { .. })) => {
                tracing::warn!(error = %e, "Connection test failed");
                Ok(ConnectionReport {
                    success: false,
                    message: e.to_string(),
                    app_id,
                    token_valid: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    // ============ Spreadsheet metadata (v3) ============

    pub async fn create_spreadsheet(
        &self,
        title: Option<&str>,
        folder_token: Option<&str>,
    ) -> Result<Payload<SpreadsheetDescriptor>> {
        const OPERATION: &str = "create spreadsheet";

        let mut body = serde_json::Map::new();
        if let Some(title) = title.filter(|t| !t.is_empty()) {
            body.insert("title".to_string(), Value::from(title));
        }
        if let Some(folder_token) = folder_token.filter(|t| !t.is_empty()) {
            body.insert("folder_token".to_string(), Value::from(folder_token));
        }

        let request = ApiRequest::new(ApiSurface::Meta, Method::POST, ["spreadsheets"])
            .with_body(Value::Object(body));
        let data: Payload<SpreadsheetData> = self.call(OPERATION, &request).await?;
        Ok(data.map(|d| d.spreadsheet))
    }

    pub async fn get_spreadsheet(
        &self,
        spreadsheet_token: &str,
    ) -> Result<Payload<SpreadsheetDescriptor>> {
        const OPERATION: &str = "get spreadsheet";
        require(OPERATION, &[("spreadsheet_token", spreadsheet_token)])?;

        let request =
            ApiRequest::new(ApiSurface::Meta, Method::GET, ["spreadsheets", spreadsheet_token]);
        let data: Payload<SpreadsheetData> = self.call(OPERATION, &request).await?;
        Ok(data.map(|d| d.spreadsheet))
    }

    /// List sheets in the order the service returns them
    pub async fn list_sheets(&self, spreadsheet_token: &str) -> Result<Payload<Vec<SheetDescriptor>>> {
        const OPERATION: &str = "list sheets";
        require(OPERATION, &[("spreadsheet_token", spreadsheet_token)])?;

        let request = ApiRequest::new(
            ApiSurface::Meta,
            Method::GET,
            ["spreadsheets", spreadsheet_token, "sheets", "query"],
        );
        let data: Payload<SheetListData> = self.call(OPERATION, &request).await?;
        Ok(data.map(|d| d.sheets))
    }

    pub async fn get_sheet(
        &self,
        spreadsheet_token: &str,
        sheet_id: &str,
    ) -> Result<Payload<SheetDescriptor>> {
        const OPERATION: &str = "get sheet";
        require(
            OPERATION,
            &[("spreadsheet_token", spreadsheet_token), ("sheet_id", sheet_id)],
        )?;

        let request = ApiRequest::new(
            ApiSurface::Meta,
            Method::GET,
            ["spreadsheets", spreadsheet_token, "sheets", sheet_id],
        );
        let data: Payload<SheetData> = self.call(OPERATION, &request).await?;
        Ok(data.map(|d| d.sheet))
    }

    // ============ Sheet management (v2) ============

    /// Apply a list of sheet mutations in one call
    pub async fn batch_update_sheets(
        &self,
        spreadsheet_token: &str,
        requests: &[SheetRequest],
    ) -> Result<Payload<SheetMutationResult>> {
        self.update_sheets("update sheets", spreadsheet_token, requests)
            .await
    }

    pub async fn add_sheet(
        &self,
        spreadsheet_token: &str,
        title: &str,
        index: Option<u32>,
    ) -> Result<Payload<SheetMutationResult>> {
        const OPERATION: &str = "add sheet";
        require(
            OPERATION,
            &[("spreadsheet_token", spreadsheet_token), ("title", title)],
        )?;

        let requests = [SheetRequest::AddSheet {
            properties: SheetProperties {
                title: title.to_string(),
                index,
            },
        }];
        self.update_sheets(OPERATION, spreadsheet_token, &requests)
            .await
    }

    pub async fn delete_sheet(
        &self,
        spreadsheet_token: &str,
        sheet_id: &str,
    ) -> Result<Payload<SheetMutationResult>> {
        const OPERATION: &str = "delete sheet";
        require(
            OPERATION,
            &[("spreadsheet_token", spreadsheet_token), ("sheet_id", sheet_id)],
        )?;

        let requests = [SheetRequest::DeleteSheet {
            sheet_id: sheet_id.to_string(),
        }];
        self.update_sheets(OPERATION, spreadsheet_token, &requests)
            .await
    }

    async fn update_sheets(
        &self,
        operation: &str,
        spreadsheet_token: &str,
        requests: &[SheetRequest],
    ) -> Result<Payload<SheetMutationResult>> {
        require(operation, &[("spreadsheet_token", spreadsheet_token)])?;
        if requests.is_empty() {
            return Err(SheetsError::local(operation, "no sheet requests given"));
        }

        let body = to_body(operation, &SheetsBatchUpdateRequest { requests })?;
        let request = ApiRequest::new(
            ApiSurface::Data,
            Method::POST,
            ["spreadsheets", spreadsheet_token, "sheets_batch_update"],
        )
        .with_body(body);
        self.call(operation, &request).await
    }

    // ============ Cell values (v2) ============

    /// Read one range; `value_range.values` holds the cell matrix
    pub async fn read_range(
        &self,
        spreadsheet_token: &str,
        range: &str,
        options: &ReadOptions,
    ) -> Result<Payload<RangeRead>> {
        const OPERATION: &str = "read range";
        require(
            OPERATION,
            &[("spreadsheet_token", spreadsheet_token), ("range", range)],
        )?;

        let request = ApiRequest::new(
            ApiSurface::Data,
            Method::GET,
            ["spreadsheets", spreadsheet_token, "values", range],
        )
        .with_query(options.to_query());
        self.call(OPERATION, &request).await
    }

    /// Overwrite a range; the shape of `values` is checked by the service
    pub async fn write_range(
        &self,
        spreadsheet_token: &str,
        range: &str,
        values: &CellMatrix,
    ) -> Result<Payload<WriteResult>> {
        self.write_values(
            "write range",
            Method::PUT,
            "values",
            spreadsheet_token,
            range,
            values,
        )
        .await
    }

    /// Append rows after the data already in `range`
    pub async fn append_data(
        &self,
        spreadsheet_token: &str,
        range: &str,
        values: &CellMatrix,
    ) -> Result<Payload<WriteResult>> {
        self.write_values(
            "append data",
            Method::POST,
            "values_append",
            spreadsheet_token,
            range,
            values,
        )
        .await
    }

    /// Insert rows before the start of `range`
    pub async fn prepend_data(
        &self,
        spreadsheet_token: &str,
        range: &str,
        values: &CellMatrix,
    ) -> Result<Payload<WriteResult>> {
        self.write_values(
            "prepend data",
            Method::POST,
            "values_prepend",
            spreadsheet_token,
            range,
            values,
        )
        .await
    }

    async fn write_values(
        &self,
        operation: &str,
        method: Method,
        endpoint: &str,
        spreadsheet_token: &str,
        range: &str,
        values: &CellMatrix,
    ) -> Result<Payload<WriteResult>> {
        require(
            operation,
            &[("spreadsheet_token", spreadsheet_token), ("range", range)],
        )?;

        let body = to_body(
            operation,
            &SingleRangeBody {
                value_range: ValueRangeRef { range, values },
            },
        )?;
        let request = ApiRequest::new(
            ApiSurface::Data,
            method,
            ["spreadsheets", spreadsheet_token, endpoint],
        )
        .with_body(body);
        self.call(operation, &request).await
    }

    /// Read several ranges; the result is keyed by the requested range strings, in order
    pub async fn batch_get_values(
        &self,
        spreadsheet_token: &str,
        ranges: &[String],
        options: &ReadOptions,
    ) -> Result<Payload<BatchValues>> {
        const OPERATION: &str = "batch read values";
        require(OPERATION, &[("spreadsheet_token", spreadsheet_token)])?;
        if ranges.is_empty() {
            return Err(SheetsError::local(OPERATION, "missing required parameter: ranges"));
        }
        for range in ranges {
            require(OPERATION, &[("range", range.as_str())])?;
        }

        let mut query = options.to_query();
        query.push(("ranges".to_string(), ranges.join(",")));

        let request = ApiRequest::new(
            ApiSurface::Data,
            Method::GET,
            ["spreadsheets", spreadsheet_token, "values_batch_get"],
        )
        .with_query(query);
        let data: Payload<BatchGetData> = self.call(OPERATION, &request).await?;
        Ok(data.map(|d| BatchValues::from_response(ranges, d)))
    }

    pub async fn batch_update_values(
        &self,
        spreadsheet_token: &str,
        value_ranges: &[ValueRangeInput],
    ) -> Result<Payload<WriteResult>> {
        const OPERATION: &str = "batch write values";
        require(OPERATION, &[("spreadsheet_token", spreadsheet_token)])?;
        if value_ranges.is_empty() {
            return Err(SheetsError::local(
                OPERATION,
                "missing required parameter: value_ranges",
            ));
        }
        for value_range in value_ranges {
            require(OPERATION, &[("range", value_range.range.as_str())])?;
        }

        let body = to_body(OPERATION, &BatchRangesBody { value_ranges })?;
        let request = ApiRequest::new(
            ApiSurface::Data,
            Method::POST,
            ["spreadsheets", spreadsheet_token, "values_batch_update"],
        )
        .with_body(body);
        self.call(OPERATION, &request).await
    }

    /// Dispatch and decode the envelope's `data`
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        request: &ApiRequest,
    ) -> Result<Payload<T>> {
        let response = self.http.dispatch_with_auth(operation, request).await?;

        let data = match serde_json::from_value::<ApiEnvelope>(response.clone()) {
            Ok(envelope) => envelope.data.unwrap_or(Value::Null),
            Err(_) => response,
        };
        Ok(Payload::decode(data))
    }
}

/// Fail with a local error when any required identifier is empty
fn require(operation: &str, fields: &[(&str, &str)]) -> Result<()> {
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(SheetsError::local(
                operation,
                format!("missing required parameter: {}", name),
            ));
        }
    }
    Ok(())
}

fn to_body<T: Serialize>(operation: &str, body: &T) -> Result<Value> {
    serde_json::to_value(body)
        .map_err(|e| SheetsError::local(operation, format!("unable to encode request body: {}", e)))
}
