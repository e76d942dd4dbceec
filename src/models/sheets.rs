use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Rows of cell values
pub type CellMatrix = Vec<Vec<Value>>;

// ==================================================================================================
// Envelope
// ==================================================================================================

/// `{code, msg, data}` wrapper carried by every Feishu response
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Response data: either a modelled shape or the raw JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload<T> {
    Known(T),
    Unknown(Value),
}

impl<T: DeserializeOwned> Payload<T> {
    /// Decode `data`, keeping it verbatim when it does not match `T`
    pub fn decode(data: Value) -> Self {
        match serde_json::from_value::<T>(data.clone()) {
            Ok(known) => Payload::Known(known),
            Err(e) => {
                tracing::debug!(error = %e, "Response data did not match the expected shape");
                Payload::Unknown(data)
            }
        }
    }
}

impl<T> Payload<T> {
    pub fn known(self) -> Option<T> {
        match self {
            Payload::Known(known) => Some(known),
            Payload::Unknown(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Payload<U> {
        match self {
            Payload::Known(known) => Payload::Known(f(known)),
            Payload::Unknown(raw) => Payload::Unknown(raw),
        }
    }
}

// ==================================================================================================
// Spreadsheets and sheets
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadsheetDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        alias = "token",
        skip_serializing_if = "Option::is_none"
    )]
    pub spreadsheet_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpreadsheetData {
    pub spreadsheet: SpreadsheetDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_row_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_column_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetDescriptor {
    pub sheet_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_properties: Option<GridProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SheetListData {
    pub sheets: Vec<SheetDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SheetData {
    pub sheet: SheetDescriptor,
}

// ==================================================================================================
// Sheet mutations
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetProperties {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

/// One entry of a `sheets_batch_update` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetRequest {
    AddSheet {
        properties: SheetProperties,
    },
    DeleteSheet {
        #[serde(rename = "sheetId")]
        sheet_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SheetsBatchUpdateRequest<'a> {
    pub requests: &'a [SheetRequest],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_sheet: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_sheet: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetMutationResult {
    #[serde(default)]
    pub replies: Vec<SheetReply>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ==================================================================================================
// Cell values
// ==================================================================================================

/// How cell values are rendered when read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRenderOption {
    ToString,
    FormattedValue,
    UnformattedValue,
    Formula,
}

impl ValueRenderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueRenderOption::ToString => "ToString",
            ValueRenderOption::FormattedValue => "FormattedValue",
            ValueRenderOption::UnformattedValue => "UnformattedValue",
            ValueRenderOption::Formula => "Formula",
        }
    }
}

impl FromStr for ValueRenderOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tostring" => Ok(ValueRenderOption::ToString),
            "formattedvalue" => Ok(ValueRenderOption::FormattedValue),
            "unformattedvalue" => Ok(ValueRenderOption::UnformattedValue),
            "formula" => Ok(ValueRenderOption::Formula),
            other => Err(format!(
                "unknown value render option '{}' (expected ToString, FormattedValue, UnformattedValue or Formula)",
                other
            )),
        }
    }
}

/// Query options for range reads
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    pub value_render_option: Option<ValueRenderOption>,
    pub date_time_render_option: Option<String>,
}

impl ReadOptions {
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(option) = self.value_render_option {
            query.push(("valueRenderOption".to_string(), option.as_str().to_string()));
        }
        if let Some(ref option) = self.date_time_render_option {
            query.push(("dateTimeRenderOption".to_string(), option.clone()));
        }
        query
    }
}

/// A range together with the values to write into it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRangeInput {
    pub range: String,
    pub values: CellMatrix,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SingleRangeBody<'a> {
    pub value_range: ValueRangeRef<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ValueRangeRef<'a> {
    pub range: &'a str,
    pub values: &'a [Vec<Value>],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchRangesBody<'a> {
    pub value_ranges: &'a [ValueRangeInput],
}

/// Values read back from a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default)]
    pub values: CellMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeRead {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_token: Option<String>,
    pub value_range: ValueRange,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Outcome of write, append, prepend and batch write calls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_rows: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_columns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_cells: Option<u64>,
    /// Range the append/prepend landed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<Box<WriteResult>>,
    /// Per-range results of a batch write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<WriteResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BatchGetData {
    #[serde(default)]
    pub revision: Option<i64>,
    #[serde(default)]
    pub spreadsheet_token: Option<String>,
    #[serde(default)]
    pub value_ranges: Vec<ValueRange>,
}

/// Values of one requested range, keyed by the range string the caller asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedValues {
    pub range: String,
    pub values: CellMatrix,
}

/// Result of a batch read, in the order the ranges were requested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_token: Option<String>,
    pub value_ranges: Vec<KeyedValues>,
}

impl BatchValues {
    /// Key the returned value ranges by the requested range strings
    ///
    /// The service answers in request order but may normalise a range
    /// (e.g. `A1:A1` back as `A1`), so entries are keyed by position. Only
    /// when the counts differ is an exact string match tried first.
    pub(crate) fn from_response(requested: &[String], data: BatchGetData) -> Self {
        let positional = requested.len() == data.value_ranges.len();
        let value_ranges = requested
            .iter()
            .enumerate()
            .map(|(i, range)| {
                let matched = if positional {
                    data.value_ranges.get(i)
                } else {
                    data.value_ranges
                        .iter()
                        .find(|vr| &vr.range == range)
                        .or_else(|| data.value_ranges.get(i))
                };
                KeyedValues {
                    range: range.clone(),
                    values: matched.map(|vr| vr.values.clone()).unwrap_or_default(),
                }
            })
            .collect();

        Self {
            revision: data.revision,
            spreadsheet_token: data.spreadsheet_token,
            value_ranges,
        }
    }

    pub fn get(&self, range: &str) -> Option<&CellMatrix> {
        self.value_ranges
            .iter()
            .find(|kv| kv.range == range)
            .map(|kv| &kv.values)
    }

    pub fn ranges(&self) -> impl Iterator<Item = &str> {
        self.value_ranges.iter().map(|kv| kv.range.as_str())
    }
}
