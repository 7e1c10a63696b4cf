// Reading the analysis file.

use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;
use turf_engine::Value;

use crate::turf::io_common::parse_cell;
use crate::turf::*;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    /// csv or xlsx
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

/// The content of an analysis file. Every field may also be set on the command line.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(rename = "dataSource")]
    pub data_source: Option<DataSource>,
    pub columns: Option<Vec<String>>,
    pub size: Option<usize>,
    #[serde(rename = "weightColumn")]
    pub weight_column: Option<String>,
    #[serde(rename = "minResponse")]
    pub min_response: Option<f64>,
    pub forced: Option<Vec<String>>,
    pub exclusive: Option<Vec<String>>,
    pub top: Option<usize>,
    #[serde(rename = "positiveMarker")]
    pub positive_marker: Option<JSValue>,
}

impl AnalysisConfig {
    /// The marker of a positive answer. Strings are read like the cells of a CSV file,
    /// so that "1" and 1 are the same marker.
    pub fn positive_marker(&self) -> TurfCliResult<Value> {
        match &self.positive_marker {
            None | Some(JSValue::Null) => Ok(Value::Number(1.0)),
            Some(JSValue::Number(n)) => n
                .as_f64()
                .map(Value::Number)
                .context(InvalidMarkerSnafu {
                    content: n.to_string(),
                }),
            Some(JSValue::String(s)) => match parse_cell(s) {
                Value::Missing => InvalidMarkerSnafu { content: s.clone() }.fail(),
                v => Ok(v),
            },
            Some(JSValue::Bool(b)) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
            Some(x) => InvalidMarkerSnafu {
                content: x.to_string(),
            }
            .fail(),
        }
    }
}

pub fn read_config(path: &str) -> TurfCliResult<AnalysisConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: AnalysisConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TurfCliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}
