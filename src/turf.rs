use log::{debug, info, warn};

use std::fs::File;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use text_diff::print_diff;
use turf_engine::{run_turf, TurfError, TurfRequest, TurfResult, Weights};

use crate::args::Args;
use crate::turf::config_reader::*;
use crate::turf::io_common::{input_type_from_path, resolve_path};

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;

#[derive(Debug, Snafu)]
pub enum TurfCliError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson { source: std::io::Error, path: String },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Invalid positive marker {content}: expected a number or a non-empty string"))]
    InvalidMarker { content: String },

    #[snafu(display("Error opening CSV file {path}: {source}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV file: {source}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Line {lineno} has {found} fields but the header has {expected}"))]
    CsvLineLength {
        lineno: usize,
        found: usize,
        expected: usize,
    },

    #[snafu(display("Error opening Excel file {path}: {source}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display(
        "{path} has several worksheets ({names:?}), one must be chosen with excelWorksheetName"
    ))]
    AmbiguousWorksheet { path: String, names: Vec<String> },
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: usize, content: String },

    #[snafu(display("No header row found in {path}"))]
    EmptyFile { path: String },
    #[snafu(display("The table could not be assembled: {source}"))]
    Table { source: TurfError },

    #[snafu(display("Missing parameter {name}: it must be given in the analysis file or on the command line"))]
    MissingParameter { name: String },
    #[snafu(display("Unknown input type {input_type}: expected csv or xlsx"))]
    UnknownInputType { input_type: String },
    #[snafu(display("Unknown output format {format}: expected json or csv"))]
    UnknownOutputFormat { format: String },

    #[snafu(display("Analysis failed: {source}"))]
    Analysis { source: TurfError },

    #[snafu(display("Error writing the results to {path}: {source}"))]
    WritingOutput { source: std::io::Error, path: String },
    #[snafu(display("Error writing the CSV results: {source}"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Difference detected between the computed results and the reference {path}"))]
    ReferenceMismatch { path: String },
}

pub type TurfCliResult<T> = Result<T, TurfCliError>;
pub type BTurfCliResult<T> = Result<T, Box<TurfCliError>>;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum OutputFormat {
    Json,
    Csv,
}

fn parse_output_format(format: Option<&str>) -> TurfCliResult<OutputFormat> {
    match format.unwrap_or("json") {
        "json" => Ok(OutputFormat::Json),
        "csv" => Ok(OutputFormat::Csv),
        x => UnknownOutputFormatSnafu { format: x }.fail(),
    }
}

/// The settings echoed in the JSON output.
#[derive(PartialEq, Debug, Clone, Serialize)]
struct OutputConfig {
    columns: Vec<String>,
    size: usize,
    #[serde(rename = "weightColumn", skip_serializing_if = "Option::is_none")]
    weight_column: Option<String>,
    #[serde(rename = "minResponse", skip_serializing_if = "Option::is_none")]
    min_response: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    forced: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exclusive: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top: Option<usize>,
    #[serde(rename = "positiveMarker")]
    positive_marker: String,
}

/// Applies the command line flags on top of the analysis file.
fn merge_args(config: &mut AnalysisConfig, args: &Args) {
    if let Some(columns) = &args.columns {
        config.columns = Some(columns.clone());
    }
    if let Some(size) = args.size {
        config.size = Some(size);
    }
    if let Some(weights) = &args.weights {
        config.weight_column = Some(weights.clone());
    }
    if let Some(min_response) = args.min_response {
        config.min_response = Some(min_response);
    }
    if let Some(forced) = &args.forced {
        config.forced = Some(forced.clone());
    }
    if let Some(exclusive) = &args.exclusive {
        config.exclusive = Some(exclusive.clone());
    }
    if let Some(top) = args.top {
        config.top = Some(top);
    }
    if let Some(positive) = &args.positive {
        config.positive_marker = Some(JSValue::String(positive.clone()));
    }
}

/// The data file, its type and the worksheet to read.
///
/// A path from the command line is taken as is, a path from the analysis file is
/// relative to the directory of that file.
fn resolve_input(
    config: &AnalysisConfig,
    root: &Path,
    args: &Args,
) -> TurfCliResult<(String, String, Option<String>)> {
    let source = config.data_source.as_ref();
    let (path, provider) = match (&args.input, source) {
        (Some(p), _) => (p.clone(), None),
        (None, Some(ds)) => (resolve_path(root, &ds.file_path), ds.provider.clone()),
        (None, None) => return MissingParameterSnafu { name: "input" }.fail(),
    };
    let input_type = args
        .input_type
        .clone()
        .or(provider)
        .or_else(|| input_type_from_path(&path).map(|t| t.to_string()))
        .unwrap_or_else(|| "csv".to_string());
    let worksheet = args
        .excel_worksheet_name
        .clone()
        .or_else(|| source.and_then(|ds| ds.excel_worksheet_name.clone()));
    Ok((path, input_type, worksheet))
}

fn build_request(config: &AnalysisConfig) -> TurfCliResult<TurfRequest> {
    let columns = config
        .columns
        .clone()
        .context(MissingParameterSnafu { name: "columns" })?;
    let size = config.size.context(MissingParameterSnafu { name: "size" })?;
    let mut request = TurfRequest::new(columns, size)
        .forced(config.forced.clone().unwrap_or_default())
        .exclusive(config.exclusive.clone().unwrap_or_default())
        .positive_marker(config.positive_marker()?);
    if let Some(weight_column) = &config.weight_column {
        request = request.weights(Weights::Column(weight_column.clone()));
    }
    request.min_response = config.min_response;
    request.top = config.top;
    Ok(request)
}

fn results_to_json(result: &TurfResult) -> Vec<JSValue> {
    result
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            json!({
                "rank": idx + 1,
                "reach": row.reach,
                "frequency": row.frequency,
                "combination": row.label,
            })
        })
        .collect()
}

fn build_summary_js(config: &AnalysisConfig, request: &TurfRequest, result: &TurfResult) -> JSValue {
    let c = OutputConfig {
        columns: request.columns.clone(),
        size: request.size,
        weight_column: config.weight_column.clone(),
        min_response: request.min_response,
        forced: request.forced.clone(),
        exclusive: request.exclusive.clone(),
        top: request.top,
        positive_marker: request.positive_marker.to_string(),
    };
    json!({
        "config": c,
        "results": results_to_json(result),
        "evaluated": result.evaluated,
        "excluded": result.excluded,
        "cancelled": result.cancelled,
    })
}

fn write_csv<W: io::Write>(result: &TurfResult, writer: W) -> BTurfCliResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Reach", "Frequency", "Combination"])
        .context(CsvWriteSnafu {})?;
    for row in result.rows.iter() {
        wtr.write_record([
            row.reach.to_string(),
            row.frequency.to_string(),
            row.label.clone(),
        ])
        .context(CsvWriteSnafu {})?;
    }
    wtr.flush()
        .map_err(csv::Error::from)
        .context(CsvWriteSnafu {})?;
    Ok(())
}

fn write_results(
    out: Option<&str>,
    format: OutputFormat,
    pretty_js: &str,
    result: &TurfResult,
) -> BTurfCliResult<()> {
    let path = match out {
        None | Some("") => "stdout",
        Some(p) => p,
    };
    let mut writer: Box<dyn Write> = if path == "stdout" {
        Box::new(io::stdout())
    } else {
        Box::new(File::create(path).context(WritingOutputSnafu { path })?)
    };
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", pretty_js).context(WritingOutputSnafu { path })?;
            writer.flush().context(WritingOutputSnafu { path })?;
        }
        OutputFormat::Csv => write_csv(result, writer)?,
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> BTurfCliResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("check_reference: reference: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("check_reference: found differences with the reference");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return Err(Box::new(TurfCliError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    info!("check_reference: the results match {}", reference_path);
    Ok(())
}

pub fn run_analysis(args: &Args) -> BTurfCliResult<()> {
    let (mut config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (AnalysisConfig::default(), PathBuf::new()),
    };
    merge_args(&mut config, args);
    info!("run_analysis: config: {:?}", config);

    // Check everything that does not need the data first.
    let out_format = parse_output_format(args.out_format.as_deref())?;
    let request = build_request(&config)?.parallel(args.parallel);
    let (input_path, input_type, worksheet) = resolve_input(&config, &root, args)?;

    info!("run_analysis: reading {} as {}", input_path, input_type);
    let table = match input_type.as_str() {
        "csv" => io_csv::read_csv_table(&input_path)?,
        "xlsx" => io_excel::read_excel_table(&input_path, worksheet.as_deref())?,
        x => {
            return Err(Box::new(TurfCliError::UnknownInputType {
                input_type: x.to_string(),
            }))
        }
    };
    info!(
        "run_analysis: {} respondents, {} columns",
        table.num_rows(),
        table.num_columns()
    );

    let result = run_turf(&table, &request).context(AnalysisSnafu {})?;
    for w in result.warnings.iter() {
        eprintln!("Warning: {}", w);
    }

    let result_js = build_summary_js(&config, &request, &result);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_results(args.out.as_deref(), out_format, &pretty_js_stats, &result)?;

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}
