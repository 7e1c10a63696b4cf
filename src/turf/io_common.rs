use std::path::Path;

use turf_engine::Value;

/// Reads the text of a cell: blank cells are missing, numbers are numbers and
/// everything else is kept as text.
pub fn parse_cell(s: &str) -> Value {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Value::Missing
    } else if let Ok(x) = trimmed.parse::<f64>() {
        Value::Number(x)
    } else {
        Value::Text(trimmed.to_string())
    }
}

/// The input type implied by the extension of a file, if it is a known one.
pub fn input_type_from_path(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" | "txt" => Some("csv"),
        "xlsx" | "xlsm" => Some("xlsx"),
        _ => None,
    }
}

/// Resolves a path of the analysis file against the directory of that file.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    let p = Path::new(file_path);
    if p.is_absolute() {
        file_path.to_string()
    } else {
        root.join(p).to_string_lossy().to_string()
    }
}
