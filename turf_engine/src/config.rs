// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The content of one cell in a respondent table.
///
/// Survey exports mix numeric codes, labels and blanks in the same file, so
/// cells are kept in this small closed form rather than forcing one type.
#[derive(PartialEq, Debug, Clone)]
pub enum Value {
    /// A blank cell, or a cell that could not be read.
    Missing,
    Number(f64),
    Text(String),
}

impl Value {
    /// The numerical content of the cell, if any. NaN counts as missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(x) if !x.is_nan() => Some(*x),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(x) => x.is_nan(),
            Value::Text(_) => false,
        }
    }

    /// True if this cell holds the given marker.
    ///
    /// Numbers compare numerically (`1` and `1.0` are the same marker) and texts
    /// compare exactly. A missing cell never matches, whatever the marker.
    pub fn matches(&self, marker: &Value) -> bool {
        if self.is_missing() || marker.is_missing() {
            return false;
        }
        match (self, marker) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Missing => write!(f, ""),
            Value::Number(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Value {
        Value::Number(x)
    }
}

impl From<i32> for Value {
    fn from(x: i32) -> Value {
        Value::Number(x as f64)
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Value {
        Value::Number(x as f64)
    }
}

impl From<Option<f64>> for Value {
    fn from(x: Option<f64>) -> Value {
        x.map(Value::Number).unwrap_or(Value::Missing)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

/// Survey answers: one row per respondent, one named column per question.
///
/// Tables are assembled with the [`crate::builder::TableBuilder`], which
/// guarantees that the names are unique and that all the columns have the same
/// length.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct RespondentTable {
    pub(crate) names: Vec<String>,
    pub(crate) columns: Vec<Vec<Value>>,
    pub(crate) num_rows: usize,
}

impl RespondentTable {
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.names.len()
    }

    /// The column names, in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.columns[idx].as_slice())
    }
}

/// Where the weight of each respondent comes from.
#[derive(PartialEq, Debug, Clone)]
pub enum Weights {
    /// Every respondent counts for 1.
    Uniform,
    /// One weight per row, in row order.
    Values(Vec<f64>),
    /// The name of a numeric column of the table.
    Column(String),
}

/// The parameters of one TURF run.
///
/// Only the candidate columns and the size of the combinations are mandatory.
/// The other constraints are added with the chaining methods:
///
/// ```
/// use turf_engine::{TurfRequest, Weights};
///
/// let request = TurfRequest::new(["Coffee", "Tea", "Juice", "Soda"], 2)
///     .weights(Weights::Column("weight".to_string()))
///     .forced(["Coffee"])
///     .exclusive(["Juice", "Soda"])
///     .top(5);
/// assert_eq!(request.top, Some(5));
/// ```
#[derive(PartialEq, Debug, Clone)]
pub struct TurfRequest {
    /// The candidate indicator columns, in the order used for enumeration.
    pub columns: Vec<String>,
    /// Number of columns in every combination.
    pub size: usize,
    pub weights: Weights,
    /// Columns whose weighted number of positive answers is strictly below
    /// this value are never enumerated.
    pub min_response: Option<f64>,
    /// Columns appended to every combination. Empty if not used.
    pub forced: Vec<String>,
    /// At most one of these columns may appear in a combination. Empty if not used.
    pub exclusive: Vec<String>,
    /// If set, only the best `top` combinations are kept.
    pub top: Option<usize>,
    /// The cell value that marks a positive answer. Defaults to `1`.
    pub positive_marker: Value,
    /// Scores the combinations on the rayon thread pool.
    pub parallel: bool,
}

impl TurfRequest {
    pub fn new<I, S>(columns: I, size: usize) -> TurfRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TurfRequest {
            columns: columns.into_iter().map(|s| s.into()).collect(),
            size,
            weights: Weights::Uniform,
            min_response: None,
            forced: Vec::new(),
            exclusive: Vec::new(),
            top: None,
            positive_marker: Value::Number(1.0),
            parallel: false,
        }
    }

    pub fn weights(mut self, weights: Weights) -> TurfRequest {
        self.weights = weights;
        self
    }

    pub fn min_response(mut self, min_response: f64) -> TurfRequest {
        self.min_response = Some(min_response);
        self
    }

    pub fn forced<I, S>(mut self, forced: I) -> TurfRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forced = forced.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn exclusive<I, S>(mut self, exclusive: I) -> TurfRequest
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusive = exclusive.into_iter().map(|s| s.into()).collect();
        self
    }

    pub fn top(mut self, top: usize) -> TurfRequest {
        self.top = Some(top);
        self
    }

    pub fn positive_marker<V: Into<Value>>(mut self, marker: V) -> TurfRequest {
        self.positive_marker = marker.into();
        self
    }

    pub fn parallel(mut self, parallel: bool) -> TurfRequest {
        self.parallel = parallel;
        self
    }
}

// ******** Output data structures *********

/// One evaluated combination.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoredCombination {
    /// Weighted number of respondents with at least one positive answer.
    pub reach: f64,
    /// Weighted number of positive answers, counting a respondent once per column.
    pub frequency: f64,
    /// The column names joined with `", "`, forced columns last.
    pub label: String,
    pub columns: Vec<String>,
}

/// Why a run produced no combination at all.
#[derive(PartialEq, Debug, Clone)]
pub enum DegenerateReason {
    /// The eligible columns are fewer than the number to choose.
    PoolTooSmall {
        pool_size: usize,
        enumeration_size: usize,
    },
    /// Every combination had more than one mutually exclusive column.
    AllExcluded { excluded: u64 },
}

/// Non fatal conditions met during a run.
#[derive(PartialEq, Debug, Clone)]
pub enum TurfWarning {
    DegenerateResult(DegenerateReason),
}

impl Display for TurfWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurfWarning::DegenerateResult(DegenerateReason::PoolTooSmall {
                pool_size,
                enumeration_size,
            }) => write!(
                f,
                "empty result: {} eligible column(s) left to choose {} from",
                pool_size, enumeration_size
            ),
            TurfWarning::DegenerateResult(DegenerateReason::AllExcluded { excluded }) => write!(
                f,
                "empty result: all {} combination(s) contain several exclusive columns",
                excluded
            ),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TurfResult {
    /// The ranked combinations, best first.
    pub rows: Vec<ScoredCombination>,
    /// Number of combinations produced by the enumeration.
    pub evaluated: u64,
    /// Number of combinations dropped by the exclusivity constraint.
    pub excluded: u64,
    /// True if the run was interrupted. The rows are then the best found so far.
    pub cancelled: bool,
    pub warnings: Vec<TurfWarning>,
}

/// Errors that prevent a run from starting.
///
/// `parameter` is the name of the offending argument of the request.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TurfError {
    /// A parameter is out of range or inconsistent with the others.
    Configuration {
        parameter: &'static str,
        message: String,
    },
    /// A column referenced by a parameter is not in the table.
    MissingColumn {
        parameter: &'static str,
        column: String,
    },
    /// The table could not be assembled.
    MalformedTable { message: String },
}

impl Error for TurfError {}

impl Display for TurfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurfError::Configuration { parameter, message } => {
                write!(f, "invalid {}: {}", parameter, message)
            }
            TurfError::MissingColumn { parameter, column } => {
                write!(f, "{}: column {:?} is not present in the data", parameter, column)
            }
            TurfError::MalformedTable { message } => write!(f, "malformed table: {}", message),
        }
    }
}
