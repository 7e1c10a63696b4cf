pub mod builder;
mod combinations;
mod config;
pub mod manual;
mod selection;

use log::{debug, info, warn};
use rayon::prelude::*;

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

pub use crate::builder::TableBuilder;
pub use crate::combinations::{n_choose_k, Combinations};
pub use crate::config::*;

use crate::selection::{Candidate, Selector};

// **** Private structures ****

// Number of combinations handed to the thread pool at once in parallel mode.
const PARALLEL_BATCH: usize = 8192;

/// The rows where one indicator column holds the positive marker, packed 64
/// rows per word.
#[derive(Debug, Clone)]
struct Indicator {
    bits: Vec<u64>,
    // Weighted number of positive rows.
    weighted_sum: f64,
}

impl Indicator {
    fn new(values: &[Value], marker: &Value, weights: &[f64]) -> Indicator {
        let mut bits = vec![0u64; word_count(values.len())];
        let mut weighted_sum = 0.0;
        for (row, v) in values.iter().enumerate() {
            if v.matches(marker) {
                bits[row / 64] |= 1u64 << (row % 64);
                weighted_sum += weights[row];
            }
        }
        Indicator { bits, weighted_sum }
    }
}

fn word_count(num_rows: usize) -> usize {
    (num_rows + 63) / 64
}

/// Everything the scoring loop needs, computed once per run.
///
/// Columns are referred to by their position in the request's `columns`.
#[derive(Debug)]
struct ResolvedInputs {
    names: Vec<String>,
    indicators: Vec<Indicator>,
    weights: Vec<f64>,
    // All the weights are 1: reach is a plain count of bits.
    uniform: bool,
    // The columns to enumerate, in request order.
    pool: Vec<usize>,
    // Appended to every combination, in request order.
    forced: Vec<usize>,
    is_exclusive: Vec<bool>,
    enumeration_size: usize,
}

impl ResolvedInputs {
    fn scratch(&self) -> Vec<u64> {
        vec![0u64; word_count(self.weights.len())]
    }

    /// The full combination: the picked pool positions, then the forced columns.
    fn members_into(&self, picked: &[usize], members: &mut Vec<usize>) {
        members.clear();
        members.extend(picked.iter().map(|&p| self.pool[p]));
        members.extend(self.forced.iter().cloned());
    }

    fn violates_exclusivity(&self, members: &[usize]) -> bool {
        members.iter().filter(|&&c| self.is_exclusive[c]).count() > 1
    }

    /// Reach and frequency of one combination.
    ///
    /// `scratch` must have one word per 64 rows; its content is overwritten.
    fn score(&self, members: &[usize], scratch: &mut [u64]) -> (f64, f64) {
        scratch.iter_mut().for_each(|w| *w = 0);
        let mut frequency = 0.0;
        for &c in members {
            let ind = &self.indicators[c];
            frequency += ind.weighted_sum;
            for (s, b) in scratch.iter_mut().zip(ind.bits.iter()) {
                *s |= *b;
            }
        }
        let reach = if self.uniform {
            scratch.iter().map(|w| w.count_ones() as u64).sum::<u64>() as f64
        } else {
            let mut total = 0.0;
            for (word_idx, word) in scratch.iter().enumerate() {
                let mut w = *word;
                while w != 0 {
                    let bit = w.trailing_zeros() as usize;
                    total += self.weights[word_idx * 64 + bit];
                    w &= w - 1;
                }
            }
            total
        };
        (reach, frequency)
    }

    fn scored(&self, reach: f64, frequency: f64, members: &[usize]) -> ScoredCombination {
        let columns: Vec<String> = members.iter().map(|&c| self.names[c].clone()).collect();
        ScoredCombination {
            reach,
            frequency,
            label: columns.join(", "),
            columns,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct EnumerationStats {
    evaluated: u64,
    excluded: u64,
    cancelled: bool,
}

/// Runs a TURF analysis on the given table.
///
/// Every combination of `request.size` columns allowed by the constraints is
/// scored, and the result is sorted by decreasing reach, then decreasing
/// frequency. Combinations with the same scores stay in enumeration order.
///
/// ```
/// use turf_engine::{run_turf, TableBuilder, TurfError, TurfRequest};
///
/// let table = TableBuilder::new()
///     .column("P", vec![1, 0, 1, 0, 0])?
///     .column("Q", vec![0, 1, 0, 1, 0])?
///     .column("R", vec![1, 1, 0, 0, 0])?
///     .build();
///
/// let res = run_turf(&table, &TurfRequest::new(["P", "Q", "R"], 2))?;
/// assert_eq!(res.rows[0].label, "P, Q");
/// assert_eq!(res.rows[0].reach, 4.0);
///
/// # Ok::<(), TurfError>(())
/// ```
pub fn run_turf(table: &RespondentTable, request: &TurfRequest) -> Result<TurfResult, TurfError> {
    run_turf_with_cancel(table, request, None)
}

/// Runs a TURF analysis with an optional cancellation token.
///
/// The token is checked between combinations (between batches when scoring in
/// parallel). When it is set, the run stops and returns the best combinations
/// found so far, with `cancelled` set.
pub fn run_turf_with_cancel(
    table: &RespondentTable,
    request: &TurfRequest,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<TurfResult, TurfError> {
    info!(
        "run_turf: {} respondents, columns: {:?}, size: {}",
        table.num_rows(),
        request.columns,
        request.size
    );
    debug!("run_turf: request: {:?}", request);

    validate(table, request)?;
    let inputs = resolve(table, request)?;

    let total = n_choose_k(inputs.pool.len(), inputs.enumeration_size);
    info!(
        "run_turf: choosing {} among {} eligible columns (+{} forced): {} combinations",
        inputs.enumeration_size,
        inputs.pool.len(),
        inputs.forced.len(),
        total
    );

    let mut selector = Selector::new(request.top, total);
    let cancel_flag: Option<&AtomicBool> = cancel.as_deref();
    let stats = if request.parallel {
        enumerate_parallel(&inputs, &mut selector, cancel_flag)
    } else {
        enumerate_sequential(&inputs, &mut selector, cancel_flag)
    };
    debug!("run_turf: enumeration stats: {:?}", stats);

    let rows = selector.into_ranked();

    let mut warnings: Vec<TurfWarning> = Vec::new();
    if rows.is_empty() && !stats.cancelled {
        let reason = if inputs.pool.len() < inputs.enumeration_size {
            DegenerateReason::PoolTooSmall {
                pool_size: inputs.pool.len(),
                enumeration_size: inputs.enumeration_size,
            }
        } else {
            DegenerateReason::AllExcluded {
                excluded: stats.excluded,
            }
        };
        warnings.push(TurfWarning::DegenerateResult(reason));
    }
    for w in warnings.iter() {
        warn!("run_turf: {}", w);
    }
    if stats.cancelled {
        warn!(
            "run_turf: cancelled after {} of {} combinations",
            stats.evaluated, total
        );
    }

    info!(
        "run_turf: {} combinations evaluated, {} excluded, {} kept",
        stats.evaluated,
        stats.excluded,
        rows.len()
    );
    Ok(TurfResult {
        rows,
        evaluated: stats.evaluated,
        excluded: stats.excluded,
        cancelled: stats.cancelled,
        warnings,
    })
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.map(|flag| flag.load(Ordering::Relaxed)).unwrap_or(false)
}

fn enumerate_sequential(
    inputs: &ResolvedInputs,
    selector: &mut Selector,
    cancel: Option<&AtomicBool>,
) -> EnumerationStats {
    let mut stats = EnumerationStats::default();
    let mut combinations = Combinations::new(inputs.pool.len(), inputs.enumeration_size);
    let mut scratch = inputs.scratch();
    let mut members: Vec<usize> = Vec::with_capacity(inputs.enumeration_size + inputs.forced.len());

    while let Some(picked) = combinations.next_combination() {
        if is_cancelled(cancel) {
            stats.cancelled = true;
            break;
        }
        let seq = stats.evaluated;
        stats.evaluated += 1;
        inputs.members_into(picked, &mut members);
        if inputs.violates_exclusivity(&members) {
            stats.excluded += 1;
            continue;
        }
        let (reach, frequency) = inputs.score(&members, &mut scratch);
        if selector.admits(reach, frequency) {
            selector.offer(Candidate {
                seq,
                scored: inputs.scored(reach, frequency, &members),
            });
        }
    }
    stats
}

// The enumeration itself stays sequential: batches of combinations are scored
// on the thread pool, then merged in enumeration order by this thread, which
// is the only writer of the selector. The output is the same as the
// sequential path.
fn enumerate_parallel(
    inputs: &ResolvedInputs,
    selector: &mut Selector,
    cancel: Option<&AtomicBool>,
) -> EnumerationStats {
    let mut stats = EnumerationStats::default();
    let mut combinations = Combinations::new(inputs.pool.len(), inputs.enumeration_size);

    loop {
        if is_cancelled(cancel) {
            stats.cancelled = true;
            break;
        }
        let batch: Vec<Vec<usize>> = combinations.by_ref().take(PARALLEL_BATCH).collect();
        if batch.is_empty() {
            break;
        }
        debug!(
            "enumerate_parallel: scoring batch of {} from {}",
            batch.len(),
            stats.evaluated
        );
        let scores: Vec<Option<(f64, f64, Vec<usize>)>> = batch
            .into_par_iter()
            .map_init(
                || inputs.scratch(),
                |scratch, picked| {
                    let mut members = Vec::with_capacity(picked.len() + inputs.forced.len());
                    inputs.members_into(&picked, &mut members);
                    if inputs.violates_exclusivity(&members) {
                        None
                    } else {
                        let (reach, frequency) = inputs.score(&members, scratch);
                        Some((reach, frequency, members))
                    }
                },
            )
            .collect();

        for s in scores {
            let seq = stats.evaluated;
            stats.evaluated += 1;
            match s {
                None => {
                    stats.excluded += 1;
                }
                Some((reach, frequency, members)) if selector.admits(reach, frequency) => {
                    selector.offer(Candidate {
                        seq,
                        scored: inputs.scored(reach, frequency, &members),
                    });
                }
                Some(_) => {}
            }
        }
    }
    stats
}

fn configuration_error(parameter: &'static str, message: String) -> TurfError {
    TurfError::Configuration { parameter, message }
}

fn find_duplicate(names: &[String]) -> Option<&String> {
    let mut seen: HashSet<&String> = HashSet::new();
    names.iter().find(|n| !seen.insert(*n))
}

// Read-only checks on the request. Nothing is computed before they all pass.
fn validate(table: &RespondentTable, request: &TurfRequest) -> Result<(), TurfError> {
    if request.columns.is_empty() {
        return Err(configuration_error(
            "columns",
            "at least one column is required".to_string(),
        ));
    }
    if let Some(dup) = find_duplicate(&request.columns) {
        return Err(configuration_error(
            "columns",
            format!("column {:?} is listed more than once", dup),
        ));
    }
    if let Some(missing) = request.columns.iter().find(|c| !table.has_column(c)) {
        return Err(TurfError::MissingColumn {
            parameter: "columns",
            column: missing.clone(),
        });
    }

    if request.size == 0 || request.size > request.columns.len() {
        return Err(configuration_error(
            "size",
            format!(
                "expected a size between 1 and the number of columns ({}), got {}",
                request.columns.len(),
                request.size
            ),
        ));
    }

    match &request.weights {
        Weights::Uniform => {}
        Weights::Values(v) if v.len() != table.num_rows() => {
            return Err(configuration_error(
                "weights",
                format!(
                    "expected one weight per row ({} rows), got {} weights",
                    table.num_rows(),
                    v.len()
                ),
            ));
        }
        Weights::Values(_) => {}
        Weights::Column(name) if !table.has_column(name) => {
            return Err(TurfError::MissingColumn {
                parameter: "weights",
                column: name.clone(),
            });
        }
        Weights::Column(_) => {}
    }

    if let Some(m) = request.min_response {
        if !m.is_finite() {
            return Err(configuration_error(
                "min_response",
                format!("expected a finite number, got {}", m),
            ));
        }
    }

    if let Some(dup) = find_duplicate(&request.forced) {
        return Err(configuration_error(
            "forced",
            format!("column {:?} is listed more than once", dup),
        ));
    }
    if let Some(missing) = request.forced.iter().find(|c| !table.has_column(c)) {
        return Err(TurfError::MissingColumn {
            parameter: "forced",
            column: missing.clone(),
        });
    }
    if let Some(stray) = request.forced.iter().find(|c| !request.columns.contains(c)) {
        return Err(configuration_error(
            "forced",
            format!("column {:?} is not one of the candidate columns", stray),
        ));
    }
    if request.forced.len() > request.size {
        return Err(configuration_error(
            "forced",
            format!(
                "{} forced columns do not fit in combinations of size {}",
                request.forced.len(),
                request.size
            ),
        ));
    }

    if let Some(dup) = find_duplicate(&request.exclusive) {
        return Err(configuration_error(
            "exclusive",
            format!("column {:?} is listed more than once", dup),
        ));
    }
    if let Some(missing) = request.exclusive.iter().find(|c| !table.has_column(c)) {
        return Err(TurfError::MissingColumn {
            parameter: "exclusive",
            column: missing.clone(),
        });
    }
    if let Some(stray) = request
        .exclusive
        .iter()
        .find(|c| !request.columns.contains(c))
    {
        return Err(configuration_error(
            "exclusive",
            format!("column {:?} is not one of the candidate columns", stray),
        ));
    }
    if let Some(common) = request
        .exclusive
        .iter()
        .find(|c| request.forced.contains(c))
    {
        return Err(configuration_error(
            "exclusive",
            format!("column {:?} is also forced", common),
        ));
    }

    if request.top == Some(0) {
        return Err(configuration_error(
            "top",
            "expected a positive number of combinations".to_string(),
        ));
    }
    Ok(())
}

fn resolve_weights(table: &RespondentTable, weights: &Weights) -> Result<Vec<f64>, TurfError> {
    // Missing weights do not count, like NaN cells in a weighted sum.
    let clean = |x: f64| if x.is_nan() { 0.0 } else { x };
    match weights {
        Weights::Uniform => Ok(vec![1.0; table.num_rows()]),
        Weights::Values(v) => Ok(v.iter().map(|&x| clean(x)).collect()),
        Weights::Column(name) => {
            let col = table.column(name).ok_or_else(|| TurfError::MissingColumn {
                parameter: "weights",
                column: name.clone(),
            })?;
            col.iter()
                .enumerate()
                .map(|(row, v)| match v {
                    Value::Text(s) => Err(configuration_error(
                        "weights",
                        format!(
                            "column {:?} holds the non numeric value {:?} at row {}",
                            name,
                            s,
                            row + 1
                        ),
                    )),
                    other => Ok(other.as_number().unwrap_or(0.0)),
                })
                .collect()
        }
    }
}

fn resolve(table: &RespondentTable, request: &TurfRequest) -> Result<ResolvedInputs, TurfError> {
    let weights = resolve_weights(table, &request.weights)?;

    let mut indicators: Vec<Indicator> = Vec::with_capacity(request.columns.len());
    for name in request.columns.iter() {
        let col = table.column(name).ok_or_else(|| TurfError::MissingColumn {
            parameter: "columns",
            column: name.clone(),
        })?;
        indicators.push(Indicator::new(col, &request.positive_marker, &weights));
    }
    debug!(
        "resolve: weighted positive answers: {:?}",
        request
            .columns
            .iter()
            .zip(indicators.iter())
            .map(|(n, i)| (n.as_str(), i.weighted_sum))
            .collect::<Vec<_>>()
    );

    let forced: Vec<usize> = request
        .forced
        .iter()
        .filter_map(|f| request.columns.iter().position(|c| c == f))
        .collect();

    let mut pool: Vec<usize> = Vec::new();
    for (idx, name) in request.columns.iter().enumerate() {
        if forced.contains(&idx) {
            continue;
        }
        match request.min_response {
            Some(m) if indicators[idx].weighted_sum < m => {
                debug!(
                    "resolve: dropping {:?}: {} positive answers, {} required",
                    name, indicators[idx].weighted_sum, m
                );
            }
            _ => pool.push(idx),
        }
    }

    let is_exclusive: Vec<bool> = request
        .columns
        .iter()
        .map(|c| request.exclusive.contains(c))
        .collect();

    Ok(ResolvedInputs {
        names: request.columns.clone(),
        indicators,
        weights,
        uniform: request.weights == Weights::Uniform,
        pool,
        enumeration_size: request.size - forced.len(),
        forced,
        is_exclusive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // Five respondents, three products.
    fn scenario_table() -> RespondentTable {
        TableBuilder::new()
            .column("P", vec![1, 0, 1, 0, 0])
            .and_then(|b| b.column("Q", vec![0, 1, 0, 1, 0]))
            .and_then(|b| b.column("R", vec![1, 1, 0, 0, 0]))
            .and_then(|b| b.column("w", vec![2.0, 1.0, 1.0, 1.0, 1.0]))
            .unwrap()
            .build()
    }

    fn summary(res: &TurfResult) -> Vec<(f64, f64, String)> {
        res.rows
            .iter()
            .map(|r| (r.reach, r.frequency, r.label.clone()))
            .collect()
    }

    fn row(reach: f64, frequency: f64, label: &str) -> (f64, f64, String) {
        (reach, frequency, label.to_string())
    }

    fn config_parameter(err: TurfError) -> &'static str {
        match err {
            TurfError::Configuration { parameter, .. } => parameter,
            e => panic!("expected a configuration error, got {:?}", e),
        }
    }

    #[test]
    fn all_pairs_are_ranked() {
        init_logs();
        let res = run_turf(&scenario_table(), &TurfRequest::new(["P", "Q", "R"], 2)).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(4.0, 4.0, "P, Q"), row(3.0, 4.0, "P, R"), row(3.0, 4.0, "Q, R")]
        );
        assert_eq!(res.evaluated, 3);
        assert_eq!(res.excluded, 0);
        assert!(!res.cancelled);
        assert!(res.warnings.is_empty());
        assert_eq!(res.rows[0].columns, vec!["P", "Q"]);
    }

    #[test]
    fn min_response_can_empty_the_pool() {
        init_logs();
        let request = TurfRequest::new(["P", "Q", "R"], 2).min_response(3.0);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert!(res.rows.is_empty());
        assert_eq!(res.evaluated, 0);
        assert_eq!(
            res.warnings,
            vec![TurfWarning::DegenerateResult(DegenerateReason::PoolTooSmall {
                pool_size: 0,
                enumeration_size: 2
            })]
        );
    }

    #[test]
    fn min_response_keeps_columns_at_the_threshold() {
        let request = TurfRequest::new(["P", "Q", "R"], 1).min_response(2.0);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(res.rows.len(), 3);
    }

    #[test]
    fn forced_columns_are_appended() {
        init_logs();
        let request = TurfRequest::new(["P", "Q", "R"], 2).forced(["P"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(4.0, 4.0, "Q, P"), row(3.0, 4.0, "R, P")]
        );
        assert_eq!(res.evaluated, 2);
    }

    #[test]
    fn forced_columns_bypass_min_response() {
        let request = TurfRequest::new(["P", "Q", "R"], 2)
            .weights(Weights::Column("w".to_string()))
            .min_response(3.0)
            .forced(["Q"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(5.0, 5.0, "P, Q"), row(4.0, 5.0, "R, Q")]
        );
    }

    #[test]
    fn only_forced_columns() {
        let request = TurfRequest::new(["P", "Q", "R"], 2).forced(["R", "P"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(summary(&res), vec![row(3.0, 4.0, "R, P")]);
        assert_eq!(res.evaluated, 1);
    }

    #[test]
    fn exclusive_columns_never_meet() {
        init_logs();
        let request = TurfRequest::new(["P", "Q", "R"], 2).exclusive(["Q", "R"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(4.0, 4.0, "P, Q"), row(3.0, 4.0, "P, R")]
        );
        assert_eq!(res.evaluated, 3);
        assert_eq!(res.excluded, 1);
    }

    #[test]
    fn everything_excluded_is_reported() {
        let request = TurfRequest::new(["P", "Q", "R"], 2)
            .forced(["P"])
            .exclusive(["Q", "R"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        // A single exclusive column with the forced one is fine.
        assert_eq!(res.rows.len(), 2);

        let request = TurfRequest::new(["Q", "R"], 2).exclusive(["Q", "R"]);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert!(res.rows.is_empty());
        assert_eq!(
            res.warnings,
            vec![TurfWarning::DegenerateResult(DegenerateReason::AllExcluded {
                excluded: 1
            })]
        );
    }

    #[test]
    fn top_keeps_the_best_combination() {
        let request = TurfRequest::new(["P", "Q", "R"], 2).top(1);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(summary(&res), vec![row(4.0, 4.0, "P, Q")]);
        assert_eq!(res.evaluated, 3);
    }

    #[test]
    fn top_ties_go_to_the_first_combination() {
        let request = TurfRequest::new(["P", "Q", "R"], 2).top(2);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(4.0, 4.0, "P, Q"), row(3.0, 4.0, "P, R")]
        );

        // Same table, columns listed in another order.
        let request = TurfRequest::new(["R", "Q", "P"], 2).top(2);
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(4.0, 4.0, "Q, P"), row(3.0, 4.0, "R, Q")]
        );
    }

    #[test]
    fn top_larger_than_the_number_of_combinations() {
        init_logs();
        let table = scenario_table();
        for top in [10, 1 << 20, usize::MAX / 2, usize::MAX] {
            let request = TurfRequest::new(["P", "Q", "R"], 2).top(top);
            let res = run_turf(&table, &request).unwrap();
            assert_eq!(res.rows.len(), 3);
            let parallel = run_turf(&table, &request.clone().parallel(true)).unwrap();
            assert_eq!(res, parallel);
        }
    }

    #[test]
    fn weights_from_values_and_from_a_column_agree() {
        let expected = vec![
            row(5.0, 5.0, "P, Q"),
            row(4.0, 6.0, "P, R"),
            row(4.0, 5.0, "Q, R"),
        ];
        let by_values = TurfRequest::new(["P", "Q", "R"], 2)
            .weights(Weights::Values(vec![2.0, 1.0, 1.0, 1.0, 1.0]));
        let res = run_turf(&scenario_table(), &by_values).unwrap();
        assert_eq!(summary(&res), expected);

        let by_column =
            TurfRequest::new(["P", "Q", "R"], 2).weights(Weights::Column("w".to_string()));
        let res = run_turf(&scenario_table(), &by_column).unwrap();
        assert_eq!(summary(&res), expected);
    }

    #[test]
    fn missing_weights_do_not_count() {
        let request = TurfRequest::new(["P", "Q", "R"], 1)
            .weights(Weights::Values(vec![f64::NAN, 1.0, 1.0, 1.0, 1.0]));
        let res = run_turf(&scenario_table(), &request).unwrap();
        assert_eq!(
            summary(&res),
            vec![row(2.0, 2.0, "Q"), row(1.0, 1.0, "P"), row(1.0, 1.0, "R")]
        );
    }

    #[test]
    fn missing_answers_and_text_markers() {
        let table = TableBuilder::new()
            .column(
                "A",
                vec![
                    Value::from("yes"),
                    Value::Missing,
                    Value::from("no"),
                    Value::from("yes"),
                ],
            )
            .and_then(|b| {
                b.column(
                    "B",
                    vec![
                        Value::Missing,
                        Value::from("yes"),
                        Value::from("yes"),
                        Value::from("YES"),
                    ],
                )
            })
            .unwrap()
            .build();
        let request = TurfRequest::new(["A", "B"], 2).positive_marker("yes");
        let res = run_turf(&table, &request).unwrap();
        assert_eq!(summary(&res), vec![row(4.0, 4.0, "A, B")]);

        let numeric_marker = TurfRequest::new(["A", "B"], 1);
        let res = run_turf(&table, &numeric_marker).unwrap();
        assert!(res.rows.iter().all(|r| r.reach == 0.0 && r.frequency == 0.0));
    }

    #[test]
    fn nan_cells_are_not_positive() {
        let table = TableBuilder::new()
            .column("A", vec![1.0, f64::NAN, 1.0])
            .and_then(|b| b.column("B", vec![f64::NAN, 1.0, 0.0]))
            .unwrap()
            .build();
        let request = TurfRequest::new(["A", "B"], 2).positive_marker(f64::NAN);
        let res = run_turf(&table, &request).unwrap();
        assert_eq!(summary(&res), vec![row(0.0, 0.0, "A, B")]);

        let res = run_turf(&table, &TurfRequest::new(["A", "B"], 2)).unwrap();
        assert_eq!(summary(&res), vec![row(3.0, 3.0, "A, B")]);
    }

    #[test]
    fn more_than_64_respondents() {
        let n = 150;
        let a: Vec<i32> = (0..n).map(|i| if i % 3 == 0 { 1 } else { 0 }).collect();
        let b: Vec<i32> = (0..n).map(|i| if i % 5 == 0 { 1 } else { 0 }).collect();
        let weights: Vec<f64> = (0..n).map(|i| 1.0 + (i % 2) as f64).collect();
        let table = TableBuilder::new()
            .column("A", a.clone())
            .and_then(|t| t.column("B", b.clone()))
            .unwrap()
            .build();

        let mut reach = 0.0;
        let mut frequency = 0.0;
        for i in 0..n as usize {
            let hits = a[i] + b[i];
            if hits > 0 {
                reach += weights[i];
            }
            frequency += weights[i] * hits as f64;
        }

        let request = TurfRequest::new(["A", "B"], 2).weights(Weights::Values(weights));
        let res = run_turf(&table, &request).unwrap();
        assert_eq!(summary(&res), vec![row(reach, frequency, "A, B")]);

        let res = run_turf(&table, &TurfRequest::new(["A", "B"], 2)).unwrap();
        assert_eq!(res.rows[0].reach, 70.0);
        assert_eq!(res.rows[0].frequency, 80.0);
    }

    #[test]
    fn parallel_scoring_gives_the_same_table() {
        init_logs();
        let names: Vec<String> = (0..9).map(|i| format!("item{}", i)).collect();
        let mut builder = TableBuilder::new();
        for (c, name) in names.iter().enumerate() {
            let values: Vec<Value> = (0..97)
                .map(|r| Value::from(((r * (c + 3) + c) % 4 == 0) as i32))
                .collect();
            builder.add_column(name, values).unwrap();
        }
        let weights: Vec<f64> = (0..97).map(|r| 0.5 + (r % 3) as f64).collect();
        let table = builder.build();

        for top in [None, Some(1), Some(7)] {
            let mut request = TurfRequest::new(names.clone(), 4)
                .weights(Weights::Values(weights.clone()))
                .exclusive(["item2", "item5"]);
            request.top = top;
            let sequential = run_turf(&table, &request).unwrap();
            let parallel = run_turf(&table, &request.clone().parallel(true)).unwrap();
            assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn cancelled_runs_stop_early() {
        let flag = Arc::new(AtomicBool::new(true));
        for parallel in [false, true] {
            let request = TurfRequest::new(["P", "Q", "R"], 2).parallel(parallel);
            let res = run_turf_with_cancel(&scenario_table(), &request, Some(flag.clone())).unwrap();
            assert!(res.cancelled);
            assert_eq!(res.evaluated, 0);
            assert!(res.rows.is_empty());
            assert!(res.warnings.is_empty());
        }
    }

    // 64 columns taken 6 at a time: tens of millions of combinations, far more than
    // can be scored before the flag is raised.
    fn wide_table() -> (RespondentTable, Vec<String>) {
        let mut builder = TableBuilder::new();
        let names: Vec<String> = (0..64).map(|c| format!("item{}", c)).collect();
        for (c, name) in names.iter().enumerate() {
            let values: Vec<Value> = (0..150)
                .map(|r| Value::Number(((r * 7 + c * 13) % 5 == 0) as i32 as f64))
                .collect();
            builder.add_column(name, values).unwrap();
        }
        (builder.build(), names)
    }

    #[test]
    fn cancelled_midway_keeps_the_best_so_far() {
        init_logs();
        let (table, names) = wide_table();
        let total = n_choose_k(names.len(), 6);
        for parallel in [false, true] {
            let flag = Arc::new(AtomicBool::new(false));
            let setter = {
                let flag = flag.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(std::time::Duration::from_millis(50));
                    flag.store(true, Ordering::Relaxed);
                })
            };
            let request = TurfRequest::new(names.clone(), 6).top(10).parallel(parallel);
            let res = run_turf_with_cancel(&table, &request, Some(flag)).unwrap();
            setter.join().unwrap();

            assert!(res.cancelled);
            assert!(res.evaluated > 0);
            assert!((res.evaluated as u128) < total);
            assert_eq!(res.rows.len(), 10);
            assert!(res.warnings.is_empty());
            for pair in res.rows.windows(2) {
                assert!(
                    pair[0].reach > pair[1].reach
                        || (pair[0].reach == pair[1].reach && pair[0].frequency >= pair[1].frequency)
                );
            }
        }
    }

    #[test]
    fn column_errors() {
        let table = scenario_table();
        let err = run_turf(&table, &TurfRequest::new(Vec::<String>::new(), 1)).unwrap_err();
        assert_eq!(config_parameter(err), "columns");

        let err = run_turf(&table, &TurfRequest::new(["P", "P"], 1)).unwrap_err();
        assert_eq!(config_parameter(err), "columns");

        let err = run_turf(&table, &TurfRequest::new(["P", "Z"], 1)).unwrap_err();
        assert_eq!(
            err,
            TurfError::MissingColumn {
                parameter: "columns",
                column: "Z".to_string()
            }
        );
    }

    #[test]
    fn size_errors() {
        let table = scenario_table();
        let err = run_turf(&table, &TurfRequest::new(["P", "Q"], 0)).unwrap_err();
        assert_eq!(config_parameter(err), "size");
        let err = run_turf(&table, &TurfRequest::new(["P", "Q"], 3)).unwrap_err();
        assert_eq!(config_parameter(err), "size");
    }

    #[test]
    fn weight_errors() {
        let table = scenario_table();
        let request = TurfRequest::new(["P", "Q"], 1).weights(Weights::Values(vec![1.0; 4]));
        assert_eq!(config_parameter(run_turf(&table, &request).unwrap_err()), "weights");

        let request =
            TurfRequest::new(["P", "Q"], 1).weights(Weights::Column("weight".to_string()));
        assert_eq!(
            run_turf(&table, &request).unwrap_err(),
            TurfError::MissingColumn {
                parameter: "weights",
                column: "weight".to_string()
            }
        );

        let table = TableBuilder::new()
            .column("P", vec![1, 0])
            .and_then(|b| b.column("w", vec![Value::from(1.0), Value::from("heavy")]))
            .unwrap()
            .build();
        let request = TurfRequest::new(["P"], 1).weights(Weights::Column("w".to_string()));
        assert_eq!(config_parameter(run_turf(&table, &request).unwrap_err()), "weights");
    }

    #[test]
    fn constraint_errors() {
        let table = scenario_table();
        let base = TurfRequest::new(["P", "Q", "R"], 2);

        let err = run_turf(&table, &base.clone().min_response(f64::NAN)).unwrap_err();
        assert_eq!(config_parameter(err), "min_response");

        let err = run_turf(&table, &base.clone().forced(["w"])).unwrap_err();
        assert_eq!(config_parameter(err), "forced");

        let err = run_turf(&table, &base.clone().forced(["X"])).unwrap_err();
        assert!(matches!(
            err,
            TurfError::MissingColumn {
                parameter: "forced",
                ..
            }
        ));

        let err = run_turf(&table, &base.clone().forced(["P", "Q", "R"])).unwrap_err();
        assert_eq!(config_parameter(err), "forced");

        let err = run_turf(&table, &base.clone().forced(["P", "P"])).unwrap_err();
        assert_eq!(config_parameter(err), "forced");

        let err = run_turf(&table, &base.clone().exclusive(["Q", "w"])).unwrap_err();
        assert_eq!(config_parameter(err), "exclusive");

        let err = run_turf(&table, &base.clone().forced(["P"]).exclusive(["P", "Q"])).unwrap_err();
        assert_eq!(config_parameter(err), "exclusive");

        let err = run_turf(&table, &base.clone().top(0)).unwrap_err();
        assert_eq!(config_parameter(err), "top");
    }

    #[test]
    fn errors_name_the_parameter() {
        let err = TurfError::MissingColumn {
            parameter: "forced",
            column: "X".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "forced: column \"X\" is not present in the data"
        );
    }
}
