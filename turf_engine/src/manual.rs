/*!

This is the long-form manual for `turf_engine` and `turfcalc`.

## What is computed

A TURF (Total Unduplicated Reach and Frequency) analysis looks for the best
assortment of a fixed number of items. The input is a survey where every
respondent answered, for each item, whether they would buy it (or like it,
use it, ...). Each item is a column of the table and a positive answer is
marked with a given value, `1` by default.

For a combination of items:
- the **reach** is the weighted number of respondents who answered positively
  to at least one of the items. A respondent counts once, however many items
  they like.
- the **frequency** is the weighted number of positive answers over all the
  items of the combination. A respondent who likes three items of the
  combination counts three times.

All the combinations of the requested size are scored, and the result is
sorted by decreasing reach, then decreasing frequency.

| Reach | Frequency | Combination      |
|-------|-----------|------------------|
| 4     | 4         | `Coffee, Tea`    |
| 3     | 4         | `Coffee, Juice`  |
| 3     | 4         | `Tea, Juice`     |

## Constraints

- **minimum response**: items with fewer (weighted) positive answers than this
  threshold are not considered. Forced items are kept regardless.
- **forced items**: items that are part of every combination, for example the
  products that are already on the shelf. They appear last in the combination
  labels.
- **exclusive items**: at most one of these items can be part of a combination,
  for example several flavours of the same product.
- **top**: only the best combinations are kept. This bounds the memory used
  by a run, but not its duration: every combination is still scored.

When several combinations have the same reach and the same frequency, the
one enumerated first wins. Combinations are enumerated in the order of the
columns given to the analysis.

A run that cannot produce any combination (all the items removed by the
minimum response, or every combination breaking the exclusivity) is not an
error: the result is empty and a warning is attached to it.

## Command line

`turfcalc` reads the responses from a CSV or Excel file:

```bash
turfcalc -i survey.csv --columns Coffee,Tea,Juice,Soda --size 2 --top 5
```

The options can also be written in an analysis file:

```bash
turfcalc -c analysis.json --out results.json
```

Command line flags override the values of the analysis file.

| Flag | Description |
|------|-------------|
| `-c`, `--config` | the analysis file (JSON) |
| `-i`, `--input` | the data file; overrides `filePath` |
| `--input-type` | `csv` or `xlsx`; guessed from the extension otherwise |
| `--excel-worksheet-name` | the worksheet to read in an Excel file |
| `--columns` | the candidate items (comma separated, or repeated) |
| `--size` | the number of items in a combination |
| `--weights` | the column holding the weight of each respondent |
| `--min-response` | the minimum response threshold |
| `--forced`, `--exclusive` | the constrained items |
| `--top` | the number of combinations to keep |
| `--positive` | the value marking a positive answer |
| `--parallel` | score the combinations on all the cores |
| `-o`, `--out` | where to write the result (`stdout` by default) |
| `--out-format` | `json` (default) or `csv` |
| `-r`, `--reference` | a JSON result to compare with |
| `--verbose` | debug logging |

## Analysis file

```json
{
  "dataSource": {
    "provider": "csv",
    "filePath": "survey.csv"
  },
  "columns": ["Coffee", "Tea", "Juice", "Soda"],
  "size": 2,
  "weightColumn": "weight",
  "minResponse": 10,
  "forced": ["Coffee"],
  "exclusive": ["Juice", "Soda"],
  "top": 5,
  "positiveMarker": 1
}
```

- `dataSource.provider`: `csv` or `xlsx`.
- `dataSource.filePath`: relative to the location of the analysis file.
- `dataSource.excelWorksheetName` (optional): the worksheet to read. It must be
  provided when the workbook has more than one worksheet.
- `positiveMarker` (optional): a number or a string. Defaults to `1`.

All the other fields except `columns` and `size` are optional.

## Input formats

### csv

The first row holds the column names. Empty cells are missing answers, cells
that read as numbers are numbers, anything else is kept as text.

```text
id,weight,Coffee,Tea,Juice,Soda
r1,1.2,1,0,0,1
r2,0.8,0,1,,0
```

### xlsx

The first row of the worksheet holds the column names. Numeric and boolean
cells are numbers (`TRUE` is `1`), text cells are read like CSV cells.

## Output

The JSON output lists the ranked combinations:

```json
{
  "config": { "columns": ["Coffee", "Tea", "Juice"], "size": 2 },
  "results": [
    { "rank": 1, "reach": 4.0, "frequency": 4.0, "combination": "Coffee, Tea" }
  ],
  "evaluated": 3,
  "excluded": 0,
  "cancelled": false
}
```

The CSV output has the columns `Reach`, `Frequency` and `Combination`.

 */
