//! Clock frequency resolution.
//!
//! A run uses exactly one source: a fixed SCLK for every entry, or a
//! frequency table (CSV) giving the winner frequency of each problem size.

use crate::error::{EfficiencyError, Result};
use crate::logic::{ProblemSize, SIZE_DIMS};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Column holding the winner frequency in MHz
pub const WINNER_FREQ_COLUMN: &str = "WinnerFreq";

/// Frequency source as requested on the command line, before any file is read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrequencyOption {
    /// Fixed SCLK in MHz
    Fixed(u32),
    /// Path of a frequency table
    Table(PathBuf),
}

impl FrequencyOption {
    /// Pick the frequency source from the optional SCLK and CSV path.
    ///
    /// # Errors
    /// Exactly one of the two must be given; anything else is a
    /// configuration error.
    pub fn from_args(sclk: Option<u32>, table: Option<PathBuf>) -> Result<Self> {
        match (sclk, table) {
            (Some(mhz), None) => Ok(Self::Fixed(mhz)),
            (None, Some(path)) => Ok(Self::Table(path)),
            _ => Err(EfficiencyError::Config(
                "specify frequency information either through a CSV file or through the SCLK parameter"
                    .into(),
            )),
        }
    }
}

/// One row of a frequency table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrequencyRow {
    /// `SizeI, SizeJ, SizeK, SizeL, LDD, LDC, LDA, LDB`
    pub size: [u64; 8],
    /// Winner frequency in MHz
    pub winner_freq: u32,
}

/// Frequency table keyed by the 8-dimension problem size
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    rows: HashMap<[u64; 8], u32>,
}

impl FrequencyTable {
    /// Build a table from rows; duplicate sizes are rejected and reported
    /// by 1-based row position.
    pub fn from_rows(rows: impl IntoIterator<Item = FrequencyRow>) -> Result<Self> {
        let mut table = Self::default();
        let mut first_seen = HashMap::new();
        for (i, row) in rows.into_iter().enumerate() {
            table.insert(row, i + 1, &mut first_seen)?;
        }
        Ok(table)
    }

    /// Load a table from a CSV file.
    ///
    /// Whitespace around fields is ignored and extra columns are skipped.
    /// Size and frequency fields must be integers.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a required column is
    /// missing, a field does not parse, or two rows share a size.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| EfficiencyError::io(path, e))?;
        Self::from_reader(file, path)
    }

    /// Read a table from CSV data; `path` is used for diagnostics
    pub fn from_reader<R: std::io::Read>(reader: R, path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| EfficiencyError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        };
        let size_cols = SIZE_DIMS
            .into_iter()
            .map(&column)
            .collect::<Result<Vec<_>>>()?;
        let freq_col = column(WINNER_FREQ_COLUMN)?;

        let mut table = Self::default();
        let mut first_seen = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let line = record
                .position()
                .map_or(0, |p| usize::try_from(p.line()).unwrap_or(usize::MAX));
            if record.iter().all(str::is_empty) {
                continue;
            }

            let mut size = [0u64; 8];
            for ((slot, &col), name) in size.iter_mut().zip(&size_cols).zip(SIZE_DIMS) {
                *slot = parse_field(&record, col, name, path, line)?;
            }
            let winner_freq = parse_field(&record, freq_col, WINNER_FREQ_COLUMN, path, line)?;

            table.insert(FrequencyRow { size, winner_freq }, line, &mut first_seen)?;
        }
        Ok(table)
    }

    fn insert(
        &mut self,
        row: FrequencyRow,
        line: usize,
        first_seen: &mut HashMap<[u64; 8], usize>,
    ) -> Result<()> {
        if let Some(&first_line) = first_seen.get(&row.size) {
            return Err(EfficiencyError::DuplicateFrequencyRow {
                size: ProblemSize::from(row.size).to_string(),
                first_line,
                line,
            });
        }
        first_seen.insert(row.size, line);
        self.rows.insert(row.size, row.winner_freq);
        Ok(())
    }

    /// Winner frequency of a size, if the table has one
    pub fn lookup(&self, size: &ProblemSize) -> Option<u32> {
        size.key().and_then(|key| self.rows.get(&key).copied())
    }
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    col: usize,
    column: &str,
    path: &Path,
    line: usize,
) -> Result<T> {
    let err = |message: String| EfficiencyError::CsvParse {
        path: path.to_path_buf(),
        line,
        column: column.to_string(),
        message,
    };
    let value = record.get(col).ok_or_else(|| err("field missing".into()))?;
    value
        .parse()
        .map_err(|_| err(format!("expected an integer, got {value:?}")))
}

/// Loaded frequency source
#[derive(Debug, Clone)]
pub enum FrequencySource {
    /// Same SCLK for every entry
    Fixed(u32),
    /// Per-size winner frequency
    Table(FrequencyTable),
}

impl FrequencySource {
    /// Load the source named by `option`
    pub fn load(option: &FrequencyOption) -> Result<Self> {
        match option {
            FrequencyOption::Fixed(mhz) => Ok(Self::Fixed(*mhz)),
            FrequencyOption::Table(path) => Ok(Self::Table(FrequencyTable::load(path)?)),
        }
    }

    /// Frequency in MHz for one problem size.
    ///
    /// # Errors
    /// Returns [`EfficiencyError::FrequencyNotFound`] if the table has no row
    /// for `size`.
    pub fn resolve(&self, size: &ProblemSize) -> Result<u32> {
        match self {
            Self::Fixed(mhz) => Ok(*mhz),
            Self::Table(table) => table
                .lookup(size)
                .ok_or_else(|| EfficiencyError::FrequencyNotFound {
                    size: size.to_string(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
SizeI, SizeJ, SizeK, SizeL, LDD, LDC, LDA, LDB, TotalFlops, WinnerGFlops, WinnerFreq
128, 128, 1, 64, 128, 128, 128, 128, 2097152, 3660.8, 1300
1024, 1024, 1, 1024, 1024, 1024, 1024, 1024, 2147483648, 7321.6, 1500
";

    fn table(csv: &str) -> Result<FrequencyTable> {
        FrequencyTable::from_reader(csv.as_bytes(), Path::new("freq.csv"))
    }

    #[test]
    fn test_option_requires_exactly_one_source() {
        assert_eq!(
            FrequencyOption::from_args(Some(1300), None).expect("fixed"),
            FrequencyOption::Fixed(1300)
        );
        assert!(matches!(
            FrequencyOption::from_args(None, Some("f.csv".into())),
            Ok(FrequencyOption::Table(_))
        ));
        assert!(matches!(
            FrequencyOption::from_args(Some(1300), Some("f.csv".into())),
            Err(EfficiencyError::Config(_))
        ));
        assert!(matches!(
            FrequencyOption::from_args(None, None),
            Err(EfficiencyError::Config(_))
        ));
    }

    #[test]
    fn test_load_with_whitespace_and_extra_columns() {
        let t = table(CSV).expect("table");
        let size = ProblemSize::from([128, 128, 1, 64, 128, 128, 128, 128]);
        assert_eq!(t.lookup(&size), Some(1300));
        let size = ProblemSize::from([1024, 1024, 1, 1024, 1024, 1024, 1024, 1024]);
        assert_eq!(t.lookup(&size), Some(1500));
    }

    #[test]
    fn test_lookup_miss_and_short_size() {
        let t = table(CSV).expect("table");
        assert_eq!(t.lookup(&ProblemSize::from([1, 2, 3, 4, 5, 6, 7, 8])), None);
        assert_eq!(t.lookup(&ProblemSize::new(vec![128, 128, 1, 64])), None);
    }

    #[test]
    fn test_duplicate_rows_rejected() {
        let csv = format!("{CSV}128, 128, 1, 64, 128, 128, 128, 128, 0, 0, 1400\n");
        let err = table(&csv).unwrap_err();
        match err {
            EfficiencyError::DuplicateFrequencyRow {
                first_line, line, ..
            } => {
                assert_eq!(first_line, 2);
                assert_eq!(line, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_integer_field_rejected() {
        let csv = CSV.replace("1300", "1300.5");
        let err = table(&csv).unwrap_err();
        assert!(matches!(err, EfficiencyError::CsvParse { line: 2, .. }));
        assert!(err.to_string().contains("WinnerFreq"));
    }

    #[test]
    fn test_missing_column() {
        let err = table("SizeI,SizeJ\n1,2\n").unwrap_err();
        assert!(matches!(err, EfficiencyError::MissingColumn { .. }));
    }

    #[test]
    fn test_source_resolve() {
        let fixed = FrequencySource::Fixed(1300);
        let size = ProblemSize::new(vec![1, 1, 1, 1]);
        assert_eq!(fixed.resolve(&size).expect("fixed"), 1300);

        let tabled = FrequencySource::Table(table(CSV).expect("table"));
        let err = tabled.resolve(&size).unwrap_err();
        assert!(err.to_string().contains("[1, 1, 1, 1]"));
    }

    #[test]
    fn test_from_rows() {
        let row = FrequencyRow {
            size: [1, 2, 3, 4, 5, 6, 7, 8],
            winner_freq: 1200,
        };
        let t = FrequencyTable::from_rows([row]).expect("table");
        assert_eq!(t.lookup(&ProblemSize::from(row.size)), Some(1200));
        assert!(FrequencyTable::from_rows([row, row]).is_err());
    }
}
