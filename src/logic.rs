//! Typed view over a library logic file.
//!
//! A logic file is a YAML sequence whose slots have fixed meanings:
//!
//! | slot | content                                              |
//! |------|------------------------------------------------------|
//! | 1    | scheduler name                                       |
//! | 4    | problem type mapping, including `DataType`           |
//! | 7    | results: `[[size dims...], [solution index, gflops]]` |
//!
//! The document is validated when loaded. The source text is kept together
//! with the location of every performance scalar, so the written file is the
//! input byte for byte except for those scalars.

use crate::data_type::DataType;
use crate::error::{EfficiencyError, Result};
use serde_yaml::Value;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

const SCHEDULER_SLOT: usize = 1;
const PROBLEM_TYPE_SLOT: usize = 4;
const RESULTS_SLOT: usize = 7;

/// Index of the performance value inside an entry's performance record
const GFLOPS_FIELD: usize = 1;

/// Dimension names of a full 8-dimension size
pub const SIZE_DIMS: [&str; 8] = [
    "SizeI", "SizeJ", "SizeK", "SizeL", "LDD", "LDC", "LDA", "LDB",
];

/// Problem size of a result entry: `I, J, K, L` and, when present, the
/// leading dimensions `LDD, LDC, LDA, LDB`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemSize(Vec<u64>);

impl ProblemSize {
    /// Create a size from its dimensions
    pub fn new(dims: Vec<u64>) -> Self {
        Self(dims)
    }

    /// All dimensions in file order
    pub fn dims(&self) -> &[u64] {
        &self.0
    }

    /// The 8-dimension key used by frequency tables, if this size has one
    pub fn key(&self) -> Option<[u64; 8]> {
        self.dims().try_into().ok()
    }
}

impl From<[u64; 8]> for ProblemSize {
    fn from(dims: [u64; 8]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for ProblemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// One tuned size and its measured performance
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    /// Problem size
    pub size: ProblemSize,
    /// Performance value (GFLOP/s before conversion, percent after)
    pub performance: f64,
}

/// A parsed logic file
#[derive(Debug, Clone)]
pub struct LogicFile {
    path: PathBuf,
    source: String,
    document: Value,
    /// Byte range of each entry's performance scalar in `source`
    spans: Vec<Range<usize>>,
    /// Scheduler name (slot 1)
    pub scheduler: String,
    /// Data type of the problem type (slot 4)
    pub data_type: DataType,
    /// Result entries (slot 7)
    pub entries: Vec<ResultEntry>,
}

impl LogicFile {
    /// Load and validate a logic file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EfficiencyError::io(path, e))?;
        Self::parse(&content, path)
    }

    /// Parse and validate logic file content; `path` is used for diagnostics
    /// and the output file name
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let document: Value = serde_yaml::from_str(content).map_err(|e| format_err(path, e))?;
        let slots = document
            .as_sequence()
            .ok_or_else(|| format_err(path, "top level must be a sequence"))?;
        if slots.len() <= RESULTS_SLOT {
            return Err(format_err(
                path,
                format!(
                    "expected at least {} top-level entries, found {}",
                    RESULTS_SLOT + 1,
                    slots.len()
                ),
            ));
        }

        let scheduler = slots[SCHEDULER_SLOT]
            .as_str()
            .ok_or_else(|| format_err(path, "slot 1 (scheduler) must be a string"))?
            .to_string();

        let data_type_value = slots[PROBLEM_TYPE_SLOT]
            .as_mapping()
            .ok_or_else(|| format_err(path, "slot 4 (problem type) must be a mapping"))?
            .get("DataType")
            .ok_or_else(|| format_err(path, "problem type has no DataType"))?;
        let data_type = DataType::from_yaml(data_type_value)?;

        let results = slots[RESULTS_SLOT]
            .as_sequence()
            .ok_or_else(|| format_err(path, "slot 7 (results) must be a sequence"))?;
        let entries = results
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                parse_entry(entry).map_err(|m| format_err(path, format!("entry {i}: {m}")))
            })
            .collect::<Result<Vec<_>>>()?;

        let spans = performance_spans(content).map_err(|m| format_err(path, m))?;
        if spans.len() != entries.len() {
            return Err(format_err(
                path,
                format!(
                    "found {} performance scalars for {} entries",
                    spans.len(),
                    entries.len()
                ),
            ));
        }

        Ok(Self {
            path: path.to_path_buf(),
            source: content.to_string(),
            document,
            spans,
            scheduler,
            data_type,
            entries,
        })
    }

    /// Replace every entry's performance value, in entry order.
    ///
    /// Either all values are replaced or, on error, none are.
    pub fn set_performance(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.entries.len() {
            return Err(format_err(
                &self.path,
                format!(
                    "{} performance values for {} entries",
                    values.len(),
                    self.entries.len()
                ),
            ));
        }

        let results = self
            .document
            .get_mut(RESULTS_SLOT)
            .and_then(Value::as_sequence_mut)
            .ok_or_else(|| format_err(&self.path, "slot 7 (results) must be a sequence"))?;
        // checked at load
        let records = results
            .iter_mut()
            .map(|entry| entry.get_mut(1).and_then(|r| r.get_mut(GFLOPS_FIELD)))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| format_err(&self.path, "result entry lost its performance record"))?;

        for ((slot, entry), &value) in records.into_iter().zip(&mut self.entries).zip(values) {
            *slot = Value::from(value);
            entry.performance = value;
        }
        Ok(())
    }

    /// The source text with each performance scalar replaced by the entry's
    /// current value
    pub fn to_yaml(&self) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;
        for (span, entry) in self.spans.iter().zip(&self.entries) {
            out.push_str(&self.source[last..span.start]);
            out.push_str(&format_float(entry.performance));
            last = span.end;
        }
        out.push_str(&self.source[last..]);
        out
    }

    /// The underlying YAML document
    pub fn document(&self) -> &Value {
        &self.document
    }
}

fn parse_entry(entry: &Value) -> std::result::Result<ResultEntry, String> {
    let pair = entry
        .as_sequence()
        .filter(|p| p.len() >= 2)
        .ok_or("must be a [size, performance] pair")?;

    let dims = pair[0]
        .as_sequence()
        .filter(|d| !d.is_empty())
        .ok_or("size must be a non-empty sequence")?
        .iter()
        .map(|d| {
            d.as_u64()
                .ok_or_else(|| format!("size dimension {} is not a non-negative integer", show(d)))
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let performance = pair[1]
        .as_sequence()
        .and_then(|r| r.get(GFLOPS_FIELD))
        .ok_or("performance must be a [solution, gflops] sequence")?;
    let performance = performance
        .as_f64()
        .ok_or_else(|| format!("performance {} is not a number", show(performance)))?;

    Ok(ResultEntry {
        size: ProblemSize::new(dims),
        performance,
    })
}

/// Render a float as a YAML float scalar that never reads back as an integer
fn format_float(v: f64) -> String {
    if v.is_nan() {
        ".nan".into()
    } else if v.is_infinite() {
        if v > 0.0 { ".inf" } else { "-.inf" }.into()
    } else if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

/// Node path, per enclosing collection, of a performance scalar:
/// results slot, entry (any), performance record, value
const PERFORMANCE_PATH: [Option<usize>; 4] =
    [Some(RESULTS_SLOT), None, Some(1), Some(GFLOPS_FIELD)];

struct Frame {
    sequence: bool,
    /// Index of the next child node
    child: usize,
}

/// Collects the start position of every performance scalar
#[derive(Default)]
struct SpanCollector {
    stack: Vec<Frame>,
    found: Vec<(usize, String, TScalarStyle)>,
    error: Option<String>,
}

impl SpanCollector {
    fn at_performance(&self) -> bool {
        self.stack.len() == PERFORMANCE_PATH.len()
            && self
                .stack
                .iter()
                .zip(PERFORMANCE_PATH)
                .all(|(frame, want)| frame.sequence && want.map_or(true, |w| frame.child == w))
    }

    fn node_done(&mut self) {
        if let Some(parent) = self.stack.last_mut() {
            parent.child += 1;
        }
    }
}

impl MarkedEventReceiver for SpanCollector {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::Scalar(value, style, ..) => {
                if self.at_performance() {
                    self.found.push((mark.index(), value, style));
                }
                self.node_done();
            }
            Event::Alias(..) => {
                if self.at_performance() && self.error.is_none() {
                    self.error = Some(format!(
                        "performance at line {} is an alias",
                        mark.line()
                    ));
                }
                self.node_done();
            }
            Event::SequenceStart(..) | Event::MappingStart(..) => {
                self.stack.push(Frame {
                    sequence: matches!(ev, Event::SequenceStart(..)),
                    child: 0,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => {
                self.stack.pop();
                self.node_done();
            }
            _ => {}
        }
    }
}

/// Byte ranges of the performance scalars of `content`, in entry order
fn performance_spans(content: &str) -> std::result::Result<Vec<Range<usize>>, String> {
    let mut collector = SpanCollector::default();
    Parser::new_from_str(content)
        .load(&mut collector, false)
        .map_err(|e| e.to_string())?;
    if let Some(message) = collector.error {
        return Err(message);
    }

    // markers count chars; walk the source once to turn them into bytes
    let mut chars = content.char_indices();
    let mut consumed = 0;
    let mut spans = Vec::with_capacity(collector.found.len());
    for (char_index, value, style) in collector.found {
        let start = chars
            .nth(char_index.saturating_sub(consumed))
            .map_or(content.len(), |(byte, _)| byte);
        consumed = char_index + 1;
        let end = start + value.len();
        if !matches!(style, TScalarStyle::Plain) || content.get(start..end) != Some(value.as_str())
        {
            return Err(format!("performance {value:?} is not a plain scalar"));
        }
        spans.push(start..end);
    }
    Ok(spans)
}

fn show(v: &Value) -> String {
    serde_yaml::to_string(v)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| format!("{v:?}"))
}

fn format_err(path: &Path, message: impl fmt::Display) -> EfficiencyError {
    EfficiencyError::LogicFormat {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
