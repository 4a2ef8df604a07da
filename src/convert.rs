//! Conversion pipeline: raw GFLOP/s to efficiency percentages.

use crate::data_type::DataType;
use crate::efficiency::{checked_peak, efficiency_percent};
use crate::error::{EfficiencyError, Result};
use crate::frequency::{FrequencyOption, FrequencySource};
use crate::logic::{LogicFile, ProblemSize};
use crate::specs::{HardwareSpecs, ResolvedSpec, SpecOptions};
use std::fmt;
use std::fs::Permissions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything a conversion run needs
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Input logic file
    pub input: PathBuf,
    /// Directory receiving the converted file
    pub output_dir: PathBuf,
    /// Hardware spec file; `None` uses the bundled table
    pub specs: Option<PathBuf>,
    /// Where frequencies come from
    pub frequency: FrequencyOption,
    /// How to read the spec table
    pub spec_options: SpecOptions,
    /// Only convert inputs whose file name contains this substring
    pub name_filter: Option<String>,
}

/// Result of converting one entry
#[derive(Debug, Clone, PartialEq)]
pub struct EntryReport {
    /// Problem size
    pub size: ProblemSize,
    /// Frequency used, MHz
    pub frequency: u32,
    /// Peak used, GFLOP/s
    pub peak: f64,
    /// Measured performance, GFLOP/s
    pub gflops: f64,
    /// Efficiency, percent of peak
    pub efficiency: f64,
}

/// Per-entry results of one logic file
#[derive(Debug, Clone)]
pub struct ConversionReport {
    /// Scheduler of the logic file
    pub scheduler: String,
    /// Data type of the logic file
    pub data_type: DataType,
    /// ALU rate and CU count used
    pub spec: ResolvedSpec,
    /// One report per entry, in file order
    pub entries: Vec<EntryReport>,
}

/// Summary statistics over a report's efficiencies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EfficiencySummary {
    /// Number of entries
    pub n: usize,
    /// Mean efficiency
    pub mean: f64,
    /// Lowest efficiency
    pub min: f64,
    /// Highest efficiency
    pub max: f64,
}

impl ConversionReport {
    /// Summary over all entries
    #[must_use]
    pub fn summary(&self) -> EfficiencySummary {
        if self.entries.is_empty() {
            return EfficiencySummary::default();
        }
        let n = self.entries.len();
        let effs = self.entries.iter().map(|e| e.efficiency);
        EfficiencySummary {
            n,
            mean: effs.clone().sum::<f64>() / n as f64,
            min: effs.clone().fold(f64::INFINITY, f64::min),
            max: effs.fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl fmt::Display for EfficiencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, efficiency mean {:.3}% min {:.3}% max {:.3}%",
            self.n, self.mean, self.min, self.max
        )
    }
}

/// What a run did
#[derive(Debug)]
pub enum Outcome {
    /// The converted logic file was written
    Converted {
        /// Path written
        output: PathBuf,
        /// Per-entry results
        report: ConversionReport,
    },
    /// The input did not pass the name filter; nothing was read or written
    Skipped {
        /// Input file name
        file_name: String,
    },
}

/// Convert every entry of `logic` in place.
///
/// All efficiencies are computed before any value is replaced, so on error
/// `logic` is left untouched.
///
/// # Errors
/// Returns an error if a frequency cannot be resolved or a peak input is not
/// positive.
pub fn convert(
    logic: &mut LogicFile,
    spec: &ResolvedSpec,
    frequency: &FrequencySource,
) -> Result<ConversionReport> {
    let entries = logic
        .entries
        .iter()
        .map(|entry| {
            let mhz = frequency.resolve(&entry.size)?;
            let peak = checked_peak(mhz, spec.alu_rate, spec.num_cus)?;
            Ok(EntryReport {
                size: entry.size.clone(),
                frequency: mhz,
                peak,
                gflops: entry.performance,
                efficiency: efficiency_percent(entry.performance, peak),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let values: Vec<f64> = entries.iter().map(|e| e.efficiency).collect();
    logic.set_performance(&values)?;

    Ok(ConversionReport {
        scheduler: logic.scheduler.clone(),
        data_type: logic.data_type,
        spec: *spec,
        entries,
    })
}

/// Output location: the input's base name inside `output_dir`
pub fn output_path(input: &Path, output_dir: &Path) -> Result<PathBuf> {
    let name = input.file_name().ok_or_else(|| {
        EfficiencyError::Config(format!("input {} has no file name", input.display()))
    })?;
    Ok(output_dir.join(name))
}

/// Run a full conversion: load, convert, write.
///
/// Nothing is written unless every entry converts.
pub fn run(config: &ConvertConfig) -> Result<Outcome> {
    let out_path = output_path(&config.input, &config.output_dir)?;

    if let Some(filter) = &config.name_filter {
        let file_name = config
            .input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !file_name.contains(filter.as_str()) {
            return Ok(Outcome::Skipped { file_name });
        }
    }

    let specs = match &config.specs {
        Some(path) => HardwareSpecs::load(path)?,
        None => HardwareSpecs::bundled()?,
    };
    let frequency = FrequencySource::load(&config.frequency)?;
    let mut logic = LogicFile::load(&config.input)?;
    let permissions = std::fs::metadata(&config.input)
        .map(|m| m.permissions())
        .ok();

    let spec = specs.resolve(&logic.scheduler, logic.data_type, config.spec_options)?;
    let report = convert(&mut logic, &spec, &frequency)?;

    write_atomic(&out_path, &logic.to_yaml(), permissions.as_ref())?;

    Ok(Outcome::Converted {
        output: out_path,
        report,
    })
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, creating the directory if needed.
///
/// The file gets `permissions` when given; temporary files are created
/// owner-only.
fn write_atomic(path: &Path, contents: &str, permissions: Option<&Permissions>) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| EfficiencyError::io(dir, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| EfficiencyError::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| EfficiencyError::io(tmp.path(), e))?;
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions.clone())
            .map_err(|e| EfficiencyError::io(tmp.path(), e))?;
    }
    tmp.persist(path)
        .map_err(|e| EfficiencyError::io(path, e.error))?;
    Ok(())
}
