//! Hardware specification table.
//!
//! Maps a scheduler name to its per-data-type ALU rates (flops per cycle per
//! compute unit) for the mfma and non-mfma instruction paths, and to its
//! compute-unit count:
//!
//! ```yaml
//! vega20:
//!   non_mfma: {S: 128, D: 64, H: 256}
//!   numCUs: {mi50: 60, mi60: 64}
//! aldebaran:
//!   mfma: {S: 256, D: 256, H: 1024}
//!   non_mfma: {S: 256, D: 256, H: 512}
//!   numCUs: 110
//! ```

use crate::data_type::DataType;
use crate::error::{EfficiencyError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Spec file shipped with the binary, used when no spec path is given
pub const BUNDLED_SPECS: &str = include_str!("../default_specs.yaml");

/// Scheduler whose CU count depends on the board variant
const VEGA20: &str = "vega20";

/// Compute-unit count of a scheduler
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ComputeUnits {
    /// One count for every board
    Scalar(u32),
    /// Count per board variant (e.g. `mi50`, `mi60`)
    Variants(BTreeMap<String, u32>),
}

/// Rates and CU count of one scheduler
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchedulerSpec {
    /// ALU rates when tuning used matrix-fma instructions
    #[serde(default)]
    pub mfma: BTreeMap<String, f64>,
    /// ALU rates for plain vector instructions
    #[serde(default)]
    pub non_mfma: BTreeMap<String, f64>,
    /// Compute-unit count
    #[serde(rename = "numCUs")]
    pub num_cus: ComputeUnits,
}

/// How the spec table should be read for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecOptions {
    /// Tuning ran on a single CU; efficiency stays per CU
    pub per_cu: bool,
    /// Use the mfma rates
    pub mfma: bool,
    /// vega20 board was an mi50 (otherwise mi60)
    pub mi50: bool,
}

impl SpecOptions {
    fn rate_key(self) -> &'static str {
        if self.mfma {
            "mfma"
        } else {
            "non_mfma"
        }
    }
}

/// ALU rate and CU count resolved for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSpec {
    /// Flops per cycle per CU
    pub alu_rate: f64,
    /// Number of CUs the peak is aggregated over
    pub num_cus: u32,
}

/// Hardware specification table keyed by scheduler name
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct HardwareSpecs {
    schedulers: BTreeMap<String, SchedulerSpec>,
}

impl HardwareSpecs {
    /// Load a spec table from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EfficiencyError::io(path, e))?;
        Self::parse(&content)
            .map_err(|e| EfficiencyError::SpecFormat(format!("{}: {e}", path.display())))
    }

    /// The table shipped with the binary
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_SPECS)
    }

    /// Parse a spec table from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| EfficiencyError::SpecFormat(e.to_string()))
    }

    /// Spec of one scheduler
    pub fn scheduler(&self, name: &str) -> Option<&SchedulerSpec> {
        self.schedulers.get(name)
    }

    /// Resolve the ALU rate and CU count for a scheduler and data type.
    ///
    /// # Errors
    /// Returns a configuration error if the scheduler is unknown or the data
    /// type has no rate under the selected instruction path, and a spec
    /// format error if the CU count does not have the expected shape.
    pub fn resolve(
        &self,
        scheduler: &str,
        data_type: DataType,
        options: SpecOptions,
    ) -> Result<ResolvedSpec> {
        let spec = self.scheduler(scheduler).ok_or_else(|| {
            EfficiencyError::Config(format!(
                "scheduler {scheduler} does not exist in the spec file"
            ))
        })?;

        let rates = if options.mfma {
            &spec.mfma
        } else {
            &spec.non_mfma
        };
        let alu_rate = *rates.get(data_type.code()).ok_or_else(|| {
            EfficiencyError::Config(format!(
                "{} data type does not exist in the spec file under {scheduler}.{}. Modify the spec file.",
                data_type.code(),
                options.rate_key()
            ))
        })?;
        if !(alu_rate.is_finite() && alu_rate > 0.0) {
            return Err(EfficiencyError::InvalidInput(format!(
                "ALU rate for {scheduler}.{}.{} must be positive, got {alu_rate}",
                options.rate_key(),
                data_type.code()
            )));
        }

        let num_cus = if options.per_cu {
            1
        } else {
            spec.cu_count(scheduler, options.mi50)?
        };
        if num_cus == 0 {
            return Err(EfficiencyError::InvalidInput(format!(
                "CU count for {scheduler} must be positive"
            )));
        }

        Ok(ResolvedSpec { alu_rate, num_cus })
    }
}

impl SchedulerSpec {
    fn cu_count(&self, scheduler: &str, mi50: bool) -> Result<u32> {
        match (&self.num_cus, scheduler == VEGA20) {
            (ComputeUnits::Variants(variants), true) => {
                let board = if mi50 { "mi50" } else { "mi60" };
                variants.get(board).copied().ok_or_else(|| {
                    EfficiencyError::SpecFormat(format!(
                        "{scheduler}.numCUs has no entry for {board}"
                    ))
                })
            }
            (ComputeUnits::Scalar(n), false) => Ok(*n),
            (ComputeUnits::Scalar(_), true) => Err(EfficiencyError::SpecFormat(format!(
                "{scheduler}.numCUs must map board variants (mi50, mi60) to counts"
            ))),
            (ComputeUnits::Variants(_), false) => Err(EfficiencyError::SpecFormat(format!(
                "{scheduler}.numCUs must be a single count"
            ))),
        }
    }
}
