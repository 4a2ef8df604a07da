//! tuning-efficiency: convert tuned GFLOP/s into efficiency percentages.
//!
//! Kernel-tuning logic files record the measured GFLOP/s of every tuned
//! problem size. This crate rewrites each of those values as a percentage of
//! the theoretical peak of the hardware the tuning ran on:
//!
//! ```text
//! peak       = (sclk_mhz / 1000) * alu_rate * num_cus      [GFLOP/s]
//! efficiency = round(100 * gflops / peak, 3)               [%]
//! ```
//!
//! # Quick Start
//!
//! ```
//! use tuning_efficiency::efficiency::{efficiency_percent, peak_gflops};
//!
//! let peak = peak_gflops(1300, 64.0, 110);
//! assert!((peak - 9152.0).abs() < 1e-9);
//! assert!((efficiency_percent(7321.6, peak) - 80.0).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`specs`]: Hardware spec table and ALU rate / CU count resolution
//! - [`frequency`]: Fixed SCLK or per-size frequency table
//! - [`logic`]: Typed view over a logic file
//! - [`efficiency`]: Peak and efficiency arithmetic
//! - [`convert`]: The conversion pipeline
//! - [`output`]: Terminal output helpers

pub mod convert;
pub mod data_type;
pub mod efficiency;
pub mod error;
pub mod frequency;
pub mod logic;
pub mod output;
pub mod specs;

pub use convert::{convert, run, ConversionReport, ConvertConfig, EntryReport, Outcome};
pub use data_type::DataType;
pub use error::{EfficiencyError, Result};
pub use frequency::{FrequencyOption, FrequencyRow, FrequencySource, FrequencyTable};
pub use logic::{LogicFile, ProblemSize, ResultEntry};
pub use specs::{HardwareSpecs, ResolvedSpec, SpecOptions};
