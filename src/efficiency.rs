//! Peak-throughput and efficiency arithmetic.

use crate::error::{EfficiencyError, Result};

/// Theoretical peak in GFLOP/s.
///
/// `sclk_mhz` is the shader clock in MHz, `alu_rate` flops per cycle per CU.
pub fn peak_gflops(sclk_mhz: u32, alu_rate: f64, num_cus: u32) -> f64 {
    (f64::from(sclk_mhz) / 1000.0) * alu_rate * f64::from(num_cus)
}

/// Efficiency of `gflops` against `peak`, in percent, rounded to 3 decimals
pub fn efficiency_percent(gflops: f64, peak: f64) -> f64 {
    round3(100.0 * (gflops / peak))
}

/// Round to 3 decimal places, correctly rounded from the stored binary value
pub fn round3(x: f64) -> f64 {
    format!("{x:.3}").parse().unwrap_or(x)
}

/// Validate the peak inputs and compute the peak.
///
/// # Errors
/// Returns [`EfficiencyError::InvalidInput`] if any factor is not positive.
pub fn checked_peak(sclk_mhz: u32, alu_rate: f64, num_cus: u32) -> Result<f64> {
    if sclk_mhz == 0 {
        return Err(EfficiencyError::InvalidInput(
            "frequency must be positive".into(),
        ));
    }
    if !(alu_rate.is_finite() && alu_rate > 0.0) {
        return Err(EfficiencyError::InvalidInput(format!(
            "ALU rate must be positive, got {alu_rate}"
        )));
    }
    if num_cus == 0 {
        return Err(EfficiencyError::InvalidInput(
            "CU count must be positive".into(),
        ));
    }
    Ok(peak_gflops(sclk_mhz, alu_rate, num_cus))
}
