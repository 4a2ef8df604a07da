//! Terminal output helpers.

use crate::convert::{ConversionReport, EntryReport};
use colored::Colorize;

/// Print a section header
pub fn section(title: &str) {
    println!("\n{}", format!("=== {title} ===").cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "[PASS]".green().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "[INFO]".blue(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), msg);
}

/// Print one converted entry
pub fn entry(e: &EntryReport) {
    println!("Size: {}", e.size);
    kv("Efficiency", format!("{}%", e.efficiency));
    kv("Frequency", format!("{} MHz", e.frequency));
    kv("GFLOP/s", format_args!("{} of {:.1} peak", e.gflops, e.peak));
}

/// Print a full conversion report
pub fn report(r: &ConversionReport) {
    section("Efficiency");
    kv("Scheduler", &r.scheduler);
    kv("Data type", r.data_type);
    kv("ALU rate", r.spec.alu_rate);
    kv("CUs", r.spec.num_cus);
    println!();
    for e in &r.entries {
        entry(e);
    }
    println!();
    info(&r.summary().to_string());
}
