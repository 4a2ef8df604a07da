//! Property-based tests using proptest.
//!
//! These tests verify invariants of the efficiency conversion.

use proptest::prelude::*;
use std::path::Path;
use tuning_efficiency::efficiency::{peak_gflops, round3};
use tuning_efficiency::{
    convert, DataType, FrequencyRow, FrequencySource, FrequencyTable, HardwareSpecs, LogicFile,
    ResolvedSpec, SpecOptions,
};

/// Build a logic file with one result per (size, gflops) pair
fn logic_yaml(results: &[([u64; 8], f64)]) -> String {
    let mut doc = String::from(
        "- {MinimumRequiredVersion: 4.33.0}\n\
         - aldebaran\n\
         - gfx90a\n\
         - [Device 0050]\n\
         - {Batched: true, DataType: 0, OperationType: GEMM}\n\
         - - {SolutionIndex: 0, SolutionNameMin: MT64x64x16}\n\
         - [0, 1, 2, 3]\n\
         - \n",
    );
    for (size, gflops) in results {
        let dims: Vec<String> = size.iter().map(u64::to_string).collect();
        doc.push_str(&format!("  - - [{}]\n    - [0, {gflops}]\n", dims.join(", ")));
    }
    doc.push_str("- null\n");
    doc
}

fn parse(yaml: &str) -> LogicFile {
    LogicFile::parse(yaml, Path::new("logic.yaml")).expect("Test logic file should parse")
}

// Distinct sizes: the first dimension is the index
fn results_strategy() -> impl Strategy<Value = Vec<([u64; 8], f64)>> {
    proptest::collection::vec((prop::array::uniform7(1u64..8192), 0.0f64..50_000.0), 1..20)
        .prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (rest, gflops))| {
                    let mut size = [i as u64 + 1; 8];
                    size[1..].copy_from_slice(&rest);
                    (size, gflops)
                })
                .collect()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn efficiency_matches_formula(
        results in results_strategy(),
        sclk in 100u32..3000,
        alu in 1.0f64..2048.0,
        cus in 1u32..256
    ) {
        let mut logic = parse(&logic_yaml(&results));
        let spec = ResolvedSpec { alu_rate: alu, num_cus: cus };
        convert(&mut logic, &spec, &FrequencySource::Fixed(sclk)).unwrap();

        let peak = peak_gflops(sclk, alu, cus);
        for (entry, (_, gflops)) in logic.entries.iter().zip(&results) {
            let expected = round3(100.0 * (gflops / peak));
            prop_assert!((entry.performance - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn fixed_frequency_is_uniform(results in results_strategy(), sclk in 100u32..3000) {
        let mut logic = parse(&logic_yaml(&results));
        let spec = ResolvedSpec { alu_rate: 128.0, num_cus: 64 };
        let report = convert(&mut logic, &spec, &FrequencySource::Fixed(sclk)).unwrap();
        prop_assert!(report.entries.iter().all(|e| e.frequency == sclk));
    }

    #[test]
    fn table_frequency_follows_rows(
        results in results_strategy(),
        freqs in proptest::collection::vec(500u32..2500, 20)
    ) {
        let rows = results.iter().zip(&freqs).map(|((size, _), &winner_freq)| FrequencyRow {
            size: *size,
            winner_freq,
        });
        let table = FrequencyTable::from_rows(rows).unwrap();
        let mut logic = parse(&logic_yaml(&results));
        let spec = ResolvedSpec { alu_rate: 256.0, num_cus: 110 };
        let report = convert(&mut logic, &spec, &FrequencySource::Table(table)).unwrap();

        for (entry, &freq) in report.entries.iter().zip(&freqs) {
            prop_assert_eq!(entry.frequency, freq);
        }
    }

    #[test]
    fn per_cu_forces_one_cu(cus in 1u32..512, mfma in any::<bool>()) {
        let specs = HardwareSpecs::parse(&format!(
            "aldebaran:\n  mfma: {{S: 256}}\n  non_mfma: {{S: 128}}\n  numCUs: {cus}\n"
        ))
        .unwrap();
        let opts = SpecOptions { per_cu: true, mfma, mi50: false };
        let resolved = specs.resolve("aldebaran", DataType::Single, opts).unwrap();
        prop_assert_eq!(resolved.num_cus, 1);

        let aggregated = specs
            .resolve("aldebaran", DataType::Single, SpecOptions { per_cu: false, ..opts })
            .unwrap();
        prop_assert_eq!(aggregated.num_cus, cus);
    }

    #[test]
    fn conversion_preserves_everything_but_performance(results in results_strategy()) {
        let yaml = logic_yaml(&results);
        let original = parse(&yaml);
        let mut logic = original.clone();
        let spec = ResolvedSpec { alu_rate: 64.0, num_cus: 110 };
        convert(&mut logic, &spec, &FrequencySource::Fixed(1300)).unwrap();

        let out = logic.to_yaml();
        let head = &yaml[..yaml.find("- \n").unwrap()];
        prop_assert!(out.starts_with(head));
        prop_assert!(out.ends_with("- null\n"));
        for (a, b) in yaml.lines().zip(out.lines()) {
            if let Some(size) = a.strip_prefix("  - - ") {
                prop_assert_eq!(Some(size), b.strip_prefix("  - - "));
            }
        }
        prop_assert_eq!(yaml.lines().count(), out.lines().count());

        let reparsed = parse(&out);
        let before = original.document().as_sequence().unwrap();
        let after = reparsed.document().as_sequence().unwrap();
        prop_assert_eq!(before.len(), after.len());
        for i in (0..before.len()).filter(|&i| i != 7) {
            prop_assert_eq!(&before[i], &after[i]);
        }

        prop_assert_eq!(&reparsed.scheduler, &original.scheduler);
        prop_assert_eq!(reparsed.data_type, original.data_type);
        for (a, b) in original.entries.iter().zip(&reparsed.entries) {
            prop_assert_eq!(&a.size, &b.size);
        }
        for (a, b) in logic.entries.iter().zip(&reparsed.entries) {
            prop_assert!((a.performance - b.performance).abs() < 1e-12);
        }
    }
}
