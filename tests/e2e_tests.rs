//! End-to-end integration tests
//!
//! These tests validate the complete payment processing pipeline using
//! predefined fixtures. Each test:
//! 1. Loads the school snapshot (`school.json` in the fixture directory, or
//!    the shared `tests/fixtures/school.json`)
//! 2. Loads `config.toml` from the fixture directory when present
//! 3. Processes `input.csv` through the selected strategy
//! 4. Compares the balances CSV with `expected.csv`
//!
//! Fixtures cover:
//! - Happy path payments and each allocation policy
//! - Edits and deletes, including across batch boundaries
//! - Rejected records (duplicates, inactive students, overpayment, etc.)
//! - Malformed rows and two-decimal rounding
//! - Payments already present in the snapshot
//! - Arrears paid into an earlier academic year after a promotion
//!
//! Each test is run twice: once with the synchronous strategy and once with
//! the async strategy.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_decimal::Decimal;
    use school_fees_engine::cli::StrategyType;
    use school_fees_engine::config::{PaymentRules, SchoolConfig};
    use school_fees_engine::core::FeeEngine;
    use school_fees_engine::io::SchoolSnapshot;
    use school_fees_engine::strategy::create_strategy;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Run a fixture and compare the balances with expected.csv
    ///
    /// # Panics
    ///
    /// Panics if a fixture file cannot be read or the output differs from
    /// the expected output.
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) -> SchoolSnapshot {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let input_path = fixture_dir.join("input.csv");
        let expected_path = fixture_dir.join("expected.csv");

        assert!(input_path.exists(), "Input file not found: {}", input_path.display());
        assert!(
            expected_path.exists(),
            "Expected file not found: {}",
            expected_path.display()
        );

        let snapshot_path = if fixture_dir.join("school.json").exists() {
            fixture_dir.join("school.json")
        } else {
            Path::new("tests/fixtures/school.json").to_path_buf()
        };
        let snapshot = SchoolSnapshot::load(&snapshot_path)
            .unwrap_or_else(|e| panic!("Failed to load {}: {}", snapshot_path.display(), e));

        let config_path = fixture_dir.join("config.toml");
        let config = SchoolConfig::load_or_default(
            config_path.exists().then_some(config_path.as_path()),
        )
        .unwrap_or_else(|e| panic!("Failed to load config: {}", e));

        let strategy = create_strategy(
            strategy_type,
            config.payment_rules(),
            Some(config.batch_config(None, None)),
        );

        let mut temp_output = NamedTempFile::new().expect("Failed to create temp file");
        let snapshot = strategy
            .process(snapshot, &input_path, &mut temp_output)
            .unwrap_or_else(|e| panic!("Failed to process payments: {}", e));
        temp_output.flush().expect("Failed to flush temp file");

        let actual_output = fs::read_to_string(temp_output.path())
            .unwrap_or_else(|e| panic!("Failed to read temp output file: {}", e));
        let expected_output = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
            panic!("Failed to read expected file {}: {}", expected_path.display(), e)
        });

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
        snapshot
    }

    /// End-to-end test for all fixtures with both strategies
    #[rstest]
    #[case("happy_path")]
    #[case("allocation_policies")]
    #[case("edits_and_deletes")]
    #[case("rejected_records")]
    #[case("malformed_data")]
    #[case("precision_rounding")]
    #[case("overpayment_allowed")]
    #[case("existing_ledger")]
    #[case("empty_input")]
    #[case("arrears_after_promotion")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    /// Both strategies leave the same ledger behind
    #[rstest]
    #[case("happy_path", 4)]
    #[case("edits_and_deletes", 2)]
    #[case("rejected_records", 2)]
    #[case("existing_ledger", 2)]
    #[case("arrears_after_promotion", 6)]
    fn test_strategies_store_same_payments(#[case] fixture: &str, #[case] payments: usize) {
        let sync = run_test_fixture(fixture, StrategyType::Sync);
        let r#async = run_test_fixture(fixture, StrategyType::Async);

        assert_eq!(sync.ledger.fee_payments.len(), payments);
        assert_eq!(
            serde_json::to_value(&sync.ledger).unwrap(),
            serde_json::to_value(&r#async.ledger).unwrap()
        );
    }

    /// Arrears stay in the year they were paid for
    #[rstest]
    fn test_arrears_update_previous_year(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let snapshot = run_test_fixture("arrears_after_promotion", strategy);
        let (registry, ledger) = snapshot.into_parts().expect("Failed to rebuild snapshot");
        let engine = FeeEngine::new(registry, ledger, PaymentRules::default());

        let previous_year = engine.balances(Some(1)).expect("Failed to compute balances");
        let paid: Vec<_> = previous_year
            .iter()
            .map(|b| (b.student_id, b.paid.bus, b.paid.school))
            .collect();
        let d = |amount: i64| Decimal::from(amount);
        assert_eq!(
            paid,
            vec![
                (1, d(6000), d(4500)),
                (2, d(0), d(15000)),
                (3, d(0), d(0)),
                (4, d(0), d(0)),
            ]
        );
        assert_eq!(previous_year[0].outstanding(), d(9500));
        assert!(previous_year[1].outstanding().is_zero());
    }
}
