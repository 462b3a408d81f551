use crate::config::SchoolConfig;
use crate::strategy::BatchConfig;
use crate::types::{AcademicYearId, StudentId};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// School fees engine: payments, balances, admissions and promotions
#[derive(Parser, Debug)]
#[command(name = "school-fees")]
#[command(about = "Record school fee payments and manage the academic year", long_about = None)]
pub struct CliArgs {
    /// TOML configuration file
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log debug details to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply a payment CSV and print the current year's balances
    Payments(PaymentsArgs),

    /// Print the balances of an academic year
    Balances {
        #[arg(value_name = "SNAPSHOT", help = "Path to the JSON data file")]
        snapshot: PathBuf,

        /// Academic year ID (default: the current year)
        #[arg(long = "year", value_name = "ID")]
        year: Option<AcademicYearId>,
    },

    /// Admit students from an admission CSV
    Admit {
        #[arg(value_name = "SNAPSHOT", help = "Path to the JSON data file")]
        snapshot: PathBuf,

        #[arg(value_name = "STUDENTS", help = "Path to the admission CSV file")]
        input_file: PathBuf,
    },

    /// Move the students of one academic year into the next
    Promote(PromoteArgs),

    /// Generate, store and print the year-end report
    Report {
        #[arg(value_name = "SNAPSHOT", help = "Path to the JSON data file")]
        snapshot: PathBuf,

        #[arg(long = "year", value_name = "ID")]
        year: AcademicYearId,
    },
}

#[derive(Args, Debug)]
pub struct PaymentsArgs {
    #[arg(value_name = "SNAPSHOT", help = "Path to the JSON data file")]
    pub snapshot: PathBuf,

    #[arg(value_name = "INPUT", help = "Path to the payment CSV file")]
    pub input_file: PathBuf,

    /// Processing strategy for the payment file
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of records per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of payment records per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,

    /// Write the updated ledger back to the snapshot
    #[arg(long = "save")]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct PromoteArgs {
    #[arg(value_name = "SNAPSHOT", help = "Path to the JSON data file")]
    pub snapshot: PathBuf,

    #[arg(long = "from", value_name = "ID")]
    pub from_year: AcademicYearId,

    #[arg(long = "to", value_name = "ID")]
    pub to_year: AcademicYearId,

    /// Students kept in their class
    #[arg(long = "retain", value_name = "IDS", value_delimiter = ',')]
    pub retain: Vec<StudentId>,

    /// Students leaving the school
    #[arg(long = "transfer", value_name = "IDS", value_delimiter = ',')]
    pub transfer: Vec<StudentId>,

    /// Students graduating regardless of class
    #[arg(long = "graduate", value_name = "IDS", value_delimiter = ',')]
    pub graduate: Vec<StudentId>,

    /// Date recorded on the transition (default: today)
    #[arg(long = "date", value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,
}

/// Available processing strategies for payment files
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

impl PaymentsArgs {
    /// Batch settings from the command line, then the config file, then
    /// the defaults
    pub fn to_batch_config(&self, config: &SchoolConfig) -> BatchConfig {
        config.batch_config(self.batch_size, self.max_concurrent_batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payments(args: &[&str]) -> PaymentsArgs {
        match CliArgs::try_parse_from(args).unwrap().command {
            Command::Payments(payments) => payments,
            other => panic!("expected payments, got {:?}", other),
        }
    }

    #[rstest]
    #[case::default_strategy(&["school-fees", "payments", "s.json", "p.csv"], StrategyType::Async)]
    #[case::explicit_sync(&["school-fees", "payments", "--strategy", "sync", "s.json", "p.csv"], StrategyType::Sync)]
    #[case::explicit_async(&["school-fees", "payments", "s.json", "p.csv", "--strategy", "async"], StrategyType::Async)]
    fn test_strategy_parsing(#[case] args: &[&str], #[case] expected: StrategyType) {
        assert_eq!(payments(args).strategy, expected);
    }

    #[rstest]
    #[case::no_options(&["school-fees", "payments", "s.json", "p.csv"], None, None, false)]
    #[case::batch_size(&["school-fees", "payments", "--batch-size", "2000", "s.json", "p.csv"], Some(2000), None, false)]
    #[case::all_options(
        &["school-fees", "payments", "--batch-size", "2000", "--max-concurrent", "8", "--save", "s.json", "p.csv"],
        Some(2000),
        Some(8),
        true
    )]
    fn test_payment_options(
        #[case] args: &[&str],
        #[case] batch_size: Option<usize>,
        #[case] max_concurrent: Option<usize>,
        #[case] save: bool,
    ) {
        let parsed = payments(args);
        assert_eq!(parsed.batch_size, batch_size);
        assert_eq!(parsed.max_concurrent_batches, max_concurrent);
        assert_eq!(parsed.save, save);
    }

    #[rstest]
    #[case::all_defaults(&["school-fees", "payments", "s.json", "p.csv"], "", 1000, num_cpus::get())]
    #[case::config_file(&["school-fees", "payments", "s.json", "p.csv"], "[batch]\nbatch_size = 250\nmax_concurrent = 3\n", 250, 3)]
    #[case::cli_over_config(
        &["school-fees", "payments", "--batch-size", "50", "s.json", "p.csv"],
        "[batch]\nbatch_size = 250\n",
        50,
        num_cpus::get()
    )]
    #[case::zero_falls_back(&["school-fees", "payments", "--batch-size", "0", "s.json", "p.csv"], "", 1000, num_cpus::get())]
    fn test_batch_config_resolution(
        #[case] args: &[&str],
        #[case] config: &str,
        #[case] expected_batch_size: usize,
        #[case] expected_threads: usize,
    ) {
        let config = SchoolConfig::parse(config).unwrap();
        let batch = payments(args).to_batch_config(&config);

        assert_eq!(batch.batch_size, expected_batch_size);
        assert_eq!(batch.max_concurrent_batches, expected_threads);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let parsed = CliArgs::try_parse_from([
            "school-fees",
            "balances",
            "s.json",
            "--year",
            "2",
            "--config",
            "fees.toml",
            "-v",
        ])
        .unwrap();

        assert!(parsed.verbose);
        assert_eq!(parsed.config, Some(PathBuf::from("fees.toml")));
        match parsed.command {
            Command::Balances { year, .. } => assert_eq!(year, Some(2)),
            other => panic!("expected balances, got {:?}", other),
        }
    }

    #[test]
    fn test_promote_overrides() {
        let parsed = CliArgs::try_parse_from([
            "school-fees",
            "promote",
            "s.json",
            "--from",
            "1",
            "--to",
            "2",
            "--retain",
            "3,4",
            "--graduate",
            "9",
            "--date",
            "2025-03-31",
        ])
        .unwrap();

        match parsed.command {
            Command::Promote(promote) => {
                assert_eq!(promote.retain, vec![3, 4]);
                assert!(promote.transfer.is_empty());
                assert_eq!(promote.graduate, vec![9]);
                assert_eq!(promote.date, NaiveDate::from_ymd_opt(2025, 3, 31));
            }
            other => panic!("expected promote, got {:?}", other),
        }
    }

    #[rstest]
    #[case::no_subcommand(&["school-fees"])]
    #[case::missing_input(&["school-fees", "payments", "s.json"])]
    #[case::invalid_strategy(&["school-fees", "payments", "--strategy", "invalid", "s.json", "p.csv"])]
    #[case::report_without_year(&["school-fees", "report", "s.json"])]
    #[case::bad_student_list(&["school-fees", "promote", "s.json", "--from", "1", "--to", "2", "--retain", "a,b"])]
    fn test_parsing_errors(#[case] args: &[&str]) {
        assert!(CliArgs::try_parse_from(args).is_err());
    }
}
