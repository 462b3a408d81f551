//! School Fees Engine CLI
//!
//! # Usage
//!
//! ```bash
//! cargo run -- payments school.json payments.csv > balances.csv
//! cargo run -- payments --strategy sync --save school.json payments.csv
//! cargo run -- payments --batch-size 2000 --max-concurrent 8 school.json payments.csv
//! cargo run -- balances school.json --year 1
//! cargo run -- admit school.json students.csv
//! cargo run -- promote school.json --from 1 --to 2 --retain 14,22 --transfer 31
//! cargo run -- report school.json --year 1 > report.json
//! cargo run -- --config fees.toml --verbose payments school.json payments.csv
//! ```
//!
//! Results go to stdout, logs to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing file, corrupt snapshot, rejected promotion, etc.)

use school_fees_engine::{cli, logging};
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();
    logging::init_logger(args.verbose);

    let mut output = std::io::stdout().lock();
    if let Err(e) = cli::run(args, &mut output) {
        error!(error = %e, "command failed");
        process::exit(1);
    }
}
