//! CLI argument parsing for a test run.
//!
//! The CLI only wires arguments into the engine; discovery, merging and
//! verdicts all live in the library.
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "save",
    version,
    about = "Check linters and fixers against expectations embedded in test fixtures",
    after_help = "Examples:\n  save tests/\n  save tests/ --test ATest.kt --test dir/BTest.kt\n  save tests/ --report out/report.json --verbose"
)]
pub struct Args {
    /// Test root containing the top-level save.toml
    #[arg(value_name = "TEST_ROOT", default_value = ".")]
    pub test_root: PathBuf,

    /// Only run these test files (file name or path relative to its config directory)
    #[arg(long = "test", value_name = "FILE")]
    pub tests: Vec<String>,

    /// Write a JSON report of all verdicts to this path
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Also append captured tool stdout to this file, emptied at startup
    #[arg(long, value_name = "PATH")]
    pub redirect_to: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    pub verbose: bool,
}
