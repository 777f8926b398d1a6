use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::WrapErr;

use c2p_conformance::config::Overrides;
use c2p_conformance::suite::plan_suite;
use c2p_conformance::{run_suite, RunOptions, SuiteConfig, SuiteKind, TestCase};

#[derive(Parser)]
#[command(name = "c2p-conformance")]
#[command(about = "Golden-output tests for the c2p compiler and the P-machine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compiler executable (reads source on stdin, writes P-code on stdout)
    #[arg(long, global = true)]
    compiler: Option<PathBuf>,
    /// Virtual machine executable (takes the P-code file as its argument)
    #[arg(long, global = true)]
    vm: Option<PathBuf>,
    /// Directory of valid programs; invalid ones live in its `fail` subdirectory
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,
    /// Directory for intermediate and actual output files
    #[arg(long, global = true)]
    scratch: Option<PathBuf>,
    /// Per-process timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<f64>,
    /// Only run cases whose file name contains this text
    #[arg(long, global = true)]
    filter: Option<String>,
    /// Print per-case timings
    #[arg(long, global = true)]
    timings: bool,
    /// Echo the stderr of failed stages
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run every valid program and compare its output
    Valid,
    /// Compile every invalid program and compare its diagnostics
    Invalid,
    /// Run the valid suite, then the invalid suite
    All,
    /// List discovered cases without running them
    List,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> miette::Result<()> {
    let config = SuiteConfig::resolve(Overrides {
        compiler: cli.compiler,
        vm: cli.vm,
        fixture_root: cli.fixtures,
        scratch_dir: cli.scratch,
        timeout_secs: cli.timeout,
    })
    .wrap_err("invalid driver configuration")?;
    let options = RunOptions {
        filter: cli.filter,
        timings: cli.timings,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Valid => run_suite(&config, SuiteKind::Valid, &options)?.verdict(),
        Commands::Invalid => run_suite(&config, SuiteKind::Invalid, &options)?.verdict(),
        Commands::All => {
            let valid = run_suite(&config, SuiteKind::Valid, &options)?;
            let invalid = run_suite(&config, SuiteKind::Invalid, &options)?;
            match (valid.verdict(), invalid.verdict()) {
                (Ok(()), Ok(())) => Ok(()),
                (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
                (Err(valid), Err(invalid)) => Err(invalid.wrap_err(valid.to_string())),
            }
        }
        Commands::List => list(&config, options.filter.as_deref()),
    }
}

fn list(config: &SuiteConfig, filter: Option<&str>) -> miette::Result<()> {
    for kind in [SuiteKind::Valid, SuiteKind::Invalid] {
        let cases = plan_suite(config, kind, filter)?;
        println!("{} ({} case(s)):", kind, cases.len());
        for case in &cases {
            println!("  {}", case.name);
            println!("    input:    {}", case.input.display());
            println!("    expected: {}", case.expected.display());
            for scratch in scratch_outputs(kind, case) {
                println!("    scratch:  {}", scratch.display());
            }
        }
    }
    Ok(())
}

fn scratch_outputs(kind: SuiteKind, case: &TestCase) -> Vec<PathBuf> {
    match kind {
        SuiteKind::Valid => vec![case.intermediate(), case.execute_output()],
        SuiteKind::Invalid => vec![case.diagnostic_output()],
    }
}
