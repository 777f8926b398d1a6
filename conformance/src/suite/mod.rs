use std::fmt;
use std::fs;
use std::time::{Duration, Instant};

use crate::case::TestCase;
use crate::compare::{compare_files, Normalization};
use crate::config::SuiteConfig;
use crate::discover::discover_inputs;
use crate::errors::{CaseFailure, SetupError};
use crate::stage::{Invocation, Stage, StageExit, StageOutput};

/// The two classes of test input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SuiteKind {
    /// Programs that compile and run; VM output is compared after
    /// stripping the timing report.
    Valid,
    /// Programs that must be rejected; compiler output is compared raw.
    Invalid,
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuiteKind::Valid => write!(f, "valid"),
            SuiteKind::Invalid => write!(f, "invalid"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    /// Only run cases whose name contains this substring.
    pub filter: Option<String>,
    pub timings: bool,
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CaseTiming {
    pub compile: Option<Duration>,
    pub execute: Option<Duration>,
    pub total: Duration,
}

#[derive(Debug)]
pub struct CaseReport {
    pub case: TestCase,
    pub outcome: Result<(), CaseFailure>,
    pub timing: CaseTiming,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct SuiteReport {
    pub kind: SuiteKind,
    pub cases: Vec<CaseReport>,
    pub elapsed: Duration,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|c| !c.passed())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// One verdict for the whole suite, naming every failed case.
    pub fn verdict(&self) -> miette::Result<()> {
        let failed: Vec<&str> = self.failures().map(|c| c.case.name.as_str()).collect();
        if failed.is_empty() {
            return Ok(());
        }
        Err(miette::miette!(
            "{} of {} {} case(s) failed: {}",
            failed.len(),
            self.cases.len(),
            self.kind,
            failed.join(", ")
        ))
    }
}

/// Discover the cases of one class and check that each has its expected
/// output. Nothing is executed.
pub fn plan_suite(
    config: &SuiteConfig,
    kind: SuiteKind,
    filter: Option<&str>,
) -> Result<Vec<TestCase>, SetupError> {
    let inputs = discover_inputs(&config.fixture_dir(kind), &config.source_extension)?;

    let cases: Vec<TestCase> = inputs
        .iter()
        .map(|input| TestCase::new(input, &config.scratch_dir, &config.expected_suffix))
        .filter(|case| filter.map_or(true, |f| case.name.contains(f)))
        .collect();

    for case in &cases {
        case.ensure_expected()?;
    }

    Ok(cases)
}

/// Run every case of one class in order and report each of them.
///
/// A failing case never stops the suite; the caller decides what to do with
/// the collected results, usually via [`SuiteReport::verdict`].
pub fn run_suite(
    config: &SuiteConfig,
    kind: SuiteKind,
    options: &RunOptions,
) -> miette::Result<SuiteReport> {
    let suite_start = Instant::now();
    let cases = plan_suite(config, kind, options.filter.as_deref())?;

    fs::create_dir_all(&config.scratch_dir).map_err(|source| SetupError::ScratchDir {
        path: config.scratch_dir.clone(),
        source,
    })?;

    println!("running {} {} case(s)", cases.len(), kind);

    let mut reports = Vec::with_capacity(cases.len());
    for case in cases {
        let case_start = Instant::now();
        let mut timing = CaseTiming::default();
        let outcome = match kind {
            SuiteKind::Valid => run_valid_case(config, &case, &mut timing),
            SuiteKind::Invalid => run_invalid_case(config, &case, &mut timing),
        };
        timing.total = case_start.elapsed();

        let report = CaseReport {
            case,
            outcome,
            timing,
        };
        print_case(&report, options);
        reports.push(report);
    }

    let report = SuiteReport {
        kind,
        cases: reports,
        elapsed: suite_start.elapsed(),
    };

    println!(
        "{}: {} passed, {} failed ({} case(s))",
        kind,
        report.passed(),
        report.cases.len() - report.passed(),
        report.cases.len()
    );
    if options.timings {
        eprintln!(
            "timings {}: cases={}, total={}",
            kind,
            report.cases.len(),
            fmt_duration(report.elapsed)
        );
    }

    Ok(report)
}

/// compiler < input > intermediate, then vm intermediate > output.
fn run_valid_case(
    config: &SuiteConfig,
    case: &TestCase,
    timing: &mut CaseTiming,
) -> Result<(), CaseFailure> {
    let intermediate = case.intermediate();
    let compile = Invocation::new(
        &config.compiler,
        &intermediate,
        &TestCase::stderr_for(&intermediate),
        config.timeout,
    )
    .stdin_from(&case.input);
    let compiled = run_stage(Stage::Compile, &compile, config.timeout, &mut timing.compile)?;
    require_success(Stage::Compile, compiled)?;

    let output = case.execute_output();
    let execute = Invocation::new(
        &config.vm,
        &output,
        &TestCase::stderr_for(&output),
        config.timeout,
    )
    .arg(&intermediate);
    let executed = run_stage(Stage::Execute, &execute, config.timeout, &mut timing.execute)?;
    require_success(Stage::Execute, executed)?;

    compare_files(&output, &case.expected, Normalization::StripTimingReport)
}

/// compiler < input > diagnostics. The exit code is not judged: the
/// diagnostic text is what the fixture pins down.
fn run_invalid_case(
    config: &SuiteConfig,
    case: &TestCase,
    timing: &mut CaseTiming,
) -> Result<(), CaseFailure> {
    let output = case.diagnostic_output();
    let compile = Invocation::new(
        &config.compiler,
        &output,
        &TestCase::stderr_for(&output),
        config.timeout,
    )
    .stdin_from(&case.input);
    let compiled = run_stage(Stage::Compile, &compile, config.timeout, &mut timing.compile)?;
    if compiled.exit == StageExit::Signaled {
        return Err(CaseFailure::Exited {
            stage: Stage::Compile,
            exit: compiled.exit,
            stderr: compiled.stderr,
        });
    }

    compare_files(&output, &case.expected, Normalization::Raw)
}

/// Run one stage and record its duration in `elapsed`, timeouts included.
fn run_stage(
    stage: Stage,
    invocation: &Invocation,
    timeout: Duration,
    elapsed: &mut Option<Duration>,
) -> Result<StageOutput, CaseFailure> {
    let output = invocation
        .run()
        .map_err(|source| CaseFailure::Invocation { stage, source })?;
    *elapsed = Some(output.elapsed);
    if output.exit == StageExit::TimedOut {
        return Err(CaseFailure::TimedOut {
            stage,
            after: timeout,
        });
    }
    Ok(output)
}

fn require_success(stage: Stage, output: StageOutput) -> Result<(), CaseFailure> {
    if output.exit.success() {
        return Ok(());
    }
    Err(CaseFailure::Exited {
        stage,
        exit: output.exit,
        stderr: output.stderr,
    })
}

fn print_case(report: &CaseReport, options: &RunOptions) {
    match &report.outcome {
        Ok(()) => println!("ok   {}", report.case.name),
        Err(failure) => {
            println!("FAIL {}: {}", report.case.name, failure);
            if options.verbose {
                if let Some(stderr) = failure.stderr() {
                    eprintln!("--- stderr of {} ---\n{}", report.case.name, stderr);
                }
            }
        }
    }

    if options.timings {
        let timing = report.timing;
        let mut line = format!("timings {}:", report.case.name);
        if let Some(compile) = timing.compile {
            line.push_str(&format!(" compile={},", fmt_duration(compile)));
        }
        if let Some(execute) = timing.execute {
            line.push_str(&format!(" execute={},", fmt_duration(execute)));
        }
        line.push_str(&format!(" total={}", fmt_duration(timing.total)));
        eprintln!("{}", line);
    }
}

pub fn fmt_duration(duration: Duration) -> String {
    format!("{:.2}ms", duration.as_secs_f64() * 1000.0)
}
