//! implreport - W3C implementation report generator
//!
//! Merges an engine's imported test results, maintainer expectations,
//! suite-level known issues and community submissions, then writes the
//! implementation report as TSV (and optionally a JSON snapshot).
//!
//! ```text
//! implreport --template implementation-report-TEMPLATE.data \
//!     --tests LayoutTests/imported/csswg-test/css-writing-modes-3 \
//!     --expectations LayoutTests/TestExpectations \
//!     --import-expectations LayoutTests/W3CImportExpectations \
//!     --submissions results.csv --output implementation-report.data
//! ```

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use implreport_core::obs::{emit_report_written, RunSpan};
use implreport_core::{write_snapshot_json, ReportConfig, ReportPipeline, ReportTotals};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "implreport")]
#[command(version = implreport_core::VERSION)]
#[command(about = "Generate a W3C implementation report from engine test results", long_about = None)]
struct Cli {
    /// Publication template (displayName, revision, placeholder per line)
    #[arg(long)]
    template: PathBuf,

    /// Root of the imported test suite to discover test files in
    #[arg(long)]
    tests: Option<PathBuf>,

    /// Maintainer test expectations file
    #[arg(long)]
    expectations: Option<PathBuf>,

    /// Suite-level import expectations file
    #[arg(long)]
    import_expectations: Option<PathBuf>,

    /// Community submission CSV (repeatable)
    #[arg(long)]
    submissions: Vec<PathBuf>,

    /// Write the TSV report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the JSON snapshot here
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "IMPLREPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    implreport_core::init_tracing(cli.json_logs, level);

    let totals = run(&cli)?;
    info!(
        total = totals.total,
        coverage = totals.coverage,
        "implementation report generated"
    );
    Ok(())
}

fn run(cli: &Cli) -> Result<ReportTotals> {
    let config = ReportConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _span = RunSpan::enter(suite_name(&config.suite_prefix));

    let mut pipeline = ReportPipeline::new(config);

    pipeline.load_template(&read_input(&cli.template, "template")?);
    if let Some(root) = &cli.tests {
        pipeline
            .discover(root)
            .with_context(|| format!("Failed to discover tests under {}", root.display()))?;
    }
    if let Some(path) = &cli.import_expectations {
        pipeline.load_import_expectations(&read_input(path, "import expectations")?)?;
    }
    if let Some(path) = &cli.expectations {
        pipeline.load_test_expectations(&read_input(path, "test expectations")?)?;
    }
    for path in &cli.submissions {
        pipeline.load_submissions(&read_input(path, "submissions")?)?;
    }

    let resolved = pipeline.resolve().context("Failed to resolve combo tests")?;
    let report = resolved.report();

    match &cli.output {
        Some(path) => {
            let mut sink = create_output(path)?;
            report.write_tsv(&mut sink)?;
        }
        None => {
            let stdout = io::stdout();
            report.write_tsv(&mut stdout.lock())?;
        }
    }

    if let Some(path) = &cli.json_output {
        let mut sink = create_output(path)?;
        write_snapshot_json(&resolved.snapshot(), &mut sink)?;
    }

    let totals = report.totals;
    emit_report_written(totals.total, totals.coverage, totals.passed, totals.failed);
    Ok(totals)
}

fn read_input(path: &Path, what: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {what} from {}", path.display()))
}

fn create_output(path: &Path) -> Result<impl Write> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Last path component of the suite prefix, used to tag the run span.
fn suite_name(prefix: &str) -> &str {
    prefix
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_submissions_flag_repeats() {
        let cli = Cli::parse_from([
            "implreport",
            "--template",
            "t.data",
            "--submissions",
            "a.csv",
            "--submissions",
            "b.csv",
        ]);
        assert_eq!(cli.submissions, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_template_is_required() {
        assert!(Cli::try_parse_from(["implreport", "--tests", "suite"]).is_err());
    }

    #[test]
    fn test_suite_name() {
        assert_eq!(
            suite_name("imported/csswg-test/css-writing-modes-3/"),
            "css-writing-modes-3"
        );
        assert_eq!(suite_name("flat"), "flat");
    }

    #[test]
    fn test_run_writes_report_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let suite = dir.path().join("suite");
        fs::create_dir_all(&suite).unwrap();
        fs::write(suite.join("t-001.html"), "").unwrap();

        let template = dir.path().join("template.data");
        fs::write(&template, "t-001.html\tr1\t?\nt-002.html\tr1\t?\n").unwrap();
        let submissions = dir.path().join("results.csv");
        fs::write(
            &submissions,
            "testcase-id,result,format,date,source,engine,useragent\n\
             t-001,pass,html,2016-01-02,someone,gecko,ua\n",
        )
        .unwrap();
        let config = dir.path().join("implreport.toml");
        fs::write(&config, "home_engine = \"blink\"\n").unwrap();

        let output = dir.path().join("report.data");
        let json_output = dir.path().join("report.json");
        let cli = Cli::parse_from([
            "implreport".as_ref(),
            "--template".as_ref(),
            template.as_os_str(),
            "--tests".as_ref(),
            suite.as_os_str(),
            "--submissions".as_ref(),
            submissions.as_os_str(),
            "--config".as_ref(),
            config.as_os_str(),
            "--output".as_ref(),
            output.as_os_str(),
            "--json-output".as_ref(),
            json_output.as_os_str(),
        ]);

        let totals = run(&cli).unwrap();
        assert_eq!(totals.total, 1);
        assert_eq!(totals.passed, 1);

        let tsv = fs::read_to_string(&output).unwrap();
        assert!(tsv.starts_with("testname\trevision\tresult\tcomment\n"));
        assert!(tsv.contains("t-001.html\tr1\tpass\n"));
        assert!(tsv.contains("# t-002.html\tr1\t?\n"));

        let json = fs::read_to_string(&json_output).unwrap();
        assert!(json.contains("\"t-001\""));
        assert!(!json.contains("gecko"), "anonymous results stay out of the snapshot");
    }

    #[test]
    fn test_run_reports_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "implreport".as_ref(),
            "--template".as_ref(),
            dir.path().join("absent.data").as_os_str(),
            "--output".as_ref(),
            dir.path().join("out.data").as_os_str(),
        ]);

        let err = run(&cli).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read template"));
    }
}
