//! Command-line interface for reft.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reft_driver::{Session, WalkOptions};
use reft_lint::{run_check, run_lint, LintOptions, LintReport, ModuleDiagnostic, NativeLinter};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reft")]
#[command(author, version, about = "Static analysis and linting for Nextflow pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Worker threads for directory walks (defaults to available cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scripted lint rules over a pipeline
    Lint(LintArgs),

    /// Run a checks script against one .nf file
    Check {
        /// The Nextflow file to check
        nf_file: PathBuf,

        /// The checks script defining main(params, includes)
        checks_file: PathBuf,
    },

    /// Print the analyzed module of a .nf file as JSON
    Dump {
        /// The Nextflow file to analyze
        file: PathBuf,

        /// Print the syntax tree instead of the module
        #[arg(long)]
        ast: bool,
    },

    /// Print the analysis of a .config file as JSON
    Config {
        /// The Nextflow config file to analyze
        file: PathBuf,
    },
}

#[derive(Args)]
struct LintArgs {
    #[command(subcommand)]
    command: Option<LintCommands>,

    /// The rules script
    #[arg(short, long, default_value = "rules.rhai")]
    rules: PathBuf,

    /// The pipeline directory
    #[arg(short, long, default_value = ".")]
    directory: PathBuf,

    /// Run only this rule
    #[arg(short, long)]
    name: Option<String>,
}

#[derive(Subcommand)]
enum LintCommands {
    /// Run the built-in nf-core rules
    Nfcore {
        /// The pipeline directory
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            let bug = e
                .downcast_ref::<reft_lint::ScriptError>()
                .is_some_and(reft_lint::ScriptError::is_likely_bug)
                || e
                    .downcast_ref::<reft_driver::DriverError>()
                    .is_some_and(reft_driver::DriverError::is_likely_bug);
            if bug {
                eprintln!("note: this is likely a bug in reft; please report it");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut options = WalkOptions::default();
    if let Some(threads) = cli.threads {
        options = options.with_threads(threads);
    }
    let session = Session::new(options);

    match cli.command {
        Commands::Lint(LintArgs {
            command: Some(LintCommands::Nfcore { directory }),
            ..
        }) => {
            let report = NativeLinter::nf_core().lint_directory(&session, &directory);
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report)?;
            }
            Ok(exit_code(report.has_errors()))
        }

        Commands::Lint(LintArgs {
            command: None,
            rules,
            directory,
            name,
        }) => {
            let mut options = LintOptions::default()
                .with_rules_file(rules)
                .with_directory(directory);
            if let Some(name) = name {
                options = options.with_rule(name);
            }
            let report = run_lint(&options, &session)?;
            if cli.json {
                print_json(&report)?;
            } else {
                report.render(&mut std::io::stdout().lock())?;
            }
            Ok(exit_code(report.has_errors()))
        }

        Commands::Check {
            nf_file,
            checks_file,
        } => {
            let outcome = run_check(&nf_file, &checks_file)?;
            for line in &outcome.outputs {
                println!("{}", line);
            }
            match outcome.error {
                Some(message) => {
                    println!("Execution failed: {}", message);
                    Ok(ExitCode::FAILURE)
                }
                None => Ok(ExitCode::SUCCESS),
            }
        }

        Commands::Dump { file, ast } => {
            let module = session
                .load_file(&file)
                .with_context(|| format!("failed to analyze {}", file.display()))?;
            if ast {
                print_json(&module.ast)?;
            } else {
                print_json(&module)?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Config { file } => {
            let config = session
                .load_config(&file)
                .with_context(|| format!("failed to analyze {}", file.display()))?;
            print_json(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn print_report(report: &LintReport) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    let mut line = |kind: &str, d: &ModuleDiagnostic| {
        writeln!(out, "{}: {}:{}: {}", kind, d.module_path.display(), d.line, d.message)
    };
    for d in &report.errors {
        line("error", d)?;
    }
    for d in &report.warnings {
        line("warning", d)?;
    }
    writeln!(
        out,
        "{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lint_defaults() {
        let cli = Cli::try_parse_from(["reft", "lint"]).unwrap();
        let Commands::Lint(args) = cli.command else {
            panic!("expected lint");
        };
        assert!(args.command.is_none());
        assert_eq!(args.rules, PathBuf::from("rules.rhai"));
        assert_eq!(args.directory, PathBuf::from("."));
    }

    #[test]
    fn test_lint_nfcore() {
        let cli = Cli::try_parse_from(["reft", "--json", "lint", "nfcore", "-d", "pipeline"]).unwrap();
        assert!(cli.json);
        let Commands::Lint(LintArgs {
            command: Some(LintCommands::Nfcore { directory }),
            ..
        }) = cli.command
        else {
            panic!("expected lint nfcore");
        };
        assert_eq!(directory, PathBuf::from("pipeline"));
    }

    #[test]
    fn test_check_takes_two_files() {
        assert!(Cli::try_parse_from(["reft", "check", "main.nf"]).is_err());
        assert!(Cli::try_parse_from(["reft", "check", "main.nf", "checks.rhai"]).is_ok());
    }
}
