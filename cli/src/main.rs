mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use arm::DiagnosticError;
use blockworld::parser::ParseError;

const SUBCOMMANDS: &[&str] = &["run", "test", "help"];

#[derive(Parser)]
#[command(name = "robot-arm", version, about = "Blocks world robot arm simulator")]
struct Cli {
    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log filter used when RUST_LOG is unset (e.g. "debug", "arm=trace")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a commands file and print the final table
    Run(RunArgs),

    /// Run .test.txt test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Commands file to execute
    file: String,

    /// Report lines that were ignored
    #[arg(short, long)]
    warnings: bool,

    /// Parse only, don't execute (exit 0 if readable)
    #[arg(long)]
    check: bool,

    /// Dump the queued operations instead of executing them
    #[arg(long)]
    ops: bool,

    /// Suppress the final report
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.txt file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // `robot-arm commands.txt` means `robot-arm run commands.txt`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = first_positional(&args) {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "run".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_logging(&cli.log_level);

    match cli.command {
        Command::Run(run_args) => do_run(run_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Index of the first argument that is neither a flag nor a flag's value.
fn first_positional(args: &[String]) -> Option<usize> {
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--log-level" => i += 2,
            a if a.starts_with('-') => i += 1,
            _ => return Some(i),
        }
    }
    None
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn do_run(args: RunArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let script = blockworld::parser::Parser::new(source, file_id).parse();
    tracing::debug!(
        lines = script.lines.len(),
        operations = script.operations().count(),
        "parsed commands file"
    );

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    if args.warnings {
        emit_parse_warnings(&writer, &config, &files, &script.warnings);
    }

    if args.check {
        eprintln!(
            "ok: {} parsed, {} command(s)",
            args.file,
            script.operations().count()
        );
        return;
    }

    if args.ops {
        let mut world = arm::BlockWorld::new();
        let warnings = world.load(&script);
        if args.warnings {
            emit_diagnostics(&writer, &config, &files, &warnings);
        }
        println!("blocks: {}", world.block_count());
        for op in world.pending() {
            println!("{}", op);
        }
        return;
    }

    match arm::run_script(&script) {
        Ok((report, warnings)) => {
            if args.warnings {
                emit_diagnostics(&writer, &config, &files, &warnings);
            }
            if !args.quiet {
                print!("{}", report);
            }
        }
        Err(error) => {
            emit_diagnostic_error(&writer, &config, &files, &error);
            process::exit(1);
        }
    }
}

fn emit_parse_warnings(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    warnings: &[ParseError],
) {
    for warning in warnings {
        let diagnostic = warning.to_diagnostic();
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    }
}

fn emit_diagnostic_error(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    error: &DiagnosticError,
) {
    if let Some(span) = &error.span {
        let severity = if error.is_warning {
            Severity::Warning
        } else {
            Severity::Error
        };
        let diagnostic = Diagnostic::new(severity)
            .with_message(error.to_string())
            .with_labels(vec![Label::primary(error.source_id, span.clone())]);
        let _ = term::emit_to_write_style(&mut writer.lock(), config, files, &diagnostic);
    } else {
        let prefix = if error.is_warning { "warning" } else { "error" };
        eprintln!("{}: {}", prefix, error);
    }
}

fn emit_diagnostics(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostics: &[DiagnosticError],
) {
    for diag in diagnostics {
        emit_diagnostic_error(writer, config, files, diag);
    }
}
