//! sashc: The sash bytecode compiler CLI.
//!
//! Usage:
//!   sashc [options] [file...]
//!
//! Each input file is a JSON-serialized syntax tree produced by the sash
//! parser. Files are compiled independently; every clean file gets a `.sbc`
//! program image next to it unless `--noEmit` is given.
//!
//! Exit codes: 0 success, 1 usage or I/O error or an incomplete syntax tree,
//! 2 diagnostics reported, 3 internal compiler error.

mod report;

use clap::Parser as ClapParser;
use miette::{Diagnostic, MietteHandlerOpts};
use report::Reporter;
use sash_bytecode::{DecodeError, EmitError};
use sash_compiler::{CompileError, LoadError, Program};
use sash_core::TextSpan;
use sash_options::{CompilerOptions, ConfigError, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "sashc", version, about = "sashc - compile sash syntax trees to VM bytecode")]
struct Cli {
    /// Syntax tree files (JSON) to compile.
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to sash.json, or a directory containing one.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Check only; do not write program images.
    #[arg(long = "noEmit")]
    no_emit: bool,

    /// Write the program image to this path (single input only).
    #[arg(short = 'o', long = "outFile")]
    out_file: Option<String>,

    /// Print a listing of each emitted program.
    #[arg(long)]
    disassemble: bool,

    /// Print at most this many diagnostics.
    #[arg(long = "maxDiagnostics")]
    max_diagnostics: Option<usize>,

    /// Log compiler stages (same as SASH_LOG=debug).
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Write a default sash.json in the current directory.
    #[arg(long)]
    init: bool,
}

impl Cli {
    /// Options given on the command line. Unset flags leave the project
    /// file's values alone.
    fn option_overrides(&self) -> CompilerOptions {
        CompilerOptions {
            no_emit: self.no_emit.then_some(true),
            out_file: self.out_file.clone(),
            disassemble: self.disassemble.then_some(true),
            max_diagnostics: self.max_diagnostics,
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("no input files")]
    #[diagnostic(code(sashc::usage), help("pass syntax tree files or a project with -p"))]
    NoInput,

    #[error("--outFile needs exactly one input file, got {0}")]
    #[diagnostic(code(sashc::usage))]
    OutFileWithManyInputs(usize),

    #[error(transparent)]
    #[diagnostic(code(sashc::config))]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(sashc::input))]
    Load(#[from] LoadError),

    #[error("cannot write {path}")]
    #[diagnostic(code(sashc::output))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{file} has a syntax error: recovered node at {span}")]
    #[diagnostic(code(sashc::input), help("fix the errors the parser reported, then compile again"))]
    Incomplete { file: String, span: TextSpan },

    #[error("internal compiler error in {file}")]
    #[diagnostic(code(sashc::internal), help("this is a compiler bug, not a problem in your program"))]
    Internal {
        file: String,
        #[source]
        source: EmitError,
    },

    #[error("emitted program for {file} does not decode")]
    #[diagnostic(code(sashc::internal))]
    Listing {
        file: String,
        #[source]
        source: DecodeError,
    },
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Internal { .. } | CliError::Listing { .. } => 3,
            _ => 1,
        }
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);
    let _ = miette::set_hook(Box::new(|_| {
        Box::new(MietteHandlerOpts::new().context_lines(2).build())
    }));

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("SASH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    if cli.init {
        let path = sash_options::write_default_config(Path::new("."))?;
        println!("Successfully created {}.", path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let (files, mut options) = resolve_input(cli)?;
    options.merge(&cli.option_overrides());
    debug!(files = files.len(), ?options, "resolved input");

    if files.is_empty() {
        return Err(CliError::NoInput);
    }
    if options.out_file.is_some() && files.len() > 1 {
        return Err(CliError::OutFileWithManyInputs(files.len()));
    }

    let mut program = Program::new(options);
    for file in &files {
        program.load_file(file)?;
    }

    let mut reporter = Reporter::new(program.options.max_diagnostics);
    if program.options.no_emit() {
        for diagnostic in &program.check() {
            reporter.report(diagnostic, source_text(&program, diagnostic.file.as_deref()));
        }
    } else {
        emit_all(&program, &files, &mut reporter)?;
    }

    Ok(if reporter.finish() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn emit_all(program: &Program, files: &[PathBuf], reporter: &mut Reporter) -> Result<(), CliError> {
    for (result, input) in program.emit().into_iter().zip(files) {
        match result.output {
            Ok(image) => {
                if program.options.disassemble() {
                    let listing = image.listing().map_err(|source| CliError::Listing {
                        file: result.file_name.clone(),
                        source,
                    })?;
                    println!("== {} ==\n{}", result.file_name, listing);
                }
                let path = sash_emitter::output_path(input, program.options.out_file());
                sash_emitter::write_image(&path, &image)
                    .map_err(|source| CliError::Write { path: path.clone(), source })?;
                info!(file = %result.file_name, output = %path.display(), bytes = image.code.len(), "wrote program");
            }
            Err(CompileError::Diagnostics(diagnostics)) => {
                for diagnostic in &diagnostics {
                    reporter.report(diagnostic, source_text(program, Some(&result.file_name)));
                }
            }
            Err(CompileError::Incomplete { span }) => {
                return Err(CliError::Incomplete {
                    file: result.file_name,
                    span,
                });
            }
            Err(CompileError::Emit(source)) => {
                return Err(CliError::Internal {
                    file: result.file_name,
                    source,
                });
            }
        }
    }
    Ok(())
}

/// The source text of `file_name`, if its tree carried one.
fn source_text<'p>(program: &'p Program, file_name: Option<&str>) -> Option<&'p str> {
    let file_name = file_name?;
    program
        .source_files()
        .iter()
        .find(|source| source.file_name == file_name)
        .and_then(|source| source.text.as_deref())
}

/// Input files and file-level options: from `-p`, from the command line, or
/// from `./sash.json` when neither is given.
fn resolve_input(cli: &Cli) -> Result<(Vec<PathBuf>, CompilerOptions), CliError> {
    let project = match &cli.project {
        Some(path) if path.is_dir() => Some(path.join(CONFIG_FILE_NAME)),
        Some(path) => Some(path.clone()),
        None if cli.files.is_empty() && Path::new(CONFIG_FILE_NAME).exists() => {
            Some(PathBuf::from(CONFIG_FILE_NAME))
        }
        None => None,
    };

    let Some(project) = project else {
        return Ok((cli.files.clone(), CompilerOptions::default()));
    };

    let config = sash_options::parse_config_file(&project)?;
    let base = project.parent().unwrap_or(Path::new("."));
    let mut files = config.resolve_files(base);
    files.extend(cli.files.iter().cloned());
    Ok((files, config.options()))
}
