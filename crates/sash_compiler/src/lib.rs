//! sash_compiler: Compiler orchestration.
//!
//! A `Program` holds the source files of one invocation. Each file is
//! compiled in a context of its own: bind, stop if anything was diagnosed,
//! otherwise emit. Nothing is shared between two compilations.

use sash_ast::SourceFile;
use sash_bytecode::{EmitError, ProgramImage};
use sash_core::TextSpan;
use sash_diagnostics::DiagnosticCollection;
use sash_options::CompilerOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Why a source file produced no program.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Binding reported diagnostics; emission was skipped.
    #[error("{} diagnostic(s) reported", .0.len())]
    Diagnostics(DiagnosticCollection),
    /// The tree holds a node the parser synthesized while recovering from a
    /// syntax error. The parser reports that error; there is nothing to emit.
    #[error("syntax tree is incomplete: recovered node at {span}")]
    Incomplete { span: TextSpan },
    /// The emitter hit a broken invariant.
    #[error("internal compiler error: {0}")]
    Emit(#[from] EmitError),
}

/// Failure to load a serialized syntax tree.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid syntax tree: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a JSON-serialized `SourceFile` from disk.
pub fn read_source_file(path: &Path) -> Result<SourceFile, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Bind a source file and return what it diagnosed, stamped with its name.
pub fn check_source_file(source_file: &SourceFile) -> DiagnosticCollection {
    let (_, mut diagnostics) = sash_binder::bind_source_file(source_file);
    diagnostics.set_file(&source_file.file_name);
    diagnostics
}

/// Compile a single source file to a program image.
#[instrument(level = "debug", skip_all, fields(file = %source_file.file_name))]
pub fn compile_source_file(source_file: &SourceFile) -> Result<ProgramImage, CompileError> {
    let (program, mut diagnostics) = sash_binder::bind_source_file(source_file);
    if !diagnostics.is_empty() {
        debug!(count = diagnostics.len(), "emission skipped");
        diagnostics.set_file(&source_file.file_name);
        return Err(CompileError::Diagnostics(diagnostics));
    }
    sash_emitter::emit(&program).map_err(|err| match err {
        EmitError::ErrorNode { span } => CompileError::Incomplete { span },
        err => CompileError::Emit(err),
    })
}

/// The outcome of compiling one file of a program.
#[derive(Debug)]
pub struct EmitResult {
    pub file_name: String,
    pub output: Result<ProgramImage, CompileError>,
}

/// The program represents every source file of one invocation.
pub struct Program {
    /// Compiler options.
    pub options: CompilerOptions,
    source_files: Vec<SourceFile>,
}

impl Program {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            source_files: Vec::new(),
        }
    }

    pub fn add_source_file(&mut self, source_file: SourceFile) {
        self.source_files.push(source_file);
    }

    /// Load a JSON syntax tree from disk and add it.
    pub fn load_file(&mut self, path: &Path) -> Result<(), LoadError> {
        let source_file = read_source_file(path)?;
        self.source_files.push(source_file);
        Ok(())
    }

    pub fn source_files(&self) -> &[SourceFile] {
        &self.source_files
    }

    /// Bind every file. Returns all diagnostics, sorted by file and position.
    pub fn check(&self) -> DiagnosticCollection {
        let mut all_diagnostics = DiagnosticCollection::new();
        for source_file in &self.source_files {
            all_diagnostics.extend(check_source_file(source_file));
        }
        all_diagnostics.sort();
        all_diagnostics
    }

    /// Compile every file. Files are independent: one failing does not
    /// stop the others.
    pub fn emit(&self) -> Vec<EmitResult> {
        self.source_files
            .iter()
            .map(|source_file| EmitResult {
                file_name: source_file.file_name.clone(),
                output: compile_source_file(source_file),
            })
            .collect()
    }
}
