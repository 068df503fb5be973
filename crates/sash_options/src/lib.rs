//! sash_options: compiler options and `sash.json` parsing.
//!
//! Options only steer the driver (whether to write output, where, and what to
//! print). They never change how a program is bound or emitted.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project file looked up by `--init` and `-p <dir>`.
pub const CONFIG_FILE_NAME: &str = "sash.json";

/// Compiler options, matching the `compilerOptions` object of `sash.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilerOptions {
    /// Bind and check only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_emit: Option<bool>,
    /// Output path for the program image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_file: Option<String>,
    /// Print a listing of the emitted program.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disassemble: Option<bool>,
    /// Print at most this many diagnostics. All are still counted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_diagnostics: Option<usize>,
}

impl CompilerOptions {
    /// Overlay `overrides` on top of `self`: every option set there wins.
    pub fn merge(&mut self, overrides: &CompilerOptions) {
        if overrides.no_emit.is_some() {
            self.no_emit = overrides.no_emit;
        }
        if overrides.out_file.is_some() {
            self.out_file.clone_from(&overrides.out_file);
        }
        if overrides.disassemble.is_some() {
            self.disassemble = overrides.disassemble;
        }
        if overrides.max_diagnostics.is_some() {
            self.max_diagnostics = overrides.max_diagnostics;
        }
    }

    pub fn no_emit(&self) -> bool {
        self.no_emit.unwrap_or(false)
    }

    pub fn disassemble(&self) -> bool {
        self.disassemble.unwrap_or(false)
    }

    pub fn out_file(&self) -> Option<&Path> {
        self.out_file.as_deref().map(Path::new)
    }
}

/// The `sash.json` file structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SashConfig {
    pub compiler_options: Option<CompilerOptions>,
    /// Input files, relative to the directory holding the config.
    pub files: Option<Vec<String>>,
}

impl SashConfig {
    pub fn options(&self) -> CompilerOptions {
        self.compiler_options.clone().unwrap_or_default()
    }

    /// The configured input files joined onto `base`.
    pub fn resolve_files(&self, base: &Path) -> Vec<PathBuf> {
        self.files
            .iter()
            .flatten()
            .map(|file| base.join(file))
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} already exists")]
    AlreadyExists { path: PathBuf },
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse a `sash.json` file from a string.
pub fn parse_config(content: &str) -> Result<SashConfig, ConfigError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse a `sash.json` file from a path.
pub fn parse_config_file(path: &Path) -> Result<SashConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

/// The configuration written by `sashc --init`.
pub fn default_config() -> SashConfig {
    SashConfig {
        compiler_options: Some(CompilerOptions {
            no_emit: Some(false),
            out_file: None,
            disassemble: Some(false),
            max_diagnostics: None,
        }),
        files: Some(Vec::new()),
    }
}

/// Write the default configuration into `dir`. Refuses to overwrite.
pub fn write_default_config(dir: &Path) -> Result<PathBuf, ConfigError> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(ConfigError::AlreadyExists { path });
    }
    let mut text = serde_json::to_string_pretty(&default_config())?;
    text.push('\n');
    std::fs::write(&path, text).map_err(|source| ConfigError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
