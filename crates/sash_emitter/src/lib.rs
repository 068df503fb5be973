//! sash_emitter: Bytecode generation and program output.
//!
//! Turns a diagnostic-free bound program into a `ProgramImage`:
//! 1. Resolve every symbol reference to a local, free or global slot
//! 2. Lower statements and expressions to the VM's instruction set
//! 3. Intern literals and function pointers in the constant pool
//! 4. Write the image next to its source or to an explicit path

mod emitter;
mod frame;

pub use emitter::Emitter;

use sash_binder::BoundProgram;
use sash_bytecode::{EmitError, ProgramImage};
use std::path::{Path, PathBuf};

/// Extension of emitted program files.
pub const OUTPUT_EXTENSION: &str = "sbc";

/// Emit a bound program with a fresh emitter.
pub fn emit(program: &BoundProgram) -> Result<ProgramImage, EmitError> {
    Emitter::new(&program.symbols).emit_program(&program.statements)
}

/// Where the image for `source` goes: `out_file` if given, otherwise the
/// source path with its extension replaced.
pub fn output_path(source: &Path, out_file: Option<&Path>) -> PathBuf {
    match out_file {
        Some(path) => path.to_path_buf(),
        None => source.with_extension(OUTPUT_EXTENSION),
    }
}

/// Write an image to disk, creating parent directories as needed.
pub fn write_image(path: &Path, image: &ProgramImage) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, image.to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path(Path::new("src/main.json"), None),
            PathBuf::from("src/main.sbc")
        );
    }

    #[test]
    fn test_output_path_override() {
        assert_eq!(
            output_path(Path::new("src/main.json"), Some(Path::new("out/prog.bin"))),
            PathBuf::from("out/prog.bin")
        );
    }
}
