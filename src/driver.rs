// Command-Line Driver
//
// Glues a frontend to the code generator: read the source file, drive the
// frontend over a fresh compilation context, write one instruction per
// output line. The frontend itself lives outside this crate, so the
// driver is a library function rather than a binary.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::codegen::RegMachineCodeGen;
use crate::error::CompilerError;
use crate::Frontend;

/// Compile `input` to `output` using `frontend`.
pub fn compile_file<F: Frontend>(
    frontend: &mut F,
    input: &Path,
    output: &Path,
) -> Result<(), CompilerError> {
    let source = fs::read_to_string(input)
        .map_err(|err| CompilerError::IOError(format!("cannot open {}: {}", input.display(), err)))?;
    let mut file = fs::File::create(output).map_err(|err| {
        CompilerError::IOError(format!("cannot open {}: {}", output.display(), err))
    })?;

    let mut codegen = RegMachineCodeGen::new();
    frontend.compile(&source, &mut codegen)?;
    let lines = codegen.finalize()?;

    log::debug!("writing {} instructions to {}", lines.len(), output.display());
    for line in &lines {
        writeln!(file, "{}", line)
            .map_err(|err| CompilerError::IOError(format!("write failed: {}", err)))?;
    }
    Ok(())
}

/// Process entry point: `args` are the raw program arguments,
/// `<program> <input-path> <output-path>`. Returns the exit code;
/// diagnostics go to stderr.
pub fn run<F: Frontend>(frontend: &mut F, args: &[String]) -> i32 {
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("compiler");
        eprintln!("Usage: {} <input-file> <output-file>", program);
        return 1;
    }
    match compile_file(frontend, Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Compilation error: {}", err);
            1
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
