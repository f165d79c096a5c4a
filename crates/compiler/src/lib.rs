//! n7 Compiler Library
//!
//! Compiles n7 source files to n7a textual assembly. The companion
//! `n7-assembler` crate turns the assembly into n7b bytecode, and
//! [`package`] concatenates a prebuilt runtime with the bytecode into a
//! self-contained executable.
//!
//! The pipeline is two passes over the source: [`prescan`] discovers every
//! function definition (so forward references and includes work), then
//! [`codegen`] re-reads the source and emits assembly in a single pass.

pub mod builtins;
pub mod codegen;
pub mod config;
pub mod error;
pub mod keywords;
pub mod lexer;
pub mod package;
pub mod prescan;
pub mod scope;

pub use codegen::CodeGen;
pub use config::Config;
pub use error::{CompileError, CompileResult};
pub use lexer::Directives;

use std::fs;
use std::path::Path;

/// Result of a successful compile.
#[derive(Debug)]
pub struct CompileOutput {
    /// The textual assembly.
    pub assembly: String,
    /// Flags and heap request gathered from `#` directives.
    pub directives: Directives,
}

/// Open an included file, trying the user library path first and the
/// system library path second. Library paths are plain string prefixes.
pub(crate) fn open_include(user_lib_path: &str, lib_path: &str, name: &str) -> Option<String> {
    fs::read_to_string(format!("{}{}", user_lib_path, name))
        .ok()
        .or_else(|| fs::read_to_string(format!("{}{}", lib_path, name)).ok())
}

/// Strip the directory from a path for diagnostics.
fn clean_filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Compile a source buffer to assembly text.
pub fn compile_source(
    source: &str,
    filename: &str,
    lib_path: &str,
    user_lib_path: &str,
) -> CompileResult<CompileOutput> {
    let keywords = keywords::keyword_table();
    let funcs = prescan::prescan(source, filename, &keywords, lib_path, user_lib_path)?;
    let generator = CodeGen::new(&keywords, funcs, source, filename, lib_path, user_lib_path);
    let (assembly, directives) = generator.generate()?;
    Ok(CompileOutput {
        assembly,
        directives,
    })
}

/// Compile the n7 file `src` to the n7a file `dst`.
pub fn compile_file(
    src: &Path,
    dst: &Path,
    lib_path: &str,
    user_lib_path: &str,
) -> CompileResult<CompileOutput> {
    let source = fs::read_to_string(src).map_err(|_| {
        CompileError::bare(format!(
            "Could not open file '{}' for reading",
            src.display()
        ))
    })?;
    let filename = clean_filename(src);
    let output = compile_source(&source, &filename, lib_path, user_lib_path)?;
    fs::write(dst, &output.assembly).map_err(|_| {
        CompileError::bare(format!(
            "Could not open file '{}' for writing",
            dst.display()
        ))
    })?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use n7_core::DBG_FLAG;
    use std::fs;

    fn compile(source: &str) -> CompileResult<CompileOutput> {
        compile_source(source, "test.n7", "", "")
    }

    fn assembly(source: &str) -> String {
        compile(source).expect("compiles").assembly
    }

    #[test]
    fn hello_world_lowers_to_a_pln_syscall() {
        let asm = assembly("pln \"hello\"\n");
        assert!(asm.contains("move @0 \"hello\""));
        assert!(asm.contains("push @0"));
        assert!(asm.contains(&format!("sys {} 1", n7_core::SysCall::Pln.selector())));
    }

    #[test]
    fn hello_world_assembles_end_to_end() {
        let asm = assembly("pln \"hello\"\n");
        let bytecode = n7_assembler::assemble(&asm, "test.n7a", true, false).expect("assembles");
        assert!(!bytecode.is_empty());
    }

    #[test]
    fn forward_function_reference_compiles() {
        let asm = assembly("x = f(3)\npln x\nfunction f(n)\n  return n * n\nendfunc\n");
        // The call site loads the function label discovered by prescan.
        assert!(asm.contains("move @0 __0:"));
        assert!(asm.contains("__0:"));
        // Everything resolves when assembled.
        n7_assembler::assemble(&asm, "test.n7a", true, false).expect("assembles");
    }

    #[test]
    fn assigning_a_constant_fails() {
        let err = compile("constant PI2 = 6.28\nPI2 = 3\n").unwrap_err();
        assert_eq!(err.to_string(), "test.n7:2: error: 'PI2' is a constant");
    }

    #[test]
    fn assigning_a_static_function_fails() {
        let err = compile("function f()\nendfunc\nf = 1\n").unwrap_err();
        assert!(err.to_string().contains("'f' is a static function"));
    }

    #[test]
    fn undeclared_identifier_on_rhs_fails() {
        let err = compile("x = y + 1\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.n7:1: error: Undeclared identifier 'y'"
        );
    }

    #[test]
    fn wrong_static_arity_fails() {
        let err = compile("function f(a, b)\nendfunc\nx = f(1)\n").unwrap_err();
        assert!(err
            .to_string()
            .contains("'f' expects 2 arguments but gets 1"));
    }

    #[test]
    fn args_is_predeclared() {
        assert!(compile("pln args[0]\n").is_ok());
    }

    #[test]
    fn directives_are_collected_across_the_unit() {
        let output = compile("#dbg\n#mem4096\npln 1\n").unwrap();
        assert_eq!(output.directives.runtime_flags & DBG_FLAG, DBG_FLAG);
        assert_eq!(output.directives.memory_request, 4096);
    }

    #[test]
    fn number_literal_text_round_trips_into_assembly() {
        let asm = assembly("x = 0.1\n");
        assert!(asm.contains("move @0 0.1\n"));
    }

    #[test]
    fn line_metadata_follows_real_newlines_only() {
        let asm = assembly("x = 1\ny = 2; z = 3\n");
        assert!(asm.contains("/line:2"));
        // The semicolon statement separator must not advance the counter:
        // no line record between the two statements it joins.
        let y = asm.find("madd .y").unwrap();
        let z = asm.find("madd .z").unwrap();
        assert!(!asm[y..z].contains("/line:"));
    }

    #[test]
    fn includes_are_deduplicated() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("lib.n7");
        fs::write(&lib, "visible shared = 1\n").unwrap();
        fs::write(dir.path().join("a.n7"), "include \"lib.n7\"\n").unwrap();
        fs::write(dir.path().join("b.n7"), "include \"lib.n7\"\n").unwrap();

        let prefix = format!("{}/", dir.path().display());
        let output = compile_source(
            "include \"a.n7\"\ninclude \"b.n7\"\n",
            "main.n7",
            "",
            &prefix,
        )
        .unwrap();

        // lib's library table is allocated exactly once.
        let allocations = output
            .assembly
            .lines()
            .filter(|line| *line == "madd ._lib_n7")
            .count();
        assert_eq!(allocations, 1);
    }

    #[test]
    fn missing_include_fails_with_the_bare_name() {
        let err = compile("include \"nope.n7\"\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "test.n7:1: error: Could not open file 'nope.n7' for reading"
        );
    }

    #[test]
    fn included_file_errors_carry_its_filename() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.n7"), "x = y\n").unwrap();
        let prefix = format!("{}/", dir.path().display());
        let err = compile_source("include \"bad.n7\"\n", "main.n7", "", &prefix).unwrap_err();
        assert_eq!(
            err.to_string(),
            "bad.n7:1: error: Undeclared identifier 'y'"
        );
    }

    #[test]
    fn full_pipeline_with_and_without_optimization() {
        let source = "function add(a, b)\n  return a + b\nendfunc\npln add(1, 2)\n";
        let asm = assembly(source);
        let fused = n7_assembler::assemble(&asm, "t.n7a", true, false).unwrap();
        let plain = n7_assembler::assemble(&asm, "t.n7a", false, false).unwrap();
        // Fusion only ever shrinks the stream.
        assert!(fused.len() < plain.len());
        // The function entry's parameter check fused into opt_pval.
        let pval = n7_core::instr::find_instr(
            "opt_pval",
            &[
                n7_core::instr::OperandKind::Int,
                n7_core::instr::OperandKind::Str,
            ],
        )
        .unwrap();
        // The stream opens with the jump over the function body, and the
        // entry's parameter check right after it fused into opt_pval.
        assert_eq!(fused[5], pval.opcode);
    }

    #[test]
    fn disassembly_round_trips_compiled_programs() {
        let asm = assembly("x = 0\nwhile x < 3\n  x = x + 1\nwend\npln x\n");
        let bytecode = n7_assembler::assemble(&asm, "t.n7a", false, false).unwrap();
        let text = n7_assembler::disassemble(&bytecode).unwrap();
        let again = n7_assembler::assemble(&text, "t.n7a", false, false).unwrap();
        assert_eq!(bytecode, again);
    }
}
