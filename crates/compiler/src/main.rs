//! n7 Compiler CLI
//!
//! Drives the three phases: compile `.n7` to `.n7a`, assemble `.n7a` to
//! `.n7b`, and build a self-contained executable from the runtime image
//! and the bytecode. Each phase reports with its prefix (`n7:`, `n7a:`,
//! `n7b:`) and the first failure stops the run with a non-zero status.

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use n7_core::WIN32_FLAG;
use n7c::package::build_executable;
use n7c::{compile_file, Config};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "n7c")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "n7 compiler - build n7 programs into executables", long_about = None)]
struct Cli {
    /// Input .n7 source file
    #[arg(required_unless_present = "completions")]
    input: Option<PathBuf>,

    /// Build a windowed application instead of a console one
    #[arg(long)]
    win32: bool,

    /// Emit debug records into the bytecode
    #[arg(long)]
    dbg: bool,

    /// Request a heap of this many bytes
    #[arg(long, value_name = "BYTES")]
    mem: Option<u32>,

    /// Disable peephole optimization
    #[arg(long)]
    no_opt: bool,

    /// System library path prefix (default: lib/ next to the compiler)
    #[arg(long, value_name = "PATH")]
    lib_path: Option<String>,

    /// User library path prefix (default: the source file's directory)
    #[arg(long, value_name = "PATH")]
    user_lib_path: Option<String>,

    /// Stop after the compile phase and keep only the .n7a assembly
    #[arg(long)]
    asm_only: bool,

    /// Generate shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut io::stdout());
        return;
    }

    let input = cli.input.as_deref().expect("clap enforces the input");
    let exe_dir = compiler_dir();

    let config = match Config::load(&exe_dir.join("n7.toml")) {
        Ok(config) => config,
        Err(message) => {
            println!("n7: error: {}", message);
            process::exit(1);
        }
    };

    let lib_path = cli
        .lib_path
        .or(config.lib_path)
        .unwrap_or_else(|| format!("{}/", exe_dir.join("lib").display()));
    let user_lib_path = cli
        .user_lib_path
        .or(config.user_lib_path)
        .unwrap_or_else(|| source_dir_prefix(input));
    let optimize = !cli.no_opt && config.optimize.unwrap_or(true);

    let asm_file = input.with_extension("n7a");
    let bin_file = input.with_extension("n7b");
    let exe_file = input.with_extension("exe");

    // Phase one: n7 -> n7a.
    let output = match compile_file(input, &asm_file, &lib_path, &user_lib_path) {
        Ok(output) => output,
        Err(err) => {
            println!("n7: {}", err);
            process::exit(1);
        }
    };
    println!("n7: success");
    if cli.asm_only {
        return;
    }

    let mut flags = output.directives.runtime_flags;
    if cli.win32 {
        flags |= WIN32_FLAG;
    }
    if cli.dbg {
        flags |= n7_core::DBG_FLAG;
    }
    let heap_size = if output.directives.memory_request > 0 {
        output.directives.memory_request as u32
    } else {
        cli.mem.unwrap_or(0)
    };
    let debug = flags & n7_core::DBG_FLAG != 0;

    // Phase two: n7a -> n7b.
    if let Err(err) = n7_assembler::assemble_file(&asm_file, &bin_file, optimize, debug) {
        println!("n7a: {}", err);
        process::exit(1);
    }
    println!("n7a: success");

    // Phase three: runtime + bytecode -> executable.
    let runtime = if flags & WIN32_FLAG != 0 {
        exe_dir.join("renv_win")
    } else {
        exe_dir.join("renv_console")
    };
    if let Err(err) = build_executable(&runtime, &bin_file, &exe_file, flags, heap_size) {
        println!("n7b: {}", err);
        process::exit(1);
    }
    println!("n7b: success");
}

/// Directory the compiler binary lives in; library paths and the runtime
/// images are found relative to it.
fn compiler_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// String prefix for files next to the source file.
fn source_dir_prefix(input: &Path) -> String {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => format!("{}/", dir.display()),
        _ => String::new(),
    }
}
