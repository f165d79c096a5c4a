//! Shared contract between the n7 compiler, assembler, and runtime.
//!
//! Everything that has to agree across tool boundaries lives here: the
//! instruction table (mnemonic + operand signature -> opcode), the system
//! call selectors, the built-in key code constants, value type tags, the
//! runtime payload marker, and the source-level size limits.

pub mod instr;
pub mod keycodes;
pub mod syscall;

pub use instr::{find_by_opcode, find_instr, mnemonic_known, InstrSpec, OperandKind, INSTRUCTIONS};
pub use syscall::SysCall;

/// Maximum length of an identifier, in bytes.
pub const VAR_MAX_CHARS: usize = 64;

/// Maximum length of a string constant, in bytes.
pub const STRING_MAX_CHARS: usize = 512;

/// Maximum length of the preserved textual form of a number literal.
pub const NUMBER_MAX_CHARS: usize = 64;

/// Runtime flag: build a windowed application instead of a console one.
pub const WIN32_FLAG: u32 = 1;

/// Runtime flag: bytecode carries debug records.
pub const DBG_FLAG: u32 = 2;

/// Marker written between the runtime image and the bytecode payload in a
/// packaged executable. The runtime scans for these seven bytes from the
/// end of its own file to locate the payload.
pub const RUNTIME_MARKER: [u8; 7] = *b"<n7bin>";

/// Version string compiled into programs as the `VERSION` constant.
pub const VERSION_STRING: &str = "25.09.14b";

/// Value type tags, exposed to programs through the `TYPE_*` constants and
/// used by the `type` instruction.
pub const VAR_UNSET: i32 = 0;
pub const VAR_NUM: i32 = 1;
pub const VAR_STR: i32 = 2;
pub const VAR_LBL: i32 = 3;
pub const VAR_TBL: i32 = 4;
