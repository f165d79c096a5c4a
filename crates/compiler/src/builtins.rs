//! Built-in signatures.
//!
//! Maps keywords to the system call selector and compile-time arity bounds
//! they lower to, both for command statements (`pln`, `cls`, ...) and for
//! expression functions (`rnd(...)`, `left(...)`, ...). Multi-keyword
//! spellings (`set window`, `draw image xform`, ...) are dispatched in the
//! statement code; only their leaf signatures live here.
//!
//! A second table maps the instruction-level functions (`abs`, `cos`,
//! `int`, ...) to the VM instruction they compile to directly.

use crate::codegen::FactorType;
use crate::keywords::Keyword;
use n7_core::SysCall;

/// Arity-checked system call signature.
#[derive(Debug, Clone, Copy)]
pub struct SysSig {
    pub call: SysCall,
    pub min: usize,
    pub max: usize,
    /// What the call leaves in register 0, as far as the parser cares.
    pub factor: FactorType,
}

const fn sig(call: SysCall, min: usize, max: usize) -> SysSig {
    SysSig {
        call,
        min,
        max,
        factor: FactorType::Value,
    }
}

const fn sig_as(call: SysCall, min: usize, max: usize, factor: FactorType) -> SysSig {
    SysSig {
        call,
        min,
        max,
        factor,
    }
}

/// Single-keyword command statements.
pub fn statement_command(kw: Keyword) -> Option<SysSig> {
    let sig = match kw {
        Keyword::Pln => sig(SysCall::Pln, 0, 1),
        Keyword::System => sig(SysCall::System, 1, 1),
        Keyword::Wait => sig(SysCall::Sleep, 1, 1),
        Keyword::Fwait => sig(SysCall::FrameSleep, 1, 1),
        Keyword::Randomize => sig(SysCall::Randomize, 1, 1),
        Keyword::Redraw => sig(SysCall::WinRedraw, 0, 0),
        Keyword::Cls => sig(SysCall::Cls, 0, 1),
        Keyword::Center => sig(SysCall::Center, 0, 1),
        Keyword::Insert => sig(SysCall::TblInsert, 3, 3),
        Keyword::Scroll => sig(SysCall::Scroll, 2, 2),
        _ => return None,
    };
    Some(sig)
}

/// Expression-level built-in functions.
pub fn function_builtin(kw: Keyword) -> Option<SysSig> {
    let sig = match kw {
        Keyword::ToString => sig(SysCall::Str, 1, 3),
        Keyword::Rln => sig(SysCall::ReadLine, 0, 2),
        Keyword::DateTime => sig_as(SysCall::DateTime, 0, 1, FactorType::Table),
        Keyword::Time => sig(SysCall::Time, 0, 6),
        Keyword::Clock => sig(SysCall::Clock, 0, 0),
        Keyword::Rnd => sig(SysCall::Rnd, 0, 2),
        Keyword::System => sig(SysCall::Capture, 1, 1),
        Keyword::Split => sig_as(SysCall::SplitStr, 2, 2, FactorType::Array),
        Keyword::Left => sig(SysCall::LeftStr, 2, 2),
        Keyword::Right => sig(SysCall::RightStr, 2, 2),
        Keyword::Mid => sig(SysCall::MidStr, 2, 3),
        Keyword::Instr => sig(SysCall::InStr, 2, 3),
        Keyword::Replace => sig(SysCall::ReplaceStr, 3, 4),
        Keyword::Lower => sig(SysCall::LowerStr, 1, 1),
        Keyword::Upper => sig(SysCall::UpperStr, 1, 1),
        Keyword::Chr => sig(SysCall::Chr, 1, 1),
        Keyword::Asc => sig(SysCall::Asc, 1, 1),
        Keyword::Key => sig(SysCall::TblHasKey, 2, 2),
        Keyword::Val => sig(SysCall::TblHasValue, 2, 2),
        Keyword::KeyOf => sig(SysCall::TblKeyOf, 2, 3),
        Keyword::File => sig(SysCall::FileExists, 1, 1),
        Keyword::OpenFile => sig(SysCall::OpenFile, 1, 2),
        Keyword::CreateFile => sig(SysCall::CreateFile, 1, 2),
        Keyword::OpenFileDialog => sig(SysCall::OpenFileDialog, 0, 1),
        Keyword::SaveFileDialog => sig(SysCall::SaveFileDialog, 0, 1),
        Keyword::Exists => sig(SysCall::CheckFileExists, 1, 1),
        Keyword::Fread => sig(SysCall::FileRead, 1, 3),
        Keyword::Freadc => sig(SysCall::FileReadChar, 1, 1),
        Keyword::Frln => sig(SysCall::FileReadLine, 1, 1),
        Keyword::FileTell => sig(SysCall::FileTell, 1, 1),
        Keyword::FileSeek => sig(SysCall::FileSeek, 2, 3),
        Keyword::Active => sig(SysCall::WinActive, 0, 0),
        Keyword::Window => sig(SysCall::WinExists, 1, 1),
        Keyword::ScreenW => sig(SysCall::ScreenW, 0, 0),
        Keyword::ScreenH => sig(SysCall::ScreenH, 0, 0),
        Keyword::MouseX => sig(SysCall::MouseX, 0, 0),
        Keyword::MouseY => sig(SysCall::MouseY, 0, 0),
        Keyword::MouseDx => sig(SysCall::MouseDx, 0, 0),
        Keyword::MouseDy => sig(SysCall::MouseDy, 0, 0),
        Keyword::MouseButton => sig(SysCall::MouseDown, 1, 2),
        Keyword::JoyX => sig(SysCall::JoyX, 0, 0),
        Keyword::JoyY => sig(SysCall::JoyY, 0, 0),
        Keyword::JoyButton => sig(SysCall::JoyButton, 0, 2),
        Keyword::CreateZone => sig(SysCall::CreateZone, 4, 4),
        Keyword::Zone => sig(SysCall::Zone, 0, 2),
        Keyword::ZoneX => sig(SysCall::ZoneX, 1, 1),
        Keyword::ZoneY => sig(SysCall::ZoneY, 1, 1),
        Keyword::ZoneW => sig(SysCall::ZoneW, 1, 1),
        Keyword::ZoneH => sig(SysCall::ZoneH, 1, 1),
        Keyword::Inkey => sig(SysCall::Inkey, 0, 0),
        Keyword::KeyDown => sig(SysCall::KeyDown, 1, 2),
        Keyword::Fwait => sig(SysCall::FrameSleep, 1, 1),
        Keyword::Image => sig(SysCall::ImageExists, 1, 1),
        Keyword::Width => sig(SysCall::ImageWidth, 0, 1),
        Keyword::Height => sig(SysCall::ImageHeight, 0, 1),
        Keyword::Cols => sig(SysCall::ImageCols, 0, 1),
        Keyword::Rows => sig(SysCall::ImageRows, 0, 1),
        Keyword::Cells => sig(SysCall::ImageCells, 0, 1),
        Keyword::Pixel => sig_as(SysCall::GetPixel, 2, 3, FactorType::Array),
        Keyword::PixelI => sig(SysCall::GetPixelInt, 2, 3),
        Keyword::CreateImage => sig(SysCall::CreateImage, 2, 2),
        Keyword::CreateFont => sig(SysCall::CreateFont, 2, 6),
        Keyword::Font => sig(SysCall::FontExists, 1, 1),
        Keyword::Fwidth => sig(SysCall::FontWidth, 1, 2),
        Keyword::Fheight => sig(SysCall::FontHeight, 0, 1),
        Keyword::Clipboard => sig(SysCall::GetClipboard, 0, 0),
        Keyword::Sound => sig(SysCall::SoundExists, 1, 1),
        Keyword::Music => sig(SysCall::MusicExists, 1, 1),
        Keyword::LoadSound => sig(SysCall::LoadSound, 1, 1),
        Keyword::CreateSound => sig(SysCall::CreateSound, 3, 3),
        Keyword::LoadMusic => sig(SysCall::LoadMusic, 1, 1),
        Keyword::LoadFont => sig(SysCall::LoadFont, 1, 1),
        Keyword::Download => sig(SysCall::Download, 2, 2),
        _ => return None,
    };
    Some(sig)
}

/// Instruction-level functions: `(mnemonic, argc, register operands)`.
/// `argc` is the number of parenthesized arguments; `expected` tells how
/// many register operands the instruction takes (`abs @0` vs `num @0 @0`).
pub fn instr_builtin(kw: Keyword) -> Option<(&'static str, usize, usize)> {
    let entry = match kw {
        Keyword::ToNumber => ("num", 1, 2),
        Keyword::ToInteger => ("int", 1, 2),
        Keyword::SizeOf => ("size", 1, 2),
        Keyword::Len => ("len", 1, 2),
        Keyword::TypeOf => ("type", 1, 2),
        Keyword::Abs => ("abs", 1, 1),
        Keyword::Sgn => ("sgn", 1, 1),
        Keyword::Cos => ("cos", 1, 1),
        Keyword::Sin => ("sin", 1, 1),
        Keyword::Tan => ("tan", 1, 1),
        Keyword::Acos => ("acos", 1, 1),
        Keyword::Asin => ("asin", 1, 1),
        Keyword::Atan => ("atan", 1, 1),
        Keyword::Atan2 => ("atan2", 2, 2),
        Keyword::Sqr => ("sqr", 1, 1),
        Keyword::Pow => ("pow", 2, 2),
        Keyword::Floor => ("floor", 1, 1),
        Keyword::Ceil => ("ceil", 1, 1),
        Keyword::Round => ("round", 1, 1),
        Keyword::Rad => ("rad", 1, 1),
        Keyword::Deg => ("deg", 1, 1),
        Keyword::Min => ("min", 2, 2),
        Keyword::Max => ("max", 2, 2),
        Keyword::LoadFunction => ("fload", 1, 1),
        _ => return None,
    };
    Some(entry)
}

/// `free <keyword>(...)` releases a runtime resource.
pub fn free_command(kw: Keyword) -> Option<SysSig> {
    let sig = match kw {
        Keyword::Key => sig(SysCall::TblFreeKey, 2, 2),
        Keyword::Val => sig(SysCall::TblFreeValue, 2, 2),
        Keyword::File => sig(SysCall::FreeFile, 1, 1),
        Keyword::Image => sig(SysCall::FreeImage, 1, 1),
        Keyword::Font => sig(SysCall::FreeFont, 1, 1),
        Keyword::Zone => sig(SysCall::FreeZone, 1, 1),
        Keyword::Sound => sig(SysCall::FreeSound, 1, 1),
        Keyword::Music => sig(SysCall::FreeMusic, 1, 1),
        _ => return None,
    };
    Some(sig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_and_function_tables_disagree_where_they_should() {
        // `system "ls"` runs a command; `system("ls")` captures its output.
        assert_eq!(
            statement_command(Keyword::System).unwrap().call,
            SysCall::System
        );
        assert_eq!(
            function_builtin(Keyword::System).unwrap().call,
            SysCall::Capture
        );
    }

    #[test]
    fn rnd_accepts_zero_to_two_arguments() {
        let sig = function_builtin(Keyword::Rnd).unwrap();
        assert_eq!((sig.min, sig.max), (0, 2));
    }

    #[test]
    fn instruction_builtins_know_their_operand_shape() {
        assert_eq!(instr_builtin(Keyword::Abs), Some(("abs", 1, 1)));
        assert_eq!(instr_builtin(Keyword::ToInteger), Some(("int", 1, 2)));
        assert_eq!(instr_builtin(Keyword::Atan2), Some(("atan2", 2, 2)));
        assert_eq!(instr_builtin(Keyword::Pln), None);
    }
}
