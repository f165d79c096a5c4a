//! Reserved words and built-in constants.
//!
//! The keyword table maps every reserved word to its kind and, for built-in
//! constants (`true`, `PI`, the `KEY_*` codes, ...), to the literal value
//! the compiler emits wherever the word appears in an expression.

use n7_core::keycodes::*;
use n7_core::syscall::PRIMARY_IMAGE;
use n7_core::{VAR_LBL, VAR_NUM, VAR_STR, VAR_TBL, VAR_UNSET, VERSION_STRING};
use std::collections::HashMap;

/// Keyword kinds the grammar dispatches on. Words that only ever denote a
/// built-in constant share the `BuiltinConst` kind; their value lives in
/// the keyword entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    End,
    Gc,
    Assert,
    Include,
    Asm,
    EndAsm,
    And,
    Or,
    Xor,
    Not,
    If,
    Then,
    Else,
    ElseIf,
    EndIf,
    Select,
    Case,
    Default,
    EndSelect,
    While,
    Wend,
    Do,
    Loop,
    Until,
    For,
    To,
    Step,
    Next,
    Foreach,
    In,
    Break,
    ToString,
    ToNumber,
    ToInteger,
    SizeOf,
    Len,
    Free,
    Dim,
    Fill,
    Copy,
    Function,
    EndFunc,
    Return,
    Visible,
    Constant,
    TypeOf,
    Abs,
    Sgn,
    Cos,
    Sin,
    Tan,
    Acos,
    Asin,
    Atan,
    Atan2,
    Sqr,
    Pow,
    Floor,
    Ceil,
    Round,
    Rad,
    Deg,
    Min,
    Max,
    This,
    Pln,
    Rln,
    DateTime,
    Time,
    Clock,
    Wait,
    Fwait,
    Rnd,
    Randomize,
    System,
    Split,
    Left,
    Right,
    Mid,
    Instr,
    Replace,
    Lower,
    Upper,
    Chr,
    Asc,
    Key,
    Val,
    Clear,
    Insert,
    KeyOf,
    Set,
    Load,
    Save,
    Create,
    Open,
    OpenFileDialog,
    SaveFileDialog,
    Exists,
    Draw,
    Window,
    Active,
    Redraw,
    ScreenW,
    ScreenH,
    Mouse,
    MouseX,
    MouseY,
    MouseDx,
    MouseDy,
    MouseButton,
    JoyX,
    JoyY,
    JoyButton,
    Zone,
    CreateZone,
    ZoneX,
    ZoneY,
    ZoneW,
    ZoneH,
    Inkey,
    KeyDown,
    Color,
    ColorI,
    Additive,
    Clip,
    Pixel,
    PixelI,
    Line,
    Rect,
    Ellipse,
    Poly,
    Vraster,
    Hraster,
    Cls,
    Image,
    Font,
    File,
    OpenFile,
    CreateFile,
    Fread,
    Freadc,
    Frln,
    FileTell,
    FileSeek,
    Seek,
    Width,
    Height,
    Cols,
    Rows,
    Cells,
    ColorKey,
    Grid,
    LoadImage,
    CreateImage,
    LoadFont,
    Fwidth,
    Fheight,
    Write,
    Wln,
    Justification,
    Center,
    Caret,
    CreateFont,
    Scroll,
    Clipboard,
    Sound,
    LoadSound,
    CreateSound,
    Music,
    LoadMusic,
    Play,
    Stop,
    Volume,
    Download,
    Console,
    Transformed,
    LoadFunction,
    CallFunction,
    BuiltinConst,
}

/// Built-in constant value carried by some keywords.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Float(f64),
    Str(&'static str),
    Unset,
}

/// One keyword table entry.
#[derive(Debug, Clone)]
pub struct KeywordEntry {
    pub kind: Keyword,
    pub constant: Option<Constant>,
}

pub type KeywordTable = HashMap<&'static str, KeywordEntry>;

fn add(table: &mut KeywordTable, key: &'static str, kind: Keyword) {
    table.insert(
        key,
        KeywordEntry {
            kind,
            constant: None,
        },
    );
}

fn add_int(table: &mut KeywordTable, key: &'static str, value: i32) {
    table.insert(
        key,
        KeywordEntry {
            kind: Keyword::BuiltinConst,
            constant: Some(Constant::Int(value)),
        },
    );
}

fn add_float(table: &mut KeywordTable, key: &'static str, value: f64) {
    table.insert(
        key,
        KeywordEntry {
            kind: Keyword::BuiltinConst,
            constant: Some(Constant::Float(value)),
        },
    );
}

fn add_str(table: &mut KeywordTable, key: &'static str, value: &'static str) {
    table.insert(
        key,
        KeywordEntry {
            kind: Keyword::BuiltinConst,
            constant: Some(Constant::Str(value)),
        },
    );
}

fn add_unset(table: &mut KeywordTable, key: &'static str) {
    table.insert(
        key,
        KeywordEntry {
            kind: Keyword::BuiltinConst,
            constant: Some(Constant::Unset),
        },
    );
}

/// Build the keyword table.
pub fn keyword_table() -> KeywordTable {
    let mut t = KeywordTable::new();

    add(&mut t, "end", Keyword::End);
    add(&mut t, "gc", Keyword::Gc);
    add(&mut t, "assert", Keyword::Assert);
    add(&mut t, "include", Keyword::Include);
    add(&mut t, "asm", Keyword::Asm);
    add(&mut t, "endasm", Keyword::EndAsm);
    add(&mut t, "and", Keyword::And);
    add(&mut t, "or", Keyword::Or);
    add(&mut t, "xor", Keyword::Xor);
    add(&mut t, "not", Keyword::Not);
    add(&mut t, "if", Keyword::If);
    add(&mut t, "then", Keyword::Then);
    add(&mut t, "else", Keyword::Else);
    add(&mut t, "elseif", Keyword::ElseIf);
    add(&mut t, "endif", Keyword::EndIf);
    add(&mut t, "select", Keyword::Select);
    add(&mut t, "case", Keyword::Case);
    add(&mut t, "default", Keyword::Default);
    add(&mut t, "endsel", Keyword::EndSelect);
    add(&mut t, "while", Keyword::While);
    add(&mut t, "wend", Keyword::Wend);
    add(&mut t, "do", Keyword::Do);
    add(&mut t, "loop", Keyword::Loop);
    add(&mut t, "until", Keyword::Until);
    add(&mut t, "for", Keyword::For);
    add(&mut t, "to", Keyword::To);
    add(&mut t, "step", Keyword::Step);
    add(&mut t, "next", Keyword::Next);
    add(&mut t, "foreach", Keyword::Foreach);
    add(&mut t, "in", Keyword::In);
    add(&mut t, "break", Keyword::Break);
    add(&mut t, "visible", Keyword::Visible);
    add(&mut t, "constant", Keyword::Constant);
    // Instruction level functions.
    add(&mut t, "str", Keyword::ToString);
    add(&mut t, "float", Keyword::ToNumber);
    add(&mut t, "int", Keyword::ToInteger);
    add(&mut t, "sizeof", Keyword::SizeOf);
    add(&mut t, "len", Keyword::Len);
    add(&mut t, "free", Keyword::Free);
    add(&mut t, "dim", Keyword::Dim);
    add(&mut t, "fill", Keyword::Fill);
    add(&mut t, "copy", Keyword::Copy);
    add(&mut t, "function", Keyword::Function);
    add(&mut t, "endfunc", Keyword::EndFunc);
    add(&mut t, "return", Keyword::Return);
    add(&mut t, "typeof", Keyword::TypeOf);
    add(&mut t, "abs", Keyword::Abs);
    add(&mut t, "sgn", Keyword::Sgn);
    add(&mut t, "cos", Keyword::Cos);
    add(&mut t, "sin", Keyword::Sin);
    add(&mut t, "tan", Keyword::Tan);
    add(&mut t, "acos", Keyword::Acos);
    add(&mut t, "asin", Keyword::Asin);
    add(&mut t, "atan", Keyword::Atan);
    add(&mut t, "atan2", Keyword::Atan2);
    add(&mut t, "sqr", Keyword::Sqr);
    add(&mut t, "pow", Keyword::Pow);
    add(&mut t, "floor", Keyword::Floor);
    add(&mut t, "ceil", Keyword::Ceil);
    add(&mut t, "round", Keyword::Round);
    add(&mut t, "rad", Keyword::Rad);
    add(&mut t, "deg", Keyword::Deg);
    add(&mut t, "min", Keyword::Min);
    add(&mut t, "max", Keyword::Max);
    // Specials.
    add(&mut t, "this", Keyword::This);
    // System commands.
    add(&mut t, "pln", Keyword::Pln);
    add(&mut t, "rln", Keyword::Rln);
    add(&mut t, "datetime", Keyword::DateTime);
    add(&mut t, "time", Keyword::Time);
    add(&mut t, "clock", Keyword::Clock);
    add(&mut t, "wait", Keyword::Wait);
    add(&mut t, "fwait", Keyword::Fwait);
    add(&mut t, "rnd", Keyword::Rnd);
    add(&mut t, "randomize", Keyword::Randomize);
    add(&mut t, "system", Keyword::System);
    add(&mut t, "split", Keyword::Split);
    add(&mut t, "left", Keyword::Left);
    add(&mut t, "right", Keyword::Right);
    add(&mut t, "mid", Keyword::Mid);
    add(&mut t, "instr", Keyword::Instr);
    add(&mut t, "replace", Keyword::Replace);
    add(&mut t, "lower", Keyword::Lower);
    add(&mut t, "upper", Keyword::Upper);
    add(&mut t, "chr", Keyword::Chr);
    add(&mut t, "asc", Keyword::Asc);
    add(&mut t, "key", Keyword::Key);
    add(&mut t, "val", Keyword::Val);
    add(&mut t, "clear", Keyword::Clear);
    add(&mut t, "insert", Keyword::Insert);
    add(&mut t, "keyof", Keyword::KeyOf);

    add(&mut t, "set", Keyword::Set);
    add(&mut t, "load", Keyword::Load);
    add(&mut t, "save", Keyword::Save);
    add(&mut t, "create", Keyword::Create);
    add(&mut t, "open", Keyword::Open);

    add(&mut t, "draw", Keyword::Draw);
    add(&mut t, "window", Keyword::Window);
    add(&mut t, "active", Keyword::Active);
    add(&mut t, "redraw", Keyword::Redraw);
    add(&mut t, "screenw", Keyword::ScreenW);
    add(&mut t, "screenh", Keyword::ScreenH);
    add(&mut t, "mouse", Keyword::Mouse);
    add(&mut t, "mousex", Keyword::MouseX);
    add(&mut t, "mousey", Keyword::MouseY);
    add(&mut t, "mouserelx", Keyword::MouseDx);
    add(&mut t, "mouserely", Keyword::MouseDy);
    add(&mut t, "mousebutton", Keyword::MouseButton);
    add(&mut t, "joyx", Keyword::JoyX);
    add(&mut t, "joyy", Keyword::JoyY);
    add(&mut t, "joybutton", Keyword::JoyButton);
    add(&mut t, "zone", Keyword::Zone);
    add(&mut t, "createzone", Keyword::CreateZone);
    add(&mut t, "zonex", Keyword::ZoneX);
    add(&mut t, "zoney", Keyword::ZoneY);
    add(&mut t, "zonew", Keyword::ZoneW);
    add(&mut t, "zoneh", Keyword::ZoneH);
    add(&mut t, "inkey", Keyword::Inkey);
    add(&mut t, "keydown", Keyword::KeyDown);
    add(&mut t, "color", Keyword::Color);
    add(&mut t, "colori", Keyword::ColorI);
    add(&mut t, "additive", Keyword::Additive);
    add(&mut t, "clip", Keyword::Clip);
    add(&mut t, "pixel", Keyword::Pixel);
    add(&mut t, "pixeli", Keyword::PixelI);
    add(&mut t, "line", Keyword::Line);
    add(&mut t, "rect", Keyword::Rect);
    add(&mut t, "ellipse", Keyword::Ellipse);
    add(&mut t, "poly", Keyword::Poly);
    add(&mut t, "vraster", Keyword::Vraster);
    add(&mut t, "hraster", Keyword::Hraster);
    add(&mut t, "cls", Keyword::Cls);
    add(&mut t, "image", Keyword::Image);
    add(&mut t, "font", Keyword::Font);
    add(&mut t, "file", Keyword::File);
    add(&mut t, "openfile", Keyword::OpenFile);
    add(&mut t, "createfile", Keyword::CreateFile);
    add(&mut t, "openfiledialog", Keyword::OpenFileDialog);
    add(&mut t, "savefiledialog", Keyword::SaveFileDialog);
    add(&mut t, "exists", Keyword::Exists);
    add(&mut t, "fread", Keyword::Fread);
    add(&mut t, "freadc", Keyword::Freadc);
    add(&mut t, "frln", Keyword::Frln);
    add(&mut t, "filetell", Keyword::FileTell);
    add(&mut t, "fileseek", Keyword::FileSeek);
    add(&mut t, "seek", Keyword::Seek);

    add(&mut t, "width", Keyword::Width);
    add(&mut t, "height", Keyword::Height);
    add(&mut t, "cols", Keyword::Cols);
    add(&mut t, "rows", Keyword::Rows);
    add(&mut t, "cels", Keyword::Cells);
    add(&mut t, "colorkey", Keyword::ColorKey);
    add(&mut t, "grid", Keyword::Grid);
    add(&mut t, "loadimage", Keyword::LoadImage);
    add(&mut t, "createimage", Keyword::CreateImage);
    add(&mut t, "loadfont", Keyword::LoadFont);
    add(&mut t, "fwidth", Keyword::Fwidth);
    add(&mut t, "fheight", Keyword::Fheight);
    add(&mut t, "write", Keyword::Write);
    add(&mut t, "wln", Keyword::Wln);
    add(&mut t, "justification", Keyword::Justification);
    add(&mut t, "center", Keyword::Center);
    add(&mut t, "caret", Keyword::Caret);
    add(&mut t, "createfont", Keyword::CreateFont);
    add(&mut t, "scroll", Keyword::Scroll);
    add(&mut t, "clipboard", Keyword::Clipboard);
    add(&mut t, "download", Keyword::Download);
    add(&mut t, "console", Keyword::Console);
    add(&mut t, "xform", Keyword::Transformed);

    add(&mut t, "sound", Keyword::Sound);
    add(&mut t, "loadsound", Keyword::LoadSound);
    add(&mut t, "createsound", Keyword::CreateSound);
    add(&mut t, "music", Keyword::Music);
    add(&mut t, "loadmusic", Keyword::LoadMusic);
    add(&mut t, "play", Keyword::Play);
    add(&mut t, "stop", Keyword::Stop);
    add(&mut t, "volume", Keyword::Volume);

    // External C functions.
    add(&mut t, "LOAD_FUNCTION", Keyword::LoadFunction);
    add(&mut t, "CALL", Keyword::CallFunction);

    // Constants.
    add_str(&mut t, "VERSION", VERSION_STRING);
    add_unset(&mut t, "unset");
    add_int(&mut t, "true", 1);
    add_int(&mut t, "false", 0);
    add_int(&mut t, "on", 1);
    add_int(&mut t, "off", 0);
    add_int(&mut t, "TYPE_NUMBER", VAR_NUM);
    add_int(&mut t, "TYPE_STRING", VAR_STR);
    add_int(&mut t, "TYPE_FUNCTION", VAR_LBL);
    add_int(&mut t, "TYPE_TABLE", VAR_TBL);
    add_int(&mut t, "TYPE_UNSET", VAR_UNSET);
    add_int(&mut t, "primary", PRIMARY_IMAGE);
    add_int(&mut t, "SEEK_SET", 0);
    add_int(&mut t, "SEEK_CUR", 1);
    add_int(&mut t, "SEEK_END", 2);
    add_float(&mut t, "PI", 3.141592653589);
    add_int(&mut t, "KEY_TAB", KC_TAB);
    add_int(&mut t, "KEY_RETURN", KC_RETURN);
    add_int(&mut t, "KEY_SHIFT", KC_SHIFT);
    add_int(&mut t, "KEY_CONTROL", KC_CONTROL);
    add_int(&mut t, "KEY_MENU", KC_MENU);
    add_int(&mut t, "KEY_ESCAPE", KC_ESCAPE);
    add_int(&mut t, "KEY_SPACE", KC_SPACE);
    add_int(&mut t, "KEY_PAGE_UP", KC_PAGE_UP);
    add_int(&mut t, "KEY_PAGE_DOWN", KC_PAGE_DOWN);
    add_int(&mut t, "KEY_END", KC_END);
    add_int(&mut t, "KEY_HOME", KC_HOME);
    add_int(&mut t, "KEY_LEFT", KC_LEFT);
    add_int(&mut t, "KEY_UP", KC_UP);
    add_int(&mut t, "KEY_RIGHT", KC_RIGHT);
    add_int(&mut t, "KEY_DOWN", KC_DOWN);
    add_int(&mut t, "KEY_INSERT", KC_INSERT);
    add_int(&mut t, "KEY_DELETE", KC_DELETE);
    add_int(&mut t, "KEY_0", KC_0);
    add_int(&mut t, "KEY_1", KC_1);
    add_int(&mut t, "KEY_2", KC_2);
    add_int(&mut t, "KEY_3", KC_3);
    add_int(&mut t, "KEY_4", KC_4);
    add_int(&mut t, "KEY_5", KC_5);
    add_int(&mut t, "KEY_6", KC_6);
    add_int(&mut t, "KEY_7", KC_7);
    add_int(&mut t, "KEY_8", KC_8);
    add_int(&mut t, "KEY_9", KC_9);
    add_int(&mut t, "KEY_A", KC_A);
    add_int(&mut t, "KEY_B", KC_B);
    add_int(&mut t, "KEY_C", KC_C);
    add_int(&mut t, "KEY_D", KC_D);
    add_int(&mut t, "KEY_E", KC_E);
    add_int(&mut t, "KEY_F", KC_F);
    add_int(&mut t, "KEY_G", KC_G);
    add_int(&mut t, "KEY_H", KC_H);
    add_int(&mut t, "KEY_I", KC_I);
    add_int(&mut t, "KEY_J", KC_J);
    add_int(&mut t, "KEY_K", KC_K);
    add_int(&mut t, "KEY_L", KC_L);
    add_int(&mut t, "KEY_M", KC_M);
    add_int(&mut t, "KEY_N", KC_N);
    add_int(&mut t, "KEY_O", KC_O);
    add_int(&mut t, "KEY_P", KC_P);
    add_int(&mut t, "KEY_Q", KC_Q);
    add_int(&mut t, "KEY_R", KC_R);
    add_int(&mut t, "KEY_S", KC_S);
    add_int(&mut t, "KEY_T", KC_T);
    add_int(&mut t, "KEY_U", KC_U);
    add_int(&mut t, "KEY_V", KC_V);
    add_int(&mut t, "KEY_W", KC_W);
    add_int(&mut t, "KEY_X", KC_X);
    add_int(&mut t, "KEY_Y", KC_Y);
    add_int(&mut t, "KEY_Z", KC_Z);
    add_int(&mut t, "KEY_MULTIPLY", KC_MULTIPLY);
    add_int(&mut t, "KEY_ADD", KC_ADD);
    add_int(&mut t, "KEY_SEPARATOR", KC_SEPARATOR);
    add_int(&mut t, "KEY_SUBTRACT", KC_SUBTRACT);
    add_int(&mut t, "KEY_DIVIDE", KC_DIVIDE);
    add_int(&mut t, "KEY_F1", KC_F1);
    add_int(&mut t, "KEY_F2", KC_F2);
    add_int(&mut t, "KEY_F3", KC_F3);
    add_int(&mut t, "KEY_F4", KC_F4);
    add_int(&mut t, "KEY_F5", KC_F5);
    add_int(&mut t, "KEY_F6", KC_F6);
    add_int(&mut t, "KEY_F7", KC_F7);
    add_int(&mut t, "KEY_F8", KC_F8);
    add_int(&mut t, "KEY_F9", KC_F9);
    add_int(&mut t, "KEY_F10", KC_F10);
    add_int(&mut t, "KEY_F11", KC_F11);
    add_int(&mut t, "KEY_F12", KC_F12);

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_resolve() {
        let table = keyword_table();
        assert_eq!(table["foreach"].kind, Keyword::Foreach);
        assert_eq!(table["endsel"].kind, Keyword::EndSelect);
        assert_eq!(table["cels"].kind, Keyword::Cells);
        assert!(table.get("notakeyword").is_none());
    }

    #[test]
    fn constants_carry_values() {
        let table = keyword_table();
        assert_eq!(table["true"].constant, Some(Constant::Int(1)));
        assert_eq!(table["unset"].constant, Some(Constant::Unset));
        assert!(matches!(table["PI"].constant, Some(Constant::Float(_))));
        assert_eq!(
            table["VERSION"].constant,
            Some(Constant::Str(VERSION_STRING))
        );
        // Words with grammar meaning carry no constant.
        assert_eq!(table["if"].constant, None);
    }
}
