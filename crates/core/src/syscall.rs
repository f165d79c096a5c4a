//! System call selectors.
//!
//! A `sys <selector> <arity>` instruction escapes from the virtual machine
//! into a host service. The compiler lowers built-in commands and functions
//! to these selectors; the runtime dispatches on them. The numeric values
//! are part of the compiler/runtime contract and must not be reordered.

/// Image id of the primary render target, exposed to programs as the
/// `primary` constant.
pub const PRIMARY_IMAGE: i32 = 0;

/// Host services reachable through the `sys` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SysCall {
    // Console and process.
    Pln = 0,
    ReadLine = 1,
    Write = 2,
    WriteLine = 3,
    Center = 4,
    SetCaret = 5,
    Console = 6,
    System = 7,
    Capture = 8,
    Sleep = 9,
    FrameSleep = 10,
    // Time and randomness.
    Randomize = 11,
    Rnd = 12,
    Clock = 13,
    Time = 14,
    DateTime = 15,
    // Strings.
    Str = 16,
    SplitStr = 17,
    LeftStr = 18,
    RightStr = 19,
    MidStr = 20,
    InStr = 21,
    ReplaceStr = 22,
    LowerStr = 23,
    UpperStr = 24,
    Chr = 25,
    Asc = 26,
    // Tables.
    TblHasKey = 27,
    TblHasValue = 28,
    TblKeyOf = 29,
    TblInsert = 30,
    TblClear = 31,
    TblFreeKey = 32,
    TblFreeValue = 33,
    // Files.
    FileExists = 34,
    CheckFileExists = 35,
    OpenFile = 36,
    CreateFile = 37,
    OpenFileLegacy = 38,
    CreateFileLegacy = 39,
    FreeFile = 40,
    FileRead = 41,
    FileReadChar = 42,
    FileReadLine = 43,
    FileWrite = 44,
    FileWriteLine = 45,
    FileTell = 46,
    FileSeek = 47,
    OpenFileDialog = 48,
    SaveFileDialog = 49,
    Download = 50,
    // Window.
    SetWindow = 51,
    WinExists = 52,
    WinActive = 53,
    WinRedraw = 54,
    SetRedraw = 55,
    ScreenW = 56,
    ScreenH = 57,
    // Input.
    SetMouse = 58,
    MouseX = 59,
    MouseY = 60,
    MouseDx = 61,
    MouseDy = 62,
    MouseDown = 63,
    JoyX = 64,
    JoyY = 65,
    JoyButton = 66,
    Inkey = 67,
    KeyDown = 68,
    GetClipboard = 69,
    SetClipboard = 70,
    // Zones.
    CreateZone = 71,
    CreateZoneLegacy = 72,
    FreeZone = 73,
    Zone = 74,
    ZoneX = 75,
    ZoneY = 76,
    ZoneW = 77,
    ZoneH = 78,
    // Drawing state.
    SetColor = 79,
    SetColorInt = 80,
    SetAdditive = 81,
    SetPixel = 82,
    GetPixel = 83,
    GetPixelInt = 84,
    SetImageClipRect = 85,
    ClearImageClipRect = 86,
    Cls = 87,
    Scroll = 88,
    // Drawing primitives.
    DrawPixel = 89,
    DrawLine = 90,
    DrawRect = 91,
    DrawEllipse = 92,
    DrawPolygon = 93,
    DrawPolygonTransformed = 94,
    DrawPolygonImage = 95,
    DrawPolygonImageTransformed = 96,
    DrawVraster = 97,
    DrawHraster = 98,
    DrawImage = 99,
    DrawImageTransformed = 100,
    // Images.
    SetImage = 101,
    SetImageColorKey = 102,
    SetImageGrid = 103,
    LoadImage = 104,
    LoadImageLegacy = 105,
    CreateImage = 106,
    CreateImageLegacy = 107,
    SaveImage = 108,
    FreeImage = 109,
    ImageExists = 110,
    ImageWidth = 111,
    ImageHeight = 112,
    ImageCols = 113,
    ImageRows = 114,
    ImageCells = 115,
    // Fonts.
    SetFont = 116,
    SetJustification = 117,
    LoadFont = 118,
    LoadFontLegacy = 119,
    CreateFont = 120,
    CreateFontLegacy = 121,
    SaveFont = 122,
    FreeFont = 123,
    FontExists = 124,
    FontWidth = 125,
    FontHeight = 126,
    // Sound and music.
    LoadSound = 127,
    LoadSoundLegacy = 128,
    CreateSound = 129,
    CreateSoundLegacy = 130,
    FreeSound = 131,
    SoundExists = 132,
    PlaySound = 133,
    LoadMusic = 134,
    LoadMusicLegacy = 135,
    FreeMusic = 136,
    MusicExists = 137,
    PlayMusic = 138,
    StopMusic = 139,
    SetMusicVolume = 140,
}

impl SysCall {
    /// Numeric selector emitted into `sys` instructions.
    pub fn selector(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_stable() {
        assert_eq!(SysCall::Pln.selector(), 0);
        assert_eq!(SysCall::Rnd.selector(), 12);
        assert_eq!(SysCall::SetMusicVolume.selector(), 140);
    }
}
