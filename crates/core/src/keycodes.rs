//! Key code constants exposed to programs as `KEY_*`.
//!
//! The values follow the X11 keysym assignments so that bytecode compiled
//! on any host matches what the runtime's input layer reports.

pub const KC_TAB: i32 = 0xff09;
pub const KC_RETURN: i32 = 0xff0d;
pub const KC_SHIFT: i32 = 0xffe1;
pub const KC_CONTROL: i32 = 0xffe3;
pub const KC_MENU: i32 = 0xff67;
pub const KC_ESCAPE: i32 = 0xff1b;
pub const KC_SPACE: i32 = 0x0020;
pub const KC_PAGE_UP: i32 = 0xff55;
pub const KC_PAGE_DOWN: i32 = 0xff56;
pub const KC_END: i32 = 0xff57;
pub const KC_HOME: i32 = 0xff50;
pub const KC_LEFT: i32 = 0xff51;
pub const KC_UP: i32 = 0xff52;
pub const KC_RIGHT: i32 = 0xff53;
pub const KC_DOWN: i32 = 0xff54;
pub const KC_INSERT: i32 = 0xff63;
pub const KC_DELETE: i32 = 0xffff;
pub const KC_0: i32 = 0x0030;
pub const KC_1: i32 = 0x0031;
pub const KC_2: i32 = 0x0032;
pub const KC_3: i32 = 0x0033;
pub const KC_4: i32 = 0x0034;
pub const KC_5: i32 = 0x0035;
pub const KC_6: i32 = 0x0036;
pub const KC_7: i32 = 0x0037;
pub const KC_8: i32 = 0x0038;
pub const KC_9: i32 = 0x0039;
pub const KC_A: i32 = 0x0041;
pub const KC_B: i32 = 0x0042;
pub const KC_C: i32 = 0x0043;
pub const KC_D: i32 = 0x0044;
pub const KC_E: i32 = 0x0045;
pub const KC_F: i32 = 0x0046;
pub const KC_G: i32 = 0x0047;
pub const KC_H: i32 = 0x0048;
pub const KC_I: i32 = 0x0049;
pub const KC_J: i32 = 0x004a;
pub const KC_K: i32 = 0x004b;
pub const KC_L: i32 = 0x004c;
pub const KC_M: i32 = 0x004d;
pub const KC_N: i32 = 0x004e;
pub const KC_O: i32 = 0x004f;
pub const KC_P: i32 = 0x0050;
pub const KC_Q: i32 = 0x0051;
pub const KC_R: i32 = 0x0052;
pub const KC_S: i32 = 0x0053;
pub const KC_T: i32 = 0x0054;
pub const KC_U: i32 = 0x0055;
pub const KC_V: i32 = 0x0056;
pub const KC_W: i32 = 0x0057;
pub const KC_X: i32 = 0x0058;
pub const KC_Y: i32 = 0x0059;
pub const KC_Z: i32 = 0x005a;
pub const KC_MULTIPLY: i32 = 0xffaa;
pub const KC_ADD: i32 = 0xffab;
pub const KC_SEPARATOR: i32 = 0xffac;
pub const KC_SUBTRACT: i32 = 0xffad;
pub const KC_DIVIDE: i32 = 0xffaf;
pub const KC_F1: i32 = 0xffbe;
pub const KC_F2: i32 = 0xffbf;
pub const KC_F3: i32 = 0xffc0;
pub const KC_F4: i32 = 0xffc1;
pub const KC_F5: i32 = 0xffc2;
pub const KC_F6: i32 = 0xffc3;
pub const KC_F7: i32 = 0xffc4;
pub const KC_F8: i32 = 0xffc5;
pub const KC_F9: i32 = 0xffc6;
pub const KC_F10: i32 = 0xffc7;
pub const KC_F11: i32 = 0xffc8;
pub const KC_F12: i32 = 0xffc9;
