//! Windows Virtual Key (VK) code name table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//! Windows VK codes range from 0x00 to 0xFF.
//!
//! # How this table works
//!
//! `VK_NAME_TABLE` is a compile-time constant array of 256 optional names,
//! indexed by VK code.  Position 0x41 holds `"A"` because Windows VK_A is
//! 0x41.  Any VK code without a display name stores `None`.
//!
//! The editor uses these names to render combos such as `CTRL + SHIFT + F5`;
//! the engine uses them only for log output.

/// Returns the display name of a Windows VK code, if it has one.
pub fn vk_name(vk: u8) -> Option<&'static str> {
    VK_NAME_TABLE[vk as usize]
}

/// Returns the base modifier name (`"SHIFT"`, `"CTRL"`, `"ALT"`) for generic
/// and sided modifier codes.
pub fn modifier_group(code: u32) -> Option<&'static str> {
    match code {
        0x10 | 0xA0 | 0xA1 => Some("SHIFT"),
        0x11 | 0xA2 | 0xA3 => Some("CTRL"),
        0x12 | 0xA4 | 0xA5 => Some("ALT"),
        _ => None,
    }
}

/// Complete VK → display name table indexed by VK code (0x00–0xFF).
///
/// Reference: https://learn.microsoft.com/windows/win32/inputdev/virtual-key-codes
const VK_NAME_TABLE: [Option<&'static str>; 256] = {
    let mut t: [Option<&'static str>; 256] = [None; 256];

    // ── Modifier keys ─────────────────────────────────────────────────────────
    t[0x10] = Some("SHIFT");
    t[0x11] = Some("CTRL");
    t[0x12] = Some("ALT");
    t[0xA0] = Some("LEFT SHIFT");
    t[0xA1] = Some("RIGHT SHIFT");
    t[0xA2] = Some("LEFT CTRL");
    t[0xA3] = Some("RIGHT CTRL");
    t[0xA4] = Some("LEFT ALT");
    t[0xA5] = Some("RIGHT ALT");
    t[0x5B] = Some("WIN");
    t[0x5D] = Some("MENU");

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    t[0x70] = Some("F1");
    t[0x71] = Some("F2");
    t[0x72] = Some("F3");
    t[0x73] = Some("F4");
    t[0x74] = Some("F5");
    t[0x75] = Some("F6");
    t[0x76] = Some("F7");
    t[0x77] = Some("F8");
    t[0x78] = Some("F9");
    t[0x79] = Some("F10");
    t[0x7A] = Some("F11");
    t[0x7B] = Some("F12");

    // ── Control keys ──────────────────────────────────────────────────────────
    t[0x1B] = Some("ESCAPE");
    t[0x09] = Some("TAB");
    t[0x14] = Some("CAPS LOCK");
    t[0x91] = Some("SCROLL LOCK");
    t[0x90] = Some("NUM LOCK");
    t[0x08] = Some("BACKSPACE");
    t[0x0D] = Some("ENTER");
    t[0x20] = Some("SPACE");
    t[0x21] = Some("PAGE UP");
    t[0x22] = Some("PAGE DOWN");
    t[0x23] = Some("END");
    t[0x24] = Some("HOME");
    t[0x2D] = Some("INSERT");
    t[0x2E] = Some("DELETE");
    t[0x2C] = Some("PRINT SCREEN");
    t[0x13] = Some("PAUSE BREAK");

    // ── Arrows ────────────────────────────────────────────────────────────────
    t[0x25] = Some("LEFT");
    t[0x26] = Some("UP");
    t[0x27] = Some("RIGHT");
    t[0x28] = Some("DOWN");

    // ── Digits (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────────
    t[0x30] = Some("0");
    t[0x31] = Some("1");
    t[0x32] = Some("2");
    t[0x33] = Some("3");
    t[0x34] = Some("4");
    t[0x35] = Some("5");
    t[0x36] = Some("6");
    t[0x37] = Some("7");
    t[0x38] = Some("8");
    t[0x39] = Some("9");

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    t[0x41] = Some("A");
    t[0x42] = Some("B");
    t[0x43] = Some("C");
    t[0x44] = Some("D");
    t[0x45] = Some("E");
    t[0x46] = Some("F");
    t[0x47] = Some("G");
    t[0x48] = Some("H");
    t[0x49] = Some("I");
    t[0x4A] = Some("J");
    t[0x4B] = Some("K");
    t[0x4C] = Some("L");
    t[0x4D] = Some("M");
    t[0x4E] = Some("N");
    t[0x4F] = Some("O");
    t[0x50] = Some("P");
    t[0x51] = Some("Q");
    t[0x52] = Some("R");
    t[0x53] = Some("S");
    t[0x54] = Some("T");
    t[0x55] = Some("U");
    t[0x56] = Some("V");
    t[0x57] = Some("W");
    t[0x58] = Some("X");
    t[0x59] = Some("Y");
    t[0x5A] = Some("Z");

    // ── Numpad (VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69) ───────────────────────────
    t[0x60] = Some("NUMPAD0");
    t[0x61] = Some("NUMPAD1");
    t[0x62] = Some("NUMPAD2");
    t[0x63] = Some("NUMPAD3");
    t[0x64] = Some("NUMPAD4");
    t[0x65] = Some("NUMPAD5");
    t[0x66] = Some("NUMPAD6");
    t[0x67] = Some("NUMPAD7");
    t[0x68] = Some("NUMPAD8");
    t[0x69] = Some("NUMPAD9");
    t[0x6A] = Some("MULTIPLY");
    t[0x6B] = Some("ADD");
    t[0x6D] = Some("SUBTRACT");
    t[0x6E] = Some("DECIMAL");
    t[0x6F] = Some("DIVIDE");

    // ── Punctuation / symbols ─────────────────────────────────────────────────
    t[0xBA] = Some("SEMICOLON");     // VK_OEM_1      (; :)
    t[0xBB] = Some("EQUALS");        // VK_OEM_PLUS   (= +)
    t[0xBC] = Some("COMMA");         // VK_OEM_COMMA  (, <)
    t[0xBD] = Some("MINUS");         // VK_OEM_MINUS  (- _)
    t[0xBE] = Some("PERIOD");        // VK_OEM_PERIOD (. >)
    t[0xBF] = Some("SLASH");         // VK_OEM_2      (/ ?)
    t[0xC0] = Some("BACKQUOTE");     // VK_OEM_3      (` ~)
    t[0xDB] = Some("BRACKET LEFT");  // VK_OEM_4      ([ {)
    t[0xDC] = Some("BACKSLASH");     // VK_OEM_5      (\ |)
    t[0xDD] = Some("BRACKET RIGHT"); // VK_OEM_6      (] })
    t[0xDE] = Some("QUOTE");         // VK_OEM_7      (' ")

    // ── Media keys ────────────────────────────────────────────────────────────
    t[0xAD] = Some("VOLUME MUTE");
    t[0xAE] = Some("VOLUME DOWN");
    t[0xAF] = Some("VOLUME UP");
    t[0xB0] = Some("MEDIA NEXT");
    t[0xB1] = Some("MEDIA PREV");
    t[0xB2] = Some("MEDIA STOP");
    t[0xB3] = Some("MEDIA PLAY PAUSE");

    t
};
