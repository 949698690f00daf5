//! BGAPI command/event classes.
//!
//! The category byte routes a frame to a subsystem; the subtype byte picks
//! the command or event within it.

pub const SYSTEM: u8 = 0;
/// Persistent store and flash.
pub const FLASH: u8 = 1;
/// Local GATT database.
pub const ATTRIBUTES: u8 = 2;
pub const CONNECTION: u8 = 3;
/// GATT client procedures.
pub const ATTCLIENT: u8 = 4;
/// Security manager.
pub const SM: u8 = 5;
/// Discovery and advertising.
pub const GAP: u8 = 6;
pub const HARDWARE: u8 = 7;
/// Radio test modes (commands only).
pub const TEST: u8 = 8;

/// Returns a human-readable name for a category byte.
pub fn category_name(id: u8) -> &'static str {
    match id {
        SYSTEM => "system",
        FLASH => "flash",
        ATTRIBUTES => "attributes",
        CONNECTION => "connection",
        ATTCLIENT => "attclient",
        SM => "sm",
        GAP => "gap",
        HARDWARE => "hardware",
        TEST => "test",
        _ => "unknown",
    }
}
