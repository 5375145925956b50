//! Preset memory.

use super::camera_command;
use crate::Command;

const MEMORY: u8 = 0x3f;

/// Highest preset index the engine will address. Some cameras hold far
/// fewer and answer with a not-executable error; that is the camera's
/// call.
pub const INDEX_MAX: u8 = 127;

/// Clears a stored preset.
pub fn reset(index: u8) -> Command {
    memory(0x00, index)
}

/// Stores the current position as a preset.
pub fn set(index: u8) -> Command {
    memory(0x01, index)
}

/// Drives to a stored preset.
pub fn recall(index: u8) -> Command {
    memory(0x02, index)
}

fn memory(action: u8, index: u8) -> Command {
    camera_command(&[MEMORY, action, index.min(INDEX_MAX)])
}
