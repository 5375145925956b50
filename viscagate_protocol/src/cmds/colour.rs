//! Colour control: white balance, chroma suppression, colour gain and hue.

use super::{camera_command, camera_inquiry};
use crate::{Command, InquiryKind};

const ONE_PUSH_TRIGGER: u8 = 0x10;
const WHITE_BALANCE: u8 = 0x35;
const COLOUR_GAIN: u8 = 0x49;
const HUE: u8 = 0x4f;
const CHROMA_SUPPRESS: u8 = 0x5f;

/// Strongest chroma suppression level.
pub const CHROMA_SUPPRESS_MAX: u8 = 3;
/// Top of the colour gain and hue adjustment ranges.
pub const LEVEL_MAX: u8 = 14;

/// White balance operating mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WhiteBalanceMode {
    #[default]
    Auto = 0x00,
    Indoor = 0x01,
    Outdoor = 0x02,
    OnePush = 0x03,
    Atw = 0x04,
    Manual = 0x05,
}

pub fn white_balance(mode: WhiteBalanceMode) -> Command {
    camera_command(&[WHITE_BALANCE, mode as u8])
}

/// Runs a one-push white balance measurement.
pub fn one_push_trigger() -> Command {
    camera_command(&[ONE_PUSH_TRIGGER, 0x05])
}

/// Suppresses chroma in low light, level 0 (off) to 3.
pub fn chroma_suppress(level: u8) -> Command {
    camera_command(&[CHROMA_SUPPRESS, level.min(CHROMA_SUPPRESS_MAX)])
}

/// Colour saturation, 0 (60%) to 14 (200%).
pub fn gain(level: u8) -> Command {
    camera_command(&[COLOUR_GAIN, 0x00, 0x00, 0x00, level.min(LEVEL_MAX)])
}

/// Colour phase, 0 (−14°) to 14 (+14°); 7 is neutral.
pub fn hue(level: u8) -> Command {
    camera_command(&[HUE, 0x00, 0x00, 0x00, level.min(LEVEL_MAX)])
}

pub fn white_balance_inquiry() -> Command {
    camera_inquiry(&[WHITE_BALANCE], InquiryKind::WhiteBalance)
}

pub fn chroma_suppress_inquiry() -> Command {
    camera_inquiry(&[CHROMA_SUPPRESS], InquiryKind::ChromaSuppress)
}

pub fn gain_inquiry() -> Command {
    camera_inquiry(&[COLOUR_GAIN], InquiryKind::ColourGain)
}

pub fn hue_inquiry() -> Command {
    camera_inquiry(&[HUE], InquiryKind::Hue)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn white_balance_frames() -> Result {
        assert_eq!(
            hex::decode("8101043502ff")?,
            white_balance(WhiteBalanceMode::Outdoor).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101041005ff")?,
            one_push_trigger().addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("81090435ff")?,
            white_balance_inquiry().addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn levels_clamp() -> Result {
        assert_eq!(hex::decode("8101045f03ff")?, chroma_suppress(9).addressed_to(1).to_bytes());
        assert_eq!(
            hex::decode("810104490000000eff")?,
            gain(99).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101044f00000007ff")?,
            hue(7).addressed_to(1).to_bytes()
        );
        Ok(())
    }
}
