//! Focus control.

use super::{camera_command, camera_inquiry, on_off};
use crate::{nibbles, AfMode, Command, InquiryKind};

const IR_CORRECTION: u8 = 0x11;
const FOCUS_ONE_PUSH: u8 = 0x18;
const AF_INTERVAL: u8 = 0x27;
const NEAR_LIMIT: u8 = 0x28;
const FOCUS_AUTO: u8 = 0x38;
const FOCUS: u8 = 0x08;
const FOCUS_DIRECT: u8 = 0x48;
const AF_MODE: u8 = 0x57;
const AF_SENSITIVITY: u8 = 0x58;

/// Farthest focus position the protocol can express.
pub const POSITION_LIMIT: u16 = 0xf000;
/// Fastest variable focus speed.
pub const SPEED_MAX: u8 = 7;

/// Stops any in-progress focus movement.
pub fn stop() -> Command {
    camera_command(&[FOCUS, 0x00])
}

pub fn far() -> Command {
    camera_command(&[FOCUS, 0x02])
}

pub fn near() -> Command {
    camera_command(&[FOCUS, 0x03])
}

/// Focuses farther at a variable speed, 0 (slow) to 7 (fast).
pub fn far_speed(speed: u8) -> Command {
    camera_command(&[FOCUS, 0x20 | speed.min(SPEED_MAX)])
}

/// Focuses nearer at a variable speed, 0 (slow) to 7 (fast).
pub fn near_speed(speed: u8) -> Command {
    camera_command(&[FOCUS, 0x30 | speed.min(SPEED_MAX)])
}

/// Moves the focus to an absolute position.
pub fn direct(position: u16) -> Command {
    let mut body = vec![FOCUS_DIRECT];
    body.extend_from_slice(&nibbles::encode_u16(position.min(POSITION_LIMIT)));
    camera_command(&body)
}

/// Switches between autofocus and manual focus.
pub fn auto(on: bool) -> Command {
    camera_command(&[FOCUS_AUTO, on_off(on)])
}

/// Toggles between autofocus and manual focus.
pub fn auto_toggle() -> Command {
    camera_command(&[FOCUS_AUTO, 0x10])
}

/// One-push autofocus trigger while in manual mode.
pub fn trigger() -> Command {
    camera_command(&[FOCUS_ONE_PUSH, 0x01])
}

/// Forces focus to infinity.
pub fn infinity() -> Command {
    camera_command(&[FOCUS_ONE_PUSH, 0x02])
}

/// Sets the near focus limit. The low byte of the position is always
/// zero on the wire.
pub fn near_limit(position: u16) -> Command {
    let mut body = vec![NEAR_LIMIT];
    body.extend_from_slice(&nibbles::encode_u16(position & 0xff00));
    camera_command(&body)
}

/// Selects low (`true`) or normal autofocus sensitivity.
pub fn sensitivity_low(low: bool) -> Command {
    camera_command(&[AF_SENSITIVITY, if low { 0x03 } else { 0x02 }])
}

/// Selects the autofocus operating mode.
pub fn af_mode(mode: AfMode) -> Command {
    camera_command(&[AF_MODE, mode as u8])
}

/// Sets interval-mode autofocus timing: seconds spent focusing, and
/// seconds between runs.
pub fn af_interval(movement: u8, interval: u8) -> Command {
    let mut body = vec![AF_INTERVAL];
    body.extend_from_slice(&nibbles::encode_u8(movement));
    body.extend_from_slice(&nibbles::encode_u8(interval));
    camera_command(&body)
}

/// Switches the focus model between standard and IR light.
pub fn ir_correction(ir: bool) -> Command {
    camera_command(&[IR_CORRECTION, u8::from(ir)])
}

pub fn mode_inquiry() -> Command {
    camera_inquiry(&[FOCUS_AUTO], InquiryKind::FocusMode)
}

pub fn position_inquiry() -> Command {
    camera_inquiry(&[FOCUS_DIRECT], InquiryKind::Focus)
}

pub fn near_limit_inquiry() -> Command {
    camera_inquiry(&[NEAR_LIMIT], InquiryKind::FocusNearLimit)
}

pub fn sensitivity_inquiry() -> Command {
    camera_inquiry(&[AF_SENSITIVITY], InquiryKind::AfSensitivity)
}

pub fn af_mode_inquiry() -> Command {
    camera_inquiry(&[AF_MODE], InquiryKind::AfMode)
}

pub fn af_interval_inquiry() -> Command {
    camera_inquiry(&[AF_INTERVAL], InquiryKind::AfInterval)
}

pub fn ir_correction_inquiry() -> Command {
    camera_inquiry(&[IR_CORRECTION], InquiryKind::IrCorrection)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn movement_frames() -> Result {
        assert_eq!(hex::decode("8101040800ff")?, stop().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101040802ff")?, far().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101040803ff")?, near().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101040823ff")?, far_speed(3).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101040837ff")?, near_speed(12).addressed_to(1).to_bytes());
        Ok(())
    }

    #[test]
    fn direct_frame() -> Result {
        assert_eq!(
            hex::decode("810104480a0b0c0dff")?,
            direct(0xabcd).addressed_to(1).to_bytes()
        );
        // Clamped to the far end of the range.
        assert_eq!(
            hex::decode("810104480f000000ff")?,
            direct(0xf789).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn near_limit_zeroes_low_byte() -> Result {
        assert_eq!(
            hex::decode("810104280a0b0000ff")?,
            near_limit(0xabcd).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn auto_and_trigger() -> Result {
        assert_eq!(hex::decode("8101043802ff")?, auto(true).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101043810ff")?, auto_toggle().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101041801ff")?, trigger().addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101041802ff")?, infinity().addressed_to(1).to_bytes());
        Ok(())
    }

    #[test]
    fn af_tuning() -> Result {
        assert_eq!(
            hex::decode("8101045701ff")?,
            af_mode(AfMode::Interval).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101042700050102ff")?,
            af_interval(0x05, 0x12).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101045803ff")?,
            sensitivity_low(true).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101041101ff")?,
            ir_correction(true).addressed_to(1).to_bytes()
        );
        Ok(())
    }
}
