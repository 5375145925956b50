//! Picture controls: aperture, sensitivity, noise, gamma, effects,
//! freeze, infrared cut, and the block inquiries.

use super::{camera_command, camera_inquiry, on_off, Adjust};
use crate::{nibbles, Command, InquiryKind};

const ICR: u8 = 0x01;
const APERTURE: u8 = 0x02;
const ICR_THRESHOLD: u8 = 0x21;
const APERTURE_DIRECT: u8 = 0x42;
const AUTO_ICR: u8 = 0x51;
const HIGH_RES: u8 = 0x52;
const NOISE_REDUCTION: u8 = 0x53;
const GAMMA: u8 = 0x5b;
const HIGH_SENSITIVITY: u8 = 0x5e;
const FREEZE: u8 = 0x62;
const EFFECT: u8 = 0x63;
const DIGITAL_EFFECT: u8 = 0x64;
const DIGITAL_EFFECT_LEVEL: u8 = 0x65;
const BLOCK: u8 = 0x7e;

/// Strongest noise reduction level.
pub const NOISE_REDUCTION_MAX: u8 = 5;
/// Steepest gamma curve selector.
pub const GAMMA_MAX: u8 = 4;
/// Strongest digital effect level.
pub const EFFECT_LEVEL_MAX: u8 = 32;

/// Picture effect.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Effect {
    #[default]
    Off = 0x00,
    Pastel = 0x01,
    Negative = 0x02,
    Sepia = 0x03,
    Monochrome = 0x04,
    Solarize = 0x05,
    Mosaic = 0x06,
    Slim = 0x07,
    Stretch = 0x08,
}

/// Digital (memory-based) picture effect.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DigitalEffect {
    #[default]
    Off = 0x00,
    Still = 0x01,
    Flash = 0x02,
    Lumi = 0x03,
    Trail = 0x04,
}

pub fn aperture(adjust: Adjust) -> Command {
    camera_command(&[APERTURE, adjust as u8])
}

pub fn aperture_direct(position: u8) -> Command {
    let mut body = vec![APERTURE_DIRECT, 0x00, 0x00];
    body.extend_from_slice(&nibbles::encode_u8(position));
    camera_command(&body)
}

pub fn high_res(on: bool) -> Command {
    camera_command(&[HIGH_RES, on_off(on)])
}

pub fn high_sensitivity(on: bool) -> Command {
    camera_command(&[HIGH_SENSITIVITY, on_off(on)])
}

/// Noise reduction strength, 0 (off) to 5.
pub fn noise_reduction(level: u8) -> Command {
    camera_command(&[NOISE_REDUCTION, level.min(NOISE_REDUCTION_MAX)])
}

/// Gamma curve selector, 0 (standard) to 4.
pub fn gamma(level: u8) -> Command {
    camera_command(&[GAMMA, level.min(GAMMA_MAX)])
}

pub fn effect(effect: Effect) -> Command {
    camera_command(&[EFFECT, effect as u8])
}

pub fn digital_effect(effect: DigitalEffect) -> Command {
    camera_command(&[DIGITAL_EFFECT, effect as u8])
}

/// Intensity of the active digital effect, 0 to 32.
pub fn digital_effect_level(level: u8) -> Command {
    camera_command(&[DIGITAL_EFFECT_LEVEL, level.min(EFFECT_LEVEL_MAX)])
}

/// Freezes or resumes the picture.
pub fn freeze(on: bool) -> Command {
    camera_command(&[FREEZE, on_off(on)])
}

/// Moves the infrared cut filter out of (`true`) or into the light path.
pub fn icr(on: bool) -> Command {
    camera_command(&[ICR, on_off(on)])
}

/// Lets the camera manage the infrared cut filter itself.
pub fn auto_icr(on: bool) -> Command {
    camera_command(&[AUTO_ICR, on_off(on)])
}

/// Brightness threshold for automatic infrared cut switching.
pub fn icr_threshold(level: u8) -> Command {
    let mut body = vec![ICR_THRESHOLD, 0x00, 0x00];
    body.extend_from_slice(&nibbles::encode_u8(level));
    camera_command(&body)
}

pub fn aperture_inquiry() -> Command {
    camera_inquiry(&[APERTURE_DIRECT], InquiryKind::Aperture)
}

pub fn high_res_inquiry() -> Command {
    camera_inquiry(&[HIGH_RES], InquiryKind::HighRes)
}

pub fn high_sensitivity_inquiry() -> Command {
    camera_inquiry(&[HIGH_SENSITIVITY], InquiryKind::HighSensitivity)
}

pub fn noise_reduction_inquiry() -> Command {
    camera_inquiry(&[NOISE_REDUCTION], InquiryKind::NoiseReduction)
}

pub fn gamma_inquiry() -> Command {
    camera_inquiry(&[GAMMA], InquiryKind::Gamma)
}

pub fn effect_inquiry() -> Command {
    camera_inquiry(&[EFFECT], InquiryKind::Effect)
}

pub fn digital_effect_inquiry() -> Command {
    camera_inquiry(&[DIGITAL_EFFECT], InquiryKind::DigitalEffect)
}

pub fn digital_effect_level_inquiry() -> Command {
    camera_inquiry(&[DIGITAL_EFFECT_LEVEL], InquiryKind::DigitalEffectLevel)
}

pub fn freeze_inquiry() -> Command {
    camera_inquiry(&[FREEZE], InquiryKind::Freeze)
}

pub fn icr_inquiry() -> Command {
    camera_inquiry(&[ICR], InquiryKind::Icr)
}

pub fn auto_icr_inquiry() -> Command {
    camera_inquiry(&[AUTO_ICR], InquiryKind::AutoIcr)
}

pub fn icr_threshold_inquiry() -> Command {
    camera_inquiry(&[ICR_THRESHOLD], InquiryKind::IcrThreshold)
}

/// One-shot snapshot of the whole lens system.
pub fn lens_block_inquiry() -> Command {
    camera_inquiry(&[BLOCK, BLOCK, 0x00], InquiryKind::LensBlock)
}

/// One-shot snapshot of the exposure and colour systems.
pub fn image_block_inquiry() -> Command {
    camera_inquiry(&[BLOCK, BLOCK, 0x01], InquiryKind::ImageBlock)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::Result;

    #[test]
    fn picture_switches() -> Result {
        assert_eq!(hex::decode("8101045202ff")?, high_res(true).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101045e03ff")?, high_sensitivity(false).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101046202ff")?, freeze(true).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101040102ff")?, icr(true).addressed_to(1).to_bytes());
        assert_eq!(hex::decode("8101045103ff")?, auto_icr(false).addressed_to(1).to_bytes());
        Ok(())
    }

    #[test]
    fn levels_clamp() -> Result {
        assert_eq!(
            hex::decode("8101045305ff")?,
            noise_reduction(17).addressed_to(1).to_bytes()
        );
        assert_eq!(hex::decode("8101045b04ff")?, gamma(200).addressed_to(1).to_bytes());
        assert_eq!(
            hex::decode("8101046518ff")?,
            digital_effect_level(0x18).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn effects() -> Result {
        assert_eq!(
            hex::decode("8101046304ff")?,
            effect(Effect::Monochrome).addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8101046403ff")?,
            digital_effect(DigitalEffect::Lumi).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn icr_threshold_frame() -> Result {
        assert_eq!(
            hex::decode("8101042100000f00ff")?,
            icr_threshold(0xf0).addressed_to(1).to_bytes()
        );
        Ok(())
    }

    #[test]
    fn block_inquiries() -> Result {
        assert_eq!(
            hex::decode("8109047e7e00ff")?,
            lens_block_inquiry().addressed_to(1).to_bytes()
        );
        assert_eq!(
            hex::decode("8109047e7e01ff")?,
            image_block_inquiry().addressed_to(1).to_bytes()
        );
        Ok(())
    }
}
