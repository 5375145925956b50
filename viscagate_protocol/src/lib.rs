#![doc = include_str!("../README.md")]

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate tracing;

pub mod cmds;
mod command;
mod error;
mod frame;
pub mod nibbles;
mod reply;

pub use crate::{
    command::{Command, DataType, MessageKind, Recipient},
    error::Error,
    frame::{FrameSplitter, Header, BROADCAST_HEADER, MAX_FRAME_LENGTH, MIN_FRAME_LENGTH, TERMINATOR},
    reply::{
        AfMode, ImageBlock, InquiryKind, LensBlock, PanTiltMaxSpeed, PanTiltPosition,
        PanTiltStatus, Reply, ReplyDetail, ReplyError, ReplyValue,
    },
};

/// Result type.
pub type Result<T = ()> = std::result::Result<T, Error>;
