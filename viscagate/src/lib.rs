#![doc = include_str!("../README.md")]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate tracing;

mod camera;
mod config;
mod controller;
mod error;
mod serial;
mod server;
mod state;
mod udp;

pub use {
    crate::{
        config::{CameraFlavor, Config, IpCameraConfig, SerialConfig, ServerConfig},
        controller::ViscaController,
        error::Error,
        state::{CameraStatus, StatusUpdate},
    },
    viscagate_protocol as protocol,
};
pub type Result<T = ()> = std::result::Result<T, Error>;
