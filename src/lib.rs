//! Verification of a banked ROM against the image it was programmed from.
//!
//! The device is read through a [`region::MemoryRegion`], compared unit by
//! unit against the reference image under one of several access patterns,
//! and every outcome is reported on the console as it happens.

pub mod logger;

pub mod app;
pub mod compare;
pub mod console;
pub mod cpu_utils;
pub mod harness;
pub mod image;
pub mod layout;
pub mod pattern;
pub mod region;
pub mod report;
pub mod suite;
pub mod utils;
