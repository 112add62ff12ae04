#![cfg_attr(target_os = "none", no_std)]
#![allow(dead_code)]
#![allow(non_upper_case_globals)]

//! DASICS (Dynamic in-Address-Space Isolation by Code Segments) support for the
//! kernel: library / jump capability tables kept inside CSRs, the supervisor
//! main-call gateway, and user memory protection keys.

extern crate core;

#[macro_use]
pub mod common;

pub mod config;
pub mod csr;
pub mod dasics;
pub mod exception;
pub mod pku;

#[cfg(target_os = "none")]
mod lang_items;

pub use common::structures::DasicsError;
pub use dasics::interface::*;
