#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Hashing and file helpers shared by the peerswap crates.
//!
//! Nothing here logs; the CLI owns logging.

pub mod fs;
pub mod hash;
