#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod adapters;
pub mod assets;
pub mod batch;
pub mod ecosystem;
pub mod encrypted;

pub use adapters::*;
pub use assets::*;
pub use batch::*;
pub use ecosystem::*;
pub use encrypted::*;
