//! Room codes.

pub mod code;

pub use code::{ExhaustionError, RoomCodeGenerator};
