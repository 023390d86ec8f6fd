//! Silicon model for the register-mapped pattern-matching neuron array.
//!
//! This crate has **no dependencies** and **no hardware access**; it is a
//! pure model of the silicon: register offsets, bit fields, capacity limits
//! and the two operating modes the comparator understands.
//!
//! The chip holds up to 128 neurons. Each neuron stores a 128-byte prototype,
//! a context, an influence field and a category. Distances, influence
//! adaptation and category decisions all happen inside the array; the host
//! only sequences 16-bit register accesses.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Register map: offsets and bit definitions |
//! | [`limits`] | Capacity limits, sentinels and power-on defaults |
//! | [`mode`] | Distance norm and classifier mode enums |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod limits;
pub mod mode;
pub mod regs;

pub use mode::{ClassifierMode, DistanceMode};
pub use regs::Register;
