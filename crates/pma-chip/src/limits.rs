//! Capacity limits, sentinels and power-on defaults.

/// Number of neurons in the array.
pub const MAX_NEURONS: usize = 128;

/// First valid neuron identifier.
pub const FIRST_NEURON_ID: u16 = 1;

/// Last valid neuron identifier.
pub const LAST_NEURON_ID: u16 = 128;

/// Longest pattern vector the comparator accepts, in bytes.
pub const MAX_VECTOR_SIZE: usize = 128;

/// Prototype length moved per neuron during save/restore.
///
/// Independent of the length of any vector learned; the full neuron memory
/// is always transferred.
pub const SAVE_RESTORE_SIZE: usize = 128;

/// All-ones sentinel returned when a vector was not processed.
pub const NOT_PROCESSED: u16 = 0xFFFF;

/// Category field value reported when no neuron responded.
pub const NO_MATCH: u16 = 0x7FFF;

/// Power-on global context.
pub const DEFAULT_CONTEXT: u16 = 1;

/// Power-on minimum influence field.
pub const DEFAULT_MIN_IF: u16 = 2;

/// Power-on maximum influence field.
pub const DEFAULT_MAX_IF: u16 = 0x4000;

/// Clamp a neuron identifier into `FIRST_NEURON_ID..=LAST_NEURON_ID`.
#[must_use]
pub fn clamp_neuron_id(id: i32) -> u16 {
    let clamped = id.clamp(i32::from(FIRST_NEURON_ID), i32::from(LAST_NEURON_ID));
    // In range by construction
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let id = clamped as u16;
    id
}
