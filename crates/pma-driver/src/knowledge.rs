//! Knowledge images
//!
//! A saved neuron chain serialized for storage on the host. The register
//! protocol has no file format of its own; this is the layout the CLI writes
//! with `dump` and replays with `restore`.
//!
//! ```text
//! offset  size  field
//! 0       4     magic "PMAK"
//! 4       2     version (1)
//! 6       2     record count (<= 128)
//! 8       2     components per record (128)
//! 10      ...   records: context, components..., influence, min influence, category
//! ```
//!
//! All fields are little-endian u16.

use crate::error::{PmaError, Result};
use crate::record::NeuronRecord;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use pma_chip::limits::{MAX_NEURONS, SAVE_RESTORE_SIZE};
use std::path::Path;

/// Image magic bytes
pub const MAGIC: &[u8; 4] = b"PMAK";

/// Current image version
pub const VERSION: u16 = 1;

const HEADER_LEN: usize = 10;
const RECORD_LEN: usize = (SAVE_RESTORE_SIZE + 4) * 2;

// Truncation acceptable: SAVE_RESTORE_SIZE is 128
#[allow(clippy::cast_possible_truncation)]
const COMPONENTS: u16 = SAVE_RESTORE_SIZE as u16;

/// Saved neuron chain, in chain order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeImage {
    /// Records in the order they were read from the chain
    pub records: Vec<NeuronRecord>,
}

impl KnowledgeImage {
    /// Wrap saved records
    pub fn new(records: Vec<NeuronRecord>) -> Self {
        Self { records }
    }

    /// Number of neurons in the image
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the image holds no neurons
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize to the image layout
    ///
    /// # Errors
    ///
    /// Returns [`PmaError::ChainFull`] when the image holds more records than
    /// the array has neurons; nothing is written.
    pub fn encode(&self) -> Result<Bytes> {
        let count = u16::try_from(self.records.len())
            .ok()
            .filter(|&n| usize::from(n) <= MAX_NEURONS)
            .ok_or(PmaError::ChainFull { max: MAX_NEURONS })?;

        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.records.len() * RECORD_LEN);
        buf.put_slice(MAGIC);
        buf.put_u16_le(VERSION);
        buf.put_u16_le(count);
        buf.put_u16_le(COMPONENTS);
        for record in &self.records {
            buf.put_u16_le(record.context);
            for &component in &record.vector {
                buf.put_u16_le(component);
            }
            buf.put_u16_le(record.influence);
            buf.put_u16_le(record.min_influence);
            buf.put_u16_le(record.category);
        }
        Ok(buf.freeze())
    }

    /// Parse an image
    ///
    /// # Errors
    ///
    /// Returns [`PmaError::InvalidImage`] on bad magic, unknown version,
    /// a record count above the array capacity, a component count other than
    /// 128, or truncated data.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut buf = data;
        if buf.remaining() < HEADER_LEN {
            return Err(PmaError::invalid_image(format!(
                "header truncated: {} < {HEADER_LEN} bytes",
                data.len()
            )));
        }
        if &buf[..4] != MAGIC {
            return Err(PmaError::invalid_image("bad magic"));
        }
        buf.advance(4);

        let version = buf.get_u16_le();
        if version != VERSION {
            return Err(PmaError::invalid_image(format!(
                "unsupported version {version} (expected {VERSION})"
            )));
        }
        let count = usize::from(buf.get_u16_le());
        if count > MAX_NEURONS {
            return Err(PmaError::invalid_image(format!(
                "{count} records exceed the {MAX_NEURONS}-neuron array"
            )));
        }
        let components = usize::from(buf.get_u16_le());
        if components != SAVE_RESTORE_SIZE {
            return Err(PmaError::invalid_image(format!(
                "{components} components per record (expected {SAVE_RESTORE_SIZE})"
            )));
        }
        if buf.remaining() < count * RECORD_LEN {
            return Err(PmaError::invalid_image(format!(
                "records truncated: {} < {} bytes",
                buf.remaining(),
                count * RECORD_LEN
            )));
        }

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let mut record = NeuronRecord {
                context: buf.get_u16_le(),
                ..NeuronRecord::default()
            };
            for component in &mut record.vector {
                *component = buf.get_u16_le();
            }
            record.influence = buf.get_u16_le();
            record.min_influence = buf.get_u16_le();
            record.category = buf.get_u16_le();
            records.push(record);
        }
        if buf.has_remaining() {
            tracing::warn!("knowledge image has {} trailing bytes", buf.remaining());
        }
        Ok(Self { records })
    }

    /// Write the image to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the image holds more than `MAX_NEURONS` records or
    /// the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.encode()?)?;
        tracing::info!("Wrote {} neurons to {}", self.len(), path.display());
        Ok(())
    }

    /// Read an image from `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid image.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let image = Self::decode(&data)?;
        tracing::info!("Read {} neurons from {}", image.len(), path.display());
        Ok(image)
    }
}
