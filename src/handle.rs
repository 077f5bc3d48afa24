//! Handle tamper-detection — a trailing integrity word maintained such that
//! the sum of all tracked handle words is zero.
//!
//! Grounded on the same additive-checksum discipline `record.rs` applies to
//! records on disk (and, in spirit, on sixcy's `block.rs` header CRC): here
//! the covered "words" are the handle's own depth/capacity fields rather
//! than bytes on the wire. Every public operation calls [`HandleIntegrity::verify`]
//! on entry and [`HandleIntegrity::restore`] on exit; a mismatch on entry is
//! sticky and must not be cleared by a mere error query.
use crate::error::{Result, SonError};

#[derive(Debug, Clone, Copy, Default)]
pub struct HandleIntegrity {
    checksum: u32,
}

impl HandleIntegrity {
    pub fn new() -> Self {
        Self { checksum: 0 }
    }

    /// Recompute and store the integrity word over the given live fields.
    pub fn restore(&mut self, fields: &[u32]) {
        let sum = fields.iter().fold(0u32, |acc, &w| acc.wrapping_add(w));
        self.checksum = 0u32.wrapping_sub(sum);
    }

    /// Verify the live fields plus the stored checksum sum to zero.
    pub fn verify(&self, fields: &[u32]) -> Result<()> {
        let sum = fields.iter().fold(self.checksum, |acc, &w| acc.wrapping_add(w));
        if sum != 0 {
            tracing::warn!("handle integrity checksum mismatch: tamper or corruption detected");
            return Err(SonError::HandleChecksum);
        }
        Ok(())
    }
}
