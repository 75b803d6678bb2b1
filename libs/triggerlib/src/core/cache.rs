// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-slot result cache.
//!
//! Holds the most recent computation output. Every write replaces the
//! previous record whole; readers take a copy under the same lock, so a
//! snapshot is always either the complete old record or the complete new one.

use parking_lot::Mutex;

/// Size of the result slot in bytes, terminator included.
pub const RESULT_CAPACITY: usize = 128;

/// Longest payload the slot stores.
const MAX_PAYLOAD: usize = RESULT_CAPACITY - 1;

/// Copy of the cached result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    pub text: String,
    pub length: usize,
    pub valid: bool,
}

impl ResultRecord {
    /// True when there is something for a reader to deliver.
    #[inline]
    pub fn is_readable(&self) -> bool {
        self.valid && self.length > 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

#[derive(Debug, Default)]
pub struct ResultCache {
    slot: Mutex<ResultRecord>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` as the new record and return the stored length.
    ///
    /// Text longer than the payload limit is cut at the last character
    /// boundary that fits.
    pub fn write(&self, text: &str) -> usize {
        let stored = truncate_to_boundary(text, MAX_PAYLOAD);
        let length = stored.len();

        let mut slot = self.slot.lock();
        slot.text.clear();
        slot.text.push_str(stored);
        slot.length = length;
        slot.valid = true;
        drop(slot);

        if length < text.len() {
            tracing::debug!(
                "Result truncated from {} to {} bytes",
                text.len(),
                length
            );
        }
        length
    }

    pub fn snapshot(&self) -> ResultRecord {
        self.slot.lock().clone()
    }

    /// Copy the record into `buf` while holding the lock.
    ///
    /// Returns `Ok(0)` when nothing valid is cached, `Ok(len)` after a full
    /// copy, and `Err(len)` without copying when `buf` is too small.
    pub(crate) fn copy_into(&self, buf: &mut [u8]) -> std::result::Result<usize, usize> {
        let slot = self.slot.lock();
        if !slot.is_readable() {
            return Ok(0);
        }
        if buf.len() < slot.length {
            return Err(slot.length);
        }
        buf[..slot.length].copy_from_slice(slot.as_bytes());
        Ok(slot.length)
    }
}

fn truncate_to_boundary(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
