// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Single-shot read sessions over the result cache.
//!
//! A session delivers the cached record at most once. The first read
//! returns the whole record (or zero bytes if nothing valid is cached) and
//! every later read returns zero bytes. Open a new session to see a newer
//! result. Reading never clears the cache.

use std::sync::Arc;

use crate::core::{Result, ResultCache, TriggerError, RESULT_CAPACITY};

pub struct ReadSession {
    cache: Arc<ResultCache>,
    offset: usize,
    drained: bool,
}

impl ReadSession {
    pub fn new(cache: Arc<ResultCache>) -> Self {
        Self {
            cache,
            offset: 0,
            drained: false,
        }
    }

    /// Bytes already delivered in this session.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True once a read has returned end-of-data; later reads stay at 0.
    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Read the record into `buf`.
    ///
    /// Partial reads are not supported: a buffer shorter than the record
    /// fails with `InvalidArgument` and leaves the session untouched. An
    /// empty cache ends the session too: a result published afterwards is
    /// only visible to a new session.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.drained {
            return Ok(0);
        }

        match self.cache.copy_into(buf) {
            Ok(n) => {
                self.offset = n;
                self.drained = true;
                Ok(n)
            }
            Err(needed) => Err(TriggerError::InvalidArgument(format!(
                "read buffer of {} bytes is smaller than the {}-byte result",
                buf.len(),
                needed
            ))),
        }
    }

    /// Read the record as text, `None` once drained or when nothing is cached.
    pub fn read_text(&mut self) -> Result<Option<String>> {
        let mut buf = [0u8; RESULT_CAPACITY];
        let n = self.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        let text = std::str::from_utf8(&buf[..n])
            .map_err(|e| TriggerError::Other(anyhow::anyhow!("result is not UTF-8: {}", e)))?;
        Ok(Some(text.to_string()))
    }
}
