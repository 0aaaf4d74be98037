/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::AsyncBufRead;

mod limited_read_until;
use limited_read_until::LimitedReadUntil;

pub(crate) trait LimitedBufReadExt: AsyncBufRead {
    /// Read into `buf` until `delimiter` is found or `max_len` bytes have been read.
    ///
    /// Returns whether the delimiter was found, and the number of bytes appended.
    fn limited_read_until<'a>(
        &'a mut self,
        delimiter: u8,
        max_len: usize,
        buf: &'a mut Vec<u8>,
    ) -> LimitedReadUntil<'a, Self>
    where
        Self: Unpin,
    {
        LimitedReadUntil::new(self, delimiter, max_len, buf)
    }
}

impl<R: AsyncBufRead + ?Sized> LimitedBufReadExt for R {}
