/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::time::Duration;

use tokio::io::{AsyncRead, BufReader};

use crate::config::FtpTransferConfig;
use crate::error::FtpLineDataReadError;
use crate::io::LimitedBufReadExt;

pub(crate) trait FtpLineDataReceiver {
    /// Called for every non-empty line, with the line terminator removed.
    fn recv_line(&mut self, line: &str);
    fn should_return_early(&self) -> bool;
}

/// Reads a line based listing from a data connection.
pub(crate) struct FtpLineDataTransfer<T: AsyncRead> {
    io: BufReader<T>,
    max_lines: usize,
    max_line_len: usize,
    idle_timeout: Duration,
    line_buf: Vec<u8>,
}

impl<T> FtpLineDataTransfer<T>
where
    T: AsyncRead + Unpin,
{
    pub(crate) fn new(io: T, config: &FtpTransferConfig) -> Self {
        FtpLineDataTransfer {
            io: BufReader::new(io),
            max_lines: config.list_max_entries,
            max_line_len: config.list_max_line_len,
            idle_timeout: config.data_idle_timeout,
            line_buf: Vec::with_capacity(config.list_max_line_len),
        }
    }

    fn send_buf_to_receiver<R>(&mut self, receiver: &mut R) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver,
    {
        {
            // invalid bytes become U+FFFD, the line is still delivered
            let s = String::from_utf8_lossy(&self.line_buf);
            let line = s.trim_end_matches(['\r', '\n']);
            if matches!(s, Cow::Owned(_)) {
                log::warn!("listing line is not valid utf-8, received as {line:?}");
            }
            if !line.is_empty() {
                receiver.recv_line(line);
            }
        }
        self.line_buf.clear();

        if receiver.should_return_early() {
            Err(FtpLineDataReadError::AbortedByCallback)
        } else {
            Ok(())
        }
    }

    pub(crate) async fn read_to_end<R>(
        mut self,
        receiver: &mut R,
    ) -> Result<(), FtpLineDataReadError>
    where
        R: FtpLineDataReceiver,
    {
        for i in 0..self.max_lines {
            let read_line =
                self.io
                    .limited_read_until(b'\n', self.max_line_len, &mut self.line_buf);
            let (found, nr) = match tokio::time::timeout(self.idle_timeout, read_line).await {
                Ok(r) => r?,
                Err(_) => return Err(FtpLineDataReadError::ReadTimedOut),
            };
            if nr == 0 {
                return Ok(());
            }

            if !found {
                if nr >= self.max_line_len {
                    return Err(FtpLineDataReadError::LineTooLong(i + 1));
                }
                // the last line may have no terminator
                self.send_buf_to_receiver(receiver)?;
                return Ok(());
            }

            self.send_buf_to_receiver(receiver)?;
        }

        Err(FtpLineDataReadError::TooManyLines)
    }
}
