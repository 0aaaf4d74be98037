/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FtpDataCopyError;

mod line;
pub(crate) use line::{FtpLineDataReceiver, FtpLineDataTransfer};

/// Representation type of the data connection, set with `TYPE`.
///
/// No newline translation is done on the client side in either mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FtpTransferType {
    Ascii,
    #[default]
    Binary,
}

impl FtpTransferType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpTransferType::Ascii => "ascii",
            FtpTransferType::Binary => "binary",
        }
    }
}

/// Copy all data from `reader` to `writer`, and return the copied size.
///
/// Every single read or write should finish within `idle_timeout`.
/// The writer is flushed but not shut down.
pub(crate) async fn copy_with_idle_timeout<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
    idle_timeout: Duration,
) -> Result<u64, FtpDataCopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buffer_size];
    let mut copied: u64 = 0;

    loop {
        let nr = match tokio::time::timeout(idle_timeout, reader.read(&mut buf)).await {
            Ok(Ok(n)) => n,
            Ok(Err(e)) => return Err(FtpDataCopyError::ReadFailed(e)),
            Err(_) => return Err(FtpDataCopyError::IdleTimedOut),
        };
        if nr == 0 {
            break;
        }

        match tokio::time::timeout(idle_timeout, writer.write_all(&buf[..nr])).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(FtpDataCopyError::WriteFailed(e)),
            Err(_) => return Err(FtpDataCopyError::IdleTimedOut),
        }
        copied += nr as u64;
    }

    match tokio::time::timeout(idle_timeout, writer.flush()).await {
        Ok(Ok(_)) => Ok(copied),
        Ok(Err(e)) => Err(FtpDataCopyError::WriteFailed(e)),
        Err(_) => Err(FtpDataCopyError::IdleTimedOut),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn copy_all() {
        let mut reader = Builder::new().read(b"hello ").read(b"world").build();
        let mut writer = Builder::new().write(b"hello ").write(b"world").build();

        let n = copy_with_idle_timeout(&mut reader, &mut writer, 512, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(n, 11);
    }

    #[tokio::test]
    async fn copy_read_failed() {
        let mut reader = Builder::new()
            .read(b"abc")
            .read_error(std::io::Error::other("reset"))
            .build();
        let mut writer = Builder::new().write(b"abc").build();

        let e = copy_with_idle_timeout(&mut reader, &mut writer, 512, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(e, FtpDataCopyError::ReadFailed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn copy_idle_timeout() {
        let mut reader = Builder::new()
            .read(b"abc")
            .wait(Duration::from_secs(10))
            .build();
        let mut writer = Builder::new().write(b"abc").build();

        let e = copy_with_idle_timeout(&mut reader, &mut writer, 512, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(e, FtpDataCopyError::IdleTimedOut));
    }
}
