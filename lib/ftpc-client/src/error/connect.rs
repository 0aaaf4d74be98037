/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::FtpCommandError;

#[derive(Debug, Error)]
pub enum FtpConnectError {
    #[error("connect failed: {0:?}")]
    ConnectFailed(io::Error),
    #[error("timed out to connect")]
    ConnectTimedOut,
    #[error("timed out to receive greetings")]
    GreetingTimedOut,
    #[error("greeting failed: {0}")]
    GreetingFailed(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("tls negotiation failed: {0}")]
    TlsNegotiationFailed(FtpCommandError),
    #[error("tls upgrade failed: {0:?}")]
    TlsUpgradeFailed(io::Error),
    #[error("timed out to upgrade to tls")]
    TlsUpgradeTimedOut,
}
