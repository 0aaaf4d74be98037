/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;

use thiserror::Error;

mod auth;
mod command;
mod connect;
mod file;
mod response;
mod transfer;

pub(crate) use auth::FtpAuthStatus;
pub use auth::FtpAuthError;
pub use command::FtpCommandError;
pub use connect::FtpConnectError;
pub use file::{
    FtpFileFactsParseError, FtpFileListError, FtpFileStatError, FtpFileTransferError,
};
pub use response::FtpRawResponseError;
pub use transfer::{
    FtpDataCopyError, FtpLineDataReadError, FtpTransferServerError, FtpTransferSetupError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpErrorKind {
    AlreadyConnected,
    NotConnected,
    ConnectionFailed,
    AuthenticationFailed,
    ProtocolError,
    DataConnectionFailed,
    TransferFailed,
    ListingFailed,
    SizeUnavailable,
    CommandFailed,
}

impl FtpErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FtpErrorKind::AlreadyConnected => "AlreadyConnected",
            FtpErrorKind::NotConnected => "NotConnected",
            FtpErrorKind::ConnectionFailed => "ConnectionFailed",
            FtpErrorKind::AuthenticationFailed => "AuthenticationFailed",
            FtpErrorKind::ProtocolError => "ProtocolError",
            FtpErrorKind::DataConnectionFailed => "DataConnectionFailed",
            FtpErrorKind::TransferFailed => "TransferFailed",
            FtpErrorKind::ListingFailed => "ListingFailed",
            FtpErrorKind::SizeUnavailable => "SizeUnavailable",
            FtpErrorKind::CommandFailed => "CommandFailed",
        }
    }
}

impl fmt::Display for FtpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error returned by every public operation of [`crate::FtpClient`].
///
/// A reply that can not be parsed, or that the server truncated by closing the
/// control connection, is always reported as [`FtpError::ProtocolError`]. Every
/// other failure is reported with the kind of the operation that was running.
#[derive(Debug, Error)]
pub enum FtpError {
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected")]
    NotConnected,
    #[error("connection failed: {0}")]
    ConnectionFailed(FtpConnectError),
    #[error("authentication failed: {0}")]
    AuthenticationFailed(FtpAuthError),
    #[error("protocol error: {0}")]
    ProtocolError(FtpCommandError),
    #[error("data connection failed: {0}")]
    DataConnectionFailed(FtpTransferSetupError),
    #[error("transfer failed: {0}")]
    TransferFailed(FtpFileTransferError),
    #[error("listing failed: {0}")]
    ListingFailed(FtpFileListError),
    #[error("size unavailable: {0}")]
    SizeUnavailable(FtpFileStatError),
    #[error("command failed: {0}")]
    CommandFailed(FtpFileStatError),
}

impl FtpError {
    pub fn kind(&self) -> FtpErrorKind {
        match self {
            FtpError::AlreadyConnected => FtpErrorKind::AlreadyConnected,
            FtpError::NotConnected => FtpErrorKind::NotConnected,
            FtpError::ConnectionFailed(_) => FtpErrorKind::ConnectionFailed,
            FtpError::AuthenticationFailed(_) => FtpErrorKind::AuthenticationFailed,
            FtpError::ProtocolError(_) => FtpErrorKind::ProtocolError,
            FtpError::DataConnectionFailed(_) => FtpErrorKind::DataConnectionFailed,
            FtpError::TransferFailed(_) => FtpErrorKind::TransferFailed,
            FtpError::ListingFailed(_) => FtpErrorKind::ListingFailed,
            FtpError::SizeUnavailable(_) => FtpErrorKind::SizeUnavailable,
            FtpError::CommandFailed(_) => FtpErrorKind::CommandFailed,
        }
    }

    pub(crate) fn command_failed(e: FtpFileStatError) -> Self {
        match e {
            FtpFileStatError::RawCommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            e => FtpError::CommandFailed(e),
        }
    }

    pub(crate) fn size_unavailable(e: FtpFileStatError) -> Self {
        match e {
            FtpFileStatError::RawCommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            e => FtpError::SizeUnavailable(e),
        }
    }
}

impl From<FtpConnectError> for FtpError {
    fn from(e: FtpConnectError) -> Self {
        match e {
            FtpConnectError::GreetingFailed(e) | FtpConnectError::TlsNegotiationFailed(e)
                if e.is_protocol_violation() =>
            {
                FtpError::ProtocolError(e)
            }
            e => FtpError::ConnectionFailed(e),
        }
    }
}

impl From<FtpAuthError> for FtpError {
    fn from(e: FtpAuthError) -> Self {
        match e {
            FtpAuthError::RawCommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            e => FtpError::AuthenticationFailed(e),
        }
    }
}

impl From<FtpTransferSetupError> for FtpError {
    fn from(e: FtpTransferSetupError) -> Self {
        match e {
            FtpTransferSetupError::CommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            e => FtpError::DataConnectionFailed(e),
        }
    }
}

impl From<FtpFileTransferError> for FtpError {
    fn from(e: FtpFileTransferError) -> Self {
        match e {
            FtpFileTransferError::CommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            FtpFileTransferError::ServerReportedError(FtpTransferServerError::RecvFailed(e))
                if e.is_protocol_violation() =>
            {
                FtpError::ProtocolError(FtpCommandError::RecvFailed(e))
            }
            e => FtpError::TransferFailed(e),
        }
    }
}

impl From<FtpFileListError> for FtpError {
    fn from(e: FtpFileListError) -> Self {
        match e {
            FtpFileListError::CommandError(e) if e.is_protocol_violation() => {
                FtpError::ProtocolError(e)
            }
            FtpFileListError::ServerReportedError(FtpTransferServerError::RecvFailed(e))
                if e.is_protocol_violation() =>
            {
                FtpError::ProtocolError(FtpCommandError::RecvFailed(e))
            }
            e => FtpError::ListingFailed(e),
        }
    }
}
