/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

use super::command::FtpCommandError;
use super::transfer::{FtpLineDataReadError, FtpTransferServerError};

#[derive(Debug, Error)]
pub enum FtpFileFactsParseError {
    #[error("no space delimiter")]
    NoSpaceDelimiter,
    #[error("no delimiter in fact ({0})")]
    NoDelimiterInFact(String),
    #[error("invalid size")]
    InvalidSize,
}

/// Errors of commands that act on a single path and carry no data.
#[derive(Debug, Error)]
pub enum FtpFileStatError {
    #[error("raw command error: {0}")]
    RawCommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("feature unavailable")]
    FeatUnavailable,
    #[error("file unavailable")]
    FileUnavailable,
    #[error("filename not allowed")]
    FileNameNotAllowed,
}

impl From<FtpCommandError> for FtpFileStatError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileStatError::ServiceNotAvailable,
            FtpCommandError::CommandNotImplemented(_) => FtpFileStatError::FeatUnavailable,
            _ => FtpFileStatError::RawCommandError(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileTransferError {
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable")]
    FileUnavailable,
    #[error("need account for storing")]
    NeedAccountForStoring,
    #[error("filename not allowed")]
    FileNameNotAllowed,
    #[error("insufficient storage space")]
    InsufficientStorageSpace,
    #[error("data read failed: {0:?}")]
    DataReadFailed(io::Error),
    #[error("data write failed: {0:?}")]
    DataWriteFailed(io::Error),
    #[error("local read failed: {0:?}")]
    LocalReadFailed(io::Error),
    #[error("local write failed: {0:?}")]
    LocalWriteFailed(io::Error),
    #[error("data connection idle timed out")]
    DataIdleTimedOut,
    #[error("server reported error: {0}")]
    ServerReportedError(#[from] FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
}

impl From<FtpCommandError> for FtpFileTransferError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileTransferError::ServiceNotAvailable,
            _ => FtpFileTransferError::CommandError(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum FtpFileListError {
    #[error("command error: {0}")]
    CommandError(FtpCommandError),
    #[error("service not available")]
    ServiceNotAvailable,
    #[error("file unavailable")]
    FileUnavailable,
    #[error("data read failed: {0}")]
    DataReadFailed(#[from] FtpLineDataReadError),
    #[error("invalid entry: {0}")]
    InvalidEntry(#[from] FtpFileFactsParseError),
    #[error("server reported error: {0}")]
    ServerReportedError(#[from] FtpTransferServerError),
    #[error("timeout to wait end reply")]
    TimeoutToWaitEndReply,
}

impl From<FtpCommandError> for FtpFileListError {
    fn from(e: FtpCommandError) -> Self {
        match e {
            FtpCommandError::ServiceNotAvailable => FtpFileListError::ServiceNotAvailable,
            _ => FtpFileListError::CommandError(e),
        }
    }
}
