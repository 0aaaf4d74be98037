/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod io;

mod addr;
pub use addr::{FtpServerAddr, FtpServerAddrParseError, FtpTlsMode, FtpTlsModeParseError};

mod config;
pub use config::{FtpClientConfig, FtpControlConfig, FtpTransferConfig};

mod debug;
pub use debug::{FTP_DEBUG_LOG_LEVEL, FTP_DEBUG_LOG_TARGET};

mod error;
pub use error::{
    FtpAuthError, FtpCommandError, FtpConnectError, FtpDataCopyError, FtpError, FtpErrorKind,
    FtpFileFactsParseError, FtpFileListError, FtpFileStatError, FtpFileTransferError,
    FtpLineDataReadError, FtpRawResponseError, FtpTransferServerError, FtpTransferSetupError,
};

mod feature;
pub use feature::FtpServerFeature;

pub mod facts;
pub use facts::{FtpFileEntry, FtpFileEntryType};

mod control;
pub use control::{FtpCommand, FtpReply};

mod transfer;
pub use transfer::FtpTransferType;

mod connection;
pub use connection::{FtpConnectionProvider, FtpStream, FtpTlsConfig, TcpConnectionProvider};

mod client;
pub use client::{FtpClient, FtpClientState, FtpTcpClient};
