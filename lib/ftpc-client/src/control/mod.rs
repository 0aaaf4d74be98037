/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite, BufStream};

use crate::config::FtpControlConfig;
use crate::error::{
    FtpAuthStatus, FtpCommandError, FtpFileListError, FtpFileStatError, FtpFileTransferError,
    FtpTransferServerError,
};
use crate::feature::FtpServerFeature;
use crate::transfer::FtpTransferType;

mod response;
pub use response::FtpReply;

mod command;
pub use command::FtpCommand;

/// What the server said when a data transfer command was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FtpTransferStartStatus {
    /// 1xx, the final reply follows after the data connection is closed.
    Proceed,
    /// 2xx, the server has already sent the final reply.
    Finished,
}

pub(crate) struct FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite,
{
    config: FtpControlConfig,
    stream: BufStream<T>,
    out_of_sync: bool,
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(stream: T, config: FtpControlConfig) -> Self {
        FtpControlChannel {
            config,
            stream: BufStream::new(stream),
            out_of_sync: false,
        }
    }

    /// Whether a reply was lost or only partly read, so later replies can
    /// not be matched to their commands any more.
    #[inline]
    pub(crate) fn is_out_of_sync(&self) -> bool {
        self.out_of_sync
    }

    /// Mark the channel as unusable, for reads cancelled from outside.
    #[inline]
    pub(crate) fn set_out_of_sync(&mut self) {
        self.out_of_sync = true;
    }

    /// Get back the underlying stream, for a TLS upgrade.
    ///
    /// Any data buffered but not yet consumed will be lost.
    pub(crate) fn into_inner(self) -> T {
        self.stream.into_inner()
    }

    pub(crate) async fn wait_greetings(&mut self) -> Result<(), FtpCommandError> {
        loop {
            let reply = self.read_raw_response().await?;
            return match reply.code() {
                120 => continue,
                220 => Ok(()),
                421 => Err(FtpCommandError::ServiceNotAvailable),
                n => Err(FtpCommandError::UnexpectedReplyCode(
                    FtpCommand::GREETING,
                    n,
                )),
            };
        }
    }

    pub(crate) async fn auth_tls(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::AUTH_TLS;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("auth tls").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            504 | 534 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            234 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn set_protection_buffer_size(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PBSZ_0;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("set protection buffer size")
            .await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn set_private_protection(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::PROT_P;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("set private protection")
            .await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            504 | 534 | 536 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn check_server_feature(
        &mut self,
    ) -> Result<FtpServerFeature, FtpCommandError> {
        let mut feature = FtpServerFeature::default();

        let cmd = FtpCommand::FEAT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("check server feature").await?;
        match reply.code() {
            500 | 501 | 502 => {}
            211 => {
                let lines = reply.raw_lines();
                if lines.len() > 2 {
                    for line in &lines[1..lines.len() - 1] {
                        if !line.starts_with(' ') {
                            continue;
                        }
                        feature.parse_and_set(line.trim());
                    }
                }
            }
            421 => return Err(FtpCommandError::ServiceNotAvailable),
            n => return Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }

        Ok(feature)
    }

    pub(crate) async fn send_username(
        &mut self,
        name: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::USER;
        let username = name.unwrap_or("anonymous");
        self.send_cmd1(cmd, username)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send username").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            230 => Ok(FtpAuthStatus::LoggedIn),
            331 => Ok(FtpAuthStatus::NeedPassword),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_password(
        &mut self,
        pass: Option<&str>,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::PASS;
        let password = pass.unwrap_or("anonymous@");
        self.send_cmd1(cmd, password)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send password").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            332 => Ok(FtpAuthStatus::NeedAccount),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_account(
        &mut self,
        account: &str,
    ) -> Result<FtpAuthStatus, FtpCommandError> {
        let cmd = FtpCommand::ACCT;
        self.send_cmd1(cmd, account)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send account").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            503 => Err(FtpCommandError::BadCommandSequence(cmd)),
            530 => Ok(FtpAuthStatus::NotLoggedIn),
            202 | 230 => Ok(FtpAuthStatus::LoggedIn),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_quit(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::QUIT;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send quit").await?;
        match reply.code() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            221 => Ok(()),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn send_noop(&mut self) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::NOOP;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send noop").await?;
        match reply.code() {
            500 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            200 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    /// Send a caller supplied command line, and return whatever the server replied.
    pub(crate) async fn send_raw(&mut self, line: &str) -> Result<FtpReply, FtpCommandError> {
        self.send_line(line)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("send raw command").await?;
        Ok(reply)
    }

    pub(crate) async fn print_working_dir(&mut self) -> Result<String, FtpFileStatError> {
        let cmd = FtpCommand::PWD;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("print working dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            257 => match reply.parse_257_path() {
                Some(path) => Ok(path),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 257).into()),
            },
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn change_working_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::CWD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("change working dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            200 | 250 => Ok(()),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Returns the created path if the server reported it.
    pub(crate) async fn make_dir(
        &mut self,
        path: &str,
    ) -> Result<Option<String>, FtpFileStatError> {
        let cmd = FtpCommand::MKD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("make dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            521 | 550 => Err(FtpFileStatError::FileUnavailable),
            553 => Err(FtpFileStatError::FileNameNotAllowed),
            257 => Ok(reply.parse_257_path()),
            250 => Ok(None),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn rename_from(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::RNFR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("rename from")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            450 | 550 => Err(FtpFileStatError::FileUnavailable),
            350 => Ok(()),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn rename_to(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::RNTO;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("rename to")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            503 => Err(FtpCommandError::BadCommandSequence(cmd).into()),
            530 | 532 => Err(FtpCommandError::NotLoggedIn.into()),
            553 => Err(FtpFileStatError::FileNameNotAllowed),
            250 => Ok(()),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn delete_file(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::DELE;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("delete file")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            250 => Ok(()),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            450 => Err(FtpFileStatError::FileUnavailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn remove_dir(&mut self, path: &str) -> Result<(), FtpFileStatError> {
        let cmd = FtpCommand::RMD;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("remove dir")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            250 => Ok(()),
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn request_size(&mut self, path: &str) -> Result<u64, FtpFileStatError> {
        let cmd = FtpCommand::SIZE;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("request size")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            213 => {
                if let Some(s) = reply.line_trimmed() {
                    u64::from_str(s)
                        .map_err(|_| FtpCommandError::InvalidReplySyntax(cmd, 213).into())
                } else {
                    Err(FtpCommandError::InvalidReplySyntax(cmd, 213).into())
                }
            }
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    /// Returns the raw `YYYYMMDDHHMMSS[.sss]` time value.
    pub(crate) async fn request_mtime(&mut self, path: &str) -> Result<String, FtpFileStatError> {
        let cmd = FtpCommand::MDTM;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("request mtime")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            550 => Err(FtpFileStatError::FileUnavailable),
            213 => match reply.line_trimmed() {
                Some(s) if s.len() >= 14 && s.as_bytes()[..14].iter().all(u8::is_ascii_digit) => {
                    Ok(s.to_string())
                }
                _ => Err(FtpCommandError::InvalidReplySyntax(cmd, 213).into()),
            },
            421 => Err(FtpFileStatError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn request_pasv_port(&mut self) -> Result<SocketAddr, FtpCommandError> {
        let cmd = FtpCommand::PASV;
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("request pasv port").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            227 => match reply.parse_pasv_227_reply() {
                Some(addr) => Ok(addr),
                None => Err(FtpCommandError::InvalidReplySyntax(cmd, 227)),
            },
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_transfer_type(
        &mut self,
        t: FtpTransferType,
    ) -> Result<(), FtpCommandError> {
        let cmd = match t {
            FtpTransferType::Ascii => FtpCommand::TYPE_A,
            FtpTransferType::Binary => FtpCommand::TYPE_I,
        };
        self.send_cmd(cmd)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("request transfer type")
            .await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            200 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn request_restart(&mut self, position: u64) -> Result<(), FtpCommandError> {
        let cmd = FtpCommand::REST;
        self.send_cmd1(cmd, &position.to_string())
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self.timed_read_raw_response("request restart").await?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd)),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd)),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd)),
            530 => Err(FtpCommandError::NotLoggedIn),
            350 => Ok(()),
            421 => Err(FtpCommandError::ServiceNotAvailable),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n)),
        }
    }

    pub(crate) async fn start_retrieve(
        &mut self,
        path: &str,
    ) -> Result<FtpTransferStartStatus, FtpFileTransferError> {
        let cmd = FtpCommand::RETR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start retrieve")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            450 | 550 => Err(FtpFileTransferError::FileUnavailable),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished.into()),
            426 => Err(FtpTransferServerError::DataTransferLost.into()),
            451 => Err(FtpTransferServerError::ServerFailed.into()),
            421 => Err(FtpFileTransferError::ServiceNotAvailable),
            100..=199 => Ok(FtpTransferStartStatus::Proceed),
            200..=299 => Ok(FtpTransferStartStatus::Finished),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn wait_retrieve_end(&mut self) -> Result<(), FtpTransferServerError> {
        let reply = self.read_raw_response().await?;
        match reply.code() {
            110 => Err(FtpTransferServerError::RestartNeeded),
            200..=299 => Ok(()),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            450 | 550 => Err(FtpTransferServerError::FileUnavailable),
            n => Err(FtpTransferServerError::UnexpectedEndReplyCode(
                FtpCommand::RETR,
                n,
            )),
        }
    }

    pub(crate) async fn start_store(
        &mut self,
        path: &str,
    ) -> Result<FtpTransferStartStatus, FtpFileTransferError> {
        let cmd = FtpCommand::STOR;
        self.send_cmd1(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start store")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            500 | 501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            532 => Err(FtpFileTransferError::NeedAccountForStoring),
            553 => Err(FtpFileTransferError::FileNameNotAllowed),
            450 | 550 => Err(FtpFileTransferError::FileUnavailable),
            452 => Err(FtpFileTransferError::InsufficientStorageSpace),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished.into()),
            451 => Err(FtpTransferServerError::ServerFailed.into()),
            551 => Err(FtpTransferServerError::PageTypeUnknown.into()),
            552 => Err(FtpTransferServerError::ExceededStorageAllocation.into()),
            421 => Err(FtpFileTransferError::ServiceNotAvailable),
            100..=199 => Ok(FtpTransferStartStatus::Proceed),
            200..=299 => Ok(FtpTransferStartStatus::Finished),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    pub(crate) async fn wait_store_end(&mut self) -> Result<(), FtpTransferServerError> {
        let reply = self.read_raw_response().await?;
        match reply.code() {
            110 => Err(FtpTransferServerError::RestartNeeded),
            200..=299 => Ok(()),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            551 => Err(FtpTransferServerError::PageTypeUnknown),
            552 => Err(FtpTransferServerError::ExceededStorageAllocation),
            n => Err(FtpTransferServerError::UnexpectedEndReplyCode(
                FtpCommand::STOR,
                n,
            )),
        }
    }

    async fn start_list_cmd(
        &mut self,
        cmd: FtpCommand,
        path: &str,
    ) -> Result<FtpTransferStartStatus, FtpFileListError> {
        self.send_cmd_opt(cmd, path)
            .await
            .map_err(FtpCommandError::SendFailed)?;

        let reply = self
            .timed_read_raw_response("start list")
            .await
            .map_err(FtpCommandError::RecvFailed)?;
        match reply.code() {
            // 500 is also used for unknown commands by many servers
            500 | 502 => Err(FtpCommandError::CommandNotImplemented(cmd).into()),
            501 => Err(FtpCommandError::RejectedCommandSyntax(cmd).into()),
            504 => Err(FtpCommandError::ParameterNotImplemented(cmd).into()),
            530 => Err(FtpCommandError::NotLoggedIn.into()),
            450 | 550 => Err(FtpFileListError::FileUnavailable),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished.into()),
            426 => Err(FtpTransferServerError::DataTransferLost.into()),
            451 => Err(FtpTransferServerError::ServerFailed.into()),
            421 => Err(FtpFileListError::ServiceNotAvailable),
            100..=199 => Ok(FtpTransferStartStatus::Proceed),
            200..=299 => Ok(FtpTransferStartStatus::Finished),
            n => Err(FtpCommandError::UnexpectedReplyCode(cmd, n).into()),
        }
    }

    #[inline]
    pub(crate) async fn start_mlsd(
        &mut self,
        path: &str,
    ) -> Result<FtpTransferStartStatus, FtpFileListError> {
        self.start_list_cmd(FtpCommand::MLSD, path).await
    }

    #[inline]
    pub(crate) async fn start_nlst(
        &mut self,
        path: &str,
    ) -> Result<FtpTransferStartStatus, FtpFileListError> {
        self.start_list_cmd(FtpCommand::NLST, path).await
    }

    pub(crate) async fn wait_list_end(
        &mut self,
        cmd: FtpCommand,
    ) -> Result<(), FtpTransferServerError> {
        let reply = self.read_raw_response().await?;
        match reply.code() {
            200..=299 => Ok(()),
            425 => Err(FtpTransferServerError::DataTransferNotEstablished),
            426 => Err(FtpTransferServerError::DataTransferLost),
            451 => Err(FtpTransferServerError::ServerFailed),
            450 | 550 => Err(FtpTransferServerError::FileUnavailable),
            n => Err(FtpTransferServerError::UnexpectedEndReplyCode(cmd, n)),
        }
    }
}
