/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use super::FtpControlChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FtpCommand(&'static str);

impl FtpCommand {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FtpCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! ftp_commands {
    (
        $(
            $(#[$docs:meta])*
            ($konst:ident, $phrase:expr);
        )+
    ) => {
        impl FtpCommand {
        $(
            $(#[$docs])*
            pub const $konst: FtpCommand = FtpCommand($phrase);
        )+
        }
    };
}

ftp_commands! {
    /// a fake command for greeting
    (GREETING, "-");
    (AUTH_TLS, "AUTH TLS");
    (PBSZ_0, "PBSZ 0");
    (PROT_P, "PROT P");
    (FEAT, "FEAT");
    (USER, "USER");
    (PASS, "PASS");
    (ACCT, "ACCT");
    (QUIT, "QUIT");
    (NOOP, "NOOP");
    (PWD, "PWD");
    (CWD, "CWD");
    (MKD, "MKD");
    (RNFR, "RNFR");
    (RNTO, "RNTO");
    (DELE, "DELE");
    (RMD, "RMD");
    (TYPE_A, "TYPE A");
    (TYPE_I, "TYPE I");
    (PASV, "PASV");
    (SIZE, "SIZE");
    (MDTM, "MDTM");
    (MLSD, "MLSD");
    (NLST, "NLST");
    (REST, "REST");
    (RETR, "RETR");
    (STOR, "STOR");
}

fn check_line_param(param: &str) -> io::Result<()> {
    if memchr::memchr2(b'\r', b'\n', param.as_bytes()).is_some() {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "line break is not allowed in command",
        ))
    } else {
        Ok(())
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn send_all(&mut self, buf: &[u8]) -> io::Result<()> {
        #[cfg(feature = "log-raw-io")]
        crate::debug::log_cmd(std::str::from_utf8(buf).unwrap_or_default().trim_end());

        let r = match self.stream.write_all(buf).await {
            Ok(_) => self.stream.flush().await,
            Err(e) => Err(e),
        };
        if r.is_err() {
            // part of the command may have been sent
            self.out_of_sync = true;
        }
        r
    }

    pub(super) async fn send_cmd(&mut self, cmd: FtpCommand) -> io::Result<()> {
        let len = cmd.0.len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.0.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }

    pub(super) async fn send_cmd1(&mut self, cmd: FtpCommand, param1: &str) -> io::Result<()> {
        check_line_param(param1)?;

        let len = cmd.0.len() + 1 + param1.len() + 2;
        let mut buf: Vec<u8> = Vec::with_capacity(len);
        buf.extend_from_slice(cmd.0.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(param1.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }

    /// Send a command with an optional path argument, like `MLSD` and `NLST`.
    pub(super) async fn send_cmd_opt(&mut self, cmd: FtpCommand, param1: &str) -> io::Result<()> {
        if param1.is_empty() {
            self.send_cmd(cmd).await
        } else {
            self.send_cmd1(cmd, param1).await
        }
    }

    pub(super) async fn send_line(&mut self, line: &str) -> io::Result<()> {
        check_line_param(line)?;

        let mut buf: Vec<u8> = Vec::with_capacity(line.len() + 2);
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");

        self.send_all(buf.as_ref()).await
    }
}
