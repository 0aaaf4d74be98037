/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::FtpServerAddr;

mod stream;
pub use stream::FtpStream;

mod tcp;
pub use tcp::TcpConnectionProvider;

mod tls;
pub use tls::FtpTlsConfig;

/// Opens the transport connections used by a client session.
///
/// Timeouts are applied by the caller.
#[async_trait]
pub trait FtpConnectionProvider<S: AsyncRead + AsyncWrite> {
    /// Open the control connection, with TLS from the first byte if `implicit_tls` is set.
    async fn new_control_connection(
        &mut self,
        server: &FtpServerAddr,
        implicit_tls: bool,
    ) -> io::Result<S>;

    /// Start TLS on an established plain control connection, after `AUTH TLS`.
    async fn upgrade_control_connection(
        &mut self,
        stream: S,
        server: &FtpServerAddr,
    ) -> io::Result<S>;

    /// Open a data connection to the address returned in a PASV reply.
    async fn new_data_connection(
        &mut self,
        server: &FtpServerAddr,
        data_addr: SocketAddr,
        protected: bool,
    ) -> io::Result<S>;
}
