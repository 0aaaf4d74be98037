/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::net::{TcpSocket, TcpStream};
use tokio_rustls::TlsConnector;

use super::{FtpConnectionProvider, FtpStream};
use crate::FtpServerAddr;

/// The default transport: TCP connections from the local host, with rustls for TLS.
#[derive(Default)]
pub struct TcpConnectionProvider {
    bind_ip: Option<IpAddr>,
    tls_config: Option<Arc<ClientConfig>>,
    use_control_peer_ip: bool,
    control_peer: Option<SocketAddr>,
}

impl TcpConnectionProvider {
    pub fn set_bind_ip(&mut self, ip: IpAddr) {
        self.bind_ip = Some(ip);
    }

    pub fn set_tls_config(&mut self, config: Arc<ClientConfig>) {
        self.tls_config = Some(config);
    }

    /// Connect data connections to the control connection peer IP, and only
    /// take the port from the PASV reply.
    ///
    /// Needed for servers behind NAT that report their private address.
    pub fn set_use_control_peer_ip(&mut self, enable: bool) {
        self.use_control_peer_ip = enable;
    }

    fn new_socket_to(&self, peer: SocketAddr, keepalive: bool) -> io::Result<TcpSocket> {
        let socket = match peer {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }?;
        if let Some(ip) = self.bind_ip {
            if ip.is_ipv4() == peer.is_ipv4() {
                socket.bind(SocketAddr::new(ip, 0))?;
            }
        }
        if keepalive {
            socket.set_keepalive(true)?;
        }
        Ok(socket)
    }

    async fn tls_connect(
        &self,
        stream: TcpStream,
        server: &FtpServerAddr,
    ) -> io::Result<FtpStream> {
        let Some(config) = &self.tls_config else {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "no tls client config set",
            ));
        };
        let server_name = ServerName::try_from(server.host().to_string())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let connector = TlsConnector::from(config.clone());
        let tls_stream = connector.connect(server_name, stream).await?;
        Ok(FtpStream::Tls(Box::new(tls_stream)))
    }
}

#[async_trait]
impl FtpConnectionProvider<FtpStream> for TcpConnectionProvider {
    async fn new_control_connection(
        &mut self,
        server: &FtpServerAddr,
        implicit_tls: bool,
    ) -> io::Result<FtpStream> {
        let mut err = io::Error::new(io::ErrorKind::AddrNotAvailable, "no addr resolved");
        for addr in tokio::net::lookup_host((server.host(), server.port())).await? {
            let socket = self.new_socket_to(addr, true)?;
            match socket.connect(addr).await {
                Ok(stream) => {
                    log::debug!("control connection to {server} connected via {addr}");
                    self.control_peer = Some(addr);
                    return if implicit_tls {
                        self.tls_connect(stream, server).await
                    } else {
                        Ok(FtpStream::Plain(stream))
                    };
                }
                Err(e) => {
                    log::debug!("failed to connect to {addr}: {e}");
                    err = e;
                }
            }
        }

        Err(err)
    }

    async fn upgrade_control_connection(
        &mut self,
        stream: FtpStream,
        server: &FtpServerAddr,
    ) -> io::Result<FtpStream> {
        match stream {
            FtpStream::Plain(tcp) => self.tls_connect(tcp, server).await,
            FtpStream::Tls(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "control connection is already protected",
            )),
        }
    }

    async fn new_data_connection(
        &mut self,
        server: &FtpServerAddr,
        data_addr: SocketAddr,
        protected: bool,
    ) -> io::Result<FtpStream> {
        let peer = match self.control_peer {
            Some(control) if self.use_control_peer_ip || data_addr.ip().is_unspecified() => {
                SocketAddr::new(control.ip(), data_addr.port())
            }
            _ => data_addr,
        };

        let socket = self.new_socket_to(peer, false)?;
        let stream = socket.connect(peer).await?;
        if protected {
            self.tls_connect(stream, server).await
        } else {
            Ok(FtpStream::Plain(stream))
        }
    }
}
