/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use tokio_test::io::Mock;

use super::FtpClient;
use crate::{FtpClientConfig, FtpConnectionProvider, FtpServerAddr};

/// Hands out prepared mock streams in place of real connections.
#[derive(Default)]
pub(super) struct MockConnectionProvider {
    control: Option<Mock>,
    data: VecDeque<Mock>,
    pub(super) upgraded: usize,
    pub(super) data_addrs: Vec<SocketAddr>,
}

impl MockConnectionProvider {
    pub(super) fn new(control: Mock, data: Vec<Mock>) -> Self {
        MockConnectionProvider {
            control: Some(control),
            data: data.into(),
            upgraded: 0,
            data_addrs: Vec::new(),
        }
    }
}

#[async_trait]
impl FtpConnectionProvider<Mock> for MockConnectionProvider {
    async fn new_control_connection(
        &mut self,
        _server: &FtpServerAddr,
        _implicit_tls: bool,
    ) -> io::Result<Mock> {
        self.control
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }

    async fn upgrade_control_connection(
        &mut self,
        stream: Mock,
        _server: &FtpServerAddr,
    ) -> io::Result<Mock> {
        self.upgraded += 1;
        Ok(stream)
    }

    async fn new_data_connection(
        &mut self,
        _server: &FtpServerAddr,
        data_addr: SocketAddr,
        _protected: bool,
    ) -> io::Result<Mock> {
        self.data_addrs.push(data_addr);
        self.data
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "refused"))
    }
}

pub(super) fn new_test_client(
    provider: MockConnectionProvider,
) -> FtpClient<MockConnectionProvider, Mock> {
    FtpClient::new(FtpClientConfig::default(), provider)
}
