/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpSession;
use crate::error::FtpTransferSetupError;
use crate::{FtpClientConfig, FtpConnectionProvider};

impl<S> FtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Only passive mode can be used to set up data connections.
    pub(super) fn check_data_mode(&self) -> Result<(), FtpTransferSetupError> {
        if self.passive {
            Ok(())
        } else {
            Err(FtpTransferSetupError::ActiveModeUnsupported)
        }
    }

    /// Send `PASV` and connect to the returned address.
    pub(super) async fn open_passive<CP>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
    ) -> Result<S, FtpTransferSetupError>
    where
        CP: FtpConnectionProvider<S>,
    {
        self.check_data_mode()?;

        let data_addr = self.control.request_pasv_port().await?;
        log::debug!("passive data address from {}: {data_addr}", self.server);

        match tokio::time::timeout(
            config.connect_timeout,
            provider.new_data_connection(&self.server, data_addr, self.data_protected),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(FtpTransferSetupError::ConnectFailed(data_addr, e)),
            Err(_) => Err(FtpTransferSetupError::ConnectTimedOut(data_addr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::str::FromStr;

    use super::super::mock::{MockConnectionProvider, new_test_client};
    use crate::{FtpErrorKind, FtpServerAddr, FtpTlsMode};
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn open_passive() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (192,168,1,1,19,136).\r\n")
            .build();
        let data = Builder::new().build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![data]));
        client
            .connect(&FtpServerAddr::new("ftp.example.net", 21), FtpTlsMode::Plain)
            .await
            .unwrap();

        let (provider, session, config) = client.session_parts().unwrap();
        let stream = session.open_passive(provider, config).await.unwrap();
        drop(stream);
        assert_eq!(
            client.provider.data_addrs,
            vec![SocketAddr::from_str("192.168.1.1:5000").unwrap()]
        );
    }

    #[tokio::test]
    async fn open_passive_failed() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (10,0,0,1,0,21)\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode 10,0,0,1\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client
            .connect(&FtpServerAddr::new("ftp.example.net", 21), FtpTlsMode::Plain)
            .await
            .unwrap();

        let (provider, session, config) = client.session_parts().unwrap();
        let e = session.open_passive(provider, config).await.unwrap_err();
        assert_eq!(
            crate::FtpError::from(e).kind(),
            FtpErrorKind::DataConnectionFailed
        );

        let (provider, session, config) = client.session_parts().unwrap();
        let e = session.open_passive(provider, config).await.unwrap_err();
        assert_eq!(crate::FtpError::from(e).kind(), FtpErrorKind::ProtocolError);
    }
}
