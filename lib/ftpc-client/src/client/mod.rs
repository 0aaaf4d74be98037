/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::control::FtpControlChannel;
use crate::error::{FtpAuthError, FtpAuthStatus, FtpConnectError, FtpError, FtpFileStatError};
use crate::feature::FtpServerFeature;
use crate::{
    FtpClientConfig, FtpConnectionProvider, FtpServerAddr, FtpStream, FtpTlsMode,
    TcpConnectionProvider,
};

mod data;
mod file;
mod list;

#[cfg(test)]
mod mock;

pub(crate) struct FtpSession<S: AsyncRead + AsyncWrite> {
    server: FtpServerAddr,
    control: FtpControlChannel<S>,
    passive: bool,
    data_protected: bool,
    feature: Option<FtpServerFeature>,
}

enum FtpSessionState<S: AsyncRead + AsyncWrite> {
    Disconnected,
    Connected(FtpSession<S>),
    Authenticated(FtpSession<S>),
}

/// The connection state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FtpClientState {
    Disconnected,
    Connected,
    Authenticated,
}

/// An FTP client session.
///
/// Every operation takes `&mut self`, so at most one command is in flight on
/// the control connection. All operations but [`FtpClient::connect`] need a
/// connected session and fail with [`FtpError::NotConnected`] otherwise.
pub struct FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    config: FtpClientConfig,
    provider: CP,
    state: FtpSessionState<S>,
}

/// The client with the default TCP transport.
pub type FtpTcpClient = FtpClient<TcpConnectionProvider, FtpStream>;

impl<CP, S> FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(config: FtpClientConfig, provider: CP) -> Self {
        FtpClient {
            config,
            provider,
            state: FtpSessionState::Disconnected,
        }
    }

    #[inline]
    pub fn config(&self) -> &FtpClientConfig {
        &self.config
    }

    pub fn state(&self) -> FtpClientState {
        match self.state {
            FtpSessionState::Disconnected => FtpClientState::Disconnected,
            FtpSessionState::Connected(_) => FtpClientState::Connected,
            FtpSessionState::Authenticated(_) => FtpClientState::Authenticated,
        }
    }

    fn session_mut(&mut self) -> Result<&mut FtpSession<S>, FtpError> {
        match &mut self.state {
            FtpSessionState::Disconnected => Err(FtpError::NotConnected),
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => Ok(s),
        }
    }

    fn session_parts(
        &mut self,
    ) -> Result<(&mut CP, &mut FtpSession<S>, &FtpClientConfig), FtpError> {
        let session = match &mut self.state {
            FtpSessionState::Disconnected => return Err(FtpError::NotConnected),
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => s,
        };
        Ok((&mut self.provider, session, &self.config))
    }

    fn check_authenticated(&self) -> Result<(), FtpError> {
        match self.state {
            FtpSessionState::Disconnected => Err(FtpError::NotConnected),
            FtpSessionState::Connected(_) => Err(FtpAuthError::NotLoggedIn.into()),
            FtpSessionState::Authenticated(_) => Ok(()),
        }
    }

    /// Like `session_parts`, for operations that need a logged in session.
    fn authenticated_parts(
        &mut self,
    ) -> Result<(&mut CP, &mut FtpSession<S>, &FtpClientConfig), FtpError> {
        self.check_authenticated()?;
        self.session_parts()
    }

    fn set_authenticated(&mut self, authenticated: bool) {
        self.state = match std::mem::replace(&mut self.state, FtpSessionState::Disconnected) {
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => {
                if authenticated {
                    FtpSessionState::Authenticated(s)
                } else {
                    FtpSessionState::Connected(s)
                }
            }
            FtpSessionState::Disconnected => FtpSessionState::Disconnected,
        };
    }

    /// Close the session if its control connection lost track of the replies.
    ///
    /// A late reply must never be taken as the answer to a later command.
    async fn close_out_of_sync_session(&mut self) {
        let out_of_sync = match &self.state {
            FtpSessionState::Disconnected => false,
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => {
                s.control.is_out_of_sync()
            }
        };
        if !out_of_sync {
            return;
        }

        let session = match std::mem::replace(&mut self.state, FtpSessionState::Disconnected) {
            FtpSessionState::Disconnected => return,
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => s,
        };
        let FtpSession {
            server,
            control,
            ..
        } = session;
        log::warn!("control connection to {server} is out of sync, session closed");
        let mut stream = control.into_inner();
        match tokio::time::timeout(self.config.control.command_timeout, stream.shutdown()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => log::debug!("shutdown control connection to {server} failed: {e}"),
            Err(_) => log::debug!("shutdown control connection to {server} timed out"),
        }
    }

    async fn finish_operation<T>(&mut self, r: Result<T, FtpError>) -> Result<T, FtpError> {
        if r.is_err() {
            self.close_out_of_sync_session().await;
        }
        r
    }

    /// Connect to the server and wait for its greeting.
    ///
    /// With TLS enabled, the control connection is protected before returning,
    /// and all data connections will be protected too.
    pub async fn connect(
        &mut self,
        server: &FtpServerAddr,
        tls_mode: FtpTlsMode,
    ) -> Result<(), FtpError> {
        if !matches!(self.state, FtpSessionState::Disconnected) {
            return Err(FtpError::AlreadyConnected);
        }

        let session = self.new_session(server, tls_mode).await?;
        log::debug!("ftp session to {server} established, tls mode {tls_mode:?}");
        self.state = FtpSessionState::Connected(session);
        Ok(())
    }

    async fn new_session(
        &mut self,
        server: &FtpServerAddr,
        tls_mode: FtpTlsMode,
    ) -> Result<FtpSession<S>, FtpConnectError> {
        let connect_timeout = self.config.connect_timeout;
        let stream = tokio::time::timeout(
            connect_timeout,
            self.provider
                .new_control_connection(server, tls_mode == FtpTlsMode::Implicit),
        )
        .await
        .map_err(|_| FtpConnectError::ConnectTimedOut)?
        .map_err(FtpConnectError::ConnectFailed)?;

        let mut control = FtpControlChannel::new(stream, self.config.control.clone());
        match tokio::time::timeout(self.config.greeting_timeout, control.wait_greetings()).await {
            Ok(Ok(_)) => {}
            Ok(Err(crate::FtpCommandError::ServiceNotAvailable)) => {
                return Err(FtpConnectError::ServiceNotAvailable);
            }
            Ok(Err(e)) => return Err(FtpConnectError::GreetingFailed(e)),
            Err(_) => return Err(FtpConnectError::GreetingTimedOut),
        }

        if tls_mode == FtpTlsMode::Explicit {
            control
                .auth_tls()
                .await
                .map_err(FtpConnectError::TlsNegotiationFailed)?;
            let stream = control.into_inner();
            let stream = tokio::time::timeout(
                connect_timeout,
                self.provider.upgrade_control_connection(stream, server),
            )
            .await
            .map_err(|_| FtpConnectError::TlsUpgradeTimedOut)?
            .map_err(FtpConnectError::TlsUpgradeFailed)?;
            control = FtpControlChannel::new(stream, self.config.control.clone());
        }

        if tls_mode.is_tls() {
            control
                .set_protection_buffer_size()
                .await
                .map_err(FtpConnectError::TlsNegotiationFailed)?;
            control
                .set_private_protection()
                .await
                .map_err(FtpConnectError::TlsNegotiationFailed)?;
        }

        Ok(FtpSession {
            server: server.clone(),
            control,
            passive: self.config.passive,
            data_protected: tls_mode.is_tls(),
            feature: None,
        })
    }

    /// Log in, with `anonymous` as default user name.
    pub async fn login(
        &mut self,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), FtpError> {
        self.login_with_account(user, password, None).await
    }

    /// Log in, and send `ACCT` if the server asks for an account.
    pub async fn login_with_account(
        &mut self,
        user: Option<&str>,
        password: Option<&str>,
        account: Option<&str>,
    ) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        match session.login(user, password, account).await {
            Ok(_) => {
                log::debug!("logged in to {}", session.server);
                self.set_authenticated(true);
                Ok(())
            }
            Err(e) => {
                self.set_authenticated(false);
                self.finish_operation(Err(e.into())).await
            }
        }
    }

    /// Switch between passive mode and active mode for later data transfers.
    pub fn set_passive(&mut self, passive: bool) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        session.passive = passive;
        Ok(())
    }

    pub fn is_passive(&self) -> Option<bool> {
        match &self.state {
            FtpSessionState::Disconnected => None,
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => Some(s.passive),
        }
    }

    /// Query the current working directory from the server.
    pub async fn working_directory(&mut self) -> Result<String, FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .print_working_dir()
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    pub async fn set_working_directory(&mut self, path: &str) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .change_working_dir(path)
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    /// Get the server features from `FEAT`, the result is cached for the session.
    pub async fn server_features(&mut self) -> Result<FtpServerFeature, FtpError> {
        let session = self.session_mut()?;
        if let Some(feature) = &session.feature {
            return Ok(feature.clone());
        }
        match session.control.check_server_feature().await {
            Ok(feature) => {
                session.feature = Some(feature.clone());
                Ok(feature)
            }
            Err(e) => {
                self.finish_operation(Err(FtpError::command_failed(e.into())))
                    .await
            }
        }
    }

    pub async fn noop(&mut self) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .send_noop()
            .await
            .map_err(|e| FtpError::command_failed(e.into()));
        self.finish_operation(r).await
    }

    /// Send a command line as is, and return every line of the reply.
    ///
    /// The reply code is not checked.
    pub async fn send_raw_command(&mut self, command: &str) -> Result<Vec<String>, FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .send_raw(command)
            .await
            .map(|reply| reply.into_raw_lines())
            .map_err(|e| FtpError::command_failed(FtpFileStatError::RawCommandError(e)));
        self.finish_operation(r).await
    }

    /// Send `QUIT` and close the control connection.
    ///
    /// Errors from `QUIT` are ignored.
    pub async fn close(&mut self) -> Result<(), FtpError> {
        let session = match std::mem::replace(&mut self.state, FtpSessionState::Disconnected) {
            FtpSessionState::Disconnected => return Err(FtpError::NotConnected),
            FtpSessionState::Connected(s) | FtpSessionState::Authenticated(s) => s,
        };

        let FtpSession {
            server,
            mut control,
            ..
        } = session;
        if let Err(e) = control.send_quit().await {
            log::debug!("quit from {server} failed: {e}");
        }
        let mut stream = control.into_inner();
        if let Err(e) = stream.shutdown().await {
            log::debug!("shutdown control connection to {server} failed: {e}");
        }
        log::debug!("ftp session to {server} closed");
        Ok(())
    }
}

impl<S> FtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn login(
        &mut self,
        user: Option<&str>,
        password: Option<&str>,
        account: Option<&str>,
    ) -> Result<(), FtpAuthError> {
        let status = match self.control.send_username(user).await? {
            FtpAuthStatus::NeedPassword => self.control.send_password(password).await?,
            status => status,
        };

        let status = match status {
            FtpAuthStatus::NeedAccount => match account {
                Some(account) => self.control.send_account(account).await?,
                None => return Err(FtpAuthError::AccountIsNeeded),
            },
            status => status,
        };

        match status {
            FtpAuthStatus::LoggedIn => Ok(()),
            FtpAuthStatus::NeedAccount => Err(FtpAuthError::AccountIsNeeded),
            FtpAuthStatus::NotLoggedIn | FtpAuthStatus::NeedPassword => {
                Err(FtpAuthError::NotLoggedIn)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockConnectionProvider, new_test_client};
    use super::*;
    use crate::FtpErrorKind;
    use tokio_test::io::Builder;

    fn server() -> FtpServerAddr {
        FtpServerAddr::new("ftp.example.net", 21)
    }

    #[tokio::test]
    async fn connect_and_close() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"221 bye\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        assert_eq!(client.state(), FtpClientState::Disconnected);
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        assert_eq!(client.state(), FtpClientState::Connected);

        let e = client
            .connect(&server(), FtpTlsMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::AlreadyConnected);

        client.close().await.unwrap();
        assert_eq!(client.state(), FtpClientState::Disconnected);
        let e = client.close().await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn close_ignores_quit_error() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"QUIT\r\n")
            .read(b"500 what\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        client.close().await.unwrap();
        assert_eq!(client.state(), FtpClientState::Disconnected);
    }

    #[tokio::test]
    async fn not_connected() {
        let mut client = new_test_client(MockConnectionProvider::new(
            Builder::new().build(),
            vec![],
        ));
        let e = client.working_directory().await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
        let e = client.set_passive(false).unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
        let e = client.login(None, None).await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
        let e = client.send_raw_command("NOOP").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn greeting_service_not_available() {
        let control = Builder::new().read(b"421 too many users\r\n").build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        let e = client
            .connect(&server(), FtpTlsMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ConnectionFailed);
        assert_eq!(client.state(), FtpClientState::Disconnected);
    }

    #[tokio::test]
    async fn greeting_malformed() {
        let control = Builder::new().read(b"hello there\r\n").build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        let e = client
            .connect(&server(), FtpTlsMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ProtocolError);
    }

    #[tokio::test]
    async fn connect_refused() {
        let mut client = new_test_client(MockConnectionProvider::default());
        let e = client
            .connect(&server(), FtpTlsMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ConnectionFailed);
    }

    #[tokio::test]
    async fn explicit_tls() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"AUTH TLS\r\n")
            .read(b"234 go ahead\r\n")
            .write(b"PBSZ 0\r\n")
            .read(b"200 ok\r\n")
            .write(b"PROT P\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Explicit).await.unwrap();
        assert_eq!(client.provider.upgraded, 1);
        assert!(client.session_mut().unwrap().data_protected);
    }

    #[tokio::test]
    async fn explicit_tls_refused() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"AUTH TLS\r\n")
            .read(b"502 no tls here\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        let e = client
            .connect(&server(), FtpTlsMode::Explicit)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ConnectionFailed);
        assert_eq!(client.provider.upgraded, 0);
    }

    #[tokio::test]
    async fn login_ok() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER alice\r\n")
            .read(b"331 password please\r\n")
            .write(b"PASS secret\r\n")
            .read(b"230-Welcome\r\n230 logged in\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        client.login(Some("alice"), Some("secret")).await.unwrap();
        assert_eq!(client.state(), FtpClientState::Authenticated);
    }

    #[tokio::test]
    async fn login_failed() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER anonymous\r\n")
            .read(b"331 password please\r\n")
            .write(b"PASS anonymous@\r\n")
            .read(b"530 login incorrect\r\n")
            .write(b"USER bob\r\n")
            .read(b"332 need account\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();

        let e = client.login(None, None).await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::AuthenticationFailed);
        assert!(matches!(
            e,
            FtpError::AuthenticationFailed(FtpAuthError::NotLoggedIn)
        ));
        assert_eq!(client.state(), FtpClientState::Connected);

        let e = client.login(Some("bob"), None).await.unwrap_err();
        assert!(matches!(
            e,
            FtpError::AuthenticationFailed(FtpAuthError::AccountIsNeeded)
        ));
    }

    #[tokio::test]
    async fn login_with_account() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"USER bob\r\n")
            .read(b"331 password please\r\n")
            .write(b"PASS pw\r\n")
            .read(b"332 need account\r\n")
            .write(b"ACCT dept\r\n")
            .read(b"230 ok\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        client
            .login_with_account(Some("bob"), Some("pw"), Some("dept"))
            .await
            .unwrap();
        assert_eq!(client.state(), FtpClientState::Authenticated);
    }

    #[tokio::test]
    async fn working_directory() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"PWD\r\n")
            .read(b"257 \"/home/alice\" is current directory\r\n")
            .write(b"CWD pub\r\n")
            .read(b"250 ok\r\n")
            .write(b"PWD\r\n")
            .read(b"257 \"/home/alice/pub\"\r\n")
            .write(b"PWD\r\n")
            .read(b"257 home\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        assert_eq!(client.working_directory().await.unwrap(), "/home/alice");
        client.set_working_directory("pub").await.unwrap();
        assert_eq!(client.working_directory().await.unwrap(), "/home/alice/pub");
        let e = client.working_directory().await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ProtocolError);
    }

    #[tokio::test]
    async fn raw_command() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"SITE CHMOD 644 a.txt\r\n")
            .read(b"550 not permitted\r\n")
            .write(b"STAT\r\n")
            .read(b"211-status\r\n connected\r\n211 end\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        let lines = client
            .send_raw_command("SITE CHMOD 644 a.txt")
            .await
            .unwrap();
        assert_eq!(lines, vec!["550 not permitted"]);
        let lines = client.send_raw_command("STAT").await.unwrap();
        assert_eq!(lines, vec!["211-status", " connected", "211 end"]);
    }

    #[tokio::test]
    async fn broken_reply_closes_session() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"STAT\r\n")
            .read(b"211-status\r\n \xff\r\n211 end\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();

        let e = client.send_raw_command("STAT").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ProtocolError);
        assert_eq!(client.state(), FtpClientState::Disconnected);
        let e = client.noop().await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn working_directory_timed_out() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"PWD\r\n")
            .wait(std::time::Duration::from_secs(15))
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();

        let e = client.working_directory().await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::CommandFailed);
        assert_eq!(client.state(), FtpClientState::Disconnected);
    }

    #[tokio::test]
    async fn server_features_cached() {
        let control = Builder::new()
            .read(b"220 ready\r\n")
            .write(b"FEAT\r\n")
            .read(b"211-Features:\r\n MDTM\r\n REST STREAM\r\n211 End\r\n")
            .write(b"NOOP\r\n")
            .read(b"200 ok\r\n")
            .build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client.connect(&server(), FtpTlsMode::Plain).await.unwrap();
        let feature = client.server_features().await.unwrap();
        assert!(feature.support_mdtm());
        assert!(feature.support_rest_stream());
        let feature = client.server_features().await.unwrap();
        assert!(!feature.support_mlst());
        client.noop().await.unwrap();
    }
}
