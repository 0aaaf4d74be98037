/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::{AsyncRead, AsyncSeekExt, AsyncWrite, AsyncWriteExt};

use super::{FtpClient, FtpSession};
use crate::control::FtpTransferStartStatus;
use crate::error::{FtpDataCopyError, FtpError, FtpFileTransferError};
use crate::transfer::{FtpTransferType, copy_with_idle_timeout};
use crate::{FtpClientConfig, FtpConnectionProvider};

impl<S> FtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn wait_retrieve_end(
        &mut self,
        config: &FtpClientConfig,
    ) -> Result<(), FtpFileTransferError> {
        match tokio::time::timeout(
            config.transfer.end_wait_timeout,
            self.control.wait_retrieve_end(),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                self.control.set_out_of_sync();
                Err(FtpFileTransferError::TimeoutToWaitEndReply)
            }
        }
    }

    async fn wait_store_end(
        &mut self,
        config: &FtpClientConfig,
    ) -> Result<(), FtpFileTransferError> {
        match tokio::time::timeout(
            config.transfer.end_wait_timeout,
            self.control.wait_store_end(),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                self.control.set_out_of_sync();
                Err(FtpFileTransferError::TimeoutToWaitEndReply)
            }
        }
    }

    async fn download<CP, W>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
        destination: &mut W,
        remote_path: &str,
        transfer_type: FtpTransferType,
        resume_offset: u64,
    ) -> Result<u64, FtpError>
    where
        CP: FtpConnectionProvider<S>,
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.check_data_mode()?;
        self.control
            .request_transfer_type(transfer_type)
            .await
            .map_err(FtpFileTransferError::from)?;

        let mut data = self.open_passive(provider, config).await?;
        if resume_offset > 0 {
            self.control
                .request_restart(resume_offset)
                .await
                .map_err(FtpFileTransferError::from)?;
        }
        let status = self.control.start_retrieve(remote_path).await?;

        let copy_result = copy_with_idle_timeout(
            &mut data,
            destination,
            config.transfer.copy_buffer_size,
            config.transfer.data_idle_timeout,
        )
        .await;
        drop(data);

        let copied = match copy_result {
            Ok(n) => n,
            Err(e) => {
                if status == FtpTransferStartStatus::Proceed {
                    // keep the control connection in sync
                    if let Err(e) = self.wait_retrieve_end(config).await {
                        log::debug!("end reply of failed retrieve from {}: {e}", self.server);
                    }
                }
                let e = match e {
                    FtpDataCopyError::ReadFailed(e) => FtpFileTransferError::DataReadFailed(e),
                    FtpDataCopyError::WriteFailed(e) => FtpFileTransferError::LocalWriteFailed(e),
                    FtpDataCopyError::IdleTimedOut => FtpFileTransferError::DataIdleTimedOut,
                };
                return Err(e.into());
            }
        };

        if status == FtpTransferStartStatus::Proceed {
            self.wait_retrieve_end(config).await?;
        }
        log::debug!(
            "retrieved {copied} bytes of {remote_path} from {} at offset {resume_offset}",
            self.server
        );
        Ok(copied)
    }

    async fn upload<CP, R>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
        source: &mut R,
        remote_path: &str,
        transfer_type: FtpTransferType,
        start_offset: u64,
    ) -> Result<u64, FtpError>
    where
        CP: FtpConnectionProvider<S>,
        R: AsyncRead + Unpin + ?Sized,
    {
        self.check_data_mode()?;
        self.control
            .request_transfer_type(transfer_type)
            .await
            .map_err(FtpFileTransferError::from)?;

        let mut data = self.open_passive(provider, config).await?;
        if start_offset > 0 {
            self.control
                .request_restart(start_offset)
                .await
                .map_err(FtpFileTransferError::from)?;
        }
        let status = self.control.start_store(remote_path).await?;

        let copy_result = match copy_with_idle_timeout(
            source,
            &mut data,
            config.transfer.copy_buffer_size,
            config.transfer.data_idle_timeout,
        )
        .await
        {
            Ok(n) => {
                // the server takes the close of the data connection as EOF
                match tokio::time::timeout(config.transfer.data_idle_timeout, data.shutdown())
                    .await
                {
                    Ok(Ok(_)) => Ok(n),
                    Ok(Err(e)) => Err(FtpFileTransferError::DataWriteFailed(e)),
                    Err(_) => Err(FtpFileTransferError::DataIdleTimedOut),
                }
            }
            Err(FtpDataCopyError::ReadFailed(e)) => Err(FtpFileTransferError::LocalReadFailed(e)),
            Err(FtpDataCopyError::WriteFailed(e)) => Err(FtpFileTransferError::DataWriteFailed(e)),
            Err(FtpDataCopyError::IdleTimedOut) => Err(FtpFileTransferError::DataIdleTimedOut),
        };
        drop(data);

        let copied = match copy_result {
            Ok(n) => n,
            Err(e) => {
                if status == FtpTransferStartStatus::Proceed {
                    if let Err(e) = self.wait_store_end(config).await {
                        log::debug!("end reply of failed store to {}: {e}", self.server);
                    }
                }
                return Err(e.into());
            }
        };

        if status == FtpTransferStartStatus::Proceed {
            self.wait_store_end(config).await?;
        }
        log::debug!(
            "stored {copied} bytes to {remote_path} on {} at offset {start_offset}",
            self.server
        );
        Ok(copied)
    }
}

impl<CP, S> FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Download `remote_path` into `destination`, and return the number of bytes received.
    ///
    /// The session must be logged in.
    ///
    /// With a non-zero `resume_offset`, `REST` is sent and the server starts at that offset.
    pub async fn download<W>(
        &mut self,
        destination: &mut W,
        remote_path: &str,
        transfer_type: FtpTransferType,
        resume_offset: u64,
    ) -> Result<u64, FtpError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let (provider, session, config) = self.authenticated_parts()?;
        let r = session
            .download(
                provider,
                config,
                destination,
                remote_path,
                transfer_type,
                resume_offset,
            )
            .await;
        self.finish_operation(r).await
    }

    /// Upload all data from `source` to `remote_path`, and return the number of bytes sent.
    ///
    /// With a non-zero `start_offset`, `REST` is sent and the server writes from that offset.
    /// The source should already be positioned at the data to send.
    pub async fn upload<R>(
        &mut self,
        source: &mut R,
        remote_path: &str,
        transfer_type: FtpTransferType,
        start_offset: u64,
    ) -> Result<u64, FtpError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let (provider, session, config) = self.authenticated_parts()?;
        let r = session
            .upload(
                provider,
                config,
                source,
                remote_path,
                transfer_type,
                start_offset,
            )
            .await;
        self.finish_operation(r).await
    }

    /// Download into a local file.
    ///
    /// The file is truncated if `resume_offset` is zero, otherwise the data is
    /// written starting at `resume_offset`.
    pub async fn download_to_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        transfer_type: FtpTransferType,
        resume_offset: u64,
    ) -> Result<u64, FtpError> {
        self.check_authenticated()?;

        let mut options = OpenOptions::new();
        options.create(true).write(true);
        if resume_offset == 0 {
            options.truncate(true);
        }
        let mut file = options
            .open(local_path)
            .await
            .map_err(FtpFileTransferError::LocalWriteFailed)?;
        if resume_offset > 0 {
            file.seek(SeekFrom::Start(resume_offset))
                .await
                .map_err(FtpFileTransferError::LocalWriteFailed)?;
        }

        let copied = self
            .download(&mut file, remote_path, transfer_type, resume_offset)
            .await?;
        file.sync_all()
            .await
            .map_err(FtpFileTransferError::LocalWriteFailed)?;
        Ok(copied)
    }

    /// Upload a local file, starting from `start_offset` in both files.
    pub async fn upload_from_file(
        &mut self,
        local_path: &Path,
        remote_path: &str,
        transfer_type: FtpTransferType,
        start_offset: u64,
    ) -> Result<u64, FtpError> {
        self.check_authenticated()?;

        let mut file = tokio::fs::File::open(local_path)
            .await
            .map_err(FtpFileTransferError::LocalReadFailed)?;
        if start_offset > 0 {
            file.seek(SeekFrom::Start(start_offset))
                .await
                .map_err(FtpFileTransferError::LocalReadFailed)?;
        }

        self.upload(&mut file, remote_path, transfer_type, start_offset)
            .await
    }

    pub async fn size(&mut self, path: &str) -> Result<u64, FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .request_size(path)
            .await
            .map_err(FtpError::size_unavailable);
        self.finish_operation(r).await
    }

    /// Get the modification time as the raw `YYYYMMDDHHMMSS[.sss]` string.
    pub async fn modification_time(&mut self, path: &str) -> Result<String, FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .request_mtime(path)
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    pub async fn rename(&mut self, from: &str, to: &str) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        let r = match session.control.rename_from(from).await {
            Ok(_) => session.control.rename_to(to).await,
            Err(e) => Err(e),
        }
        .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .delete_file(path)
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    pub async fn remove_directory(&mut self, path: &str) -> Result<(), FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .remove_dir(path)
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }

    /// Create a directory, and return its path if the server reported it.
    pub async fn make_directory(&mut self, path: &str) -> Result<Option<String>, FtpError> {
        let session = self.session_mut()?;
        let r = session
            .control
            .make_dir(path)
            .await
            .map_err(FtpError::command_failed);
        self.finish_operation(r).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::mock::{MockConnectionProvider, new_test_client};
    use super::*;
    use crate::{FtpClientState, FtpErrorKind, FtpServerAddr, FtpTlsMode};
    use tokio_test::io::Builder;

    fn logged_in() -> Builder {
        let mut builder = Builder::new();
        builder
            .read(b"220 ready\r\n")
            .write(b"USER anonymous\r\n")
            .read(b"230 logged in\r\n");
        builder
    }

    async fn connected_client(
        control: tokio_test::io::Mock,
        data: Vec<tokio_test::io::Mock>,
    ) -> FtpClient<MockConnectionProvider, tokio_test::io::Mock> {
        let mut client = new_test_client(MockConnectionProvider::new(control, data));
        client
            .connect(&FtpServerAddr::new("ftp.example.net", 21), FtpTlsMode::Plain)
            .await
            .unwrap();
        client.login(None, None).await.unwrap();
        client
    }

    #[tokio::test]
    async fn download_resume() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"REST 100\r\n")
            .read(b"350 restarting at 100\r\n")
            .write(b"RETR data.bin\r\n")
            .read(b"150 opening data connection\r\n")
            .read(b"226 transfer complete\r\n")
            .build();
        // remote size is 150
        let data = Builder::new().read(&[b'x'; 50]).build();
        let mut client = connected_client(control, vec![data]).await;

        let mut buf: Vec<u8> = Vec::new();
        let n = client
            .download(&mut buf, "data.bin", FtpTransferType::Binary, 100)
            .await
            .unwrap();
        assert_eq!(n, 50);
        assert_eq!(buf.len(), 50);
    }

    #[tokio::test]
    async fn download_file_unavailable() {
        let control = logged_in()
            .write(b"TYPE A\r\n")
            .read(b"200 ascii\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"RETR missing.txt\r\n")
            .read(b"550 no such file\r\n")
            .build();
        let data = Builder::new().build();
        let mut client = connected_client(control, vec![data]).await;

        let mut buf: Vec<u8> = Vec::new();
        let e = client
            .download(&mut buf, "missing.txt", FtpTransferType::Ascii, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::TransferFailed);
        assert!(matches!(
            e,
            FtpError::TransferFailed(FtpFileTransferError::FileUnavailable)
        ));
    }

    #[tokio::test]
    async fn download_lost() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"RETR a.bin\r\n")
            .read(b"150 opening data connection\r\n")
            .read(b"426 connection closed, transfer aborted\r\n")
            .build();
        let data = Builder::new().read(b"partial").build();
        let mut client = connected_client(control, vec![data]).await;

        let mut buf: Vec<u8> = Vec::new();
        let e = client
            .download(&mut buf, "a.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::TransferFailed);
        assert_eq!(buf, b"partial");
    }

    #[tokio::test]
    async fn download_finished_at_start() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"RETR empty.bin\r\n")
            .read(b"226 nothing to send\r\n")
            .write(b"NOOP\r\n")
            .read(b"200 ok\r\n")
            .build();
        let data = Builder::new().build();
        let mut client = connected_client(control, vec![data]).await;

        let mut buf: Vec<u8> = Vec::new();
        let n = client
            .download(&mut buf, "empty.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap();
        assert_eq!(n, 0);
        client.noop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn download_end_reply_timed_out() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"RETR a.bin\r\n")
            .read(b"150 opening data connection\r\n")
            .wait(Duration::from_secs(15))
            .build();
        let data = Builder::new().read(b"abc").build();
        let mut client = connected_client(control, vec![data]).await;

        let mut buf: Vec<u8> = Vec::new();
        let e = client
            .download(&mut buf, "a.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::TransferFailed);
        assert!(matches!(
            e,
            FtpError::TransferFailed(FtpFileTransferError::TimeoutToWaitEndReply)
        ));
        assert_eq!(buf, b"abc");
        assert_eq!(client.state(), FtpClientState::Disconnected);

        let e = client
            .download(&mut buf, "b.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn upload() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"STOR up.txt\r\n")
            .read(b"150 ok to send data\r\n")
            .read(b"226 transfer complete\r\n")
            .build();
        let data = Builder::new().write(b"hello world").build();
        let mut client = connected_client(control, vec![data]).await;

        let mut source: &[u8] = b"hello world";
        let n = client
            .upload(&mut source, "up.txt", FtpTransferType::Binary, 0)
            .await
            .unwrap();
        assert_eq!(n, 11);
    }

    #[tokio::test]
    async fn upload_storage_full() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"REST 5\r\n")
            .read(b"350 ok\r\n")
            .write(b"STOR up.txt\r\n")
            .read(b"150 ok to send data\r\n")
            .read(b"552 exceeded storage allocation\r\n")
            .build();
        let data = Builder::new().write(b"world").build();
        let mut client = connected_client(control, vec![data]).await;

        let mut source: &[u8] = b"world";
        let e = client
            .upload(&mut source, "up.txt", FtpTransferType::Binary, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            e,
            FtpError::TransferFailed(FtpFileTransferError::ServerReportedError(_))
        ));
    }

    #[tokio::test]
    async fn download_to_file_resume() {
        let control = logged_in()
            .write(b"TYPE I\r\n")
            .read(b"200 binary\r\n")
            .write(b"PASV\r\n")
            .read(b"227 Entering Passive Mode (127,0,0,1,4,0)\r\n")
            .write(b"REST 5\r\n")
            .read(b"350 ok\r\n")
            .write(b"RETR hello.txt\r\n")
            .read(b"150 opening data connection\r\n")
            .read(b"226 transfer complete\r\n")
            .build();
        let data = Builder::new().read(b" world").build();
        let mut client = connected_client(control, vec![data]).await;

        let local = std::env::temp_dir().join(format!("ftpc-resume-{}.txt", std::process::id()));
        std::fs::write(&local, b"hello").unwrap();
        let n = client
            .download_to_file(&local, "hello.txt", FtpTransferType::Binary, 5)
            .await
            .unwrap();
        assert_eq!(n, 6);
        assert_eq!(std::fs::read(&local).unwrap(), b"hello world");
        std::fs::remove_file(&local).unwrap();
    }

    #[tokio::test]
    async fn transfer_not_logged_in() {
        let control = Builder::new().read(b"220 ready\r\n").build();
        let mut client = new_test_client(MockConnectionProvider::new(control, vec![]));
        client
            .connect(&FtpServerAddr::new("ftp.example.net", 21), FtpTlsMode::Plain)
            .await
            .unwrap();

        let mut source: &[u8] = b"data";
        let e = client
            .upload(&mut source, "a.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::AuthenticationFailed);
        assert!(client.provider.data_addrs.is_empty());
    }

    #[tokio::test]
    async fn transfer_in_active_mode() {
        let control = logged_in().build();
        let mut client = connected_client(control, vec![]).await;
        client.set_passive(false).unwrap();
        assert_eq!(client.is_passive(), Some(false));

        let mut buf: Vec<u8> = Vec::new();
        let e = client
            .download(&mut buf, "a.bin", FtpTransferType::Binary, 0)
            .await
            .unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::DataConnectionFailed);
    }

    #[tokio::test]
    async fn size() {
        let control = logged_in()
            .write(b"SIZE a.bin\r\n")
            .read(b"213 150\r\n")
            .write(b"SIZE b.bin\r\n")
            .read(b"550 could not get file size\r\n")
            .write(b"SIZE c.bin\r\n")
            .read(b"213 large\r\n")
            .build();
        let mut client = connected_client(control, vec![]).await;
        assert_eq!(client.size("a.bin").await.unwrap(), 150);
        let e = client.size("b.bin").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::SizeUnavailable);
        let e = client.size("c.bin").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::ProtocolError);
    }

    #[tokio::test(start_paused = true)]
    async fn size_reply_timed_out() {
        let control = logged_in()
            .write(b"SIZE a.bin\r\n")
            .wait(Duration::from_secs(15))
            .build();
        let mut client = connected_client(control, vec![]).await;

        let e = client.size("a.bin").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::SizeUnavailable);
        assert_eq!(client.state(), FtpClientState::Disconnected);

        // the late reply to the first SIZE must not be taken for this one
        let e = client.size("b.bin").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn file_commands() {
        let control = logged_in()
            .write(b"RNFR a.txt\r\n")
            .read(b"350 ready for destination\r\n")
            .write(b"RNTO b.txt\r\n")
            .read(b"250 renamed\r\n")
            .write(b"RNFR c.txt\r\n")
            .read(b"550 no such file\r\n")
            .write(b"DELE b.txt\r\n")
            .read(b"250 deleted\r\n")
            .write(b"MKD new dir\r\n")
            .read(b"257 \"/pub/new dir\" created\r\n")
            .write(b"RMD old\r\n")
            .read(b"550 not empty\r\n")
            .write(b"MDTM b.txt\r\n")
            .read(b"213 20230101120000\r\n")
            .build();
        let mut client = connected_client(control, vec![]).await;
        client.rename("a.txt", "b.txt").await.unwrap();
        let e = client.rename("c.txt", "d.txt").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::CommandFailed);
        client.delete("b.txt").await.unwrap();
        assert_eq!(
            client.make_directory("new dir").await.unwrap().as_deref(),
            Some("/pub/new dir")
        );
        let e = client.remove_directory("old").await.unwrap_err();
        assert_eq!(e.kind(), FtpErrorKind::CommandFailed);
        assert_eq!(
            client.modification_time("b.txt").await.unwrap(),
            "20230101120000"
        );
    }
}
