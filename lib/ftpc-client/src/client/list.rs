/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::collections::BTreeMap;

use tokio::io::{AsyncRead, AsyncWrite};

use super::{FtpClient, FtpSession};
use crate::control::{FtpCommand, FtpTransferStartStatus};
use crate::error::{
    FtpCommandError, FtpError, FtpFileFactsParseError, FtpFileListError, FtpLineDataReadError,
};
use crate::facts::FtpFileEntry;
use crate::transfer::{FtpLineDataReceiver, FtpLineDataTransfer};
use crate::{FtpClientConfig, FtpConnectionProvider};

#[derive(Default)]
struct MlsdEntryReceiver {
    entries: Vec<FtpFileEntry>,
    parse_error: Option<FtpFileFactsParseError>,
}

impl FtpLineDataReceiver for MlsdEntryReceiver {
    fn recv_line(&mut self, line: &str) {
        match FtpFileEntry::parse_line(line) {
            Ok(entry) => {
                if !entry.is_self_or_parent() {
                    self.entries.push(entry);
                }
            }
            Err(e) => self.parse_error = Some(e),
        }
    }

    fn should_return_early(&self) -> bool {
        self.parse_error.is_some()
    }
}

#[derive(Default)]
struct NlstEntryReceiver {
    entries: Vec<FtpFileEntry>,
}

impl FtpLineDataReceiver for NlstEntryReceiver {
    fn recv_line(&mut self, line: &str) {
        let entry = FtpFileEntry::from_name_line(line);
        if !entry.name().is_empty() && !entry.is_self_or_parent() {
            self.entries.push(entry);
        }
    }

    fn should_return_early(&self) -> bool {
        false
    }
}

fn join_path(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

impl<S> FtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn wait_list_end(
        &mut self,
        config: &FtpClientConfig,
        cmd: FtpCommand,
    ) -> Result<(), FtpFileListError> {
        match tokio::time::timeout(
            config.transfer.end_wait_timeout,
            self.control.wait_list_end(cmd),
        )
        .await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                self.control.set_out_of_sync();
                Err(FtpFileListError::TimeoutToWaitEndReply)
            }
        }
    }

    async fn list_lines<CP, R>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
        cmd: FtpCommand,
        path: &str,
        receiver: &mut R,
    ) -> Result<(), FtpError>
    where
        CP: FtpConnectionProvider<S>,
        R: FtpLineDataReceiver,
    {
        let data = self.open_passive(provider, config).await?;
        let status = if cmd == FtpCommand::MLSD {
            self.control.start_mlsd(path).await?
        } else {
            self.control.start_nlst(path).await?
        };

        let transfer = FtpLineDataTransfer::new(data, &config.transfer);
        if let Err(e) = transfer.read_to_end(receiver).await {
            if status == FtpTransferStartStatus::Proceed {
                if let Err(e) = self.wait_list_end(config, cmd).await {
                    log::debug!("end reply of failed {cmd} from {}: {e}", self.server);
                }
            }
            return Err(FtpFileListError::DataReadFailed(e).into());
        }

        if status == FtpTransferStartStatus::Proceed {
            self.wait_list_end(config, cmd).await?;
        }
        Ok(())
    }

    async fn list_directory<CP>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
        path: &str,
    ) -> Result<Vec<FtpFileEntry>, FtpError>
    where
        CP: FtpConnectionProvider<S>,
    {
        let mut receiver = MlsdEntryReceiver::default();
        match self
            .list_lines(provider, config, FtpCommand::MLSD, path, &mut receiver)
            .await
        {
            Ok(_) => Ok(receiver.entries),
            Err(FtpError::ListingFailed(FtpFileListError::DataReadFailed(
                FtpLineDataReadError::AbortedByCallback,
            ))) => match receiver.parse_error.take() {
                Some(e) => Err(FtpFileListError::InvalidEntry(e).into()),
                None => Err(FtpFileListError::DataReadFailed(
                    FtpLineDataReadError::AbortedByCallback,
                )
                .into()),
            },
            Err(FtpError::ListingFailed(FtpFileListError::CommandError(
                FtpCommandError::CommandNotImplemented(_),
            ))) => {
                log::warn!(
                    "MLSD is not supported by {}, fallback to NLST for {path}",
                    self.server
                );
                let mut receiver = NlstEntryReceiver::default();
                self.list_lines(provider, config, FtpCommand::NLST, path, &mut receiver)
                    .await?;
                Ok(receiver.entries)
            }
            Err(e) => Err(e),
        }
    }

    async fn list_tree<CP>(
        &mut self,
        provider: &mut CP,
        config: &FtpClientConfig,
        root: &str,
    ) -> Result<BTreeMap<String, FtpFileEntry>, FtpError>
    where
        CP: FtpConnectionProvider<S>,
    {
        let mut files = BTreeMap::new();
        let mut pending = vec![(root.to_string(), String::new())];
        while let Some((dir, prefix)) = pending.pop() {
            let entries = self.list_directory(provider, config, &dir).await?;
            for entry in entries {
                match entry.is_dir() {
                    Some(true) => {
                        let child_dir = join_path(&dir, entry.name());
                        let child_prefix = join_path(&prefix, entry.name());
                        pending.push((child_dir, child_prefix));
                    }
                    Some(false) => {
                        let key = join_path(&prefix, entry.name());
                        files.insert(key, entry);
                    }
                    None => {}
                }
            }
        }
        Ok(files)
    }
}

impl<CP, S> FtpClient<CP, S>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// List the entries of a directory, without `.` and `..`.
    ///
    /// `MLSD` is used if the server supports it, otherwise `NLST` is used and
    /// only the names will be known.
    pub async fn list_directory(&mut self, path: &str) -> Result<Vec<FtpFileEntry>, FtpError> {
        let (provider, session, config) = self.session_parts()?;
        session.check_data_mode()?;
        let r = session.list_directory(provider, config, path).await;
        self.finish_operation(r).await
    }

    /// List all files under `root` recursively.
    ///
    /// The keys are `/` separated paths relative to `root`. Only entries known
    /// to be files or directories are followed, so nothing is found if the
    /// server only supports `NLST`.
    pub async fn list_tree(
        &mut self,
        root: &str,
    ) -> Result<BTreeMap<String, FtpFileEntry>, FtpError> {
        let (provider, session, config) = self.session_parts()?;
        session.check_data_mode()?;
        let r = session.list_tree(provider, config, root).await;
        self.finish_operation(r).await
    }
}
