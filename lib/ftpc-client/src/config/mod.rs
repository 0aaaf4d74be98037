/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

#[cfg(feature = "yaml")]
mod yaml;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpControlConfig {
    pub(crate) max_line_len: usize,
    pub(crate) max_multi_lines: usize,
    pub(crate) command_timeout: Duration,
}

impl Default for FtpControlConfig {
    fn default() -> Self {
        FtpControlConfig {
            max_line_len: 2048,
            max_multi_lines: 128,
            command_timeout: Duration::from_secs(10),
        }
    }
}

impl FtpControlConfig {
    pub fn set_max_line_len(&mut self, len: usize) {
        self.max_line_len = len;
    }

    pub fn set_max_multi_lines(&mut self, lines: usize) {
        self.max_multi_lines = lines;
    }

    pub fn set_command_timeout(&mut self, timeout: Duration) {
        self.command_timeout = timeout;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpTransferConfig {
    pub(crate) list_max_line_len: usize,
    pub(crate) list_max_entries: usize,
    pub(crate) data_idle_timeout: Duration,
    pub(crate) end_wait_timeout: Duration,
    pub(crate) copy_buffer_size: usize,
}

impl Default for FtpTransferConfig {
    fn default() -> Self {
        FtpTransferConfig {
            list_max_line_len: 2048,
            list_max_entries: 65536,
            data_idle_timeout: Duration::from_secs(60),
            end_wait_timeout: Duration::from_secs(10),
            copy_buffer_size: 16 * 1024,
        }
    }
}

impl FtpTransferConfig {
    pub fn set_list_max_line_len(&mut self, len: usize) {
        self.list_max_line_len = len;
    }

    pub fn set_list_max_entries(&mut self, entries: usize) {
        self.list_max_entries = entries;
    }

    pub fn set_data_idle_timeout(&mut self, timeout: Duration) {
        self.data_idle_timeout = timeout;
    }

    pub fn set_end_wait_timeout(&mut self, timeout: Duration) {
        self.end_wait_timeout = timeout;
    }

    pub fn set_copy_buffer_size(&mut self, size: usize) {
        self.copy_buffer_size = size.max(512);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpClientConfig {
    pub(crate) control: FtpControlConfig,
    pub(crate) transfer: FtpTransferConfig,
    pub(crate) connect_timeout: Duration,
    pub(crate) greeting_timeout: Duration,
    pub(crate) passive: bool,
}

impl Default for FtpClientConfig {
    fn default() -> Self {
        FtpClientConfig {
            control: FtpControlConfig::default(),
            transfer: FtpTransferConfig::default(),
            connect_timeout: Duration::from_secs(30),
            greeting_timeout: Duration::from_secs(10),
            passive: true,
        }
    }
}

impl FtpClientConfig {
    #[inline]
    pub fn control_mut(&mut self) -> &mut FtpControlConfig {
        &mut self.control
    }

    #[inline]
    pub fn transfer_mut(&mut self) -> &mut FtpTransferConfig {
        &mut self.transfer
    }

    pub fn set_connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout;
    }

    pub fn set_greeting_timeout(&mut self, timeout: Duration) {
        self.greeting_timeout = timeout;
    }

    /// Set whether passive mode is used for new sessions.
    pub fn set_passive(&mut self, passive: bool) {
        self.passive = passive;
    }

    #[inline]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}
