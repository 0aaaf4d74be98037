/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_FTP_PORT: u16 = 21;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FtpServerAddrParseError {
    #[error("empty host")]
    EmptyHost,
    #[error("invalid port")]
    InvalidPort,
    #[error("unclosed bracket in ipv6 address")]
    UnclosedBracket,
    #[error("invalid ip address")]
    InvalidIpAddress,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown tls mode {0}")]
pub struct FtpTlsModeParseError(String);

/// Host and port of an FTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpServerAddr {
    host: String,
    port: u16,
}

impl FtpServerAddr {
    pub fn new(host: &str, port: u16) -> Self {
        FtpServerAddr {
            host: host.to_string(),
            port,
        }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn ip(&self) -> Option<IpAddr> {
        IpAddr::from_str(&self.host).ok()
    }
}

impl fmt::Display for FtpServerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

fn parse_port(s: &str) -> Result<u16, FtpServerAddrParseError> {
    match u16::from_str(s) {
        Ok(0) | Err(_) => Err(FtpServerAddrParseError::InvalidPort),
        Ok(port) => Ok(port),
    }
}

impl FromStr for FtpServerAddr {
    type Err = FtpServerAddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(left) = s.strip_prefix('[') {
            let Some((host, right)) = left.split_once(']') else {
                return Err(FtpServerAddrParseError::UnclosedBracket);
            };
            if IpAddr::from_str(host).is_err() {
                return Err(FtpServerAddrParseError::InvalidIpAddress);
            }
            let port = match right.strip_prefix(':') {
                Some(p) => parse_port(p)?,
                None if right.is_empty() => DEFAULT_FTP_PORT,
                None => return Err(FtpServerAddrParseError::InvalidPort),
            };
            return Ok(FtpServerAddr::new(host, port));
        }

        if IpAddr::from_str(s).is_ok() {
            // bare ipv6 address without port
            return Ok(FtpServerAddr::new(s, DEFAULT_FTP_PORT));
        }

        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => (host, parse_port(port)?),
            None => (s, DEFAULT_FTP_PORT),
        };
        if host.is_empty() {
            return Err(FtpServerAddrParseError::EmptyHost);
        }
        Ok(FtpServerAddr::new(host, port))
    }
}

/// How TLS is applied to the control and data connections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FtpTlsMode {
    #[default]
    Plain,
    /// `AUTH TLS` after the greeting.
    Explicit,
    /// TLS from the first byte, usually on port 990.
    Implicit,
}

impl FtpTlsMode {
    #[inline]
    pub fn is_tls(&self) -> bool {
        !matches!(self, FtpTlsMode::Plain)
    }
}

impl FromStr for FtpTlsMode {
    type Err = FtpTlsModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "none" => Ok(FtpTlsMode::Plain),
            "explicit" | "auth" => Ok(FtpTlsMode::Explicit),
            "implicit" | "ftps" => Ok(FtpTlsMode::Implicit),
            _ => Err(FtpTlsModeParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host() {
        let addr = FtpServerAddr::from_str("ftp.example.net").unwrap();
        assert_eq!(addr.host(), "ftp.example.net");
        assert_eq!(addr.port(), 21);

        let addr = FtpServerAddr::from_str("ftp.example.net:2121").unwrap();
        assert_eq!(addr.port(), 2121);
        assert_eq!(addr.to_string(), "ftp.example.net:2121");
    }

    #[test]
    fn parse_ip() {
        let addr = FtpServerAddr::from_str("192.168.1.1:990").unwrap();
        assert_eq!(addr.ip(), Some(IpAddr::from([192, 168, 1, 1])));

        let addr = FtpServerAddr::from_str("[::1]:2121").unwrap();
        assert_eq!(addr.host(), "::1");
        assert_eq!(addr.port(), 2121);
        assert_eq!(addr.to_string(), "[::1]:2121");

        let addr = FtpServerAddr::from_str("::1").unwrap();
        assert_eq!(addr.port(), 21);
    }

    #[test]
    fn parse_invalid() {
        assert_eq!(
            FtpServerAddr::from_str(":21"),
            Err(FtpServerAddrParseError::EmptyHost)
        );
        assert_eq!(
            FtpServerAddr::from_str("host:0"),
            Err(FtpServerAddrParseError::InvalidPort)
        );
        assert_eq!(
            FtpServerAddr::from_str("host:ftp"),
            Err(FtpServerAddrParseError::InvalidPort)
        );
        assert_eq!(
            FtpServerAddr::from_str("[::1:21"),
            Err(FtpServerAddrParseError::UnclosedBracket)
        );
    }

    #[test]
    fn tls_mode() {
        assert_eq!(FtpTlsMode::from_str("Explicit"), Ok(FtpTlsMode::Explicit));
        assert_eq!(FtpTlsMode::from_str("ftps"), Ok(FtpTlsMode::Implicit));
        assert!(FtpTlsMode::from_str("ssl").is_err());
        assert!(!FtpTlsMode::default().is_tls());
    }
}
