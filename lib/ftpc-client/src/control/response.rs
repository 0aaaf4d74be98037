/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};

use super::FtpControlChannel;
use crate::error::FtpRawResponseError;
use crate::io::LimitedBufReadExt;

/// A complete reply read from the control connection.
///
/// The lines are kept as sent by the server, only the line terminator is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpReply {
    code: u16,
    multi_line: bool,
    lines: Vec<String>,
}

macro_rules! char_to_u16 {
    ($c:expr) => {
        ($c - b'0') as u16
    };
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\r' | b'\n') {
        end -= 1;
    }
    &line[..end]
}

fn parse_code(line: &[u8]) -> Result<u16, FtpRawResponseError> {
    if line.len() < 3 || !line[..3].iter().all(|c| c.is_ascii_digit()) {
        return Err(FtpRawResponseError::InvalidLineFormat);
    }
    let code = char_to_u16!(line[0]) * 100 + char_to_u16!(line[1]) * 10 + char_to_u16!(line[2]);
    if !(100..600).contains(&code) {
        return Err(FtpRawResponseError::InvalidReplyCode(code));
    }
    Ok(code)
}

impl FtpReply {
    /// Parse a complete reply from text, as it would be received on the wire.
    pub fn parse(text: &str) -> Result<Self, FtpRawResponseError> {
        let mut parser = FtpReplyParser::new(usize::MAX);
        for line in text.split_inclusive('\n') {
            if let Some(reply) = parser.feed_line(line.as_bytes())? {
                return Ok(reply);
            }
        }
        Err(FtpRawResponseError::ConnectionClosed)
    }

    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The three digit reply code, as sent by the server.
    #[inline]
    pub fn code_str(&self) -> &str {
        &self.lines[0][..3]
    }

    /// The first digit of the reply code.
    #[inline]
    pub fn class(&self) -> u8 {
        (self.code / 100) as u8
    }

    #[inline]
    pub fn is_preliminary(&self) -> bool {
        self.class() == 1
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.class() == 2
    }

    #[inline]
    pub fn is_intermediate(&self) -> bool {
        self.class() == 3
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        self.class() >= 4
    }

    #[inline]
    pub fn is_multi_line(&self) -> bool {
        self.multi_line
    }

    /// The message lines, with the code prefix removed from the first and the last line.
    ///
    /// Continuation lines in the middle of a multi-line reply are returned as is.
    pub fn message_lines(&self) -> Vec<&str> {
        let last = self.lines.len() - 1;
        self.lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 || (self.multi_line && i == last) {
                    line.get(4..).unwrap_or_default()
                } else {
                    line.as_str()
                }
            })
            .collect()
    }

    pub fn message(&self) -> String {
        self.message_lines().join("\n")
    }

    #[inline]
    pub fn raw_lines(&self) -> &[String] {
        &self.lines
    }

    #[inline]
    pub fn into_raw_lines(self) -> Vec<String> {
        self.lines
    }

    pub(crate) fn line_trimmed(&self) -> Option<&str> {
        if self.multi_line {
            None
        } else {
            Some(self.lines[0].get(4..).unwrap_or_default().trim())
        }
    }

    pub(crate) fn parse_pasv_227_reply(&self) -> Option<SocketAddr> {
        self.message_lines()
            .into_iter()
            .find_map(parse_pasv_host_port)
    }

    /// Get the quoted path in 257 replies, with doubled quotes unescaped.
    pub(crate) fn parse_257_path(&self) -> Option<String> {
        let line = self.message_lines().into_iter().next()?;
        let start = memchr::memchr(b'"', line.as_bytes())?;

        let mut path = String::with_capacity(line.len());
        let mut chars = line[start + 1..].chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    path.push('"');
                } else {
                    return Some(path);
                }
            } else {
                path.push(c);
            }
        }

        None
    }
}

fn parse_pasv_host_port(line: &str) -> Option<SocketAddr> {
    let p_start = memchr::memchr(b'(', line.as_bytes())?;
    let p_end = memchr::memchr(b')', &line.as_bytes()[p_start..])? + p_start;

    let a: Vec<&str> = line[p_start + 1..p_end].split(',').collect();
    if a.len() != 6 {
        return None;
    }

    let h1 = u8::from_str(a[0].trim()).ok()?;
    let h2 = u8::from_str(a[1].trim()).ok()?;
    let h3 = u8::from_str(a[2].trim()).ok()?;
    let h4 = u8::from_str(a[3].trim()).ok()?;
    let p1 = u8::from_str(a[4].trim()).ok()?;
    let p2 = u8::from_str(a[5].trim()).ok()?;

    let ip = IpAddr::V4(Ipv4Addr::new(h1, h2, h3, h4));
    let port = ((p1 as u16) << 8) + (p2 as u16);
    Some(SocketAddr::new(ip, port))
}

pub(crate) struct FtpReplyParser {
    end_prefix: Option<[u8; 4]>,
    code: u16,
    lines: Vec<String>,
    max_lines: usize,
}

impl FtpReplyParser {
    pub(crate) fn new(max_lines: usize) -> Self {
        FtpReplyParser {
            end_prefix: None,
            code: 0,
            lines: Vec::new(),
            max_lines,
        }
    }

    /// Feed one line, including its terminator.
    ///
    /// Returns the reply once its last line has been fed.
    pub(crate) fn feed_line(
        &mut self,
        line: &[u8],
    ) -> Result<Option<FtpReply>, FtpRawResponseError> {
        let line = trim_line_end(line);
        let msg = std::str::from_utf8(line).map_err(|_| FtpRawResponseError::LineIsNotUtf8)?;

        let Some(end_prefix) = self.end_prefix else {
            let code = parse_code(line)?;
            if line.len() == 3 || line[3] == b' ' {
                return Ok(Some(FtpReply {
                    code,
                    multi_line: false,
                    lines: vec![msg.to_string()],
                }));
            }
            if line[3] != b'-' {
                return Err(FtpRawResponseError::InvalidLineFormat);
            }
            self.code = code;
            self.end_prefix = Some([line[0], line[1], line[2], b' ']);
            self.lines.push(msg.to_string());
            return Ok(None);
        };

        if self.lines.len() >= self.max_lines {
            return Err(FtpRawResponseError::TooManyLines);
        }
        // do not trim whitespace at beginning
        self.lines.push(msg.to_string());
        if line.starts_with(&end_prefix) || line == &end_prefix[..3] {
            Ok(Some(FtpReply {
                code: self.code,
                multi_line: true,
                lines: std::mem::take(&mut self.lines),
            }))
        } else {
            Ok(None)
        }
    }
}

impl<T> FtpControlChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    async fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<(), FtpRawResponseError> {
        buf.clear();

        let (found, len) = self
            .stream
            .limited_read_until(b'\n', self.config.max_line_len, buf)
            .await
            .map_err(FtpRawResponseError::ReadFailed)?;

        #[cfg(feature = "log-raw-io")]
        crate::debug::log_rsp(std::str::from_utf8(buf).unwrap_or_default().trim_end());

        if len == 0 {
            Err(FtpRawResponseError::ConnectionClosed)
        } else if !found {
            if len < self.config.max_line_len {
                // eof in the middle of a line
                Err(FtpRawResponseError::ConnectionClosed)
            } else {
                Err(FtpRawResponseError::LineTooLong)
            }
        } else {
            Ok(())
        }
    }

    async fn read_reply(&mut self) -> Result<FtpReply, FtpRawResponseError> {
        let mut buf = Vec::<u8>::with_capacity(self.config.max_line_len);
        let mut parser = FtpReplyParser::new(self.config.max_multi_lines);
        loop {
            self.read_line(&mut buf).await?;
            if let Some(reply) = parser.feed_line(&buf)? {
                return Ok(reply);
            }
        }
    }

    /// Read one complete reply.
    ///
    /// Any error leaves the rest of the reply unread, and the channel is marked
    /// out of sync.
    pub(crate) async fn read_raw_response(&mut self) -> Result<FtpReply, FtpRawResponseError> {
        let r = self.read_reply().await;
        if r.is_err() {
            self.out_of_sync = true;
        }
        r
    }

    pub(crate) async fn timed_read_raw_response(
        &mut self,
        stage: &'static str,
    ) -> Result<FtpReply, FtpRawResponseError> {
        match tokio::time::timeout(self.config.command_timeout, self.read_raw_response()).await {
            Ok(r) => r,
            Err(_) => {
                self.out_of_sync = true;
                Err(FtpRawResponseError::ReadResponseTimedOut(stage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line() {
        let reply = FtpReply::parse("220 Service ready\r\n").unwrap();
        assert_eq!(reply.code(), 220);
        assert_eq!(reply.code_str(), "220");
        assert!(reply.is_success());
        assert!(!reply.is_multi_line());
        assert_eq!(reply.message_lines(), vec!["Service ready"]);
        assert_eq!(reply.raw_lines(), &["220 Service ready".to_string()]);
    }

    #[test]
    fn code_only() {
        let reply = FtpReply::parse("200\r\n").unwrap();
        assert_eq!(reply.code(), 200);
        assert_eq!(reply.message_lines(), vec![""]);
    }

    #[test]
    fn multi_line_feat() {
        let reply = FtpReply::parse("211-Extensions\n AUTH TLS\n211 End.").unwrap();
        assert_eq!(reply.code_str(), "211");
        assert!(reply.is_multi_line());
        assert_eq!(reply.message_lines(), vec!["Extensions", " AUTH TLS", "End."]);
        assert_eq!(
            reply.raw_lines(),
            &[
                "211-Extensions".to_string(),
                " AUTH TLS".to_string(),
                "211 End.".to_string()
            ]
        );
    }

    #[test]
    fn multi_line_inner_code_dash() {
        let text = "230-Welcome\r\n230-Second line\r\n230 Logged in\r\n";
        let reply = FtpReply::parse(text).unwrap();
        assert_eq!(reply.code(), 230);
        assert_eq!(
            reply.message_lines(),
            vec!["Welcome", "230-Second line", "Logged in"]
        );
    }

    #[test]
    fn truncated_multi_line() {
        let e = FtpReply::parse("211-Extensions\r\n AUTH TLS\r\n").unwrap_err();
        assert!(matches!(e, FtpRawResponseError::ConnectionClosed));
        assert!(e.is_protocol_violation());
    }

    #[test]
    fn invalid_format() {
        let e = FtpReply::parse("hello world\r\n").unwrap_err();
        assert!(matches!(e, FtpRawResponseError::InvalidLineFormat));

        let e = FtpReply::parse("220+ready\r\n").unwrap_err();
        assert!(matches!(e, FtpRawResponseError::InvalidLineFormat));

        let e = FtpReply::parse("099 too low\r\n").unwrap_err();
        assert!(matches!(e, FtpRawResponseError::InvalidReplyCode(99)));
    }

    #[test]
    fn too_many_lines() {
        let mut parser = FtpReplyParser::new(2);
        assert!(parser.feed_line(b"211-a\r\n").unwrap().is_none());
        assert!(parser.feed_line(b" b\r\n").unwrap().is_none());
        let e = parser.feed_line(b" c\r\n").unwrap_err();
        assert!(matches!(e, FtpRawResponseError::TooManyLines));
    }

    #[test]
    fn pasv_reply() {
        let reply =
            FtpReply::parse("227 Entering Passive Mode (192,168,1,1,19,136).\r\n").unwrap();
        let addr = reply.parse_pasv_227_reply().unwrap();
        assert_eq!(addr, SocketAddr::from_str("192.168.1.1:5000").unwrap());
    }

    #[test]
    fn pasv_reply_invalid() {
        let reply = FtpReply::parse("227 Entering Passive Mode.\r\n").unwrap();
        assert!(reply.parse_pasv_227_reply().is_none());

        let reply =
            FtpReply::parse("227 Entering Passive Mode (192,168,1,19,136).\r\n").unwrap();
        assert!(reply.parse_pasv_227_reply().is_none());

        let reply =
            FtpReply::parse("227 Entering Passive Mode (192,168,1,256,19,136)\r\n").unwrap();
        assert!(reply.parse_pasv_227_reply().is_none());
    }

    #[test]
    fn path_257() {
        let reply = FtpReply::parse("257 \"/home/user\" is current directory\r\n").unwrap();
        assert_eq!(reply.parse_257_path().unwrap(), "/home/user");

        let reply = FtpReply::parse("257 \"/a \"\"quoted\"\" dir\" created\r\n").unwrap();
        assert_eq!(reply.parse_257_path().unwrap(), "/a \"quoted\" dir");

        let reply = FtpReply::parse("257 no quotes\r\n").unwrap();
        assert!(reply.parse_257_path().is_none());
    }
}
