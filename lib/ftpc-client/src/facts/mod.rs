/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::FtpFileFactsParseError;

mod entry_type;
pub mod time_val;

pub use entry_type::FtpFileEntryType;

/// One entry of a directory listing.
///
/// Every fact except the name is optional, absent means the server didn't
/// report it. Time facts are kept as the raw `YYYYMMDDHHMMSS[.sss]` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpFileEntry {
    name: String,
    entry_type: FtpFileEntryType,
    size: Option<u64>,
    create_time: Option<String>,
    modify_time: Option<String>,
    unique_id: Option<String>,
}

impl FtpFileEntry {
    pub(crate) fn new(name: &str) -> Self {
        FtpFileEntry {
            name: name.to_string(),
            entry_type: FtpFileEntryType::Unknown,
            size: None,
            create_time: None,
            modify_time: None,
            unique_id: None,
        }
    }

    /// Build an entry from one NLST line, which only carries the name.
    pub(crate) fn from_name_line(line: &str) -> Self {
        // some servers send the listed path as prefix, and mark directories with a slash
        let line = line.strip_suffix('/').unwrap_or(line);
        let name = line.rsplit_once('/').map(|(_, n)| n).unwrap_or(line);
        FtpFileEntry::new(name)
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    #[inline]
    pub fn entry_type(&self) -> &FtpFileEntryType {
        &self.entry_type
    }

    #[inline]
    pub fn is_dir(&self) -> Option<bool> {
        self.entry_type.is_dir()
    }

    #[inline]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    #[inline]
    pub fn create_time(&self) -> Option<&str> {
        self.create_time.as_deref()
    }

    #[inline]
    pub fn modify_time(&self) -> Option<&str> {
        self.modify_time.as_deref()
    }

    #[inline]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// The modification time as a UTC datetime, if present and well formed.
    pub fn parsed_modify_time(&self) -> Option<DateTime<Utc>> {
        self.modify_time
            .as_deref()
            .and_then(|s| time_val::parse_from_str(s).ok())
    }

    pub fn parsed_create_time(&self) -> Option<DateTime<Utc>> {
        self.create_time
            .as_deref()
            .and_then(|s| time_val::parse_from_str(s).ok())
    }

    /// Whether the entry is `.`, `..` or typed `cdir` / `pdir`.
    pub(crate) fn is_self_or_parent(&self) -> bool {
        self.entry_type.is_self_or_parent() || self.name == "." || self.name == ".."
    }

    /// Parse one MLSD line, `fact=value;fact=value; name`.
    ///
    /// The name starts after the first space and may contain spaces itself.
    pub fn parse_line(line: &str) -> Result<Self, FtpFileFactsParseError> {
        let Some((facts, name)) = line.split_once(' ') else {
            return Err(FtpFileFactsParseError::NoSpaceDelimiter);
        };

        let mut entry = FtpFileEntry::new(name);
        for fact in facts.split(';') {
            if fact.is_empty() {
                continue;
            }

            if let Some((key, value)) = fact.split_once('=') {
                entry.set_fact(key, value)?;
            } else {
                return Err(FtpFileFactsParseError::NoDelimiterInFact(fact.to_string()));
            }
        }

        Ok(entry)
    }

    fn set_fact(&mut self, key: &str, value: &str) -> Result<(), FtpFileFactsParseError> {
        match key.to_lowercase().as_str() {
            "type" => self.entry_type = FtpFileEntryType::parse(value),
            "size" => {
                let size = u64::from_str(value).map_err(|_| FtpFileFactsParseError::InvalidSize)?;
                self.size = Some(size);
            }
            "create" => self.create_time = Some(value.to_string()),
            "modify" => self.modify_time = Some(value.to_string()),
            "unique" => self.unique_id = Some(value.to_string()),
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_file() {
        let entry =
            FtpFileEntry::parse_line("type=file;size=1024;modify=20230101120000; report.txt")
                .unwrap();
        assert_eq!(entry.name(), "report.txt");
        assert_eq!(entry.is_dir(), Some(false));
        assert_eq!(entry.size(), Some(1024));
        assert_eq!(entry.modify_time(), Some("20230101120000"));
        assert!(entry.create_time().is_none());
        assert!(entry.unique_id().is_none());
        assert!(entry.parsed_modify_time().is_some());
    }

    #[test]
    fn parse_times() {
        let entry =
            FtpFileEntry::parse_line("type=file;create=20211201102030.123;modify=yesterday; a")
                .unwrap();
        let create = entry.parsed_create_time().unwrap();
        assert_eq!(create.to_rfc3339(), "2021-12-01T10:20:30.123+00:00");
        assert_eq!(entry.modify_time(), Some("yesterday"));
        assert!(entry.parsed_modify_time().is_none());
    }

    #[test]
    fn parse_name_with_space() {
        let entry = FtpFileEntry::parse_line("Type=DIR;Unique=804g2; my docs").unwrap();
        assert_eq!(entry.name(), "my docs");
        assert_eq!(entry.is_dir(), Some(true));
        assert_eq!(entry.unique_id(), Some("804g2"));
        assert!(entry.size().is_none());
    }

    #[test]
    fn parse_parent() {
        let entry = FtpFileEntry::parse_line(
            "type=pdir;sizd=4096;modify=20210525083610;UNIX.mode=0755;unique=804g2; /",
        )
        .unwrap();
        assert_eq!(entry.entry_type(), &FtpFileEntryType::ParentDir);
        assert!(entry.is_dir().is_none());
        assert!(entry.size().is_none());
        assert!(entry.is_self_or_parent());
    }

    #[test]
    fn parse_unknown_type() {
        let entry = FtpFileEntry::parse_line("type=OS.unix=slink:/x;perm=r; link").unwrap();
        assert!(entry.is_dir().is_none());
        assert_eq!(entry.name(), "link");
    }

    #[test]
    fn parse_invalid() {
        assert!(matches!(
            FtpFileEntry::parse_line("type=file;size=1"),
            Err(FtpFileFactsParseError::NoSpaceDelimiter)
        ));
        assert!(matches!(
            FtpFileEntry::parse_line("type=file;size; a"),
            Err(FtpFileFactsParseError::NoDelimiterInFact(_))
        ));
        assert!(matches!(
            FtpFileEntry::parse_line("size=abc; a"),
            Err(FtpFileFactsParseError::InvalidSize)
        ));
    }

    #[test]
    fn name_line() {
        assert_eq!(FtpFileEntry::from_name_line("a.txt").name(), "a.txt");
        assert_eq!(FtpFileEntry::from_name_line("dir/a.txt").name(), "a.txt");
        assert_eq!(FtpFileEntry::from_name_line("sub/").name(), "sub");
        assert_eq!(FtpFileEntry::from_name_line("pub/sub/").name(), "sub");
        assert!(FtpFileEntry::from_name_line("..").is_self_or_parent());
        assert!(FtpFileEntry::from_name_line("x").is_dir().is_none());
    }
}
