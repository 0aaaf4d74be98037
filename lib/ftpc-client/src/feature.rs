/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

/// Extensions announced by the server in its FEAT reply.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FtpServerFeature {
    auth_tls: bool,
    mlst: bool,
    size: bool,
    mdtm: bool,
    rest_stream: bool,
    utf8: bool,
    epsv: bool,
    pret: bool,
}

impl FtpServerFeature {
    pub(crate) fn parse_and_set(&mut self, line: &str) {
        let (name, params) = match line.split_once(' ') {
            Some((name, params)) => (name, params.trim()),
            None => (line, ""),
        };

        match name.to_uppercase().as_str() {
            "AUTH" => {
                if params.split([' ', ';']).any(|p| p.eq_ignore_ascii_case("TLS")) {
                    self.auth_tls = true;
                }
            }
            "MLST" => self.mlst = true,
            "SIZE" => self.size = true,
            "MDTM" => self.mdtm = true,
            "REST" => {
                if params.eq_ignore_ascii_case("STREAM") {
                    self.rest_stream = true;
                }
            }
            "UTF8" => self.utf8 = true,
            "EPSV" => self.epsv = true,
            "PRET" => self.pret = true,
            _ => {}
        }
    }

    #[inline]
    pub fn support_auth_tls(&self) -> bool {
        self.auth_tls
    }

    #[inline]
    pub fn support_mlst(&self) -> bool {
        self.mlst
    }

    #[inline]
    pub fn support_size(&self) -> bool {
        self.size
    }

    #[inline]
    pub fn support_mdtm(&self) -> bool {
        self.mdtm
    }

    #[inline]
    pub fn support_rest_stream(&self) -> bool {
        self.rest_stream
    }

    #[inline]
    pub fn support_utf8(&self) -> bool {
        self.utf8
    }

    #[inline]
    pub fn support_epsv(&self) -> bool {
        self.epsv
    }

    #[inline]
    pub fn support_pret(&self) -> bool {
        self.pret
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let mut feature = FtpServerFeature::default();
        for line in [
            "AUTH TLS",
            "MLST type*;size*;modify*;",
            "SIZE",
            "REST STREAM",
            "UTF8",
        ] {
            feature.parse_and_set(line);
        }
        assert!(feature.support_auth_tls());
        assert!(feature.support_mlst());
        assert!(feature.support_size());
        assert!(feature.support_rest_stream());
        assert!(feature.support_utf8());
        assert!(!feature.support_mdtm());
        assert!(!feature.support_epsv());
        assert!(!feature.support_pret());
    }

    #[test]
    fn parse_auth_list() {
        let mut feature = FtpServerFeature::default();
        feature.parse_and_set("AUTH SSL TLS");
        assert!(feature.support_auth_tls());

        let mut feature = FtpServerFeature::default();
        feature.parse_and_set("AUTH SSL");
        assert!(!feature.support_auth_tls());
    }
}
