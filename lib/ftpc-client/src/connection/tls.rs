/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::sync::Arc;

use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::CertificateDer;
use rustls_pki_types::pem::PemObject;

/// Trust settings for FTPS connections.
#[derive(Clone, Default)]
pub struct FtpTlsConfig {
    extra_ca_certs: Vec<CertificateDer<'static>>,
    no_default_ca_certs: bool,
}

impl FtpTlsConfig {
    /// Add the CA certificates in a PEM bundle.
    pub fn add_ca_certs_pem(&mut self, pem: &[u8]) -> io::Result<()> {
        let mut found = false;
        for (i, r) in CertificateDer::pem_slice_iter(pem).enumerate() {
            let cert = r.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid certificate #{i}: {e:?}"),
                )
            })?;
            self.extra_ca_certs.push(cert);
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "no valid certificate found",
            ))
        }
    }

    /// Only trust the CA certificates added explicitly.
    pub fn set_no_default_ca_certs(&mut self, no_default: bool) {
        self.no_default_ca_certs = no_default;
    }

    fn root_store(&self) -> io::Result<RootCertStore> {
        let mut roots = RootCertStore::empty();
        if !self.no_default_ca_certs {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
        for cert in &self.extra_ca_certs {
            roots
                .add(cert.clone())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(roots)
    }

    pub fn build(&self) -> io::Result<Arc<ClientConfig>> {
        let roots = self.root_store()?;
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(io::Error::other)?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(Arc::new(config))
    }
}
