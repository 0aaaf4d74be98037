/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "feat";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Show server features")
}

fn yes_no(v: bool) -> &'static str {
    if v { "yes" } else { "no" }
}

pub(super) async fn run<CP, S>(
    client: &mut FtpClient<CP, S>,
    _args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let feature = client.server_features().await?;
    println!("AUTH TLS: {}", yes_no(feature.support_auth_tls()));
    println!("MLST: {}", yes_no(feature.support_mlst()));
    println!("SIZE: {}", yes_no(feature.support_size()));
    println!("MDTM: {}", yes_no(feature.support_mdtm()));
    println!("REST STREAM: {}", yes_no(feature.support_rest_stream()));
    println!("UTF8: {}", yes_no(feature.support_utf8()));
    println!("EPSV: {}", yes_no(feature.support_epsv()));
    println!("PRET: {}", yes_no(feature.support_pret()));
    Ok(())
}
