/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use log::warn;
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::facts::time_val;
use ftpc_client::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "stat";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("Fetch file stats").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("FILE PATH")
            .num_args(1)
            .required(true),
    )
}

pub(super) async fn run<CP, S>(
    client: &mut FtpClient<CP, S>,
    args: &ArgMatches,
) -> anyhow::Result<()>
where
    CP: FtpConnectionProvider<S>,
    S: AsyncRead + AsyncWrite + Unpin,
{
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();

    let size = client.size(path).await?;
    println!("Path: {path}");
    println!("Size: {size}");

    match client.modification_time(path).await {
        Ok(raw) => match time_val::parse_from_str(&raw) {
            Ok(dt) => println!("Modify Time: {dt}"),
            Err(_) => println!("Modify Time: {raw}"),
        },
        Err(e) => warn!("failed to get modification time of {path}: {e}"),
    }

    Ok(())
}
