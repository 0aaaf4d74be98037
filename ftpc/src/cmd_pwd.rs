/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "pwd";

const COMMAND_ARG_CD: &str = "cd";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Print working directory")
        .arg(
            Arg::new(COMMAND_ARG_CD)
                .help("Change to this directory first")
                .value_name("DIR PATH")
                .num_args(1)
                .long("cd"),
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
    if let Some(dir) = args.get_one::<String>(COMMAND_ARG_CD) {
        client.set_working_directory(dir).await?;
    }

    let cwd = client.working_directory().await?;
    println!("{cwd}");
    Ok(())
}
