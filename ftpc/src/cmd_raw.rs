/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::{FtpClient, FtpConnectionProvider};

pub(super) const COMMAND: &str = "raw";

const COMMAND_ARG_LINE: &str = "line";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Send a raw command and print the reply")
        .arg(
            Arg::new(COMMAND_ARG_LINE)
                .value_name("COMMAND")
                .num_args(1..)
                .trailing_var_arg(true)
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
    let line = args
        .get_many::<String>(COMMAND_ARG_LINE)
        .map(|v| v.map(|s| s.as_str()).collect::<Vec<_>>().join(" "))
        .unwrap_or_default();

    for reply_line in client.send_raw_command(&line).await? {
        println!("{reply_line}");
    }
    Ok(())
}
