/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use clap::{Arg, ArgMatches, Command};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::{FtpClient, FtpConnectionProvider, FtpFileEntry};

pub(super) const COMMAND: &str = "list";

const COMMAND_ARG_PATH: &str = "path";

pub(super) fn command() -> Command {
    Command::new(COMMAND).about("List directory").arg(
        Arg::new(COMMAND_ARG_PATH)
            .value_name("DIR PATH")
            .num_args(1),
    )
}

pub(super) fn print_entry(path: &str, entry: &FtpFileEntry) {
    let size = entry.size().map(|s| s.to_string()).unwrap_or_default();
    let mtime = entry
        .parsed_modify_time()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    println!(
        "{:<8} {:>12} {:<19} {path}",
        entry.entry_type().as_str(),
        size,
        mtime
    );
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

    for entry in client.list_directory(path).await? {
        print_entry(entry.name(), &entry);
    }
    Ok(())
}
