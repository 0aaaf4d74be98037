/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use tokio::io::{AsyncRead, AsyncWrite};

use ftpc_client::{FtpClient, FtpConnectionProvider, FtpTransferType};

pub(super) const COMMAND: &str = "put";

const COMMAND_ARG_LOCAL: &str = "local";
const COMMAND_ARG_PATH: &str = "path";
const COMMAND_ARG_OFFSET: &str = "offset";
const COMMAND_ARG_ASCII: &str = "ascii";

pub(super) fn command() -> Command {
    Command::new(COMMAND)
        .about("Upload file")
        .arg(
            Arg::new(COMMAND_ARG_LOCAL)
                .value_name("LOCAL FILE")
                .value_parser(value_parser!(PathBuf))
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_PATH)
                .value_name("FILE PATH")
                .num_args(1)
                .required(true),
        )
        .arg(
            Arg::new(COMMAND_ARG_OFFSET)
                .help("Start from this offset in both files")
                .value_name("OFFSET")
                .value_parser(value_parser!(u64))
                .num_args(1)
                .long("offset"),
        )
        .arg(
            Arg::new(COMMAND_ARG_ASCII)
                .help("Use ascii transfer type")
                .action(ArgAction::SetTrue)
                .long("ascii"),
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
    let Some(local) = args.get_one::<PathBuf>(COMMAND_ARG_LOCAL) else {
        return Err(anyhow::anyhow!("no local file set"));
    };
    let path = args
        .get_one::<String>(COMMAND_ARG_PATH)
        .map(|s| s.as_str())
        .unwrap_or_default();
    let offset = args
        .get_one::<u64>(COMMAND_ARG_OFFSET)
        .copied()
        .unwrap_or_default();
    let transfer_type = if args.get_flag(COMMAND_ARG_ASCII) {
        FtpTransferType::Ascii
    } else {
        FtpTransferType::Binary
    };

    let size = client
        .upload_from_file(local, path, transfer_type, offset)
        .await?;
    log::info!("uploaded {size} bytes to {path}");
    Ok(())
}
