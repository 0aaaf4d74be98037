/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use clap_complete::Shell;
use log::LevelFilter;

use ftpc_client::{
    FTP_DEBUG_LOG_TARGET, FtpClientConfig, FtpServerAddr, FtpTcpClient, FtpTlsConfig, FtpTlsMode,
    TcpConnectionProvider,
};

mod cmd_del;
mod cmd_feat;
mod cmd_get;
mod cmd_list;
mod cmd_mkdir;
mod cmd_put;
mod cmd_pwd;
mod cmd_raw;
mod cmd_rename;
mod cmd_rmd;
mod cmd_stat;
mod cmd_tree;

const GLOBAL_ARG_COMPLETION: &str = "completion";
const GLOBAL_ARG_SERVER: &str = "server";
const GLOBAL_ARG_USERNAME: &str = "username";
const GLOBAL_ARG_PASSWORD: &str = "password";
const GLOBAL_ARG_ACCOUNT: &str = "account";
const GLOBAL_ARG_TLS: &str = "tls";
const GLOBAL_ARG_CA_CERT: &str = "ca-cert";
const GLOBAL_ARG_NO_DEFAULT_CA: &str = "no-default-ca";
const GLOBAL_ARG_SOURCE_IP: &str = "source-ip";
const GLOBAL_ARG_USE_CONTROL_IP: &str = "use-control-ip";
const GLOBAL_ARG_ACTIVE: &str = "active";
#[cfg(feature = "yaml")]
const GLOBAL_ARG_CONFIG: &str = "config";
const GLOBAL_ARG_VERBOSE: &str = "verbose";

fn build_cli_args() -> Command {
    let cmd = Command::new("ftpc")
        .arg(
            Arg::new(GLOBAL_ARG_COMPLETION)
                .num_args(1)
                .value_name("SHELL")
                .long("completion")
                .value_parser(value_parser!(Shell))
                .exclusive(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SERVER)
                .help("FTP server address, the default port is 21")
                .num_args(1)
                .value_name("SERVER ADDRESS")
                .value_parser(value_parser!(FtpServerAddr))
                .required_unless_present(GLOBAL_ARG_COMPLETION),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USERNAME)
                .help("FTP username")
                .num_args(1)
                .value_name("USERNAME")
                .short('u')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_PASSWORD)
                .help("FTP password")
                .num_args(1)
                .value_name("PASSWORD")
                .short('p')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_ACCOUNT)
                .help("FTP account, sent if the server asks for it")
                .num_args(1)
                .value_name("ACCOUNT")
                .long("account")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_TLS)
                .help("Use FTP over TLS")
                .num_args(1)
                .value_name("MODE")
                .value_parser(["explicit", "implicit"])
                .long("tls")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_CA_CERT)
                .help("Extra CA certificate file in PEM format")
                .num_args(1)
                .value_name("CA CERT FILE")
                .value_parser(value_parser!(PathBuf))
                .long("ca-cert")
                .action(ArgAction::Append)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_NO_DEFAULT_CA)
                .help("Do not trust the default CA certificates")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("no-default-ca")
                .requires(GLOBAL_ARG_CA_CERT)
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_SOURCE_IP)
                .help("source ip address")
                .num_args(1)
                .value_name("IP ADDRESS")
                .value_parser(value_parser!(IpAddr))
                .long("source")
                .short('s')
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_USE_CONTROL_IP)
                .help("Connect data connections to the control peer ip")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("use-control-ip")
                .global(true),
        )
        .arg(
            Arg::new(GLOBAL_ARG_ACTIVE)
                .help("Turn off passive mode")
                .num_args(0)
                .action(ArgAction::SetTrue)
                .long("active")
                .global(true),
        );

    #[cfg(feature = "yaml")]
    let cmd = cmd.arg(
        Arg::new(GLOBAL_ARG_CONFIG)
            .help("Client config file in yaml format")
            .num_args(1)
            .value_name("CONFIG FILE")
            .value_parser(value_parser!(PathBuf))
            .long("config")
            .short('c')
            .global(true),
    );

    cmd.arg(
        Arg::new(GLOBAL_ARG_VERBOSE)
            .help("show verbose message")
            .num_args(0)
            .action(ArgAction::Count)
            .short('v')
            .global(true),
    )
    .subcommand(cmd_list::command())
    .subcommand(cmd_tree::command())
    .subcommand(cmd_stat::command())
    .subcommand(cmd_get::command())
    .subcommand(cmd_put::command())
    .subcommand(cmd_del::command())
    .subcommand(cmd_rmd::command())
    .subcommand(cmd_mkdir::command())
    .subcommand(cmd_rename::command())
    .subcommand(cmd_pwd::command())
    .subcommand(cmd_raw::command())
    .subcommand(cmd_feat::command())
}

fn setup_logger(verbose_level: u8) {
    let level = match verbose_level {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("ftpc_client", level)
        .filter_module(FTP_DEBUG_LOG_TARGET, level)
        .format_timestamp_millis()
        .init();
}

#[cfg(feature = "yaml")]
fn load_config(args: &ArgMatches) -> anyhow::Result<FtpClientConfig> {
    let Some(path) = args.get_one::<PathBuf>(GLOBAL_ARG_CONFIG) else {
        return Ok(FtpClientConfig::default());
    };
    let content = std::fs::read_to_string(path)
        .context(format!("failed to read config file {}", path.display()))?;
    let docs = yaml_rust::YamlLoader::load_from_str(&content)
        .map_err(|e| anyhow!("invalid yaml file {}: {e}", path.display()))?;
    match docs.first() {
        Some(doc) => FtpClientConfig::parse_yaml(doc)
            .context(format!("invalid client config in file {}", path.display())),
        None => Ok(FtpClientConfig::default()),
    }
}

#[cfg(not(feature = "yaml"))]
fn load_config(_args: &ArgMatches) -> anyhow::Result<FtpClientConfig> {
    Ok(FtpClientConfig::default())
}

fn build_provider(args: &ArgMatches) -> anyhow::Result<TcpConnectionProvider> {
    let mut provider = TcpConnectionProvider::default();
    if let Some(ip) = args.get_one::<IpAddr>(GLOBAL_ARG_SOURCE_IP) {
        provider.set_bind_ip(*ip);
    }
    if args.get_flag(GLOBAL_ARG_USE_CONTROL_IP) {
        provider.set_use_control_peer_ip(true);
    }

    if args.get_one::<String>(GLOBAL_ARG_TLS).is_some() {
        let mut tls_config = FtpTlsConfig::default();
        if args.get_flag(GLOBAL_ARG_NO_DEFAULT_CA) {
            tls_config.set_no_default_ca_certs(true);
        }
        if let Some(files) = args.get_many::<PathBuf>(GLOBAL_ARG_CA_CERT) {
            for file in files {
                let pem = std::fs::read(file)
                    .context(format!("failed to read ca cert file {}", file.display()))?;
                tls_config
                    .add_ca_certs_pem(&pem)
                    .context(format!("invalid ca cert file {}", file.display()))?;
            }
        }
        let tls_config = tls_config.build().context("failed to build tls config")?;
        provider.set_tls_config(tls_config);
    }

    Ok(provider)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = build_cli_args().get_matches();

    if let Some(target) = args.get_one::<Shell>(GLOBAL_ARG_COMPLETION) {
        let mut app = build_cli_args();
        let bin_name = app.get_name().to_string();
        clap_complete::generate(*target, &mut app, bin_name, &mut io::stdout());
        return Ok(());
    }

    let verbose_level = args
        .get_one::<u8>(GLOBAL_ARG_VERBOSE)
        .copied()
        .unwrap_or_default();
    setup_logger(verbose_level);

    let Some(server) = args.get_one::<FtpServerAddr>(GLOBAL_ARG_SERVER) else {
        return Err(anyhow!("no server address set"));
    };
    let tls_mode = match args.get_one::<String>(GLOBAL_ARG_TLS) {
        Some(s) => FtpTlsMode::from_str(s)?,
        None => FtpTlsMode::Plain,
    };

    let mut config = load_config(&args)?;
    if args.get_flag(GLOBAL_ARG_ACTIVE) {
        config.set_passive(false);
    }
    let provider = build_provider(&args)?;

    let Some((subcommand, sub_args)) = args.subcommand() else {
        return Err(anyhow!("no subcommand found"));
    };

    let mut client = FtpTcpClient::new(config, provider);
    client.connect(server, tls_mode).await?;
    client
        .login_with_account(
            args.get_one::<String>(GLOBAL_ARG_USERNAME).map(|s| s.as_str()),
            args.get_one::<String>(GLOBAL_ARG_PASSWORD).map(|s| s.as_str()),
            args.get_one::<String>(GLOBAL_ARG_ACCOUNT).map(|s| s.as_str()),
        )
        .await?;

    let ret = match subcommand {
        cmd_list::COMMAND => cmd_list::run(&mut client, sub_args).await,
        cmd_tree::COMMAND => cmd_tree::run(&mut client, sub_args).await,
        cmd_stat::COMMAND => cmd_stat::run(&mut client, sub_args).await,
        cmd_get::COMMAND => cmd_get::run(&mut client, sub_args).await,
        cmd_put::COMMAND => cmd_put::run(&mut client, sub_args).await,
        cmd_del::COMMAND => cmd_del::run(&mut client, sub_args).await,
        cmd_rmd::COMMAND => cmd_rmd::run(&mut client, sub_args).await,
        cmd_mkdir::COMMAND => cmd_mkdir::run(&mut client, sub_args).await,
        cmd_rename::COMMAND => cmd_rename::run(&mut client, sub_args).await,
        cmd_pwd::COMMAND => cmd_pwd::run(&mut client, sub_args).await,
        cmd_raw::COMMAND => cmd_raw::run(&mut client, sub_args).await,
        cmd_feat::COMMAND => cmd_feat::run(&mut client, sub_args).await,
        cmd => Err(anyhow!("invalid subcommand {cmd}")),
    };

    client.close().await?;

    ret
}
