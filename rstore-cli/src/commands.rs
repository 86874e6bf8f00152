use clap::{value_parser, Arg, ArgMatches, Command};
use log::{debug, info};
use rstore_common::config::Settings;
use rstore_common::store::{
    FileBackend, LogEventHost, ReactiveStore, StoreError, StoreOptions, StoreResult,
};
use serde_json::Value;
use std::sync::Arc;

pub fn build_cli() -> Command {
    let from_arg = Arg::new("from")
        .long("from")
        .value_name("STORE")
        .help("以指定存储文档为读取基础")
        .num_args(1);

    Command::new("rstore")
        .version("0.1")
        .about("A reactive key-value store with path access and TTL")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .value_name("DIR")
                .help("数据目录")
                .num_args(1)
                .global(true),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("存储名称")
                .num_args(1)
                .global(true),
        )
        .arg(
            Arg::new("ttl")
                .short('t')
                .long("ttl")
                .value_name("MS")
                .help("生存时间(毫秒)")
                .value_parser(value_parser!(i64))
                .allow_negative_numbers(true)
                .num_args(1)
                .global(true),
        )
        .subcommand(
            Command::new("set")
                .about("写入值，值按 JSON 解析，解析失败时作为字符串")
                .arg(Arg::new("key").required(true))
                .arg(Arg::new("value").required(true))
                .arg(from_arg.clone()),
        )
        .subcommand(
            Command::new("get")
                .about("读取值")
                .arg(Arg::new("key").required(true))
                .arg(from_arg.clone()),
        )
        .subcommand(
            Command::new("del")
                .about("删除值")
                .arg(Arg::new("key").required(true))
                .arg(from_arg),
        )
        .subcommand(Command::new("meta").about("显示存储信息与时间戳"))
}

/// 打开存储，命令行参数优先于配置文件
pub fn open_store(matches: &ArgMatches, settings: &Settings) -> StoreResult<ReactiveStore> {
    let data_dir = matches
        .get_one::<String>("data-dir")
        .unwrap_or(&settings.backend.data_dir);
    let name = matches
        .get_one::<String>("name")
        .unwrap_or(&settings.store.name);
    let ttl = matches
        .get_one::<i64>("ttl")
        .copied()
        .unwrap_or(settings.store.ttl_ms);

    info!("存储配置: 名称={}, ttl={}ms, 数据目录={}", name, ttl, data_dir);

    ReactiveStore::new(
        StoreOptions::new()
            .with_store_name(name.as_str())
            .with_ttl(ttl)
            .with_backend(Arc::new(FileBackend::new(data_dir)?))
            .with_event_host(Arc::new(LogEventHost)),
    )
}

/// 执行子命令，返回要打印的输出
pub fn run(matches: &ArgMatches, settings: &Settings) -> StoreResult<String> {
    let store = open_store(matches, settings)?;

    match matches.subcommand() {
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = parse_value(required(sub, "value")?);
            match sub.get_one::<String>("from") {
                Some(from) => store.set_item_in(key, &value, from)?,
                None => store.set_item(key, &value)?,
            }
            Ok("OK".to_string())
        }
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            let value = match sub.get_one::<String>("from") {
                Some(from) => store.get_item_in(key, from)?,
                None => store.get_item(key)?,
            };
            match value {
                Some(value) => Ok(serde_json::to_string_pretty(&value)?),
                None => Ok("(nil)".to_string()),
            }
        }
        Some(("del", sub)) => {
            let key = required(sub, "key")?;
            match sub.get_one::<String>("from") {
                Some(from) => store.delete_item_in(key, from)?,
                None => store.delete_item(key)?,
            }
            Ok("OK".to_string())
        }
        Some(("meta", _)) => Ok(store.metadata()?.to_string()),
        _ => Err(StoreError::ConfigError("未知命令".to_string())),
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> StoreResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| StoreError::ConfigError(format!("缺少参数: {}", name)))
}

/// 按 JSON 解析，失败时当作普通字符串
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| {
        debug!("值 '{}' 不是 JSON，按字符串写入", raw);
        Value::String(raw.to_string())
    })
}
