mod commands;

use rstore_common::config::Settings;
use rstore_common::logger;
use log::{error, info};
use std::process;

fn main() {
    // 解析命令行参数
    let matches = commands::build_cli().get_matches();

    // 加载配置
    let settings = match Settings::new() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("加载配置失败: {}", e);
            process::exit(1);
        }
    };

    // 初始化日志
    if let Err(e) = logger::init_logger(&settings.logging.log_file, &settings.logging.level) {
        eprintln!("初始化日志失败: {}", e);
        process::exit(1);
    }

    info!("启动命令行模式");

    match commands::run(&matches, &settings) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            error!("命令执行失败: {}", e);
            process::exit(1);
        }
    }
}
