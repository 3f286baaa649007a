//! # 日志初始化
//!
//! 优先使用 `config/log4rs.yaml` 中的配置；文件缺失或格式错误时退回到控制台输出。

use log::{warn, LevelFilter};
use log4rs::{
    append::console::ConsoleAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const FALLBACK_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

pub fn init(path: &str) {
    let e = match log4rs::init_file(path, Default::default()) {
        Ok(()) => return,
        Err(e) => e,
    };

    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FALLBACK_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match config {
        Ok(c) => match log4rs::init_config(c) {
            Ok(_) => warn!("无法从{}载入日志配置：{}，使用默认的控制台输出", path, e),
            Err(err) => eprintln!("无法初始化日志系统：{}", err),
        },
        Err(err) => eprintln!("无法构建默认日志配置：{}", err),
    }
}
