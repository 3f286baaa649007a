// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Tiny Web 服务器
//!
//! 一个迷你的 HTTP/1.0 服务器，只处理 GET 请求：
//! - 从文档根目录返回静态文件
//! - 执行 CGI 程序，把其标准输出作为响应体
//!
//! 用法：`tiny <port>`。其余运行参数来自 `config/development.toml`。

use std::{
    env,
    net::{Ipv4Addr, SocketAddrV4},
    process,
    sync::Arc,
};

use log::{error, info};
use tokio::{net::TcpListener, runtime::Builder};

use tiny::{logging, serve, Config, ServerContext};

const LOG_CONFIG: &str = "config/log4rs.yaml";
const SERVER_CONFIG: &str = "config/development.toml";

fn usage(program: &str) -> ! {
    eprintln!("usage: {} <port>", program);
    process::exit(1);
}

/// # 程序入口点
///
/// 检查命令行参数、初始化日志与配置，然后启动多线程运行时与监听循环。
fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map_or("tiny", |s| s.as_str());
    if args.len() != 2 {
        usage(program);
    }
    let port: u16 = match args[1].parse() {
        Ok(p) => p,
        Err(_) => usage(program),
    };

    logging::init(LOG_CONFIG);

    let config = Config::from_toml(SERVER_CONFIG);
    info!("配置文件已载入");
    info!("www root: {}", config.www_root());

    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            error!("无法创建Tokio运行时：{}", e);
            process::exit(1);
        }
    };

    runtime.block_on(run(port, config));
}

async fn run(port: u16, config: Config) {
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    let socket = SocketAddrV4::new(address, port);
    info!("服务端将在{}上监听Socket连接", socket);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            process::exit(1);
        }
    };
    info!("端口{}绑定完成", port);

    serve(listener, Arc::new(ServerContext::new(config))).await;
}
