//! # 连接处理与监听循环
//!
//! 每个连接由独立的 Tokio 任务处理，任务内部按顺序执行完整的请求流水线：
//! 解析请求 → 分类目标 → 校验资源 → 静态/动态响应。
//! 任何一步失败都只影响当前连接，监听循环不会因此中断。

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpListener,
};

use crate::{
    cgi::serve_dynamic,
    config::Config,
    exception::Exception,
    param::{ContentKind, STATUS_CODES},
    request::Request,
    response::{serve_static, Response},
    transport::Transport,
    uri::Classifier,
    validator::validate,
};

/// 所有连接共享的只读上下文
pub struct ServerContext {
    config: Config,
    classifier: Classifier,
    active_connection: AtomicU32,
}

impl ServerContext {
    pub fn new(config: Config) -> Self {
        let classifier = Classifier::from_config(&config);
        Self {
            config,
            classifier,
            active_connection: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 当前正在处理的连接数
    pub fn active_connection(&self) -> u32 {
        self.active_connection.load(Ordering::SeqCst)
    }
}

/// 持续接收新连接，每个连接交给一个独立任务处理
pub async fn serve(listener: TcpListener, ctx: Arc<ServerContext>) {
    let mut id: u128 = 0;
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("接受连接时遇到错误：{}", e);
                continue;
            }
        };
        info!("Accepted connection from ({}, {})", addr.ip(), addr.port());

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let active = ctx.active_connection.fetch_add(1, Ordering::SeqCst) + 1;
            debug!("[ID{}]TCP连接已建立，当前活跃连接数：{}", id, active);
            handle_connection(stream, id, &ctx).await;
            ctx.active_connection.fetch_sub(1, Ordering::SeqCst);
        });
        id += 1;
    }
}

/// # 连接处理器
///
/// 负责单个连接的完整生命周期：处理一次请求，然后关闭连接。
pub async fn handle_connection<S>(stream: S, id: u128, ctx: &ServerContext)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut transport = Transport::new(stream, ctx.config.max_line_length());

    match process(&mut transport, id, ctx).await {
        Ok(()) => {}
        Err(e) => match Response::from_exception(&e) {
            Some(response) => {
                info!(
                    "[ID{}] {}, {}, {}, {}",
                    id,
                    e.cause().unwrap_or(""),
                    response.status_code(),
                    response.information(),
                    e,
                );
                if let Err(e) = transport.write_bytes(&response.as_bytes()).await {
                    error!("[ID{}]发送错误响应失败：{}", id, e);
                    return;
                }
            }
            None => match e {
                Exception::ConnectionClosed => debug!("[ID{}]{}", id, e),
                Exception::Timeout => warn!("[ID{}]{}，关闭连接", id, e),
                _ => error!("[ID{}]{}，关闭连接", id, e),
            },
        },
    }

    if let Err(e) = transport.shutdown().await {
        debug!("[ID{}]关闭连接时遇到错误：{}", id, e);
    }
}

/// 单次请求的流水线，客户端可见的失败以 `Err` 返回，由调用方生成错误响应
async fn process<S>(transport: &mut Transport<S>, id: u128, ctx: &ServerContext) -> Result<(), Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = match ctx.config.request_timeout() {
        Some(limit) => tokio::time::timeout(limit, Request::read_from(transport, id))
            .await
            .map_err(|_| Exception::Timeout)??,
        None => Request::read_from(transport, id).await?,
    };

    let resolved = ctx.classifier.classify(request.target());
    debug!(
        "[ID{}]目标{}解析为{}资源：{}，查询字符串：{}",
        id,
        request.target(),
        resolved.kind(),
        resolved.path(),
        resolved.query()
    );

    let meta = validate(resolved.path(), resolved.kind(), id).await?;

    let sent = match resolved.kind() {
        ContentKind::Static => serve_static(transport, resolved.path(), &meta, &ctx.config, id).await?,
        ContentKind::Dynamic => {
            serve_dynamic(transport, resolved.path(), resolved.query(), &ctx.config, id).await?
        }
    };

    info!(
        "[ID{}] {}, {}, {}, 200, {}, {} bytes",
        id,
        request.version(),
        request.target(),
        request.method(),
        STATUS_CODES.get(&200).copied().unwrap_or("OK"),
        sent,
    );
    Ok(())
}
