// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求解析模块
//!
//! 负责从连接中读取请求行，并把它拆分为 `Request` 结构体：
//! 1. 请求行（Request-Line）的解析（方法、目标、版本）。
//! 2. 方法校验：只接受 GET（不区分大小写）。
//! 3. 读取并丢弃后续的请求头，直到空行为止。

use crate::{exception::Exception, param::SUPPORTED_METHOD, transport::Transport};
use log::{debug, warn};
use tokio::io::{AsyncRead, AsyncWrite};

/// 一次 HTTP 请求的请求行。
///
/// 构造之后不可变，请求处理结束即丢弃。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// 请求方法，保持客户端发送的原样
    method: String,
    /// 原始请求目标（可能包含查询字符串）
    target: String,
    /// 协议版本字符串
    version: String,
}

impl Request {
    /// 把一行文本拆分为方法、目标与版本。
    ///
    /// 以空白分隔，缺失的字段为空字符串，多余的字段被忽略。
    pub fn parse_line(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let mut next = || parts.next().unwrap_or("").to_string();
        let method = next();
        let target = next();
        let version = next();
        Self {
            method,
            target,
            version,
        }
    }

    /// 方法是否为 GET（不区分大小写）
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case(SUPPORTED_METHOD)
    }

    /// 从连接中读取一次请求。
    ///
    /// # 流程
    /// 1. 读取请求行；连接在此之前关闭时返回 `ConnectionClosed`。
    /// 2. 方法不是 GET 时立即返回 `MethodNotImplemented`，不再读取请求头。
    /// 3. 读取并丢弃请求头，直到空行或流结束。
    pub async fn read_from<S>(transport: &mut Transport<S>, id: u128) -> Result<Self, Exception>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let line = transport.read_line().await?;
        if line.is_empty() {
            return Err(Exception::ConnectionClosed);
        }
        let line = String::from_utf8_lossy(&line);
        debug!("[ID{}]请求行：{}", id, line.trim_end());

        let request = Self::parse_line(&line);
        if !request.is_get() {
            warn!("[ID{}]不支持的HTTP请求方法：{}", id, request.method);
            return Err(Exception::MethodNotImplemented(request.method));
        }

        read_request_headers(transport, id).await?;
        Ok(request)
    }
}

/// 读取并丢弃请求头。本服务器不使用任何请求头，只在调试日志中记录。
async fn read_request_headers<S>(transport: &mut Transport<S>, id: u128) -> Result<(), Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let line = transport.read_line().await?;
        if line.is_empty() || line == b"\r\n" || line == b"\n" {
            return Ok(());
        }
        debug!("[ID{}]请求头：{}", id, String::from_utf8_lossy(&line).trim_end());
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 获取请求目标（含查询参数）
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
