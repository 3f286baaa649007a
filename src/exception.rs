// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了服务器在单个请求处理流程中可能出现的各类异常情况。
//!
//! ## 分类
//! - **客户端可见**：`MethodNotImplemented`、`NotFound`、`Forbidden`，
//!   统一由错误响应器转化为 501 / 404 / 403 响应。
//! - **连接级**：传输错误、CGI 启动失败、短读、超时。这些错误只终止当前连接，
//!   绝不会影响监听循环。

use std::{fmt, io};

use crate::param::ContentKind;

/// 服务器处理请求过程中发生的异常类型。
#[derive(Debug)]
pub enum Exception {
    /// 客户端使用了 GET 以外的方法，携带原始方法字符串。对应 `501 Not Implemented`。
    MethodNotImplemented(String),
    /// 解析后的路径不存在或无法获取元数据。对应 `404 Not Found`。
    NotFound(String),
    /// 路径不是普通文件，或缺少所需的属主权限位。对应 `403 Forbidden`。
    Forbidden { path: String, kind: ContentKind },
    /// 客户端在发送请求行之前就关闭了连接。
    ConnectionClosed,
    /// 连接上的 I/O 错误，仅终止当前连接。
    Transport(io::Error),
    /// CGI 程序无法启动。此时响应头已发出，没有恢复路径。
    ProcessInvocationFailure(io::Error),
    /// 文件实际读出的字节数少于已声明的 `Content-Length`。
    ShortRead { expected: u64, actual: u64 },
    /// 读取请求或等待 CGI 程序超过了配置的时限。
    Timeout,
}

use Exception::*;

impl Exception {
    /// 客户端可见的异常对应的 `(状态码, 短消息, 长消息)`。
    ///
    /// 连接级异常返回 `None`，调用方应直接关闭连接。
    pub fn status(&self) -> Option<(u16, &'static str, &'static str)> {
        match self {
            MethodNotImplemented(_) => {
                Some((501, "Not Implemented", "Tiny does not implement this method"))
            }
            NotFound(_) => Some((404, "Not found", "Tiny couldn't find this file")),
            Forbidden {
                kind: ContentKind::Static,
                ..
            } => Some((403, "Forbidden", "Tiny couldn't read the file")),
            Forbidden {
                kind: ContentKind::Dynamic,
                ..
            } => Some((403, "Forbidden", "Tiny couldn't run the CGI program")),
            _ => None,
        }
    }

    /// 嵌入错误页面的"肇事值"：方法名或路径
    pub fn cause(&self) -> Option<&str> {
        match self {
            MethodNotImplemented(method) => Some(method),
            NotFound(path) | Forbidden { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodNotImplemented(method) => write!(f, "Method not implemented: {}", method),
            NotFound(path) => write!(f, "File not found (404): {}", path),
            Forbidden { path, kind } => write!(f, "Forbidden {} resource (403): {}", kind, path),
            ConnectionClosed => write!(f, "Connection closed before request line"),
            Transport(e) => write!(f, "Transport failure: {}", e),
            ProcessInvocationFailure(e) => write!(f, "Couldn't invoke CGI program: {}", e),
            ShortRead { expected, actual } => {
                write!(f, "Short read: expected {} bytes, got {}", expected, actual)
            }
            Timeout => write!(f, "Operation timed out"),
        }
    }
}

impl std::error::Error for Exception {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Transport(e) | ProcessInvocationFailure(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Exception {
    fn from(e: io::Error) -> Self {
        Transport(e)
    }
}
