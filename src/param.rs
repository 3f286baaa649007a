// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 协议参数与常量模块
//!
//! 该模块定义了 Tiny 服务器遵循的 HTTP/1.0 协议相关常量，包括：
//! - 服务器标识与换行符。
//! - 本服务器会用到的状态码及其原因短语（Reason Phrase）。
//! - 有序的后缀到 MIME 类型映射表。

use std::collections::HashMap;
use lazy_static::lazy_static;

/// 服务器名称标识，用于 HTTP 响应头的 `Server` 字段
pub const SERVER_NAME: &str = "Tiny Web Server";

/// 响应报文使用的协议版本
pub const HTTP_VERSION: &str = "HTTP/1.0";

/// HTTP 协议规定的换行符（Carriage Return Line Feed）
pub const CRLF: &str = "\r\n";

/// 本服务器唯一支持的请求方法
pub const SUPPORTED_METHOD: &str = "GET";

/// 向 CGI 程序传递查询字符串时使用的环境变量名
pub const QUERY_STRING_VAR: &str = "QUERY_STRING";

/// 请求目标中标识动态内容的片段
pub const DEFAULT_CGI_MARKER: &str = "cgi-bin";

/// 目标以 `/` 结尾时追加的默认文档
pub const DEFAULT_DOCUMENT: &str = "home.html";

/// 未匹配任何后缀时使用的兜底类型
pub const FALLBACK_MIME: &str = "text/plain";

/// 后缀到 MIME 类型的有序映射表。
///
/// 按顺序逐项匹配，第一个命中的后缀生效，因此顺序是有意义的。
pub const MIME_TYPES: &[(&str, &str)] = &[
    (".html", "text/html"),
    (".gif", "image/gif"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".mpg", "video/mpeg"),
];

lazy_static! {
    /// 本服务器会产生的状态码与其原因短语。
    ///
    /// 错误响应的状态行使用各自的短消息，此表主要用于日志输出。
    pub static ref STATUS_CODES: HashMap<u16, &'static str> = {
        let mut map = HashMap::new();
        map.insert(200, "OK");
        map.insert(403, "Forbidden");
        map.insert(404, "Not Found");
        map.insert(501, "Not Implemented");
        map
    };
}

/// 根据路径后缀确定 `Content-Type`。
///
/// 后缀比较不区分 ASCII 大小写，例如 `.MPG` 与 `.mpg` 等价。
pub fn get_mime(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    MIME_TYPES
        .iter()
        .find(|(suffix, _)| lower.ends_with(suffix))
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}

/// 资源类别：静态文件或 CGI 程序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// 原样返回的文件
    Static,
    /// 需要执行的程序，其标准输出即响应体
    Dynamic,
}

use std::fmt;

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ContentKind::Static => write!(f, "static"),
            ContentKind::Dynamic => write!(f, "dynamic"),
        }
    }
}
