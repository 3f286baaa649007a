//! # HTTP 响应构建与静态文件响应器
//!
//! 响应由若干独立计算的部分组成：状态行、按固定顺序排列的响应头、空行、响应体。
//! 所有部分先收集为有序列表，最后一次性拼接，长度在拼接后才确定。

use crate::{
    config::Config,
    exception::Exception,
    param::*,
    transport::Transport,
    util::HtmlBuilder,
    validator::ResourceMeta,
};

use bytes::Bytes;
use log::{debug, error, warn};
use tokio::{
    fs::File,
    io::{self, AsyncRead, AsyncReadExt, AsyncWrite},
};

#[derive(Debug, Clone)]
pub struct Response {
    status_code: u16,
    information: String,
    headers: Vec<(&'static str, String)>,
    content: Option<Bytes>,
}

impl Response {
    fn new(status_code: u16, information: &str) -> Self {
        Self {
            status_code,
            information: information.to_string(),
            headers: Vec::new(),
            content: None,
        }
    }

    fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// 静态文件的响应头：`Server`、`Connection`、`Content-Length`、`Content-Type`，顺序固定
    pub fn static_head(content_length: u64, mime: &str) -> Self {
        Self::new(200, "OK")
            .header("Server", SERVER_NAME)
            .header("Connection", "close")
            .header("Content-Length", content_length.to_string())
            .header("Content-Type", mime)
    }

    /// CGI 响应只有状态行与 `Server` 头。
    ///
    /// 其余响应头与空行由 CGI 程序自己输出，长度事先未知，依靠关闭连接界定报文结束。
    pub fn dynamic_head() -> Self {
        Self::new(200, "OK").header("Server", SERVER_NAME)
    }

    /// 完整的错误响应，`Content-Length` 与 HTML 正文长度严格相等
    pub fn client_error(cause: &str, code: u16, short_msg: &str, long_msg: &str) -> Self {
        let body = HtmlBuilder::error_page(cause, code, short_msg, long_msg).build();
        let content = Bytes::from(body);
        Self::new(code, short_msg)
            .header("Content-Type", "text/html")
            .header("Content-Length", content.len().to_string())
            .with_content(content)
    }

    /// 把客户端可见的异常转化为错误响应，连接级异常返回 `None`
    pub fn from_exception(e: &Exception) -> Option<Self> {
        let (code, short_msg, long_msg) = e.status()?;
        Some(Self::client_error(e.cause().unwrap_or(""), code, short_msg, long_msg))
    }

    fn with_content(mut self, content: Bytes) -> Self {
        self.content = Some(content);
        self
    }

    /// 序列化为报文字节。
    ///
    /// 动态响应的头部不以空行结束，空行由 CGI 程序输出。
    pub fn as_bytes(&self) -> Vec<u8> {
        let status_line = format!(
            "{} {} {}{}",
            HTTP_VERSION, self.status_code, self.information, CRLF
        );
        let mut parts: Vec<&[u8]> = vec![status_line.as_bytes()];
        let header_lines: Vec<String> = self
            .headers
            .iter()
            .map(|(name, value)| [*name, ": ", value.as_str(), CRLF].concat())
            .collect();
        parts.extend(header_lines.iter().map(|l| l.as_bytes()));
        if self.terminates_head() {
            parts.push(CRLF.as_bytes());
        }
        if let Some(c) = &self.content {
            parts.push(&c[..]);
        }
        parts.concat()
    }

    fn terminates_head(&self) -> bool {
        self.headers.iter().any(|(name, _)| *name == "Content-Length")
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }
}

/// 打开已校验过的文件。此时尚未写出任何字节，打开失败仍可转为错误响应。
async fn open_validated(path: &str) -> Result<File, Exception> {
    match File::open(path).await {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Exception::NotFound(path.to_string())),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => Err(Exception::Forbidden {
            path: path.to_string(),
            kind: ContentKind::Static,
        }),
        Err(e) => Err(Exception::Transport(e)),
    }
}

/// 静态文件响应器，返回写出的响应体字节数。
///
/// 不超过流式阈值的文件先整体读入，`Content-Length` 取实际读到的字节数；
/// 更大的文件按块转发，读到的字节少于声明长度时返回 `ShortRead`。
pub async fn serve_static<S>(
    transport: &mut Transport<S>,
    path: &str,
    meta: &ResourceMeta,
    config: &Config,
    id: u128,
) -> Result<u64, Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mime = get_mime(path);
    debug!("[ID{}]Content-Type: {}", id, mime);
    let file = open_validated(path).await?;

    if meta.size > config.streaming_threshold() {
        debug!(
            "[ID{}]文件大小{}超过流式阈值{}，使用流式传输",
            id,
            meta.size,
            config.streaming_threshold()
        );
        let head = Response::static_head(meta.size, mime);
        transport.write_bytes(&head.as_bytes()).await?;
        let mut limited = file.take(meta.size);
        let sent = transport.copy_from(&mut limited, config.chunk_size()).await?;
        if sent < meta.size {
            error!("[ID{}]文件{}在传输过程中变短：声明{}字节，实际{}字节", id, path, meta.size, sent);
            return Err(Exception::ShortRead {
                expected: meta.size,
                actual: sent,
            });
        }
        transport.flush().await?;
        return Ok(sent);
    }

    let mut contents = Vec::with_capacity(meta.size as usize);
    file.take(meta.size).read_to_end(&mut contents).await?;
    if contents.len() as u64 != meta.size {
        warn!(
            "[ID{}]文件{}的实际长度{}与元数据中的{}不一致，以实际读取为准",
            id,
            path,
            contents.len(),
            meta.size
        );
    }
    let content = Bytes::from(contents);
    let response = Response::static_head(content.len() as u64, mime).with_content(content);
    let bytes = response.as_bytes();
    debug!("[ID{}]发送全量响应，长度: {}", id, bytes.len());
    transport.write_bytes(&bytes).await?;
    transport.flush().await?;
    Ok(response.content().map_or(0, |c| c.len() as u64))
}
