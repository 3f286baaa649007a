//! # 行缓冲传输层
//!
//! 对已连接的双向字节流做一层薄封装：按行读取、按长度读取、原样写出。
//! 任何 I/O 错误都会以 `Exception::Transport` 的形式上抛，由调用方终止当前连接。

use tokio::io::{
    self, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::exception::Exception;

pub struct Transport<S> {
    inner: BufReader<S>,
    max_line_length: usize,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, max_line_length: usize) -> Self {
        Self {
            inner: BufReader::new(stream),
            max_line_length,
        }
    }

    /// 读取一行（包含行尾的 `\n`）。
    ///
    /// 流已结束时返回空缓冲区；超过最大行长仍未见到换行符视为传输错误。
    pub async fn read_line(&mut self) -> Result<Vec<u8>, Exception> {
        let mut line = Vec::new();
        let limit = self.max_line_length as u64;
        let n = (&mut self.inner).take(limit).read_until(b'\n', &mut line).await?;
        if n as u64 == limit && !line.ends_with(b"\n") {
            return Err(Exception::Transport(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", self.max_line_length),
            )));
        }
        Ok(line)
    }

    /// 精确读取 `n` 个字节，流提前结束时报错
    pub async fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Exception> {
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf).await?;
        Ok(buf)
    }

    pub async fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Exception> {
        self.inner.get_mut().write_all(buf).await?;
        Ok(())
    }

    /// 把 `reader` 的全部内容原样转发到连接上，返回转发的字节数
    pub async fn copy_from<R>(&mut self, reader: &mut R, chunk_size: usize) -> Result<u64, Exception>
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = BufReader::with_capacity(chunk_size, reader);
        let copied = io::copy_buf(&mut reader, self.inner.get_mut()).await?;
        Ok(copied)
    }

    pub async fn flush(&mut self) -> Result<(), Exception> {
        self.inner.get_mut().flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), Exception> {
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}
