//! # CGI 动态响应器
//!
//! 先写出状态行与 `Server` 头，然后执行目标程序，把它的标准输出原样转发到连接上。
//! 查询字符串只通过子进程自己的环境变量传递，不改动服务器进程的环境。

use std::process::Stdio;

use log::{debug, error, warn};
use tokio::{
    io::{self, AsyncRead, AsyncWrite},
    process::Command,
};

use crate::{
    config::Config,
    exception::Exception,
    param::QUERY_STRING_VAR,
    response::Response,
    transport::Transport,
};

/// 构造子进程命令：无参数，继承环境，附加 `QUERY_STRING`
fn build_command(path: &str, query: &str) -> Command {
    let mut command = Command::new(path);
    command
        .env(QUERY_STRING_VAR, query)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);
    command
}

/// 动态响应器，返回 CGI 程序输出的字节数。
///
/// 程序的退出状态只记录日志，不影响响应。
pub async fn serve_dynamic<S>(
    transport: &mut Transport<S>,
    path: &str,
    query: &str,
    config: &Config,
    id: u128,
) -> Result<u64, Exception>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    transport
        .write_bytes(&Response::dynamic_head().as_bytes())
        .await?;
    transport.flush().await?;

    debug!("[ID{}]执行CGI程序：{}，{}={}", id, path, QUERY_STRING_VAR, query);
    let mut child = match build_command(path, query).spawn() {
        Ok(c) => c,
        Err(e) => {
            error!("[ID{}]无法启动CGI程序{}：{}", id, path, e);
            return Err(Exception::ProcessInvocationFailure(e));
        }
    };
    let mut stdout = child.stdout.take().ok_or_else(|| {
        Exception::ProcessInvocationFailure(io::Error::new(
            io::ErrorKind::Other,
            "child stdout was not captured",
        ))
    })?;

    let chunk_size = config.chunk_size();
    let relay = async {
        let sent = transport.copy_from(&mut stdout, chunk_size).await?;
        let status = child.wait().await?;
        transport.flush().await?;
        Ok::<_, Exception>((sent, status))
    };

    let (sent, status) = match config.cgi_timeout() {
        Some(limit) => {
            let outcome = tokio::time::timeout(limit, relay).await;
            match outcome {
                Ok(result) => result?,
                Err(_) => {
                    warn!("[ID{}]CGI程序{}超过{:?}仍未结束，强制终止", id, path, limit);
                    if let Err(e) = child.kill().await {
                        error!("[ID{}]终止CGI程序失败：{}", id, e);
                    }
                    return Err(Exception::Timeout);
                }
            }
        }
        None => relay.await?,
    };

    if status.success() {
        debug!("[ID{}]CGI程序正常退出，输出{}字节", id, sent);
    } else {
        warn!("[ID{}]CGI程序{}以{}退出，输出{}字节", id, path, status, sent);
    }
    Ok(sent)
}
