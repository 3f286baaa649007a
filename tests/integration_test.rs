// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 端到端集成测试
//!
//! 每个用例在 `127.0.0.1` 的随机端口上启动真实的监听循环，
//! 文档根目录是一个临时目录，然后通过原始 TCP 报文与服务器交互。

use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use tiny::{serve, Config, ServerContext};
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

/// 防止服务器挂起时测试永久阻塞
const IO_TIMEOUT: Duration = Duration::from_secs(10);

async fn start(root: &Path, config: Config) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let config = config.with_www_root(root.to_str().unwrap());
    tokio::spawn(serve(listener, Arc::new(ServerContext::new(config))));
    addr
}

async fn send(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut received = Vec::new();
    tokio::time::timeout(IO_TIMEOUT, stream.read_to_end(&mut received))
        .await
        .expect("server did not close the connection")
        .unwrap();
    received
}

/// 拆分为 (状态码, 头部文本, 响应体)
fn split_response(raw: &[u8]) -> (u16, String, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    let head = String::from_utf8_lossy(&raw[..end]).to_string();
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);
    (status, head, raw[end + 4..].to_vec())
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines()
        .skip(1)
        .filter_map(|l| l.split_once(": "))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}

#[tokio::test]
async fn test_home_html_42_bytes() {
    let dir = TempDir::new().unwrap();
    let contents = b"<html><body>Hello from Tiny!</body></html>";
    assert_eq!(contents.len(), 42);
    std::fs::write(dir.path().join("home.html"), contents).unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let raw = send(addr, b"GET /home.html HTTP/1.0\r\nHost: localhost\r\n\r\n").await;
    let (status, head, body) = split_response(&raw);
    assert_eq!(status, 200);
    assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
    assert_eq!(header(&head, "Server"), Some("Tiny Web Server"));
    assert_eq!(header(&head, "Connection"), Some("close"));
    assert_eq!(header(&head, "Content-Length"), Some("42"));
    assert_eq!(header(&head, "Content-Type"), Some("text/html"));
    assert_eq!(body, contents.to_vec());
}

#[tokio::test]
async fn test_root_serves_home_html() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("home.html"), b"index").unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let (status, _, body) = split_response(&send(addr, b"GET / HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 200);
    assert_eq!(body, b"index");
}

#[tokio::test]
async fn test_binary_file_verbatim() {
    let dir = TempDir::new().unwrap();
    let contents: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::write(dir.path().join("photo.jpg"), &contents).unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let (status, head, body) = split_response(&send(addr, b"GET /photo.jpg HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 200);
    assert_eq!(header(&head, "Content-Type"), Some("image/jpeg"));
    assert_eq!(header(&head, "Content-Length"), Some("4096"));
    assert_eq!(body, contents);
}

#[tokio::test]
async fn test_large_file_streamed() {
    let dir = TempDir::new().unwrap();
    let contents = vec![b'q'; 300_000];
    std::fs::write(dir.path().join("big.txt"), &contents).unwrap();
    let addr = start(dir.path(), Config::new().with_streaming_threshold(1024)).await;

    let (status, head, body) = split_response(&send(addr, b"GET /big.txt HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 200);
    assert_eq!(header(&head, "Content-Type"), Some("text/plain"));
    assert_eq!(header(&head, "Content-Length"), Some("300000"));
    assert_eq!(body.len(), 300_000);
}

#[tokio::test]
async fn test_missing_file_404() {
    let dir = TempDir::new().unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let (status, head, body) = split_response(&send(addr, b"GET /nope.html HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 404);
    assert_eq!(header(&head, "Content-Type"), Some("text/html"));
    assert_eq!(header(&head, "Content-Length"), Some(body.len().to_string().as_str()));
    assert!(String::from_utf8_lossy(&body).contains("nope.html"));
}

#[tokio::test]
async fn test_non_get_501() {
    let dir = TempDir::new().unwrap();
    let addr = start(dir.path(), Config::new()).await;

    for method in ["POST", "HEAD", "PUT", "delete"] {
        let raw = format!("{} / HTTP/1.0\r\n\r\n", method);
        let (status, head, body) = split_response(&send(addr, raw.as_bytes()).await);
        assert_eq!(status, 501);
        assert!(head.starts_with("HTTP/1.0 501 Not Implemented\r\n"));
        assert!(String::from_utf8_lossy(&body).contains(method));
    }
}

#[tokio::test]
async fn test_lowercase_get_accepted() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"ok").unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let (status, _, body) = split_response(&send(addr, b"get /a.txt HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 200);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_directory_target_without_slash_is_403() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let (status, _, _) = split_response(&send(addr, b"GET /docs HTTP/1.0\r\n\r\n").await);
    assert_eq!(status, 403);
}

#[tokio::test]
async fn test_concurrent_connections() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.html"), b"AAAA").unwrap();
    let addr = start(dir.path(), Config::new()).await;

    let tasks: Vec<_> = (0..16)
        .map(|_| tokio::spawn(send(addr, b"GET /a.html HTTP/1.0\r\n\r\n")))
        .collect();
    for task in tasks {
        let (status, _, body) = split_response(&task.await.unwrap());
        assert_eq!(status, 200);
        assert_eq!(body, b"AAAA");
    }
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::{fs::Permissions, os::unix::fs::PermissionsExt};

    fn write_with_mode(path: &Path, contents: &[u8], mode: u32) {
        std::fs::write(path, contents).unwrap();
        std::fs::set_permissions(path, Permissions::from_mode(mode)).unwrap();
    }

    fn cgi_dir(root: &TempDir) -> std::path::PathBuf {
        let dir = root.path().join("cgi-bin");
        std::fs::create_dir(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_static_without_owner_read_403() {
        let dir = TempDir::new().unwrap();
        write_with_mode(&dir.path().join("secret.html"), b"hidden", 0o044);
        let addr = start(dir.path(), Config::new()).await;

        let (status, head, body) = split_response(&send(addr, b"GET /secret.html HTTP/1.0\r\n\r\n").await);
        assert_eq!(status, 403);
        assert!(head.starts_with("HTTP/1.0 403 Forbidden\r\n"));
        assert!(String::from_utf8_lossy(&body).contains("couldn't read the file"));
    }

    #[tokio::test]
    async fn test_dynamic_without_owner_execute_403() {
        let dir = TempDir::new().unwrap();
        let cgi = cgi_dir(&dir);
        write_with_mode(&cgi.join("adder"), b"#!/bin/sh\necho hi\n", 0o644);
        let addr = start(dir.path(), Config::new()).await;

        let (status, _, body) = split_response(&send(addr, b"GET /cgi-bin/adder?1&2 HTTP/1.0\r\n\r\n").await);
        assert_eq!(status, 403);
        assert!(String::from_utf8_lossy(&body).contains("couldn't run the CGI program"));
    }

    #[tokio::test]
    async fn test_missing_cgi_404() {
        let dir = TempDir::new().unwrap();
        cgi_dir(&dir);
        let addr = start(dir.path(), Config::new()).await;

        let (status, _, _) = split_response(&send(addr, b"GET /cgi-bin/none?x HTTP/1.0\r\n\r\n").await);
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_cgi_adder() {
        let dir = TempDir::new().unwrap();
        let cgi = cgi_dir(&dir);
        let script = r#"#!/bin/sh
a=${QUERY_STRING%%&*}
b=${QUERY_STRING#*&}
body="The answer is: $a + $b = $((a + b))"
printf 'Connection: close\r\n'
printf 'Content-length: %d\r\n' "${#body}"
printf 'Content-type: text/html\r\n\r\n'
printf '%s' "$body"
"#;
        write_with_mode(&cgi.join("adder"), script.as_bytes(), 0o755);
        let addr = start(dir.path(), Config::new()).await;

        let raw = send(addr, b"GET /cgi-bin/adder?15&27 HTTP/1.0\r\n\r\n").await;
        let text = String::from_utf8(raw).unwrap();
        assert_eq!(
            text,
            "HTTP/1.0 200 OK\r\n\
             Server: Tiny Web Server\r\n\
             Connection: close\r\n\
             Content-length: 27\r\n\
             Content-type: text/html\r\n\
             \r\n\
             The answer is: 15 + 27 = 42"
        );
    }

    /// 动态响应不带服务器计算的 Content-Length，响应体即程序输出
    #[tokio::test]
    async fn test_cgi_output_verbatim_without_length() {
        let dir = TempDir::new().unwrap();
        let cgi = cgi_dir(&dir);
        write_with_mode(
            &cgi.join("env"),
            b"#!/bin/sh\nprintf '\\r\\nq=[%s]' \"$QUERY_STRING\"\n",
            0o755,
        );
        let addr = start(dir.path(), Config::new()).await;

        let raw = send(addr, b"GET /cgi-bin/env HTTP/1.0\r\n\r\n").await;
        let (status, head, body) = split_response(&raw);
        assert_eq!(status, 200);
        assert!(header(&head, "Content-Length").is_none());
        assert_eq!(body, b"q=[]");
    }

    #[tokio::test]
    async fn test_cgi_timeout_closes_connection() {
        let dir = TempDir::new().unwrap();
        let cgi = cgi_dir(&dir);
        write_with_mode(&cgi.join("hang"), b"#!/bin/sh\nexec sleep 30\n", 0o755);
        let addr = start(dir.path(), Config::new().with_cgi_timeout(Some(1))).await;

        let raw = send(addr, b"GET /cgi-bin/hang HTTP/1.0\r\n\r\n").await;
        assert_eq!(raw, b"HTTP/1.0 200 OK\r\nServer: Tiny Web Server\r\n".to_vec());
    }
}
