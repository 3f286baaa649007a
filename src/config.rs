use num_cpus;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;
use std::time::Duration;

use crate::param::{DEFAULT_CGI_MARKER, DEFAULT_DOCUMENT};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_www_root")]
    www_root: String,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default)]
    local: bool,
    #[serde(default = "default_cgi_marker")]
    cgi_marker: String,
    #[serde(default = "default_document")]
    default_document: String,
    #[serde(default = "default_streaming_threshold")]
    streaming_threshold: u64,
    #[serde(default = "default_chunk_size")]
    chunk_size: usize,
    #[serde(default = "default_max_line_length")]
    max_line_length: usize,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    cgi_timeout_secs: Option<u64>,
}

fn default_www_root() -> String {
    ".".to_string()
}

fn default_cgi_marker() -> String {
    DEFAULT_CGI_MARKER.to_string()
}

fn default_document() -> String {
    DEFAULT_DOCUMENT.to_string()
}

fn default_streaming_threshold() -> u64 {
    10485760 // 10MB
}

fn default_chunk_size() -> usize {
    262144 // 256KB
}

fn default_max_line_length() -> usize {
    8192
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            www_root: default_www_root(),
            worker_threads: 0,
            local: false,
            cgi_marker: default_cgi_marker(),
            default_document: default_document(),
            streaming_threshold: default_streaming_threshold(),
            chunk_size: default_chunk_size(),
            max_line_length: default_max_line_length(),
            request_timeout_secs: None,
            cgi_timeout_secs: None,
        }
    }

    /// 从 TOML 文件加载配置。
    ///
    /// 文件缺失或无法解析时退回默认配置，服务器照常启动。
    pub fn from_toml(filename: &str) -> Self {
        let mut str_val = String::new();
        match File::open(filename).and_then(|mut f| f.read_to_string(&mut str_val)) {
            Ok(_) => {}
            Err(e) => {
                warn!("无法读取配置文件{}：{}，使用默认配置", filename, e);
                return Self::new().normalized();
            }
        }
        Self::from_toml_str(&str_val)
    }

    pub fn from_toml_str(s: &str) -> Self {
        let raw_config: Config = match toml::from_str(s) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象：{}，使用默认配置", e);
                Config::new()
            }
        };
        raw_config.normalized()
    }

    fn normalized(mut self) -> Self {
        if self.worker_threads == 0 {
            self.worker_threads = num_cpus::get();
        }
        if self.chunk_size == 0 {
            warn!("chunk_size被设置为0，该值将被改为默认值{}。", default_chunk_size());
            self.chunk_size = default_chunk_size();
        }
        // 去掉末尾的 '/'，因为请求目标总是以 '/' 开头
        while self.www_root.len() > 1 && self.www_root.ends_with('/') {
            self.www_root.pop();
        }
        self
    }

    /// 设置文档根目录，测试与嵌入场景使用
    pub fn with_www_root(mut self, root: &str) -> Self {
        self.www_root = root.to_string();
        self.normalized()
    }

    pub fn with_cgi_timeout(mut self, secs: Option<u64>) -> Self {
        self.cgi_timeout_secs = secs;
        self
    }

    pub fn with_request_timeout(mut self, secs: Option<u64>) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn with_streaming_threshold(mut self, threshold: u64) -> Self {
        self.streaming_threshold = threshold;
        self
    }
}

impl Config {
    pub fn www_root(&self) -> &str {
        &self.www_root
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn cgi_marker(&self) -> &str {
        &self.cgi_marker
    }

    pub fn default_document(&self) -> &str {
        &self.default_document
    }

    pub fn streaming_threshold(&self) -> u64 {
        self.streaming_threshold
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn cgi_timeout(&self) -> Option<Duration> {
        self.cgi_timeout_secs.map(Duration::from_secs)
    }
}
