//! # 请求目标分类
//!
//! 把请求目标映射为文件系统路径与查询字符串，并判定静态/动态。
//!
//! 注意：这里不做任何路径遍历检查，包含 `..` 的目标可以解析到文档根目录之外。

use crate::{config::Config, param::ContentKind};

/// 由请求目标推导出的资源位置，仅归当前请求所有
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    path: String,
    query: String,
    kind: ContentKind,
}

/// 分类规则：动态标记、文档根前缀与默认文档
#[derive(Debug, Clone)]
pub struct Classifier {
    root: String,
    cgi_marker: String,
    default_document: String,
}

impl Classifier {
    pub fn new(root: &str, cgi_marker: &str, default_document: &str) -> Self {
        Self {
            root: root.to_string(),
            cgi_marker: cgi_marker.to_string(),
            default_document: default_document.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.www_root(),
            config.cgi_marker(),
            config.default_document(),
        )
    }

    /// 对请求目标进行分类，总是成功。
    ///
    /// - 不含动态标记：静态，查询字符串为空；以 `/` 结尾时追加默认文档。
    /// - 含动态标记：动态，在第一个 `?` 处切分，之后的部分为查询字符串。
    pub fn classify(&self, target: &str) -> ResolvedTarget {
        if !target.contains(self.cgi_marker.as_str()) {
            let mut path = [self.root.as_str(), target].concat();
            if target.ends_with('/') {
                path.push_str(&self.default_document);
            }
            return ResolvedTarget {
                path,
                query: String::new(),
                kind: ContentKind::Static,
            };
        }

        let (resource, query) = target.split_once('?').unwrap_or((target, ""));
        ResolvedTarget {
            path: [self.root.as_str(), resource].concat(),
            query: query.to_string(),
            kind: ContentKind::Dynamic,
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&Config::new())
    }
}

impl ResolvedTarget {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }
}
