//! # 资源校验
//!
//! 在任一响应器运行之前查询一次文件元数据，决定请求能否继续。

use std::fs::Metadata;

use log::debug;
use tokio::fs;

use crate::{exception::Exception, param::ContentKind};

#[cfg(unix)]
const OWNER_READ: u32 = 0o400;
#[cfg(unix)]
const OWNER_EXECUTE: u32 = 0o100;

/// 一次 stat 得到的资源信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMeta {
    pub is_regular_file: bool,
    pub readable: bool,
    pub executable: bool,
    pub size: u64,
}

impl ResourceMeta {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::PermissionsExt;
        let mode = metadata.permissions().mode();
        Self {
            is_regular_file: metadata.is_file(),
            readable: mode & OWNER_READ != 0,
            executable: mode & OWNER_EXECUTE != 0,
            size: metadata.len(),
        }
    }

    // 非 unix 平台没有属主权限位，只能近似
    #[cfg(not(unix))]
    fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            is_regular_file: metadata.is_file(),
            readable: true,
            executable: false,
            size: metadata.len(),
        }
    }

    /// 该资源能否按 `kind` 的方式被提供
    pub fn permits(&self, kind: ContentKind) -> bool {
        self.is_regular_file
            && match kind {
                ContentKind::Static => self.readable,
                ContentKind::Dynamic => self.executable,
            }
    }
}

/// 校验 `path` 是否可以按 `kind` 的方式提供。
///
/// - 无法获取元数据：`NotFound`
/// - 不是普通文件，或缺少属主读（静态）/执行（动态）权限：`Forbidden`
pub async fn validate(path: &str, kind: ContentKind, id: u128) -> Result<ResourceMeta, Exception> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(e) => {
            debug!("[ID{}]无法获取{}的元数据：{}", id, path, e);
            return Err(Exception::NotFound(path.to_string()));
        }
    };
    let meta = ResourceMeta::from_metadata(&metadata);
    debug!("[ID{}]{}的元数据：{:?}", id, path, meta);

    if !meta.permits(kind) {
        return Err(Exception::Forbidden {
            path: path.to_string(),
            kind,
        });
    }
    Ok(meta)
}
