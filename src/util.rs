use crate::param::CRLF;

/// 错误页面的 HTML 构建器。
///
/// 页面结构固定，嵌入的值不做 HTML 转义。
pub struct HtmlBuilder {
    title: String,
    heading: String,
    message: String,
    footer: String,
}

impl HtmlBuilder {
    pub fn error_page(cause: &str, code: u16, short_msg: &str, long_msg: &str) -> Self {
        Self {
            title: "Tiny Error".to_string(),
            heading: format!("{}: {}", code, short_msg),
            message: format!("{}: {}", long_msg, cause),
            footer: "The Tiny Web server".to_string(),
        }
    }

    pub fn build(&self) -> String {
        [
            "<html><title>",
            &self.title,
            "</title><body bgcolor=\"ffffff\">",
            CRLF,
            &self.heading,
            CRLF,
            "<p>",
            &self.message,
            CRLF,
            "<hr><em>",
            &self.footer,
            "</em>",
            CRLF,
        ]
        .concat()
    }
}
