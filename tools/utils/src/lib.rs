//! 回放工具依赖的通用组件.

use std::env;
use std::io;

use lasso_berry::csrf;

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep_to<W: io::Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获取 CSRF token.
///
/// 1. 若环境变量 `$LASSO_BERRY_CSRF` 非空, 则返回其值;
/// 2. 否则, 在 `$LASSO_BERRY_COOKIE` 中查找名为 `cookie_name` 的值.
pub fn csrf_token_from_env(cookie_name: &str) -> Option<String> {
    match env::var("LASSO_BERRY_CSRF") {
        Ok(t) if !t.is_empty() => Some(t),
        _ => env::var("LASSO_BERRY_COOKIE")
            .ok()
            .and_then(|c| csrf::token_from_cookie(&c, cookie_name)),
    }
}
