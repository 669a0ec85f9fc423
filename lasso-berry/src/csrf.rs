//! 从 cookie 字符串中读取 CSRF token.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;

/// 在形如 `a=1; csrftoken=xyz; b=2` 的 `cookie` 中查找名为 `name` 的值, 并做百分号解码.
///
/// 找不到、或者解码后不是合法 UTF-8 时返回 `None`.
pub fn token_from_cookie(cookie: &str, name: &str) -> Option<String> {
    cookie
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .and_then(|raw| percent_decode_str(raw).decode_utf8().ok())
        .map(Cow::into_owned)
}

#[cfg(test)]
mod tests {
    use super::token_from_cookie;

    #[test]
    fn test_token_lookup() {
        let cookie = "sessionid=abc; csrftoken=Xy%2Bz9; theme=dark";
        assert_eq!(token_from_cookie(cookie, "csrftoken").as_deref(), Some("Xy+z9"));
        assert_eq!(token_from_cookie(cookie, "theme").as_deref(), Some("dark"));
        assert_eq!(token_from_cookie(cookie, "missing"), None);
        assert_eq!(token_from_cookie("", "csrftoken"), None);
    }

    #[test]
    fn test_prefix_is_not_a_match() {
        let cookie = "csrftokenold=1;csrftoken=2";
        assert_eq!(token_from_cookie(cookie, "csrftoken").as_deref(), Some("2"));
    }

    #[test]
    fn test_bad_escape_kept() {
        assert_eq!(token_from_cookie("t=a%zzb%4", "t").as_deref(), Some("a%zzb%4"));
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(token_from_cookie("t=%FF%FE", "t"), None);
        assert_eq!(token_from_cookie("t=%E4%BD%A0", "t").as_deref(), Some("你"));
    }
}
