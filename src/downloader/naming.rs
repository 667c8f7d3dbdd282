use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

pub const DEFAULT_EXTENSION: &str = "jpg";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "bmp"];

lazy_static! {
    // Windows 下不允许出现在文件名里的字符
    static ref ILLEGAL_CHARS: Regex = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap();
}

/// 只允许 http/https 地址
pub fn is_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(ext))
}

/// 从地址里取图片扩展名，识别不了就用 `jpg`
pub fn extension_from_url(url: &str) -> String {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    };

    path.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| is_image_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

fn digit_count(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// 页面文件名，宽度等于总页数的位数，例如 120 页里的第 3 页是 `003.jpg`
pub fn page_file_name(page: usize, total_pages: usize, ext: &str) -> String {
    format!("{:0width$}.{}", page, ext, width = digit_count(total_pages))
}

/// 清理路径中的单个目录名
pub fn sanitize_path_component(name: &str) -> String {
    let cleaned = ILLEGAL_CHARS.replace_all(name, "");
    let cleaned = cleaned.trim().trim_end_matches(['.', ' ']);
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_file_name_padding() {
        assert_eq!(page_file_name(3, 120, "jpg"), "003.jpg");
        assert_eq!(page_file_name(3, 7, "png"), "3.png");
        assert_eq!(page_file_name(10, 10, "jpg"), "10.jpg");
        assert_eq!(page_file_name(1, 0, "jpg"), "1.jpg");
    }

    #[test]
    fn test_extension_from_url() {
        assert_eq!(extension_from_url("http://a/1.jpg"), "jpg");
        assert_eq!(extension_from_url("https://cdn.example.com/p/2.PNG?token=abc"), "png");
        assert_eq!(extension_from_url("https://cdn.example.com/p/3.webp#frag"), "webp");
        assert_eq!(extension_from_url("https://cdn.example.com/page/4"), "jpg");
        assert_eq!(extension_from_url("https://cdn.example.com/page.php?id=4"), "jpg");
        assert_eq!(extension_from_url("https://cdn.example.com.cn/image"), "jpg");
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("http://a/1.jpg"));
        assert!(is_http_url("https://a/1.jpg"));
        assert!(!is_http_url("ftp://a/1.jpg"));
        assert!(!is_http_url("file:///tmp/1.jpg"));
        assert!(!is_http_url("data:image/png;base64,AAAA"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("One Piece"), "One Piece");
        assert_eq!(sanitize_path_component("Re:Zero / Part?2"), "ReZero  Part2");
        assert_eq!(sanitize_path_component("Vol. 1..."), "Vol. 1");
        assert_eq!(sanitize_path_component("  ???  "), "_");
    }
}
