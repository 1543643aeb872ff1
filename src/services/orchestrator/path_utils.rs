//! Request Text Helpers
//!
//! Pulls paths, fenced code blocks and `prefix: payload` tails out of a
//! free-form request.

use std::sync::OnceLock;

use regex::Regex;

struct PathPatterns {
    windows: Regex,
    unix: Regex,
    quoted: Regex,
    relative_file: Regex,
    fence: Regex,
}

fn patterns() -> &'static Option<PathPatterns> {
    static PATTERNS: OnceLock<Option<PathPatterns>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        Some(PathPatterns {
            windows: Regex::new(r#"[A-Za-z]:\\[^\s"']+"#).ok()?,
            // Anchored on whitespace so `a/b` inside code is not taken as a path.
            unix: Regex::new(r#"(?:^|\s)(/[^\s"']+)"#).ok()?,
            quoted: Regex::new(r#"["']([^"']+)["']"#).ok()?,
            relative_file: Regex::new(
                r#"(?:^|\s)((?:[\w.-]+/)*[\w-]+\.[A-Za-z0-9]{1,8})(?:$|[\s,;:])"#,
            )
            .ok()?,
            fence: Regex::new(r"(?s)```[^\n`]*\n?(.*?)```").ok()?,
        })
    })
}

fn trim_trailing_punctuation(path: &str) -> &str {
    path.trim_end_matches(['.', ',', ';', ':', ')', '?', '!'])
}

/// Find a path in the request: a Windows drive path, then a Unix absolute
/// path, then a quoted string.
pub fn extract_path(query: &str) -> Option<String> {
    let p = patterns().as_ref()?;

    if let Some(m) = p.windows.find(query) {
        return Some(trim_trailing_punctuation(m.as_str()).to_string());
    }
    if let Some(c) = p.unix.captures(query).and_then(|c| c.get(1)) {
        return Some(trim_trailing_punctuation(c.as_str()).to_string());
    }
    if let Some(c) = p.quoted.captures(query).and_then(|c| c.get(1)) {
        let quoted = c.as_str().trim();
        if !quoted.is_empty() {
            return Some(quoted.to_string());
        }
    }
    None
}

/// Path named in the command part of a request: fenced blocks are dropped
/// and only the text before the first `:` (drive colons aside) is searched.
/// Quoted strings are ignored.
pub fn extract_command_path(query: &str) -> Option<String> {
    let p = patterns().as_ref()?;
    let text = strip_fenced_blocks(query);
    let head = command_head(&text);

    if let Some(m) = p.windows.find(head) {
        return Some(trim_trailing_punctuation(m.as_str()).to_string());
    }
    p.unix
        .captures(head)
        .and_then(|c| c.get(1))
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
}

/// Text before the first colon that is not part of a `C:\` drive prefix.
fn command_head(text: &str) -> &str {
    let bytes = text.as_bytes();
    for (idx, b) in bytes.iter().enumerate() {
        if *b != b':' {
            continue;
        }
        let drive_letter = idx >= 1
            && bytes[idx - 1].is_ascii_alphabetic()
            && (idx == 1 || !bytes[idx - 2].is_ascii_alphanumeric());
        let separator = matches!(bytes.get(idx + 1), Some(b'\\') | Some(b'/'));
        if !(drive_letter && separator) {
            return &text[..idx];
        }
    }
    text
}

/// Like `extract_path`, but also accepts a bare relative file name such as
/// `notes.txt` or `src/app.py`. Fenced code blocks are ignored.
pub fn extract_file_path(query: &str) -> Option<String> {
    let text = strip_fenced_blocks(query);
    if let Some(path) = extract_path(&text) {
        return Some(path);
    }
    let p = patterns().as_ref()?;
    p.relative_file
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Body of the first fenced code block.
pub fn extract_fenced_block(text: &str) -> Option<String> {
    let p = patterns().as_ref()?;
    p.fence
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('\n').to_string())
        .filter(|body| !body.trim().is_empty())
}

/// The request with every fenced code block removed.
pub fn strip_fenced_blocks(text: &str) -> String {
    match patterns().as_ref() {
        Some(p) => p.fence.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    }
}

/// Everything after the first `:`, trimmed; `None` when empty or absent.
pub fn text_after_colon(query: &str) -> Option<&str> {
    query
        .split_once(':')
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Final path component, for display.
pub fn display_name(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_path_ignores_code_after_colon() {
        assert_eq!(
            extract_command_path("refactor: def greet(): return 'greeting'"),
            None
        );
        assert_eq!(
            extract_command_path("refactor: open('/tmp/x').read()"),
            None
        );
        assert_eq!(
            extract_command_path("refactor: x = 1\n  /etc/hosts"),
            None
        );
        assert_eq!(
            extract_command_path("optimize\n```\nload('/srv/data.csv')\n```"),
            None
        );
    }

    #[test]
    fn test_command_path_before_colon() {
        assert_eq!(
            extract_command_path("refactor /tmp/calc.py"),
            Some("/tmp/calc.py".to_string())
        );
        assert_eq!(
            extract_command_path("refactor /tmp/calc.py: split add()"),
            Some("/tmp/calc.py".to_string())
        );
        assert_eq!(
            extract_command_path(r"optimize C:\work\app.py: faster loop"),
            Some(r"C:\work\app.py".to_string())
        );
        assert_eq!(extract_command_path("refactor 'notes.txt'"), None);
    }

    #[test]
    fn test_windows_path_first() {
        assert_eq!(
            extract_path(r"read file C:\work\app.py and /tmp/x"),
            Some(r"C:\work\app.py".to_string())
        );
    }

    #[test]
    fn test_unix_path() {
        assert_eq!(
            extract_path("list files in /workspace"),
            Some("/workspace".to_string())
        );
        assert_eq!(
            extract_path("delete /tmp/old.log."),
            Some("/tmp/old.log".to_string())
        );
    }

    #[test]
    fn test_division_is_not_a_path() {
        assert_eq!(extract_path("refactor: x = a/b"), None);
    }

    #[test]
    fn test_quoted_path() {
        assert_eq!(
            extract_path("refactor 'calc.py': def f(): pass"),
            Some("calc.py".to_string())
        );
        assert_eq!(extract_path("nothing here"), None);
    }

    #[test]
    fn test_relative_file_path() {
        assert_eq!(
            extract_file_path("delete notes.txt"),
            Some("notes.txt".to_string())
        );
        assert_eq!(
            extract_file_path("save file src/app.py"),
            Some("src/app.py".to_string())
        );
        assert_eq!(extract_file_path("delete the unused import"), None);
    }

    #[test]
    fn test_file_path_ignores_code_blocks() {
        let query = "write file out.py ```\nopen('/etc/passwd')\n```";
        assert_eq!(extract_file_path(query), Some("out.py".to_string()));
    }

    #[test]
    fn test_fenced_block() {
        let text = "save this:\n```python\nprint(1)\nprint(2)\n```\nthanks";
        assert_eq!(
            extract_fenced_block(text),
            Some("print(1)\nprint(2)".to_string())
        );
        assert_eq!(extract_fenced_block("no code"), None);
        assert_eq!(extract_fenced_block("```\n\n```"), None);
    }

    #[test]
    fn test_text_after_colon() {
        assert_eq!(text_after_colon("run: print('a:b')"), Some("print('a:b')"));
        assert_eq!(text_after_colon("run:   "), None);
        assert_eq!(text_after_colon("no colon"), None);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("/a/b/c.py"), "c.py");
        assert_eq!(display_name(r"C:\x\y.rs"), "y.rs");
        assert_eq!(display_name("plain.txt"), "plain.txt");
    }
}
