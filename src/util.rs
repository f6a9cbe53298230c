use std::path::Path;

pub fn display_path(path: &Path, base: Option<&Path>) -> String {
    if let Some(base) = base {
        if let Ok(relative) = path.strip_prefix(base) {
            return relative.display().to_string();
        }
    }
    path.display().to_string()
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Keep at most `max_lines` lines and `max_bytes` bytes of `lines`, marking truncation.
pub fn bounded_snippet(lines: &[String], max_lines: usize, max_bytes: usize) -> String {
    let marker = "\n[... output truncated ...]";
    if max_lines == 0 || max_bytes == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut truncated = lines.len() > max_lines;

    for (idx, line) in lines.iter().take(max_lines).enumerate() {
        let sep = if idx == 0 { "" } else { "\n" };
        if out.len() + sep.len() + line.len() > max_bytes {
            let remaining = max_bytes.saturating_sub(out.len() + sep.len());
            out.push_str(sep);
            out.push_str(truncate_utf8(line, remaining));
            truncated = true;
            break;
        }
        out.push_str(sep);
        out.push_str(line);
    }

    if truncated {
        out.push_str(marker);
    }
    out
}

fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn snippet_keeps_short_output_untouched() {
        let snippet = bounded_snippet(&lines(&["a", "b"]), 10, 100);
        assert_eq!(snippet, "a\nb");
    }

    #[test]
    fn snippet_marks_line_truncation() {
        let snippet = bounded_snippet(&lines(&["a", "b", "c"]), 2, 100);
        assert!(snippet.starts_with("a\nb"));
        assert!(snippet.ends_with("[... output truncated ...]"));
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let snippet = bounded_snippet(&lines(&["ééé"]), 5, 3);
        assert!(snippet.starts_with('é'));
        assert!(!snippet.starts_with("éé"));
    }

    #[test]
    fn display_path_strips_base() {
        let shown = display_path(Path::new("/a/b/c.txt"), Some(Path::new("/a")));
        assert_eq!(shown, "b/c.txt");
        let untouched = display_path(Path::new("/x/c.txt"), Some(Path::new("/a")));
        assert_eq!(untouched, "/x/c.txt");
    }
}
