//! Traceback rendering
//!
//! Leading frames recorded by the engine itself or by the assertion helpers
//! are dropped; everything from the first frame in test code onwards is
//! kept, including later internal frames.

use std::fs;
use std::path::PathBuf;

use crate::assertions;
use crate::executor::ENGINE_SOURCES;
use crate::models::{FailureInfo, Frame};

const RULE_WIDTH: usize = 66;

/// Whether a frame was recorded by the engine or the assertion helpers
pub fn is_internal(frame: &Frame) -> bool {
    frame.file == assertions::SOURCE_FILE || ENGINE_SOURCES.contains(&frame.file.as_str())
}

/// Frames worth showing: everything after the leading internal ones
pub fn valid_frames(info: &FailureInfo) -> impl Iterator<Item = &Frame> {
    info.traceback
        .frames()
        .iter()
        .skip_while(|frame| is_internal(frame))
}

/// Absolute path of a recorded file, or the path as recorded
pub fn absolute_path(file: &str) -> PathBuf {
    fs::canonicalize(file).unwrap_or_else(|_| PathBuf::from(file))
}

/// Source text of one line, when the file is readable
pub fn source_line(file: &str, line: u32) -> Option<String> {
    source_lines(file, line, 0).map(|mut lines| lines.remove(0).1)
}

/// Lines `line - context ..= line + context` with their numbers
pub fn source_lines(file: &str, line: u32, context: u32) -> Option<Vec<(u32, String)>> {
    if line == 0 {
        return None;
    }
    let content = fs::read_to_string(file).ok()?;
    let first = line.saturating_sub(context).max(1);
    let last = line + context;
    let lines: Vec<(u32, String)> = content
        .lines()
        .enumerate()
        .map(|(i, text)| (i as u32 + 1, text.to_string()))
        .filter(|(n, _)| *n >= first && *n <= last)
        .collect();

    if lines.iter().any(|(n, _)| *n == line) {
        Some(lines)
    } else {
        None
    }
}

fn center(title: &str, width: usize, fill: char) -> String {
    let len = title.chars().count();
    if len >= width {
        return title.to_string();
    }
    let pad = width - len;
    let left = pad / 2;
    let right = pad - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        title,
        fill.to_string().repeat(right)
    )
}

/// Render a failure the way it is shown in the error list
///
/// With `verbose` set, each frame is followed by its local variable dump.
pub fn render(info: &FailureInfo, verbose: bool) -> String {
    let mut output = vec!["Traceback (most recent call last)".to_string()];

    for frame in valid_frames(info) {
        let source = source_line(&frame.file, frame.line)
            .unwrap_or_else(|| "<no source available>".to_string());
        output.push(format!(
            "  File \"{}\", line {}, in {}",
            absolute_path(&frame.file).display(),
            frame.line,
            frame.function
        ));
        output.push(format!("    {}", source.trim()));

        if verbose {
            output.push(String::new());
            output.push(format!("    {}", center(" local variables ", RULE_WIDTH, '-')));
            let mut locals = frame.locals.clone();
            locals.sort();
            for (name, value) in locals {
                output.push(format!("    {name}: {value}"));
            }
            output.push(format!("    {}", "-".repeat(RULE_WIDTH)));
            output.push(String::new());
        }
    }

    output.push(info.summary_line());
    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ENGINE_SOURCES;

    fn engine_frame() -> Frame {
        Frame::new(ENGINE_SOURCES[0], 10, "run_body")
    }

    #[test]
    fn test_leading_internal_frames_dropped() {
        let info = FailureInfo::new("AssertionError", "1 != 2")
            .with_frame(engine_frame())
            .with_frame(Frame::new(assertions::SOURCE_FILE, 5, "ensure_eq"))
            .with_frame(Frame::new("tests/user.rs", 3, "test_math"))
            .with_frame(Frame::new(assertions::SOURCE_FILE, 7, "ensure_eq"));

        let kept: Vec<&str> = valid_frames(&info).map(|f| f.function.as_str()).collect();
        assert_eq!(kept, vec!["test_math", "ensure_eq"]);
    }

    #[test]
    fn test_render_without_source() {
        let info = FailureInfo::new("AssertionError", "1 != 2")
            .with_frame(engine_frame())
            .with_frame(Frame::new("does/not/exist.rs", 3, "test_math"));

        let text = render(&info, false);
        assert!(text.starts_with("Traceback (most recent call last)"));
        assert!(text.contains("File \"does/not/exist.rs\", line 3, in test_math"));
        assert!(text.contains("<no source available>"));
        assert!(!text.contains("run_body"));
        assert!(text.ends_with("AssertionError: 1 != 2"));
    }

    #[test]
    fn test_render_reads_source_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("case.rs");
        fs::write(&path, "fn a() {}\n    check(x == 2);\n").unwrap();
        let file = path.to_string_lossy().to_string();

        let info = FailureInfo::new("AssertionError", "").with_frame(Frame::new(&file, 2, "a"));
        let text = render(&info, false);
        assert!(text.contains("\n    check(x == 2);\n"));
        assert!(text.ends_with("AssertionError"));
    }

    #[test]
    fn test_render_verbose_locals() {
        let info = FailureInfo::new("AssertionError", "mismatch")
            .with_frame(Frame::new("x.rs", 1, "f"))
            .with_local("right", &2)
            .with_local("left", &1);

        let text = render(&info, true);
        let left = text.find("    left: 1").unwrap();
        let right = text.find("    right: 2").unwrap();
        assert!(left < right);
        assert!(text.contains(" local variables "));
        assert!(!render(&info, false).contains("local variables"));
    }

    #[test]
    fn test_source_lines_context() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("f.rs");
        fs::write(&path, "1\n2\n3\n4\n5\n").unwrap();
        let file = path.to_string_lossy().to_string();

        let lines = source_lines(&file, 1, 1).unwrap();
        assert_eq!(lines, vec![(1, "1".to_string()), (2, "2".to_string())]);
        assert!(source_lines(&file, 9, 1).is_none());
        assert!(source_lines(&file, 0, 1).is_none());
    }

    #[test]
    fn test_center() {
        assert_eq!(center("ab", 6, '-'), "--ab--");
        assert_eq!(center("abc", 6, '-'), "-abc--");
    }
}
