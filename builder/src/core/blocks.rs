//! Block parser for raw model replies.
//!
//! A reply is an ordered sequence of file blocks:
//!
//! ```text
//! --- file: <path> ---
//! <content lines...>
//! ```
//!
//! Delimiter matching is line-anchored and case-sensitive. A block ends at
//! the next delimiter line or end of input. There is no escaping mechanism
//! for a content line that itself looks like a delimiter; the first match is
//! authoritative and starts a new block.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::error::ParseMalformed;
use crate::core::types::FileBlock;

static DELIMITER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- file:\s*(?P<path>.*?)\s*---$").expect("delimiter regex"));

/// Strip trailing standalone `---` lines some models emit after the last
/// block.
pub fn clean_reply(raw: &str) -> String {
    let mut lines: Vec<&str> = raw.lines().collect();
    while lines.last().is_some_and(|line| line.trim() == "---") {
        lines.pop();
    }
    lines.join("\n")
}

/// Split a reply into its ordered sequence of file blocks.
///
/// A whitespace-only reply is structurally valid and yields an empty
/// sequence. A non-empty reply with zero delimiter lines fails with
/// [`ParseMalformed`]. A delimiter with a malformed path token (empty path,
/// traversal segment) still produces a block; the write authorizer resolves
/// it so the rejection carries a reason. Duplicate target paths are preserved
/// as separate entries in reply order.
pub fn parse_reply(reply: &str) -> Result<Vec<FileBlock>, ParseMalformed> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in reply.lines() {
        if let Some(caps) = DELIMITER_RE.captures(line) {
            if let Some((path, content)) = current.take() {
                blocks.push(finish_block(path, content));
            }
            current = Some((caps["path"].to_string(), Vec::new()));
            continue;
        }
        if let Some((_, content)) = current.as_mut() {
            content.push(line);
        }
    }
    if let Some((path, content)) = current.take() {
        blocks.push(finish_block(path, content));
    }

    if blocks.is_empty() && !reply.trim().is_empty() {
        return Err(ParseMalformed);
    }
    Ok(blocks)
}

/// Assemble a block, trimming a single leading and a single trailing blank
/// line from the content if present.
fn finish_block(path: String, mut content: Vec<&str>) -> FileBlock {
    if content.first().is_some_and(|line| line.trim().is_empty()) {
        content.remove(0);
    }
    if content.last().is_some_and(|line| line.trim().is_empty()) {
        content.pop();
    }
    FileBlock {
        target_path: path,
        content: content.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_block_to_end_of_input() {
        let reply = "--- file: output/index.html ---\n<html></html>";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].target_path, "output/index.html");
        assert_eq!(blocks[0].content, "<html></html>");
    }

    #[test]
    fn parses_multiple_blocks_in_reply_order() {
        let reply = "\
--- file: output/style.css ---
body { margin: 0; }
--- file: progress.json ---
{\"next\": \"style\"}";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].target_path, "output/style.css");
        assert_eq!(blocks[0].content, "body { margin: 0; }");
        assert_eq!(blocks[1].target_path, "progress.json");
        assert_eq!(blocks[1].content, "{\"next\": \"style\"}");
    }

    #[test]
    fn trims_single_leading_and_trailing_blank_line() {
        let reply = "--- file: output/a.txt ---\n\nhello\n\n--- file: output/b.txt ---\nworld";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks[0].content, "hello");
        assert_eq!(blocks[1].content, "world");
    }

    #[test]
    fn inner_blank_lines_are_preserved() {
        let reply = "--- file: output/a.txt ---\nfirst\n\nsecond";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks[0].content, "first\n\nsecond");
    }

    #[test]
    fn duplicate_paths_are_preserved_as_separate_entries() {
        let reply = "\
--- file: output/a.txt ---
one
--- file: output/a.txt ---
two";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "one");
        assert_eq!(blocks[1].content, "two");
    }

    #[test]
    fn whitespace_only_reply_yields_empty_sequence() {
        assert!(parse_reply("").expect("empty").is_empty());
        assert!(parse_reply("  \n\t\n").expect("blank").is_empty());
    }

    #[test]
    fn reply_without_any_delimiter_is_malformed() {
        let err = parse_reply("I could not produce any files today.");
        assert!(err.is_err());
    }

    #[test]
    fn empty_path_token_still_produces_a_block() {
        let reply = "--- file: ---\ncontent";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].target_path, "");
    }

    #[test]
    fn traversal_path_token_still_produces_a_block() {
        let reply = "--- file: output/../secret ---\ncontent";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks[0].target_path, "output/../secret");
    }

    #[test]
    fn delimiter_matching_is_line_anchored_and_case_sensitive() {
        // Indented and uppercase variants are content, not delimiters.
        let reply = "\
--- file: output/a.txt ---
  --- file: output/x.txt ---
--- FILE: output/y.txt ---";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].content.contains("output/x.txt"));
        assert!(blocks[0].content.contains("FILE"));
    }

    #[test]
    fn delimiter_looking_content_line_starts_a_new_block() {
        // Known grammar limitation: the first match is authoritative.
        let reply = "\
--- file: output/doc.md ---
example:
--- file: output/example.txt ---
payload";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "example:");
        assert_eq!(blocks[1].target_path, "output/example.txt");
    }

    #[test]
    fn clean_reply_strips_trailing_separator_lines() {
        let raw = "--- file: output/a.txt ---\nhello\n---\n---\n";
        let cleaned = clean_reply(raw);
        assert_eq!(cleaned, "--- file: output/a.txt ---\nhello");
        let blocks = parse_reply(&cleaned).expect("parse");
        assert_eq!(blocks[0].content, "hello");
    }

    #[test]
    fn block_with_no_content_lines_is_kept_with_empty_content() {
        let reply = "--- file: output/a.txt ---\n--- file: output/b.txt ---\nb";
        let blocks = parse_reply(reply).expect("parse");
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "");
    }
}
