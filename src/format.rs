//! Markdown rendering of collected snippets

use chrono::NaiveDateTime;

use crate::model::Snippet;

pub const TITLE: &str = "# Code Snippets Collection";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render the full export document.
///
/// Pure function of the snippet list and the generation time.
pub fn document(snippets: &[Snippet], generated_at: NaiveDateTime) -> String {
    let mut md = String::new();
    md.push_str(TITLE);
    md.push_str("\n\n");
    md.push_str(&format!(
        "*Generated on {}*\n\n",
        generated_at.format(TIMESTAMP_FORMAT)
    ));
    md.push_str("---\n\n");
    md.push_str(&entries(snippets));
    finish(md)
}

/// Append new entries to an existing export document
pub fn appended(existing: &str, snippets: &[Snippet], appended_at: NaiveDateTime) -> String {
    let mut md = existing.trim_end().to_string();
    md.push_str(&format!(
        "\n\n*Appended on {}*\n\n---\n\n",
        appended_at.format(TIMESTAMP_FORMAT)
    ));
    md.push_str(&entries(snippets));
    finish(md)
}

pub fn entries(snippets: &[Snippet]) -> String {
    snippets.iter().map(entry).collect()
}

/// Format one snippet, terminated by a horizontal rule
pub fn entry(snippet: &Snippet) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {}\n\n", single_line(&snippet.description)));
    md.push_str(&format!("**File:** `{}`\n\n", snippet.document_key));

    if let Some(explanation) = snippet.explanation_text() {
        md.push_str("**Explanation:**\n\n");
        md.push_str(&block_quote(explanation));
        md.push_str("\n\n");
    }

    md.push_str("**Code:**\n\n");
    let fence = code_fence(&snippet.code);
    md.push_str(&format!("{fence}{}\n", snippet.language_tag));
    md.push_str(&snippet.code);
    if !snippet.code.ends_with('\n') {
        md.push('\n');
    }
    md.push_str(&fence);
    md.push_str("\n\n---\n\n");

    md
}

/// Prefix every line with `> `
pub fn block_quote(text: &str) -> String {
    text.trim_end_matches('\n')
        .split('\n')
        .map(|line| {
            let line = line.trim_end_matches('\r');
            format!("> {line}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Backtick fence long enough that `code` cannot close it
fn code_fence(code: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in code.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat(if longest >= 3 { longest + 1 } else { 3 })
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn finish(mut md: String) -> String {
    let trimmed = md.trim_end().len();
    md.truncate(trimmed);
    md.push('\n');
    md
}

/// One-line summary used by line-anchored displays
pub fn summary(count: usize) -> String {
    match count {
        0 => "No snippets collected".to_string(),
        1 => "1 snippet collected".to_string(),
        n => format!("{n} snippets collected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anchor, SnippetId};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 0)
            .unwrap()
    }

    fn make(id: u64, description: &str, explanation: Option<&str>) -> Snippet {
        Snippet {
            id: SnippetId(id),
            document_key: "utils.ts".to_string(),
            code: "const x = 1;".to_string(),
            language_tag: "typescript".to_string(),
            description: description.to_string(),
            explanation: explanation.map(|s| s.to_string()),
            anchor: Anchor::new(3, 0, 3, 12),
        }
    }

    #[test]
    fn full_document_layout() {
        let md = document(&[make(0, "Constant init", Some("Sets x.\nUsed later."))], at());
        let expected = "# Code Snippets Collection\n\
            \n\
            *Generated on 2024-03-09 14:05:00*\n\
            \n\
            ---\n\
            \n\
            ## Constant init\n\
            \n\
            **File:** `utils.ts`\n\
            \n\
            **Explanation:**\n\
            \n\
            > Sets x.\n\
            > Used later.\n\
            \n\
            **Code:**\n\
            \n\
            ```typescript\n\
            const x = 1;\n\
            ```\n\
            \n\
            ---\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn no_explanation_block_when_blank() {
        let md = document(&[make(0, "A", None), make(1, "B", Some("  "))], at());
        assert!(!md.contains("**Explanation:**"));
        assert_eq!(md.matches("**Code:**").count(), 2);
    }

    #[test]
    fn headings_follow_store_order_with_duplicates() {
        let snippets = vec![make(0, "Same", None), make(1, "Other", None), make(2, "Same", None)];
        let md = document(&snippets, at());
        let lines: Vec<&str> = md.lines().collect();
        let headings: Vec<(usize, &str)> = lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.starts_with("## "))
            .map(|(i, l)| (i, *l))
            .collect();
        assert_eq!(
            headings.iter().map(|(_, h)| *h).collect::<Vec<_>>(),
            vec!["## Same", "## Other", "## Same"]
        );
        for (i, _) in headings {
            assert_eq!(lines[i + 1], "");
            assert_eq!(lines[i + 2], "**File:** `utils.ts`");
        }
    }

    #[test]
    fn empty_document_has_header_only() {
        let md = document(&[], at());
        assert_eq!(
            md,
            "# Code Snippets Collection\n\n*Generated on 2024-03-09 14:05:00*\n\n---\n"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let snippets = vec![make(0, "A", Some("x")), make(1, "B", None)];
        assert_eq!(document(&snippets, at()), document(&snippets, at()));
    }

    #[test]
    fn block_quote_prefixes_every_line() {
        assert_eq!(block_quote("a\n\nb\n"), "> a\n> \n> b");
        assert_eq!(block_quote("a\r\nb"), "> a\n> b");
    }

    #[test]
    fn fence_grows_past_backticks_in_code() {
        let mut s = make(0, "Nested", None);
        s.language_tag = "markdown".to_string();
        s.code = "```rust\nfn a() {}\n```\n".to_string();
        let md = entry(&s);
        assert!(md.contains("````markdown\n```rust\nfn a() {}\n```\n````\n"));
    }

    #[test]
    fn multiline_description_stays_one_heading() {
        let md = entry(&make(0, "first\nsecond", None));
        assert!(md.starts_with("## first second\n"));
    }

    #[test]
    fn append_keeps_existing_content() {
        let existing = document(&[make(0, "Old", None)], at());
        let md = appended(&existing, &[make(1, "New", None)], at());
        assert!(md.starts_with(&existing.trim_end().to_string()));
        assert!(md.contains("*Appended on 2024-03-09 14:05:00*"));
        assert_eq!(md.matches("## ").count(), 2);
        assert!(md.find("## Old").unwrap() < md.find("## New").unwrap());
    }

    #[test]
    fn summary_pluralizes() {
        assert_eq!(summary(0), "No snippets collected");
        assert_eq!(summary(1), "1 snippet collected");
        assert_eq!(summary(4), "4 snippets collected");
    }
}
