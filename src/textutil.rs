// src/textutil.rs
// HTML fragment -> normalized plain text.
// Wiki pages are human-edited, so this degrades to whatever text it can
// pull out of malformed markup rather than failing.

use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeRef;
use scraper::{Html, Node};

static NEWLINE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Renders an HTML fragment as plain text: script/style dropped, line
/// breaks kept at paragraph/list boundaries, entities decoded, whitespace
/// collapsed. Idempotent on its own output.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    collect_text(fragment.tree.root(), &mut out);

    let text = NEWLINE_RUNS.replace_all(&out, "\n\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    text.trim().to_string()
}

/// Collapses all whitespace runs (newlines included) to single spaces.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(&text),
        Node::Element(el) => {
            let name = el.name();
            if name == "script" || name == "style" {
                return;
            }
            if matches!(name, "p" | "br" | "li") {
                out.push('\n');
            }
            for child in node.children() {
                collect_text(child, out);
            }
            if matches!(name, "p" | "ul" | "ol") {
                out.push('\n');
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_become_blank_lines() {
        assert_eq!(html_to_text("<p>a</p><p>b</p>"), "a\n\nb");
    }

    #[test]
    fn list_items_break_lines() {
        assert_eq!(
            html_to_text("<ul><li>Item A</li><li>Item B</li></ul>"),
            "Item A\nItem B"
        );
    }

    #[test]
    fn script_and_style_are_dropped() {
        let html = "before<script>var x = 1;</script><style>.a{}</style>after";
        assert_eq!(html_to_text(html), "beforeafter");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(html_to_text("Cox &amp; Co &ndash; est. 1887"), "Cox & Co \u{2013} est. 1887");
    }

    #[test]
    fn whitespace_runs_collapse() {
        assert_eq!(html_to_text("a   b\t\tc"), "a b c");
    }

    #[test]
    fn normalization_is_idempotent() {
        let messy = "<div><p>First   line</p><br><ul><li>one</li><li>two</li></ul>tail</div>";
        let once = html_to_text(messy);
        assert_eq!(html_to_text(&once), once);
    }

    #[test]
    fn malformed_markup_still_yields_text() {
        let broken = "<table><tr><td>cell text<p>unclosed";
        let text = html_to_text(broken);
        assert!(text.contains("cell text"));
        assert!(text.contains("unclosed"));
    }

    #[test]
    fn squash_flattens_newlines_and_tabs() {
        assert_eq!(squash_whitespace("  a\n b\t\nc  "), "a b c");
    }
}
