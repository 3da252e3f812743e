//! HTML fragment parsing
//!
//! Uses the html5ever tokenizer and builds the tree with a small stack
//! machine. Only the recovery rules the editor actually meets are handled:
//! void elements, implicit paragraph and list-item closing, stray end tags.
//! Comments and doctypes are dropped.

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};

use super::{is_void, Dom, NodeId};

/// Block-level tags that implicitly close an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre",
    "section", "table", "ul",
];

#[derive(Debug)]
enum ParsedToken {
    Start {
        tag: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End(String),
    Text(String),
}

/// Token sink collecting a flat token list.
#[derive(Default)]
struct HtmlSink {
    tokens: RefCell<Vec<ParsedToken>>,
}

impl TokenSink for HtmlSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string().to_ascii_lowercase();
                match tag.kind {
                    TagKind::StartTag => {
                        let raw = raw_kind(&name);
                        self.tokens.borrow_mut().push(ParsedToken::Start {
                            tag: name,
                            attrs: tag
                                .attrs
                                .iter()
                                .map(|a| (a.name.local.to_string(), a.value.to_string()))
                                .collect(),
                            self_closing: tag.self_closing,
                        });
                        if let Some(kind) = raw {
                            return TokenSinkResult::RawData(kind);
                        }
                    }
                    TagKind::EndTag => {
                        self.tokens.borrow_mut().push(ParsedToken::End(name));
                    }
                }
            }
            Token::CharacterTokens(text) => {
                let mut tokens = self.tokens.borrow_mut();
                // The tokenizer may hand text over in several chunks
                if let Some(ParsedToken::Text(prev)) = tokens.last_mut() {
                    prev.push_str(&text);
                } else {
                    tokens.push(ParsedToken::Text(text.to_string()));
                }
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// Elements whose content is not markup.
fn raw_kind(tag: &str) -> Option<RawKind> {
    match tag {
        "script" => Some(RawKind::ScriptData),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" => Some(RawKind::Rawtext),
        "textarea" | "title" => Some(RawKind::Rcdata),
        _ => None,
    }
}

fn tokenize(html: &str) -> Vec<ParsedToken> {
    let tokenizer = Tokenizer::new(HtmlSink::default(), TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from(html));
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();
    tokenizer.sink.tokens.into_inner()
}

/// Parse `html` and append the resulting nodes to `parent`.
pub(super) fn parse_into(dom: &mut Dom, parent: NodeId, html: &str) {
    if html.is_empty() {
        return;
    }

    let mut stack: Vec<NodeId> = vec![parent];

    for token in tokenize(html) {
        let current = *stack.last().unwrap_or(&parent);
        match token {
            ParsedToken::Text(text) => {
                let node = dom.create_text(&text);
                dom.append_child(current, node);
            }
            ParsedToken::Start {
                tag,
                attrs,
                self_closing,
            } => {
                close_implied(dom, &mut stack, &tag);
                let current = *stack.last().unwrap_or(&parent);
                let node = dom.create_element(&tag);
                for (key, value) in attrs {
                    dom.set_attr(node, &key, &value);
                }
                dom.append_child(current, node);
                if !is_void(&tag) && !self_closing {
                    stack.push(node);
                }
            }
            ParsedToken::End(tag) => {
                // Pop to the matching open element; ignore stray end tags
                if let Some(pos) = stack
                    .iter()
                    .skip(1)
                    .rposition(|&node| dom.tag(node) == Some(tag.as_str()))
                {
                    stack.truncate(pos + 1);
                } else if tag == "br" {
                    // `</br>` is treated as `<br>` by browsers
                    let node = dom.create_element("br");
                    dom.append_child(current, node);
                }
            }
        }
    }
}

/// Apply the implicit end-tag rules for a new start tag.
fn close_implied(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    let top_is = |stack: &Vec<NodeId>, tags: &[&str]| {
        stack.len() > 1 && stack.last().is_some_and(|&node| dom.has_tag(node, tags))
    };

    if CLOSES_PARAGRAPH.contains(&tag) && top_is(stack, &["p"]) {
        stack.pop();
    }

    let siblings: &[&str] = match tag {
        "li" => &["li"],
        "dt" | "dd" => &["dt", "dd"],
        "tr" => &["tr", "td", "th"],
        "td" | "th" => &["td", "th"],
        "option" => &["option"],
        _ => return,
    };
    let scope: &[&str] = match tag {
        "li" => &["ul", "ol"],
        "dt" | "dd" => &["dl"],
        "tr" => &["table", "thead", "tbody", "tfoot"],
        "td" | "th" => &["tr", "table"],
        _ => &["select"],
    };

    // Close the nearest open sibling, but never past the enclosing container
    let found = stack.iter().skip(1).rposition(|&node| {
        dom.has_tag(node, siblings) || dom.has_tag(node, scope)
    });
    if let Some(pos) = found {
        let node = stack[pos + 1];
        if dom.has_tag(node, siblings) {
            stack.truncate(pos + 1);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        Dom::parse(html).html()
    }

    #[test]
    fn test_attributes_are_kept() {
        assert_eq!(
            roundtrip(r#"<a href="http://x.com" title="T">x</a>"#),
            r#"<a href="http://x.com" title="T">x</a>"#
        );
    }

    #[test]
    fn test_tags_are_lowercased() {
        assert_eq!(roundtrip("<P>Hi <STRONG>there</STRONG></P>"), "<p>Hi <strong>there</strong></p>");
    }

    #[test]
    fn test_unclosed_paragraphs() {
        assert_eq!(roundtrip("<p>one<p>two"), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_unclosed_list_items() {
        assert_eq!(
            roundtrip("<ul><li>a<li>b</ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_nested_list_items_are_not_closed() {
        assert_eq!(
            roundtrip("<ul><li>a<ul><li>b</li></ul></li></ul>"),
            "<ul><li>a<ul><li>b</li></ul></li></ul>"
        );
    }

    #[test]
    fn test_stray_end_tag_is_ignored() {
        assert_eq!(roundtrip("<p>a</em>b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_script_content_is_raw_text() {
        let dom = Dom::parse("<script>if (a<b) { x() }</script><p>after</p>");
        let root = dom.root();
        assert_eq!(dom.children(root).len(), 2);
        let script = dom.children(root)[0];
        assert_eq!(dom.text_content(script), "if (a<b) { x() }");
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(roundtrip("<p>a<!-- note -->b</p>"), "<p>ab</p>");
    }

    #[test]
    fn test_malformed_input_degrades_to_text() {
        let dom = Dom::parse("<<p>>broken");
        assert!(dom.text_content(dom.root()).contains("broken"));
    }
}
