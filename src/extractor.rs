//! Reconstructs a [`Conversation`] from a chat page's DOM snapshot
//!
//! The host page's markup changes between releases, so every lookup goes
//! through a list of selector candidates, and every missing element has a
//! fallback value. Extraction never fails; an empty message list is for the
//! caller to judge.

use crate::conversation::{CodeBlock, Conversation, DEFAULT_LANGUAGE, Message, Role, UNTITLED, local_timestamp};
use crate::dom::{DomTree, NodeRef, SelectorList};
use std::sync::LazyLock;

/// Message containers; all candidates are visited together in document order
pub const MESSAGE_CONTAINER_SELECTORS: &[&str] = &[
    "[data-message-author-role]",
    "article[data-scroll-anchor]",
    "[data-testid^=\"conversation-turn\"]",
];

/// Title candidates, most specific first
pub const TITLE_SELECTORS: &[&str] = &["h1", "[data-testid=\"conversation-title\"]"];

pub const CONTENT_SELECTOR: &str = ".markdown";
pub const CODE_SELECTOR: &str = "pre code";

/// Language label, searched under the code element's parent
pub const LANGUAGE_LABEL_SELECTOR: &str = "div > span";

pub const ROLE_ATTRIBUTE: &str = "data-message-author-role";

struct Selectors {
    containers: SelectorList,
    titles: Vec<SelectorList>,
    content: SelectorList,
    code: SelectorList,
    language_label: SelectorList,
}

// Built from the constants above, which always parse
static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    containers: SelectorList::from_candidates(MESSAGE_CONTAINER_SELECTORS).expect("valid container selectors"),
    titles: TITLE_SELECTORS
        .iter()
        .map(|s| SelectorList::parse(s).expect("valid title selector"))
        .collect(),
    content: SelectorList::parse(CONTENT_SELECTOR).expect("valid content selector"),
    code: SelectorList::parse(CODE_SELECTOR).expect("valid code selector"),
    language_label: SelectorList::parse(LANGUAGE_LABEL_SELECTOR).expect("valid label selector"),
});

/// Selector list of every element whose rendered text the extractor reads.
///
/// Passed to the DOM snapshot so only these elements carry `innerText`.
pub fn text_bearing_selector() -> String {
    let mut parts: Vec<&str> = TITLE_SELECTORS.to_vec();
    parts.extend([CONTENT_SELECTOR, CODE_SELECTOR, LANGUAGE_LABEL_SELECTOR]);
    parts.join(", ")
}

/// Extract the conversation, stamping it with the current local time
pub fn extract_conversation(tree: &DomTree) -> Conversation {
    extract_conversation_at(tree, local_timestamp())
}

/// Extract the conversation with an explicit export timestamp
pub fn extract_conversation_at(tree: &DomTree, exported_at: impl Into<String>) -> Conversation {
    let title = extract_title(tree);

    let mut messages = Vec::new();
    for container in tree.query_selector_all(&SELECTORS.containers) {
        if let Some(message) = extract_message(&container) {
            messages.push(message);
        }
    }

    log::debug!("Extracted {} messages titled '{}'", messages.len(), title);

    Conversation {
        title,
        messages,
        exported_at: exported_at.into(),
        source_url: tree.url.clone(),
    }
}

/// First non-blank title, trying candidates in priority order
pub fn extract_title(tree: &DomTree) -> String {
    SELECTORS
        .titles
        .iter()
        .find_map(|selector| {
            tree.query_selector_all(selector)
                .iter()
                .map(|node| node.rendered_text().trim().to_string())
                .find(|text| !text.is_empty())
        })
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn extract_message(container: &NodeRef<'_>) -> Option<Message> {
    let role = match container.attribute(ROLE_ATTRIBUTE) {
        Some(value) => match Role::parse(value) {
            Some(role) => role,
            None => {
                log::debug!("Skipping <{}> with unrecognized role '{}'", container.tag_name(), value);
                return None;
            }
        },
        None => {
            log::debug!("Skipping <{}> without a role attribute", container.tag_name());
            return None;
        }
    };

    let mut content = container
        .query_selector(&SELECTORS.content)
        .map(|node| node.rendered_text())
        .unwrap_or_default();

    let code_blocks = extract_code_blocks(container);
    for block in &code_blocks {
        content = remove_first_occurrence(&content, &block.code);
    }

    Some(Message {
        role,
        content: content.trim().to_string(),
        code_blocks,
    })
}

/// Code blocks of a message container, in document order
pub fn extract_code_blocks(container: &NodeRef<'_>) -> Vec<CodeBlock> {
    container
        .query_selector_all(&SELECTORS.code)
        .iter()
        .filter_map(|code| {
            let parent = code.parent()?;
            let language = parent
                .query_selector(&SELECTORS.language_label)
                .map(|label| label.rendered_text().trim().to_string())
                .filter(|label| !label.is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

            Some(CodeBlock::new(language, code.rendered_text()))
        })
        .collect()
}

/// Literal removal of the first occurrence of `needle`; no-op when absent or empty
fn remove_first_occurrence(haystack: &str, needle: &str) -> String {
    if needle.is_empty() {
        return haystack.to_string();
    }
    haystack.replacen(needle, "", 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;

    fn message(role: &str, content: &str) -> ElementNode {
        ElementNode::new("div")
            .with_attribute(ROLE_ATTRIBUTE, role)
            .with_child(ElementNode::new("div").with_attribute("class", "markdown prose").with_text(content))
    }

    fn code_block(language: Option<&str>, code: &str) -> ElementNode {
        let mut pre = ElementNode::new("pre");
        if let Some(language) = language {
            pre.add_child(ElementNode::new("div").with_child(ElementNode::new("span").with_text(language)));
        }
        pre.with_child(ElementNode::new("code").with_text(code))
    }

    fn page(children: Vec<ElementNode>) -> DomTree {
        DomTree::new(ElementNode::new("body").with_children(children)).with_url("https://chat.example.com/c/42")
    }

    #[test]
    fn test_selector_constants_parse() {
        assert!(SelectorList::from_candidates(MESSAGE_CONTAINER_SELECTORS).is_ok());
        assert!(SelectorList::parse(&text_bearing_selector()).is_ok());
        assert!(!SELECTORS.titles.is_empty());
    }

    #[test]
    fn test_empty_page() {
        let tree = DomTree::new(ElementNode::new("body"));
        let conversation = extract_conversation(&tree);

        assert_eq!(conversation.title, "Untitled Conversation");
        assert!(conversation.messages.is_empty());
        assert!(!conversation.exported_at.is_empty());
        assert!(!conversation.source_url.is_empty());
    }

    #[test]
    fn test_unrelated_markup_yields_no_messages() {
        let tree = page(vec![
            ElementNode::new("nav").with_child(ElementNode::new("a").with_text("New chat")),
            ElementNode::new("div").with_attribute("class", "markdown").with_text("stray"),
        ]);

        let conversation = extract_conversation_at(&tree, "now");
        assert!(conversation.messages.is_empty());
        assert_eq!(conversation.title, UNTITLED);
    }

    #[test]
    fn test_round_trip_scenario() {
        let assistant = message("assistant", "Here: print(1) done").with_child(code_block(Some("python"), "print(1)"));
        let tree = page(vec![
            ElementNode::new("h1").with_text("  Test Chat \n"),
            message("user", "Hello"),
            assistant,
        ]);

        let conversation = extract_conversation_at(&tree, "10/16/2026, 3:04:05 PM");

        assert_eq!(conversation.title, "Test Chat");
        assert_eq!(conversation.source_url, "https://chat.example.com/c/42");
        assert_eq!(conversation.exported_at, "10/16/2026, 3:04:05 PM");
        assert_eq!(conversation.messages.len(), 2);

        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[0].content, "Hello");
        assert!(conversation.messages[0].code_blocks.is_empty());

        let reply = &conversation.messages[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Here:  done");
        assert_eq!(reply.code_blocks, vec![CodeBlock::new("python", "print(1)")]);
    }

    #[test]
    fn test_title_priority_and_blank_candidates() {
        let tree = page(vec![
            ElementNode::new("div")
                .with_attribute("data-testid", "conversation-title")
                .with_text("Sidebar title"),
            ElementNode::new("h1").with_text("   "),
            ElementNode::new("h1").with_text("Heading title"),
        ]);
        assert_eq!(extract_title(&tree), "Heading title");

        let fallback = page(vec![
            ElementNode::new("h1").with_text(""),
            ElementNode::new("div")
                .with_attribute("data-testid", "conversation-title")
                .with_text(" Sidebar title "),
        ]);
        assert_eq!(extract_title(&fallback), "Sidebar title");
    }

    #[test]
    fn test_unrecognized_roles_are_skipped() {
        let tree = page(vec![
            message("system", "hidden prompt"),
            message("user", "Question"),
            message("tool", "search results"),
            ElementNode::new("article").with_attribute("data-scroll-anchor", "true"),
            message("assistant", "Answer"),
        ]);

        let conversation = extract_conversation_at(&tree, "now");
        let roles: Vec<_> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn test_containers_are_visited_in_document_order() {
        // An article wrapper without a role must not hide the role-bearing element inside it
        let turn = ElementNode::new("article")
            .with_attribute("data-testid", "conversation-turn-2")
            .with_child(message("assistant", "second"));
        let tree = page(vec![message("user", "first"), turn, message("user", "third")]);

        let contents: Vec<_> = extract_conversation_at(&tree, "now")
            .messages
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_missing_content_element() {
        let tree = page(vec![ElementNode::new("div").with_attribute(ROLE_ATTRIBUTE, "user")]);
        let conversation = extract_conversation_at(&tree, "now");

        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].content, "");
    }

    #[test]
    fn test_language_fallback_and_order() {
        let assistant = message("assistant", "a\nfirst\nb\nsecond\nc")
            .with_child(code_block(None, "first"))
            .with_child(code_block(Some("  "), "second"))
            .with_child(code_block(Some("rust"), "third"));
        let tree = page(vec![assistant]);

        let reply = &extract_conversation_at(&tree, "now").messages[0];
        let languages: Vec<_> = reply.code_blocks.iter().map(|b| b.language.as_str()).collect();
        assert_eq!(languages, vec!["text", "text", "rust"]);
        assert_eq!(reply.content, "a\n\nb\n\nc");
    }

    #[test]
    fn test_dedup_removes_only_first_occurrence() {
        let assistant = message("assistant", "x = 1 then x = 1 again").with_child(code_block(Some("python"), "x = 1"));
        let tree = page(vec![assistant]);

        let reply = &extract_conversation_at(&tree, "now").messages[0];
        assert_eq!(reply.content, "then x = 1 again");
    }

    #[test]
    fn test_dedup_is_noop_when_text_differs() {
        let assistant = message("assistant", "Run print( 1 ) now").with_child(code_block(None, "print(1)"));
        let tree = page(vec![assistant]);

        let reply = &extract_conversation_at(&tree, "now").messages[0];
        assert_eq!(reply.content, "Run print( 1 ) now");
        assert_eq!(reply.code_blocks.len(), 1);
    }

    #[test]
    fn test_content_never_contains_found_code() {
        let code = "fn main() {\n    println!(\"hi\");\n}";
        let text = format!("Try this:\n{}\nThat's it.", code);
        let tree = page(vec![message("assistant", &text).with_child(code_block(Some("rust"), code))]);

        let reply = &extract_conversation_at(&tree, "now").messages[0];
        assert!(!reply.content.contains(code));
        assert_eq!(reply.content, "Try this:\n\nThat's it.");
    }

    #[test]
    fn test_empty_code_block_keeps_content() {
        let tree = page(vec![message("assistant", "Nothing to see").with_child(code_block(None, ""))]);

        let reply = &extract_conversation_at(&tree, "now").messages[0];
        assert_eq!(reply.content, "Nothing to see");
        assert_eq!(reply.code_blocks, vec![CodeBlock::new("text", "")]);
    }

    #[test]
    fn test_remove_first_occurrence() {
        assert_eq!(remove_first_occurrence("aXbXc", "X"), "abXc");
        assert_eq!(remove_first_occurrence("abc", "z"), "abc");
        assert_eq!(remove_first_occurrence("abc", ""), "abc");
    }
}
