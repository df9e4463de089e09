//! A small CSS selector engine over [`ElementNode`] snapshots
//!
//! Supports the subset needed to read chat pages: type selectors, `*`, `#id`,
//! `.class`, attribute selectors (`[a]`, `[a=v]`, `[a^=v]`, `[a$=v]`, `[a*=v]`),
//! descendant and child combinators, and comma-separated selector lists.
//!
//! Matching runs right-to-left against the element's full ancestor chain, so a
//! query scoped to a subtree still sees ancestors outside that subtree, the same
//! way `Element.querySelector` behaves in a browser.

use crate::dom::element::ElementNode;
use crate::error::{ExportError, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed, comma-separated list of selectors
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorList {
    source: String,
    selectors: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    /// Compounds from leftmost to rightmost; `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attributes: Vec<AttributeSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct AttributeSelector {
    name: String,
    condition: Option<(AttributeOp, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum AttributeOp {
    Equals,
    Prefix,
    Suffix,
    Contains,
}

impl SelectorList {
    /// Parse a selector list such as `pre code, [data-testid^="turn"]`
    pub fn parse(source: &str) -> Result<Self> {
        let selectors = Parser::new(source).parse_list()?;
        Ok(Self {
            source: source.trim().to_string(),
            selectors,
        })
    }

    /// Join several selector strings into one list, preserving their order
    pub fn from_candidates(candidates: &[&str]) -> Result<Self> {
        Self::parse(&candidates.join(", "))
    }

    /// The selector text this list was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Check whether `node`, located under `ancestors` (root first), matches any selector
    pub fn matches(&self, node: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        self.selectors.iter().any(|s| s.matches(node, ancestors))
    }
}

impl FromStr for SelectorList {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches(&self, node: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        let last = self.compounds.len() - 1;
        self.compounds[last].matches(node) && self.matches_ancestors(last, ancestors)
    }

    /// `compounds[index]` already matched an element whose ancestors are `ancestors`
    fn matches_ancestors(&self, index: usize, ancestors: &[&ElementNode]) -> bool {
        if index == 0 {
            return true;
        }

        let target = &self.compounds[index - 1];
        match self.combinators[index - 1] {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => target.matches(parent) && self.matches_ancestors(index - 1, rest),
                None => false,
            },
            Combinator::Descendant => (0..ancestors.len())
                .rev()
                .any(|i| target.matches(ancestors[i]) && self.matches_ancestors(index - 1, &ancestors[..i])),
        }
    }
}

impl Compound {
    fn matches(&self, node: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if !node.is_tag(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if node.id() != Some(id) {
                return false;
            }
        }

        self.classes.iter().all(|c| node.has_class(c)) && self.attributes.iter().all(|a| a.matches(node))
    }
}

impl AttributeSelector {
    fn matches(&self, node: &ElementNode) -> bool {
        let Some(value) = node.get_attribute(&self.name) else {
            return false;
        };

        match &self.condition {
            None => true,
            Some((AttributeOp::Equals, expected)) => value == expected,
            // Empty operands never match for the substring operators
            Some((AttributeOp::Prefix, expected)) => !expected.is_empty() && value.starts_with(expected.as_str()),
            Some((AttributeOp::Suffix, expected)) => !expected.is_empty() && value.ends_with(expected.as_str()),
            Some((AttributeOp::Contains, expected)) => !expected.is_empty() && value.contains(expected.as_str()),
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> ExportError {
        ExportError::InvalidSelector {
            selector: self.source.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace, returning whether any was skipped
    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>> {
        let mut list = vec![self.parse_complex()?];
        while self.eat(',') {
            list.push(self.parse_complex()?);
        }

        match self.peek() {
            None => Ok(list),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_whitespace = self.skip_whitespace();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    combinators.push(Combinator::Child);
                }
                Some(_) if had_whitespace => combinators.push(Combinator::Descendant),
                Some(c) => return Err(self.error(format!("unexpected character '{}'", c))),
            }
            compounds.push(self.parse_compound()?);
        }

        Ok(ComplexSelector { compounds, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut matched_any = false;

        if self.eat('*') {
            matched_any = true;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            matched_any = true;
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attributes.push(self.parse_attribute()?);
                }
                _ => break,
            }
            matched_any = true;
        }

        if matched_any {
            Ok(compound)
        } else {
            match self.peek() {
                Some(c) => Err(self.error(format!("expected a selector, found '{}'", c))),
                None => Err(self.error("expected a selector, found end of input")),
            }
        }
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }

        if self.pos == start {
            return Err(self.error("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        if self.eat(']') {
            return Ok(AttributeSelector { name, condition: None });
        }

        let op = match self.peek() {
            Some('=') => AttributeOp::Equals,
            Some('^') => AttributeOp::Prefix,
            Some('$') => AttributeOp::Suffix,
            Some('*') => AttributeOp::Contains,
            Some(c) => return Err(self.error(format!("unsupported attribute operator '{}'", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };
        self.pos += 1;
        if op != AttributeOp::Equals && !self.eat('=') {
            return Err(self.error("expected '=' in attribute selector"));
        }

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                if !self.eat(quote) {
                    return Err(self.error("unterminated quoted value"));
                }
                self.chars[start..self.pos - 1].iter().collect()
            }
            _ => self.parse_ident()?,
        };

        self.skip_whitespace();
        if !self.eat(']') {
            return Err(self.error("expected ']' to close attribute selector"));
        }

        Ok(AttributeSelector {
            name,
            condition: Some((op, value)),
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(selector: &str, node: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        SelectorList::parse(selector).unwrap().matches(node, ancestors)
    }

    #[test]
    fn test_type_class_and_id() {
        let node = ElementNode::new("DIV")
            .with_attribute("class", "markdown prose")
            .with_attribute("id", "answer");

        assert!(matches("div", &node, &[]));
        assert!(matches("*", &node, &[]));
        assert!(matches(".markdown", &node, &[]));
        assert!(matches("div.markdown.prose#answer", &node, &[]));
        assert!(!matches("span", &node, &[]));
        assert!(!matches(".markdown.hidden", &node, &[]));
        assert!(!matches("#question", &node, &[]));
    }

    #[test]
    fn test_attribute_operators() {
        let node = ElementNode::new("div")
            .with_attribute("data-testid", "conversation-turn-3")
            .with_attribute("data-message-author-role", "assistant");

        assert!(matches("[data-message-author-role]", &node, &[]));
        assert!(matches("[data-message-author-role=assistant]", &node, &[]));
        assert!(matches("[data-testid^=\"conversation-turn\"]", &node, &[]));
        assert!(matches("[data-testid$='-3']", &node, &[]));
        assert!(matches("[data-testid*=turn]", &node, &[]));
        assert!(!matches("[data-testid=\"conversation-turn\"]", &node, &[]));
        assert!(!matches("[data-scroll-anchor]", &node, &[]));
        assert!(!matches("[data-testid^=\"\"]", &node, &[]));
    }

    #[test]
    fn test_descendant_combinator() {
        let pre = ElementNode::new("pre");
        let div = ElementNode::new("div");
        let code = ElementNode::new("code");

        assert!(matches("pre code", &code, &[&pre]));
        assert!(matches("pre code", &code, &[&pre, &div]));
        assert!(!matches("pre code", &code, &[&div]));
        assert!(!matches("pre code", &code, &[]));
    }

    #[test]
    fn test_child_combinator() {
        let div = ElementNode::new("div");
        let pre = ElementNode::new("pre");
        let span = ElementNode::new("span");

        assert!(matches("div > span", &span, &[&pre, &div]));
        assert!(!matches("div > span", &span, &[&div, &pre]));
        assert!(matches("div>span", &span, &[&div]));
    }

    #[test]
    fn test_mixed_combinators_backtrack() {
        // article > div ... code: the first div found walking up is not the article's child
        let article = ElementNode::new("article");
        let outer = ElementNode::new("div");
        let inner = ElementNode::new("div").with_attribute("class", "inner");
        let code = ElementNode::new("code");

        assert!(matches("article > div code", &code, &[&article, &outer, &inner]));
        assert!(!matches("article > .inner code", &code, &[&article, &outer, &inner]));
    }

    #[test]
    fn test_selector_list() {
        let list = SelectorList::from_candidates(&["h1", "[data-testid=\"conversation-title\"]"]).unwrap();
        let h1 = ElementNode::new("h1");
        let titled = ElementNode::new("div").with_attribute("data-testid", "conversation-title");

        assert!(list.matches(&h1, &[]));
        assert!(list.matches(&titled, &[]));
        assert!(!list.matches(&ElementNode::new("h2"), &[]));
        assert_eq!(list.source(), "h1, [data-testid=\"conversation-title\"]");
    }

    #[test]
    fn test_comma_inside_quotes() {
        let node = ElementNode::new("div").with_attribute("title", "a,b");
        assert!(matches("[title=\"a,b\"]", &node, &[]));
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "div >", "> div", "[data-x", "[data-x~=y]", "div,", "a..b", "[x=\"open]"] {
            let result = SelectorList::parse(bad);
            assert!(
                matches!(result, Err(ExportError::InvalidSelector { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_from_str() {
        let list: SelectorList = "pre code".parse().unwrap();
        assert_eq!(list.to_string(), "pre code");
    }
}
