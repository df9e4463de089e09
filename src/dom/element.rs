use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents a DOM element node captured from a page snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// HTML tag name (e.g., "div", "pre", "code")
    pub tag_name: String,

    /// Element attributes (e.g., id, class, data-*)
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Rendered text of the element (the browser's `innerText`), when captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementNode>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: HashMap::new(),
            text_content: None,
            children: Vec::new(),
        }
    }

    /// Builder method: set attributes
    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder method: add a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: set rendered text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<ElementNode>) -> Self {
        self.children = children;
        self
    }

    /// Builder method: append a child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child);
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.attributes
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class_name))
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id")
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// Rendered text of this element.
    ///
    /// Uses the captured `innerText` when present; otherwise the children's
    /// rendered text is concatenated in document order.
    pub fn rendered_text(&self) -> String {
        match &self.text_content {
            Some(text) => text.clone(),
            None => self.children.iter().map(|c| c.rendered_text()).collect(),
        }
    }

    /// Remove script, style and noscript subtrees
    pub fn simplify(&mut self) {
        self.children.retain(|child| {
            !matches!(child.tag_name.to_ascii_lowercase().as_str(), "script" | "style" | "noscript")
        });

        for child in &mut self.children {
            child.simplify();
        }
    }

    /// Number of elements in this subtree, including this one
    pub fn count_elements(&self) -> usize {
        1 + self.children.iter().map(|c| c.count_elements()).sum::<usize>()
    }
}
