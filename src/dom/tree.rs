use crate::dom::element::ElementNode;
use crate::dom::selector::SelectorList;
use crate::error::{ExportError, Result};
use headless_chrome::Tab;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// URL recorded for trees that were not captured from a live page
pub const UNKNOWN_URL: &str = "about:blank";

/// An owned snapshot of a page's DOM, rooted at `<body>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomTree {
    /// Address of the page the snapshot was taken from
    #[serde(default = "default_url")]
    pub url: String,

    /// Root element of the DOM tree
    pub root: ElementNode,
}

fn default_url() -> String {
    UNKNOWN_URL.to_string()
}

/// A borrowed element together with its ancestor path (root first)
#[derive(Debug, Clone)]
pub struct NodeRef<'a> {
    node: &'a ElementNode,
    ancestors: Vec<&'a ElementNode>,
}

impl DomTree {
    /// Create a tree with no known source URL
    pub fn new(root: ElementNode) -> Self {
        Self {
            url: default_url(),
            root,
        }
    }

    /// Builder method: set the source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Snapshot the DOM of a browser tab.
    ///
    /// `text_selector` picks the elements whose `innerText` is captured; the
    /// rest of the tree only carries tags and attributes.
    pub fn from_tab(tab: &Arc<Tab>, text_selector: &str) -> Result<Self> {
        let js_code = format!(
            "({})({})",
            include_str!("snapshot_dom.js"),
            serde_json::to_string(text_selector)?
        );

        let result = tab
            .evaluate(&js_code, false)
            .map_err(|e| ExportError::EvaluationFailed(format!("Failed to execute DOM snapshot script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| ExportError::DomParseFailed("No value returned from DOM snapshot".to_string()))?;

        // The script returns a JSON string rather than an object graph
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| ExportError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        let mut tree = Self::from_json(&json_str)?;
        tree.simplify();
        log::debug!("Captured {} elements from {}", tree.count_elements(), tree.url);

        Ok(tree)
    }

    /// Parse a snapshot previously produced by [`DomTree::to_json`] or the snapshot script
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ExportError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))
    }

    /// Convert the DOM tree to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e)))
    }

    /// Read a snapshot file
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Write a snapshot file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Drop script, style and noscript subtrees
    pub fn simplify(&mut self) {
        self.root.simplify();
    }

    /// Count total elements in the tree
    pub fn count_elements(&self) -> usize {
        self.root.count_elements()
    }

    /// First element in document order matching any selector of the list, root included
    pub fn query_selector(&self, selectors: &SelectorList) -> Option<NodeRef<'_>> {
        let mut out = Vec::new();
        collect_matches(&self.root, &mut Vec::new(), selectors, &mut out, true);
        out.pop()
    }

    /// All elements matching any selector of the list, in document order, root included
    pub fn query_selector_all(&self, selectors: &SelectorList) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        collect_matches(&self.root, &mut Vec::new(), selectors, &mut out, false);
        out
    }
}

impl<'a> NodeRef<'a> {
    pub fn tag_name(&self) -> &'a str {
        &self.node.tag_name
    }

    /// Attribute value by name
    pub fn attribute(&self, key: &str) -> Option<&'a str> {
        self.node.get_attribute(key).map(String::as_str)
    }

    pub fn rendered_text(&self) -> String {
        self.node.rendered_text()
    }

    /// Parent element, if this is not the root
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let (parent, rest) = self.ancestors.split_last()?;
        Some(NodeRef {
            node: *parent,
            ancestors: rest.to_vec(),
        })
    }

    /// First descendant matching the selector list
    pub fn query_selector(&self, selectors: &SelectorList) -> Option<NodeRef<'a>> {
        let mut out = Vec::new();
        self.collect_descendants(selectors, &mut out, true);
        out.pop()
    }

    /// All descendants matching the selector list, in document order
    pub fn query_selector_all(&self, selectors: &SelectorList) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        self.collect_descendants(selectors, &mut out, false);
        out
    }

    fn collect_descendants(&self, selectors: &SelectorList, out: &mut Vec<NodeRef<'a>>, first_only: bool) {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.node);

        for child in &self.node.children {
            if collect_matches(child, &mut ancestors, selectors, out, first_only) {
                return;
            }
        }
    }
}

/// Pre-order walk; returns true once the first match is found and `first_only` is set
fn collect_matches<'a>(
    node: &'a ElementNode,
    ancestors: &mut Vec<&'a ElementNode>,
    selectors: &SelectorList,
    out: &mut Vec<NodeRef<'a>>,
    first_only: bool,
) -> bool {
    if selectors.matches(node, ancestors) {
        out.push(NodeRef {
            node,
            ancestors: ancestors.clone(),
        });
        if first_only {
            return true;
        }
    }

    ancestors.push(node);
    for child in &node.children {
        if collect_matches(child, ancestors, selectors, out, first_only) {
            ancestors.pop();
            return true;
        }
    }
    ancestors.pop();

    false
}
