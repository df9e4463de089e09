//! DOM snapshot and query module
//!
//! This module provides an owned, queryable copy of a web page's DOM. It includes:
//! - ElementNode: Representation of DOM elements with their rendered text
//! - SelectorList: CSS selector subset used to locate chat markup
//! - DomTree: Snapshot root plus document-order queries

pub mod element;
pub mod selector;
pub mod tree;

pub use element::ElementNode;
pub use selector::SelectorList;
pub use tree::{DomTree, NodeRef, UNKNOWN_URL};

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Snapshot the DOM of a browser tab, capturing rendered text for `text_selector` matches
pub fn snapshot_dom(tab: &Arc<Tab>, text_selector: &str) -> Result<DomTree> {
    DomTree::from_tab(tab, text_selector)
}
