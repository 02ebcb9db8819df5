//! Content region lookup for full FBref pages
//!
//! FBref renders the first table of a page directly but ships most of the
//! secondary tables inside HTML comments that its scripts unwrap later.
//! The lookup checks the live DOM first and the comments second.

use scraper::{Html, Node};

use crate::error::Result;

use super::selector;

/// Outer HTML of the element with the given id.
///
/// # Arguments
/// * `page` - Full page HTML
/// * `element_id` - Id of the element wrapping the table
///
/// # Returns
/// * `Ok(Some(markup))` with the element's outer HTML
/// * `Ok(None)` if neither the DOM nor any comment holds the element
///
/// # Examples
/// ```
/// use fbref_core::parser::extract_region;
///
/// let page = r#"<html><body><div id="div_squad_wages"><table></table></div></body></html>"#;
/// let region = extract_region(page, "div_squad_wages").unwrap().unwrap();
/// assert!(region.starts_with("<div id=\"div_squad_wages\">"));
/// ```
pub fn extract_region(page: &str, element_id: &str) -> Result<Option<String>> {
    let by_id = selector(&format!("[id=\"{element_id}\"]"))?;
    let document = Html::parse_document(page);

    if let Some(element) = document.select(&by_id).next() {
        return Ok(Some(element.html()));
    }

    for node in document.tree.nodes() {
        let Node::Comment(comment) = node.value() else {
            continue;
        };
        let text: &str = &comment.comment;
        if !text.contains(element_id) {
            continue;
        }

        let fragment = Html::parse_fragment(text);
        if let Some(element) = fragment.select(&by_id).next() {
            return Ok(Some(element.html()));
        }
    }

    Ok(None)
}
