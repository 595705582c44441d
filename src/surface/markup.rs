//! Markup serialization for [`Document`].

use std::fmt::Write as _;

use super::document::{Content, Document};
use crate::types::Handle;

/// Escape `<`, `>`, `&`, `"` and `'`.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

impl Document {
    /// Serialize a subtree. Fragments contribute only their children;
    /// object properties and listeners are not part of markup.
    pub fn to_markup(&self, node: Handle) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    /// Serialize the children of `node`.
    pub fn inner_markup(&self, node: Handle) -> String {
        let mut out = String::new();
        if let Some(entry) = self.nodes.get(node.0 as usize) {
            for &child in &entry.children {
                self.write_markup(child, &mut out);
            }
        }
        out
    }

    fn write_markup(&self, node: Handle, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0 as usize) else {
            return;
        };
        match &entry.content {
            Content::Text(text) => out.push_str(&escape(text)),
            Content::Fragment => {
                for &child in &entry.children {
                    self.write_markup(child, out);
                }
            }
            Content::Element { tag, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, attribute) in &entry.attributes {
                    let _ = write!(out, " {}=\"{}\"", name, escape(&attribute.value));
                }
                out.push('>');
                for &child in &entry.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_to_markup() {
        let mut doc = Document::new();
        let div = doc.create_element("div", None);
        doc.set_attribute(div, "title", "a<b", None).unwrap();
        let text = doc.create_text("x & y");
        doc.append_child(div, text).unwrap();

        assert_eq!(doc.to_markup(div), r#"<div title="a&lt;b">x &amp; y</div>"#);
        assert_eq!(doc.inner_markup(div), "x &amp; y");
    }
}
