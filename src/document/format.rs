//! Canonical re-indentation of a [`Document`].
//!
//! Whitespace-only character data around element content is rewritten so that
//! each nesting level sits two spaces deeper than its parent. Character data
//! holding anything other than whitespace is left untouched, which keeps
//! mixed content intact and makes the pass idempotent.

use super::{Document, NodeId};

const INDENT: &str = "  ";

pub fn indent(doc: &mut Document) {
    let root = doc.root();
    indent_node(doc, root, 0);
}

fn indent_node(doc: &mut Document, id: NodeId, depth: usize) {
    let children = doc.children(id).to_vec();
    if children.is_empty() {
        // A childless element collapses to `<Tag/>` unless it holds real text.
        let text = &mut doc.node_mut(id).text;
        if text.as_deref().is_some_and(|value| value.trim().is_empty()) {
            *text = None;
        }
        return;
    }

    let inner = line_break(depth + 1);
    replace_blank(&mut doc.node_mut(id).text, &inner);

    for &child in &children {
        replace_blank(&mut doc.node_mut(child).tail, &inner);
        indent_node(doc, child, depth + 1);
    }

    if let Some(&last) = children.last() {
        replace_blank(&mut doc.node_mut(last).tail, &line_break(depth));
    }
}

fn line_break(depth: usize) -> String {
    format!("\n{}", INDENT.repeat(depth))
}

fn replace_blank(slot: &mut Option<String>, replacement: &str) {
    if slot.as_deref().map_or(true, |value| value.trim().is_empty()) {
        *slot = Some(replacement.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Element;

    #[test]
    fn test_indent_nested_elements() {
        let mut doc = Document::parse(
            r#"<Schema name="Monza"><Cube name="A"><Table name="t"/><Dimension name="d"><Hierarchy hasAll="true"><Level name="l"/></Hierarchy></Dimension></Cube></Schema>"#,
        )
        .unwrap();
        indent(&mut doc);

        let expected = r#"<?xml version="1.0" encoding="utf-8"?>
<Schema name="Monza">
  <Cube name="A">
    <Table name="t"/>
    <Dimension name="d">
      <Hierarchy hasAll="true">
        <Level name="l"/>
      </Hierarchy>
    </Dimension>
  </Cube>
</Schema>
"#;
        assert_eq!(doc.to_xml_string().unwrap(), expected);
    }

    #[test]
    fn test_indent_is_idempotent() {
        let mut doc = Document::parse(
            "<Schema>\n\t<Cube name=\"A\">   <Table name=\"t\"/></Cube><!-- c -->\n\n</Schema>",
        )
        .unwrap();
        indent(&mut doc);
        let first = doc.to_xml_string().unwrap();

        let mut reloaded = Document::parse(&first).unwrap();
        indent(&mut reloaded);
        assert_eq!(reloaded.to_xml_string().unwrap(), first);
    }

    #[test]
    fn test_indent_leaves_meaningful_text_alone() {
        let mut doc = Document::parse("<Schema><SQL>select 1</SQL>trailing</Schema>").unwrap();
        indent(&mut doc);
        let sql = doc.children(doc.root())[0];
        assert_eq!(doc.node(sql).text.as_deref(), Some("select 1"));
        assert_eq!(doc.node(sql).tail.as_deref(), Some("trailing"));
    }

    #[test]
    fn test_indent_collapses_emptied_elements() {
        let mut doc = Document::parse("<Schema name=\"M\">\n  <Cube name=\"B\">\n    </Cube>\n</Schema>").unwrap();
        let cube = doc.children(doc.root())[0];
        doc.detach(cube);
        indent(&mut doc);

        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Schema name=\"M\"/>\n"
        );
    }

    #[test]
    fn test_indent_positions_appended_nodes() {
        let mut doc = Document::parse("<Schema>\n  <Cube name=\"A\"/>\n</Schema>").unwrap();
        let id = doc.allocate(&Element::new("Cube").with_attribute("name", "B"));
        doc.append_child(doc.root(), id);
        indent(&mut doc);

        assert_eq!(
            doc.to_xml_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<Schema>\n  <Cube name=\"A\"/>\n  <Cube name=\"B\"/>\n</Schema>\n"
        );
    }
}
