use super::{Document, DocumentError, Node, NodeId, NodeKind};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Accumulates reader events into an arena.
#[derive(Default)]
struct TreeBuilder {
    nodes: Vec<Node>,
    stack: Vec<NodeId>,
    root: Option<NodeId>,
    prolog: Vec<String>,
    epilog: Vec<String>,
}

impl TreeBuilder {
    fn open(&mut self, kind: NodeKind, position: usize) -> Result<NodeId, DocumentError> {
        let id = NodeId(self.nodes.len());
        let mut node = Node::new(kind);
        match self.stack.last() {
            Some(&parent) => {
                node.parent = Some(parent);
                self.nodes[parent.0].children.push(id);
            }
            None if self.root.is_some() => {
                return Err(parse_error("multiple root elements", position));
            }
            None => self.root = Some(id),
        }
        self.nodes.push(node);
        Ok(id)
    }

    fn comment(&mut self, content: String) {
        match self.stack.last() {
            Some(&parent) => {
                let id = NodeId(self.nodes.len());
                let mut node = Node::new(NodeKind::Comment(content));
                node.parent = Some(parent);
                self.nodes.push(node);
                self.nodes[parent.0].children.push(id);
            }
            None if self.root.is_none() => self.prolog.push(content),
            None => self.epilog.push(content),
        }
    }

    fn text(&mut self, content: &str, position: usize) -> Result<(), DocumentError> {
        let Some(&current) = self.stack.last() else {
            if content.trim().is_empty() {
                return Ok(());
            }
            return Err(parse_error("text outside of the root element", position));
        };
        let last_child = self.nodes[current.0].children.last().copied();
        let slot = match last_child {
            Some(last) => &mut self.nodes[last.0].tail,
            None => &mut self.nodes[current.0].text,
        };
        slot.get_or_insert_with(String::new).push_str(content);
        Ok(())
    }

    fn finish(self, position: usize) -> Result<Document, DocumentError> {
        if let Some(&open) = self.stack.last() {
            let name = match &self.nodes[open.0].kind {
                NodeKind::Element { name, .. } => name.clone(),
                NodeKind::Comment(_) => String::new(),
            };
            return Err(parse_error(
                &format!("unclosed element <{}>", name),
                position,
            ));
        }
        let root = self
            .root
            .ok_or_else(|| parse_error("no root element", position))?;
        Ok(Document {
            nodes: self.nodes,
            root,
            prolog: self.prolog,
            epilog: self.epilog,
        })
    }
}

pub(super) fn parse(input: &str) -> Result<Document, DocumentError> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(false);
    reader.check_end_names(true);

    let mut builder = TreeBuilder::default();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| parse_error(&e.to_string(), reader.buffer_position()))?;
        match event {
            Event::Start(ref e) => {
                let id = builder.open(element_kind(e, position)?, position)?;
                builder.stack.push(id);
            }
            Event::Empty(ref e) => {
                builder.open(element_kind(e, position)?, position)?;
            }
            Event::End(_) => {
                builder
                    .stack
                    .pop()
                    .ok_or_else(|| parse_error("unexpected closing tag", position))?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|e| parse_error(&e.to_string(), position))?;
                builder.text(&text, position)?;
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                let text = std::str::from_utf8(&raw)
                    .map_err(|e| parse_error(&e.to_string(), position))?;
                builder.text(text, position)?;
            }
            Event::Comment(e) => {
                let raw = e.into_inner();
                let content = String::from_utf8(raw.into_owned())
                    .map_err(|e| parse_error(&e.to_string(), position))?;
                builder.comment(content);
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    builder.finish(reader.buffer_position())
}

fn element_kind(start: &BytesStart, position: usize) -> Result<NodeKind, DocumentError> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| parse_error(&e.to_string(), position))?
        .to_string();

    let attributes = start
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| parse_error(&e.to_string(), position))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| parse_error(&e.to_string(), position))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(&e.to_string(), position))?
                .into_owned();
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, DocumentError>>()?;

    Ok(NodeKind::Element { name, attributes })
}

fn parse_error(message: &str, position: usize) -> DocumentError {
    DocumentError::Parse {
        message: message.to_string(),
        position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_text_and_tail_are_kept_apart() {
        let doc = parse("<Schema>\n  <Cube name=\"A\">x</Cube>\n</Schema>").unwrap();
        let root = doc.root();
        assert_eq!(doc.node(root).text.as_deref(), Some("\n  "));

        let cube = doc.children(root)[0];
        assert_eq!(doc.node(cube).text.as_deref(), Some("x"));
        assert_eq!(doc.node(cube).tail.as_deref(), Some("\n"));
    }

    #[test]
    fn test_attributes_are_unescaped_in_order() {
        let doc = parse(r##"<Measure name="A &amp; B" column="c" formatString="#,##0"/>"##).unwrap();
        match &doc.node(doc.root()).kind {
            NodeKind::Element { attributes, .. } => assert_eq!(
                attributes,
                &vec![
                    ("name".to_string(), "A & B".to_string()),
                    ("column".to_string(), "c".to_string()),
                    ("formatString".to_string(), "#,##0".to_string()),
                ]
            ),
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_comments_are_preserved() {
        let doc = parse("<!-- head --><Schema><!-- inner --><Cube/></Schema><!-- tail -->").unwrap();
        assert_eq!(doc.prolog(), &[" head ".to_string()]);
        assert_eq!(doc.epilog(), &[" tail ".to_string()]);
        let first = doc.children(doc.root())[0];
        assert_eq!(doc.node(first).kind, NodeKind::Comment(" inner ".to_string()));
    }

    #[test]
    fn test_cdata_is_folded_into_text() {
        let doc = parse("<SQL><![CDATA[a < b]]></SQL>").unwrap();
        assert_eq!(doc.node(doc.root()).text.as_deref(), Some("a < b"));
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace_only("   \n")]
    #[case::unclosed("<Schema><Cube name=\"A\">")]
    #[case::mismatched("<Schema></Cube>")]
    #[case::two_roots("<Schema/><Schema/>")]
    #[case::stray_text("<Schema/>garbage")]
    #[case::bad_attribute("<Schema name=\"a\" name=\"b\"/>")]
    fn test_malformed_documents_are_rejected(#[case] input: &str) {
        assert!(matches!(parse(input), Err(DocumentError::Parse { .. })));
    }
}
