use super::{Document, DocumentError, NodeId, NodeKind};
use quick_xml::escape::escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{Cursor, Write};

type XmlWriter = Writer<Cursor<Vec<u8>>>;

pub(super) fn write_document(doc: &Document) -> Result<String, DocumentError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(serialize_error)?;
    newline(&mut writer)?;

    for comment in doc.prolog() {
        write_comment(&mut writer, comment)?;
        newline(&mut writer)?;
    }

    write_node(&mut writer, doc, doc.root(), false)?;
    newline(&mut writer)?;

    for comment in doc.epilog() {
        write_comment(&mut writer, comment)?;
        newline(&mut writer)?;
    }

    into_string(writer)
}

pub(super) fn write_subtree(doc: &Document, id: NodeId) -> Result<String, DocumentError> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_node(&mut writer, doc, id, false)?;
    into_string(writer)
}

fn write_node(
    writer: &mut XmlWriter,
    doc: &Document,
    id: NodeId,
    with_tail: bool,
) -> Result<(), DocumentError> {
    let node = doc.node(id);
    match &node.kind {
        NodeKind::Element { name, attributes } => {
            let mut start = BytesStart::new(name.as_str());
            for (key, value) in attributes {
                let value = escape_attribute(value);
                start.push_attribute(Attribute::from((key.as_bytes(), value.as_bytes())));
            }

            let text = node.text.as_deref().filter(|text| !text.is_empty());
            let children = doc.children(id);
            if text.is_none() && children.is_empty() {
                writer
                    .write_event(Event::Empty(start))
                    .map_err(serialize_error)?;
            } else {
                writer
                    .write_event(Event::Start(start))
                    .map_err(serialize_error)?;
                if let Some(text) = text {
                    write_text(writer, text)?;
                }
                for &child in children {
                    write_node(writer, doc, child, true)?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(name.as_str())))
                    .map_err(serialize_error)?;
            }
        }
        NodeKind::Comment(content) => write_comment(writer, content)?,
    }

    if with_tail {
        if let Some(tail) = node.tail.as_deref().filter(|tail| !tail.is_empty()) {
            write_text(writer, tail)?;
        }
    }
    Ok(())
}

/// Escapes markup characters plus the whitespace a reader would otherwise
/// normalize to a plain space inside an attribute value.
fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(|c: char| matches!(c, '\n' | '\r' | '\t')) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\n', "&#10;")
            .replace('\r', "&#13;")
            .replace('\t', "&#9;"),
    )
}

fn write_text(writer: &mut XmlWriter, text: &str) -> Result<(), DocumentError> {
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(serialize_error)
}

fn write_comment(writer: &mut XmlWriter, content: &str) -> Result<(), DocumentError> {
    writer
        .write_event(Event::Comment(BytesText::from_escaped(content)))
        .map_err(serialize_error)
}

fn newline(writer: &mut XmlWriter) -> Result<(), DocumentError> {
    writer.get_mut().write_all(b"\n").map_err(serialize_error)
}

fn into_string(writer: XmlWriter) -> Result<String, DocumentError> {
    String::from_utf8(writer.into_inner().into_inner()).map_err(serialize_error)
}

fn serialize_error<E: std::fmt::Display>(e: E) -> DocumentError {
    DocumentError::Serialize(e.to_string())
}
