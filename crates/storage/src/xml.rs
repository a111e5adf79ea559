//! Minimal owned XML element tree on top of `quick-xml`.
//!
//! Only what the config codec needs: element lookup by tag name inside a
//! subtree, text content, and full-subtree serialization. Namespaces are
//! kept as part of the tag name. Whitespace-only text between child elements
//! is layout and is dropped; text inside leaf elements is kept as-is.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// `<name>text</name>`, or `<name/>` when `text` is empty.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        let text = text.into();
        if !text.is_empty() {
            el.children.push(Node::Text(text));
        }
        el
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First direct child with the given tag.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First matching descendant in document order (not including `self`).
    pub fn find(&self, name: &str) -> Option<&Element> {
        for child in self.elements() {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// All matching descendants in document order.
    pub fn find_all(&self, name: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(name, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, name: &str, out: &mut Vec<&'a Element>) {
        for child in self.elements() {
            if child.name == name {
                out.push(child);
            }
            child.collect_named(name, out);
        }
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
                Node::Comment(_) => {}
            }
        }
    }

    /// Serializes this subtree on its own, without an XML declaration.
    pub fn to_xml(&self) -> Result<String, CodecError> {
        let mut writer = new_writer();
        write_element(&mut writer, self)?;
        into_string(writer)
    }

    fn drop_layout_whitespace(&mut self) {
        let has_elements = self.children.iter().any(|n| matches!(n, Node::Element(_)));
        if has_elements {
            self.children
                .retain(|n| !matches!(n, Node::Text(t) if t.trim().is_empty()));
        }
    }
}

/// Parses a document (or a standalone fragment) and returns its root element.
pub fn parse(text: &str) -> Result<Element, CodecError> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = Reader::from_str(text);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(&reader, e.to_string()))?;
        match event {
            Event::Start(ref e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed(&reader, "multiple root elements"));
                }
                let el = element_from_start(e).map_err(|m| malformed(&reader, m))?;
                stack.push(el);
            }
            Event::Empty(ref e) => {
                let el = element_from_start(e).map_err(|m| malformed(&reader, m))?;
                attach(&mut stack, &mut root, el).map_err(|m| malformed(&reader, m))?;
            }
            Event::End(_) => {
                let mut el = stack
                    .pop()
                    .ok_or_else(|| malformed(&reader, "unexpected closing tag"))?;
                el.drop_layout_whitespace();
                attach(&mut stack, &mut root, el).map_err(|m| malformed(&reader, m))?;
            }
            Event::Text(ref t) => {
                let s = t.unescape().map_err(|e| malformed(&reader, e.to_string()))?;
                push_text(&mut stack, &s).map_err(|m| malformed(&reader, m))?;
            }
            Event::CData(ref c) => {
                let s = String::from_utf8_lossy(c);
                push_text(&mut stack, &s).map_err(|m| malformed(&reader, m))?;
            }
            Event::Comment(ref c) => {
                if let Some(top) = stack.last_mut() {
                    top.children
                        .push(Node::Comment(String::from_utf8_lossy(c).into_owned()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(&reader, format!("unclosed element <{}>", open.name)));
    }
    root.ok_or(CodecError::Empty)
}

/// Serializes a full document: XML declaration, then the root element.
pub fn write_document(root: &Element) -> Result<String, CodecError> {
    let mut writer = new_writer();
    emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut writer, root)?;
    let mut out = into_string(writer)?;
    out.push('\n');
    Ok(out)
}

fn new_writer() -> Writer<Vec<u8>> {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, CodecError> {
    String::from_utf8(writer.into_inner()).map_err(|e| CodecError::Write(e.to_string()))
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), CodecError> {
    writer
        .write_event(event)
        .map_err(|e| CodecError::Write(e.to_string()))
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<(), CodecError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }

    if el.children.is_empty() {
        return emit(writer, Event::Empty(start));
    }

    emit(writer, Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(writer, e)?,
            Node::Text(t) => emit(writer, Event::Text(BytesText::new(t)))?,
            Node::Comment(c) => emit(writer, Event::Comment(BytesText::from_escaped(c.as_str())))?,
        }
    }
    emit(writer, Event::End(BytesEnd::new(el.name.as_str())))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, String> {
    let mut el = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.push(el);
        return Ok(());
    }
    if root.is_some() {
        return Err("multiple root elements".to_string());
    }
    *root = Some(el);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), String> {
    match stack.last_mut() {
        Some(top) => {
            match top.children.last_mut() {
                Some(Node::Text(prev)) => prev.push_str(text),
                _ => top.children.push(Node::Text(text.to_string())),
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err("text outside of root element".to_string()),
    }
}

fn malformed(reader: &Reader<&[u8]>, message: impl Into<String>) -> CodecError {
    CodecError::Malformed {
        position: reader.buffer_position() as u64,
        message: message.into(),
    }
}
