//! Mutable XML documents backed by a `quick-xml` event list.
//!
//! A document keeps every event it was parsed from, so serializing an
//! untouched document reproduces the input text. Elements are addressed by
//! [`ElementHandle`]s, which stay valid for the lifetime of the document
//! because attribute edits replace an event in place and never insert or
//! remove events.

use std::borrow::Cow;

use quick_xml::encoding::{detect_encoding, EncodingError};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::DocumentError;

/// Position of a start (or empty) element tag inside a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementHandle(usize);

/// A parsed XML document that supports in-place attribute edits.
#[derive(Debug, Clone)]
pub struct Document {
    events: Vec<Event<'static>>,
}

impl Document {
    /// Parse XML text into a document.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Empty` for blank input, `DocumentError::Xml`
    /// for syntax errors, `DocumentError::UnclosedElement` when the input ends
    /// inside an element, and `DocumentError::NoRootElement` when it holds no
    /// element at all.
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::Empty);
        }

        let mut reader = Reader::from_str(text);
        let mut events = Vec::new();
        let mut open: Vec<String> = Vec::new();
        let mut has_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(event) => {
                    match &event {
                        Event::Start(elem) => {
                            has_root = true;
                            open.push(tag_name(elem).into_owned());
                        }
                        Event::Empty(_) => has_root = true,
                        Event::End(_) => {
                            open.pop();
                        }
                        _ => {}
                    }
                    events.push(event.into_owned());
                }
                Err(source) => {
                    return Err(DocumentError::Xml {
                        position: reader.error_position(),
                        source,
                    })
                }
            }
        }

        if let Some(name) = open.pop() {
            return Err(DocumentError::UnclosedElement { name });
        }
        if !has_root {
            return Err(DocumentError::NoRootElement);
        }

        Ok(Self { events })
    }

    /// Serialize the document back to XML text.
    ///
    /// The output is always UTF-8, so an XML declaration naming another
    /// encoding is rewritten to say `UTF-8`.
    pub fn serialize(&self) -> Result<String, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        for event in &self.events {
            let written = match event {
                Event::Decl(decl) => match utf8_decl(decl) {
                    Some(decl) => writer.write_event(Event::Decl(decl)),
                    None => writer.write_event(event.borrow()),
                },
                _ => writer.write_event(event.borrow()),
            };
            written.map_err(|source| DocumentError::Serialize { source })?;
        }

        String::from_utf8(writer.into_inner()).map_err(|e| DocumentError::Serialize {
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })
    }

    /// Find every element carrying an attribute named exactly `attr_name`,
    /// in document order.
    ///
    /// The name is matched including any prefix, so `schemaLocation` does not
    /// match `xsi:schemaLocation`.
    pub fn find_elements_with_attribute(&self, attr_name: &str) -> Vec<ElementHandle> {
        if attr_name.is_empty() {
            return Vec::new();
        }

        self.events
            .iter()
            .enumerate()
            .filter_map(|(idx, event)| match event {
                Event::Start(elem) | Event::Empty(elem) => {
                    find_attribute(elem, attr_name).map(|_| ElementHandle(idx))
                }
                _ => None,
            })
            .collect()
    }

    /// Read the unescaped value of an attribute.
    ///
    /// Returns `None` if the handle does not point at an element or the
    /// attribute is absent.
    pub fn attribute(&self, handle: ElementHandle, attr_name: &str) -> Option<String> {
        let elem = self.element(handle)?;
        let attr = find_attribute(elem, attr_name)?;
        attr.decode_and_unescape_value(Reader::from_str("").decoder()).ok().map(Cow::into_owned)
    }

    /// Set an attribute, replacing its value or appending it when absent.
    ///
    /// Other attributes of the element keep their order and raw values.
    /// Handles that do not point at an element are ignored.
    pub fn set_attribute(&mut self, handle: ElementHandle, attr_name: &str, value: &str) {
        let Some(elem) = self.element(handle) else {
            return;
        };

        let mut rebuilt = BytesStart::new(tag_name(elem).into_owned());
        let mut replaced = false;
        for attr in elem.attributes().with_checks(false).flatten() {
            if attr.key.as_ref() == attr_name.as_bytes() {
                if !replaced {
                    rebuilt.push_attribute((attr_name, value));
                    replaced = true;
                }
            } else if attr.value.contains(&b'"') {
                // push_attribute always quotes with '"'; re-escape values that
                // were single-quoted and contain a literal double quote.
                let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                let unescaped = attr
                    .decode_and_unescape_value(Reader::from_str("").decoder())
                    .map(Cow::into_owned)
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
                rebuilt.push_attribute((key.as_str(), unescaped.as_str()));
            } else {
                rebuilt.push_attribute(Attribute {
                    key: attr.key,
                    value: attr.value,
                });
            }
        }
        if !replaced {
            rebuilt.push_attribute((attr_name, value));
        }

        self.events[handle.0] = match self.events[handle.0] {
            Event::Empty(_) => Event::Empty(rebuilt),
            _ => Event::Start(rebuilt),
        };
    }

    /// Qualified tag name of the element behind `handle`, e.g. `xsd:import`.
    pub fn element_name(&self, handle: ElementHandle) -> Option<String> {
        self.element(handle)
            .map(|elem| tag_name(elem).into_owned())
    }

    /// Read an attribute of the document's root element.
    pub fn root_attribute(&self, attr_name: &str) -> Option<String> {
        let idx = self
            .events
            .iter()
            .position(|event| matches!(event, Event::Start(_) | Event::Empty(_)))?;
        self.attribute(ElementHandle(idx), attr_name)
    }

    fn element(&self, handle: ElementHandle) -> Option<&BytesStart<'static>> {
        match self.events.get(handle.0)? {
            Event::Start(elem) | Event::Empty(elem) => Some(elem),
            _ => None,
        }
    }
}

/// Decode raw document bytes into text.
///
/// The encoding comes from the byte order mark, then from the XML
/// declaration, and is UTF-8 otherwise. A byte order mark is not part of the
/// returned text.
///
/// # Errors
///
/// Returns an `EncodingError` if the bytes are malformed for that encoding.
pub fn decode_document(bytes: &[u8]) -> Result<String, EncodingError> {
    let detected = match detect_encoding(bytes) {
        Some((encoding, bom)) if bom > 0 || encoding.name() != "UTF-8" => Some((encoding, bom)),
        _ => {
            let mut reader = Reader::from_reader(bytes);
            let mut buf = Vec::new();
            let declared = match reader.read_event_into(&mut buf) {
                Ok(Event::Decl(decl)) => decl.encoder().map(|encoding| (encoding, 0)),
                _ => None,
            };
            declared
        }
    };

    match detected {
        Some((encoding, bom)) => {
            quick_xml::encoding::decode(&bytes[bom..], encoding).map(Cow::into_owned)
        }
        None => Ok(std::str::from_utf8(bytes)?.to_string()),
    }
}

/// The declaration with its encoding replaced by `UTF-8`, or `None` when it
/// already declares UTF-8 or no encoding at all.
fn utf8_decl(decl: &BytesDecl<'_>) -> Option<BytesDecl<'static>> {
    let encoding = decl.encoding()?.ok()?;
    if encoding.eq_ignore_ascii_case(b"utf-8") {
        return None;
    }

    let version = decl.version().ok()?;
    let version = String::from_utf8_lossy(&version).into_owned();
    let standalone = decl
        .standalone()
        .and_then(Result::ok)
        .map(|value| String::from_utf8_lossy(&value).into_owned());
    Some(BytesDecl::new(&version, Some("UTF-8"), standalone.as_deref()))
}

fn tag_name<'a>(elem: &'a BytesStart<'_>) -> Cow<'a, str> {
    String::from_utf8_lossy(elem.name().into_inner())
}

fn find_attribute<'a>(elem: &'a BytesStart<'_>, attr_name: &str) -> Option<Attribute<'a>> {
    elem.attributes()
        .with_checks(false)
        .flatten()
        .find(|attr| attr.key.as_ref() == attr_name.as_bytes())
}
