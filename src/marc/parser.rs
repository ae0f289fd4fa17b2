//! MARCXML record parser
//!
//! Parses a MARCXML document (a `<collection>` of `<record>` elements, or a
//! single `<record>`) into a structured representation. Namespace prefixes
//! are ignored; elements are matched on their local name.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{AppError, AppResult};

/// A MARC record containing leader and fields, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarcRecord {
    /// The 24-character record leader (empty when the document omits it)
    pub leader: String,
    /// Control fields (00X)
    pub control_fields: Vec<ControlField>,
    /// Data fields with indicators and subfields
    pub data_fields: Vec<DataField>,
}

/// A MARC control field (001-009): a tag and its raw text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlField {
    pub tag: String,
    pub data: String,
}

/// A MARC data field (010-999)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataField {
    /// Field tag (3 characters)
    pub tag: String,
    /// First indicator
    pub ind1: char,
    /// Second indicator
    pub ind2: char,
    /// Subfields
    pub subfields: Vec<Subfield>,
}

/// A MARC subfield
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subfield {
    /// Subfield code (single character)
    pub code: char,
    /// Subfield data
    pub data: String,
}

impl DataField {
    /// Get a subfield value by code
    pub fn get_subfield(&self, code: char) -> Option<&str> {
        self.subfields
            .iter()
            .find(|sf| sf.code == code)
            .map(|sf| sf.data.as_str())
    }

    /// Get all subfield values for a code
    pub fn get_all_subfields(&self, code: char) -> Vec<&str> {
        self.subfields
            .iter()
            .filter(|sf| sf.code == code)
            .map(|sf| sf.data.as_str())
            .collect()
    }

    fn from_start(e: &BytesStart<'_>) -> AppResult<Self> {
        Ok(DataField {
            tag: required_attr(e, "datafield", "tag")?,
            ind1: indicator(e, "ind1")?,
            ind2: indicator(e, "ind2")?,
            subfields: Vec::new(),
        })
    }
}

/// Which element is currently collecting text
enum TextSlot {
    Leader(String),
    Control(ControlField),
    Subfield(Subfield),
}

/// Parse a MARCXML document into records.
///
/// The whole batch fails on the first structural problem: malformed XML,
/// an unexpected root element, a field without a tag or a subfield without
/// a code.
pub fn parse_marcxml(xml: &str) -> AppResult<Vec<MarcRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut records = Vec::new();
    let mut record: Option<MarcRecord> = None;
    let mut field: Option<DataField> = None;
    let mut slot: Option<TextSlot> = None;
    let mut depth = 0usize;
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if depth == 0 {
                    check_root(&e, saw_root)?;
                    saw_root = true;
                }
                depth += 1;
                match e.local_name().as_ref() {
                    b"record" => record = Some(MarcRecord::default()),
                    b"leader" => slot = Some(TextSlot::Leader(String::new())),
                    b"controlfield" => {
                        slot = Some(TextSlot::Control(ControlField {
                            tag: required_attr(&e, "controlfield", "tag")?,
                            data: String::new(),
                        }))
                    }
                    b"datafield" => field = Some(DataField::from_start(&e)?),
                    b"subfield" => {
                        slot = Some(TextSlot::Subfield(Subfield {
                            code: subfield_code(&e)?,
                            data: String::new(),
                        }))
                    }
                    _ => {}
                }
            }
            Event::Empty(e) => {
                if depth == 0 {
                    check_root(&e, saw_root)?;
                    saw_root = true;
                }
                match e.local_name().as_ref() {
                    b"record" => records.push(MarcRecord::default()),
                    b"controlfield" => {
                        let control = ControlField {
                            tag: required_attr(&e, "controlfield", "tag")?,
                            data: String::new(),
                        };
                        if let Some(r) = record.as_mut() {
                            r.control_fields.push(control);
                        }
                    }
                    b"datafield" => {
                        let data_field = DataField::from_start(&e)?;
                        if let Some(r) = record.as_mut() {
                            r.data_fields.push(data_field);
                        }
                    }
                    b"subfield" => {
                        let sf = Subfield {
                            code: subfield_code(&e)?,
                            data: String::new(),
                        };
                        if let Some(f) = field.as_mut() {
                            f.subfields.push(sf);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if slot.is_some() {
                    let text = t.unescape()?;
                    push_text(&mut slot, &text);
                }
            }
            Event::CData(c) => {
                if slot.is_some() {
                    push_text(&mut slot, &String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| AppError::parse("unmatched closing tag"))?;
                match e.local_name().as_ref() {
                    b"leader" => {
                        if let (Some(TextSlot::Leader(leader)), Some(r)) = (slot.take(), record.as_mut()) {
                            r.leader = leader;
                        }
                    }
                    b"controlfield" => {
                        if let (Some(TextSlot::Control(cf)), Some(r)) = (slot.take(), record.as_mut()) {
                            r.control_fields.push(cf);
                        }
                    }
                    b"subfield" => {
                        if let (Some(TextSlot::Subfield(sf)), Some(f)) = (slot.take(), field.as_mut()) {
                            f.subfields.push(sf);
                        }
                    }
                    b"datafield" => {
                        if let (Some(f), Some(r)) = (field.take(), record.as_mut()) {
                            r.data_fields.push(f);
                        }
                    }
                    b"record" => {
                        if let Some(r) = record.take() {
                            records.push(r);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(AppError::parse("document has no root element"));
    }
    if depth != 0 {
        return Err(AppError::parse("unexpected end of document"));
    }

    tracing::debug!("Parsed {} MARC records", records.len());
    Ok(records)
}

fn push_text(slot: &mut Option<TextSlot>, text: &str) {
    match slot {
        Some(TextSlot::Leader(leader)) => leader.push_str(text),
        Some(TextSlot::Control(cf)) => cf.data.push_str(text),
        Some(TextSlot::Subfield(sf)) => sf.data.push_str(text),
        None => {}
    }
}

fn check_root(e: &BytesStart<'_>, saw_root: bool) -> AppResult<()> {
    let name = e.local_name();
    if saw_root {
        return Err(AppError::parse("document has more than one root element"));
    }
    match name.as_ref() {
        b"collection" | b"record" => Ok(()),
        other => Err(AppError::parse(format!(
            "unexpected root element <{}>, expected <collection> or <record>",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn attr_value(e: &BytesStart<'_>, name: &str) -> AppResult<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_attr(e: &BytesStart<'_>, element: &str, name: &str) -> AppResult<String> {
    attr_value(e, name)?
        .ok_or_else(|| AppError::parse(format!("<{}> without '{}' attribute", element, name)))
}

fn subfield_code(e: &BytesStart<'_>) -> AppResult<char> {
    required_attr(e, "subfield", "code")?
        .chars()
        .next()
        .ok_or_else(|| AppError::parse("<subfield> with empty 'code' attribute"))
}

fn indicator(e: &BytesStart<'_>, name: &str) -> AppResult<char> {
    Ok(attr_value(e, name)?
        .and_then(|v| v.chars().next())
        .unwrap_or(' '))
}
