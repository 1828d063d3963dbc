//! Analysis report retrieval types and XML mapping.
//!
//! Reports are mapped to a generic JSON tree rather than typed structs:
//! - an element becomes an object keyed by child element and attribute names
//! - an element holding only text becomes a string, an empty one `null`
//! - text next to attributes or children is stored under `#text`
//! - repeated child names collapse into an array, in document order

use std::fmt;

use error_stack::Report;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::DdanError;

/// Which report the analyzer should return for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportType {
    /// One report. When several image types analysed the sample, the analyzer
    /// picks the highest ROZ rating, then the lowest image type id.
    #[default]
    SingleImage,
    /// One report per image type.
    MultipleImages,
}

impl ReportType {
    pub fn header_value(self) -> &'static str {
        match self {
            ReportType::SingleImage => "0",
            ReportType::MultipleImages => "1",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::SingleImage => write!(f, "single"),
            ReportType::MultipleImages => write!(f, "multiple"),
        }
    }
}

/// The value returned when a report cannot be parsed.
pub fn empty_report() -> Value {
    Value::Object(Map::new())
}

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, Report<DdanError>> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| parse_error(format!("Invalid attribute: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| parse_error(format!("Invalid attribute value: {e}")))?;
            fields.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let value = match (self.fields.is_empty(), self.text.is_empty()) {
            (true, true) => Value::Null,
            (true, false) => Value::String(self.text),
            (false, true) => Value::Object(self.fields),
            (false, false) => {
                self.fields.insert("#text".to_string(), Value::String(self.text));
                Value::Object(self.fields)
            }
        };
        (self.name, value)
    }
}

fn parse_error(message: String) -> Report<DdanError> {
    Report::new(DdanError::Parse { message })
}

fn insert_child(fields: &mut Map<String, Value>, name: String, value: Value) {
    match fields.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            fields.insert(name, value);
        }
    }
}

fn set_root(
    root: &mut Option<(String, Value)>,
    name: String,
    value: Value,
) -> Result<(), Report<DdanError>> {
    if let Some((first, _)) = root {
        return Err(parse_error(format!(
            "Multiple root elements: <{name}> after <{first}>"
        )));
    }
    *root = Some((name, value));
    Ok(())
}

/// Map an XML report document to a JSON tree.
///
/// # Errors
///
/// Returns [`DdanError::Parse`] if the document is not well-formed or does not
/// have exactly one root element.
pub fn parse_report(xml: &str) -> Result<Value, Report<DdanError>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            parse_error(format!(
                "Malformed XML at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(start) => stack.push(Frame::open(&start)?),
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.fields, name, value),
                    None => set_root(&mut root, name, value)?,
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| parse_error(format!("Invalid text: {e}")))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(parse_error("Text outside of root element".into())),
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| parse_error("Unbalanced closing tag".into()))?;
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => insert_child(&mut parent.fields, name, value),
                    None => set_root(&mut root, name, value)?,
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(format!("Unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| parse_error("Document has no root element".into()))?;
    let mut document = Map::new();
    document.insert(name, value);
    Ok(Value::Object(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_type_header_value() {
        assert_eq!(ReportType::default(), ReportType::SingleImage);
        assert_eq!(ReportType::SingleImage.header_value(), "0");
        assert_eq!(ReportType::MultipleImages.header_value(), "1");
    }

    #[test]
    fn test_parse_report_structure() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <REPORTS>
              <FILE_ANALYZE_REPORT>
                <FileSHA1>deadbeef</FileSHA1>
                <OverallROZRating>3</OverallROZRating>
                <VirusName/>
                <ImageType id="1" name="win7">analysed</ImageType>
              </FILE_ANALYZE_REPORT>
            </REPORTS>"#;

        let report = parse_report(xml).expect("valid report");
        assert_eq!(
            report,
            json!({
                "REPORTS": {
                    "FILE_ANALYZE_REPORT": {
                        "FileSHA1": "deadbeef",
                        "OverallROZRating": "3",
                        "VirusName": null,
                        "ImageType": {"id": "1", "name": "win7", "#text": "analysed"}
                    }
                }
            })
        );
    }

    #[test]
    fn test_repeated_elements_become_array() {
        let xml = "<REPORTS><R><Id>1</Id></R><R><Id>2</Id></R><R><Id>3</Id></R></REPORTS>";

        let report = parse_report(xml).expect("valid report");
        assert_eq!(
            report,
            json!({"REPORTS": {"R": [{"Id": "1"}, {"Id": "2"}, {"Id": "3"}]}})
        );
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = "<a><b>x &amp; y</b><c><![CDATA[<raw>]]></c></a>";
        let report = parse_report(xml).expect("valid report");
        assert_eq!(report, json!({"a": {"b": "x & y", "c": "<raw>"}}));
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        for bad in [
            "<a><b></a>",
            "<a>",
            "",
            "not xml at all",
            "<a x=\"1></a>",
            "<REPORTS><A>1</A></REPORTS><OTHER/>",
            "<a/><b></b>",
        ] {
            let err = parse_report(bad).expect_err("should reject");
            assert!(
                matches!(err.current_context(), DdanError::Parse { .. }),
                "{bad:?} should be a parse error"
            );
        }
    }

    #[test]
    fn test_trailing_root_does_not_replace_report() {
        let err = parse_report("<REPORTS><A>1</A></REPORTS><OTHER/>")
            .expect_err("second root element");
        assert!(err
            .current_context()
            .to_string()
            .contains("Multiple root elements"));
    }

    #[test]
    fn test_empty_report_is_empty_object() {
        assert_eq!(empty_report(), json!({}));
    }
}
