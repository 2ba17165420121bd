//! AIML rule-file reader (quick-xml event stream).
//!
//! Only `<category>` elements are read; containers such as `<aiml>` and
//! `<topic>` are walked through transparently. `<that>` is skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::template::{squash_whitespace, TemplateNode};
use super::{pattern_tokens, BrainError};

pub(crate) struct Category {
    pub pattern: Vec<String>,
    pub template: Vec<TemplateNode>,
}

fn parse_error(e: impl std::fmt::Display) -> BrainError {
    BrainError::Parse(e.to_string())
}

pub(crate) fn parse_aiml(source: &str) -> Result<Vec<Category>, BrainError> {
    let mut reader = Reader::from_str(source);
    let mut categories = Vec::new();
    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) if e.name().as_ref() == b"category" => {
                categories.push(parse_category(&mut reader)?);
            }
            Event::Eof => return Ok(categories),
            _ => {}
        }
    }
}

fn parse_category(reader: &mut Reader<&[u8]>) -> Result<Category, BrainError> {
    let mut pattern: Option<Vec<String>> = None;
    let mut template: Option<Vec<TemplateNode>> = None;
    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Start(e) => match e.name().as_ref() {
                b"pattern" => pattern = Some(read_pattern(reader)?),
                b"template" => template = Some(parse_nodes(reader, b"template")?),
                _ => {
                    reader.read_to_end(e.name()).map_err(parse_error)?;
                }
            },
            Event::Empty(e) if e.name().as_ref() == b"template" => template = Some(Vec::new()),
            Event::End(e) if e.name().as_ref() == b"category" => break,
            Event::Eof => return Err(BrainError::Parse("unterminated <category>".into())),
            _ => {}
        }
    }

    let pattern = pattern
        .filter(|p| !p.is_empty())
        .ok_or_else(|| BrainError::Parse("<category> without a non-empty <pattern>".into()))?;
    let template =
        template.ok_or_else(|| BrainError::Parse(format!("<category> {:?} without <template>", pattern.join(" "))))?;
    Ok(Category { pattern, template })
}

fn read_pattern(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, BrainError> {
    let mut raw = String::new();
    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Text(t) => {
                raw.push_str(&t.unescape().map_err(parse_error)?);
                raw.push(' ');
            }
            Event::CData(c) => {
                raw.push_str(&String::from_utf8_lossy(&c));
                raw.push(' ');
            }
            Event::End(e) if e.name().as_ref() == b"pattern" => return Ok(pattern_tokens(&raw)),
            Event::Eof => return Err(BrainError::Parse("unterminated <pattern>".into())),
            _ => {}
        }
    }
}

fn parse_nodes(reader: &mut Reader<&[u8]>, end: &[u8]) -> Result<Vec<TemplateNode>, BrainError> {
    let mut nodes = Vec::new();
    loop {
        match reader.read_event().map_err(parse_error)? {
            Event::Text(t) => {
                let text = squash_whitespace(&t.unescape().map_err(parse_error)?);
                if !text.is_empty() {
                    nodes.push(TemplateNode::Text(text));
                }
            }
            Event::CData(c) => nodes.push(TemplateNode::Text(
                String::from_utf8_lossy(&c).into_owned(),
            )),
            Event::Empty(e) => nodes.extend(element(&e, Vec::new())?),
            Event::Start(e) => {
                let name = e.name().as_ref().to_vec();
                let children = parse_nodes(reader, &name)?;
                nodes.extend(element(&e, children)?);
            }
            Event::End(e) if e.name().as_ref() == end => return Ok(nodes),
            Event::Eof => {
                return Err(BrainError::Parse(format!(
                    "unterminated <{}>",
                    String::from_utf8_lossy(end)
                )))
            }
            _ => {}
        }
    }
}

/// Maps one element to template nodes. Unknown elements contribute their children.
fn element(e: &BytesStart, children: Vec<TemplateNode>) -> Result<Vec<TemplateNode>, BrainError> {
    let node = match e.name().as_ref() {
        b"star" => TemplateNode::Star(star_index(e)?),
        b"get" => TemplateNode::Get(required_name(e)?),
        b"sr" => TemplateNode::Srai(vec![TemplateNode::Star(1)]),
        b"set" => TemplateNode::Set {
            name: required_name(e)?,
            children,
        },
        b"think" => TemplateNode::Think(children),
        b"srai" => TemplateNode::Srai(children),
        b"uppercase" => TemplateNode::Uppercase(children),
        b"lowercase" => TemplateNode::Lowercase(children),
        _ => return Ok(children),
    };
    Ok(vec![node])
}

fn attribute(e: &BytesStart, key: &str) -> Result<Option<String>, BrainError> {
    match e.try_get_attribute(key).map_err(parse_error)? {
        Some(attr) => Ok(Some(attr.unescape_value().map_err(parse_error)?.into_owned())),
        None => Ok(None),
    }
}

fn required_name(e: &BytesStart) -> Result<String, BrainError> {
    attribute(e, "name")?
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            BrainError::Parse(format!(
                "<{}> requires a name attribute",
                String::from_utf8_lossy(e.name().as_ref())
            ))
        })
}

fn star_index(e: &BytesStart) -> Result<usize, BrainError> {
    match attribute(e, "index")? {
        None => Ok(1),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|&n| n >= 1)
            .ok_or_else(|| BrainError::Parse(format!("invalid <star index=\"{}\">", raw))),
    }
}
