//! Make rendered SVGs stretch to fill their container.
//!
//! Only the root `<svg>` start tag is touched: its `preserveAspectRatio`
//! attribute is set to `none`, replacing any existing value. Every other byte
//! of the document is left as it was.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use window_common::{WindowError, WindowResult};

const ATTRIBUTE: &str = "preserveAspectRatio";

/// Rewrite the SVG file at `path` in place.
pub fn make_stretchable<P: AsRef<Path>>(path: P) -> WindowResult<()> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| WindowError::MalformedImage(format!("{}: {}", path.display(), e)))?;
    let rewritten = make_stretchable_str(&text)?;
    if rewritten != text {
        std::fs::write(path, rewritten)?;
    }
    Ok(())
}

/// Rewrite SVG text so the root element does not preserve aspect ratio.
pub fn make_stretchable_str(svg: &str) -> WindowResult<String> {
    let mut reader = Reader::from_str(svg);

    loop {
        let tag_start = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("at byte {}: {}", reader.buffer_position(), e)))?;

        match event {
            Event::Start(root) | Event::Empty(root) => {
                if root.local_name().as_ref() != b"svg" {
                    return Err(malformed(format!(
                        "root element is <{}>, not <svg>",
                        String::from_utf8_lossy(root.name().as_ref())
                    )));
                }
                return splice(svg, tag_start, &root);
            }
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_) => {}
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            Event::Eof => return Err(malformed("no root <svg> element".to_string())),
            _ => return Err(malformed("content before the root <svg> element".to_string())),
        }
    }
}

/// Set the attribute on the root tag beginning at byte `tag_start`.
fn splice(svg: &str, tag_start: usize, root: &BytesStart<'_>) -> WindowResult<String> {
    let mut out = String::with_capacity(svg.len() + ATTRIBUTE.len() + 10);

    for attr in root.attributes() {
        let attr = attr.map_err(|e| malformed(format!("root <svg> attribute: {}", e)))?;
        if attr.key.as_ref() != ATTRIBUTE.as_bytes() {
            continue;
        }
        let value_start = offset_within(svg.as_bytes(), &attr.value)
            .ok_or_else(|| malformed(format!("{} value is not in the source text", ATTRIBUTE)))?;
        let value_end = value_start + attr.value.len();

        out.push_str(&svg[..value_start]);
        out.push_str("none");
        out.push_str(&svg[value_end..]);
        return Ok(out);
    }

    // just after `<svg`
    let insert_at = tag_start + 1 + root.name().as_ref().len();
    out.push_str(&svg[..insert_at]);
    out.push(' ');
    out.push_str(ATTRIBUTE);
    out.push_str("=\"none\"");
    out.push_str(&svg[insert_at..]);
    Ok(out)
}

/// Offset of `part` in `whole` when `part` borrows from it.
fn offset_within(whole: &[u8], part: &[u8]) -> Option<usize> {
    let start = (part.as_ptr() as usize).checked_sub(whole.as_ptr() as usize)?;
    (start + part.len() <= whole.len()).then_some(start)
}

fn malformed(message: String) -> WindowError {
    WindowError::MalformedImage(message)
}
