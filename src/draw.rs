//! The `draw(x, y) = R G B` micro-grammar and the scene-dimension scan.
//!
//! Both grammars are tolerant the way the emitter is sloppy: whitespace is
//! free, surrounding text is ignored, and only the first `(`, `)`, `=` and
//! the one `,` inside the parentheses carry meaning.

/// byte offsets of the four significant marks, relative to the scanned tail
#[derive(Debug, PartialEq, Eq)]
pub struct Marks {
    pub lbrack: usize,
    pub rbrack: usize,
    pub eq: usize,
    pub comma: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScanError {
    /// doubled or misordered marks; the caller warns and drops the line
    Malformed(&'static str),
    /// a mark never showed up before end-of-line; dropped silently
    Incomplete,
}

/// Scan the text after the matched `draw` for its four marks. A `,` only
/// counts between `(` and `)`; commas elsewhere belong to the surrounding
/// prose and are ignored.
pub fn scan_marks(tail: &str) -> Result<Marks, ScanError> {
    let mut lbrack = None;
    let mut rbrack = None;
    let mut eq = None;
    let mut comma = None;
    for (at, c) in tail.char_indices() {
        match c {
            '(' => {
                if lbrack.is_some() {
                    return Err(ScanError::Malformed("second '('"));
                }
                lbrack = Some(at);
            }
            ')' => {
                if lbrack.is_none() {
                    return Err(ScanError::Malformed("')' before '('"));
                }
                if rbrack.is_some() {
                    return Err(ScanError::Malformed("second ')'"));
                }
                rbrack = Some(at);
            }
            '=' => {
                if rbrack.is_none() {
                    return Err(ScanError::Malformed("'=' before ')'"));
                }
                if eq.is_some() {
                    return Err(ScanError::Malformed("second '='"));
                }
                eq = Some(at);
            }
            ',' => {
                if lbrack.is_some() && rbrack.is_none() {
                    if comma.is_some() {
                        return Err(ScanError::Malformed("second ','"));
                    }
                    comma = Some(at);
                }
            }
            _ => {}
        }
    }
    match (lbrack, rbrack, eq, comma) {
        (Some(lbrack), Some(rbrack), Some(eq), Some(comma)) => Ok(Marks {
            lbrack,
            rbrack,
            eq,
            comma,
        }),
        _ => Err(ScanError::Incomplete),
    }
}

/// Pull the two coordinates and three channels out of a structurally
/// complete call. Failures here are warnings, not grammar shape errors.
pub fn extract_fields(tail: &str, marks: &Marks) -> Result<(i32, i32, f32, f32, f32), String> {
    let x = parse_int(&tail[marks.lbrack + 1..marks.comma])?;
    let y = parse_int(&tail[marks.comma + 1..marks.rbrack])?;
    let mut channels = tail[marks.eq + 1..].split_whitespace();
    let r = parse_channel(channels.next())?;
    let g = parse_channel(channels.next())?;
    let b = parse_channel(channels.next())?;
    Ok((x, y, r, g, b))
}

fn parse_int(field: &str) -> Result<i32, String> {
    field
        .trim()
        .parse()
        .map_err(|_| format!("bad coordinate {:?}", field.trim()))
}

fn parse_channel(field: Option<&str>) -> Result<f32, String> {
    let field = field.ok_or("missing colour channel")?;
    field
        .parse()
        .map_err(|_| format!("bad colour channel {:?}", field))
}

/// Scene dimensions sit at the end of the line: take the longest trailing
/// run of digits, spaces and tabs, and read `W H` out of it. Anything else
/// is a bad scene description.
pub fn scan_scene_dimensions(line: &str) -> Option<(usize, usize)> {
    let bytes = line.as_bytes();
    let mut start = bytes.len();
    while start > 0 && matches!(bytes[start - 1], b'0'..=b'9' | b' ' | b'\t') {
        start -= 1;
    }
    let mut fields = line[start..].split_whitespace();
    let width: usize = fields.next()?.parse().ok()?;
    let height: usize = fields.next()?.parse().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}
