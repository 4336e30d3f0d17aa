use failure_derive::Fail;

/// Source namespace reported by formats that don't name their namespaces
pub const NS_SOURCE_FALLBACK: &str = "source";
/// Destination namespace reported by formats that don't name their namespaces
pub const NS_TARGET_FALLBACK: &str = "target";

const TO_ESCAPE: &[char] = &['\\', '\n', '\r', '\0', '\t'];
const ESCAPED: &[char] = &['\\', 'n', 'r', '0', 't'];

#[inline]
pub fn needs_escaping(s: &str) -> bool {
    s.contains(TO_ESCAPE)
}

/// Appends `s` to `out`, replacing `\\ \n \r \0 \t` with their escape sequences.
pub fn escape_into(s: &str, out: &mut String) {
    for c in s.chars() {
        match TO_ESCAPE.iter().position(|&e| e == c) {
            Some(index) => {
                out.push('\\');
                out.push(ESCAPED[index]);
            }
            None => out.push(c),
        }
    }
}

#[inline]
pub fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    escape_into(s, &mut result);
    result
}

#[derive(Debug, Fail)]
#[fail(display = "invalid escape sequence \\{:?}", _0)]
pub struct InvalidEscape(pub Option<char>);

pub fn unescape(s: &str) -> Result<String, InvalidEscape> {
    if !s.contains('\\') {
        return Ok(s.into())
    }
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let next = chars.next();
        match next.and_then(|next| ESCAPED.iter().position(|&e| e == next)) {
            Some(index) => result.push(TO_ESCAPE[index]),
            None => return Err(InvalidEscape(next)),
        }
    }
    Ok(result)
}

/// Rewrites every class name inside a descriptor with `mapper`.
///
/// Names the mapper doesn't know (returning `None`) are kept.
pub fn map_desc<'a, F>(desc: &str, mut mapper: F) -> String
    where F: FnMut(&str) -> Option<&'a str> {
    let mut result = String::with_capacity(desc.len());
    let mut remaining = desc;
    while let Some(start) = remaining.find('L') {
        let (before, rest) = remaining.split_at(start + 1);
        result.push_str(before);
        match rest.find(';') {
            Some(end) => {
                let class_name = &rest[..end];
                result.push_str(mapper(class_name).unwrap_or(class_name));
                result.push(';');
                remaining = &rest[end + 1..];
            }
            None => {
                remaining = rest;
                break;
            }
        }
    }
    result.push_str(remaining);
    result
}

/// Converts a slash separated class name into the dotted java form
#[inline]
pub fn to_dotted(name: &str) -> String {
    name.replace('/', ".")
}

/// Converts a dotted class name into the slash separated internal form
#[inline]
pub fn to_internal(name: &str) -> String {
    name.replace('.', "/")
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn escapes() {
        assert_eq!(escape("a\tb\\c\nd"), "a\\tb\\\\c\\nd");
        assert_eq!(unescape("a\\tb\\\\c\\nd\\0").unwrap(), "a\tb\\c\nd\0");
        assert_eq!(unescape("plain").unwrap(), "plain");
        assert!(unescape("bad\\x").is_err());
        assert!(unescape("trailing\\").is_err());
        assert!(needs_escaping("x\ry"));
        assert!(!needs_escaping("xy"));
    }
    #[test]
    fn remaps_descriptors() {
        let mapped = map_desc("(La/B;I[Lc/D;)La/B;", |name| match name {
            "a/B" => Some("x/Y"),
            _ => None,
        });
        assert_eq!(mapped, "(Lx/Y;I[Lc/D;)Lx/Y;");
        assert_eq!(map_desc("(IJ)V", |_| None), "(IJ)V");
    }
}
