use crate::document::NodeRef;
use crate::node::NodeKind;
use crate::sink::ByteSink;

/// Serialize `node` and its subtree into `out`, returning the number of
/// bytes written.
///
/// Compact mode emits no whitespace. Pretty mode indents two spaces per
/// depth level and separates siblings with newlines; empty containers are
/// written as `[]` and `{}` with no interior whitespace.
///
/// Parsed strings and numbers are written back byte-for-byte from the
/// source — escape sequences present in the input are preserved verbatim,
/// so a parse/serialize cycle is zero-copy. Builder-created strings may
/// hold raw control bytes and are escaped on the way out.
pub fn encode(node: NodeRef<'_>, pretty: bool, out: &mut ByteSink) -> usize {
    let before = out.len();
    write_node(node, pretty, 0, out);
    out.len() - before
}

fn write_node(node: NodeRef<'_>, pretty: bool, depth: usize, out: &mut ByteSink) {
    match node.kind() {
        NodeKind::Null => out.append(b"null"),
        NodeKind::True => out.append(b"true"),
        NodeKind::False => out.append(b"false"),
        NodeKind::Int | NodeKind::Float => out.append(node.raw()),
        NodeKind::String => write_string(node, out),
        NodeKind::Array => write_array(node, pretty, depth, out),
        NodeKind::Object => write_object(node, pretty, depth, out),
    }
}

fn write_string(node: NodeRef<'_>, out: &mut ByteSink) {
    out.push(b'"');
    if node.payload_is_owned() {
        write_escaped(node.raw(), out);
    } else {
        out.append(node.raw());
    }
    out.push(b'"');
}

/// Write string payload bytes with JSON escaping applied: `"`, `\`, the
/// short escapes for common control bytes, and `\u00XX` for the rest of
/// the control range. Other bytes pass through untouched.
pub fn write_escaped(bytes: &[u8], out: &mut ByteSink) {
    for &byte in bytes {
        match byte {
            b'"' => out.append(b"\\\""),
            b'\\' => out.append(b"\\\\"),
            0x08 => out.append(b"\\b"),
            0x0c => out.append(b"\\f"),
            b'\n' => out.append(b"\\n"),
            b'\r' => out.append(b"\\r"),
            b'\t' => out.append(b"\\t"),
            byte if byte < 0x20 => out.append_fmt(format_args!("\\u{byte:04x}")),
            byte => out.push(byte),
        }
    }
}

fn indent(depth: usize, out: &mut ByteSink) {
    for _ in 0..depth {
        out.append(b"  ");
    }
}

fn write_array(node: NodeRef<'_>, pretty: bool, depth: usize, out: &mut ByteSink) {
    let count = node.children();
    let mut child = match node.first_child() {
        Some(child) => child,
        None => {
            out.append(b"[]");
            return;
        }
    };
    out.push(b'[');
    for i in 0..count {
        if i > 0 {
            out.push(b',');
        }
        if pretty {
            out.push(b'\n');
            indent(depth + 1, out);
        }
        write_node(child, pretty, depth + 1, out);
        if i + 1 < count {
            child = match child.next_sibling() {
                Some(next) => next,
                None => break,
            };
        }
    }
    if pretty {
        out.push(b'\n');
        indent(depth, out);
    }
    out.push(b']');
}

fn write_object(node: NodeRef<'_>, pretty: bool, depth: usize, out: &mut ByteSink) {
    let count = node.children();
    let mut key = match node.first_child() {
        Some(key) => key,
        None => {
            out.append(b"{}");
            return;
        }
    };
    out.push(b'{');
    for i in 0..count {
        if i > 0 {
            out.push(b',');
        }
        if pretty {
            out.push(b'\n');
            indent(depth + 1, out);
        }
        write_string(key, out);
        out.push(b':');
        if pretty {
            out.push(b' ');
        }
        let value = match key.next_sibling() {
            Some(value) => value,
            None => break,
        };
        write_node(value, pretty, depth + 1, out);
        if i + 1 < count {
            key = match value.next_sibling() {
                Some(next) => next,
                None => break,
            };
        }
    }
    if pretty {
        out.push(b'\n');
        indent(depth, out);
    }
    out.push(b'}');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use expect_test::expect;
    use pretty_assertions::assert_eq;

    fn roundtrip(input: &[u8], pretty: bool) -> String {
        let mut parser = Parser::new(input.len() + 1, 32);
        parser.feed(input).expect("feed");
        parser.finish().expect("finish");
        let doc = parser.document(input);
        let mut out = ByteSink::new();
        let written = encode(doc.root().unwrap(), pretty, &mut out);
        assert_eq!(written, out.len());
        String::from_utf8(out.into_inner()).expect("encoder output is UTF-8 here")
    }

    #[test]
    fn compact_drops_all_whitespace() {
        assert_eq!(
            roundtrip(b" { \"a\":1 , \"b\":[ true, null ] } ", false),
            r#"{"a":1,"b":[true,null]}"#
        );
    }

    #[test]
    fn compact_is_stable_under_reparsing() {
        let first = roundtrip(br#"{"a":[1,2.5,"x"],"b":{}}"#, false);
        let second = roundtrip(first.as_bytes(), false);
        assert_eq!(first, second);
    }

    #[test]
    fn escapes_roundtrip_verbatim() {
        let input = br#""\"\\/\b\f\n\r\t ""#;
        assert_eq!(roundtrip(input, false).as_bytes(), input.as_slice());
    }

    #[test]
    fn pretty_indents_two_spaces_per_level() {
        let output = roundtrip(br#"{"user":{"age":30},"tags":[1,2],"ok":true}"#, true);
        expect![[r#"
            {
              "user": {
                "age": 30
              },
              "tags": [
                1,
                2
              ],
              "ok": true
            }"#]]
        .assert_eq(&output);
    }

    #[test]
    fn empty_containers_elide_interior_whitespace() {
        assert_eq!(roundtrip(b"[]", true), "[]");
        assert_eq!(roundtrip(b"{}", true), "{}");
        assert_eq!(roundtrip(br#"{"a":[],"b":{}}"#, true), "{\n  \"a\": [],\n  \"b\": {}\n}");
    }

    #[test]
    fn scalars_roundtrip_as_their_tokens() {
        assert_eq!(roundtrip(b"null", false), "null");
        assert_eq!(roundtrip(b"true", false), "true");
        assert_eq!(roundtrip(b"-1.5e-3", false), "-1.5e-3");
        assert_eq!(roundtrip(b"42", true), "42");
    }

    #[test]
    fn escape_writer_handles_control_bytes() {
        let mut out = ByteSink::new();
        write_escaped(b"a\"b\\c\nd\x01e", &mut out);
        assert_eq!(out.as_slice(), br#"a\"b\\c\nd\u0001e"#.as_slice());
    }
}
