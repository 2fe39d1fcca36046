use crate::value::{looks_like_bool, parse_yaml_int, Value};

/// Render a [`Value`] as canonical YAML text (spec §4.6).
///
/// This is the inverse of the leaf classification in §4.4 for scalars that
/// round-trip through it; a mapping key is written verbatim rather than
/// quoted, since the parser's mapping grammar only ever reads a plain
/// `literal` as a key (see DESIGN.md).
pub fn stringify(value: &Value) -> String {
    let mut out = String::new();
    write_root(&mut out, value);
    out
}

/// Render a full document: `--- [!tag]` header, the value, then `...`
/// (spec §4.6, document framing).
pub fn stringify_document(value: &Value, directive: Option<&str>) -> String {
    let mut out = String::new();
    match directive {
        Some(tag) => {
            out.push_str("--- !");
            out.push_str(tag);
            out.push('\n');
        }
        None => out.push_str("---\n"),
    }
    write_root(&mut out, value);
    out.push_str("...\n");
    out
}

fn is_compound(value: &Value) -> bool {
    matches!(value, Value::Map(_) | Value::List(_))
}

fn write_root(out: &mut String, value: &Value) {
    match value {
        Value::Empty => {}
        Value::Map(map) if !map.is_empty() => write_map_block(out, map, 0),
        Value::Map(_) => out.push_str("{}\n"),
        Value::List(items) => write_list_root(out, items, 0),
        scalar => {
            out.push_str(&render_scalar(scalar));
            out.push('\n');
        }
    }
}

/// Render a mapping's entries at `indent` (spec §4.6: "`key: value` per
/// entry").
fn write_map_block(out: &mut String, map: &indexmap::IndexMap<String, Value>, indent: usize) {
    for (key, v) in map {
        out.push_str(&" ".repeat(indent));
        out.push_str(key);
        out.push(':');
        write_map_value(out, v, indent);
    }
}

/// Render what follows `key:` — inline when the value is "simple" (a
/// scalar, or an empty collection), else a newline followed by children
/// indented by `indent + 4` (spec §4.6, map rendering rule).
fn write_map_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::Empty => out.push('\n'),
        Value::Map(map) if map.is_empty() => out.push_str(" {}\n"),
        Value::Map(map) => {
            out.push('\n');
            write_map_block(out, map, indent + 4);
        }
        Value::List(items) if items.is_empty() => out.push_str(" []\n"),
        Value::List(items) if items.iter().any(is_compound) => {
            out.push('\n');
            write_list_block(out, items, indent + 4);
        }
        Value::List(items) => {
            out.push(' ');
            out.push_str(&render_inline_list(items));
            out.push('\n');
        }
        scalar => {
            out.push(' ');
            out.push_str(&render_scalar(scalar));
            out.push('\n');
        }
    }
}

/// Render a top-level (or list-item) sequence: a list of non-compound
/// elements renders as `[ e1, e2, … ]`; a list containing a compound
/// element renders one `- ` per line (spec §4.6).
fn write_list_root(out: &mut String, items: &[Value], indent: usize) {
    if items.is_empty() {
        out.push_str(&" ".repeat(indent));
        out.push_str("[]\n");
    } else if items.iter().any(is_compound) {
        write_list_block(out, items, indent);
    } else {
        out.push_str(&" ".repeat(indent));
        out.push_str(&render_inline_list(items));
        out.push('\n');
    }
}

/// `[ e1, e2, … ]` (spec §4.6, "list of non-compound").
fn render_inline_list(items: &[Value]) -> String {
    let rendered: Vec<String> = items.iter().map(render_scalar).collect();
    format!("[ {} ]", rendered.join(", "))
}

/// One `- ` prefix per element, each element indented by `indent + 2`
/// (spec §4.6, "list of compound").
fn write_list_block(out: &mut String, items: &[Value], indent: usize) {
    for item in items {
        out.push_str(&" ".repeat(indent));
        out.push_str("- ");
        write_list_item(out, item, indent + 2);
    }
}

/// Render a sequence item's content after `- `: the first field of a
/// compound value shares the dash's line, later fields align under it.
fn write_list_item(out: &mut String, value: &Value, child_indent: usize) {
    match value {
        Value::Map(map) if !map.is_empty() => {
            let mut first = true;
            for (key, v) in map {
                if !first {
                    out.push_str(&" ".repeat(child_indent));
                }
                out.push_str(key);
                out.push(':');
                write_map_value(out, v, child_indent);
                first = false;
            }
        }
        Value::Map(_) => out.push_str("{}\n"),
        Value::List(items) if items.is_empty() => out.push_str("[]\n"),
        Value::List(items) if items.iter().any(is_compound) => {
            out.push('\n');
            write_list_block(out, items, child_indent);
        }
        Value::List(items) => {
            out.push_str(&render_inline_list(items));
            out.push('\n');
        }
        scalar => {
            out.push_str(&render_scalar(scalar));
            out.push('\n');
        }
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Empty => String::new(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => render_float(*f),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => render_string(s),
        Value::Map(_) | Value::List(_) => unreachable!("render_scalar called on a compound value"),
    }
}

/// A whole-number float still renders with a fractional part so re-parsing
/// classifies it as `float`, not `int` (spec §4.4's classification order).
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn render_string(s: &str) -> String {
    if needs_quoting(s) {
        let mut quoted = String::with_capacity(s.len() + 2);
        quoted.push('\'');
        for ch in s.chars() {
            if ch == '\'' {
                quoted.push_str("''");
            } else {
                quoted.push(ch);
            }
        }
        quoted.push('\'');
        quoted
    } else {
        s.to_string()
    }
}

/// Whether a string must be single-quoted to avoid being re-classified as
/// something other than a string on re-parse, or to avoid colliding with
/// block-structure or flow-collection punctuation.
fn needs_quoting(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    if parse_yaml_int(s).is_some() || s.parse::<f64>().is_ok() {
        return true;
    }
    if looks_like_bool(s).is_some() {
        return true;
    }
    if s.starts_with(' ') || s.ends_with(' ') {
        return true;
    }
    if s.starts_with('-') || s.starts_with('[') || s.starts_with('{') {
        return true;
    }
    s.contains(['\n', '\'', '"', '#', ',', ':'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn renders_a_flat_mapping() {
        let value = map(vec![
            ("a", Value::Int(1)),
            ("b", Value::String("two".to_string())),
        ]);
        assert_eq!(stringify(&value), "a: 1\nb: two\n");
    }

    #[test]
    fn renders_a_sequence_of_scalars_inline() {
        let value = Value::List(vec![
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ]);
        assert_eq!(stringify(&value), "[ a, b, c ]\n");
    }

    #[test]
    fn renders_a_sequence_of_mappings_as_a_block() {
        let value = Value::List(vec![map(vec![("a", Value::Int(1))])]);
        assert_eq!(stringify(&value), "- a: 1\n");
    }

    #[test]
    fn renders_a_nested_mapping_indented_by_four() {
        let value = map(vec![("outer", map(vec![("inner", Value::Int(1))]))]);
        assert_eq!(stringify(&value), "outer:\n    inner: 1\n");
    }

    #[test]
    fn renders_an_inline_list_nested_under_a_key() {
        let value = map(vec![(
            "a_list",
            Value::List(vec![Value::Int(0), Value::Float(1.0)]),
        )]);
        assert_eq!(stringify(&value), "a_list: [ 0, 1.0 ]\n");
    }

    #[test]
    fn quotes_strings_that_would_reclassify() {
        assert_eq!(render_string("42"), "'42'");
        assert_eq!(render_string("true"), "'true'");
        assert_eq!(render_string("yes"), "'yes'");
        assert_eq!(render_string("0x1A"), "'0x1A'");
        assert_eq!(render_string("plain"), "plain");
    }

    #[test]
    fn whole_number_floats_keep_a_decimal_point() {
        assert_eq!(render_float(3.0), "3.0");
        assert_eq!(render_float(3.5), "3.5");
    }

    #[test]
    fn wraps_a_document_with_a_directive_header() {
        let value = map(vec![("a", Value::Int(1))]);
        let rendered = stringify_document(&value, Some("example"));
        assert_eq!(rendered, "--- !example\na: 1\n...\n");
    }

    #[test]
    fn empty_map_roundtrips_through_braces() {
        let empty: IndexMap<String, Value> = IndexMap::new();
        assert_eq!(stringify(&Value::Map(empty)), "{}\n");
    }

    #[test]
    fn empty_list_roundtrips_through_brackets() {
        assert_eq!(stringify(&Value::List(Vec::new())), "[]\n");
    }
}
