//! JSON encoding with the escaping and numeric options export consumers
//! expect.

use std::io;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;
use serde::Serialize;
use serde_json::ser::{CharEscape, CompactFormatter, Formatter, PrettyFormatter};
use serde_json::{Number, Value as JsonValue};
use std::sync::OnceLock;

use crate::db::Value;
use crate::error::Result;

/// Encoding options for one output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Escape `<` and `>` as `\u003C` / `\u003E`.
    pub hex_tag: bool,
    /// Escape `"` inside strings as `\u0022`.
    pub hex_quot: bool,
    /// Encode strictly numeric strings as numbers.
    pub numeric_check: bool,
    /// Indent with four spaces.
    pub pretty: bool,
}

impl JsonOptions {
    pub const PLAIN: Self = Self {
        hex_tag: false,
        hex_quot: false,
        numeric_check: false,
        pretty: false,
    };

    pub const HTML_SAFE: Self = Self {
        hex_tag: true,
        hex_quot: true,
        ..Self::PLAIN
    };

    pub const NUMERIC: Self = Self {
        hex_tag: true,
        numeric_check: true,
        ..Self::PLAIN
    };

    pub const NUMERIC_PRETTY: Self = Self {
        pretty: true,
        ..Self::NUMERIC
    };
}

/// Serializer formatter that adds hex escapes on top of another formatter.
struct EscapingFormatter<F> {
    inner: F,
    options: JsonOptions,
}

impl<F: Formatter> Formatter for EscapingFormatter<F> {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !self.options.hex_tag {
            return self.inner.write_string_fragment(writer, fragment);
        }

        let mut start = 0;
        for (index, c) in fragment.char_indices() {
            let escape: &[u8] = match c {
                '<' => b"\\u003C",
                '>' => b"\\u003E",
                _ => continue,
            };
            self.inner
                .write_string_fragment(writer, &fragment[start..index])?;
            writer.write_all(escape)?;
            start = index + c.len_utf8();
        }
        self.inner.write_string_fragment(writer, &fragment[start..])
    }

    fn write_char_escape<W>(&mut self, writer: &mut W, char_escape: CharEscape) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        match char_escape {
            CharEscape::Quote if self.options.hex_quot => writer.write_all(b"\\u0022"),
            other => self.inner.write_char_escape(writer, other),
        }
    }

    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

/// Encodes `value` with the given options.
pub fn encode_json<T: Serialize>(value: &T, options: JsonOptions) -> Result<Vec<u8>> {
    let mut json = serde_json::to_value(value)?;
    if options.numeric_check {
        json = numeric_check(json);
    }

    let mut out = Vec::new();
    if options.pretty {
        let formatter = EscapingFormatter {
            inner: PrettyFormatter::with_indent(b"    "),
            options,
        };
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        json.serialize(&mut serializer)?;
    } else {
        let formatter = EscapingFormatter {
            inner: CompactFormatter,
            options,
        };
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        json.serialize(&mut serializer)?;
    }
    Ok(out)
}

/// Parses a strictly numeric string (`42`, `-1.5`, `2e3`).
pub fn parse_numeric(text: &str) -> Option<Number> {
    static NUMERIC_RE: OnceLock<Regex> = OnceLock::new();
    let numeric_re = NUMERIC_RE.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$").expect("valid numeric regex")
    });

    if !numeric_re.is_match(text) {
        return None;
    }
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    text.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Replaces numeric strings with numbers, recursively. Object keys are
/// left alone.
fn numeric_check(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::String(text) => match parse_numeric(&text) {
            Some(number) => JsonValue::Number(number),
            None => JsonValue::String(text),
        },
        JsonValue::Array(items) => JsonValue::Array(items.into_iter().map(numeric_check).collect()),
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(key, value)| (key, numeric_check(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Converts a stored value to JSON; bytes become base64 text and
/// non-finite floats become null.
pub fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Bytes(bytes) => JsonValue::String(STANDARD.encode(bytes)),
        Value::List(items) => JsonValue::Array(items.iter().map(value_to_json).collect()),
    }
}
