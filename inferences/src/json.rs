//! JSON in the layout serverless callers already parse: `", "` and `": "`
//! separators, `\uXXXX` for non-ASCII, floats like `1e-05` and `1.0`.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

#[derive(Debug, Default, Clone, Copy)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

// Shortest round-trip digits; scientific below 1e-4 and from 1e16 up, with a
// signed two-digit exponent.
fn float_repr(value: f64) -> String {
    let scientific = format!("{:e}", value);
    let parsed = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));

    match parsed {
        Some((mantissa, exp)) if !(-4..16).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => {
            let mut plain = value.to_string();
            if !plain.contains('.') {
                plain.push_str(".0");
            }
            plain
        }
    }
}

pub fn to_string<T: ?Sized + Serialize>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| <serde_json::Error as serde::ser::Error>::custom(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spaced_separators() {
        assert_eq!(
            to_string(&json!({"error": "No image provided"})).unwrap(),
            r#"{"error": "No image provided"}"#
        );
        assert_eq!(to_string(&json!([1, 2, [3]])).unwrap(), "[1, 2, [3]]");
        assert_eq!(to_string(&json!({})).unwrap(), "{}");
    }

    #[test]
    fn escapes_non_ascii() {
        assert_eq!(to_string("café").unwrap(), r#""caf\u00e9""#);
        assert_eq!(to_string("🌲").unwrap(), r#""\ud83c\udf32""#);
        assert_eq!(to_string("a\"b\n").unwrap(), r#""a\"b\n""#);
    }

    #[test]
    fn floats_match_python_repr() {
        let cases = [
            (0.0, "0.0"),
            (1.0, "1.0"),
            (0.5, "0.5"),
            (0.0001, "0.0001"),
            (0.00001, "1e-05"),
            (1.5e-7, "1.5e-07"),
            (2.5e-123, "2.5e-123"),
            (0.8f32 as f64, "0.800000011920929"),
            (1e15, "1000000000000000.0"),
            (1e16, "1e+16"),
            (-0.25, "-0.25"),
        ];
        for (value, expected) in cases {
            assert_eq!(to_string(&value).unwrap(), expected, "{value:e}");
        }
        assert_eq!(
            to_string(&json!({"sea": 0.00001, "street": 0.99999})).unwrap(),
            r#"{"sea": 1e-05, "street": 0.99999}"#
        );
    }

    #[test]
    fn output_still_parses() {
        let value = json!({"predicted_class": "glacier", "scores": [0.5, 0.25]});
        let text = to_string(&value).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, value);
    }
}
