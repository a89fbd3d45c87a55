pub mod error;
pub use error::JsonError;

use tree_sitter::Node;
use std::ops::Index;
use std::collections::HashMap;
use logger_proc_macro::log;

// Enum to represent JSON values
#[derive(Debug, PartialEq)]
pub enum JsonValue {
    Object(HashMap<String, JsonValue>),
    Array(Vec<JsonValue>),
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

static NULL: JsonValue = JsonValue::Null;

impl JsonValue {
    pub fn as_str(&self) -> Option<&str> {
        if let JsonValue::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        if let JsonValue::Number(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn as_array(&self) -> Option<&Vec<JsonValue>> {
        if let JsonValue::Array(arr) = self {
            Some(arr)
        } else {
            None
        }
    }

    pub fn as_object(&self) -> Option<&HashMap<String, JsonValue>> {
        if let JsonValue::Object(obj) = self {
            Some(obj)
        } else {
            None
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        if let JsonValue::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }
}

// Implement indexing for JsonValue to use the [] operator
impl Index<&str> for JsonValue {
    type Output = JsonValue;

    fn index(&self, key: &str) -> &Self::Output {
        match self {
            JsonValue::Object(map) => map.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

impl Index<usize> for JsonValue {
    type Output = JsonValue;

    fn index(&self, index: usize) -> &Self::Output {
        match self {
            JsonValue::Array(arr) => arr.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

/// JSON reader built on the tree-sitter JSON grammar.
///
/// Documents containing syntax errors are rejected as a whole; the grammar's
/// error recovery is not used to guess at partial values.
pub struct JsonParser {
    parser: tree_sitter::Parser,
}

impl JsonParser {
    pub fn new() -> Result<Self, JsonError> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(tree_sitter_json::language()).map_err(|_| JsonError::Language)?;
        Ok(JsonParser { parser })
    }

    #[log(trace)]
    pub fn parse(&mut self, code: &str) -> Result<JsonValue, JsonError> {
        let tree = self.parser.parse(code, None).ok_or(JsonError::ParseError)?;
        let root_node = tree.root_node();

        let json_obj = root_node.named_child(0).ok_or(JsonError::BrokenTree)?;
        if root_node.has_error() {
            return Err(JsonError::ParseError);
        }

        Self::parse_json_node(json_obj, code)
    }

    pub fn parse_json_node(node: Node, code: &str) -> Result<JsonValue, JsonError> {
        match node.kind() {
            "object" => {
                let mut object = HashMap::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "pair" {
                        let (key, value) = Self::parse_pair(child, code)?;
                        object.insert(key, value);
                    }
                }
                Ok(JsonValue::Object(object))
            }
            "array" => {
                let mut array = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() != "comment" {
                        array.push(Self::parse_json_node(child, code)?);
                    }
                }
                Ok(JsonValue::Array(array))
            }
            "string" => Ok(JsonValue::String(Self::string_contents(node, code)?)),
            "number" => {
                let value = &code[node.start_byte()..node.end_byte()];
                Ok(JsonValue::Number(value.parse()?))
            }
            "true" => Ok(JsonValue::Bool(true)),
            "false" => Ok(JsonValue::Bool(false)),
            "null" => Ok(JsonValue::Null),
            _ => Err(JsonError::ParseError),
        }
    }

    pub fn parse_pair(node: Node, code: &str) -> Result<(String, JsonValue), JsonError> {
        let key_node = node.child_by_field_name("key").ok_or(JsonError::ParseError)?;
        let value_node = node.child_by_field_name("value").ok_or(JsonError::ParseError)?;

        let key = Self::string_contents(key_node, code)?;
        let value = Self::parse_json_node(value_node, code)?;
        Ok((key, value))
    }

    fn string_contents(node: Node, code: &str) -> Result<String, JsonError> {
        if node.kind() != "string" || node.end_byte() - node.start_byte() < 2 {
            return Err(JsonError::ParseError);
        }
        // strip the surrounding quotes
        unescape(&code[node.start_byte() + 1..node.end_byte() - 1])
    }
}

fn unescape(raw: &str) -> Result<String, JsonError> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }

        match chars.next() {
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some('/') => result.push('/'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('u') => result.push(read_unicode_escape(&mut chars)?),
            Some(other) => return Err(JsonError::InvalidEscape(format!("\\{}", other))),
            None => return Err(JsonError::InvalidEscape("\\".to_string())),
        }
    }

    Ok(result)
}

fn read_unicode_escape(chars: &mut std::str::Chars) -> Result<char, JsonError> {
    let high = read_hex4(chars)?;

    let code_point = if (0xD800..0xDC00).contains(&high) {
        if chars.next() != Some('\\') || chars.next() != Some('u') {
            return Err(JsonError::InvalidEscape(format!("\\u{:04x}", high)));
        }
        let low = read_hex4(chars)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(JsonError::InvalidEscape(format!("\\u{:04x}\\u{:04x}", high, low)));
        }
        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
    } else {
        high
    };

    char::from_u32(code_point).ok_or_else(|| JsonError::InvalidEscape(format!("\\u{:04x}", code_point)))
}

fn read_hex4(chars: &mut std::str::Chars) -> Result<u32, JsonError> {
    let hex: String = chars.by_ref().take(4).collect();
    if hex.len() != 4 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(JsonError::InvalidEscape(format!("\\u{}", hex)));
    }
    u32::from_str_radix(&hex, 16).map_err(|_| JsonError::InvalidEscape(format!("\\u{}", hex)))
}
