//! Parsing of list literals stored as metadata strings.
//!
//! Catalogue values such as `"['Cohort', 'Registry']"` or `"[1, 2, 3]"` are
//! written either as JSON or with Python literal syntax. Both are accepted:
//! quoted strings in either quote style (with `u`, `r` and `b` prefixes and
//! backslash escapes), integers, floats, `True`, `False`, `None`, nested lists,
//! tuples and string-keyed mappings. Tuples become arrays.

use serde_json::{Map, Number, Value};

/// True when the value should be treated as a list literal.
pub fn looks_like_list(raw: &str) -> bool {
    raw.starts_with('[') && raw.ends_with(']')
}

/// Parses a list literal, returning `None` when it is malformed.
pub fn parse_list_literal(raw: &str) -> Option<Value> {
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }
    let mut parser = Parser {
        chars: raw.chars().collect(),
        pos: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() || !value.is_array() {
        return None;
    }
    Some(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_whitespace();
        match self.peek()? {
            '[' => self.sequence(),
            '(' => self.tuple(),
            '{' => self.mapping(),
            '\'' | '"' => self.string(false).map(Value::String),
            ch if ch == '-' || ch == '+' || ch.is_ascii_digit() || ch == '.' => self.number(),
            ch if ch.is_ascii_alphabetic() => self.keyword(),
            _ => None,
        }
    }

    fn sequence(&mut self) -> Option<Value> {
        self.bump();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            if self.peek()? == ']' {
                self.bump();
                return Some(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.bump()? {
                ',' => continue,
                ']' => return Some(Value::Array(items)),
                _ => return None,
            }
        }
    }

    /// `(1, 2)` and `(1,)` are tuples; `(1)` is just the parenthesized value.
    fn tuple(&mut self) -> Option<Value> {
        self.bump();
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek()? == ')' {
                self.bump();
                break;
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.bump()? {
                ',' => trailing_comma = true,
                ')' => {
                    trailing_comma = false;
                    break;
                }
                _ => return None,
            }
        }
        if items.len() == 1 && !trailing_comma {
            return items.pop();
        }
        Some(Value::Array(items))
    }

    fn mapping(&mut self) -> Option<Value> {
        self.bump();
        let mut map = Map::new();
        loop {
            self.skip_whitespace();
            if self.peek()? == '}' {
                self.bump();
                return Some(Value::Object(map));
            }
            let key = match self.value()? {
                Value::String(key) => key,
                other => other.to_string(),
            };
            self.skip_whitespace();
            if self.bump()? != ':' {
                return None;
            }
            let value = self.value()?;
            map.insert(key, value);
            self.skip_whitespace();
            match self.bump()? {
                ',' => continue,
                '}' => return Some(Value::Object(map)),
                _ => return None,
            }
        }
    }

    fn string(&mut self, raw: bool) -> Option<String> {
        let quote = self.bump()?;
        let triple = self.peek() == Some(quote) && self.chars.get(self.pos + 1) == Some(&quote);
        if triple {
            self.pos += 2;
        }
        let mut out = String::new();
        loop {
            match self.bump()? {
                '\\' if raw => {
                    out.push('\\');
                    out.push(self.bump()?);
                }
                '\\' => self.escape(&mut out)?,
                ch if ch == quote && !triple => return Some(out),
                ch if ch == quote && self.closes_triple(quote) => {
                    self.pos += 2;
                    return Some(out);
                }
                '\n' if !triple => return None,
                ch => out.push(ch),
            }
        }
    }

    fn closes_triple(&self, quote: char) -> bool {
        self.peek() == Some(quote) && self.chars.get(self.pos + 1) == Some(&quote)
    }

    /// Decodes the escape after a backslash. Unknown escapes keep the
    /// backslash.
    fn escape(&mut self, out: &mut String) -> Option<()> {
        let decoded = match self.bump()? {
            '\n' => return Some(()),
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            'x' => self.code_point(2)?,
            'u' => self.code_point(4)?,
            'U' => self.code_point(8)?,
            digit @ '0'..='7' => {
                let mut code = digit.to_digit(8)?;
                for _ in 0..2 {
                    match self.peek().and_then(|ch| ch.to_digit(8)) {
                        Some(next) => {
                            code = code * 8 + next;
                            self.pos += 1;
                        }
                        None => break,
                    }
                }
                char::from_u32(code)?
            }
            'N' => return None,
            other => {
                out.push('\\');
                other
            }
        };
        out.push(decoded);
        Some(())
    }

    /// Reads exactly `digits` hex digits as a code point.
    fn code_point(&mut self, digits: usize) -> Option<char> {
        let end = self.pos + digits;
        let hex: String = self.chars.get(self.pos..end)?.iter().collect();
        if !hex.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return None;
        }
        self.pos = end;
        char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '+' | '.' | '_'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos]
            .iter()
            .filter(|ch| **ch != '_')
            .collect();
        if let Ok(int) = text.parse::<i64>() {
            return Some(Value::from(int));
        }
        let float = text.parse::<f64>().ok()?;
        Number::from_f64(float).map(Value::Number)
    }

    fn keyword(&mut self) -> Option<Value> {
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        if matches!(self.peek(), Some('\'' | '"')) {
            let prefix = word.to_ascii_lowercase();
            return match prefix.as_str() {
                "u" | "b" => self.string(false).map(Value::String),
                "r" | "br" | "rb" => self.string(true).map(Value::String),
                _ => None,
            };
        }
        match word.as_str() {
            "True" | "true" => Some(Value::Bool(true)),
            "False" | "false" => Some(Value::Bool(false)),
            "None" | "null" => Some(Value::Null),
            _ => None,
        }
    }
}
