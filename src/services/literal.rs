//! Safe parser for serialized-list cells.
//!
//! The recommendation files store nested movie lists as Python literal text
//! (`[{'title': 'Heat', 'imdbId': 'tt0113277'}]`). This module reads that
//! syntax into a [`serde_json::Value`] without evaluating anything: only
//! literals are accepted, and names, calls or operators are parse errors.
use serde_json::{Map, Number, Value};

/// Maximum container nesting accepted before bailing out
const MAX_DEPTH: usize = 128;

/// A parse failure, with the byte offset where it was detected
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}

/// Parses a literal expression (lists, tuples, dicts, strings, numbers,
/// `True`, `False`, `None`) into a JSON value.
///
/// Tuples become arrays. Non-string dict keys are stored under their printed
/// form, e.g. `{1: 'a'}` becomes `{"1": "a"}`.
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = Parser {
        src: input,
        pos: 0,
        depth: 0,
    };
    parser.skip_ws();
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

/// Renders a scalar the way it was written in the source data.
///
/// Strings are returned verbatim; numbers, booleans and null use the
/// literal spelling (`3`, `2.5`, `True`, `None`).
pub fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> LiteralError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> LiteralError {
        LiteralError {
            offset,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn enter(&mut self) -> Result<(), LiteralError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('[') => self.parse_sequence('[', ']'),
            Some('(') => self.parse_sequence('(', ')'),
            Some('{') => self.parse_dict(),
            Some('\'') | Some('"') => self.parse_string(false),
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_word(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    /// Lists and tuples. A parenthesized single value without a trailing
    /// comma is just that value, as in `(1)`.
    fn parse_sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.eat(open);
        self.enter()?;

        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_ws();
            if self.eat(close) {
                break;
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            if self.eat(',') {
                trailing_comma = true;
                continue;
            }
            trailing_comma = false;
            if self.eat(close) {
                break;
            }
            return Err(self.error(format!("expected ',' or '{}'", close)));
        }

        self.leave();
        if open == '(' && items.len() == 1 && !trailing_comma {
            return Ok(items.remove(0));
        }
        Ok(Value::Array(items))
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.eat('{');
        self.enter()?;

        let mut map = Map::new();
        loop {
            self.skip_ws();
            if self.eat('}') {
                break;
            }
            let key_start = self.pos;
            let key = self.parse_value()?;
            let key = dict_key(key).ok_or_else(|| self.error_at(key_start, "unsupported dict key"))?;
            self.skip_ws();
            if !self.eat(':') {
                return Err(self.error("expected ':' after dict key"));
            }
            self.skip_ws();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat('}') {
                break;
            }
            return Err(self.error("expected ',' or '}'"));
        }

        self.leave();
        Ok(Value::Object(map))
    }

    /// `True`, `False`, `None`, or a prefixed string such as `u'...'`
    fn parse_word(&mut self) -> Result<Value, LiteralError> {
        if let Some((len, raw)) = self.string_prefix() {
            self.pos += len;
            return self.parse_string(raw);
        }

        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        match &self.src[start..self.pos] {
            "True" => Ok(Value::Bool(true)),
            "False" => Ok(Value::Bool(false)),
            "None" => Ok(Value::Null),
            word => Err(self.error_at(start, format!("name '{}' is not a literal", word))),
        }
    }

    /// Detects a string prefix (`r`, `u`, `b`, `rb`, `br`) directly followed
    /// by a quote. Returns the prefix length and whether it is raw.
    fn string_prefix(&self) -> Option<(usize, bool)> {
        let rest = self.rest();
        let prefix_len = rest
            .chars()
            .take_while(|c| matches!(c, 'r' | 'R' | 'u' | 'U' | 'b' | 'B'))
            .count();
        if prefix_len == 0 || prefix_len > 2 {
            return None;
        }
        let prefix = &rest[..prefix_len];
        if !matches!(rest[prefix_len..].chars().next(), Some('\'') | Some('"')) {
            return None;
        }
        let lower = prefix.to_ascii_lowercase();
        let valid = matches!(lower.as_str(), "r" | "u" | "b" | "rb" | "br");
        valid.then(|| (prefix_len, lower.contains('r')))
    }

    /// A string literal plus any adjacent literals it concatenates with
    fn parse_string(&mut self, raw: bool) -> Result<Value, LiteralError> {
        let mut out = String::new();
        self.parse_string_body(raw, &mut out)?;

        loop {
            let save = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('\'') | Some('"') => self.parse_string_body(false, &mut out)?,
                Some(_) => match self.string_prefix() {
                    Some((len, raw)) => {
                        self.pos += len;
                        self.parse_string_body(raw, &mut out)?;
                    }
                    None => {
                        self.pos = save;
                        break;
                    }
                },
                None => {
                    self.pos = save;
                    break;
                }
            }
        }

        Ok(Value::String(out))
    }

    fn parse_string_body(&mut self, raw: bool, out: &mut String) -> Result<(), LiteralError> {
        let start = self.pos;
        let quote = match self.bump() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error_at(start, "expected a string")),
        };
        let pair = if quote == '\'' { "''" } else { "\"\"" };
        let triple = self.rest().starts_with(pair);
        if triple {
            self.pos += 2;
        }

        loop {
            let c = self
                .bump()
                .ok_or_else(|| self.error_at(start, "unterminated string"))?;
            if c == quote {
                if !triple {
                    return Ok(());
                }
                if self.rest().starts_with(pair) {
                    self.pos += 2;
                    return Ok(());
                }
                out.push(c);
                continue;
            }
            if c == '\n' && !triple {
                return Err(self.error_at(start, "unterminated string"));
            }
            if c == '\\' {
                if raw {
                    out.push('\\');
                    if let Some(next) = self.bump() {
                        out.push(next);
                    }
                } else {
                    self.parse_escape(out)?;
                }
                continue;
            }
            out.push(c);
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        let c = self.bump().ok_or_else(|| self.error("unterminated string"))?;
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code)?);
            }
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                // unknown escapes are kept as written
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, LiteralError> {
        let start = self.pos;
        let mut code = 0u32;
        for _ in 0..digits {
            let d = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error_at(start, "truncated hex escape"))?;
            code = code * 16 + d;
            self.bump();
        }
        self.code_point(code)
    }

    fn code_point(&self, code: u32) -> Result<char, LiteralError> {
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {:#x}", code)))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let negative = match self.peek() {
            Some('-') => {
                self.bump();
                true
            }
            Some('+') => {
                self.bump();
                false
            }
            _ => false,
        };
        self.skip_ws();

        let token_start = self.pos;
        if !matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            return Err(self.error("expected a number"));
        }
        let radix_prefixed = {
            let rest = self.rest().as_bytes();
            rest.len() > 1 && rest[0] == b'0' && matches!(rest[1], b'x' | b'X' | b'o' | b'O' | b'b' | b'B')
        };
        let mut prev = '\0';
        while let Some(c) = self.peek() {
            let sign_in_exponent = !radix_prefixed && matches!(c, '+' | '-') && matches!(prev, 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || sign_in_exponent {
                prev = c;
                self.bump();
            } else {
                break;
            }
        }

        let text: String = self.src[token_start..self.pos]
            .chars()
            .filter(|c| *c != '_')
            .collect();
        let invalid = || self.error_at(start, format!("invalid number '{}'", &self.src[start..self.pos]));

        let lower = text.to_ascii_lowercase();
        let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
            .into_iter()
            .find_map(|(prefix, radix)| lower.strip_prefix(prefix).map(|digits| (digits, radix)));

        // signed before narrowing so i64::MIN stays an integer
        let signed = |n: i128| i64::try_from(if negative { -n } else { n });

        if let Some((digits, radix)) = radix {
            let n = i128::from_str_radix(digits, radix).map_err(|_| invalid())?;
            return signed(n).map(Value::from).map_err(|_| invalid());
        }

        let is_float = lower.contains('.') || lower.contains('e');
        if !is_float {
            if let Some(n) = lower.parse::<i128>().ok().and_then(|n| signed(n).ok()) {
                return Ok(Value::from(n));
            }
        }

        // floats, and integers too wide for i64
        if !lower.chars().all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | '+' | '-')) {
            return Err(invalid());
        }
        let f: f64 = lower.parse().map_err(|_| invalid())?;
        let f = if negative { -f } else { f };
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| self.error_at(start, "number is not finite"))
    }
}

fn dict_key(key: Value) -> Option<String> {
    match key {
        Value::Array(_) | Value::Object(_) => None,
        scalar => Some(display_scalar(&scalar)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_movie_list() {
        let value =
            parse_literal("[{'title':'Inception','genre':'Sci-Fi','imdbId':'tt1375666'}]").unwrap();
        assert_eq!(
            value,
            json!([{"title": "Inception", "genre": "Sci-Fi", "imdbId": "tt1375666"}])
        );
    }

    #[test]
    fn test_parse_nested_list_of_lists() {
        let value = parse_literal(
            "[[{'title': 'Heat (1995)', 'imdbId': 113277}], ['Action', 'Crime']]",
        )
        .unwrap();
        assert_eq!(value[0][0]["title"], "Heat (1995)");
        assert_eq!(value[0][0]["imdbId"], 113277);
        assert_eq!(value[1], json!(["Action", "Crime"]));
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_literal("True").unwrap(), json!(true));
        assert_eq!(parse_literal("False").unwrap(), json!(false));
        assert_eq!(parse_literal("None").unwrap(), Value::Null);
        assert_eq!(parse_literal("-42").unwrap(), json!(-42));
        assert_eq!(parse_literal("1_000").unwrap(), json!(1000));
        assert_eq!(parse_literal("3.5").unwrap(), json!(3.5));
        assert_eq!(parse_literal("1e3").unwrap(), json!(1000.0));
        assert_eq!(parse_literal("0x1f").unwrap(), json!(31));
    }

    #[test]
    fn test_integer_bounds() {
        assert_eq!(
            parse_literal("-9223372036854775808").unwrap(),
            json!(i64::MIN)
        );
        assert_eq!(
            parse_literal("9223372036854775807").unwrap(),
            json!(i64::MAX)
        );
        assert_eq!(parse_literal("-0x8000000000000000").unwrap(), json!(i64::MIN));

        let wide = parse_literal("99999999999999999999").unwrap();
        assert!(wide.is_f64());
        assert_eq!(wide.as_f64(), Some(1e20));

        let wide = parse_literal("9223372036854775808").unwrap();
        assert!(wide.is_f64());
    }

    #[test]
    fn test_parse_tuples() {
        assert_eq!(parse_literal("('a', 'b')").unwrap(), json!(["a", "b"]));
        assert_eq!(parse_literal("(1,)").unwrap(), json!([1]));
        assert_eq!(parse_literal("()").unwrap(), json!([]));
        assert_eq!(parse_literal("(1)").unwrap(), json!(1));
    }

    #[test]
    fn test_parse_string_escapes() {
        assert_eq!(
            parse_literal(r#"'Schindler\'s List'"#).unwrap(),
            json!("Schindler's List")
        );
        assert_eq!(
            parse_literal(r#""Amélie (2001)""#).unwrap(),
            json!("Amélie (2001)")
        );
        assert_eq!(parse_literal(r"'a\tb\x41\u00e9'").unwrap(), json!("a\tbAé"));
        assert_eq!(parse_literal(r"r'C:\dir'").unwrap(), json!(r"C:\dir"));
        assert_eq!(parse_literal("'ab' 'cd'").unwrap(), json!("abcd"));
        assert_eq!(parse_literal("'''it's'''").unwrap(), json!("it's"));
        assert_eq!(parse_literal("''").unwrap(), json!(""));
    }

    #[test]
    fn test_non_string_dict_keys() {
        let value = parse_literal("{1: 'one', None: 'none', 2.5: 'x'}").unwrap();
        assert_eq!(value["1"], "one");
        assert_eq!(value["None"], "none");
        assert_eq!(value["2.5"], "x");
    }

    #[test]
    fn test_trailing_commas_and_whitespace() {
        let value = parse_literal("  [ 1 ,\n 2 , ]  ").unwrap();
        assert_eq!(value, json!([1, 2]));
        let value = parse_literal("{'a': 1,}").unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_rejects_code() {
        assert!(parse_literal("__import__('os').system('ls')").is_err());
        assert!(parse_literal("open('/etc/passwd').read()").is_err());
        assert!(parse_literal("[1 + 1]").is_err());
        assert!(parse_literal("[x for x in range(3)]").is_err());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse_literal("").is_err());
        assert!(parse_literal("[1, 2").is_err());
        assert!(parse_literal("[1,,2]").is_err());
        assert!(parse_literal("'unterminated").is_err());
        assert!(parse_literal("{'a' 1}").is_err());
        assert!(parse_literal("{1, 2}").is_err());
        assert!(parse_literal("[1] [2]").is_err());
        assert!(parse_literal("[[1], 2]]").is_err());
    }

    #[test]
    fn test_error_reports_offset() {
        let err = parse_literal("[1, foo]").unwrap_err();
        assert_eq!(err.offset, 4);
        assert!(err.message.contains("foo"));
    }

    #[test]
    fn test_rejects_deep_nesting() {
        let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(parse_literal(&deep).is_err());

        let ok = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&ok).is_ok());
    }

    #[test]
    fn test_display_scalar() {
        assert_eq!(display_scalar(&json!("tt0113277")), "tt0113277");
        assert_eq!(display_scalar(&json!(113277)), "113277");
        assert_eq!(display_scalar(&json!(true)), "True");
        assert_eq!(display_scalar(&Value::Null), "None");
    }
}
