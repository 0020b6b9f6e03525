//! Recursive-descent JSON reader producing CBOR values.
//!
//! Every `parse_*` step returns the parsed value together with the next significant character
//! after it, so callers never skip whitespace twice.

use log::debug;

use crate::json::number::{is_number_char, parse_json_number};
use crate::limits::JSON_MAX_DEPTH;
use crate::options::JsonOptions;
use crate::text::CharacterInput;
use crate::{CborError, CborMap, CborValue, ErrorCode};

pub(crate) struct JsonParser<'o, I> {
    input: I,
    options: &'o JsonOptions,
    peeked: Option<char>,
    depth: usize,
}

type Step = (CborValue, Option<char>);

const fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn hex_value(c: char) -> Option<u16> {
    c.to_digit(16).and_then(|d| u16::try_from(d).ok())
}

impl<'o, I: CharacterInput> JsonParser<'o, I> {
    pub(crate) const fn new(input: I, options: &'o JsonOptions) -> Self {
        Self {
            input,
            options,
            peeked: None,
            depth: 0,
        }
    }

    fn err(&self, code: ErrorCode) -> CborError {
        debug!("json: {code:?} at character {}", self.input.position());
        CborError::new(code, self.input.position())
    }

    fn next_char(&mut self) -> Result<Option<char>, CborError> {
        match self.peeked.take() {
            Some(c) => Ok(Some(c)),
            None => self.input.read_char(),
        }
    }

    fn next_significant(&mut self) -> Result<Option<char>, CborError> {
        loop {
            match self.next_char()? {
                Some(c) if is_whitespace(c) => {}
                other => return Ok(other),
            }
        }
    }

    /// Parse a complete document: exactly one value surrounded by optional whitespace.
    pub(crate) fn parse_document(mut self) -> Result<CborValue, CborError> {
        let first = self.next_significant()?;
        let (value, next) = self.parse_value(first)?;
        if next.is_some() {
            return Err(self.err(ErrorCode::JsonTrailingData));
        }
        Ok(value)
    }

    fn parse_value(&mut self, first: Option<char>) -> Result<Step, CborError> {
        match first {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => {
                let s = self.parse_string()?;
                Ok((CborValue::Text(s), self.next_significant()?))
            }
            Some('t') => self.parse_literal("rue", CborValue::Bool(true)),
            Some('f') => self.parse_literal("alse", CborValue::Bool(false)),
            Some('n') => self.parse_literal("ull", CborValue::Null),
            Some(c @ ('-' | '0'..='9')) => self.parse_number(c),
            _ => Err(self.err(ErrorCode::JsonSyntax)),
        }
    }

    fn parse_literal(&mut self, rest: &str, value: CborValue) -> Result<Step, CborError> {
        for expected in rest.chars() {
            if self.next_char()? != Some(expected) {
                return Err(self.err(ErrorCode::JsonSyntax));
            }
        }
        Ok((value, self.next_significant()?))
    }

    fn parse_number(&mut self, first: char) -> Result<Step, CborError> {
        let mut text = String::new();
        text.push(first);
        let mut next = self.next_char()?;
        while let Some(c) = next.filter(|c| is_number_char(*c)) {
            text.push(c);
            next = self.next_char()?;
        }
        if next.is_some_and(is_whitespace) {
            next = self.next_significant()?;
        }
        let number =
            parse_json_number(&text, self.options).ok_or_else(|| self.err(ErrorCode::JsonInvalidNumber))?;
        Ok((number.to_value(), next))
    }

    fn enter(&mut self) -> Result<(), CborError> {
        if self.depth >= JSON_MAX_DEPTH {
            return Err(self.err(ErrorCode::JsonNestingTooDeep));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Step, CborError> {
        self.enter()?;
        let mut items = Vec::new();
        let mut c = self.next_significant()?;
        if c == Some(']') {
            self.depth -= 1;
            return Ok((CborValue::Array(items), self.next_significant()?));
        }
        loop {
            let (value, next) = self.parse_value(c)?;
            items.push(value);
            match next {
                Some(',') => {
                    c = self.next_significant()?;
                    if c == Some(']') {
                        return Err(self.err(ErrorCode::JsonTrailingComma));
                    }
                }
                Some(']') => break,
                _ => return Err(self.err(ErrorCode::JsonSyntax)),
            }
        }
        self.depth -= 1;
        Ok((CborValue::Array(items), self.next_significant()?))
    }

    fn parse_object(&mut self) -> Result<Step, CborError> {
        self.enter()?;
        let mut map = CborMap::new();
        let mut c = self.next_significant()?;
        if c == Some('}') {
            self.depth -= 1;
            return Ok((CborValue::Map(map), self.next_significant()?));
        }
        loop {
            if c != Some('"') {
                return Err(self.err(ErrorCode::JsonSyntax));
            }
            let key = CborValue::Text(self.parse_string()?);
            if self.next_significant()? != Some(':') {
                return Err(self.err(ErrorCode::JsonSyntax));
            }
            let first = self.next_significant()?;
            let (value, next) = self.parse_value(first)?;
            if !self.options.allow_duplicate_keys && map.contains_key(&key) {
                return Err(self.err(ErrorCode::DuplicateMapKey));
            }
            map.insert(key, value);
            match next {
                Some(',') => {
                    c = self.next_significant()?;
                    if c == Some('}') {
                        return Err(self.err(ErrorCode::JsonTrailingComma));
                    }
                }
                Some('}') => break,
                _ => return Err(self.err(ErrorCode::JsonSyntax)),
            }
        }
        self.depth -= 1;
        Ok((CborValue::Map(map), self.next_significant()?))
    }

    fn read_hex4(&mut self) -> Result<u16, CborError> {
        let mut unit = 0u16;
        for _ in 0..4 {
            let digit = self
                .next_char()?
                .and_then(hex_value)
                .ok_or_else(|| self.err(ErrorCode::JsonInvalidEscape))?;
            unit = (unit << 4) | digit;
        }
        Ok(unit)
    }

    fn unpaired(&self, out: &mut String) -> Result<(), CborError> {
        if self.options.replace_surrogates {
            out.push(char::REPLACEMENT_CHARACTER);
            Ok(())
        } else {
            Err(self.err(ErrorCode::JsonUnpairedSurrogate))
        }
    }

    /// Handle the escape after `\u`, including a following low surrogate.
    fn parse_unicode_escape(&mut self, out: &mut String) -> Result<(), CborError> {
        let mut unit = self.read_hex4()?;
        loop {
            match unit {
                0xd800..=0xdbff => {
                    match self.next_char()? {
                        Some('\\') => {}
                        Some(other) => {
                            self.unpaired(out)?;
                            self.peeked = Some(other);
                            return Ok(());
                        }
                        None => return Err(self.err(ErrorCode::JsonSyntax)),
                    }
                    match self.next_char()? {
                        Some('u') => {}
                        Some(other) => {
                            self.unpaired(out)?;
                            return self.simple_escape(other, out);
                        }
                        None => return Err(self.err(ErrorCode::JsonSyntax)),
                    }
                    let low = self.read_hex4()?;
                    if (0xdc00..=0xdfff).contains(&low) {
                        let cp = 0x1_0000
                            + ((u32::from(unit) - 0xd800) << 10)
                            + (u32::from(low) - 0xdc00);
                        out.push(char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER));
                        return Ok(());
                    }
                    self.unpaired(out)?;
                    unit = low;
                }
                0xdc00..=0xdfff => return self.unpaired(out),
                _ => {
                    out.push(char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER));
                    return Ok(());
                }
            }
        }
    }

    fn simple_escape(&self, c: char, out: &mut String) -> Result<(), CborError> {
        let decoded = match c {
            '"' => '"',
            '\\' => '\\',
            '/' => '/',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            _ => return Err(self.err(ErrorCode::JsonInvalidEscape)),
        };
        out.push(decoded);
        Ok(())
    }

    /// Parse string contents after the opening quote, consuming the closing quote.
    fn parse_string(&mut self) -> Result<String, CborError> {
        let mut out = String::new();
        loop {
            match self.next_char()? {
                None => return Err(self.err(ErrorCode::JsonSyntax)),
                Some('"') => return Ok(out),
                Some('\\') => match self.next_char()? {
                    Some('u') => self.parse_unicode_escape(&mut out)?,
                    Some(c) => self.simple_escape(c, &mut out)?,
                    None => return Err(self.err(ErrorCode::JsonSyntax)),
                },
                Some(c) if c < '\u{20}' => return Err(self.err(ErrorCode::JsonControlCharacter)),
                Some(c) => out.push(c),
            }
        }
    }
}
