//! A small s-expression reader for tests: integers, floats, strings,
//! symbols, `true`/`false`/`null`, lists with dotted tails, vectors,
//! `'form` quoting and `;` comments.
use std::{iter::Peekable, str::Chars};

use super::Value;

pub fn read(source: &str) -> Result<Value, String> {
    let mut forms = read_all(source)?;
    match forms.len() {
        1 => Ok(forms.remove(0)),
        n => Err(format!("expected one form, found {}", n)),
    }
}

pub fn read_all(source: &str) -> Result<Vec<Value>, String> {
    let mut reader = Reader {
        chars: source.chars().peekable(),
    };
    let mut forms = Vec::new();
    while reader.skip_blank() {
        forms.push(reader.form()?);
    }
    Ok(forms)
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"' | ';' | '\'')
}

impl Reader<'_> {
    /// Skips whitespace and comments. Returns whether input remains.
    fn skip_blank(&mut self) -> bool {
        while let Some(&c) = self.chars.peek() {
            if c == ';' {
                while self.chars.next_if(|c| *c != '\n').is_some() {}
            } else if c.is_whitespace() {
                self.chars.next();
            } else {
                return true;
            }
        }
        false
    }

    fn form(&mut self) -> Result<Value, String> {
        if !self.skip_blank() {
            return Err("unexpected end of input".to_string());
        }
        match self.chars.next() {
            Some('(') => self.list(),
            Some('[') => self.vector(),
            Some('\'') => Ok(Value::list([Value::symbol("quote"), self.form()?])),
            Some('"') => self.string(),
            Some(c @ (')' | ']')) => Err(format!("unexpected `{}`", c)),
            Some(c) => Ok(self.atom(c)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn list(&mut self) -> Result<Value, String> {
        let mut items = Vec::new();
        let mut tail = Value::Null;
        loop {
            if !self.skip_blank() {
                return Err("unterminated list".to_string());
            }
            if self.chars.next_if_eq(&')').is_some() {
                break;
            }
            let item = self.form()?;
            if item == Value::symbol(".") {
                tail = self.form()?;
                self.skip_blank();
                if self.chars.next() != Some(')') {
                    return Err("expected `)` after dotted tail".to_string());
                }
                break;
            }
            items.push(item);
        }
        Ok(items
            .into_iter()
            .rev()
            .fold(tail, |rest, item| Value::cons(item, rest)))
    }

    fn vector(&mut self) -> Result<Value, String> {
        let mut items = Vec::new();
        loop {
            if !self.skip_blank() {
                return Err("unterminated vector".to_string());
            }
            if self.chars.next_if_eq(&']').is_some() {
                return Ok(Value::vector(items));
            }
            items.push(self.form()?);
        }
    }

    fn string(&mut self) -> Result<Value, String> {
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(Value::string(&text)),
                Some('\\') => match self.chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err("unterminated string".to_string())
    }

    fn atom(&mut self, first: char) -> Value {
        let mut text = first.to_string();
        while let Some(c) = self.chars.next_if(|c| !is_delimiter(*c)) {
            text.push(c);
        }
        match text.as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            "null" => return Value::Null,
            _ => {}
        }
        let numeric = text
            .trim_start_matches('-')
            .starts_with(|c: char| c.is_ascii_digit());
        if numeric {
            if let Ok(n) = text.parse::<i64>() {
                return Value::Integer(n);
            }
            if let Ok(f) = text.parse::<f64>() {
                return Value::Float(f);
            }
        }
        Value::symbol(&text)
    }
}
