//! Recursive-descent selector parser

use crate::ast::{
    CompareOp, Descent, FieldRef, Literal, Predicate, Scope, Selector, Target, CHILDREN_AXIS,
};
use crate::error::SelectorError;

type Result<T> = std::result::Result<T, SelectorError>;

/// Compile selector text into a [`Selector`]
pub(crate) fn parse(text: &str) -> Result<Selector> {
    let text = text.trim();
    if text.is_empty() {
        return Err(SelectorError::Empty);
    }

    let mut parser = Parser { text, pos: 0 };
    if !parser.eat("$") {
        return Err(SelectorError::MissingRoot);
    }
    let selector = parser.selector()?;
    parser.finish()?;
    Ok(selector)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn selector(&mut self) -> Result<Selector> {
        if self.eat("..") {
            let mut selector = Selector::with_axis(Descent::Recursive, Scope::Any);
            if self.peek() == Some('[') {
                self.filter(&mut selector)?;
                self.field(&mut selector)?;
            } else {
                self.named_step(&mut selector)?;
            }
            Ok(selector)
        } else if self.eat(".") {
            let mut selector = Selector::with_axis(Descent::Direct, Scope::Any);
            self.named_step(&mut selector)?;
            Ok(selector)
        } else if self.peek() == Some('[') {
            let mut selector = Selector::roots();
            self.filter(&mut selector)?;
            self.field(&mut selector)?;
            Ok(selector)
        } else {
            Ok(Selector::roots())
        }
    }

    /// `children` axis or a member name
    fn named_step(&mut self, selector: &mut Selector) -> Result<()> {
        let name = self.ident("field name")?;
        if name != CHILDREN_AXIS {
            selector.set_target(Target::Field(name));
            return Ok(());
        }

        selector.set_scope(Scope::Children);
        if self.peek() == Some('[') {
            self.filter(selector)?;
        }
        self.field(selector)
    }

    fn field(&mut self, selector: &mut Selector) -> Result<()> {
        if self.eat(".") {
            let name = self.ident("field name")?;
            selector.set_target(Target::Field(name));
        }
        Ok(())
    }

    fn filter(&mut self, selector: &mut Selector) -> Result<()> {
        self.expect("[")?;
        self.skip_ws();

        if self.eat("*") {
            // wildcard, no tests
        } else if self.eat("?") {
            self.skip_ws();
            if self.eat("(") {
                self.conjunction(selector)?;
                self.skip_ws();
                self.expect(")")?;
            } else {
                self.conjunction(selector)?;
            }
        } else {
            return Err(self.unexpected("'*' or '?'"));
        }

        self.skip_ws();
        self.expect("]")
    }

    fn conjunction(&mut self, selector: &mut Selector) -> Result<()> {
        loop {
            let predicate = self.test()?;
            selector.push_filter(predicate);
            self.skip_ws();

            if self.eat("&&") {
                continue;
            }
            if self.rest().starts_with("||") {
                return Err(self.unsupported("||"));
            }
            return Ok(());
        }
    }

    fn test(&mut self) -> Result<Predicate> {
        self.skip_ws();
        if self.peek() == Some('!') {
            return Err(self.unsupported("!"));
        }
        if !self.eat("@.") {
            return Err(self.unexpected("'@.'"));
        }

        let name = self.ident("field name")?;
        let field = if self.eat(".") {
            FieldRef::entry(name, self.ident("entry key")?)
        } else if self.peek() == Some('[') {
            self.expect("[")?;
            self.skip_ws();
            let key = match self.peek() {
                Some('\'' | '"') => self.string()?,
                _ => return Err(self.unexpected("quoted entry key")),
            };
            self.skip_ws();
            self.expect("]")?;
            FieldRef::entry(name, key)
        } else {
            FieldRef::new(name)
        };

        self.skip_ws();
        match self.operator()? {
            Some(op) => {
                self.skip_ws();
                let value = self.literal()?;
                Ok(Predicate::Compare { field, op, value })
            }
            None => Ok(Predicate::Exists(field)),
        }
    }

    fn operator(&mut self) -> Result<Option<CompareOp>> {
        let op = if self.eat("==") {
            CompareOp::Eq
        } else if self.eat("!=") {
            CompareOp::Ne
        } else if self.eat("<=") {
            CompareOp::Le
        } else if self.eat(">=") {
            CompareOp::Ge
        } else if self.eat("<") {
            CompareOp::Lt
        } else if self.eat(">") {
            CompareOp::Gt
        } else if self.rest().starts_with("=~") {
            return Err(self.unsupported("=~"));
        } else if self.eat("=") {
            // single '=' is a common spelling of equality in recorded patterns
            CompareOp::Eq
        } else {
            return Ok(None);
        };
        Ok(Some(op))
    }

    fn literal(&mut self) -> Result<Literal> {
        match self.peek() {
            Some('\'' | '"') => self.string().map(Literal::Str),
            Some(c) if c.is_ascii_digit() || c == '-' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => {
                let start = self.pos;
                let word = self.take_while(|c| c.is_ascii_alphabetic());
                match word {
                    "true" => Ok(Literal::Bool(true)),
                    "false" => Ok(Literal::Bool(false)),
                    "null" => Ok(Literal::Null),
                    other => Err(SelectorError::Unexpected {
                        position: start,
                        expected: "literal",
                        found: format!("'{other}'"),
                    }),
                }
            }
            _ => Err(self.unexpected("literal")),
        }
    }

    fn string(&mut self) -> Result<String> {
        let start = self.pos;
        let Some(quote) = self.bump() else {
            return Err(self.unexpected("string literal"));
        };

        let mut value = String::new();
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                c if c == quote => return Ok(value),
                c => value.push(c),
            }
        }
        Err(SelectorError::UnterminatedString { position: start })
    }

    fn number(&mut self) -> Result<Literal> {
        let start = self.pos;
        let literal = self.take_while(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'));
        match literal.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Literal::Num(n)),
            _ => Err(SelectorError::InvalidNumber {
                position: start,
                literal: literal.to_string(),
            }),
        }
    }

    fn ident(&mut self, expected: &'static str) -> Result<String> {
        let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
        if name.is_empty() {
            return Err(self.unexpected(expected));
        }
        Ok(name.to_string())
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.text.len() {
            return Err(SelectorError::Trailing {
                position: self.pos,
                rest: self.rest().to_string(),
            });
        }
        Ok(())
    }

    fn expect(&mut self, token: &'static str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(token))
        }
    }

    fn unexpected(&self, expected: &'static str) -> SelectorError {
        SelectorError::Unexpected {
            position: self.pos,
            expected,
            found: match self.peek() {
                Some(c) => format!("'{c}'"),
                None => "end of input".to_string(),
            },
        }
    }

    fn unsupported(&self, operator: &'static str) -> SelectorError {
        SelectorError::Unsupported {
            position: self.pos,
            operator,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.text[start..self.pos]
    }

    fn skip_ws(&mut self) {
        self.take_while(char::is_whitespace);
    }
}
