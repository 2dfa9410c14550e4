//! Canonical textual notation for stamps: the paper's own syntax.
//!
//! ```text
//! id    ::= "0" | "1" | "(" id "," id ")"
//! event ::= digits | "(" digits "," event "," event ")"
//! stamp ::= "(" id "," event ")"
//! ```
//!
//! `Display` always prints a tree's current structure (callers are expected
//! to hand normal-form trees to it, as every kernel operation in this crate
//! returns normal form). `FromStr` is a small hand-written recursive-descent
//! parser — no parser-combinator crate is used anywhere else in this
//! dependency stack, and the grammar is small enough not to need one.

use crate::error::{Error, Result};
use crate::{EventTree, IdTree, Stamp};
use std::fmt;
use std::str::FromStr;

impl fmt::Display for IdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdTree::Leaf { i: false } => write!(f, "0"),
            IdTree::Leaf { i: true } => write!(f, "1"),
            IdTree::Node { left, right } => write!(f, "({left},{right})"),
        }
    }
}

impl fmt::Display for EventTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTree::Leaf { n } => write!(f, "{n}"),
            EventTree::Node { n, left, right } => write!(f, "({n},{left},{right})"),
        }
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.i, self.e)
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn expect(&mut self, want: u8) -> Result<()> {
        match self.bump() {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(Error::malformed(
                self.pos - 1,
                format!("expected '{}', found '{}'", want as char, b as char),
            )),
            None => Err(Error::malformed(
                self.pos,
                format!("expected '{}', found end of input", want as char),
            )),
        }
    }

    fn parse_id(&mut self) -> Result<IdTree> {
        match self.peek() {
            Some(b'0') => {
                self.bump();
                Ok(IdTree::zero())
            }
            Some(b'1') => {
                self.bump();
                Ok(IdTree::one())
            }
            Some(b'(') => {
                self.bump();
                let left = self.parse_id()?;
                self.expect(b',')?;
                let right = self.parse_id()?;
                self.expect(b')')?;
                Ok(IdTree::node(Box::new(left), Box::new(right)))
            }
            Some(b) => Err(Error::malformed(
                self.pos,
                format!("expected an id ('0', '1' or '(...)'), found '{}'", b as char),
            )),
            None => Err(Error::malformed(self.pos, "expected an id, found end of input")),
        }
    }

    fn parse_u32(&mut self) -> Result<u32> {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return Err(Error::malformed(self.pos, "expected a decimal digit"));
        }
        let digits = std::str::from_utf8(&self.bytes[start..self.pos])
            .expect("validated ascii digits above");
        digits
            .parse::<u32>()
            .map_err(|e| Error::malformed(start, format!("integer out of range: {e}")))
    }

    fn parse_event(&mut self) -> Result<EventTree> {
        match self.peek() {
            Some(b) if b.is_ascii_digit() => {
                let n = self.parse_u32()?;
                Ok(EventTree::leaf(n))
            }
            Some(b'(') => {
                self.bump();
                let n = self.parse_u32()?;
                self.expect(b',')?;
                let left = self.parse_event()?;
                self.expect(b',')?;
                let right = self.parse_event()?;
                self.expect(b')')?;
                Ok(EventTree::node(n, Box::new(left), Box::new(right)))
            }
            Some(b) => Err(Error::malformed(
                self.pos,
                format!("expected an event (digits or '(n,l,r)'), found '{}'", b as char),
            )),
            None => Err(Error::malformed(self.pos, "expected an event, found end of input")),
        }
    }

    fn parse_stamp(&mut self) -> Result<Stamp> {
        self.expect(b'(')?;
        let i = self.parse_id()?;
        self.expect(b',')?;
        let e = self.parse_event()?;
        self.expect(b')')?;
        Ok(Stamp::new(i, e))
    }

    fn finish<T>(&self, value: T) -> Result<T> {
        if self.pos == self.bytes.len() {
            Ok(value)
        } else {
            Err(Error::malformed(self.pos, "trailing input after a complete value"))
        }
    }
}

impl FromStr for IdTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<IdTree> {
        let mut parser = Parser::new(s);
        let id = parser.parse_id()?;
        parser.finish(id)
    }
}

impl FromStr for EventTree {
    type Err = Error;

    fn from_str(s: &str) -> Result<EventTree> {
        let mut parser = Parser::new(s);
        let event = parser.parse_event()?;
        parser.finish(event)
    }
}

impl FromStr for Stamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Stamp> {
        let mut parser = Parser::new(s);
        let stamp = parser.parse_stamp()?;
        parser.finish(stamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IntervalTreeClock, Normalisable};

    #[test]
    fn prints_seed() {
        assert_eq!(Stamp::seed().to_string(), "(1,0)");
    }

    #[test]
    fn parses_seed() {
        assert_eq!("(1,0)".parse::<Stamp>().unwrap(), Stamp::seed());
    }

    #[test]
    fn roundtrips_forked_and_ticked_stamps() {
        let (a, b) = Stamp::seed().fork();
        let a = a.event();
        let b = b.event().event();
        let joined = a.join(&b).unwrap().norm();

        for s in [a, b, joined] {
            let printed = s.to_string();
            let parsed: Stamp = printed.parse().unwrap();
            assert_eq!(parsed, s);
            assert_eq!(parsed.to_string(), printed);
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!("(1,0)x".parse::<Stamp>().is_err());
    }

    #[test]
    fn rejects_missing_paren() {
        assert!("(1,0".parse::<Stamp>().is_err());
    }

    #[test]
    fn rejects_unknown_id_token() {
        assert!("2".parse::<IdTree>().is_err());
    }

    #[test]
    fn rejects_negative_event() {
        // the grammar has no minus sign; a leading '-' is simply unrecognized.
        assert!("-1".parse::<EventTree>().is_err());
    }

    #[test]
    fn parses_nested_event() {
        let e: EventTree = "(2,1,0)".parse().unwrap();
        assert_eq!(
            e,
            EventTree::node(2, Box::new(EventTree::leaf(1)), Box::new(EventTree::leaf(0)))
        );
    }
}
