use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
}

impl Token<'_> {
    pub fn end(&self) -> usize {
        self.offset + self.literal.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Paren,
    Op,
    PlusMinus,
    Compare,
    Percent,
    Number,
    Dot,
    Ident,
    MonoComp,
    Unknown,
    Eof,
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.literal;
        let at = self.offset;
        match self.kind {
            TokenKind::Whitespace => write!(f, "WHITESPACE {lit:?} @{at}"),
            TokenKind::Paren => write!(f, "PAREN {lit} @{at}"),
            TokenKind::Op => write!(f, "OP {lit} @{at}"),
            TokenKind::PlusMinus => write!(f, "PLUS_MINUS {lit} @{at}"),
            TokenKind::Compare => write!(f, "COMPARE {lit} @{at}"),
            TokenKind::Percent => write!(f, "PERCENT {lit} @{at}"),
            TokenKind::Number => write!(f, "NUMBER {lit} @{at}"),
            TokenKind::Dot => write!(f, "DOT {lit} @{at}"),
            TokenKind::Ident => write!(f, "IDENT {lit} @{at}"),
            TokenKind::MonoComp => write!(f, "MONO_COMP {lit} @{at}"),
            TokenKind::Unknown => write!(f, "UNKNOWN {lit:?} @{at}"),
            TokenKind::Eof => write!(f, "EOF @{at}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Whitespace,
    Paren,
    Op,
    PlusMinus,
    Compare,
    Percent,
    Digit,
    Dot,
    Letter,
    Unknown,
}

fn classify(c: char) -> Class {
    match c {
        ' ' | '\t' | '\r' | '\n' => Class::Whitespace,
        '(' | ')' => Class::Paren,
        '+' | '-' | '*' | '/' => Class::Op,
        '±' => Class::PlusMinus,
        '=' | '<' | '>' => Class::Compare,
        '%' => Class::Percent,
        '0'..='9' => Class::Digit,
        '.' => Class::Dot,
        'a'..='z' | 'A'..='Z' => Class::Letter,
        _ => Class::Unknown,
    }
}

pub struct Lexer<'de> {
    rest: &'de str,
    byte: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(input: &'de str) -> Self {
        Lexer {
            rest: input,
            byte: 0,
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Token<'de>;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.rest;
        let c = cur.chars().next()?;
        let offset = self.byte;

        let run = |pred: fn(char) -> bool| cur.find(|c| !pred(c)).unwrap_or(cur.len());

        let (len, kind) = match classify(c) {
            Class::Whitespace => (
                run(|c| classify(c) == Class::Whitespace),
                TokenKind::Whitespace,
            ),
            Class::Paren => (1, TokenKind::Paren),
            Class::PlusMinus => (c.len_utf8(), TokenKind::PlusMinus),
            // `+` immediately followed by `-` reads as one tolerance marker
            Class::Op if c == '+' && cur[1..].starts_with('-') => (2, TokenKind::PlusMinus),
            Class::Op => (1, TokenKind::Op),
            Class::Compare => (1, TokenKind::Compare),
            Class::Percent => (1, TokenKind::Percent),
            Class::Dot => (1, TokenKind::Dot),
            Class::Digit => (run(|c| classify(c) == Class::Digit), TokenKind::Number),
            Class::Letter => {
                // digits continue an identifier run, so `R1` stays one token
                let len = run(|c| matches!(classify(c), Class::Letter | Class::Digit));
                let kind = match &cur[..len] {
                    "min" | "max" | "minabs" | "maxabs" => TokenKind::MonoComp,
                    _ => TokenKind::Ident,
                };
                (len, kind)
            }
            Class::Unknown => (run(|c| classify(c) == Class::Unknown), TokenKind::Unknown),
        };

        let literal = &cur[..len];
        self.rest = &cur[len..];
        self.byte += len;

        Some(Token {
            kind,
            literal,
            offset,
        })
    }
}

pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    Lexer::new(input).collect()
}
