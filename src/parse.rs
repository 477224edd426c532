use std::collections::BTreeSet;
use std::fmt::Display;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::lex::{Token, TokenKind, tokenize};
use crate::uncertain::{Source, Uncertain};

/// Byte range into the source text, carried by every node for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    fn of(token: &Token<'_>) -> Span {
        Span {
            start: token.offset,
            end: token.end(),
        }
    }

    fn to(self, other: Span) -> Span {
        Span {
            start: self.start,
            end: other.end,
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> SourceSpan {
        (span.start..span.end).into()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'de> {
    Number {
        value: Uncertain,
        span: Span,
    },
    Variable {
        name: &'de str,
        span: Span,
    },
    Negate {
        inner: Box<Expr<'de>>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr<'de>>,
        rhs: Box<Expr<'de>>,
        span: Span,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonoOp {
    Min,
    Max,
    MinAbs,
    MaxAbs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Less,
    Greater,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'de> {
    Mono {
        op: MonoOp,
        expr: Expr<'de>,
        span: Span,
    },
    Compare {
        op: CompareOp,
        lhs: Expr<'de>,
        rhs: Expr<'de>,
        span: Span,
    },
    Bare(Expr<'de>),
}

impl<'de> Expr<'de> {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number { span, .. }
            | Expr::Variable { span, .. }
            | Expr::Negate { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }

    fn widen(&mut self, span: Span) {
        match self {
            Expr::Number { span: s, .. }
            | Expr::Variable { span: s, .. }
            | Expr::Negate { span: s, .. }
            | Expr::Binary { span: s, .. } => *s = span,
        }
    }

    pub fn free_vars(&self) -> BTreeSet<&'de str> {
        let mut vars = BTreeSet::new();
        self.collect_vars(&mut vars);
        vars
    }

    fn collect_vars(&self, vars: &mut BTreeSet<&'de str>) {
        match self {
            Expr::Number { .. } => {}
            Expr::Variable { name, .. } => {
                vars.insert(name);
            }
            Expr::Negate { inner, .. } => inner.collect_vars(vars),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_vars(vars);
                rhs.collect_vars(vars);
            }
        }
    }
}

impl<'de> Statement<'de> {
    pub fn span(&self) -> Span {
        match self {
            Statement::Mono { span, .. } | Statement::Compare { span, .. } => *span,
            Statement::Bare(expr) => expr.span(),
        }
    }

    pub fn free_vars(&self) -> BTreeSet<&'de str> {
        match self {
            Statement::Mono { expr, .. } => expr.free_vars(),
            Statement::Compare { lhs, rhs, .. } => {
                let mut vars = lhs.free_vars();
                vars.extend(rhs.free_vars());
                vars
            }
            Statement::Bare(expr) => expr.free_vars(),
        }
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
        }
    }
}

impl Display for MonoOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonoOp::Min => write!(f, "min"),
            MonoOp::Max => write!(f, "max"),
            MonoOp::MinAbs => write!(f, "minabs"),
            MonoOp::MaxAbs => write!(f, "maxabs"),
        }
    }
}

impl Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "="),
            CompareOp::Less => write!(f, "<"),
            CompareOp::Greater => write!(f, ">"),
        }
    }
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Number { value, .. } => {
                let v = value.value();
                let stat = value.sensitivity(&Source::Static);
                if stat == 0.0 {
                    write!(f, "{v}")
                } else {
                    write!(f, "{v} +- {stat}")
                }
            }
            Expr::Variable { name, .. } => write!(f, "{name}"),
            Expr::Negate { inner, .. } => write!(f, "-({inner})"),
            Expr::Binary { op, lhs, rhs, .. } => write!(f, "({lhs}) {op} ({rhs})"),
        }
    }
}

impl Display for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Statement::Mono { op, expr, .. } => write!(f, "{op} {expr}"),
            Statement::Compare { op, lhs, rhs, .. } => write!(f, "{lhs} {op} {rhs}"),
            Statement::Bare(expr) => write!(f, "{expr}"),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("unexpected token `{token}`")]
    #[diagnostic(help("expected a number, a variable, or a parenthesized expression"))]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("this token")]
        at: SourceSpan,
        token: String,
    },

    #[error("unexpected end of input")]
    UnexpectedEnd {
        #[source_code]
        src: NamedSource<String>,
        #[label("input ends here")]
        at: SourceSpan,
    },

    #[error("expected `)` to close this parenthesis")]
    UnclosedParen {
        #[source_code]
        src: NamedSource<String>,
        #[label("opened here")]
        open: SourceSpan,
        #[label("expected `)` here")]
        at: SourceSpan,
    },

    #[error("expected a number after the exponent marker")]
    MissingExponent {
        #[source_code]
        src: NamedSource<String>,
        #[label("after this")]
        at: SourceSpan,
    },

    #[error("invalid operator after the exponent marker, expected `+` or `-`")]
    BadExponentSign {
        #[source_code]
        src: NamedSource<String>,
        #[label("this operator")]
        at: SourceSpan,
    },

    #[error("expected end of input")]
    #[diagnostic(help("remove the trailing input"))]
    TrailingInput {
        #[source_code]
        src: NamedSource<String>,
        #[label("trailing input starts here")]
        at: SourceSpan,
    },
}

impl ParseError {
    /// Byte offset of the offending token, for caret placement.
    pub fn offset(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { at, .. }
            | ParseError::UnexpectedEnd { at, .. }
            | ParseError::UnclosedParen { at, .. }
            | ParseError::MissingExponent { at, .. }
            | ParseError::BadExponentSign { at, .. }
            | ParseError::TrailingInput { at, .. } => at.offset(),
        }
    }
}

struct TokenStream<'de> {
    tokens: Vec<Token<'de>>,
    idx: usize,
    len: usize,
}

impl<'de> TokenStream<'de> {
    fn new(input: &'de str) -> Self {
        TokenStream {
            tokens: tokenize(input),
            idx: 0,
            len: input.len(),
        }
    }

    fn skip_ws(&mut self) {
        while self
            .tokens
            .get(self.idx)
            .is_some_and(|t| t.kind == TokenKind::Whitespace)
        {
            self.idx += 1;
        }
    }

    fn peek(&self) -> Token<'de> {
        self.tokens.get(self.idx).copied().unwrap_or(Token {
            kind: TokenKind::Eof,
            literal: "",
            offset: self.len,
        })
    }

    fn pop(&mut self) -> Token<'de> {
        let token = self.peek();
        if self.idx < self.tokens.len() {
            self.idx += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.idx >= self.tokens.len()
    }
}

pub struct Parser<'de> {
    whole: &'de str,
    tokens: TokenStream<'de>,
}

/// Parse a full statement (a mono comparator, a comparison, or a bare
/// expression), requiring the entire input to be consumed.
pub fn parse_statement(input: &str) -> Result<Statement<'_>, ParseError> {
    Parser::new(input).parse()
}

/// Parse a single expression, requiring the entire input to be consumed.
pub fn parse_expr(input: &str) -> Result<Expr<'_>, ParseError> {
    Parser::new(input).parse_expression()
}

impl<'de> Parser<'de> {
    pub fn new(whole: &'de str) -> Self {
        Parser {
            whole,
            tokens: TokenStream::new(whole),
        }
    }

    pub fn parse(mut self) -> Result<Statement<'de>, ParseError> {
        let statement = self.statement()?;
        self.expect_end()?;
        Ok(statement)
    }

    pub fn parse_expression(mut self) -> Result<Expr<'de>, ParseError> {
        let expr = self.expr()?;
        self.expect_end()?;
        Ok(expr)
    }

    fn statement(&mut self) -> Result<Statement<'de>, ParseError> {
        self.tokens.skip_ws();
        let first = self.tokens.peek();
        if first.kind == TokenKind::MonoComp {
            self.tokens.pop();
            let op = match first.literal {
                "min" => MonoOp::Min,
                "max" => MonoOp::Max,
                "minabs" => MonoOp::MinAbs,
                "maxabs" => MonoOp::MaxAbs,
                _ => unreachable!(),
            };
            let expr = self.expr()?;
            let span = Span::of(&first).to(expr.span());
            return Ok(Statement::Mono { op, expr, span });
        }

        let lhs = self.expr()?;
        self.tokens.skip_ws();
        let next = self.tokens.peek();
        if next.kind != TokenKind::Compare {
            return Ok(Statement::Bare(lhs));
        }
        self.tokens.pop();
        let op = match next.literal {
            "=" => CompareOp::Eq,
            "<" => CompareOp::Less,
            ">" => CompareOp::Greater,
            _ => unreachable!(),
        };
        let rhs = self.expr()?;
        let span = lhs.span().to(rhs.span());
        Ok(Statement::Compare { op, lhs, rhs, span })
    }

    fn expr(&mut self) -> Result<Expr<'de>, ParseError> {
        self.tokens.skip_ws();
        let mut lhs = self.term()?;
        loop {
            self.tokens.skip_ws();
            let op = self.tokens.peek();
            let op = match (op.kind, op.literal) {
                (TokenKind::Op, "+") => BinOp::Add,
                (TokenKind::Op, "-") => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.tokens.pop();
            let rhs = self.term()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
    }

    fn term(&mut self) -> Result<Expr<'de>, ParseError> {
        self.tokens.skip_ws();
        let mut lhs = self.factor()?;
        loop {
            self.tokens.skip_ws();
            let op = self.tokens.peek();
            let op = match (op.kind, op.literal) {
                (TokenKind::Op, "*") => BinOp::Mul,
                (TokenKind::Op, "/") => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.tokens.pop();
            let rhs = self.factor()?;
            let span = lhs.span().to(rhs.span());
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                span,
            };
        }
    }

    fn factor(&mut self) -> Result<Expr<'de>, ParseError> {
        self.tokens.skip_ws();
        let first = self.tokens.peek();
        if first.kind == TokenKind::Op && first.literal == "-" {
            self.tokens.pop();
            let inner = self.atom()?;
            let span = Span::of(&first).to(inner.span());
            return Ok(Expr::Negate {
                inner: Box::new(inner),
                span,
            });
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr<'de>, ParseError> {
        self.tokens.skip_ws();
        let first = self.tokens.peek();
        match first.kind {
            TokenKind::Paren if first.literal == "(" => {
                self.tokens.pop();
                let mut inner = self.expr()?;
                self.tokens.skip_ws();
                let close = self.tokens.peek();
                if close.kind != TokenKind::Paren || close.literal != ")" {
                    return Err(ParseError::UnclosedParen {
                        src: self.src(),
                        open: Span::of(&first).into(),
                        at: Span::of(&close).into(),
                    });
                }
                self.tokens.pop();
                // the node's span covers the enclosing parentheses
                inner.widen(Span::of(&first).to(Span::of(&close)));
                Ok(inner)
            }
            TokenKind::Number | TokenKind::Dot => self.number(),
            TokenKind::Ident => {
                self.tokens.pop();
                Ok(Expr::Variable {
                    name: first.literal,
                    span: Span::of(&first),
                })
            }
            TokenKind::Eof => Err(self.unexpected_end()),
            _ => Err(self.unexpected_token(first)),
        }
    }

    fn number(&mut self) -> Result<Expr<'de>, ParseError> {
        self.tokens.skip_ws();
        let start = self.tokens.peek().offset;
        let (mantissa, suffix, mut end) = self.numeric_literal()?;

        let mut nominal = mantissa * 10f64.powi(suffix.unwrap_or(0));
        let mut tolerance = None;

        self.tokens.skip_ws();
        if self.tokens.peek().kind == TokenKind::PlusMinus {
            self.tokens.pop();
            let (interval, interval_suffix, interval_end) = self.numeric_literal()?;
            end = interval_end;

            self.tokens.skip_ws();
            let percent = self.tokens.peek();
            if percent.kind == TokenKind::Percent {
                self.tokens.pop();
                end = percent.end();
                // percent of the nominal, the interval's own power forced to zero
                tolerance = Some(interval / 100.0 * nominal);
            } else {
                // a suffix-less side inherits the other side's suffix
                let interval_pow = interval_suffix.or(suffix).unwrap_or(0);
                let nominal_pow = suffix.or(interval_suffix).unwrap_or(0);
                nominal = mantissa * 10f64.powi(nominal_pow);
                tolerance = Some(interval * 10f64.powi(interval_pow));
            }
        }

        let value = match tolerance {
            Some(tolerance) => Uncertain::with_static(nominal, tolerance),
            None => Uncertain::exact(nominal),
        };
        Ok(Expr::Number {
            value,
            span: Span { start, end },
        })
    }

    /// Digits, an optional fraction, and an optional SI or exponent suffix.
    /// Returns the mantissa, the explicit suffix power if one was given, and
    /// the byte offset one past the literal.
    fn numeric_literal(&mut self) -> Result<(f64, Option<i32>, usize), ParseError> {
        self.tokens.skip_ws();
        let first = self.tokens.peek();
        let mut end = first.end();
        let mut int_digits = "";
        match first.kind {
            TokenKind::Number => {
                self.tokens.pop();
                int_digits = first.literal;
            }
            TokenKind::Dot => {}
            TokenKind::Eof => return Err(self.unexpected_end()),
            _ => return Err(self.unexpected_token(first)),
        }

        let mut frac_digits = "";
        self.tokens.skip_ws();
        let dot = self.tokens.peek();
        if dot.kind == TokenKind::Dot {
            self.tokens.pop();
            end = dot.end();
            self.tokens.skip_ws();
            let frac = self.tokens.peek();
            if frac.kind == TokenKind::Number {
                self.tokens.pop();
                frac_digits = frac.literal;
                end = frac.end();
            }
        }

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(self.unexpected_token(first));
        }

        let mut value = 0.0;
        for digit in int_digits.bytes() {
            value = value * 10.0 + f64::from(digit - b'0');
        }
        for (i, digit) in frac_digits.bytes().enumerate() {
            value += f64::from(digit - b'0') * 10f64.powi(-(i as i32) - 1);
        }

        let mut suffix = None;
        self.tokens.skip_ws();
        let next = self.tokens.peek();
        if next.kind == TokenKind::Ident {
            if let Some(pow) = si_power(next.literal) {
                self.tokens.pop();
                suffix = Some(pow);
                end = next.end();
            } else if let Some(rest) = next.literal.strip_prefix(['e', 'E']) {
                self.tokens.pop();
                end = next.end();
                if rest.is_empty() {
                    let (pow, pow_end) = self.exponent_digits(next)?;
                    suffix = Some(pow);
                    end = pow_end;
                } else {
                    let pow = rest
                        .parse()
                        .map_err(|_| self.missing_exponent(next))?;
                    suffix = Some(pow);
                }
            }
            // any other identifier is not a suffix and stays unconsumed
        }

        Ok((value, suffix, end))
    }

    /// A bare `e`/`E` was consumed: take an optional sign operator token,
    /// then a mandatory number token.
    fn exponent_digits(&mut self, marker: Token<'de>) -> Result<(i32, usize), ParseError> {
        let mut negate = false;
        self.tokens.skip_ws();
        let sign = self.tokens.peek();
        if sign.kind == TokenKind::Op {
            self.tokens.pop();
            match sign.literal {
                "-" => negate = true,
                "+" => {}
                _ => {
                    return Err(ParseError::BadExponentSign {
                        src: self.src(),
                        at: Span::of(&sign).into(),
                    });
                }
            }
        }
        self.tokens.skip_ws();
        let digits = self.tokens.peek();
        if digits.kind != TokenKind::Number {
            return Err(self.missing_exponent(marker));
        }
        self.tokens.pop();
        let mut pow: i32 = digits
            .literal
            .parse()
            .map_err(|_| self.missing_exponent(digits))?;
        if negate {
            pow = -pow;
        }
        Ok((pow, digits.end()))
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.tokens.skip_ws();
        if self.tokens.at_end() {
            return Ok(());
        }
        let token = self.tokens.peek();
        Err(ParseError::TrailingInput {
            src: self.src(),
            at: Span::of(&token).into(),
        })
    }

    fn src(&self) -> NamedSource<String> {
        NamedSource::new("<input>", self.whole.to_string())
    }

    fn unexpected_token(&self, token: Token<'_>) -> ParseError {
        ParseError::UnexpectedToken {
            src: self.src(),
            at: Span::of(&token).into(),
            token: token.literal.to_string(),
        }
    }

    fn unexpected_end(&self) -> ParseError {
        ParseError::UnexpectedEnd {
            src: self.src(),
            at: (self.whole.len()..self.whole.len()).into(),
        }
    }

    fn missing_exponent(&self, token: Token<'_>) -> ParseError {
        ParseError::MissingExponent {
            src: self.src(),
            at: Span::of(&token).into(),
        }
    }
}

fn si_power(literal: &str) -> Option<i32> {
    match literal {
        "p" => Some(-12),
        "n" => Some(-9),
        "u" => Some(-6),
        "m" => Some(-3),
        "k" => Some(3),
        "M" => Some(6),
        "G" => Some(9),
        "T" => Some(12),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn number(input: &str) -> Uncertain {
        match parse_expr(input).unwrap() {
            Expr::Number { value, .. } => value,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn si_suffix_with_percent_tolerance() {
        let value = number("5k ± 1%");
        assert_approx_eq!(f64, value.value(), 5000.0);
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 50.0);

        // ascii spelling of the same literal
        let value = number("5k +- 1%");
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 50.0);
    }

    #[test]
    fn tolerance_inherits_nominal_suffix() {
        let value = number("5k +- 1");
        assert_approx_eq!(f64, value.value(), 5000.0);
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 1000.0);
    }

    #[test]
    fn nominal_inherits_tolerance_suffix() {
        let value = number("5 +- 1k");
        assert_approx_eq!(f64, value.value(), 5000.0);
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 1000.0);
    }

    #[test]
    fn both_suffixes_explicit() {
        let value = number("3e3 +- 1k");
        assert_approx_eq!(f64, value.value(), 3000.0);
        assert_approx_eq!(f64, value.sensitivity(&Source::Static), 1000.0);
    }

    #[test]
    fn fractional_literals() {
        assert_approx_eq!(f64, number("1.25").value(), 1.25);
        assert_approx_eq!(f64, number(".5").value(), 0.5);
        assert_approx_eq!(f64, number("5.").value(), 5.0);
    }

    #[test]
    fn si_suffixes() {
        assert_approx_eq!(f64, number("100m").value(), 0.1);
        assert_approx_eq!(f64, number("2u").value(), 2e-6);
        assert_approx_eq!(f64, number("3M").value(), 3e6);
    }

    #[test]
    fn exponent_forms() {
        assert_approx_eq!(f64, number("2e3").value(), 2000.0);
        assert_approx_eq!(f64, number("2E3").value(), 2000.0);
        assert_approx_eq!(f64, number("2e-3").value(), 0.002);
        assert_approx_eq!(f64, number("2e + 3").value(), 2000.0);
        assert_approx_eq!(f64, number("1.5e2").value(), 150.0);
    }

    #[test]
    fn exponent_requires_digits() {
        assert!(matches!(
            parse_expr("2e").unwrap_err(),
            ParseError::MissingExponent { .. }
        ));
        assert!(matches!(
            parse_expr("2e*3").unwrap_err(),
            ParseError::BadExponentSign { .. }
        ));
        assert!(matches!(
            parse_expr("2ex").unwrap_err(),
            ParseError::MissingExponent { .. }
        ));
    }

    #[test]
    fn non_suffix_identifier_is_not_consumed() {
        let err = parse_expr("5 foo").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn precedence_follows_the_grammar() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        let ctx = crate::eval::Context::new();
        assert_approx_eq!(f64, expr.eval(&ctx).unwrap().value(), 7.0);

        let expr = parse_expr("(1 + 2) * 3").unwrap();
        assert_approx_eq!(f64, expr.eval(&ctx).unwrap().value(), 9.0);

        let expr = parse_expr("1 - 2 - 3").unwrap();
        assert_approx_eq!(f64, expr.eval(&ctx).unwrap().value(), -4.0);
    }

    #[test]
    fn negation_binds_to_the_atom() {
        let expr = parse_expr("-2 * 3").unwrap();
        let ctx = crate::eval::Context::new();
        assert_approx_eq!(f64, expr.eval(&ctx).unwrap().value(), -6.0);
    }

    #[test]
    fn statement_kinds() {
        assert!(matches!(
            parse_statement("min x").unwrap(),
            Statement::Mono {
                op: MonoOp::Min,
                ..
            }
        ));
        assert!(matches!(
            parse_statement("a = b").unwrap(),
            Statement::Compare {
                op: CompareOp::Eq,
                ..
            }
        ));
        assert!(matches!(
            parse_statement("a < b").unwrap(),
            Statement::Compare {
                op: CompareOp::Less,
                ..
            }
        ));
        assert!(matches!(
            parse_statement("a + b").unwrap(),
            Statement::Bare(_)
        ));
    }

    #[test]
    fn spans_cover_consumed_tokens() {
        let expr = parse_expr("5k ± 1%").unwrap();
        assert_eq!(expr.span(), Span { start: 0, end: 8 });

        // parenthesized expressions widen to the parens
        let expr = parse_expr("( a )").unwrap();
        assert_eq!(expr.span(), Span { start: 0, end: 5 });

        // negation starts at the minus sign
        let expr = parse_expr(" -a").unwrap();
        assert_eq!(expr.span(), Span { start: 1, end: 3 });

        let statement = parse_statement("min x").unwrap();
        assert_eq!(statement.span(), Span { start: 0, end: 5 });
    }

    #[test]
    fn unexpected_token_reports_offset() {
        let err = parse_statement("1 + *").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        assert_eq!(err.offset(), 4);
    }

    #[test]
    fn unexpected_end_reports_input_length() {
        let err = parse_statement("1 +").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEnd { .. }));
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn missing_close_paren() {
        let err = parse_statement("(1 + 2").unwrap_err();
        assert!(matches!(err, ParseError::UnclosedParen { .. }));
        assert_eq!(err.offset(), 6);
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        let err = parse_statement("1 2").unwrap_err();
        assert!(matches!(err, ParseError::TrailingInput { .. }));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn free_vars_are_sorted_and_deduplicated() {
        let statement = parse_statement("R2 / (R1 + R2) = Vout").unwrap();
        let vars: Vec<&str> = statement.free_vars().into_iter().collect();
        assert_eq!(vars, ["R1", "R2", "Vout"]);
    }

    #[test]
    fn display_round_trips_structurally() {
        let expr = parse_expr("1 + 2 * 3").unwrap();
        assert_eq!(expr.to_string(), "(1) + ((2) * (3))");

        let statement = parse_statement("min 5k +- 1%").unwrap();
        assert_eq!(statement.to_string(), "min 5000 +- 50");

        let reparsed = parse_statement("min 5000 +- 50").unwrap();
        match (statement, reparsed) {
            (
                Statement::Mono {
                    expr: Expr::Number { value: a, .. },
                    ..
                },
                Statement::Mono {
                    expr: Expr::Number { value: b, .. },
                    ..
                },
            ) => assert_eq!(a, b),
            other => panic!("expected two mono statements, got {other:?}"),
        }
    }
}
