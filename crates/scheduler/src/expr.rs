//! Closed expression mini-language for value templates.
//!
//! Replaces the dynamic "evaluate this string as code" step with a small,
//! auditable language. Two template forms exist:
//!
//! - numeric: float literals, the variable `x` (elapsed seconds), unary
//!   minus, `+ - * / %`, parentheses, and a fixed function table
//! - text: a single-quoted string literal; `{x}` interpolates the elapsed
//!   time, `{{` / `}}` escape braces
//!
//! Parsing produces an AST; evaluation is total (IEEE float semantics for
//! domain errors like `sqrt(-1)`).

use contracts::SignalValue;
use thiserror::Error;

/// Template parse error
#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{name}' expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown variable '{0}', only 'x' is supported")]
    UnknownVariable(String),

    #[error("unterminated text template")]
    UnterminatedText,

    #[error("unknown placeholder '{{{0}}}', only '{{x}}' is supported")]
    UnknownPlaceholder(String),

    #[error("empty expression")]
    Empty,
}

/// A compiled value template
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// Numeric expression, yields `SignalValue::Number`
    Numeric(Node),
    /// Text template, yields `SignalValue::Text`
    Text(Vec<TextPiece>),
}

/// Fragment of a text template
#[derive(Debug, Clone, PartialEq)]
pub enum TextPiece {
    Literal(String),
    Elapsed,
}

/// Numeric expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    /// The variable `x`
    Elapsed,
    Neg(Box<Node>),
    Add(Box<Node>, Box<Node>),
    Sub(Box<Node>, Box<Node>),
    Mul(Box<Node>, Box<Node>),
    Div(Box<Node>, Box<Node>),
    Rem(Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

/// The fixed function table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Abs,
    Sqrt,
    Floor,
    Ceil,
    Exp,
    Log,
    Round,
    Min,
    Max,
    Random,
    Pi,
}

impl Func {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "abs" => Some(Self::Abs),
            "sqrt" => Some(Self::Sqrt),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            "exp" => Some(Self::Exp),
            "log" => Some(Self::Log),
            "round" => Some(Self::Round),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "random" => Some(Self::Random),
            "pi" => Some(Self::Pi),
            _ => None,
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Random | Self::Pi => 0,
            Self::Min | Self::Max => 2,
            _ => 1,
        }
    }
}

impl Template {
    /// Compile a template string
    ///
    /// A leading single quote selects the text form; anything else is
    /// parsed as a numeric expression.
    pub fn parse(src: &str) -> Result<Self, ExprError> {
        let trimmed = src.trim();
        if trimmed.is_empty() {
            return Err(ExprError::Empty);
        }
        if trimmed.starts_with('\'') {
            parse_text(trimmed).map(Template::Text)
        } else {
            let tokens = tokenize(trimmed)?;
            let mut parser = Parser { tokens, pos: 0 };
            let node = parser.expression()?;
            parser.expect_end()?;
            Ok(Template::Numeric(node))
        }
    }

    /// Evaluate against elapsed simulated time (seconds)
    pub fn eval(&self, elapsed: f64) -> SignalValue {
        match self {
            Template::Numeric(node) => SignalValue::Number(node.eval(elapsed)),
            Template::Text(pieces) => {
                let mut out = String::new();
                for piece in pieces {
                    match piece {
                        TextPiece::Literal(s) => out.push_str(s),
                        TextPiece::Elapsed => out.push_str(&elapsed.to_string()),
                    }
                }
                SignalValue::Text(out)
            }
        }
    }
}

impl Node {
    fn eval(&self, x: f64) -> f64 {
        match self {
            Node::Number(n) => *n,
            Node::Elapsed => x,
            Node::Neg(inner) => -inner.eval(x),
            Node::Add(l, r) => l.eval(x) + r.eval(x),
            Node::Sub(l, r) => l.eval(x) - r.eval(x),
            Node::Mul(l, r) => l.eval(x) * r.eval(x),
            Node::Div(l, r) => l.eval(x) / r.eval(x),
            Node::Rem(l, r) => l.eval(x) % r.eval(x),
            Node::Call(func, args) => match func {
                Func::Sin => args[0].eval(x).sin(),
                Func::Cos => args[0].eval(x).cos(),
                Func::Tan => args[0].eval(x).tan(),
                Func::Abs => args[0].eval(x).abs(),
                Func::Sqrt => args[0].eval(x).sqrt(),
                Func::Floor => args[0].eval(x).floor(),
                Func::Ceil => args[0].eval(x).ceil(),
                Func::Exp => args[0].eval(x).exp(),
                Func::Log => args[0].eval(x).ln(),
                Func::Round => args[0].eval(x).round(),
                Func::Min => args[0].eval(x).min(args[1].eval(x)),
                Func::Max => args[0].eval(x).max(args[1].eval(x)),
                Func::Random => rand::random::<f64>(),
                Func::Pi => std::f64::consts::PI,
            },
        }
    }
}

/// Parse the text form: 'literal with {x} placeholders'
fn parse_text(src: &str) -> Result<Vec<TextPiece>, ExprError> {
    // src starts with a quote; it must also end with one
    let inner = src
        .strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .ok_or(ExprError::UnterminatedText)?;

    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                literal.push('}');
            }
            '{' => {
                let mut placeholder = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => placeholder.push(c),
                        None => return Err(ExprError::UnterminatedText),
                    }
                }
                if placeholder != "x" {
                    return Err(ExprError::UnknownPlaceholder(placeholder));
                }
                if !literal.is_empty() {
                    pieces.push(TextPiece::Literal(std::mem::take(&mut literal)));
                }
                pieces.push(TextPiece::Elapsed);
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        pieces.push(TextPiece::Literal(literal));
    }
    Ok(pieces)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
}

fn tokenize(src: &str) -> Result<Vec<(Token, usize)>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push((Token::Plus, i));
                i += 1;
            }
            '-' => {
                tokens.push((Token::Minus, i));
                i += 1;
            }
            '*' => {
                tokens.push((Token::Star, i));
                i += 1;
            }
            '/' => {
                tokens.push((Token::Slash, i));
                i += 1;
            }
            '%' => {
                tokens.push((Token::Percent, i));
                i += 1;
            }
            '(' => {
                tokens.push((Token::LParen, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::RParen, i));
                i += 1;
            }
            ',' => {
                tokens.push((Token::Comma, i));
                i += 1;
            }
            '0'..='9' | '.' => {
                let start = i;
                while i < bytes.len() && matches!(bytes[i] as char, '0'..='9' | '.') {
                    i += 1;
                }
                // optional exponent
                if i < bytes.len() && matches!(bytes[i] as char, 'e' | 'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && matches!(bytes[j] as char, '+' | '-') {
                        j += 1;
                    }
                    if j < bytes.len() && (bytes[j] as char).is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && (bytes[i] as char).is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text = &src[start..i];
                let value: f64 = text
                    .parse()
                    .map_err(|_| ExprError::UnexpectedChar('.', start))?;
                tokens.push((Token::Number(value), start));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < bytes.len()
                    && matches!(bytes[i] as char, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
                {
                    i += 1;
                }
                tokens.push((Token::Ident(src[start..i].to_string()), start));
            }
            other => return Err(ExprError::UnexpectedChar(other, i)),
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some((_, at)) => Err(ExprError::UnexpectedToken(*at)),
        }
    }

    // expression := term (('+'|'-') term)*
    fn expression(&mut self) -> Result<Node, ExprError> {
        let mut node = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.pos += 1;
                    node = Node::Add(Box::new(node), Box::new(self.term()?));
                }
                Token::Minus => {
                    self.pos += 1;
                    node = Node::Sub(Box::new(node), Box::new(self.term()?));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    // term := unary (('*'|'/'|'%') unary)*
    fn term(&mut self) -> Result<Node, ExprError> {
        let mut node = self.unary()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.pos += 1;
                    node = Node::Mul(Box::new(node), Box::new(self.unary()?));
                }
                Token::Slash => {
                    self.pos += 1;
                    node = Node::Div(Box::new(node), Box::new(self.unary()?));
                }
                Token::Percent => {
                    self.pos += 1;
                    node = Node::Rem(Box::new(node), Box::new(self.unary()?));
                }
                _ => break,
            }
        }
        Ok(node)
    }

    // unary := '-' unary | atom
    fn unary(&mut self) -> Result<Node, ExprError> {
        if self.peek() == Some(&Token::Minus) {
            self.pos += 1;
            return Ok(Node::Neg(Box::new(self.unary()?)));
        }
        self.atom()
    }

    // atom := number | 'x' | ident '(' args ')' | '(' expression ')'
    fn atom(&mut self) -> Result<Node, ExprError> {
        match self.next() {
            Some((Token::Number(n), _)) => Ok(Node::Number(n)),
            Some((Token::LParen, _)) => {
                let node = self.expression()?;
                self.expect_rparen()?;
                Ok(node)
            }
            Some((Token::Ident(name), _)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.call(&name)
                } else if name == "x" {
                    Ok(Node::Elapsed)
                } else {
                    Err(ExprError::UnknownVariable(name))
                }
            }
            Some((_, at)) => Err(ExprError::UnexpectedToken(at)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn call(&mut self, name: &str) -> Result<Node, ExprError> {
        let func =
            Func::lookup(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;

        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expression()?);
                match self.next() {
                    Some((Token::Comma, _)) => continue,
                    Some((Token::RParen, _)) => break,
                    Some((_, at)) => return Err(ExprError::UnexpectedToken(at)),
                    None => return Err(ExprError::UnexpectedEnd),
                }
            }
        }

        if args.len() != func.arity() {
            return Err(ExprError::WrongArity {
                name: name.to_string(),
                expected: func.arity(),
                got: args.len(),
            });
        }
        Ok(Node::Call(func, args))
    }

    fn expect_rparen(&mut self) -> Result<(), ExprError> {
        match self.next() {
            Some((Token::RParen, _)) => Ok(()),
            Some((_, at)) => Err(ExprError::UnexpectedToken(at)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_num(src: &str, x: f64) -> f64 {
        match Template::parse(src).unwrap().eval(x) {
            SignalValue::Number(n) => n,
            other => panic!("expected number, got {other:?}"),
        }
    }

    fn eval_text(src: &str, x: f64) -> String {
        match Template::parse(src).unwrap().eval(x) {
            SignalValue::Text(s) => s,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_number() {
        assert_eq!(eval_num("100", 0.0), 100.0);
        assert_eq!(eval_num("2.5e2", 0.0), 250.0);
    }

    #[test]
    fn test_elapsed_variable() {
        assert_eq!(eval_num("x", 1.5), 1.5);
        assert_eq!(eval_num("2 * x + 1", 3.0), 7.0);
    }

    #[test]
    fn test_precedence_and_parens() {
        assert_eq!(eval_num("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval_num("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(eval_num("-x * 2", 4.0), -8.0);
        assert_eq!(eval_num("7 % 4", 0.0), 3.0);
    }

    #[test]
    fn test_function_table() {
        assert_eq!(eval_num("abs(-3)", 0.0), 3.0);
        assert_eq!(eval_num("floor(2.7)", 0.0), 2.0);
        assert_eq!(eval_num("min(3, max(1, 2))", 0.0), 2.0);
        assert!((eval_num("sin(pi() / 2)", 0.0) - 1.0).abs() < 1e-12);
        assert!((eval_num("10 * sin(x) + 50", 0.0) - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_in_unit_interval() {
        for _ in 0..100 {
            let v = eval_num("random()", 0.0);
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_text_template_interpolation() {
        assert_eq!(eval_text("'string {x}'", 0.0), "string 0");
        assert_eq!(eval_text("'t = {x} s'", 1.5), "t = 1.5 s");
        assert_eq!(eval_text("'plain'", 9.9), "plain");
        assert_eq!(eval_text("'{{x}} braces'", 0.0), "{x} braces");
    }

    #[test]
    fn test_rejects_unknown_function() {
        assert_eq!(
            Template::parse("eval(x)").unwrap_err(),
            ExprError::UnknownFunction("eval".to_string())
        );
    }

    #[test]
    fn test_rejects_unknown_variable() {
        assert_eq!(
            Template::parse("y + 1").unwrap_err(),
            ExprError::UnknownVariable("y".to_string())
        );
    }

    #[test]
    fn test_rejects_wrong_arity() {
        assert!(matches!(
            Template::parse("sin(1, 2)").unwrap_err(),
            ExprError::WrongArity { .. }
        ));
        assert!(matches!(
            Template::parse("random(3)").unwrap_err(),
            ExprError::WrongArity { .. }
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Template::parse("").is_err());
        assert!(Template::parse("1 +").is_err());
        assert!(Template::parse("(1").is_err());
        assert!(Template::parse("1 2").is_err());
        assert!(Template::parse("'unterminated").is_err());
        assert!(Template::parse("'bad {y}'").is_err());
        assert!(Template::parse("import os").is_err());
    }
}
