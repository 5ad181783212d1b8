//! Formula parser
//!
//! A recursive descent parser for the template formula subset, with proper
//! operator precedence. The grammar is deliberately small: numbers, cell
//! references, arithmetic, comparisons, parentheses, and calls to the fixed
//! function set. Anything else is a parse error rather than a best-effort
//! evaluation.

use crate::ast::{BinaryOperator, Expr, Func, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use platequote_core::CellAddress;

/// Parse a formula string into an AST
///
/// A leading `=` is allowed and stripped; formula text extracted from a file
/// usually arrives without it.
///
/// # Example
/// ```rust
/// use platequote_formula::parse_formula;
///
/// let ast = parse_formula("=D67*1.21").unwrap();
/// let ast = parse_formula("IF(A1>10,IF(A1>20,100,50),10)").unwrap();
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<Expr> {
    let formula = formula.trim();
    let formula = formula.strip_prefix('=').unwrap_or(formula);

    if formula.is_empty() {
        return Err(FormulaError::Parse("empty formula".into()));
    }

    let mut parser = FormulaParser::new(formula);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if !matches!(parser.current_token(), Token::Eof) {
        return Err(FormulaError::Parse(format!(
            "unexpected input after expression: '{}'",
            &parser.input[parser.token_start..]
        )));
    }

    Ok(expr)
}

/// Token types
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    CellRef(CellAddress),
    Identifier(String), // Function name

    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // `,` or `;` (Dutch-locale files use the semicolon)
    ArgSep,
    LeftParen,
    RightParen,

    Eof,
}

struct FormulaParser<'a> {
    input: &'a str,
    pos: usize,
    /// Byte offset where the current token started, for error reporting
    token_start: usize,
    current_token: Option<Token>,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_start: 0,
            current_token: None,
        }
    }

    // === Token scanning ===

    fn advance_token(&mut self) -> FormulaResult<()> {
        let token = self.scan_token()?;
        self.current_token = Some(token);
        Ok(())
    }

    fn scan_token(&mut self) -> FormulaResult<Token> {
        self.skip_whitespace();
        self.token_start = self.pos;

        let c = match self.peek_char() {
            Some(c) => c,
            None => return Ok(Token::Eof),
        };

        match c {
            '+' => {
                self.advance();
                return Ok(Token::Plus);
            }
            '-' => {
                self.advance();
                return Ok(Token::Minus);
            }
            '*' => {
                self.advance();
                return Ok(Token::Star);
            }
            '/' => {
                self.advance();
                return Ok(Token::Slash);
            }
            '^' => {
                self.advance();
                return Ok(Token::Caret);
            }
            ',' | ';' => {
                self.advance();
                return Ok(Token::ArgSep);
            }
            '(' => {
                self.advance();
                return Ok(Token::LeftParen);
            }
            ')' => {
                self.advance();
                return Ok(Token::RightParen);
            }
            '=' => {
                self.advance();
                return Ok(Token::Equal);
            }
            _ => {}
        }

        if c == '<' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::LessEqual);
            } else if self.peek_char() == Some('>') {
                self.advance();
                return Ok(Token::NotEqual);
            }
            return Ok(Token::LessThan);
        }

        if c == '>' {
            self.advance();
            if self.peek_char() == Some('=') {
                self.advance();
                return Ok(Token::GreaterEqual);
            }
            return Ok(Token::GreaterThan);
        }

        if c.is_ascii_digit()
            || (c == '.' && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()))
        {
            return self.scan_number();
        }

        if c.is_ascii_alphabetic() {
            return self.scan_identifier_or_ref();
        }

        Err(FormulaError::Parse(format!(
            "unexpected character '{}' at offset {}",
            c, self.pos
        )))
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek_char() == Some('.') {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek_char().is_some_and(|c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek_char().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let num_str = &self.input[start..self.pos];
        let num: f64 = num_str
            .parse()
            .map_err(|_| FormulaError::Parse(format!("invalid number literal '{}'", num_str)))?;
        Ok(Token::Number(num))
    }

    fn scan_identifier_or_ref(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];

        // Letters followed by digits is a cell reference, unless a '(' makes
        // it a function call (LOG10(...) style names would otherwise match).
        if is_cell_reference(text) && self.peek_char() != Some('(') {
            let addr = CellAddress::parse(text)
                .map_err(|e| FormulaError::Parse(format!("bad cell reference '{}': {}", text, e)))?;
            return Ok(Token::CellRef(addr));
        }

        Ok(Token::Identifier(text.to_string()))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn current_token(&self) -> &Token {
        self.current_token.as_ref().unwrap_or(&Token::Eof)
    }

    fn consume(&mut self) -> FormulaResult<Token> {
        let token = self.current_token.take().unwrap_or(Token::Eof);
        self.advance_token()?;
        Ok(token)
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        if self.current_token() == expected {
            self.consume()?;
            Ok(())
        } else {
            Err(FormulaError::Parse(format!(
                "expected {:?}, got {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Comparison: =, <>, <, <=, >, >=
    // 2. Addition/Subtraction: +, -
    // 3. Multiplication/Division: *, /
    // 4. Exponentiation: ^ (right associative)
    // 5. Unary: -
    // 6. Primary: literals, references, function calls, parentheses

    fn parse_expression(&mut self) -> FormulaResult<Expr> {
        if self.current_token.is_none() {
            self.advance_token()?;
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.current_token() {
                Token::Equal => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_additive()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current_token() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<Expr> {
        let mut left = self.parse_exponent()?;

        loop {
            let op = match self.current_token() {
                Token::Star => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.consume()?;
            let right = self.parse_exponent()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_exponent(&mut self) -> FormulaResult<Expr> {
        let left = self.parse_unary()?;

        if matches!(self.current_token(), Token::Caret) {
            self.consume()?;
            let right = self.parse_exponent()?; // Right associative
            return Ok(Expr::BinaryOp {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FormulaResult<Expr> {
        if matches!(self.current_token(), Token::Minus) {
            self.consume()?;
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        // Prefix plus (no-op)
        if matches!(self.current_token(), Token::Plus) {
            self.consume()?;
            return self.parse_unary();
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> FormulaResult<Expr> {
        match self.current_token().clone() {
            Token::Number(n) => {
                self.consume()?;
                Ok(Expr::Number(n))
            }

            Token::CellRef(addr) => {
                self.consume()?;
                Ok(Expr::CellRef(addr))
            }

            Token::LeftParen => {
                self.consume()?;
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Identifier(name) => {
                self.consume()?;
                self.parse_function_call(&name)
            }

            other => Err(FormulaError::Parse(format!(
                "unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_function_call(&mut self, name: &str) -> FormulaResult<Expr> {
        let func = Func::from_name(name)
            .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();
        if !matches!(self.current_token(), Token::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                match self.current_token() {
                    Token::ArgSep => {
                        self.consume()?;
                    }
                    Token::RightParen => break,
                    other => {
                        return Err(FormulaError::Parse(format!(
                            "expected ',' or ')' in {} arguments, got {:?}",
                            func.name(),
                            other
                        )))
                    }
                }
            }
        }
        self.expect(&Token::RightParen)?;

        let (min, max) = func.arity();
        if args.len() < min || max.is_some_and(|max| args.len() > max) {
            let expected = match max {
                Some(max) if max == min => format!("{}", min),
                Some(max) => format!("{}-{}", min, max),
                None => format!("at least {}", min),
            };
            return Err(FormulaError::ArgumentCount {
                function: func.name(),
                expected,
                actual: args.len(),
            });
        }

        Ok(Expr::Call { func, args })
    }
}

/// Cell reference pattern: letters followed by digits, nothing else
fn is_cell_reference(text: &str) -> bool {
    let letter_count = text.chars().take_while(|c| c.is_ascii_alphabetic()).count();
    if letter_count == 0 || letter_count == text.chars().count() {
        return false;
    }
    text.chars().skip(letter_count).all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn test_parse_literal_and_ref() {
        assert_eq!(parse_formula("=42").unwrap(), Expr::Number(42.0));
        assert_eq!(parse_formula("1.5e2").unwrap(), Expr::Number(150.0));
        assert_eq!(parse_formula("=D67").unwrap(), Expr::CellRef(addr("D67")));
    }

    #[test]
    fn test_precedence() {
        // 1+2*3 parses as 1+(2*3)
        let expr = parse_formula("=1+2*3").unwrap();
        assert_eq!(
            expr,
            Expr::BinaryOp {
                op: BinaryOperator::Add,
                left: Box::new(Expr::Number(1.0)),
                right: Box::new(Expr::BinaryOp {
                    op: BinaryOperator::Multiply,
                    left: Box::new(Expr::Number(2.0)),
                    right: Box::new(Expr::Number(3.0)),
                }),
            }
        );
    }

    #[test]
    fn test_comparison_binds_loosest() {
        let expr = parse_formula("A1>10+5").unwrap();
        match expr {
            Expr::BinaryOp {
                op: BinaryOperator::GreaterThan,
                ..
            } => {}
            other => panic!("expected comparison at root, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_if() {
        let expr = parse_formula("=IF(A1>10, IF(A1>20, 100, 50), 10)").unwrap();
        match expr {
            Expr::Call {
                func: Func::If,
                args,
            } => {
                assert_eq!(args.len(), 3);
                assert!(matches!(
                    args[1],
                    Expr::Call {
                        func: Func::If,
                        ..
                    }
                ));
            }
            other => panic!("expected IF call, got {:?}", other),
        }
    }

    #[test]
    fn test_semicolon_argument_separator() {
        let expr = parse_formula("=IF(A1>10;100;50)").unwrap();
        match expr {
            Expr::Call {
                func: Func::If,
                args,
            } => assert_eq!(args.len(), 3),
            other => panic!("expected IF call, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_function_rejected() {
        match parse_formula("=VLOOKUP(A1,B1,2)") {
            Err(FormulaError::UnknownFunction(name)) => assert_eq!(name, "VLOOKUP"),
            other => panic!("expected UnknownFunction, got {:?}", other),
        }
    }

    #[test]
    fn test_arity_checked() {
        match parse_formula("=ABS(1,2)") {
            Err(FormulaError::ArgumentCount { function, .. }) => assert_eq!(function, "ABS"),
            other => panic!("expected ArgumentCount, got {:?}", other),
        }
        assert!(parse_formula("=IF(A1>0)").is_err());
    }

    #[test]
    fn test_unexpected_characters_rejected() {
        // The rewrite is strict: no best-effort pass-through of stray syntax
        assert!(parse_formula("=A1 & \"x\"").is_err());
        assert!(parse_formula("=SUM(A1:A5)").is_err()); // ranges unsupported
        assert!(parse_formula("=1+").is_err());
        assert!(parse_formula("=Sheet2!A1").is_err());
    }

    #[test]
    fn test_is_cell_reference() {
        assert!(is_cell_reference("A1"));
        assert!(is_cell_reference("AB123"));
        assert!(!is_cell_reference("A"));
        assert!(!is_cell_reference("123"));
        assert!(!is_cell_reference("A1B"));
        // Matches the pattern; the tokenizer's '(' lookahead is what turns
        // names like this into function calls instead
        assert!(is_cell_reference("LOG10"));
    }
}
