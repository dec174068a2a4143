//! Formula parser
//!
//! A recursive descent parser over the lexer's token stream. There are no infix operators:
//! adjacent expressions are joined by implicit concatenation, and function arguments are
//! whatever runs of expressions sit between `;`/`,` separators.
//!
//! Nesting is not limited: each nested call adds a stack frame here and in the evaluator,
//! so deeply nested input from untrusted sources can overflow the stack. Callers can check
//! [`FormulaExpr::depth`] before evaluating.

use crate::ast::FormulaExpr;
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::value::FormulaValue;

/// Parse formula source into an AST
///
/// # Example
/// ```rust
/// use ppformula::{builtin_registry, parse_formula};
///
/// let ast = parse_formula("Hello [[Name]]", builtin_registry()).unwrap();
/// let ast = parse_formula("=UPPERCASE([[Name]])", builtin_registry()).unwrap();
/// assert!(parse_formula("=UPPERCASE([[Name]]", builtin_registry()).is_err());
/// ```
pub fn parse_formula(source: &str, registry: &FunctionRegistry) -> FormulaResult<FormulaExpr> {
    let tokens = tokenize(source);
    parse_tokens(&tokens, registry)
}

/// Parse an already tokenized formula
pub fn parse_tokens(tokens: &[Token], registry: &FunctionRegistry) -> FormulaResult<FormulaExpr> {
    let mut parser = FormulaParser::new(tokens, registry);
    let mut nodes = Vec::new();
    while !parser.is_at_end() {
        nodes.push(parser.parse_expression()?);
    }

    tracing::trace!(nodes = nodes.len(), "parsed formula");

    if nodes.len() == 1 {
        if let Some(node) = nodes.pop() {
            return Ok(node);
        }
    }
    Ok(FormulaExpr::Concat(nodes))
}

struct FormulaParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    registry: &'a FunctionRegistry,
}

impl<'a> FormulaParser<'a> {
    fn new(tokens: &'a [Token], registry: &'a FunctionRegistry) -> Self {
        Self {
            tokens,
            pos: 0,
            registry,
        }
    }

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        let Some(token) = self.current() else {
            return Ok(FormulaExpr::empty());
        };

        let expr = match token {
            Token::Function(_) => return self.parse_function_call(),
            Token::Field(name) => FormulaExpr::Field(name.clone()),
            Token::String(s) | Token::Date(s) | Token::Text(s) => {
                FormulaExpr::Literal(FormulaValue::String(s.clone()))
            }
            Token::Number(n) => FormulaExpr::Literal(FormulaValue::Number(*n)),
            Token::Operator(op) => FormulaExpr::Literal(FormulaValue::String(op.to_string())),
            // Stray structural tokens degrade to nothing
            Token::LeftParen | Token::RightParen | Token::Semicolon | Token::Comma => {
                FormulaExpr::empty()
            }
        };
        self.pos += 1;
        Ok(expr)
    }

    fn parse_function_call(&mut self) -> FormulaResult<FormulaExpr> {
        let name = match self.current() {
            Some(Token::Function(name)) => name.clone(),
            other => return Err(Self::unexpected("FUNCTION", other)),
        };
        self.pos += 1;

        if self.registry.get(&name).is_none() {
            tracing::debug!(function = %name, "call to unregistered function");
        }

        self.expect(TokenKind::LeftParen, "LPAREN")?;

        let mut args = Vec::new();
        while self.current().map_or(false, |t| *t != Token::RightParen) {
            let mut parts = Vec::new();
            let mut depth = 0usize;

            while let Some(token) = self.current() {
                match token {
                    Token::LeftParen => depth += 1,
                    Token::RightParen if depth == 0 => break,
                    Token::RightParen => depth -= 1,
                    Token::Semicolon | Token::Comma if depth == 0 => break,
                    _ => {}
                }
                parts.push(self.parse_expression()?);
            }

            match parts.len() {
                0 => {}
                1 => args.extend(parts),
                _ => args.push(FormulaExpr::Concat(parts)),
            }

            if matches!(self.current(), Some(Token::Semicolon | Token::Comma)) {
                self.pos += 1;
            }
        }

        self.expect(TokenKind::RightParen, "RPAREN")?;

        Ok(FormulaExpr::Function { name, args })
    }

    // === Helper methods ===

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> FormulaResult<()> {
        match self.current() {
            Some(token) if token.kind() == kind => {
                self.pos += 1;
                Ok(())
            }
            other => Err(Self::unexpected(expected, other)),
        }
    }

    fn unexpected(expected: &'static str, found: Option<&Token>) -> FormulaError {
        let found = found.map_or_else(|| "EOF".to_string(), |t| t.kind().to_string());
        FormulaError::expected(expected, found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::builtin_registry;

    fn parse(source: &str) -> FormulaResult<FormulaExpr> {
        parse_formula(source, builtin_registry())
    }

    fn lit(s: &str) -> FormulaExpr {
        FormulaExpr::Literal(FormulaValue::String(s.into()))
    }

    fn num(n: f64) -> FormulaExpr {
        FormulaExpr::Literal(FormulaValue::Number(n))
    }

    fn field(name: &str) -> FormulaExpr {
        FormulaExpr::Field(name.into())
    }

    #[test]
    fn test_parse_single_node() {
        assert_eq!(parse("[[Name]]").unwrap(), field("Name"));
        assert_eq!(parse("42").unwrap(), num(42.0));
        assert_eq!(parse("'hi'").unwrap(), lit("hi"));
    }

    #[test]
    fn test_parse_empty_source() {
        assert_eq!(parse("").unwrap(), FormulaExpr::Concat(vec![]));
        assert_eq!(parse("  // only a comment").unwrap(), FormulaExpr::Concat(vec![]));
    }

    #[test]
    fn test_parse_top_level_concat() {
        assert_eq!(
            parse("Dear [[Name]]").unwrap(),
            FormulaExpr::Concat(vec![lit("Dear"), field("Name")])
        );
    }

    #[test]
    fn test_parse_function_args() {
        let ast = parse("=SUM([[A]]; 2, 3)").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![field("A"), num(2.0), num(3.0)],
            }
        );
    }

    #[test]
    fn test_parse_argument_concat() {
        let ast = parse("=UPPERCASE(Name: [[Name]])").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "UPPERCASE".into(),
                args: vec![FormulaExpr::Concat(vec![lit("Name:"), field("Name")])],
            }
        );
    }

    #[test]
    fn test_parse_nested_calls() {
        let ast = parse("=IF(=GTNUM(5;3); Pass; Fail)").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "IF".into(),
                args: vec![
                    FormulaExpr::Function {
                        name: "GTNUM".into(),
                        args: vec![num(5.0), num(3.0)],
                    },
                    lit("Pass"),
                    lit("Fail"),
                ],
            }
        );
    }

    #[test]
    fn test_parse_empty_argument_slots_are_dropped() {
        let ast = parse("=APPEND(;a;;b)").unwrap();
        assert_eq!(
            ast,
            FormulaExpr::Function {
                name: "APPEND".into(),
                args: vec![lit("a"), lit("b")],
            }
        );
    }

    #[test]
    fn test_parse_inner_parens_degrade() {
        let ast = parse("=CALC((1+2)*3)").unwrap();
        let FormulaExpr::Function { args, .. } = ast else {
            panic!("expected function");
        };
        assert_eq!(args.len(), 1);
        assert_eq!(
            args[0],
            FormulaExpr::Concat(vec![
                FormulaExpr::empty(),
                num(1.0),
                lit("+"),
                num(2.0),
                FormulaExpr::empty(),
                lit("*"),
                num(3.0),
            ])
        );
    }

    #[test]
    fn test_parse_missing_rparen() {
        let err = parse("=UPPERCASE([[Name]]").unwrap_err();
        assert_eq!(err.to_string(), "Expected RPAREN but got EOF");
    }

    #[test]
    fn test_parse_missing_lparen() {
        let err = parse("=UPPERCASE [[Name]]").unwrap_err();
        assert_eq!(err.to_string(), "Expected LPAREN but got FIELD");
    }

    #[test]
    fn test_parse_unknown_function_still_parses() {
        let ast = parse("=NOTAREALFUNCTION(x)").unwrap();
        assert!(matches!(ast, FormulaExpr::Function { ref name, .. } if name == "NOTAREALFUNCTION"));
    }
}
