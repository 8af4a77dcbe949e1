//! Parse pest pairs into AST nodes
//!
//! The builder resolves constants and functions against a [`Library`] and
//! type-checks as it goes, so a successfully parsed tree always evaluates to
//! the [`ValueKind`] it reports.

use std::ops::Range;

use miette::SourceSpan;
use pest::Parser;
use pest::iterators::Pair;

use crate::ast::*;
use crate::errors::{ParseError, ValidationError, named_source};
use crate::library::Library;
use crate::types::Area;
use crate::{ExprParser, Rule};

/// Parse a complete expression.
///
/// With `variables = Some(names)`, any identifier that is neither a constant
/// nor one of `names` is rejected.
pub fn parse(source: &str, library: &Library, variables: Option<&[&str]>) -> Result<Expr, ParseError> {
    parse_fragment(source, 0..source.len(), library, variables)
}

/// Parse `full[range]`, reporting spans relative to `full`.
pub(crate) fn parse_fragment(
    full: &str,
    range: Range<usize>,
    library: &Library,
    variables: Option<&[&str]>,
) -> Result<Expr, ParseError> {
    let text = &full[range.clone()];
    let builder = Builder { library, variables, full, offset: range.start };

    let mut pairs = ExprParser::parse(Rule::expression, text).map_err(|e| {
        let (start, len) = match e.location {
            pest::error::InputLocation::Pos(p) => (p, 0),
            pest::error::InputLocation::Span((s, end)) => (s, end - s),
        };
        ParseError::Syntax {
            message: e.variant.message().to_string(),
            src: named_source(full),
            span: (range.start + start, len).into(),
        }
    })?;

    let root = pairs
        .next()
        .and_then(|p| p.into_inner().find(|p| p.as_rule() == Rule::or_expr))
        .ok_or_else(|| builder.syntax("empty expression", 0..text.len()))?;

    Ok(builder.build(root)?.expr)
}

/// Parse a viewport literal `{(x0, y0), (x1, y1)}` into an [`Area`].
pub fn parse_viewport(text: &str) -> Result<Area, ValidationError> {
    let malformed = || ValidationError::MalformedViewport { input: text.to_string() };

    let viewport = ExprParser::parse(Rule::viewport, text)
        .map_err(|_| malformed())?
        .next()
        .ok_or_else(malformed)?;

    let mut values = Vec::with_capacity(4);
    for point in viewport.into_inner().filter(|p| p.as_rule() == Rule::point) {
        for signed in point.into_inner() {
            values.push(signed.as_str().parse::<f64>().map_err(|_| malformed())?);
        }
    }
    let [x0, y0, x1, y1] = values[..] else {
        return Err(malformed());
    };
    Area::try_new(x0, y0, x1, y1)
}

/// Number of lexical tokens in `text` (numbers, identifiers, operators,
/// parentheses, commas).
pub fn count_tokens(text: &str) -> usize {
    ExprParser::parse(Rule::token_stream, text)
        .ok()
        .and_then(|mut pairs| pairs.next())
        .map(|stream| stream.into_inner().filter(|p| p.as_rule() != Rule::EOI).count())
        .unwrap_or(0)
}

/// An expression together with where it came from.
struct Node {
    expr: Expr,
    span: SourceSpan,
}

struct Builder<'a> {
    library: &'a Library,
    variables: Option<&'a [&'a str]>,
    full: &'a str,
    offset: usize,
}

impl Builder<'_> {
    fn span(&self, pair: &Pair<Rule>) -> SourceSpan {
        let s = pair.as_span();
        (self.offset + s.start(), s.end() - s.start()).into()
    }

    fn syntax(&self, message: &str, range: Range<usize>) -> ParseError {
        ParseError::Syntax {
            message: message.to_string(),
            src: named_source(self.full),
            span: (self.offset + range.start, range.len()).into(),
        }
    }

    fn expect(&self, node: &Node, kind: ValueKind) -> Result<(), ParseError> {
        let got = node.expr.kind();
        if got == kind {
            Ok(())
        } else {
            Err(ParseError::TypeMismatch {
                expected: kind.name(),
                got: got.name(),
                src: named_source(self.full),
                span: node.span,
            })
        }
    }

    fn build(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let expr = match pair.as_rule() {
            Rule::or_expr => return self.build_logic(pair, LogicOp::Or),
            Rule::and_expr => return self.build_logic(pair, LogicOp::And),
            Rule::not_expr => return self.build_not(pair),
            Rule::comparison => return self.build_comparison(pair),
            Rule::sum | Rule::product => return self.build_arithmetic(pair),
            Rule::unary => return self.build_unary(pair),
            Rule::power => return self.build_power(pair),
            Rule::call => return self.build_call(pair),
            Rule::number => {
                let text = pair.as_str();
                let value: f64 = text.parse().map_err(|_| {
                    let s = pair.as_span();
                    self.syntax(&format!("invalid number `{}`", text), s.start()..s.end())
                })?;
                Expr::Number(value)
            }
            Rule::ident => {
                let name = pair.as_str();
                if let Some(value) = self.library.constant(name) {
                    Expr::Constant(name.to_string(), value)
                } else if self.variables.is_none_or(|vars| vars.contains(&name)) {
                    Expr::Variable(name.to_string())
                } else {
                    return Err(ParseError::UnknownVariable {
                        name: name.to_string(),
                        src: named_source(self.full),
                        span,
                    });
                }
            }
            rule => {
                let s = pair.as_span();
                return Err(self.syntax(&format!("unexpected {:?}", rule), s.start()..s.end()));
            }
        };
        Ok(Node { expr, span })
    }

    fn build_logic(&self, pair: Pair<Rule>, op: LogicOp) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner().filter(|p| !matches!(p.as_rule(), Rule::or_op | Rule::and_op));
        let first = inner.next().ok_or_else(|| self.syntax("missing operand", 0..0))?;
        let mut acc = self.build(first)?;

        for operand in inner {
            let rhs = self.build(operand)?;
            self.expect(&acc, ValueKind::Boolean)?;
            self.expect(&rhs, ValueKind::Boolean)?;
            acc = Node { expr: Expr::Logic(Box::new(acc.expr), op, Box::new(rhs.expr)), span };
        }
        Ok(acc)
    }

    fn build_not(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let mut negations = 0;
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::not_op => negations += 1,
                _ => operand = Some(self.build(inner)?),
            }
        }
        let mut node = operand.ok_or_else(|| self.syntax("missing operand after `!`", 0..0))?;
        if negations > 0 {
            self.expect(&node, ValueKind::Boolean)?;
        }
        for _ in 0..negations {
            node = Node { expr: Expr::Not(Box::new(node.expr)), span };
        }
        Ok(node)
    }

    fn build_comparison(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let lhs = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(self.syntax("missing operand", 0..0)),
        };
        let Some(op_pair) = inner.next() else {
            return Ok(lhs);
        };
        let op = match op_pair.as_str() {
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            "!=" => CompareOp::Ne,
            other => {
                let s = op_pair.as_span();
                return Err(self.syntax(&format!("unknown comparison `{}`", other), s.start()..s.end()));
            }
        };
        let rhs = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(self.syntax("missing right operand", 0..0)),
        };
        self.expect(&lhs, ValueKind::Number)?;
        self.expect(&rhs, ValueKind::Number)?;
        Ok(Node { expr: Expr::Compare(Box::new(lhs.expr), op, Box::new(rhs.expr)), span })
    }

    fn build_arithmetic(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        // sum = product ~ (add_op ~ product)*, product = unary ~ (mul_op ~ unary)*
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let mut acc = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(self.syntax("missing operand", 0..0)),
        };

        while let Some(op_pair) = inner.next() {
            let op = match op_pair.as_str() {
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "%" => BinaryOp::Rem,
                other => {
                    let s = op_pair.as_span();
                    return Err(self.syntax(&format!("unknown operator `{}`", other), s.start()..s.end()));
                }
            };
            let rhs = match inner.next() {
                Some(p) => self.build(p)?,
                None => return Err(self.syntax("missing right operand", 0..0)),
            };
            self.expect(&acc, ValueKind::Number)?;
            self.expect(&rhs, ValueKind::Number)?;
            acc = Node { expr: Expr::Binary(Box::new(acc.expr), op, Box::new(rhs.expr)), span };
        }
        Ok(acc)
    }

    fn build_unary(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let mut signs = Vec::new();
        let mut operand = None;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::sign_op if inner.as_str() == "-" => signs.push(UnaryOp::Neg),
                Rule::sign_op => signs.push(UnaryOp::Pos),
                _ => operand = Some(self.build(inner)?),
            }
        }
        let mut node = operand.ok_or_else(|| self.syntax("missing operand after sign", 0..0))?;
        if !signs.is_empty() {
            self.expect(&node, ValueKind::Number)?;
        }
        // Innermost sign applies first
        for op in signs.into_iter().rev() {
            node = Node { expr: Expr::Unary(op, Box::new(node.expr)), span };
        }
        Ok(node)
    }

    fn build_power(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        // power = primary ~ (pow_op ~ unary)?
        let span = self.span(&pair);
        let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::pow_op);
        let base = match inner.next() {
            Some(p) => self.build(p)?,
            None => return Err(self.syntax("missing operand", 0..0)),
        };
        let Some(exponent) = inner.next() else {
            return Ok(base);
        };
        let exponent = self.build(exponent)?;
        self.expect(&base, ValueKind::Number)?;
        self.expect(&exponent, ValueKind::Number)?;
        Ok(Node {
            expr: Expr::Binary(Box::new(base.expr), BinaryOp::Pow, Box::new(exponent.expr)),
            span,
        })
    }

    fn build_call(&self, pair: Pair<Rule>) -> Result<Node, ParseError> {
        let span = self.span(&pair);
        let mut inner = pair.into_inner();
        let name_pair = inner.next().ok_or_else(|| self.syntax("missing function name", 0..0))?;
        let name = name_pair.as_str();
        let func = self.library.function(name).ok_or_else(|| ParseError::UnknownFunction {
            name: name.to_string(),
            src: named_source(self.full),
            span: self.span(&name_pair),
        })?;

        let mut args = Vec::new();
        for arg_pair in inner {
            let arg = self.build(arg_pair)?;
            self.expect(&arg, ValueKind::Number)?;
            args.push(arg.expr);
        }
        if args.len() != func.arity() {
            return Err(ParseError::WrongArity {
                name: name.to_string(),
                expected: func.arity(),
                got: args.len(),
                src: named_source(self.full),
                span,
            });
        }
        Ok(Node { expr: Expr::Call(func, args), span })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> Library {
        Library::standard()
    }

    fn show(source: &str) -> String {
        parse(source, &lib(), None)
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", source, e))
            .to_string()
    }

    // ==================== Grammar tests ====================

    #[test]
    fn parse_precedence() {
        assert_eq!(show("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(show("(1 + 2) * 3"), "((1 + 2) * 3)");
        assert_eq!(show("1 - 2 - 3"), "((1 - 2) - 3)");
    }

    #[test]
    fn parse_power_is_right_associative() {
        assert_eq!(show("2^3^2"), "(2 ^ (3 ^ 2))");
        assert_eq!(show("x**2"), "(x ^ 2)");
    }

    #[test]
    fn parse_negation_binds_looser_than_power() {
        assert_eq!(show("-x^2"), "(-(x ^ 2))");
        assert_eq!(show("2^-x"), "(2 ^ (-x))");
    }

    #[test]
    fn parse_mul_is_not_pow() {
        assert_eq!(show("x*y"), "(x * y)");
        assert_eq!(show("x % 2"), "(x % 2)");
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse("1.5e2", &lib(), None).unwrap(), Expr::Number(150.0));
        assert_eq!(parse(".5", &lib(), None).unwrap(), Expr::Number(0.5));
        assert_eq!(parse("3.", &lib(), None).unwrap(), Expr::Number(3.0));
    }

    #[test]
    fn parse_boolean_connectives() {
        assert_eq!(show("x < 1 && y >= 2 || !(x != y)"), "(((x < 1) && (y >= 2)) || (!(x != y)))");
    }

    #[test]
    fn parse_resolves_constants_and_calls() {
        let expr = parse("sin(pi * x)", &lib(), None).unwrap();
        match expr {
            Expr::Call(crate::library::Builtin::Sin, args) => {
                assert!(matches!(&args[0], Expr::Binary(l, BinaryOp::Mul, _)
                    if matches!(**l, Expr::Constant(ref n, _) if n == "pi")));
            }
            other => panic!("expected sin call, got {:?}", other),
        }
        assert_eq!(show("atan2(y, x)"), "atan2(y, x)");
    }

    // ==================== Error tests ====================

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(parse("x +", &lib(), None), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("2x", &lib(), None), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("", &lib(), None), Err(ParseError::Syntax { .. })));
        assert!(matches!(parse("x == 1", &lib(), None), Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn parse_rejects_unknown_function() {
        assert!(matches!(
            parse("sec(x)", &lib(), None),
            Err(ParseError::UnknownFunction { name, .. }) if name == "sec"
        ));
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!(matches!(
            parse("atan2(x)", &lib(), None),
            Err(ParseError::WrongArity { expected: 2, got: 1, .. })
        ));
        assert!(matches!(
            parse("sin(x, y)", &lib(), None),
            Err(ParseError::WrongArity { expected: 1, got: 2, .. })
        ));
    }

    #[test]
    fn parse_rejects_unlisted_variable() {
        let allowed = ["x", "y"];
        assert!(parse("x + y", &lib(), Some(&allowed)).is_ok());
        assert!(parse("x + pi", &lib(), Some(&allowed)).is_ok());
        assert!(matches!(
            parse("x + z", &lib(), Some(&allowed)),
            Err(ParseError::UnknownVariable { name, .. }) if name == "z"
        ));
    }

    #[test]
    fn parse_type_checks() {
        assert!(matches!(
            parse("x + (y < 1)", &lib(), None),
            Err(ParseError::TypeMismatch { expected: "number", got: "boolean", .. })
        ));
        assert!(matches!(
            parse("x && y", &lib(), None),
            Err(ParseError::TypeMismatch { expected: "boolean", got: "number", .. })
        ));
        assert!(matches!(parse("!x", &lib(), None), Err(ParseError::TypeMismatch { .. })));
    }

    #[test]
    fn fragment_spans_are_relative_to_full_source() {
        let full = "y == sec(x)";
        let err = parse_fragment(full, 4..full.len(), &lib(), None).unwrap_err();
        match err {
            ParseError::UnknownFunction { span, .. } => {
                assert_eq!(span.offset(), 5);
                assert_eq!(span.len(), 3);
            }
            other => panic!("expected unknown function, got {:?}", other),
        }
    }

    #[test]
    fn syntax_error_points_past_dangling_operator() {
        let full = "y == x +";
        let err = parse_fragment(full, 4..full.len(), &lib(), None).unwrap_err();
        match err {
            ParseError::Syntax { span, .. } => assert_eq!(span.offset(), full.len()),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    // ==================== Viewport tests ====================

    #[test]
    fn parse_viewport_literal() {
        let area = parse_viewport("{(-5, 5), (5, -5)}").unwrap();
        assert_eq!(area, Area::try_new(-5.0, 5.0, 5.0, -5.0).unwrap());
        let area = parse_viewport("{(-1.5,+2),(3e0,-0.5)}").unwrap();
        assert_eq!(area.width(), 4.5);
    }

    #[test]
    fn parse_viewport_rejects_garbage() {
        assert!(matches!(parse_viewport("(-5, 5), (5, -5)"), Err(ValidationError::MalformedViewport { .. })));
        assert!(matches!(parse_viewport("{(-5, 5)}"), Err(ValidationError::MalformedViewport { .. })));
        assert!(matches!(
            parse_viewport("{(5, 5), (-5, -5)}"),
            Err(ValidationError::MisorderedCorners { .. })
        ));
    }

    // ==================== Token tests ====================

    #[test]
    fn count_tokens_counts_lexemes() {
        assert_eq!(count_tokens("y"), 1);
        assert_eq!(count_tokens(" y "), 1);
        assert_eq!(count_tokens("(y)"), 3);
        assert_eq!(count_tokens("x^2 + 1"), 5);
        assert_eq!(count_tokens("sin(x)**2"), 6);
    }
}
