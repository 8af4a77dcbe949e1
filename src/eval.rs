//! Expression evaluation
//!
//! [`Expression`] is the parse / evaluate / free-variables / token-count
//! contract the classifier builds on. Evaluation is pure: a parsed
//! expression can be shared across threads and evaluated concurrently.

use std::collections::{BTreeSet, HashMap};
use std::hash::BuildHasher;
use std::ops::Range;

use crate::ast::*;
use crate::errors::{EvalError, ParseError};
use crate::library::Library;
use crate::parse;
use crate::types::Coord;

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Boolean(bool),
}


/// Name → value lookup used while evaluating.
pub trait Bindings {
    fn get(&self, name: &str) -> Option<f64>;
}

impl<S: BuildHasher> Bindings for HashMap<String, f64, S> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl<S: BuildHasher> Bindings for HashMap<&str, f64, S> {
    fn get(&self, name: &str) -> Option<f64> {
        HashMap::get(self, name).copied()
    }
}

impl Bindings for [(&str, f64)] {
    fn get(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> Bindings for [(&str, f64); N] {
    fn get(&self, name: &str) -> Option<f64> {
        Bindings::get(self.as_slice(), name)
    }
}

/// Binds `x`, `y`, `r` and `theta` for one point. The polar pair is only
/// computed when asked for.
#[derive(Debug, Clone, Copy)]
pub struct PointBindings(pub Coord);

impl Bindings for PointBindings {
    fn get(&self, name: &str) -> Option<f64> {
        match name {
            "x" => Some(self.0.x()),
            "y" => Some(self.0.y()),
            "r" => Some(self.0.dist_origin()),
            "theta" => Some(self.0.polar().1),
            _ => None,
        }
    }
}

/// Binds a single variable, used by the explicit and polar forms.
#[derive(Debug, Clone, Copy)]
pub struct SingleBinding<'a>(pub &'a str, pub f64);

impl Bindings for SingleBinding<'_> {
    fn get(&self, name: &str) -> Option<f64> {
        (name == self.0).then_some(self.1)
    }
}

/// A parsed, type-checked expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
    variables: BTreeSet<String>,
    tokens: usize,
}

impl Expression {
    /// Parse `source`, accepting any identifier as a free variable.
    pub fn parse(source: &str, library: &Library) -> Result<Self, ParseError> {
        let ast = parse::parse(source, library, None)?;
        Ok(Self::from_ast(source, ast))
    }

    /// Parse `source`, rejecting identifiers outside `variables` that are
    /// not library constants.
    pub fn parse_with_variables(source: &str, library: &Library, variables: &[&str]) -> Result<Self, ParseError> {
        let ast = parse::parse(source, library, Some(variables))?;
        Ok(Self::from_ast(source, ast))
    }

    /// Parse one side of an equation; spans in errors point into `full`.
    pub(crate) fn parse_fragment(
        full: &str,
        range: Range<usize>,
        library: &Library,
        variables: &[&str],
    ) -> Result<Self, ParseError> {
        let ast = parse::parse_fragment(full, range.clone(), library, Some(variables))?;
        Ok(Self::from_ast(full[range].trim(), ast))
    }

    fn from_ast(source: &str, ast: Expr) -> Self {
        let mut variables = BTreeSet::new();
        ast.for_each_variable(&mut |name| {
            variables.insert(name.to_string());
        });
        Self {
            source: source.to_string(),
            tokens: parse::count_tokens(source),
            ast,
            variables,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn kind(&self) -> ValueKind {
        self.ast.kind()
    }

    /// Free variables, sorted. Named constants are not variables.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(String::as_str)
    }

    /// True when every free variable is in `allowed`.
    pub fn uses_only(&self, allowed: &[&str]) -> bool {
        self.variables.iter().all(|v| allowed.contains(&v.as_str()))
    }

    pub fn token_count(&self) -> usize {
        self.tokens
    }

    /// True when the whole expression is the single token `name`.
    pub fn is_bare_variable(&self, name: &str) -> bool {
        self.tokens == 1 && matches!(&self.ast, Expr::Variable(v) if v == name)
    }

    pub fn evaluate<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<Value, EvalError> {
        match self.kind() {
            ValueKind::Number => self.evaluate_number(bindings).map(Value::Number),
            ValueKind::Boolean => eval_bool(&self.ast, bindings).map(Value::Boolean),
        }
    }

    /// Evaluate a numeric expression. A non-finite result is an error.
    pub fn evaluate_number<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<f64, EvalError> {
        if self.kind() != ValueKind::Number {
            return Err(EvalError::TypeMismatch { expected: "number", got: "boolean" });
        }
        let value = eval_number(&self.ast, bindings)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite { value })
        }
    }

    pub fn evaluate_bool<B: Bindings + ?Sized>(&self, bindings: &B) -> Result<bool, EvalError> {
        if self.kind() != ValueKind::Boolean {
            return Err(EvalError::TypeMismatch { expected: "boolean", got: "number" });
        }
        eval_bool(&self.ast, bindings)
    }
}

fn eval_number<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(n) | Expr::Constant(_, n) => Ok(*n),
        Expr::Variable(name) => bindings
            .get(name)
            .ok_or_else(|| EvalError::UnknownVariable { name: name.clone() }),
        Expr::Unary(UnaryOp::Neg, e) => Ok(-eval_number(e, bindings)?),
        Expr::Unary(UnaryOp::Pos, e) => eval_number(e, bindings),
        Expr::Binary(l, op, r) => {
            let a = eval_number(l, bindings)?;
            let b = eval_number(r, bindings)?;
            Ok(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::Pow => a.powf(b),
            })
        }
        Expr::Call(func, args) => {
            let mut values = [0.0; 2];
            for (slot, arg) in values.iter_mut().zip(args) {
                *slot = eval_number(arg, bindings)?;
            }
            let values = &values[..args.len().min(2)];
            let result = func.apply(values);
            if result.is_nan() && values.iter().all(|v| !v.is_nan()) {
                return Err(EvalError::Domain { function: func.name(), argument: values[0] });
            }
            Ok(result)
        }
        Expr::Compare(..) | Expr::Logic(..) | Expr::Not(_) => {
            Err(EvalError::TypeMismatch { expected: "number", got: "boolean" })
        }
    }
}

fn eval_bool<B: Bindings + ?Sized>(expr: &Expr, bindings: &B) -> Result<bool, EvalError> {
    match expr {
        Expr::Compare(l, op, r) => {
            let a = eval_number(l, bindings)?;
            let b = eval_number(r, bindings)?;
            Ok(match op {
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                CompareOp::Ge => a >= b,
                CompareOp::Ne => a != b,
            })
        }
        Expr::Logic(l, LogicOp::And, r) => Ok(eval_bool(l, bindings)? && eval_bool(r, bindings)?),
        Expr::Logic(l, LogicOp::Or, r) => Ok(eval_bool(l, bindings)? || eval_bool(r, bindings)?),
        Expr::Not(e) => Ok(!eval_bool(e, bindings)?),
        _ => Err(EvalError::TypeMismatch { expected: "boolean", got: "number" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expr(source: &str) -> Expression {
        Expression::parse(source, &Library::standard()).unwrap()
    }

    // ==================== Contract tests ====================

    #[test]
    fn variables_exclude_constants() {
        let e = expr("sin(pi * x) + y * e");
        assert_eq!(e.variables().collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(e.uses_only(&["x", "y"]));
        assert!(!e.uses_only(&["x"]));
    }

    #[test]
    fn bare_variable_needs_a_single_token() {
        assert!(expr("y").is_bare_variable("y"));
        assert!(expr(" y ").is_bare_variable("y"));
        assert!(!expr("(y)").is_bare_variable("y"));
        assert!(!expr("+y").is_bare_variable("y"));
        assert!(!expr("x").is_bare_variable("y"));
        assert!(!expr("pi").is_bare_variable("pi"));
    }

    #[test]
    fn fragment_keeps_its_own_source() {
        let full = "y == x + 1";
        let e = Expression::parse_fragment(full, 4..full.len(), &Library::standard(), &["x", "y"]).unwrap();
        assert_eq!(e.source(), "x + 1");
        assert_eq!(e.token_count(), 3);
    }

    #[test]
    fn kind_follows_the_tree() {
        assert_eq!(expr("x + 1").kind(), ValueKind::Number);
        assert_eq!(expr("x < 1").kind(), ValueKind::Boolean);
    }

    // ==================== Evaluation tests ====================

    #[test]
    fn evaluate_arithmetic() {
        let e = expr("2 * x^2 - 3 * y + 1");
        let v = e.evaluate_number(&[("x", 2.0), ("y", 1.0)]).unwrap();
        assert_eq!(v, 6.0);
    }

    #[test]
    fn evaluate_with_hashmap() {
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), 3.0);
        assert_eq!(expr("x % 2").evaluate(&vars), Ok(Value::Number(1.0)));
    }

    #[test]
    fn evaluate_predicates() {
        let e = expr("x > 0 && !(y > 0)");
        assert_eq!(e.evaluate_bool(&[("x", 1.0), ("y", -1.0)]), Ok(true));
        assert_eq!(e.evaluate_bool(&[("x", 1.0), ("y", 1.0)]), Ok(false));
        assert_eq!(e.evaluate(&[("x", -1.0), ("y", -1.0)]), Ok(Value::Boolean(false)));
    }

    #[test]
    fn point_bindings_provide_polar_pair() {
        let e = expr("r * cos(theta) - x");
        let v = e.evaluate_number(&PointBindings(Coord::new(3.0, 4.0))).unwrap();
        assert!(v.abs() < 1e-12);
        let r = expr("r").evaluate_number(&PointBindings(Coord::new(3.0, 4.0))).unwrap();
        assert_eq!(r, 5.0);
    }

    #[test]
    fn single_binding() {
        let e = expr("theta / 2");
        assert_eq!(e.evaluate_number(&SingleBinding("theta", 3.0)), Ok(1.5));
    }

    // ==================== Failure tests ====================

    #[test]
    fn unknown_variable_fails() {
        assert_eq!(
            expr("x + z").evaluate_number(&[("x", 1.0)]),
            Err(EvalError::UnknownVariable { name: "z".into() })
        );
    }

    #[test]
    fn domain_error_from_function() {
        assert_eq!(
            expr("sqrt(x)").evaluate_number(&[("x", -4.0)]),
            Err(EvalError::Domain { function: "sqrt", argument: -4.0 })
        );
        assert!(matches!(
            expr("log(x)").evaluate_number(&[("x", -1.0)]),
            Err(EvalError::Domain { function: "log", .. })
        ));
    }

    #[test]
    fn division_by_zero_is_not_finite() {
        assert!(matches!(
            expr("1 / x").evaluate_number(&[("x", 0.0)]),
            Err(EvalError::NonFinite { .. })
        ));
    }

    #[test]
    fn comparisons_of_infinities_still_evaluate() {
        assert_eq!(expr("1 / x > 0").evaluate_bool(&[("x", 0.0)]), Ok(true));
    }

    #[test]
    fn evaluating_the_wrong_kind_fails() {
        assert!(matches!(
            expr("x").evaluate_bool(&[("x", 0.0)]),
            Err(EvalError::TypeMismatch { expected: "boolean", .. })
        ));
        assert!(matches!(
            expr("x < 1").evaluate_number(&[("x", 0.0)]),
            Err(EvalError::TypeMismatch { expected: "number", .. })
        ));
    }
}
