//! Expression classifier
//!
//! Turns relation text into the cheapest [`Relation`] that renders it.
//! `y == f(x)` and `r == f(theta)` become parametric forms traced in
//! O(resolution); everything else is scanned as an implicit relation or a
//! predicate. The shortcut checks are exact, so a false negative costs speed
//! and never correctness.

use crate::ast::ValueKind;
use crate::errors::{ClassifyError, EqualityCountError, ParseError, named_source};
use crate::eval::{Expression, PointBindings, SingleBinding};
use crate::library::Library;
use crate::log::debug;
use crate::relation::Relation;

/// Variables an expression may mention.
pub const RECOGNIZED_VARIABLES: [&str; 4] = ["x", "y", "r", "theta"];

const EQUALS: &str = "==";

/// Classify a relation that may or may not be an equation.
///
/// Without `==` a boolean expression becomes a [`Relation::Predicate`] and a
/// numeric one an [`Relation::Implicit`] returning the raw value. With one
/// `==` this defers to [`classify_equation`].
pub fn classify(source: &str, library: &Library) -> Result<Relation, ClassifyError> {
    match source.matches(EQUALS).count() {
        0 => classify_expression(source, library),
        1 => classify_equation(source, library),
        found => Err(equality_count(source, found).into()),
    }
}

/// Classify `left == right`. Anything other than exactly one `==` is an
/// [`EqualityCountError`].
pub fn classify_equation(source: &str, library: &Library) -> Result<Relation, ClassifyError> {
    let positions: Vec<usize> = source.match_indices(EQUALS).map(|(i, _)| i).collect();
    let [split] = positions[..] else {
        return Err(equality_count(source, positions.len()).into());
    };

    let left = side(source, 0..split, library)?;
    let right = side(source, split + EQUALS.len()..source.len(), library)?;

    debug!(
        left = left.source(),
        left_tokens = left.token_count(),
        right = right.source(),
        right_tokens = right.token_count(),
        "equation sides"
    );

    let relation = if let Some(f) = parametric(&left, &right, "y", "x") {
        Relation::explicit(move |x| f.evaluate_number(&SingleBinding("x", x)))
    } else if let Some(f) = parametric(&left, &right, "r", "theta") {
        Relation::polar(move |theta| f.evaluate_number(&SingleBinding("theta", theta)))
    } else {
        Relation::implicit(move |c| {
            let bindings = PointBindings(c);
            Ok(left.evaluate_number(&bindings)? - right.evaluate_number(&bindings)?)
        })
    };

    debug!(source, kind = %relation.kind(), "classified equation");
    Ok(relation)
}

fn classify_expression(source: &str, library: &Library) -> Result<Relation, ClassifyError> {
    let expr = Expression::parse_with_variables(source, library, &RECOGNIZED_VARIABLES)?;
    debug!(source, tokens = expr.token_count(), "no equality");
    let relation = match expr.kind() {
        // A sample that fails to evaluate is outside the region
        ValueKind::Boolean => Relation::predicate(move |c| expr.evaluate_bool(&PointBindings(c)).unwrap_or(false)),
        ValueKind::Number => Relation::implicit(move |c| expr.evaluate_number(&PointBindings(c))),
    };
    debug!(source, kind = %relation.kind(), "classified expression");
    Ok(relation)
}

/// Parse one side of an equation, which must be numeric.
fn side(source: &str, range: std::ops::Range<usize>, library: &Library) -> Result<Expression, ParseError> {
    let expr = Expression::parse_fragment(source, range.clone(), library, &RECOGNIZED_VARIABLES)?;
    if expr.kind() != ValueKind::Number {
        return Err(ParseError::TypeMismatch {
            expected: ValueKind::Number.name(),
            got: expr.kind().name(),
            src: named_source(source),
            span: (range.start, range.len()).into(),
        });
    }
    Ok(expr)
}

/// If one side is exactly `dependent` and the other mentions only
/// `independent`, return the other side.
fn parametric(left: &Expression, right: &Expression, dependent: &str, independent: &str) -> Option<Expression> {
    if left.is_bare_variable(dependent) && right.uses_only(&[independent]) {
        Some(right.clone())
    } else if right.is_bare_variable(dependent) && left.uses_only(&[independent]) {
        Some(left.clone())
    } else {
        None
    }
}

fn equality_count(source: &str, found: usize) -> EqualityCountError {
    EqualityCountError {
        found,
        src: named_source(source),
        span: (0, source.len()).into(),
    }
}
