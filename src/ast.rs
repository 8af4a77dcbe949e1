//! Abstract Syntax Tree types for expressions
//!
//! These types represent the parsed structure of one side of a relation.

use std::fmt;

use crate::library::Builtin;

/// Static type of an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Boolean,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
        }
    }
}

/// An expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Numeric literal
    Number(f64),
    /// Named constant resolved from the library at parse time: pi, e, ...
    Constant(String, f64),
    /// Free variable bound at evaluation time: x, y, r, theta
    Variable(String),
    /// -e, +e
    Unary(UnaryOp, Box<Expr>),
    /// Arithmetic: a + b, a ^ b, ...
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// a < b, a != b, ...
    Compare(Box<Expr>, CompareOp, Box<Expr>),
    /// a && b, a || b
    Logic(Box<Expr>, LogicOp, Box<Expr>),
    /// !a
    Not(Box<Expr>),
    /// Builtin function call
    Call(Builtin, Vec<Expr>),
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
        }
    }
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Ne => "!=",
        }
    }
}

impl Expr {
    /// Static type of this node.
    pub fn kind(&self) -> ValueKind {
        match self {
            Expr::Compare(..) | Expr::Logic(..) | Expr::Not(_) => ValueKind::Boolean,
            _ => ValueKind::Number,
        }
    }

    /// Visit every variable name in this tree.
    pub fn for_each_variable<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            Expr::Variable(name) => f(name),
            Expr::Number(_) | Expr::Constant(..) => {}
            Expr::Unary(_, e) | Expr::Not(e) => e.for_each_variable(f),
            Expr::Binary(l, _, r) | Expr::Compare(l, _, r) | Expr::Logic(l, _, r) => {
                l.for_each_variable(f);
                r.for_each_variable(f);
            }
            Expr::Call(_, args) => args.iter().for_each(|a| a.for_each_variable(f)),
        }
    }
}

/// Fully parenthesized rendering, used in logs and tests.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{}", n),
            Expr::Constant(name, _) | Expr::Variable(name) => f.write_str(name),
            Expr::Unary(UnaryOp::Neg, e) => write!(f, "(-{})", e),
            Expr::Unary(UnaryOp::Pos, e) => write!(f, "(+{})", e),
            Expr::Binary(l, op, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Expr::Compare(l, op, r) => write!(f, "({} {} {})", l, op.symbol(), r),
            Expr::Logic(l, LogicOp::And, r) => write!(f, "({} && {})", l, r),
            Expr::Logic(l, LogicOp::Or, r) => write!(f, "({} || {})", l, r),
            Expr::Not(e) => write!(f, "(!{})", e),
            Expr::Call(func, args) => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
