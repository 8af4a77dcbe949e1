//! Function and constant tables available to expressions.
//!
//! A [`Library`] is an immutable value built once and handed to the parser
//! and classifier explicitly.

use std::collections::HashMap;
use std::f64::consts::{E, PI, TAU};

/// The golden ratio φ
pub const PHI: f64 = 1.618_033_988_749_895;

/// Builtin numeric functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Abs,
    Acos,
    Acosh,
    Asin,
    Asinh,
    Atan,
    Atan2,
    Atanh,
    Ceil,
    Cos,
    Cosh,
    Exp,
    Floor,
    Gamma,
    /// Natural logarithm
    Ln,
    /// Base-10 logarithm
    Log,
    Sin,
    Sinh,
    Sqrt,
    Tan,
    Tanh,
}

impl Builtin {
    pub const ALL: [Builtin; 21] = [
        Builtin::Abs,
        Builtin::Acos,
        Builtin::Acosh,
        Builtin::Asin,
        Builtin::Asinh,
        Builtin::Atan,
        Builtin::Atan2,
        Builtin::Atanh,
        Builtin::Ceil,
        Builtin::Cos,
        Builtin::Cosh,
        Builtin::Exp,
        Builtin::Floor,
        Builtin::Gamma,
        Builtin::Ln,
        Builtin::Log,
        Builtin::Sin,
        Builtin::Sinh,
        Builtin::Sqrt,
        Builtin::Tan,
        Builtin::Tanh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Abs => "abs",
            Builtin::Acos => "acos",
            Builtin::Acosh => "acosh",
            Builtin::Asin => "asin",
            Builtin::Asinh => "asinh",
            Builtin::Atan => "atan",
            Builtin::Atan2 => "atan2",
            Builtin::Atanh => "atanh",
            Builtin::Ceil => "ceil",
            Builtin::Cos => "cos",
            Builtin::Cosh => "cosh",
            Builtin::Exp => "exp",
            Builtin::Floor => "floor",
            Builtin::Gamma => "gamma",
            Builtin::Ln => "ln",
            Builtin::Log => "log",
            Builtin::Sin => "sin",
            Builtin::Sinh => "sinh",
            Builtin::Sqrt => "sqrt",
            Builtin::Tan => "tan",
            Builtin::Tanh => "tanh",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Builtin::Atan2 => 2,
            _ => 1,
        }
    }

    /// Apply to already-evaluated arguments. `args.len()` equals `arity()`;
    /// the parser enforces it.
    pub fn apply(self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Builtin::Abs => a.abs(),
            Builtin::Acos => a.acos(),
            Builtin::Acosh => a.acosh(),
            Builtin::Asin => a.asin(),
            Builtin::Asinh => a.asinh(),
            Builtin::Atan => a.atan(),
            Builtin::Atan2 => a.atan2(args.get(1).copied().unwrap_or(f64::NAN)),
            Builtin::Atanh => a.atanh(),
            Builtin::Ceil => a.ceil(),
            Builtin::Cos => a.cos(),
            Builtin::Cosh => a.cosh(),
            Builtin::Exp => a.exp(),
            Builtin::Floor => a.floor(),
            Builtin::Gamma => gamma(a),
            Builtin::Ln => a.ln(),
            Builtin::Log => a.log10(),
            Builtin::Sin => a.sin(),
            Builtin::Sinh => a.sinh(),
            Builtin::Sqrt => a.sqrt(),
            Builtin::Tan => a.tan(),
            Builtin::Tanh => a.tanh(),
        }
    }
}

// Lanczos approximation, g = 7, n = 9
const LANCZOS_G: f64 = 7.0;
#[rustfmt::skip]
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Γ(x). NaN at the poles (zero and the negative integers).
pub fn gamma(x: f64) -> f64 {
    if x.is_nan() || (x <= 0.0 && x == x.floor()) {
        return f64::NAN;
    }
    if x < 0.5 {
        // Reflection formula
        return PI / ((PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let t = x + LANCZOS_G + 0.5;
    let sum = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64));
    TAU.sqrt() * t.powf(x + 0.5) * (-t).exp() * sum
}

/// Functions and named constants visible to expressions.
#[derive(Debug, Clone)]
pub struct Library {
    functions: HashMap<&'static str, Builtin>,
    constants: HashMap<String, f64>,
}

impl Default for Library {
    fn default() -> Self {
        Self::standard()
    }
}

impl Library {
    /// All builtins plus pi, tau, e and phi.
    pub fn standard() -> Self {
        let functions = Builtin::ALL.iter().map(|b| (b.name(), *b)).collect();

        let mut constants = HashMap::new();
        macro_rules! constants {
            ($($name:ident => $value:expr),* $(,)?) => {
                $(
                    constants.insert(stringify!($name).to_string(), $value);
                )*
            };
        }
        constants! {
            pi  => PI,
            tau => TAU,
            e   => E,
            phi => PHI,
        }

        Self { functions, constants }
    }

    /// Add or replace a named constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: f64) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    pub fn function(&self, name: &str) -> Option<Builtin> {
        self.functions.get(name).copied()
    }

    pub fn constant(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }
}
