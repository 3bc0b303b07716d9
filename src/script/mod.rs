//! Expression compiler for connection functions
//!
//! Turns a single-line definition such as `(x, y){ x * y + 0.5 }` into a
//! [`CompiledExpression`] that can be called every tick without re-parsing.
//!
//! # Pipeline
//!
//! ```text
//! "(a,b){a+b*2}" ──► strip whitespace ──► split params / body
//!                                              │
//!                          tokenize ◄──────────┘
//!                              │
//!                          Parser (per-level reduce) ──► Node tree
//!                                                            │
//!                                   CompiledExpression<N> ◄──┘
//!                                   (tree + N argument cells)
//! ```
//!
//! Operators: `+ -` (1), `* /` (2), `^` (3). Equal priorities reduce from the
//! left, including `^`, so `2^3^2` is `(2^3)^2`.

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{BinaryOp, Node};
pub use error::CompileError;

use std::cell::Cell;
use std::fmt;
use tracing::debug;

/// Largest number of parameters a function may declare
pub const MAX_ARITY: usize = 3;

/// Executable float function of `N` parameters.
///
/// Parameters live in an arena of cells owned by this value alone. `call`
/// writes the arguments into the cells, then walks the prebuilt tree.
pub struct CompiledExpression<const N: usize> {
    root: Node,
    cells: [Cell<f32>; N],
    source: String,
}

impl<const N: usize> CompiledExpression<N> {
    pub fn call(&self, args: [f32; N]) -> f32 {
        for (cell, value) in self.cells.iter().zip(args) {
            cell.set(value);
        }
        self.root.eval(&self.cells)
    }

    pub fn tree(&self) -> &Node {
        &self.root
    }

    /// Whitespace-stripped definition this was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl<const N: usize> fmt::Debug for CompiledExpression<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledExpression")
            .field("arity", &N)
            .field("source", &self.source)
            .field("tree", &self.root.to_string())
            .finish()
    }
}

/// Compiles `definition` as a function of exactly `N` parameters.
pub fn compile<const N: usize>(definition: &str) -> Result<CompiledExpression<N>, CompileError> {
    if N > MAX_ARITY {
        return Err(CompileError::UnsupportedArity(N));
    }

    let source: String = definition.chars().filter(|c| !c.is_whitespace()).collect();
    let (params, body) = split_definition(&source)?;

    if params.len() != N {
        return Err(CompileError::ParameterCount {
            expected: N,
            found: params.len(),
        });
    }

    let tokens = lexer::tokenize(body)?;
    let root = parser::Parser::new(&tokens, &params).parse()?;
    debug!("Compiled \"{}\" into {}", source, root);

    Ok(CompiledExpression {
        root,
        cells: std::array::from_fn(|_| Cell::new(0.0)),
        source,
    })
}

/// Splits `(p0,p1){body}` into validated parameter names and the body text
fn split_definition(source: &str) -> Result<(Vec<&str>, &str), CompileError> {
    let malformed = || CompileError::MalformedFunction(source.to_string());

    let rest = source.strip_prefix('(').ok_or_else(malformed)?;
    let close = rest.find(')').ok_or_else(malformed)?;
    let (param_list, rest) = rest.split_at(close);
    let body = rest
        .strip_prefix("){")
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(malformed)?;
    if body.is_empty() {
        return Err(malformed());
    }

    let mut params: Vec<&str> = Vec::new();
    if !param_list.is_empty() {
        for name in param_list.split(',') {
            if name.is_empty() || lexer::ident_len(name.as_bytes()) != name.len() {
                return Err(CompileError::InvalidParameter(name.to_string()));
            }
            if params.contains(&name) {
                return Err(CompileError::DuplicateParameter(name.to_string()));
            }
            params.push(name);
        }
    }

    Ok((params, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn adds_two_arguments() {
        let f = compile::<2>("(a,b){a+b}").unwrap();
        assert_relative_eq!(f.call([2.0, 3.0]), 5.0);
    }

    #[test]
    fn multiplication_binds_tighter() {
        let f = compile::<2>("(a,b){a+b*2}").unwrap();
        assert_relative_eq!(f.call([1.0, 3.0]), 7.0);
    }

    #[test]
    fn power() {
        let f = compile::<1>("(a){2^a}").unwrap();
        assert_relative_eq!(f.call([3.0]), 8.0);
    }

    #[test]
    fn equal_priority_takes_leftmost_first() {
        let f = compile::<3>("(a,b,c){a+b-c}").unwrap();
        assert_relative_eq!(f.call([5.0, 3.0, 1.0]), 7.0);

        let g = compile::<3>("(a,b,c){a-b+c}").unwrap();
        assert_relative_eq!(g.call([5.0, 3.0, 1.0]), 3.0);
    }

    #[test]
    fn power_is_left_associative() {
        // (2^3)^2, not 2^(3^2)
        let f = compile::<0>("(){2^3^2}").unwrap();
        assert_relative_eq!(f.call([]), 64.0);
    }

    #[test]
    fn whitespace_is_insignificant() {
        let f = compile::<2>("  ( x , y ) {  x *  ( y - 1.5e1 ) } ").unwrap();
        assert_relative_eq!(f.call([2.0, 20.0]), 10.0);
        assert_eq!(f.source(), "(x,y){x*(y-1.5e1)}");
    }

    #[test]
    fn signed_literals() {
        let f = compile::<1>("(a){a*-2+.5}").unwrap();
        assert_relative_eq!(f.call([3.0]), -5.5);
    }

    #[test]
    fn repeated_calls_reuse_cells() {
        let f = compile::<1>("(v){v*v}").unwrap();
        assert_relative_eq!(f.call([2.0]), 4.0);
        assert_relative_eq!(f.call([-3.0]), 9.0);
        assert_relative_eq!(f.call([0.5]), 0.25);
    }

    #[test]
    fn structurally_identical_expressions_do_not_share_state() {
        let f = compile::<1>("(a){a+1}").unwrap();
        let g = compile::<1>("(a){a+1}").unwrap();
        assert_relative_eq!(f.call([10.0]), 11.0);
        assert_relative_eq!(g.call([-1.0]), 0.0);
        assert_relative_eq!(f.tree().eval(&f.cells), 11.0);
    }

    #[test]
    fn dangling_operator_is_rejected() {
        assert_eq!(compile::<1>("(a){a+}").unwrap_err(), CompileError::MissingOperand);
    }

    #[test]
    fn undeclared_name_is_rejected() {
        assert_eq!(
            compile::<1>("(a){b}").unwrap_err(),
            CompileError::UnknownIdentifier("b".to_string())
        );
    }

    #[test]
    fn shape_errors() {
        assert!(matches!(compile::<1>("a+1"), Err(CompileError::MalformedFunction(_))));
        assert!(matches!(compile::<1>("(a){}"), Err(CompileError::MalformedFunction(_))));
        assert!(matches!(compile::<1>("(a)a+1"), Err(CompileError::MalformedFunction(_))));
        assert!(matches!(compile::<1>("(a){a+1"), Err(CompileError::MalformedFunction(_))));
        assert!(matches!(compile::<2>("(a,1b){a}"), Err(CompileError::InvalidParameter(_))));
        assert!(matches!(compile::<2>("(a,){a}"), Err(CompileError::InvalidParameter(_))));
        assert!(matches!(compile::<2>("(a,a){a}"), Err(CompileError::DuplicateParameter(_))));
    }

    #[test]
    fn parameter_count_must_match_arity() {
        assert_eq!(
            compile::<2>("(a){a}").unwrap_err(),
            CompileError::ParameterCount { expected: 2, found: 1 }
        );
        assert_eq!(
            compile::<0>("(a){a}").unwrap_err(),
            CompileError::ParameterCount { expected: 0, found: 1 }
        );
    }

    #[test]
    fn arity_above_three_is_unsupported() {
        assert_eq!(
            compile::<4>("(a,b,c,d){a}").unwrap_err(),
            CompileError::UnsupportedArity(4)
        );
    }

    #[test]
    fn nested_groups_and_errors() {
        let f = compile::<1>("(a){((a+1)*(a-1))/2}").unwrap();
        assert_relative_eq!(f.call([3.0]), 4.0);
        assert_eq!(compile::<1>("(a){a*()}").unwrap_err(), CompileError::EmptyGroup);
        assert_eq!(compile::<1>("(a){(a+1}").unwrap_err(), CompileError::UnexpectedEnd);
    }
}
