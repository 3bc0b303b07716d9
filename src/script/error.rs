use thiserror::Error;

/// Faults detected while compiling a function definition.
///
/// All of these are raised by [`compile`](super::compile); evaluating an
/// already compiled expression cannot fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("script did not look like a function: \"{0}\"")]
    MalformedFunction(String),

    #[error("invalid parameter name: \"{0}\"")]
    InvalidParameter(String),

    #[error("parameter \"{0}\" is declared twice")]
    DuplicateParameter(String),

    #[error("expected function to have {expected} parameter(s), found {found}")]
    ParameterCount { expected: usize, found: usize },

    #[error("functions of {0} parameters are not supported (at most 3)")]
    UnsupportedArity(usize),

    #[error("unexpected token at {offset}: \"{rest}\"")]
    UnknownToken { offset: usize, rest: String },

    #[error("unknown identifier \"{0}\"")]
    UnknownIdentifier(String),

    #[error("invalid number literal \"{0}\"")]
    InvalidNumber(String),

    #[error("cannot have empty brackets")]
    EmptyGroup,

    #[error("must provide an operand on either side of an operation")]
    MissingOperand,

    #[error("unbalanced parenthesis at {0}")]
    UnbalancedParenthesis(usize),

    #[error("unexpected end of script")]
    UnexpectedEnd,
}
