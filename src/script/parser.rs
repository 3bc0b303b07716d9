//! Recursive-descent parser over the flat token stream
//!
//! Each parenthesis level collects an alternating list of operand nodes and
//! operators. At the end of the level the list is reduced by repeatedly
//! picking the highest-priority operator, leftmost on ties, and folding its
//! two neighbours into one node. Equal priorities therefore group left to
//! right, and that includes `^`.

use super::ast::{BinaryOp, Node};
use super::error::CompileError;
use super::lexer::{Spanned, Token};

pub struct Parser<'a, 'p> {
    tokens: &'a [Spanned<'a>],
    pos: usize,
    params: &'p [&'p str],
}

impl<'a, 'p> Parser<'a, 'p> {
    pub fn new(tokens: &'a [Spanned<'a>], params: &'p [&'p str]) -> Self {
        Self {
            tokens,
            pos: 0,
            params,
        }
    }

    /// Parses the whole body; every token must be consumed
    pub fn parse(mut self) -> Result<Node, CompileError> {
        self.parse_group(false)
    }

    fn parse_group(&mut self, nested: bool) -> Result<Node, CompileError> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut ops: Vec<BinaryOp> = Vec::new();

        loop {
            let Some(spanned) = self.tokens.get(self.pos).copied() else {
                if nested {
                    return Err(CompileError::UnexpectedEnd);
                }
                break;
            };
            self.pos += 1;

            match spanned.token {
                Token::Open => nodes.push(self.parse_group(true)?),
                Token::Close if nested => break,
                Token::Close => return Err(CompileError::UnbalancedParenthesis(spanned.offset)),
                Token::Number(value) => nodes.push(Node::Number(value)),
                Token::Ident(name) => nodes.push(self.argument(name)?),
                Token::Op(op) => {
                    if nodes.len() <= ops.len() {
                        return Err(CompileError::MissingOperand);
                    }
                    ops.push(op);
                }
            }
        }

        if nodes.is_empty() {
            return Err(CompileError::EmptyGroup);
        }
        if nodes.len() != ops.len() + 1 {
            return Err(CompileError::MissingOperand);
        }

        Ok(reduce(nodes, ops))
    }

    fn argument(&self, name: &str) -> Result<Node, CompileError> {
        self.params
            .iter()
            .position(|param| *param == name)
            .map(Node::Argument)
            .ok_or_else(|| CompileError::UnknownIdentifier(name.to_string()))
    }
}

/// Folds `nodes[0] ops[0] nodes[1] ... ` into a single tree.
///
/// Caller guarantees `nodes.len() == ops.len() + 1`.
pub fn reduce(mut nodes: Vec<Node>, mut ops: Vec<BinaryOp>) -> Node {
    while !ops.is_empty() {
        let mut index = 0;
        for (i, op) in ops.iter().enumerate() {
            if op.priority() > ops[index].priority() {
                index = i;
            }
        }

        let op = ops.remove(index);
        let rhs = nodes.remove(index + 1);
        let lhs = std::mem::replace(&mut nodes[index], Node::Number(0.0));
        nodes[index] = Node::binary(op, lhs, rhs);
    }

    nodes.swap_remove(0)
}
