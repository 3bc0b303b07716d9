use std::cell::Cell;
use std::fmt;

/// Binary operators understood by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            '/' => Some(BinaryOp::Div),
            '^' => Some(BinaryOp::Pow),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        }
    }

    /// Reduction priority; higher binds tighter
    pub fn priority(self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Sub => 1,
            BinaryOp::Mul | BinaryOp::Div => 2,
            BinaryOp::Pow => 3,
        }
    }

    pub fn apply(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
            BinaryOp::Pow => lhs.powf(rhs),
        }
    }
}

/// Expression tree node.
///
/// Arguments refer to a slot in the owning expression's cell arena by
/// position, never by name, so two compiled expressions never share state.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f32),
    Argument(usize),
    Binary {
        op: BinaryOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
}

impl Node {
    pub fn binary(op: BinaryOp, lhs: Node, rhs: Node) -> Self {
        Node::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn eval(&self, args: &[Cell<f32>]) -> f32 {
        match self {
            Node::Number(value) => *value,
            Node::Argument(index) => args[*index].get(),
            Node::Binary { op, lhs, rhs } => op.apply(lhs.eval(args), rhs.eval(args)),
        }
    }
}

// Fully parenthesised so the grouping chosen by the parser is visible.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(value) => write!(f, "{}", value),
            Node::Argument(index) => write!(f, "${}", index),
            Node::Binary { op, lhs, rhs } => write!(f, "({}{}{})", lhs, op.symbol(), rhs),
        }
    }
}
