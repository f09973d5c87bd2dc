//! Expression tree produced by the parser.
//!
//! Nodes live in a single arena and refer to their children by [`NodeId`],
//! so the tree is one flat allocation that can be moved or cloned freely.
//! Ordering comparisons only ever appear as `Lt`/`Le`: the parser swaps the
//! operands of `>` and `>=` while building the tree.

use std::fmt;

/// Binary operators that survive into the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

impl BinaryOp {
  pub fn symbol(self) -> &'static str {
    match self {
      Self::Add => "+",
      Self::Sub => "-",
      Self::Mul => "*",
      Self::Div => "/",
      Self::Eq => "==",
      Self::Ne => "!=",
      Self::Lt => "<",
      Self::Le => "<=",
    }
  }
}

/// Index of a node inside its [`Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
  Num {
    value: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: NodeId,
    rhs: NodeId,
  },
}

/// An expression tree stored as an arena of nodes plus the index of its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
  nodes: Vec<Node>,
  root: NodeId,
}

impl Ast {
  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &Node {
    &self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }
}

/// Pending work while printing: a subtree still to expand, or literal text.
enum Pending {
  Node(NodeId),
  Text(&'static str),
}

impl fmt::Display for Ast {
  /// Prefix form, e.g. `(- (- 10 2) 3)`.
  ///
  /// Uses an explicit work stack; operator chains can be arbitrarily deep.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut pending = vec![Pending::Node(self.root)];
    while let Some(item) = pending.pop() {
      match item {
        Pending::Text(text) => f.write_str(text)?,
        Pending::Node(id) => match self.node(id) {
          Node::Num { value } => write!(f, "{value}")?,
          Node::Binary { op, lhs, rhs } => {
            write!(f, "({} ", op.symbol())?;
            pending.push(Pending::Text(")"));
            pending.push(Pending::Node(*rhs));
            pending.push(Pending::Text(" "));
            pending.push(Pending::Node(*lhs));
          }
        },
      }
    }
    Ok(())
  }
}

/// Append-only node store used while the parser builds a tree.
///
/// Children are always pushed before their parent, so every `NodeId` handed
/// out refers to an existing node and no cycle can be formed.
#[derive(Debug, Default)]
pub struct AstBuilder {
  nodes: Vec<Node>,
}

impl AstBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn number(&mut self, value: i64) -> NodeId {
    self.push(Node::Num { value })
  }

  pub fn binary(&mut self, op: BinaryOp, lhs: NodeId, rhs: NodeId) -> NodeId {
    self.push(Node::Binary { op, lhs, rhs })
  }

  pub fn finish(self, root: NodeId) -> Ast {
    Ast {
      nodes: self.nodes,
      root,
    }
  }

  fn push(&mut self, node: Node) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(node);
    id
  }
}
