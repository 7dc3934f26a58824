use std::fmt;
use std::rc::Rc;

use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Bang,
    Minus,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOp::Bang => f.write_str("!"),
            PrefixOp::Minus => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Mod,
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
    NotEq,
    And,
    Or,
}

impl InfixOp {
    pub fn from_token(kind: TokenKind) -> Option<InfixOp> {
        match kind {
            TokenKind::Plus => Some(InfixOp::Plus),
            TokenKind::Minus => Some(InfixOp::Minus),
            TokenKind::Asterisk => Some(InfixOp::Asterisk),
            TokenKind::Slash => Some(InfixOp::Slash),
            TokenKind::Mod => Some(InfixOp::Mod),
            TokenKind::Lt => Some(InfixOp::Lt),
            TokenKind::Lte => Some(InfixOp::Lte),
            TokenKind::Gt => Some(InfixOp::Gt),
            TokenKind::Gte => Some(InfixOp::Gte),
            TokenKind::Eq => Some(InfixOp::Eq),
            TokenKind::NotEq => Some(InfixOp::NotEq),
            TokenKind::And => Some(InfixOp::And),
            TokenKind::Or => Some(InfixOp::Or),
            _ => None,
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InfixOp::Plus => "+",
            InfixOp::Minus => "-",
            InfixOp::Asterisk => "*",
            InfixOp::Slash => "/",
            InfixOp::Mod => "%",
            InfixOp::Lt => "<",
            InfixOp::Lte => "<=",
            InfixOp::Gt => ">",
            InfixOp::Gte => ">=",
            InfixOp::Eq => "==",
            InfixOp::NotEq => "!=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{}", stmt)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var { name: Rc<str>, value: Expr },
    Konst { name: Rc<str>, value: Expr },
    Pilih(Expr),
    Expr(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var { name, value } => write!(f, "var {} = {};", name, value),
            Stmt::Konst { name, value } => write!(f, "konst {} = {};", name, value),
            Stmt::Pilih(value) => write!(f, "pilih {};", value),
            Stmt::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Rc<str>),
    Int(i64),
    Bool(bool),
    Str(Rc<str>),
    Nihil,
    Regex(Rc<str>),
    Wildcard,
    Prefix {
        op: PrefixOp,
        right: Box<Expr>,
    },
    Infix {
        left: Box<Expr>,
        op: InfixOp,
        right: Box<Expr>,
    },
    Index {
        left: Box<Expr>,
        index: Box<Expr>,
    },
    Array(Vec<Expr>),
    /// Entries keep source order; evaluation decides hashability.
    Hash(Vec<(Expr, Expr)>),
    Function {
        params: Vec<Rc<str>>,
        body: Block,
    },
    Call {
        function: Box<Expr>,
        args: Vec<Expr>,
    },
    MethodCall {
        object: Box<Expr>,
        call: Box<Expr>,
    },
    Pipe {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `ident = expr` at expression position; binds through the same
    /// path as a `var` statement.
    Assign {
        name: Rc<str>,
        value: Box<Expr>,
    },
    Jika {
        condition: Box<Expr>,
        consequence: Block,
        alternative: Option<Block>,
    },
    /// `conditions` and `values` are index-parallel and always the same
    /// length.
    Pilah {
        target: Option<Box<Expr>>,
        conditions: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// `kv` has length 1 (key only) or 2 (key and value).
    Loop {
        kv: Vec<Rc<str>>,
        iter: Rc<str>,
        body: Block,
    },
    Break,
    Continue,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Ident(name) => f.write_str(name),
            Expr::Int(value) => write!(f, "{}", value),
            Expr::Bool(value) => f.write_str(if *value { "benar" } else { "salah" }),
            Expr::Str(value) => f.write_str(value),
            Expr::Nihil => f.write_str("nihil"),
            Expr::Regex(value) => f.write_str(value),
            Expr::Wildcard => f.write_str("_"),
            Expr::Prefix { op, right } => write!(f, "({}{})", op, right),
            Expr::Infix { left, op, right } => write!(f, "({} {} {})", left, op, right),
            Expr::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expr::Array(elements) => {
                write!(f, "[{}]", join(elements, ", "))
            }
            Expr::Hash(pairs) => {
                let rendered: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}:{}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Expr::Function { params, body } => {
                write!(f, "fn({}) {}", params.join(", "), body)
            }
            Expr::Call { function, args } => {
                write!(f, "{}({})", function, join(args, ", "))
            }
            Expr::MethodCall { object, call } => write!(f, "{}.{}", object, call),
            Expr::Pipe { left, right } => write!(f, "{} |> {}", left, right),
            Expr::Assign { name, value } => write!(f, "{} = {}", name, value),
            Expr::Jika {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "jika{} {}", condition, consequence)?;
                if let Some(alt) = alternative {
                    write!(f, "atau {}", alt)?;
                }
                Ok(())
            }
            Expr::Pilah {
                target,
                conditions,
                values,
            } => {
                f.write_str("pilah")?;
                if let Some(target) = target {
                    write!(f, " {}", target)?;
                }
                f.write_str(" { ")?;
                for (cond, value) in conditions.iter().zip(values.iter()) {
                    write!(f, "{} -> {} ", cond, value)?;
                }
                f.write_str("}")
            }
            Expr::Loop { kv, iter, body } => {
                write!(f, "tiap {} di {} {}", kv.join(", "), iter, body)
            }
            Expr::Break => f.write_str("usai"),
            Expr::Continue => f.write_str("lanjut"),
        }
    }
}

fn join(exprs: &[Expr], sep: &str) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}
