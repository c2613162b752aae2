//! AST node types for the JavaScript subset run by the sandbox.
//!
//! Every node carries a [`Span`] for error reporting.
//! Function definitions are reference-counted so closures can share them
//! with the tree they were parsed from.

use std::rc::Rc;

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A parsed script: the statement list of one function body.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Var(VarDecl),
    Function(Rc<FunctionDef>),
    Return(ReturnStmt),
    If(IfStmt),
    For(ForStmt),
    ForOf(ForOfStmt),
    While(WhileStmt),
    DoWhile(WhileStmt),
    Break(Span),
    Continue(Span),
    Throw(ThrowStmt),
    Try(TryStmt),
    Block(Block),
    Expr(ExprStmt),
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(v) => v.span,
            Stmt::Function(f) => f.span,
            Stmt::Return(r) => r.span,
            Stmt::If(i) => i.span,
            Stmt::For(f) => f.span,
            Stmt::ForOf(f) => f.span,
            Stmt::While(w) | Stmt::DoWhile(w) => w.span,
            Stmt::Break(s) | Stmt::Continue(s) | Stmt::Empty(s) => *s,
            Stmt::Throw(t) => t.span,
            Stmt::Try(t) => t.span,
            Stmt::Block(b) => b.span,
            Stmt::Expr(e) => e.span,
        }
    }
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// `let a = 1, [b, c] = pair`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarations: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub target: Pattern,
    pub init: Option<Expr>,
    pub span: Span,
}

/// `return [expr]`
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// `if (cond) stmt [else stmt]`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: Expr,
    pub consequent: Box<Stmt>,
    pub alternate: Option<Box<Stmt>>,
    pub span: Span,
}

/// The head of a classic `for (init; test; update)` loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(VarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// Which flavour of iteration loop: `for…of` walks values, `for…in` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterKind {
    Of,
    In,
}

/// The binding side of a `for…of` / `for…in` head.
#[derive(Debug, Clone, PartialEq)]
pub enum ForBinding {
    Decl(VarKind, Pattern),
    Target(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForOfStmt {
    pub kind: IterKind,
    pub binding: ForBinding,
    pub iterable: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

/// `while (cond) body` and `do body while (cond)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub value: Expr,
    pub span: Span,
}

/// `try { } catch (e) { } finally { }`
#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Binding patterns
// ══════════════════════════════════════════════════════════════════════════════

/// A binding target: plain name or destructuring pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Ident(Ident),
    Array(ArrayPattern),
    Object(ObjectPattern),
}

impl Pattern {
    /// Every name this pattern binds, in source order.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Ident(id) => out.push(&id.name),
            Pattern::Array(arr) => {
                for elem in arr.elements.iter().flatten() {
                    elem.target.collect_names(out);
                }
                if let Some(rest) = &arr.rest {
                    rest.collect_names(out);
                }
            }
            Pattern::Object(obj) => {
                for prop in &obj.props {
                    prop.value.target.collect_names(out);
                }
                if let Some(rest) = &obj.rest {
                    out.push(&rest.name);
                }
            }
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Pattern::Ident(id) => id.span,
            Pattern::Array(a) => a.span,
            Pattern::Object(o) => o.span,
        }
    }
}

/// A pattern with an optional default: `x = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternElem {
    pub target: Pattern,
    pub default: Option<Expr>,
}

/// `[a, , b = 2, ...rest]`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPattern {
    /// `None` marks a hole.
    pub elements: Vec<Option<PatternElem>>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

/// `{ a, b: renamed = 1, ...rest }`
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPattern {
    pub props: Vec<ObjectPatternProp>,
    pub rest: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProp {
    pub key: PropKey,
    pub value: PatternElem,
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function declaration, function expression, arrow function or method.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Option<Ident>,
    pub params: Vec<PatternElem>,
    pub rest: Option<Pattern>,
    pub body: FunctionBody,
    pub is_arrow: bool,
    /// Original source text, returned by `String(fn)`.
    pub source: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// Concise arrow body: `x => x + 1`.
    Expr(Box<Expr>),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node with source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    Number(f64),
    String(String),
    Bool(bool),
    Null,
    Template(Vec<TemplatePart>),
    Array(Vec<ArrayElem>),
    Object(Vec<PropDef>),
    Function(Rc<FunctionDef>),

    // ── References ──
    Ident(String),
    This,
    Member {
        object: Box<Expr>,
        property: MemberKey,
        /// `obj?.prop`
        optional: bool,
    },

    // ── Calls ──
    Call {
        callee: Box<Expr>,
        args: Vec<Argument>,
        /// `fn?.()`
        optional: bool,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Argument>,
    },
    /// Wraps a member/call chain containing `?.`; a nullish link
    /// short-circuits the whole chain to `undefined`.
    OptionalChain(Box<Expr>),

    // ── Operators ──
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Sequence(Vec<Expr>),
}

/// A piece of a template literal.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElem {
    Expr(Expr),
    Spread(Expr),
    Hole,
}

/// A call argument: `f(a, ...rest)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Expr(Expr),
    Spread(Expr),
}

/// A property key in an object literal or object pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PropKey {
    Static(String),
    Computed(Box<Expr>),
}

/// One entry of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropDef {
    /// `key: value`, `[key]: value`, `method() { }`
    KeyValue(PropKey, Expr),
    /// `{ name }`
    Shorthand(Ident),
    /// `{ ...other }`
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberKey {
    Name(String),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `typeof x`
    TypeOf,
    /// `void x`
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    In,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    /// `??`
    Nullish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    And,
    Or,
    Nullish,
}

impl AssignOp {
    /// The arithmetic operator behind a compound assignment.
    pub fn binary(self) -> Option<BinOp> {
        match self {
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
            AssignOp::Exp => Some(BinOp::Exp),
            _ => None,
        }
    }

    /// The logical operator behind `&&=`, `||=` and `??=`.
    pub fn logical(self) -> Option<LogicalOp> {
        match self {
            AssignOp::And => Some(LogicalOp::And),
            AssignOp::Or => Some(LogicalOp::Or),
            AssignOp::Nullish => Some(LogicalOp::Nullish),
            _ => None,
        }
    }
}
