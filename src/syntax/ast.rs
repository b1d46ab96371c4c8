//! Owned Go syntax tree.
//!
//! Lowered from the tree-sitter tree so the checker can walk plain Rust
//! data. The shape follows the Go language spec closely enough that every
//! identifier that can denote an object is kept as an [`Ident`] with its
//! exact span.

use spelunk_metal::Pos;

/// Byte range plus 1-based start and end positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub lo: usize,
    pub hi: usize,
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub fn spans_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.lo <= offset && offset <= self.hi
    }
}

#[derive(Debug, Clone)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }
}

#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    /// Explicit name, `.` or `_`
    pub name: Option<Ident>,
    pub path: String,
    pub path_span: Span,
}

#[derive(Debug, Clone)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclToken {
    Const,
    Var,
    Type,
}

#[derive(Debug, Clone)]
pub struct GenDecl {
    pub tok: DeclToken,
    pub specs: Vec<Spec>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    /// Type and values repeated from the previous spec of a const group
    pub implicit: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Ident,
    pub type_params: Vec<Field>,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub type_params: Vec<Field>,
    pub ty: FuncType,
    pub body: Option<Block>,
    pub span: Span,
}

/// Parenthesized parameter list, or a bare result type
#[derive(Debug, Clone, Default)]
pub struct FieldList {
    pub list: Vec<Field>,
    pub span: Span,
}

/// One parameter group, struct field group or type parameter group.
/// An empty `names` marks an unnamed parameter or an embedded field.
#[derive(Debug, Clone)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncType {
    pub params: FieldList,
    pub results: Option<FieldList>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum InterfaceElem {
    Method { name: Ident, ty: FuncType },
    Embed(Expr),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Addr,
    Recv,
    Not,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Compare,
    Logical,
    Shift,
    Arith,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(Ident),
    BasicLit {
        kind: LitKind,
        value: String,
        span: Span,
    },
    CompositeLit {
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
        span: Span,
    },
    FuncLit {
        ty: FuncType,
        body: Block,
    },
    Paren(Box<Expr>),
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    /// Indexing, or instantiation of a generic type or function
    Index {
        x: Box<Expr>,
        indices: Vec<Expr>,
    },
    Slice {
        x: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `x.(T)`; `ty` is `None` for the `x.(type)` of a type switch
    TypeAssert {
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    /// Dereference or pointer type
    Star(Box<Expr>),
    Unary {
        op: UnaryOp,
        x: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    /// `[N]T`, `[...]T` (len is `Ellipsis`) or `[]T` (len is `None`)
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    /// `...T` in a parameter list, or the `...` of an array length
    Ellipsis(Option<Box<Expr>>),
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType {
        dir: ChanDir,
        value: Box<Expr>,
    },
    FuncType(FuncType),
    StructType {
        fields: Vec<Field>,
        span: Span,
    },
    InterfaceType {
        elems: Vec<InterfaceElem>,
        span: Span,
    },
    /// Constraint union `A | ~B`
    Union(Vec<Expr>),
    Tilde(Box<Expr>),
    Bad(Span),
}

impl Expr {
    /// The identifier an expression reduces to once parens, stars and
    /// type arguments are peeled off, as in a receiver type
    pub fn base_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(id) => Some(id),
            Expr::Paren(x) | Expr::Star(x) => x.base_ident(),
            Expr::Index { x, .. } => x.base_ident(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Empty for `default`
    pub list: Vec<Expr>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub struct CommClause {
    /// `None` for `default`
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Decl(GenDecl),
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    IncDec(Expr),
    Assign {
        lhs: Vec<Expr>,
        rhs: Vec<Expr>,
        define: bool,
    },
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    Branch {
        label: Option<Ident>,
    },
    Return(Vec<Expr>),
    Go(Expr),
    Defer(Expr),
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        x: Expr,
        body: Block,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },
    TypeSwitch {
        init: Option<Box<Stmt>>,
        bind: Option<Ident>,
        x: Expr,
        clauses: Vec<CaseClause>,
    },
    Select {
        clauses: Vec<CommClause>,
    },
    Empty,
}
