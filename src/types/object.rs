//! Objects (declared entities) and scopes.

use std::collections::HashMap;

use super::program::{FileId, PackageId};
use super::ty::TypeId;
use crate::loc::FileLoc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub const ALL: [(&'static str, Builtin); 18] = [
        ("append", Builtin::Append),
        ("cap", Builtin::Cap),
        ("clear", Builtin::Clear),
        ("close", Builtin::Close),
        ("complex", Builtin::Complex),
        ("copy", Builtin::Copy),
        ("delete", Builtin::Delete),
        ("imag", Builtin::Imag),
        ("len", Builtin::Len),
        ("make", Builtin::Make),
        ("max", Builtin::Max),
        ("min", Builtin::Min),
        ("new", Builtin::New),
        ("panic", Builtin::Panic),
        ("print", Builtin::Print),
        ("println", Builtin::Println),
        ("real", Builtin::Real),
        ("recover", Builtin::Recover),
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjKind {
    /// An import; the target package loads on first use
    PkgName {
        path: String,
        imported: Option<PackageId>,
    },
    Const,
    TypeName,
    Var,
    Field {
        embedded: bool,
    },
    /// Function or method; methods carry a receiver in their signature
    Func,
    Builtin(Builtin),
    Nil,
    Label,
}

/// Lazy type slot; declarations are resolved on first demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TySlot {
    Pending,
    InProgress,
    Done(TypeId),
}

/// Where a package-level object's type comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclSite {
    None,
    Value {
        file: FileId,
        decl: usize,
        spec: usize,
        index: usize,
    },
    Type {
        file: FileId,
        decl: usize,
        spec: usize,
    },
    Func {
        file: FileId,
        decl: usize,
    },
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: String,
    pub kind: ObjKind,
    /// `None` for predeclared objects
    pub pkg: Option<PackageId>,
    /// `None` for predeclared objects
    pub pos: Option<FileLoc>,
    pub ty: TySlot,
    pub decl: DeclSite,
}

impl Object {
    pub fn exported(&self) -> bool {
        crate::syntax::is_exported(&self.name)
    }

    pub fn is_type_name(&self) -> bool {
        self.kind == ObjKind::TypeName
    }

    pub fn is_field(&self) -> bool {
        matches!(self.kind, ObjKind::Field { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub names: HashMap<String, ObjId>,
}
