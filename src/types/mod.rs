//! A Go type checker sized for navigation.
//!
//! [`Program`] loads packages from source, binds every identifier of the
//! files it records to the object it denotes and computes the types needed
//! to do so: selectors, composite literal keys, method sets and interface
//! satisfaction. Dependencies are loaded with their function bodies
//! stripped; imports that cannot be resolved become empty fake packages so
//! the rest of a file still binds.

mod check;
mod display;
mod lookup;
mod object;
mod program;
mod resolve;
mod subst;
mod ty;
mod universe;

pub use object::{Builtin, DeclSite, ObjId, ObjKind, Object, Scope, ScopeId, TySlot};
pub use program::{FileId, IdentKey, Package, PackageId, Program, SourceFile, TypesInfo};
pub use ty::{BasicKind, ChanDir, Named, Signature, Type, TypeId};
pub use universe::Universe;
