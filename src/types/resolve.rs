//! Lazy resolution of declared types and evaluation of type expressions.

use super::object::{DeclSite, ObjId, ObjKind, Object, ScopeId, TySlot};
use super::program::{FileId, Program};
use super::ty::{BasicKind, ChanDir, Named, Signature, Type, TypeId};
use crate::syntax::ast::{self, Decl, DeclToken, Expr, Field, FieldList, FuncDecl, FuncType, InterfaceElem, LitKind, Spec, TypeSpec};

/// Where an expression is evaluated
#[derive(Debug, Clone, Copy)]
pub(crate) struct Ctx {
    pub file: FileId,
    pub scope: ScopeId,
    /// Whether function literal bodies are checked
    pub bodies: bool,
    /// Signature of the enclosing function, for `return`
    pub sig: Option<TypeId>,
    /// Label scope of the enclosing function
    pub labels: Option<ScopeId>,
}

impl Ctx {
    pub fn file(p: &Program, file: FileId) -> Self {
        Self {
            file,
            scope: p.file(file).scope,
            bodies: false,
            sig: None,
            labels: None,
        }
    }

    pub fn with_scope(self, scope: ScopeId) -> Self {
        Self { scope, ..self }
    }
}

impl Program {
    /// Object declared by `ident` in `file`, if any
    pub fn declared(&self, file: FileId, ident: &ast::Ident) -> Option<ObjId> {
        self.interned_obj(Self::key(file, ident))
    }

    /// Type of an object, resolving its declaration on first demand
    pub fn obj_type(&mut self, obj: ObjId) -> TypeId {
        match self.object(obj).ty {
            TySlot::Done(t) => return t,
            TySlot::InProgress => return self.invalid(),
            TySlot::Pending => {}
        }
        self.object_mut(obj).ty = TySlot::InProgress;
        let ty = match self.object(obj).decl {
            DeclSite::Value {
                file,
                decl,
                spec,
                index,
            } => self.value_decl_type(file, decl, spec, index),
            DeclSite::Type { file, decl, spec } => self.type_decl_type(obj, file, decl, spec),
            DeclSite::Func { file, decl } => self.func_decl_type(file, decl),
            DeclSite::None => self.invalid(),
        };
        if self.object(obj).ty == TySlot::InProgress {
            self.object_mut(obj).ty = TySlot::Done(ty);
        }
        ty
    }

    fn value_decl_type(&mut self, file: FileId, decl: usize, spec: usize, index: usize) -> TypeId {
        let ast = self.file(file).ast.clone();
        let Some(Decl::Gen(gen)) = ast.decls.get(decl) else {
            return self.invalid();
        };
        let Some(Spec::Value(vs)) = gen.specs.get(spec) else {
            return self.invalid();
        };
        let ctx = Ctx::file(self, file);
        if let Some(ty) = &vs.ty {
            return self.typexpr(ctx, ty);
        }
        let ty = if vs.values.len() == vs.names.len() {
            self.expr(ctx, &vs.values[index], None).ty
        } else if vs.values.len() == 1 {
            let op = self.expr(ctx, &vs.values[0], None);
            self.tuple_element(op.ty, index)
        } else {
            self.invalid()
        };
        match gen.tok {
            DeclToken::Const => ty,
            _ => self.default_type(ty),
        }
    }

    fn type_decl_type(&mut self, obj: ObjId, file: FileId, decl: usize, spec: usize) -> TypeId {
        let ast = self.file(file).ast.clone();
        let Some(Decl::Gen(gen)) = ast.decls.get(decl) else {
            return self.invalid();
        };
        let Some(Spec::Type(ts)) = gen.specs.get(spec) else {
            return self.invalid();
        };
        let ctx = Ctx::file(self, file);
        let pkg = self.file(file).pkg;
        let methods = self.packages[pkg.0 as usize]
            .methods
            .get(&ts.name.name)
            .cloned()
            .unwrap_or_default();
        self.define_type(ctx, obj, ts, methods)
    }

    /// Resolve a type spec for `obj`. Named types are published before their
    /// underlying type is evaluated so recursive types terminate.
    pub(crate) fn define_type(&mut self, ctx: Ctx, obj: ObjId, ts: &TypeSpec, methods: Vec<ObjId>) -> TypeId {
        let mut ctx = ctx;
        let mut tparams = Vec::new();
        if !ts.type_params.is_empty() {
            ctx.scope = self.new_scope(Some(ctx.scope));
            tparams = self.declare_type_params(ctx, &ts.type_params);
        }
        if ts.alias {
            let ty = self.typexpr(ctx, &ts.ty);
            self.object_mut(obj).ty = TySlot::Done(ty);
            return ty;
        }
        let named = self.new_type(Type::Named(Named {
            obj,
            underlying: None,
            methods,
            tparams,
            targs: Vec::new(),
            origin: None,
        }));
        self.object_mut(obj).ty = TySlot::Done(named);
        let rhs = self.typexpr(ctx, &ts.ty);
        let under = self.underlying(rhs);
        if let Type::Named(n) = self.ty_mut(named) {
            n.underlying = Some(under);
        }
        named
    }

    fn declare_type_params(&mut self, ctx: Ctx, params: &[Field]) -> Vec<TypeId> {
        let mut declared = Vec::new();
        for field in params {
            for tp in self.declare_type_param_names(ctx, &field.names) {
                declared.push((tp, &field.ty));
            }
        }
        let mut out = Vec::with_capacity(declared.len());
        for (tp, constraint) in declared {
            let c = self.typexpr(ctx, constraint);
            if let Type::TypeParam { constraint, .. } = self.ty_mut(tp) {
                *constraint = c;
            }
            out.push(tp);
        }
        out
    }

    /// Declare type parameters constrained by `any` until told otherwise
    fn declare_type_param_names(&mut self, ctx: Ctx, names: &[ast::Ident]) -> Vec<TypeId> {
        let any = self.universe.any;
        let mut out = Vec::new();
        for name in names {
            let obj = self.declare(ctx.file, name, ObjKind::TypeName, TySlot::Pending, DeclSite::None);
            let tp = match self.object(obj).ty {
                TySlot::Done(t) => t,
                _ => {
                    let t = self.new_type(Type::TypeParam { obj, constraint: any });
                    self.object_mut(obj).ty = TySlot::Done(t);
                    t
                }
            };
            self.scope_mut(ctx.scope).names.insert(name.name.clone(), obj);
            out.push(tp);
        }
        out
    }

    /// Scope holding a function's type parameters, including those a
    /// generic receiver introduces
    pub(crate) fn func_scope(&mut self, file: FileId, func: &FuncDecl) -> ScopeId {
        let parent = self.file(file).scope;
        let scope = self.new_scope(Some(parent));
        let ctx = Ctx::file(self, file).with_scope(scope);
        self.declare_type_params(ctx, &func.type_params);

        let recv_ty = func.recv.as_ref().and_then(|r| r.list.first()).map(|f| &f.ty);
        let mut base = recv_ty;
        while let Some(Expr::Star(x) | Expr::Paren(x)) = base {
            base = Some(x.as_ref());
        }
        if let Some(Expr::Index { indices, .. }) = base {
            let names: Vec<ast::Ident> = indices
                .iter()
                .filter_map(|i| match i {
                    Expr::Ident(id) => Some(id.clone()),
                    _ => None,
                })
                .collect();
            self.declare_type_param_names(ctx, &names);
        }
        scope
    }

    fn func_decl_type(&mut self, file: FileId, decl: usize) -> TypeId {
        let ast = self.file(file).ast.clone();
        let Some(Decl::Func(func)) = ast.decls.get(decl) else {
            return self.invalid();
        };
        let scope = self.func_scope(file, func);
        let ctx = Ctx::file(self, file).with_scope(scope);
        let recv = match func.recv.as_ref().and_then(|r| r.list.first()) {
            Some(field) => {
                let ty = self.typexpr(ctx, &field.ty);
                Some(match field.names.first() {
                    Some(name) => self.declare(file, name, ObjKind::Var, TySlot::Done(ty), DeclSite::None),
                    None => self.anonymous_var(ty),
                })
            }
            None => None,
        };
        self.signature(ctx, &func.ty, recv)
    }

    fn anonymous_var(&mut self, ty: TypeId) -> ObjId {
        self.new_object(Object {
            name: String::new(),
            kind: ObjKind::Var,
            pkg: None,
            pos: None,
            ty: TySlot::Done(ty),
            decl: DeclSite::None,
        })
    }

    pub(crate) fn signature(&mut self, ctx: Ctx, ft: &FuncType, recv: Option<ObjId>) -> TypeId {
        let (params, variadic) = self.field_vars(ctx, &ft.params);
        let results = match &ft.results {
            Some(list) => self.field_vars(ctx, list).0,
            None => Vec::new(),
        };
        self.new_type(Type::Signature(Signature {
            recv,
            params,
            results,
            variadic,
        }))
    }

    fn field_vars(&mut self, ctx: Ctx, list: &FieldList) -> (Vec<ObjId>, bool) {
        let mut vars = Vec::new();
        let mut variadic = false;
        for field in &list.list {
            let ty = match &field.ty {
                Expr::Ellipsis(Some(elem)) => {
                    variadic = true;
                    let elem = self.typexpr(ctx, elem);
                    self.new_type(Type::Slice(elem))
                }
                other => self.typexpr(ctx, other),
            };
            if field.names.is_empty() {
                vars.push(self.anonymous_var(ty));
            }
            for name in &field.names {
                vars.push(self.declare(ctx.file, name, ObjKind::Var, TySlot::Done(ty), DeclSite::None));
            }
        }
        (vars, variadic)
    }

    /// Evaluate a type expression, recording the identifiers it uses
    pub(crate) fn typexpr(&mut self, ctx: Ctx, e: &Expr) -> TypeId {
        match e {
            Expr::Ident(id) => {
                let Some(obj) = self.lookup(ctx.scope, &id.name) else {
                    return self.invalid();
                };
                self.record_use(ctx.file, id, obj);
                if self.object(obj).is_type_name() {
                    self.obj_type(obj)
                } else {
                    self.invalid()
                }
            }
            Expr::Selector { x, sel } => match self.qualified(ctx, x, sel) {
                Some(obj) if self.object(obj).is_type_name() => self.obj_type(obj),
                _ => self.invalid(),
            },
            Expr::Paren(x) => self.typexpr(ctx, x),
            Expr::Star(x) => {
                let elem = self.typexpr(ctx, x);
                self.new_type(Type::Pointer(elem))
            }
            Expr::ArrayType { len: None, elem } | Expr::Ellipsis(Some(elem)) => {
                let elem = self.typexpr(ctx, elem);
                self.new_type(Type::Slice(elem))
            }
            Expr::ArrayType { len: Some(len), elem } => {
                let len = match len.as_ref() {
                    Expr::Ellipsis(None) => None,
                    other => {
                        self.expr(ctx, other, None);
                        int_literal(other)
                    }
                };
                let elem = self.typexpr(ctx, elem);
                self.new_type(Type::Array { len, elem })
            }
            Expr::MapType { key, value } => {
                let key = self.typexpr(ctx, key);
                let value = self.typexpr(ctx, value);
                self.new_type(Type::Map { key, value })
            }
            Expr::ChanType { dir, value } => {
                let elem = self.typexpr(ctx, value);
                let dir = match dir {
                    ast::ChanDir::Both => ChanDir::Both,
                    ast::ChanDir::Send => ChanDir::Send,
                    ast::ChanDir::Recv => ChanDir::Recv,
                };
                self.new_type(Type::Chan { dir, elem })
            }
            Expr::FuncType(ft) => self.signature(ctx, ft, None),
            Expr::StructType { fields, .. } => self.struct_type(ctx, fields),
            Expr::InterfaceType { elems, .. } => self.interface_type(ctx, elems),
            Expr::Index { x, indices } => {
                let base = self.typexpr(ctx, x);
                let args: Vec<TypeId> = indices.iter().map(|i| self.typexpr(ctx, i)).collect();
                self.instantiate(base, args)
            }
            Expr::Union(terms) => {
                for term in terms {
                    self.typexpr(ctx, term);
                }
                self.universe.any
            }
            Expr::Tilde(x) => self.typexpr(ctx, x),
            other => {
                self.expr(ctx, other, None);
                self.invalid()
            }
        }
    }

    /// Object named by `pkg.Name`, when `x` is an import
    pub(crate) fn qualified(&mut self, ctx: Ctx, x: &Expr, sel: &ast::Ident) -> Option<ObjId> {
        let Expr::Ident(pkg_ident) = x else {
            return None;
        };
        let pkg_name = self.lookup(ctx.scope, &pkg_ident.name)?;
        if !matches!(self.object(pkg_name).kind, ObjKind::PkgName { .. }) {
            return None;
        }
        self.record_use(ctx.file, pkg_ident, pkg_name);
        let pkg = self.imported(pkg_name)?;
        if !crate::syntax::is_exported(&sel.name) {
            return None;
        }
        let obj = self.package_member(pkg, &sel.name)?;
        self.record_use(ctx.file, sel, obj);
        Some(obj)
    }

    fn struct_type(&mut self, ctx: Ctx, fields: &[Field]) -> TypeId {
        let mut objs = Vec::new();
        for field in fields {
            let ty = self.typexpr(ctx, &field.ty);
            if field.names.is_empty() {
                if let Some(ident) = embedded_ident(&field.ty) {
                    let kind = ObjKind::Field { embedded: true };
                    objs.push(self.declare(ctx.file, ident, kind, TySlot::Done(ty), DeclSite::None));
                }
                continue;
            }
            for name in &field.names {
                let kind = ObjKind::Field { embedded: false };
                objs.push(self.declare(ctx.file, name, kind, TySlot::Done(ty), DeclSite::None));
            }
        }
        self.new_type(Type::Struct { fields: objs })
    }

    fn interface_type(&mut self, ctx: Ctx, elems: &[InterfaceElem]) -> TypeId {
        let mut methods = Vec::new();
        let mut embeddeds = Vec::new();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, ty } => {
                    let sig = self.signature(ctx, ty, None);
                    methods.push(self.declare(ctx.file, name, ObjKind::Func, TySlot::Done(sig), DeclSite::None));
                }
                InterfaceElem::Embed(e) => embeddeds.push(self.typexpr(ctx, e)),
            }
        }
        self.new_type(Type::Interface { methods, embeddeds })
    }

    /// Type a variable takes when initialised from an untyped value
    pub fn default_type(&mut self, t: TypeId) -> TypeId {
        let Type::Basic(kind) = *self.ty(t) else {
            return t;
        };
        let default = match kind {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Rune,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            _ => return t,
        };
        self.basic(default)
    }

    pub(crate) fn tuple_element(&mut self, t: TypeId, index: usize) -> TypeId {
        match self.ty(t) {
            Type::Tuple(elems) => elems.get(index).copied().unwrap_or(self.universe.invalid),
            _ if index == 0 => t,
            _ => self.basic(BasicKind::Bool),
        }
    }

    pub(crate) fn literal_type(&self, kind: LitKind) -> TypeId {
        self.basic(match kind {
            LitKind::Int => BasicKind::UntypedInt,
            LitKind::Float => BasicKind::UntypedFloat,
            LitKind::Imag => BasicKind::UntypedComplex,
            LitKind::Char => BasicKind::UntypedRune,
            LitKind::String => BasicKind::UntypedString,
        })
    }
}

/// The identifier naming an embedded field: `T`, `*T`, `pkg.T`, `T[X]`
fn embedded_ident(e: &Expr) -> Option<&ast::Ident> {
    match e {
        Expr::Ident(id) => Some(id),
        Expr::Star(x) | Expr::Paren(x) => embedded_ident(x),
        Expr::Selector { sel, .. } => Some(sel),
        Expr::Index { x, .. } => embedded_ident(x),
        _ => None,
    }
}

fn int_literal(e: &Expr) -> Option<u64> {
    match e {
        Expr::BasicLit {
            kind: LitKind::Int,
            value,
            ..
        } => {
            let digits = value.replace('_', "");
            if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                u64::from_str_radix(hex, 16).ok()
            } else {
                digits.parse().ok()
            }
        }
        Expr::Paren(x) => int_literal(x),
        _ => None,
    }
}
