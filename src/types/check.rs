//! Expression and statement checking.
//!
//! The checker computes just enough types to bind every identifier: the
//! operand types needed for selectors, composite literal keys, range and
//! assignment definitions. Constants are not evaluated and no errors are
//! reported; anything unresolvable becomes the invalid type.

use super::object::{Builtin, DeclSite, ObjId, ObjKind, Object, TySlot};
use super::program::{FileId, PackageId, Program};
use super::resolve::Ctx;
use super::ty::{BasicKind, Type, TypeId};
use crate::syntax::ast::{
    BinaryOp, Block, CaseClause, Decl, DeclToken, Expr, FuncDecl, GenDecl, Ident, Spec, Stmt, UnaryOp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Invalid,
    NoValue,
    Value,
    Type,
    Package(ObjId),
    Builtin(Builtin),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Operand {
    pub mode: Mode,
    pub ty: TypeId,
}

impl Program {
    fn invalid_op(&self) -> Operand {
        Operand {
            mode: Mode::Invalid,
            ty: self.invalid(),
        }
    }

    fn value(&self, ty: TypeId) -> Operand {
        Operand { mode: Mode::Value, ty }
    }

    /// Check every declaration and function body of `pkg`
    pub(crate) fn check_package(&mut self, pkg: PackageId) {
        let files = self.package(pkg).files.clone();
        for file in files {
            let ast = self.file(file).ast.clone();
            let ctx = Ctx {
                bodies: true,
                ..Ctx::file(self, file)
            };
            for decl in &ast.decls {
                match decl {
                    Decl::Gen(gen) => self.check_gen_decl(ctx, gen),
                    Decl::Func(func) => self.check_func(file, func),
                }
            }
        }
    }

    fn check_gen_decl(&mut self, ctx: Ctx, gen: &GenDecl) {
        for spec in &gen.specs {
            match spec {
                Spec::Value(vs) => {
                    let hint = vs.ty.as_ref().map(|t| self.typexpr(ctx, t));
                    for value in &vs.values {
                        self.expr(ctx, value, hint);
                    }
                    for name in &vs.names {
                        if let Some(obj) = self.declared(ctx.file, name) {
                            self.obj_type(obj);
                        }
                    }
                }
                Spec::Type(ts) => {
                    if let Some(obj) = self.declared(ctx.file, &ts.name) {
                        self.obj_type(obj);
                    }
                }
            }
        }
    }

    fn check_func(&mut self, file: FileId, func: &FuncDecl) {
        let Some(obj) = self.declared(file, &func.name) else {
            return;
        };
        let sig_ty = self.obj_type(obj);
        let Some(body) = &func.body else {
            return;
        };
        let scope = self.func_scope(file, func);
        self.declare_signature_vars(scope, sig_ty);
        let ctx = Ctx {
            file,
            scope,
            bodies: true,
            sig: Some(sig_ty),
            labels: Some(self.new_scope(None)),
        };
        self.block_stmts(ctx, &body.stmts);
    }

    fn declare_signature_vars(&mut self, scope: super::object::ScopeId, sig_ty: TypeId) {
        let Type::Signature(sig) = self.ty(sig_ty).clone() else {
            return;
        };
        for var in sig.recv.iter().chain(&sig.params).chain(&sig.results) {
            let name = self.object(*var).name.clone();
            if !name.is_empty() && name != "_" {
                self.scope_mut(scope).names.insert(name, *var);
            }
        }
    }

    // --- statements -----------------------------------------------------

    fn child(&mut self, ctx: Ctx) -> Ctx {
        let scope = self.new_scope(Some(ctx.scope));
        ctx.with_scope(scope)
    }

    fn block(&mut self, ctx: Ctx, block: &Block) {
        let inner = self.child(ctx);
        self.block_stmts(inner, &block.stmts);
    }

    fn block_stmts(&mut self, ctx: Ctx, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(ctx, stmt);
        }
    }

    fn stmt(&mut self, ctx: Ctx, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(gen) => self.local_decl(ctx, gen),
            Stmt::Expr(e) | Stmt::IncDec(e) | Stmt::Go(e) | Stmt::Defer(e) => {
                self.expr(ctx, e, None);
            }
            Stmt::Send { chan, value } => {
                let ch = self.expr(ctx, chan, None);
                let hint = self.chan_elem(ch.ty);
                self.expr(ctx, value, hint);
            }
            Stmt::Assign { lhs, rhs, define } => {
                if *define {
                    self.define(ctx, lhs, rhs);
                } else {
                    let types: Vec<TypeId> = lhs.iter().map(|l| self.expr(ctx, l, None).ty).collect();
                    for (i, r) in rhs.iter().enumerate() {
                        let hint = (lhs.len() == rhs.len()).then(|| types[i]);
                        self.expr(ctx, r, hint);
                    }
                }
            }
            Stmt::Labeled { label, stmt } => {
                if let Some(labels) = ctx.labels {
                    let invalid = self.invalid();
                    let obj = self.declare(ctx.file, label, ObjKind::Label, TySlot::Done(invalid), DeclSite::None);
                    self.scope_mut(labels).names.insert(label.name.clone(), obj);
                }
                self.stmt(ctx, stmt);
            }
            Stmt::Branch { label: Some(label) } => {
                if let Some(obj) = ctx.labels.and_then(|l| self.lookup(l, &label.name)) {
                    self.record_use(ctx.file, label, obj);
                }
            }
            Stmt::Branch { label: None } | Stmt::Empty => {}
            Stmt::Return(results) => {
                let hints = self.result_types(ctx.sig);
                for (i, r) in results.iter().enumerate() {
                    let hint = (hints.len() == results.len()).then(|| hints[i]);
                    self.expr(ctx, r, hint);
                }
            }
            Stmt::Block(block) => self.block(ctx, block),
            Stmt::If { init, cond, then, els } => {
                let inner = self.child(ctx);
                if let Some(init) = init {
                    self.stmt(inner, init);
                }
                self.expr(inner, cond, None);
                self.block(inner, then);
                if let Some(els) = els {
                    self.stmt(inner, els);
                }
            }
            Stmt::For { init, cond, post, body } => {
                let inner = self.child(ctx);
                if let Some(init) = init {
                    self.stmt(inner, init);
                }
                if let Some(cond) = cond {
                    self.expr(inner, cond, None);
                }
                if let Some(post) = post {
                    self.stmt(inner, post);
                }
                self.block(inner, body);
            }
            Stmt::Range {
                key,
                value,
                define,
                x,
                body,
            } => {
                let xo = self.expr(ctx, x, None);
                let inner = self.child(ctx);
                let (kt, vt) = self.range_types(xo.ty);
                for (e, t) in [(key, kt), (value, vt)] {
                    let Some(e) = e else { continue };
                    match (e, *define) {
                        (Expr::Ident(id), true) => self.define_var(inner, id, t),
                        _ => {
                            self.expr(inner, e, None);
                        }
                    }
                }
                self.block(inner, body);
            }
            Stmt::Switch { init, tag, clauses } => {
                let inner = self.child(ctx);
                if let Some(init) = init {
                    self.stmt(inner, init);
                }
                let tag_ty = tag.as_ref().map(|t| self.expr(inner, t, None).ty);
                for clause in clauses {
                    let clause_ctx = self.child(inner);
                    for e in &clause.list {
                        self.expr(clause_ctx, e, tag_ty);
                    }
                    self.block_stmts(clause_ctx, &clause.body);
                }
            }
            Stmt::TypeSwitch { init, bind, x, clauses } => {
                let inner = self.child(ctx);
                if let Some(init) = init {
                    self.stmt(inner, init);
                }
                let xo = self.expr(inner, x, None);
                self.type_switch(inner, bind.as_ref(), xo.ty, clauses);
            }
            Stmt::Select { clauses } => {
                for clause in clauses {
                    let clause_ctx = self.child(ctx);
                    if let Some(comm) = &clause.comm {
                        self.stmt(clause_ctx, comm);
                    }
                    self.block_stmts(clause_ctx, &clause.body);
                }
            }
        }
    }

    fn type_switch(&mut self, ctx: Ctx, bind: Option<&Ident>, x_ty: TypeId, clauses: &[CaseClause]) {
        let mut first = None;
        for clause in clauses {
            let clause_ctx = self.child(ctx);
            let types: Vec<TypeId> = clause.list.iter().map(|t| self.typexpr(clause_ctx, t)).collect();
            if let Some(bind) = bind {
                let ty = match types.as_slice() {
                    [single] if !matches!(self.ty(*single), Type::Invalid) => *single,
                    _ => x_ty,
                };
                // One object per clause, all declared at the binding
                let obj = self.new_object(Object {
                    name: bind.name.clone(),
                    kind: ObjKind::Var,
                    pkg: Some(self.file(ctx.file).pkg),
                    pos: Some(self.file_loc(ctx.file, bind)),
                    ty: TySlot::Done(ty),
                    decl: DeclSite::None,
                });
                first.get_or_insert(obj);
                if !bind.is_blank() {
                    self.scope_mut(clause_ctx.scope).names.insert(bind.name.clone(), obj);
                }
            }
            self.block_stmts(clause_ctx, &clause.body);
        }
        if let (Some(bind), Some(obj)) = (bind, first) {
            self.record_def(ctx.file, bind, obj);
        }
    }

    fn result_types(&mut self, sig: Option<TypeId>) -> Vec<TypeId> {
        let Some(sig) = sig else {
            return Vec::new();
        };
        let Type::Signature(s) = self.ty(sig).clone() else {
            return Vec::new();
        };
        s.results.iter().map(|r| self.obj_type(*r)).collect()
    }

    fn define_var(&mut self, ctx: Ctx, id: &Ident, ty: TypeId) {
        if id.is_blank() {
            return;
        }
        if let Some(&existing) = self.scope(ctx.scope).names.get(&id.name) {
            // Redeclaration in the same scope assigns instead
            self.record_use(ctx.file, id, existing);
            return;
        }
        let obj = self.declare(ctx.file, id, ObjKind::Var, TySlot::Done(ty), DeclSite::None);
        self.scope_mut(ctx.scope).names.insert(id.name.clone(), obj);
    }

    fn define(&mut self, ctx: Ctx, lhs: &[Expr], rhs: &[Expr]) {
        let types = self.rhs_types(ctx, lhs.len(), rhs);
        for (i, l) in lhs.iter().enumerate() {
            match l {
                Expr::Ident(id) => {
                    let t = types.get(i).copied().unwrap_or(self.universe.invalid);
                    let t = self.default_type(t);
                    self.define_var(ctx, id, t);
                }
                other => {
                    self.expr(ctx, other, None);
                }
            }
        }
    }

    fn rhs_types(&mut self, ctx: Ctx, n: usize, rhs: &[Expr]) -> Vec<TypeId> {
        if rhs.len() == n {
            return rhs.iter().map(|r| self.expr(ctx, r, None).ty).collect();
        }
        match rhs {
            [single] => {
                let op = self.expr(ctx, single, None);
                (0..n).map(|i| self.tuple_element(op.ty, i)).collect()
            }
            _ => {
                for r in rhs {
                    self.expr(ctx, r, None);
                }
                vec![self.invalid(); n]
            }
        }
    }

    fn local_decl(&mut self, ctx: Ctx, gen: &GenDecl) {
        for spec in &gen.specs {
            match spec {
                Spec::Value(vs) => {
                    let declared = vs.ty.as_ref().map(|t| self.typexpr(ctx, t));
                    let values = match declared {
                        Some(t) => {
                            for v in &vs.values {
                                self.expr(ctx, v, Some(t));
                            }
                            vec![t; vs.names.len()]
                        }
                        None => self.rhs_types(ctx, vs.names.len(), &vs.values),
                    };
                    let kind = match gen.tok {
                        DeclToken::Const => ObjKind::Const,
                        _ => ObjKind::Var,
                    };
                    for (name, ty) in vs.names.iter().zip(values) {
                        let ty = match kind {
                            ObjKind::Var => self.default_type(ty),
                            _ => ty,
                        };
                        let obj = self.declare(ctx.file, name, kind.clone(), TySlot::Done(ty), DeclSite::None);
                        if !name.is_blank() {
                            self.scope_mut(ctx.scope).names.insert(name.name.clone(), obj);
                        }
                    }
                }
                Spec::Type(ts) => {
                    let obj = self.declare(ctx.file, &ts.name, ObjKind::TypeName, TySlot::InProgress, DeclSite::None);
                    if !ts.name.is_blank() {
                        self.scope_mut(ctx.scope).names.insert(ts.name.name.clone(), obj);
                    }
                    if self.object(obj).ty == TySlot::InProgress {
                        self.define_type(ctx, obj, ts, Vec::new());
                    }
                }
            }
        }
    }

    fn chan_elem(&mut self, t: TypeId) -> Option<TypeId> {
        let u = self.underlying(t);
        match self.ty(u) {
            Type::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    fn range_types(&mut self, t: TypeId) -> (TypeId, TypeId) {
        let int = self.basic(BasicKind::Int);
        let invalid = self.invalid();
        let u = self.underlying(t);
        let u = self.deref(u);
        let u = self.underlying(u);
        match self.ty(u).clone() {
            Type::Basic(kind) if kind.is_string() => (int, self.basic(BasicKind::Rune)),
            Type::Basic(kind) if kind.is_integer() => (self.default_type(t), invalid),
            Type::Slice(elem) | Type::Array { elem, .. } => (int, elem),
            Type::Map { key, value } => (key, value),
            Type::Chan { elem, .. } => (elem, invalid),
            Type::Signature(sig) => {
                // Range over function: the yield parameter's parameters
                let Some(yield_fn) = sig.params.first() else {
                    return (invalid, invalid);
                };
                let yt = self.obj_type(*yield_fn);
                let yu = self.underlying(yt);
                match self.ty(yu).clone() {
                    Type::Signature(y) => {
                        let k = y.params.first().map(|p| self.obj_type(*p)).unwrap_or(invalid);
                        let v = y.params.get(1).map(|p| self.obj_type(*p)).unwrap_or(invalid);
                        (k, v)
                    }
                    _ => (invalid, invalid),
                }
            }
            _ => (invalid, invalid),
        }
    }

    // --- expressions ----------------------------------------------------

    /// Check an expression. `hint` is the type a composite literal with an
    /// elided type takes.
    pub(crate) fn expr(&mut self, ctx: Ctx, e: &Expr, hint: Option<TypeId>) -> Operand {
        match e {
            Expr::Ident(id) => self.ident(ctx, id),
            Expr::BasicLit { kind, .. } => self.value(self.literal_type(*kind)),
            Expr::CompositeLit { ty, elts, .. } => {
                let t = match ty {
                    Some(ty) => self.typexpr(ctx, ty),
                    None => hint.unwrap_or(self.universe.invalid),
                };
                self.composite_elements(ctx, t, elts);
                self.value(t)
            }
            Expr::FuncLit { ty, body } => {
                let sig = self.signature(ctx, ty, None);
                if ctx.bodies {
                    let scope = self.new_scope(Some(ctx.scope));
                    self.declare_signature_vars(scope, sig);
                    let inner = Ctx {
                        scope,
                        sig: Some(sig),
                        labels: Some(self.new_scope(None)),
                        ..ctx
                    };
                    self.block_stmts(inner, &body.stmts);
                }
                self.value(sig)
            }
            Expr::Paren(x) => self.expr(ctx, x, hint),
            Expr::Selector { x, sel } => self.selector(ctx, x, sel),
            Expr::Index { x, indices } => {
                let xo = self.expr(ctx, x, None);
                if xo.mode == Mode::Type {
                    let args: Vec<TypeId> = indices.iter().map(|i| self.typexpr(ctx, i)).collect();
                    return Operand {
                        mode: Mode::Type,
                        ty: self.instantiate(xo.ty, args),
                    };
                }
                let u = self.underlying(xo.ty);
                let u = self.deref(u);
                let u = self.underlying(u);
                let (key_hint, result) = match self.ty(u).clone() {
                    Type::Slice(elem) | Type::Array { elem, .. } => (None, Some(elem)),
                    Type::Map { key, value } => (Some(key), Some(value)),
                    Type::Basic(kind) if kind.is_string() => (None, Some(self.basic(BasicKind::Byte))),
                    // Generic function instantiation
                    Type::Signature(_) => {
                        for i in indices {
                            self.typexpr(ctx, i);
                        }
                        return xo;
                    }
                    _ => (None, None),
                };
                for i in indices {
                    self.expr(ctx, i, key_hint);
                }
                match result {
                    Some(t) => self.value(t),
                    None => self.invalid_op(),
                }
            }
            Expr::Slice { x, lo, hi, max } => {
                let xo = self.expr(ctx, x, None);
                for part in [lo, hi, max].into_iter().flatten() {
                    self.expr(ctx, part, None);
                }
                let u = self.underlying(xo.ty);
                match self.ty(u).clone() {
                    Type::Pointer(elem) => {
                        let eu = self.underlying(elem);
                        match self.ty(eu).clone() {
                            Type::Array { elem, .. } => {
                                let s = self.new_type(Type::Slice(elem));
                                self.value(s)
                            }
                            _ => self.invalid_op(),
                        }
                    }
                    Type::Array { elem, .. } => {
                        let s = self.new_type(Type::Slice(elem));
                        self.value(s)
                    }
                    Type::Basic(BasicKind::UntypedString) => self.value(self.basic(BasicKind::String)),
                    _ => self.value(xo.ty),
                }
            }
            Expr::TypeAssert { x, ty } => {
                let xo = self.expr(ctx, x, None);
                match ty {
                    Some(ty) => {
                        let t = self.typexpr(ctx, ty);
                        self.value(t)
                    }
                    None => xo,
                }
            }
            Expr::Call { fun, args, .. } => self.call(ctx, fun, args),
            Expr::Star(x) => {
                let xo = self.expr(ctx, x, None);
                match xo.mode {
                    Mode::Type => {
                        let t = self.new_type(Type::Pointer(xo.ty));
                        Operand { mode: Mode::Type, ty: t }
                    }
                    _ => {
                        let u = self.underlying(xo.ty);
                        match self.ty(u) {
                            Type::Pointer(elem) => self.value(*elem),
                            _ => self.invalid_op(),
                        }
                    }
                }
            }
            Expr::Unary { op, x } => match op {
                UnaryOp::Addr => {
                    let inner_hint = hint.map(|h| self.deref(h));
                    let xo = self.expr(ctx, x, inner_hint);
                    let t = self.new_type(Type::Pointer(xo.ty));
                    self.value(t)
                }
                UnaryOp::Recv => {
                    let xo = self.expr(ctx, x, None);
                    match self.chan_elem(xo.ty) {
                        Some(elem) => self.value(elem),
                        None => self.invalid_op(),
                    }
                }
                UnaryOp::Not | UnaryOp::Other => {
                    let xo = self.expr(ctx, x, hint);
                    self.value(xo.ty)
                }
            },
            Expr::Binary { op, x, y } => {
                let xo = self.expr(ctx, x, None);
                let yo = self.expr(ctx, y, None);
                match op {
                    BinaryOp::Compare => self.value(self.basic(BasicKind::UntypedBool)),
                    BinaryOp::Shift | BinaryOp::Logical => self.value(xo.ty),
                    BinaryOp::Arith => {
                        let untyped = |p: &Program, t: TypeId| matches!(p.ty(t), Type::Basic(k) if k.is_untyped());
                        if untyped(self, xo.ty) && !untyped(self, yo.ty) {
                            self.value(yo.ty)
                        } else {
                            self.value(xo.ty)
                        }
                    }
                }
            }
            Expr::KeyValue { key, value } => {
                self.expr(ctx, key, None);
                self.expr(ctx, value, None);
                self.invalid_op()
            }
            Expr::Ellipsis(None) | Expr::Bad(_) => self.invalid_op(),
            // Type expressions in value position (conversions, make, new)
            other => {
                let t = self.typexpr(ctx, other);
                Operand { mode: Mode::Type, ty: t }
            }
        }
    }

    fn ident(&mut self, ctx: Ctx, id: &Ident) -> Operand {
        if id.is_blank() {
            return self.invalid_op();
        }
        let Some(obj) = self.lookup(ctx.scope, &id.name) else {
            return self.invalid_op();
        };
        self.record_use(ctx.file, id, obj);
        let kind = self.object(obj).kind.clone();
        match kind {
            ObjKind::PkgName { .. } => Operand {
                mode: Mode::Package(obj),
                ty: self.invalid(),
            },
            ObjKind::TypeName => Operand {
                mode: Mode::Type,
                ty: self.obj_type(obj),
            },
            ObjKind::Builtin(b) => Operand {
                mode: Mode::Builtin(b),
                ty: self.invalid(),
            },
            ObjKind::Label => self.invalid_op(),
            _ => {
                let t = self.obj_type(obj);
                self.value(t)
            }
        }
    }

    fn selector(&mut self, ctx: Ctx, x: &Expr, sel: &Ident) -> Operand {
        if let Expr::Ident(base) = x {
            let is_import = self
                .lookup(ctx.scope, &base.name)
                .is_some_and(|o| matches!(self.object(o).kind, ObjKind::PkgName { .. }));
            if is_import {
                return match self.qualified(ctx, x, sel) {
                    Some(obj) => match self.object(obj).kind.clone() {
                        ObjKind::TypeName => Operand {
                            mode: Mode::Type,
                            ty: self.obj_type(obj),
                        },
                        _ => {
                            let t = self.obj_type(obj);
                            self.value(t)
                        }
                    },
                    None => self.invalid_op(),
                };
            }
        }

        let xo = self.expr(ctx, x, None);
        if matches!(xo.mode, Mode::Invalid | Mode::NoValue | Mode::Package(_) | Mode::Builtin(_)) {
            return self.invalid_op();
        }
        let Some(mut found) = self.lookup_field_or_method(xo.ty, &sel.name) else {
            return self.invalid_op();
        };
        if self.object(found).kind == ObjKind::Func {
            let declared = self.obj_type(found);
            let instantiated = self.method_type_on(xo.ty, found);
            if instantiated != declared {
                found = self.retyped(found, instantiated);
            }
        }
        self.record_use(ctx.file, sel, found);
        let t = self.obj_type(found);
        self.value(t)
    }

    fn composite_elements(&mut self, ctx: Ctx, t: TypeId, elts: &[Expr]) {
        let u = self.underlying(t);
        let u = self.deref(u);
        let u = self.underlying(u);
        match self.ty(u).clone() {
            Type::Struct { fields } => {
                for (i, elt) in elts.iter().enumerate() {
                    match elt {
                        Expr::KeyValue { key, value } => {
                            let field = match key.as_ref() {
                                Expr::Ident(k) => fields.iter().copied().find(|f| self.object(*f).name == k.name).map(|f| (k, f)),
                                _ => None,
                            };
                            let hint = match field {
                                Some((k, f)) => {
                                    self.record_use(ctx.file, k, f);
                                    Some(self.obj_type(f))
                                }
                                None => None,
                            };
                            self.expr(ctx, value, hint);
                        }
                        other => {
                            let hint = fields.get(i).map(|f| self.obj_type(*f));
                            self.expr(ctx, other, hint);
                        }
                    }
                }
            }
            Type::Slice(elem) | Type::Array { elem, .. } => {
                for elt in elts {
                    match elt {
                        Expr::KeyValue { key, value } => {
                            self.expr(ctx, key, None);
                            self.expr(ctx, value, Some(elem));
                        }
                        other => {
                            self.expr(ctx, other, Some(elem));
                        }
                    }
                }
            }
            Type::Map { key: kt, value: vt } => {
                for elt in elts {
                    match elt {
                        Expr::KeyValue { key, value } => {
                            self.expr(ctx, key, Some(kt));
                            self.expr(ctx, value, Some(vt));
                        }
                        other => {
                            self.expr(ctx, other, Some(vt));
                        }
                    }
                }
            }
            _ => {
                for elt in elts {
                    match elt {
                        Expr::KeyValue { key, value } => {
                            // Keys of an unknown type may be field names; leave them unbound
                            if !matches!(key.as_ref(), Expr::Ident(_)) {
                                self.expr(ctx, key, None);
                            }
                            self.expr(ctx, value, None);
                        }
                        other => {
                            self.expr(ctx, other, None);
                        }
                    }
                }
            }
        }
    }

    fn call(&mut self, ctx: Ctx, fun: &Expr, args: &[Expr]) -> Operand {
        let fo = self.expr(ctx, fun, None);
        match fo.mode {
            Mode::Type => {
                for a in args {
                    self.expr(ctx, a, Some(fo.ty));
                }
                self.value(fo.ty)
            }
            Mode::Builtin(b) => self.builtin_call(ctx, b, args),
            Mode::Value => {
                let u = self.underlying(fo.ty);
                let Type::Signature(sig) = self.ty(u).clone() else {
                    for a in args {
                        self.expr(ctx, a, None);
                    }
                    return self.invalid_op();
                };
                let params: Vec<TypeId> = sig.params.iter().map(|p| self.obj_type(*p)).collect();
                for (i, a) in args.iter().enumerate() {
                    let mut hint = params.get(i).or(params.last()).copied();
                    if sig.variadic && i + 1 >= params.len() {
                        hint = hint.map(|h| match self.ty(h) {
                            Type::Slice(elem) => *elem,
                            _ => h,
                        });
                    }
                    self.expr(ctx, a, hint);
                }
                let results: Vec<TypeId> = sig.results.iter().map(|r| self.obj_type(*r)).collect();
                match results.as_slice() {
                    [] => Operand {
                        mode: Mode::NoValue,
                        ty: self.invalid(),
                    },
                    [single] => self.value(*single),
                    _ => {
                        let t = self.new_type(Type::Tuple(results));
                        self.value(t)
                    }
                }
            }
            _ => {
                for a in args {
                    self.expr(ctx, a, None);
                }
                self.invalid_op()
            }
        }
    }

    fn builtin_call(&mut self, ctx: Ctx, b: Builtin, args: &[Expr]) -> Operand {
        let no_value = Operand {
            mode: Mode::NoValue,
            ty: self.invalid(),
        };
        match b {
            Builtin::New | Builtin::Make => {
                let Some((first, rest)) = args.split_first() else {
                    return self.invalid_op();
                };
                let t = self.typexpr(ctx, first);
                for a in rest {
                    self.expr(ctx, a, None);
                }
                if b == Builtin::New {
                    let p = self.new_type(Type::Pointer(t));
                    self.value(p)
                } else {
                    self.value(t)
                }
            }
            _ => {
                let types: Vec<TypeId> = match args.split_first() {
                    Some((first, rest)) if b == Builtin::Append => {
                        let s = self.expr(ctx, first, None).ty;
                        let elem = {
                            let u = self.underlying(s);
                            match self.ty(u) {
                                Type::Slice(elem) => Some(*elem),
                                _ => None,
                            }
                        };
                        for a in rest {
                            self.expr(ctx, a, elem);
                        }
                        vec![s]
                    }
                    _ => args.iter().map(|a| self.expr(ctx, a, None).ty).collect(),
                };
                let first = types.first().copied().unwrap_or(self.universe.invalid);
                match b {
                    Builtin::Append | Builtin::Max | Builtin::Min => self.value(first),
                    Builtin::Len | Builtin::Cap | Builtin::Copy => self.value(self.basic(BasicKind::Int)),
                    Builtin::Complex => self.value(self.basic(BasicKind::Complex128)),
                    Builtin::Real | Builtin::Imag => self.value(self.basic(BasicKind::Float64)),
                    Builtin::Recover => self.value(self.universe.any),
                    _ => no_value,
                }
            }
        }
    }
}
