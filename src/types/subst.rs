//! Generic instantiation: `G[int]` gets its own named type whose underlying
//! type and method signatures have the type arguments substituted in.

use std::collections::HashMap;

use super::object::{DeclSite, ObjId, TySlot};
use super::program::Program;
use super::ty::{Named, Signature, Type, TypeId};

const MAX_DEPTH: usize = 16;

type Subst = HashMap<TypeId, TypeId>;

impl Program {
    /// `generic[args]`. Types that are not generic, argument count
    /// mismatches and arguments equal to the declared parameters answer
    /// with `generic` itself. Instances are interned so recursive generic
    /// types terminate.
    pub(crate) fn instantiate(&mut self, generic: TypeId, args: Vec<TypeId>) -> TypeId {
        let Type::Named(n) = self.ty(generic).clone() else {
            return generic;
        };
        if n.origin.is_some() || n.tparams.is_empty() || n.tparams.len() != args.len() || n.tparams == args {
            return generic;
        }
        let key = (generic, args.clone());
        if let Some(&inst) = self.instances.get(&key) {
            return inst;
        }
        let map: Subst = n.tparams.iter().copied().zip(args.iter().copied()).collect();
        let inst = self.new_type(Type::Named(Named {
            obj: n.obj,
            underlying: None,
            methods: n.methods,
            tparams: n.tparams,
            targs: args,
            origin: Some(generic),
        }));
        self.instances.insert(key, inst);
        if let Some(u) = n.underlying {
            let under = self.subst(u, &map, 0);
            if let Type::Named(i) = self.ty_mut(inst) {
                i.underlying = Some(under);
            }
        }
        inst
    }

    /// Type of `method` when selected on a value of type `recv`: the
    /// receiver's type arguments replace the type parameters the method's
    /// receiver declares
    pub(crate) fn method_type_on(&mut self, recv: TypeId, method: ObjId) -> TypeId {
        let sig_t = self.obj_type(method);
        let recv = self.deref(recv);
        let Type::Named(inst) = self.ty(recv).clone() else {
            return sig_t;
        };
        if inst.targs.is_empty() {
            return sig_t;
        }
        let Type::Signature(sig) = self.ty(sig_t).clone() else {
            return sig_t;
        };
        let Some(rv) = sig.recv else {
            return sig_t;
        };
        let declared = self.obj_type(rv);
        let declared = self.deref(declared);
        let Type::Named(declared) = self.ty(declared).clone() else {
            return sig_t;
        };
        let params = if declared.targs.is_empty() { declared.tparams } else { declared.targs };
        if params.len() != inst.targs.len() {
            return sig_t;
        }
        let map: Subst = params.into_iter().zip(inst.targs).collect();
        self.subst(sig_t, &map, 0)
    }

    /// Copy of `obj` with type `ty`, keeping its name, kind and position
    pub(crate) fn retyped(&mut self, obj: ObjId, ty: TypeId) -> ObjId {
        let mut copy = self.object(obj).clone();
        copy.ty = TySlot::Done(ty);
        copy.decl = DeclSite::None;
        self.new_object(copy)
    }

    fn subst(&mut self, t: TypeId, map: &Subst, depth: usize) -> TypeId {
        if let Some(&to) = map.get(&t) {
            return to;
        }
        if depth > MAX_DEPTH {
            return t;
        }
        let d = depth + 1;
        match self.ty(t).clone() {
            Type::Pointer(elem) => {
                let e = self.subst(elem, map, d);
                if e == elem { t } else { self.new_type(Type::Pointer(e)) }
            }
            Type::Slice(elem) => {
                let e = self.subst(elem, map, d);
                if e == elem { t } else { self.new_type(Type::Slice(e)) }
            }
            Type::Array { len, elem } => {
                let e = self.subst(elem, map, d);
                if e == elem { t } else { self.new_type(Type::Array { len, elem: e }) }
            }
            Type::Map { key, value } => {
                let (k, v) = (self.subst(key, map, d), self.subst(value, map, d));
                if k == key && v == value {
                    t
                } else {
                    self.new_type(Type::Map { key: k, value: v })
                }
            }
            Type::Chan { dir, elem } => {
                let e = self.subst(elem, map, d);
                if e == elem { t } else { self.new_type(Type::Chan { dir, elem: e }) }
            }
            Type::Tuple(items) => {
                let out: Vec<TypeId> = items.iter().map(|i| self.subst(*i, map, d)).collect();
                if out == items { t } else { self.new_type(Type::Tuple(out)) }
            }
            Type::Signature(sig) => {
                let params = self.subst_vars(&sig.params, map, d);
                let results = self.subst_vars(&sig.results, map, d);
                if params == sig.params && results == sig.results {
                    return t;
                }
                self.new_type(Type::Signature(Signature {
                    recv: sig.recv,
                    params,
                    results,
                    variadic: sig.variadic,
                }))
            }
            Type::Struct { fields } => {
                let out = self.subst_vars(&fields, map, d);
                if out == fields { t } else { self.new_type(Type::Struct { fields: out }) }
            }
            Type::Interface { methods, embeddeds } => {
                let m = self.subst_vars(&methods, map, d);
                let e: Vec<TypeId> = embeddeds.iter().map(|x| self.subst(*x, map, d)).collect();
                if m == methods && e == embeddeds {
                    t
                } else {
                    self.new_type(Type::Interface { methods: m, embeddeds: e })
                }
            }
            // A generic naming itself inside its own declaration
            Type::Named(n) if n.origin.is_none() && n.tparams.iter().any(|p| map.contains_key(p)) => {
                let args = n.tparams.iter().map(|p| map.get(p).copied().unwrap_or(*p)).collect();
                self.instantiate(t, args)
            }
            Type::Named(n) if !n.targs.is_empty() => {
                let args: Vec<TypeId> = n.targs.iter().map(|a| self.subst(*a, map, d)).collect();
                match n.origin {
                    Some(origin) if args != n.targs => self.instantiate(origin, args),
                    _ => t,
                }
            }
            _ => t,
        }
    }

    /// `vars` with substituted types; unaffected objects are reused
    fn subst_vars(&mut self, vars: &[ObjId], map: &Subst, depth: usize) -> Vec<ObjId> {
        let mut out = Vec::with_capacity(vars.len());
        for &v in vars {
            let t = self.obj_type(v);
            let s = self.subst(t, map, depth);
            out.push(if s == t { v } else { self.retyped(v, s) });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GoEnv;
    use crate::types::BasicKind;
    use crate::workspace::ImportResolver;
    use std::sync::Arc;

    #[test]
    fn test_non_generic_types_are_not_instantiated() {
        let mut program = Program::new(Arc::new(ImportResolver::new(GoEnv::default())));
        let int = program.basic(BasicKind::Int);
        let slice = program.new_type(Type::Slice(int));
        assert_eq!(program.instantiate(slice, vec![int]), slice);
    }
}
