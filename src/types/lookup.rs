//! Method sets, field lookup, type identity and structural satisfaction.

use std::collections::HashSet;

use super::object::{ObjId, ObjKind};
use super::program::Program;
use super::ty::{Type, TypeId};

/// Deepest embedding or nesting followed before giving up
const MAX_DEPTH: usize = 32;

impl Program {
    /// Underlying type; type parameters answer with their constraint's
    pub fn underlying(&mut self, t: TypeId) -> TypeId {
        let mut t = t;
        for _ in 0..MAX_DEPTH {
            match self.ty(t) {
                Type::Named(n) => match (n.underlying, n.origin) {
                    (Some(u), _) => t = u,
                    // Instance of a generic still being resolved
                    (None, Some(origin)) => t = origin,
                    (None, None) => return self.invalid(),
                },
                Type::TypeParam { constraint, .. } => t = *constraint,
                _ => return t,
            }
        }
        self.invalid()
    }

    /// `T` for `*T`, else `t`
    pub fn deref(&self, t: TypeId) -> TypeId {
        match self.ty(t) {
            Type::Pointer(elem) => *elem,
            _ => t,
        }
    }

    pub fn is_interface(&mut self, t: TypeId) -> bool {
        let u = self.underlying(t);
        matches!(self.ty(u), Type::Interface { .. }) && !matches!(self.ty(t), Type::TypeParam { .. })
    }

    pub fn is_named(&self, t: TypeId) -> bool {
        matches!(self.ty(t), Type::Named(_))
    }

    /// Field or method `name` of `t`, searching embedded fields breadth
    /// first. A pointer is looked through once.
    pub fn lookup_field_or_method(&mut self, t: TypeId, name: &str) -> Option<ObjId> {
        let mut current = vec![self.deref(t)];
        let mut seen = HashSet::new();

        for _ in 0..MAX_DEPTH {
            if current.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for t in current {
                if let Type::Named(n) = self.ty(t) {
                    if !seen.insert(n.obj) {
                        continue;
                    }
                    let methods = n.methods.clone();
                    if let Some(m) = methods.into_iter().find(|m| self.object(*m).name == name) {
                        return Some(m);
                    }
                }

                let u = self.underlying(t);
                match self.ty(u).clone() {
                    Type::Struct { fields } => {
                        for field in fields {
                            if self.object(field).name == name {
                                return Some(field);
                            }
                            if self.object(field).kind == (ObjKind::Field { embedded: true }) {
                                let ft = self.obj_type(field);
                                next.push(self.deref(ft));
                            }
                        }
                    }
                    Type::Interface { .. } => {
                        let methods = self.interface_methods(u);
                        if let Some(m) = methods.into_iter().find(|m| self.object(*m).name == name) {
                            return Some(m);
                        }
                    }
                    _ => {}
                }
            }
            current = next;
        }
        None
    }

    /// Complete method set of an interface, embedded interfaces flattened
    pub fn interface_methods(&mut self, t: TypeId) -> Vec<ObjId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_interface_methods(t, &mut out, &mut visited);
        out
    }

    fn collect_interface_methods(&mut self, t: TypeId, out: &mut Vec<ObjId>, visited: &mut HashSet<TypeId>) {
        if !visited.insert(t) || visited.len() > MAX_DEPTH * 8 {
            return;
        }
        let u = self.underlying(t);
        let Type::Interface { methods, embeddeds } = self.ty(u).clone() else {
            return;
        };
        for m in methods {
            let name = &self.object(m).name;
            if !out.iter().any(|o| &self.object(*o).name == name) {
                out.push(m);
            }
        }
        for e in embeddeds {
            self.collect_interface_methods(e, out, visited);
        }
    }

    /// Whether `t` or `*t` has every method of `iface` with an identical
    /// signature. Receiver kinds are not distinguished.
    pub fn implements(&mut self, t: TypeId, iface: TypeId) -> bool {
        let methods = self.interface_methods(iface);
        for m in methods {
            let name = self.object(m).name.clone();
            let Some(found) = self.lookup_field_or_method(t, &name) else {
                return false;
            };
            if self.object(found).kind != ObjKind::Func {
                return false;
            }
            let want = self.obj_type(m);
            let got = self.method_type_on(t, found);
            if !self.identical(want, got) {
                return false;
            }
        }
        true
    }

    /// Structural type identity. Receivers and parameter names are ignored;
    /// invalid types are identical to each other so that unresolved imports
    /// do not break satisfaction.
    pub fn identical(&mut self, a: TypeId, b: TypeId) -> bool {
        self.identical_at(a, b, 0)
    }

    fn identical_at(&mut self, a: TypeId, b: TypeId, depth: usize) -> bool {
        if a == b {
            return true;
        }
        if depth > MAX_DEPTH {
            return true;
        }
        let d = depth + 1;
        match (self.ty(a).clone(), self.ty(b).clone()) {
            (Type::Invalid, Type::Invalid) => true,
            (Type::Basic(x), Type::Basic(y)) => x.canonical() == y.canonical(),
            // An uninstantiated generic matches any of its instances
            (Type::Named(x), Type::Named(y)) => {
                x.obj == y.obj
                    && (x.targs.is_empty()
                        || y.targs.is_empty()
                        || (x.targs.len() == y.targs.len()
                            && x.targs.iter().zip(&y.targs).all(|(p, q)| self.identical_at(*p, *q, d))))
            }
            (Type::TypeParam { obj: x, .. }, Type::TypeParam { obj: y, .. }) => x == y,
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => self.identical_at(x, y, d),
            (Type::Array { len: lx, elem: x }, Type::Array { len: ly, elem: y }) => {
                lx == ly && self.identical_at(x, y, d)
            }
            (Type::Map { key: kx, value: vx }, Type::Map { key: ky, value: vy }) => {
                self.identical_at(kx, ky, d) && self.identical_at(vx, vy, d)
            }
            (Type::Chan { dir: dx, elem: x }, Type::Chan { dir: dy, elem: y }) => {
                dx == dy && self.identical_at(x, y, d)
            }
            (Type::Signature(x), Type::Signature(y)) => {
                x.variadic == y.variadic
                    && self.identical_vars(&x.params, &y.params, d)
                    && self.identical_vars(&x.results, &y.results, d)
            }
            (Type::Struct { fields: x }, Type::Struct { fields: y }) => {
                if x.len() != y.len() {
                    return false;
                }
                for (fx, fy) in x.into_iter().zip(y) {
                    if self.object(fx).name != self.object(fy).name || self.object(fx).kind != self.object(fy).kind {
                        return false;
                    }
                    let (tx, ty) = (self.obj_type(fx), self.obj_type(fy));
                    if !self.identical_at(tx, ty, d) {
                        return false;
                    }
                }
                true
            }
            (Type::Interface { .. }, Type::Interface { .. }) => {
                let mx = self.interface_methods(a);
                let my = self.interface_methods(b);
                if mx.len() != my.len() {
                    return false;
                }
                for m in mx {
                    let name = self.object(m).name.clone();
                    let Some(other) = my.iter().copied().find(|o| self.object(*o).name == name) else {
                        return false;
                    };
                    let (tx, ty) = (self.obj_type(m), self.obj_type(other));
                    if !self.identical_at(tx, ty, d) {
                        return false;
                    }
                }
                true
            }
            (Type::Tuple(x), Type::Tuple(y)) => {
                x.len() == y.len() && x.into_iter().zip(y).all(|(p, q)| self.identical_at(p, q, d))
            }
            _ => false,
        }
    }

    fn identical_vars(&mut self, x: &[ObjId], y: &[ObjId], depth: usize) -> bool {
        if x.len() != y.len() {
            return false;
        }
        for (a, b) in x.iter().zip(y) {
            let (ta, tb) = (self.obj_type(*a), self.obj_type(*b));
            if !self.identical_at(ta, tb, depth) {
                return false;
            }
        }
        true
    }
}
