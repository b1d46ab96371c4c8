//! Type strings in the form the Go toolchain prints them, qualified by
//! full import path: `func(w io.Writer) (n int, err error)`,
//! `example.com/m.Config`, `struct{A string; B int}`.

use super::object::{ObjId, ObjKind, TySlot};
use super::program::Program;
use super::ty::{ChanDir, Type, TypeId};

impl Program {
    pub fn type_string(&self, t: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, t, 0);
        out
    }

    /// Type string of an object; empty for imports, which have no type
    pub fn object_type_string(&self, obj: ObjId) -> String {
        let o = self.object(obj);
        if matches!(o.kind, ObjKind::PkgName { .. } | ObjKind::Builtin(_) | ObjKind::Label) {
            return String::new();
        }
        match o.ty {
            TySlot::Done(t) => self.type_string(t),
            _ => "invalid type".to_string(),
        }
    }

    fn slot(&self, obj: ObjId) -> Option<TypeId> {
        match self.object(obj).ty {
            TySlot::Done(t) => Some(t),
            _ => None,
        }
    }

    fn write_type(&self, out: &mut String, t: TypeId, depth: usize) {
        if depth > 16 {
            out.push_str("...");
            return;
        }
        let d = depth + 1;
        if t == self.universe.any {
            out.push_str("any");
            return;
        }
        match self.ty(t) {
            Type::Invalid => out.push_str("invalid type"),
            Type::Basic(kind) => out.push_str(kind.name()),
            Type::Named(n) => {
                let obj = self.object(n.obj);
                if let Some(pkg) = obj.pkg {
                    out.push_str(&self.package(pkg).path);
                    out.push('.');
                }
                out.push_str(&obj.name);
                if !n.targs.is_empty() {
                    out.push('[');
                    for (i, arg) in n.targs.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(out, *arg, d);
                    }
                    out.push(']');
                }
            }
            Type::TypeParam { obj, .. } => out.push_str(&self.object(*obj).name),
            Type::Pointer(elem) => {
                out.push('*');
                self.write_type(out, *elem, d);
            }
            Type::Slice(elem) => {
                out.push_str("[]");
                self.write_type(out, *elem, d);
            }
            Type::Array { len, elem } => {
                match len {
                    Some(n) => out.push_str(&format!("[{n}]")),
                    None => out.push_str("[?]"),
                }
                self.write_type(out, *elem, d);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.write_type(out, *key, d);
                out.push(']');
                self.write_type(out, *value, d);
            }
            Type::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_type(out, *elem, d);
            }
            Type::Signature(_) => {
                out.push_str("func");
                self.write_signature(out, t, d);
            }
            Type::Struct { fields } => {
                out.push_str("struct{");
                for (i, f) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let obj = self.object(*f);
                    if obj.kind == (ObjKind::Field { embedded: false }) {
                        out.push_str(&obj.name);
                        out.push(' ');
                    }
                    self.write_slot(out, *f, d);
                }
                out.push('}');
            }
            Type::Interface { methods, embeddeds } => {
                out.push_str("interface{");
                let mut first = true;
                for m in methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(&self.object(*m).name);
                    if let Some(sig) = self.slot(*m) {
                        self.write_signature(out, sig, d);
                    }
                }
                for e in embeddeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    self.write_type(out, *e, d);
                }
                out.push('}');
            }
            Type::Tuple(elems) => {
                out.push('(');
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, *e, d);
                }
                out.push(')');
            }
        }
    }

    fn write_slot(&self, out: &mut String, obj: ObjId, depth: usize) {
        match self.slot(obj) {
            Some(t) => self.write_type(out, t, depth),
            None => out.push_str("invalid type"),
        }
    }

    /// `(params) results` without the leading `func`
    fn write_signature(&self, out: &mut String, t: TypeId, depth: usize) {
        let Type::Signature(sig) = self.ty(t) else {
            return;
        };
        self.write_params(out, &sig.params, sig.variadic, depth);
        match sig.results.as_slice() {
            [] => {}
            [single] if self.object(*single).name.is_empty() => {
                out.push(' ');
                self.write_slot(out, *single, depth);
            }
            results => {
                out.push(' ');
                self.write_params(out, results, false, depth);
            }
        }
    }

    fn write_params(&self, out: &mut String, params: &[ObjId], variadic: bool, depth: usize) {
        out.push('(');
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let obj = self.object(*p);
            if !obj.name.is_empty() {
                out.push_str(&obj.name);
                out.push(' ');
            }
            let last = i + 1 == params.len();
            match (variadic && last, self.slot(*p).map(|t| self.ty(t))) {
                (true, Some(Type::Slice(elem))) => {
                    out.push_str("...");
                    self.write_type(out, *elem, depth);
                }
                _ => self.write_slot(out, *p, depth),
            }
        }
        out.push(')');
    }
}
