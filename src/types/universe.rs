//! Predeclared identifiers.

use super::object::{Builtin, DeclSite, ObjKind, Object, ScopeId, TySlot};
use super::program::Program;
use super::ty::{BasicKind, Named, Signature, Type, TypeId};

const UNTYPED: [BasicKind; 7] = [
    BasicKind::UntypedBool,
    BasicKind::UntypedInt,
    BasicKind::UntypedRune,
    BasicKind::UntypedFloat,
    BasicKind::UntypedComplex,
    BasicKind::UntypedString,
    BasicKind::UntypedNil,
];

#[derive(Debug)]
pub struct Universe {
    pub scope: ScopeId,
    pub invalid: TypeId,
    basics: Vec<(BasicKind, TypeId)>,
    pub error: TypeId,
    /// `any`; printed by name rather than as `interface{}`
    pub any: TypeId,
}

impl Universe {
    pub(crate) fn placeholder() -> Self {
        Self {
            scope: ScopeId(0),
            invalid: TypeId(0),
            basics: Vec::new(),
            error: TypeId(0),
            any: TypeId(0),
        }
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, t)| *t)
            .unwrap_or(self.invalid)
    }

    pub(crate) fn build(p: &mut Program) -> Self {
        let scope = p.new_scope(None);
        let invalid = p.new_type(Type::Invalid);

        let mut basics = Vec::new();
        for kind in BasicKind::TYPED.into_iter().chain(UNTYPED) {
            let ty = p.new_type(Type::Basic(kind));
            basics.push((kind, ty));
            if !kind.is_untyped() && kind != BasicKind::UnsafePointer {
                declare(p, scope, kind.name(), ObjKind::TypeName, ty);
            }
        }
        let basic = |kind: BasicKind| {
            basics
                .iter()
                .find(|(k, _)| *k == kind)
                .map(|(_, t)| *t)
                .unwrap_or(invalid)
        };

        // type error interface { Error() string }
        let result = predeclared(p, "", ObjKind::Var, basic(BasicKind::String));
        let sig = p.new_type(Type::Signature(Signature {
            results: vec![result],
            ..Signature::default()
        }));
        let error_method = predeclared(p, "Error", ObjKind::Func, sig);
        let error_iface = p.new_type(Type::Interface {
            methods: vec![error_method],
            embeddeds: Vec::new(),
        });
        let error = named(p, scope, "error", error_iface);

        let any = p.new_type(Type::Interface {
            methods: Vec::new(),
            embeddeds: Vec::new(),
        });
        declare(p, scope, "any", ObjKind::TypeName, any);
        let comparable_iface = p.new_type(Type::Interface {
            methods: Vec::new(),
            embeddeds: Vec::new(),
        });
        named(p, scope, "comparable", comparable_iface);

        declare(p, scope, "true", ObjKind::Const, basic(BasicKind::UntypedBool));
        declare(p, scope, "false", ObjKind::Const, basic(BasicKind::UntypedBool));
        declare(p, scope, "iota", ObjKind::Const, basic(BasicKind::UntypedInt));
        declare(p, scope, "nil", ObjKind::Nil, basic(BasicKind::UntypedNil));
        for (name, builtin) in Builtin::ALL {
            declare(p, scope, name, ObjKind::Builtin(builtin), invalid);
        }

        Self {
            scope,
            invalid,
            basics,
            error,
            any,
        }
    }
}

fn predeclared(p: &mut Program, name: &str, kind: ObjKind, ty: TypeId) -> super::object::ObjId {
    p.new_object(Object {
        name: name.to_string(),
        kind,
        pkg: None,
        pos: None,
        ty: TySlot::Done(ty),
        decl: DeclSite::None,
    })
}

fn declare(p: &mut Program, scope: ScopeId, name: &str, kind: ObjKind, ty: TypeId) {
    let obj = predeclared(p, name, kind, ty);
    p.scope_mut(scope).names.insert(name.to_string(), obj);
}

fn named(p: &mut Program, scope: ScopeId, name: &str, underlying: TypeId) -> TypeId {
    let obj = predeclared(p, name, ObjKind::TypeName, underlying);
    let ty = p.new_type(Type::Named(Named {
        obj,
        underlying: Some(underlying),
        methods: Vec::new(),
        tparams: Vec::new(),
        targs: Vec::new(),
        origin: None,
    }));
    p.object_mut(obj).ty = TySlot::Done(ty);
    p.scope_mut(scope).names.insert(name.to_string(), obj);
    ty
}
