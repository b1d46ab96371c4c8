//! Structural satisfaction in both directions: the types implementing an
//! interface, and the interfaces a type implements.

use anyhow::Result;
use tracing::debug;

use super::binder::bind;
use super::enricher::{declaring_package, package_name, Enricher, Query};
use super::position::{func_decl_at, type_spec_name_at, FuncAt};
use super::relation::{Relation, RelationKind};
use crate::types::{ObjId, ObjKind, PackageId, Program, TypeId};

/// The type named `name` declared in package `decl_path`, as seen from
/// `from`. Loads the package into `program` if nothing imported it yet.
fn local_type(program: &mut Program, from: PackageId, decl_path: &str, name: &str) -> Option<TypeId> {
    let pkg = if program.package(from).path == decl_path {
        from
    } else {
        match program.package_by_path(decl_path) {
            Some(pkg) => pkg,
            None => {
                let dir = program.package(from).dir.clone();
                program.import(&dir, decl_path).ok()?
            }
        }
    };
    let obj = program.package_member(pkg, name)?;
    if program.object(obj).kind != ObjKind::TypeName {
        return None;
    }
    Some(program.obj_type(obj))
}

/// Type names declared or used anywhere in the recorded files
fn type_names(program: &Program) -> Vec<ObjId> {
    let mut objs: Vec<ObjId> = program
        .info
        .defs
        .values()
        .chain(program.info.uses.values())
        .copied()
        .filter(|o| {
            let obj = program.object(*o);
            obj.kind == ObjKind::TypeName && obj.pos.is_some()
        })
        .collect();
    objs.sort();
    objs.dedup();
    objs
}

fn has_methods(program: &mut Program, iface: TypeId) -> bool {
    let u = program.underlying(iface);
    !program.interface_methods(u).is_empty()
}

/// Whether concrete or interface type `t` satisfies `iface` without being
/// the same interface
fn satisfies(program: &mut Program, t: TypeId, iface: TypeId) -> bool {
    if !program.is_named(t) {
        return false;
    }
    let tu = program.underlying(t);
    let iu = program.underlying(iface);
    !program.identical(tu, iu) && program.implements(t, iface)
}

/// The type declared by the type spec enclosing the cursor
fn declared_type_at(query: &mut Query) -> Option<(ObjId, TypeId)> {
    let spec = type_spec_name_at(query.program(), query.file, query.loc.pos())?;
    let binding = bind(query.program(), query.file, spec.offset)?;
    if !binding.declaring || query.program().object(binding.obj).kind != ObjKind::TypeName {
        return None;
    }
    let t = query.program_mut().obj_type(binding.obj);
    Some((binding.obj, t))
}

/// Relation to `owner`'s method: `Type.Method()` for implementations,
/// `Interface.Method` for interfaces
fn method_relation(program: &Program, kind: RelationKind, owner: ObjId, method: ObjId) -> Option<Relation> {
    let m = program.object(method);
    let owner = &program.object(owner).name;
    let name = match kind {
        RelationKind::Interface => format!("{}.{}", owner, m.name),
        _ => format!("{}.{}()", owner, m.name),
    };
    Some(Relation::new(kind, package_name(program, method), name, m.pos.clone()?))
}

fn type_relation(program: &Program, kind: RelationKind, obj: ObjId) -> Option<Relation> {
    let o = program.object(obj);
    Some(Relation::new(kind, package_name(program, obj), o.name.clone(), o.pos.clone()?))
}

/// Types satisfying the interface declared under the cursor
pub struct ImplementationEnricher;

impl Enricher for ImplementationEnricher {
    fn kind(&self) -> RelationKind {
        RelationKind::Implementation
    }

    fn enrich(&self, query: &mut Query, out: &mut Vec<Relation>) -> Result<()> {
        let Some((iface_obj, iface)) = declared_type_at(query) else {
            return Ok(());
        };
        let program = query.program_mut();
        if !program.is_interface(iface) || !has_methods(program, iface) {
            return Ok(());
        }
        let iface_name = program.object(iface_obj).name.clone();
        let Some((_, decl_path, decl_dir)) = declaring_package(program, iface_obj) else {
            return Ok(());
        };

        // Narrow to one method when the cursor sits on a method name
        let method = match query.ident() {
            Some(ident) => {
                let program = query.program_mut();
                program
                    .lookup_field_or_method(iface, &ident.name)
                    .filter(|m| program.object(*m).kind == ObjKind::Func)
                    .map(|m| program.object(m).name.clone())
            }
            None => None,
        };

        for mut loaded in query.search_packages(&decl_dir, &decl_path, true)? {
            let pkg = loaded.pkg;
            let program = &mut loaded.program;
            let Some(local) = local_type(program, pkg, &decl_path, &iface_name) else {
                continue;
            };
            for obj in type_names(program) {
                let t = program.obj_type(obj);
                if !satisfies(program, t, local) {
                    continue;
                }
                let relation = match &method {
                    None => type_relation(program, RelationKind::Implementation, obj),
                    Some(name) => program
                        .lookup_field_or_method(t, name)
                        .and_then(|m| method_relation(program, RelationKind::Implementation, obj, m)),
                };
                out.extend(relation);
            }
        }
        Ok(())
    }
}

/// Interfaces satisfied by the type, or type method, under the cursor
pub struct InterfaceEnricher;

impl InterfaceEnricher {
    /// Concrete type and optional method name the cursor selects
    fn target(query: &mut Query) -> Option<(ObjId, TypeId, Option<String>)> {
        if let Some((obj, t)) = declared_type_at(query) {
            return Some((obj, t, None));
        }
        let ident = query.ident()?;
        match func_decl_at(query.program(), query.file, query.loc.pos())? {
            FuncAt::Method { name, receiver } if name.offset == ident.offset => {
                let pkg = query.target.pkg;
                let obj = query.program().package_member(pkg, &receiver)?;
                if query.program().object(obj).kind != ObjKind::TypeName {
                    return None;
                }
                let t = query.program_mut().obj_type(obj);
                Some((obj, t, Some(name.name)))
            }
            FuncAt::Func { name } if name.offset == ident.offset => {
                debug!(func = %name.name, "interface relations for plain functions are not supported");
                None
            }
            _ => None,
        }
    }
}

impl Enricher for InterfaceEnricher {
    fn kind(&self) -> RelationKind {
        RelationKind::Interface
    }

    fn enrich(&self, query: &mut Query, out: &mut Vec<Relation>) -> Result<()> {
        let Some((type_obj, t, method)) = Self::target(query) else {
            return Ok(());
        };
        let program = query.program_mut();
        if program.is_interface(t) {
            return Ok(());
        }
        let type_name = program.object(type_obj).name.clone();
        let Some((_, decl_path, decl_dir)) = declaring_package(program, type_obj) else {
            return Ok(());
        };

        for mut loaded in query.search_packages(&decl_dir, &decl_path, true)? {
            let pkg = loaded.pkg;
            let program = &mut loaded.program;
            let Some(local) = local_type(program, pkg, &decl_path, &type_name) else {
                continue;
            };
            for obj in type_names(program) {
                let iface = program.obj_type(obj);
                if !program.is_interface(iface) || !has_methods(program, iface) {
                    continue;
                }
                if !satisfies(program, local, iface) {
                    continue;
                }
                let relation = match &method {
                    None => type_relation(program, RelationKind::Interface, obj),
                    Some(name) => program
                        .lookup_field_or_method(iface, name)
                        .and_then(|m| method_relation(program, RelationKind::Interface, obj, m)),
                };
                out.extend(relation);
            }
        }
        Ok(())
    }
}
