//! The program: arenas for packages, files, objects, scopes and types,
//! plus package loading and the collect phase.

use anyhow::Result;
use spelunk_metal::{GoParser, ParsedFile};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::object::{DeclSite, ObjId, ObjKind, Object, Scope, ScopeId, TySlot};
use super::ty::{BasicKind, Type, TypeId};
use super::universe::Universe;
use crate::loc::FileLoc;
use crate::syntax::ast::{Decl, DeclToken, File, Ident, Spec};
use crate::syntax::{self, BodyFilter};
use crate::workspace::{guess_package_name, scan_dir, ImportResolver, PackageMeta, Variant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub(crate) u32);

#[derive(Debug)]
pub struct Package {
    /// Import path; the external test package carries a `_test` suffix
    pub path: String,
    pub name: String,
    pub dir: PathBuf,
    pub scope: ScopeId,
    pub files: Vec<FileId>,
    /// Stand-in for an import that could not be found
    pub fake: bool,
    /// Methods by receiver base type name, attached when the type resolves
    pub(crate) methods: HashMap<String, Vec<ObjId>>,
}

#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub ast: Arc<File>,
    /// Concrete tree, kept only for files whose uses are recorded
    pub parsed: Option<ParsedFile>,
    pub pkg: PackageId,
    pub scope: ScopeId,
    pub record: bool,
}

/// An identifier occurrence: file plus byte offset of its first byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentKey {
    pub file: FileId,
    pub offset: usize,
}

/// Identifier resolutions for recorded files
#[derive(Debug, Default)]
pub struct TypesInfo {
    /// Declaring occurrences
    pub defs: HashMap<IdentKey, ObjId>,
    /// Every other occurrence that denotes an object
    pub uses: HashMap<IdentKey, ObjId>,
}

pub struct Program {
    resolver: Arc<ImportResolver>,
    pub(crate) types: Vec<Type>,
    pub(crate) objects: Vec<Object>,
    pub(crate) scopes: Vec<Scope>,
    pub(crate) packages: Vec<Package>,
    pub(crate) files: Vec<SourceFile>,
    pub(crate) universe: Universe,
    pub info: TypesInfo,
    by_path: HashMap<String, PackageId>,
    metas: HashMap<(PathBuf, String), Option<PackageMeta>>,
    interned: HashMap<IdentKey, ObjId>,
    /// Generic instances by origin and type arguments
    pub(crate) instances: HashMap<(TypeId, Vec<TypeId>), TypeId>,
}

impl Program {
    pub fn new(resolver: Arc<ImportResolver>) -> Self {
        let mut program = Self {
            resolver,
            types: Vec::new(),
            objects: Vec::new(),
            scopes: Vec::new(),
            packages: Vec::new(),
            files: Vec::new(),
            universe: Universe::placeholder(),
            info: TypesInfo::default(),
            by_path: HashMap::new(),
            metas: HashMap::new(),
            interned: HashMap::new(),
            instances: HashMap::new(),
        };
        program.universe = Universe::build(&mut program);
        program
    }

    // --- arenas ---------------------------------------------------------

    pub(crate) fn new_type(&mut self, ty: Type) -> TypeId {
        self.types.push(ty);
        TypeId(self.types.len() as u32 - 1)
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    pub(crate) fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.0 as usize]
    }

    pub(crate) fn new_object(&mut self, obj: Object) -> ObjId {
        self.objects.push(obj);
        ObjId(self.objects.len() as u32 - 1)
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.0 as usize]
    }

    pub(crate) fn object_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objects[id.0 as usize]
    }

    pub(crate) fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            names: HashMap::new(),
        });
        ScopeId(self.scopes.len() as u32 - 1)
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Innermost object named `name` visible from `scope`
    pub fn lookup(&self, mut scope: ScopeId, name: &str) -> Option<ObjId> {
        loop {
            let s = self.scope(scope);
            if let Some(&obj) = s.names.get(name) {
                return Some(obj);
            }
            scope = s.parent?;
        }
    }

    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.0 as usize]
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0 as usize]
    }

    pub fn file_by_path(&self, path: &Path) -> Option<FileId> {
        self.files
            .iter()
            .position(|f| f.record && f.path == path)
            .map(|i| FileId(i as u32))
    }

    /// Files whose identifier resolutions were recorded
    pub fn recorded_files(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files
            .iter()
            .enumerate()
            .filter(|(_, f)| f.record)
            .map(|(i, _)| FileId(i as u32))
    }

    pub fn package_by_path(&self, path: &str) -> Option<PackageId> {
        self.by_path.get(path).copied()
    }

    /// Object declared at package level under `name`
    pub fn package_member(&self, pkg: PackageId, name: &str) -> Option<ObjId> {
        self.scope(self.package(pkg).scope).names.get(name).copied()
    }

    pub fn invalid(&self) -> TypeId {
        self.universe.invalid
    }

    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.universe.basic(kind)
    }

    pub fn file_loc(&self, file: FileId, ident: &Ident) -> FileLoc {
        FileLoc::at(&self.file(file).path, ident.span.start)
    }

    // --- recording ------------------------------------------------------

    pub(crate) fn key(file: FileId, ident: &Ident) -> IdentKey {
        IdentKey {
            file,
            offset: ident.span.lo,
        }
    }

    pub(crate) fn record_def(&mut self, file: FileId, ident: &Ident, obj: ObjId) {
        if self.file(file).record && !ident.is_blank() {
            self.info.defs.insert(Self::key(file, ident), obj);
        }
    }

    pub(crate) fn record_use(&mut self, file: FileId, ident: &Ident, obj: ObjId) {
        if self.file(file).record {
            self.info.uses.insert(Self::key(file, ident), obj);
        }
    }

    pub(crate) fn interned_obj(&self, key: IdentKey) -> Option<ObjId> {
        self.interned.get(&key).copied()
    }

    /// The object declared by `ident`, created once no matter how often its
    /// declaration is revisited
    pub(crate) fn declare(
        &mut self,
        file: FileId,
        ident: &Ident,
        kind: ObjKind,
        ty: TySlot,
        decl: DeclSite,
    ) -> ObjId {
        let key = Self::key(file, ident);
        if let Some(&obj) = self.interned.get(&key) {
            return obj;
        }
        let pkg = self.file(file).pkg;
        let obj = self.new_object(Object {
            name: ident.name.clone(),
            kind,
            pkg: Some(pkg),
            pos: Some(self.file_loc(file, ident)),
            ty,
            decl,
        });
        self.interned.insert(key, obj);
        self.record_def(file, ident, obj);
        obj
    }

    // --- loading --------------------------------------------------------

    /// Load one variant of a workspace package with recording enabled and
    /// check it. `bodies` decides per file which function bodies survive.
    pub fn load_target(
        &mut self,
        meta: &PackageMeta,
        variant: Variant,
        bodies: &dyn Fn(&Path) -> BodyFilter,
    ) -> Result<PackageId> {
        if variant == Variant::XTest && !self.by_path.contains_key(&meta.import_path) {
            // External tests import the package together with its own tests
            self.load_files(
                &meta.import_path,
                &meta.name,
                &meta.dir,
                &meta.files(Variant::Test),
                &|_| BodyFilter::StripAll,
                false,
            )?;
        }
        let name = match variant {
            Variant::XTest => format!("{}_test", meta.name),
            _ => meta.name.clone(),
        };
        let pkg = self.load_files(
            &meta.variant_path(variant),
            &name,
            &meta.dir,
            &meta.files(variant),
            bodies,
            true,
        )?;
        self.check_package(pkg);
        Ok(pkg)
    }

    fn load_files(
        &mut self,
        path: &str,
        name: &str,
        dir: &Path,
        files: &[PathBuf],
        bodies: &dyn Fn(&Path) -> BodyFilter,
        record: bool,
    ) -> Result<PackageId> {
        debug!(package = path, files = files.len(), record, "loading package");
        let scope = self.new_scope(Some(self.universe.scope));
        let pkg = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            path: path.to_string(),
            name: name.to_string(),
            dir: dir.to_path_buf(),
            scope,
            files: Vec::new(),
            fake: false,
            methods: HashMap::new(),
        });
        self.by_path.insert(path.to_string(), pkg);

        let mut parser = GoParser::new()?;
        for file in files {
            let parsed = parser.parse_file(file)?;
            let mut ast = syntax::lower(&parsed);
            syntax::strip_bodies(&mut ast, bodies(file));
            let file_scope = self.new_scope(Some(scope));
            let id = FileId(self.files.len() as u32);
            self.files.push(SourceFile {
                path: file.clone(),
                ast: Arc::new(ast),
                parsed: record.then_some(parsed),
                pkg,
                scope: file_scope,
                record,
            });
            self.packages[pkg.0 as usize].files.push(id);
        }

        self.collect(pkg)?;
        Ok(pkg)
    }

    fn scan_import(&mut self, from: &Path, path: &str) -> Result<Option<PackageMeta>> {
        let key = (from.to_path_buf(), path.to_string());
        if let Some(meta) = self.metas.get(&key) {
            return Ok(meta.clone());
        }
        let meta = match self.resolver.resolve(from, path)? {
            Some(dir) => scan_dir(&dir, &self.resolver)?,
            None => None,
        };
        self.metas.insert(key, meta.clone());
        Ok(meta)
    }

    /// Package name an import binds when the import spec names none
    fn import_name(&mut self, from: &Path, path: &str) -> Result<String> {
        if let Some(pkg) = self.by_path.get(path) {
            return Ok(self.package(*pkg).name.clone());
        }
        if path == "unsafe" {
            return Ok("unsafe".to_string());
        }
        Ok(match self.scan_import(from, path)? {
            Some(meta) => meta.name,
            None => guess_package_name(path),
        })
    }

    /// The package behind `path` as imported from `from`, loaded with all
    /// bodies stripped. Unresolvable imports yield an empty stand-in.
    pub fn import(&mut self, from: &Path, path: &str) -> Result<PackageId> {
        if let Some(&pkg) = self.by_path.get(path) {
            return Ok(pkg);
        }
        if path == "unsafe" {
            return Ok(self.unsafe_package());
        }
        match self.scan_import(from, path)? {
            Some(meta) if !meta.go_files.is_empty() => self.load_files(
                path,
                &meta.name,
                &meta.dir,
                &meta.files(Variant::Plain),
                &|_| BodyFilter::StripAll,
                false,
            ),
            _ => {
                debug!(import = path, "unresolved import");
                Ok(self.fake_package(path, &guess_package_name(path)))
            }
        }
    }

    fn fake_package(&mut self, path: &str, name: &str) -> PackageId {
        let scope = self.new_scope(Some(self.universe.scope));
        let pkg = PackageId(self.packages.len() as u32);
        self.packages.push(Package {
            path: path.to_string(),
            name: name.to_string(),
            dir: PathBuf::new(),
            scope,
            files: Vec::new(),
            fake: true,
            methods: HashMap::new(),
        });
        self.by_path.insert(path.to_string(), pkg);
        pkg
    }

    fn unsafe_package(&mut self) -> PackageId {
        let pkg = self.fake_package("unsafe", "unsafe");
        let ty = self.basic(BasicKind::UnsafePointer);
        let obj = self.new_object(Object {
            name: "Pointer".to_string(),
            kind: ObjKind::TypeName,
            pkg: None,
            pos: None,
            ty: TySlot::Done(ty),
            decl: DeclSite::None,
        });
        let scope = self.package(pkg).scope;
        self.scope_mut(scope).names.insert("Pointer".to_string(), obj);
        pkg
    }

    /// Package imported through a `PkgName` object, loading it on first use
    pub fn imported(&mut self, obj: ObjId) -> Option<PackageId> {
        let (path, imported, from) = match &self.object(obj).kind {
            ObjKind::PkgName { path, imported } => (
                path.clone(),
                *imported,
                self.object(obj).pkg.map(|p| self.package(p).dir.clone()),
            ),
            _ => return None,
        };
        if imported.is_some() {
            return imported;
        }
        let from = from.unwrap_or_default();
        let pkg = match self.import(&from, &path) {
            Ok(pkg) => pkg,
            Err(err) => {
                debug!(import = %path, error = %err, "import failed");
                let name = guess_package_name(&path);
                self.fake_package(&path, &name)
            }
        };
        if let ObjKind::PkgName { imported, .. } = &mut self.object_mut(obj).kind {
            *imported = Some(pkg);
        }
        Some(pkg)
    }

    // --- collect --------------------------------------------------------

    /// Declare every package-level object and import of `pkg`
    fn collect(&mut self, pkg: PackageId) -> Result<()> {
        let files = self.package(pkg).files.clone();
        let dir = self.package(pkg).dir.clone();
        let pkg_scope = self.package(pkg).scope;

        for file in files {
            let ast = self.file(file).ast.clone();
            let file_scope = self.file(file).scope;

            for imp in &ast.imports {
                match imp.name.as_ref().map(|n| n.name.as_str()) {
                    Some("_") => continue,
                    Some(".") => {
                        let target = self.import(&dir, &imp.path)?;
                        let target_scope = self.package(target).scope;
                        let exported: Vec<(String, ObjId)> = self
                            .scope(target_scope)
                            .names
                            .iter()
                            .filter(|(name, _)| syntax::is_exported(name))
                            .map(|(n, o)| (n.clone(), *o))
                            .collect();
                        self.scope_mut(file_scope).names.extend(exported);
                        continue;
                    }
                    _ => {}
                }

                let invalid = self.invalid();
                let kind = ObjKind::PkgName {
                    path: imp.path.clone(),
                    imported: None,
                };
                let obj = match &imp.name {
                    Some(ident) => {
                        self.declare(file, ident, kind, TySlot::Done(invalid), DeclSite::None)
                    }
                    None => {
                        let name = self.import_name(&dir, &imp.path)?;
                        let pos = FileLoc::at(&self.file(file).path, imp.path_span.start);
                        self.new_object(Object {
                            name,
                            kind,
                            pkg: Some(pkg),
                            pos: Some(pos),
                            ty: TySlot::Done(invalid),
                            decl: DeclSite::None,
                        })
                    }
                };
                let name = self.object(obj).name.clone();
                self.scope_mut(file_scope).names.insert(name, obj);
            }

            for (d, decl) in ast.decls.iter().enumerate() {
                match decl {
                    Decl::Gen(gen) => {
                        for (s, spec) in gen.specs.iter().enumerate() {
                            match spec {
                                Spec::Value(vs) => {
                                    let kind = match gen.tok {
                                        DeclToken::Const => ObjKind::Const,
                                        _ => ObjKind::Var,
                                    };
                                    for (i, name) in vs.names.iter().enumerate() {
                                        let site = DeclSite::Value {
                                            file,
                                            decl: d,
                                            spec: s,
                                            index: i,
                                        };
                                        let obj = self.declare(file, name, kind.clone(), TySlot::Pending, site);
                                        if !name.is_blank() {
                                            self.scope_mut(pkg_scope).names.insert(name.name.clone(), obj);
                                        }
                                    }
                                }
                                Spec::Type(ts) => {
                                    let site = DeclSite::Type {
                                        file,
                                        decl: d,
                                        spec: s,
                                    };
                                    let obj = self.declare(file, &ts.name, ObjKind::TypeName, TySlot::Pending, site);
                                    if !ts.name.is_blank() {
                                        self.scope_mut(pkg_scope).names.insert(ts.name.name.clone(), obj);
                                    }
                                }
                            }
                        }
                    }
                    Decl::Func(func) => {
                        let site = DeclSite::Func { file, decl: d };
                        let obj = self.declare(file, &func.name, ObjKind::Func, TySlot::Pending, site);
                        match func.recv.as_ref().and_then(|r| r.list.first()) {
                            Some(recv) => {
                                if let Some(base) = recv.ty.base_ident() {
                                    self.packages[pkg.0 as usize]
                                        .methods
                                        .entry(base.name.clone())
                                        .or_default()
                                        .push(obj);
                                }
                            }
                            None if func.name.name != "init" && !func.name.is_blank() => {
                                self.scope_mut(pkg_scope).names.insert(func.name.name.clone(), obj);
                            }
                            None => {}
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
