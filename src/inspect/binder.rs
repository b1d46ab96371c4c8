//! Mapping identifier occurrences to the objects they denote.

use crate::types::{FileId, IdentKey, ObjId, Program};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub obj: ObjId,
    /// The occurrence is the declaration itself rather than a use
    pub declaring: bool,
}

/// Object denoted by the identifier starting at `offset` in `file`.
///
/// Uses are consulted before declarations. `None` means nothing binds
/// there: the blank identifier, a package clause, or code the checker
/// could not resolve.
pub fn bind(program: &Program, file: FileId, offset: usize) -> Option<Binding> {
    let key = IdentKey { file, offset };
    if let Some(&obj) = program.info.uses.get(&key) {
        return Some(Binding { obj, declaring: false });
    }
    program
        .info
        .defs
        .get(&key)
        .map(|&obj| Binding { obj, declaring: true })
}
