use anyhow::Result;
use spelunk_metal::start_pos;
use tracing::debug;

use super::enricher::{declaring_package, Enricher, Query};
use super::label::reference_label;
use super::relation::{Relation, RelationKind};
use crate::loc::FileLoc;

/// Every use of the symbol declared under the cursor
pub struct ReferenceEnricher;

impl Enricher for ReferenceEnricher {
    fn kind(&self) -> RelationKind {
        RelationKind::Reference
    }

    fn enrich(&self, query: &mut Query, out: &mut Vec<Relation>) -> Result<()> {
        let Some((ident, binding)) = query.binding() else {
            return Ok(());
        };
        if !binding.declaring {
            debug!(name = %ident.name, "not a declaration, no references searched");
            return Ok(());
        }
        let Some((_, decl_path, decl_dir)) = declaring_package(query.program(), binding.obj) else {
            return Ok(());
        };
        let exported = query.program().object(binding.obj).exported();
        let target = ident.loc;

        for loaded in query.search_packages(&decl_dir, &decl_path, exported)? {
            let program = &loaded.program;
            let pkg_name = loaded.name().to_string();
            for (key, obj) in &program.info.uses {
                if program.object(*obj).pos.as_ref() != Some(&target) {
                    continue;
                }
                let file = program.file(key.file);
                let Some(parsed) = file.parsed.as_ref() else {
                    continue;
                };
                let Some(node) = parsed.root().descendant_for_byte_range(key.offset, key.offset) else {
                    continue;
                };
                let name = parsed.text(node);
                out.push(Relation::new(
                    RelationKind::Reference,
                    pkg_name.clone(),
                    reference_label(parsed, key.offset, name),
                    FileLoc::at(&file.path, start_pos(node)),
                ));
            }
        }
        Ok(())
    }
}
