use anyhow::Result;

use super::enricher::{package_name, Enricher, Query};
use super::relation::{Relation, RelationKind};

/// Where the symbol under the cursor is declared
pub struct DefinitionEnricher;

impl Enricher for DefinitionEnricher {
    fn kind(&self) -> RelationKind {
        RelationKind::Definition
    }

    fn enrich(&self, query: &mut Query, out: &mut Vec<Relation>) -> Result<()> {
        let Some((_, binding)) = query.binding() else {
            return Ok(());
        };
        let program = query.program();
        let obj = program.object(binding.obj);
        let Some(pos) = obj.pos.clone() else {
            return Ok(());
        };
        out.push(Relation::new(
            RelationKind::Definition,
            package_name(program, binding.obj),
            obj.name.clone(),
            pos,
        ));
        Ok(())
    }
}
