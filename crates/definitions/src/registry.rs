use std::{collections::BTreeMap, sync::Arc};

use shared::domain::Block;
use tracing::{debug, warn};

use crate::{block::BlockDefinition, blocks::builtin_blocks, error::DefinitionError};

/// Validated block definitions, keyed and iterated in block id order.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: BTreeMap<Block, Arc<BlockDefinition>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every built-in block. A block whose table fails validation is logged and left
    /// out; the rest still load.
    pub fn builtin() -> Self {
        let (registry, failures) = Self::from_definitions(builtin_blocks());
        for error in &failures {
            warn!(%error, "skipping block with invalid definition");
        }
        registry
    }

    pub fn from_definitions(
        definitions: impl IntoIterator<Item = BlockDefinition>,
    ) -> (Self, Vec<DefinitionError>) {
        let mut registry = Self::new();
        let failures = definitions
            .into_iter()
            .filter_map(|definition| registry.register(definition).err())
            .collect();
        (registry, failures)
    }

    pub fn register(
        &mut self,
        definition: BlockDefinition,
    ) -> Result<Arc<BlockDefinition>, DefinitionError> {
        if self.blocks.contains_key(&definition.block) {
            return Err(DefinitionError::DuplicateBlock(definition.block));
        }
        definition.validate()?;

        debug!(
            block = %definition.block,
            fields = definition.fields.len(),
            "registered block definition"
        );
        let definition = Arc::new(definition);
        self.blocks.insert(definition.block, Arc::clone(&definition));
        Ok(definition)
    }

    pub fn get(&self, block: Block) -> Option<Arc<BlockDefinition>> {
        self.blocks.get(&block).cloned()
    }

    pub fn by_route(&self, route_name: &str) -> Option<Arc<BlockDefinition>> {
        self.blocks
            .values()
            .find(|definition| {
                let nav = &definition.navigation;
                nav.route_name == route_name
                    || nav.list_route == route_name
                    || nav.form_route == route_name
            })
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BlockDefinition>> {
        self.blocks.values()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
