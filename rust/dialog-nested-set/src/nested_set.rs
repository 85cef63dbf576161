use dialog_table::{NodeId, Payload, TableBackend};

use crate::{
    DialogNestedSetError, NestedSetConfig, Node, RebuildReport, TreeMutator, TreeReader,
    TreeRebuilder, Violation,
};

/// A forest of nested-set trees kept in one table, bundling a [TreeReader],
/// a [TreeMutator] and a [TreeRebuilder] over the same backend.
#[derive(Clone)]
pub struct NestedSet<Backend>
where
    Backend: TableBackend,
{
    reader: TreeReader<Backend>,
    mutator: TreeMutator<Backend>,
    rebuilder: TreeRebuilder<Backend>,
}

impl<Backend> NestedSet<Backend>
where
    Backend: TableBackend,
{
    /// A [NestedSet] over `backend` with the default [NestedSetConfig]
    pub fn new(backend: Backend) -> Self {
        Self::with_config(backend, NestedSetConfig::default())
    }

    /// A [NestedSet] over `backend` configured by `config`
    pub fn with_config(backend: Backend, config: NestedSetConfig) -> Self {
        Self {
            reader: TreeReader::new(backend.clone()),
            mutator: TreeMutator::new(backend.clone(), config.clone()),
            rebuilder: TreeRebuilder::new(backend, config),
        }
    }

    /// The query half
    pub fn reader(&self) -> &TreeReader<Backend> {
        &self.reader
    }

    /// The mutation half
    pub fn mutator(&self) -> &TreeMutator<Backend> {
        &self.mutator
    }

    /// The repair half
    pub fn rebuilder(&self) -> &TreeRebuilder<Backend> {
        &self.rebuilder
    }

    /// See [TreeMutator::insert_root]
    pub async fn insert_root(&self, payload: Payload) -> Result<NodeId, DialogNestedSetError> {
        self.mutator.insert_root(payload).await
    }

    /// See [TreeMutator::insert_child]
    pub async fn insert_child(
        &self,
        parent_id: NodeId,
        payload: Payload,
    ) -> Result<NodeId, DialogNestedSetError> {
        self.mutator.insert_child(parent_id, payload).await
    }

    /// See [TreeMutator::move_subtree]
    pub async fn move_subtree(
        &self,
        node_id: NodeId,
        new_parent_id: NodeId,
    ) -> Result<Node, DialogNestedSetError> {
        self.mutator.move_subtree(node_id, new_parent_id).await
    }

    /// See [TreeMutator::move_to_root]
    pub async fn move_to_root(&self, node_id: NodeId) -> Result<Node, DialogNestedSetError> {
        self.mutator.move_to_root(node_id).await
    }

    /// See [TreeMutator::delete_node]
    pub async fn delete_node(
        &self,
        node_id: NodeId,
        delete_subtree: bool,
    ) -> Result<u64, DialogNestedSetError> {
        self.mutator.delete_node(node_id, delete_subtree).await
    }

    /// See [TreeRebuilder::rebuild_tree]
    pub async fn rebuild_tree(&self) -> Result<RebuildReport, DialogNestedSetError> {
        self.rebuilder.rebuild_tree().await
    }

    /// See [TreeReader::get_tree]
    pub async fn get_tree(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_tree().await
    }

    /// See [TreeReader::get_node]
    pub async fn get_node(&self, id: NodeId) -> Result<Option<Node>, DialogNestedSetError> {
        self.reader.get_node(id).await
    }

    /// See [TreeReader::get_descendants]
    pub async fn get_descendants(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_descendants(id, include_self).await
    }

    /// See [TreeReader::get_ancestors]
    pub async fn get_ancestors(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_ancestors(id, include_self).await
    }

    /// See [TreeReader::get_children]
    pub async fn get_children(&self, id: NodeId) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_children(id).await
    }

    /// See [TreeReader::get_siblings]
    pub async fn get_siblings(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_siblings(id, include_self).await
    }

    /// See [TreeReader::get_roots]
    pub async fn get_roots(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_roots().await
    }

    /// See [TreeReader::get_leaves]
    pub async fn get_leaves(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        self.reader.get_leaves().await
    }

    /// See [TreeReader::count_descendants]
    pub async fn count_descendants(&self, id: NodeId) -> Result<i64, DialogNestedSetError> {
        self.reader.count_descendants(id).await
    }

    /// See [TreeReader::verify]
    pub async fn verify(&self) -> Result<Vec<Violation>, DialogNestedSetError> {
        self.reader.verify().await
    }
}
