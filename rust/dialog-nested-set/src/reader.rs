use dialog_table::{
    Column, DialogTableError, Direction, NodeId, Order, Predicate, TableBackend,
    TableTransaction,
};

use crate::{
    DialogNestedSetError, Node, Violation, integrity,
    work::{begin_read, conclude},
};

/// Canonical preorder: ascending `lft`
pub(crate) const PREORDER: [Order; 1] = [Order {
    column: Column::Lft,
    direction: Direction::Ascending,
}];

/// Look up a single node inside `transaction`
pub(crate) async fn find<Transaction>(
    transaction: &Transaction,
    id: NodeId,
) -> Result<Option<Node>, DialogTableError>
where
    Transaction: TableTransaction,
{
    Ok(transaction
        .select_one(&Column::Id.equals(id))
        .await?
        .map(Node::from))
}

/// Every node matching `predicate`, in preorder
pub(crate) async fn select<Transaction>(
    transaction: &Transaction,
    predicate: &Predicate,
) -> Result<Vec<Node>, DialogTableError>
where
    Transaction: TableTransaction,
{
    Ok(transaction
        .select_many(predicate, &PREORDER)
        .await?
        .into_iter()
        .map(Node::from)
        .collect())
}

/// Nodes whose interval lies within `node`'s
pub(crate) fn within(node: &Node, include_self: bool) -> Predicate {
    if include_self {
        Column::Lft.ge(node.lft).and(Column::Rgt.le(node.rgt))
    } else {
        Column::Lft.gt(node.lft).and(Column::Rgt.lt(node.rgt))
    }
}

/// Nodes whose interval encloses `node`'s
pub(crate) fn enclosing(node: &Node, include_self: bool) -> Predicate {
    if include_self {
        Column::Lft.le(node.lft).and(Column::Rgt.ge(node.rgt))
    } else {
        Column::Lft.lt(node.lft).and(Column::Rgt.gt(node.rgt))
    }
}

fn sharing_parent(node: &Node) -> Predicate {
    match node.parent_id {
        Some(parent) => Column::ParentId.equals(parent),
        None => Column::ParentId.is_null(),
    }
}

/// Stateless queries that translate tree relationships into interval
/// predicates. Every query runs in its own read-only transaction, so it
/// observes a committed tree.
#[derive(Clone)]
pub struct TreeReader<Backend>
where
    Backend: TableBackend,
{
    backend: Backend,
}

impl<Backend> TreeReader<Backend>
where
    Backend: TableBackend,
{
    /// Read trees held by `backend`
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// All nodes ordered by `lft`: the preorder listing of the whole forest
    pub async fn get_tree(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        let transaction = begin_read(&self.backend).await?;
        let outcome = select(&transaction, &Predicate::All)
            .await
            .map_err(DialogNestedSetError::read);
        conclude(transaction, outcome).await
    }

    /// A single node, or `None` if it does not exist
    pub async fn get_node(&self, id: NodeId) -> Result<Option<Node>, DialogNestedSetError> {
        let transaction = begin_read(&self.backend).await?;
        let outcome = find(&transaction, id)
            .await
            .map_err(DialogNestedSetError::read);
        conclude(transaction, outcome).await
    }

    /// The subtree below `id` in preorder, optionally including `id` itself
    pub async fn get_descendants(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        self.relative(id, |node| within(node, include_self)).await
    }

    /// The ancestors of `id`, root first, optionally ending with `id` itself
    pub async fn get_ancestors(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        self.relative(id, |node| enclosing(node, include_self)).await
    }

    /// Direct children of `id` in sibling order. Relies on `parent_id`; a
    /// missing `id` simply has no children.
    pub async fn get_children(&self, id: NodeId) -> Result<Vec<Node>, DialogNestedSetError> {
        let transaction = begin_read(&self.backend).await?;
        let outcome = select(&transaction, &Column::ParentId.equals(id))
            .await
            .map_err(DialogNestedSetError::read);
        conclude(transaction, outcome).await
    }

    /// Nodes sharing `id`'s parent (all roots, when `id` is a root)
    pub async fn get_siblings(
        &self,
        id: NodeId,
        include_self: bool,
    ) -> Result<Vec<Node>, DialogNestedSetError> {
        let siblings = self.relative(id, sharing_parent).await?;
        Ok(siblings
            .into_iter()
            .filter(|sibling| include_self || sibling.id != id)
            .collect())
    }

    /// Top-level nodes in order
    pub async fn get_roots(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        let transaction = begin_read(&self.backend).await?;
        let outcome = select(&transaction, &Column::ParentId.is_null())
            .await
            .map_err(DialogNestedSetError::read);
        conclude(transaction, outcome).await
    }

    /// Nodes without descendants, in preorder
    pub async fn get_leaves(&self) -> Result<Vec<Node>, DialogNestedSetError> {
        let tree = self.get_tree().await?;
        Ok(tree.into_iter().filter(Node::is_leaf).collect())
    }

    /// Number of proper descendants of `id`, read off its interval
    pub async fn count_descendants(&self, id: NodeId) -> Result<i64, DialogNestedSetError> {
        match self.get_node(id).await? {
            Some(node) => Ok(node.descendant_count()),
            None => Err(DialogNestedSetError::NotFound(id)),
        }
    }

    /// Every invariant violation present in the committed tree
    pub async fn verify(&self) -> Result<Vec<Violation>, DialogNestedSetError> {
        let transaction = begin_read(&self.backend).await?;
        let outcome = integrity::verify(&transaction)
            .await
            .map_err(DialogNestedSetError::read);
        conclude(transaction, outcome).await
    }

    async fn relative<Relation>(
        &self,
        id: NodeId,
        relation: Relation,
    ) -> Result<Vec<Node>, DialogNestedSetError>
    where
        Relation: FnOnce(&Node) -> Predicate,
    {
        let transaction = begin_read(&self.backend).await?;
        let outcome = async {
            let node = find(&transaction, id)
                .await
                .map_err(DialogNestedSetError::read)?
                .ok_or(DialogNestedSetError::NotFound(id))?;
            select(&transaction, &relation(&node))
                .await
                .map_err(DialogNestedSetError::read)
        }
        .await;
        conclude(transaction, outcome).await
    }
}
