use std::collections::VecDeque;

use arbor_storage::{Encoder, StorageBackend};

use crate::{Node, NodeId, Tree, TreeError};

/// The order in which [`Tree::traverse`] visits nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalOrder {
    /// Level by level, each level left to right
    #[default]
    Breadth,
    /// Pre-order: a node, then each of its subtrees left to right
    Depth,
}

/// What [`Tree::traverse`] does with the value returned by its [`Visitor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TraversalMode {
    /// Visit every reachable node; the visitor's result is ignored
    #[default]
    Walk,
    /// Stop at the first node the visitor reports as found
    Search,
    /// Stop at the first leaf the visitor reports as found. A non-leaf that
    /// the visitor reports as found is not expanded any further.
    LeafSearch,
}

/// Parameters of a [`Tree::traverse`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraversalOptions {
    /// The node to start from; the root if `None`
    pub start: Option<NodeId>,
    /// The order to visit nodes in
    pub order: TraversalOrder,
    /// Whether, and how, the traversal stops early
    pub mode: TraversalMode,
}

impl TraversalOptions {
    /// Options for a traversal from the root
    pub fn new(order: TraversalOrder, mode: TraversalMode) -> Self {
        Self {
            start: None,
            order,
            mode,
        }
    }

    /// Start the traversal at `start` instead of the root
    pub fn starting_at(mut self, start: NodeId) -> Self {
        self.start = Some(start);
        self
    }
}

/// Receives each node visited by [`Tree::traverse`] and reports whether it is
/// the node being searched for.
///
/// Any `FnMut(&Node) -> bool` closure is a [`Visitor`]. Use [`try_visitor`]
/// for closures that can fail.
pub trait Visitor {
    /// Inspect a node. Returning an error aborts the traversal.
    fn visit(&mut self, node: &Node) -> Result<bool, TreeError>;
}

impl<F> Visitor for F
where
    F: FnMut(&Node) -> bool,
{
    fn visit(&mut self, node: &Node) -> Result<bool, TreeError> {
        Ok(self(node))
    }
}

/// A [`Visitor`] made from a fallible closure; see [`try_visitor`]
pub struct TryVisitor<F>(F);

impl<F> Visitor for TryVisitor<F>
where
    F: FnMut(&Node) -> Result<bool, TreeError>,
{
    fn visit(&mut self, node: &Node) -> Result<bool, TreeError> {
        (self.0)(node)
    }
}

/// Adapt a fallible closure into a [`Visitor`]. The first error it returns
/// ends the traversal and is returned to the caller.
pub fn try_visitor<F>(visit: F) -> TryVisitor<F>
where
    F: FnMut(&Node) -> Result<bool, TreeError>,
{
    TryVisitor(visit)
}

impl<Backend, Codec> Tree<Backend, Codec>
where
    Backend: StorageBackend<Key = String, Value = Vec<u8>> + Send + Sync + 'static,
    Codec: Encoder + 'static,
{
    /// Visit nodes of the tree in the given order, starting from
    /// [`TraversalOptions::start`].
    ///
    /// Resolves with the matching node in the search modes, and with `None`
    /// for a walk or a search that matched nothing. A failed read aborts the
    /// traversal; whatever the visitor did up to that point is not undone.
    pub async fn traverse<V>(
        &self,
        options: TraversalOptions,
        mut visitor: V,
    ) -> Result<Option<Node>, TreeError>
    where
        V: Visitor + Send,
    {
        let _permit = self.enter().await?;
        self.walk(options, &mut visitor).await
    }

    /// Visit every node level by level
    pub async fn breadth_walk<F>(&self, start: Option<NodeId>, visit: F) -> Result<(), TreeError>
    where
        F: FnMut(&Node) + Send,
    {
        self.walk_with(TraversalOrder::Breadth, start, visit).await
    }

    /// Visit every node in pre-order
    pub async fn depth_walk<F>(&self, start: Option<NodeId>, visit: F) -> Result<(), TreeError>
    where
        F: FnMut(&Node) + Send,
    {
        self.walk_with(TraversalOrder::Depth, start, visit).await
    }

    /// The first node, level by level, that `found` matches
    pub async fn breadth_search<F>(
        &self,
        start: Option<NodeId>,
        found: F,
    ) -> Result<Option<Node>, TreeError>
    where
        F: FnMut(&Node) -> bool + Send,
    {
        self.traverse(
            TraversalOptions {
                start,
                order: TraversalOrder::Breadth,
                mode: TraversalMode::Search,
            },
            found,
        )
        .await
    }

    /// The first node, in pre-order, that `found` matches
    pub async fn depth_search<F>(
        &self,
        start: Option<NodeId>,
        found: F,
    ) -> Result<Option<Node>, TreeError>
    where
        F: FnMut(&Node) -> bool + Send,
    {
        self.traverse(
            TraversalOptions {
                start,
                order: TraversalOrder::Depth,
                mode: TraversalMode::Search,
            },
            found,
        )
        .await
    }

    /// The first leaf, level by level, that `found` matches
    pub async fn breadth_leaf_search<F>(
        &self,
        start: Option<NodeId>,
        found: F,
    ) -> Result<Option<Node>, TreeError>
    where
        F: FnMut(&Node) -> bool + Send,
    {
        self.traverse(
            TraversalOptions {
                start,
                order: TraversalOrder::Breadth,
                mode: TraversalMode::LeafSearch,
            },
            found,
        )
        .await
    }

    /// The first leaf, in pre-order, that `found` matches
    pub async fn depth_leaf_search<F>(
        &self,
        start: Option<NodeId>,
        found: F,
    ) -> Result<Option<Node>, TreeError>
    where
        F: FnMut(&Node) -> bool + Send,
    {
        self.traverse(
            TraversalOptions {
                start,
                order: TraversalOrder::Depth,
                mode: TraversalMode::LeafSearch,
            },
            found,
        )
        .await
    }

    /// The identifiers of `start` and all of its descendants, level by level
    pub(crate) async fn collect_subtree(&self, start: &NodeId) -> Result<Vec<NodeId>, TreeError> {
        let mut collected = Vec::new();
        self.walk(
            TraversalOptions::default().starting_at(start.clone()),
            &mut |node: &Node| {
                collected.push(node.id.clone());
                false
            },
        )
        .await?;
        Ok(collected)
    }

    async fn walk_with<F>(
        &self,
        order: TraversalOrder,
        start: Option<NodeId>,
        mut visit: F,
    ) -> Result<(), TreeError>
    where
        F: FnMut(&Node) + Send,
    {
        self.traverse(
            TraversalOptions {
                start,
                order,
                mode: TraversalMode::Walk,
            },
            move |node: &Node| {
                visit(node);
                false
            },
        )
        .await?;
        Ok(())
    }

    /// The traversal itself, without passing the readiness gate, so that it
    /// can be reused by operations that have already passed it
    async fn walk<V>(
        &self,
        options: TraversalOptions,
        visitor: &mut V,
    ) -> Result<Option<Node>, TreeError>
    where
        V: Visitor + Send,
    {
        let start = options.start.unwrap_or_else(|| self.root_id().clone());

        // Each entry remembers the node that listed it, to report dangling
        // children
        let mut frontier: VecDeque<(NodeId, Option<NodeId>)> = VecDeque::from([(start, None)]);

        loop {
            let next = match options.order {
                TraversalOrder::Breadth => frontier.pop_front(),
                TraversalOrder::Depth => frontier.pop_back(),
            };
            let Some((id, listed_by)) = next else {
                break;
            };

            let node = self.visit_node(id, listed_by).await?;
            tracing::trace!("Visiting {} ({} children)", node.id, node.children.len());

            let found = visitor.visit(&node)?;

            match options.mode {
                TraversalMode::Walk => (),
                TraversalMode::Search if found => return Ok(Some(node)),
                TraversalMode::LeafSearch if found => {
                    if node.is_leaf() {
                        return Ok(Some(node));
                    }
                    continue;
                }
                TraversalMode::Search | TraversalMode::LeafSearch => (),
            }

            let Node { id, children, .. } = node;
            let listed = children
                .into_iter()
                .map(|child| (child, Some(id.clone())));

            match options.order {
                TraversalOrder::Breadth => frontier.extend(listed),
                // Reversed so that popping from the back yields the children
                // left to right
                TraversalOrder::Depth => frontier.extend(listed.rev()),
            }
        }

        Ok(None)
    }

    async fn visit_node(&self, id: NodeId, listed_by: Option<NodeId>) -> Result<Node, TreeError> {
        let Some(children) = self.read_children(&id).await? else {
            return Err(match listed_by {
                Some(parent) => {
                    tracing::warn!("{parent} lists {id} as a child, but it has no entry");
                    TreeError::DanglingChild { parent, child: id }
                }
                None => TreeError::NodeNotFound(id),
            });
        };
        let data = self.read_data(&id).await?;

        Ok(Node { id, children, data })
    }
}
