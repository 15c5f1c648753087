//! Arena storage of the search tree.

use std::fmt;

/// Stable handle of a node inside its [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A (state, path from the root) pair of the search tree.
#[derive(Debug)]
pub struct Node<S, A> {
    state: S,
    parent: Option<NodeId>,
    /// Actions not yet expanded from this node. Never regrows.
    untried: Vec<A>,
    children: Vec<NodeId>,
    /// Action that led from the parent to this node.
    action: Option<A>,
    visits: u32,
    reward: f64,
    depth: u32,
}

impl<S, A> Node<S, A> {
    /// State snapshot reached by this node.
    #[must_use]
    pub const fn state(&self) -> &S {
        &self.state
    }

    /// `None` for the root.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in expansion order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Actions not expanded yet.
    #[must_use]
    pub fn untried(&self) -> &[A] {
        &self.untried
    }

    /// Incoming action, `None` for the root.
    #[must_use]
    pub const fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    /// Number of backups through this node.
    #[must_use]
    pub const fn visits(&self) -> u32 {
        self.visits
    }

    /// Sum of the depth-discounted returns backed up through this node.
    #[must_use]
    pub const fn reward(&self) -> f64 {
        self.reward
    }

    /// Distance from the root.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether at least one backup went through this node.
    #[must_use]
    pub const fn visited(&self) -> bool {
        self.visits > 0
    }

    /// A node is fully expanded once every action has produced a child.
    #[must_use]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    /// Cumulative reward divided by the number of visits.
    ///
    /// # Panics
    ///
    /// Panics if the node was never visited.
    #[must_use]
    pub fn mean_reward(&self) -> f64 {
        assert!(self.visited(), "mean reward of an unvisited node");
        self.reward / f64::from(self.visits)
    }
}

/// Search tree with arena-based node storage.
///
/// Nodes live in a single vector and refer to each other by [`NodeId`], so
/// growing the tree never invalidates the parent links used by backup. The
/// tree is built for one planning call and dropped afterwards.
#[derive(Debug)]
pub struct Tree<S, A> {
    nodes: Vec<Node<S, A>>,
}

impl<S, A: Clone> Tree<S, A> {
    /// Creates a tree with a single root node at depth 0.
    ///
    /// The root starts with one visit so that the exploration term of its
    /// children is defined right after the first expansion.
    #[must_use]
    pub fn new(state: S, actions: &[A]) -> Self {
        Self {
            nodes: vec![Node {
                state,
                parent: None,
                untried: actions.to_vec(),
                children: Vec::with_capacity(actions.len()),
                action: None,
                visits: 1,
                reward: 0.0,
                depth: 0,
            }],
        }
    }

    /// Removes `action_index` from the untried pool of `parent` and attaches
    /// a new unvisited child reached with that action.
    ///
    /// # Panics
    ///
    /// Panics if `action_index` is out of bounds of the untried pool.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        action_index: usize,
        state: S,
        actions: &[A],
    ) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("tree size exceeds u32"));
        let node = &mut self.nodes[parent.index()];
        let action = node.untried.swap_remove(action_index);
        node.children.push(id);
        let depth = node.depth + 1;
        self.nodes.push(Node {
            state,
            parent: Some(parent),
            untried: actions.to_vec(),
            children: Vec::with_capacity(actions.len()),
            action: Some(action),
            visits: 0,
            reward: 0.0,
            depth,
        });
        id
    }
}

impl<S, A> Tree<S, A> {
    /// Root node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Node behind `id`.
    #[must_use]
    pub fn get(&self, id: NodeId) -> &Node<S, A> {
        &self.nodes[id.index()]
    }

    /// Total number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest node.
    #[must_use]
    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Iterates over all nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<S, A>)> {
        (0u32..).map(NodeId).zip(self.nodes.iter())
    }

    /// Propagates the rollout return `value` from `leaf` up to the root.
    ///
    /// Every node on the path gets one more visit and `discount^depth *
    /// value` added to its cumulative reward. Returns the number of updated
    /// nodes, which is always `leaf.depth + 1`.
    pub fn backup(&mut self, leaf: NodeId, value: f64, discount: f64) -> usize {
        let mut current = Some(leaf);
        let mut updated = 0;
        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            node.visits += 1;
            node.reward = discount.powf(f64::from(node.depth)).mul_add(value, node.reward);
            updated += 1;
            current = node.parent;
        }
        updated
    }
}

/// Upper confidence bound of `child` given the visit count of its parent:
///
/// `value + 2 C sqrt(2 ln(N(parent)) / N(child))`
///
/// # Panics
///
/// Panics if the child was never visited.
#[must_use]
pub fn uct_score(value: f64, child_visits: u32, parent_visits: u32, exploration: f64) -> f64 {
    assert!(child_visits > 0, "UCT score of an unvisited child");
    let parent = f64::from(parent_visits);
    let child = f64::from(child_visits);
    2.0f64.mul_add(exploration * (2.0 * parent.ln() / child).sqrt(), value)
}
