//! Implements an online, anytime [Monte Carlo Tree Search] (MCTS) planner with
//! the UCT (Upper Confidence bounds applied to Trees) selection rule.
//!
//! Every planning call builds a fresh tree rooted at the current state and
//! discards it at the end: nothing is reused between control steps.
//!
//! [Monte Carlo Tree Search]: https://en.wikipedia.org/wiki/Monte_Carlo_tree_search

use std::time::{Duration, Instant};

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

use crate::environment::Model;

mod config;
mod tree;

pub use config::{Config, ConfigError, ValueEstimate};
pub use tree::{uct_score, Node, NodeId, Tree};

/// Search tree specialized for the states and actions of a model.
pub type SearchTree<M> = Tree<<M as Model>::State, <M as Model>::Action>;

/// Stops the search once the iteration budget or the optional wall-clock
/// limit is exhausted, whichever comes first.
struct Limiter {
    timer: Instant,
    budget: u32,
    time: Option<Duration>,
}

impl Limiter {
    fn new(config: &Config) -> Self {
        Self {
            timer: Instant::now(),
            budget: config.budget,
            time: config.time_limit(),
        }
    }

    /// The time limit only applies once at least one iteration ran.
    fn exhausted(&self, iterations: u32) -> bool {
        if iterations >= self.budget {
            return true;
        }
        iterations > 0 && self.time.is_some_and(|limit| self.timer.elapsed() >= limit)
    }
}

/// UCT planner over a [`Model`].
///
/// 1. Selection: descend from the root through fully expanded nodes, picking
///    the child with the highest UCT score.
/// 2. Expansion: attach one child for a randomly drawn untried action.
/// 3. Simulation: estimate the value of the new node with a random rollout.
/// 4. Backup: update the statistics on the path from the new node to the
///    root.
///
/// The random source is supplied by the caller, which is responsible for
/// seeding it.
pub struct Planner<M: Model, R: Rng> {
    model: M,
    config: Config,
    rng: R,
}

impl<M: Model, R: Rng> Planner<M, R> {
    /// Creates a planner. The config is expected to be validated.
    #[must_use]
    pub const fn new(model: M, config: Config, rng: R) -> Self {
        Self { model, config, rng }
    }

    /// Model the planner searches over.
    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Search parameters.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Runs one planning call and returns the best action at `state`.
    ///
    /// Returns `None` if the root never gained a child, which happens when
    /// `state` is terminal or the model offers no actions.
    pub fn plan(&mut self, state: &M::State) -> Option<M::Action> {
        let tree = self.search(state);
        if tree.get(tree.root()).children().is_empty() {
            debug!(nodes = tree.len(), "root was never expanded");
            return None;
        }
        let action = self.best_action(&tree);
        debug!(
            nodes = tree.len(),
            max_depth = tree.max_depth(),
            root_visits = tree.get(tree.root()).visits(),
            action = ?action,
            "planning complete"
        );
        Some(action)
    }

    /// Builds the search tree for `state` by running the tree policy, the
    /// rollout and the backup until the budget is exhausted.
    pub fn search(&mut self, state: &M::State) -> SearchTree<M> {
        let mut tree = Tree::new(state.clone(), self.model.actions());
        let limiter = Limiter::new(&self.config);
        let mut iterations = 0;
        while !limiter.exhausted(iterations) {
            let leaf = self.tree_policy(&mut tree);
            let value = self.rollout(tree.get(leaf).state());
            let _ = tree.backup(leaf, value, self.config.discount);
            trace!(
                leaf = %leaf,
                depth = tree.get(leaf).depth(),
                value,
                "iteration complete"
            );
            iterations += 1;
        }
        debug!(iterations, "search finished");
        tree
    }

    /// Descends from the root to the node that should be evaluated next.
    ///
    /// Stops at terminal nodes, at the depth limit and at freshly expanded
    /// children.
    pub fn tree_policy(&mut self, tree: &mut SearchTree<M>) -> NodeId {
        let mut current = tree.root();
        loop {
            let node = tree.get(current);
            if self.model.is_terminal(node.state()) || node.depth() >= self.config.max_depth {
                return current;
            }
            if !node.is_fully_expanded() {
                return self.expand(tree, current);
            }
            match self.select_child(tree, current) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// Expands `id` with an action drawn uniformly from its untried pool.
    ///
    /// # Panics
    ///
    /// Panics if the node is already fully expanded.
    pub fn expand(&mut self, tree: &mut SearchTree<M>, id: NodeId) -> NodeId {
        let node = tree.get(id);
        assert!(!node.is_fully_expanded(), "expanding a fully expanded node");
        let index = self.rng.gen_range(0..node.untried().len());
        let next = self.model.transition(
            node.state(),
            &node.untried()[index],
            self.config.step(),
        );
        tree.add_child(id, index, next, self.model.actions())
    }

    /// Picks the child of `id` with the highest UCT score, breaking ties
    /// uniformly at random. Returns `None` for a childless node.
    pub fn select_child(&mut self, tree: &SearchTree<M>, id: NodeId) -> Option<NodeId> {
        let parent_visits = tree.get(id).visits();
        let candidates = tree
            .get(id)
            .children()
            .iter()
            .map(|&child| {
                let node = tree.get(child);
                let score = uct_score(
                    self.value(node),
                    node.visits(),
                    parent_visits,
                    self.config.exploration,
                );
                (child, score)
            })
            .max_set_by(|(_, a), (_, b)| a.total_cmp(b));
        candidates.choose(&mut self.rng).map(|&(child, _)| child)
    }

    /// Default policy: simulates up to `horizon` uniformly random actions from
    /// `state` and returns the discounted sum of the rewards.
    ///
    /// The transition into a terminal state ends the rollout and contributes
    /// no reward.
    pub fn rollout(&mut self, state: &M::State) -> f64 {
        let mut state = state.clone();
        let mut value = 0.0;
        let mut weight: f64 = 1.0;
        for _ in 0..self.config.horizon {
            let Some(action) = self.model.actions().choose(&mut self.rng) else {
                break;
            };
            let next = self.model.transition(&state, action, self.config.step());
            if self.model.is_terminal(&next) {
                break;
            }
            value = weight.mul_add(self.model.reward(&state, action, &next), value);
            weight *= self.config.discount;
            state = next;
        }
        value
    }

    /// Returns the action leading to the root child with the highest value,
    /// breaking ties uniformly at random.
    ///
    /// # Panics
    ///
    /// Panics if the root has no children.
    pub fn best_action(&mut self, tree: &SearchTree<M>) -> M::Action {
        let root = tree.get(tree.root());
        assert!(
            !root.children().is_empty(),
            "best action requested from a childless root"
        );
        let candidates = root
            .children()
            .iter()
            .map(|&child| tree.get(child))
            .max_set_by(|a, b| self.value(a).total_cmp(&self.value(b)));
        let best = candidates
            .choose(&mut self.rng)
            .and_then(|node| node.action())
            .expect("children always carry their incoming action");
        *best
    }

    /// Value statistic of a node as configured.
    fn value(&self, node: &Node<M::State, M::Action>) -> f64 {
        match self.config.value_estimate {
            ValueEstimate::Sum => node.reward(),
            ValueEstimate::Mean => node.mean_reward(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::environment::TimeStep;

    /// Altitude counter: actions climb, hold or sink by one unit, the reward
    /// is the new altitude and everything below zero is terminal.
    struct Counter {
        actions: [i64; 3],
    }

    impl Counter {
        const fn new() -> Self {
            Self { actions: [1, 0, -1] }
        }
    }

    impl Model for Counter {
        type Action = i64;
        type State = i64;

        fn actions(&self) -> &[i64] {
            &self.actions
        }

        fn transition(&self, state: &i64, action: &i64, _step: TimeStep) -> i64 {
            state + action
        }

        #[allow(clippy::cast_precision_loss)]
        fn reward(&self, _state: &i64, _action: &i64, next: &i64) -> f64 {
            *next as f64
        }

        fn is_terminal(&self, state: &i64) -> bool {
            *state < 0
        }

        #[allow(clippy::cast_precision_loss)]
        fn distance(&self, state: &i64) -> f64 {
            state.abs() as f64
        }
    }

    fn planner(config: Config, seed: u64) -> Planner<Counter, ChaCha8Rng> {
        Planner::new(Counter::new(), config, ChaCha8Rng::seed_from_u64(seed))
    }

    #[test]
    fn expansion_consumes_untried_actions() {
        let mut planner = planner(Config::default(), 1);
        let mut tree = Tree::new(5, planner.model().actions());
        let root = tree.root();
        for expected in 1..=3 {
            let child = planner.expand(&mut tree, root);
            assert_eq!(tree.get(root).children().len(), expected);
            assert_eq!(tree.get(root).untried().len(), 3 - expected);
            assert_eq!(tree.get(child).depth(), 1);
            let action = *tree.get(child).action().unwrap();
            assert_eq!(*tree.get(child).state(), 5 + action);
        }
        let mut actions: Vec<i64> = tree
            .get(root)
            .children()
            .iter()
            .map(|&child| *tree.get(child).action().unwrap())
            .collect();
        actions.sort_unstable();
        assert_eq!(actions, vec![-1, 0, 1]);
    }

    #[test]
    #[should_panic(expected = "fully expanded")]
    fn expanding_twice_too_many() {
        let mut planner = planner(Config::default(), 1);
        let mut tree = Tree::new(5, planner.model().actions());
        let root = tree.root();
        for _ in 0..4 {
            let _ = planner.expand(&mut tree, root);
        }
    }

    #[test]
    fn tree_policy_expands_before_selecting() {
        let mut planner = planner(Config::default(), 2);
        let mut tree = Tree::new(5, planner.model().actions());
        for _ in 0..3 {
            let leaf = planner.tree_policy(&mut tree);
            assert_eq!(tree.get(leaf).depth(), 1);
            let _ = tree.backup(leaf, 1.0, 0.9);
        }
        assert!(tree.get(tree.root()).is_fully_expanded());
        let leaf = planner.tree_policy(&mut tree);
        assert_eq!(tree.get(leaf).depth(), 2);
    }

    #[test]
    fn tree_policy_stops_at_terminal() {
        let mut planner = planner(Config::default(), 3);
        let mut tree = Tree::new(-1, planner.model().actions());
        assert_eq!(planner.tree_policy(&mut tree), tree.root());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn tree_policy_respects_depth_limit() {
        let config = Config {
            max_depth: 1,
            budget: 50,
            ..Config::default()
        };
        let mut planner = planner(config, 4);
        let tree = planner.search(&100);
        assert_eq!(tree.max_depth(), 1);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(tree.root()).visits(), 51);
    }

    #[test]
    fn select_prefers_higher_value() {
        let mut planner = planner(Config::default(), 5);
        let mut tree = Tree::new(5, planner.model().actions());
        let root = tree.root();
        let children: Vec<NodeId> = (0..3).map(|_| planner.expand(&mut tree, root)).collect();
        let _ = tree.backup(children[0], 0.0, 1.0);
        let _ = tree.backup(children[1], 100.0, 1.0);
        let _ = tree.backup(children[2], 0.0, 1.0);
        assert_eq!(planner.select_child(&tree, root), Some(children[1]));
        assert_eq!(planner.best_action(&tree), *tree.get(children[1]).action().unwrap());
    }

    #[test]
    fn rollout_accumulates_discounted_rewards() {
        let config = Config {
            horizon: 1,
            ..Config::default()
        };
        let mut planner = planner(config, 6);
        // Starting high enough that no action terminates, the single reward
        // is the next altitude.
        let value = planner.rollout(&10);
        assert!([9.0, 10.0, 11.0].iter().any(|v| (v - value).abs() < 1e-12));
    }

    #[test]
    fn rollout_stops_on_terminal() {
        let mut planner = planner(Config::default(), 7);
        // From altitude zero every sinking step terminates; the return only
        // contains non-negative altitudes.
        for _ in 0..100 {
            assert!(planner.rollout(&0) >= 0.0);
        }
    }

    #[test]
    fn terminal_root_has_no_plan() {
        let mut planner = planner(Config::with_budget(20), 8);
        let tree = planner.search(&-5);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(tree.root()).visits(), 21);
        assert_eq!(planner.plan(&-5), None);
    }

    #[test]
    #[should_panic(expected = "childless root")]
    fn best_action_on_childless_root() {
        let mut planner = planner(Config::default(), 9);
        let tree = Tree::new(-5, planner.model().actions());
        let _ = planner.best_action(&tree);
    }

    #[test]
    fn mean_value_estimate() {
        let config = Config {
            value_estimate: ValueEstimate::Mean,
            ..Config::default()
        };
        let mut planner = planner(config, 10);
        let mut tree = Tree::new(5, planner.model().actions());
        let root = tree.root();
        let first = planner.expand(&mut tree, root);
        let second = planner.expand(&mut tree, root);
        // Many mediocre visits lose against one good visit.
        for _ in 0..10 {
            let _ = tree.backup(first, 1.0, 1.0);
        }
        let _ = tree.backup(second, 2.0, 1.0);
        assert_eq!(planner.best_action(&tree), *tree.get(second).action().unwrap());

        let mut planner = self::planner(Config::default(), 10);
        assert_eq!(planner.best_action(&tree), *tree.get(first).action().unwrap());
    }

    #[test]
    fn climbing_is_preferred() {
        let config = Config {
            budget: 300,
            value_estimate: ValueEstimate::Mean,
            ..Config::default()
        };
        let mut planner = planner(config, 11);
        assert_eq!(planner.plan(&3), Some(1));
    }

    #[test]
    fn time_limit_stops_search() {
        let config = Config {
            budget: u32::MAX,
            time_limit_ms: Some(20),
            ..Config::default()
        };
        let mut planner = planner(config, 12);
        let tree = planner.search(&50);
        assert!(tree.get(tree.root()).visits() > 1);
    }

    #[test]
    fn expired_time_limit_still_plans() {
        // Already elapsed before the search starts.
        let config = Config {
            time_limit_ms: Some(0),
            ..Config::default()
        };
        let mut planner = planner(config, 4);
        let tree = planner.search(&50);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(tree.root()).visits(), 2);
        assert!(planner.plan(&50).is_some());
    }
}
