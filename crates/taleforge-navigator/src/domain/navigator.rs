//! The story navigator.

use std::collections::HashSet;
use std::sync::Arc;

use taleforge_core::story::{Story, StoryNode};
use tracing::debug;

use super::error::NavigationError;

/// Walks a story graph on behalf of the player.
///
/// The visited set and the history stack are deliberately separate: going
/// back pops the history but never un-visits a node, so progress only grows
/// within a session. The current node is always the top of the history.
#[derive(Debug, Default)]
pub struct StoryNavigator {
    /// The loaded story, shared read-only with the session.
    story: Option<Arc<Story>>,
    /// Every node id reached since the last `initialize`.
    visited: HashSet<String>,
    /// Path taken, oldest first. Never empty once initialized.
    history: Vec<String>,
    /// Set while the presentation layer animates a move.
    transitioning: bool,
}

impl StoryNavigator {
    /// Creates an empty navigator with no story loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a navigator positioned at the story's root.
    #[must_use]
    pub fn with_story(story: Arc<Story>) -> Self {
        let mut navigator = Self::new();
        navigator.initialize(story);
        navigator
    }

    /// Loads `story` and positions the navigator at its root.
    pub fn initialize(&mut self, story: Arc<Story>) {
        let root = story.root_node_id.clone();
        self.visited.clear();
        self.visited.insert(root.clone());
        self.history.clear();
        self.history.push(root);
        self.transitioning = false;
        self.story = Some(story);
    }

    /// Clears all navigation state, including the story reference.
    pub fn reset(&mut self) {
        self.story = None;
        self.visited.clear();
        self.history.clear();
        self.transitioning = false;
    }

    /// Returns `true` once a story is loaded.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.story.is_some()
    }

    /// The loaded story, if any.
    #[must_use]
    pub fn story(&self) -> Option<&Story> {
        self.story.as_deref()
    }

    /// Id of the node the player is on.
    #[must_use]
    pub fn current_node_id(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// The node the player is on.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::NotInitialized` before `initialize`, and
    /// `NavigationError::NodeNotFound` if the current id is absent from the
    /// story.
    pub fn current_node(&self) -> Result<&StoryNode, NavigationError> {
        let story = self.story.as_deref().ok_or(NavigationError::NotInitialized)?;
        let node_id = self.current_node_id().ok_or(NavigationError::NotInitialized)?;
        story
            .node(node_id)
            .ok_or_else(|| NavigationError::NodeNotFound(node_id.to_owned()))
    }

    /// Moves to `target_node_id` if it is one of the current node's options.
    ///
    /// Returns `Ok(true)` when the move was applied. The call is ignored
    /// (`Ok(false)`) while a transition is in progress, for an empty target,
    /// on an ending, or when the target is not among the current options.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError` if the current node or the target node is
    /// missing from the story.
    pub fn select_option(&mut self, target_node_id: &str) -> Result<bool, NavigationError> {
        if self.transitioning || target_node_id.is_empty() {
            debug!(target_node_id, "ignoring option selection");
            return Ok(false);
        }

        let current = self.current_node()?;
        if !current.leads_to(target_node_id) {
            debug!(
                current_node_id = %current.id,
                target_node_id,
                "target is not an option of the current node"
            );
            return Ok(false);
        }

        let story = self.story.as_deref().ok_or(NavigationError::NotInitialized)?;
        if story.node(target_node_id).is_none() {
            return Err(NavigationError::NodeNotFound(target_node_id.to_owned()));
        }

        self.visited.insert(target_node_id.to_owned());
        self.history.push(target_node_id.to_owned());
        Ok(true)
    }

    /// Steps back to the previous node on the path.
    ///
    /// Returns `false` without changing anything when there is nowhere to go
    /// back to or a transition is in progress. The node left behind stays
    /// visited.
    pub fn go_back(&mut self) -> bool {
        if self.transitioning || self.history.len() <= 1 {
            return false;
        }
        self.history.pop();
        true
    }

    /// Takes the transition lock. Returns `false` if it was already held.
    pub fn begin_transition(&mut self) -> bool {
        if self.transitioning {
            return false;
        }
        self.transitioning = true;
        true
    }

    /// Releases the transition lock.
    pub fn end_transition(&mut self) {
        self.transitioning = false;
    }

    /// Whether a visual transition currently holds the lock.
    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    /// Whether `go_back` would move.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.history.len() > 1 && !self.transitioning
    }

    /// The path taken, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Length of the path taken.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Whether `node_id` was reached at any point since `initialize`.
    #[must_use]
    pub fn is_visited(&self, node_id: &str) -> bool {
        self.visited.contains(node_id)
    }

    /// Number of distinct nodes reached.
    #[must_use]
    pub fn discovered_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of nodes in the loaded story.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.story.as_deref().map_or(0, Story::node_count)
    }

    /// Share of the story discovered, in `[0, 1]`. Zero for an empty story.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_fraction(&self) -> f64 {
        let total = self.total_count();
        if total == 0 {
            return 0.0;
        }
        self.discovered_count() as f64 / total as f64
    }
}
