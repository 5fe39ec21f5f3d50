//! The generated story graph.
//!
//! Nodes are held in an id-keyed arena and options refer to their targets by
//! id, so cycles in the narrative never turn into cyclic ownership.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::StoryError;

/// One selectable choice on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOption {
    /// Text shown to the player.
    pub label: String,
    /// Node the choice leads to.
    pub target_node_id: String,
}

/// One narrative unit of a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    /// Unique node id within the story.
    pub id: String,
    /// Narrative text.
    pub content: String,
    /// Whether the node ends the story.
    pub is_ending: bool,
    /// Whether the ending is a winning one. Meaningless unless `is_ending`.
    pub is_winning_ending: bool,
    /// Outgoing choices, in display order.
    pub options: Vec<StoryOption>,
}

impl StoryNode {
    /// Options the player may actually pick. Endings expose none, whatever
    /// the service sent.
    #[must_use]
    pub fn available_options(&self) -> &[StoryOption] {
        if self.is_ending { &[] } else { &self.options }
    }

    /// Returns `true` if one of the available options targets `node_id`.
    #[must_use]
    pub fn leads_to(&self, node_id: &str) -> bool {
        self.available_options()
            .iter()
            .any(|option| option.target_node_id == node_id)
    }

    /// Returns `true` for an ending flagged as winning.
    #[must_use]
    pub fn is_winning(&self) -> bool {
        self.is_ending && self.is_winning_ending
    }
}

/// A complete branching story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Story title.
    pub title: String,
    /// Id of the node the story starts at.
    pub root_node_id: String,
    /// Every node in the story, keyed by id.
    pub nodes_by_id: HashMap<String, StoryNode>,
}

impl Story {
    /// Builds a story from its nodes and checks the graph invariants.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::DuplicateNode` if two nodes share an id, and any
    /// error from [`Story::validate`].
    pub fn new(
        title: impl Into<String>,
        root_node_id: impl Into<String>,
        nodes: impl IntoIterator<Item = StoryNode>,
    ) -> Result<Self, StoryError> {
        let mut nodes_by_id = HashMap::new();
        for node in nodes {
            if let Some(previous) = nodes_by_id.insert(node.id.clone(), node) {
                return Err(StoryError::DuplicateNode(previous.id));
            }
        }

        let story = Self {
            title: title.into(),
            root_node_id: root_node_id.into(),
            nodes_by_id,
        };
        story.validate()?;
        Ok(story)
    }

    /// Checks that the root exists and every option target resolves.
    ///
    /// # Errors
    ///
    /// Returns `StoryError::MissingRoot` or `StoryError::DanglingOption`.
    pub fn validate(&self) -> Result<(), StoryError> {
        if !self.nodes_by_id.contains_key(&self.root_node_id) {
            return Err(StoryError::MissingRoot(self.root_node_id.clone()));
        }

        for node in self.nodes_by_id.values() {
            if let Some(option) = node
                .available_options()
                .iter()
                .find(|option| !self.nodes_by_id.contains_key(&option.target_node_id))
            {
                return Err(StoryError::DanglingOption {
                    node_id: node.id.clone(),
                    target_node_id: option.target_node_id.clone(),
                });
            }
        }

        Ok(())
    }

    /// Looks up a node by id.
    #[must_use]
    pub fn node(&self, node_id: &str) -> Option<&StoryNode> {
        self.nodes_by_id.get(node_id)
    }

    /// The root node, if present.
    #[must_use]
    pub fn root(&self) -> Option<&StoryNode> {
        self.node(&self.root_node_id)
    }

    /// Number of nodes in the story.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes_by_id.len()
    }

    /// Ids of every node reachable from the root. Safe on cyclic graphs.
    #[must_use]
    pub fn reachable_node_ids(&self) -> HashSet<&str> {
        let mut reached = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(root) = self.root() {
            reached.insert(root.id.as_str());
            queue.push_back(root);
        }

        while let Some(node) = queue.pop_front() {
            for option in node.available_options() {
                if let Some(next) = self.node(&option.target_node_id) {
                    if reached.insert(next.id.as_str()) {
                        queue.push_back(next);
                    }
                }
            }
        }

        reached
    }

    /// Number of endings flagged as winning.
    #[must_use]
    pub fn winning_ending_count(&self) -> usize {
        self.nodes_by_id
            .values()
            .filter(|node| node.is_winning())
            .count()
    }
}
