//! Query handlers for the Story Navigation context.
//!
//! These build read-only, serializable views of the navigator so a
//! presentation layer can render without reaching into navigator internals.

use serde::Serialize;

use crate::domain::error::NavigationError;
use crate::domain::navigator::StoryNavigator;

/// Read-only view of one option on the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// 1-based position, as shown to the player.
    pub number: usize,
    /// Text shown to the player.
    pub label: String,
    /// Node the option leads to.
    pub target_node_id: String,
    /// Whether the target was already reached this session.
    pub visited: bool,
}

/// Read-only view of the current node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    /// The node identifier.
    pub id: String,
    /// Narrative text.
    pub content: String,
    /// Whether the node ends the story.
    pub is_ending: bool,
    /// Whether the node is a winning ending.
    pub is_winning_ending: bool,
    /// Selectable options. Always empty on endings.
    pub options: Vec<OptionView>,
}

/// Read-only view of the navigator as a whole.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationView {
    /// Title of the loaded story.
    pub story_title: String,
    /// The node the player is on.
    pub current_node: NodeView,
    /// Distinct nodes reached this session.
    pub discovered_count: usize,
    /// Nodes in the story.
    pub total_count: usize,
    /// `discovered_count / total_count`.
    pub progress_fraction: f64,
    /// Whether going back would move.
    pub can_go_back: bool,
    /// Length of the path taken.
    pub history_len: usize,
    /// Whether a visual transition holds the lock.
    pub is_transitioning: bool,
}

/// Builds the view of the current node.
///
/// # Errors
///
/// Returns `NavigationError` if no story is loaded or the current node is
/// missing from it.
pub fn current_node_view(navigator: &StoryNavigator) -> Result<NodeView, NavigationError> {
    let node = navigator.current_node()?;
    Ok(NodeView {
        id: node.id.clone(),
        content: node.content.clone(),
        is_ending: node.is_ending,
        is_winning_ending: node.is_winning(),
        options: node
            .available_options()
            .iter()
            .enumerate()
            .map(|(index, option)| OptionView {
                number: index + 1,
                label: option.label.clone(),
                target_node_id: option.target_node_id.clone(),
                visited: navigator.is_visited(&option.target_node_id),
            })
            .collect(),
    })
}

/// Builds the full navigation view.
///
/// # Errors
///
/// Returns `NavigationError` under the same conditions as
/// [`current_node_view`].
pub fn navigation_view(navigator: &StoryNavigator) -> Result<NavigationView, NavigationError> {
    let current_node = current_node_view(navigator)?;
    let story_title = navigator
        .story()
        .map(|story| story.title.clone())
        .ok_or(NavigationError::NotInitialized)?;

    Ok(NavigationView {
        story_title,
        current_node,
        discovered_count: navigator.discovered_count(),
        total_count: navigator.total_count(),
        progress_fraction: navigator.progress_fraction(),
        can_go_back: navigator.can_go_back(),
        history_len: navigator.history_len(),
        is_transitioning: navigator.is_transitioning(),
    })
}
