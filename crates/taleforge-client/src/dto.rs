//! Wire types of the story generation API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use taleforge_core::error::StoryError;
use taleforge_core::ids;
use taleforge_core::story::{Story, StoryNode, StoryOption};

/// Body of `POST /stories/create`.
#[derive(Debug, Serialize)]
pub struct CreateStoryRequest<'a> {
    /// The chosen theme.
    pub theme: &'a str,
}

/// Error body returned by the service.
///
/// `detail` is a plain string for domain errors and a list of validation
/// entries for malformed requests.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    /// Error detail.
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Flattens `detail` into one human-readable line.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            serde_json::Value::Array(entries) => {
                let messages: Vec<&str> = entries
                    .iter()
                    .filter_map(|entry| entry.get("msg").and_then(serde_json::Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        }
    }
}

/// One option as sent by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionResponse {
    /// Option text.
    pub text: String,
    /// Target node id.
    #[serde(deserialize_with = "ids::deserialize_id")]
    pub node_id: String,
}

/// One node as sent by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeResponse {
    /// Node id.
    #[serde(deserialize_with = "ids::deserialize_id")]
    pub id: String,
    /// Narrative text.
    pub content: String,
    /// Whether the node ends the story.
    #[serde(default)]
    pub is_ending: bool,
    /// Whether the ending is a winning one.
    #[serde(default, alias = "is_winning_end")]
    pub is_winning_ending: bool,
    /// Outgoing options; `null` is treated as none.
    #[serde(default)]
    pub options: Option<Vec<OptionResponse>>,
}

impl From<NodeResponse> for StoryNode {
    fn from(node: NodeResponse) -> Self {
        Self {
            id: node.id,
            content: node.content,
            is_ending: node.is_ending,
            is_winning_ending: node.is_winning_ending,
            options: node
                .options
                .unwrap_or_default()
                .into_iter()
                .map(|option| StoryOption {
                    label: option.text,
                    target_node_id: option.node_id,
                })
                .collect(),
        }
    }
}

/// Body of `GET /stories/{story_id}/complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteStoryResponse {
    /// Story title.
    pub title: String,
    /// The root node.
    pub root_node: NodeResponse,
    /// Every node, keyed by id.
    #[serde(default)]
    pub all_nodes: HashMap<String, NodeResponse>,
}

impl CompleteStoryResponse {
    /// Converts the response into a validated `Story`.
    ///
    /// `root_node` is authoritative; the copy of it filed under its own id
    /// in `all_nodes` is skipped. Every other entry must be filed under its
    /// own id.
    ///
    /// # Errors
    ///
    /// Returns `StoryError` if the graph is malformed, two nodes share an id,
    /// or a node is filed under a foreign key.
    pub fn into_story(self) -> Result<Story, StoryError> {
        let root_node_id = self.root_node.id.clone();
        let mut nodes = Vec::with_capacity(self.all_nodes.len() + 1);
        let mut mismatched = None;
        nodes.push(StoryNode::from(self.root_node));
        for (key, node) in self.all_nodes {
            if key == root_node_id && node.id == root_node_id {
                continue;
            }
            if key != node.id && mismatched.is_none() {
                mismatched = Some(StoryError::MismatchedKey {
                    key,
                    node_id: node.id.clone(),
                });
            }
            nodes.push(StoryNode::from(node));
        }

        let story = Story::new(self.title, root_node_id, nodes)?;
        match mismatched {
            Some(error) => Err(error),
            None => Ok(story),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_story_with_integer_ids_converts() {
        // Arrange
        let body = json!({
            "id": 3,
            "title": "The Clockwork Heist",
            "session_id": "abc",
            "root_node": {
                "id": 10, "content": "The vault hums.", "is_ending": false,
                "is_winning_ending": false,
                "options": [{"text": "Pick the lock", "node_id": 11}]
            },
            "all_nodes": {
                "10": {
                    "id": 10, "content": "The vault hums.", "is_ending": false,
                    "is_winning_ending": false,
                    "options": [{"text": "Pick the lock", "node_id": 11}]
                },
                "11": {
                    "id": 11, "content": "Gold everywhere.", "is_ending": true,
                    "is_winning_end": true, "options": null
                }
            }
        });

        // Act
        let response: CompleteStoryResponse = serde_json::from_value(body).unwrap();
        let story = response.into_story().unwrap();

        // Assert
        assert_eq!(story.title, "The Clockwork Heist");
        assert_eq!(story.root_node_id, "10");
        assert_eq!(story.node_count(), 2);
        assert_eq!(story.root().unwrap().options[0].target_node_id, "11");
        assert!(story.node("11").unwrap().is_winning());
    }

    #[test]
    fn test_root_missing_from_all_nodes_is_still_included() {
        let body = json!({
            "title": "Lonely",
            "root_node": {"id": "r", "content": "Alone.", "is_ending": true}
        });

        let story = serde_json::from_value::<CompleteStoryResponse>(body)
            .unwrap()
            .into_story()
            .unwrap();

        assert_eq!(story.node_count(), 1);
        assert!(story.root().unwrap().is_ending);
    }

    #[test]
    fn test_dangling_option_is_rejected() {
        let body = json!({
            "title": "Broken",
            "root_node": {
                "id": 1, "content": "Start.",
                "options": [{"text": "Onward", "node_id": 99}]
            }
        });

        let result = serde_json::from_value::<CompleteStoryResponse>(body)
            .unwrap()
            .into_story();

        assert!(matches!(result, Err(StoryError::DanglingOption { .. })));
    }

    #[test]
    fn test_two_entries_with_the_same_id_are_rejected() {
        let body = json!({
            "title": "Twins",
            "root_node": {"id": 1, "content": "Start.", "is_ending": true},
            "all_nodes": {
                "1": {"id": 1, "content": "Start.", "is_ending": true},
                "2": {"id": 2, "content": "Left.", "is_ending": true},
                "3": {"id": 2, "content": "Right.", "is_ending": true}
            }
        });

        let result = serde_json::from_value::<CompleteStoryResponse>(body)
            .unwrap()
            .into_story();

        assert_eq!(result, Err(StoryError::DuplicateNode("2".into())));
    }

    #[test]
    fn test_node_filed_under_foreign_key_is_rejected() {
        let body = json!({
            "title": "Misfiled",
            "root_node": {"id": 1, "content": "Start.", "is_ending": true},
            "all_nodes": {
                "9": {"id": 2, "content": "Lost.", "is_ending": true}
            }
        });

        let result = serde_json::from_value::<CompleteStoryResponse>(body)
            .unwrap()
            .into_story();

        assert_eq!(
            result,
            Err(StoryError::MismatchedKey {
                key: "9".into(),
                node_id: "2".into(),
            })
        );
    }

    #[test]
    fn test_error_body_messages() {
        let plain: ErrorBody = serde_json::from_value(json!({"detail": "Job not found"})).unwrap();
        let validation: ErrorBody = serde_json::from_value(json!({
            "detail": [{"loc": ["body", "theme"], "msg": "field required", "type": "missing"}]
        }))
        .unwrap();
        let empty: ErrorBody = serde_json::from_value(json!({})).unwrap();

        assert_eq!(plain.message().as_deref(), Some("Job not found"));
        assert_eq!(validation.message().as_deref(), Some("field required"));
        assert_eq!(empty.message(), None);
    }
}
