//! Story fixtures.

use taleforge_core::story::{Story, StoryNode, StoryOption};

fn option(label: &str, target: &str) -> StoryOption {
    StoryOption {
        label: label.to_owned(),
        target_node_id: target.to_owned(),
    }
}

fn passage(id: &str, content: &str, options: Vec<StoryOption>) -> StoryNode {
    StoryNode {
        id: id.to_owned(),
        content: content.to_owned(),
        is_ending: false,
        is_winning_ending: false,
        options,
    }
}

fn ending(id: &str, content: &str, winning: bool) -> StoryNode {
    StoryNode {
        id: id.to_owned(),
        content: content.to_owned(),
        is_ending: true,
        is_winning_ending: winning,
        options: Vec::new(),
    }
}

/// Three-node story with a cycle: `root -> {a, b}`, `a -> root`, and `b` a
/// winning ending.
///
/// # Panics
///
/// Never in practice; the fixture is well-formed.
#[must_use]
pub fn sample_story() -> Story {
    Story::new(
        "The Looping Forest",
        "root",
        vec![
            passage(
                "root",
                "Two paths fork beneath the old oak.",
                vec![option("Take the mossy path", "a"), option("Follow the river", "b")],
            ),
            passage(
                "a",
                "The mossy path bends back on itself.",
                vec![option("Return to the oak", "root")],
            ),
            ending("b", "The river carries you home.", true),
        ],
    )
    .expect("sample story is well-formed")
}

/// Six-node story: `root -> {c, f}`, `c -> d`, `d -> {e, root}`, `e` a winning
/// ending, `f` a losing ending, plus an unreachable `orphan`.
///
/// # Panics
///
/// Never in practice; the fixture is well-formed.
#[must_use]
pub fn branching_story() -> Story {
    Story::new(
        "The Sunken Keep",
        "root",
        vec![
            passage(
                "root",
                "The keep's gate hangs open.",
                vec![option("Enter the courtyard", "c"), option("Climb the wall", "f")],
            ),
            passage(
                "c",
                "The courtyard is flooded to the knee.",
                vec![option("Wade to the tower", "d")],
            ),
            passage(
                "d",
                "A stair spirals down into dark water.",
                vec![option("Dive", "e"), option("Retreat to the gate", "root")],
            ),
            ending("e", "You surface in the treasure vault.", true),
            ending("f", "The wall crumbles beneath you.", false),
            ending("orphan", "Nobody ever reads this.", false),
        ],
    )
    .expect("branching story is well-formed")
}
