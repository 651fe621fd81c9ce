use crate::graph::model::{HandleKind, HandleSide, Highlight, NodeKind, TARGET_LEFT, TARGET_TOP};
use crate::graph::mutation::GraphEngine;
use crate::highlight::ranges::{Field, HighlightScope};

fn engine() -> GraphEngine {
    GraphEngine::new("## Question: seed\n")
}

#[test]
fn fork_ids_are_parent_scoped_and_sequential() {
    let mut e = engine();
    let a = e.fork_node("root", "q1", true, None, None).unwrap();
    let b = e.fork_node("root", "q2", true, None, None).unwrap();
    assert_eq!(a.node_id, "root-1");
    assert_eq!(b.node_id, "root-2");
    let c = e.fork_node("root-1", "q3", true, None, None).unwrap();
    assert_eq!(c.node_id, "root-1-1");
}

#[test]
fn fork_of_unknown_parent_is_an_error() {
    let mut e = engine();
    assert!(e.fork_node("ghost", "q", true, None, None).is_err());
}

#[test]
fn first_child_is_placed_up_and_right_of_the_parent() {
    let mut e = engine();
    let out = e.fork_node("root", "q1", true, None, None).unwrap();
    let root = e.node("root").unwrap().position;
    let child = e.node(&out.node_id).unwrap().position;
    assert_eq!(child.x, root.x + 320.0);
    assert_eq!(child.y, root.y - 150.0);
}

#[test]
fn later_children_stack_under_the_previous_sibling() {
    let mut e = engine();
    let first = e.fork_node("root", "q1", true, None, None).unwrap();
    e.set_measured(&first.node_id, 300.0, 180.0).unwrap();
    let second = e.fork_node("root", "q2", true, None, None).unwrap();
    let a = e.node(&first.node_id).unwrap().position;
    let b = e.node(&second.node_id).unwrap().position;
    assert_eq!(b.x, a.x + 25.0);
    assert_eq!(b.y, a.y + 180.0 + 10.0);
}

#[test]
fn unmeasured_sibling_stacks_with_gap_only() {
    let mut e = engine();
    let first = e.fork_node("root", "q1", true, None, None).unwrap();
    let second = e.fork_node("root", "q2", true, None, None).unwrap();
    let a = e.node(&first.node_id).unwrap().position;
    let b = e.node(&second.node_id).unwrap().position;
    assert_eq!(b.y, a.y + 10.0);
}

#[test]
fn fork_wires_one_edge_through_a_fresh_handle() {
    let mut e = engine();
    let out = e
        .fork_node("root", "q1", true, Some("the sky"), Some(64.0))
        .unwrap();
    assert_eq!(out.refresh, vec!["root".to_string()]);

    let handles = &e.node("root").unwrap().data.dynamic_handles;
    assert_eq!(handles.len(), 1);
    assert_eq!(handles[0].id, out.handle_id);
    assert_eq!(handles[0].kind, HandleKind::Source);
    assert_eq!(handles[0].position, HandleSide::Right);
    assert_eq!(handles[0].style.top, Some(64.0));

    assert_eq!(e.edges().len(), 1);
    let edge = &e.edges()[0];
    assert_eq!(edge.id, format!("root-{}", out.node_id));
    assert_eq!(edge.source_handle.as_deref(), Some(out.handle_id.as_str()));
    assert_eq!(edge.target_handle.as_deref(), Some(TARGET_LEFT));
}

#[test]
fn plain_fork_targets_the_top_handle() {
    let mut e = engine();
    let out = e.fork_node("root", "q1", false, None, None).unwrap();
    assert_eq!(e.node(&out.node_id).unwrap().kind, NodeKind::Markdown);
    assert_eq!(e.edges()[0].target_handle.as_deref(), Some(TARGET_TOP));
}

#[test]
fn handle_ids_never_repeat_across_forks() {
    let mut e = engine();
    let a = e.fork_node("root", "q1", true, None, None).unwrap();
    let b = e.fork_node("root", "q2", true, None, None).unwrap();
    assert_ne!(a.handle_id, b.handle_id);
}

#[test]
fn exactly_one_node_is_selected_after_a_fork() {
    let mut e = engine();
    let out = e.fork_node("root", "q1", true, None, None).unwrap();
    let selected: Vec<_> = e.nodes().iter().filter(|n| n.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, out.node_id);
    e.select_only("root");
    let selected: Vec<_> = e.nodes().iter().filter(|n| n.selected).collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].id, "root");
}

#[test]
fn forked_node_starts_with_one_pending_pair() {
    let mut e = engine();
    let out = e
        .fork_node("root", "why is the sky blue", true, Some("the sky"), None)
        .unwrap();
    let data = &e.node(&out.node_id).unwrap().data;
    assert!(data.awaiting_answer);
    assert_eq!(data.context.len(), 1);
    assert!(data.has_pending_pair());
    assert_eq!(data.reference_context.as_deref(), Some("the sky"));
    assert!(data.label.starts_with("> Background: \nthe sky\n"));
}

#[test]
fn at_most_one_pending_pair_per_node() {
    let mut e = engine();
    let id = e.fork_node("root", "q1", true, None, None).unwrap().node_id;
    e.complete_question(&id, "a1").unwrap();
    e.begin_question(&id, "q2").unwrap();
    e.complete_question(&id, "a2").unwrap();
    let data = &e.node(&id).unwrap().data;
    let pending = data
        .context
        .iter()
        .filter(|qa| qa.llm_response.is_none())
        .count();
    assert_eq!(pending, 0);
    assert_eq!(data.context.len(), 2);
    assert!(!data.awaiting_answer);
}

#[test]
fn complete_without_pending_pair_is_an_error() {
    let mut e = engine();
    let id = e.fork_node("root", "q1", true, None, None).unwrap().node_id;
    e.complete_question(&id, "a1").unwrap();
    assert!(e.complete_question(&id, "again").is_err());
}

#[test]
fn complete_rebuilds_the_label_with_the_answer() {
    let mut e = engine();
    let id = e.fork_node("root", "q1", true, None, None).unwrap().node_id;
    e.complete_question(&id, "a1").unwrap();
    let label = &e.node(&id).unwrap().data.label;
    assert!(label.contains("## Question: q1"));
    assert!(label.contains("## Answer: \na1"));
    assert_eq!(label.matches("## Question: q1").count(), 1);
}

#[test]
fn highlight_removal_is_exact() {
    let mut e = engine();
    let scope = HighlightScope::new(0, Field::Answer);
    e.add_highlight(
        "root",
        Highlight {
            start: 3,
            end: 8,
            text: "water".into(),
            scope,
        },
    )
    .unwrap();
    e.add_highlight(
        "root",
        Highlight {
            start: 3,
            end: 9,
            text: "waters".into(),
            scope,
        },
    )
    .unwrap();
    e.remove_highlight_exact("root", 3, 8);
    let hs = &e.node("root").unwrap().data.highlights;
    assert_eq!(hs.len(), 1);
    assert_eq!(hs[0].end, 9);
}

#[test]
fn scoped_removal_leaves_other_scopes_alone() {
    let mut e = engine();
    e.add_highlight(
        "root",
        Highlight {
            start: 3,
            end: 8,
            text: "water".into(),
            scope: HighlightScope::new(0, Field::Answer),
        },
    )
    .unwrap();
    e.add_highlight(
        "root",
        Highlight {
            start: 3,
            end: 8,
            text: "water".into(),
            scope: HighlightScope::new(1, Field::Answer),
        },
    )
    .unwrap();
    e.remove_highlight_exact_scoped("root", 3, 8, HighlightScope::new(1, Field::Answer));
    let hs = &e.node("root").unwrap().data.highlights;
    assert_eq!(hs.len(), 1);
    assert_eq!(hs[0].scope.qa_index, 0);
}

#[test]
fn by_text_removal_matches_the_rendered_slice() {
    let mut e = engine();
    e.add_highlight(
        "root",
        Highlight {
            start: 4,
            end: 7,
            text: "sky".into(),
            scope: HighlightScope::default(),
        },
    )
    .unwrap();
    e.remove_highlight_by_text("root", "the sky is blue", "sky");
    assert!(e.node("root").unwrap().data.highlights.is_empty());
}

#[test]
fn title_is_the_first_root_question() {
    let mut e = engine();
    assert_eq!(e.title(), "");
    e.begin_question("root", "first question").unwrap();
    e.complete_question("root", "first answer").unwrap();
    e.begin_question("root", "second question").unwrap();
    assert_eq!(e.title(), "first question");
}

#[test]
fn persistence_waits_for_the_latest_answer() {
    let mut e = engine();
    assert!(!e.should_persist());
    let id = e.fork_node("root", "q1", true, None, None).unwrap().node_id;
    assert!(!e.should_persist());
    e.complete_question(&id, "a1").unwrap();
    assert!(e.should_persist());
}

#[test]
fn load_reseeds_id_allocation() {
    let mut e = engine();
    let a = e.fork_node("root", "q1", true, None, None).unwrap();
    e.complete_question(&a.node_id, "a1").unwrap();
    let nodes = e.nodes().to_vec();
    let edges = e.edges().to_vec();

    let mut fresh = GraphEngine::new("other");
    fresh.load(nodes, edges);
    let next = fresh.fork_node("root", "q2", true, None, None).unwrap();
    assert_eq!(next.node_id, "root-2");
}
