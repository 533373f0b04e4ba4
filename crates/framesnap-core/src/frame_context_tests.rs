use super::*;
use crate::testing::{fid, MockPage};

fn nested_tree() -> FrameTreeNode {
    FrameTreeNode::new("main")
        .with_child(
            FrameTreeNode::new("a")
                .with_child(FrameTreeNode::new("a1"))
                .with_child(FrameTreeNode::new("a2")),
        )
        .with_child(FrameTreeNode::new("b"))
}

#[test]
fn test_single_frame_page() {
    let page = MockPage::new(FrameTreeNode::new("main"));
    let ctx = build_frame_context(&page).unwrap();

    assert_eq!(ctx.root_id, fid("main"));
    assert_eq!(ctx.frames, vec![fid("main")]);
    assert_eq!(ctx.parent_of(&fid("main")), None);
    assert!(ctx.is_root(&fid("main")));
}

#[test]
fn test_preorder_traversal() {
    let page = MockPage::new(nested_tree());
    let ctx = build_frame_context(&page).unwrap();

    let order: Vec<&str> = ctx.frames.iter().map(|f| f.as_str()).collect();
    assert_eq!(order, vec!["main", "a", "a1", "a2", "b"]);
}

#[test]
fn test_parent_pointers() {
    let page = MockPage::new(nested_tree());
    let ctx = build_frame_context(&page).unwrap();

    assert_eq!(ctx.parent_by_frame.len(), ctx.frames.len());
    assert_eq!(ctx.parent_of(&fid("a")), Some(&fid("main")));
    assert_eq!(ctx.parent_of(&fid("a2")), Some(&fid("a")));
    assert_eq!(ctx.parent_of(&fid("b")), Some(&fid("main")));
    assert_eq!(ctx.parent_by_frame.get(&fid("main")), Some(&None));
}

#[test]
fn test_every_parent_is_in_frames() {
    let page = MockPage::new(nested_tree());
    let ctx = build_frame_context(&page).unwrap();

    for frame in &ctx.frames {
        if let Some(parent) = ctx.parent_of(frame) {
            assert!(ctx.contains(parent));
            assert!(ctx.position(parent) < ctx.position(frame));
        }
    }
}

#[test]
fn test_main_frame_below_tree_root() {
    // main frame is not the tree root: only its subtree is captured
    let page = MockPage::new(nested_tree()).with_main("a");
    let ctx = build_frame_context(&page).unwrap();

    let order: Vec<&str> = ctx.frames.iter().map(|f| f.as_str()).collect();
    assert_eq!(order, vec!["a", "a1", "a2"]);
    assert_eq!(ctx.parent_of(&fid("a")), None);
}

#[test]
fn test_main_frame_missing_from_tree() {
    let page = MockPage::new(nested_tree()).with_main("gone");
    let err = build_frame_context(&page).unwrap_err();

    assert!(matches!(err, CaptureError::InvalidPage(_)));
    assert!(err.to_string().contains("gone"));
}

#[test]
fn test_duplicate_frame_keeps_first() {
    let tree = FrameTreeNode::new("main")
        .with_child(FrameTreeNode::new("x").with_child(FrameTreeNode::new("dup")))
        .with_child(FrameTreeNode::new("dup"));
    let page = MockPage::new(tree);
    let ctx = build_frame_context(&page).unwrap();

    let order: Vec<&str> = ctx.frames.iter().map(|f| f.as_str()).collect();
    assert_eq!(order, vec!["main", "x", "dup"]);
    assert_eq!(ctx.parent_of(&fid("dup")), Some(&fid("x")));
}

#[test]
fn test_detached_frames_left_out() {
    let page = MockPage::new(nested_tree()).with_detached("stale");
    let ctx = build_frame_context(&page).unwrap();

    assert!(!ctx.contains(&fid("stale")));
    assert_eq!(ctx.frames.len(), 5);
}
