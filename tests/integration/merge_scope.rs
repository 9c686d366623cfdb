//! Merge mode: entry points whose descendants share one store.

use crate::integration::{isolated, text};

#[test]
fn test_child_write_visible_to_merged_parent() {
    let (ctx, hooks) = isolated();
    let parent = hooks.create_unit();
    hooks.enter_unit(parent, || {
        assert!(ctx.begin_sharing());
        let child = hooks.create_unit();
        hooks.enter_unit(child, || ctx.set("ip", "1.2.3.4"));
        hooks.finish_unit(child);
        assert_eq!(text(&ctx, "ip"), Some("1.2.3.4"));
    });
    hooks.finish_unit(parent);
}

#[test]
fn test_children_created_before_merge_stay_private() {
    let (ctx, hooks) = isolated();
    let parent = hooks.create_unit();
    let early = hooks.enter_unit(parent, || hooks.create_unit());
    hooks.enter_unit(parent, || ctx.begin_sharing());
    let late = hooks.enter_unit(parent, || hooks.create_unit());

    hooks.enter_unit(early, || ctx.set("early", "x"));
    hooks.enter_unit(late, || ctx.set("late", "y"));

    hooks.enter_unit(parent, || {
        assert!(!ctx.has("early"));
        assert_eq!(text(&ctx, "late"), Some("y"));
    });
}

#[test]
fn test_merge_propagates_to_grandchildren_and_siblings() {
    let (ctx, hooks) = isolated();
    hooks.run_unit(|| {
        ctx.begin_sharing();
        hooks.run_unit(|| {
            assert!(ctx.is_merged());
            hooks.run_unit(|| ctx.set("deep", 1u8));
        });
        hooks.run_unit(|| {
            assert_eq!(ctx.get_as::<u8>("deep").unwrap(), Some(1));
            ctx.set("sibling", 2u8);
        });
        assert_eq!(ctx.get_as::<u8>("sibling").unwrap(), Some(2));
    });
}

#[test]
fn test_entry_point_wrapper_brackets_each_request() {
    let (ctx, hooks) = isolated();
    let ctx = std::sync::Arc::new(ctx);
    let handler_ctx = ctx.clone();
    let mut handle = ctx.begin_entry_point(move |request_id: &'static str| {
        handler_ctx.set("request_id", request_id);
    });

    for request_id in ["r-1", "r-2"] {
        hooks.run_unit(|| {
            handle(request_id);
            hooks.run_unit(|| ctx.set("handled_by", "worker"));
            assert_eq!(text(&ctx, "request_id"), Some(request_id));
            assert_eq!(text(&ctx, "handled_by"), Some("worker"));
        });
    }
    assert!(!ctx.has("handled_by"));
    assert!(!ctx.has("request_id"));
}

#[test]
fn test_end_to_end_scope_never_merges_into_root() {
    let (ctx, hooks) = isolated();
    ctx.set("app", "svc1");

    let a = hooks.create_unit();
    hooks.enter_unit(a, || {
        ctx.set("id", "abc");
        ctx.begin_sharing();
        let b = hooks.create_unit();
        hooks.enter_unit(b, || ctx.set("ip", "1.2.3.4"));
        hooks.finish_unit(b);

        assert_eq!(text(&ctx, "ip"), Some("1.2.3.4"));
        assert_eq!(text(&ctx, "app"), Some("svc1"));
        assert_eq!(text(&ctx, "id"), Some("abc"));
    });
    hooks.finish_unit(a);

    assert!(ctx.get("ip").is_none());
    assert!(ctx.get("id").is_none());
    assert_eq!(text(&ctx, "app"), Some("svc1"));
    assert_eq!(ctx.tree_len(), 1);
}
