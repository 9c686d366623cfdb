//! Node reclamation driven by finish notifications.

use ambient_ctx::tree::NodeState;
use ambient_ctx::{ContextManager, HookRegistry, LifecycleHooks, TreeConfig, UnitId};

use crate::integration::isolated;

#[test]
fn test_double_finish_reclaims_once() {
    let (ctx, hooks) = isolated();
    let unit = hooks.create_unit();
    assert_eq!(ctx.tree_len(), 2);

    hooks.finish_unit(unit);
    hooks.finish_unit(unit);

    assert!(!ctx.contains_unit(unit));
    assert_eq!(ctx.tree_len(), 1);
}

#[test]
fn test_parent_outlives_its_finished_children_only_as_needed() {
    let (ctx, hooks) = isolated();
    let parent = hooks.create_unit();
    let (first, second) = hooks.enter_unit(parent, || (hooks.create_unit(), hooks.create_unit()));

    hooks.finish_unit(parent);
    let state = ctx.tree().lock().node(parent).map(|node| node.state());
    assert_eq!(state, Some(NodeState::PendingReclaim));

    hooks.finish_unit(first);
    assert!(ctx.contains_unit(parent));

    hooks.finish_unit(second);
    assert!(!ctx.contains_unit(parent));
    assert_eq!(ctx.tree_len(), 1);
}

#[test]
fn test_pending_parent_keeps_serving_reads() {
    let (ctx, hooks) = isolated();
    let parent = hooks.create_unit();
    hooks.enter_unit(parent, || ctx.set("trace", "t-1"));
    let child = hooks.enter_unit(parent, || hooks.create_unit());
    hooks.finish_unit(parent);

    hooks.enter_unit(child, || {
        assert!(ctx.delete("trace"));
        assert_eq!(
            ctx.get_as::<&'static str>("trace").unwrap(),
            Some("t-1")
        );
    });
    hooks.finish_unit(child);
    assert_eq!(ctx.tree_len(), 1);
}

#[test]
fn test_abandoned_unit_is_never_reclaimed() {
    let (ctx, hooks) = isolated();
    let abandoned = hooks.create_unit();
    let child = hooks.enter_unit(abandoned, || hooks.create_unit());
    hooks.finish_unit(child);

    assert!(ctx.contains_unit(abandoned));
    assert!(!ctx.contains_unit(child));
    assert_eq!(hooks.live_units(), 1);
}

#[test]
fn test_finish_for_unknown_unit_is_ignored() {
    let (ctx, hooks) = isolated();
    hooks.finish_unit(UnitId::issue());
    hooks.finish_unit(UnitId::ROOT);
    assert_eq!(ctx.tree_len(), 1);
}

#[test]
fn test_detached_manager_ignores_notifications() {
    let hooks = HookRegistry::new();
    let ctx = ContextManager::new(TreeConfig::default());
    hooks.create_unit();
    assert_eq!(ctx.tree_len(), 1);

    ctx.attach(&hooks);
    let unit = hooks.create_unit();
    assert!(ctx.contains_unit(unit));
}

#[test]
fn test_adapter_can_be_driven_directly() {
    let ctx = ContextManager::new(TreeConfig::default());
    let adapter = ctx.lifecycle_adapter();
    let unit = UnitId::issue();

    adapter.on_unit_created(unit, UnitId::ROOT);
    adapter.on_unit_about_to_run(unit);
    assert!(ctx.contains_unit(unit));

    adapter.on_unit_finished(unit);
    assert!(!ctx.contains_unit(unit));
}

#[test]
fn test_reset_drops_all_nodes() {
    let (ctx, hooks) = isolated();
    for _ in 0..5 {
        hooks.create_unit();
    }
    ctx.set("k", 1u8);
    assert_eq!(ctx.tree_len(), 6);

    ctx.reset();
    assert_eq!(ctx.tree_len(), 1);
    assert!(!ctx.has("k"));
}
