use super::world::{World, GLOBAL, OTHER_SITE, SITE};
use crate::dbtype::{EntityId, EntityType};
use crate::security::{Capability, Context, Operation};

#[test]
fn create_player_follows_group_grants() {
    let w = World::new();
    let cap = w.capability(SITE, Capability::CreatePlayer);
    let alice = w.player("Alice", None);
    let mut ctx = w.ctx(&alice);

    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Player, false), Ok(false));
    assert_eq!(w.access.capability_cache().cached(SITE, Capability::CreatePlayer), vec![cap.id()]);

    let creators = w.group("creators", &[&alice]);
    w.add_member(&cap, &creators);
    w.settle();
    assert!(w.access.capability_cache().cached(SITE, Capability::CreatePlayer).is_empty());

    ctx.reset_capabilities();
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Player, false), Ok(true));
    assert!(ctx.has_capability(Capability::CreatePlayer));
    assert_eq!(w.access.capability_cache().cached(SITE, Capability::CreatePlayer), vec![cap.id(), creators.id()]);
}

#[test]
fn revoking_a_grant_leaves_no_stale_positive() {
    let w = World::new();
    let cap = w.capability(SITE, Capability::Builder);
    let alice = w.player("Alice", None);
    let builders = w.group("builders", &[&alice]);
    w.add_member(&cap, &builders);
    w.settle();

    let mut ctx = w.ctx(&alice);
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.has_capability(Capability::Builder));

    cap.write().unwrap().remove_group_member(&builders.id());
    w.settle();
    ctx.reset_capabilities();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(!ctx.has_capability(Capability::Builder));

    // Disabling instead of removing has the same effect.
    w.add_member(&cap, &alice);
    w.settle();
    ctx.reset_capabilities();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.has_capability(Capability::Builder));
    cap.write().unwrap().set_member_disabled(alice.id(), true);
    w.settle();
    ctx.reset_capabilities();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(!ctx.has_capability(Capability::Builder));
}

#[test]
fn populated_context_keeps_its_capabilities_until_reset() {
    let w = World::new();
    let cap = w.capability(SITE, Capability::SendTextEntity);
    let alice = w.player("Alice", None);
    let mut ctx = w.ctx(&alice);
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.capabilities_populated());
    assert!(!ctx.has_capability(Capability::SendTextEntity));

    w.add_member(&cap, &alice);
    w.settle();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(!ctx.has_capability(Capability::SendTextEntity));
    ctx.reset_capabilities();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.has_capability(Capability::SendTextEntity));
}

#[test]
fn global_site_capabilities_apply_everywhere() {
    let w = World::new();
    let cap = w.capability(GLOBAL, Capability::AnyIdToName);
    let alice = w.player("Alice", None);
    w.add_member(&cap, &alice);
    w.settle();

    let mut ctx = w.ctx(&alice);
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.has_capability(Capability::AnyIdToName));
    assert!(!ctx.has_capability(Capability::Admin));
}

#[test]
fn program_membership_grants_capabilities() {
    let w = World::new();
    let cap = w.capability(SITE, Capability::RunAsUser);
    let alice = w.player("Alice", None);
    let prog = w.entity(EntityType::Program, "helper", alice.id(), None);
    w.add_member(&cap, &prog);
    w.settle();

    let mut native = w.ctx(&alice);
    assert_eq!(w.access.security_check(Operation::RunAsRequester, &mut native, false), Ok(false));
    let mut scripted = Context::new(alice.id(), prog.id(), false).with_pid(12);
    assert_eq!(w.access.security_check(Operation::RunAsRequester, &mut scripted, false), Ok(true));
}

#[test]
fn implicit_admins_come_from_config() {
    let mut cfg = World::test_config();
    cfg.implicit_admin_ids = vec![EntityId::new(SITE, 1)];
    let w = World::with_config(cfg, Vec::new());
    let root = w.player("Root", None);
    assert_eq!(root.id(), EntityId::new(SITE, 1));
    let bob = w.player("Bob", None);

    let mut ctx = w.ctx(&root);
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.is_admin());
    assert_eq!(w.access.security_check_target(Operation::DeleteEntity, &mut ctx, &bob, false), Ok(true));

    let mut bob_ctx = w.ctx(&bob);
    w.access.populate_context_capabilities(&mut bob_ctx);
    assert!(!bob_ctx.is_admin());
}

#[test]
fn ambiguous_capability_entities_grant_nothing() {
    let w = World::new();
    let first = w.capability(SITE, Capability::CharacterOnline);
    let second = w.capability(SITE, Capability::CharacterOnline);
    let alice = w.player("Alice", None);
    w.add_member(&first, &alice);
    w.add_member(&second, &alice);
    w.settle();

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check(Operation::CharacterOnline, &mut ctx, false), Ok(false));
    assert!(w.access.capability_cache().cached(SITE, Capability::CharacterOnline).is_empty());
}

#[test]
fn deleting_a_site_drops_its_cache() {
    let w = World::new();
    let visitor = w.entity_in(OTHER_SITE, EntityType::Player, "Visitor", EntityId::default(), None);
    let mut ctx = w.ctx(&visitor);
    w.access.populate_context_capabilities(&mut ctx);
    assert!(w.access.capability_cache().is_site_initialized(OTHER_SITE));

    assert!(w.db.delete_site(OTHER_SITE));
    w.settle();
    assert!(!w.access.capability_cache().is_site_initialized(OTHER_SITE));
    assert!(w.access.capability_cache().is_site_initialized(GLOBAL));
}

#[test]
fn lost_subscriptions_are_restored() {
    let w = World::new();
    let inv = w.access.invalidator().unwrap().clone();
    let before = inv.subscription_ids();
    assert_eq!(before.len(), 2);
    for id in &before { assert!(w.bus.force_remove(*id)); }
    w.settle();

    let after = inv.subscription_ids();
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|id| !before.contains(id)));
    assert_eq!(w.bus.subscription_count(), 2);

    // Only an invalidation can make the cached list pick up the new group.
    let cap = w.capability(SITE, Capability::SendTextRoomUnrestricted);
    let alice = w.player("Alice", None);
    let mut ctx = w.ctx(&alice);
    w.access.populate_context_capabilities(&mut ctx);
    assert_eq!(w.access.capability_cache().cached(SITE, Capability::SendTextRoomUnrestricted), vec![cap.id()]);

    let heralds = w.group("heralds", &[&alice]);
    w.add_member(&cap, &heralds);
    w.settle();
    assert!(w.access.capability_cache().cached(SITE, Capability::SendTextRoomUnrestricted).is_empty());

    ctx.reset_capabilities();
    w.access.populate_context_capabilities(&mut ctx);
    assert!(ctx.has_capability(Capability::SendTextRoomUnrestricted));
    assert_eq!(w.access.capability_cache().cached(SITE, Capability::SendTextRoomUnrestricted), vec![cap.id(), heralds.id()]);
}

#[test]
fn deleting_a_capability_entity_revokes_it() {
    let w = World::new();
    let cap = w.capability(SITE, Capability::Builder);
    let alice = w.player("Alice", None);
    let builders = w.group("builders", &[&alice]);
    w.add_member(&cap, &builders);
    w.settle();

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Thing, false), Ok(true));
    assert_eq!(w.access.capability_cache().cached(SITE, Capability::Builder), vec![cap.id(), builders.id()]);

    assert!(w.db.delete_entity(&cap.id()));
    w.settle();
    assert!(w.access.capability_cache().cached(SITE, Capability::Builder).is_empty());

    let mut fresh = w.ctx(&alice);
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut fresh, EntityType::Thing, false), Ok(false));
    assert!(!fresh.has_capability(Capability::Builder));
}

#[test]
fn shutdown_releases_subscriptions() {
    let w = World::new();
    assert_eq!(w.bus.subscription_count(), 2);
    w.access.shutdown();
    assert_eq!(w.bus.subscription_count(), 0);
}
