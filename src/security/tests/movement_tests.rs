use super::world::{World, SITE};
use crate::dbtype::{ApplicationProperties, EntityId, EntityType, Lock, PropertyValue, SecurityFlag};
use crate::security::{Capability, Context, Operation};

#[test]
fn action_locality_tracks_its_room() {
    let w = World::new();
    let hall = w.room("Hall");
    let cellar = w.room("Cellar");
    let alice = w.player("Alice", Some(&hall));
    let door = w.entity(EntityType::Exit, "door", EntityId::default(), Some(&hall));
    let helpers = w.access.helpers();
    assert!(helpers.is_entity_local(&alice, &door, true));
    w.move_to(&door, &cellar);
    assert!(!helpers.is_entity_local(&alice, &door, true));
}

#[test]
fn owner_can_move_things_between_rooms_from_afar() {
    let w = World::new();
    let lobby = w.room("Lobby");
    let r1 = w.room("R1");
    let r2 = w.room("R2");
    let u1 = w.player("U1", Some(&lobby));
    let e = w.entity(EntityType::Thing, "crate", u1.id(), Some(&r1));
    r2.write().unwrap().set_owner(u1.id());

    let helpers = w.access.helpers();
    assert!(!helpers.is_entity_local(&u1, &e, true));
    assert!(!helpers.is_entity_local(&u1, &r2, true));

    let mut ctx = w.ctx(&u1);
    assert!(ctx.run_as_requester());
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &r2, &e, false), Ok(true));

    // Without standing on the destination the far move fails.
    let mut ctx = w.ctx(&u1);
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &r1, &e, false), Ok(false));
}

#[test]
fn co_located_requester_may_drop_and_take() {
    let w = World::new();
    let hall = w.room("Hall");
    let vault = w.room("Vault");
    let alice = w.player("Alice", Some(&hall));
    let stranger = EntityId::new(SITE, 999);
    let coin = w.entity(EntityType::Thing, "coin", stranger, Some(&alice));
    let far_coin = w.entity(EntityType::Thing, "coin", stranger, Some(&vault));

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &hall, &coin, false), Ok(true));
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &hall, &far_coin, false), Ok(false));

    // Handing an item straight to another character needs standing on both.
    let bob = w.player("Bob", Some(&hall));
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &bob, &coin, false), Ok(false));
}

#[test]
fn rooms_move_only_with_standing_on_both() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let region = w.entity(EntityType::Region, "Town", alice.id(), None);
    let plaza = w.entity(EntityType::Room, "Plaza", alice.id(), None);
    let foreign = w.room("Elsewhere");

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &region, &plaza, false), Ok(true));
    assert_eq!(w.access.security_check_source(Operation::TransferEntity, &mut ctx, &region, &foreign, false), Ok(false));
}

#[test]
fn actions_need_read_and_an_open_lock() {
    let w = World::new();
    let hall = w.room("Hall");
    let alice = w.player("Alice", Some(&hall));
    let bob = w.player("Bob", Some(&hall));
    let guild = w.group("guild", &[&alice]);
    let door = w.entity(EntityType::Exit, "door", EntityId::new(SITE, 999), Some(&hall));

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &door, false), Ok(false));

    door.write().unwrap().security_mut().other_flags = SecurityFlag::BASIC;
    door.write().unwrap().set_action_lock(Lock::ByGroup { group: guild.id(), negate: false });
    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &door, false), Ok(true));
    let mut bob_ctx = w.ctx(&bob);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut bob_ctx, &door, false), Ok(false));

    door.write().unwrap().set_action_lock(Lock::ById { id: alice.id(), negate: true });
    let mut ctx = w.ctx(&alice);
    let mut bob_ctx = w.ctx(&bob);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &door, false), Ok(false));
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut bob_ctx, &door, false), Ok(true));
}

#[test]
fn action_locks_can_test_user_properties() {
    let w = World::new();
    let hall = w.room("Hall");
    let alice = w.player("Alice", Some(&hall));
    let bob = w.player("Bob", Some(&hall));
    let gate = w.entity(EntityType::Command, "gate", EntityId::new(SITE, 999), Some(&hall));
    {
        let mut token = gate.write().unwrap();
        token.security_mut().other_flags = SecurityFlag::READ;
        token.set_action_lock(Lock::ByProperty {
            application: "quest".into(),
            path: "/stage".into(),
            value: PropertyValue::Integer(3),
            negate: false,
        });
    }
    let mut quest = ApplicationProperties::new(alice.id());
    quest.properties.insert("stage".into(), PropertyValue::Integer(3));
    alice.write().unwrap().set_application("quest", quest);

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &gate, false), Ok(true));
    let mut bob_ctx = w.ctx(&bob);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut bob_ctx, &gate, false), Ok(false));
}

#[test]
fn actions_are_used_as_the_requester_not_the_program() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let prog = w.entity(EntityType::Program, "runner", EntityId::new(SITE, 999), None);
    let cmd = w.entity(EntityType::Command, "wave", alice.id(), None);

    let mut ctx = Context::new(alice.id(), prog.id(), false);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &cmd, false), Ok(true));

    let not_an_action = w.entity(EntityType::Thing, "rock", alice.id(), None);
    assert_eq!(w.access.security_check_target(Operation::UseAction, &mut ctx, &not_an_action, false), Ok(false));
}

#[test]
fn room_text_is_limited_to_the_current_room() {
    let w = World::new();
    let hall = w.room("Hall");
    let cellar = w.room("Cellar");
    let alice = w.player("Alice", Some(&hall));
    let bob = w.player("Bob", Some(&cellar));

    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_target(Operation::SendTextRoom, &mut ctx, &hall, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::SendTextRoom, &mut ctx, &cellar, false), Ok(false));
    assert_eq!(w.access.security_check_target(Operation::SendTextRoom, &mut ctx, &bob, false), Ok(false));
    assert_eq!(w.access.security_check_target(Operation::SendTextRoomUnrestricted, &mut ctx, &cellar, false), Ok(false));
    assert_eq!(w.access.security_check_target(Operation::SendTextEntity, &mut ctx, &bob, false), Ok(false));
    assert_eq!(w.access.security_check_target(Operation::CharacterOnline, &mut ctx, &bob, false), Ok(false));

    let loud = w.capability(SITE, Capability::SendTextRoomUnrestricted);
    let whisper = w.capability(SITE, Capability::SendTextEntity);
    let online = w.capability(SITE, Capability::CharacterOnline);
    for cap in [&loud, &whisper, &online] { w.add_member(cap, &alice); }
    w.settle();

    ctx.reset_capabilities();
    assert_eq!(w.access.security_check_target(Operation::SendTextRoom, &mut ctx, &cellar, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::SendTextRoomUnrestricted, &mut ctx, &cellar, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::SendTextEntity, &mut ctx, &bob, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::CharacterOnline, &mut ctx, &bob, false), Ok(true));
    assert_eq!(w.access.security_check(Operation::CharacterOnline, &mut ctx, false), Ok(true));
}

#[test]
fn entity_creation_depends_on_type() {
    let w = World::new();
    let alice = w.player("Alice", None);
    let builder = w.capability(SITE, Capability::Builder);
    let mut ctx = w.ctx(&alice);
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Thing, false), Ok(false));

    w.add_member(&builder, &alice);
    w.settle();
    ctx.reset_capabilities();
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Thing, false), Ok(true));
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Room, false), Ok(true));
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Guest, false), Ok(false));
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Program, false), Ok(false));
    assert_eq!(w.access.security_check_entity_type(Operation::CreateEntity, &mut ctx, EntityType::Capability, false), Ok(false));

    let mine = w.entity(EntityType::Thing, "mine", alice.id(), None);
    let theirs = w.entity(EntityType::Thing, "theirs", EntityId::new(SITE, 999), None);
    assert_eq!(w.access.security_check_target(Operation::DeleteEntity, &mut ctx, &mine, false), Ok(true));
    assert_eq!(w.access.security_check_target(Operation::DeleteEntity, &mut ctx, &theirs, false), Ok(false));
}
