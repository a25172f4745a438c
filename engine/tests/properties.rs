mod common;

use common::*;
use onemore_engine::baton;
use onemore_engine::combat::damage::{FinalDamage, HitModifiers, finalize_damage};
use onemore_engine::config::BatonConfig;
use onemore_engine::data::{SkillDef, TargetShape};
use onemore_engine::escape::{EscapeState, escape_chance};
use onemore_engine::steal::steal_chance;
use onemore_engine::{Action, Affinity, BattleConfig, BattleEvent, Catalog, Element, Roster, Side};
use proptest::prelude::*;

fn damaging() -> impl Strategy<Value = Affinity> {
    prop_oneof![Just(Affinity::Normal), Just(Affinity::Weak), Just(Affinity::Resist)]
}

fn modifiers() -> impl Strategy<Value = HitModifiers> {
    (
        0u32..4,
        any::<bool>(),
        proptest::option::of(Just(1.5)),
        proptest::option::of(0.0f64..=1.0),
        proptest::option::of(1.0f64..3.0),
    )
        .prop_map(|(baton_level, critical, technical, guard_reduction, charge)| HitModifiers {
            baton_level,
            critical,
            technical,
            guard_reduction,
            charge,
        })
}

fn duel_roster(party_speed: i32, enemy_speed: i32, party_hp: i32) -> Roster {
    let mut hero = spec("hero", 100, stats(0, 0, 0, 0, party_speed));
    hero.hp = Some(party_hp);
    let foe = spec("foe", 100, stats(0, 0, 0, 0, enemy_speed));
    let mut roster = Roster::new();
    roster.insert(hero.to_combatant(Side::Party)).unwrap();
    roster.insert(foe.to_combatant(Side::Enemy)).unwrap();
    roster
}

proptest! {
    #[test]
    fn damaging_hits_always_deal_at_least_one(
        base in -50.0f64..5000.0,
        affinity in damaging(),
        mods in modifiers(),
    ) {
        let config = BattleConfig::default();
        match finalize_damage(base, affinity, &mods, &config) {
            FinalDamage::Damage(n) => prop_assert!(n >= 1),
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn nullifying_affinities_never_move_hp(base in 0.0f64..5000.0, mods in modifiers()) {
        let config = BattleConfig::default();
        prop_assert_eq!(finalize_damage(base, Affinity::Null, &mods, &config), FinalDamage::Nullified);
        prop_assert_eq!(finalize_damage(base, Affinity::Immune, &mods, &config), FinalDamage::Nullified);
        prop_assert!(matches!(
            finalize_damage(base, Affinity::Absorb, &mods, &config),
            FinalDamage::Absorbed(n) if n >= 1
        ));
    }

    #[test]
    fn escape_chance_stays_in_bounds(
        party_speed in 1i32..200,
        enemy_speed in 1i32..200,
        party_hp in 1i32..=100,
        failed_attempts in 0u32..10,
    ) {
        let roster = duel_roster(party_speed, enemy_speed, party_hp);
        let state = EscapeState { failed_attempts };
        let chance = escape_chance(&BattleConfig::default(), &roster, Side::Party, &state);
        prop_assert!((10.0..=95.0).contains(&chance), "chance {}", chance);

        let boss = BattleConfig { boss: true, ..BattleConfig::default() };
        prop_assert_eq!(escape_chance(&boss, &roster, Side::Party, &state), 0.0);
        let pinned = BattleConfig { pinned_down: true, ..BattleConfig::default() };
        prop_assert_eq!(escape_chance(&pinned, &roster, Side::Party, &state), 0.0);
    }

    #[test]
    fn baton_multiplier_grows_by_half_per_level(level in 0u32..10) {
        let m = baton::damage_multiplier(&BatonConfig::default(), level);
        prop_assert!((m - (1.0 + 0.5 * level as f64)).abs() < 1e-9);
    }

    #[test]
    fn steal_chance_is_clamped(base in -100.0f64..300.0, luck in -50i32..150) {
        let chance = steal_chance(base, luck);
        prop_assert!((1.0..=95.0).contains(&chance));
    }

    #[test]
    fn one_action_grants_at_most_one_more(
        weak in proptest::collection::vec(any::<bool>(), 1..=4),
        rolls in proptest::collection::vec(0.0f64..1.0, 1..8),
    ) {
        let maragi = SkillDef::damage("maragi", Element::Fire, 100.0).with_target(TargetShape::AllEnemies);
        let mut joker = spec("joker", 200, stats(0, 0, 100, 0, 10));
        joker.skills = vec!["maragi".into()];
        let enemies = weak
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let e = spec(&format!("e{}", i), 1000, stats(0, 0, 0, 0, 1));
                if w { weak_to(e, Element::Fire) } else { e }
            })
            .collect();
        let mut b = battle(vec![joker], enemies, Catalog::new().with_skill(maragi), rolls);
        start(&mut b);

        let shown = act(&mut b, Action::skill("joker", "maragi", &[]));
        let one_mores = shown
            .events
            .iter()
            .filter(|e| matches!(e, BattleEvent::OneMore { .. }))
            .count();
        let knocked = shown.result.outcomes.iter().any(|o| o.flags.caused_knockdown);
        prop_assert!(one_mores <= 1);
        prop_assert_eq!(one_mores == 1, knocked);
    }
}
