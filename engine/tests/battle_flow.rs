mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use onemore_engine::{
    Action, ActionError, Battle, BattleConfig, BattleEvent, BattleObserver, BattlePhase, Catalog,
    DataError, Inventory, Outcome, SetupError,
};

#[test]
fn turns_follow_speed_with_roster_order_ties() {
    let mut b = battle(
        vec![
            spec("slow", 100, stats(1, 0, 0, 0, 5)),
            spec("fast", 100, stats(1, 0, 0, 0, 30)),
        ],
        vec![
            spec("tie_a", 100, stats(1, 0, 0, 0, 10)),
            spec("tie_b", 100, stats(1, 0, 0, 0, 10)),
        ],
        Catalog::new(),
        vec![0.99],
    );
    assert_eq!(b.turn_order(), ["fast", "tie_a", "tie_b", "slow"]);

    let mut seen = Vec::new();
    for _ in 0..4 {
        let turn = start(&mut b);
        seen.push(turn.actor.clone());
        act(&mut b, Action::guard(&turn.actor));
    }
    assert_eq!(seen, ["fast", "tie_a", "tie_b", "slow"]);
    assert_eq!(start(&mut b).round, 2);
}

#[test]
fn knocked_down_combatants_stand_instead_of_acting() {
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(10, 0, 0, 0, 50))],
        Catalog::new(),
        vec![0.99],
    );
    b.combatant_mut("shadow").expect("shadow").flags.knocked_down = true;

    assert_eq!(start(&mut b).actor, "joker");
    assert!(!b.combatant("shadow").expect("shadow").flags.knocked_down);
    assert_eq!(lines_containing(&b, "[TURN][shadow] skipped (KnockedDown)"), 1);
}

#[test]
fn submit_checks_phase_and_actor() {
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(10, 0, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    assert!(matches!(
        b.submit(Action::guard("joker")),
        Err(ActionError::WrongPhase(_))
    ));

    start(&mut b);
    assert_eq!(
        b.submit(Action::guard("shadow")).expect_err("not shadow's turn"),
        ActionError::NotActorsTurn("shadow".into())
    );
    assert_eq!(
        b.submit(Action::attack("joker", "joker")).expect_err("own side"),
        ActionError::InvalidTarget("joker".into())
    );

    b.submit(Action::guard("joker")).expect("guard");
    assert_eq!(b.phase(), &BattlePhase::AwaitingPresentation);
    assert!(matches!(b.next_turn(), Err(ActionError::WrongPhase(_))));
    b.presentation_complete().expect("ack");
    assert_eq!(b.phase(), &BattlePhase::Ready);
}

#[test]
fn next_turn_is_idempotent_while_awaiting_an_action() {
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(10, 0, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    let first = start(&mut b);
    let again = start(&mut b);
    assert_eq!(first.actor, again.actor);
    assert!(again.events.is_empty());
}

#[test]
fn initialize_rejects_bad_setups() {
    let joker = spec("joker", 100, stats(10, 0, 0, 0, 10));
    let shadow = spec("shadow", 100, stats(10, 0, 0, 0, 1));

    let empty = Battle::initialize(&[joker.clone()], &[], Catalog::new(), Inventory::new(), BattleConfig::default());
    assert_eq!(empty.err(), Some(SetupError::EmptySide("enemy")));

    let twins = Battle::initialize(
        &[joker.clone()],
        &[joker.clone()],
        Catalog::new(),
        Inventory::new(),
        BattleConfig::default(),
    );
    assert_eq!(twins.err(), Some(SetupError::DuplicateId("joker".into())));

    let mut unknown = joker.clone();
    unknown.skills = vec!["megidolaon".into()];
    let missing = Battle::initialize(&[unknown], &[shadow], Catalog::new(), Inventory::new(), BattleConfig::default());
    assert_eq!(
        missing.err(),
        Some(SetupError::Data(DataError::MissingSkill("megidolaon".into())))
    );
}

#[derive(Default)]
struct Recorder(Rc<RefCell<Vec<String>>>);

impl BattleObserver for Recorder {
    fn on_event(&mut self, event: &BattleEvent) {
        self.0.borrow_mut().push(event.to_string());
    }
}

#[test]
fn observers_see_the_same_stream_as_the_log() {
    let mut b = battle(
        vec![spec("joker", 100, stats(200, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(10, 0, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    b.subscribe(Recorder(Rc::clone(&seen)));

    start(&mut b);
    act(&mut b, Action::attack("joker", "shadow"));
    assert!(b.next_turn().expect("finished").is_none());
    assert_eq!(b.outcome(), Some(Outcome::Victory));

    let seen = seen.borrow();
    assert_eq!(seen.as_slice(), b.log_lines());
    assert_eq!(seen.first().map(String::as_str), Some("[ROUND] 1"));
    assert_eq!(seen.last().map(String::as_str), Some("[END] victory"));
}

#[test]
fn aborting_finishes_the_battle() {
    let mut b = battle(
        vec![spec("joker", 100, stats(10, 0, 0, 0, 10))],
        vec![spec("shadow", 100, stats(10, 0, 0, 0, 1))],
        Catalog::new(),
        vec![0.99],
    );
    start(&mut b);
    b.abort();
    assert!(b.is_finished());
    assert!(matches!(
        b.submit(Action::guard("joker")),
        Err(ActionError::WrongPhase(_))
    ));
    assert_eq!(b.shutdown().outcome, Outcome::Aborted);
}
