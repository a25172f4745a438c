use thiserror::Error;

/// A submitted action that was refused before any state changed.
///
/// Always recoverable: the caller picks a different action.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("battle is not accepting actions ({0})")]
    WrongPhase(&'static str),
    #[error("it is not {0}'s turn")]
    NotActorsTurn(String),
    #[error("{0} cannot act")]
    ActorCannotAct(String),
    #[error("unknown combatant '{0}'")]
    UnknownCombatant(String),
    #[error("invalid target '{0}'")]
    InvalidTarget(String),
    #[error("action needs a target")]
    MissingTarget,
    #[error("{actor} does not know '{id}'")]
    NotKnown { actor: String, id: String },
    #[error("insufficient MP: need {need}, have {have}")]
    InsufficientMp { need: i32, have: i32 },
    #[error("insufficient HP: need {need}, have {have}")]
    InsufficientHp { need: i32, have: i32 },
    #[error("no '{0}' left in inventory")]
    OutOfItem(String),
    #[error("{0} is silenced")]
    Silenced(String),
    #[error("limit gauge of {0} is not full")]
    LimitNotReady(String),
    #[error("duo partner '{0}' is missing or not ready")]
    DuoPartnerNotReady(String),
    #[error("all-out attack is not available")]
    AllOutAttackUnavailable,
    #[error("escape is forbidden in this battle")]
    EscapeForbidden,
    #[error("{0} has no extra turn to pass")]
    NoExtraTurn(String),
    #[error("{0} cannot receive a baton pass")]
    CannotReceivePass(String),
    #[error("nothing left to steal from {0}")]
    NothingToSteal(String),
    #[error("summon '{summon}' is on cooldown for {turns} more turns")]
    SummonOnCooldown { summon: String, turns: u32 },
    #[error("summon '{0}' is already active")]
    SummonAlreadyActive(String),
}

/// A record or reference that should exist but does not.
///
/// Treated as a logic fault: the action becomes a no-op and the turn ends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("missing skill record '{0}'")]
    MissingSkill(String),
    #[error("missing item record '{0}'")]
    MissingItem(String),
    #[error("missing limit break record '{0}'")]
    MissingLimitBreak(String),
    #[error("missing summon record '{0}'")]
    MissingSummon(String),
    #[error("missing showtime record '{0}'")]
    MissingShowtime(String),
    #[error("stale combatant reference '{0}'")]
    StaleCombatant(String),
}

/// Invalid input to `Battle::initialize`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("{0} side has no combatants")]
    EmptySide(&'static str),
    #[error("duplicate combatant id '{0}'")]
    DuplicateId(String),
    #[error("combatant '{0}' has no HP")]
    NoHitPoints(String),
    #[error(transparent)]
    Data(#[from] DataError),
}
