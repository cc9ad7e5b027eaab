//! Power-up resolution.
//!
//! [`resolve`] is a pure function of its inputs plus the random draws it
//! takes. It never fails: anything it can't act on comes back as
//! [`PowerUpEffect::NothingToReveal`]. The engine's remaining-uses checks
//! are what gate a power-up, not this function.

use guestquest_catalog::Character;
use guestquest_protocol::{PowerUpEffect, PowerUpKind};
use rand::RngCore;
use rand::seq::IndexedRandom;

/// Attribute keys that describe the record rather than the character.
const METADATA_KEYS: [&str; 3] = ["id", "name", "image"];

/// Computes the effect of `kind` against `opponent`.
///
/// `pool` is the room's full character list; `hint_count` is how many
/// non-target characters an elimination hint names.
pub fn resolve(
    kind: PowerUpKind,
    opponent: Option<&Character>,
    pool: &[Character],
    hint_count: usize,
    rng: &mut dyn RngCore,
) -> PowerUpEffect {
    match kind {
        PowerUpKind::RevealAttribute => reveal_attribute(opponent, rng),
        PowerUpKind::EliminationHint => {
            elimination_hint(opponent, pool, hint_count, rng)
        }
        PowerUpKind::DoubleQuestion => PowerUpEffect::DoubleQuestion {
            message: "You can ask two questions this turn, but you can't guess"
                .to_owned(),
        },
    }
}

fn reveal_attribute(
    opponent: Option<&Character>,
    rng: &mut dyn RngCore,
) -> PowerUpEffect {
    let Some(opponent) = opponent else {
        return nothing_to_reveal();
    };
    let eligible: Vec<_> = opponent
        .attributes
        .iter()
        .filter(|(key, _)| !METADATA_KEYS.contains(&key.as_str()))
        .collect();
    match eligible.choose(rng) {
        Some((attribute, value)) => PowerUpEffect::RevealAttribute {
            attribute: (*attribute).clone(),
            value: (*value).clone(),
        },
        None => nothing_to_reveal(),
    }
}

fn elimination_hint(
    opponent: Option<&Character>,
    pool: &[Character],
    hint_count: usize,
    rng: &mut dyn RngCore,
) -> PowerUpEffect {
    let Some(opponent) = opponent else {
        return nothing_to_reveal();
    };
    let others: Vec<&Character> =
        pool.iter().filter(|c| c.id != opponent.id).collect();
    if others.is_empty() || hint_count == 0 {
        return nothing_to_reveal();
    }
    let characters = others
        .choose_multiple(rng, hint_count)
        .map(|c| c.name.clone())
        .collect();
    PowerUpEffect::EliminationHint { characters }
}

fn nothing_to_reveal() -> PowerUpEffect {
    PowerUpEffect::NothingToReveal {
        message: "Nothing to reveal".to_owned(),
    }
}
