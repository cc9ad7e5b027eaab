//! A player inside a room.

use std::collections::BTreeMap;

use guestquest_catalog::Character;
use guestquest_protocol::{PlayerId, PlayerSummary, PowerUpKind};

use crate::GameError;

/// Accepted name length, in characters.
const NAME_LEN: std::ops::RangeInclusive<usize> = 3..=20;

/// One seat at the table.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    /// Secret character, assigned at game start.
    pub character: Option<Character>,
    /// Remaining uses per power-up kind.
    pub power_ups: BTreeMap<PowerUpKind, u32>,
    /// Set when a power-up is spent; blocks power-ups on the player's
    /// next turn.
    pub power_up_cooldown: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ready: false,
            character: None,
            power_ups: BTreeMap::new(),
            power_up_cooldown: false,
        }
    }

    /// Remaining uses of `kind` (0 for anything not granted).
    pub fn remaining(&self, kind: PowerUpKind) -> u32 {
        self.power_ups.get(&kind).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            ready: self.ready,
        }
    }

    /// Prepares the player for a new game.
    pub(crate) fn deal(&mut self, character: Character) {
        self.character = Some(character);
        self.power_ups = PowerUpKind::starting_counts();
        self.power_up_cooldown = false;
    }

    /// Drops everything that only makes sense during a game.
    pub(crate) fn clear_game_state(&mut self) {
        self.character = None;
        self.power_ups.clear();
        self.power_up_cooldown = false;
    }
}

/// Checks a requested player name: 3-20 ASCII letters or digits.
pub fn validate_name(name: &str) -> Result<(), GameError> {
    let len = name.chars().count();
    if NAME_LEN.contains(&len) && name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(GameError::InvalidName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_alphanumeric() {
        assert!(validate_name("Bob").is_ok());
        assert!(validate_name("Player42").is_ok());
        assert!(validate_name("abcdefghijklmnopqrst").is_ok());
    }

    #[test]
    fn test_validate_name_rejects_bad_names() {
        assert_eq!(validate_name("Al"), Err(GameError::InvalidName));
        assert_eq!(validate_name("abcdefghijklmnopqrstu"), Err(GameError::InvalidName));
        assert_eq!(validate_name("Bob Smith"), Err(GameError::InvalidName));
        assert_eq!(validate_name("Zoë1"), Err(GameError::InvalidName));
        assert_eq!(validate_name(""), Err(GameError::InvalidName));
    }

    #[test]
    fn test_remaining_defaults_to_zero() {
        let mut player = Player::new(PlayerId(1), "Alice");
        assert_eq!(player.remaining(PowerUpKind::DoubleQuestion), 0);

        player.power_ups = PowerUpKind::starting_counts();
        assert_eq!(player.remaining(PowerUpKind::DoubleQuestion), 1);

        player.clear_game_state();
        assert_eq!(player.remaining(PowerUpKind::DoubleQuestion), 0);
    }
}
