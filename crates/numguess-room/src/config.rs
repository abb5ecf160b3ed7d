//! Game configuration.

use crate::RoomError;

/// Range and attempt limits shared by both game modes.
///
/// The server builder holds one of these and hands copies to the room and
/// to every session, so both modes always play by the same rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Smallest number that can be drawn or guessed.
    pub low: i64,

    /// Largest number that can be drawn or guessed.
    pub high: i64,

    /// Attempts per player per round.
    pub max_attempts: u32,
}

impl GameConfig {
    /// Whether `value` is a legal guess.
    pub fn contains(&self, value: i64) -> bool {
        (self.low..=self.high).contains(&value)
    }

    /// Checks that a round can be played: the range holds at least one
    /// number and every player gets at least one attempt.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.low > self.high {
            return Err(RoomError::InvalidConfig(format!(
                "empty range {}..={}",
                self.low, self.high
            )));
        }
        if self.max_attempts == 0 {
            return Err(RoomError::InvalidConfig("max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            low: 1,
            high: 10,
            max_attempts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let config = GameConfig::default();
        assert_eq!((config.low, config.high, config.max_attempts), (1, 10, 5));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let config = GameConfig::default();
        assert!(config.contains(1));
        assert!(config.contains(10));
        assert!(!config.contains(0));
        assert!(!config.contains(11));
        assert!(!config.contains(-3));
    }

    #[test]
    fn test_validate() {
        assert!(GameConfig::default().validate().is_ok());

        let single = GameConfig {
            low: 4,
            high: 4,
            max_attempts: 1,
        };
        assert!(single.validate().is_ok());

        let inverted = GameConfig {
            low: 10,
            high: 1,
            ..GameConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(RoomError::InvalidConfig(_))));

        let no_attempts = GameConfig {
            max_attempts: 0,
            ..GameConfig::default()
        };
        assert!(matches!(no_attempts.validate(), Err(RoomError::InvalidConfig(_))));
    }
}
