//! Player-facing texts.

use crate::{GameConfig, Hint};

/// Something the server tells a player.
///
/// Game code deals in `Notice`s; the text is only produced at the edge,
/// from the active [`GameConfig`], right before it goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ModePrompt,
    UnknownMode,
    SingleWelcome,
    MultiWelcome,
    Hint(Hint),
    OutOfRange,
    InvalidInput,
    /// This player has no attempts left.
    Exhausted,
    /// This player guessed the shared number; a new round starts.
    YouWon,
    /// Another player guessed the shared number; a new round starts.
    SomeoneWon,
    /// Nobody guessed the shared number; a new round starts.
    EveryoneExhausted,
}

impl Notice {
    pub fn render(&self, config: &GameConfig) -> String {
        let GameConfig {
            low,
            high,
            max_attempts,
        } = *config;
        match self {
            Self::ModePrompt => "Choose game mode: '1' for single player, \
                '2' for multi player, 'exit' to terminate:"
                .to_string(),
            Self::UnknownMode => {
                "Unknown game mode! Choose '1', '2' or 'exit'.".to_string()
            }
            Self::SingleWelcome => format!(
                "You have a total of {max_attempts} attempts. Enter 'exit' to \
                 prematurely leave the game. Guess a number between {low} to {high}:"
            ),
            Self::MultiWelcome => format!(
                "Multi player game started! Each player has {max_attempts} \
                 attempts. Enter 'exit' to prematurely leave the game. Guess a \
                 number between {low} to {high}:"
            ),
            Self::Hint(Hint::TooSmall) => {
                "Hint: You guessed too small! Guess again: ".to_string()
            }
            Self::Hint(Hint::TooHigh) => {
                "Hint: You guessed too high! Guess again: ".to_string()
            }
            Self::Hint(Hint::Correct) => "Congratulations, you did it!".to_string(),
            Self::OutOfRange => {
                format!("Choose a number between {low} to {high}! Guess again: ")
            }
            Self::InvalidInput => format!(
                "Invalid input! Choose a number between {low} to {high} or type \
                 'exit' to quit."
            ),
            Self::Exhausted => "Sorry, you've used all of your attempts!".to_string(),
            Self::YouWon => format!(
                "Congratulations, you did it! Starting a new game with a new \
                 number.\nEnter 'exit' to prematurely leave the game.\nAll \
                 clients have {max_attempts} new attempts! Guess a number \
                 between {low} to {high}:"
            ),
            Self::SomeoneWon => format!(
                "Congratulations, someone guessed the correct number! Starting \
                 a new game with a new number.\nEnter 'exit' to prematurely \
                 leave the game.\nAll clients have {max_attempts} new attempts! \
                 Guess a number between {low} to {high}: "
            ),
            Self::EveryoneExhausted => format!(
                "Everyone has used all of their attempts without guessing the \
                 correct number!\nEnter 'exit' to prematurely leave the game.\n\
                 Starting a new game with a new number. All clients have \
                 {max_attempts} new attempts!\nGuess a number between {low} to \
                 {high}: "
            ),
        }
    }
}
