use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Board configuration is not playable")]
    InvalidConfig,
    #[error("Remote events can only be applied to an online session")]
    NotOnline,
    #[error("That player is driven by the other peer")]
    NotAuthoritative,
    #[error("AI preset chances must lie between 0 and 1")]
    InvalidPreset,
    #[error("Activation needs a center resolved by the originating peer")]
    UnresolvedCenter,
}

pub type Result<T> = core::result::Result<T, GameError>;
