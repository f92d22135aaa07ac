//! Delve Game Engine
//!
//! Platform-agnostic simulation core for Delve, a seeded turn-based dungeon
//! crawler. The crate owns map generation, combat, loot, progression and the
//! save format; rendering and input live with the caller.

pub mod ai;
pub mod attributes;
pub mod combat;
pub mod constants;
pub mod creature;
pub mod dice;
pub mod item;
pub mod loot;
pub mod narration;
pub mod numbers;
pub mod population;
pub mod procgen;
pub mod progression;
pub mod rng;
pub mod run;
pub mod save;
pub mod world;

// Re-export commonly used types
pub use attributes::{Attribute, AttributeSet};
pub use combat::{CombatLuckState, CombatMoment, CombatResult, PlayerAction, TurnOptions};
pub use creature::Creature;
pub use dice::{DiceError, DiceSpec, Roller};
pub use item::{EntityId, Item, ItemId, ItemKind, WieldSlot};
pub use loot::{ShopEntry, ShopEntryId, ShopServiceId};
pub use narration::{Caption, EnglishNarrator, LogEntry, LogEvent, LogLevel, Narrator, RunLog};
pub use population::{FloorChest, Mob};
pub use progression::{BuildChoice, BuildChoiceError, BuildChoiceKind, ShopRewardId};
pub use rng::{SeededRandom, make_seed_phrase};
pub use run::economy::{InventoryAction, InventoryLine, ShopLine};
pub use run::save::RunSave;
pub use run::{BossRewardPick, DungeonRun, LevelUpChoice, Overlay, RunState, RunStats};
pub use save::{
    SaveError, build_save_url, can_use_shareable_url, decode_save_token, encode_save_token,
    extract_save_token, extract_save_token_from_search, load_run_from_token,
};
pub use world::{Position, Room, Tile, WorldMap};

/// Slot name under which the most recent run is kept.
pub const LATEST_SAVE_SLOT: &str = "delve/latest-save/v1";

/// Trait for abstracting where save tokens are kept.
/// Platform-specific implementations should provide this
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store a token under `slot`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written.
    fn store_token(&self, slot: &str, token: &str) -> Result<(), Self::Error>;

    /// Read the token stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    fn load_token(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Forget the token under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be removed.
    fn delete_token(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Failure while saving or resuming through an [`Engine`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E: std::error::Error + 'static> {
    #[error("storage failed: {0}")]
    Storage(#[source] E),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Dice(#[from] DiceError),
}

/// Starts runs and moves them in and out of storage.
pub struct Engine<S>
where
    S: SaveStorage,
{
    storage: S,
}

impl<S> Engine<S>
where
    S: SaveStorage,
{
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Start a fresh run. A blank seed gets a generated phrase.
    ///
    /// # Errors
    ///
    /// Returns an error if the first floor cannot be populated.
    pub fn new_run(&self, seed: &str) -> Result<DungeonRun, EngineError<S::Error>> {
        Ok(DungeonRun::new(seed)?)
    }

    /// Encode `run` and store it under `slot`, returning the token.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or storage fails.
    pub fn save_run(&self, slot: &str, run: &DungeonRun) -> Result<String, EngineError<S::Error>> {
        let token = encode_save_token(run)?;
        self.storage
            .store_token(slot, &token)
            .map_err(EngineError::Storage)?;
        Ok(token)
    }

    /// Resume the run stored under `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the stored token does not decode.
    pub fn load_run(&self, slot: &str) -> Result<Option<DungeonRun>, EngineError<S::Error>> {
        let Some(token) = self.storage.load_token(slot).map_err(EngineError::Storage)? else {
            return Ok(None);
        };
        Ok(Some(load_run_from_token(&token)?))
    }

    /// Drop the run stored under `slot`.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails.
    pub fn delete_run(&self, slot: &str) -> Result<(), EngineError<S::Error>> {
        self.storage.delete_token(slot).map_err(EngineError::Storage)
    }

    /// Store `run` as the latest save.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or storage fails.
    pub fn save_latest(&self, run: &DungeonRun) -> Result<String, EngineError<S::Error>> {
        self.save_run(LATEST_SAVE_SLOT, run)
    }

    /// Resume the latest save, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage fails or the token does not decode.
    pub fn load_latest(&self) -> Result<Option<DungeonRun>, EngineError<S::Error>> {
        self.load_run(LATEST_SAVE_SLOT)
    }
}
