mod kudos_error;
mod recovery;
mod storage_error;

pub use kudos_error::{KudosError, KudosResult};
pub use recovery::RecoveryAction;
pub use storage_error::{StorageError, StorageResult};
