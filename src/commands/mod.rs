//! CLI command implementations
//!
//! Every command that touches hardware takes an opened [`FlashHandle`]
//! (`srlock_flash::FlashHandle`); the list commands only print static
//! tables.

mod identify;
mod list;
mod lock;
mod status;

pub use identify::cmd_identify;
pub use list::{list_models, list_programmers};
pub use lock::{cmd_check, cmd_lock};
pub use status::cmd_status;
