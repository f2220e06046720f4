//! Migration files and migrators.
//!
//! A migration file names a Terraform working directory and a list of state
//! actions. A [`StateMigrator`] pulls the state once, folds the actions over
//! a working copy, plans the result, and on apply pushes it back:
//!
//! | Step | Plan | Apply |
//! |------|------|-------|
//! | pull current state | yes | yes |
//! | run actions on a working copy | yes | yes |
//! | plan against the working copy | yes | yes |
//! | push the working copy | no | yes |

pub mod error;
pub mod file;
pub mod migrator;

pub use error::MigrationError;
pub use file::{MigrationBlock, MigrationConfig, MigrationFile, MigrationKind};
pub use migrator::{Migrator, StateMigrator};
