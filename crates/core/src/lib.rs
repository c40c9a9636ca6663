//! # QuickCreate Core
//!
//! Domain types shared by every QuickCreate crate: exercises, accounts,
//! sub-accounts, products, configuration and the sub-account code
//! transformer.
//!
//! ```rust
//! use quickcreate_core::code::transform;
//!
//! // "570.1" is shorthand for sub-account 1 under account 570
//! assert_eq!(transform("570.1", 10), "5700000001");
//! ```

pub mod account;
pub mod code;
pub mod config;
pub mod error;
pub mod exercise;
pub mod product;

pub use account::{Account, NewAccount, NewSubAccount, SubAccount};
pub use code::{transform, DEFAULT_CODE_LENGTH, MAX_SUFFIX};
pub use config::QuickCreateConfig;
pub use error::{CoreError, CoreResult};
pub use exercise::{Exercise, ExerciseState};
pub use product::{LookupOption, NewProduct, Product, VatException};
