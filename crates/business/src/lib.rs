//! # QuickCreate Business
//!
//! Business logic layer - sub-account allocation, search, product
//! quick-create and the action-dispatched API on top of them.

pub mod allocator;
pub mod api;
pub mod error;
pub mod product;
pub mod search;
pub mod services;

pub use allocator::{CreateSubAccount, ParentRef, SubAccountService};
pub use api::{ApiRequest, ApiResponse, ApiStatus, QuickCreateApi};
pub use error::{BusinessError, BusinessResult};
pub use product::{CreateProduct, ProductService};
pub use search::{AccountSummary, SearchService, SubAccountHit, SubAccountSearch};
pub use services::{KeyedLocks, ServiceContext};
