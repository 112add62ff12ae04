//! DASICS capability tables and the supervisor main-call gateway.
//!
//! The library and jump tables keep their allocation state only in the packed cfg
//! csrs. Nothing in here locks: every table is owned through `&mut`, and the global
//! instances in [`interface`] sit behind a `spin::Mutex`, so callers that can reach
//! the same hart's csrs from nested contexts have to take that lock.

pub mod interface;
pub mod jumpcfg;
pub mod layout;
pub mod libcfg;
pub mod maincall;
mod table;

pub use jumpcfg::JumpTable;
pub use layout::{BoundOrder, GatewayLayout, TableLayout};
pub use libcfg::{LibCfg, LibTable};
pub use maincall::{Gateway, MainCfg, ReturnState, SmaincallType};
pub use table::CapTable;
