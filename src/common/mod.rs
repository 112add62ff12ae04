#[macro_use]
pub mod utils;
#[macro_use]
pub mod console;
pub mod logging;
pub mod sbi;
pub mod structures;
