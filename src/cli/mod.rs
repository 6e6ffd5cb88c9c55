mod args;
mod chunk;
mod index;
mod search;

pub use args::{Args, Command};
pub use chunk::run_chunk;
pub use index::{run_index, run_status, IndexOptions};
pub use search::{run_ask, run_query};
