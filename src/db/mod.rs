mod load;
mod migrate;

pub use load::load_call_log;
pub use migrate::migrate;
