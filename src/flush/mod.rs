mod jsonl;

pub use jsonl::flush_call_log;
