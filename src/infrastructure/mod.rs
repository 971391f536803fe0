pub mod console;
pub mod http;
pub mod observability;
pub mod storage;
