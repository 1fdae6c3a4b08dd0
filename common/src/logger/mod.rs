mod init;

pub use init::{LogSink, TRADES_TARGET, init_logger};
