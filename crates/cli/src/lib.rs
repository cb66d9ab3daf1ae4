//! Single-file SFTP replicator
//!
//! Watches one local file and copies it in full to a remote host over SFTP
//! whenever it is written, at most once per configured interval.

pub mod cmd;
pub mod coordinator;
pub mod daemon;
pub mod util;
