//! File system watching for the replicator
//!
//! This crate provides:
//! - A change notifier for one watched file (`subscribe`)
//! - Mapping of backend events onto `OpKind`
//! - Minimum-interval debounce state

pub mod classify;
pub mod debounce;
pub mod notifier;

pub use classify::classify;
pub use debounce::{Debouncer, Decision};
pub use notifier::{subscribe, Notification, Subscription, SubscriptionFeed, WatchError};
