// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `std` host backend for tiles timeline managers.
//!
//! This crate provides the collaborators a
//! [`TimelineManager`](tiles_timeline_core::manager::TimelineManager) needs
//! when it runs inside an ordinary single-threaded event loop:
//!
//! - [`SystemClock`]: wall-clock epoch milliseconds from `CLOCK_REALTIME`
//! - [`AlarmQueue`]: deadline-ordered alarms the loop fires with
//!   [`run_due`](AlarmQueue::run_due)
//! - [`QueuedExecutor`]: bounded FIFO of listener notifications drained with
//!   [`run_pending`](QueuedExecutor::run_pending)
//!
//! A typical loop body:
//!
//! ```rust,ignore
//! let wait = alarms.time_until_next(now());
//! wait_for_host_events(wait);
//! alarms.run_due(now());
//! executor.run_pending();
//! ```

mod alarm;
mod executor;
mod time;

pub use alarm::AlarmQueue;
pub use executor::QueuedExecutor;
pub use tiles_timeline_core::backend::InlineExecutor;
pub use time::{SystemClock, now};
