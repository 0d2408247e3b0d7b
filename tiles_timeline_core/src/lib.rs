// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timeline entry selection and update scheduling for widget tiles.
//!
//! A tile provider describes what to show over time as a [`Timeline`]:
//! layout entries, each valid within an optional window. `tiles_timeline_core`
//! picks the entry to show now, works out when that choice goes stale, and
//! keeps a single alarm armed so the host is woken up to show the next one.
//! It is `no_std` compatible (with `alloc`) and performs no I/O of its own.
//!
//! # Architecture
//!
//! ```text
//!   Timeline ──► TimelineCache ◄── select / expiry ──┐
//!                                                    │
//!   Clock ──► TimelineManager::dispatch_next_layout ─┤
//!                    │                               │
//!                    ├──► AlarmScheduler (one pending alarm)
//!                    │        │
//!                    │        └──── fires ──► dispatch_next_layout
//!                    │
//!                    └──► Executor ──► Listener::on_layout_update(token, entry)
//! ```
//!
//! **[`timeline`]**: Entries, validity windows and the [`Timeline`]
//! collection.
//!
//! **[`cache`]**: Read-only index answering "what is active now", "what is
//! nearest" and "when does it expire".
//!
//! **[`manager`]**: The dispatch state machine with throttled alarm
//! rescheduling.
//!
//! **[`backend`]**: The collaborator traits a host implements: clock, alarm
//! scheduler, executor and listener.
//!
//! **[`time`]**: Epoch-millisecond instants and spans.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! manager instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//!
//! [`Timeline`]: timeline::Timeline

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod backend;
pub mod cache;
pub mod manager;
pub mod time;
pub mod timeline;
pub mod trace;
