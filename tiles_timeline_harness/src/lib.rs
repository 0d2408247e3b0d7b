// Copyright 2026 the Tiles Timeline Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated time for driving timeline managers deterministically.
//!
//! - [`FakeClock`]: a settable [`Clock`](tiles_timeline_core::backend::Clock).
//! - [`ManualAlarmScheduler`]: alarms that fire only when asked, with a
//!   history of every registration and the ability to replay cancelled
//!   alarms as a scheduler that ignores cancellation would.
//! - [`RecordingListener`]: keeps every layout update it receives.
//! - [`Simulation`]: advances the clock, firing due alarms in deadline order.

#![no_std]

extern crate alloc;

mod alarms;
mod clock;
mod listener;
mod simulation;

pub use alarms::{AlarmRecord, ManualAlarmScheduler};
pub use clock::FakeClock;
pub use listener::{Delivery, RecordingListener};
pub use simulation::Simulation;
