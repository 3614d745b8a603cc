// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific thread types for cross-platform compatibility.
//!
//! This module re-exports the thread API that actually allocates platform
//! threads. On native targets this is `std::thread`; on WebAssembly it is
//! `wasm_thread`, which backs each thread with a web worker.
//!
//! The [`Builder`] type is what [`PendingThread::start`](crate::PendingThread::start)
//! drives; [`JoinHandle`] is re-exported at the crate root since it appears in
//! that method's signature.

#[cfg(not(target_arch = "wasm32"))]
pub use std::thread::{Builder, JoinHandle};
#[cfg(target_arch = "wasm32")]
pub use wasm_thread::{Builder, JoinHandle};
