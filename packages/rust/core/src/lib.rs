//! Stage logic for the editorial content pipeline.
//!
//! Each stage reads and writes files under the incoming/staging trees and
//! returns a [`ScriptReport`](editorial_shared::ScriptReport). Expected
//! problems (missing fields, unreadable assets) are reported in the value;
//! only unexpected I/O surfaces as `Err`.

pub mod assets;
pub mod batch;
pub mod capabilities;
pub mod finalize;
pub mod io;
pub mod mood;
pub mod post;
pub mod review;
pub mod sidecar;
pub mod suggest;

pub use capabilities::Capabilities;
