//! Authoritative game sessions: apply, undo, log and replay.
//!
//! ```
//! use rust_dipole::core::{Move, ReplayMode};
//! use rust_dipole::session::Session;
//!
//! let mut session = Session::from_init_str("dipole 2 734687 1").unwrap();
//! session.apply(Move::decode("start P0").unwrap(), ReplayMode::Live).unwrap();
//! session.apply(Move::decode("move C 1 D 2 P0").unwrap(), ReplayMode::Live).unwrap();
//! assert_eq!(session.transcript(), vec!["1 start P0", "2 move C 1 D 2 P0"]);
//! session.verify_replay().unwrap();
//! ```

pub mod controller;
pub mod log;

pub use controller::Session;
pub use log::LogEntry;
