//! Python bindings for the rust-dipole engine.
//!
//! Exposes the authoritative session and the robot to Python harnesses
//! (tournament runners, replay checkers).
//!
//! # Quick Start
//!
//! ```python
//! import rust_dipole as dp
//!
//! session = dp.Session("dipole 2 734687 1")
//! session.apply("start P0")
//! robot = dp.Robot(dp.RobotConfig(iterations=500))
//!
//! while not session.is_over():
//!     if robot.play(session) is None:
//!         break
//!
//! print(session.transcript())
//! assert session.verify_replay() == session.digest()
//! ```

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use crate::core::{ParseError, SearchError, SessionError};

mod py_core;
mod py_robot;
mod py_session;

pub use py_core::*;
pub use py_robot::*;
pub use py_session::*;

pub(crate) fn parse_err(err: ParseError) -> PyErr {
    PyErr::new::<PyValueError, _>(err.to_string())
}

pub(crate) fn session_err(err: SessionError) -> PyErr {
    match err {
        SessionError::Parse(_) | SessionError::Game(_) | SessionError::ReplayLine { .. } => {
            PyErr::new::<PyValueError, _>(err.to_string())
        }
        _ => PyErr::new::<PyRuntimeError, _>(err.to_string()),
    }
}

pub(crate) fn search_err(err: SearchError) -> PyErr {
    PyErr::new::<PyRuntimeError, _>(err.to_string())
}

/// rust-dipole: a Dipole engine with replayable sessions and robots.
#[pymodule]
fn rust_dipole(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Core types
    m.add_class::<PyPlayerId>()?;
    m.add_class::<PyMove>()?;

    // Sessions
    m.add_class::<PySession>()?;

    // Robots
    m.add_class::<PyRobotConfig>()?;
    m.add_class::<PyRobot>()?;

    Ok(())
}
