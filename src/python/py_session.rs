//! Session bindings for Python.

use pyo3::prelude::*;

use crate::core::{CellRef, Coord, Move, PlayerId, ReplayMode};
use crate::session::Session;

use super::py_core::{PyMove, PyPlayerId};
use super::{parse_err, session_err};

/// Python wrapper for Session.
#[pyclass(name = "Session")]
pub struct PySession {
    pub(crate) inner: Session,
}

#[pymethods]
impl PySession {
    /// Start a session from `"<variant> <players> <seed> <revision>"`.
    #[new]
    fn new(init: &str) -> PyResult<Self> {
        Session::from_init_str(init)
            .map(|inner| Self { inner })
            .map_err(session_err)
    }

    /// Rebuild a session from its init string and log lines.
    #[staticmethod]
    fn replay(init: &str, lines: Vec<String>) -> PyResult<Self> {
        Session::replay(init, lines)
            .map(|inner| Self { inner })
            .map_err(session_err)
    }

    /// Apply a move given as wire text. Returns the logged move.
    #[pyo3(signature = (text, replay = false))]
    fn apply(&mut self, text: &str, replay: bool) -> PyResult<PyMove> {
        let mv = Move::decode(text).map_err(parse_err)?;
        let mode = if replay { ReplayMode::Replay } else { ReplayMode::Live };
        self.inner.apply(mv, mode).map(PyMove).map_err(session_err)
    }

    /// Take back the last logged move.
    fn undo(&mut self) -> PyResult<PyMove> {
        self.inner.undo().map(PyMove).map_err(session_err)
    }

    fn legal_moves(&self, player: u8) -> Vec<PyMove> {
        self.inner
            .legal_moves(PlayerId::new(player))
            .into_iter()
            .map(PyMove)
            .collect()
    }

    /// Whether a legal move touches board cell `col`/`row` (1-based row).
    fn is_legal_target(&self, col: char, row: u32) -> bool {
        Coord::from_letter(col, row)
            .is_some_and(|coord| self.inner.is_legal_target(CellRef::Board(coord)))
    }

    fn phase(&self) -> &'static str {
        self.inner.phase().name()
    }

    fn phase_description(&self) -> String {
        self.inner.phase_description()
    }

    fn whose_turn(&self) -> PyPlayerId {
        PyPlayerId(self.inner.whose_turn())
    }

    fn digest(&self) -> u64 {
        self.inner.digest()
    }

    fn is_over(&self) -> bool {
        self.inner.is_over()
    }

    /// `"P0 wins"`, `"draw"`, or None while the game runs.
    fn result(&self) -> Option<String> {
        self.inner.result().map(ToString::to_string)
    }

    fn transcript(&self) -> Vec<String> {
        self.inner.transcript()
    }

    /// Replay the log and return the digest both sessions agree on.
    fn verify_replay(&self) -> PyResult<u64> {
        self.inner.verify_replay().map_err(session_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "Session('{}', moves={}, phase={})",
            self.inner.init(),
            self.inner.log().len(),
            self.inner.phase()
        )
    }

    fn __str__(&self) -> String {
        self.inner.board().to_string()
    }
}
