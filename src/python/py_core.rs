//! `PlayerId` and `Move` as Python values.

use pyo3::prelude::*;

use crate::core::{Move, PlayerId};

use super::parse_err;

/// A seat, printed `P<n>`.
#[pyclass(name = "PlayerId", frozen, eq, hash)]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PyPlayerId(pub PlayerId);

#[pymethods]
impl PyPlayerId {
    #[new]
    fn new(seat: u8) -> Self {
        Self(PlayerId::new(seat))
    }

    #[getter]
    fn index(&self) -> usize {
        self.0.index()
    }

    fn __repr__(&self) -> String {
        format!("PlayerId('{}')", self.0)
    }

    fn __str__(&self) -> String {
        self.0.to_string()
    }
}

/// A move. Two moves compare equal when they name the same action; the
/// sequence number and captures are ignored.
#[pyclass(name = "Move")]
#[derive(Clone, Debug)]
pub struct PyMove(pub Move);

#[pymethods]
impl PyMove {
    /// Decode a move from its wire text, e.g. `"move C 1 D 2 P0"`.
    #[new]
    fn new(text: &str) -> PyResult<Self> {
        Move::decode(text).map(Self).map_err(parse_err)
    }

    #[getter]
    fn op(&self) -> &'static str {
        self.0.op.name()
    }

    #[getter]
    fn player(&self) -> PyPlayerId {
        PyPlayerId(self.0.player)
    }

    #[getter]
    fn index(&self) -> Option<u32> {
        self.0.index
    }

    #[getter]
    fn captures(&self) -> Option<u8> {
        self.0.captures
    }

    /// The wire text.
    fn encode(&self) -> String {
        self.0.encode()
    }

    fn __repr__(&self) -> String {
        format!("Move('{}')", self.0.encode())
    }

    fn __str__(&self) -> String {
        self.0.to_string()
    }

    fn __eq__(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
