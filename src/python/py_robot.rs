//! Robot bindings for Python.

use std::time::Duration;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::games::dipole::DipoleBoard;
use crate::robot::{RobotAlgorithm, RobotConfig, RobotDriver};

use super::py_core::PyMove;
use super::py_session::PySession;
use super::{search_err, session_err};

/// Python wrapper for RobotConfig.
#[pyclass(name = "RobotConfig")]
#[derive(Clone)]
pub struct PyRobotConfig(pub RobotConfig);

#[pymethods]
impl PyRobotConfig {
    /// Create a robot configuration.
    ///
    /// # Arguments
    /// - algorithm: "mcts" or "alphabeta" (default: "mcts")
    /// - iterations: MCTS iterations per move (default: 2000)
    /// - max_depth: alpha-beta depth limit (default: 4)
    /// - workers: parallel search workers (default: 1)
    /// - time_limit_ms: wall-clock limit per move (default: none)
    /// - seed: base seed for playouts (default: 42)
    #[new]
    #[pyo3(signature = (
        algorithm = "mcts",
        iterations = 2000,
        max_depth = 4,
        workers = 1,
        time_limit_ms = None,
        seed = 42
    ))]
    fn new(
        algorithm: &str,
        iterations: u32,
        max_depth: u32,
        workers: usize,
        time_limit_ms: Option<u64>,
        seed: u64,
    ) -> PyResult<Self> {
        let algorithm: RobotAlgorithm = algorithm.parse().map_err(PyValueError::new_err)?;
        let mut config = RobotConfig::default()
            .with_algorithm(algorithm)
            .with_iterations(iterations)
            .with_max_depth(max_depth)
            .with_workers(workers)
            .with_seed(seed);
        if let Some(ms) = time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        Ok(Self(config))
    }

    #[getter]
    fn iterations(&self) -> u32 {
        self.0.iterations
    }

    #[getter]
    fn max_depth(&self) -> u32 {
        self.0.max_depth
    }

    #[getter]
    fn workers(&self) -> usize {
        self.0.workers
    }

    fn __repr__(&self) -> String {
        format!(
            "RobotConfig(algorithm={:?}, iters={}, depth={}, workers={})",
            self.0.algorithm, self.0.iterations, self.0.max_depth, self.0.workers
        )
    }
}

/// A robot player driving searches on a worker thread.
#[pyclass(name = "Robot", unsendable)]
pub struct PyRobot {
    driver: RobotDriver<DipoleBoard>,
}

#[pymethods]
impl PyRobot {
    #[new]
    fn new(config: &PyRobotConfig) -> Self {
        Self {
            driver: RobotDriver::new(config.0.clone()),
        }
    }

    /// Search the session's position and play the answer.
    ///
    /// Returns None when the robot has no move. The GIL is released while
    /// the worker searches.
    fn play(&mut self, py: Python<'_>, session: &mut PySession) -> PyResult<Option<PyMove>> {
        self.driver
            .prepare_to_move(session.inner.board())
            .map_err(search_err)?;
        let driver = &mut self.driver;
        let reply = py.allow_threads(|| driver.wait());
        let played = match reply {
            Ok(reply) => match reply.into_move() {
                Some(mv) => session.inner.apply_robot_move(mv).map(|mv| Some(PyMove(mv))),
                None => Ok(None),
            },
            Err(err) => Err(err.into()),
        };
        self.driver.complete();
        played.map_err(session_err)
    }

    /// Forget cached alpha-beta results.
    fn clear_table(&self) {
        self.driver.clear_table();
    }

    fn __repr__(&self) -> String {
        format!("Robot(state={:?})", self.driver.state())
    }
}
