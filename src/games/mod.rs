//! Game implementations.

pub mod dipole;
