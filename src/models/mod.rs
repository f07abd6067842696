//! Modelos del sistema
//!
//! Geometría, rutas con su geocerca y capacidad, tareas, depósitos y las
//! vistas de capacidad que expone el ledger.

pub mod capacity;
pub mod depot;
pub mod geo;
pub mod route;
pub mod task;
