//! Utilidades del sistema
//!
//! Manejo de errores y el núcleo de geometría.

pub mod errors;
pub mod geometry;
