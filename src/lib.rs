//! Motor de territorios y capacidad de rutas
//!
//! Decide qué ruta atiende cada tarea de entrega según su geocerca y mantiene
//! la carga de cada ruta bajo su límite, también con peticiones concurrentes.

pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
