pub mod assignment_controller;
pub mod capacity_controller;
pub mod coverage_controller;
pub mod route_controller;
pub mod territory_controller;
