//! DTOs de la API HTTP (JSON en camelCase)

pub mod api_response;
pub mod assignment_dto;
pub mod capacity_dto;
pub mod coverage_dto;
pub mod route_dto;
pub mod territory_dto;
