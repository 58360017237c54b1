pub mod chart_service;
pub mod form_service;
pub mod health_service;
pub mod tab_service;
