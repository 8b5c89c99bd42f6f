//! HTTP adapter for survey endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    AnalyzeRequest, AnalyzeResponse, ErrorResponse, HealthResponse, ServiceStatusResponse,
    SummaryResponse,
};
pub use handlers::SurveyHandlers;
pub use routes::survey_routes;
