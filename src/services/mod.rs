pub mod analysis_service;
pub mod auth_service;
pub mod chat_service;
pub mod gemini_service;
pub mod report_service;
pub mod timeline_service;
pub mod verification_service;
pub mod vitals_service;
