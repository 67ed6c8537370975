pub mod completion_service;
pub mod document_service;
pub mod quiz_extractor;
pub mod quiz_service;
