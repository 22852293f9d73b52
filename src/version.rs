// Version information for the Medical RAG Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-session-memory-2025-08-07";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2025-08-07";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "session-memory",
    "pinecone-retrieval",
    "groq-generation",
    "onnx-embeddings",
    "rate-limiting",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Medical RAG Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
