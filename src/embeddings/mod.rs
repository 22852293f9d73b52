// Embeddings module
// Local all-MiniLM-L6-v2 inference producing the query vectors sent to Pinecone

pub mod model_manager;
pub mod onnx_model;

pub use model_manager::{EmbeddingModelConfig, EmbeddingModelManager};
pub use onnx_model::OnnxEmbeddingModel;
