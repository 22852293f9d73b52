// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use medical_rag_node::{
    api::{self, AppState},
    config::AppConfig,
    embeddings::{EmbeddingModelConfig, EmbeddingModelManager},
    llm::{GroqClient, GroqConfig},
    memory::{MemoryStore, MemoryStoreConfig, SessionConfig},
    rag::{RagChain, Retriever},
    vector::PineconeClient,
    version,
};
use std::{env, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    // Load .env before reading configuration
    dotenv::dotenv().ok();

    println!("🚀 Starting Medical RAG Node...\n");
    println!("📦 BUILD VERSION: {}", version::VERSION);
    println!("📅 Build Date: {}", version::BUILD_DATE);
    println!();

    let config = AppConfig::from_env()?;

    // Initialize the embedding model (downloads from the Hub on first run)
    println!("🧠 Initializing embedding model...");
    let embedding_config = EmbeddingModelConfig {
        model_dir: config.embedding_model_dir.clone(),
        ..Default::default()
    };
    let embeddings = Arc::new(EmbeddingModelManager::new(embedding_config).await?);
    println!(
        "✅ Embedding model ready: {} ({}D)",
        embeddings.model_name(),
        embeddings.dimension()
    );

    // Connect to the hosted vector index
    println!("🗂️  Connecting to vector index...");
    let pinecone = Arc::new(PineconeClient::new(
        &config.pinecone_index_host,
        &config.pinecone_api_key,
        &config.pinecone_namespace,
    )?);
    match pinecone.describe_index_stats().await {
        Ok(stats) => {
            println!(
                "✅ Vector index reachable ({} vectors, {}D)",
                stats.total_vector_count, stats.dimension
            );
        }
        Err(e) => {
            println!("⚠️  Vector index not reachable at startup: {}", e);
            println!("   The node will start; retrieval will fail until the index is back.");
        }
    }

    // Hosted chat model client
    let groq = Arc::new(GroqClient::new(GroqConfig {
        api_url: config.groq_api_url.clone(),
        api_key: config.groq_api_key.clone(),
        model: config.groq_model.clone(),
        temperature: config.llm_temperature,
        max_tokens: config.llm_max_tokens,
        request_timeout: Duration::from_secs(60),
    })?);
    println!("✅ Chat model client ready: {}", groq.model());

    // Assemble the retrieval chain
    let retriever = Arc::new(Retriever::new(
        embeddings.clone(),
        pinecone.clone(),
        config.retrieval_top_k,
    ));
    let chain = Arc::new(RagChain::new(retriever, groq));

    // Session memory store with background cleanup
    let memory = Arc::new(MemoryStore::new(MemoryStoreConfig {
        max_sessions: config.max_sessions,
        session: SessionConfig {
            timeout_seconds: config.session_ttl.as_secs(),
            ..Default::default()
        },
        ..Default::default()
    }));

    let cleanup_store = memory.clone();
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(cleanup_store.cleanup_interval_seconds()));
        loop {
            interval.tick().await;
            cleanup_store.cleanup_expired().await;
        }
    });

    let state = AppState::new(
        memory,
        chain,
        config.memory_context_limit,
        embeddings.model_name().to_string(),
        config.rate_limit_per_minute,
    );

    // Print node information
    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 Medical RAG Node is running!");
    println!("{}", separator);
    println!("Listen Addr:    {}", config.listen_addr);
    println!("Chat Model:     {}", config.groq_model);
    println!("Retrieval:      top-{} similarity", config.retrieval_top_k);
    println!("Memory Window:  last {} turns", config.memory_context_limit);
    println!("\nAPI Endpoints:");
    println!("  New chat:     GET  /");
    println!("  Chat:         POST /v1/chat");
    println!("  Health:       GET  /health");
    println!("  Metrics:      GET  /metrics");
    println!("\nTest with curl:");
    println!("  curl -X POST http://localhost:8080/v1/chat \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"message\": \"What causes acne?\"}}'");
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    api::start_server(&config.listen_addr, state).await?;

    println!("👋 Goodbye!");
    Ok(())
}
