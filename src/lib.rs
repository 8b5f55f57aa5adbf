pub mod app;
pub mod config;
pub mod error;
pub mod seed;
pub mod models {
    pub mod document;
    pub mod filter;
}
pub mod library {
    pub mod filter;
    pub mod pagination;
    pub mod prompts;
    pub mod store;
}
pub mod db {
    pub mod repository;
}
pub mod llm {
    pub mod client;
}
pub mod rag {
    pub mod client;
}
pub mod chat {
    pub mod ask;
    pub mod client;
    pub mod document_qa;
    pub mod session;
    pub mod sources;
}
pub mod upload {
    pub mod documents;
}
pub mod excel {
    pub mod analysis;
    pub mod model;
    pub mod parser;
    pub mod samples;
}
pub mod api {
    pub mod documents;
    pub mod errors;
    pub mod excel;
    pub mod health;
    pub mod upload;
}
