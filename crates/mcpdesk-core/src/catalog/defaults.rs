//! Built-in catalog used when the remote document is unavailable or yields nothing.

use crate::types::{CatalogRecord, Category, SourceType};

struct DefaultServer {
    name: &'static str,
    description: &'static str,
    category: Category,
    source_type: SourceType,
    env_vars: &'static [&'static str],
    args: &'static [&'static str],
}

const DEFAULT_SERVERS: &[DefaultServer] = &[
    DefaultServer {
        name: "AWS KB Retrieval",
        description: "Retrieval from AWS Knowledge Base using Bedrock Agent Runtime",
        category: Category::Search,
        source_type: SourceType::Reference,
        env_vars: &["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY", "AWS_REGION"],
        args: &["--kb-id"],
    },
    DefaultServer {
        name: "Brave Search",
        description: "Web and local search using Brave's Search API",
        category: Category::Search,
        source_type: SourceType::Reference,
        env_vars: &["BRAVE_API_KEY"],
        args: &["--count"],
    },
    DefaultServer {
        name: "EverArt",
        description: "AI image generation using various models",
        category: Category::Vision,
        source_type: SourceType::Reference,
        env_vars: &["EVERART_API_KEY"],
        args: &["--model", "--size"],
    },
    DefaultServer {
        name: "Filesystem",
        description: "Secure file operations with configurable access controls",
        category: Category::Document,
        source_type: SourceType::Reference,
        env_vars: &[],
        args: &["--root", "--readonly"],
    },
    DefaultServer {
        name: "GitHub",
        description: "Repository management, file operations, and GitHub API integration",
        category: Category::Git,
        source_type: SourceType::Reference,
        env_vars: &["GITHUB_TOKEN"],
        args: &["--repo", "--owner"],
    },
    DefaultServer {
        name: "Aiven",
        description: "Navigate Aiven projects and interact with PostgreSQL, Kafka, ClickHouse and OpenSearch",
        category: Category::Database,
        source_type: SourceType::Official,
        env_vars: &["AIVEN_TOKEN"],
        args: &["--project"],
    },
    DefaultServer {
        name: "Apify",
        description: "Use 3,000+ pre-built cloud tools to extract data from websites",
        category: Category::Web,
        source_type: SourceType::Official,
        env_vars: &["APIFY_API_KEY"],
        args: &[],
    },
    DefaultServer {
        name: "Cloudflare",
        description: "Deploy, configure & interrogate Cloudflare developer platform resources",
        category: Category::Web,
        source_type: SourceType::Official,
        env_vars: &["CLOUDFLARE_API_TOKEN"],
        args: &[],
    },
    DefaultServer {
        name: "Stripe",
        description: "Interact with Stripe API",
        category: Category::Database,
        source_type: SourceType::Official,
        env_vars: &["STRIPE_API_KEY"],
        args: &[],
    },
    DefaultServer {
        name: "Tavily",
        description: "Search engine for AI agents (search + extract)",
        category: Category::Search,
        source_type: SourceType::Official,
        env_vars: &["TAVILY_API_KEY"],
        args: &["--max-results"],
    },
];

pub fn default_catalog() -> Vec<CatalogRecord> {
    DEFAULT_SERVERS
        .iter()
        .map(|server| {
            let mut record = CatalogRecord::new(
                server.name,
                server.description,
                server.category,
                server.source_type,
            );
            record.env_vars = server.env_vars.iter().map(|s| s.to_string()).collect();
            record.args = server.args.iter().map(|s| s.to_string()).collect();
            record
        })
        .collect()
}
