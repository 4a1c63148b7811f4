//! # Research Session Example
//!
//! Uploads a handful of papers into a session, one of them corrupted, then
//! retrieves evidence for a few questions and resets the session.
//!
//! Uses the offline `HashingEmbedder`, so it needs no model download.
//!
//! Run: `cargo run --example session_basic [config.json]`
//! Log level: `RUST_LOG=scholar_rag=debug`

use std::collections::HashSet;
use std::sync::Arc;

use scholar_rag::{DOC_TYPE_KEY, HashingEmbedder, RagConfig, ResearchSession, SourceDocument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn sample_documents() -> Vec<SourceDocument> {
    vec![
        SourceDocument::new(
            "vitamin_d_trial.txt",
            "Background: Vitamin D deficiency is common in older adults.\n\n\
             Methods: We randomised 2,000 participants aged over 65 to 2,000 IU of \
             vitamin D3 daily or placebo for three years.\n\n\
             Results: Supplementation did not reduce the incidence of fractures \
             (hazard ratio 0.98) but modestly reduced falls in participants with \
             baseline deficiency.",
        )
        .with_metadata(DOC_TYPE_KEY, "Randomised Controlled Trial"),
        SourceDocument::new("scanned_appendix.pdf", b"%PDF-1.4\n%broken".to_vec()),
        SourceDocument::new(
            "sleep_review.md",
            "# Sleep and cognition\n\n\
             Across 42 studies, restricting sleep to under six hours impaired working \
             memory and sustained attention. Effects were larger in adolescents than \
             in adults, and recovery sleep restored attention but not memory within \
             one night.",
        )
        .with_metadata(DOC_TYPE_KEY, "Systematic Review"),
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scholar_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting research session demo");

    // -- 1. Configure ------------------------------------------------------
    let config = match std::env::args().nth(1) {
        Some(path) => RagConfig::from_json_file(path)?,
        None => RagConfig::builder().chunk_size(200).chunk_overlap(40).top_k(3).build()?,
    };

    // -- 2. Start a session ------------------------------------------------
    let session = ResearchSession::new(config, Arc::new(HashingEmbedder::default()))?;
    println!("Session {}", session.id());

    // -- 3. Upload documents -----------------------------------------------
    let report = session.ingest_all(sample_documents()).await;
    for outcome in &report.outcomes {
        match &outcome.error {
            None => println!("  {} → {} chunk(s)", outcome.filename, outcome.chunks_indexed),
            Some(error) => println!("  {} → skipped: {error}", outcome.filename),
        }
    }
    println!("Status: {}", serde_json::to_string_pretty(&session.status().await)?);

    // -- 4. Retrieve evidence ----------------------------------------------
    let questions = [
        "Does vitamin D prevent fractures in older adults?",
        "How does sleep restriction affect memory?",
    ];
    for question in questions {
        println!("\nQuestion: {question}");
        for hit in session.retrieve_default(question).await? {
            let preview: String = hit.text().chars().take(70).collect();
            println!(
                "  [{:.4}] {} #{} | {preview}",
                hit.distance,
                hit.source(),
                hit.chunk_index()
            );
        }
    }

    let reviews = HashSet::from(["Systematic Review".to_string()]);
    println!("\nReviews only: {}", questions[0]);
    for hit in session.retrieve_filtered(questions[0], 2, &reviews).await? {
        println!("  [{:.4}] {} #{}", hit.distance, hit.source(), hit.chunk_index());
    }

    let evidence = session.evidence(questions[0]).await?;
    println!(
        "\nEvidence block ({} included, {} omitted):\n{}",
        evidence.included, evidence.omitted, evidence.text
    );

    // -- 5. Reset ----------------------------------------------------------
    session.reset().await?;
    println!("After reset: {} entries", session.status().await.entries);

    Ok(())
}
