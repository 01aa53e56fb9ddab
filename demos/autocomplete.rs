//! Autocomplete Example
//!
//! Builds a weighted dictionary, saves it, maps it back and serves queries.
//!
//! ```bash
//! RUST_LOG=alice_trie=debug cargo run --example autocomplete
//! ```

use alice_trie::{KeySet, SearchAgent, TrieIndex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== ALICE-Trie Autocomplete Demo ===\n");

    let words = [
        ("in", 40.0),
        ("inter", 5.0),
        ("interval", 12.0),
        ("internet", 30.0),
        ("international", 18.0),
        ("intern", 7.0),
        ("into", 25.0),
        ("trie", 3.0),
        ("tree", 9.0),
        ("internet", 10.0),
    ];

    let mut keyset = KeySet::new();
    for (word, weight) in words {
        keyset.append(word, weight);
    }

    let trie = TrieIndex::from_keyset(&mut keyset)?;
    println!(
        "Built {} keys ({} records, {} nodes, {} bytes)",
        trie.num_keys(),
        keyset.len(),
        trie.num_nodes(),
        trie.size_bytes()
    );

    // Round-trip through a file and query the mapped image.
    let dir = std::env::temp_dir().join("alice-trie-demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("words.trie");
    trie.save(&path)?;
    let mapped = TrieIndex::map(&path)?;
    println!("Mapped {} ({} bytes)\n", path.display(), mapped.size_bytes());

    println!("--- Lookup ---\n");
    let mut agent = SearchAgent::new();
    for query in ["internet", "intern", "internets"] {
        agent.set_query(query);
        if mapped.lookup(&mut agent) {
            let key = agent.key();
            println!("  \"{}\" -> id {:?}, weight {}", query, key.id(), key.weight());
        } else {
            println!("  \"{}\" -> not found", query);
        }
    }

    println!("\n--- Common Prefixes of \"internationally\" ---\n");
    for key in mapped.common_prefixes("internationally") {
        println!("  {}", key.as_str().unwrap_or("<binary>"));
    }

    println!("\n--- Completions of \"inte\" ---\n");
    agent.set_query("inte");
    while mapped.predictive_search(&mut agent) {
        let key = agent.key();
        println!("  {:<16} {:>5}", key.as_str().unwrap_or("<binary>"), key.weight());
    }

    println!("\n--- Top 3 for \"in\" ---\n");
    for key in mapped.predict_top("in", 3) {
        println!("  {:<16} {:>5}", key.as_str().unwrap_or("<binary>"), key.weight());
    }

    println!("\n--- Reverse Lookup ---\n");
    for id in 0..mapped.num_keys() {
        agent.set_reverse_query(id);
        if mapped.reverse_lookup(&mut agent)? {
            println!("  {} -> {}", id, agent.key().as_str().unwrap_or("<binary>"));
        }
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
