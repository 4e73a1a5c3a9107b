use filings_core::config::Bm25Settings;
use filings_core::traits::LexicalIndex;
use filings_core::Chunk;
use filings_text::{Bm25Index, TantivyLexicalIndex};
use tempfile::TempDir;

fn corpus() -> Vec<Chunk> {
    vec![
        Chunk::with_id("biz", "Acme Corp is a technology company that provides cloud services.", "ACME", 2024, "Item 1"),
        Chunk::with_id("risk", "We face significant competition. Cybersecurity threats could disrupt our operations.", "ACME", 2024, "Item 1A"),
        Chunk::with_id("mdna", "Revenue increased 15% to $2.3 billion in fiscal year 2024.", "ACME", 2024, "Item 7"),
        Chunk::with_id("fin", "Total revenue: $2,300,000,000. Net income: $450,000,000.", "ACME", 2024, "Item 8"),
        Chunk::with_id("mdna2", "Operating expenses grew 8% driven by R&D investments.", "ACME", 2024, "Item 7"),
    ]
}

#[test]
fn bm25_and_tantivy_agree_on_top_hit() {
    let chunks = corpus();
    let bm25 = Bm25Index::new(&chunks, Bm25Settings::default());
    let tantivy = TantivyLexicalIndex::in_ram(&chunks).expect("tantivy");
    assert_eq!(bm25.len(), 5);
    assert_eq!(tantivy.len(), 5);

    for (q, expected) in [("cybersecurity threats", "risk"), ("cloud services", "biz"), ("net income", "fin")] {
        let a = bm25.search(q, 3).expect("bm25");
        let b = tantivy.search(q, 3).expect("tantivy");
        eprintln!("q='{}' bm25={:?} tantivy={:?}", q, a, b);
        assert_eq!(a.first().map(String::as_str), Some(expected));
        assert_eq!(b.first().map(String::as_str), Some(expected));
    }
}

#[test]
fn tantivy_shares_the_query_tokenizer() {
    let tantivy = TantivyLexicalIndex::in_ram(&corpus()).expect("tantivy");
    // "R&D" tokenizes to single characters, which are dropped on both sides
    assert!(tantivy.search("R&D", 5).expect("search").is_empty());
    assert!(tantivy.search("OPERATING!!", 5).expect("search").contains(&"mdna2".to_string()));
}

#[test]
fn tantivy_on_disk_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let dir = tmp.path().join("tantivy");
    TantivyLexicalIndex::create_in_dir(&dir, &corpus()).expect("create");
    let reopened = TantivyLexicalIndex::open(&dir).expect("open");
    assert_eq!(reopened.len(), 5);
    let hits = reopened.search("fiscal year revenue", 2).expect("search");
    assert_eq!(hits.first().map(String::as_str), Some("mdna"));
    assert!(hits.len() <= 2);
}
