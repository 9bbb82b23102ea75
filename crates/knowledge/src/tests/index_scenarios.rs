use super::support::*;
use crate::index::SimilarityIndex;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_notes_directory_ranks_shipping_first() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "notes.txt", NOTES);

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    assert!(index.load_from_directory(data.path()).await);

    let stats = index.stats();
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.index_size, 2);

    let results = index.search("how long does shipping take", 5).await;
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].rank, 1);
    assert_eq!(results[0].source_id, "notes.txt");
    assert_eq!(results[0].chunk_index, 1);
    assert_eq!(results[0].text, "Shipping takes 3-5 business days.");

    assert_eq!(results[1].rank, 2);
    assert_eq!(results[1].chunk_index, 0);
    assert!(results[0].similarity_score > results[1].similarity_score);
    assert!((results[0].similarity_score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_unsupported_files_are_skipped() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "notes.txt", NOTES);
    write_file(data.path(), "manual.pdf", "%PDF-1.4 binary");

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    let report = index.load_directory(data.path()).await;

    assert!(report.succeeded());
    assert_eq!(report.loaded, vec!["notes.txt".to_string()]);
    assert_eq!(report.skipped, vec!["manual.pdf".to_string()]);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn test_directory_without_supported_files_fails() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "manual.pdf", "%PDF-1.4");
    write_file(data.path(), "empty.txt", "\n\n   \n");

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    let report = index.load_directory(data.path()).await;

    assert!(!report.succeeded());
    assert_eq!(report.failed, vec!["empty.txt".to_string()]);
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_missing_directory_has_no_effect() {
    let storage = TempDir::new().unwrap();
    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));

    assert!(!index.load_from_directory(&storage.path().join("nope")).await);
    assert!(index.is_empty());
    assert!(!storage.path().join("vector_index.bin").exists());
}

#[tokio::test]
async fn test_subdirectories_are_not_descended() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "notes.txt", NOTES);
    let nested = data.path().join("archive");
    std::fs::create_dir(&nested).unwrap();
    write_file(&nested, "old.txt", "Old return policy.");

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    assert!(index.load_from_directory(data.path()).await);
    assert_eq!(index.len(), 2);
    assert!(index
        .search("return", 10)
        .await
        .iter()
        .all(|r| r.source_id == "notes.txt"));
}

#[tokio::test]
async fn test_empty_index_search_skips_embedding() {
    let storage = TempDir::new().unwrap();
    let provider = Arc::new(KeywordProvider::support());
    let index = keyword_index(storage.path(), provider.clone());

    assert!(index.search("anything", 5).await.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_top_k_larger_than_stored() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write_file(data.path(), "notes.txt", NOTES);

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    assert!(index.add_documents(&path).await);

    let results = index.search("size guide", 50).await;
    assert_eq!(results.len(), 2);
    assert_eq!(
        results.iter().map(|r| r.rank).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[tokio::test]
async fn test_ties_favor_earlier_insertion() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "a.txt", "Shipping to France.");
    write_file(data.path(), "b.txt", "Shipping to Belgium.");

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    assert!(index.load_from_directory(data.path()).await);

    let results = index.search("shipping", 2).await;
    assert_eq!(results[0].similarity_score, results[1].similarity_score);
    assert_eq!(results[0].source_id, "a.txt");
    assert_eq!(results[0].global_id, 0);
    assert_eq!(results[1].source_id, "b.txt");
}

#[tokio::test]
async fn test_order_preserved_across_batches_and_files() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    write_file(data.path(), "first.txt", &numbered_paragraphs(0, 60));
    write_file(data.path(), "second.txt", &numbered_paragraphs(60, 70));

    let provider = Arc::new(NumberProvider::new(256));
    let index = SimilarityIndex::new(index_config(storage.path(), 256, 50), provider.clone());
    assert!(index.load_from_directory(data.path()).await);

    // 60 texts and 70 texts at 50 per batch
    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    assert_eq!(index.len(), 130);

    for n in [0usize, 49, 50, 59, 60, 100, 129] {
        let top = &index.search(&format!("item {}", n), 1).await[0];
        assert_eq!(top.text, format!("item {}", n));
        assert_eq!(top.global_id, n);
        let (source, local) = if n < 60 {
            ("first.txt", n)
        } else {
            ("second.txt", n - 60)
        };
        assert_eq!(top.source_id, source);
        assert_eq!(top.chunk_index, local);
    }
}

#[tokio::test]
async fn test_embedding_failure_inserts_nothing_from_file() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    let mut doomed = numbered_paragraphs(0, 54);
    doomed.push_str("\n\nexplode 54");
    let doomed = write_file(data.path(), "doomed.txt", &doomed);
    let fine = write_file(data.path(), "fine.txt", NOTES);

    let provider = Arc::new(KeywordProvider::support().failing_on("explode"));
    let index = keyword_index(storage.path(), provider.clone());

    assert!(!index.add_documents(&doomed).await);
    assert!(index.is_empty());
    assert!(!storage.path().join("documents.json").exists());
    // First batch succeeded, second failed
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    assert!(index.add_documents(&fine).await);
    let stats = index.stats();
    assert_eq!(stats.total_documents, 2);
    assert_eq!(index.search("return", 1).await[0].global_id, 0);
}

#[tokio::test]
async fn test_query_embedding_failure_returns_empty() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let path = write_file(data.path(), "notes.txt", NOTES);

    let index = keyword_index(
        storage.path(),
        Arc::new(KeywordProvider::support().failing_on("explode")),
    );
    assert!(index.add_documents(&path).await);

    assert!(index.search("explode", 5).await.is_empty());
    assert_eq!(index.search("shipping", 5).await.len(), 2);
}

#[tokio::test]
async fn test_tabular_source_is_indexed_in_row_groups() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let rows: String = (0..12)
        .map(|i| format!("KIM-{},size {},in stock\n", i, i))
        .collect();
    write_file(data.path(), "stock.csv", &rows);

    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));
    assert!(index.load_from_directory(data.path()).await);

    let results = index.search("size", 10).await;
    assert_eq!(results.len(), 3);
    let mut indices: Vec<usize> = results.iter().map(|r| r.chunk_index).collect();
    indices.sort();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(results[0].text.contains(" | "));
}

#[tokio::test]
async fn test_stats_report_model_and_dimension() {
    let storage = TempDir::new().unwrap();
    let index = keyword_index(storage.path(), Arc::new(KeywordProvider::support()));

    let stats = index.stats();
    assert_eq!(stats.total_documents, 0);
    assert_eq!(stats.embedding_model, "keyword-test");
    assert_eq!(stats.embedding_dimension, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_half_inserted_state() {
    let storage = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    let files: Vec<_> = (0..20)
        .map(|k| {
            write_file(
                data.path(),
                &format!("part{:02}.txt", k),
                &numbered_paragraphs(k * 10, 10),
            )
        })
        .collect();

    let index = Arc::new(SimilarityIndex::new(
        index_config(storage.path(), 256, 4),
        Arc::new(NumberProvider::new(256)),
    ));

    let writer = {
        let index = index.clone();
        tokio::spawn(async move {
            for path in files {
                assert!(index.add_documents(&path).await);
            }
        })
    };

    let readers: Vec<_> = (0..3)
        .map(|r| {
            let index = index.clone();
            tokio::spawn(async move {
                let mut observations = 0;
                loop {
                    let stats = index.stats();
                    assert_eq!(stats.total_documents, stats.index_size);

                    let results = index.search(&format!("item {}", r * 7), 5).await;
                    for (i, result) in results.iter().enumerate() {
                        assert_eq!(result.rank, i + 1);
                        assert_eq!(result.text, format!("item {}", result.global_id));
                    }

                    observations += 1;
                    if stats.total_documents == 200 {
                        break observations;
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }

    let stats = index.stats();
    assert_eq!(stats.total_documents, 200);
    assert_eq!(stats.index_size, 200);
}
