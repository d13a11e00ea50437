//! Criterion benchmarks for lexstat.
//!
//! Covers the three hot paths: streaming accumulation, freezing into the
//! column matrix, and dispersion over every token.

use std::hint::black_box;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use lexstat::accumulator::SparseAccumulator;
use lexstat::analysis::tokenizer::Tokenizer;
use lexstat::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use lexstat::config::AccumulatorConfig;
use lexstat::statistics::CorpusStatistics;
use lexstat::tally::PassTally;

/// Generate test documents for benchmarking.
fn generate_test_documents(count: usize) -> Vec<String> {
    let words = [
        "corpus", "token", "frequency", "dispersion", "document", "vocabulary", "the", "a",
        "of", "and", "sparse", "matrix", "column", "row", "count", "range", "deviation",
        "proportion", "entropy", "divergence", "hapax", "legomena", "ratio", "type",
        "stream", "pass", "hash", "freeze", "statistic", "lexicon",
    ];
    let mut documents = Vec::with_capacity(count);

    for i in 0..count {
        let doc_length = 20 + (i % 60);
        let mut doc_words = Vec::with_capacity(doc_length);

        for j in 0..doc_length {
            // Skewed pseudo-random distribution
            let word_idx = (i * 7 + j * 13) % (1 + j % words.len());
            doc_words.push(words[word_idx]);
        }
        doc_words.push(if i % 3 == 0 { "rare" } else { "common" });

        documents.push(doc_words.join(" "));
    }

    documents
}

fn accumulate(documents: &[String]) -> SparseAccumulator {
    let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
    for doc in documents {
        let _ = acc.push_document(doc.split_whitespace());
    }
    acc
}

/// Benchmark accumulation and tokenization.
fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");
    let documents = generate_test_documents(1000);

    group.throughput(Throughput::Elements(documents.len() as u64));
    group.bench_function("sparse_accumulator", |b| {
        b.iter(|| black_box(accumulate(black_box(&documents))))
    });

    group.bench_function("pass_tally", |b| {
        b.iter(|| {
            let mut tally = PassTally::new(AccumulatorConfig::default());
            for doc in &documents {
                let _ = tally.push_text(doc, doc.split_whitespace());
            }
            black_box(tally)
        })
    });

    let tokenizer = UnicodeWordTokenizer::with_punctuation();
    group.bench_function("unicode_tokenize", |b| {
        b.iter(|| {
            for doc in &documents {
                if let Ok(tokens) = tokenizer.tokenize(black_box(doc)) {
                    black_box(tokens.count());
                }
            }
        })
    });

    group.finish();
}

/// Benchmark freezing into the column matrix.
fn bench_freeze(c: &mut Criterion) {
    let mut group = c.benchmark_group("freeze");
    let documents = generate_test_documents(5000);

    group.bench_function("freeze_5000_documents", |b| {
        b.iter_batched(
            || accumulate(&documents),
            |mut acc| black_box(acc.freeze()),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

/// Benchmark dispersion over the whole vocabulary.
fn bench_dispersion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispersion");
    group.sample_size(20);

    let documents = generate_test_documents(5000);
    let Ok(matrix) = accumulate(&documents).freeze() else {
        return;
    };
    let stats = CorpusStatistics::new(matrix);

    group.throughput(Throughput::Elements(stats.vocab_size() as u64));
    group.bench_function("all_stats", |b| {
        b.iter(|| {
            if let Ok(engine) = stats.dispersion() {
                black_box(engine.all_stats());
            }
        })
    });

    group.bench_function("legomena_and_distribution", |b| {
        b.iter_batched(
            || CorpusStatistics::new(stats.matrix().clone()),
            |fresh| {
                black_box(fresh.hapax_legomena().len());
                black_box(fresh.frequency_distribution(1).ok());
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_accumulate, bench_freeze, bench_dispersion);

criterion_main!(benches);
