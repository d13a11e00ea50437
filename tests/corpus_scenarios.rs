//! End-to-end scenarios over small hand-checked corpora.

use lexstat::accumulator::SparseAccumulator;
use lexstat::config::AccumulatorConfig;
use lexstat::error::{LexstatError, Result};
use lexstat::lexicon::VocabFilter;
use lexstat::session::CorpusSession;
use lexstat::statistics::CorpusStatistics;

/// The five-part corpus from Gries (2020), "Analyzing dispersion".
const GRIES: [&str; 5] = [
    "b a m n i b e u p",
    "b a s a t b e w q n",
    "b c a g a b e s t a",
    "b a g h a b e a a t",
    "b a h a a b e a x a t",
];

const EPS: f64 = 1e-4;

fn frozen(docs: &[&str], config: AccumulatorConfig) -> Result<CorpusStatistics> {
    let mut session = CorpusSession::new(config);
    for doc in docs {
        session.push_document(doc.split_whitespace())?;
    }
    session.freeze()?;
    session.into_statistics()
}

#[test]
fn test_gries_vocabulary() -> Result<()> {
    let stats = frozen(&GRIES, AccumulatorConfig::default())?;

    assert_eq!(stats.corpus_length(), 5);
    assert_eq!(stats.vocab_size(), 16);
    assert_eq!(stats.token_count(), 50);
    assert_eq!(stats.doc_lengths(), &[9, 10, 10, 10, 11]);

    assert_eq!(stats.lookup("a")?, 15);
    assert_eq!(stats.lookup("b")?, 10);
    assert_eq!(stats.lookup("t")?, 4);
    assert!(matches!(stats.lookup("z"), Err(LexstatError::NotFound(_))));

    assert_eq!(stats.hapax_legomena(), &["m", "i", "u", "p", "w", "q", "c", "x"]);
    assert_eq!(stats.dis_legomena(), &["n", "s", "g", "h"]);
    assert_eq!(stats.mid_range_tokens(), &["b", "a", "e", "t"]);

    assert!((stats.type_token_ratio()? - 0.32).abs() < 1e-12);
    assert_eq!(stats.frequency_distribution(1)?, 0.5);
    assert_eq!(stats.frequency_distribution(2)?, 0.25);
    assert_eq!(stats.frequency_distribution(7)?, 0.0);

    Ok(())
}

#[test]
fn test_gries_dispersion_of_a() -> Result<()> {
    let stats = frozen(&GRIES, AccumulatorConfig::default())?;
    let engine = stats.dispersion()?;
    let a = engine.token_stats_for("a")?;

    assert_eq!(a.freq, 15);
    assert!((a.prop - 0.3).abs() < 1e-12);
    assert_eq!(a.range, 5);
    assert!((a.stdev - 1.4142).abs() < EPS);
    assert!((a.require_vc()? - 0.4714).abs() < EPS);
    assert!((a.dp - 0.18).abs() < 1e-9);
    assert!((a.require_dp_norm()? - 0.2195).abs() < EPS);
    assert!((a.require_juilland_d()? - 0.7852).abs() < EPS);
    assert!((a.require_carroll_d2()? - 0.9379).abs() < EPS);
    assert!((a.require_rosengren_s_adj()? - 0.9498).abs() < EPS);
    assert!((a.kl_divergence - 0.1370).abs() < EPS);

    Ok(())
}

#[test]
fn test_concentrated_token_has_largest_dp_norm() -> Result<()> {
    // s, t and u all occur twice; only s is confined to one document.
    let stats = frozen(&["s s t", "t u", "u v"], AccumulatorConfig::default())?;
    let engine = stats.dispersion()?;

    let s = engine.token_stats_for("s")?;
    let t = engine.token_stats_for("t")?;
    let u = engine.token_stats_for("u")?;
    assert_eq!(s.range, 1);
    assert!((s.dp - 4.0 / 7.0).abs() < 1e-12);
    assert!(s.require_dp_norm()? > t.require_dp_norm()?);
    assert!(s.require_dp_norm()? > u.require_dp_norm()?);

    Ok(())
}

#[test]
fn test_single_document_corpus() -> Result<()> {
    let stats = frozen(&["a b a"], AccumulatorConfig::default())?;
    let a = stats.dispersion()?.token_stats_for("a")?;

    assert_eq!(a.range, 1);
    assert_eq!(a.dp, 0.0);
    assert_eq!(a.juilland_d, None);
    assert_eq!(a.carroll_d2, None);
    assert_eq!(a.dp_norm, None);
    assert!(matches!(
        a.require_dp_norm(),
        Err(LexstatError::DivisionUndefined(_))
    ));

    Ok(())
}

#[test]
fn test_all_stats_covers_vocabulary() -> Result<()> {
    let stats = frozen(&GRIES, AccumulatorConfig::default())?;
    let all = stats.dispersion()?.all_stats();

    assert_eq!(all.len(), stats.vocab_size());
    for row in &all {
        assert_eq!(row.stats.freq, stats.lookup(&row.token)?);
        assert!(row.stats.dp >= 0.0 && row.stats.dp <= 1.0);
    }
    Ok(())
}

#[test]
fn test_n_train_ignores_replays() -> Result<()> {
    let config = AccumulatorConfig::default().with_n_train(5);
    let mut acc = SparseAccumulator::new(config);

    let mut accepted = 0;
    for _ in 0..5 {
        for doc in GRIES {
            if acc.push_document(doc.split_whitespace())? {
                accepted += 1;
            }
        }
    }
    assert_eq!(accepted, 5);
    assert_eq!(acc.documents_ignored(), 20);

    let stats = CorpusStatistics::new(acc.freeze()?);
    assert_eq!(stats.doc_lengths(), &[9, 10, 10, 10, 11]);
    let vocab = stats.get_vocab(VocabFilter::default());
    assert_eq!(vocab.values().copied().min(), Some(1));
    assert_eq!(stats.lookup("a")?, 15);

    Ok(())
}

#[test]
fn test_lowercase_merges_case_variants() -> Result<()> {
    let stats = frozen(
        &["The cat", "the CAT sat"],
        AccumulatorConfig::default().with_lowercase(true),
    )?;
    assert_eq!(stats.lookup("the")?, 2);
    assert_eq!(stats.lookup("cat")?, 2);
    assert!(!stats.contains("The"));

    Ok(())
}

#[test]
fn test_state_errors() -> Result<()> {
    let mut session = CorpusSession::new(AccumulatorConfig::default());
    session.push_document(["a"])?;
    assert!(matches!(
        session.statistics(),
        Err(LexstatError::NotFrozen(_))
    ));

    session.freeze()?;
    assert!(matches!(
        session.push_document(["b"]),
        Err(LexstatError::AlreadyFrozen(_))
    ));
    assert!(matches!(
        session.freeze(),
        Err(LexstatError::AlreadyFrozen(_))
    ));
    assert!(matches!(
        session.statistics()?.len(),
        Err(LexstatError::LengthAmbiguous)
    ));

    Ok(())
}

#[test]
fn test_empty_corpus() -> Result<()> {
    let stats = frozen(&[], AccumulatorConfig::default())?;

    assert_eq!(stats.vocab_size(), 0);
    assert!(matches!(
        stats.type_token_ratio(),
        Err(LexstatError::DivisionUndefined(_))
    ));
    assert!(matches!(
        stats.frequency_distribution(1),
        Err(LexstatError::DivisionUndefined(_))
    ));
    assert!(matches!(
        stats.dispersion(),
        Err(LexstatError::DivisionUndefined(_))
    ));

    let summary = stats.summary();
    assert_eq!(summary.type_token_ratio, None);
    assert!(summary.frequency_distribution.iter().all(|f| f.share.is_none()));

    Ok(())
}
