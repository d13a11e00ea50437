//! Command implementations for the lexstat CLI.
//!
//! A store is a directory holding either a frozen corpus under `corpus/` or a
//! pass tally under `tally/`.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{debug, info, warn};

use crate::analysis::tokenizer::Tokenizer;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::AccumulatorConfig;
use crate::dispersion::TokenDispersion;
use crate::error::{LexstatError, Result};
use crate::lexicon::{VocabFilter, most_frequent};
use crate::matrix::FrozenCorpusMatrix;
use crate::session::CorpusSession;
use crate::statistics::{CorpusStatistics, CorpusSummary};
use crate::storage::Storage;
use crate::storage::file::{FileStorage, FileStorageConfig};
use crate::storage::prefixed::PrefixedStorage;
use crate::tally::{PassState, PassTally};

const CORPUS_PREFIX: &str = "corpus";
const TALLY_PREFIX: &str = "tally";

/// Execute a CLI command.
pub fn execute_command(args: LexstatArgs) -> Result<()> {
    match &args.command {
        Command::Ingest(ingest_args) => {
            let report = run_ingest(ingest_args)?;
            output_result("Ingestion complete", &report, &args)
        }
        Command::Stats(stats_args) => {
            let report = run_stats(stats_args)?;
            output_result("Corpus statistics", &report, &args)
        }
        Command::Lookup(lookup_args) => {
            let rows = run_lookup(lookup_args)?;
            output_result("Token frequencies", &rows, &args)
        }
        Command::Vocab(vocab_args) => {
            let rows = run_vocab(vocab_args)?;
            output_result("Vocabulary", &rows, &args)
        }
        Command::Dispersion(dispersion_args) => {
            let rows = run_dispersion(dispersion_args)?;
            output_result("Dispersion statistics", &rows, &args)
        }
    }
}

/// A loaded store.
#[derive(Debug)]
pub enum Store {
    Frozen(CorpusStatistics),
    Tally(PassTally),
}

impl Store {
    /// Open the store directory, preferring a frozen corpus.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(LexstatError::not_found(format!(
                "Store directory does not exist: {}",
                path.display()
            )));
        }
        let root = open_root(path)?;

        let corpus = PrefixedStorage::new(CORPUS_PREFIX, root.clone());
        if FrozenCorpusMatrix::exists_in(&corpus) {
            debug!("Opening frozen corpus in {}", path.display());
            return Ok(Store::Frozen(CorpusStatistics::load(&corpus)?));
        }

        let tally = PrefixedStorage::new(TALLY_PREFIX, root);
        if PassTally::exists_in(&tally) {
            debug!("Opening pass tally in {}", path.display());
            return Ok(Store::Tally(PassTally::load(&tally)?));
        }

        Err(LexstatError::not_found(format!(
            "No corpus or tally found in {}",
            path.display()
        )))
    }

    /// Which kind of snapshot this is.
    pub fn mode(&self) -> IngestMode {
        match self {
            Store::Frozen(_) => IngestMode::Frozen,
            Store::Tally(_) => IngestMode::Tally,
        }
    }

    fn summary(&self) -> CorpusSummary {
        match self {
            Store::Frozen(stats) => stats.summary(),
            Store::Tally(tally) => tally.summary(),
        }
    }

    fn pass_state(&self) -> Option<PassState> {
        match self {
            Store::Frozen(_) => None,
            Store::Tally(tally) => Some(tally.pass_state()),
        }
    }

    fn lookup(&self, token: &str) -> Result<u64> {
        match self {
            Store::Frozen(stats) => stats.lookup(token),
            Store::Tally(tally) => tally.lookup(token),
        }
    }

    fn vocab(&self, filter: VocabFilter) -> Vec<VocabRow> {
        let counts = match self {
            Store::Frozen(stats) => stats.get_vocab(filter).into_owned(),
            Store::Tally(tally) => tally.get_vocab(filter).into_owned(),
        };
        most_frequent(&counts, counts.len())
            .into_iter()
            .map(|(token, count)| VocabRow {
                token: token.to_string(),
                count,
            })
            .collect()
    }

    fn frozen(&self) -> Result<&CorpusStatistics> {
        match self {
            Store::Frozen(stats) => Ok(stats),
            Store::Tally(_) => Err(LexstatError::not_frozen(
                "dispersion needs a frozen corpus; ingest with --mode frozen",
            )),
        }
    }
}

fn open_root(path: &Path) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::new(FileStorageConfig::new(path))?))
}

/// Remove everything stored under a namespace.
fn clear(storage: &dyn Storage) -> Result<()> {
    for name in storage.list_files()? {
        storage.delete_file(&name)?;
    }
    Ok(())
}

/// Read the input as one document per line, or one JSON object per line.
fn read_documents(args: &IngestArgs) -> Result<Vec<String>> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input {}", args.input.display()))?;

    if !args.jsonl {
        return Ok(content.lines().map(str::to_string).collect());
    }

    let mut documents = Vec::new();
    for (number, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(line)
            .with_context(|| format!("Invalid JSON on line {}", number + 1))?;
        let text = value
            .get(&args.field)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| {
                LexstatError::invalid_argument(format!(
                    "Line {} has no string field '{}'",
                    number + 1,
                    args.field
                ))
            })?;
        documents.push(text.to_string());
    }
    Ok(documents)
}

fn accumulator_config(args: &IngestArgs) -> Result<AccumulatorConfig> {
    let mut config = match &args.config {
        Some(path) => AccumulatorConfig::from_json_file(path)?,
        None => AccumulatorConfig::default(),
    };
    if args.lowercase {
        config = config.with_lowercase(true);
    }
    if let Some(n_train) = args.n_train {
        config = config.with_n_train(n_train);
    }
    config.validate()?;
    Ok(config)
}

/// Ingest a text file into a store and save it.
pub fn run_ingest(args: &IngestArgs) -> Result<IngestReport> {
    if args.passes == 0 {
        return Err(LexstatError::invalid_argument("--passes must be at least 1"));
    }
    if args.mode == IngestMode::Frozen && args.passes != 1 {
        return Err(LexstatError::invalid_argument(
            "--passes only applies to --mode tally",
        ));
    }

    let start = Instant::now();
    let config = accumulator_config(args)?;
    let tokenizer = args.tokenizer.build(args.pattern.as_deref())?;
    let documents = read_documents(args)?;
    info!(
        "Ingesting {} documents from {} with the {} tokenizer",
        documents.len(),
        args.input.display(),
        tokenizer.name()
    );

    let root = open_root(&args.store)?;
    let corpus_storage = PrefixedStorage::new(CORPUS_PREFIX, root.clone());
    let tally_storage = PrefixedStorage::new(TALLY_PREFIX, root);

    let report = match args.mode {
        IngestMode::Frozen => {
            let mut session = CorpusSession::new(config);
            let mut counted = 0;
            for text in &documents {
                if session.push_document(tokenizer.tokenize(text)?)? {
                    counted += 1;
                }
            }
            let stats = session.freeze()?;

            clear(&tally_storage)?;
            stats.save(&corpus_storage)?;

            IngestReport {
                mode: IngestMode::Frozen,
                store: args.store.display().to_string(),
                passes: 1,
                documents_read: documents.len(),
                documents_counted: counted,
                documents_ignored: documents.len() - counted,
                corpus_length: stats.corpus_length(),
                vocab_size: stats.vocab_size(),
                token_count: stats.token_count(),
                pass_state: None,
                duration_ms: 0,
            }
        }
        IngestMode::Tally => {
            let tally = tally_documents(config, tokenizer.as_ref(), &documents, args.passes)?;

            clear(&corpus_storage)?;
            tally.save(&tally_storage)?;

            IngestReport {
                mode: IngestMode::Tally,
                store: args.store.display().to_string(),
                passes: args.passes,
                documents_read: documents.len() * args.passes,
                documents_counted: tally.call_count(),
                documents_ignored: tally.documents_ignored(),
                corpus_length: tally.corpus_length(),
                vocab_size: tally.vocab_size(),
                token_count: tally.token_count(),
                pass_state: Some(tally.pass_state()),
                duration_ms: 0,
            }
        }
    };

    Ok(IngestReport {
        duration_ms: start.elapsed().as_millis() as u64,
        ..report
    })
}

/// Replay `documents` `passes` times into a tally, rectifying when a second
/// pass was detected.
fn tally_documents(
    config: AccumulatorConfig,
    tokenizer: &dyn Tokenizer,
    documents: &[String],
    passes: usize,
) -> Result<PassTally> {
    let mut tally = PassTally::new(config);
    for pass in 0..passes {
        debug!("Tally pass {} of {}", pass + 1, passes);
        for text in documents {
            tally.push_text(text, tokenizer.tokenize(text)?)?;
        }
    }

    match tally.pass_state() {
        PassState::DuplicateSeen { .. } => tally.rectify()?,
        _ if passes > 1 => warn!(
            "Replayed the input {passes} times but no duplicate pass was detected; counts cover every pass"
        ),
        _ => {}
    }
    Ok(tally)
}

/// Summarize a store.
pub fn run_stats(args: &StatsArgs) -> Result<StatsReport> {
    let store = Store::open(&args.store)?;
    Ok(StatsReport {
        mode: store.mode(),
        summary: store.summary(),
        pass_state: store.pass_state(),
    })
}

/// Look up tokens; unseen tokens are reported with no count.
pub fn run_lookup(args: &LookupArgs) -> Result<Vec<LookupRow>> {
    let store = Store::open(&args.store)?;
    args.tokens
        .iter()
        .map(|token| {
            let count = match store.lookup(token) {
                Ok(count) => Some(count),
                Err(LexstatError::NotFound(_)) => None,
                Err(e) => return Err(e),
            };
            Ok(LookupRow {
                token: token.clone(),
                count,
            })
        })
        .collect()
}

/// List the (optionally filtered) vocabulary, most frequent first.
pub fn run_vocab(args: &VocabArgs) -> Result<Vec<VocabRow>> {
    let store = Store::open(&args.store)?;

    let mut filter = VocabFilter::new();
    if args.lowercase {
        filter = filter.lowercase();
    }
    if args.exclude_stopwords {
        filter = filter.exclude_stopwords();
    }
    if args.exclude_punctuation {
        filter = filter.exclude_punctuation();
    }

    let mut rows = store.vocab(filter);
    if let Some(top) = args.top {
        rows.truncate(top);
    }
    Ok(rows)
}

/// Dispersion statistics of selected tokens, or of every token by frequency.
pub fn run_dispersion(args: &DispersionArgs) -> Result<Vec<TokenDispersion>> {
    let store = Store::open(&args.store)?;
    let stats = store.frozen()?;
    let engine = stats.dispersion()?;

    let mut rows = if args.tokens.is_empty() {
        let mut all = engine.all_stats();
        all.sort_by(|a, b| {
            b.stats
                .freq
                .cmp(&a.stats.freq)
                .then_with(|| a.token.cmp(&b.token))
        });
        all
    } else {
        args.tokens
            .iter()
            .map(|token| {
                let id = stats
                    .matrix()
                    .vocabulary()
                    .get(token)
                    .ok_or_else(|| LexstatError::not_found(format!("Token not in vocabulary: {token}")))?;
                Ok(TokenDispersion {
                    id,
                    token: token.clone(),
                    stats: engine.token_stats(id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?
    };

    if let Some(top) = args.top {
        rows.truncate(top);
    }
    Ok(rows)
}
