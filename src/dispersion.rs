//! Per-token dispersion statistics over a frozen corpus.
//!
//! For a token with column entries `c_i` across `n` documents, with document
//! lengths `l_i` and `T` tokens in total:
//!
//! ```text
//! s_i = l_i / T       share of the corpus in document i
//! v_i = c_i / freq    share of the token's occurrences in document i
//! p_i = c_i / l_i     share of document i made up of the token (0 for empty documents)
//! ```
//!
//! Every statistic that depends on document-level proportions is computed on
//! the zero-filled dense column, one column at a time. Only `freq` and `range`
//! read the sparse entries directly.

use std::f64::consts::LOG2_E;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LexstatError, Result};
use crate::matrix::FrozenCorpusMatrix;
use crate::vocabulary::TokenId;

/// Dispersion statistics of one token.
///
/// Statistics that are undefined for the corpus at hand (for example Juilland's
/// D on a single-document corpus) are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispersionStats {
    /// Corpus frequency.
    pub freq: u64,
    /// `freq / token_count`.
    pub prop: f64,
    /// Number of documents containing the token.
    pub range: usize,
    /// Population standard deviation of the per-document counts.
    pub stdev: f64,
    /// Coefficient of variation, `stdev / mean`.
    pub vc: Option<f64>,
    /// Juilland's D.
    pub juilland_d: Option<f64>,
    /// Carroll's D2.
    pub carroll_d2: Option<f64>,
    /// Rosengren's S_adj.
    pub rosengren_s_adj: Option<f64>,
    /// Gries' deviation of proportions.
    pub dp: f64,
    /// DP normalized by its maximum, `dp / (1 - min(s))`.
    pub dp_norm: Option<f64>,
    /// Kullback-Leibler divergence of `v` from `s`, in bits.
    pub kl_divergence: f64,
}

impl DispersionStats {
    /// Coefficient of variation, or `DivisionUndefined`.
    pub fn require_vc(&self) -> Result<f64> {
        require(self.vc, "coefficient of variation with zero mean")
    }

    /// Juilland's D, or `DivisionUndefined`.
    pub fn require_juilland_d(&self) -> Result<f64> {
        require(
            self.juilland_d,
            "Juilland's D needs at least two documents and a nonzero mean proportion",
        )
    }

    /// Carroll's D2, or `DivisionUndefined`.
    pub fn require_carroll_d2(&self) -> Result<f64> {
        require(
            self.carroll_d2,
            "Carroll's D2 needs at least two documents and nonzero proportions",
        )
    }

    /// Rosengren's S_adj, or `DivisionUndefined`.
    pub fn require_rosengren_s_adj(&self) -> Result<f64> {
        require(self.rosengren_s_adj, "Rosengren's S_adj of a zero-frequency token")
    }

    /// DP_norm, or `DivisionUndefined`.
    pub fn require_dp_norm(&self) -> Result<f64> {
        require(self.dp_norm, "DP_norm of a single-document corpus")
    }
}

fn require(value: Option<f64>, what: &str) -> Result<f64> {
    value.ok_or_else(|| LexstatError::division_undefined(what))
}

/// Dispersion statistics paired with the token they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDispersion {
    /// Column id.
    pub id: TokenId,
    /// Token string.
    pub token: String,
    /// Statistics.
    #[serde(flatten)]
    pub stats: DispersionStats,
}

/// Computes dispersion statistics over a borrowed frozen matrix.
///
/// # Example
///
/// ```
/// use lexstat::accumulator::SparseAccumulator;
/// use lexstat::config::AccumulatorConfig;
/// use lexstat::dispersion::DispersionEngine;
///
/// let mut acc = SparseAccumulator::new(AccumulatorConfig::default());
/// acc.push_document("a b".split_whitespace()).unwrap();
/// acc.push_document("a c".split_whitespace()).unwrap();
/// let matrix = acc.freeze().unwrap();
///
/// let engine = DispersionEngine::new(&matrix).unwrap();
/// let a = engine.token_stats_for("a").unwrap();
/// assert_eq!(a.range, 2);
/// assert_eq!(a.dp, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct DispersionEngine<'a> {
    matrix: &'a FrozenCorpusMatrix,
    shares: Vec<f64>,
    min_share: f64,
}

impl<'a> DispersionEngine<'a> {
    /// Create an engine; fails with `DivisionUndefined` for a corpus without tokens.
    pub fn new(matrix: &'a FrozenCorpusMatrix) -> Result<Self> {
        let token_count = matrix.token_count();
        if token_count == 0 {
            return Err(LexstatError::division_undefined(
                "dispersion of a corpus without tokens",
            ));
        }

        let total = token_count as f64;
        let shares: Vec<f64> = matrix
            .row_sums()
            .iter()
            .map(|&len| len as f64 / total)
            .collect();
        let min_share = shares.iter().copied().fold(f64::INFINITY, f64::min);

        Ok(DispersionEngine {
            matrix,
            shares,
            min_share,
        })
    }

    /// The per-document corpus shares `s`.
    pub fn document_shares(&self) -> &[f64] {
        &self.shares
    }

    /// Statistics for a column id; `NotFound` when out of range.
    pub fn token_stats(&self, id: TokenId) -> Result<DispersionStats> {
        if id as usize >= self.matrix.vocab_size() {
            return Err(LexstatError::not_found(format!("token id {id}")));
        }
        Ok(self.compute(id))
    }

    /// Statistics for a token string; `NotFound` when it was never seen.
    pub fn token_stats_for(&self, token: &str) -> Result<DispersionStats> {
        let id = self
            .matrix
            .vocabulary()
            .get(token)
            .ok_or_else(|| LexstatError::not_found(format!("token '{token}'")))?;
        Ok(self.compute(id))
    }

    /// Statistics for every token, in id order, computed column-parallel.
    pub fn all_stats(&self) -> Vec<TokenDispersion> {
        self.matrix
            .vocabulary()
            .tokens()
            .par_iter()
            .enumerate()
            .map(|(id, token)| TokenDispersion {
                id: id as TokenId,
                token: token.clone(),
                stats: self.compute(id as TokenId),
            })
            .collect()
    }

    fn compute(&self, id: TokenId) -> DispersionStats {
        let matrix = self.matrix;
        let n = matrix.corpus_length();
        let nf = n as f64;

        let freq = matrix.column_sum(id).unwrap_or(0);
        let freq_f = freq as f64;
        let range = matrix.column_nnz(id);
        let prop = freq_f / matrix.token_count() as f64;

        let dense = matrix.dense_column(id);

        let mean = freq_f / nf;
        let stdev = population_stdev(&dense, mean);
        let vc = (mean > 0.0).then(|| stdev / mean);

        let p: Vec<f64> = dense
            .iter()
            .zip(matrix.row_sums())
            .map(|(&count, &len)| if len == 0 { 0.0 } else { count / len as f64 })
            .collect();
        let p_sum: f64 = p.iter().sum();
        let p_mean = p_sum / nf;
        let juilland_d = (n > 1 && p_mean > 0.0).then(|| {
            let p_std = population_stdev(&p, p_mean);
            1.0 - (p_std / p_mean) * (1.0 / (nf - 1.0).sqrt())
        });
        let carroll_d2 = (n > 1 && p_sum > 0.0).then(|| entropy_bits(&p, p_sum) / nf.log2());

        let rosengren_s_adj = (freq > 0).then(|| {
            let root_sum: f64 = dense
                .iter()
                .zip(&self.shares)
                .map(|(&count, &s)| (s * count).sqrt())
                .sum();
            root_sum * root_sum / freq_f
        });

        let mut deviation = 0.0;
        let mut kl_nats = 0.0;
        for (&count, &s) in dense.iter().zip(&self.shares) {
            let v = if freq > 0 { count / freq_f } else { 0.0 };
            deviation += (v - s).abs();
            if v > 0.0 {
                kl_nats += v * (v / s).ln();
            }
        }
        let dp = 0.5 * deviation;
        let dp_norm = (self.min_share < 1.0).then(|| dp / (1.0 - self.min_share));

        DispersionStats {
            freq,
            prop,
            range,
            stdev,
            vc,
            juilland_d,
            carroll_d2,
            rosengren_s_adj,
            dp,
            dp_norm,
            kl_divergence: kl_nats * LOG2_E,
        }
    }
}

fn population_stdev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|&x| (x - mean) * (x - mean)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Shannon entropy in bits of `values / total`, with `0 · log 0 = 0`.
fn entropy_bits(values: &[f64], total: f64) -> f64 {
    let nats: f64 = values
        .iter()
        .filter(|&&x| x > 0.0)
        .map(|&x| {
            let q = x / total;
            -q * q.ln()
        })
        .sum();
    nats / std::f64::consts::LN_2
}
