//! Agreement between predicted and reference rhythm metrics.
//!
//! Rows are paired by file name; files present on only one side are
//! ignored.  Mean absolute error and Pearson correlation are reported for
//! VtV and pV separately.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use super::metrics::UtteranceMetrics;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("no samples to compare")]
    Empty,

    #[error("length mismatch: {0} truth values vs {1} predictions")]
    LengthMismatch(usize, usize),

    #[error("correlation undefined: one series has zero variance")]
    ZeroVariance,

    #[error("truth and prediction tables share no files")]
    NoOverlap,
}

/// MAE and Pearson correlation for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Agreement {
    pub mae: f64,
    /// `None` when either series is constant.
    pub pearson: Option<f64>,
}

/// Evaluation summary over all paired files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    /// Number of files present in both tables.
    pub files: usize,
    pub vtv: Agreement,
    pub pv: Agreement,
}

pub fn mean_absolute_error(truth: &[f64], pred: &[f64]) -> Result<f64, EvalError> {
    check_lengths(truth, pred)?;
    let sum: f64 = truth.iter().zip(pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(sum / truth.len() as f64)
}

pub fn pearson_cc(truth: &[f64], pred: &[f64]) -> Result<f64, EvalError> {
    check_lengths(truth, pred)?;
    let n = truth.len() as f64;
    let mean_t = truth.iter().sum::<f64>() / n;
    let mean_p = pred.iter().sum::<f64>() / n;

    let (mut cov, mut var_t, mut var_p) = (0.0, 0.0, 0.0);
    for (t, p) in truth.iter().zip(pred) {
        let (dt, dp) = (t - mean_t, p - mean_p);
        cov += dt * dp;
        var_t += dt * dt;
        var_p += dp * dp;
    }

    if var_t == 0.0 || var_p == 0.0 {
        return Err(EvalError::ZeroVariance);
    }
    Ok(cov / (var_t.sqrt() * var_p.sqrt()))
}

fn check_lengths(truth: &[f64], pred: &[f64]) -> Result<(), EvalError> {
    if truth.len() != pred.len() {
        return Err(EvalError::LengthMismatch(truth.len(), pred.len()));
    }
    if truth.is_empty() {
        return Err(EvalError::Empty);
    }
    Ok(())
}

fn agreement(truth: &[f64], pred: &[f64]) -> Result<Agreement, EvalError> {
    Ok(Agreement {
        mae: mean_absolute_error(truth, pred)?,
        pearson: pearson_cc(truth, pred).ok(),
    })
}

/// Pair `truth` and `pred` by file (in truth order) and score both metrics.
pub fn evaluate(
    truth: &[UtteranceMetrics],
    pred: &[UtteranceMetrics],
) -> Result<Evaluation, EvalError> {
    if truth.is_empty() || pred.is_empty() {
        return Err(EvalError::Empty);
    }

    let by_file: HashMap<&str, &UtteranceMetrics> =
        pred.iter().map(|m| (m.file.as_str(), m)).collect();

    let (mut vtv_t, mut vtv_p, mut pv_t, mut pv_p) = (vec![], vec![], vec![], vec![]);
    for t in truth {
        match by_file.get(t.file.as_str()) {
            Some(p) => {
                vtv_t.push(t.vtv);
                vtv_p.push(p.vtv);
                pv_t.push(t.pv);
                pv_p.push(p.pv);
            }
            None => log::debug!("no prediction for {}", t.file),
        }
    }

    if vtv_t.is_empty() {
        return Err(EvalError::NoOverlap);
    }

    Ok(Evaluation {
        files: vtv_t.len(),
        vtv: agreement(&vtv_t, &vtv_p)?,
        pv: agreement(&pv_t, &pv_p)?,
    })
}
