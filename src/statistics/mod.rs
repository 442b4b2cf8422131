extern crate nalgebra as na;
extern crate num_traits;

use std::fmt;
use na::Vector3;
use num_traits::float;
use crate::{EvalError,Float,Result};

/// One predicted/reference pair of a scalar quantity at a timestamp.
#[derive(Debug,Copy,Clone)]
pub struct ErrorSample {
    pub t: Float,
    pub predicted: Float,
    pub reference: Float
}

impl ErrorSample {
    pub fn new(t: Float, predicted: Float, reference: Float) -> ErrorSample {
        ErrorSample{t,predicted,reference}
    }

    pub fn error(&self) -> Float {
        self.reference - self.predicted
    }
}

fn check_series<F>(predictions: &[F], references: &[F]) -> Result<()> {
    if predictions.is_empty() || predictions.len() != references.len() {
        return Err(EvalError::EmptySeries);
    }
    Ok(())
}

pub fn mean<F: float::Float>(data: &[F]) -> Result<F> {
    if data.is_empty() {
        return Err(EvalError::EmptySeries);
    }
    let n = F::from(data.len()).expect("series length representable as float");
    Ok(data.iter().fold(F::zero(), |acc, &x| acc + x)/n)
}

pub fn rmse<F: float::Float>(predictions: &[F], references: &[F]) -> Result<F> {
    check_series(predictions,references)?;
    let n = F::from(predictions.len()).expect("series length representable as float");
    let sum = predictions.iter().zip(references.iter()).fold(F::zero(), |acc,(&p,&r)| acc + (p-r)*(p-r));
    Ok((sum/n).sqrt())
}

pub fn bias<F: float::Float>(predictions: &[F], references: &[F]) -> Result<F> {
    check_series(predictions,references)?;
    let n = F::from(predictions.len()).expect("series length representable as float");
    let sum = predictions.iter().zip(references.iter()).fold(F::zero(), |acc,(&p,&r)| acc + (r-p));
    Ok(sum/n)
}

/// RMSE after removing the systematic offset between the two series.
pub fn rmse_debiased<F: float::Float>(predictions: &[F], references: &[F]) -> Result<F> {
    let b = bias(predictions,references)?;
    let shifted = predictions.iter().map(|&p| p + b).collect::<Vec<F>>();
    rmse(&shifted,references)
}

/// Maximum-likelihood Gaussian fit: sample mean and (biased) standard deviation.
pub fn gaussian_fit<F: float::Float>(samples: &[F]) -> Result<(F,F)> {
    let mu = mean(samples)?;
    let n = F::from(samples.len()).expect("series length representable as float");
    let var = samples.iter().fold(F::zero(), |acc,&x| acc + (x-mu)*(x-mu))/n;
    Ok((mu,var.sqrt()))
}

/// Degree-1 least squares of y against x. Returns (slope, intercept).
pub fn linear_fit<F: float::Float>(x: &[F], y: &[F]) -> Result<(F,F)> {
    check_series(x,y)?;
    let x_mean = mean(x)?;
    let y_mean = mean(y)?;
    let sxx = x.iter().fold(F::zero(), |acc,&v| acc + (v-x_mean)*(v-x_mean));
    let sxy = x.iter().zip(y.iter()).fold(F::zero(), |acc,(&u,&v)| acc + (u-x_mean)*(v-y_mean));
    if sxx == F::zero() {
        return Err(EvalError::EmptySeries);
    }
    let slope = sxy/sxx;
    Ok((slope, y_mean - slope*x_mean))
}

/// Density-normalized bin counts over the given range; samples outside the
/// range are ignored.
pub fn histogram(samples: &[Float], bin_count: usize, range: (Float,Float)) -> Result<Vec<Float>> {
    if samples.is_empty() || bin_count == 0 || range.1 <= range.0 {
        return Err(EvalError::EmptySeries);
    }
    let bin_width = (range.1-range.0)/(bin_count as Float);
    let mut counts = vec![0usize;bin_count];
    for &s in samples {
        if s < range.0 || s > range.1 {
            continue;
        }
        let bin = (((s-range.0)/bin_width) as usize).min(bin_count-1);
        counts[bin] += 1;
    }
    let norm = (samples.len() as Float)*bin_width;
    Ok(counts.iter().map(|&c| (c as Float)/norm).collect())
}

pub fn vector_rmse(predictions: &[Vector3<Float>], references: &[Vector3<Float>]) -> Result<Vector3<Float>> {
    check_series(predictions,references)?;
    let n = predictions.len() as Float;
    let sum = predictions.iter().zip(references.iter()).fold(Vector3::<Float>::zeros(), |acc,(p,r)| {
        let d = p-r;
        acc + d.component_mul(&d)
    });
    Ok((sum/n).map(|v| v.sqrt()))
}

pub fn vector_bias(predictions: &[Vector3<Float>], references: &[Vector3<Float>]) -> Result<Vector3<Float>> {
    check_series(predictions,references)?;
    let n = predictions.len() as Float;
    let sum = predictions.iter().zip(references.iter()).fold(Vector3::<Float>::zeros(), |acc,(p,r)| acc + (r-p));
    Ok(sum/n)
}

#[derive(Debug,Copy,Clone)]
pub struct GaussianFit {
    pub mu: Float,
    pub sigma: Float
}

impl fmt::Display for GaussianFit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"mu = {:.3}, std = {:.3}",self.mu,self.sigma)
    }
}

/// Aggregate of a scalar error series.
#[derive(Debug,Clone)]
pub struct ScalarStatistic {
    pub rmse: Float,
    pub bias: Float,
    pub rmse_debiased: Float,
    pub gaussian: GaussianFit,
    pub histogram: Vec<Float>
}

impl ScalarStatistic {
    pub fn from_samples(samples: &[ErrorSample], bin_count: usize, range: (Float,Float)) -> Result<ScalarStatistic> {
        let predictions = samples.iter().map(|s| s.predicted).collect::<Vec<Float>>();
        let references = samples.iter().map(|s| s.reference).collect::<Vec<Float>>();
        let errors = samples.iter().map(|s| s.error()).collect::<Vec<Float>>();
        let (mu,sigma) = gaussian_fit(&errors)?;
        Ok(ScalarStatistic{
            rmse: rmse(&predictions,&references)?,
            bias: bias(&predictions,&references)?,
            rmse_debiased: rmse_debiased(&predictions,&references)?,
            gaussian: GaussianFit{mu,sigma},
            histogram: histogram(&errors,bin_count,range)?
        })
    }
}

impl fmt::Display for ScalarStatistic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"rmse {:.3} bias {:.3} rmse(no bias) {:.3} ({})",self.rmse,self.bias,self.rmse_debiased,self.gaussian)
    }
}

/// Aggregate of a 3-axis error series.
#[derive(Debug,Clone)]
pub struct ErrorStatistic {
    pub rmse: Vector3<Float>,
    pub bias: Vector3<Float>,
    pub rmse_debiased: Vector3<Float>,
    pub gaussian: [GaussianFit;3],
    pub histogram: [Vec<Float>;3]
}

impl ErrorStatistic {
    pub fn from_series(predictions: &[Vector3<Float>], references: &[Vector3<Float>], bin_count: usize, range: (Float,Float)) -> Result<ErrorStatistic> {
        check_series(predictions,references)?;
        let mut rmse_debiased = Vector3::<Float>::zeros();
        let mut gaussian = [GaussianFit{mu: 0.0, sigma: 0.0};3];
        let mut hist: [Vec<Float>;3] = [Vec::new(),Vec::new(),Vec::new()];
        for axis in 0..3 {
            let p = predictions.iter().map(|v| v[axis]).collect::<Vec<Float>>();
            let r = references.iter().map(|v| v[axis]).collect::<Vec<Float>>();
            rmse_debiased[axis] = self::rmse_debiased(&p,&r)?;
            let errors = p.iter().zip(r.iter()).map(|(a,b)| b-a).collect::<Vec<Float>>();
            let (mu,sigma) = gaussian_fit(&errors)?;
            gaussian[axis] = GaussianFit{mu,sigma};
            hist[axis] = histogram(&errors,bin_count,range)?;
        }
        Ok(ErrorStatistic{
            rmse: vector_rmse(predictions,references)?,
            bias: vector_bias(predictions,references)?,
            rmse_debiased,
            gaussian,
            histogram: hist
        })
    }
}

impl fmt::Display for ErrorStatistic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f,"rmse {:.3},{:.3},{:.3} bias {:.3},{:.3},{:.3} rmse(no bias) {:.3},{:.3},{:.3}",
            self.rmse[0],self.rmse[1],self.rmse[2],
            self.bias[0],self.bias[1],self.bias[2],
            self.rmse_debiased[0],self.rmse_debiased[1],self.rmse_debiased[2])
    }
}
