//! Point samplers for the parametric populations used by the generator.
//!
//! Two families are supported:
//! - [`Gaussian`]: per-axis independent or correlated multivariate normal,
//!   optionally rotated in the `(x1, x2)` plane before drawing.
//! - [`Gamma`]: independent `Gamma(k, theta)` per axis.
//!
//! Every call to `generate_points` consumes fresh draws from the RNG passed
//! in; seeding that RNG is the only source of reproducibility.

use nalgebra::DMatrix;
use nalgebra::linalg::Cholesky;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use sg_core::{Error, PointSet, Result};

use crate::geometry::plane_rotation;

/// How a Gaussian population is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GaussianMode {
    /// Independent normal draws per axis (falls back to the correlated path
    /// when a rotation or full covariance is configured).
    #[default]
    Normal,
    /// Always draw through the Cholesky factor of the covariance.
    Multivariate,
}

/// Spread of a Gaussian population.
#[derive(Debug, Clone, PartialEq)]
pub enum Spread {
    /// Standard deviation per axis.
    PerAxis(Vec<f64>),
    /// Full covariance matrix (row-major rows).
    Covariance(Vec<Vec<f64>>),
}

impl Spread {
    /// Scale the population width by `factor` (standard deviations scale
    /// linearly, covariance entries by `factor²`).
    pub fn scaled(&self, factor: f64) -> Spread {
        match self {
            Spread::PerAxis(s) => Spread::PerAxis(s.iter().map(|x| x * factor).collect()),
            Spread::Covariance(c) => Spread::Covariance(
                c.iter().map(|row| row.iter().map(|x| x * factor * factor).collect()).collect(),
            ),
        }
    }

    fn covariance(&self, dim: usize) -> Result<DMatrix<f64>> {
        match self {
            Spread::PerAxis(s) => Ok(DMatrix::from_diagonal(&nalgebra::DVector::from_iterator(
                dim,
                s.iter().map(|x| x * x),
            ))),
            Spread::Covariance(rows) => {
                if rows.len() != dim || rows.iter().any(|r| r.len() != dim) {
                    return Err(Error::Validation(format!(
                        "covariance must be {dim}x{dim}"
                    )));
                }
                Ok(DMatrix::from_fn(dim, dim, |i, j| rows[i][j]))
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Draw {
    Independent(Vec<rand_distr::Normal<f64>>),
    Correlated(DMatrix<f64>),
}

/// Multivariate normal population.
#[derive(Debug, Clone)]
pub struct Gaussian {
    mu: Vec<f64>,
    draw: Draw,
}

impl Gaussian {
    /// Create a Gaussian with mean `mu` and the given spread.
    ///
    /// When `angle_degrees != 0` the covariance becomes `R Σ Rᵀ`, `R` the
    /// rotation of the first two axes; this draws from the rotated Gaussian
    /// rather than rotating drawn points about the origin.
    pub fn new(mu: Vec<f64>, spread: Spread, mode: GaussianMode, angle_degrees: f64) -> Result<Self> {
        let dim = mu.len();
        if dim == 0 {
            return Err(Error::Validation("Gaussian mu must not be empty".into()));
        }
        if mu.iter().any(|m| !m.is_finite()) {
            return Err(Error::Validation(format!("Gaussian mu must be finite, got {:?}", mu)));
        }
        if let Spread::PerAxis(s) = &spread {
            if s.len() != dim {
                return Err(Error::Validation(format!(
                    "Gaussian sigma has {} entries but mu has {}",
                    s.len(),
                    dim
                )));
            }
            if s.iter().any(|&x| !x.is_finite() || x <= 0.0) {
                return Err(Error::Validation(format!(
                    "Gaussian sigma entries must be finite and > 0, got {:?}",
                    s
                )));
            }
        }

        let independent = mode == GaussianMode::Normal && angle_degrees == 0.0;
        let draw = match (&spread, independent) {
            (Spread::PerAxis(s), true) => {
                let normals = mu
                    .iter()
                    .zip(s)
                    .map(|(&m, &sd)| {
                        rand_distr::Normal::new(m, sd)
                            .map_err(|e| Error::Validation(format!("invalid normal: {e}")))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Draw::Independent(normals)
            }
            _ => {
                let rot = plane_rotation(dim, angle_degrees)?;
                let cov = &rot * spread.covariance(dim)? * rot.transpose();
                let chol = Cholesky::new(cov).ok_or_else(|| {
                    Error::Computation("Gaussian covariance is not positive definite".into())
                })?;
                Draw::Correlated(chol.l())
            }
        };

        Ok(Self { mu, draw })
    }

    /// Dimension of the population.
    pub fn dim(&self) -> usize {
        self.mu.len()
    }

    /// Mean vector.
    pub fn mean(&self) -> &[f64] {
        &self.mu
    }

    /// Draw `n` points of dimension `dim`.
    pub fn generate_points<R: Rng + ?Sized>(
        &self,
        n: usize,
        dim: usize,
        rng: &mut R,
    ) -> Result<PointSet> {
        check_dim(self.dim(), dim)?;
        let mut out = PointSet::with_capacity(dim, n);
        let mut row = vec![0.0; dim];
        let mut z = vec![0.0; dim];
        for _ in 0..n {
            match &self.draw {
                Draw::Independent(normals) => {
                    for (x, normal) in row.iter_mut().zip(normals) {
                        *x = normal.sample(rng);
                    }
                }
                Draw::Correlated(l) => {
                    for zi in z.iter_mut() {
                        *zi = StandardNormal.sample(rng);
                    }
                    for i in 0..dim {
                        let mut acc = self.mu[i];
                        for j in 0..=i {
                            acc += l[(i, j)] * z[j];
                        }
                        row[i] = acc;
                    }
                }
            }
            out.push_row(&row)?;
        }
        Ok(out)
    }
}

/// Independent `Gamma(k, theta)` per axis.
#[derive(Debug, Clone)]
pub struct Gamma {
    k: f64,
    theta: f64,
    dist: rand_distr::Gamma<f64>,
}

impl Gamma {
    /// Create a Gamma population with shape `k` and scale `theta`.
    pub fn new(k: f64, theta: f64) -> Result<Self> {
        if !k.is_finite() || k <= 0.0 {
            return Err(Error::Validation(format!("Gamma k must be finite and > 0, got {}", k)));
        }
        if !theta.is_finite() || theta <= 0.0 {
            return Err(Error::Validation(format!(
                "Gamma theta must be finite and > 0, got {}",
                theta
            )));
        }
        let dist = rand_distr::Gamma::new(k, theta)
            .map_err(|e| Error::Validation(format!("invalid Gamma: {e}")))?;
        Ok(Self { k, theta, dist })
    }

    /// Shape parameter.
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Scale parameter.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Draw `n` points of dimension `dim`.
    pub fn generate_points<R: Rng + ?Sized>(
        &self,
        n: usize,
        dim: usize,
        rng: &mut R,
    ) -> Result<PointSet> {
        if dim == 0 {
            return Err(Error::Validation("dimension must be > 0".into()));
        }
        let values: Vec<f64> = (0..n * dim).map(|_| self.dist.sample(rng)).collect();
        PointSet::from_flat(dim, values)
    }
}

/// A loaded population sampler.
#[derive(Debug, Clone)]
pub enum PointSampler {
    /// Multivariate normal.
    Gaussian(Gaussian),
    /// Per-axis Gamma.
    Gamma(Gamma),
}

impl PointSampler {
    /// Family name as written in settings files.
    pub fn name(&self) -> &'static str {
        match self {
            PointSampler::Gaussian(_) => "Gaussian",
            PointSampler::Gamma(_) => "Gamma",
        }
    }

    /// Draw `n` points of dimension `dim`.
    pub fn generate_points<R: Rng + ?Sized>(
        &self,
        n: usize,
        dim: usize,
        rng: &mut R,
    ) -> Result<PointSet> {
        match self {
            PointSampler::Gaussian(g) => g.generate_points(n, dim, rng),
            PointSampler::Gamma(g) => g.generate_points(n, dim, rng),
        }
    }
}

fn check_dim(have: usize, want: usize) -> Result<()> {
    if have != want {
        return Err(Error::Validation(format!(
            "distribution has dimension {have}, requested {want}"
        )));
    }
    Ok(())
}
