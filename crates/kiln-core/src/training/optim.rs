//! First-order optimizers over a flat parameter buffer.

use super::config::{OptimConfig, OptimizerKind};
use kiln_training::{TrainingError, TrainingResult};

pub trait Optimizer: Send {
    /// Update `params` in place from `grads` (same length).
    fn step(&mut self, params: &mut [f64], grads: &[f64]);

    fn lr(&self) -> f64;
}

/// Stochastic gradient descent with optional momentum and L2 penalty.
pub struct Sgd {
    lr: f64,
    momentum: f64,
    weight_decay: f64,
    velocity: Vec<f64>,
}

impl Sgd {
    #[must_use]
    pub fn new(lr: f64, momentum: f64, weight_decay: f64) -> Self {
        Self { lr, momentum, weight_decay, velocity: Vec::new() }
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        if self.velocity.len() != params.len() {
            self.velocity = vec![0.0; params.len()];
        }
        for ((p, g), v) in params.iter_mut().zip(grads).zip(self.velocity.iter_mut()) {
            let g = g + self.weight_decay * *p;
            if self.momentum > 0.0 {
                *v = self.momentum * *v + g;
                *p -= self.lr * *v;
            } else {
                *p -= self.lr * g;
            }
        }
    }

    fn lr(&self) -> f64 {
        self.lr
    }
}

/// Adam, or AdamW when `decoupled` (weight decay applied to the parameters
/// rather than folded into the gradient).
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    weight_decay: f64,
    decoupled: bool,
    t: i32,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    #[must_use]
    pub fn new(lr: f64, beta1: f64, beta2: f64, eps: f64, weight_decay: f64, decoupled: bool) -> Self {
        Self { lr, beta1, beta2, eps, weight_decay, decoupled, t: 0, m: Vec::new(), v: Vec::new() }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        if self.m.len() != params.len() {
            self.m = vec![0.0; params.len()];
            self.v = vec![0.0; params.len()];
        }
        self.t = self.t.saturating_add(1);

        // Bias correction folded into the step size
        let lr_t = self.lr * (1.0 - self.beta2.powi(self.t)).sqrt() / (1.0 - self.beta1.powi(self.t));

        for (i, (p, g)) in params.iter_mut().zip(grads).enumerate() {
            let g = if self.decoupled { *g } else { g + self.weight_decay * *p };
            if self.decoupled && self.weight_decay > 0.0 {
                *p -= self.lr * self.weight_decay * *p;
            }
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * g;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * g * g;
            *p -= lr_t * self.m[i] / (self.v[i].sqrt() + self.eps);
        }
    }

    fn lr(&self) -> f64 {
        self.lr
    }
}

/// Build the optimizer named by `optim.name`.
pub fn build_optimizer(config: &OptimConfig) -> TrainingResult<Box<dyn Optimizer>> {
    if !(config.lr.is_finite() && config.lr > 0.0) {
        return Err(TrainingError::Usage(format!("optim.lr must be positive, got {}", config.lr)));
    }
    if config.weight_decay < 0.0 {
        return Err(TrainingError::Usage("optim.weight_decay must not be negative".to_string()));
    }

    let optimizer: Box<dyn Optimizer> = match config.name {
        OptimizerKind::Sgd => Box::new(Sgd::new(config.lr, config.momentum, config.weight_decay)),
        kind @ (OptimizerKind::Adam | OptimizerKind::AdamW) => {
            let &[beta1, beta2] = config.betas.as_slice() else {
                return Err(TrainingError::Usage(format!(
                    "optim.betas must have exactly two entries, got {}",
                    config.betas.len()
                )));
            };
            if !(0.0..1.0).contains(&beta1) || !(0.0..1.0).contains(&beta2) {
                return Err(TrainingError::Usage("optim.betas must lie in [0, 1)".to_string()));
            }
            Box::new(Adam::new(
                config.lr,
                beta1,
                beta2,
                config.eps,
                config.weight_decay,
                kind == OptimizerKind::AdamW,
            ))
        }
    };
    tracing::debug!(optimizer = ?config.name, lr = config.lr, "optimizer configured");
    Ok(optimizer)
}
