use ndarray::{Array, Dimension, Zip};

/// Adam hyperparameters plus the shared step counter.
#[derive(Debug, Clone)]
pub(super) struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step: i32,
}

impl Adam {
    pub(super) fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
        }
    }

    /// Advance the bias-correction counter; call once per batch before [`Adam::update`].
    pub(super) fn begin_step(&mut self) {
        self.step = self.step.saturating_add(1);
    }

    pub(super) fn update<D: Dimension>(
        &self,
        param: &mut Array<f32, D>,
        grad: &Array<f32, D>,
        moments: &mut Moments<D>,
    ) {
        let t = self.step.max(1);
        let (beta1, beta2) = (self.beta1, self.beta2);
        let correction1 = 1.0 - beta1.powi(t);
        let correction2 = 1.0 - beta2.powi(t);
        let (lr, eps) = (self.learning_rate, self.epsilon);
        Zip::from(param)
            .and(grad)
            .and(&mut moments.first)
            .and(&mut moments.second)
            .for_each(|p, &g, m, v| {
                *m = beta1 * *m + (1.0 - beta1) * g;
                *v = beta2 * *v + (1.0 - beta2) * g * g;
                let m_hat = *m / correction1;
                let v_hat = *v / correction2;
                *p -= lr * m_hat / (v_hat.sqrt() + eps);
            });
    }
}

/// First and second moment estimates for one parameter tensor.
#[derive(Debug, Clone)]
pub(super) struct Moments<D: Dimension> {
    first: Array<f32, D>,
    second: Array<f32, D>,
}

impl<D: Dimension> Moments<D> {
    pub(super) fn zeros_like(param: &Array<f32, D>) -> Self {
        Self {
            first: Array::zeros(param.raw_dim()),
            second: Array::zeros(param.raw_dim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn first_step_moves_by_learning_rate() {
        let mut adam = Adam::new(0.001);
        let mut param = array![1.0f32, -1.0];
        let grad = array![4.0f32, -0.5];
        let mut moments = Moments::zeros_like(&param);
        adam.begin_step();
        adam.update(&mut param, &grad, &mut moments);
        assert!((param[0] - 0.999).abs() < 1e-5);
        assert!((param[1] + 0.999).abs() < 1e-5);
    }

    #[test]
    fn minimizes_a_quadratic() {
        let mut adam = Adam::new(0.05);
        let mut param = array![3.0f32];
        let mut moments = Moments::zeros_like(&param);
        for _ in 0..500 {
            let grad = param.mapv(|p| 2.0 * (p - 1.0));
            adam.begin_step();
            adam.update(&mut param, &grad, &mut moments);
        }
        assert!((param[0] - 1.0).abs() < 0.1);
    }
}
