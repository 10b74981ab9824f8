//! Implicit Newmark time integration.
//!
//! Given the previous state (x, v, a) and step Δt, the next position x is
//! found by the nonlinear solver from the predictor x̃ and the scaling
//! β Δt²:
//!
//! ```text
//! x = x̃ + β Δt² a
//! x̃ = x_prev + Δt (v_prev + Δt (1/2 - β) a_prev)
//! v = (γ/β)/Δt (x - x_prev) + (1 - γ/β) v_prev + (1 - γ/(2β)) Δt a_prev
//! a = (v - v_prev - (1 - γ) Δt a_prev) / (γ Δt)
//! ```
//!
//! Standard parameter choices:
//! - **Average acceleration** (unconditionally stable): γ = 1/2, β = 1/4
//! - **Linear acceleration**: γ = 1/2, β = 1/6
//! - **Fox-Goodwin**: γ = 1/2, β = 1/12

use crate::error::{FemError, Result};
use log::debug;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Newmark time integration parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewmarkConfig {
    /// Newmark β parameter (controls acceleration)
    pub beta: f64,
    /// Newmark γ parameter (controls velocity)
    pub gamma: f64,
}

impl NewmarkConfig {
    /// Average acceleration method (unconditionally stable, 2nd order accurate)
    ///
    /// γ = 1/2, β = 1/4
    pub fn average_acceleration() -> Self {
        Self {
            beta: 0.25,
            gamma: 0.5,
        }
    }

    /// Linear acceleration method (conditionally stable)
    ///
    /// γ = 1/2, β = 1/6
    pub fn linear_acceleration() -> Self {
        Self {
            beta: 1.0 / 6.0,
            gamma: 0.5,
        }
    }

    /// Fox-Goodwin method
    ///
    /// γ = 1/2, β = 1/12
    pub fn fox_goodwin() -> Self {
        Self {
            beta: 1.0 / 12.0,
            gamma: 0.5,
        }
    }

    fn validate(self) -> Result<Self> {
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(FemError::InvalidParameter {
                name: "beta",
                reason: format!("must be positive, got {}", self.beta),
            });
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(FemError::InvalidParameter {
                name: "gamma",
                reason: format!("must be positive, got {}", self.gamma),
            });
        }
        Ok(self)
    }
}

impl Default for NewmarkConfig {
    fn default() -> Self {
        Self::average_acceleration()
    }
}

/// One-step time integrator driven by the nonlinear solver.
pub trait TimeIntegrator {
    /// Set the initial state and the time step.
    fn init(
        &mut self,
        x_prev: DVector<f64>,
        v_prev: DVector<f64>,
        a_prev: DVector<f64>,
        dt: f64,
    ) -> Result<()>;

    fn set_parameters(&mut self, params: &Value) -> Result<()>;

    /// Accept `x` as the new position and advance velocity and acceleration.
    fn update_quantities(&mut self, x: &DVector<f64>) -> Result<()>;

    /// Predicted position, independent of the new acceleration
    fn x_tilde(&self) -> Result<DVector<f64>>;

    fn compute_velocity(&self, x: &DVector<f64>) -> Result<DVector<f64>>;

    fn compute_acceleration(&self, v: &DVector<f64>) -> Result<DVector<f64>>;

    /// Factor multiplying the acceleration in x = x̃ + s a
    fn acceleration_scaling(&self) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq)]
struct State {
    x_prev: DVector<f64>,
    v_prev: DVector<f64>,
    a_prev: DVector<f64>,
    dt: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ImplicitNewmark {
    config: NewmarkConfig,
    state: Option<State>,
}

impl ImplicitNewmark {
    pub fn new(config: NewmarkConfig) -> Result<Self> {
        Ok(Self {
            config: config.validate()?,
            state: None,
        })
    }

    pub fn beta(&self) -> f64 {
        self.config.beta
    }

    pub fn gamma(&self) -> f64 {
        self.config.gamma
    }

    pub fn config(&self) -> NewmarkConfig {
        self.config
    }

    pub fn dt(&self) -> Result<f64> {
        Ok(self.state()?.dt)
    }

    pub fn x_prev(&self) -> Result<&DVector<f64>> {
        Ok(&self.state()?.x_prev)
    }

    pub fn v_prev(&self) -> Result<&DVector<f64>> {
        Ok(&self.state()?.v_prev)
    }

    pub fn a_prev(&self) -> Result<&DVector<f64>> {
        Ok(&self.state()?.a_prev)
    }

    fn state(&self) -> Result<&State> {
        self.state.as_ref().ok_or(FemError::NotInitialized)
    }

    fn check_len(state: &State, context: &'static str, found: usize) -> Result<()> {
        if found != state.x_prev.len() {
            return Err(FemError::SizeMismatch {
                context,
                expected: state.x_prev.len(),
                found,
            });
        }
        Ok(())
    }
}

impl TimeIntegrator for ImplicitNewmark {
    fn init(
        &mut self,
        x_prev: DVector<f64>,
        v_prev: DVector<f64>,
        a_prev: DVector<f64>,
        dt: f64,
    ) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(FemError::InvalidParameter {
                name: "dt",
                reason: format!("must be positive, got {}", dt),
            });
        }
        let state = State {
            x_prev,
            v_prev,
            a_prev,
            dt,
        };
        Self::check_len(&state, "initial velocity", state.v_prev.len())?;
        Self::check_len(&state, "initial acceleration", state.a_prev.len())?;

        debug!(
            "Newmark init: {} dofs, dt = {}, beta = {}, gamma = {}",
            state.x_prev.len(),
            dt,
            self.config.beta,
            self.config.gamma
        );
        self.state = Some(state);
        Ok(())
    }

    fn set_parameters(&mut self, params: &Value) -> Result<()> {
        let config: NewmarkConfig = serde_json::from_value(params.clone())?;
        self.config = config.validate()?;
        Ok(())
    }

    fn update_quantities(&mut self, x: &DVector<f64>) -> Result<()> {
        let v = self.compute_velocity(x)?;
        let a = self.compute_acceleration(&v)?;
        let state = self.state.as_mut().ok_or(FemError::NotInitialized)?;
        state.a_prev = a;
        state.v_prev = v;
        state.x_prev = x.clone();
        Ok(())
    }

    fn x_tilde(&self) -> Result<DVector<f64>> {
        let s = self.state()?;
        let dt = s.dt;
        Ok(&s.x_prev + (&s.v_prev + &s.a_prev * (dt * (0.5 - self.beta()))) * dt)
    }

    fn compute_velocity(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let s = self.state()?;
        Self::check_len(s, "position", x.len())?;
        let c = self.gamma() / self.beta();
        let dt = s.dt;
        Ok((x - &s.x_prev) * (c / dt) + &s.v_prev * (1.0 - c) + &s.a_prev * ((1.0 - c / 2.0) * dt))
    }

    fn compute_acceleration(&self, v: &DVector<f64>) -> Result<DVector<f64>> {
        let s = self.state()?;
        Self::check_len(s, "velocity", v.len())?;
        let gamma = self.gamma();
        let dt = s.dt;
        Ok((v - &s.v_prev - &s.a_prev * ((1.0 - gamma) * dt)) / (gamma * dt))
    }

    fn acceleration_scaling(&self) -> Result<f64> {
        let dt = self.dt()?;
        Ok(self.beta() * dt * dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn constant_acceleration(config: NewmarkConfig) {
        // x(t) = x0 + v0 t + a t²/2 is integrated exactly by every Newmark variant
        let x0 = DVector::from_vec(vec![1.0, -2.0]);
        let v0 = DVector::from_vec(vec![0.5, 3.0]);
        let a = DVector::from_vec(vec![-9.81, 1.5]);
        let dt = 0.1;
        let exact = |t: f64| &x0 + &v0 * t + &a * (0.5 * t * t);

        let mut integrator = ImplicitNewmark::new(config).unwrap();
        integrator.init(x0.clone(), v0.clone(), a.clone(), dt).unwrap();

        for step in 1..=5 {
            let t = step as f64 * dt;
            let x = integrator.x_tilde().unwrap() + &a * integrator.acceleration_scaling().unwrap();
            assert_relative_eq!(x, exact(t), epsilon = 1e-12);

            integrator.update_quantities(&x).unwrap();
            assert_relative_eq!(*integrator.v_prev().unwrap(), &v0 + &a * t, epsilon = 1e-10);
            assert_relative_eq!(*integrator.a_prev().unwrap(), a.clone(), epsilon = 1e-8);
        }
    }

    #[test]
    fn presets_integrate_constant_acceleration_exactly() {
        constant_acceleration(NewmarkConfig::average_acceleration());
        constant_acceleration(NewmarkConfig::linear_acceleration());
        constant_acceleration(NewmarkConfig::fox_goodwin());
    }

    #[test]
    fn acceleration_scaling_is_beta_dt_squared() {
        let mut integrator = ImplicitNewmark::default();
        let zero = DVector::zeros(3);
        integrator.init(zero.clone(), zero.clone(), zero, 0.2).unwrap();
        assert_relative_eq!(integrator.acceleration_scaling().unwrap(), 0.25 * 0.04);
    }

    #[test]
    fn set_parameters_reads_beta_and_gamma() {
        let mut integrator = ImplicitNewmark::default();
        integrator
            .set_parameters(&json!({ "beta": 0.3, "gamma": 0.6, "type": "ImplicitNewmark" }))
            .unwrap();
        assert_eq!(integrator.beta(), 0.3);
        assert_eq!(integrator.gamma(), 0.6);

        assert!(matches!(
            integrator.set_parameters(&json!({ "beta": 0.3 })),
            Err(FemError::Json(_))
        ));
        assert!(matches!(
            integrator.set_parameters(&json!({ "beta": 0.0, "gamma": 0.5 })),
            Err(FemError::InvalidParameter { name: "beta", .. })
        ));
        // Failed updates leave the previous parameters in place
        assert_eq!(integrator.beta(), 0.3);
    }

    #[test]
    fn requires_init_and_matching_sizes() {
        let integrator = ImplicitNewmark::default();
        assert!(matches!(integrator.x_tilde(), Err(FemError::NotInitialized)));
        assert!(matches!(integrator.acceleration_scaling(), Err(FemError::NotInitialized)));

        let mut integrator = ImplicitNewmark::default();
        assert!(matches!(
            integrator.init(DVector::zeros(2), DVector::zeros(3), DVector::zeros(2), 0.1),
            Err(FemError::SizeMismatch { context: "initial velocity", .. })
        ));
        assert!(matches!(
            integrator.init(DVector::zeros(2), DVector::zeros(2), DVector::zeros(2), 0.0),
            Err(FemError::InvalidParameter { name: "dt", .. })
        ));

        integrator
            .init(DVector::zeros(2), DVector::zeros(2), DVector::zeros(2), 0.1)
            .unwrap();
        assert!(matches!(
            integrator.compute_velocity(&DVector::zeros(4)),
            Err(FemError::SizeMismatch { context: "position", .. })
        ));
    }
}
