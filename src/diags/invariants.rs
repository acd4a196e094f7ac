use crate::Float;
use serde::Deserialize;

const FRAC_PI_2: Float = std::f64::consts::FRAC_PI_2 as Float;

/// Parameters of the nonlinear lens. Every key is optional in the
/// `[diag]` table of the config.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LensParams {
    pub alpha: Float,
    pub beta: Float,
    pub tn: Float,
    pub cn: Float,
}

impl Default for LensParams {
    fn default() -> LensParams {
        LensParams {
            alpha: 0.0,
            beta: 1.0,
            tn: 0.4,
            cn: 0.01,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Invariants {
    pub h: Float,
    pub i: Float,
}

/// Maps transverse phase space of one particle to its two invariants
/// of motion. Must be a pure function of its arguments.
pub trait InvariantCalculator {
    fn invariants(&self, params: &LensParams, x: Float, y: Float, px: Float, py: Float)
        -> Invariants;
}

/// Invariants of the Danilov-Nagaitsev elliptic lens, `H` the
/// hamiltonian and `I` the second invariant.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonlinearLens;

impl InvariantCalculator for NonlinearLens {
    fn invariants(
        &self,
        params: &LensParams,
        x: Float,
        y: Float,
        px: Float,
        py: Float,
    ) -> Invariants {
        let sqrt_beta = params.beta.sqrt();
        let norm = 1.0 / (params.cn * sqrt_beta);

        // normalized phase space, in units of the lens scale cn
        let xn = x * norm;
        let yn = y * norm;
        let pxn = (px * params.beta + params.alpha * x) * norm;
        let pyn = (py * params.beta + params.alpha * y) * norm;

        // elliptic coordinates, foci at xn = +-1
        let r1 = ((xn + 1.0) * (xn + 1.0) + yn * yn).sqrt();
        let r2 = ((xn - 1.0) * (xn - 1.0) + yn * yn).sqrt();
        let u = (0.5 * (r1 + r2)).max(1.0);
        let v = (0.5 * (r1 - r2)).max(-1.0).min(1.0);

        let f = u * (u * u - 1.0).sqrt() * u.acosh();
        let g = v * (1.0 - v * v).sqrt() * (v.acos() - FRAC_PI_2);
        // only vanishes at the foci themselves
        let den = (u * u - v * v).max(Float::EPSILON);

        let h = 0.5 * (xn * xn + yn * yn + pxn * pxn + pyn * pyn) + params.tn * (f + g) / den;
        let l = xn * pyn - yn * pxn;
        let i = l * l + pxn * pxn + xn * xn + 2.0 * params.tn * (v * v * f + u * u * g) / den;

        Invariants { h, i }
    }
}
