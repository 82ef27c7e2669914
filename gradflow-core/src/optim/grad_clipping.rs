use crate::error::{GradflowError, Result};
use crate::nn::parameter::Parameter;

/// Clamps every gradient element into `[-clip_value, clip_value]`, in place.
/// Parameters without a gradient are skipped.
pub fn clip_grad_value_(parameters: &[Parameter], clip_value: f64) -> Result<()> {
    if !(clip_value >= 0.0) {
        return Err(GradflowError::ConfigurationError(
            "clip_value must be non-negative".to_string(),
        ));
    }
    for param in parameters {
        param.update_grad(|grad| grad.map_inplace(|v| v.clamp(-clip_value, clip_value)));
    }
    Ok(())
}

/// Scales all gradients by a common factor so that their joint `norm_type`
/// norm does not exceed `max_norm`. `f64::INFINITY` selects the max norm.
///
/// Returns the total norm measured before clipping.
pub fn clip_grad_norm_(parameters: &[Parameter], max_norm: f64, norm_type: f64) -> Result<f64> {
    if !(max_norm >= 0.0) {
        return Err(GradflowError::ConfigurationError(
            "max_norm must be non-negative".to_string(),
        ));
    }
    if !(norm_type > 0.0) {
        return Err(GradflowError::ConfigurationError(
            "norm_type must be positive".to_string(),
        ));
    }

    let grads: Vec<_> = parameters.iter().filter_map(|p| p.grad()).collect();
    let total_norm = if norm_type.is_infinite() {
        grads
            .iter()
            .flat_map(|g| g.data().iter())
            .fold(0.0f64, |acc, v| acc.max(v.abs()))
    } else {
        grads
            .iter()
            .flat_map(|g| g.data().iter())
            .map(|v| v.abs().powf(norm_type))
            .sum::<f64>()
            .powf(1.0 / norm_type)
    };

    let clip_coef = max_norm / (total_norm + 1e-6);
    if clip_coef < 1.0 {
        log::debug!("clipping gradients: total norm {} exceeds {}", total_norm, max_norm);
        for param in parameters {
            param.update_grad(|grad| grad.mul_scalar_(clip_coef));
        }
    }
    Ok(total_norm)
}

#[cfg(test)]
#[path = "grad_clipping_test.rs"]
mod tests;
