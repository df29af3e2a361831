//! Cálculo numérico de los stages: split, estandarización, estimador y
//! métricas. Sin IO ni dependencias del core.
pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;
