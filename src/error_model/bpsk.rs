use tracing::trace;

use super::{ErrorModel, ber_to_per, q_function};

/// Analytic BPSK-like model: `BER = Q(sqrt(2 * snr))`.
#[derive(Debug, Clone, Default)]
pub struct BpskErrorModel;

impl ErrorModel for BpskErrorModel {
    fn name(&self) -> &'static str {
        "bpsk"
    }

    fn error_probability(&mut self, snr_db: f64, bytes: u32) -> f64 {
        let snr = 10f64.powf(0.1 * snr_db);
        let ber = q_function((2.0 * snr).sqrt());
        let per = ber_to_per(ber, bytes);
        trace!(snr_db, snr_linear = snr, ber, per, bytes, "bpsk error probability");
        per
    }
}
