//! Backoff schedule inspection.

use anyhow::Result;
use anyhow::ensure;
use clap::Args;
use zlock::LockClientConfig;
use zlock::pure::compute_backoff_ceiling_ms;

use crate::output::Outputable;
use crate::output::print_output;

/// Upper bound on `--collisions`.
const MAX_COLLISIONS: u32 = 64;

#[derive(Args)]
pub struct BackoffArgs {
    /// Backoff base in milliseconds (defaults to the configured value).
    #[arg(long = "retry-wait-ms")]
    pub retry_wait_ms: Option<u64>,

    /// Number of collisions to show.
    #[arg(long, default_value = "8")]
    pub collisions: u32,
}

/// Backoff schedule output.
pub struct BackoffOutput {
    pub retry_wait_ms: u64,
    pub ceilings_ms: Vec<u64>,
}

impl Outputable for BackoffOutput {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "retry_wait_ms": self.retry_wait_ms,
            "ceilings_ms": self.ceilings_ms
        })
    }

    fn to_human(&self) -> String {
        let mut out = format!("Backoff schedule (base {} ms)\n", self.retry_wait_ms);
        out.push_str("Collision  Max delay (ms)");
        for (collision, ceiling) in self.ceilings_ms.iter().enumerate() {
            out.push_str(&format!("\n{:>9}  {:>14}", collision, ceiling));
        }
        out
    }
}

impl BackoffArgs {
    /// Execute the backoff command.
    pub fn run(self, config: &LockClientConfig, json: bool) -> Result<()> {
        ensure!(
            self.collisions <= MAX_COLLISIONS,
            "--collisions must be at most {MAX_COLLISIONS}"
        );
        let retry_wait_ms = self.retry_wait_ms.unwrap_or(config.default_initial_retry_wait_ms);
        let output = BackoffOutput {
            retry_wait_ms,
            ceilings_ms: (0..self.collisions).map(|c| compute_backoff_ceiling_ms(c, retry_wait_ms)).collect(),
        };
        print_output(&output, json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_output_formats() {
        let output = BackoffOutput {
            retry_wait_ms: 100,
            ceilings_ms: (0..5).map(|c| compute_backoff_ceiling_ms(c, 100)).collect(),
        };
        assert_eq!(output.to_json()["ceilings_ms"], serde_json::json!([100, 200, 400, 800, 1000]));
        assert!(output.to_human().ends_with("        4            1000"));
    }
}
