// self
use crate::{auth::ProviderId, obs::LoginOutcomeLabel};

/// Records a login lifecycle label via the global metrics recorder (when enabled).
pub fn record_login_outcome(provider: &ProviderId, outcome: LoginOutcomeLabel) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oauth2_webflow_login_total",
			"provider" => provider.to_string(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (provider, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_login_outcome_is_safe_without_recorder() {
		let provider = ProviderId::new("provider-test").expect("Provider fixture should be valid.");

		record_login_outcome(&provider, LoginOutcomeLabel::Cancelled);
	}
}
