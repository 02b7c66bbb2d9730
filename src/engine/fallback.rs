use crate::deadline::{Deadline, Interrupted};
use crate::mx::MailTarget;
use crate::smtp_verify::ProbeOutcome;

use super::types::TargetAttempt;

/// Attempts made by [`probe_until_definitive`], in probe order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackReport {
    pub attempts: Vec<TargetAttempt>,
}

impl FallbackReport {
    /// The outcome that stopped the iteration, if any did.
    pub fn decisive(&self) -> Option<&ProbeOutcome> {
        self.attempts
            .last()
            .map(|attempt| &attempt.outcome)
            .filter(|outcome| outcome.is_definitive())
    }
}

/// Probes `targets` in order until one answers Confirmed or Rejected.
///
/// Targets after the first definitive outcome are never probed. The deadline
/// is checked before every probe.
pub fn probe_until_definitive<F>(
    targets: &[MailTarget],
    deadline: &Deadline,
    mut probe: F,
) -> Result<FallbackReport, Interrupted>
where
    F: FnMut(&MailTarget) -> ProbeOutcome,
{
    let mut attempts = Vec::with_capacity(targets.len());
    for target in targets {
        deadline.check()?;
        let outcome = probe(target);
        let definitive = outcome.is_definitive();
        attempts.push(TargetAttempt {
            target: target.clone(),
            outcome,
        });
        if definitive {
            break;
        }
    }
    Ok(FallbackReport { attempts })
}
