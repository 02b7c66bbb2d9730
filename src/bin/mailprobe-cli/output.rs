use std::str::FromStr;

use anyhow::{Context, Result, bail};
use mailprobe_lib::{ResultStatus, VerificationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Human,
    Json,
    Ndjson,
    Csv,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            "csv" => Ok(Self::Csv),
            other => bail!("unknown --format '{other}', use: human|json|ndjson|csv"),
        }
    }
}

pub fn write_reports(results: &[VerificationResult], format: Format, out: Option<&str>) -> Result<()> {
    match format {
        Format::Human => emit(human_report(results).as_bytes(), out),
        Format::Json => write_json(results, out),
        Format::Ndjson => write_ndjson(results, out),
        Format::Csv => write_csv(results, out),
    }
}

/// Codes de sortie : 0 OK, 2 invalides, 1 fatal ou vérification avortée.
pub fn exit_code(results: &[VerificationResult]) -> i32 {
    if results.iter().any(|r| r.status == ResultStatus::Error) {
        1
    } else if results.iter().any(VerificationResult::is_invalid) {
        2
    } else {
        0
    }
}

/// One line per address, evidence indented below it.
pub fn human_report(results: &[VerificationResult]) -> String {
    let mut lines = Vec::new();
    for result in results {
        let label = format!("[{}]", result.status);
        lines.push(format!("{label:<9} {} :: {}", result.email, result.reason));

        let Some(evidence) = &result.evidence else {
            continue;
        };
        for attempt in &evidence.attempts {
            lines.push(format!(
                "        smtp: {} (prio {}) -> {}",
                attempt.target.host, attempt.target.priority, attempt.outcome
            ));
        }
        for record in evidence.reputation.iter().filter(|r| !r.is_error()) {
            lines.push(format!(
                "        reputation: {} score={} reports={}",
                record.ip, record.confidence_score, record.total_reports
            ));
        }
        for note in &evidence.notes {
            lines.push(format!("        note: {note}"));
        }
    }
    let mut report = lines.join("\n");
    if !report.is_empty() {
        report.push('\n');
    }
    report
}

fn emit(bytes: &[u8], out: Option<&str>) -> Result<()> {
    match out {
        Some(path) => write_all_atomically(path, bytes),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(feature = "with-serde")]
fn write_json(results: &[VerificationResult], out: Option<&str>) -> Result<()> {
    let mut s = serde_json::to_string_pretty(results)?;
    s.push('\n');
    emit(s.as_bytes(), out)
}

#[cfg(not(feature = "with-serde"))]
fn write_json(_: &[VerificationResult], _: Option<&str>) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-serde")]
fn write_ndjson(results: &[VerificationResult], out: Option<&str>) -> Result<()> {
    let mut buf = Vec::new();
    for result in results {
        let line = serde_json::to_string(result)?;
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }
    emit(&buf, out)
}

#[cfg(not(feature = "with-serde"))]
fn write_ndjson(_: &[VerificationResult], _: Option<&str>) -> Result<()> {
    bail!("format=ndjson nécessite la feature 'with-serde'")
}

#[cfg(feature = "with-csv")]
fn write_csv(results: &[VerificationResult], out: Option<&str>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for result in results {
        wtr.write_record(csv_record(result))?;
    }
    let data = wtr.into_inner()?;
    emit(&data, out)
}

#[cfg(not(feature = "with-csv"))]
fn write_csv(_: &[VerificationResult], _: Option<&str>) -> Result<()> {
    bail!("format=csv nécessite la feature 'with-csv'")
}

/// Colonnes stables : job_id, email, status, reason, timestamp, attempts, reputation.
#[cfg(feature = "with-csv")]
fn csv_record(result: &VerificationResult) -> Vec<String> {
    let (attempts, reputation) = match &result.evidence {
        Some(evidence) => (
            evidence
                .attempts
                .iter()
                .map(|a| format!("{}:{}:{}", a.target.host, a.outcome.code, a.outcome.status))
                .collect::<Vec<_>>()
                .join("|"),
            evidence
                .reputation
                .iter()
                .map(|r| match &r.error {
                    Some(_) => format!("{}:unavailable", r.ip),
                    None => format!("{}:{}", r.ip, r.confidence_score),
                })
                .collect::<Vec<_>>()
                .join("|"),
        ),
        None => (String::new(), String::new()),
    };
    vec![
        result.job_id.clone(),
        result.email.clone(),
        result.status.to_string(),
        result.reason.clone(),
        result.timestamp.to_rfc3339(),
        attempts,
        reputation,
    ]
}

fn write_all_atomically(path: &str, bytes: &[u8]) -> Result<()> {
    use std::io::Write;

    let tmp = format!("{path}.tmp");
    {
        let mut f = std::fs::File::create(&tmp).with_context(|| format!("create {tmp}"))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    std::fs::rename(&tmp, path).with_context(|| format!("rename {tmp} -> {path}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mailprobe_lib::{
        Evidence, MailTarget, ProbeOutcome, ReputationRecord, ReputationReport, TargetAttempt,
    };

    use super::*;

    fn result(email: &str, status: ResultStatus, reason: &str, evidence: Option<Evidence>) -> VerificationResult {
        VerificationResult {
            job_id: "00000000000000aa".to_string(),
            email: email.to_string(),
            status,
            reason: reason.to_string(),
            timestamp: Utc::now(),
            evidence,
        }
    }

    fn sample() -> Vec<VerificationResult> {
        let evidence = Evidence {
            targets: vec![
                MailTarget::new("mail1.example-mx.test", 10),
                MailTarget::new("mail2.example-mx.test", 20),
            ],
            attempts: vec![
                TargetAttempt {
                    target: MailTarget::new("mail1.example-mx.test", 10),
                    outcome: ProbeOutcome::inconclusive(0, "timeout"),
                },
                TargetAttempt {
                    target: MailTarget::new("mail2.example-mx.test", 20),
                    outcome: ProbeOutcome::confirmed(250, "mailbox confirmed"),
                },
            ],
            reputation: vec![
                ReputationRecord::from_report(
                    "192.0.2.20",
                    ReputationReport::new("192.0.2.20", 0, 0),
                    Utc::now(),
                ),
                ReputationRecord::from_error("192.0.2.21", "reputation lookup timed out", Utc::now()),
            ],
            notes: vec!["reputation unavailable for 192.0.2.21: reputation lookup timed out".to_string()],
            ..Evidence::default()
        };
        vec![
            result("user@example-mx.test", ResultStatus::Valid, "mailbox confirmed", Some(evidence)),
            result(
                "not-an-address",
                ResultStatus::Invalid,
                "invalid email format: missing '@'",
                None,
            ),
            result("user@slow.test", ResultStatus::Error, "verification deadline exceeded", None),
        ]
    }

    #[test]
    fn human_report_lists_evidence_under_each_address() {
        insta::assert_snapshot!(human_report(&sample()), @r"
        [VALID]   user@example-mx.test :: mailbox confirmed
                smtp: mail1.example-mx.test (prio 10) -> inconclusive (0 timeout)
                smtp: mail2.example-mx.test (prio 20) -> confirmed (250 mailbox confirmed)
                reputation: 192.0.2.20 score=0 reports=0
                note: reputation unavailable for 192.0.2.21: reputation lookup timed out
        [INVALID] not-an-address :: invalid email format: missing '@'
        [ERROR]   user@slow.test :: verification deadline exceeded
        ");
    }

    #[test]
    fn empty_batch_prints_nothing() {
        assert_eq!(human_report(&[]), "");
    }

    #[test]
    fn aborted_verifications_exit_as_fatal() {
        let results = sample();
        assert_eq!(exit_code(&results), 1);
        assert_eq!(exit_code(&results[2..]), 1);
    }

    #[test]
    fn invalid_results_exit_with_two() {
        let results = sample();
        assert_eq!(exit_code(&results[..2]), 2);
        assert_eq!(exit_code(&results[..1]), 0);
        assert_eq!(exit_code(&[]), 0);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "xml".parse::<Format>().expect_err("unknown");
        assert_eq!(err.to_string(), "unknown --format 'xml', use: human|json|ndjson|csv");
        assert_eq!("ndjson".parse::<Format>().expect("known"), Format::Ndjson);
    }

    #[cfg(feature = "with-csv")]
    #[test]
    fn csv_columns_are_stable() {
        let record = csv_record(&sample()[0]);
        assert_eq!(record[0], "00000000000000aa");
        assert_eq!(record[2], "VALID");
        assert_eq!(
            record[5],
            "mail1.example-mx.test:0:inconclusive|mail2.example-mx.test:250:confirmed"
        );
        assert_eq!(record[6], "192.0.2.20:0|192.0.2.21:unavailable");
    }

    #[test]
    fn atomic_write_replaces_the_target() {
        let dir = std::env::temp_dir().join(format!("mailprobe-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("dir");
        let path = dir.join("report.txt");
        let path = path.to_str().expect("utf8 path");

        write_all_atomically(path, b"first").expect("write");
        write_all_atomically(path, b"second").expect("rewrite");

        assert_eq!(std::fs::read_to_string(path).expect("read"), "second");
        assert!(!std::path::Path::new(&format!("{path}.tmp")).exists());
        std::fs::remove_dir_all(&dir).ok();
    }
}
