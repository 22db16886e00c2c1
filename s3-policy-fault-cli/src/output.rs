use s3_policy_fault_injection::{InjectOutcome, RestoreOutcome, FAULT_STATEMENT_SID};
use std::io::{self, Write};

pub(crate) fn note(msg: &str) {
    let _ = writeln!(io::stderr(), "s3-policy-fault: {}", msg);
}

pub(crate) fn warn(msg: &str) {
    let _ = writeln!(io::stderr(), "s3-policy-fault (warning): {}", msg);
}

pub(crate) fn print_error(err: &anyhow::Error) {
    let _ = writeln!(io::stderr(), "Error: {:#}", err);
}

pub(crate) fn print_inject(bucket: &str, outcome: &InjectOutcome) {
    if outcome.overwrote_backup {
        warn(&format!(
            "a backup for bucket '{}' already existed and was overwritten; \
             the policy saved by the earlier injection is lost",
            bucket
        ));
    }
    if outcome.replaced_fault_statement {
        note(&format!("replaced existing {} statement", outcome.fault_sid));
    }
    let _ = write_inject_summary(&mut io::stderr().lock(), bucket, outcome);
}

pub(crate) fn print_restore(bucket: &str, outcome: &RestoreOutcome) {
    if matches!(
        outcome,
        RestoreOutcome::FaultStatementRemoved { removed: 0, .. }
    ) {
        warn(&format!(
            "bucket '{}' had no {} statement; policy written back unchanged",
            bucket, FAULT_STATEMENT_SID
        ));
    }
    let _ = write_restore_summary(&mut io::stderr().lock(), outcome);
}

fn write_inject_summary<W: Write>(
    w: &mut W,
    bucket: &str,
    outcome: &InjectOutcome,
) -> io::Result<()> {
    if outcome.had_policy {
        writeln!(w, "Original policy saved to {}", outcome.backup_location)?;
    } else {
        writeln!(
            w,
            "Bucket had no policy; empty policy saved to {}",
            outcome.backup_location
        )?;
    }
    writeln!(
        w,
        "Fault injected: {} added to {} (now {} statements total)",
        outcome.fault_sid, bucket, outcome.statement_count
    )
}

fn write_restore_summary<W: Write>(w: &mut W, outcome: &RestoreOutcome) -> io::Result<()> {
    match outcome {
        RestoreOutcome::RestoredFromBackup {
            backup_location,
            statement_count,
        } => {
            writeln!(
                w,
                "Policy restored from {} ({} statements)",
                backup_location, statement_count
            )?;
            writeln!(w, "Backup file {} removed", backup_location)
        }
        RestoreOutcome::BackupWasEmptyPolicyDeleted { backup_location } => {
            writeln!(w, "Original had no statements; bucket policy deleted")?;
            writeln!(w, "Backup file {} removed", backup_location)
        }
        RestoreOutcome::FaultStatementRemoved { remaining, .. } => {
            write_no_backup(w)?;
            writeln!(
                w,
                "{} statement removed; policy updated ({} statements remain)",
                FAULT_STATEMENT_SID, remaining
            )
        }
        RestoreOutcome::FaultWasOnlyStatementPolicyDeleted => {
            write_no_backup(w)?;
            writeln!(
                w,
                "{} was the only statement; bucket policy deleted",
                FAULT_STATEMENT_SID
            )
        }
        RestoreOutcome::NothingToRestore => {
            write_no_backup(w)?;
            writeln!(w, "No bucket policy exists; nothing to restore")
        }
    }
}

fn write_no_backup<W: Write>(w: &mut W) -> io::Result<()> {
    writeln!(
        w,
        "No backup file found; removing {} statement by Sid",
        FAULT_STATEMENT_SID
    )
}
