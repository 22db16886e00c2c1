mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use s3_policy_fault_injection::{
    FaultInjectionService, FileBackupStore, S3PolicyStore, DEFAULT_PARTITION,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Inject and restore an access-denial fault in an S3 bucket policy
#[derive(Parser, Debug)]
#[command(name = "s3-policy-fault", version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding policy backups (defaults to the executable's directory)
    #[arg(long, env = "S3_POLICY_FAULT_BACKUP_DIR", global = true)]
    backup_dir: Option<PathBuf>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", global = true)]
    region: Option<String>,

    /// AWS named profile
    #[arg(long, env = "AWS_PROFILE", global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Save the bucket policy, then add a FaultInjectionDeny statement for the role
    Inject {
        /// Target S3 bucket name
        #[arg(long)]
        bucket_name: String,

        /// Lambda execution role ARN to deny
        #[arg(long)]
        lambda_role_arn: String,

        /// ARN partition of the bucket
        #[arg(long, env = "S3_POLICY_FAULT_PARTITION", default_value = DEFAULT_PARTITION)]
        partition: String,
    },
    /// Restore the saved bucket policy, or strip the FaultInjectionDeny statement
    Restore {
        /// Target S3 bucket name
        #[arg(long)]
        bucket_name: String,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let backup_store = match cli.backup_dir {
        Some(dir) => FileBackupStore::new(dir),
        None => FileBackupStore::beside_executable()
            .context("Failed to determine the backup directory")?,
    };
    debug!("Backup directory: {:?}", backup_store.dir());

    let policy_store = S3PolicyStore::from_env(cli.region, cli.profile).await;

    match cli.command {
        Commands::Inject {
            bucket_name,
            lambda_role_arn,
            partition,
        } => {
            let service =
                FaultInjectionService::new(policy_store, backup_store).with_partition(partition);
            let outcome = service
                .inject(&bucket_name, &lambda_role_arn)
                .await
                .with_context(|| format!("Failed to inject fault into bucket '{bucket_name}'"))?;
            output::print_inject(&bucket_name, &outcome);
        }
        Commands::Restore { bucket_name } => {
            let service = FaultInjectionService::new(policy_store, backup_store);
            let outcome = service
                .restore(&bucket_name)
                .await
                .with_context(|| format!("Failed to restore policy of bucket '{bucket_name}'"))?;
            output::print_restore(&bucket_name, &outcome);
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inject_arguments() {
        let cli = Cli::try_parse_from([
            "s3-policy-fault",
            "inject",
            "--bucket-name",
            "b1",
            "--lambda-role-arn",
            "arn:aws:iam::123:role/r",
            "-vv",
        ])
        .expect("should parse");

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Inject {
                bucket_name,
                lambda_role_arn,
                partition,
            } => {
                assert_eq!(bucket_name, "b1");
                assert_eq!(lambda_role_arn, "arn:aws:iam::123:role/r");
                assert_eq!(partition, "aws");
            }
            Commands::Restore { .. } => panic!("expected inject"),
        }
    }

    #[test]
    fn test_restore_with_backup_dir() {
        let cli = Cli::try_parse_from([
            "s3-policy-fault",
            "restore",
            "--bucket-name",
            "b1",
            "--backup-dir",
            "/tmp/backups",
        ])
        .expect("should parse");

        assert_eq!(cli.backup_dir, Some(PathBuf::from("/tmp/backups")));
        assert!(matches!(
            cli.command,
            Commands::Restore { ref bucket_name } if bucket_name == "b1"
        ));
    }
}
