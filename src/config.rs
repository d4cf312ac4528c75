use crate::{
    errors::{ConfigError, ConfigResult},
    models::retention::{DEFAULT_DAILY_BACKUPS, DEFAULT_WEEKLY_BACKUPS, RetentionConfig},
    services::rotation_service::RotationJob,
    storage::s3_store::S3Config,
};
use clap::{Parser, ValueEnum};
use std::{env, fmt::Display, str::FromStr, time::Duration};

const BUCKET_NAME_MIN_LEN: usize = 3;
const BUCKET_NAME_MAX_LEN: usize = 63;

/// Which storage collaborator the rotation talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Amazon S3 or an S3-compatible service.
    S3,
    /// Local directory, one sub-directory per bucket.
    Fs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bucket: String,
    pub prefix: String,
    pub extension: String,
    pub dry_run: bool,
    pub retention: RetentionConfig,
    pub backend: Backend,
    pub s3: S3Config,
    pub storage_dir: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Rotate dated backup archives in a bucket (grandfather-father-son)"
)]
pub struct Args {
    /// The bucket holding the backups (overrides ROTATE_BUCKET)
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Key prefix of the backup files (overrides ROTATE_PREFIX) [default: jenkins-backup]
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// File extension of the backup files (overrides ROTATE_EXTENSION) [default: .tar.gz]
    #[arg(short, long)]
    pub extension: Option<String>,

    /// Only show how backups would rotate
    #[arg(short, long)]
    pub dry_run: bool,

    /// Most recent backups kept untouched (overrides ROTATE_DAILY_BACKUPS) [default: 7]
    #[arg(long)]
    pub daily_backups: Option<usize>,

    /// Weekly backups kept before the monthly tier (overrides ROTATE_WEEKLY_BACKUPS) [default: 4]
    #[arg(long)]
    pub weekly_backups: Option<usize>,

    /// Storage backend (overrides ROTATE_BACKEND) [default: s3]
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Access key id (falls back to AWS_ACCESS_KEY_ID, then the provider chain)
    #[arg(long)]
    pub access_key: Option<String>,

    /// Secret access key (falls back to AWS_SECRET_ACCESS_KEY, then the provider chain)
    #[arg(long)]
    pub secret_key: Option<String>,

    /// Region of the bucket (falls back to AWS_DEFAULT_REGION / AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint of an S3-compatible service (overrides ROTATE_ENDPOINT, AWS_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Root directory for the fs backend (overrides ROTATE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Per-request timeout in seconds for the s3 backend (overrides ROTATE_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Log level; falls back to RUST_LOG, then info
    #[arg(short, long, value_enum)]
    pub verbosity: Option<LogLevel>,
}

impl AppConfig {
    /// Merge parsed CLI args with `ROTATE_*` environment variables.
    pub fn from_env_and_args(args: Args) -> ConfigResult<Self> {
        Self::resolve(args, |name| env::var(name))
    }

    /// Same as `from_env_and_args`, reading the environment through `lookup`.
    pub fn resolve<F>(args: Args, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Result<String, env::VarError>,
    {
        // --- Environment fallback ---
        let env_bucket = env_string(&lookup, "ROTATE_BUCKET")?;
        let env_prefix = env_string(&lookup, "ROTATE_PREFIX")?;
        let env_extension = env_string(&lookup, "ROTATE_EXTENSION")?;
        let env_daily = env_parse::<usize, _>(&lookup, "ROTATE_DAILY_BACKUPS")?;
        let env_weekly = env_parse::<usize, _>(&lookup, "ROTATE_WEEKLY_BACKUPS")?;
        let env_backend = match env_string(&lookup, "ROTATE_BACKEND")? {
            Some(value) => Some(Backend::from_str(&value, true).map_err(|reason| {
                ConfigError::InvalidEnvValue {
                    var: "ROTATE_BACKEND",
                    value,
                    reason,
                }
            })?),
            None => None,
        };
        let env_endpoint = env_string(&lookup, "ROTATE_ENDPOINT")?;
        let env_storage = env_string(&lookup, "ROTATE_STORAGE_DIR")?;
        let env_timeout = env_parse::<u64, _>(&lookup, "ROTATE_TIMEOUT_SECS")?;

        // --- Merge ---
        let bucket = args
            .bucket
            .or(env_bucket)
            .ok_or(ConfigError::MissingBucket)?;
        ensure_bucket_name_safe(&bucket)?;

        let prefix = args
            .prefix
            .or(env_prefix)
            .unwrap_or_else(|| "jenkins-backup".into());
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }

        let retention = RetentionConfig::new(
            args.daily_backups
                .or(env_daily)
                .unwrap_or(DEFAULT_DAILY_BACKUPS),
            args.weekly_backups
                .or(env_weekly)
                .unwrap_or(DEFAULT_WEEKLY_BACKUPS),
        );

        let s3_bucket = bucket.clone();
        Ok(Self {
            bucket,
            prefix,
            extension: args
                .extension
                .or(env_extension)
                .unwrap_or_else(|| ".tar.gz".into()),
            dry_run: args.dry_run,
            retention,
            backend: args.backend.or(env_backend).unwrap_or(Backend::S3),
            s3: S3Config {
                bucket: s3_bucket,
                region: args.region,
                access_key: args.access_key,
                secret_key: args.secret_key,
                endpoint: args.endpoint.or(env_endpoint),
                timeout: Duration::from_secs(args.timeout_secs.or(env_timeout).unwrap_or(30)),
            },
            storage_dir: args
                .storage_dir
                .or(env_storage)
                .unwrap_or_else(|| "./data/objects".into()),
        })
    }

    pub fn job(&self) -> RotationJob {
        RotationJob {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            extension: self.extension.clone(),
            retention: self.retention,
            dry_run: self.dry_run,
        }
    }
}

fn env_string<F>(lookup: &F, var: &'static str) -> ConfigResult<Option<String>>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match lookup(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::UnreadableEnv { var, source }),
    }
}

fn env_parse<T, F>(lookup: &F, var: &'static str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Result<String, env::VarError>,
{
    let Some(value) = env_string(lookup, var)? else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    match parsed {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => Err(ConfigError::InvalidEnvValue {
            var,
            reason: err.to_string(),
            value,
        }),
    }
}

/// Validate bucket name format.
///
/// Enforces S3-like naming rules:
/// - 3–63 characters
/// - lowercase letters, digits, dots, hyphens only
/// - cannot start/end with dot or hyphen
/// - cannot contain consecutive dots or dot-hyphen patterns
/// - cannot look like an IPv4 address
fn ensure_bucket_name_safe(name: &str) -> ConfigResult<()> {
    let invalid = |reason: &str| {
        Err(ConfigError::InvalidBucketName {
            name: name.to_string(),
            reason: reason.into(),
        })
    };

    let len = name.len();
    if !(BUCKET_NAME_MIN_LEN..=BUCKET_NAME_MAX_LEN).contains(&len) {
        return invalid("must be between 3 and 63 characters");
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '.' | '-'))
    {
        return invalid("allowed characters are lowercase letters, digits, dots, and hyphens");
    }
    if name.starts_with(['.', '-']) || name.ends_with(['.', '-']) {
        return invalid("must start and end with a lowercase letter or digit");
    }
    if name.contains("..") || name.contains("-.") || name.contains(".-") {
        return invalid("cannot contain consecutive dots or dot-hyphen combinations");
    }
    if is_ipv4_like(name) {
        return invalid("must not be formatted like an IP address");
    }
    Ok(())
}

/// Check if a string matches IPv4-like dotted decimal form.
fn is_ipv4_like(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() == 4
        && parts.iter().all(|segment| {
            !segment.is_empty()
                && segment.len() <= 3
                && segment.chars().all(|c| c.is_ascii_digit())
                && segment.parse::<u8>().is_ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(argv: &[&str], vars: &[(&str, &str)]) -> ConfigResult<AppConfig> {
        let mut full = vec!["backup-rotate"];
        full.extend_from_slice(argv);
        let args = Args::try_parse_from(full).unwrap();
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::resolve(args, |name| {
            vars.get(name).cloned().ok_or(env::VarError::NotPresent)
        })
    }

    #[test]
    fn defaults_follow_classic_jenkins_layout() {
        let cfg = resolve(&["--bucket", "ci-backups"], &[]).unwrap();
        assert_eq!(cfg.bucket, "ci-backups");
        assert_eq!(cfg.prefix, "jenkins-backup");
        assert_eq!(cfg.extension, ".tar.gz");
        assert!(!cfg.dry_run);
        assert_eq!(cfg.retention, RetentionConfig::new(7, 4));
        assert_eq!(cfg.backend, Backend::S3);
        assert_eq!(cfg.s3.bucket, "ci-backups");
        assert_eq!(cfg.s3.endpoint, None);
        assert_eq!(cfg.s3.access_key, None);
        assert_eq!(cfg.s3.timeout, Duration::from_secs(30));
    }

    #[test]
    fn short_flags_parse() {
        let cfg = resolve(
            &["-b", "ci-backups", "-p", "nexus", "-e", ".zip", "-d", "-v", "debug"],
            &[],
        )
        .unwrap();
        assert_eq!(cfg.prefix, "nexus");
        assert_eq!(cfg.extension, ".zip");
        assert!(cfg.dry_run);
    }

    #[test]
    fn flags_override_environment() {
        let cfg = resolve(
            &["--bucket", "from-flag", "--daily-backups", "3"],
            &[
                ("ROTATE_BUCKET", "from-env"),
                ("ROTATE_DAILY_BACKUPS", "5"),
                ("ROTATE_WEEKLY_BACKUPS", "2"),
                ("ROTATE_BACKEND", "FS"),
                ("ROTATE_STORAGE_DIR", "/srv/buckets"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.bucket, "from-flag");
        assert_eq!(cfg.retention, RetentionConfig::new(3, 2));
        assert_eq!(cfg.backend, Backend::Fs);
        assert_eq!(cfg.storage_dir, "/srv/buckets");
    }

    #[test]
    fn explicit_credentials_reach_the_s3_settings() {
        let cfg = resolve(
            &[
                "-b",
                "ci-backups",
                "--access-key",
                "AKIDEXAMPLE",
                "--secret-key",
                "wJalrXUtnFEMI",
                "--region",
                "eu-west-1",
            ],
            &[("ROTATE_ENDPOINT", "http://minio.local:9000")],
        )
        .unwrap();
        assert_eq!(cfg.s3.access_key.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(cfg.s3.secret_key.as_deref(), Some("wJalrXUtnFEMI"));
        assert_eq!(cfg.s3.region.as_deref(), Some("eu-west-1"));
        assert_eq!(cfg.s3.endpoint.as_deref(), Some("http://minio.local:9000"));
        assert!(!format!("{:?}", cfg).contains("wJalrXUtnFEMI"));
    }

    #[test]
    fn missing_bucket_is_a_config_error() {
        assert!(matches!(resolve(&[], &[]), Err(ConfigError::MissingBucket)));
    }

    #[test]
    fn bad_env_numbers_are_rejected() {
        let err = resolve(&["-b", "ci-backups"], &[("ROTATE_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvValue { var: "ROTATE_TIMEOUT_SECS", .. }
        ));
        let err = resolve(&["-b", "ci-backups"], &[("ROTATE_BACKEND", "ftp")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvValue { var: "ROTATE_BACKEND", .. }));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(matches!(
            resolve(&["-b", "ci-backups", "--prefix", ""], &[]),
            Err(ConfigError::EmptyPrefix)
        ));
    }

    #[test]
    fn bucket_names_follow_s3_rules() {
        let longest = "a".repeat(63);
        for ok in ["abc", "ci-backups", "my.backups.2023", longest.as_str()] {
            assert!(ensure_bucket_name_safe(ok).is_ok(), "{ok}");
        }
        for bad in [
            "ab",
            "Backups",
            "-backups",
            "backups.",
            "back..ups",
            "back.-ups",
            "under_score",
            "../etc",
            "192.168.1.10",
        ] {
            assert!(
                matches!(
                    ensure_bucket_name_safe(bad),
                    Err(ConfigError::InvalidBucketName { .. })
                ),
                "{bad}"
            );
        }
    }
}
