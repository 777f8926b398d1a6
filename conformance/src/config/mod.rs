use std::path::PathBuf;
use std::time::Duration;

use crate::errors::SetupError;
use crate::suite::SuiteKind;

pub const DEFAULT_COMPILER: &str = "./bin/c2p";
pub const DEFAULT_VM: &str = "./Pmachine/Pmachine";
pub const DEFAULT_FIXTURE_ROOT: &str = "./src/test/input/codegen";
pub const DEFAULT_SCRATCH_DIR: &str = "./temp";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Subdirectory of the fixture root holding programs that must not compile.
pub const INVALID_SUBDIR: &str = "fail";

/// Everything a suite run needs to know about its surroundings.
///
/// Two runs sharing one `scratch_dir` write the same file names and will
/// clobber each other; give concurrent runs distinct scratch directories.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub compiler: PathBuf,
    pub vm: PathBuf,
    pub fixture_root: PathBuf,
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
    pub source_extension: String,
    pub expected_suffix: String,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            compiler: PathBuf::from(DEFAULT_COMPILER),
            vm: PathBuf::from(DEFAULT_VM),
            fixture_root: PathBuf::from(DEFAULT_FIXTURE_ROOT),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            timeout: DEFAULT_TIMEOUT,
            source_extension: "c".to_string(),
            expected_suffix: ".out".to_string(),
        }
    }
}

/// Values given on the command line; they win over the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub compiler: Option<PathBuf>,
    pub vm: Option<PathBuf>,
    pub fixture_root: Option<PathBuf>,
    pub scratch_dir: Option<PathBuf>,
    pub timeout_secs: Option<f64>,
}

impl SuiteConfig {
    /// Resolve each field from `overrides`, then `C2P_*` environment
    /// variables, then the built-in default.
    pub fn resolve(overrides: Overrides) -> Result<Self, SetupError> {
        Self::resolve_with(overrides, |name| std::env::var(name).ok())
    }

    pub fn resolve_with(
        overrides: Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SetupError> {
        let defaults = Self::default();
        let path = |flag: Option<PathBuf>, var: &str, default: PathBuf| {
            flag.or_else(|| env(var).map(PathBuf::from))
                .unwrap_or(default)
        };

        let timeout = match overrides.timeout_secs {
            Some(secs) => timeout_from_secs("--timeout", &secs.to_string(), secs)?,
            None => match env("C2P_TIMEOUT_SECS") {
                Some(raw) => {
                    let secs = raw.trim().parse::<f64>().map_err(|_| SetupError::InvalidConfig {
                        name: "C2P_TIMEOUT_SECS",
                        value: raw.clone(),
                    })?;
                    timeout_from_secs("C2P_TIMEOUT_SECS", &raw, secs)?
                }
                None => defaults.timeout,
            },
        };

        Ok(Self {
            compiler: path(overrides.compiler, "C2P_COMPILER", defaults.compiler),
            vm: path(overrides.vm, "C2P_VM", defaults.vm),
            fixture_root: path(overrides.fixture_root, "C2P_FIXTURES", defaults.fixture_root),
            scratch_dir: path(overrides.scratch_dir, "C2P_SCRATCH", defaults.scratch_dir),
            timeout,
            ..defaults
        })
    }

    /// Directory holding the inputs of one suite class.
    pub fn fixture_dir(&self, kind: SuiteKind) -> PathBuf {
        match kind {
            SuiteKind::Valid => self.fixture_root.clone(),
            SuiteKind::Invalid => self.fixture_root.join(INVALID_SUBDIR),
        }
    }
}

fn timeout_from_secs(name: &'static str, raw: &str, secs: f64) -> Result<Duration, SetupError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SetupError::InvalidConfig {
            name,
            value: raw.to_string(),
        });
    }
    Ok(Duration::from_secs_f64(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_env_or_flags() {
        let config = SuiteConfig::resolve_with(Overrides::default(), env_of(&[])).unwrap();
        assert_eq!(config.compiler, PathBuf::from(DEFAULT_COMPILER));
        assert_eq!(config.vm, PathBuf::from(DEFAULT_VM));
        assert_eq!(config.scratch_dir, PathBuf::from(DEFAULT_SCRATCH_DIR));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn flags_win_over_env() {
        let overrides = Overrides {
            compiler: Some(PathBuf::from("/opt/c2p")),
            ..Overrides::default()
        };
        let env = env_of(&[("C2P_COMPILER", "/env/c2p"), ("C2P_VM", "/env/pm")]);
        let config = SuiteConfig::resolve_with(overrides, env).unwrap();
        assert_eq!(config.compiler, PathBuf::from("/opt/c2p"));
        assert_eq!(config.vm, PathBuf::from("/env/pm"));
    }

    #[test]
    fn timeout_from_env() {
        let config =
            SuiteConfig::resolve_with(Overrides::default(), env_of(&[("C2P_TIMEOUT_SECS", "2.5")]))
                .unwrap();
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_bad_timeouts() {
        let err =
            SuiteConfig::resolve_with(Overrides::default(), env_of(&[("C2P_TIMEOUT_SECS", "soon")]))
                .unwrap_err();
        assert!(matches!(err, SetupError::InvalidConfig { name: "C2P_TIMEOUT_SECS", .. }));

        let overrides = Overrides {
            timeout_secs: Some(0.0),
            ..Overrides::default()
        };
        assert!(SuiteConfig::resolve_with(overrides, env_of(&[])).is_err());
    }

    #[test]
    fn invalid_inputs_live_under_fail() {
        let config = SuiteConfig {
            fixture_root: PathBuf::from("fixtures"),
            ..SuiteConfig::default()
        };
        assert_eq!(config.fixture_dir(SuiteKind::Valid), PathBuf::from("fixtures"));
        assert_eq!(
            config.fixture_dir(SuiteKind::Invalid),
            PathBuf::from("fixtures").join("fail")
        );
    }
}
