//! Per-run state handed to test code

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::models::{CaseInfo, RunOptions, StepResult, TestId, Verbosity};
use crate::results::RestartLedger;
use crate::tags::TagSet;
use crate::utils::{ScratchDir, WorkingDir};

/// State shared by every case of one run
#[derive(Debug)]
pub struct RunContext {
    options: RunOptions,
    ledger: RestartLedger,
    datadirs: HashMap<String, PathBuf>,
}

impl RunContext {
    pub fn new(options: RunOptions) -> Self {
        let ledger = RestartLedger::new(options.restart_file.clone());
        Self {
            options,
            ledger,
            datadirs: HashMap::new(),
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub fn ledger(&self) -> &RestartLedger {
        &self.ledger
    }

    /// Data directory of the case's class, computed once per class
    ///
    /// `data/` next to the class source file, or under the working
    /// directory when the source file is unknown.
    pub fn datadir(&mut self, info: &CaseInfo) -> PathBuf {
        let key = info.id.class_key();
        if let Some(dir) = self.datadirs.get(&key) {
            return dir.clone();
        }

        let dir = compute_datadir(info.source_file.as_deref());
        debug!("Data directory for {}: {}", key, dir.display());
        self.datadirs.insert(key, dir.clone());
        dir
    }

    /// Path of `parts` joined under the class data directory
    pub fn datapath(&mut self, info: &CaseInfo, parts: &[&str]) -> PathBuf {
        parts
            .iter()
            .fold(self.datadir(info), |path, part| path.join(part))
    }
}

fn compute_datadir(source_file: Option<&str>) -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_default();
    let base = source_file
        .map(Path::new)
        .and_then(Path::parent)
        .map(|parent| {
            if parent.is_absolute() {
                parent.to_path_buf()
            } else {
                cwd.join(parent)
            }
        })
        .unwrap_or(cwd);
    base.join("data")
}

/// What test code sees of the running case and the run
pub struct Cx<'a> {
    info: &'a mut CaseInfo,
    run: &'a mut RunContext,
}

impl<'a> Cx<'a> {
    pub fn new(info: &'a mut CaseInfo, run: &'a mut RunContext) -> Self {
        Self { info, run }
    }

    pub fn id(&self) -> &TestId {
        &self.info.id
    }

    pub fn info(&self) -> &CaseInfo {
        self.info
    }

    pub fn tags(&self) -> &TagSet {
        &self.info.tags
    }

    pub fn description(&self) -> String {
        self.info.description()
    }

    /// Override the description reported for the current case
    pub fn set_description(&mut self, descr: impl Into<String>) {
        self.info.set_description(Some(descr.into()));
    }

    pub fn datadir(&mut self) -> PathBuf {
        self.run.datadir(self.info)
    }

    pub fn datapath(&mut self, parts: &[&str]) -> PathBuf {
        self.run.datapath(self.info, parts)
    }

    pub fn options(&self) -> &RunOptions {
        self.run.options()
    }

    /// Free-form option set in the config file or environment
    pub fn option(&self, key: &str) -> Option<&str> {
        self.run.options().extra.get(key).map(String::as_str)
    }

    pub fn option_or<'b>(&'b self, key: &str, default: &'b str) -> &'b str {
        self.option(key).unwrap_or(default)
    }

    pub fn verbosity(&self) -> Verbosity {
        self.run.options().verbosity
    }

    /// Run `f` with a fresh scratch directory, removed once `f` returns
    pub fn with_tempdir<F>(&mut self, f: F) -> StepResult
    where
        F: FnOnce(&mut Cx<'_>, &Path) -> StepResult,
    {
        let scratch = ScratchDir::new()?;
        let outcome = f(self, scratch.path());
        if let Err(err) = scratch.close() {
            warn!("Scratch directory for {} not removed: {}", self.info.id, err);
        }
        outcome
    }

    /// [`Cx::with_tempdir`] with the scratch directory as working directory
    pub fn within_tempdir<F>(&mut self, f: F) -> StepResult
    where
        F: FnOnce(&mut Cx<'_>, &Path) -> StepResult,
    {
        self.with_tempdir(|cx, dir| {
            let _cwd = WorkingDir::enter(dir)?;
            f(cx, dir)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestClass;

    #[test]
    fn test_datadir_next_to_source() {
        let class = TestClass::new("m", "TC").with_source_file("/srv/suite/test_io.rs");
        let case = class.case("test_a", |_| Ok(()));
        let mut run = RunContext::new(RunOptions::new());

        assert_eq!(run.datadir(&case.info), PathBuf::from("/srv/suite/data"));
        assert_eq!(
            run.datapath(&case.info, &["in", "a.txt"]),
            PathBuf::from("/srv/suite/data/in/a.txt")
        );
    }

    #[test]
    fn test_datadir_memoized_per_class() {
        let first = TestClass::new("m", "TC").with_source_file("/one/t.rs");
        // same class key, different source: the first answer sticks
        let second = TestClass::new("m", "TC").with_source_file("/two/t.rs");
        let mut run = RunContext::new(RunOptions::new());

        let a = run.datadir(&first.case("test_a", |_| Ok(())).info);
        let b = run.datadir(&second.case("test_b", |_| Ok(())).info);
        assert_eq!(a, b);
    }

    #[test]
    fn test_datadir_without_source_uses_cwd() {
        let case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));
        let mut run = RunContext::new(RunOptions::new());
        let _lock = crate::utils::cwd_lock();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(run.datadir(&case.info), cwd.join("data"));
    }

    #[test]
    fn test_with_tempdir_removes_directory() {
        let mut case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));
        let mut run = RunContext::new(RunOptions::new());
        let mut cx = Cx::new(&mut case.info, &mut run);
        let mut seen = PathBuf::new();

        cx.with_tempdir(|cx, dir| {
            seen = dir.to_path_buf();
            crate::utils::create_files(&["in/a.txt", "out/"], dir)?;
            assert!(dir.join("in/a.txt").is_file());
            assert_eq!(cx.id().method, "test_a");
            Ok(())
        })
        .unwrap();

        assert!(!seen.as_os_str().is_empty());
        assert!(!seen.exists());
    }

    #[test]
    fn test_within_tempdir_switches_working_dir() {
        let mut case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));
        let mut run = RunContext::new(RunOptions::new());
        let mut cx = Cx::new(&mut case.info, &mut run);

        let outcome = cx.within_tempdir(|_, dir| {
            let cwd = std::env::current_dir()?;
            assert_eq!(cwd.canonicalize()?, dir.canonicalize()?);
            std::fs::write("relative.txt", "x")?;
            assert!(dir.join("relative.txt").is_file());
            Err(crate::models::Signal::failure("still cleaned up"))
        });

        assert!(matches!(outcome, Err(crate::models::Signal::Failure(_))));
        let _lock = crate::utils::cwd_lock();
        assert!(!std::env::current_dir().unwrap().join("relative.txt").exists());
    }

    #[test]
    fn test_cx_options() {
        let mut case = TestClass::new("m", "TC").case("test_a", |_| Ok(()));
        let mut run = RunContext::new(RunOptions::new().with_extra("dsn", "sqlite://"));
        let mut cx = Cx::new(&mut case.info, &mut run);

        assert_eq!(cx.option("dsn"), Some("sqlite://"));
        assert_eq!(cx.option_or("user", "admin"), "admin");
        cx.set_description("renamed");
        assert_eq!(cx.description(), "renamed");
        assert_eq!(cx.id().to_string(), "m.TC.test_a");
    }
}
