use rstest::fixture;
use std::path::PathBuf;
use std::process::{Command, Output};
use versionaire::config::BranchConfigEntry;
use versionaire::{GitVersion, GitVersioner};

pub const MAIN_BRANCH: &str = "trunk";

#[fixture]
pub fn repo(#[default(MAIN_BRANCH)] main: &str) -> TestRepo {
    let repo = TestRepo::initialize(main);
    repo.commit("initial commit");
    repo
}

pub struct TestRepo {
    pub config: versionaire::Configuration,
    _temp_dir: tempfile::TempDir, // Keep the temp_dir to prevent it from being deleted
}

#[allow(dead_code)]
impl TestRepo {
    pub fn new() -> Self {
        let _temp_dir = tempfile::tempdir().unwrap();
        let path = _temp_dir.path().to_path_buf();
        let mut config = versionaire::Configuration::defaults();
        config.repository_path = path;
        Self { config, _temp_dir }
    }

    pub fn initialize(main_branch: &str) -> Self {
        let repo = TestRepo::new();
        repo.execute(&["init", &format!("--initial-branch={main_branch}")], "initialize repository");
        repo.execute(&["config", "user.name", "tester"], "configure user.name");
        repo.execute(&["config", "user.email", "tester@tests.com"], "configure user.email");
        repo
    }

    pub fn commit(&self, message: &str) -> String {
        self.execute(&["commit", "--allow-empty", "-m", message], &format!("commit {message}"));
        self.head_sha()
    }

    pub fn branch(&self, name: &str) {
        self.execute(&["branch", name], &format!("branch {name}"));
        self.checkout(name);
    }

    pub fn checkout(&self, name: &str) {
        self.execute(&["checkout", name], &format!("checkout {name}"));
    }

    pub fn merge(&self, name: &str) {
        self.execute(&["merge", "--no-ff", name], &format!("merge {name}"));
    }

    pub fn tag(&self, name: &str) -> String {
        self.execute(&["tag", name], &format!("create tag {name}"));
        self.head_sha()
    }

    pub fn tag_annotated(&self, name: &str) -> String {
        self.execute(&["tag", "-a", name, "-m", name], &format!("create tag {name}"));
        self.head_sha()
    }

    pub fn commit_and_assert(&self, expected: &str) -> Assertable {
        self.commit(expected);
        self.assert().sem_ver(expected)
    }

    pub fn tag_and_assert(&self, prefix: &str, expected: &str) -> Assertable {
        self.tag(&format!("{prefix}{expected}"));
        self.assert().sem_ver(expected)
    }

    pub fn merge_and_assert(&self, branch_name: &str, expected_version: &str) -> Assertable {
        self.merge(branch_name);
        self.assert().sem_ver(expected_version)
    }

    pub fn path(&self) -> &str {
        self.config.repository_path.to_str().unwrap()
    }

    pub fn configure_branch(&mut self, key: &str, entry: BranchConfigEntry) {
        self.config.branches.insert(key.to_string(), entry);
    }

    pub fn clone_from(source: &TestRepo) -> Self {
        let repo = TestRepo::new();
        repo.execute(
            &["clone", &format!(r"file://{}", source.path()), repo.path()],
            &format!("clone {}", source.path()),
        );
        repo
    }

    pub fn graph(&self) -> String {
        let output = self.execute(&["log", "--graph", "--oneline", "--all", "--decorate"], "get commit graph");
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn execute(&self, command: &[&str], description: &str) -> Output {
        let output = Command::new("git")
            .args(command)
            .current_dir(&self.config.repository_path)
            .output()
            .unwrap_or_else(|_| panic!("Failed to {description}"));

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            panic!("Failed to {description}, because: {error}")
        }
        output
    }

    pub fn assert(&self) -> Assertable {
        let result = GitVersioner::calculate_version(&self.config).unwrap();
        let context = format!("Git Graph:\n  {}", self.graph());
        Assertable { result, context }
    }

    fn head_sha(&self) -> String {
        let output = self.execute(&["rev-parse", "HEAD"], "get commit hash");
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    }
}

pub struct Assertable {
    pub result: GitVersion,
    pub context: String,
}

macro_rules! config_assertion {
    ($name:ident, &$expected:ty) => {
        pub fn $name(self, expected: &$expected) -> Self {
            let actual = &self.result.$name;
            let context = &self.context;
            let name = stringify!($name);
            assert_eq!(actual, expected, "Expected {name}: {expected}, found: {actual}\n{context}");
            self
        }
    };
    ($name:ident, $expected:ty) => {
        pub fn $name(self, expected: $expected) -> Self {
            let actual = self.result.$name;
            let context = &self.context;
            let name = stringify!($name);
            assert_eq!(actual, expected, "Expected {name}: {expected}, found: {actual}\n{context}");
            self
        }
    };
}

#[allow(dead_code)]
impl Assertable {
    config_assertion!(full_sem_ver, &str);
    config_assertion!(sem_ver, &str);
    config_assertion!(branch_name, &str);
    config_assertion!(escaped_branch_name, &str);
    config_assertion!(weighted_pre_release_number, u64);
    config_assertion!(assembly_sem_ver, &str);
    config_assertion!(assembly_sem_file_ver, &str);
    config_assertion!(version_source_sha, &str);
    config_assertion!(commits_since_version_source, u64);
    config_assertion!(uncommitted_changes, bool);
}
