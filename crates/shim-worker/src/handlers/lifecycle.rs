// Lifecycle stages of a Node action: pre, main, post.
//
// Each stage can only be reached through the previous stage's successful
// `run`, so the scripts execute strictly in order and a failure stops the
// chain. Output is appended to one buffer that moves from stage to stage.

use shim_common::errors::Result;

use crate::action_manifest_manager::EntryPoints;
use crate::environment::ResolvedEnvironment;
use crate::handlers::step_host::StepHost;

/// Combined output of every script that ran, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput(String);

impl CapturedOutput {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// First stage: runs `pre` when the manifest declares one.
pub struct PreStage<'a> {
    entry: &'a EntryPoints,
}

/// Runs the mandatory `main` script.
pub struct MainStage<'a> {
    entry: &'a EntryPoints,
    captured: CapturedOutput,
}

/// Runs `post` when the manifest declares one.
pub struct PostStage<'a> {
    entry: &'a EntryPoints,
    captured: CapturedOutput,
}

impl<'a> PreStage<'a> {
    pub fn new(entry: &'a EntryPoints) -> Self {
        Self { entry }
    }

    pub async fn run(
        self,
        host: &dyn StepHost,
        env: &ResolvedEnvironment,
    ) -> Result<MainStage<'a>> {
        let mut captured = CapturedOutput::default();
        if let Some(pre) = self.entry.pre.as_deref() {
            run_into(host, "pre", pre, env, &mut captured).await?;
        }
        Ok(MainStage {
            entry: self.entry,
            captured,
        })
    }
}

impl<'a> MainStage<'a> {
    pub async fn run(
        mut self,
        host: &dyn StepHost,
        env: &ResolvedEnvironment,
    ) -> Result<PostStage<'a>> {
        run_into(host, "main", &self.entry.main, env, &mut self.captured).await?;
        Ok(PostStage {
            entry: self.entry,
            captured: self.captured,
        })
    }
}

impl<'a> PostStage<'a> {
    pub async fn run(
        mut self,
        host: &dyn StepHost,
        env: &ResolvedEnvironment,
    ) -> Result<CapturedOutput> {
        if let Some(post) = self.entry.post.as_deref() {
            run_into(host, "post", post, env, &mut self.captured).await?;
        }
        Ok(self.captured)
    }
}

async fn run_into(
    host: &dyn StepHost,
    stage: &str,
    script: &str,
    env: &ResolvedEnvironment,
    captured: &mut CapturedOutput,
) -> Result<()> {
    tracing::debug!(stage, script, "Running lifecycle script");
    let output = host
        .run_script(script, env)
        .await
        .map_err(|e| e.with_prior_output(captured.as_str()))?;
    captured.0.push_str(&output);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shim_common::ShimError;

    /// Records which scripts ran; fails the ones listed in `failing`.
    #[derive(Default)]
    pub(crate) struct FakeStepHost {
        pub(crate) calls: Mutex<Vec<String>>,
        pub(crate) failing: Vec<String>,
    }

    impl FakeStepHost {
        pub(crate) fn failing(script: &str) -> Self {
            Self {
                failing: vec![script.to_string()],
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl StepHost for FakeStepHost {
        async fn run_script(&self, script: &str, _env: &ResolvedEnvironment) -> Result<String> {
            self.calls.lock().push(script.to_string());
            if self.failing.iter().any(|s| s == script) {
                return Err(ShimError::ScriptExecution {
                    script: script.to_string(),
                    exit_code: Some(1),
                    signal: None,
                    partial_output: format!("{script} failed\n"),
                });
            }
            Ok(format!("{script} ran\n"))
        }
    }

    fn entry(pre: Option<&str>, post: Option<&str>) -> EntryPoints {
        EntryPoints {
            pre: pre.map(str::to_string),
            main: "main.js".to_string(),
            post: post.map(str::to_string),
        }
    }

    async fn run_all(host: &FakeStepHost, entry: &EntryPoints) -> Result<CapturedOutput> {
        let env = ResolvedEnvironment::new();
        PreStage::new(entry)
            .run(host, &env)
            .await?
            .run(host, &env)
            .await?
            .run(host, &env)
            .await
    }

    #[tokio::test]
    async fn runs_pre_main_post_in_order() {
        let host = FakeStepHost::default();
        let entry = entry(Some("pre.js"), Some("post.js"));

        let captured = run_all(&host, &entry).await.unwrap();

        assert_eq!(*host.calls.lock(), vec!["pre.js", "main.js", "post.js"]);
        assert_eq!(captured.as_str(), "pre.js ran\nmain.js ran\npost.js ran\n");
    }

    #[tokio::test]
    async fn optional_stages_are_skipped() {
        let host = FakeStepHost::default();
        let entry = entry(None, None);

        let captured = run_all(&host, &entry).await.unwrap();

        assert_eq!(*host.calls.lock(), vec!["main.js"]);
        assert_eq!(captured.into_string(), "main.js ran\n");
    }

    #[tokio::test]
    async fn failure_stops_later_stages_and_keeps_earlier_output() {
        let host = FakeStepHost::failing("main.js");
        let entry = entry(Some("pre.js"), Some("post.js"));

        let err = run_all(&host, &entry).await.unwrap_err();

        assert_eq!(*host.calls.lock(), vec!["pre.js", "main.js"]);
        match err {
            ShimError::ScriptExecution {
                exit_code,
                partial_output,
                ..
            } => {
                assert_eq!(exit_code, Some(1));
                assert_eq!(partial_output, "pre.js ran\nmain.js failed\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failing_pre_never_reaches_main() {
        let host = FakeStepHost::failing("pre.js");
        let entry = entry(Some("pre.js"), None);

        assert!(run_all(&host, &entry).await.is_err());
        assert_eq!(*host.calls.lock(), vec!["pre.js"]);
    }
}
