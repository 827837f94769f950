//! Build step execution
//!
//! Runs a descriptor's ordered install steps as external processes inside
//! the build context's working directory. The only contract with build
//! tools is their exit code: a non-zero exit aborts the remaining steps for
//! that package. Each child gets a minimal environment (PATH and HOME from
//! the parent) plus the context's variables; the process-wide environment
//! is never touched.

use std::process::Stdio;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::core::context::BuildContext;
use crate::core::descriptor::Descriptor;
use crate::core::template::expand_vars;
use crate::error::BuildError;

/// Environment variables inherited from the parent process
const INHERITED_ENV: [&str; 2] = ["PATH", "HOME"];

/// Run every step of `descriptor` in order inside `context`.
///
/// Cancellation kills the in-flight child process; the context's working
/// directory is cleaned up by its owner regardless of how this returns.
pub async fn run_steps(
    descriptor: &Descriptor,
    context: &BuildContext,
    cancel: &CancellationToken,
) -> Result<(), BuildError> {
    let vars = context.vars();
    let package = context.package().to_string();

    for (index, step) in descriptor.steps.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(BuildError::Cancelled { package });
        }

        let program = expand_vars(&step.run, &vars);
        let args: Vec<String> = step.args.iter().map(|a| expand_vars(a, &vars)).collect();

        tracing::info!(package = %package, step = index, command = %program, "running build step");

        let mut command = Command::new(&program);
        command
            .args(&args)
            .current_dir(context.srcdir())
            .stdin(Stdio::null())
            .env_clear()
            .envs(&vars)
            .kill_on_drop(true);
        for key in INHERITED_ENV {
            if let Ok(value) = std::env::var(key) {
                command.env(key, value);
            }
        }

        let mut child = command.spawn().map_err(|e| BuildError::SpawnFailed {
            package: package.clone(),
            command: program.clone(),
            error: e.to_string(),
        })?;

        let status = tokio::select! {
            status = child.wait() => status.map_err(|e| BuildError::SpawnFailed {
                package: package.clone(),
                command: program.clone(),
                error: e.to_string(),
            })?,
            () = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(BuildError::Cancelled { package });
            }
        };

        if !status.success() {
            return Err(BuildError::StepFailed {
                package,
                index,
                command: program,
                status: status.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{descriptor, shell_step};
    use tempfile::TempDir;

    fn context_for(descriptor: &Descriptor) -> (BuildContext, TempDir) {
        let prefix = TempDir::new().unwrap();
        let ctx = BuildContext::create(descriptor, prefix.path(), 2).unwrap();
        (ctx, prefix)
    }

    #[tokio::test]
    async fn test_steps_run_in_declared_order() {
        let mut desc = descriptor("ordered", vec![]);
        desc.steps = vec![
            shell_step("echo one >> order.txt"),
            shell_step("echo two >> order.txt"),
            shell_step("echo three >> order.txt"),
        ];
        let (ctx, _prefix) = context_for(&desc);

        run_steps(&desc, &ctx, &CancellationToken::new())
            .await
            .unwrap();

        let log = std::fs::read_to_string(ctx.srcdir().join("order.txt")).unwrap();
        assert_eq!(log, "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn test_failing_step_aborts_remaining() {
        let mut desc = descriptor("failing", vec![]);
        desc.steps = vec![
            shell_step("echo first >> log.txt"),
            shell_step("exit 7"),
            shell_step("echo never >> log.txt"),
        ];
        let (ctx, _prefix) = context_for(&desc);

        let err = run_steps(&desc, &ctx, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            BuildError::StepFailed { index, status, .. } => {
                assert_eq!(index, 1);
                assert!(status.contains('7'), "status was: {status}");
            }
            other => panic!("Expected StepFailed, got {other:?}"),
        }

        let log = std::fs::read_to_string(ctx.srcdir().join("log.txt")).unwrap();
        assert_eq!(log, "first\n");
    }

    #[tokio::test]
    async fn test_vars_expanded_and_exported() {
        let mut desc = descriptor("vars", vec![]);
        desc.env
            .insert("GREETING".to_string(), "hello-${NAME}".to_string());
        desc.steps = vec![
            shell_step("echo ${NAME} > from-arg.txt"),
            shell_step("echo $GREETING > from-env.txt"),
            shell_step("mkdir -p ${DESTDIR} && touch ${DESTDIR}/marker"),
        ];
        let (ctx, _prefix) = context_for(&desc);

        run_steps(&desc, &ctx, &CancellationToken::new())
            .await
            .unwrap();

        let from_arg = std::fs::read_to_string(ctx.srcdir().join("from-arg.txt")).unwrap();
        assert_eq!(from_arg.trim(), "vars");

        let from_env = std::fs::read_to_string(ctx.srcdir().join("from-env.txt")).unwrap();
        assert_eq!(from_env.trim(), "hello-vars");

        assert!(ctx.staging().join("marker").exists());
    }

    #[tokio::test]
    async fn test_process_environment_not_leaked() {
        // The overlay must be visible to the child but never set in this
        // process.
        let mut desc = descriptor("isolated", vec![]);
        desc.env
            .insert("CELLAR_TEST_OVERLAY".to_string(), "set".to_string());
        desc.steps = vec![shell_step("test \"$CELLAR_TEST_OVERLAY\" = set")];
        let (ctx, _prefix) = context_for(&desc);

        run_steps(&desc, &ctx, &CancellationToken::new())
            .await
            .unwrap();

        assert!(std::env::var("CELLAR_TEST_OVERLAY").is_err());
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let mut desc = descriptor("nocmd", vec![]);
        desc.steps = vec![crate::core::descriptor::Step {
            run: "/nonexistent/definitely-not-a-command".to_string(),
            args: vec![],
        }];
        let (ctx, _prefix) = context_for(&desc);

        let err = run_steps(&desc, &ctx, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::SpawnFailed { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancellation_kills_running_step() {
        let mut desc = descriptor("slow", vec![]);
        desc.steps = vec![shell_step("sleep 30")];
        let (ctx, _prefix) = context_for(&desc);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let err = run_steps(&desc, &ctx, &cancel).await.unwrap_err();

        assert!(matches!(err, BuildError::Cancelled { .. }));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(10),
            "cancellation must not wait for the step to finish"
        );
    }

    #[tokio::test]
    async fn test_already_cancelled_runs_nothing() {
        let mut desc = descriptor("never", vec![]);
        desc.steps = vec![shell_step("touch ran.txt")];
        let (ctx, _prefix) = context_for(&desc);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = run_steps(&desc, &ctx, &cancel).await.unwrap_err();
        assert!(matches!(err, BuildError::Cancelled { .. }));
        assert!(!ctx.srcdir().join("ran.txt").exists());
    }
}
