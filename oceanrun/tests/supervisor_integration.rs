//! Integration tests for direct-execution supervision, using small shell
//! scripts as stand-ins for the model process.

use std::fs;

use tempfile::TempDir;

use oceanrun::supervisor::run_direct;
use oceanrun::PipelineError;

#[tokio::test]
async fn successful_run_completes_without_an_error_log() {
    let dir = TempDir::new().unwrap();
    let run_dir = dir.path().join("run");
    let output_dir = dir.path().join("output");
    fs::create_dir_all(&run_dir).unwrap();

    // Emits a couple of 9-field progress lines among noise, then exits 0.
    let command = r#"
        echo "Reading grid file"
        echo "1 0.1 0.2 0.3 0.4 0.5 0.6 0.7 0.8"
        echo "2 0.1 0.2 0.3 0.4 0.5 0.6 0.7 0.8"
        echo "wrote history record"
    "#;

    run_direct(command, &run_dir, &output_dir, 2).await.unwrap();

    let logs: Vec<_> = fs::read_dir(&output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("run_stderr_"))
        .collect();
    assert!(logs.is_empty());
}

#[tokio::test]
async fn failing_run_persists_stderr_to_a_timestamped_log() {
    let dir = TempDir::new().unwrap();
    let run_dir = dir.path().join("run");
    let output_dir = dir.path().join("output");
    fs::create_dir_all(&run_dir).unwrap();

    let command = r#"
        echo "1 0.1 0.2 0.3 0.4 0.5 0.6 0.7 0.8"
        echo "BLOWUP: velocity out of range" >&2
        exit 1
    "#;

    let err = run_direct(command, &run_dir, &output_dir, 10)
        .await
        .unwrap_err();

    let PipelineError::ExecutionFailure { code, log } = err else {
        panic!("expected an execution failure");
    };
    assert_eq!(code, 1);
    assert!(log.is_file());
    assert!(log.starts_with(&output_dir));
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("BLOWUP: velocity out of range"));

    // Exactly one error log for one failed run.
    let logs: Vec<_> = fs::read_dir(&output_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("run_stderr_"))
        .collect();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn child_runs_in_the_run_directory() {
    let dir = TempDir::new().unwrap();
    let run_dir = dir.path().join("run");
    let output_dir = dir.path().join("output");
    fs::create_dir_all(&run_dir).unwrap();

    run_direct("pwd > where.txt", &run_dir, &output_dir, 1)
        .await
        .unwrap();

    let recorded = fs::read_to_string(run_dir.join("where.txt")).unwrap();
    assert_eq!(
        fs::canonicalize(recorded.trim()).unwrap(),
        fs::canonicalize(&run_dir).unwrap()
    );
}

#[tokio::test]
async fn chatty_stderr_does_not_deadlock_the_supervisor() {
    let dir = TempDir::new().unwrap();
    let run_dir = dir.path().join("run");
    let output_dir = dir.path().join("output");
    fs::create_dir_all(&run_dir).unwrap();

    // Write well past a pipe buffer's worth of stderr before exiting.
    let command = r#"
        i=0
        while [ $i -lt 3000 ]; do
            echo "stderr chatter line $i with some padding characters" >&2
            i=$((i+1))
        done
        exit 3
    "#;

    let err = run_direct(command, &run_dir, &output_dir, 1)
        .await
        .unwrap_err();
    let PipelineError::ExecutionFailure { code, log } = err else {
        panic!("expected an execution failure");
    };
    assert_eq!(code, 3);
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("stderr chatter line 2999"));
}
