use setup::Behavior;


#[test]
fn test_scalar_product() {
    let setup = setup::setup(&[Behavior::Compute, Behavior::Compute, Behavior::Compute]);

    let output = setup::run_with_conf(&setup);

    assert!(
        output.status.success(),
        "stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("The computed scalar product is: 60"));

    let log = setup::log_contents(&setup);
    assert!(log.contains("Vector A: [ -5 -4 -3 -2 -1 0 1 2 3 4 ]"));
    assert!(log.contains("Vector B: [ 0 1 2 3 4 5 6 7 8 9 ]"));
    assert!(log.contains("The computed scalar product is: 60"));
    assert!(!log.contains("secret shared"));
    assert!(log.contains("Submitting pd_shared3p arguments"));
    // the result is the last record and reaches the file before exit
    assert!(
        log.lines()
            .last()
            .is_some_and(|line| line.ends_with("The computed scalar product is: 60"))
    );
    assert!(setup::error_lines(&setup).is_empty());
}

#[test]
fn test_default_config_path() {
    // the configuration is written as client.cfg into the working directory
    let setup = setup::setup(&[Behavior::Compute]);

    let output = setup::run(&setup, &[]);

    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(setup::log_contents(&setup).contains("The computed scalar product is: 60"));
}

#[test]
fn test_log_file_overwritten() {
    let setup = setup::setup(&[Behavior::Compute]);
    std::fs::write(
        setup.test_dir.path().join(setup::LOG_FILE),
        "STALE LOG CONTENTS\n",
    )
    .unwrap();

    let output = setup::run_with_conf(&setup);

    assert!(output.status.success());
    assert!(!setup::log_contents(&setup).contains("STALE LOG CONTENTS"));
}

#[test]
fn test_help() {
    let setup = setup::setup(&[]);

    let output = setup::run(&setup, &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("--conf"));
    assert!(!setup.test_dir.path().join(setup::LOG_FILE).exists());
}
