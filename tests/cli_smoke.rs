use std::path::PathBuf;

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_showreel")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "showreel.exe"
            } else {
                "showreel"
            });
            p
        })
}

fn fixture() -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join("portfolio.json")
        .to_string_lossy()
        .to_string()
}

#[test]
fn cli_simulate_prints_json_trace() {
    let out = std::process::Command::new(exe())
        .args(["simulate", "--in", fixture().as_str(), "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let trace: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let steps = trace.as_array().unwrap();
    assert_eq!(steps.len(), 11);
    assert_eq!(steps[7]["active_section"], "contact");
}

#[test]
fn cli_check_reports_mounted_sections() {
    let out = std::process::Command::new(exe())
        .args(["check", "--in", fixture().as_str()])
        .output()
        .unwrap();
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["mounted"].as_array().unwrap().len(), 5);
}

#[test]
fn cli_rejects_missing_input() {
    let status = std::process::Command::new(exe())
        .args(["check", "--in", "does/not/exist.json"])
        .output()
        .unwrap()
        .status;
    assert!(!status.success());
}
