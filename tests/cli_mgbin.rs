use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

fn sample_dir() -> anyhow::Result<tempfile::TempDir> {
    let dir = tempfile::tempdir()?;
    for file in ["contigs.tsv", "roles.tbl"] {
        std::fs::copy(
            Path::new("tests/mgbin/sample").join(file),
            dir.path().join(file),
        )?;
    }
    Ok(dir)
}

#[test]
fn command_pairs() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let mut cmd = Command::cargo_bin("mgbin")?;
    cmd.arg("pairs").arg(dir.path()).assert().success();

    let table = std::fs::read_to_string(dir.path().join("scores.tbl"))?;
    assert_eq!(table.lines().count(), 15);
    assert!(table.contains("A1\tA2\t1\t"));
    assert!(table
        .lines()
        .filter(|l| l.starts_with("B1\tB2\t"))
        .all(|l| l.ends_with("\tsame\t4\t0")));

    Ok(())
}

#[test]
fn command_bin() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let log = dir.path().join("bin.log");
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path())
        .args(["5", "3", "1", "1", "2", "6"])
        .arg("--min-unis")
        .arg("4")
        .arg("--max-dups")
        .arg("0")
        .arg("--log")
        .arg(&log)
        .output()?;

    // two complete, clean bins: 2 * (1 + 4/4)
    assert_eq!(output.status.code(), Some(4));

    let bins = std::fs::read_to_string(dir.path().join("bins.tsv"))?;
    let lines: Vec<&str> = bins.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "A1\tA1:5000,A2:4000,A3:3000\t12000\t20,10\tgA\tR1:1,R2:1,R3:1,R4:1"
    );
    assert!(lines[1].starts_with("B1\tB1:6000,B2:2000\t8000\t"));
    assert!(lines[2].starts_with("C1\tC1:1500\t1500\t"));

    let log = std::fs::read_to_string(&log)?;
    assert!(log.contains("Merges:\t3"));
    assert!(log.contains("Good bins:\t2"));
    assert!(dir.path().join("scores.tbl").is_file());

    Ok(())
}

#[test]
fn command_bin_high_floor() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let outfile = dir.path().join("singletons.tsv");
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path())
        .args(["5", "3", "1", "1", "2", "100"])
        .arg("-o")
        .arg(&outfile)
        .output()?;

    assert_eq!(output.status.code(), Some(0));
    let bins = std::fs::read_to_string(&outfile)?;
    assert_eq!(bins.lines().count(), 6);

    Ok(())
}

#[test]
fn command_bin_skips_malformed_pairs() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    std::fs::write(
        dir.path().join("scores.tbl"),
        "B1\tB2\t1\t0.99\tsame\t4\t0\nbroken line\nA1\tA2\tNaN?\t1\tsame\t3\t0\n",
    )?;
    let log = dir.path().join("bin.log");
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path())
        .args(["5", "3", "1", "1", "2", "6"])
        .args(["--min-unis", "4", "--max-dups", "0"])
        .arg("--log")
        .arg(&log)
        .output()?;

    // only the B genome can be assembled; the A fragments each fall short
    assert_eq!(output.status.code(), Some(0));
    let log = std::fs::read_to_string(&log)?;
    assert!(log.contains("Good bins:\t1"));
    assert!(log.contains("2 malformed lines skipped"));
    assert!(log.contains("Missing pairs:\t14"));

    Ok(())
}

#[test]
fn command_bin_bad_dir() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path().join("absent"))
        .args(["5", "3", "1", "1", "2", "6"])
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("is not a directory"));

    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path())
        .args(["5", "3", "1", "1", "2", "6"])
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("missing input file"));
    assert!(!dir.path().join("bins.tsv").exists());

    Ok(())
}

#[test]
fn command_bad_dir_leaves_no_log() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    for sub in ["pairs", "bin", "search"] {
        let log = dir.path().join(format!("{}.log", sub));
        let mut cmd = Command::cargo_bin("mgbin")?;
        cmd.arg(sub).arg(dir.path().join("absent"));
        if sub == "bin" {
            cmd.args(["5", "3", "1", "1", "2", "6"]);
        }
        cmd.arg("--log")
            .arg(&log)
            .assert()
            .failure()
            .stderr(predicate::str::contains("is not a directory"));
        assert!(!log.exists());
    }

    Ok(())
}

#[test]
fn command_bin_mean_policy() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let log = dir.path().join("bin.log");
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("bin")
        .arg(dir.path())
        .args(["5", "3", "1", "1", "2", "6"])
        .args(["--min-unis", "4", "--max-dups", "0"])
        .args(["--policy", "mean", "--total-roles", "57"])
        .arg("--log")
        .arg(&log)
        .output()?;

    assert_eq!(output.status.code(), Some(4));

    let bins = std::fs::read_to_string(dir.path().join("bins.tsv"))?;
    let lines: Vec<&str> = bins.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("A1\tA1:5000,A2:4000,A3:3000\t12000\t"));
    // averaged by length instead of the seed's own vector
    assert_ne!(lines[0].split('\t').nth(3), Some("20,10"));

    let log = std::fs::read_to_string(&log)?;
    assert!(log.contains("57 universal roles"));

    Ok(())
}

#[test]
fn command_bin_negative_weight() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let mut cmd = Command::cargo_bin("mgbin")?;
    cmd.arg("bin")
        .arg(dir.path())
        .args(["5", "-3", "1", "1", "2", "6"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("tetra must be a non-negative number"));
    assert!(!dir.path().join("bins.tsv").exists());

    Ok(())
}

#[test]
fn command_search() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let log = dir.path().join("search.log");
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("search")
        .arg(dir.path())
        .args(["--pop", "6", "--gen", "3", "--seed", "1"])
        .args(["--min-unis", "4", "--max-dups", "0"])
        .arg("--log")
        .arg(&log)
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "#covg\ttetra\tref\tuni_penalty\tuni\tmin_score\tfitness"
    );
    assert_eq!(lines[1].split('\t').count(), 7);

    let code = output.status.code().unwrap();
    assert!((0..=4).contains(&code));

    let log = std::fs::read_to_string(&log)?;
    assert!(log.contains("Generation 1:"));
    assert!(log.contains("Generation 3:"));
    assert!(log.contains("Clustering statistics"));
    assert!(log.contains("Good bins:"));

    Ok(())
}

#[test]
fn command_search_fixed_bounds() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let bounds = dir.path().join("bounds.txt");
    std::fs::write(
        &bounds,
        "covg 5 5\ntetra 3 3\nref 1 1\nuni_penalty 1 1\nuni 2 2\nmin_score 6 6\n",
    )?;
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("search")
        .arg(dir.path())
        .args(["--pop", "4", "--gen", "2"])
        .args(["--min-unis", "4", "--max-dups", "0"])
        .arg("--bounds")
        .arg(&bounds)
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert_eq!(output.status.code(), Some(4));
    assert_eq!(
        stdout.lines().nth(1),
        Some("5.0000\t3.0000\t1.0000\t1.0000\t2.0000\t6.0000\t4.0000")
    );

    Ok(())
}

#[test]
fn command_search_bad_bounds() -> anyhow::Result<()> {
    let dir = sample_dir()?;
    let bounds = dir.path().join("bounds.txt");
    std::fs::write(&bounds, "covg 0 10\nweight 1 2\n")?;
    let mut cmd = Command::cargo_bin("mgbin")?;
    cmd.arg("search")
        .arg(dir.path())
        .arg("--bounds")
        .arg(&bounds)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown parameter"));

    Ok(())
}

#[test]
fn command_stats() -> anyhow::Result<()> {
    let mut cmd = Command::cargo_bin("mgbin")?;
    let output = cmd
        .arg("stats")
        .arg("tests/mgbin/bins.tsv")
        .arg("--roles")
        .arg("tests/mgbin/sample/roles.tbl")
        .args(["--min-unis", "4", "--max-dups", "0"])
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;

    assert!(stdout.contains("Bins:\t4"));
    assert!(stdout.contains("Good bins:\t2"));
    assert!(stdout.contains("D1\tbad\tcontigs=2"));
    assert!(stdout.contains("duplicated:\tR1:2,R2:2"));
    assert!(stdout.contains("Quality:\t3.2500"));

    Ok(())
}
