use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

const BINARY_NAME: &str = "plies";

#[test]
fn tictactoe_selfplay_is_a_draw() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--move-time-ms", "50", "selfplay", "tictactoe"])
            .assert()
            .success()
            .stdout(contains("1. w ").and(contains("result: draw"))),
    );
}

#[test]
fn bridge_is_crossed() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args([
            "bridge",
            "--lane",
            "....0.......",
            "--lane",
            "............",
            "--lane",
            "..0.........",
            "--lane",
            "............",
            "--bikes",
            "2",
            "--min-bikes",
            "1",
        ])
        .assert()
        .success()
        .stdout(contains("SPEED").and(contains("result: crossed with"))),
    );
}

#[test]
fn invalid_road() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["bridge", "--lane", "...", "--lane", "..."])
            .assert()
            .failure()
            .stderr(contains("invalid road")),
    );
}

#[test]
fn tiny_table_is_rejected() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--hash-mb", "0", "selfplay", "tictactoe"])
            .assert()
            .failure()
            .stderr(contains("invalid engine configuration")),
    );
}

#[test]
fn zero_move_time_is_rejected() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("Binary should be built");

    drop(
        cmd.args(["--move-time-ms", "0", "selfplay", "breakthrough"])
            .assert()
            .failure()
            .stderr(contains("time budget must be positive")),
    );
}
