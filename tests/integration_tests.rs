use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::str::{contains, diff, is_empty};
use tempfile::TempDir;

use lc3vm::Image;

fn write_image(dir: &Path, name: &str, origin: u16, words: &[u16]) -> PathBuf {
    let path = dir.join(name);
    let image = Image {
        origin,
        words: words.to_vec(),
    };
    fs::write(&path, image.to_bytes()).unwrap();
    path
}

fn lc3vm() -> Command {
    let mut cmd = Command::cargo_bin("lc3vm").unwrap();
    cmd.env_remove("LC3VM_LOG").env_remove("LC3VM_MINIMAL");
    cmd
}

// LEA R0, #2 ; PUTS ; HALT ; "Hello, world!"
fn hello_world() -> Vec<u16> {
    let mut words = vec![0xE002, 0xF022, 0xF025];
    words.extend("Hello, world!".bytes().map(u16::from));
    words.push(0);
    words
}

#[test]
fn refuses_to_run_without_arguments() {
    lc3vm()
        .assert()
        .failure()
        .code(2)
        .stdout(is_empty())
        .stderr(contains("Usage"));
}

#[test]
fn runs_hello_world() {
    let dir = TempDir::new().unwrap();
    let path = write_image(dir.path(), "hw.obj", 0x3000, &hello_world());

    lc3vm()
        .arg(&path)
        .assert()
        .success()
        .stdout(diff("Hello, world!"))
        .stderr(contains("Halted"));
}

#[test]
fn minimal_output_is_program_only() {
    let dir = TempDir::new().unwrap();
    let path = write_image(dir.path(), "hw.obj", 0x3000, &hello_world());

    lc3vm()
        .arg("--minimal")
        .arg(&path)
        .assert()
        .success()
        .stdout(diff("Hello, world!"))
        .stderr(diff("HALT\n"));
}

#[test]
fn prints_registers_after_halt() {
    let dir = TempDir::new().unwrap();
    // ADD R0, R0, #5 ; HALT
    let path = write_image(dir.path(), "add.obj", 0x3000, &[0x1025, 0xF025]);

    lc3vm()
        .args(["--minimal", "--registers"])
        .arg(&path)
        .assert()
        .success()
        .stderr(contains("R0 5\n"))
        .stderr(contains("PC 12290\n"))
        .stderr(contains("CC 001\n"));
}

#[test]
fn starts_at_origin_of_first_image() {
    let dir = TempDir::new().unwrap();
    // Origin x4000: ADD R3, R3, #-1 ; HALT
    let first = write_image(dir.path(), "a.obj", 0x4000, &[0x16FF, 0xF025]);
    let second = write_image(dir.path(), "b.obj", 0x3000, &[0xD000]);

    lc3vm()
        .args(["--minimal", "--registers"])
        .arg(&first)
        .arg(&second)
        .assert()
        .success()
        .stderr(contains("R3 65535\n"));
}

#[test]
fn entry_overrides_origin() {
    let dir = TempDir::new().unwrap();
    // x3000: RES ; x3001: HALT
    let path = write_image(dir.path(), "entry.obj", 0x3000, &[0xD000, 0xF025]);

    lc3vm()
        .args(["--minimal", "--entry", "x3001"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn reads_piped_input() {
    let dir = TempDir::new().unwrap();
    // GETC ; OUT ; IN ; HALT
    let path = write_image(dir.path(), "echo.obj", 0x3000, &[0xF020, 0xF021, 0xF023, 0xF025]);

    lc3vm()
        .arg("--minimal")
        .arg(&path)
        .write_stdin("ab")
        .assert()
        .success()
        .stdout(diff("aEnter a character: b"));
}

#[test]
fn reserved_opcode_is_fatal() {
    let dir = TempDir::new().unwrap();
    // RES ; PUTS-ing program never reached
    let path = write_image(dir.path(), "res.obj", 0x3000, &[0xD000, 0xE002, 0xF022]);

    lc3vm()
        .arg("--minimal")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stdout(is_empty())
        .stderr(contains("reserved opcode RES"));
}

#[test]
fn fatal_error_is_reported_once() {
    let dir = TempDir::new().unwrap();
    let path = write_image(dir.path(), "res.obj", 0x3000, &[0xD000]);

    let output = lc3vm().arg(&path).output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("reserved opcode RES").count(), 1, "{stderr}");
    assert!(stderr.contains("Stopped"));
    assert!(!stderr.contains("HALT"));
}

#[test]
fn keyboard_poll_does_not_wait_for_input() {
    let dir = TempDir::new().unwrap();
    // LDI R1, #1 ; HALT ; .FILL xFE00
    let path = write_image(dir.path(), "poll.obj", 0x3000, &[0xA201, 0xF025, 0xFE00]);

    // Stdin stays open with nothing written, as with an idle user
    let mut child = process::Command::new(assert_cmd::cargo::cargo_bin("lc3vm"))
        .env_remove("LC3VM_LOG")
        .env_remove("LC3VM_MINIMAL")
        .args(["--minimal", "--registers"])
        .arg(&path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let stdin = child.stdin.take();

    let deadline = Instant::now() + Duration::from_secs(5);
    while child.try_wait().unwrap().is_none() {
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("machine blocked on keyboard status poll");
        }
        thread::sleep(Duration::from_millis(20));
    }
    drop(stdin);

    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("HALT\n"), "{stderr}");
    assert!(stderr.contains("R1 0\n"), "{stderr}");
}

#[test]
fn unknown_trap_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_image(dir.path(), "trap.obj", 0x3000, &[0xF0FF]);

    lc3vm()
        .arg("--minimal")
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("0xff"));
}

#[test]
fn input_ending_early_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_image(dir.path(), "getc.obj", 0x3000, &[0xF020, 0xF025]);

    lc3vm()
        .arg("--minimal")
        .arg(&path)
        .write_stdin("")
        .assert()
        .failure()
        .stderr(contains("Input ended"));
}

#[test]
fn missing_image_is_fatal() {
    let dir = TempDir::new().unwrap();

    lc3vm()
        .arg(dir.path().join("missing.obj"))
        .assert()
        .failure()
        .stderr(contains("Could not open image"));
}

#[test]
fn misaligned_image_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("odd.obj");
    fs::write(&path, [0x30, 0x00, 0xF0]).unwrap();

    lc3vm()
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("not aligned"));
}
