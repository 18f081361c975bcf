//! Tests for dangerous-command classification and the confirmation prompt.

use pretty_assertions::assert_eq;
use toolbench::permissions::{
    find_dangerous, is_affirmative, normalize_command, PermissionGate, ScriptedInput, SharedInput,
};

fn gate(skip: bool, answers: &[&str]) -> (PermissionGate, toolbench::permissions::PromptLog) {
    let input = ScriptedInput::new(answers.iter().copied());
    let log = input.log();
    (PermissionGate::new(skip, SharedInput::new(input)), log)
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_destructive_commands_are_flagged() {
    let cases = [
        ("rm -rf /tmp/x", "Recursive delete"),
        ("rm -f important.db", "Forced delete"),
        ("rm *.json", "Wildcard delete"),
        ("psql -c 'DROP TABLE sales'", "Database DROP"),
        ("git push --force origin main", "Forced git push"),
        ("git reset --hard HEAD~3", "Hard git reset"),
        ("sudo apt install foo", "Privilege escalation (sudo)"),
        ("chmod 777 data", "World-writable chmod"),
        ("chmod o+w data", "World-writable chmod"),
    ];
    for (command, description) in cases {
        let pattern = find_dangerous(command).unwrap_or_else(|| panic!("{command} not flagged"));
        assert_eq!(pattern.description, description, "{command}");
    }
}

#[test]
fn test_everyday_commands_pass() {
    for command in [
        "ls -la",
        "git status",
        "git push origin main",
        "rm notes.txt",
        "cat data.json | jq length",
        "psql -c 'DELETE FROM carts WHERE id = 4'",
        "chmod 644 data",
        "echo summary",
    ] {
        assert!(find_dangerous(command).is_none(), "{command} flagged");
    }
}

#[test]
fn test_escaped_command_names_are_normalized() {
    assert_eq!(normalize_command(r"r\m -rf /"), "rm -rf /");
    assert_eq!(normalize_command(r"echo a\nb"), r"echo a\nb");
    assert!(find_dangerous(r"s\udo reboot").is_some());
}

#[test]
fn test_affirmative_answers() {
    assert!(is_affirmative("y"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("no"));
}

// ============================================================================
// Gate
// ============================================================================

#[tokio::test]
async fn test_declined_prompt_shows_warning() {
    let (gate, log) = gate(false, &["n"]);
    assert!(!gate.evaluate("rm -rf build").await);

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].starts_with("WARNING: Recursive delete"));
    assert!(log[0].contains("Command: rm -rf build"));
    assert_eq!(log[1], "Do you want to proceed? (y/N): ");
}

#[tokio::test]
async fn test_approved_prompt() {
    let (gate, _log) = gate(false, &["y"]);
    assert!(gate.evaluate("sudo true").await);
}

#[tokio::test]
async fn test_end_of_input_declines() {
    let (gate, _log) = gate(false, &[]);
    assert!(!gate.evaluate("git reset --hard").await);
}

#[tokio::test]
async fn test_skip_permissions_never_prompts() {
    let (gate, log) = gate(true, &[]);
    assert!(gate.skip_permissions());
    assert!(gate.evaluate("rm -rf /").await);
    assert!(log.lock().unwrap().is_empty());
}
