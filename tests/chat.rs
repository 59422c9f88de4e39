//! Chat loop integration tests
//!
//! Runs the session against a scripted model client; no network needed.

use colloquy::{ChatSession, Error, Outcome, Role};

mod common;

use common::{StubModel, default_context};

fn session(model: StubModel, data_dir: &std::path::Path) -> ChatSession<StubModel> {
    ChatSession::new(default_context(30), model, data_dir)
}

#[tokio::test]
async fn message_records_user_and_assistant_turns() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(StubModel::with_replies(&["Hello John!"]), dir.path());

    let outcome = chat.handle_line("Hi, I'm John").await.unwrap();
    assert_eq!(outcome, Outcome::Reply("Hello John!".to_string()));

    let history = chat.context().history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].text, "Hello John!");
}

#[tokio::test]
async fn model_receives_enhanced_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(StubModel::with_replies(&["first", "second"]), dir.path());

    chat.handle_line("I'm learning python").await.unwrap();
    chat.handle_line("Can you give a specific example?").await.unwrap();

    let prompts = chat.model().prompts();
    assert_eq!(prompts.len(), 2);
    assert_eq!(prompts[0], "Current topic: personal\n\nI'm learning python");
    assert!(prompts[1].ends_with("Can you give a specific example?"));
    assert_eq!(chat.context().len(), 4);
}

#[tokio::test]
async fn follow_up_prompt_quotes_previous_turns() {
    let dir = tempfile::tempdir().unwrap();
    let model = StubModel::with_replies(&["Python is great for scripts."]);
    let mut chat = ChatSession::new(default_context(30), model, dir.path());

    chat.ask("I'm learning python").await.unwrap();
    chat.ask("What about that earlier point?").await.unwrap();

    let prompts = chat.model().prompts();
    assert!(prompts[1].contains("<prior-context>"));
    assert!(prompts[1].contains("<assistant>\nPython is great for scripts.\n</assistant>"));
    assert!(prompts[1].contains("<user>\nI'm learning python\n</user>"));

    let history = chat.context().history();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].text, "What about that earlier point?");
}

#[tokio::test]
async fn model_error_leaves_user_turn_unanswered() {
    let dir = tempfile::tempdir().unwrap();
    let model = StubModel::default();
    model.fail_next("connection refused");
    let mut chat = session(model, dir.path());

    let result = chat.handle_line("Are you there?").await;
    assert!(matches!(result, Err(Error::Model(_))));

    let history = chat.context().history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn commands_manage_history() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(StubModel::default(), dir.path());

    assert_eq!(chat.handle_line("   ").await.unwrap(), Outcome::Idle);
    chat.handle_line("hello there").await.unwrap();

    let Outcome::Notice(status) = chat.handle_line("/status").await.unwrap() else {
        panic!("status should produce a notice");
    };
    assert!(status.contains("Turns: 2"));

    let Outcome::Notice(help) = chat.handle_line("/help").await.unwrap() else {
        panic!("help should produce a notice");
    };
    assert!(help.contains("/clear"));

    chat.handle_line("/clear").await.unwrap();
    assert!(chat.context().is_empty());

    assert_eq!(chat.handle_line("/quit").await.unwrap(), Outcome::Quit);
}

#[tokio::test]
async fn save_and_load_commands() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.json");
    let mut chat = session(StubModel::with_replies(&["Hi!"]), dir.path());

    chat.handle_line("hello").await.unwrap();
    chat.handle_line(&format!("/save {}", path.display()))
        .await
        .unwrap();
    assert!(path.exists());

    chat.handle_line("/clear").await.unwrap();
    let Outcome::Notice(notice) = chat
        .handle_line(&format!("/load {}", path.display()))
        .await
        .unwrap()
    else {
        panic!("load should produce a notice");
    };
    assert!(notice.starts_with("Loaded 2 turns"));
    assert_eq!(chat.context().len(), 2);
}

#[tokio::test]
async fn save_without_path_uses_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(StubModel::default(), dir.path());
    chat.handle_line("hello").await.unwrap();

    chat.handle_line("/save").await.unwrap();

    let saved: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].starts_with("conversation_"));
}

#[tokio::test]
async fn load_of_corrupt_file_keeps_history() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "not a transcript").unwrap();

    let mut chat = session(StubModel::default(), dir.path());
    chat.handle_line("keep me").await.unwrap();

    let result = chat.handle_line(&format!("/load {}", path.display())).await;
    assert!(matches!(result, Err(Error::CorruptTranscript(_))));
    assert_eq!(chat.context().len(), 2);
}

#[test]
fn run_loop_processes_input_until_quit() {
    let dir = tempfile::tempdir().unwrap();
    let mut chat = session(StubModel::with_replies(&["Hello!", "Sure."]), dir.path());

    let input: &[u8] = b"hi there\n\n/status\nwhat about that?\n/quit\nnever reached\n";
    let mut out = Vec::new();
    tokio_test::block_on(chat.run(input, &mut out)).unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("AI: Hello!"));
    assert!(out.contains("Turns: 2"));
    assert!(out.contains("AI: Sure."));
    assert!(!out.contains("never reached"));
    assert_eq!(chat.context().len(), 4);
}

#[test]
fn run_loop_reports_errors_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let model = StubModel::with_replies(&["recovered"]);
    model.fail_next("timeout");
    let mut chat = session(model, dir.path());

    let input: &[u8] = b"first\nsecond\n";
    let mut out = Vec::new();
    tokio_test::block_on(chat.run(input, &mut out)).unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Error: model error: timeout"));
    assert!(out.contains("AI: recovered"));

    // first user turn stays unanswered
    let roles: Vec<Role> = chat.context().history().iter().map(|t| t.role).collect();
    assert_eq!(roles, [Role::User, Role::User, Role::Assistant]);
}
