//! Command service integration tests
//! Run with: cargo test --test command_service_test

use std::sync::Arc;
use cogbot::application::messaging::MessageParser;
use cogbot::application::services::CommandService;
use cogbot::cogs::{builtin, PackageLoader, PackageRegistry};
use cogbot::domain::entities::{Message, User};

const OWNER: &str = "owner-1";

fn service() -> CommandService {
    let loader = PackageLoader::new(PackageRegistry::new().with_reserved(CommandService::core_command_names()))
        .with_namespace(builtin::namespace("cogs").declare("hollow"));
    CommandService::new("===", Arc::new(loader)).with_owners([OWNER])
}

fn say(from: &str, text: &str) -> Message {
    MessageParser::new("===").parse("chat", text, Some(User::new(from)))
}

#[tokio::test]
async fn test_ping_is_public() {
    let svc = service();
    assert_eq!(svc.respond(&say("stranger", "===ping")).await.as_deref(), Some("Pong!"));
}

#[tokio::test]
async fn test_owner_commands_ignore_other_users() {
    let svc = service();

    assert_eq!(svc.respond(&say("stranger", "===load samplecog")).await, None);
    assert!(!svc.loader().is_loaded("samplecog").await);

    assert_eq!(svc.respond(&say("stranger", "===shutdown")).await, None);
    assert!(!svc.shutdown_requested());
}

#[tokio::test]
async fn test_load_use_unload_cycle() {
    let svc = service();

    assert_eq!(
        svc.respond(&say(OWNER, "===load samplecog")).await.as_deref(),
        Some("samplecog loaded.")
    );
    assert_eq!(
        svc.respond(&say("anyone", "===sendcolor 2")).await.as_deref(),
        Some("You chose green!")
    );
    assert_eq!(
        svc.respond(&say(OWNER, "===reload samplecog")).await.as_deref(),
        Some("samplecog reloaded.")
    );
    assert_eq!(
        svc.respond(&say(OWNER, "===unload samplecog")).await.as_deref(),
        Some("samplecog unloaded.")
    );

    // Commands of an unloaded package are unknown again
    assert_eq!(svc.respond(&say("anyone", "===sendcolor 2")).await, None);
}

#[tokio::test]
async fn test_package_error_replies() {
    let svc = service();

    assert_eq!(
        svc.respond(&say(OWNER, "===load nosuchcog")).await.as_deref(),
        Some("Can't find cog package with name `nosuchcog`.")
    );
    assert_eq!(
        svc.respond(&say(OWNER, "===unload samplecog")).await.as_deref(),
        Some("Cog package with name `samplecog` wasn't loaded.")
    );
    assert_eq!(
        svc.respond(&say(OWNER, "===load hollow")).await.as_deref(),
        Some("Cog package with name `hollow` doesn't have `cog_setup()` function.")
    );

    svc.respond(&say(OWNER, "===load samplecog")).await;
    assert_eq!(
        svc.respond(&say(OWNER, "===load samplecog")).await.as_deref(),
        Some("Cog package with name `samplecog` is already loaded.")
    );
}

#[tokio::test]
async fn test_missing_argument_sends_help() {
    let svc = service();
    let reply = svc.respond(&say(OWNER, "===load")).await.unwrap();
    assert!(reply.starts_with("===load - "), "{}", reply);
    assert!(reply.contains("Usage: ===load <name>"), "{}", reply);
}

#[tokio::test]
async fn test_bad_argument_message_is_sent() {
    let svc = service();
    svc.respond(&say(OWNER, "===load samplecog")).await;

    assert_eq!(
        svc.respond(&say(OWNER, "===sendcolor purple")).await.as_deref(),
        Some("`purple` is not a valid number!")
    );
    assert_eq!(
        svc.respond(&say(OWNER, "===sendcolor 7")).await.as_deref(),
        Some("We don't have a color with number `7`.")
    );
}

#[tokio::test]
async fn test_packages_listing_and_shutdown() {
    let svc = service();
    assert_eq!(
        svc.respond(&say(OWNER, "===packages")).await.as_deref(),
        Some("No cog packages loaded.")
    );

    svc.respond(&say(OWNER, "===load samplecog")).await;
    let listing = svc.respond(&say(OWNER, "===packages")).await.unwrap();
    assert!(listing.contains("- cogs.samplecog (built-in)"), "{}", listing);

    svc.respond(&say(OWNER, "===shutdown")).await;
    assert!(svc.shutdown_requested());
}

#[tokio::test]
async fn test_plain_text_and_unknown_commands_are_ignored() {
    let svc = service();
    assert_eq!(svc.respond(&say(OWNER, "hello there")).await, None);
    assert_eq!(svc.respond(&say(OWNER, "===frobnicate")).await, None);
}

#[tokio::test]
async fn test_other_bots_are_ignored() {
    let svc = service();
    let msg = MessageParser::new("===").parse("chat", "===ping", Some(User::new("b-1").bot()));
    assert_eq!(svc.respond(&msg).await, None);
}
