//! Terminal chat mode.
//!
//! Reads one message per line. `sos` runs the interactive alert workflow;
//! `exit`, `quit` or `bye` ends the conversation.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::info;

use wayfarer_chat::intent::progress_notice;
use wayfarer_chat::replies::{greeting, FAREWELL_TEXT};
use wayfarer_chat::TravelOrchestrator;
use wayfarer_core::types::{ApiStatus, Contact};
use wayfarer_sos::SosService;

/// Contacts requested when a user triggers SOS with none saved.
const SETUP_CONTACT_COUNT: usize = 2;

pub struct Repl<'a> {
    orchestrator: &'a TravelOrchestrator,
    sos: &'a SosService,
    user_id: String,
}

impl<'a> Repl<'a> {
    pub fn new(
        orchestrator: &'a TravelOrchestrator,
        sos: &'a SosService,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            sos,
            user_id: user_id.into(),
        }
    }

    /// Run until an exit word or end of input.
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        banner(output).await?;

        loop {
            let Some(line) = ask(&mut lines, output, "\nYou: ").await? else {
                break;
            };
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            match text.to_lowercase().as_str() {
                "exit" | "quit" | "bye" => {
                    say(output, &format!("Assistant: {}", FAREWELL_TEXT)).await?;
                    break;
                }
                "sos" => self.sos_workflow(&mut lines, output).await?,
                _ => {
                    if let Some(notice) = progress_notice(text) {
                        say(output, notice).await?;
                    }
                    let reply = self.orchestrator.handle_turn(&self.user_id, text).await;
                    say(output, &format!("Assistant: {}", reply.text)).await?;
                }
            }
        }

        self.orchestrator.clear_session(&self.user_id);
        Ok(())
    }

    async fn sos_workflow<R, W>(&self, lines: &mut Lines<R>, output: &mut W) -> io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(user_id = %self.user_id, "Terminal SOS workflow started");
        say(output, "\n🚨 EMERGENCY SOS").await?;

        if self.sos.load_contacts(&self.user_id).await.is_empty() {
            say(output, "No emergency contacts found. Let's add two now.").await?;
            let mut contacts = Vec::with_capacity(SETUP_CONTACT_COUNT);
            for i in 1..=SETUP_CONTACT_COUNT {
                let Some(name) = ask(lines, output, &format!("Contact {} name: ", i)).await? else {
                    return Ok(());
                };
                let Some(number) = ask(lines, output, &format!("Contact {} phone: ", i)).await? else {
                    return Ok(());
                };
                let relation = ask(lines, output, &format!("Contact {} relation: ", i))
                    .await?
                    .unwrap_or_default();
                contacts.push(Contact::new(name, number, relation));
            }

            let reply = self.sos.save_contacts(&self.user_id, &contacts).await;
            say(output, &reply.message).await?;
            if reply.status == ApiStatus::Error {
                return Ok(());
            }
        }

        let location = ask(lines, output, "Your current location (optional): ")
            .await?
            .filter(|l| !l.trim().is_empty());
        let message = ask(lines, output, "Emergency message (optional): ")
            .await?
            .filter(|m| !m.trim().is_empty());

        let report = self.sos.trigger(&self.user_id, location, message).await;
        say(output, &report.summary()).await
    }
}

async fn banner<W: AsyncWrite + Unpin>(output: &mut W) -> io::Result<()> {
    say(output, "🌍 AI Travel Assistant").await?;
    say(output, greeting()).await?;
    say(
        output,
        "Ask about weather, places, hotels or trip plans. Type 'sos' for emergency alerts, 'exit' to quit.",
    )
    .await
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> io::Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}

/// Print a prompt and read one line. `None` at end of input.
async fn ask<R, W>(lines: &mut Lines<R>, output: &mut W, prompt: &str) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(prompt.as_bytes()).await?;
    output.flush().await?;
    Ok(lines.next_line().await?.map(|l| l.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::Value;

    use wayfarer_chat::{ChatError, LanguageModel, Message, ModelReply, SessionStore};
    use wayfarer_core::LocationNormalizer;
    use wayfarer_sos::{LocalContactFile, SimulatedChannel};
    use wayfarer_tools::{Providers, ToolRegistry};

    struct CannedModel;

    #[async_trait]
    impl LanguageModel for CannedModel {
        async fn decide(&self, _m: &[Message], _t: &[Value]) -> Result<ModelReply, ChatError> {
            Ok(ModelReply::text("Namaste! Happy to help."))
        }

        async fn complete(&self, _m: &[Message]) -> Result<String, ChatError> {
            Ok("synthesized".to_string())
        }
    }

    fn services(dir: &Path) -> (TravelOrchestrator, SosService) {
        let sos = SosService::new(
            Arc::new(LocalContactFile::new(dir.join("primary.json"))),
            Arc::new(LocalContactFile::new(dir.join("fallback.json"))),
            Arc::new(SimulatedChannel),
        )
        .with_send_delay(Duration::ZERO);
        let registry = ToolRegistry::new(Providers::default(), Arc::new(LocationNormalizer::default()));
        let orchestrator =
            TravelOrchestrator::new(Arc::new(CannedModel), registry, Arc::new(SessionStore::new()));
        (orchestrator, sos)
    }

    async fn transcript(dir: &Path, input: &str) -> String {
        let (orchestrator, sos) = services(dir);
        let repl = Repl::new(&orchestrator, &sos, "tester");
        let mut out = Vec::new();
        repl.run(input.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    // ---- Conversation ----

    #[tokio::test]
    async fn test_exit_says_farewell() {
        let dir = tempfile::tempdir().unwrap();
        let out = transcript(dir.path(), "exit\n").await;
        assert!(out.contains("Good "));
        assert!(out.contains(FAREWELL_TEXT));
    }

    #[tokio::test]
    async fn test_end_of_input_stops_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let out = transcript(dir.path(), "").await;
        assert!(!out.contains(FAREWELL_TEXT));
    }

    #[tokio::test]
    async fn test_turn_reply_printed() {
        let dir = tempfile::tempdir().unwrap();
        let out = transcript(dir.path(), "hello\n\nBYE\n").await;
        assert!(out.contains("Assistant: Namaste! Happy to help."));
        assert!(out.contains(FAREWELL_TEXT));
    }

    #[tokio::test]
    async fn test_progress_notice_before_reply() {
        let dir = tempfile::tempdir().unwrap();
        let out = transcript(dir.path(), "plan a trip to goa\nquit\n").await;
        let notice = out.find("Planning Your Perfect Trip").unwrap();
        let reply = out.find("Assistant: Namaste!").unwrap();
        assert!(notice < reply);
    }

    // ---- SOS workflow ----

    #[tokio::test]
    async fn test_sos_sets_up_contacts_then_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let input = "sos\nAsha\n9876543210\nsister\nRavi\n9123456780\nfriend\nKochi\n\nexit\n";
        let out = transcript(dir.path(), input).await;
        assert!(out.contains("Let's add two now."));
        assert!(out.contains("2 emergency contacts saved"));
        assert!(out.contains("(2/2 sent)"));
        assert!(out.contains(FAREWELL_TEXT));
    }

    #[tokio::test]
    async fn test_sos_with_bad_contacts_does_not_trigger() {
        let dir = tempfile::tempdir().unwrap();
        let input = "sos\nAsha\n12\n\nRavi\n34\n\nexit\n";
        let out = transcript(dir.path(), input).await;
        assert!(out.contains("❌ Failed to add contact"));
        assert!(!out.contains("SOS Alert Results"));
    }

    #[tokio::test]
    async fn test_sos_with_saved_contacts_skips_setup() {
        let dir = tempfile::tempdir().unwrap();
        let (orchestrator, sos) = services(dir.path());
        sos.add_contact("tester", "Asha", "9876543210", "sister").await;

        let repl = Repl::new(&orchestrator, &sos, "tester");
        let mut out = Vec::new();
        repl.run("sos\n\nI fell on the trail\nexit\n".as_bytes(), &mut out)
            .await
            .unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(!out.contains("Let's add two now."));
        assert!(out.contains("(1/1 sent)"));
    }
}
