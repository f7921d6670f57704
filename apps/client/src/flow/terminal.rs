//! Line-oriented terminal driver for the flow.
//!
//! Input lines and chat completions are the only events. While a chat request is in
//! flight the driver keeps reading lines, so a second question can be typed and is
//! turned away by the session's guard instead of queueing behind the first.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

use super::{step_indicator, Flow, Step};
use crate::api_client::ResumeBackend;
use crate::catalog::{CatalogState, MISSING_FIELDS_HINT};
use crate::chat::THINKING;
use crate::errors::AppError;
use crate::models::{ChatResponse, Role};
use crate::render::to_text;
use crate::tags::{normalize, TagInput};
use crate::upload::{PdfFile, SUBMITTING_STAGE};

type ChatFuture = Pin<Box<dyn Future<Output = Result<ChatResponse, AppError>> + Send>>;

const SELECT_HELP: &str = "Type a number to choose a template, then /continue. \
    /select <n> switches template once custom fields are open. /quit leaves at any time.";
const TAGS_HELP: &str = "🏷️ Type a field name and hit Enter or , to add it \
    (e.g. name, email, years of experience…). /undo removes the last one, /remove <field> a specific one.";
const REMOVE_USAGE: &str = "Type /remove <field>.";
const UPLOAD_HELP: &str = "Type the path to your resume PDF, then /parse. /back returns to the templates.";
const RESULTS_HELP: &str =
    "Ask anything about the resume. /copy, /download, /fields, /restart, /quit.";

enum Event {
    Line(Option<String>),
    Settled(Result<ChatResponse, AppError>),
}

#[derive(Debug, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

pub struct Terminal<R, W> {
    input: Lines<R>,
    out: W,
    backend: Arc<dyn ResumeBackend>,
    flow: Flow,
    export_dir: PathBuf,
    in_flight: Option<ChatFuture>,
}

impl<R, W> Terminal<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        input: R,
        out: W,
        backend: Arc<dyn ResumeBackend>,
        flow: Flow,
        export_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.lines(),
            out,
            backend,
            flow,
            export_dir: export_dir.into(),
            in_flight: None,
        }
    }

    /// Runs until `/quit` or end of input. A pending chat request is always
    /// allowed to settle before returning.
    pub async fn run(&mut self) -> Result<()> {
        self.enter_step().await?;

        loop {
            let event = match self.in_flight.as_mut() {
                Some(pending) => tokio::select! {
                    outcome = pending => Event::Settled(outcome),
                    line = self.input.next_line() => Event::Line(line?),
                },
                None => Event::Line(self.input.next_line().await?),
            };

            match event {
                Event::Settled(outcome) => {
                    self.in_flight = None;
                    self.settle_chat(outcome)?;
                }
                Event::Line(None) => break,
                Event::Line(Some(line)) => {
                    if self.handle_line(line.trim()).await? == Control::Quit {
                        break;
                    }
                }
            }
        }

        self.drain().await?;
        writeln!(self.out, "Goodbye!")?;
        Ok(())
    }

    async fn enter_step(&mut self) -> Result<()> {
        if let Step::SelectSchema(selector) = self.flow.step_mut() {
            if matches!(selector.catalog(), CatalogState::Loading) {
                selector.load(self.backend.as_ref()).await;
            }
        }
        self.show_step()
    }

    fn show_step(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", step_indicator(self.flow.step_number()))?;
        writeln!(self.out)?;

        match self.flow.step() {
            Step::SelectSchema(selector) => {
                writeln!(self.out, "What kind of resume are you working with?")?;
                match selector.catalog() {
                    CatalogState::Loading => writeln!(self.out, "Getting things ready…")?,
                    CatalogState::Failed(message) => {
                        writeln!(self.out, "⚠️ {message}")?;
                        writeln!(self.out, "Type /retry to try again, or /quit.")?;
                    }
                    CatalogState::Ready(schemas) => {
                        for (i, schema) in schemas.iter().enumerate() {
                            writeln!(
                                self.out,
                                "  {}. {} {} — {}",
                                i + 1,
                                schema.icon,
                                schema.label,
                                schema.description
                            )?;
                            if schema.is_custom() {
                                writeln!(self.out, "     you'll define the fields below ↓")?;
                            } else {
                                writeln!(
                                    self.out,
                                    "     fields: {}",
                                    schema.display_fields().join(", ")
                                )?;
                            }
                        }
                        writeln!(self.out, "{SELECT_HELP}")?;
                    }
                }
            }
            Step::Upload(upload) => {
                writeln!(self.out, "Drop in Your Resume PDF")?;
                writeln!(
                    self.out,
                    "We'll pull out the {} fields for you.",
                    upload.schema().label
                )?;
                writeln!(self.out, "Only PDF files are accepted · Max size 20 MB")?;
                writeln!(self.out, "{UPLOAD_HELP}")?;
            }
            Step::Results(view) => {
                writeln!(self.out, "Here's What We Found ✓")?;
                writeln!(
                    self.out,
                    "Pulled {} values from your resume using the {} template.",
                    view.tree.scalar_leaves(),
                    view.schema.label
                )?;
                writeln!(self.out)?;
                write!(self.out, "{}", to_text(&view.tree))?;
                writeln!(self.out)?;
                for message in view.chat.transcript() {
                    let who = match message.role {
                        Role::User => "You",
                        Role::Assistant => "Assistant",
                    };
                    writeln!(self.out, "{who}: {}", message.text)?;
                }
                writeln!(self.out, "{RESULTS_HELP}")?;
            }
        }
        Ok(())
    }

    async fn handle_line(&mut self, line: &str) -> Result<Control> {
        if line.is_empty() {
            return Ok(Control::Continue);
        }
        if line == "/quit" || line == "/q" {
            return Ok(Control::Quit);
        }

        match self.flow.step_number() {
            1 => self.handle_select(line).await?,
            2 => self.handle_upload(line).await?,
            _ => self.handle_results(line).await?,
        }
        Ok(Control::Continue)
    }

    async fn handle_select(&mut self, line: &str) -> Result<()> {
        let (command, arg) = split_command(line);
        let Step::SelectSchema(selector) = self.flow.step_mut() else {
            return Ok(());
        };

        match command {
            "/retry" => {
                if matches!(selector.catalog(), CatalogState::Failed(_)) {
                    selector.load(self.backend.as_ref()).await;
                    self.show_step()?;
                }
            }
            "/continue" => {
                selector.tags_mut().handle(TagInput::Blur);
                match selector.finalize() {
                    Ok(schema) => {
                        self.flow.schema_chosen(schema);
                        self.enter_step().await?;
                    }
                    Err(e) => writeln!(self.out, "⚠️ {}", e.user_message())?,
                }
            }
            "/undo" => {
                selector.tags_mut().handle(TagInput::Backspace);
                self.show_tags()?;
            }
            "/remove" => {
                let token = normalize(arg);
                if token.is_empty() {
                    writeln!(self.out, "{REMOVE_USAGE}")?;
                } else {
                    selector.tags_mut().remove(&token);
                    self.show_tags()?;
                }
            }
            "/select" => self.select_template(arg)?,
            _ if command.starts_with('/') => writeln!(self.out, "{SELECT_HELP}")?,
            _ if selector.custom_selected() => {
                let rejected = selector.tags_mut().add_line(line);
                for segment in rejected {
                    writeln!(self.out, "Skipped \"{segment}\" (empty or already added).")?;
                }
                self.show_tags()?;
            }
            _ => self.select_template(line)?,
        }
        Ok(())
    }

    /// Selects by 1-based number or by schema id.
    fn select_template(&mut self, choice: &str) -> Result<()> {
        let Step::SelectSchema(selector) = self.flow.step_mut() else {
            return Ok(());
        };

        let picked = match choice.parse::<usize>() {
            Ok(n) => n >= 1 && selector.select(n - 1),
            Err(_) => selector.select_id(choice),
        };
        if !picked {
            writeln!(
                self.out,
                "Type a number between 1 and {}.",
                selector.schemas().len()
            )?;
            return Ok(());
        }

        let custom = selector.custom_selected();
        let label = selector
            .selected()
            .map(|s| s.label.clone())
            .unwrap_or_default();
        writeln!(self.out, "Selected \"{label}\".")?;
        if custom {
            writeln!(self.out, "{TAGS_HELP}")?;
            self.show_tags()?;
        }
        Ok(())
    }

    fn show_tags(&mut self) -> Result<()> {
        let Step::SelectSchema(selector) = self.flow.step() else {
            return Ok(());
        };
        if selector.tags().is_valid() {
            writeln!(
                self.out,
                "Fields: {}",
                selector.tags().display_tokens().join(" · ")
            )?;
        } else {
            writeln!(self.out, "⚠️ {MISSING_FIELDS_HINT}")?;
        }
        Ok(())
    }

    async fn handle_upload(&mut self, line: &str) -> Result<()> {
        match line {
            "/back" => {
                self.flow.back();
                self.enter_step().await?;
            }
            "/parse" => {
                let Step::Upload(upload) = self.flow.step_mut() else {
                    return Ok(());
                };
                if !upload.can_submit() {
                    writeln!(self.out, "Choose a PDF file first.")?;
                    return Ok(());
                }
                writeln!(self.out, "{SUBMITTING_STAGE}")?;
                let parsed = upload.submit(self.backend.as_ref()).await;

                match parsed {
                    Some(parsed) => {
                        self.flow.upload_complete(parsed);
                        self.enter_step().await?;
                    }
                    None => {
                        if let Some(error) = upload.error() {
                            writeln!(self.out, "⚠️ {error}")?;
                        }
                        upload.dismiss_error();
                    }
                }
            }
            _ => {
                let candidate = PdfFile::load(Path::new(line)).await;
                let Step::Upload(upload) = self.flow.step_mut() else {
                    return Ok(());
                };
                upload.select(candidate);
                if let Some(error) = upload.error() {
                    writeln!(self.out, "⚠️ {error}")?;
                    upload.dismiss_error();
                } else if let Some(summary) = upload.file_summary() {
                    writeln!(self.out, "📄 {summary}")?;
                }
            }
        }
        Ok(())
    }

    async fn handle_results(&mut self, line: &str) -> Result<()> {
        let Step::Results(view) = self.flow.step_mut() else {
            return Ok(());
        };

        match line {
            "/copy" => match view.copy_text() {
                Ok(text) => {
                    writeln!(self.out, "{text}")?;
                    writeln!(self.out, "Copied ✓")?;
                }
                Err(e) => writeln!(self.out, "⚠️ {}", e.user_message())?,
            },
            "/download" => match view.download(&self.export_dir) {
                Ok(path) => writeln!(self.out, "⤓ Saved {}", path.display())?,
                Err(e) => writeln!(self.out, "⚠️ {}", e.user_message())?,
            },
            "/fields" => write!(self.out, "{}", to_text(&view.tree))?,
            "/restart" => {
                if self.in_flight.is_some() {
                    writeln!(self.out, "Wait for the current answer first.")?;
                } else {
                    self.flow.start_over();
                    self.enter_step().await?;
                }
            }
            _ if line.starts_with('/') => writeln!(self.out, "{RESULTS_HELP}")?,
            _ => match view.chat.begin(line) {
                Some(request) => {
                    writeln!(self.out, "{THINKING}")?;
                    debug!("Chat request issued for session {}", view.chat.session_id());
                    let backend = Arc::clone(&self.backend);
                    self.in_flight = Some(Box::pin(async move {
                        backend.chat(&request.session_id, &request.message).await
                    }));
                }
                None => {
                    if view.chat.is_pending() {
                        writeln!(self.out, "Still waiting for the previous answer…")?;
                    }
                }
            },
        }
        Ok(())
    }

    fn settle_chat(&mut self, outcome: Result<ChatResponse, AppError>) -> Result<()> {
        let Step::Results(view) = self.flow.step_mut() else {
            return Ok(());
        };
        if let Some(reply) = view.chat.settle(outcome) {
            writeln!(self.out, "Assistant: {}", reply.text)?;
        }
        Ok(())
    }

    async fn drain(&mut self) -> Result<()> {
        if let Some(pending) = self.in_flight.take() {
            let outcome = pending.await;
            self.settle_chat(outcome)?;
        }
        Ok(())
    }
}

/// `"/remove 3 years"` → `("/remove", "3 years")`.
fn split_command(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((command, arg)) => (command, arg.trim()),
        None => (line, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParseResponse, Schema};
    use crate::store::{FileStore, ResultStore};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct FakeBackend {
        chat_delay: Duration,
    }

    #[async_trait]
    impl ResumeBackend for FakeBackend {
        async fn schema_options(&self) -> Result<Vec<Schema>, AppError> {
            Ok(vec![Schema {
                id: "general".to_string(),
                label: "General".to_string(),
                description: "Everyday resumes".to_string(),
                icon: "📄".to_string(),
                fields: vec!["name".to_string()],
                custom_fields: None,
            }])
        }

        async fn parse_resume(&self, pdf: &PdfFile, schema: &Schema) -> Result<ParseResponse, AppError> {
            assert_eq!(pdf.file_name, "resume.pdf");
            assert_eq!(schema.custom_fields_param().as_deref(), Some("name,3_years_exp"));
            Ok(ParseResponse {
                session_id: "abc".to_string(),
                json_data: json!({"name": "Jane Doe", "skills": ["Go", "Rust"]}),
            })
        }

        async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, AppError> {
            tokio::time::sleep(self.chat_delay).await;
            Ok(ChatResponse {
                answer: format!("[{session_id}] You asked: {message}"),
            })
        }
    }

    async fn drive(script: String, chat_delay: Duration, storage: &Path) -> (Flow, String) {
        let flow = Flow::new(ResultStore::new(FileStore::new(storage)));
        let backend: Arc<dyn ResumeBackend> = Arc::new(FakeBackend { chat_delay });
        let mut terminal = Terminal::new(script.as_bytes(), Vec::new(), backend, flow, storage);
        terminal.run().await.unwrap();

        (terminal.flow, String::from_utf8(terminal.out).unwrap())
    }

    fn resume_pdf(dir: &Path) -> String {
        let path = dir.join("resume.pdf");
        std::fs::write(&path, b"%PDF-1.4 fake").unwrap();
        path.display().to_string()
    }

    #[tokio::test]
    async fn test_custom_fields_through_to_chat() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = resume_pdf(dir.path());
        let script = format!(
            "2\nname, 3 years exp\n/continue\n{pdf}\n/parse\nWhat skills?\n/quit\n"
        );

        let (flow, out) = drive(script, Duration::ZERO, dir.path()).await;

        assert!(out.contains("Fields: name · 3 years exp"));
        assert!(out.contains("● 2 Upload Resume"));
        assert!(out.contains("📄 resume.pdf"));
        assert!(out.contains("Pulled 3 values from your resume using the Custom Fields template."));
        assert!(out.contains("Name: Jane Doe"));
        assert!(out.contains("Skills: Go, Rust"));
        assert!(out.contains("Assistant: [abc] You asked: What skills?"));
        assert!(out.trim_end().ends_with("Goodbye!"));

        let Step::Results(view) = flow.step() else {
            panic!("expected results step");
        };
        assert_eq!(view.chat.transcript().len(), 3);
        assert!(!view.chat.is_pending());

        let record = flow.store.last().unwrap().unwrap();
        assert_eq!(record.session_id, "abc");
        assert_eq!(record.data["name"], "Jane Doe");
    }

    #[tokio::test]
    async fn test_second_question_while_waiting_is_turned_away() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = resume_pdf(dir.path());
        let script = format!(
            "2\nname\n3 years exp\n/continue\n{pdf}\n/parse\nWhat skills?\nAnd education?\n"
        );

        let (flow, out) = drive(script, Duration::from_millis(50), dir.path()).await;

        assert!(out.contains("Still waiting for the previous answer…"));
        assert!(out.contains("Assistant: [abc] You asked: What skills?"));
        assert!(!out.contains("You asked: And education?"));

        let Step::Results(view) = flow.step() else {
            panic!("expected results step");
        };
        assert_eq!(view.chat.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_non_pdf_path_shows_error_and_blocks_parse() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "hello").unwrap();
        let script = format!("1\n/continue\n{}\n/parse\n/quit\n", notes.display());

        let (flow, out) = drive(script, Duration::ZERO, dir.path()).await;

        assert!(out.contains("⚠️ Please select a valid PDF file."));
        assert!(out.contains("Choose a PDF file first."));
        assert_eq!(flow.step_number(), 2);
        assert!(flow.store.last().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_slash_commands_never_become_fields() {
        let dir = tempfile::tempdir().unwrap();
        let script = "2\nname\n/remove\n/help\n/parse\n2024\n/undo\n2024\n/continue\n/quit\n";

        let (flow, out) = drive(script.to_string(), Duration::ZERO, dir.path()).await;

        assert!(out.contains(REMOVE_USAGE));
        assert!(out.contains(SELECT_HELP));
        let Step::Upload(upload) = flow.step() else {
            panic!("expected upload step");
        };
        assert_eq!(upload.schema().fields, vec!["name", "2024"]);
    }

    #[tokio::test]
    async fn test_select_switches_away_from_custom_fields() {
        let dir = tempfile::tempdir().unwrap();
        let script = "2\nname\n/select general\n/continue\n/quit\n";

        let (flow, out) = drive(script.to_string(), Duration::ZERO, dir.path()).await;

        assert!(out.contains("Selected \"General\"."));
        let Step::Upload(upload) = flow.step() else {
            panic!("expected upload step");
        };
        assert_eq!(upload.schema().id, "general");
        assert_eq!(upload.schema().custom_fields, None);
    }

    #[test]
    fn test_split_command() {
        assert_eq!(split_command("/remove 3 years exp"), ("/remove", "3 years exp"));
        assert_eq!(split_command("/remove"), ("/remove", ""));
        assert_eq!(split_command("name, email"), ("name,", "email"));
    }
}
