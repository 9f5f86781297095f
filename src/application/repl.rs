#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::str::FromStr;

use anyhow::Result;
use tokio::io;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use yansi::Paint;

use super::render;
use crate::domain::models::Conversation;
use crate::domain::models::Event;
use crate::domain::models::PreviewState;
use crate::domain::models::SlashCommand;
use crate::domain::models::Tab;
use crate::domain::services::ConversationState;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /stop (/s) - Stops the reply currently being generated.
- /retry (/r) - Generates a new reply to your last message.
- /undo (/u) - Removes your last message and its reply.
- /clear (/new) - Starts a new conversation.
- /login [USER] [TEAM?] [TOKEN?] - Signs in as USER.
- /logout - Signs out.
- /preview (/p) - Shows the preview panel.
- /select [NUMBER] - Puts the fragment of message NUMBER back into the preview.
- /tab [code,fragment] - Switches the preview tab.
- /close - Hides the preview panel.
- /quit /exit (/q) - Exit Shopfloor.
- /help (/h) - Provides this help menu.

Anything else is sent as a message. Sending while a reply is generating stops it first.
        "#;

    return text.trim().to_string();
}

/// A block of text for the terminal, tagged with how it should look.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Output {
    Message(String),
    Preview(String),
    Notice(String),
    Status(String),
    Info(String),
}

impl Output {
    fn print(&self) {
        match self {
            Output::Message(text) => println!("{text}\n"),
            Output::Preview(text) => println!("{}\n", Paint::cyan(text)),
            Output::Notice(text) => println!("{}\n", Paint::red(text)),
            Output::Status(text) => println!("{}", Paint::new(text).dimmed()),
            Output::Info(text) => println!("{}\n", Paint::yellow(text)),
        }
    }
}

/// Tracks which messages have been printed. Only settled messages are
/// printed, a streaming one waits until its attempt ends.
#[derive(Default)]
struct TranscriptPrinter {
    printed: usize,
}

impl TranscriptPrinter {
    fn rewind(&mut self, len: usize) {
        self.printed = self.printed.min(len);
    }

    fn pending(&mut self, conversation: &Conversation) -> Vec<Output> {
        self.rewind(conversation.len());

        let mut res = vec![];
        for (idx, message) in conversation.messages().iter().enumerate().skip(self.printed) {
            if message.streaming {
                break;
            }
            res.push(Output::Message(render::message(idx + 1, message)));
            self.printed = idx + 1;
        }

        return res;
    }
}

pub struct Repl {
    state: ConversationState,
    printer: TranscriptPrinter,
    last_status: Option<String>,
    last_preview: PreviewState,
    replies: Vec<Output>,
}

impl Repl {
    pub fn new(state: ConversationState) -> Repl {
        return Repl {
            state,
            printer: TranscriptPrinter::default(),
            last_status: None,
            last_preview: PreviewState::default(),
            replies: vec![],
        };
    }

    /// Applies one line of input. Returns false when the user asked to quit.
    pub fn handle_input(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        if !line.starts_with('/') {
            self.state.submit(line, vec![]);
            return true;
        }

        let cmd = match SlashCommand::parse(line) {
            Some(cmd) => cmd,
            None => {
                return self.reply(Output::Info(format!(
                    "Unknown command '{line}'. Type /help for a list of commands."
                )));
            }
        };

        if cmd.is_quit() {
            self.state.stop();
            return false;
        }

        if cmd.is_help() {
            return self.reply(Output::Info(help_text()));
        }

        if cmd.is_stop() {
            self.state.stop();
            return true;
        }

        if cmd.is_retry() {
            let keep = self
                .state
                .conversation
                .through_last_user()
                .map(|messages| return messages.len());

            match keep {
                Some(keep) => {
                    self.printer.rewind(keep);
                    self.state.retry();
                }
                None => return self.reply(Output::Info("There is nothing to retry.".to_string())),
            }
            return true;
        }

        if cmd.is_undo() {
            if !self.state.undo() {
                return self.reply(Output::Info("There is nothing to undo.".to_string()));
            }
            return self.reply(Output::Info("Removed the last exchange.".to_string()));
        }

        if cmd.is_clear() {
            self.state.clear();
            return self.reply(Output::Info("Started a new conversation.".to_string()));
        }

        if cmd.is_login() {
            let user = cmd.args[0].to_string();
            let team = cmd.args.get(1).cloned();
            let token = cmd.args.get(2).cloned();
            self.state.session.login(&user, team, token);
            return self.reply(Output::Info(format!("Signed in as {user}.")));
        }

        if cmd.is_logout() {
            self.state.session.logout();
            return self.reply(Output::Info("Signed out.".to_string()));
        }

        if cmd.is_preview() {
            self.state.preview.visible = self.state.preview.fragment.is_some();
            self.last_preview = self.state.preview.clone();
            return self.reply(Output::Preview(render::preview(&self.state.preview)));
        }

        if cmd.is_select() {
            let selected = cmd
                .select_index()
                .map(|idx| return self.state.select_message(idx))
                .unwrap_or(false);
            if !selected {
                return self.reply(Output::Info(
                    "That message has no fragment to preview.".to_string(),
                ));
            }
            return true;
        }

        if cmd.is_tab() {
            match Tab::from_str(&cmd.args[0]) {
                Ok(tab) => self.state.set_tab(tab),
                Err(_) => {
                    return self.reply(Output::Info(
                        "Tabs are 'code' or 'fragment'.".to_string(),
                    ));
                }
            }
            return true;
        }

        if cmd.is_close() {
            self.state.close_preview();
        }

        return true;
    }

    fn reply(&mut self, output: Output) -> bool {
        self.replies.push(output);
        return true;
    }

    pub fn handle_event(&mut self, event: Event) {
        self.state.handle_event(event);
    }

    /// Everything that changed since the last call, in print order.
    pub fn drain_output(&mut self) -> Vec<Output> {
        let mut res = self.printer.pending(&self.state.conversation);
        res.append(&mut self.replies);

        for notice in self.state.drain_notices() {
            res.push(Output::Notice(render::notice(&notice)));
        }

        if self.state.preview != self.last_preview {
            if self.state.preview.visible {
                res.push(Output::Preview(render::preview(&self.state.preview)));
            }
            self.last_preview = self.state.preview.clone();
        }

        let status = self.state.loading.label();
        if status != self.last_status {
            if let Some(status) = &status {
                res.push(Output::Status(status.to_string()));
            }
            self.last_status = status;
        }

        return res;
    }
}

fn print_all(outputs: Vec<Output>) {
    for output in outputs.iter() {
        output.print();
    }
}

/// Reads lines from stdin until EOF or `/quit`, applying worker events as
/// they arrive.
pub async fn start(state: ConversationState, rx: &mut mpsc::UnboundedReceiver<Event>) -> Result<()> {
    if let Err(err) = state.generations().backend().health_check().await {
        tracing::warn!(error = ?err, "Generation endpoint health check failed");
        Output::Info(format!(
            "Warning: {err}. Store requests still work, generated replies may fail."
        ))
        .print();
    }

    let mut repl = Repl::new(state);
    let mut lines = BufReader::new(io::stdin()).lines();

    println!(
        "{}\n",
        Paint::new("Ask about your stores, or describe something to build. Type /help for commands.").bold()
    );

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };

                if !repl.handle_input(&line) {
                    break;
                }
            }
            Some(event) = rx.recv() => {
                repl.handle_event(event);
            }
        }

        print_all(repl.drain_output());
    }

    return Ok(());
}
