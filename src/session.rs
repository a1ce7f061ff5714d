//! Session state machine
//!
//! The session loop is the single consumer of recognized utterances and the
//! sole owner of session state, so no locking is involved. The idle deadline
//! is a one-shot channel raced against the utterance queue.

use crate::answer::AnswerBackend;
use crate::config::Config;
use crate::dispatch::CommandDispatcher;
use crate::homeassistant::ActionSink;
use crossbeam_channel::{after, never, select, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One recognized span of speech
#[derive(Clone, Debug)]
pub struct Utterance {
    /// Normalized lowercase text
    pub text: String,
    /// When the utterance boundary was detected
    pub heard_at: Instant,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            heard_at: Instant::now(),
        }
    }
}

/// Activation state of the command session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Ignoring everything except activation phrases
    #[default]
    Inactive,
    /// Interpreting utterances as commands
    Active,
    /// Next utterance is taken verbatim as a question
    AwaitingQuestion,
}

impl SessionState {
    /// Check if the session ignores commands
    pub fn is_inactive(&self) -> bool {
        matches!(self, SessionState::Inactive)
    }

    /// Check if the session accepts commands or a question
    pub fn is_active(&self) -> bool {
        !self.is_inactive()
    }

    /// Check if the next utterance will be taken as a question
    pub fn is_awaiting_question(&self) -> bool {
        matches!(self, SessionState::AwaitingQuestion)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Inactive => write!(f, "Inactive"),
            SessionState::Active => write!(f, "Active"),
            SessionState::AwaitingQuestion => write!(f, "AwaitingQuestion"),
        }
    }
}

/// Drives the state machine over the utterance queue
pub struct Session {
    state: SessionState,
    activation_phrases: Vec<String>,
    deactivation_phrases: Vec<String>,
    question_phrases: Vec<String>,
    idle_timeout: Duration,
    dispatcher: CommandDispatcher,
    sink: Arc<dyn ActionSink>,
    answers: Box<dyn AnswerBackend>,
}

impl Session {
    pub fn new(config: &Config, sink: Arc<dyn ActionSink>, answers: Box<dyn AnswerBackend>) -> Self {
        let dispatcher = CommandDispatcher::new(config.options.commands.clone(), sink.clone());
        Self {
            state: SessionState::default(),
            activation_phrases: config.options.activation_phrases.clone(),
            deactivation_phrases: config.options.deactivation_phrases.clone(),
            question_phrases: config.options.ai_question_phrases.clone(),
            idle_timeout: config.idle_timeout(),
            dispatcher,
            sink,
            answers,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session loop until the utterance channel disconnects.
    ///
    /// The idle deadline races against the next utterance and forces the
    /// session back to inactive when it wins. It is re-armed after every
    /// processed utterance; a deadline that elapses during a slow dispatch
    /// still forces the reversion before the next utterance is interpreted.
    pub fn run(mut self, utterances: Receiver<Utterance>) {
        info!(
            "Session loop starting with idle timeout of {}s",
            self.idle_timeout.as_secs()
        );
        let mut idle = after(self.idle_timeout);

        loop {
            // An elapsed deadline takes priority over buffered utterances.
            if idle.try_recv().is_ok() {
                self.handle_idle();
                idle = never();
                continue;
            }

            select! {
                recv(utterances) -> utterance => {
                    match utterance {
                        Ok(u) => {
                            self.handle_utterance(u);
                            // A deadline that elapsed while handling must
                            // not be discarded by the re-arm below.
                            if idle.try_recv().is_ok() {
                                self.handle_idle();
                            }
                            idle = after(self.idle_timeout);
                        }
                        Err(_) => {
                            info!("Utterance channel disconnected, session loop exiting");
                            break;
                        }
                    }
                }
                recv(idle) -> _ => {
                    self.handle_idle();
                    idle = never();
                }
            }
        }
    }

    fn handle_utterance(&mut self, utterance: Utterance) {
        debug!("Recognized text: {}", utterance.text);
        let text = utterance.text.as_str();

        match self.state {
            SessionState::Inactive => {
                if matches_any(text, &self.activation_phrases) {
                    info!("Activated, listening for commands");
                    self.state = SessionState::Active;
                }
            }
            SessionState::Active => {
                if matches_any(text, &self.deactivation_phrases) {
                    info!("Deactivating");
                    self.state = SessionState::Inactive;
                    return;
                }
                if self.dispatcher.dispatch(text) {
                    return;
                }
                if matches_any(text, &self.question_phrases) {
                    info!("Listening for a question");
                    self.state = SessionState::AwaitingQuestion;
                    self.speak("Please, ask your question.");
                    return;
                }
                debug!("Unknown command: {}", text);
                self.speak(&format!("Unknown command: {}", text));
            }
            SessionState::AwaitingQuestion => {
                self.state = SessionState::Active;
                self.ask(text);
            }
        }
    }

    fn handle_idle(&mut self) {
        if self.state.is_active() {
            info!("Idle timeout reached, deactivating");
        }
        self.state = SessionState::Inactive;
    }

    fn ask(&mut self, question: &str) {
        info!("Forwarding question to the answer backend");
        match self.answers.answer(question) {
            Ok(reply) => self.speak(&reply),
            Err(e) => {
                warn!("Question answering failed: {}", e);
                self.speak(&e.spoken_message());
            }
        }
    }

    fn speak(&self, message: &str) {
        if let Err(e) = self.sink.speak(message) {
            warn!("Failed to speak response: {}", e);
        }
    }
}

fn matches_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase.as_str()))
}
