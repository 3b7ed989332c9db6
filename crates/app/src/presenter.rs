use std::fmt::Write as _;

use langai_llm::{GatewayError, LanguageCode, SUPPORTED_LANGUAGES};
use langai_storage::{MessageIndex, MessageRecord, StoreError};
use snafu::{ResultExt, Snafu, ensure};

use crate::events::{Indicators, Snapshot};
use crate::workflow::SummarizePolicy;

pub const COMMAND_PREFIX: char = ':';

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Target {
        index: MessageIndex,
        language: LanguageCode,
    },
    /// Target for messages submitted from now on, saved to the settings file.
    Default(LanguageCode),
    Translate(MessageIndex),
    Summarize(MessageIndex),
    List,
    Help,
    Quit,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CommandError {
    #[snafu(display("unknown command ':{name}', try :help"))]
    UnknownCommand { stage: &'static str, name: String },
    #[snafu(display(":{command} expects {expected}"))]
    MissingArgument {
        stage: &'static str,
        command: &'static str,
        expected: &'static str,
    },
    #[snafu(display("{source}"))]
    InvalidIndex {
        stage: &'static str,
        source: StoreError,
    },
    #[snafu(display("{source}"))]
    InvalidLanguage {
        stage: &'static str,
        source: GatewayError,
    },
    #[snafu(display("language '{language}' is not offered, choose one of {}", supported_codes()))]
    UnsupportedLanguage {
        stage: &'static str,
        language: LanguageCode,
    },
    #[snafu(display(
        "message {index} has no summary on offer, it needs more than {min_length} characters of '{language}' text"
    ))]
    SummaryNotOffered {
        stage: &'static str,
        index: MessageIndex,
        min_length: usize,
        language: LanguageCode,
    },
}

impl Command {
    /// Lines starting with `:` are commands; anything else is submitted as is.
    /// A leading `::` submits the rest of the line with one `:` kept.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(command) = line.trim_start().strip_prefix(COMMAND_PREFIX) else {
            return Ok(Self::Submit(line.to_string()));
        };
        if command.starts_with(COMMAND_PREFIX) {
            return Ok(Self::Submit(command.to_string()));
        }

        let mut parts = command.split_whitespace();
        let name = parts.next().unwrap_or_default();
        match name {
            "target" => {
                let index = parse_index(parts.next(), "target", "<index> <language>")?;
                let raw = parts.next().ok_or_else(|| {
                    MissingArgumentSnafu {
                        stage: "parse-target-command",
                        command: "target",
                        expected: "<index> <language>",
                    }
                    .build()
                })?;
                let language = parse_language(raw)?;
                Ok(Self::Target { index, language })
            }
            "default" => {
                let raw = parts.next().ok_or_else(|| {
                    MissingArgumentSnafu {
                        stage: "parse-default-command",
                        command: "default",
                        expected: "<language>",
                    }
                    .build()
                })?;
                Ok(Self::Default(parse_language(raw)?))
            }
            "translate" => Ok(Self::Translate(parse_index(
                parts.next(),
                "translate",
                "<index>",
            )?)),
            "summarize" => Ok(Self::Summarize(parse_index(
                parts.next(),
                "summarize",
                "<index>",
            )?)),
            "list" => Ok(Self::List),
            "help" => Ok(Self::Help),
            "quit" | "q" => Ok(Self::Quit),
            _ => UnknownCommandSnafu {
                stage: "parse-command",
                name,
            }
            .fail(),
        }
    }
}

fn parse_index(
    raw: Option<&str>,
    command: &'static str,
    expected: &'static str,
) -> Result<MessageIndex, CommandError> {
    let raw = raw.ok_or_else(|| {
        MissingArgumentSnafu {
            stage: "parse-command-index",
            command,
            expected,
        }
        .build()
    })?;
    MessageIndex::parse(raw).context(InvalidIndexSnafu {
        stage: "parse-command-index",
    })
}

fn parse_language(raw: &str) -> Result<LanguageCode, CommandError> {
    let language = LanguageCode::parse(raw).context(InvalidLanguageSnafu {
        stage: "parse-command-language",
    })?;
    ensure!(
        language.is_supported(),
        UnsupportedLanguageSnafu {
            stage: "check-command-language",
            language,
        }
    );
    Ok(language)
}

/// Summaries are only requested for records the policy offers one for.
pub fn ensure_summary_offered(
    record: &MessageRecord,
    policy: &SummarizePolicy,
) -> Result<(), CommandError> {
    ensure!(
        policy.offers(record),
        SummaryNotOfferedSnafu {
            stage: "check-summary-offer",
            index: record.index,
            min_length: policy.min_length,
            language: policy.language_filter.clone(),
        }
    );
    Ok(())
}

fn supported_codes() -> String {
    SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn help_text() -> String {
    let mut help = String::from(
        "Type any text to submit it; start it with :: to submit a line beginning with ':'.\n\
         :target <index> <language>  change the translation target\n\
         :default <language>         target for new messages, saved to settings\n\
         :translate <index>          translate a message\n\
         :summarize <index>          summarize a message when a summary is offered\n\
         :list                       show all messages\n\
         :quit                       exit\n\
         languages:",
    );
    for (code, name) in SUPPORTED_LANGUAGES {
        let _ = write!(help, " {code} ({name})");
    }
    help
}

/// Renders one record the way the list view shows it.
pub fn render_message(
    record: &MessageRecord,
    indicators: &Indicators,
    policy: &SummarizePolicy,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[{}] {}", record.index, record.text);

    let target = record
        .target_language
        .display_name()
        .map(|name| format!("{} ({name})", record.target_language))
        .unwrap_or_else(|| record.target_language.to_string());
    let _ = writeln!(
        out,
        "    language: {} | {}/{} characters | target: {target}",
        record.detected_language.label(),
        record.char_count(),
        policy.min_length,
    );

    if let Some(error) = &record.error {
        let _ = writeln!(out, "    error: {error}");
    }
    if let Some(summary) = &record.summary {
        let _ = writeln!(out, "    summary: {summary}");
    }
    if let Some(translation) = &record.translation {
        let _ = writeln!(out, "    translation: {translation}");
    }
    if indicators.translating == Some(record.index) {
        let _ = writeln!(out, "    translating...");
    }
    if indicators.summarizing == Some(record.index) {
        let _ = writeln!(out, "    summarizing...");
    }
    if policy.offers(record) {
        let _ = writeln!(out, "    summary available: :summarize {}", record.index);
    }
    out
}

/// Renders the records named by `indicators`, so in-flight work shows while it runs.
pub fn render_in_flight(
    messages: &[MessageRecord],
    indicators: &Indicators,
    policy: &SummarizePolicy,
) -> String {
    messages
        .iter()
        .filter(|record| {
            indicators.translating == Some(record.index)
                || indicators.summarizing == Some(record.index)
        })
        .map(|record| render_message(record, indicators, policy))
        .collect()
}

pub fn render_snapshot(snapshot: &Snapshot, policy: &SummarizePolicy) -> String {
    let mut out = String::new();
    if let Some(error) = &snapshot.global_error {
        let _ = writeln!(out, "! {error}");
    }
    if snapshot.messages.is_empty() {
        out.push_str("no messages yet\n");
    }
    for record in &snapshot.messages {
        out.push_str(&render_message(record, &snapshot.indicators, policy));
    }
    out
}
