mod bank;
mod config;
mod quiz;

use std::sync::Arc;

use bank::{
    error::BankError,
    export::{decode_upload, export_file_name, parse_import},
    run_blocking,
    store::JsonFileStore,
    ImportMode, QuestionBank,
};
use config::Config;
use dotenv::dotenv;
use quiz::{
    candidate::parse_candidates,
    study::{
        check_answer, correct_indices, effective_options, parse_selection, render_question,
        reveal_answer, StudySession, TypeFilter, Verdict,
    },
    Question, QuestionType,
};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, SqliteStorage, Storage},
    net::Download,
    prelude::*,
    types::{InputFile, KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type DialogueStorage = std::sync::Arc<ErasedStorage<State>>;
type BankHandle = Arc<QuestionBank<JsonFileStore>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    MainMenu,
    ReceiveCandidates,
    ReceiveImport,
    ChooseImportMode {
        questions: Vec<Question>,
    },
    ConfirmClear,
    ChooseStudyFilter,
    ChooseStudyOrder {
        filter: TypeFilter,
    },
    Studying {
        session: StudySession,
    },
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting question bank bot...");

    let config = Config::from_env();
    let bot = Bot::from_env();

    log::info!("Opening dialogue storage at {}", config.dialogue_db);
    let storage: DialogueStorage = SqliteStorage::open(&config.dialogue_db, Json)
        .await
        .expect("Failed to open the dialogue database")
        .erase();

    let bank: BankHandle = Arc::new(QuestionBank::new(JsonFileStore::new(&config.bank_path)));
    match bank.stats() {
        Ok(stats) => log::info!(
            "Loaded question bank from {} ({} questions)",
            config.bank_path.display(),
            stats.total
        ),
        Err(e) => log::warn!("Question bank at {} is unreadable: {}", config.bank_path.display(), e),
    }

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::MainMenu].endpoint(main_menu))
            .branch(dptree::case![State::ReceiveCandidates].endpoint(receive_candidates))
            .branch(dptree::case![State::ReceiveImport].endpoint(receive_import))
            .branch(dptree::case![State::ChooseImportMode { questions }].endpoint(choose_import_mode))
            .branch(dptree::case![State::ConfirmClear].endpoint(confirm_clear))
            .branch(dptree::case![State::ChooseStudyFilter].endpoint(choose_study_filter))
            .branch(dptree::case![State::ChooseStudyOrder { filter }].endpoint(choose_study_order))
            .branch(dptree::case![State::Studying { session }].endpoint(study)),
    )
    .dependencies(dptree::deps![storage, bank, Arc::new(config)])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

const COLLECT: &str = "Collect questions";
const STUDY: &str = "Study";
const STATS: &str = "Statistics";
const EXPORT: &str = "Export JSON";
const IMPORT: &str = "Import JSON";
const CLEAR: &str = "Clear bank";
const SHUFFLE_BANK: &str = "Shuffle stored options";

const CANCEL: &str = "Cancel";
const MERGE: &str = "Merge";
const REPLACE: &str = "Replace";
const CONFIRM_CLEAR: &str = "Yes, clear the bank";
const ALL_TYPES: &str = "All";
const SHUFFLE: &str = "Shuffle options";
const KEEP_ORDER: &str = "Keep order";
const NEXT: &str = "Next";
const SHOW_ANSWER: &str = "Show answer";
const STOP: &str = "Stop";

const DEFAULT_SOURCE: &str = "telegram";

fn keyboard(rows: &[&[&str]]) -> KeyboardMarkup {
    KeyboardMarkup::new(
        rows.iter()
            .map(|row| row.iter().map(|t| KeyboardButton::new(*t)).collect::<Vec<_>>()),
    )
}

fn main_menu_keyboard() -> KeyboardMarkup {
    keyboard(&[&[COLLECT, STUDY], &[STATS, SHUFFLE_BANK], &[EXPORT, IMPORT], &[CLEAR]])
}

async fn show_menu(bot: &Bot, dialogue: &QuizDialogue, chat_id: ChatId, text: &str) -> HandlerResult {
    bot.send_message(chat_id, text)
        .reply_markup(main_menu_keyboard())
        .await?;
    dialogue.update(State::MainMenu).await?;
    Ok(())
}

/// Replies with precondition failures, propagates everything else.
async fn report_bank_error(bot: &Bot, chat_id: ChatId, err: BankError) -> HandlerResult {
    if !err.is_user_facing() {
        return Err(err.into());
    }
    log::debug!("Rejected request in chat {}: {}", chat_id.0, err);
    bot.send_message(chat_id, err.to_string()).await?;
    Ok(())
}

/// Raw JSON bytes sent either as a document or as plain text, plus a
/// provenance tag.
async fn read_payload(
    bot: &Bot,
    msg: &Message,
) -> Result<Option<(Vec<u8>, String)>, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(document) = msg.document() {
        let file = bot.get_file(&document.file.id).await?;
        let mut data: Vec<u8> = Vec::new();
        bot.download_file(&file.path, &mut data).await?;
        let source = document
            .file_name
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());
        return Ok(Some((data, source)));
    }
    Ok(msg
        .text()
        .map(|text| (text.as_bytes().to_vec(), DEFAULT_SOURCE.to_string())))
}

const GREETING_TEXT: &str = "Hi! I keep a bank of quiz questions. Send me what you extracted from your course pages and I will deduplicate it, then quiz you on it with shuffled options.";
async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    show_menu(&bot, &dialogue, msg.chat.id, GREETING_TEXT).await
}

async fn main_menu(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    bank: BankHandle,
    config: Arc<Config>,
) -> HandlerResult {
    match msg.text() {
        Some(COLLECT) => {
            bot.send_message(
                msg.chat.id,
                "Send a JSON file (or paste JSON) with the extracted questions.",
            )
            .reply_markup(keyboard(&[&[CANCEL]]))
            .await?;
            dialogue.update(State::ReceiveCandidates).await?;
        }
        Some(STUDY) => {
            if run_blocking(&bank, |b| b.stats()).await?.total == 0 {
                return report_bank_error(&bot, msg.chat.id, BankError::EmptyBank).await;
            }
            let mut rows: Vec<Vec<KeyboardButton>> = vec![vec![KeyboardButton::new(ALL_TYPES)]];
            rows.extend(
                QuestionType::ALL
                    .iter()
                    .map(|kind| vec![KeyboardButton::new(kind.label())]),
            );
            rows.push(vec![KeyboardButton::new(CANCEL)]);
            bot.send_message(msg.chat.id, "Which questions do you want to practise?")
                .reply_markup(KeyboardMarkup::new(rows))
                .await?;
            dialogue.update(State::ChooseStudyFilter).await?;
        }
        Some(STATS) => {
            let stats = run_blocking(&bank, |b| b.stats()).await?;
            let text = format!(
                "Question bank\nTotal: {}\nSingle choice: {}\nMultiple choice: {}\nTrue or false: {}\nProgramming: {}",
                stats.total, stats.single, stats.multiple, stats.judge, stats.programming
            );
            bot.send_message(msg.chat.id, text).await?;
        }
        Some(EXPORT) => {
            let version = config.export_version.clone();
            match run_blocking(&bank, move |b| b.export_json(&version)).await {
                Ok(json) => {
                    let name = export_file_name(chrono::Local::now().date_naive());
                    bot.send_document(msg.chat.id, InputFile::memory(json.into_bytes()).file_name(name))
                        .await?;
                }
                Err(e) => return report_bank_error(&bot, msg.chat.id, e).await,
            }
        }
        Some(SHUFFLE_BANK) => {
            let shuffled = run_blocking(&bank, |b| b.shuffle_all(&mut rand::thread_rng())).await;
            match shuffled {
                Ok(count) => {
                    bot.send_message(
                        msg.chat.id,
                        format!("Reordered the options of {} questions", count),
                    )
                    .await?;
                }
                Err(e) => return report_bank_error(&bot, msg.chat.id, e).await,
            }
        }
        Some(IMPORT) => {
            bot.send_message(msg.chat.id, "Send the exported JSON file.")
                .reply_markup(keyboard(&[&[CANCEL]]))
                .await?;
            dialogue.update(State::ReceiveImport).await?;
        }
        Some(CLEAR) => {
            bot.send_message(
                msg.chat.id,
                "This deletes every question in the bank and cannot be undone. Are you sure?",
            )
            .reply_markup(keyboard(&[&[CONFIRM_CLEAR], &[CANCEL]]))
            .await?;
            dialogue.update(State::ConfirmClear).await?;
        }
        _ => {
            show_menu(&bot, &dialogue, msg.chat.id, "Please pick one of the options").await?;
        }
    }
    Ok(())
}

async fn receive_candidates(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    bank: BankHandle,
) -> HandlerResult {
    if msg.text() == Some(CANCEL) {
        return show_menu(&bot, &dialogue, msg.chat.id, "Nothing was collected").await;
    }
    let Some((data, source)) = read_payload(&bot, &msg).await? else {
        bot.send_message(msg.chat.id, "Please send the questions as JSON")
            .await?;
        return Ok(());
    };
    let json = match decode_upload(data) {
        Ok(json) => json,
        Err(e) => return report_bank_error(&bot, msg.chat.id, e).await,
    };

    let candidates = match parse_candidates(&json, &source) {
        Ok(candidates) => candidates,
        Err(e) => return report_bank_error(&bot, msg.chat.id, e).await,
    };
    if candidates.is_empty() {
        log::warn!("No usable questions in payload from {}", source);
        return show_menu(&bot, &dialogue, msg.chat.id, "No questions found in that data").await;
    }

    let report = run_blocking(&bank, move |b| b.collect(candidates)).await?;
    let text = format!(
        "Collected {} questions\nNew: {}\nBank total: {}",
        report.collected, report.added, report.total
    );
    show_menu(&bot, &dialogue, msg.chat.id, &text).await
}

async fn receive_import(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    if msg.text() == Some(CANCEL) {
        return show_menu(&bot, &dialogue, msg.chat.id, "Nothing was imported").await;
    }
    let Some((data, _)) = read_payload(&bot, &msg).await? else {
        bot.send_message(msg.chat.id, "Please send the exported JSON file")
            .await?;
        return Ok(());
    };

    let questions = match decode_upload(data).and_then(|json| parse_import(&json)) {
        Ok(questions) => questions,
        Err(e) => return report_bank_error(&bot, msg.chat.id, e).await,
    };

    bot.send_message(
        msg.chat.id,
        format!(
            "The file holds {} questions. Merge them into the bank or replace the bank with them?",
            questions.len()
        ),
    )
    .reply_markup(keyboard(&[&[MERGE, REPLACE], &[CANCEL]]))
    .await?;
    dialogue
        .update(State::ChooseImportMode { questions })
        .await?;
    Ok(())
}

async fn choose_import_mode(
    bot: Bot,
    dialogue: QuizDialogue,
    questions: Vec<Question>,
    msg: Message,
    bank: BankHandle,
) -> HandlerResult {
    let mode = match msg.text() {
        Some(MERGE) => ImportMode::Merge,
        Some(REPLACE) => ImportMode::Replace,
        Some(CANCEL) => {
            return show_menu(&bot, &dialogue, msg.chat.id, "Nothing was imported").await;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please choose Merge or Replace")
                .await?;
            return Ok(());
        }
    };

    let imported = questions.len();
    let total = run_blocking(&bank, move |b| b.import(questions, mode)).await?;
    let text = match mode {
        ImportMode::Merge => format!("Merge finished, the bank holds {} questions", total),
        ImportMode::Replace => format!("Replaced the bank with {} imported questions", imported),
    };
    show_menu(&bot, &dialogue, msg.chat.id, &text).await
}

async fn confirm_clear(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    bank: BankHandle,
) -> HandlerResult {
    if msg.text() == Some(CONFIRM_CLEAR) {
        run_blocking(&bank, |b| b.clear()).await?;
        return show_menu(&bot, &dialogue, msg.chat.id, "The question bank is now empty").await;
    }
    show_menu(&bot, &dialogue, msg.chat.id, "Nothing was deleted").await
}

async fn choose_study_filter(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    let filter = match msg.text() {
        Some(CANCEL) => return show_menu(&bot, &dialogue, msg.chat.id, "Maybe later!").await,
        Some(ALL_TYPES) => TypeFilter::All,
        Some(text) => match QuestionType::ALL.iter().find(|kind| kind.label() == text) {
            Some(kind) => TypeFilter::Only(*kind),
            None => {
                bot.send_message(msg.chat.id, "Please pick one of the options")
                    .await?;
                return Ok(());
            }
        },
        None => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .await?;
            return Ok(());
        }
    };

    bot.send_message(msg.chat.id, "Shuffle the options of every question?")
        .reply_markup(keyboard(&[&[SHUFFLE, KEEP_ORDER]]))
        .await?;
    dialogue.update(State::ChooseStudyOrder { filter }).await?;
    Ok(())
}

async fn choose_study_order(
    bot: Bot,
    dialogue: QuizDialogue,
    filter: TypeFilter,
    msg: Message,
    bank: BankHandle,
) -> HandlerResult {
    let shuffle = match msg.text() {
        Some(SHUFFLE) => true,
        Some(KEEP_ORDER) => false,
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .await?;
            return Ok(());
        }
    };

    let questions = run_blocking(&bank, |b| b.questions()).await?;
    let session = {
        let mut rng = rand::thread_rng();
        StudySession::new(&questions, filter, shuffle, &mut rng)
    };
    let session = match session {
        Ok(session) => session,
        Err(e) => {
            report_bank_error(&bot, msg.chat.id, e).await?;
            return show_menu(&bot, &dialogue, msg.chat.id, "Pick something else to do").await;
        }
    };
    log::info!(
        "Chat {} started studying {} questions (shuffled: {})",
        msg.chat.id.0,
        session.questions.len(),
        shuffle
    );

    send_current_question(&bot, msg.chat.id, &session).await?;
    dialogue.update(State::Studying { session }).await?;
    Ok(())
}

async fn send_current_question(bot: &Bot, chat_id: ChatId, session: &StudySession) -> HandlerResult {
    let Some(question) = session.current() else {
        return Ok(());
    };
    let mut text = render_question(question, session.position + 1);

    let markup = if correct_indices(question).is_empty() {
        if question.kind != QuestionType::Programming {
            text.push_str("\n\n(No answer recorded for this question)");
        }
        keyboard(&[&[NEXT], &[SHOW_ANSWER, STOP]])
    } else if question.kind == QuestionType::Multiple {
        text.push_str("\n\nReply with every correct letter, e.g. AC");
        keyboard(&[&[SHOW_ANSWER, STOP]])
    } else {
        let mut rows: Vec<Vec<KeyboardButton>> = effective_options(question)
            .iter()
            .map(|option| vec![KeyboardButton::new(option.clone())])
            .collect();
        rows.push(vec![KeyboardButton::new(SHOW_ANSWER), KeyboardButton::new(STOP)]);
        KeyboardMarkup::new(rows)
    };

    bot.send_message(chat_id, text).reply_markup(markup).await?;
    Ok(())
}

async fn finish_session(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    session: &StudySession,
) -> HandlerResult {
    let summary = format!(
        "Session over! You answered {} of {} checked questions correctly.\nWhat would you like to do next?",
        session.score, session.scored
    );
    show_menu(bot, dialogue, chat_id, &summary).await
}

async fn study(
    bot: Bot,
    dialogue: QuizDialogue,
    session: StudySession,
    msg: Message,
) -> HandlerResult {
    let mut session = session;
    let Some(question) = session.current().cloned() else {
        return finish_session(&bot, &dialogue, msg.chat.id, &session).await;
    };
    let reply = msg.text().unwrap_or_default();
    if reply == STOP {
        return finish_session(&bot, &dialogue, msg.chat.id, &session).await;
    }

    if reply == SHOW_ANSWER {
        if let Some(answer) = session.reveal() {
            bot.send_message(msg.chat.id, format!("Answer:\n{}", answer))
                .await?;
        }
    } else if correct_indices(&question).is_empty() {
        if !question.answer.is_empty() {
            bot.send_message(msg.chat.id, format!("Recorded answer: {}", question.answer))
                .await?;
        }
        session.record(Verdict::Undecidable);
    } else {
        let Some(selected) = parse_selection(&question, reply) else {
            bot.send_message(msg.chat.id, "Please pick one of the options")
                .await?;
            return Ok(());
        };
        let verdict = check_answer(&question, &selected);
        let text = match verdict {
            Verdict::Correct => "Correct!".to_string(),
            _ => format!("Wrong! The correct answer is:\n{}", reveal_answer(&question)),
        };
        bot.send_message(msg.chat.id, text).await?;
        session.record(verdict);
    }

    if session.is_finished() {
        return finish_session(&bot, &dialogue, msg.chat.id, &session).await;
    }
    send_current_question(&bot, msg.chat.id, &session).await?;
    dialogue.update(State::Studying { session }).await?;
    Ok(())
}
