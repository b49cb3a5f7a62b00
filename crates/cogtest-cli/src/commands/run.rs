//! The `cogtest run` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cogtest_core::config::load_config_from;
use cogtest_core::model::{Answer, Color, Phase, Question, QuestionKind, TestType};
use cogtest_core::report::TestResultRecord;
use cogtest_core::statistics::Metrics;
use cogtest_core::traits::ResultSink;
use cogtest_core::Session;

/// Writes each record as `result-<timestamp>-<id>.json` into a directory.
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ResultSink for JsonDirSink {
    fn name(&self) -> &str {
        "json-dir"
    }

    async fn store(&self, record: &TestResultRecord) -> Result<String> {
        let path = self.dir.join(record.file_name());
        record.save_json(&path)?;
        Ok(path.display().to_string())
    }
}

pub async fn execute(
    test_type: TestType,
    user: Option<String>,
    output: Option<PathBuf>,
    seed: Option<u64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let counts = config.counts_for(test_type);
    let user = user.unwrap_or_else(|| config.default_user.clone());
    let output = output.unwrap_or_else(|| config.output_dir.clone());

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let mut session = Session::create_with(test_type, counts, &mut rng);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    drive_session(&mut session, &mut console)?;

    let metrics = session.metrics();
    console.line(&format!("\n{}", summary_table(test_type, &metrics)))?;

    let record = session.finalize(user)?;
    let sink = JsonDirSink::new(&output);
    let location = sink.store(&record).await?;
    eprintln!("Result saved to: {location}");

    Ok(())
}

/// Line-oriented terminal I/O.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn line(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "{text}")?;
        Ok(())
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{text} ")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read from stdin")?;
        anyhow::ensure!(read > 0, "input closed before the test finished");
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn wait_for_enter(&mut self, text: &str) -> Result<()> {
        self.prompt(text).map(drop)
    }
}

/// Take a session from instructions to finished, reading answers from the console.
pub fn drive_session<R: BufRead, W: Write>(
    session: &mut Session,
    console: &mut Console<R, W>,
) -> Result<()> {
    console.line(instructions(session.test_type()))?;
    console.wait_for_enter("Press Enter to start the practice round.")?;
    session.start();
    session.advance_phase();

    run_phase(session, console)?;
    if !session.practice_responses().is_empty() {
        let practice = session.practice_metrics();
        console.line(&format!(
            "\nPractice complete: {}/{} correct ({:.0}%).",
            practice.score,
            session.practice_responses().len(),
            practice.accuracy
        ))?;
    }

    console.wait_for_enter("Press Enter to start the test.")?;
    session.advance_phase();
    run_phase(session, console)?;

    session.advance_phase();
    Ok(())
}

fn run_phase<R: BufRead, W: Write>(session: &mut Session, console: &mut Console<R, W>) -> Result<()> {
    let phase = session.phase();
    while !session.is_phase_complete() {
        let progress = session.progress();
        let question = session.current_question()?.clone();
        console.line(&format!(
            "\n[{} {}/{}]",
            phase,
            progress.answered + 1,
            progress.total
        ))?;

        if question.kind.encode_seconds().is_some() {
            present_stimulus(&question, console)?;
            console.wait_for_enter("Press Enter when you are ready to answer.")?;
            session.begin_recall()?;
            console.line(CLEAR_SCREEN)?;
        }

        let raw = console.prompt(&answer_prompt(&question))?;
        let item = session.record_response(to_answer(&question.kind, raw))?;

        if phase == Phase::Practice {
            let feedback = if item.correct {
                "Correct!".to_string()
            } else {
                format!("Not quite. Expected: {}", question.kind.expected_answer())
            };
            console.line(&feedback)?;
        }
    }
    Ok(())
}

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

fn instructions(test_type: TestType) -> &'static str {
    match test_type {
        TestType::Memory => {
            "MEMORY TEST\n\
             Each question shows something to memorize: words, digits, a grid or word-number pairs.\n\
             Study it, press Enter to hide it, then type what you remember."
        }
        TestType::Attention => {
            "ATTENTION TEST\n\
             Each question shows a string of letters.\n\
             Say whether the target letter appears, or count how many times it appears."
        }
        TestType::Stroop => {
            "STROOP TEST\n\
             Each question shows a color word printed in a colored ink.\n\
             Name the INK color, not the word, as quickly as you can."
        }
    }
}

fn present_stimulus<R: BufRead, W: Write>(question: &Question, console: &mut Console<R, W>) -> Result<()> {
    match &question.kind {
        QuestionKind::WordListRecall {
            words,
            encode_seconds,
        } => console.line(&format!(
            "Memorize these words ({encode_seconds}s):\n  {}",
            words.join("  ")
        )),
        QuestionKind::NumberSequence {
            digits,
            encode_seconds,
        } => console.line(&format!("Memorize this number ({encode_seconds}s):\n  {digits}")),
        QuestionKind::Pattern3x3 {
            positions,
            encode_seconds,
        } => console.line(&format!(
            "Memorize the highlighted cells ({encode_seconds}s):\n{}",
            render_grid(positions)
        )),
        QuestionKind::PairedAssociate {
            pairs,
            encode_seconds,
            ..
        } => {
            let lines: Vec<String> = pairs
                .iter()
                .map(|p| format!("  {} = {}", p.word, p.number))
                .collect();
            console.line(&format!(
                "Memorize these pairs ({encode_seconds}s):\n{}",
                lines.join("\n")
            ))
        }
        _ => Ok(()),
    }
}

fn answer_prompt(question: &Question) -> String {
    match &question.kind {
        QuestionKind::WordListRecall { .. } => "Type the words you remember:".to_string(),
        QuestionKind::NumberSequence { .. } => "Type the number:".to_string(),
        QuestionKind::Pattern3x3 { .. } => {
            format!("Which cells were highlighted?\n{}\nCells:", render_grid_key())
        }
        QuestionKind::PairedAssociate { cue, .. } => format!("Which number went with '{cue}'?"),
        QuestionKind::TargetPresent {
            sequence, target, ..
        } => format!("{sequence}\nIs '{target}' present? (present/absent)"),
        QuestionKind::TargetCount {
            sequence, target, ..
        } => format!("{sequence}\nHow many times does '{target}' appear?"),
        QuestionKind::Stroop { word, ink, .. } => {
            let options: Vec<&str> = Color::ALL.iter().map(|c| c.name()).collect();
            format!(
                "{}\nInk color? ({})",
                paint(word.word(), *ink),
                options.join("/")
            )
        }
    }
}

fn to_answer(kind: &QuestionKind, raw: String) -> Answer {
    match kind {
        QuestionKind::TargetPresent { .. } | QuestionKind::Stroop { .. } => {
            Answer::choice(raw.trim())
        }
        _ => Answer::text(raw),
    }
}

fn render_grid(positions: &[u8]) -> String {
    (0..3u8)
        .map(|row| {
            let cells: Vec<&str> = (1..=3u8)
                .map(|col| {
                    if positions.contains(&(row * 3 + col)) {
                        "#"
                    } else {
                        "."
                    }
                })
                .collect();
            format!("  {}", cells.join(" "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_grid_key() -> String {
    (0..3u8)
        .map(|row| format!("  {} {} {}", row * 3 + 1, row * 3 + 2, row * 3 + 3))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap `text` in a 24-bit ANSI foreground color.
fn paint(text: &str, ink: Color) -> String {
    let hex = ink.hex().trim_start_matches('#');
    let channel = |i: usize| hex.get(i..i + 2).and_then(|h| u8::from_str_radix(h, 16).ok());
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => format!("\x1b[1;38;2;{r};{g};{b}m{text}\x1b[0m"),
        _ => text.to_string(),
    }
}

pub fn summary_table(test_type: TestType, metrics: &Metrics) -> comfy_table::Table {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Test", "Score", "Accuracy", "Avg RT"]);
    let mut row = vec![
        Cell::new(test_type),
        Cell::new(metrics.score),
        Cell::new(format!("{:.2}%", metrics.accuracy)),
        Cell::new(format!("{:.3}s", metrics.avg_response_time)),
    ];
    if let Some(stroop) = metrics.stroop {
        table.set_header(vec![
            "Test",
            "Score",
            "Accuracy",
            "Avg RT",
            "Stroop effect",
            "Error rate",
        ]);
        row.push(Cell::new(format!("{:+.3}s", stroop.stroop_effect)));
        row.push(Cell::new(format!("{:.2}%", stroop.error_rate)));
    }
    table.add_row(row);
    table
}
