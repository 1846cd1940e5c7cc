//! Interactive quiz on the terminal
//!
//! Multiple-choice answers get immediate feedback. Short answers are
//! collected but not graded.

use super::render::{render_check, render_mcq};
use std::io::{self, BufRead, Write};
use studydeck_lib::insights::{AnswerCheck, Quiz};

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct QuizScore {
    pub correct: usize,
    pub answered: usize,
    pub total: usize,
    pub short_answers: Vec<String>,
}

/// Ask every question; stops early on end of input
pub(crate) fn run_quiz<R: BufRead, W: Write>(quiz: &Quiz, input: &mut R, out: &mut W) -> io::Result<QuizScore> {
    let mut score = QuizScore {
        total: quiz.multiple_choice_questions.len(),
        ..QuizScore::default()
    };

    for (i, mcq) in quiz.multiple_choice_questions.iter().enumerate() {
        writeln!(out)?;
        write!(out, "{}", render_mcq(i + 1, mcq))?;

        let label = loop {
            write!(out, "Your answer ({}): ", labels_hint(mcq.options.keys()))?;
            out.flush()?;

            let Some(line) = read_line(input)? else {
                write_recap(quiz, &score, out)?;
                return Ok(score);
            };
            match mcq.find_label(&line) {
                Some(label) => break label.to_string(),
                None => writeln!(out, "Please choose one of the listed options.")?,
            }
        };

        let check = mcq.check_answer(&label);
        score.answered += 1;
        if matches!(check, AnswerCheck::Correct { .. }) {
            score.correct += 1;
        }
        writeln!(out, "{}", render_check(&check))?;
    }

    for (i, saq) in quiz.short_answer_questions.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "{}. {}", i + 1, saq.question)?;
        write!(out, "Your answer: ")?;
        out.flush()?;

        let Some(line) = read_line(input)? else {
            break;
        };
        score.short_answers.push(line);
        writeln!(out, "Answer recorded (short answers are not graded).")?;
    }

    write_recap(quiz, &score, out)?;
    Ok(score)
}

fn write_recap<W: Write>(quiz: &Quiz, score: &QuizScore, out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "== Recap ==")?;
    write!(out, "Score: {}/{} multiple-choice correct", score.correct, score.total)?;
    if score.answered < score.total {
        write!(out, " ({} answered)", score.answered)?;
    }
    writeln!(out)?;

    if !score.short_answers.is_empty() {
        writeln!(out, "Your short answers:")?;
        for (saq, answer) in quiz.short_answer_questions.iter().zip(&score.short_answers) {
            let answer = if answer.is_empty() { "(no answer)" } else { answer.as_str() };
            writeln!(out, "- {}\n  {}", saq.question, answer)?;
        }
    }
    Ok(())
}

fn labels_hint<'a>(labels: impl Iterator<Item = &'a String>) -> String {
    labels.map(String::as_str).collect::<Vec<_>>().join("/")
}

/// Next trimmed line, `None` at end of input
fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
