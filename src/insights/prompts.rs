//! Prompt templates
//!
//! The summary reply is parsed by its section labels and the quiz reply by
//! its JSON shape, so both prompts spell those out exactly.

use crate::settings::QuizSchema;

pub const SUMMARY_LABEL: &str = "Summary:";
pub const KEY_POINTS_LABEL: &str = "Key Points:";
pub const STUDY_QUESTIONS_LABEL: &str = "Study Questions:";

pub const KEY_POINT_COUNT: usize = 5;
pub const STUDY_QUESTION_COUNT: usize = 3;

/// Summary + key points + study questions
pub fn summary_prompt(text: &str) -> String {
    format!(
        r#"Based on the following text, please provide:
1. A concise summary of 5-7 lines.
2. A list of the {key_points} most important key points.
3. A list of {questions} study questions that can be answered from the text.

Text:
---
{text}
---

Format the reply with exactly these three section labels, each on its own line and in this order:
{summary_label}
<the summary>
{key_points_label}
<one key point per line>
{questions_label}
<one study question per line>

Do not add any other headings or text outside these sections."#,
        key_points = KEY_POINT_COUNT,
        questions = STUDY_QUESTION_COUNT,
        text = text,
        summary_label = SUMMARY_LABEL,
        key_points_label = KEY_POINTS_LABEL,
        questions_label = STUDY_QUESTIONS_LABEL,
    )
}

/// Quiz as a single JSON object
pub fn quiz_prompt(text: &str, schema: &QuizSchema) -> String {
    format!(
        r#"Based on the full text provided below, generate a quiz. The quiz should consist of:
1. {mcq} multiple-choice questions (MCQs), each with four options (A, B, C, D) and a clear indication of the correct answer.
2. {short} short-answer questions that require a brief explanation.

The entire output must be in a single, clean JSON object. Do not include any text or formatting outside of the JSON.

The JSON structure should be:
{{
  "multiple_choice_questions": [
    {{
      "question": "...",
      "options": {{
        "A": "...",
        "B": "...",
        "C": "...",
        "D": "..."
      }},
      "correct_answer": "A"
    }}
  ],
  "short_answer_questions": [
    {{
      "question": "..."
    }}
  ]
}}

"correct_answer" must be exactly one of the option labels "A", "B", "C" or "D".

Text:
---
{text}
---"#,
        mcq = schema.multiple_choice_count,
        short = schema.short_answer_count,
        text = text,
    )
}
