// src/engine/service.rs

//! Request-scoped operations called by the HTTP handlers.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use sqlx::SqlitePool;

use super::{EngineError, UnitOfWork, aggregate, catalog, completion, progress, recorder};
use crate::models::{
    quiz::{AnswerOption, AvailableQuiz, PublicQuestion, Subject},
    student::StudentProfile,
    taken_quiz::{QuizResult, TakenQuiz, TakenQuizSummary},
};

/// The question a student should answer next.
#[derive(Debug, Serialize)]
pub struct QuestionOffer {
    pub quiz_id: i64,
    pub quiz_name: String,
    pub question: PublicQuestion,
    /// Percentage done once this question is answered.
    pub progress: u8,
    pub answered_questions: i64,
    pub total_questions: i64,
}

/// What happened to a submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// More questions remain.
    Advance {
        remaining: i64,
        next_progress: u8,
        /// The answer had already been stored by an earlier request.
        already_recorded: bool,
    },
    /// The quiz is finished; `result` is the authoritative record.
    Completed {
        result: TakenQuiz,
        already_recorded: bool,
    },
}

/// Offers the first unanswered question and fixes the scoring denominator.
///
/// Returns [`EngineError::AlreadyCompleted`] once the quiz has been taken.
pub async fn offer_next_question(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
) -> Result<QuestionOffer, EngineError> {
    catalog::get_student(pool, student_id).await?;
    let quiz = catalog::get_quiz(pool, quiz_id).await?;

    if completion::find_completion(pool, student_id, quiz_id)
        .await?
        .is_some()
    {
        return Err(EngineError::AlreadyCompleted { quiz_id });
    }

    let mut uow = UnitOfWork::begin(pool).await?;
    let total_questions = progress::capture_attempt(uow.conn(), student_id, quiz_id).await?;

    let question = match progress::next_question(uow.conn(), student_id, quiz_id).await? {
        Some(question) => question,
        None => {
            // Every question has a response but no record was written.
            tracing::warn!(
                student_id,
                quiz_id,
                "All questions answered without a taken quiz, completing now"
            );
            let completed = completion::try_complete(uow.conn(), student_id, quiz_id).await?;
            uow.commit().await?;
            return match completed {
                Some(_) => Err(EngineError::AlreadyCompleted { quiz_id }),
                None => Err(EngineError::InvalidState(format!(
                    "quiz {} has no unanswered questions and cannot be completed",
                    quiz_id
                ))),
            };
        }
    };

    let remaining = progress::unanswered_questions(uow.conn(), student_id, quiz_id)
        .await?
        .len() as i64;
    let answers = catalog::get_answers_for_question(uow.conn(), question.id).await?;
    uow.commit().await?;

    let progress = progress::progress_percent(total_questions, remaining)?;

    Ok(QuestionOffer {
        quiz_id: quiz.id,
        quiz_name: quiz.name,
        question: PublicQuestion {
            id: question.id,
            text: question.text,
            answers: answers.into_iter().map(AnswerOption::from).collect(),
        },
        progress,
        answered_questions: (total_questions - remaining).max(0),
        total_questions,
    })
}

/// Records one answer and completes the quiz when it was the last one.
///
/// The answer insert, the completion check, the taken-quiz insert and the
/// score refresh commit together or not at all. Duplicate submissions are
/// not errors: they resolve to the state already stored.
pub async fn submit_answer(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
    question_id: i64,
    answer_id: i64,
) -> Result<SubmitOutcome, EngineError> {
    catalog::get_student(pool, student_id).await?;
    catalog::get_quiz(pool, quiz_id).await?;
    catalog::get_question_in_quiz(pool, quiz_id, question_id).await?;
    let answer = catalog::get_answer(pool, answer_id).await?;
    if answer.question_id != question_id {
        return Err(EngineError::InvalidAnswer {
            question_id,
            answer_id,
        });
    }

    if let Some(result) = completion::find_completion(pool, student_id, quiz_id).await? {
        return Ok(SubmitOutcome::Completed {
            result,
            already_recorded: true,
        });
    }

    let mut uow = UnitOfWork::begin(pool).await?;
    // First statement writes, so the transaction holds the write lock from here on.
    let total_questions = progress::capture_attempt(uow.conn(), student_id, quiz_id).await?;

    match recorder::record_answer(uow.conn(), student_id, question_id, answer_id).await {
        Ok(_) => {}
        Err(e @ EngineError::DuplicateAnswer { .. }) => {
            uow.rollback().await?;
            tracing::info!("Normalizing duplicate submission: {}", e);
            return resolve_duplicate(pool, student_id, quiz_id).await;
        }
        Err(e) => return Err(e),
    }

    let outcome = match completion::try_complete(uow.conn(), student_id, quiz_id).await? {
        Some(result) => SubmitOutcome::Completed {
            result,
            already_recorded: false,
        },
        None => {
            let remaining = progress::unanswered_questions(uow.conn(), student_id, quiz_id)
                .await?
                .len() as i64;
            SubmitOutcome::Advance {
                remaining,
                next_progress: progress::progress_percent(total_questions, remaining)?,
                already_recorded: false,
            }
        }
    };

    uow.commit().await?;
    Ok(outcome)
}

/// Outcome for a submission whose answer was already stored.
async fn resolve_duplicate(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
) -> Result<SubmitOutcome, EngineError> {
    // The last response and the completion record commit together, so once
    // the unanswered set reads empty the completion is visible too.
    let remaining = progress::unanswered_questions(pool, student_id, quiz_id)
        .await?
        .len() as i64;

    if let Some(result) = completion::find_completion(pool, student_id, quiz_id).await? {
        return Ok(SubmitOutcome::Completed {
            result,
            already_recorded: true,
        });
    }
    let total_questions = match progress::captured_total(pool, student_id, quiz_id).await? {
        Some(total) => total,
        None => catalog::count_questions(pool, quiz_id).await?,
    };

    Ok(SubmitOutcome::Advance {
        remaining,
        next_progress: progress::progress_percent(total_questions, remaining)?,
        already_recorded: true,
    })
}

pub async fn quiz_result(
    pool: &SqlitePool,
    student_id: i64,
    quiz_id: i64,
) -> Result<QuizResult, EngineError> {
    let mut conn = pool.acquire().await?;
    completion::completion_result(&mut conn, student_id, quiz_id).await
}

/// Quizzes with at least one question that the student has not taken yet.
pub async fn available_quizzes(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<AvailableQuiz>, EngineError> {
    catalog::get_student(pool, student_id).await?;

    let mut quizzes = sqlx::query_as::<_, AvailableQuiz>(
        r#"
        SELECT
            q.id,
            q.name,
            q.subject_id,
            s.name AS subject_name,
            s.color AS subject_color,
            COUNT(qu.id) AS questions_count
        FROM quizzes q
        JOIN subjects s ON s.id = q.subject_id
        JOIN questions qu ON qu.quiz_id = q.id
        WHERE NOT EXISTS (
            SELECT 1 FROM taken_quizzes t WHERE t.quiz_id = q.id AND t.student_id = $1
        )
        GROUP BY q.id, q.name, q.subject_id, s.name, s.color
        HAVING COUNT(qu.id) > 0
        ORDER BY q.name, q.id
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    let courses: HashSet<i64> = catalog::student_courses(pool, student_id)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    for quiz in &mut quizzes {
        quiz.in_courses = courses.contains(&quiz.subject_id);
    }

    Ok(quizzes)
}

pub async fn taken_quizzes(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<Vec<TakenQuizSummary>, EngineError> {
    catalog::get_student(pool, student_id).await?;

    let taken = sqlx::query_as::<_, TakenQuizSummary>(
        r#"
        SELECT
            t.id,
            t.quiz_id,
            q.name AS quiz_name,
            s.name AS subject_name,
            t.score,
            t.percentage,
            t.date
        FROM taken_quizzes t
        JOIN quizzes q ON q.id = t.quiz_id
        JOIN subjects s ON s.id = q.subject_id
        WHERE t.student_id = $1
        ORDER BY q.name, t.id
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await?;

    Ok(taken)
}

pub async fn student_profile(
    pool: &SqlitePool,
    student_id: i64,
) -> Result<StudentProfile, EngineError> {
    let student = catalog::get_student(pool, student_id).await?;
    let top_subject = aggregate::top_subject(pool, student_id).await?;
    let courses = catalog::student_courses(pool, student_id).await?;

    Ok(StudentProfile {
        id: student.id,
        username: student.username,
        score: student.score,
        top_subject,
        courses,
    })
}

/// Replaces the student's enrolled subjects.
pub async fn update_courses(
    pool: &SqlitePool,
    student_id: i64,
    subject_ids: &[i64],
) -> Result<Vec<Subject>, EngineError> {
    catalog::get_student(pool, student_id).await?;

    let wanted: BTreeSet<i64> = subject_ids.iter().copied().collect();
    let known: HashSet<i64> = catalog::list_subjects(pool)
        .await?
        .into_iter()
        .map(|s| s.id)
        .collect();
    if let Some(missing) = wanted.iter().find(|id| !known.contains(id)) {
        return Err(EngineError::NotFound(format!("subject {}", missing)));
    }

    let mut uow = UnitOfWork::begin(pool).await?;
    sqlx::query("DELETE FROM student_courses WHERE student_id = $1")
        .bind(student_id)
        .execute(uow.conn())
        .await?;
    for &subject_id in &wanted {
        sqlx::query("INSERT INTO student_courses (student_id, subject_id) VALUES ($1, $2)")
            .bind(student_id)
            .bind(subject_id)
            .execute(uow.conn())
            .await?;
    }
    let courses = catalog::student_courses(uow.conn(), student_id).await?;
    uow.commit().await?;

    tracing::info!(student_id, count = courses.len(), "Updated student courses");
    Ok(courses)
}
